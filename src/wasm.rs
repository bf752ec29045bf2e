//! WebAssembly bindings for JavaScript hosts.

#![cfg(feature = "wasm")]

use crate::parser::parse_lesson;
use crate::render::{render_formula, render_html, FormulaRequest, HtmlConfig, MathBackend};
use wasm_bindgen::prelude::*;

/// Render one formula to accessible HTML.
///
/// Malformed notation degrades to literal text unless `throwOnError` was set
/// on the options, in which case an error is thrown.
#[wasm_bindgen(js_name = renderFormula)]
pub fn render_formula_js(
    expression: &str,
    display: bool,
    label: Option<String>,
    options: Option<RenderOptions>,
) -> Result<String, JsError> {
    let mut request = FormulaRequest::new(expression, display);
    request.label = label;

    let config = options.map(|o| o.to_html_config()).unwrap_or_default();
    render_formula(&request, &config.math)
        .map(|formula| formula.to_html())
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Parse a TOML lesson and render it to HTML.
#[wasm_bindgen(js_name = renderLesson)]
pub fn render_lesson(source: &str, options: Option<RenderOptions>) -> Result<String, JsError> {
    let lesson = parse_lesson(source).map_err(|e| JsError::new(&e.to_string()))?;
    let config = options.map(|o| o.to_html_config()).unwrap_or_default();
    render_html(&lesson, &config).map_err(|e| JsError::new(&e.to_string()))
}

/// Configuration options for rendering.
#[wasm_bindgen]
pub struct RenderOptions {
    math_backend: String,
    standalone: bool,
    throw_on_error: bool,
    reveal_answers: bool,
}

#[wasm_bindgen]
impl RenderOptions {
    /// Create a new options object with defaults.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            math_backend: "mathml".to_string(),
            standalone: false,
            throw_on_error: false,
            reveal_answers: false,
        }
    }

    /// Set the math rendering backend: "mathml", "katex", or "mathjax".
    #[wasm_bindgen(js_name = setMathBackend)]
    pub fn set_math_backend(&mut self, backend: &str) {
        self.math_backend = backend.to_lowercase();
    }

    /// Set whether to generate a complete HTML document.
    #[wasm_bindgen(js_name = setStandalone)]
    pub fn set_standalone(&mut self, standalone: bool) {
        self.standalone = standalone;
    }

    /// Throw instead of degrading on malformed notation.
    #[wasm_bindgen(js_name = setThrowOnError)]
    pub fn set_throw_on_error(&mut self, throw_on_error: bool) {
        self.throw_on_error = throw_on_error;
    }

    /// Render answer sections expanded.
    #[wasm_bindgen(js_name = setRevealAnswers)]
    pub fn set_reveal_answers(&mut self, reveal: bool) {
        self.reveal_answers = reveal;
    }

    fn to_html_config(&self) -> HtmlConfig {
        let mut config = HtmlConfig {
            standalone: self.standalone,
            reveal_answers: self.reveal_answers,
            ..Default::default()
        };
        config.math.backend = match self.math_backend.as_str() {
            "katex" => MathBackend::KaTeX,
            "mathjax" => MathBackend::MathJax,
            _ => MathBackend::MathML,
        };
        config.math.throw_on_error = self.throw_on_error;
        config
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
