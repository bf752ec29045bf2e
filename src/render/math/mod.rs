//! Formula rendering.
//!
//! A formula is rendered by a [`FormulaRenderer`]: the notation is macro-expanded,
//! checked, and handed to a [`Typesetter`] backend. Anything that cannot be
//! typeset degrades to the literal notation instead of failing the page,
//! unless [`MathOptions::throw_on_error`] is set.

mod katex;
mod macros;
mod mathml;
mod notation;

pub use self::katex::KaTeXTypesetter;
pub use self::macros::{count_macro_args, expand_macros};
pub use self::mathml::MathMLTypesetter;
pub use self::notation::{check_notation, NotationError};

use crate::ast::Macro;
use crate::error::{RenderError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Math rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathBackend {
    /// Typeset to MathML on the server (requires the `mathml` feature).
    #[default]
    MathML,
    /// Output escaped notation for KaTeX auto-render on the client.
    KaTeX,
    /// Output escaped notation for MathJax on the client.
    MathJax,
}

/// How degraded formulas are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Log at debug level.
    Ignore,
    /// Log at warn level.
    #[default]
    Warn,
}

/// Options shared by every formula on a page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MathOptions {
    pub backend: MathBackend,
    /// Return an error instead of degrading on malformed notation.
    pub throw_on_error: bool,
    pub strict: Strictness,
    /// Macros merged under the lesson's own macros.
    #[serde(skip)]
    pub macros: HashMap<String, Macro>,
}

/// Block or inline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Inline,
    Block,
}

impl From<bool> for DisplayMode {
    fn from(display: bool) -> Self {
        if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        }
    }
}

/// A single formula occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRequest {
    pub expression: String,
    pub display: DisplayMode,
    pub label: Option<String>,
}

impl FormulaRequest {
    pub fn new(expression: impl Into<String>, display: bool) -> Self {
        Self {
            expression: expression.into(),
            display: display.into(),
            label: None,
        }
    }

    pub fn inline(expression: impl Into<String>) -> Self {
        Self::new(expression, false)
    }

    pub fn block(expression: impl Into<String>) -> Self {
        Self::new(expression, true)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A rendered formula.
///
/// `content` depends only on the notation; `display` only selects the wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    content: String,
    display: DisplayMode,
    accessible_name: String,
    degraded: bool,
    delimiters: Option<(&'static str, &'static str)>,
}

impl Formula {
    /// Typeset markup (or escaped notation when degraded).
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn display(&self) -> DisplayMode {
        self.display
    }

    /// The label if one was given, otherwise the raw notation.
    pub fn accessible_name(&self) -> &str {
        &self.accessible_name
    }

    /// Whether the notation could not be typeset.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Wrap the content in its layout container.
    pub fn to_html(&self) -> String {
        let (tag, layout) = match self.display {
            DisplayMode::Inline => ("span", "inline"),
            DisplayMode::Block => ("div", "display"),
        };
        let error_class = if self.degraded { " math-error" } else { "" };
        let (open, close) = self.delimiters.unwrap_or(("", ""));

        format!(
            r#"<{tag} class="math {layout}{error_class}" role="math" aria-label="{label}">{open}{content}{close}</{tag}>"#,
            label = escape_attr(&self.accessible_name),
            content = self.content,
        )
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// A typesetting engine.
pub trait Typesetter {
    /// Typeset notation into layout-independent markup.
    fn typeset(&self, latex: &str) -> std::result::Result<String, String>;

    /// Delimiters placed around the content for the given layout.
    fn delimiters(&self, _display: DisplayMode) -> Option<(&'static str, &'static str)> {
        None
    }

    /// Get any required HTML head content (scripts, styles).
    fn head_content(&self) -> Option<String>;
}

/// Create a typesetter for the given backend.
pub fn create_typesetter(backend: MathBackend) -> Box<dyn Typesetter> {
    match backend {
        MathBackend::KaTeX => Box::new(KaTeXTypesetter::new()),
        MathBackend::MathJax => Box::new(KaTeXTypesetter::new_mathjax()),
        MathBackend::MathML => Box::new(MathMLTypesetter::new()),
    }
}

/// Renders formulas with one backend and one set of options.
pub struct FormulaRenderer {
    options: MathOptions,
    typesetter: Box<dyn Typesetter>,
}

impl FormulaRenderer {
    pub fn new(options: MathOptions) -> Self {
        let typesetter = create_typesetter(options.backend);
        Self {
            options,
            typesetter,
        }
    }

    /// Head content required by the backend.
    pub fn head_content(&self) -> Option<String> {
        self.typesetter.head_content()
    }

    /// Render one formula.
    pub fn render(&self, request: &FormulaRequest) -> Result<Formula> {
        let accessible_name = request
            .label
            .clone()
            .unwrap_or_else(|| request.expression.clone());

        let typeset = expand_macros(&request.expression, &self.options.macros)
            .and_then(|expanded| check_notation(&expanded).map(|()| expanded))
            .map_err(|e| e.to_string())
            .and_then(|expanded| self.typesetter.typeset(&expanded));

        match typeset {
            Ok(content) => Ok(Formula {
                content,
                display: request.display,
                accessible_name,
                degraded: false,
                delimiters: self.typesetter.delimiters(request.display),
            }),
            Err(message) => {
                if self.options.throw_on_error {
                    return Err(RenderError::Math {
                        expression: request.expression.clone(),
                        message,
                    }
                    .into());
                }

                match self.options.strict {
                    Strictness::Warn => tracing::warn!(
                        expression = %request.expression,
                        "formula degraded to literal text: {}",
                        message
                    ),
                    Strictness::Ignore => tracing::debug!(
                        expression = %request.expression,
                        "formula degraded to literal text: {}",
                        message
                    ),
                }

                Ok(Formula {
                    content: escape_html(&request.expression),
                    display: request.display,
                    accessible_name,
                    degraded: true,
                    delimiters: None,
                })
            }
        }
    }
}

/// Render a single formula with the given options.
pub fn render_formula(request: &FormulaRequest, options: &MathOptions) -> Result<Formula> {
    FormulaRenderer::new(options.clone()).render(request)
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn render(request: &FormulaRequest) -> Formula {
        render_formula(request, &MathOptions::default()).unwrap()
    }

    #[test]
    fn test_valid_notation_renders() {
        for expr in ["x^2+1", "\\sqrt{144}=12", "\\frac{a}{b}"] {
            let formula = render(&FormulaRequest::inline(expr));
            assert!(!formula.is_degraded(), "{expr} degraded");
            assert!(!formula.content().is_empty());
            assert!(!formula.to_html().is_empty());
        }
    }

    #[test]
    fn test_malformed_notation_degrades() {
        for expr in ["\\frac{1}{", "x^", "\\left( x", "a}", "\\begin{aligned} x"] {
            let formula = render(&FormulaRequest::block(expr));
            assert!(formula.is_degraded(), "{expr} not degraded");
            assert!(formula.to_html().contains("math-error"));
        }
    }

    #[test]
    fn test_degraded_content_is_escaped_literal() {
        let formula = render(&FormulaRequest::inline("a<b^"));
        assert_eq!(formula.content(), "a&lt;b^");
    }

    #[test]
    fn test_label_precedence() {
        let formula = render(&FormulaRequest::inline("x^2+1").with_label("x squared plus one"));
        assert_eq!(formula.accessible_name(), "x squared plus one");
        assert!(formula
            .to_html()
            .contains(r#"aria-label="x squared plus one""#));
    }

    #[test]
    fn test_label_defaults_to_notation() {
        let formula = render(&FormulaRequest::new("x^2+1", false));
        assert_eq!(formula.accessible_name(), "x^2+1");
        assert!(formula.to_html().contains(r#"aria-label="x^2+1""#));
    }

    #[test]
    fn test_label_is_attribute_escaped() {
        let formula = render(&FormulaRequest::inline("a").with_label(r#"say "a""#));
        assert!(formula.to_html().contains("aria-label=\"say &quot;a&quot;\""));
    }

    #[test]
    fn test_display_mode_changes_only_wrapper() {
        for backend in [MathBackend::MathML, MathBackend::KaTeX] {
            let options = MathOptions {
                backend,
                ..Default::default()
            };
            let inline = render_formula(&FormulaRequest::inline("\\sqrt{x^2}+1"), &options).unwrap();
            let block = render_formula(&FormulaRequest::block("\\sqrt{x^2}+1"), &options).unwrap();

            assert_eq!(inline.content(), block.content());
            assert_eq!(inline.accessible_name(), block.accessible_name());
            assert!(inline.to_html().starts_with(r#"<span class="math inline""#));
            assert!(block.to_html().starts_with(r#"<div class="math display""#));
        }
    }

    #[test]
    fn test_throw_on_error() {
        let options = MathOptions {
            throw_on_error: true,
            ..Default::default()
        };
        let err = render_formula(&FormulaRequest::inline("\\frac{1}{"), &options).unwrap_err();
        assert!(matches!(err, Error::Render(RenderError::Math { ref expression, .. }) if expression == "\\frac{1}{"));

        assert!(render_formula(&FormulaRequest::inline("x+1"), &options).is_ok());
    }

    #[test]
    fn test_macros_expand_but_label_keeps_raw_notation() {
        let mut options = MathOptions {
            backend: MathBackend::KaTeX,
            ..Default::default()
        };
        options.macros.insert(
            "abs".to_string(),
            Macro {
                arg_count: 1,
                template: "\\left|#1\\right|".to_string(),
            },
        );

        let formula = render_formula(&FormulaRequest::inline("\\abs{x}"), &options).unwrap();
        assert_eq!(formula.content(), "\\left|x\\right|");
        assert_eq!(formula.accessible_name(), "\\abs{x}");
    }

    #[test]
    fn test_client_delimiters_inside_notation_degrade() {
        for backend in [MathBackend::KaTeX, MathBackend::MathJax] {
            let options = MathOptions {
                backend,
                ..Default::default()
            };
            let formula = render_formula(&FormulaRequest::inline("a \\) b"), &options).unwrap();
            assert!(formula.is_degraded());
            assert_eq!(
                formula.to_html(),
                r#"<span class="math inline math-error" role="math" aria-label="a \) b">a \) b</span>"#
            );
        }
    }

    #[test]
    fn test_runaway_macro_degrades() {
        let mut options = MathOptions::default();
        options.macros.insert(
            "a".to_string(),
            Macro {
                arg_count: 0,
                template: "\\a\\a\\a\\a\\a\\a\\a\\a\\a\\a".to_string(),
            },
        );

        let formula = render_formula(&FormulaRequest::inline("x + \\a"), &options).unwrap();
        assert!(formula.is_degraded());
        assert_eq!(formula.content(), "x + \\a");
    }

    /// Collects formatted log output for one test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn degrade_with_logs(strict: Strictness) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();

        let options = MathOptions {
            strict,
            ..Default::default()
        };
        tracing::subscriber::with_default(subscriber, || {
            render_formula(&FormulaRequest::inline("\\frac{1}{"), &options).unwrap();
        });

        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_strictness_selects_log_level() {
        let warn = degrade_with_logs(Strictness::Warn);
        assert!(warn.contains("WARN"), "{warn}");
        assert!(warn.contains("formula degraded to literal text"));

        let ignore = degrade_with_logs(Strictness::Ignore);
        assert!(ignore.contains("DEBUG"), "{ignore}");
        assert!(!ignore.contains("WARN"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let request = FormulaRequest::block("\\sum_{i=1}^{n} i").with_label("sum of i");
        assert_eq!(render(&request), render(&request));
    }

    #[test]
    fn test_display_from_bool() {
        assert_eq!(DisplayMode::from(true), DisplayMode::Block);
        assert_eq!(DisplayMode::from(false), DisplayMode::Inline);
    }
}
