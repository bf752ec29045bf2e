//! # gmat-lessons
//!
//! Server-side rendering of GMAT lesson pages: prose, accessible math, "Must
//! Know" callouts, and multiple-choice / data-sufficiency practice questions.
//!
//! ## Formulas
//!
//! Every formula goes through one pure function, [`render_formula`]. It takes
//! a notation string, a display mode, and an optional accessible label:
//!
//! ```rust
//! use gmat_lessons::{render_formula, FormulaRequest, MathOptions};
//!
//! let formula = render_formula(&FormulaRequest::inline("x^2+1"), &MathOptions::default()).unwrap();
//! assert_eq!(formula.accessible_name(), "x^2+1");
//!
//! let labelled = FormulaRequest::inline("x^2+1").with_label("x squared plus one");
//! let formula = render_formula(&labelled, &MathOptions::default()).unwrap();
//! assert_eq!(formula.accessible_name(), "x squared plus one");
//! ```
//!
//! Notation that cannot be typeset never fails the page. It is rendered as
//! literal text with a `math-error` class, unless
//! [`MathOptions::throw_on_error`] is set.
//!
//! ## Lessons
//!
//! Lessons are TOML documents; see [`parser`] for the format.
//!
//! ```rust
//! use gmat_lessons::{render_lesson, HtmlConfig};
//!
//! let source = r#"
//! title = "5.2 The Principal Square Root | Roots and Exponents"
//! description = "Why the radical means the nonnegative root."
//! chapter = "5. Roots and Exponents"
//!
//! [[blocks]]
//! kind = "must-know"
//! body = "The radical returns the principal root: $\\sqrt{x^2}=|x|$[square root of x squared equals absolute value of x]."
//! "#;
//!
//! let html = render_lesson(source, &HtmlConfig::default()).unwrap();
//! assert!(html.contains("Must Know"));
//! assert!(html.contains(r#"aria-label="square root of x squared equals absolute value of x""#));
//! ```
//!
//! ## Math Backends
//!
//! - `MathML` (default): typeset on the server with `latex2mathml` (requires the `mathml` feature)
//! - `KaTeX`: escaped notation for client-side KaTeX auto-render
//! - `MathJax`: escaped notation for client-side MathJax
//!
//! ## Features
//!
//! - `mathml` (default): server-side MathML typesetting
//! - `wasm`: WebAssembly bindings (requires `wasm-bindgen`)

pub mod ast;
pub mod error;
pub mod parser;
pub mod render;

// WASM module (only with feature)
#[cfg(feature = "wasm")]
pub mod wasm;

// Convenience re-exports
pub use ast::{AnswerKey, Block, ExampleCard, Inline, Lesson, McqExample, PageMetadata};
pub use error::{Error, ParseError, RenderError, Result};
pub use parser::{parse_lesson, parse_lesson_file};
pub use render::{
    render_formula, render_html, DisplayMode, Formula, FormulaRequest, HtmlConfig, MathBackend,
    MathOptions,
};

/// Parse and render a TOML lesson in one step.
pub fn render_lesson(source: &str, config: &HtmlConfig) -> Result<String> {
    let lesson = parse_lesson(source)?;
    render_html(&lesson, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_pipeline() {
        let source = r#"
title = "16.2.8 Choosing from Multiple Groups | Combinations"
description = "Multiply the counts for each group."
chapter = "16. Combinations and Permutations"
section = "16.2.8 Choosing multiple items from multiple groups"

[macros]
C = "\\binom{#1}{#2}"

[[blocks]]
kind = "paragraph"
text = "Count each group with *combinations*, then multiply."

[[blocks]]
kind = "math"
expr = "\\C{5}{2} \\times \\C{4}{1}"
label = "5 choose 2 times 4 choose 1"

[[blocks]]
kind = "mcq"
number = 1
prompt = "How many committees of 2 managers and 1 engineer are possible?"
options = ["20", "40", "60"]
correct = "40"
solution = "$$10 \\times 4 = 40$$"
"#;

        let html = render_lesson(source, &HtmlConfig::default()).unwrap();

        assert!(html.contains("<h1>16. Combinations and Permutations</h1>"));
        assert!(html.contains("<em>combinations</em>"));
        assert!(html.contains(r#"aria-label="5 choose 2 times 4 choose 1""#));
        assert!(html.contains("(B) 40"));
        assert!(html.contains(r#"aria-label="10 \times 4 = 40""#));
    }

    #[test]
    fn test_standalone_pipeline() {
        let source = r#"
title = "Inference | Verbal"
description = "Drawing supported conclusions."
"#;
        let config = HtmlConfig {
            standalone: true,
            ..Default::default()
        };
        let html = render_lesson(source, &config).unwrap();

        assert!(html.contains("<title>Inference | Verbal</title>"));
        assert!(html.contains(r#"content="Drawing supported conclusions.""#));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = render_lesson("not = [valid", &HtmlConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Toml(_))));
    }
}
