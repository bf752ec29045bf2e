//! MathML typesetter.

use super::{DisplayMode, Typesetter};

/// Typesetter that converts notation to MathML on the server.
///
/// Without the `mathml` feature this behaves like the KaTeX passthrough.
pub struct MathMLTypesetter {
    #[cfg(not(feature = "mathml"))]
    fallback: super::KaTeXTypesetter,
}

impl MathMLTypesetter {
    /// Create a new MathML typesetter.
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "mathml"))]
            fallback: super::KaTeXTypesetter::new(),
        }
    }
}

impl Default for MathMLTypesetter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typesetter for MathMLTypesetter {
    fn typeset(&self, latex: &str) -> Result<String, String> {
        #[cfg(feature = "mathml")]
        {
            // Always inline style; block layout comes from the wrapper.
            latex2mathml::latex_to_mathml(latex.trim(), latex2mathml::DisplayStyle::Inline)
                .map_err(|e| e.to_string())
        }

        #[cfg(not(feature = "mathml"))]
        {
            self.fallback.typeset(latex)
        }
    }

    fn delimiters(&self, display: DisplayMode) -> Option<(&'static str, &'static str)> {
        #[cfg(feature = "mathml")]
        {
            let _ = display;
            None
        }

        #[cfg(not(feature = "mathml"))]
        {
            self.fallback.delimiters(display)
        }
    }

    fn head_content(&self) -> Option<String> {
        #[cfg(feature = "mathml")]
        {
            Some(MATHML_STYLES.to_string())
        }

        #[cfg(not(feature = "mathml"))]
        {
            self.fallback.head_content()
        }
    }
}

#[cfg(feature = "mathml")]
const MATHML_STYLES: &str = r#"<style>
.math.display { display: block; overflow-x: auto; text-align: center; margin: 1em 0; }
.math.display > math { display: block math; }
math { font-size: 1.1em; }
</style>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mathml_typeset() {
        let typesetter = MathMLTypesetter::new();
        let result = typesetter.typeset("x^2").unwrap();
        assert!(!result.is_empty());
    }

    #[cfg(feature = "mathml")]
    #[test]
    fn test_mathml_output() {
        let typesetter = MathMLTypesetter::new();
        let result = typesetter.typeset("\\frac{1}{2}").unwrap();
        assert!(result.contains("<math"));
        assert!(result.contains("mfrac"));
        assert_eq!(typesetter.delimiters(DisplayMode::Block), None);
    }
}
