//! KaTeX/MathJax passthrough typesetter.

use super::{escape_html, DisplayMode, Typesetter};

/// Typesetter that leaves escaped notation for client-side rendering.
pub struct KaTeXTypesetter {
    use_mathjax: bool,
}

impl KaTeXTypesetter {
    /// Create a new KaTeX typesetter.
    pub fn new() -> Self {
        Self { use_mathjax: false }
    }

    /// Create a typesetter configured for MathJax.
    pub fn new_mathjax() -> Self {
        Self { use_mathjax: true }
    }
}

impl Default for KaTeXTypesetter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typesetter for KaTeXTypesetter {
    fn typeset(&self, latex: &str) -> Result<String, String> {
        if let Some(delimiter) = find_closing_delimiter(latex) {
            return Err(format!(
                "`{}` would end the formula early on the client",
                delimiter
            ));
        }
        Ok(escape_html(latex.trim()))
    }

    fn delimiters(&self, display: DisplayMode) -> Option<(&'static str, &'static str)> {
        match display {
            DisplayMode::Inline => Some(("\\(", "\\)")),
            DisplayMode::Block => Some(("\\[", "\\]")),
        }
    }

    fn head_content(&self) -> Option<String> {
        if self.use_mathjax {
            Some(MATHJAX_HEAD.to_string())
        } else {
            Some(KATEX_HEAD.to_string())
        }
    }
}

/// Find `\)` or `\]` outside of a `\\` line break.
fn find_closing_delimiter(latex: &str) -> Option<&'static str> {
    let mut chars = latex.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(')') => return Some("\\)"),
                Some(']') => return Some("\\]"),
                _ => {}
            }
        }
    }
    None
}

// `throwOnError: false` keeps client-side rendering from aborting on bad notation.
const KATEX_HEAD: &str = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css" crossorigin="anonymous">
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js" crossorigin="anonymous"></script>
<script defer src="https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/contrib/auto-render.min.js" crossorigin="anonymous"
    onload="renderMathInElement(document.body, {
        delimiters: [
            {left: '\\[', right: '\\]', display: true},
            {left: '\\(', right: '\\)', display: false}
        ],
        throwOnError: false
    });"></script>"#;

const MATHJAX_HEAD: &str = r#"<script>
MathJax = {
    tex: {
        inlineMath: [['\\(', '\\)']],
        displayMath: [['\\[', '\\]']]
    }
};
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        let typesetter = KaTeXTypesetter::new();
        assert_eq!(typesetter.typeset("a < b").unwrap(), "a &lt; b");
    }

    #[test]
    fn test_delimiters_follow_layout() {
        let typesetter = KaTeXTypesetter::new();
        assert_eq!(typesetter.delimiters(DisplayMode::Inline), Some(("\\(", "\\)")));
        assert_eq!(typesetter.delimiters(DisplayMode::Block), Some(("\\[", "\\]")));
    }

    #[test]
    fn test_rejects_closing_delimiters() {
        let typesetter = KaTeXTypesetter::new();
        assert!(typesetter.typeset("a \\) b").is_err());
        assert!(typesetter.typeset("\\] x").is_err());
        assert_eq!(find_closing_delimiter("a \\) b"), Some("\\)"));
    }

    #[test]
    fn test_line_break_before_bracket_is_allowed() {
        let typesetter = KaTeXTypesetter::new();
        assert_eq!(
            typesetter.typeset("a \\\\) b").unwrap(),
            "a \\\\) b"
        );
        assert_eq!(find_closing_delimiter("\\left( x \\right)"), None);
    }

    #[test]
    fn test_head_content() {
        assert!(KaTeXTypesetter::new().head_content().unwrap().contains("katex"));
        assert!(KaTeXTypesetter::new_mathjax()
            .head_content()
            .unwrap()
            .contains("MathJax"));
    }
}
