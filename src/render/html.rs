//! HTML renderer for lesson pages.

use crate::ast::{option_letter, AnswerKey, Block, ExampleCard, Inline, Lesson, McqExample};
use crate::error::{ParseError, Result};
use crate::render::math::{
    escape_attr, escape_html, FormulaRenderer, FormulaRequest, MathOptions,
};
use serde::Deserialize;
use std::cell::OnceCell;

/// Configuration for HTML rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Whether to generate a complete HTML document or just the page content.
    pub standalone: bool,
    /// Overrides the lesson title in standalone mode.
    pub title: Option<String>,
    /// Additional CSS to include.
    pub custom_css: Option<String>,
    /// CSS class prefix for styling. Characters other than ASCII letters,
    /// digits, `-` and `_` are dropped when rendering.
    pub class_prefix: String,
    /// Render answer sections expanded.
    pub reveal_answers: bool,
    /// Formula rendering options.
    pub math: MathOptions,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            standalone: false,
            title: None,
            custom_css: None,
            class_prefix: "lesson-".to_string(),
            reveal_answers: false,
            math: MathOptions::default(),
        }
    }
}

impl HtmlConfig {
    /// Load a configuration from TOML; missing keys keep their defaults.
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| ParseError::Config(e.to_string()).into())
    }
}

/// Render a lesson to HTML.
pub fn render_html(lesson: &Lesson, config: &HtmlConfig) -> Result<String> {
    tracing::debug!(
        title = %lesson.metadata.title,
        standalone = config.standalone,
        "rendering lesson"
    );

    let mut renderer = HtmlRenderer::new(lesson, config);
    renderer.render()
}

struct HtmlRenderer<'a> {
    lesson: &'a Lesson,
    config: &'a HtmlConfig,
    /// Sanitized `config.class_prefix`
    prefix: String,
    /// Created on the first formula so pages without math never load a backend.
    formulas: OnceCell<FormulaRenderer>,
    output: String,
}

impl<'a> HtmlRenderer<'a> {
    fn new(lesson: &'a Lesson, config: &'a HtmlConfig) -> Self {
        Self {
            lesson,
            config,
            prefix: sanitize_class_prefix(&config.class_prefix),
            formulas: OnceCell::new(),
            output: String::new(),
        }
    }

    fn render(&mut self) -> Result<String> {
        self.render_page()?;

        if self.config.standalone {
            Ok(self.wrap_standalone())
        } else {
            Ok(std::mem::take(&mut self.output))
        }
    }

    fn wrap_standalone(&mut self) -> String {
        let metadata = &self.lesson.metadata;
        let title = self.config.title.as_deref().unwrap_or(&metadata.title);

        let mut doc = String::new();
        doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        doc.push_str("<meta charset=\"UTF-8\">\n");
        doc.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        doc.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        doc.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            escape_attr(&metadata.description)
        ));

        // Only pages that rendered a formula need the math backend's assets
        if let Some(head) = self.formulas.get().and_then(FormulaRenderer::head_content) {
            doc.push_str(&head);
            doc.push('\n');
        }

        doc.push_str(&self.default_styles());

        if let Some(ref css) = self.config.custom_css {
            doc.push_str("<style>\n");
            doc.push_str(css);
            doc.push_str("\n</style>\n");
        }

        doc.push_str("</head>\n<body>\n");
        doc.push_str(&std::mem::take(&mut self.output));
        doc.push_str("</body>\n</html>");
        doc
    }

    fn render_page(&mut self) -> Result<()> {
        let p = self.prefix.clone();
        let lesson = self.lesson;
        let header = &lesson.header;

        self.output.push_str(&format!(r#"<main class="{p}page">"#));
        self.output.push('\n');

        if header.chapter.is_some() || header.section.is_some() {
            self.output.push_str(&format!(r#"<header class="{p}header">"#));
            self.output.push('\n');
            if let Some(ref chapter) = header.chapter {
                self.output.push_str(&format!("<h1>{}</h1>\n", escape_html(chapter)));
            }
            if let Some(ref section) = header.section {
                self.output.push_str(&format!("<h2>{}</h2>\n", escape_html(section)));
            }
            self.output.push_str("</header>\n");
        }

        self.output.push_str(&format!(r#"<article class="{p}article">"#));
        self.output.push('\n');
        self.render_blocks(&lesson.blocks)?;
        self.output.push_str("</article>\n</main>\n");

        Ok(())
    }

    fn render_blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.render_block(block)?;
        }
        Ok(())
    }

    fn render_block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(inlines) => {
                self.output.push_str("<p>");
                self.render_inlines(inlines)?;
                self.output.push_str("</p>\n");
            }
            Block::Heading { level, content } => {
                self.output.push_str(&format!("<h{}>", level));
                self.render_inlines(content)?;
                self.output.push_str(&format!("</h{}>\n", level));
            }
            Block::DisplayMath { expression, label } => {
                let mut request = FormulaRequest::block(expression.as_str());
                request.label = label.clone();
                self.render_formula(&request)?;
                self.output.push('\n');
            }
            Block::List { ordered, items } => {
                let tag = if *ordered { "ol" } else { "ul" };
                self.output.push_str(&format!("<{}>\n", tag));
                for item in items {
                    self.output.push_str("<li>");
                    self.render_inlines(item)?;
                    self.output.push_str("</li>\n");
                }
                self.output.push_str(&format!("</{}>\n", tag));
            }
            Block::Table { headers, rows } => {
                self.render_table(headers, rows)?;
            }
            Block::MustKnow(blocks) => {
                let p = &self.prefix;
                self.output.push_str(&format!(
                    r#"<aside class="{p}must-know" role="note">"#
                ));
                self.output.push('\n');
                self.output.push_str(&format!(
                    r#"<p class="{p}must-know-title"><strong>Must Know</strong></p>"#
                ));
                self.output.push('\n');
                self.render_blocks(blocks)?;
                self.output.push_str("</aside>\n");
            }
            Block::Mcq(mcq) => {
                self.render_mcq(mcq)?;
            }
            Block::DataSufficiency(card) => {
                self.render_data_sufficiency(card)?;
            }
            Block::Figure { src, alt, caption } => {
                self.output.push_str(&format!(
                    r#"<figure class="{}figure">"#,
                    self.prefix
                ));
                self.output.push_str(&format!(
                    "\n<img src=\"{}\" alt=\"{}\" loading=\"lazy\">\n",
                    escape_attr(src),
                    escape_attr(alt)
                ));
                if let Some(caption) = caption {
                    self.output.push_str("<figcaption>");
                    self.render_inlines(caption)?;
                    self.output.push_str("</figcaption>\n");
                }
                self.output.push_str("</figure>\n");
            }
        }

        Ok(())
    }

    fn render_table(&mut self, headers: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>]) -> Result<()> {
        self.output.push_str(&format!(
            r#"<table class="{}table">"#,
            self.prefix
        ));
        self.output.push_str("\n<thead>\n<tr>\n");
        for cell in headers {
            self.output.push_str("<th>");
            self.render_inlines(cell)?;
            self.output.push_str("</th>\n");
        }
        self.output.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in rows {
            self.output.push_str("<tr>\n");
            for cell in row {
                self.output.push_str("<td>");
                self.render_inlines(cell)?;
                self.output.push_str("</td>\n");
            }
            self.output.push_str("</tr>\n");
        }
        self.output.push_str("</tbody>\n</table>\n");
        Ok(())
    }

    fn render_mcq(&mut self, mcq: &McqExample) -> Result<()> {
        let p = self.prefix.clone();

        self.output.push_str(&format!(r#"<section class="{p}example {p}mcq">"#));
        self.output.push('\n');
        self.output.push_str(&format!(
            r#"<h3 class="{p}example-title">{}</h3>"#,
            example_title(mcq.number)
        ));
        self.output.push('\n');

        self.output.push_str(&format!(r#"<div class="{p}prompt">"#));
        self.output.push('\n');
        self.render_blocks(&mcq.prompt)?;
        self.output.push_str("</div>\n");

        self.output.push_str(&format!(r#"<ol class="{p}options" type="A">"#));
        self.output.push('\n');
        for option in &mcq.options {
            self.output.push_str("<li>");
            self.render_inlines(option)?;
            self.output.push_str("</li>\n");
        }
        self.output.push_str("</ol>\n");

        self.open_solution();
        self.output.push_str(&format!(
            r#"<p class="{p}answer"><strong>Correct answer:</strong> "#
        ));
        match &mcq.correct {
            AnswerKey::Option(index) => {
                self.output.push_str(&format!("({}) ", option_letter(*index)));
                if let Some(option) = mcq.options.get(*index) {
                    self.render_inlines(option)?;
                }
            }
            AnswerKey::Literal(inlines) => self.render_inlines(inlines)?,
        }
        self.output.push_str("</p>\n");
        self.render_blocks(&mcq.solution)?;
        self.output.push_str("</details>\n</section>\n");

        Ok(())
    }

    fn render_data_sufficiency(&mut self, card: &ExampleCard) -> Result<()> {
        let p = self.prefix.clone();

        self.output.push_str(&format!(
            r#"<section class="{p}example {p}data-sufficiency">"#
        ));
        self.output.push('\n');
        self.output.push_str(&format!(
            r#"<h3 class="{p}example-title">{}"#,
            example_title(card.number)
        ));
        if !card.title.is_empty() {
            self.output.push_str(": ");
            self.render_inlines(&card.title)?;
        }
        self.output.push_str("</h3>\n");

        self.output.push_str(&format!(r#"<div class="{p}statements">"#));
        self.output.push('\n');
        for statement in &card.statements {
            self.output.push_str("<p>");
            self.render_inlines(statement)?;
            self.output.push_str("</p>\n");
        }
        self.output.push_str("</div>\n");

        self.open_solution();
        if !card.correct_letter.is_empty() {
            self.output.push_str(&format!(
                r#"<p class="{p}answer"><strong>Answer:</strong> {}"#,
                escape_html(&card.correct_letter)
            ));
            if let Some(meaning) = data_sufficiency_meaning(&card.correct_letter) {
                self.output.push_str(&format!(" ({})", meaning));
            }
            self.output.push_str("</p>\n");
        }
        self.render_blocks(&card.solution)?;
        self.output.push_str("</details>\n</section>\n");

        Ok(())
    }

    fn open_solution(&mut self) {
        let open = if self.config.reveal_answers { " open" } else { "" };
        self.output.push_str(&format!(
            r#"<details class="{}solution"{}>"#,
            self.prefix, open
        ));
        self.output.push_str("\n<summary>Show answer</summary>\n");
    }

    fn render_inlines(&mut self, inlines: &[Inline]) -> Result<()> {
        for inline in inlines {
            self.render_inline(inline)?;
        }
        Ok(())
    }

    fn render_inline(&mut self, inline: &Inline) -> Result<()> {
        match inline {
            Inline::Text(text) => {
                self.output.push_str(&escape_html(text));
            }
            Inline::Strong(inlines) => {
                self.output.push_str("<strong>");
                self.render_inlines(inlines)?;
                self.output.push_str("</strong>");
            }
            Inline::Emphasis(inlines) => {
                self.output.push_str("<em>");
                self.render_inlines(inlines)?;
                self.output.push_str("</em>");
            }
            Inline::Code(code) => {
                self.output.push_str("<code>");
                self.output.push_str(&escape_html(code));
                self.output.push_str("</code>");
            }
            Inline::Math {
                expression,
                label,
                display,
            } => {
                let mut request = FormulaRequest::new(expression.as_str(), *display);
                request.label = label.clone();
                self.render_formula(&request)?;
            }
        }

        Ok(())
    }

    fn render_formula(&mut self, request: &FormulaRequest) -> Result<()> {
        let lesson = self.lesson;
        let config = self.config;
        let renderer = self.formulas.get_or_init(|| {
            let mut options = config.math.clone();
            options
                .macros
                .extend(lesson.macros.iter().map(|(k, v)| (k.clone(), v.clone())));
            FormulaRenderer::new(options)
        });

        let formula = renderer.render(request)?;
        self.output.push_str(&formula.to_html());
        Ok(())
    }

    fn default_styles(&self) -> String {
        format!(
            r#"<style>
.{p}page {{ max-width: 56rem; margin: 0 auto; padding: 2rem 1rem; font-family: system-ui, sans-serif; line-height: 1.6; }}
.{p}header h2 {{ color: #555; font-size: 1.15rem; }}
.{p}article > * + * {{ margin-top: 1.5rem; }}
.{p}must-know {{ padding: 1rem 1.25rem; border-left: 4px solid #2563eb; background: #eff6ff; border-radius: 0.375rem; }}
.{p}must-know-title {{ margin: 0 0 0.5rem; text-transform: uppercase; letter-spacing: 0.05em; color: #1d4ed8; }}
.{p}example {{ padding: 1rem 1.25rem; border: 1px solid #ddd; border-radius: 0.5rem; }}
.{p}example-title {{ margin-top: 0; }}
.{p}options li {{ margin: 0.25rem 0; }}
.{p}solution summary {{ cursor: pointer; font-weight: 600; }}
.{p}answer {{ color: #15803d; }}
.{p}figure {{ margin: 0; text-align: center; }}
.{p}figure img {{ max-width: 100%; height: auto; }}
.{p}figure figcaption {{ margin-top: 0.5rem; font-size: 0.875rem; color: #555; }}
.{p}table {{ border-collapse: collapse; margin: 1em auto; }}
.{p}table th, .{p}table td {{ border: 1px solid #ddd; padding: 0.5em 1em; }}
.math.display {{ overflow-x: auto; }}
.math-error {{ color: #b91c1c; font-family: monospace; }}
</style>
"#,
            p = self.prefix
        )
    }
}

fn example_title(number: Option<u32>) -> String {
    match number {
        Some(n) => format!("Example {}", n),
        None => "Example".to_string(),
    }
}

/// Standard meaning of a data-sufficiency answer letter.
pub fn data_sufficiency_meaning(letter: &str) -> Option<&'static str> {
    match letter {
        "A" => Some("Statement (1) ALONE is sufficient, but statement (2) alone is not sufficient"),
        "B" => Some("Statement (2) ALONE is sufficient, but statement (1) alone is not sufficient"),
        "C" => Some("BOTH statements TOGETHER are sufficient, but NEITHER statement ALONE is sufficient"),
        "D" => Some("EACH statement ALONE is sufficient"),
        "E" => Some("Statements (1) and (2) TOGETHER are NOT sufficient"),
        _ => None,
    }
}

fn sanitize_class_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}
