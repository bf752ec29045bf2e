//! Parser for TOML lesson sources.
//!
//! ```text
//! title = "5.2 The Principal Square Root | Roots and Exponents"
//! description = "Understand the principal square root."
//! chapter = "5. Roots and Exponents"
//! section = "5.2 The Principal Square Root"
//!
//! [macros]
//! abs = "\\left|#1\\right|"
//!
//! [[blocks]]
//! kind = "paragraph"
//! text = "So $\\sqrt{144}=12$[square root of 144 equals 12]."
//!
//! [[blocks]]
//! kind = "mcq"
//! number = 1
//! prompt = "If $x^2 = 9$, which must be true?"
//! options = ["$x = 3$", "$|x| = 3$"]
//! correct = "B"
//! solution = "Squaring hides the sign."
//!
//! [[blocks]]
//! kind = "figure"
//! src = "/charts/column-chart.png"
//! alt = "Column chart without y-axis numbers."
//! caption = "Bars can be compared by height only."
//! ```
//!
//! A `$$..$$` formula inside a paragraph splits the paragraph and is rendered
//! as a display formula between the two halves.

mod inline;

pub use inline::parse_inlines;

use crate::ast::{
    AnswerKey, Block, ExampleCard, Inline, Lesson, LessonHeader, Macro, McqExample, PageMetadata,
};
use crate::error::{ParseError, Result};
use crate::render::math::count_macro_args;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Parse a lesson from TOML source text.
pub fn parse_lesson(input: &str) -> Result<Lesson> {
    let raw: RawLesson =
        toml::from_str(input).map_err(|e| ParseError::Toml(e.to_string()))?;

    let macros = raw
        .macros
        .into_iter()
        .map(|(name, template)| {
            let arg_count = count_macro_args(&template);
            (name, Macro { arg_count, template })
        })
        .collect();

    let blocks = convert_blocks(raw.blocks)?;

    let lesson = Lesson {
        metadata: PageMetadata {
            title: raw.title,
            description: raw.description,
        },
        header: LessonHeader {
            chapter: raw.chapter,
            section: raw.section,
        },
        macros,
        blocks,
    };

    tracing::debug!(
        title = %lesson.metadata.title,
        blocks = lesson.blocks.len(),
        "parsed lesson"
    );

    Ok(lesson)
}

/// Read and parse a lesson file.
pub fn parse_lesson_file(path: impl AsRef<Path>) -> Result<Lesson> {
    let source = std::fs::read_to_string(path)?;
    parse_lesson(&source)
}

#[derive(Debug, Deserialize)]
struct RawLesson {
    title: String,
    description: String,
    chapter: Option<String>,
    section: Option<String>,
    #[serde(default)]
    macros: HashMap<String, String>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
enum RawBlock {
    Paragraph {
        text: RawText,
    },
    Heading {
        level: u8,
        text: RawText,
    },
    Math {
        expr: String,
        label: Option<String>,
    },
    List {
        #[serde(default)]
        ordered: bool,
        items: Vec<RawText>,
    },
    Table {
        headers: Vec<RawText>,
        #[serde(default)]
        rows: Vec<Vec<RawText>>,
    },
    MustKnow {
        body: RawProse,
    },
    Mcq {
        number: Option<u32>,
        prompt: RawProse,
        options: Vec<RawText>,
        correct: String,
        solution: Option<RawProse>,
    },
    DataSufficiency {
        number: Option<u32>,
        title: RawText,
        statements: Vec<RawText>,
        #[serde(default)]
        correct: String,
        solution: Option<RawProse>,
    },
    Figure {
        src: String,
        #[serde(default)]
        alt: String,
        caption: Option<RawText>,
    },
}

/// Rich text: a string in inline syntax, or explicit segments.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawText {
    Plain(String),
    Segments(Vec<RawSegment>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSegment {
    Plain(String),
    Math {
        math: String,
        label: Option<String>,
        #[serde(default)]
        display: bool,
    },
}

/// Prose: paragraphs separated by blank lines, or explicit blocks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProse {
    Plain(String),
    Blocks(Vec<RawBlock>),
}

impl RawText {
    fn into_inlines(self) -> Vec<Inline> {
        match self {
            RawText::Plain(text) => parse_inlines(&text),
            RawText::Segments(segments) => segments
                .into_iter()
                .flat_map(|segment| match segment {
                    RawSegment::Plain(text) => parse_inlines(&text),
                    RawSegment::Math {
                        math,
                        label,
                        display,
                    } => vec![Inline::Math {
                        expression: math,
                        label,
                        display,
                    }],
                })
                .collect(),
        }
    }

    /// Source text used to match an answer against the options.
    fn source(&self) -> String {
        match self {
            RawText::Plain(text) => text.trim().to_string(),
            RawText::Segments(segments) => segments
                .iter()
                .map(|segment| match segment {
                    RawSegment::Plain(text) => text.clone(),
                    RawSegment::Math {
                        math,
                        display: false,
                        ..
                    } => format!("${}$", math),
                    RawSegment::Math { math, .. } => format!("$${}$$", math),
                })
                .collect::<String>()
                .trim()
                .to_string(),
        }
    }
}

impl RawProse {
    fn into_blocks(self) -> Result<Vec<Block>> {
        match self {
            RawProse::Plain(text) => Ok(split_paragraphs(&text)
                .iter()
                .flat_map(|paragraph| paragraph_blocks(parse_inlines(paragraph)))
                .collect()),
            RawProse::Blocks(blocks) => convert_blocks(blocks),
        }
    }
}

fn convert_blocks(blocks: Vec<RawBlock>) -> Result<Vec<Block>> {
    let mut converted = Vec::with_capacity(blocks.len());
    for block in blocks {
        convert_block(block, &mut converted)?;
    }
    Ok(converted)
}

fn convert_block(block: RawBlock, out: &mut Vec<Block>) -> Result<()> {
    let block = match block {
        RawBlock::Paragraph { text } => {
            out.extend(paragraph_blocks(text.into_inlines()));
            return Ok(());
        }
        RawBlock::Heading { level, text } => {
            if !(1..=6).contains(&level) {
                return Err(ParseError::HeadingLevel(level).into());
            }
            Block::Heading {
                level,
                content: text.into_inlines(),
            }
        }
        RawBlock::Math { expr, label } => Block::DisplayMath {
            expression: expr,
            label,
        },
        RawBlock::List { ordered, items } => Block::List {
            ordered,
            items: items.into_iter().map(RawText::into_inlines).collect(),
        },
        RawBlock::Table { headers, rows } => Block::Table {
            headers: headers.into_iter().map(RawText::into_inlines).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(RawText::into_inlines).collect())
                .collect(),
        },
        RawBlock::MustKnow { body } => Block::MustKnow(body.into_blocks()?),
        RawBlock::Mcq {
            number,
            prompt,
            options,
            correct,
            solution,
        } => {
            let correct = resolve_answer(&correct, &options);
            Block::Mcq(McqExample {
                number,
                prompt: prompt.into_blocks()?,
                options: options.into_iter().map(RawText::into_inlines).collect(),
                correct,
                solution: solution.map(RawProse::into_blocks).transpose()?.unwrap_or_default(),
            })
        }
        RawBlock::DataSufficiency {
            number,
            title,
            statements,
            correct,
            solution,
        } => Block::DataSufficiency(ExampleCard {
            number,
            title: title.into_inlines(),
            statements: statements.into_iter().map(RawText::into_inlines).collect(),
            correct_letter: correct.trim().to_string(),
            solution: solution.map(RawProse::into_blocks).transpose()?.unwrap_or_default(),
        }),
        RawBlock::Figure { src, alt, caption } => Block::Figure {
            src,
            alt,
            caption: caption.map(RawText::into_inlines),
        },
    };

    out.push(block);
    Ok(())
}

/// Turn a paragraph's inlines into blocks, lifting each `$$..$$` formula out
/// as a display block. Whitespace-only fragments are dropped.
fn paragraph_blocks(inlines: Vec<Inline>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for inline in inlines {
        match inline {
            Inline::Math {
                expression,
                label,
                display: true,
            } => {
                flush_paragraph(&mut blocks, &mut current);
                blocks.push(Block::DisplayMath { expression, label });
            }
            inline => current.push(inline),
        }
    }
    flush_paragraph(&mut blocks, &mut current);

    blocks
}

fn flush_paragraph(blocks: &mut Vec<Block>, current: &mut Vec<Inline>) {
    let mut inlines = std::mem::take(current);

    if let Some(Inline::Text(first)) = inlines.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(Inline::Text(last)) = inlines.last_mut() {
        *last = last.trim_end().to_string();
    }
    inlines.retain(|inline| !matches!(inline, Inline::Text(t) if t.is_empty()));

    if !inlines.is_empty() {
        blocks.push(Block::Paragraph(inlines));
    }
}

/// Resolve an answer given as an option letter or as the option's text.
fn resolve_answer(correct: &str, options: &[RawText]) -> AnswerKey {
    let correct = correct.trim();

    let mut chars = correct.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_uppercase() {
            let index = (letter as u8 - b'A') as usize;
            if index < options.len() {
                return AnswerKey::Option(index);
            }
        }
    }

    options
        .iter()
        .position(|option| option.source() == correct)
        .map(AnswerKey::Option)
        .unwrap_or_else(|| AnswerKey::Literal(parse_inlines(correct)))
}

/// Split prose into paragraphs on blank lines.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}
