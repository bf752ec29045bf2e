//! Lesson model: page metadata, blocks, and inline content.

use std::collections::HashMap;

/// A complete lesson page.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    /// Head metadata consumed by the hosting framework
    pub metadata: PageMetadata,
    /// Chapter and section headings shown above the article
    pub header: LessonHeader,
    /// Formula macros available to every formula on the page
    pub macros: HashMap<String, Macro>,
    /// Page content as a sequence of blocks
    pub blocks: Vec<Block>,
}

/// Document head metadata for a lesson page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

/// Visible page header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonHeader {
    /// Chapter line, e.g. "5. Roots and Exponents"
    pub chapter: Option<String>,
    /// Section line, e.g. "5.2 The Principal Square Root"
    pub section: Option<String>,
}

/// A user-defined formula macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// Number of arguments (0 for simple substitution)
    pub arg_count: usize,
    /// Replacement template (use #1, #2, etc. for args)
    pub template: String,
}

/// Block-level elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph of inline content
    Paragraph(Vec<Inline>),

    /// A heading inside the article (levels 1-6)
    Heading { level: u8, content: Vec<Inline> },

    /// A formula on its own line
    DisplayMath {
        expression: String,
        label: Option<String>,
    },

    /// An ordered or unordered list of inline items
    List {
        ordered: bool,
        items: Vec<Vec<Inline>>,
    },

    /// A simple table with a header row
    Table {
        headers: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },

    /// Key-takeaway callout box
    MustKnow(Vec<Block>),

    /// Multiple-choice practice question
    Mcq(McqExample),

    /// Data-sufficiency practice question
    DataSufficiency(ExampleCard),

    /// An image with alternative text and an optional caption
    Figure {
        src: String,
        alt: String,
        caption: Option<Vec<Inline>>,
    },
}

/// Inline elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Code(String),
    /// Formula with an optional accessible label. `display` is set for
    /// `$$..$$`; paragraphs lift those out into [`Block::DisplayMath`].
    Math {
        expression: String,
        label: Option<String>,
        display: bool,
    },
}

/// A multiple-choice practice question.
#[derive(Debug, Clone, PartialEq)]
pub struct McqExample {
    pub number: Option<u32>,
    pub prompt: Vec<Block>,
    pub options: Vec<Vec<Inline>>,
    pub correct: AnswerKey,
    pub solution: Vec<Block>,
}

/// The correct answer of a multiple-choice question.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    /// Zero-based index into the options
    Option(usize),
    /// Answer text that matches none of the options
    Literal(Vec<Inline>),
}

/// A data-sufficiency practice question.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleCard {
    pub number: Option<u32>,
    pub title: Vec<Inline>,
    /// Question stem followed by the numbered statements
    pub statements: Vec<Vec<Inline>>,
    /// Usually `A`-`E`; anything else is shown verbatim
    pub correct_letter: String,
    pub solution: Vec<Block>,
}

/// Letter for a zero-based option index (`0` -> `A`).
pub fn option_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}
