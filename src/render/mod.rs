//! Rendering layer for converting lessons and formulas to HTML.

pub mod html;
pub mod math;

pub use html::{render_html, HtmlConfig};
pub use math::{
    render_formula, DisplayMode, Formula, FormulaRenderer, FormulaRequest, MathBackend,
    MathOptions, Strictness,
};
