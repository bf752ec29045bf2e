//! Inline-level parsing for lesson prose.
//!
//! Recognized markup: `$expr$`, `$$expr$$`, an optional `[label]` directly
//! after either, `**strong**`, `*emphasis*`, `` `code` `` and `\$`.
//! Anything unterminated is kept as literal text.
//!
//! A single `$` opens a formula only when a non-space character follows it.
//! The formula closes at the next `$` that has a non-space character before
//! it and no digit after it; a `$` preceded by a space ends the search.
//! Prices such as `$5 and $10` therefore stay text.

use crate::ast::Inline;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until1},
    character::complete::char,
    combinator::{map, opt, value},
    error::{Error, ErrorKind},
    sequence::{delimited, pair},
    IResult,
};

/// Parse inline content from a string.
pub fn parse_inlines(input: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        if let Ok((rest, inline)) = special(remaining) {
            push_inline(&mut inlines, inline);
            remaining = rest;
            continue;
        }

        let (text, rest) = consume_text(remaining);
        if text.is_empty() {
            // A special character that did not start valid markup
            let c = remaining.chars().next().unwrap_or_default();
            push_inline(&mut inlines, Inline::Text(c.to_string()));
            remaining = &remaining[c.len_utf8()..];
        } else {
            push_inline(&mut inlines, Inline::Text(text.to_string()));
            remaining = rest;
        }
    }

    inlines
}

fn special(input: &str) -> IResult<&str, Inline> {
    alt((escaped_dollar, math, strong, emphasis, code))(input)
}

fn escaped_dollar(input: &str) -> IResult<&str, Inline> {
    value(Inline::Text("$".to_string()), tag("\\$"))(input)
}

fn display_delimited(input: &str) -> IResult<&str, &str> {
    delimited(tag("$$"), take_until1("$$"), tag("$$"))(input)
}

fn inline_delimited(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('$')(input)?;
    let fail = || nom::Err::Error(Error::new(input, ErrorKind::Char));

    if body.starts_with(char::is_whitespace) {
        return Err(fail());
    }

    for (i, _) in body.match_indices('$') {
        match body[..i].chars().next_back() {
            // `\$` inside a formula is a literal dollar
            Some('\\') => continue,
            // A `$` after a space opens something else
            Some(c) if c.is_whitespace() => break,
            None => break,
            Some(_) => {}
        }
        if body[i + 1..].starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        return Ok((&body[i + 1..], &body[..i]));
    }

    Err(fail())
}

fn math_label(input: &str) -> IResult<&str, &str> {
    delimited(char('['), is_not("]"), char(']'))(input)
}

fn math(input: &str) -> IResult<&str, Inline> {
    map(
        pair(
            alt((
                map(display_delimited, |e| (e, true)),
                map(inline_delimited, |e| (e, false)),
            )),
            opt(math_label),
        ),
        |((expression, display), label): ((&str, bool), Option<&str>)| Inline::Math {
            expression: expression.trim().to_string(),
            label: label.map(|l| l.trim().to_string()),
            display,
        },
    )(input)
}

fn strong(input: &str) -> IResult<&str, Inline> {
    map(
        delimited(tag("**"), take_until1("**"), tag("**")),
        |content: &str| Inline::Strong(parse_inlines(content)),
    )(input)
}

fn emphasis(input: &str) -> IResult<&str, Inline> {
    map(delimited(char('*'), is_not("*"), char('*')), |content: &str| {
        Inline::Emphasis(parse_inlines(content))
    })(input)
}

fn code(input: &str) -> IResult<&str, Inline> {
    map(delimited(char('`'), is_not("`"), char('`')), |content: &str| {
        Inline::Code(content.to_string())
    })(input)
}

/// Split off plain text up to the next character that may start markup.
fn consume_text(input: &str) -> (&str, &str) {
    let end = input
        .find(|c| matches!(c, '$' | '*' | '`' | '\\'))
        .unwrap_or(input.len());
    input.split_at(end)
}

/// Push an inline, merging adjacent text nodes.
fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text(ref text) = inline {
        if let Some(Inline::Text(last)) = inlines.last_mut() {
            last.push_str(text);
            return;
        }
    }
    inlines.push(inline);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn math(expr: &str, label: Option<&str>) -> Inline {
        Inline::Math {
            expression: expr.to_string(),
            label: label.map(str::to_string),
            display: false,
        }
    }

    fn display(expr: &str, label: Option<&str>) -> Inline {
        Inline::Math {
            expression: expr.to_string(),
            label: label.map(str::to_string),
            display: true,
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_inlines("Just words."), vec![text("Just words.")]);
    }

    #[test]
    fn test_inline_math_with_label() {
        assert_eq!(
            parse_inlines("So $\\sqrt{144}=12$[square root of 144 equals 12] holds."),
            vec![
                text("So "),
                math("\\sqrt{144}=12", Some("square root of 144 equals 12")),
                text(" holds."),
            ]
        );
    }

    #[test]
    fn test_math_without_label() {
        assert_eq!(
            parse_inlines("Solve $x^2=4$ [twice]."),
            vec![text("Solve "), math("x^2=4", None), text(" [twice].")]
        );
    }

    #[test]
    fn test_double_dollar_keeps_display_mode() {
        assert_eq!(
            parse_inlines("Thus $$x = \\pm 2$$[x is plus or minus 2] follows."),
            vec![
                text("Thus "),
                display("x = \\pm 2", Some("x is plus or minus 2")),
                text(" follows."),
            ]
        );
    }

    #[test]
    fn test_escaped_and_unterminated_dollars() {
        assert_eq!(
            parse_inlines("It costs \\$5 or \\$10."),
            vec![text("It costs $5 or $10.")]
        );
        assert_eq!(parse_inlines("Only $5 today"), vec![text("Only $5 today")]);
    }

    #[test]
    fn test_currency_amounts_stay_text() {
        assert_eq!(
            parse_inlines("A shirt costs $5 and a hat costs $10."),
            vec![text("A shirt costs $5 and a hat costs $10.")]
        );
        assert_eq!(
            parse_inlines("Between $20 and $30, inclusive"),
            vec![text("Between $20 and $30, inclusive")]
        );
    }

    #[test]
    fn test_currency_next_to_formula() {
        assert_eq!(
            parse_inlines("Spend $15 when $p = 3$."),
            vec![text("Spend $15 when "), math("p = 3", None), text(".")]
        );
        assert_eq!(parse_inlines("$5$"), vec![math("5", None)]);
    }

    #[test]
    fn test_escaped_dollar_inside_formula() {
        assert_eq!(
            parse_inlines("$\\$x + 1$"),
            vec![math("\\$x + 1", None)]
        );
    }

    #[test]
    fn test_emphasis_and_strong() {
        assert_eq!(
            parse_inlines("**Key:** the *principal* root"),
            vec![
                Inline::Strong(vec![text("Key:")]),
                text(" the "),
                Inline::Emphasis(vec![text("principal")]),
                text(" root"),
            ]
        );
    }

    #[test]
    fn test_nested_math_in_strong() {
        assert_eq!(
            parse_inlines("**never $\\pm 10$**"),
            vec![Inline::Strong(vec![text("never "), math("\\pm 10", None)])]
        );
    }

    #[test]
    fn test_code_and_stray_markers() {
        assert_eq!(
            parse_inlines("`x` times 3 * 4"),
            vec![Inline::Code("x".into()), text(" times 3 * 4")]
        );
    }
}
