//! Expansion of user-defined formula macros.

use super::notation::NotationError;
use crate::ast::Macro;
use std::collections::HashMap;

/// Nested macros are re-expanded at most this many times.
const MAX_EXPANSION_PASSES: usize = 10;

/// Expansion may add at most this many bytes to the notation.
pub const MAX_EXPANSION_GROWTH: usize = 64 * 1024;

/// Expand all macros in a notation string.
///
/// Fails when the expanded notation would grow past
/// [`MAX_EXPANSION_GROWTH`] bytes, e.g. for a self-referential macro.
pub fn expand_macros(
    content: &str,
    macros: &HashMap<String, Macro>,
) -> Result<String, NotationError> {
    if macros.is_empty() {
        return Ok(content.to_string());
    }

    let limit = content.len().saturating_add(MAX_EXPANSION_GROWTH);
    let mut result = content.to_string();

    for _ in 0..MAX_EXPANSION_PASSES {
        let mut changed = false;

        for (name, macro_def) in macros {
            let expanded = expand_single_macro(&result, name, macro_def, limit)?;
            if expanded != result {
                result = expanded;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    Ok(result)
}

/// Count the number of macro arguments (#1, #2, etc.) in a template.
pub fn count_macro_args(template: &str) -> usize {
    let mut max_arg = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '#' {
            if let Some(n) = chars.peek().and_then(|d| d.to_digit(10)) {
                max_arg = max_arg.max(n as usize);
            }
        }
    }

    max_arg
}

fn expand_single_macro(
    content: &str,
    name: &str,
    macro_def: &Macro,
    limit: usize,
) -> Result<String, NotationError> {
    let pattern = format!("\\{}", name);
    let mut result = String::new();
    let mut remaining = content;

    while let Some(pos) = remaining.find(&pattern) {
        if result.len() > limit {
            return Err(NotationError::ExpansionTooLarge(MAX_EXPANSION_GROWTH));
        }

        result.push_str(&remaining[..pos]);
        let after_name = &remaining[pos + pattern.len()..];

        // `\R` must not match the start of `\Rightarrow`
        if after_name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            result.push_str(&pattern);
            remaining = after_name;
            continue;
        }

        if macro_def.arg_count == 0 {
            result.push_str(&macro_def.template);
            remaining = after_name;
            continue;
        }

        match parse_macro_args(after_name, macro_def.arg_count) {
            Some((args, rest)) => {
                result.push_str(&substitute_args(&macro_def.template, &args));
                remaining = rest;
            }
            None => {
                result.push_str(&pattern);
                remaining = after_name;
            }
        }
    }

    result.push_str(remaining);
    if result.len() > limit {
        return Err(NotationError::ExpansionTooLarge(MAX_EXPANSION_GROWTH));
    }
    Ok(result)
}

fn parse_macro_args(input: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut args = Vec::with_capacity(count);
    let mut remaining = input;

    for _ in 0..count {
        remaining = remaining.trim_start();

        if !remaining.starts_with('{') {
            return None;
        }

        let mut depth = 0;
        let mut end = None;

        for (i, c) in remaining.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        let end = end?;
        args.push(&remaining[1..end]);
        remaining = &remaining[end + 1..];
    }

    Some((args, remaining))
}

fn substitute_args(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();

    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("#{}", i + 1), arg);
    }

    result
}
