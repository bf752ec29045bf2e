//! Structural check of formula notation before typesetting.

use thiserror::Error;

/// Structural problems that make notation untypesettable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("unexpected `}}` at byte {0}")]
    UnexpectedCloseBrace(usize),

    #[error("{0} unclosed `{{`")]
    UnclosedBrace(usize),

    #[error("`\\begin{{{0}}}` is never closed")]
    UnclosedEnvironment(String),

    #[error("`\\end{{{found}}}` does not match `\\begin{{{expected}}}`")]
    MismatchedEnvironment { expected: String, found: String },

    #[error("`\\end{{{0}}}` without `\\begin`")]
    UnopenedEnvironment(String),

    #[error("`\\left` without matching `\\right`")]
    UnclosedLeft,

    #[error("`\\right` without matching `\\left`")]
    UnopenedRight,

    #[error("trailing backslash")]
    TrailingBackslash,

    #[error("`{0}` is missing its argument")]
    MissingScript(char),

    #[error("macro expansion grew by more than {0} bytes")]
    ExpansionTooLarge(usize),
}

/// Check that braces, environments, and `\left`/`\right` pairs balance.
pub fn check_notation(latex: &str) -> Result<(), NotationError> {
    let mut braces = 0usize;
    let mut environments: Vec<String> = Vec::new();
    let mut left_depth = 0usize;
    let mut chars = latex.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => {
                let Some(&(start, next)) = chars.peek() else {
                    return Err(NotationError::TrailingBackslash);
                };
                chars.next();

                if !next.is_ascii_alphabetic() {
                    // Escaped symbol such as `\{`, `\,` or `\\`
                    continue;
                }

                let mut end = start + next.len_utf8();
                while let Some(&(i, ch)) = chars.peek() {
                    if !ch.is_ascii_alphabetic() {
                        break;
                    }
                    end = i + ch.len_utf8();
                    chars.next();
                }

                match &latex[start..end] {
                    "left" => left_depth += 1,
                    "right" => {
                        left_depth = left_depth
                            .checked_sub(1)
                            .ok_or(NotationError::UnopenedRight)?;
                    }
                    "begin" => environments.push(environment_name(&latex[end..])),
                    "end" => {
                        let found = environment_name(&latex[end..]);
                        match environments.pop() {
                            Some(expected) if expected == found => {}
                            Some(expected) => {
                                return Err(NotationError::MismatchedEnvironment {
                                    expected,
                                    found,
                                })
                            }
                            None => return Err(NotationError::UnopenedEnvironment(found)),
                        }
                    }
                    _ => {}
                }
            }
            '{' => braces += 1,
            '}' => {
                braces = braces
                    .checked_sub(1)
                    .ok_or(NotationError::UnexpectedCloseBrace(pos))?;
            }
            '^' | '_' => {
                let rest = latex[pos + 1..].trim_start();
                if rest.is_empty() || rest.starts_with(['}', '&', '^', '_']) {
                    return Err(NotationError::MissingScript(c));
                }
            }
            _ => {}
        }
    }

    if braces > 0 {
        return Err(NotationError::UnclosedBrace(braces));
    }
    if let Some(env) = environments.pop() {
        return Err(NotationError::UnclosedEnvironment(env));
    }
    if left_depth > 0 {
        return Err(NotationError::UnclosedLeft);
    }

    Ok(())
}

/// Name in `{...}` directly after `\begin` or `\end`, empty if absent.
fn environment_name(after: &str) -> String {
    after
        .trim_start()
        .strip_prefix('{')
        .and_then(|s| s.split_once('}'))
        .map(|(name, _)| name.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_notation() {
        for expr in [
            "x^2+1",
            "\\sqrt{x^2}=|x|",
            "\\left(\\frac{a}{b}\\right)^{2}",
            "\\{1, 2\\}",
            "\\begin{aligned} x &= 2 \\\\ y &= 3 \\end{aligned}",
            "\\,\\sqrt{\\phantom{x}}\\, ",
            "a_{n+1} = a_n + d",
        ] {
            assert_eq!(check_notation(expr), Ok(()), "{expr}");
        }
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(check_notation("\\frac{1}{"), Err(NotationError::UnclosedBrace(1)));
        assert_eq!(check_notation("a}"), Err(NotationError::UnexpectedCloseBrace(1)));
    }

    #[test]
    fn test_environments() {
        assert_eq!(
            check_notation("\\begin{aligned} x"),
            Err(NotationError::UnclosedEnvironment("aligned".into()))
        );
        assert_eq!(
            check_notation("\\begin{cases} x \\end{matrix}"),
            Err(NotationError::MismatchedEnvironment {
                expected: "cases".into(),
                found: "matrix".into(),
            })
        );
        assert_eq!(
            check_notation("x \\end{cases}"),
            Err(NotationError::UnopenedEnvironment("cases".into()))
        );
    }

    #[test]
    fn test_left_right() {
        assert_eq!(check_notation("\\left( x"), Err(NotationError::UnclosedLeft));
        assert_eq!(check_notation("x \\right)"), Err(NotationError::UnopenedRight));
        // `\leftarrow` is not `\left`
        assert_eq!(check_notation("a \\leftarrow b"), Ok(()));
    }

    #[test]
    fn test_trailing_backslash_and_scripts() {
        assert_eq!(check_notation("x \\"), Err(NotationError::TrailingBackslash));
        assert_eq!(check_notation("x^"), Err(NotationError::MissingScript('^')));
        assert_eq!(check_notation("{x_}"), Err(NotationError::MissingScript('_')));
    }
}
