use regex::Regex;

use crate::matcher::PatternError;

/// Default expression for a `:name` placeholder: one path segment.
const SEGMENT: &str = "[^/]+?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Literal(String),
    Capture {
        name: Option<String>,
        expression: Option<String>,
        prefixed: bool,
        modifier: Option<Modifier>,
    },
}

/// Positional capture regex compiled from a source pattern.
///
/// Each placeholder becomes a named group `k{index}` so that groups nested
/// inside custom expressions never shift the bindings.
#[derive(Debug, Clone)]
pub(crate) struct CaptureRegex {
    regex: Regex,
    keys: Vec<String>,
}

impl CaptureRegex {
    pub(crate) fn compile(pattern: &str) -> Result<Self, PatternError> {
        // A bare wildcard becomes an unnamed catch-all group.
        let widened = pattern.replacen('*', "(.*)", 1);
        let tokens = tokenize(&widened, pattern)?;

        let mut keys = Vec::new();
        let mut unnamed = 0usize;
        let mut body = String::new();

        for token in tokens {
            match token {
                Token::Literal(text) => body.push_str(&regex::escape(&text)),
                Token::Capture {
                    name,
                    expression,
                    prefixed,
                    modifier,
                } => {
                    let name = name.unwrap_or_else(|| {
                        let generated = unnamed.to_string();
                        unnamed += 1;
                        generated
                    });
                    let group = format!("k{}", keys.len());
                    keys.push(name);

                    let prefix = if prefixed { "/" } else { "" };
                    let expr = expression.as_deref().unwrap_or(SEGMENT);
                    let compiled = match modifier {
                        None => format!("{prefix}(?P<{group}>{expr})"),
                        Some(Modifier::Optional) => format!("(?:{prefix}(?P<{group}>{expr}))?"),
                        Some(Modifier::ZeroOrMore) => {
                            format!("(?:{prefix}(?P<{group}>(?:{expr})(?:/(?:{expr}))*))?")
                        }
                        Some(Modifier::OneOrMore) => {
                            format!("{prefix}(?P<{group}>(?:{expr})(?:/(?:{expr}))*)")
                        }
                    };
                    body.push_str(&compiled);
                }
            }
        }

        let regex = Regex::new(&format!("(?i)^{body}(?:/)?$")).map_err(|source| {
            PatternError::Regex {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self { regex, keys })
    }

    /// Ordered bindings for every placeholder that participated in the match.
    pub(crate) fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path)?;

        Some(
            self.keys
                .iter()
                .enumerate()
                .filter_map(|(idx, key)| {
                    caps.name(&format!("k{idx}"))
                        .map(|m| (key.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(source: &str, original: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut idx = 0;

    while idx < chars.len() {
        match chars[idx] {
            '\\' if idx + 1 < chars.len() => {
                literal.push(chars[idx + 1]);
                idx += 2;
            }
            ':' if chars.get(idx + 1).copied().is_some_and(is_name_char) => {
                let start = idx + 1;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                idx = end;

                let expression = if chars.get(idx) == Some(&'(') {
                    let (inner, next) = read_group(&chars, idx, original)?;
                    idx = next;
                    Some(inner)
                } else {
                    None
                };
                let modifier = read_modifier(&chars, &mut idx);

                push_capture(&mut tokens, &mut literal, Some(name), expression, modifier);
            }
            '(' => {
                let (inner, next) = read_group(&chars, idx, original)?;
                idx = next;
                let modifier = read_modifier(&chars, &mut idx);

                push_capture(&mut tokens, &mut literal, None, Some(inner), modifier);
            }
            c => {
                literal.push(c);
                idx += 1;
            }
        }
    }

    // One trailing slash is tolerated by the compiled expression itself.
    if literal.ends_with('/') && (literal.len() > 1 || !tokens.is_empty()) {
        literal.pop();
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    Ok(tokens)
}

fn push_capture(
    tokens: &mut Vec<Token>,
    literal: &mut String,
    name: Option<String>,
    expression: Option<String>,
    modifier: Option<Modifier>,
) {
    let prefixed = literal.ends_with('/');
    if prefixed {
        literal.pop();
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }

    tokens.push(Token::Capture {
        name,
        expression,
        prefixed,
        modifier,
    });
}

/// Reads a balanced `( … )` group starting at `open`; returns its inner text
/// and the index just past the closing parenthesis.
fn read_group(chars: &[char], open: usize, original: &str) -> Result<(String, usize), PatternError> {
    let mut depth = 0usize;
    let mut idx = open;

    while idx < chars.len() {
        match chars[idx] {
            '\\' => {
                idx += 2;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner: String = chars[open + 1..idx].iter().collect();
                    return Ok((inner, idx + 1));
                }
            }
            _ => {}
        }
        idx += 1;
    }

    Err(PatternError::UnbalancedGroup {
        pattern: original.to_string(),
    })
}

fn read_modifier(chars: &[char], idx: &mut usize) -> Option<Modifier> {
    let modifier = match chars.get(*idx) {
        Some('?') => Modifier::Optional,
        Some('*') => Modifier::ZeroOrMore,
        Some('+') => Modifier::OneOrMore,
        _ => return None,
    };
    *idx += 1;
    Some(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        CaptureRegex::compile(pattern).unwrap().captures(path)
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn named_placeholder_captures_one_segment() {
        assert_eq!(
            bindings("/posts/:slug", "/posts/hello"),
            Some(vec![pair("slug", "hello")])
        );
        assert_eq!(bindings("/posts/:slug", "/posts/hello/extra"), None);
    }

    #[test]
    fn trailing_slash_and_case_are_insignificant() {
        assert!(bindings("/docs/", "/docs").is_some());
        assert!(bindings("/docs", "/DOCS/").is_some());
    }

    #[test]
    fn first_wildcard_becomes_unnamed_group() {
        assert_eq!(
            bindings("/assets/*", "/assets/css/site.css"),
            Some(vec![pair("0", "css/site.css")])
        );
    }

    #[test]
    fn optional_placeholder_may_be_absent() {
        assert_eq!(bindings("/users/:id?", "/users"), Some(vec![]));
        assert_eq!(
            bindings("/users/:id?", "/users/7"),
            Some(vec![pair("id", "7")])
        );
    }

    #[test]
    fn repeated_placeholder_spans_segments() {
        assert_eq!(
            bindings("/files/:rest+", "/files/a/b/c"),
            Some(vec![pair("rest", "a/b/c")])
        );
        assert_eq!(bindings("/files/:rest+", "/files"), None);
    }

    #[test]
    fn custom_expression_constrains_placeholder() {
        assert!(bindings("/items/:id(\\d+)", "/items/42").is_some());
        assert!(bindings("/items/:id(\\d+)", "/items/abc").is_none());
    }

    #[test]
    fn literal_dots_are_escaped() {
        assert!(bindings("/a.html", "/a.html").is_some());
        assert!(bindings("/a.html", "/aXhtml").is_none());
    }

    #[test]
    fn unbalanced_group_is_an_error() {
        assert!(matches!(
            CaptureRegex::compile("/broken/(abc"),
            Err(PatternError::UnbalancedGroup { .. })
        ));
    }
}
