//! Template text compilation
//!
//! A template string is split once into segments:
//!
//! - `/{.../}` escapes, kept verbatim and restored as `{...}` on output
//! - `{name}` placeholders where `name` is `[A-Za-z_][A-Za-z0-9_]*`
//! - everything else, including non-conforming braces, as literal text

use indexmap::IndexSet;
use lazy_regex::regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Escaped(String),
    Var(String),
}

/// Split `text` into segments and collect its variable names in order of first use
pub(crate) fn compile(text: &str) -> (Vec<Segment>, IndexSet<String>) {
    let escape = regex!(r"(?s)/\{(.*?)/\}");

    let mut segments = Vec::new();
    let mut variables = IndexSet::new();
    let mut last = 0;

    for caps in escape.captures_iter(text) {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((last, last));
        scan_placeholders(&text[last..whole.0], &mut segments, &mut variables);
        let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        segments.push(Segment::Escaped(inner.to_string()));
        last = whole.1;
    }
    scan_placeholders(&text[last..], &mut segments, &mut variables);

    (segments, variables)
}

fn scan_placeholders(text: &str, segments: &mut Vec<Segment>, variables: &mut IndexSet<String>) {
    let placeholder = regex!(r"\{([A-Za-z_][A-Za-z0-9_]*)\}");

    let mut last = 0;
    for caps in placeholder.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_literal(segments, &text[last..whole.start()]);
        segments.push(Segment::Var(name.as_str().to_string()));
        variables.insert(name.as_str().to_string());
        last = whole.end();
    }
    push_literal(segments, &text[last..]);
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(prev)) = segments.last_mut() {
        prev.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

/// Variable names referenced by `text`, excluding escaped regions
pub fn extract_variables(text: &str) -> IndexSet<String> {
    compile(text).1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(text: &str) -> Vec<String> {
        extract_variables(text).into_iter().collect()
    }

    #[test]
    fn test_extract_simple() {
        assert_eq!(vars("Hello {name}, you are {age}."), vec!["name", "age"]);
    }

    #[test]
    fn test_extract_dedupes_in_first_use_order() {
        assert_eq!(vars("{b} {a} {b}"), vec!["b", "a"]);
    }

    #[test]
    fn test_invalid_identifiers_ignored() {
        assert!(vars("{first name} {1st} {} {a-b} {name!}").is_empty());
        assert_eq!(vars("{_private} {x1}"), vec!["_private", "x1"]);
    }

    #[test]
    fn test_escaped_content_not_extracted() {
        assert_eq!(vars("Return /{\"key\": {value}/} for {input}"), vec!["input"]);
    }

    #[test]
    fn test_escape_spans_lines() {
        let (segments, variables) = compile("a /{\n  {x}\n/} b");
        assert!(variables.is_empty());
        assert_eq!(
            segments,
            vec![
                Segment::Literal("a ".to_string()),
                Segment::Escaped("\n  {x}\n".to_string()),
                Segment::Literal(" b".to_string()),
            ]
        );
    }

    #[test]
    fn test_segments_for_mixed_text() {
        let (segments, _) = compile("Echo: {user_input} {not valid}");
        assert_eq!(
            segments,
            vec![
                Segment::Literal("Echo: ".to_string()),
                Segment::Var("user_input".to_string()),
                Segment::Literal(" {not valid}".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_placeholders() {
        let (segments, variables) = compile("plain text");
        assert!(variables.is_empty());
        assert_eq!(segments, vec![Segment::Literal("plain text".to_string())]);
    }

    #[test]
    fn test_empty_text() {
        let (segments, variables) = compile("");
        assert!(segments.is_empty());
        assert!(variables.is_empty());
    }
}
