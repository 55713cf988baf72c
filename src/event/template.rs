//! Message template rendering.
//!
//! Holes take the form `{Name}`, `{@Name}`, `{$Name}`, `{Name,10}`,
//! `{Name,-10:format}`. `{{` and `}}` escape literal braces. Holes naming a
//! missing property are written back verbatim.

use indexmap::IndexMap;

use super::{FormatProvider, PropertyValue};

struct Hole<'a> {
    name: &'a str,
    alignment: Option<Alignment>,
    format: Option<&'a str>,
}

#[derive(Clone, Copy)]
struct Alignment {
    left: bool,
    width: usize,
}

/// Render `template` against `properties`.
pub fn render_template(
    template: &str,
    properties: &IndexMap<String, PropertyValue>,
    provider: Option<&dyn FormatProvider>,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        // Opening brace: a hole only if closed before the next opening brace.
        match tail[1..].find(['{', '}']) {
            Some(end) if tail.as_bytes()[end + 1] == b'}' => {
                let token = &tail[..end + 2];
                let inner = &tail[1..end + 1];
                match parse_hole(inner) {
                    Some(hole) => out.push_str(&render_hole(&hole, token, properties, provider)),
                    None => out.push_str(token),
                }
                rest = &tail[end + 2..];
            }
            _ => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn parse_hole(inner: &str) -> Option<Hole<'_>> {
    let body = inner.strip_prefix(['@', '$']).unwrap_or(inner);
    let (head, format) = match body.split_once(':') {
        Some((head, format)) => (head, Some(format)),
        None => (body, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => (name, Some(parse_alignment(alignment)?)),
        None => (head, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(Hole {
        name,
        alignment,
        format,
    })
}

fn parse_alignment(text: &str) -> Option<Alignment> {
    let text = text.trim();
    let (left, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    // Widths above u16::MAX cannot be formatted; such holes stay verbatim.
    digits.parse::<u16>().ok().map(|width| Alignment {
        left,
        width: usize::from(width),
    })
}

fn render_hole(
    hole: &Hole<'_>,
    token: &str,
    properties: &IndexMap<String, PropertyValue>,
    provider: Option<&dyn FormatProvider>,
) -> String {
    let Some(value) = properties.get(hole.name) else {
        return token.to_string();
    };
    let rendered = value.render(hole.format, provider);

    match hole.alignment {
        Some(Alignment { left: true, width }) => format!("{rendered:<width$}"),
        Some(Alignment { left: false, width }) => format!("{rendered:>width$}"),
        None => rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, PropertyValue)]) -> IndexMap<String, PropertyValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_render_simple_holes() {
        let p = props(&[("User", "ann".into()), ("Count", 3.into())]);
        assert_eq!(
            render_template("{User} has {Count} items", &p, None),
            "\"ann\" has 3 items"
        );
        assert_eq!(render_template("{User:l} logged in", &p, None), "ann logged in");
    }

    #[test]
    fn test_render_missing_property_keeps_token() {
        let p = props(&[]);
        assert_eq!(render_template("hello {Who}", &p, None), "hello {Who}");
    }

    #[test]
    fn test_render_escapes_and_stray_braces() {
        let p = props(&[("X", 1.into())]);
        assert_eq!(render_template("{{literal}} {X}", &p, None), "{literal} 1");
        assert_eq!(render_template("open { brace", &p, None), "open { brace");
        assert_eq!(render_template("a } b", &p, None), "a } b");
        assert_eq!(render_template("{not a hole}", &p, None), "{not a hole}");
    }

    #[test]
    fn test_render_destructure_and_alignment() {
        let p = props(&[("N", 42.into()), ("S", "ab".into())]);
        assert_eq!(render_template("[{N,5}]", &p, None), "[   42]");
        assert_eq!(render_template("[{S,-6:l}]", &p, None), "[ab    ]");
        assert_eq!(render_template("{@N} {$N}", &p, None), "42 42");
    }

    #[test]
    fn test_render_oversized_alignment_keeps_token() {
        let p = props(&[("N", 1.into())]);
        assert_eq!(render_template("value {N,70000}", &p, None), "value {N,70000}");
        assert_eq!(render_template("value {N,-70000:l}", &p, None), "value {N,-70000:l}");
        assert_eq!(render_template("{N,65535}", &p, None).len(), 65535);
    }
}
