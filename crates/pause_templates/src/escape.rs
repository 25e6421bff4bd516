//! Escaping of profile data for the target markup.
//!
//! Each function is a per-character substitution table; `prepare_data`
//! applies the table matching a template type to every string in the
//! document, leaving keys and non-string values alone.

use serde_json::{Map, Value};

use crate::manifest::TemplateType;

/// Escape LaTeX special characters: `\ & % $ # _ { } ~ ^`.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape HTML entities.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape Typst markup characters: `\ * _ ` # [ ] < > @ $`.
pub fn escape_typst(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '*' | '_' | '`' | '#' | '[' | ']' | '<' | '>' | '@' | '$'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Apply `escape` to every string leaf of `data`.
pub fn deep_escape(data: &Value, escape: fn(&str) -> String) -> Value {
    match data {
        Value::String(s) => Value::String(escape(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| deep_escape(v, escape)).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), deep_escape(v, escape)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// Escape a data document for the given template type.
///
/// Markdown output is passed through unchanged.
pub fn prepare_data(data: &Value, template_type: TemplateType) -> Value {
    match template_type {
        TemplateType::Latex => deep_escape(data, escape_latex),
        TemplateType::Typst => deep_escape(data, escape_typst),
        TemplateType::Html => deep_escape(data, escape_html),
        TemplateType::Markdown => data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("R&D 100% $5 #1 a_b {x}"), "R\\&D 100\\% \\$5 \\#1 a\\_b \\{x\\}");
        assert_eq!(escape_latex("a\\b~c^d"), "a\\textbackslash{}b\\textasciitilde{}c\\textasciicircum{}d");
        assert_eq!(escape_latex(""), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("*bold* @me #tag $x$"), "\\*bold\\* \\@me \\#tag \\$x\\$");
        assert_eq!(escape_typst("a\\b [c] <d>"), "a\\\\b \\[c\\] \\<d\\>");
    }

    #[test]
    fn test_prepare_data_keeps_keys_and_scalars() {
        let data = json!({
            "basics": { "name": "A & B", "years_active": 3 },
            "skills": [{ "name": "C#", "level": null }]
        });

        let latex = prepare_data(&data, TemplateType::Latex);
        assert_eq!(latex["basics"]["name"], "A \\& B");
        assert_eq!(latex["basics"]["years_active"], 3);
        assert_eq!(latex["skills"][0]["name"], "C\\#");
        assert!(latex["skills"][0]["level"].is_null());

        assert_eq!(prepare_data(&data, TemplateType::Markdown), data);
        assert_eq!(prepare_data(&data, TemplateType::Html)["basics"]["name"], "A &amp; B");
    }
}
