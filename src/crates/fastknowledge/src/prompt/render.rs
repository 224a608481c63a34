//! `{{ name }}` placeholder substitution.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_]\w*)\s*\}\}").unwrap());

/// Values substituted into a template, keyed by placeholder name.
pub type RenderVars<'a> = HashMap<&'a str, &'a str>;

/// Replace every `{{ name }}` token in `template` with its value.
///
/// Placeholders without a value render as the empty string. Everything
/// outside double braces, including single-brace text like `{history}`, is
/// copied unchanged.
pub fn render(template: &str, vars: &RenderVars<'_>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures<'_>| {
            vars.get(&caps[1]).copied().unwrap_or_default().to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &[(&'a str, &'a str)]) -> RenderVars<'a> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_whitespace_variants() {
        let v = vars(&[("input", "hello")]);
        assert_eq!(render("{{input}}", &v), "hello");
        assert_eq!(render("{{ input }}", &v), "hello");
        assert_eq!(render("{{   input\t}}", &v), "hello");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        assert_eq!(render("a{{ context }}b", &RenderVars::new()), "ab");
    }

    #[test]
    fn test_single_braces_are_literal() {
        let template = "Current conversation:\n{history}\nHuman: {input}\nAI:";
        assert_eq!(render(template, &vars(&[("input", "x")])), template);
    }

    #[test]
    fn test_values_are_not_re_rendered() {
        let v = vars(&[("question", "{{ context }}"), ("context", "secret")]);
        assert_eq!(render("Q: {{ question }}", &v), "Q: {{ context }}");
    }

    #[test]
    fn test_knowledge_template() {
        let template = "<known>{{ context }}</known>\n<question>{{ question }}</question>\n";
        let v = vars(&[("context", "doc1\ndoc2"), ("question", "why?")]);
        assert_eq!(
            render(template, &v),
            "<known>doc1\ndoc2</known>\n<question>why?</question>\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let v = vars(&[("input", "same")]);
        let template = "x {{ input }} y {{ input }}";
        assert_eq!(render(template, &v), render(template, &v));
    }
}
