//! The fixed contract between the builder and the template archive.
//!
//! Rewrites are plain text substitutions. Every placeholder must occur exactly once in its
//! entry; anything else means the template is not the one the builder was written for.

use serde::Deserialize;

use crate::error::PackageError;

/// Entry paths and placeholder tokens of the template archive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    pub manifest_entry: String,
    pub script_entry: String,
    pub stylesheet_entry: String,
    pub name_placeholder: String,
    pub description_placeholder: String,
    /// Empty creator element; the author is written between its tags.
    pub creator_placeholder: String,
    /// Quoted wildcard literal in the activation script.
    pub scope_placeholder: String,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        TemplateLayout {
            manifest_entry: "install.rdf".to_string(),
            script_entry: "resources/theme-my-site-template/lib/main.js".to_string(),
            stylesheet_entry: "resources/theme-my-site-template/data/style.css".to_string(),
            name_placeholder: "theme-my-site-template".to_string(),
            description_placeholder: "a basic add-on".to_string(),
            creator_placeholder: "<em:creator></em:creator>".to_string(),
            scope_placeholder: "'*'".to_string(),
        }
    }
}

impl TemplateLayout {
    pub fn rewrite_manifest(
        &self,
        manifest: &str,
        name: &str,
        description: &str,
        author: &str,
    ) -> Result<String, PackageError> {
        let name = xml_escape(name);
        let description = xml_escape(description);
        let creator = self.creator_element(&xml_escape(author));
        substitute(
            manifest,
            &self.manifest_entry,
            &[
                (self.name_placeholder.as_str(), name.as_str()),
                (self.description_placeholder.as_str(), description.as_str()),
                (self.creator_placeholder.as_str(), creator.as_str()),
            ],
        )
    }

    /// An unquoted scope placeholder receives the scope verbatim.
    pub fn rewrite_script(&self, script: &str, scope: &str) -> Result<String, PackageError> {
        let quoted = match quote_char(&self.scope_placeholder) {
            Some(q) => format!("{q}{}{q}", js_string_escape(scope, q)),
            None => scope.to_string(),
        };
        substitute(
            script,
            &self.script_entry,
            &[(self.scope_placeholder.as_str(), quoted.as_str())],
        )
    }

    // `<em:creator></em:creator>` becomes `<em:creator>AUTHOR</em:creator>`.
    fn creator_element(&self, author: &str) -> String {
        let placeholder = &self.creator_placeholder;
        match placeholder.find("></") {
            Some(split) => format!(
                "{}{author}{}",
                &placeholder[..=split],
                &placeholder[split + 1..]
            ),
            None => author.to_string(),
        }
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

// Escapes `text` for the inside of a JavaScript string literal delimited by `quote`.
fn js_string_escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

fn quote_char(literal: &str) -> Option<char> {
    let first = literal.chars().next()?;
    let last = literal.chars().last()?;
    (literal.len() >= 2 && first == last && (first == '\'' || first == '"')).then_some(first)
}

/// Replaces the single occurrence of each placeholder in `text`.
///
/// All placeholders are located in the original text before anything is replaced, so a
/// replacement value can never be mistaken for a later placeholder.
pub fn substitute(
    text: &str,
    entry: &str,
    substitutions: &[(&str, &str)],
) -> Result<String, PackageError> {
    let mut spans = Vec::with_capacity(substitutions.len());
    for &(placeholder, replacement) in substitutions {
        let start = locate_once(text, entry, placeholder)?;
        spans.push((start, start + placeholder.len(), replacement));
    }
    spans.sort_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end, replacement) in spans {
        if start < cursor {
            // Two placeholders overlap; the template cannot satisfy both.
            return Err(PackageError::Placeholder {
                entry: entry.to_string(),
                placeholder: text[start..end].to_string(),
                found: 2,
            });
        }
        out.push_str(&text[cursor..start]);
        out.push_str(replacement);
        log::debug!("{entry}: {:?} -> {replacement:?}", &text[start..end]);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn locate_once(text: &str, entry: &str, placeholder: &str) -> Result<usize, PackageError> {
    let mut matches = text.match_indices(placeholder).map(|(start, _)| start);
    let first = if placeholder.is_empty() { None } else { matches.next() };
    match (first, matches.next()) {
        (Some(start), None) => Ok(start),
        (first, _) => Err(PackageError::Placeholder {
            entry: entry.to_string(),
            placeholder: placeholder.to_string(),
            found: if first.is_none() {
                0
            } else {
                text.matches(placeholder).count()
            },
        }),
    }
}
