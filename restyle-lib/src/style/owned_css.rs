// Fully-owned rule records, detached from the lightningcss stylesheet they were printed from.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRule {
    /// e.g. "div, .red". `None` for at-rules such as `@media`.
    pub selector_text: Option<String>,
    /// The whole rule as serialized by the style engine. Doubles as its signature.
    pub css_text: String,
}

impl OwnedRule {
    pub fn style(selector_text: impl Into<String>, css_text: impl Into<String>) -> Self {
        OwnedRule {
            selector_text: Some(selector_text.into()),
            css_text: css_text.into(),
        }
    }

    pub fn at_rule(css_text: impl Into<String>) -> Self {
        OwnedRule {
            selector_text: None,
            css_text: css_text.into(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.css_text
    }

    /// Re-derives the declaration list from the rule text.
    ///
    /// The selector prefix and the enclosing braces are stripped and the body is split on
    /// semicolons. Pieces are trimmed but empty ones are kept, so a trailing `;` shows up
    /// as a final empty piece. Returns `None` for at-rules.
    pub fn declarations(&self) -> Option<Vec<&str>> {
        let selector = self.selector_text.as_deref()?;
        let rest = match self.css_text.strip_prefix(selector) {
            Some(rest) => rest,
            None => &self.css_text[self.css_text.find('{')?..],
        };

        let body = rest.trim();
        let body = body.strip_prefix('{').unwrap_or(body).trim_start();
        let body = body.strip_suffix('}').unwrap_or(body).trim_end();

        Some(body.split(';').map(str::trim).collect())
    }
}

impl fmt::Display for OwnedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css_text)
    }
}
