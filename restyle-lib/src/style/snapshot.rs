use std::collections::HashMap;

use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{style::StyleRule, CssRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use log::{debug, warn};
use rayon::prelude::*;

use crate::document::StyledDocument;
use crate::style::owned_css::OwnedRule;

/// Every rule visible on a document at one instant, keyed by exact rule text.
///
/// Enumeration order is stylesheet order, then source order within a sheet. When the same
/// signature is reported twice the later record wins but keeps the earlier position.
#[derive(Debug, Clone, Default)]
pub struct StyleSnapshot {
    rules: Vec<OwnedRule>,
    index: HashMap<String, usize>,
}

impl StyleSnapshot {
    /// Captures the rules of every stylesheet `document` can enumerate.
    ///
    /// Sheets the document cannot enumerate, and sheets that fail to parse, are skipped.
    pub fn capture<D: StyledDocument + ?Sized>(document: &D) -> Self {
        let url = document.url();
        let sheets: Vec<String> = document
            .style_sheets()
            .into_iter()
            .enumerate()
            .filter_map(|(position, sheet)| match sheet {
                Ok(css) => Some(css),
                Err(e) => {
                    debug!("skipping stylesheet #{position} of {url}: {e}");
                    None
                }
            })
            .collect();

        let parsed: Vec<Vec<OwnedRule>> = sheets
            .par_iter()
            .map(|css| {
                parse_sheet(css).unwrap_or_else(|e| {
                    warn!("skipping unparsable stylesheet of {url} ({}): {e}", first_line(css));
                    Vec::new()
                })
            })
            .collect();

        let snapshot = Self::from_rules(parsed.into_iter().flatten());
        debug!(
            "captured {} rules from {} stylesheets of {url}",
            snapshot.len(),
            sheets.len()
        );
        snapshot
    }

    pub fn from_rules(rules: impl IntoIterator<Item = OwnedRule>) -> Self {
        let mut snapshot = StyleSnapshot::default();
        for rule in rules {
            snapshot.insert(rule);
        }
        snapshot
    }

    fn insert(&mut self, rule: OwnedRule) {
        match self.index.get(rule.signature()) {
            Some(&position) => self.rules[position] = rule,
            None => {
                self.index
                    .insert(rule.signature().to_string(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.index.contains_key(signature)
    }

    pub fn get(&self, signature: &str) -> Option<&OwnedRule> {
        self.index.get(signature).map(|&position| &self.rules[position])
    }

    /// Rules in enumeration order.
    pub fn rules(&self) -> impl Iterator<Item = &OwnedRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// First line of a sheet, for log messages.
fn first_line(css: &str) -> &str {
    css.lines().next().unwrap_or_default().trim()
}

/// Parses one stylesheet and prints each top-level rule back to text.
pub fn parse_sheet(css_text: &str) -> Result<Vec<OwnedRule>, String> {
    let parser_opts = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css_text, parser_opts).map_err(|e| e.to_string())?;

    let mut owned_rules = Vec::with_capacity(sheet.rules.0.len());
    for rule in &sheet.rules.0 {
        let printed = match rule.to_css_string(PrinterOptions::default()) {
            Ok(printed) => printed,
            Err(e) => {
                debug!("cannot print rule: {e}");
                continue;
            }
        };
        if printed.trim().is_empty() {
            continue;
        }

        match rule {
            CssRule::Style(style_rule) => {
                owned_rules.push(OwnedRule::style(selector_text(style_rule), printed))
            }
            _ => owned_rules.push(OwnedRule::at_rule(printed)),
        }
    }

    Ok(owned_rules)
}

fn selector_text(style_rule: &StyleRule<'_>) -> String {
    let mut selectors_vec = Vec::new();
    for selector in &style_rule.selectors.0 {
        if let Ok(sel_str) = selector.to_css_string(PrinterOptions::default()) {
            selectors_vec.push(sel_str);
        }
    }
    selectors_vec.join(", ")
}
