//! Isolates the rules a user introduced between two snapshots.
//!
//! Rules are compared only by their exact printed text. An edited rule therefore shows up
//! as a new rule, and its previous form is never reported as removed.

use log::debug;

use crate::style::owned_css::OwnedRule;
use crate::style::snapshot::StyleSnapshot;

/// Rule blocks present in `current` but absent from `baseline`, in `current`'s order.
///
/// Declarations referencing `url(` are dropped from every emitted block.
pub fn new_rules(baseline: &StyleSnapshot, current: &StyleSnapshot) -> Vec<String> {
    current
        .rules()
        .filter(|rule| !baseline.contains(rule.signature()))
        .filter_map(|rule| {
            let block = rewrap_without_urls(rule);
            if block.is_none() {
                debug!("not emitting new at-rule: {}", rule.css_text);
            }
            block
        })
        .collect()
}

/// The `changes` text of a recording: new rule blocks joined by newlines.
pub fn changes(baseline: &StyleSnapshot, current: &StyleSnapshot) -> String {
    new_rules(baseline, current).join("\n")
}

fn rewrap_without_urls(rule: &OwnedRule) -> Option<String> {
    let selector = rule.selector_text.as_deref()?;
    let declarations = rule.declarations()?;
    let kept: Vec<&str> = declarations
        .into_iter()
        .filter(|declaration| !declaration.contains("url("))
        .collect();
    Some(format!("{selector}{{{}}}", kept.join(";")))
}
