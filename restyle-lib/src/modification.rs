use serde::{Deserialize, Serialize};

use crate::error::ModificationError;

/// One recorded change-set tied to the page it was recorded on.
///
/// Only the description can change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    target_url: String,
    description: String,
    changes: String,
}

impl Modification {
    pub fn new(target_url: impl Into<String>, changes: impl Into<String>) -> Self {
        Modification {
            target_url: target_url.into(),
            description: String::new(),
            changes: changes.into(),
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Ready-to-emit CSS, already diffed and filtered.
    pub fn changes(&self) -> &str {
        &self.changes
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}

/// Modifications in the order they were recorded, which is also the order their CSS is
/// concatenated into the exported stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModificationSet {
    entries: Vec<Modification>,
}

impl ModificationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modification: Modification) {
        self.entries.push(modification);
    }

    pub fn get(&self, index: usize) -> Option<&Modification> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Modification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_description(
        &mut self,
        index: usize,
        description: impl Into<String>,
    ) -> Result<(), ModificationError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(ModificationError::OutOfRange { index, len })?;
        entry.set_description(description);
        Ok(())
    }

    /// Removes the entry at `index`. The last remaining entry cannot be removed.
    pub fn remove(&mut self, index: usize) -> Result<Modification, ModificationError> {
        let len = self.entries.len();
        if index >= len {
            return Err(ModificationError::OutOfRange { index, len });
        }
        if len == 1 {
            return Err(ModificationError::LastModification);
        }
        Ok(self.entries.remove(index))
    }

    /// Export needs at least one modification.
    pub fn can_export(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Every entry's changes, in order, separated by newlines.
    pub fn aggregated_css(&self) -> String {
        self.entries
            .iter()
            .map(Modification::changes)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a ModificationSet {
    type Item = &'a Modification;
    type IntoIter = std::slice::Iter<'a, Modification>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Modification> for ModificationSet {
    fn from_iter<I: IntoIterator<Item = Modification>>(iter: I) -> Self {
        ModificationSet {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_entries() -> ModificationSet {
        vec![
            Modification::new("https://example.com/a", "a{color:red}"),
            Modification::new("https://example.com/b", "b{color:blue}"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_aggregated_css_joins_in_order() {
        assert_eq!(two_entries().aggregated_css(), "a{color:red}\nb{color:blue}");
    }

    #[test]
    fn test_last_entry_cannot_be_removed() {
        let mut mods = two_entries();

        let removed = mods.remove(0).unwrap();
        assert_eq!(removed.changes(), "a{color:red}");
        assert_eq!(mods.remove(0), Err(ModificationError::LastModification));
        assert_eq!(mods.len(), 1);
        assert!(mods.can_export());
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut mods = two_entries();
        assert_eq!(
            mods.remove(2),
            Err(ModificationError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            mods.set_description(7, "x"),
            Err(ModificationError::OutOfRange { index: 7, len: 2 })
        );
    }

    #[test]
    fn test_description_is_editable() {
        let mut mods = two_entries();
        mods.set_description(1, "Blue links").unwrap();
        assert_eq!(mods.get(1).unwrap().description(), "Blue links");
        assert_eq!(mods.get(0).unwrap().description(), "");
    }

    #[test]
    fn test_empty_set_cannot_export() {
        let mods = ModificationSet::new();
        assert!(!mods.can_export());
        assert_eq!(mods.aggregated_css(), "");
    }

    #[test]
    fn test_serializes_as_a_plain_list() {
        let mut mods = ModificationSet::new();
        mods.push(Modification::new("https://example.com/", "a{color:red}"));

        let json = serde_json::to_string(&mods).unwrap();

        assert_eq!(
            json,
            r#"[{"target_url":"https://example.com/","description":"","changes":"a{color:red}"}]"#
        );
    }
}
