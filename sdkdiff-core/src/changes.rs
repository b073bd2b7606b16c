//! Change records produced by the diff engine and the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{AccessLevel, DeclKind};

/// Change map keyed by target name.
///
/// The empty key holds library-set changes. `BTreeMap` keeps iteration
/// order independent of insertion order.
pub type ChangeMap = BTreeMap<String, Vec<Change>>;

/// Key under which library-set changes are stored.
pub const LIBRARY_CHANGES_KEY: &str = "";

/// Type of change detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Addition,
    Removal,
    Modification,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Addition => "addition",
            ChangeType::Removal => "removal",
            ChangeType::Modification => "modification",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration modifiers compared on a matched pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Static,
    Final,
    Mutating,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Mutating => "mutating",
        }
    }
}

/// One differing field of a matched declaration pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldChange {
    Signature { old: String, new: String },
    Access { old: AccessLevel, new: AccessLevel },
    Modifier { modifier: Modifier, old: bool, new: bool },
    Conformances { added: Vec<String>, removed: Vec<String> },
    Availability { old: Vec<String>, new: Vec<String> },
    Deprecation { old: bool, new: bool },
}

impl FieldChange {
    /// Whether this difference can break existing consumers.
    pub fn is_breaking(&self) -> bool {
        match self {
            FieldChange::Signature { .. } => true,
            FieldChange::Access { old, new } => new < old,
            FieldChange::Modifier { modifier, new, .. } => match modifier {
                Modifier::Static | Modifier::Mutating => true,
                // Sealing a type breaks subclasses; unsealing does not.
                Modifier::Final => *new,
            },
            FieldChange::Conformances { removed, .. } => !removed.is_empty(),
            FieldChange::Availability { .. } | FieldChange::Deprecation { .. } => false,
        }
    }

    /// Human-readable description encoding the old and new value.
    pub fn describe(&self) -> String {
        match self {
            FieldChange::Signature { old, new } => format!(
                "signature changed from `{}` to `{}`",
                or_none(old),
                or_none(new)
            ),
            FieldChange::Access { old, new } => {
                format!("access level changed from `{}` to `{}`", old, new)
            }
            FieldChange::Modifier { modifier, new, .. } => {
                if *new {
                    format!("`{}` was added", modifier.as_str())
                } else {
                    format!("`{}` was removed", modifier.as_str())
                }
            }
            FieldChange::Conformances { added, removed } => {
                let mut parts = Vec::new();
                if !added.is_empty() {
                    parts.push(format!("conformances added: {}", backticked(added)));
                }
                if !removed.is_empty() {
                    parts.push(format!("conformances removed: {}", backticked(removed)));
                }
                parts.join("; ")
            }
            FieldChange::Availability { old, new } => format!(
                "availability changed from `{}` to `{}`",
                or_none(&old.join(", ")),
                or_none(&new.join(", "))
            ),
            FieldChange::Deprecation { new, .. } => {
                if *new {
                    "was deprecated".to_string()
                } else {
                    "is no longer deprecated".to_string()
                }
            }
        }
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "none"
    } else {
        value
    }
}

fn backticked(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{}`", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single detected difference.
///
/// Only `changeType`, `parentName` and `changeDescription` are part of the
/// machine-readable output; `kind` and `details` are in-process metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub change_type: ChangeType,
    pub parent_name: String,
    pub change_description: String,
    #[serde(skip)]
    pub kind: Option<DeclKind>,
    #[serde(skip)]
    pub details: Vec<FieldChange>,
}

impl Change {
    pub fn new(
        change_type: ChangeType,
        parent_name: impl Into<String>,
        change_description: impl Into<String>,
    ) -> Self {
        Self {
            change_type,
            parent_name: parent_name.into(),
            change_description: change_description.into(),
            kind: None,
            details: Vec::new(),
        }
    }

    pub fn addition(parent_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeType::Addition, parent_name, description)
    }

    pub fn removal(parent_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeType::Removal, parent_name, description)
    }

    pub fn modification(parent_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeType::Modification, parent_name, description)
    }

    /// Sentinel for a target that only exists in the old version.
    pub fn removed_target() -> Self {
        Self::removal("", "Target was removed")
    }

    /// Sentinel for a target that only exists in the new version.
    pub fn added_target() -> Self {
        Self::addition("", "Target was added")
    }

    /// Entry recording that a target could not be compared.
    pub fn target_failed(reason: impl fmt::Display) -> Self {
        Self::modification("", format!("Target could not be analyzed: {}", reason))
    }

    /// Set the declaration kind.
    pub fn with_kind(mut self, kind: DeclKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set field-level details.
    pub fn with_details(mut self, details: Vec<FieldChange>) -> Self {
        self.details = details;
        self
    }

    /// Whether this change can break existing consumers.
    ///
    /// Removals always break, additions never do, modifications break when
    /// any of their field changes does. Modifications without details
    /// (target-level error entries) are treated as non-breaking.
    pub fn is_breaking(&self) -> bool {
        match self.change_type {
            ChangeType::Removal => true,
            ChangeType::Addition => false,
            ChangeType::Modification => self.details.iter().any(FieldChange::is_breaking),
        }
    }

    /// Sort key used for the deterministic output order.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.parent_name, &self.change_description)
    }
}

/// Sort changes by `(parent_name, change_description)`.
pub fn sort_changes(changes: &mut [Change]) {
    changes.sort_by(|a, b| {
        a.sort_key()
            .cmp(&b.sort_key())
            .then_with(|| a.change_type.cmp(&b.change_type))
    });
}

/// Summary statistics over a change map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub additions: u32,
    pub removals: u32,
    pub modifications: u32,
    pub breaking_changes: u32,
}

impl ChangeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize every change in a map.
    pub fn from_map(changes: &ChangeMap) -> Self {
        let mut summary = Self::new();
        for change in changes.values().flatten() {
            summary.record(change);
        }
        summary
    }

    /// Increment counters for one change.
    pub fn record(&mut self, change: &Change) {
        match change.change_type {
            ChangeType::Addition => self.additions += 1,
            ChangeType::Removal => self.removals += 1,
            ChangeType::Modification => self.modifications += 1,
        }

        if change.is_breaking() {
            self.breaking_changes += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.additions + self.removals + self.modifications
    }

    /// Generate human-readable summary string.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        if self.additions > 0 {
            parts.push(format!("{} added", self.additions));
        }
        if self.modifications > 0 {
            parts.push(format!("{} modified", self.modifications));
        }
        if self.removals > 0 {
            parts.push(format!("{} removed", self.removals));
        }

        if parts.is_empty() {
            "No changes".to_string()
        } else {
            format!("{} ({} breaking)", parts.join(", "), self.breaking_changes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_as_str() {
        assert_eq!(ChangeType::Addition.as_str(), "addition");
        assert_eq!(ChangeType::Removal.as_str(), "removal");
        assert_eq!(ChangeType::Modification.as_str(), "modification");
    }

    #[test]
    fn test_change_serialization_shape() {
        let change = Change::addition("Foo", "`func baz()` was added")
            .with_kind(DeclKind::Function)
            .with_details(vec![FieldChange::Deprecation {
                old: false,
                new: true,
            }]);

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "changeType": "addition",
                "parentName": "Foo",
                "changeDescription": "`func baz()` was added"
            })
        );
    }

    #[test]
    fn test_removal_is_breaking() {
        assert!(Change::removal("Foo", "x").is_breaking());
        assert!(!Change::addition("Foo", "x").is_breaking());
        assert!(Change::removed_target().is_breaking());
        assert!(!Change::target_failed("boom").is_breaking());
    }

    #[test]
    fn test_access_narrowing_is_breaking() {
        let narrowing = FieldChange::Access {
            old: AccessLevel::Open,
            new: AccessLevel::Public,
        };
        let widening = FieldChange::Access {
            old: AccessLevel::Public,
            new: AccessLevel::Open,
        };
        assert!(narrowing.is_breaking());
        assert!(!widening.is_breaking());
        assert_eq!(
            narrowing.describe(),
            "access level changed from `open` to `public`"
        );
    }

    #[test]
    fn test_informational_field_changes() {
        let availability = FieldChange::Availability {
            old: vec![],
            new: vec!["iOS 15.0".to_string()],
        };
        assert!(!availability.is_breaking());
        assert_eq!(
            availability.describe(),
            "availability changed from `none` to `iOS 15.0`"
        );

        let deprecation = FieldChange::Deprecation {
            old: false,
            new: true,
        };
        assert!(!deprecation.is_breaking());

        let modification = Change::modification("Foo", "x").with_details(vec![availability, deprecation]);
        assert!(!modification.is_breaking());
    }

    #[test]
    fn test_final_only_breaks_when_added() {
        let added = FieldChange::Modifier {
            modifier: Modifier::Final,
            old: false,
            new: true,
        };
        let removed = FieldChange::Modifier {
            modifier: Modifier::Final,
            old: true,
            new: false,
        };
        assert!(added.is_breaking());
        assert!(!removed.is_breaking());
        assert_eq!(removed.describe(), "`final` was removed");
    }

    #[test]
    fn test_conformance_removal_is_breaking() {
        let change = FieldChange::Conformances {
            added: vec!["Hashable".to_string()],
            removed: vec!["Equatable".to_string()],
        };
        assert!(change.is_breaking());
        assert_eq!(
            change.describe(),
            "conformances added: `Hashable`; conformances removed: `Equatable`"
        );
    }

    #[test]
    fn test_sort_changes() {
        let mut changes = vec![
            Change::addition("B", "b"),
            Change::removal("A", "z"),
            Change::addition("A", "a"),
        ];
        sort_changes(&mut changes);

        let keys: Vec<_> = changes.iter().map(|c| c.sort_key()).collect();
        assert_eq!(keys, vec![("A", "a"), ("A", "z"), ("B", "b")]);
    }

    #[test]
    fn test_summary_text() {
        let mut map = ChangeMap::new();
        map.insert(
            "Target".to_string(),
            vec![
                Change::addition("", "a"),
                Change::addition("", "b"),
                Change::removal("", "c"),
            ],
        );

        let summary = ChangeSummary::from_map(&map);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.breaking_changes, 1);
        assert_eq!(summary.text(), "2 added, 1 removed (1 breaking)");
        assert_eq!(ChangeSummary::default().text(), "No changes");
    }
}
