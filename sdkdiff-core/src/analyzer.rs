//! Structural diff of two normalized dumps.
//!
//! Siblings are matched by `(kind, name)` and, inside such a group, by
//! signature. The walk recurses into every matched pair, so changes deep
//! inside a type are found even when the type itself was modified.

use std::collections::{BTreeMap, BTreeSet};

use crate::changes::{sort_changes, Change, FieldChange, Modifier};
use crate::model::{DeclKind, Declaration, SdkDump};

/// Computes the changes between two dumps of the same target.
///
/// Implementations are pure and total: a change list is always produced.
pub trait SdkDumpAnalyzing: Send + Sync {
    fn analyze(&self, old: &SdkDump, new: &SdkDump) -> Vec<Change>;
}

/// Default [`SdkDumpAnalyzing`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkDumpAnalyzer;

impl SdkDumpAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SdkDumpAnalyzing for SdkDumpAnalyzer {
    fn analyze(&self, old: &SdkDump, new: &SdkDump) -> Vec<Change> {
        diff_dumps(old, new)
    }
}

/// Diff two dumps, sorted by `(parent_name, change_description)`.
pub fn diff_dumps(old: &SdkDump, new: &SdkDump) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_children(&old.root, &new.root, &mut changes);
    sort_changes(&mut changes);
    changes
}

type GroupKey<'a> = (DeclKind, &'a str);

/// Children grouped by identity key, each group in canonical order.
fn group(children: &[Declaration]) -> BTreeMap<GroupKey<'_>, Vec<&Declaration>> {
    let mut groups: BTreeMap<GroupKey<'_>, Vec<&Declaration>> = BTreeMap::new();
    for child in children {
        groups
            .entry((child.kind, child.name.as_str()))
            .or_default()
            .push(child);
    }
    for members in groups.values_mut() {
        members.sort();
    }
    groups
}

struct Pairing<'a> {
    matched: Vec<(&'a Declaration, &'a Declaration)>,
    removed: Vec<&'a Declaration>,
    added: Vec<&'a Declaration>,
}

/// Move every `old` entry with a partner in `new` (per `same`) into `matched`.
fn match_exact<'a>(
    old: Vec<&'a Declaration>,
    new: &mut Vec<&'a Declaration>,
    matched: &mut Vec<(&'a Declaration, &'a Declaration)>,
    same: impl Fn(&Declaration, &Declaration) -> bool,
) -> Vec<&'a Declaration> {
    let mut unmatched = Vec::new();
    for old_decl in old {
        match new.iter().position(|n| same(old_decl, n)) {
            Some(index) => matched.push((old_decl, new.remove(index))),
            None => unmatched.push(old_decl),
        }
    }
    unmatched
}

/// Pair one identity group: exact signature and staticness first, then
/// signature alone, then a single leftover pair. Any other leftovers stay
/// unmatched.
///
/// Staticness is not part of the signature, so an instance member and a
/// static member with the same shape may coexist in one type.
fn pair_group<'a>(old: Vec<&'a Declaration>, mut new: Vec<&'a Declaration>) -> Pairing<'a> {
    let mut matched = Vec::new();

    let old = match_exact(old, &mut new, &mut matched, |o, n| {
        o.signature == n.signature && o.attributes.is_static == n.attributes.is_static
    });
    let removed = match_exact(old, &mut new, &mut matched, |o, n| o.signature == n.signature);

    if removed.len() == 1 && new.len() == 1 {
        matched.push((removed[0], new[0]));
        return Pairing {
            matched,
            removed: Vec::new(),
            added: Vec::new(),
        };
    }

    Pairing {
        matched,
        removed,
        added: new,
    }
}

fn diff_children(old_parent: &Declaration, new_parent: &Declaration, changes: &mut Vec<Change>) {
    let parent_name = new_parent.qualified_path();

    let mut old_groups = group(&old_parent.children);
    let mut new_groups = group(&new_parent.children);
    let keys: BTreeSet<GroupKey<'_>> = old_groups.keys().chain(new_groups.keys()).copied().collect();

    for key in keys {
        let old = old_groups.remove(&key).unwrap_or_default();
        let new = new_groups.remove(&key).unwrap_or_default();
        let pairing = pair_group(old, new);

        for decl in pairing.removed {
            changes.push(
                Change::removal(&parent_name, format!("`{}` was removed", decl.display()))
                    .with_kind(decl.kind),
            );
        }

        for decl in pairing.added {
            changes.push(
                Change::addition(&parent_name, format!("`{}` was added", decl.display()))
                    .with_kind(decl.kind),
            );
        }

        for (old_decl, new_decl) in pairing.matched {
            let details = field_changes(old_decl, new_decl);
            if !details.is_empty() {
                let description = details
                    .iter()
                    .map(FieldChange::describe)
                    .collect::<Vec<_>>()
                    .join("; ");
                changes.push(
                    Change::modification(
                        &parent_name,
                        format!("`{}` was modified: {}", old_decl.display(), description),
                    )
                    .with_kind(old_decl.kind)
                    .with_details(details),
                );
            }

            diff_children(old_decl, new_decl, changes);
        }
    }
}

/// Every differing comparable field of a matched pair.
fn field_changes(old: &Declaration, new: &Declaration) -> Vec<FieldChange> {
    let mut details = Vec::new();

    if old.signature != new.signature {
        details.push(FieldChange::Signature {
            old: old.signature.clone(),
            new: new.signature.clone(),
        });
    }

    let (old_attrs, new_attrs) = (&old.attributes, &new.attributes);

    if old_attrs.access != new_attrs.access {
        details.push(FieldChange::Access {
            old: old_attrs.access,
            new: new_attrs.access,
        });
    }

    let modifiers = [
        (Modifier::Static, old_attrs.is_static, new_attrs.is_static),
        (Modifier::Final, old_attrs.is_final, new_attrs.is_final),
        (Modifier::Mutating, old_attrs.is_mutating, new_attrs.is_mutating),
    ];
    for (modifier, old_value, new_value) in modifiers {
        if old_value != new_value {
            details.push(FieldChange::Modifier {
                modifier,
                old: old_value,
                new: new_value,
            });
        }
    }

    if old.conformances != new.conformances {
        let old_set: BTreeSet<&String> = old.conformances.iter().collect();
        let new_set: BTreeSet<&String> = new.conformances.iter().collect();
        details.push(FieldChange::Conformances {
            added: new_set.difference(&old_set).map(|s| s.to_string()).collect(),
            removed: old_set.difference(&new_set).map(|s| s.to_string()).collect(),
        });
    }

    if old_attrs.availability != new_attrs.availability {
        details.push(FieldChange::Availability {
            old: old_attrs.availability.clone(),
            new: new_attrs.availability.clone(),
        });
    }

    if old_attrs.deprecated != new_attrs.deprecated {
        details.push(FieldChange::Deprecation {
            old: old_attrs.deprecated,
            new: new_attrs.deprecated,
        });
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeType;
    use crate::model::{AccessLevel, Attributes};
    use pretty_assertions::assert_eq;

    fn func(name: &str, params: &[&str], result: &str) -> Declaration {
        Declaration::new(DeclKind::Function, name, &[])
            .with_parameters(params.iter().copied())
            .with_result(result)
    }

    fn strukt(name: &str, children: Vec<Declaration>) -> Declaration {
        children
            .into_iter()
            .fold(Declaration::new(DeclKind::Struct, name, &[]), Declaration::with_child)
    }

    fn dump(decls: Vec<Declaration>) -> SdkDump {
        SdkDump::new("Target", decls)
    }

    fn described(changes: &[Change]) -> Vec<(ChangeType, &str, &str)> {
        changes
            .iter()
            .map(|c| (c.change_type, c.parent_name.as_str(), c.change_description.as_str()))
            .collect()
    }

    #[test]
    fn test_identical_dumps_have_no_changes() {
        let a = dump(vec![strukt("Foo", vec![func("bar()", &[], "Swift.Int")])]);
        assert!(diff_dumps(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_pure_addition() {
        let old = dump(vec![strukt("Foo", vec![func("bar()", &[], "()")])]);
        let new = dump(vec![strukt(
            "Foo",
            vec![func("bar()", &[], "()"), func("baz()", &[], "()")],
        )]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(
            described(&changes),
            vec![(ChangeType::Addition, "Foo", "`func baz()` was added")]
        );
        assert_eq!(changes[0].kind, Some(DeclKind::Function));
    }

    #[test]
    fn test_pure_removal_at_top_level() {
        let old = dump(vec![strukt("Foo", vec![]), strukt("Gone", vec![])]);
        let new = dump(vec![strukt("Foo", vec![])]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(
            described(&changes),
            vec![(ChangeType::Removal, "", "`struct Gone` was removed")]
        );
        assert!(changes[0].is_breaking());
    }

    #[test]
    fn test_signature_modification() {
        let old = dump(vec![func("parse(_:)", &["Swift.String"], "Swift.Int")]);
        let new = dump(vec![func("parse(_:)", &["Swift.String"], "Swift.Int?")]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(
            described(&changes),
            vec![(
                ChangeType::Modification,
                "",
                "`func parse(_: Swift.String) -> Swift.Int` was modified: signature changed from `(Swift.String) -> Swift.Int` to `(Swift.String) -> Swift.Int?`"
            )]
        );
        assert!(changes[0].is_breaking());
    }

    #[test]
    fn test_overloads_paired_by_signature() {
        let old = dump(vec![
            func("load(_:)", &["Swift.Int"], "()"),
            func("load(_:)", &["Swift.String"], "()"),
        ]);
        let new = dump(vec![
            func("load(_:)", &["Swift.String"], "()"),
            func("load(_:)", &["Swift.Int"], "()"),
        ]);

        assert!(diff_dumps(&old, &new).is_empty());
    }

    fn static_func(name: &str, result: &str) -> Declaration {
        func(name, &[], result).with_attributes(Attributes {
            is_static: true,
            ..Attributes::default()
        })
    }

    #[test]
    fn test_instance_and_static_twins_pair_by_staticness() {
        let old = dump(vec![strukt(
            "S",
            vec![func("foo()", &[], "()"), static_func("foo()", "()")],
        )]);
        let new = dump(vec![strukt("S", vec![static_func("foo()", "()")])]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(
            described(&changes),
            vec![(ChangeType::Removal, "S", "`func foo()` was removed")]
        );
    }

    #[test]
    fn test_static_toggle_is_modification() {
        let old = dump(vec![strukt("S", vec![func("foo()", &[], "()")])]);
        let new = dump(vec![strukt("S", vec![static_func("foo()", "()")])]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Modification);
        assert!(changes[0].change_description.contains("`static` was added"));
        assert!(changes[0].is_breaking());
    }

    #[test]
    fn test_single_leftover_overload_is_modification() {
        let old = dump(vec![
            func("load(_:)", &["Swift.Int"], "()"),
            func("load(_:)", &["Swift.String"], "()"),
        ]);
        let new = dump(vec![
            func("load(_:)", &["Swift.Int"], "()"),
            func("load(_:)", &["Foundation.Data"], "()"),
        ]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Modification);
        assert!(changes[0]
            .change_description
            .starts_with("`func load(_: Swift.String)` was modified"));
    }

    #[test]
    fn test_ambiguous_leftovers_are_added_and_removed() {
        let old = dump(vec![
            func("load(_:)", &["Swift.Int"], "()"),
            func("load(_:)", &["Swift.String"], "()"),
        ]);
        let new = dump(vec![
            func("load(_:)", &["Swift.Float"], "()"),
            func("load(_:)", &["Swift.Double"], "()"),
        ]);

        let changes = diff_dumps(&old, &new);
        let types: Vec<_> = changes.iter().map(|c| c.change_type).collect();
        assert_eq!(
            types,
            vec![
                ChangeType::Addition,
                ChangeType::Addition,
                ChangeType::Removal,
                ChangeType::Removal
            ]
        );
    }

    #[test]
    fn test_recursion_under_modified_parent() {
        let old_foo = strukt("Foo", vec![strukt("Bar", vec![func("baz()", &[], "()")])]);
        let mut new_foo = strukt("Foo", vec![strukt("Bar", vec![])]);
        new_foo.conformances = vec!["Swift.Sendable".to_string()];

        let changes = diff_dumps(&dump(vec![old_foo]), &dump(vec![new_foo]));
        assert_eq!(
            described(&changes),
            vec![
                (
                    ChangeType::Modification,
                    "",
                    "`struct Foo` was modified: conformances added: `Swift.Sendable`"
                ),
                (ChangeType::Removal, "Foo.Bar", "`func baz()` was removed"),
            ]
        );
        assert!(!changes[0].is_breaking());
    }

    #[test]
    fn test_bundled_field_changes() {
        let old = Declaration::new(DeclKind::Class, "Base", &[]).with_attributes(Attributes {
            access: AccessLevel::Open,
            ..Default::default()
        });
        let new = Declaration::new(DeclKind::Class, "Base", &[]).with_attributes(Attributes {
            access: AccessLevel::Public,
            is_final: true,
            deprecated: true,
            ..Default::default()
        });

        let changes = diff_dumps(&dump(vec![old]), &dump(vec![new]));
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].change_description,
            "`class Base` was modified: access level changed from `open` to `public`; `final` was added; was deprecated"
        );
        assert_eq!(changes[0].details.len(), 3);
        assert!(changes[0].is_breaking());
    }

    #[test]
    fn test_kind_change_is_remove_and_add() {
        let old = dump(vec![Declaration::new(DeclKind::Struct, "Foo", &[])]);
        let new = dump(vec![Declaration::new(DeclKind::Class, "Foo", &[])]);

        let changes = diff_dumps(&old, &new);
        assert_eq!(
            described(&changes),
            vec![
                (ChangeType::Addition, "", "`class Foo` was added"),
                (ChangeType::Removal, "", "`struct Foo` was removed"),
            ]
        );
    }
}
