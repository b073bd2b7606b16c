//! Conversion of raw dump nodes into the normalized declaration tree.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::raw::{RawDump, RawNode};
use crate::model::{AccessLevel, Attributes, DeclKind, Declaration, SdkDump};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Accessor kinds that make a property writable.
const SETTER_KINDS: &[&str] = &["set", "Set", "_modify", "modify", "Modify"];

/// Normalize a parsed dump into the public surface of `target`.
pub fn normalize(target: &str, dump: &RawDump) -> SdkDump {
    let declarations = dump
        .abi_root
        .children
        .iter()
        .filter_map(|node| normalize_node(node, &[]))
        .collect();
    SdkDump::new(target, declarations)
}

/// Collapse whitespace runs in a printed type or generic signature.
pub fn normalize_type_name(name: &str) -> String {
    WHITESPACE.replace_all(name.trim(), " ").into_owned()
}

/// Map a raw node to a declaration kind; `None` for nodes that are not
/// part of the comparable surface.
fn decl_kind(node: &RawNode) -> Option<DeclKind> {
    if node.is_type_node() || node.is_accessor() {
        return None;
    }

    let kind = node.decl_kind.as_deref().unwrap_or(node.kind.as_str());
    let kind = match kind {
        "Root" => DeclKind::Module,
        "Class" => DeclKind::Class,
        "Struct" => DeclKind::Struct,
        "Enum" => DeclKind::Enum,
        "Protocol" => DeclKind::Protocol,
        "Extension" => DeclKind::Extension,
        "Func" | "Function" => DeclKind::Function,
        "Constructor" => DeclKind::Initializer,
        "Var" => DeclKind::Property,
        "Subscript" => DeclKind::Subscript,
        "TypeAlias" => DeclKind::TypeAlias,
        "AssociatedType" => DeclKind::AssociatedType,
        "EnumElement" => DeclKind::EnumCase,
        "Import" | "OperatorDecl" | "InfixOperator" | "PrefixOperator" | "PostfixOperator"
        | "PrecedenceGroup" => return None,
        other => {
            debug!("Skipping unsupported node kind `{}` ({})", other, node.display_name());
            return None;
        }
    };

    // Members added to types of other modules are dumped as external type decls.
    if node.is_external && kind.is_scope() && kind != DeclKind::Module {
        return Some(DeclKind::Extension);
    }

    Some(kind)
}

fn access_level(node: &RawNode) -> AccessLevel {
    if let Some(level) = node.access_level.as_deref().and_then(AccessLevel::parse) {
        return level;
    }
    if node.is_open {
        AccessLevel::Open
    } else if node.is_internal {
        AccessLevel::Internal
    } else {
        AccessLevel::Public
    }
}

fn availability(node: &RawNode) -> Vec<String> {
    node.introductions()
        .into_iter()
        .map(|(platform, version)| format!("{} {}", platform_name(platform), version))
        .collect()
}

fn platform_name(raw: &str) -> &str {
    match raw {
        "Macosx" | "macOS" => "macOS",
        "iOS" => "iOS",
        "tvOS" => "tvOS",
        "watchOS" => "watchOS",
        "visionOS" => "visionOS",
        other => other,
    }
}

fn attributes(node: &RawNode) -> Attributes {
    Attributes {
        access: access_level(node),
        is_static: node.is_static,
        is_final: node.has_attribute("Final"),
        is_mutating: node.func_self_kind.as_deref() == Some("Mutating")
            || node.has_attribute("Mutating"),
        is_throwing: node.is_throwing,
        is_async: node.is_async,
        generic_signature: node
            .generic_sig
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .map(normalize_type_name),
        availability: availability(node),
        deprecated: node.deprecated || node.has_attribute("Deprecated"),
    }
}

fn printed_types<'a>(nodes: impl Iterator<Item = &'a RawNode>) -> Vec<String> {
    nodes.map(|n| normalize_type_name(n.display_name())).collect()
}

/// Payload types of an enum case: its constructor type is
/// `(Enum.Type) -> (Payload...) -> Enum` for cases with associated values.
fn enum_case_payload(node: &RawNode) -> Vec<String> {
    node.type_children()
        .next()
        .filter(|ctor| ctor.kind == "TypeFunc")
        .and_then(|ctor| ctor.children.first())
        .filter(|inner| inner.kind == "TypeFunc")
        .map(|inner| printed_types(inner.children.iter().skip(1)))
        .unwrap_or_default()
}

fn property_type(node: &RawNode) -> Option<String> {
    let ty = node.type_children().next().map(|t| normalize_type_name(t.display_name()))?;

    let accessors: Vec<&RawNode> = node.children.iter().filter(|c| c.is_accessor()).collect();
    if accessors.is_empty() {
        return Some(ty);
    }

    let settable = accessors.iter().any(|a| {
        a.accessor_kind
            .as_deref()
            .map(|k| SETTER_KINDS.contains(&k))
            .unwrap_or(false)
    });
    Some(if settable {
        format!("{} {{ get set }}", ty)
    } else {
        format!("{} {{ get }}", ty)
    })
}

fn normalize_node(node: &RawNode, parent_path: &[String]) -> Option<Declaration> {
    let kind = decl_kind(node)?;

    let attributes = attributes(node);
    if !attributes.access.is_public() || !node.spi_group_names.is_empty() {
        return None;
    }

    let mut decl = Declaration::new(kind, node.display_name(), parent_path);

    match kind {
        DeclKind::Function | DeclKind::Subscript => {
            let types = printed_types(node.type_children());
            let mut types = types.into_iter();
            decl.result_type = types.next();
            decl.parameters = types.collect();
        }
        DeclKind::Initializer => {
            decl.parameters = printed_types(node.type_children().skip(1));
        }
        DeclKind::EnumCase => {
            decl.parameters = enum_case_payload(node);
        }
        DeclKind::Property => {
            decl.result_type = property_type(node);
        }
        DeclKind::TypeAlias | DeclKind::AssociatedType => {
            decl.result_type = node
                .type_children()
                .next()
                .map(|t| normalize_type_name(t.display_name()));
        }
        DeclKind::Module
        | DeclKind::Class
        | DeclKind::Struct
        | DeclKind::Enum
        | DeclKind::Protocol
        | DeclKind::Extension => {
            decl.conformances = node
                .superclass_names
                .iter()
                .map(|s| normalize_type_name(s))
                .chain(
                    node.conformances
                        .iter()
                        .map(|c| normalize_type_name(c.display_name())),
                )
                .collect();
            let own_path = decl.path.clone();
            decl.children = node
                .children
                .iter()
                .filter_map(|child| normalize_node(child, &own_path))
                .collect();
        }
    }

    decl.attributes = attributes;
    decl.refresh_signature();
    Some(decl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> RawDump {
        serde_json::from_value(value).unwrap()
    }

    fn nominal(name: &str) -> serde_json::Value {
        json!({"kind": "TypeNominal", "name": name, "printedName": name})
    }

    #[test]
    fn test_function_types_from_children() {
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "Function", "name": "bar", "printedName": "bar(_:with:)", "declKind": "Func",
             "children": [nominal("Swift.Bool"), nominal("Swift.Int"), nominal("Swift.String")]}
        ]}}));

        let sdk = normalize("Target", &dump);
        let bar = &sdk.root.children[0];
        assert_eq!(bar.kind, DeclKind::Function);
        assert_eq!(bar.parameters, vec!["Swift.Int", "Swift.String"]);
        assert_eq!(bar.result_type.as_deref(), Some("Swift.Bool"));
        assert_eq!(bar.signature, "(Swift.Int, Swift.String) -> Swift.Bool");
    }

    #[test]
    fn test_type_nesting_and_paths() {
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "TypeDecl", "name": "Foo", "printedName": "Foo", "declKind": "Struct",
             "conformances": [{"kind": "Conformance", "name": "Equatable", "printedName": "Equatable"}],
             "children": [
                {"kind": "Constructor", "name": "init", "printedName": "init(value:)", "declKind": "Constructor",
                 "children": [nominal("Foo"), nominal("Swift.Int")]},
                {"kind": "Import", "name": "Foundation", "printedName": "Foundation", "declKind": "Import"}
             ]}
        ]}}));

        let sdk = normalize("Target", &dump);
        assert_eq!(sdk.declaration_count(), 2);
        let foo = &sdk.root.children[0];
        assert_eq!(foo.conformances, vec!["Equatable"]);
        let init = &foo.children[0];
        assert_eq!(init.qualified_path(), "Foo.init(value:)");
        assert_eq!(init.parameters, vec!["Swift.Int"]);
        assert_eq!(init.display(), "init(value: Swift.Int)");
    }

    #[test]
    fn test_non_public_and_spi_dropped() {
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "Function", "name": "a", "printedName": "a()", "declKind": "Func", "isInternal": true,
             "children": [nominal("()")]},
            {"kind": "Function", "name": "b", "printedName": "b()", "declKind": "Func",
             "spi_group_names": ["Internal"], "children": [nominal("()")]},
            {"kind": "Function", "name": "c", "printedName": "c()", "declKind": "Func",
             "children": [nominal("()")]}
        ]}}));

        let sdk = normalize("Target", &dump);
        let names: Vec<_> = sdk.root.children.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c()"]);
    }

    #[test]
    fn test_property_accessors() {
        let accessor = |kind: &str| json!({"kind": "Accessor", "name": kind, "printedName": kind, "declKind": "Accessor", "accessorKind": kind});
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "Var", "name": "count", "printedName": "count", "declKind": "Var",
             "children": [nominal("Swift.Int"), accessor("get")]},
            {"kind": "Var", "name": "title", "printedName": "title", "declKind": "Var",
             "children": [nominal("Swift.String"), accessor("get"), accessor("set")]}
        ]}}));

        let sdk = normalize("Target", &dump);
        assert_eq!(sdk.root.children[0].signature, "Swift.Int { get }");
        assert_eq!(sdk.root.children[1].signature, "Swift.String { get set }");
        assert_eq!(sdk.root.children[1].display(), "var title: Swift.String { get set }");
    }

    #[test]
    fn test_enum_case_payload() {
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "TypeDecl", "name": "Result", "printedName": "Result", "declKind": "Enum", "children": [
                {"kind": "Var", "name": "none", "printedName": "none", "declKind": "EnumElement", "children": [
                    {"kind": "TypeFunc", "name": "Function", "printedName": "(Result.Type) -> Result",
                     "children": [nominal("Result"), nominal("Result.Type")]}
                ]},
                {"kind": "Var", "name": "value", "printedName": "value(_:)", "declKind": "EnumElement", "children": [
                    {"kind": "TypeFunc", "name": "Function", "printedName": "(Result.Type) -> (Swift.Int) -> Result",
                     "children": [
                        {"kind": "TypeFunc", "name": "Function", "printedName": "(Swift.Int) -> Result",
                         "children": [nominal("Result"), nominal("Swift.Int")]},
                        nominal("Result.Type")
                     ]}
                ]}
            ]}
        ]}}));

        let sdk = normalize("Target", &dump);
        let cases = &sdk.root.children[0].children;
        assert_eq!(cases[0].display(), "case none");
        assert_eq!(cases[1].display(), "case value(_: Swift.Int)");
    }

    #[test]
    fn test_attributes_and_availability() {
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "TypeDecl", "name": "Base", "printedName": "Base", "declKind": "Class",
             "isOpen": true, "declAttributes": ["Final"], "intro_Macosx": "10.15", "intro_iOS": "13.0",
             "genericSig": "<T where T :   Swift.Equatable>", "children": [
                {"kind": "Function", "name": "reset", "printedName": "reset()", "declKind": "Func",
                 "funcSelfKind": "Mutating", "isAsync": true, "deprecated": true,
                 "children": [nominal("()")]}
             ]}
        ]}}));

        let sdk = normalize("Target", &dump);
        let base = &sdk.root.children[0];
        assert_eq!(base.attributes.access, AccessLevel::Open);
        assert!(base.attributes.is_final);
        assert_eq!(base.attributes.availability, vec!["iOS 13.0", "macOS 10.15"]);
        assert_eq!(
            base.attributes.generic_signature.as_deref(),
            Some("<T where T : Swift.Equatable>")
        );

        let reset = &base.children[0];
        assert!(reset.attributes.is_mutating);
        assert!(reset.attributes.deprecated);
        assert_eq!(reset.signature, "() async -> ()");
    }

    #[test]
    fn test_external_type_becomes_extension() {
        let dump = parse(json!({"ABIRoot": {"kind": "Root", "name": "TopLevel", "children": [
            {"kind": "TypeDecl", "name": "String", "printedName": "String", "declKind": "Struct",
             "isExternal": true, "children": []}
        ]}}));

        let sdk = normalize("Target", &dump);
        assert_eq!(sdk.root.children[0].kind, DeclKind::Extension);
        assert_eq!(sdk.root.children[0].display(), "extension String");
    }

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("  [Swift.String :\n  Swift.Int] "), "[Swift.String : Swift.Int]");
    }
}
