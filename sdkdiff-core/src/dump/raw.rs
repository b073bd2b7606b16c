//! Serde model of the raw `abi.json` dump.
//!
//! Only the keys the normalizer reads are modeled; everything else is kept
//! in [`RawNode::extra`] so availability keys (`intro_<Platform>`) survive.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level document.
#[derive(Clone, Debug, Deserialize)]
pub struct RawDump {
    #[serde(rename = "ABIRoot")]
    pub abi_root: RawNode,
}

/// A protocol conformance entry of a type declaration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConformance {
    pub name: String,
    pub printed_name: String,
}

impl RawConformance {
    pub fn display_name(&self) -> &str {
        if self.printed_name.is_empty() {
            &self.name
        } else {
            &self.printed_name
        }
    }
}

/// Any node of the dump: declarations, type references and accessors alike.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNode {
    pub kind: String,
    pub name: String,
    pub printed_name: String,
    pub decl_kind: Option<String>,
    pub children: Vec<RawNode>,
    pub decl_attributes: Vec<String>,
    pub access_level: Option<String>,
    pub is_open: bool,
    pub is_internal: bool,
    pub is_external: bool,
    #[serde(alias = "static")]
    pub is_static: bool,
    #[serde(alias = "throwing")]
    pub is_throwing: bool,
    #[serde(alias = "async")]
    pub is_async: bool,
    pub func_self_kind: Option<String>,
    pub generic_sig: Option<String>,
    pub conformances: Vec<RawConformance>,
    pub superclass_names: Vec<String>,
    #[serde(rename = "spi_group_names")]
    pub spi_group_names: Vec<String>,
    pub accessor_kind: Option<String>,
    pub deprecated: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawNode {
    /// `printedName`, falling back to `name`.
    pub fn display_name(&self) -> &str {
        if self.printed_name.is_empty() {
            &self.name
        } else {
            &self.printed_name
        }
    }

    /// Whether this node is a type reference rather than a declaration.
    pub fn is_type_node(&self) -> bool {
        matches!(
            self.kind.as_str(),
            "TypeNominal" | "TypeFunc" | "TypeNameAlias"
        )
    }

    pub fn is_accessor(&self) -> bool {
        self.kind == "Accessor" || self.decl_kind.as_deref() == Some("Accessor")
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.decl_attributes.iter().any(|a| a == attribute)
    }

    /// Type-reference children, in order.
    pub fn type_children(&self) -> impl Iterator<Item = &RawNode> {
        self.children.iter().filter(|c| c.is_type_node())
    }

    /// `(platform, version)` pairs from `intro_<Platform>` keys, in key order.
    pub fn introductions(&self) -> Vec<(&str, String)> {
        self.extra
            .iter()
            .filter_map(|(key, value)| {
                let platform = key.strip_prefix("intro_")?;
                let version = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((platform, version))
            })
            .collect()
    }
}
