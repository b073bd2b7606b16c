//! Normalized declaration tree.
//!
//! These types represent the public API surface of one compiled target,
//! independent of the raw dump format it was read from. A [`SdkDump`] is
//! built once by the normalizer and then only read by the diff engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a declaration node.
///
/// Exhaustive: adding a kind means extending this enum and every `match` on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclKind {
    Module,
    Class,
    Struct,
    Enum,
    Protocol,
    Extension,
    Function,
    Initializer,
    Property,
    Subscript,
    TypeAlias,
    AssociatedType,
    EnumCase,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Module => "module",
            DeclKind::Class => "class",
            DeclKind::Struct => "struct",
            DeclKind::Enum => "enum",
            DeclKind::Protocol => "protocol",
            DeclKind::Extension => "extension",
            DeclKind::Function => "function",
            DeclKind::Initializer => "initializer",
            DeclKind::Property => "property",
            DeclKind::Subscript => "subscript",
            DeclKind::TypeAlias => "typealias",
            DeclKind::AssociatedType => "associatedtype",
            DeclKind::EnumCase => "enum case",
        }
    }

    /// Source keyword used when printing a declaration of this kind.
    ///
    /// Initializers and subscripts carry their keyword in the printed name.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            DeclKind::Module => Some("module"),
            DeclKind::Class => Some("class"),
            DeclKind::Struct => Some("struct"),
            DeclKind::Enum => Some("enum"),
            DeclKind::Protocol => Some("protocol"),
            DeclKind::Extension => Some("extension"),
            DeclKind::Function => Some("func"),
            DeclKind::Property => Some("var"),
            DeclKind::TypeAlias => Some("typealias"),
            DeclKind::AssociatedType => Some("associatedtype"),
            DeclKind::EnumCase => Some("case"),
            DeclKind::Initializer | DeclKind::Subscript => None,
        }
    }

    /// Whether declarations of this kind open a nested scope.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            DeclKind::Module
                | DeclKind::Class
                | DeclKind::Struct
                | DeclKind::Enum
                | DeclKind::Protocol
                | DeclKind::Extension
        )
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access level, ordered from most restrictive to most permissive.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Private,
    Fileprivate,
    Internal,
    Package,
    #[default]
    Public,
    Open,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::Fileprivate => "fileprivate",
            AccessLevel::Internal => "internal",
            AccessLevel::Package => "package",
            AccessLevel::Public => "public",
            AccessLevel::Open => "open",
        }
    }

    /// Parse an access level keyword, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "private" => Some(AccessLevel::Private),
            "fileprivate" => Some(AccessLevel::Fileprivate),
            "internal" => Some(AccessLevel::Internal),
            "package" => Some(AccessLevel::Package),
            "public" => Some(AccessLevel::Public),
            "open" => Some(AccessLevel::Open),
            _ => None,
        }
    }

    /// Whether a declaration with this access is part of the public surface.
    pub fn is_public(&self) -> bool {
        *self >= AccessLevel::Public
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-structural properties of a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Attributes {
    pub access: AccessLevel,
    pub is_static: bool,
    pub is_final: bool,
    pub is_mutating: bool,
    pub is_throwing: bool,
    pub is_async: bool,
    /// Printed generic signature, e.g. `<T where T : Swift.Equatable>`.
    pub generic_signature: Option<String>,
    /// Sorted availability entries, e.g. `iOS 13.0`.
    pub availability: Vec<String>,
    pub deprecated: bool,
}

/// One node of the normalized API tree.
///
/// Field order matters: the derived `Ord` is used as a content-based tie
/// breaker when several siblings share an identity key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclKind,
    /// Printed name, including argument labels for callables (`bar(_:with:)`).
    pub name: String,
    /// Names from the module root (exclusive) down to this node (inclusive).
    pub path: Vec<String>,
    /// Canonical signature: parameter types, result, effects and generic
    /// constraints. Disambiguates overloads sharing `(kind, name)`.
    pub signature: String,
    /// Parameter types, in declaration order.
    pub parameters: Vec<String>,
    /// Return type, property type or aliased type.
    pub result_type: Option<String>,
    pub attributes: Attributes,
    /// Sorted superclass and protocol conformance names.
    pub conformances: Vec<String>,
    /// Child declarations. Order carries no meaning.
    pub children: Vec<Declaration>,
}

impl Declaration {
    /// Create a declaration with an empty signature and default attributes.
    pub fn new(kind: DeclKind, name: impl Into<String>, parent_path: &[String]) -> Self {
        let name = name.into();
        let mut path = parent_path.to_vec();
        path.push(name.clone());
        Self {
            kind,
            name,
            path,
            signature: String::new(),
            parameters: Vec::new(),
            result_type: None,
            attributes: Attributes::default(),
            conformances: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Dotted path from the module root, e.g. `Foo.bar()`.
    pub fn qualified_path(&self) -> String {
        self.path.join(".")
    }

    /// Rebuild the canonical signature from parameters, result and effects.
    pub fn refresh_signature(&mut self) {
        self.signature = canonical_signature(
            self.kind,
            &self.parameters,
            self.result_type.as_deref(),
            &self.attributes,
        );
    }

    /// Sort children recursively so equal trees compare equal.
    pub fn canonicalize(&mut self) {
        for child in &mut self.children {
            child.canonicalize();
        }
        self.children.sort();
        self.conformances.sort();
        self.conformances.dedup();
        self.attributes.availability.sort();
    }

    /// Human-readable, Swift-like rendering used in change descriptions.
    pub fn display(&self) -> String {
        let mut out = String::new();
        if self.attributes.is_static {
            out.push_str("static ");
        }
        if let Some(keyword) = self.kind.keyword() {
            out.push_str(keyword);
            out.push(' ');
        }

        let generics = self.attributes.generic_signature.as_deref().unwrap_or("");

        match self.kind {
            DeclKind::EnumCase if self.parameters.is_empty() => {
                out.push_str(&self.name);
            }
            DeclKind::Function | DeclKind::Initializer | DeclKind::Subscript | DeclKind::EnumCase => {
                out.push_str(&labeled_call(&self.name, generics, &self.parameters));
                if self.attributes.is_async {
                    out.push_str(" async");
                }
                if self.attributes.is_throwing {
                    out.push_str(" throws");
                }
                if matches!(self.kind, DeclKind::Function | DeclKind::Subscript) {
                    if let Some(result) = self.result_type.as_deref().filter(|r| !is_void(r)) {
                        out.push_str(" -> ");
                        out.push_str(result);
                    }
                }
            }
            DeclKind::Property => {
                out.push_str(&self.name);
                if let Some(ty) = &self.result_type {
                    out.push_str(": ");
                    out.push_str(ty);
                }
            }
            DeclKind::TypeAlias => {
                out.push_str(&self.name);
                out.push_str(generics);
                if let Some(ty) = &self.result_type {
                    out.push_str(" = ");
                    out.push_str(ty);
                }
            }
            DeclKind::Module
            | DeclKind::Class
            | DeclKind::Struct
            | DeclKind::Enum
            | DeclKind::Protocol
            | DeclKind::Extension
            | DeclKind::AssociatedType => {
                out.push_str(&self.name);
                out.push_str(generics);
            }
        }

        out
    }

    /// Builder: set parameter types.
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self.refresh_signature();
        self
    }

    /// Builder: set the result type.
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result_type = Some(result.into());
        self.refresh_signature();
        self
    }

    /// Builder: replace attributes.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self.refresh_signature();
        self
    }

    /// Builder: add a child, re-rooting its path under this declaration.
    pub fn with_child(mut self, mut child: Declaration) -> Self {
        child.reparent(&self.path);
        self.children.push(child);
        self
    }

    fn reparent(&mut self, parent_path: &[String]) {
        let mut path = parent_path.to_vec();
        path.push(self.name.clone());
        self.path = path;
        let own = self.path.clone();
        for child in &mut self.children {
            child.reparent(&own);
        }
    }
}

/// The public surface of one compiled target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkDump {
    pub target: String,
    pub root: Declaration,
}

impl SdkDump {
    /// Wrap top-level declarations into a module root and canonicalize.
    pub fn new(target: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        let target = target.into();
        let mut root = Declaration::new(DeclKind::Module, target.clone(), &[]);
        root.path.clear();
        for mut declaration in declarations {
            declaration.reparent(&[]);
            root.children.push(declaration);
        }
        root.canonicalize();
        Self { target, root }
    }

    /// Total number of declarations below the root.
    pub fn declaration_count(&self) -> usize {
        fn count(decl: &Declaration) -> usize {
            decl.children.len() + decl.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

/// Whether a printed type denotes the empty tuple.
pub fn is_void(ty: &str) -> bool {
    matches!(ty, "()" | "Void" | "Swift.Void")
}

/// Canonical signature text for a declaration.
///
/// Callables: `(A, B) async throws -> R`; properties and aliases: the type;
/// scopes: empty. Generic constraints are appended with a leading space.
pub fn canonical_signature(
    kind: DeclKind,
    parameters: &[String],
    result: Option<&str>,
    attributes: &Attributes,
) -> String {
    let mut signature = String::new();

    match kind {
        DeclKind::EnumCase if parameters.is_empty() => {}
        DeclKind::Function | DeclKind::Initializer | DeclKind::Subscript | DeclKind::EnumCase => {
            signature.push('(');
            signature.push_str(&parameters.join(", "));
            signature.push(')');
            if attributes.is_async {
                signature.push_str(" async");
            }
            if attributes.is_throwing {
                signature.push_str(" throws");
            }
            if matches!(kind, DeclKind::Function | DeclKind::Subscript) {
                signature.push_str(" -> ");
                signature.push_str(result.unwrap_or("()"));
            }
        }
        DeclKind::Property | DeclKind::TypeAlias | DeclKind::AssociatedType => {
            if let Some(result) = result {
                signature.push_str(result);
            }
        }
        DeclKind::Module
        | DeclKind::Class
        | DeclKind::Struct
        | DeclKind::Enum
        | DeclKind::Protocol
        | DeclKind::Extension => {}
    }

    if let Some(generics) = &attributes.generic_signature {
        if !signature.is_empty() {
            signature.push(' ');
        }
        signature.push_str(generics);
    }

    signature
}

/// Merge argument labels from a printed name with parameter types.
///
/// `bar(_:with:)` + `[Int, String]` becomes `bar(_: Int, with: String)`.
/// Falls back to the bare type list when labels and types disagree.
fn labeled_call(name: &str, generics: &str, parameters: &[String]) -> String {
    let (base, labels) = match name.split_once('(') {
        Some((base, rest)) => {
            let inner = rest.strip_suffix(')').unwrap_or(rest);
            let labels: Vec<&str> = inner.split(':').filter(|l| !l.is_empty()).collect();
            (base, labels)
        }
        None => (name, Vec::new()),
    };

    let arguments = if labels.len() == parameters.len() {
        labels
            .iter()
            .zip(parameters)
            .map(|(label, ty)| format!("{}: {}", label, ty))
            .collect::<Vec<_>>()
    } else {
        parameters.to_vec()
    };

    format!("{}{}({})", base, generics, arguments.join(", "))
}
