//! Declaration metadata stored per symbol.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{Fqn, Location};

/// The kind of a declared symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionKind {
    Namespace,
    Class,
    Interface,
    Trait,
    Function,
    Method,
    Property,
    ClassConstant,
    Constant,
    Variable,
}

impl DefinitionKind {
    /// Check if this kind lives inside a type (method, property, class constant).
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DefinitionKind::Method | DefinitionKind::Property | DefinitionKind::ClassConstant
        )
    }

    /// Check if this kind declares a type that can be extended or implemented.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DefinitionKind::Class | DefinitionKind::Interface | DefinitionKind::Trait
        )
    }

    /// Get a human-readable name for this kind.
    pub fn display(&self) -> &'static str {
        match self {
            DefinitionKind::Namespace => "namespace",
            DefinitionKind::Class => "class",
            DefinitionKind::Interface => "interface",
            DefinitionKind::Trait => "trait",
            DefinitionKind::Function => "function",
            DefinitionKind::Method => "method",
            DefinitionKind::Property => "property",
            DefinitionKind::ClassConstant => "class constant",
            DefinitionKind::Constant => "constant",
            DefinitionKind::Variable => "variable",
        }
    }
}

/// The recorded declaration of one symbol.
///
/// A `Definition` is built by the analysis pipeline and then handed to an
/// index, which shares it as `Arc<Definition>`. Updating a symbol means putting
/// a new `Definition` under the same fqn; the stored value is never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Definition {
    /// Fully-qualified name, the key within one index.
    pub fqn: Fqn,
    /// What kind of symbol this is.
    pub kind: DefinitionKind,
    /// Where the symbol is declared, if it comes from source.
    pub location: Option<Location>,
    /// Resolvable without its namespace qualifier.
    pub is_global: bool,
    /// Part of the static surface (recorded before full type resolution).
    pub is_static: bool,
    /// Supertypes (extended classes, implemented interfaces, used traits).
    pub extends: Vec<Fqn>,
    /// The declaration line or signature, for hover.
    pub declaration: Option<SmolStr>,
    /// Documentation comment text.
    pub documentation: Option<Arc<str>>,
}

impl Definition {
    /// Create a definition with no location and no flags set.
    pub fn new(fqn: impl Into<Fqn>, kind: DefinitionKind) -> Self {
        Self {
            fqn: fqn.into(),
            kind,
            location: None,
            is_global: false,
            is_static: false,
            extends: Vec::new(),
            declaration: None,
            documentation: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn global(mut self, is_global: bool) -> Self {
        self.is_global = is_global;
        self
    }

    pub fn static_surface(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_extends(mut self, supertypes: impl IntoIterator<Item = impl Into<Fqn>>) -> Self {
        self.extends = supertypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_declaration(mut self, declaration: impl AsRef<str>) -> Self {
        self.declaration = Some(SmolStr::new(declaration));
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<Arc<str>>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    /// The file this definition is declared in.
    pub fn file(&self) -> Option<crate::base::FileId> {
        self.location.map(|loc| loc.file)
    }
}
