//! Per-artifact class hierarchy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an artifact declares about one type.
///
/// `super_classes` is the ordered superclass chain, nearest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    /// Signatures of methods with a body, e.g. `f()V`.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Signatures declared without a body (abstract or interface methods).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abstract_methods: Vec<String>,
    #[serde(default)]
    pub super_classes: Vec<String>,
    #[serde(default)]
    pub super_interfaces: Vec<String>,
}

impl TypeDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, signature: impl Into<String>) -> Self {
        self.methods.push(signature.into());
        self
    }

    pub fn with_abstract_method(mut self, signature: impl Into<String>) -> Self {
        self.abstract_methods.push(signature.into());
        self
    }

    pub fn extends(mut self, super_class: impl Into<String>) -> Self {
        self.super_classes.push(super_class.into());
        self
    }

    pub fn implements(mut self, super_interface: impl Into<String>) -> Self {
        self.super_interfaces.push(super_interface.into());
        self
    }

    /// Whether a method with this signature has a body on this type.
    pub fn defines(&self, signature: &str) -> bool {
        self.methods.iter().any(|m| m == signature)
    }

    /// Direct supertypes: superclasses first, then superinterfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &String> {
        self.super_classes.iter().chain(self.super_interfaces.iter())
    }
}

/// Map from type URI (`/namespace/Type`) to its declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassHierarchy {
    types: BTreeMap<String, TypeDecl>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_uri: impl Into<String>, decl: TypeDecl) {
        self.types.insert(type_uri.into(), decl);
    }

    pub fn with_type(mut self, type_uri: impl Into<String>, decl: TypeDecl) -> Self {
        self.insert(type_uri, decl);
        self
    }

    pub fn get(&self, type_uri: &str) -> Option<&TypeDecl> {
        self.types.get(type_uri)
    }

    pub fn contains(&self, type_uri: &str) -> bool {
        self.types.contains_key(type_uri)
    }

    /// Types in a stable (sorted) order.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDecl)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
