//! References imported into a destination symbol space.

use std::{fmt, sync::Arc};

use crate::metadata::{
    signatures::{SignatureMethod, TypeSignature},
    token::Token,
};

/// A reference to a named type imported into the destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportedType {
    /// Token assigned by the destination
    pub token: Token,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name
    pub name: String,
    /// Defining assembly, if known
    pub assembly: Option<String>,
    /// `true` for value types
    pub is_value_type: bool,
}

impl ImportedType {
    /// `Namespace.Name`, or just `Name` in the global namespace
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for ImportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.assembly {
            Some(assembly) => write!(f, "[{}]{}", assembly, self.fullname()),
            None => write!(f, "{}", self.fullname()),
        }
    }
}

/// A reference to a method imported into the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMethod {
    /// Token assigned by the destination
    pub token: Token,
    /// Declaring type, with generic arguments when bound on an instantiated type
    pub declaring_type: Option<TypeSignature>,
    /// Method name
    pub name: String,
    /// Calling convention, return type and parameters
    pub signature: SignatureMethod,
    /// Generic arguments of an instantiated generic method
    pub generic_args: Vec<TypeSignature>,
}

/// A reference to a field imported into the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedField {
    /// Token assigned by the destination
    pub token: Token,
    /// Declaring type, with generic arguments when bound on an instantiated type
    pub declaring_type: TypeSignature,
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeSignature,
}

/// A reference-counted pointer to an [`ImportedType`]
pub type TypeRef = Arc<ImportedType>;
/// A reference-counted pointer to an [`ImportedMethod`]
pub type MethodRef = Arc<ImportedMethod>;
/// A reference-counted pointer to an [`ImportedField`]
pub type FieldRef = Arc<ImportedField>;

/// One entry of a symbol space's import log.
#[derive(Debug, Clone)]
pub enum ImportedSymbol {
    /// A named type
    Type(TypeRef),
    /// A method
    Method(MethodRef),
    /// A field
    Field(FieldRef),
}

impl ImportedSymbol {
    /// The destination token of the imported reference
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            ImportedSymbol::Type(ty) => ty.token,
            ImportedSymbol::Method(method) => method.token,
            ImportedSymbol::Field(field) => field.token,
        }
    }
}
