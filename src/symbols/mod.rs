//! Symbol resolution and the destination symbol space.
//!
//! Instructions of a dynamic method never embed their references directly. Every type, method,
//! field, string and stand-alone signature operand is a position in the capture's symbol table.
//! This module turns those positions into references imported into a destination.
//!
//! # Key Components
//!
//! - [`SymbolResolver`] - Per-session resolution of symbol table indices, with caching
//! - [`Importer`] - The destination seam
//! - [`SymbolSpace`] - Concurrent, interning [`Importer`] implementation
//! - [`TypeRef`], [`MethodRef`], [`FieldRef`] - Imported references

mod bridge;
mod refs;
mod space;

pub use bridge::{ResolvedSymbol, SymbolResolver};
pub use refs::{
    FieldRef, ImportedField, ImportedMethod, ImportedSymbol, ImportedType, MethodRef, TypeRef,
};
pub use space::{import_method_signature, Importer, SymbolSpace};
