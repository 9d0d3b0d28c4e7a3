//! Signature decoding for dynamic method bodies.
//!
//! This module parses the ECMA-335 II.23.2 signature blobs a dynamic method carries: the local
//! variable signature of the body and the stand-alone method signatures referenced by `calli`.
//! Unlike signatures stored in a metadata file, every type reference embedded in these blobs is
//! an index into the dynamic method's own symbol table, so each parse takes a [`TypeResolver`]
//! that maps those tokens to imported types.
//!
//! # Signature Types
//!
//! - **Method Signatures** - Parameter types, return types, and calling conventions
//! - **Field Signatures** - Field type information and modifiers
//! - **LocalVar Signatures** - Local variable types within method bodies
//!
//! # Examples
//!
//! ```rust
//! use dynscope::metadata::signatures::{parse_local_var_signature, TypeSignature};
//! use dynscope::metadata::token::Token;
//! use dynscope::ReconstructionConfig;
//!
//! let mut no_types = |token: Token| -> dynscope::Result<TypeSignature> {
//!     Err(dynscope::Error::Usage(format!("unexpected type token {token}")))
//! };
//!
//! // 2 locals: int32, string
//! let locals_data = &[0x07, 0x02, 0x08, 0x0E];
//! let locals_sig =
//!     parse_local_var_signature(locals_data, &mut no_types, &ReconstructionConfig::default())?;
//!
//! assert_eq!(locals_sig.locals[1].base, TypeSignature::String);
//! # Ok::<(), dynscope::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures

mod parser;
mod types;

pub use parser::*;
pub use types::*;

use crate::{config::ReconstructionConfig, Result};

/// Parse a `MethodSignature` from a byte slice
///
/// ## Arguments
/// * 'data'     - The input slice to parse
/// * 'resolver' - Resolves embedded type tokens
/// * 'config'   - Nesting limit and pointer size
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_method_signature(
    data: &[u8],
    resolver: &mut dyn TypeResolver,
    config: &ReconstructionConfig,
) -> Result<SignatureMethod> {
    let mut parser = SignatureParser::new(data, resolver, config);
    parser.parse_method_signature()
}

/// Parse a `FieldSignature` from a byte slice
///
/// ## Arguments
/// * 'data'     - The input slice to parse
/// * 'resolver' - Resolves embedded type tokens
/// * 'config'   - Nesting limit and pointer size
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_field_signature(
    data: &[u8],
    resolver: &mut dyn TypeResolver,
    config: &ReconstructionConfig,
) -> Result<SignatureField> {
    let mut parser = SignatureParser::new(data, resolver, config);
    parser.parse_field_signature()
}

/// Parse a `LocalVarSignature` from a byte slice
///
/// ## Arguments
/// * 'data'     - The input slice to parse
/// * 'resolver' - Resolves embedded type tokens
/// * 'config'   - Nesting limit and pointer size
///
/// # Errors
/// Returns an error if the signature data is malformed or parsing fails
pub fn parse_local_var_signature(
    data: &[u8],
    resolver: &mut dyn TypeResolver,
    config: &ReconstructionConfig,
) -> Result<SignatureLocalVariables> {
    let mut parser = SignatureParser::new(data, resolver, config);
    parser.parse_local_var_signature()
}
