//! Metadata encodings shared by the decoders.
//!
//! - [`token`] - Metadata tokens as they appear in instruction operands and exception clauses
//! - [`signatures`] - ECMA-335 signature blobs

pub mod signatures;
pub mod token;
