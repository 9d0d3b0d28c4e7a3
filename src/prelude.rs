//! # dynscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dynscope library.
//!
//! ```rust
//! use dynscope::prelude::*;
//!
//! let space = SymbolSpace::new();
//! let result = reconstruct(None, &space, ReconstructionConfig::default());
//! assert!(matches!(result, Err(Error::Capture { .. })));
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dynscope operations
pub use crate::Error;

/// The result type used throughout dynscope
pub use crate::Result;

/// Configuration shared by reconstruction sessions
pub use crate::ReconstructionConfig;

/// Low-level parsing utilities
pub use crate::Parser;

// ================================================================================================
// Capture
// ================================================================================================

/// Host object access
pub use crate::capture::{HostObject, HostRef, HostSnapshot, HostValue};

/// Normalized captures
pub use crate::capture::{
    normalize, ExceptionData, NativeHandle, RawExceptionDescriptor, RawMethodCapture, SlotKind,
    SymbolSlot,
};

/// Runtime handles
pub use crate::capture::{RuntimeField, RuntimeMethod, RuntimeType};

// ================================================================================================
// Symbols and Signatures
// ================================================================================================

/// Destination symbol space
pub use crate::symbols::{
    ImportedSymbol, Importer, ResolvedSymbol, SymbolResolver, SymbolSpace,
};

/// Signature types
pub use crate::metadata::signatures::{
    SignatureLocalVariable, SignatureMethod, SignatureParameter, TypeSignature,
};

/// Metadata token type
pub use crate::metadata::token::Token;

// ================================================================================================
// Disassembly and Reconstruction
// ================================================================================================

/// Instructions
pub use crate::disassembler::{
    decode_stream, FlowType, Immediate, Instruction, InstructionCategory, Operand,
};

/// Reconstruction
pub use crate::method::{
    reconstruct, ExceptionRegion, ReconstructedMethod, ReconstructionSession, RegionKind,
};

/// Batches
pub use crate::batch::{reconstruct_all, BatchReport};
