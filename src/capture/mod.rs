//! Capture of dynamic method state from a host runtime.
//!
//! A dynamic method only exists as private runtime objects: a `DynamicMethod`, the resolver or
//! `DynamicILInfo` that owns its body, a `DynamicScope` symbol table and exception bookkeeping.
//! This module reads those objects through the [`HostObject`] capability and produces one
//! canonical [`RawMethodCapture`], the only input the rest of the engine consumes.
//!
//! # Key Components
//!
//! - [`HostObject`] / [`HostSnapshot`] - Name based field access to host objects
//! - [`RuntimeType`], [`RuntimeMethod`], [`RuntimeField`] - Structural descriptions of runtime handles
//! - [`CaptureHandle`] - The recognized handle shapes and their unwrapping
//! - [`normalize`] - Handle to capture, in one call
//! - [`layout`] - Field names across runtime versions

mod host;
pub mod layout;
mod normalizer;
mod runtime;
mod types;

pub use host::{HostObject, HostRef, HostSnapshot, HostValue};
pub use normalizer::{normalize, CaptureHandle};
pub use runtime::{NamedType, RuntimeField, RuntimeMethod, RuntimeType};
pub use types::{
    ExceptionData, NativeHandle, NativeSignature, RawExceptionDescriptor, RawMethodCapture,
    SlotKind, SymbolSlot,
};
