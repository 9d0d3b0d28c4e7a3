use strum::{Display, EnumCount, EnumIter};

use crate::capture::runtime::{RuntimeField, RuntimeMethod, RuntimeType};

/// The kind of reference a symbol slot resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum SlotKind {
    /// A type reference
    Type,
    /// A method reference
    Method,
    /// A field reference
    Field,
    /// A string literal
    String,
    /// A stand-alone signature (`calli`)
    Signature,
}

/// A native handle stored in a symbol slot.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeHandle {
    /// `RuntimeTypeHandle`
    Type(RuntimeType),
    /// `RuntimeMethodHandle`, optionally wrapped with the generic type it was bound on
    Method {
        /// The method
        method: RuntimeMethod,
        /// Instantiated declaring type from a `GenericMethodInfo` wrapper
        context: Option<RuntimeType>,
    },
    /// `RuntimeFieldHandle`, optionally wrapped with the generic type it was bound on
    Field {
        /// The field
        field: RuntimeField,
        /// Instantiated declaring type from a `GenericFieldInfo` wrapper
        context: Option<RuntimeType>,
    },
    /// A string literal for `ldstr`
    String(String),
    /// A `VarArgMethod` call site wrapper
    VarArgAdapter {
        /// The statically resolvable target, if any
        method: Option<RuntimeMethod>,
        /// Name of an unmaterialized `DynamicMethod` target, if any
        dynamic_target: Option<String>,
    },
    /// A reference to another, unmaterialized `DynamicMethod`
    DynamicMethod(String),
}

impl NativeHandle {
    /// The kind this handle resolves to.
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        match self {
            NativeHandle::Type(_) => SlotKind::Type,
            NativeHandle::Method { .. }
            | NativeHandle::VarArgAdapter { .. }
            | NativeHandle::DynamicMethod(_) => SlotKind::Method,
            NativeHandle::Field { .. } => SlotKind::Field,
            NativeHandle::String(_) => SlotKind::String,
        }
    }
}

/// One entry of a capture's symbol table.
///
/// Instructions reference slots by position only. Index 0 of a dynamic scope is reserved and
/// always [`SymbolSlot::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolSlot {
    /// An empty slot
    Null,
    /// A native runtime handle
    Native(NativeHandle),
    /// A raw signature blob (stand-alone or local signature)
    RawSignatureBytes(Vec<u8>),
    /// An object of a class the normalizer does not know; only fails if referenced
    Opaque(String),
}

impl SymbolSlot {
    /// The kind this slot resolves to, `None` for null and opaque slots.
    #[must_use]
    pub fn kind(&self) -> Option<SlotKind> {
        match self {
            SymbolSlot::Native(handle) => Some(handle.kind()),
            SymbolSlot::RawSignatureBytes(_) => Some(SlotKind::Signature),
            SymbolSlot::Null | SymbolSlot::Opaque(_) => None,
        }
    }
}

/// Structured exception clause bookkeeping kept by the dynamic IL generator.
///
/// One descriptor covers one protected range and all of the clauses attached to it. Addresses
/// are byte offsets into the code; negative values mean "not set".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawExceptionDescriptor {
    /// Start of the protected range
    pub start_addr: i32,
    /// End of the protected range shared by catch and filter clauses
    pub end_addr: i32,
    /// End of the protected range for a finally clause, negative if absent
    pub end_finally: i32,
    /// Number of valid entries in the per-clause arrays
    pub current_catch: usize,
    /// Handler start per clause
    pub catch_addr: Vec<i32>,
    /// Handler end per clause
    pub catch_end_addr: Vec<i32>,
    /// Caught type per clause, `None` for non-catch clauses
    pub catch_class: Vec<Option<RuntimeType>>,
    /// Clause kind per clause (0 catch, 1 filter, 2 finally, 4 fault)
    pub kinds: Vec<i32>,
    /// Filter start per clause, empty when the runtime layout does not record it
    pub filter_addr: Vec<i32>,
}

/// Exception data carried by a capture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExceptionData {
    /// The method has no exception clauses
    #[default]
    None,
    /// A raw exception section header, compact or fat
    RawHeaderBytes(Vec<u8>),
    /// Structured descriptors from the IL generator
    StructuredList(Vec<RawExceptionDescriptor>),
}

/// Parameter and return types as seen by the host runtime.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeSignature {
    /// Parameter types
    pub params: Vec<RuntimeType>,
    /// Return type, `None` for `void`
    pub return_type: Option<RuntimeType>,
}

/// Canonical bundle of everything needed to rebuild one dynamic method body.
///
/// Produced once by the normalizer and then owned by exactly one
/// [`crate::method::ReconstructionSession`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMethodCapture {
    /// Name of the dynamic method, for diagnostics
    pub name: String,
    /// Raw CIL opcode bytes
    pub code: Vec<u8>,
    /// Maximum evaluation stack depth as declared by the generator
    pub max_stack: u32,
    /// The symbol table that tokens index into
    pub symbols: Vec<SymbolSlot>,
    /// Exception clause data
    pub exceptions: ExceptionData,
    /// Local variable signature blob, if the method declares locals
    pub locals_signature: Option<Vec<u8>>,
    /// Signature of the method as seen by the host
    pub native_signature: NativeSignature,
}
