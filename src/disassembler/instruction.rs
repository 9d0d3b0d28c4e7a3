//! CIL instruction representation, operand types, and decoding metadata.
//!
//! This module defines the types a decoded dynamic method body is made of. Operands are fully
//! resolved: symbolic operands carry references imported into the destination symbol space and
//! branch operands carry the index of their target instruction.
//!
//! # Key Components
//!
//! - [`Instruction`] - Complete decoded instruction representation
//! - [`Operand`] - Resolved operand representation
//! - [`OperandType`] - Operand encoding selected by the opcode
//! - [`Immediate`] - Immediate value types with conversions
//! - [`FlowType`] - Control flow behavior classification
//! - [`InstructionCategory`] - Functional instruction grouping

use std::fmt::{self, UpperHex};

use crate::{
    metadata::signatures::{SignatureMethod, TypeSignature},
    symbols::{FieldRef, MethodRef},
};

/// Types of operands for CIL instructions.
///
/// Each variant corresponds to one ECMA-335 III.1.9 operand encoding. Symbolic operands are
/// split by the kind of reference their token must resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand present
    None,
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Signed 8-bit branch offset
    ShortBranch,
    /// Signed 32-bit branch offset
    Branch,
    /// Count prefixed table of signed 32-bit branch offsets
    Switch,
    /// Unsigned 8-bit local variable index
    ShortLocal,
    /// Unsigned 16-bit local variable index
    Local,
    /// Unsigned 8-bit argument index
    ShortArgument,
    /// Unsigned 16-bit argument index
    Argument,
    /// String literal token
    String,
    /// Type token
    Type,
    /// Method token
    Method,
    /// Field token
    Field,
    /// Stand-alone signature token
    Signature,
    /// Type, method or field token, decided by the referenced symbol
    Token,
}

impl OperandType {
    /// Returns the size in bytes of this operand type.
    ///
    /// Returns `None` for `Switch`, whose size depends on the encoded target count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dynscope::disassembler::OperandType;
    ///
    /// assert_eq!(OperandType::None.size(), Some(0));
    /// assert_eq!(OperandType::ShortLocal.size(), Some(1));
    /// assert_eq!(OperandType::Argument.size(), Some(2));
    /// assert_eq!(OperandType::Method.size(), Some(4));
    /// assert_eq!(OperandType::Switch.size(), None);
    /// ```
    #[must_use]
    pub const fn size(&self) -> Option<usize> {
        match self {
            OperandType::None => Some(0),
            OperandType::Int8
            | OperandType::UInt8
            | OperandType::ShortBranch
            | OperandType::ShortLocal
            | OperandType::ShortArgument => Some(1),
            OperandType::Local | OperandType::Argument => Some(2),
            OperandType::Int32
            | OperandType::Float32
            | OperandType::Branch
            | OperandType::String
            | OperandType::Type
            | OperandType::Method
            | OperandType::Field
            | OperandType::Signature
            | OperandType::Token => Some(4),
            OperandType::Int64 | OperandType::Float64 => Some(8),
            OperandType::Switch => None,
        }
    }
}

/// Represents an immediate value type embedded in CIL instructions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit immediate value
    Int8(i8),
    /// Unsigned 8-bit immediate value
    UInt8(u8),
    /// Signed 32-bit immediate value
    Int32(i32),
    /// Signed 64-bit immediate value
    Int64(i64),
    /// 32-bit floating point immediate value
    Float32(f32),
    /// 64-bit floating point immediate value
    Float64(f64),
}

impl UpperHex for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value:02X}"),
            Immediate::UInt8(value) => write!(f, "{value:02X}"),
            Immediate::Int32(value) => write!(f, "{value:08X}"),
            Immediate::Int64(value) => write!(f, "{value:016X}"),
            Immediate::Float32(value) => write!(f, "{:08X}", value.to_bits()),
            Immediate::Float64(value) => write!(f, "{:016X}", value.to_bits()),
        }
    }
}

impl From<Immediate> for u64 {
    fn from(val: Immediate) -> Self {
        match val {
            // For signed integers, we preserve the bit pattern
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int8(value) => value as u64,
            Immediate::UInt8(value) => u64::from(value),
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int32(value) => value as u64,
            #[allow(clippy::cast_sign_loss)]
            Immediate::Int64(value) => value as u64,
            Immediate::Float32(value) => u64::from(value.to_bits()),
            Immediate::Float64(value) => value.to_bits(),
        }
    }
}

/// A fully resolved instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// String literal, empty when the referenced symbol was absent
    String(String),
    /// Local variable index
    Local(u16),
    /// Method argument index
    Argument(u16),
    /// Index of the branch target instruction
    Target(usize),
    /// Indices of the switch target instructions
    Switch(Vec<usize>),
    /// Type reference
    Type(TypeSignature),
    /// Method reference
    Method(MethodRef),
    /// Field reference
    Field(FieldRef),
    /// Stand-alone method signature
    Signature(Box<SignatureMethod>),
}

impl Operand {
    /// Returns a formatted string representation of the operand.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dynscope::disassembler::{Immediate, Operand};
    ///
    /// assert_eq!(Operand::None.as_string(), None);
    /// assert_eq!(Operand::Immediate(Immediate::Int32(42)).as_string(), Some("Int32(42)".to_string()));
    /// assert_eq!(Operand::Target(3).as_string(), Some("#3".to_string()));
    /// assert_eq!(Operand::Local(5).as_string(), Some("V_5".to_string()));
    /// assert_eq!(Operand::Argument(3).as_string(), Some("A_3".to_string()));
    /// assert_eq!(Operand::String("hi".into()).as_string(), Some("\"hi\"".to_string()));
    /// ```
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            Operand::None => None,
            Operand::Immediate(imm) => Some(format!("{imm:?}")),
            Operand::String(value) => Some(format!("{value:?}")),
            Operand::Local(l) => Some(format!("V_{l}")),
            Operand::Argument(a) => Some(format!("A_{a}")),
            Operand::Target(t) => Some(format!("#{t}")),
            Operand::Switch(targets) => Some(format!("switch({})", targets.len())),
            Operand::Type(ty) => Some(format!("{ty:?}")),
            Operand::Method(method) => Some(format!("{} {}", method.token, method.name)),
            Operand::Field(field) => Some(format!("{} {}", field.token, field.name)),
            Operand::Signature(sig) => Some(format!("calli({})", sig.params.len())),
        }
    }
}

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location (unconditional jump)
    UnconditionalBranch,
    /// Call to another method
    Call,
    /// Returns from current method
    Return,
    /// Multi-way branch (switch statement)
    Switch,
    /// Exception throwing
    Throw,
    /// End of finally, fault or filter block
    EndFinally,
    /// Leave protected region (try/catch/finally)
    Leave,
}

/// Categorization of instructions by their primary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionCategory {
    /// Arithmetic operations (add, sub, mul, div, rem, neg)
    Arithmetic,
    /// Bitwise and logical operations (and, or, xor, not, shl, shr)
    BitwiseLogical,
    /// Comparison operations (ceq, cgt, clt)
    Comparison,
    /// Control flow operations (br, switch, ret, call)
    ControlFlow,
    /// Type conversion operations (conv.i4, conv.r8, box, unbox)
    Conversion,
    /// Load and store operations (ldloc, stfld, ldarg)
    LoadStore,
    /// Object model operations (newobj, ldfld, castclass)
    ObjectModel,
    /// Prefix instructions (unaligned, volatile, tail)
    Prefix,
    /// Miscellaneous operations (nop, break, dup)
    Misc,
}

/// A decoded CIL instruction of a dynamic method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Byte offset of this instruction in the method body
    pub offset: u32,
    /// Size of this instruction in bytes
    pub size: u32,
    /// Primary opcode byte
    pub opcode: u8,
    /// Prefix byte (0 if no prefix)
    pub prefix: u8,
    /// Human-readable instruction mnemonic (e.g., "add", "ldloc.s", "ret")
    pub mnemonic: &'static str,
    /// Functional categorization of this instruction
    pub category: InstructionCategory,
    /// How this instruction affects control flow
    pub flow_type: FlowType,
    /// The operand data for this instruction
    pub operand: Operand,
    /// Branch target byte offsets, as encoded
    pub branch_targets: Vec<u32>,
}

impl Instruction {
    /// Byte offset of the next instruction
    #[must_use]
    pub fn end_offset(&self) -> u32 {
        self.offset + self.size
    }

    /// Check if this instruction is a branch instruction.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Switch
        )
    }

    /// Check if this instruction is a terminal instruction (ends a basic block).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::ConditionalBranch
                | FlowType::UnconditionalBranch
                | FlowType::Return
                | FlowType::Switch
                | FlowType::Throw
                | FlowType::Leave
                | FlowType::EndFinally
        )
    }

    /// Indices of the instructions this instruction can branch to
    ///
    /// Does not include the fall-through successor of conditional branches.
    #[must_use]
    pub fn get_targets(&self) -> Vec<usize> {
        match &self.operand {
            Operand::Target(target) => vec![*target],
            Operand::Switch(targets) => targets.clone(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04X}: {}", self.offset, self.mnemonic)?;
        if let Some(operand) = self.operand.as_string() {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}
