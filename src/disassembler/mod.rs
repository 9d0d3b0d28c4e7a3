//! CIL instruction stream decoding for dynamic method bodies.
//!
//! Dynamic method bodies are plain CIL, but their tokens index the capture's own symbol table
//! rather than metadata tables. This module decodes such bodies into [`Instruction`]s whose
//! operands are already resolved into the destination symbol space and whose branch operands
//! name target instructions by index.
//!
//! # Key Types
//! - [`Instruction`] - A decoded CIL instruction
//! - [`Operand`] - Resolved instruction operands (immediates, references, targets)
//! - [`FlowType`] - How instructions affect control flow
//! - [`CilInstruction`] - Static opcode table entry
//!
//! # Main Functions
//! - [`decode_stream`] - Decode and link a complete method body
//! - [`decode_instruction`] - Decode a single instruction
//! - [`instruction_index`] - Map a byte offset onto an instruction index

mod decoder;
mod instruction;
mod instructions;

pub use decoder::{decode_instruction, decode_stream, instruction_index};
pub use instruction::{FlowType, Immediate, Instruction, InstructionCategory, Operand, OperandType};
pub use instructions::{CilInstruction, INSTRUCTIONS, INSTRUCTIONS_FE};
