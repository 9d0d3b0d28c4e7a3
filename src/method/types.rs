//! The reconstructed method body handed to the caller.

use crate::{
    disassembler::Instruction,
    metadata::signatures::{SignatureLocalVariable, SignatureMethod},
    method::ExceptionRegion,
};

/// A dynamic method body rebuilt against the destination symbol space.
///
/// Every reference held here was imported through the session's
/// [`crate::symbols::Importer`]. Branch operands and exception regions refer to positions in
/// [`ReconstructedMethod::instructions`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedMethod {
    /// Name of the dynamic method
    pub name: String,
    /// The decoded body, ordered by offset
    pub instructions: Vec<Instruction>,
    /// Exception regions, in the order they were declared
    pub exception_regions: Vec<ExceptionRegion>,
    /// Local variables
    pub locals: Vec<SignatureLocalVariable>,
    /// Maximum evaluation stack depth
    pub max_stack: u16,
    /// Static method signature built from the host parameter and return types
    pub signature: SignatureMethod,
}

impl ReconstructedMethod {
    /// Size of the body in bytes
    #[must_use]
    pub fn code_size(&self) -> u32 {
        self.instructions
            .last()
            .map_or(0, |instruction| instruction.end_offset())
    }

    /// Returns `true` if the body declares any exception regions
    #[must_use]
    pub fn has_exception_regions(&self) -> bool {
        !self.exception_regions.is_empty()
    }
}
