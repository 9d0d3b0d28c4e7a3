//! Decoding of dynamic method opcode streams.
//!
//! A body is decoded in two passes. The first pass walks the bytes sequentially, resolving every
//! symbolic operand through a [`SymbolResolver`] and recording branch operands as absolute byte
//! offsets. The second pass maps those offsets onto instruction indices, which requires every
//! target to land exactly on an instruction boundary.

use log::trace;

use crate::{
    capture::SlotKind,
    disassembler::{
        CilInstruction, FlowType, Immediate, Instruction, Operand, OperandType, INSTRUCTIONS,
        INSTRUCTIONS_FE,
    },
    metadata::token::Token,
    symbols::{ResolvedSymbol, SymbolResolver},
    Error, Parser, Result,
};

/// Decodes a complete opcode stream into instructions with resolved operands.
///
/// The returned instructions partition `code`: the first starts at offset 0, each following one
/// starts where the previous one ends and the last one ends at `code.len()`.
///
/// # Arguments
///
/// * `code` - The raw CIL bytes of the method body
/// * `resolver` - Resolves the symbol table indices carried by token operands
///
/// # Examples
///
/// ```rust
/// use dynscope::capture::{NativeHandle, SymbolSlot};
/// use dynscope::disassembler::{decode_stream, Operand};
/// use dynscope::symbols::{SymbolResolver, SymbolSpace};
/// use dynscope::ReconstructionConfig;
///
/// let symbols = vec![
///     SymbolSlot::Null,
///     SymbolSlot::Native(NativeHandle::String("hi".into())),
/// ];
/// let space = SymbolSpace::new();
/// let config = ReconstructionConfig::default();
/// let mut resolver = SymbolResolver::new(&symbols, &space, &config);
///
/// // ldstr "hi"; br.s +0; ret
/// let code = [0x72, 0x01, 0x00, 0x00, 0x70, 0x2B, 0x00, 0x2A];
/// let instructions = decode_stream(&code, &mut resolver)?;
///
/// assert_eq!(instructions.len(), 3);
/// assert_eq!(instructions[0].operand, Operand::String("hi".into()));
/// assert_eq!(instructions[1].operand, Operand::Target(2));
/// # Ok::<(), dynscope::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`crate::Error::Decode`] if:
/// - The stream contains a reserved or unknown opcode
/// - The last instruction runs past the end of `code`
/// - A branch or switch target does not match the start of an instruction
/// - A token operand cannot be resolved
///
/// Returns [`crate::Error::UnsupportedNestedCapture`] if an operand references another dynamic
/// method that was never materialized.
pub fn decode_stream(code: &[u8], resolver: &mut SymbolResolver) -> Result<Vec<Instruction>> {
    let mut parser = Parser::new(code);
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        let start = parser.pos();
        let instruction = decode_instruction(&mut parser, resolver).map_err(|err| match err {
            Error::OutOfBounds => decode_error!(
                "Length mismatch - instruction at IL_{:04X} runs past the end of the {} byte body",
                start,
                code.len()
            ),
            other => other,
        })?;

        trace!("{}", instruction);
        instructions.push(instruction);
    }

    resolve_branch_targets(&mut instructions)?;

    Ok(instructions)
}

/// Decodes a single instruction at the parser's current position.
///
/// Symbolic operands are resolved immediately. Branch, leave and switch instructions come back
/// with [`Operand::None`] and their absolute byte targets in [`Instruction::branch_targets`];
/// [`decode_stream`] converts those into instruction indices once the whole body is known.
///
/// The concrete reference kind of `ldtoken` is taken from the symbol slot it points at.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the instruction is truncated, and
/// [`crate::Error::Decode`] for reserved opcodes, negative branch targets or unresolvable tokens.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn decode_instruction(parser: &mut Parser, resolver: &mut SymbolResolver) -> Result<Instruction> {
    let offset = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let (cil_instruction, prefix, opcode) = match first_byte {
        0xFE => {
            let second_byte = parser.read_le::<u8>()?;

            match INSTRUCTIONS_FE.get(second_byte as usize) {
                Some(instr) => (instr, 0xFE, second_byte),
                None => return Err(decode_error!("Invalid opcode: FE {:02X}", second_byte)),
            }
        }
        _ => match INSTRUCTIONS.get(first_byte as usize) {
            Some(instr) => (instr, 0, first_byte),
            None => return Err(decode_error!("Invalid opcode: {:02X}", first_byte)),
        },
    };

    if cil_instruction.is_reserved() {
        return Err(decode_error!(
            "Reserved opcode at IL_{:04X}: {:02X}{:02X}",
            offset,
            prefix,
            opcode
        ));
    }

    let mut relative_targets = Vec::new();
    let operand = match cil_instruction.op_type {
        OperandType::None => Operand::None,
        OperandType::Int8 => Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)),
        OperandType::UInt8 => Operand::Immediate(Immediate::UInt8(parser.read_le::<u8>()?)),
        OperandType::Int32 => Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)),
        OperandType::Int64 => Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)),
        OperandType::Float32 => Operand::Immediate(Immediate::Float32(parser.read_le::<f32>()?)),
        OperandType::Float64 => Operand::Immediate(Immediate::Float64(parser.read_le::<f64>()?)),
        OperandType::ShortLocal => Operand::Local(u16::from(parser.read_le::<u8>()?)),
        OperandType::Local => Operand::Local(parser.read_le::<u16>()?),
        OperandType::ShortArgument => Operand::Argument(u16::from(parser.read_le::<u8>()?)),
        OperandType::Argument => Operand::Argument(parser.read_le::<u16>()?),
        OperandType::ShortBranch => {
            relative_targets.push(i64::from(parser.read_le::<i8>()?));
            Operand::None
        }
        OperandType::Branch => {
            relative_targets.push(i64::from(parser.read_le::<i32>()?));
            Operand::None
        }
        OperandType::Switch => {
            let case_count = parser.read_le::<u32>()? as usize;
            if case_count > parser.remaining() / 4 {
                return Err(out_of_bounds_error!());
            }

            relative_targets.reserve(case_count);
            for _ in 0..case_count {
                relative_targets.push(i64::from(parser.read_le::<i32>()?));
            }
            Operand::None
        }
        OperandType::String
        | OperandType::Type
        | OperandType::Method
        | OperandType::Field
        | OperandType::Signature
        | OperandType::Token => {
            let token = Token::new(parser.read_le::<u32>()?);
            resolve_token_operand(resolver, cil_instruction, token)?
        }
    };

    let end = parser.pos();
    let mut branch_targets = Vec::with_capacity(relative_targets.len());
    for delta in relative_targets {
        let target = end as i64 + delta;
        match u32::try_from(target) {
            Ok(target) => branch_targets.push(target),
            Err(_) => {
                return Err(decode_error!(
                    "Misaligned branch target - IL_{:04X} jumps to {}",
                    offset,
                    target
                ))
            }
        }
    }

    Ok(Instruction {
        offset: offset as u32,
        size: (end - offset) as u32,
        opcode,
        prefix,
        mnemonic: cil_instruction.instr,
        category: cil_instruction.category,
        flow_type: cil_instruction.flow,
        operand,
        branch_targets,
    })
}

/// Returns the index of the instruction starting exactly at `offset`.
///
/// `instructions` must be ordered by offset, as [`decode_stream`] returns them.
#[must_use]
pub fn instruction_index(instructions: &[Instruction], offset: u32) -> Option<usize> {
    instructions
        .binary_search_by_key(&offset, |instruction| instruction.offset)
        .ok()
}

fn resolve_token_operand(
    resolver: &mut SymbolResolver,
    cil_instruction: &CilInstruction,
    token: Token,
) -> Result<Operand> {
    let expected = match cil_instruction.op_type {
        OperandType::String => Some(SlotKind::String),
        OperandType::Type => Some(SlotKind::Type),
        OperandType::Method => Some(SlotKind::Method),
        OperandType::Field => Some(SlotKind::Field),
        OperandType::Signature => Some(SlotKind::Signature),
        _ => None,
    };

    let operand = match resolver.resolve(token.row() as usize, expected)? {
        ResolvedSymbol::String(value) => Operand::String(value),
        ResolvedSymbol::Type(ty) => Operand::Type(ty),
        ResolvedSymbol::Method(method) => Operand::Method(method),
        ResolvedSymbol::Field(field) => Operand::Field(field),
        ResolvedSymbol::Signature(signature) => Operand::Signature(signature),
    };

    Ok(operand)
}

fn resolve_branch_targets(instructions: &mut [Instruction]) -> Result<()> {
    for position in 0..instructions.len() {
        let instruction = &instructions[position];
        let is_switch = instruction.flow_type == FlowType::Switch;
        if instruction.branch_targets.is_empty() && !is_switch {
            continue;
        }

        let mut resolved = Vec::with_capacity(instruction.branch_targets.len());
        for &target in &instruction.branch_targets {
            match instruction_index(instructions, target) {
                Some(index) => resolved.push(index),
                None => {
                    return Err(decode_error!(
                        "Misaligned branch target - IL_{:04X} jumps to IL_{:04X}",
                        instruction.offset,
                        target
                    ))
                }
            }
        }

        let operand = if is_switch {
            Operand::Switch(resolved)
        } else {
            match resolved.first() {
                Some(&index) => Operand::Target(index),
                None => continue,
            }
        };
        instructions[position].operand = operand;
    }

    Ok(())
}
