//! Exception region decoding for dynamic method bodies.
//!
//! Dynamic methods carry their exception clauses in one of two forms. Methods emitted through
//! `DynamicILInfo` hand over a raw exception section (ECMA-335 II.25.4.5), in either the compact
//! or the fat encoding. Methods emitted through `ILGenerator` keep structured `__ExceptionInfo`
//! bookkeeping instead. Both forms decode into the same [`ExceptionRegion`] list, with every
//! offset mapped onto an instruction index.
//!
//! # Reference
//! - ECMA-335 6th Edition, Partition II, Section 25.4.6 - Exception Handling Clauses

use bitflags::bitflags;
use log::trace;

use crate::{
    capture::{ExceptionData, RawExceptionDescriptor, SlotKind},
    disassembler::{instruction_index, Instruction},
    metadata::{signatures::TypeSignature, token::Token},
    stream::io::{read_le, read_le_at},
    symbols::{ResolvedSymbol, SymbolResolver},
    Result,
};

bitflags! {
    /// Method data section flags, as found in the first header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u8 {
        /// Indicates that this section contains exception handling data
        const EHTABLE = 0x1;
        /// Indicates that the data section format is fat
        const FAT_FORMAT = 0x40;
        /// Indicates that the data section is followed by another one
        const MORE_SECTS = 0x80;
    }
}

/// Size of one compact clause
const COMPACT_CLAUSE_SIZE: usize = 12;
/// Size of one fat clause
const FAT_CLAUSE_SIZE: usize = 24;

/// The kind of an exception handling clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// A typed exception clause
    Catch,
    /// An exception filter and handler clause
    Filter,
    /// A finally clause
    Finally,
    /// A fault clause (finally that executes only on exception)
    Fault,
}

impl RegionKind {
    /// Maps a clause flags value onto its kind.
    ///
    /// # Errors
    /// Returns [`crate::Error::Decode`] for values other than 0, 1, 2 and 4.
    pub fn from_flags(flags: u32) -> Result<Self> {
        match flags {
            0x0000 => Ok(RegionKind::Catch),
            0x0001 => Ok(RegionKind::Filter),
            0x0002 => Ok(RegionKind::Finally),
            0x0004 => Ok(RegionKind::Fault),
            _ => Err(decode_error!("Unknown exception clause kind - 0x{:X}", flags)),
        }
    }
}

/// An exception handling region, expressed in instruction indices.
///
/// End indices are exclusive; `None` means the region runs to the end of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionRegion {
    /// What kind of clause this is
    pub kind: RegionKind,
    /// First instruction of the protected range
    pub try_start: usize,
    /// First instruction after the protected range
    pub try_end: Option<usize>,
    /// First instruction of the handler
    pub handler_start: usize,
    /// First instruction after the handler
    pub handler_end: Option<usize>,
    /// First instruction of the filter, for [`RegionKind::Filter`]
    pub filter_start: Option<usize>,
    /// The caught type, for [`RegionKind::Catch`]
    pub catch_type: Option<TypeSignature>,
}

/// Clause fields as encoded, before offsets are mapped onto instructions
struct RawClause {
    flags: u32,
    try_offset: u32,
    try_length: u32,
    handler_offset: u32,
    handler_length: u32,
    trailing: u32,
}

/// Decodes the exception regions of a capture.
///
/// # Arguments
/// * `data` - The exception data carried by the capture
/// * `instructions` - The decoded body the regions refer to
/// * `resolver` - Resolves catch type tokens of raw exception sections
///
/// # Errors
/// Returns [`crate::Error::Decode`] if a raw section is not flagged as an exception table, a
/// start offset does not land on an instruction, a clause kind is unknown, a catch token cannot
/// be resolved to a type, or the section is truncated.
pub fn decode_exception_regions(
    data: &ExceptionData,
    instructions: &[Instruction],
    resolver: &mut SymbolResolver,
) -> Result<Vec<ExceptionRegion>> {
    let regions = match data {
        ExceptionData::None => Vec::new(),
        ExceptionData::RawHeaderBytes(header) => {
            let clauses = read_raw_clauses(header)?;
            let mut regions = Vec::with_capacity(clauses.len());
            for clause in clauses {
                regions.push(map_raw_clause(&clause, instructions, resolver)?);
            }
            regions
        }
        ExceptionData::StructuredList(descriptors) => {
            let mut regions = Vec::new();
            for descriptor in descriptors {
                map_descriptor(descriptor, instructions, resolver, &mut regions)?;
            }
            regions
        }
    };

    trace!("decoded {} exception regions", regions.len());
    Ok(regions)
}

/// Reads every clause of a raw exception section.
///
/// The clause count is derived from the section size exactly the way the runtime's own dynamic
/// resolver derives it, ignoring how many clause bytes actually follow. A dynamic method has a
/// single exception section, so anything chained behind it is not read.
fn read_raw_clauses(header: &[u8]) -> Result<Vec<RawClause>> {
    if header.is_empty() {
        return Ok(Vec::new());
    }

    let kind = read_le::<u8>(header)?;
    let flags = SectionFlags::from_bits_truncate(kind);
    if !flags.contains(SectionFlags::EHTABLE) {
        return Err(decode_error!(
            "Data section kind 0x{:02X} is not an exception table",
            kind
        ));
    }
    if flags.contains(SectionFlags::MORE_SECTS) {
        trace!("ignoring data sections chained after the exception table");
    }

    let mut cursor = 0_usize;
    let mut clauses = Vec::new();

    if flags.contains(SectionFlags::FAT_FORMAT) {
        let section_size = read_le_at::<u32>(header, &mut cursor)? >> 8;
        let count = section_size.saturating_sub(4) as usize / FAT_CLAUSE_SIZE;
        trace!("fat exception section, {} clauses", count);

        for _ in 0..count {
            clauses.push(RawClause {
                flags: read_le_at::<u32>(header, &mut cursor)?,
                try_offset: read_le_at::<u32>(header, &mut cursor)?,
                try_length: read_le_at::<u32>(header, &mut cursor)?,
                handler_offset: read_le_at::<u32>(header, &mut cursor)?,
                handler_length: read_le_at::<u32>(header, &mut cursor)?,
                trailing: read_le_at::<u32>(header, &mut cursor)?,
            });
        }
    } else {
        cursor = 1;
        let section_size = read_le_at::<u8>(header, &mut cursor)?;
        let count = section_size.saturating_sub(2) as usize / COMPACT_CLAUSE_SIZE;
        trace!("compact exception section, {} clauses", count);

        // Reserved
        read_le_at::<u16>(header, &mut cursor)?;

        for _ in 0..count {
            clauses.push(RawClause {
                flags: u32::from(read_le_at::<u16>(header, &mut cursor)?),
                try_offset: u32::from(read_le_at::<u16>(header, &mut cursor)?),
                try_length: u32::from(read_le_at::<u8>(header, &mut cursor)?),
                handler_offset: u32::from(read_le_at::<u16>(header, &mut cursor)?),
                handler_length: u32::from(read_le_at::<u8>(header, &mut cursor)?),
                trailing: read_le_at::<u32>(header, &mut cursor)?,
            });
        }
    }

    Ok(clauses)
}

fn map_raw_clause(
    clause: &RawClause,
    instructions: &[Instruction],
    resolver: &mut SymbolResolver,
) -> Result<ExceptionRegion> {
    let kind = RegionKind::from_flags(clause.flags)?;

    let mut region = ExceptionRegion {
        kind,
        try_start: start_index(instructions, clause.try_offset, "try")?,
        try_end: end_index(instructions, clause.try_offset, clause.try_length),
        handler_start: start_index(instructions, clause.handler_offset, "handler")?,
        handler_end: end_index(instructions, clause.handler_offset, clause.handler_length),
        filter_start: None,
        catch_type: None,
    };

    match kind {
        RegionKind::Catch => {
            let token = Token::new(clause.trailing);
            match resolver.resolve(token.row() as usize, Some(SlotKind::Type))? {
                ResolvedSymbol::Type(ty) => region.catch_type = Some(ty),
                other => {
                    return Err(decode_error!(
                        "Catch token {} resolved to a {}",
                        token,
                        other.kind()
                    ))
                }
            }
        }
        RegionKind::Filter => {
            region.filter_start = Some(start_index(instructions, clause.trailing, "filter")?);
        }
        RegionKind::Finally | RegionKind::Fault => {}
    }

    Ok(region)
}

/// Expands one structured descriptor into its regions.
///
/// Catch and filter clauses share the descriptor's protected range; finally clauses end the
/// protected range at the descriptor's own end-of-finally marker instead.
fn map_descriptor(
    descriptor: &RawExceptionDescriptor,
    instructions: &[Instruction],
    resolver: &SymbolResolver,
    regions: &mut Vec<ExceptionRegion>,
) -> Result<()> {
    let try_start = start_index(instructions, to_offset(descriptor.start_addr)?, "try")?;
    let try_end = end_at(instructions, descriptor.end_addr);
    let end_finally = end_at(instructions, descriptor.end_finally);

    for clause in 0..descriptor.current_catch {
        let (Some(&flags), Some(&handler_addr), Some(&handler_end_addr)) = (
            descriptor.kinds.get(clause),
            descriptor.catch_addr.get(clause),
            descriptor.catch_end_addr.get(clause),
        ) else {
            return Err(decode_error!(
                "Exception descriptor declares {} clauses but only records {}",
                descriptor.current_catch,
                clause
            ));
        };

        #[allow(clippy::cast_sign_loss)]
        let kind = RegionKind::from_flags(flags as u32)?;

        let catch_type = match descriptor.catch_class.get(clause) {
            Some(Some(class)) => Some(resolver.importer().import_type(class)?),
            _ => None,
        };

        let filter_start = match descriptor.filter_addr.get(clause) {
            Some(&addr) if kind == RegionKind::Filter && addr >= 0 => {
                Some(start_index(instructions, to_offset(addr)?, "filter")?)
            }
            _ => None,
        };

        regions.push(ExceptionRegion {
            kind,
            try_start,
            try_end: if kind == RegionKind::Finally {
                end_finally
            } else {
                try_end
            },
            handler_start: start_index(instructions, to_offset(handler_addr)?, "handler")?,
            handler_end: end_at(instructions, handler_end_addr),
            filter_start,
            catch_type,
        });
    }

    Ok(())
}

fn to_offset(addr: i32) -> Result<u32> {
    u32::try_from(addr).map_err(|_| decode_error!("Negative exception region offset - {}", addr))
}

fn start_index(instructions: &[Instruction], offset: u32, what: &str) -> Result<usize> {
    instruction_index(instructions, offset).ok_or_else(|| {
        decode_error!(
            "Misaligned {} start - IL_{:04X} is not an instruction boundary",
            what,
            offset
        )
    })
}

fn end_index(instructions: &[Instruction], offset: u32, length: u32) -> Option<usize> {
    offset
        .checked_add(length)
        .and_then(|end| instruction_index(instructions, end))
}

fn end_at(instructions: &[Instruction], addr: i32) -> Option<usize> {
    u32::try_from(addr)
        .ok()
        .and_then(|end| instruction_index(instructions, end))
}
