//! CIL opcode tables as defined by ECMA-335 Partition III.
//!
//! [`INSTRUCTIONS`] is indexed by the single byte opcode, [`INSTRUCTIONS_FE`] by the byte following
//! the `0xFE` prefix. Reserved opcodes carry an empty mnemonic.

use crate::disassembler::{FlowType, InstructionCategory, OperandType};

/// Static decoding metadata for one opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CilInstruction {
    /// Encoding of the operand that follows the opcode
    pub op_type: OperandType,
    /// Mnemonic, empty for reserved opcodes
    pub instr: &'static str,
    /// Functional category
    pub category: InstructionCategory,
    /// Control flow behavior
    pub flow: FlowType,
}

impl CilInstruction {
    /// Returns `true` if this table slot is not assigned to an instruction
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        self.instr.is_empty()
    }
}

macro_rules! cil {
    ($op:ident, $name:literal, $cat:ident, $flow:ident) => {
        CilInstruction {
            op_type: OperandType::$op,
            instr: $name,
            category: InstructionCategory::$cat,
            flow: FlowType::$flow,
        }
    };
    ($op:ident, $name:literal, $cat:ident) => {
        cil!($op, $name, $cat, Sequential)
    };
}

const RESERVED: CilInstruction = cil!(None, "", Misc);

/// Single byte opcodes `0x00..=0xE0`
pub const INSTRUCTIONS: [CilInstruction; 225] = [
    // 0x00
    cil!(None, "nop", Misc),
    cil!(None, "break", Misc),
    cil!(None, "ldarg.0", LoadStore),
    cil!(None, "ldarg.1", LoadStore),
    cil!(None, "ldarg.2", LoadStore),
    cil!(None, "ldarg.3", LoadStore),
    cil!(None, "ldloc.0", LoadStore),
    cil!(None, "ldloc.1", LoadStore),
    cil!(None, "ldloc.2", LoadStore),
    cil!(None, "ldloc.3", LoadStore),
    cil!(None, "stloc.0", LoadStore),
    cil!(None, "stloc.1", LoadStore),
    cil!(None, "stloc.2", LoadStore),
    cil!(None, "stloc.3", LoadStore),
    cil!(ShortArgument, "ldarg.s", LoadStore),
    cil!(ShortArgument, "ldarga.s", LoadStore),
    // 0x10
    cil!(ShortArgument, "starg.s", LoadStore),
    cil!(ShortLocal, "ldloc.s", LoadStore),
    cil!(ShortLocal, "ldloca.s", LoadStore),
    cil!(ShortLocal, "stloc.s", LoadStore),
    cil!(None, "ldnull", LoadStore),
    cil!(None, "ldc.i4.m1", LoadStore),
    cil!(None, "ldc.i4.0", LoadStore),
    cil!(None, "ldc.i4.1", LoadStore),
    cil!(None, "ldc.i4.2", LoadStore),
    cil!(None, "ldc.i4.3", LoadStore),
    cil!(None, "ldc.i4.4", LoadStore),
    cil!(None, "ldc.i4.5", LoadStore),
    cil!(None, "ldc.i4.6", LoadStore),
    cil!(None, "ldc.i4.7", LoadStore),
    cil!(None, "ldc.i4.8", LoadStore),
    cil!(Int8, "ldc.i4.s", LoadStore),
    // 0x20
    cil!(Int32, "ldc.i4", LoadStore),
    cil!(Int64, "ldc.i8", LoadStore),
    cil!(Float32, "ldc.r4", LoadStore),
    cil!(Float64, "ldc.r8", LoadStore),
    RESERVED,
    cil!(None, "dup", Misc),
    cil!(None, "pop", Misc),
    cil!(Method, "jmp", ControlFlow, Call),
    cil!(Method, "call", ControlFlow, Call),
    cil!(Signature, "calli", ControlFlow, Call),
    cil!(None, "ret", ControlFlow, Return),
    cil!(ShortBranch, "br.s", ControlFlow, UnconditionalBranch),
    cil!(ShortBranch, "brfalse.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "brtrue.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "beq.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "bge.s", ControlFlow, ConditionalBranch),
    // 0x30
    cil!(ShortBranch, "bgt.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "ble.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "blt.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "bne.un.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "bge.un.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "bgt.un.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "ble.un.s", ControlFlow, ConditionalBranch),
    cil!(ShortBranch, "blt.un.s", ControlFlow, ConditionalBranch),
    cil!(Branch, "br", ControlFlow, UnconditionalBranch),
    cil!(Branch, "brfalse", ControlFlow, ConditionalBranch),
    cil!(Branch, "brtrue", ControlFlow, ConditionalBranch),
    cil!(Branch, "beq", ControlFlow, ConditionalBranch),
    cil!(Branch, "bge", ControlFlow, ConditionalBranch),
    cil!(Branch, "bgt", ControlFlow, ConditionalBranch),
    cil!(Branch, "ble", ControlFlow, ConditionalBranch),
    cil!(Branch, "blt", ControlFlow, ConditionalBranch),
    // 0x40
    cil!(Branch, "bne.un", ControlFlow, ConditionalBranch),
    cil!(Branch, "bge.un", ControlFlow, ConditionalBranch),
    cil!(Branch, "bgt.un", ControlFlow, ConditionalBranch),
    cil!(Branch, "ble.un", ControlFlow, ConditionalBranch),
    cil!(Branch, "blt.un", ControlFlow, ConditionalBranch),
    cil!(Switch, "switch", ControlFlow, Switch),
    cil!(None, "ldind.i1", LoadStore),
    cil!(None, "ldind.u1", LoadStore),
    cil!(None, "ldind.i2", LoadStore),
    cil!(None, "ldind.u2", LoadStore),
    cil!(None, "ldind.i4", LoadStore),
    cil!(None, "ldind.u4", LoadStore),
    cil!(None, "ldind.i8", LoadStore),
    cil!(None, "ldind.i", LoadStore),
    cil!(None, "ldind.r4", LoadStore),
    cil!(None, "ldind.r8", LoadStore),
    // 0x50
    cil!(None, "ldind.ref", LoadStore),
    cil!(None, "stind.ref", LoadStore),
    cil!(None, "stind.i1", LoadStore),
    cil!(None, "stind.i2", LoadStore),
    cil!(None, "stind.i4", LoadStore),
    cil!(None, "stind.i8", LoadStore),
    cil!(None, "stind.r4", LoadStore),
    cil!(None, "stind.r8", LoadStore),
    cil!(None, "add", Arithmetic),
    cil!(None, "sub", Arithmetic),
    cil!(None, "mul", Arithmetic),
    cil!(None, "div", Arithmetic),
    cil!(None, "div.un", Arithmetic),
    cil!(None, "rem", Arithmetic),
    cil!(None, "rem.un", Arithmetic),
    cil!(None, "and", BitwiseLogical),
    // 0x60
    cil!(None, "or", BitwiseLogical),
    cil!(None, "xor", BitwiseLogical),
    cil!(None, "shl", BitwiseLogical),
    cil!(None, "shr", BitwiseLogical),
    cil!(None, "shr.un", BitwiseLogical),
    cil!(None, "neg", Arithmetic),
    cil!(None, "not", BitwiseLogical),
    cil!(None, "conv.i1", Conversion),
    cil!(None, "conv.i2", Conversion),
    cil!(None, "conv.i4", Conversion),
    cil!(None, "conv.i8", Conversion),
    cil!(None, "conv.r4", Conversion),
    cil!(None, "conv.r8", Conversion),
    cil!(None, "conv.u4", Conversion),
    cil!(None, "conv.u8", Conversion),
    cil!(Method, "callvirt", ControlFlow, Call),
    // 0x70
    cil!(Type, "cpobj", ObjectModel),
    cil!(Type, "ldobj", ObjectModel),
    cil!(String, "ldstr", LoadStore),
    cil!(Method, "newobj", ObjectModel, Call),
    cil!(Type, "castclass", ObjectModel),
    cil!(Type, "isinst", ObjectModel),
    cil!(None, "conv.r.un", Conversion),
    RESERVED,
    RESERVED,
    cil!(Type, "unbox", Conversion),
    cil!(None, "throw", ControlFlow, Throw),
    cil!(Field, "ldfld", ObjectModel),
    cil!(Field, "ldflda", ObjectModel),
    cil!(Field, "stfld", ObjectModel),
    cil!(Field, "ldsfld", ObjectModel),
    cil!(Field, "ldsflda", ObjectModel),
    // 0x80
    cil!(Field, "stsfld", ObjectModel),
    cil!(Type, "stobj", ObjectModel),
    cil!(None, "conv.ovf.i1.un", Conversion),
    cil!(None, "conv.ovf.i2.un", Conversion),
    cil!(None, "conv.ovf.i4.un", Conversion),
    cil!(None, "conv.ovf.i8.un", Conversion),
    cil!(None, "conv.ovf.u1.un", Conversion),
    cil!(None, "conv.ovf.u2.un", Conversion),
    cil!(None, "conv.ovf.u4.un", Conversion),
    cil!(None, "conv.ovf.u8.un", Conversion),
    cil!(None, "conv.ovf.i.un", Conversion),
    cil!(None, "conv.ovf.u.un", Conversion),
    cil!(Type, "box", Conversion),
    cil!(Type, "newarr", ObjectModel),
    cil!(None, "ldlen", ObjectModel),
    cil!(Type, "ldelema", ObjectModel),
    // 0x90
    cil!(None, "ldelem.i1", ObjectModel),
    cil!(None, "ldelem.u1", ObjectModel),
    cil!(None, "ldelem.i2", ObjectModel),
    cil!(None, "ldelem.u2", ObjectModel),
    cil!(None, "ldelem.i4", ObjectModel),
    cil!(None, "ldelem.u4", ObjectModel),
    cil!(None, "ldelem.i8", ObjectModel),
    cil!(None, "ldelem.i", ObjectModel),
    cil!(None, "ldelem.r4", ObjectModel),
    cil!(None, "ldelem.r8", ObjectModel),
    cil!(None, "ldelem.ref", ObjectModel),
    cil!(None, "stelem.i", ObjectModel),
    cil!(None, "stelem.i1", ObjectModel),
    cil!(None, "stelem.i2", ObjectModel),
    cil!(None, "stelem.i4", ObjectModel),
    cil!(None, "stelem.i8", ObjectModel),
    // 0xA0
    cil!(None, "stelem.r4", ObjectModel),
    cil!(None, "stelem.r8", ObjectModel),
    cil!(None, "stelem.ref", ObjectModel),
    cil!(Type, "ldelem", ObjectModel),
    cil!(Type, "stelem", ObjectModel),
    cil!(Type, "unbox.any", Conversion),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    // 0xB0
    RESERVED,
    RESERVED,
    RESERVED,
    cil!(None, "conv.ovf.i1", Conversion),
    cil!(None, "conv.ovf.u1", Conversion),
    cil!(None, "conv.ovf.i2", Conversion),
    cil!(None, "conv.ovf.u2", Conversion),
    cil!(None, "conv.ovf.i4", Conversion),
    cil!(None, "conv.ovf.u4", Conversion),
    cil!(None, "conv.ovf.i8", Conversion),
    cil!(None, "conv.ovf.u8", Conversion),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    // 0xC0
    RESERVED,
    RESERVED,
    cil!(Type, "refanyval", ObjectModel),
    cil!(None, "ckfinite", Arithmetic),
    RESERVED,
    RESERVED,
    cil!(Type, "mkrefany", ObjectModel),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    // 0xD0
    cil!(Token, "ldtoken", LoadStore),
    cil!(None, "conv.u2", Conversion),
    cil!(None, "conv.u1", Conversion),
    cil!(None, "conv.i", Conversion),
    cil!(None, "conv.ovf.i", Conversion),
    cil!(None, "conv.ovf.u", Conversion),
    cil!(None, "add.ovf", Arithmetic),
    cil!(None, "add.ovf.un", Arithmetic),
    cil!(None, "mul.ovf", Arithmetic),
    cil!(None, "mul.ovf.un", Arithmetic),
    cil!(None, "sub.ovf", Arithmetic),
    cil!(None, "sub.ovf.un", Arithmetic),
    cil!(None, "endfinally", ControlFlow, EndFinally),
    cil!(Branch, "leave", ControlFlow, Leave),
    cil!(ShortBranch, "leave.s", ControlFlow, Leave),
    cil!(None, "stind.i", LoadStore),
    // 0xE0
    cil!(None, "conv.u", Conversion),
];

/// Two byte opcodes `0xFE 0x00..=0xFE 0x1E`
pub const INSTRUCTIONS_FE: [CilInstruction; 31] = [
    // 0xFE 0x00
    cil!(None, "arglist", Misc),
    cil!(None, "ceq", Comparison),
    cil!(None, "cgt", Comparison),
    cil!(None, "cgt.un", Comparison),
    cil!(None, "clt", Comparison),
    cil!(None, "clt.un", Comparison),
    cil!(Method, "ldftn", LoadStore),
    cil!(Method, "ldvirtftn", LoadStore),
    RESERVED,
    cil!(Argument, "ldarg", LoadStore),
    cil!(Argument, "ldarga", LoadStore),
    cil!(Argument, "starg", LoadStore),
    cil!(Local, "ldloc", LoadStore),
    cil!(Local, "ldloca", LoadStore),
    cil!(Local, "stloc", LoadStore),
    cil!(None, "localloc", Misc),
    // 0xFE 0x10
    RESERVED,
    cil!(None, "endfilter", ControlFlow, EndFinally),
    cil!(UInt8, "unaligned.", Prefix),
    cil!(None, "volatile.", Prefix),
    cil!(None, "tail.", Prefix),
    cil!(Type, "initobj", ObjectModel),
    cil!(Type, "constrained.", Prefix),
    cil!(None, "cpblk", Misc),
    cil!(None, "initblk", Misc),
    cil!(UInt8, "no.", Prefix),
    cil!(None, "rethrow", ControlFlow, Throw),
    RESERVED,
    cil!(Type, "sizeof", ObjectModel),
    cil!(None, "refanytype", ObjectModel),
    cil!(None, "readonly.", Prefix),
];
