//! Builders for host object graphs, opcode streams and captures used across the unit tests.

use crate::{
    capture::{HostSnapshot, HostValue, RawMethodCapture, RuntimeMethod, SymbolSlot},
    metadata::token::Token,
};

/// Assembles CIL bytes one instruction at a time
#[derive(Default)]
pub struct IlBuilder {
    code: Vec<u8>,
}

impl IlBuilder {
    pub fn new() -> Self {
        IlBuilder::default()
    }

    /// Single byte opcode without operand
    pub fn op(mut self, opcode: u8) -> Self {
        self.code.push(opcode);
        self
    }

    /// Opcode followed by a token referencing symbol slot `slot`
    pub fn token(mut self, opcode: u8, table: u8, slot: u32) -> Self {
        self.code.push(opcode);
        self.code
            .extend_from_slice(&Token::from_parts(table, slot).value().to_le_bytes());
        self
    }

    pub fn ldc_i4(mut self, value: i32) -> Self {
        self.code.push(0x20);
        self.code.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn br_s(mut self, opcode: u8, delta: i8) -> Self {
        self.code.push(opcode);
        self.code.extend_from_slice(&delta.to_le_bytes());
        self
    }

    pub fn ret(self) -> Self {
        self.op(0x2A)
    }

    pub fn build(self) -> Vec<u8> {
        self.code
    }
}

/// A capture around `code` and `symbols` with everything else empty
pub fn capture(name: &str, code: Vec<u8>, symbols: Vec<SymbolSlot>) -> RawMethodCapture {
    RawMethodCapture {
        name: name.to_string(),
        code,
        max_stack: 8,
        symbols,
        ..RawMethodCapture::default()
    }
}

/// A `DynamicResolver` snapshot using the current runtime field names
pub fn current_resolver(code: Vec<u8>, tokens: Vec<HostValue>) -> HostSnapshot {
    HostSnapshot::new("System.Reflection.Emit.DynamicResolver")
        .with_field("_code", code)
        .with_field("_stackSize", 8)
        .with_field(
            "_scope",
            HostSnapshot::new("System.Reflection.Emit.DynamicScope")
                .with_field("_tokens", HostValue::List(tokens)),
        )
        .with_null("_exceptions")
        .with_null("_exceptionHeader")
        .with_null("_localSignature")
        .with_field("_method", RuntimeMethod::new(None, "Generated"))
}
