#![no_main]

use dynscope::prelude::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte splits the input into an opcode stream and an exception section
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (code, header) = rest.split_at(split);

    let capture = RawMethodCapture {
        name: "fuzz".into(),
        code: code.to_vec(),
        max_stack: 8,
        symbols: vec![
            SymbolSlot::Null,
            SymbolSlot::Native(NativeHandle::String("s".into())),
            SymbolSlot::Native(NativeHandle::Type(RuntimeType::class("System", "Object"))),
            SymbolSlot::RawSignatureBytes(header.to_vec()),
        ],
        exceptions: ExceptionData::RawHeaderBytes(header.to_vec()),
        locals_signature: Some(header.to_vec()),
        ..RawMethodCapture::default()
    };

    let space = SymbolSpace::new();
    let mut session = ReconstructionSession::new(capture, &space, ReconstructionConfig::default());
    if session.decode().is_ok() {
        let _ = session.finalize();
    }
});
