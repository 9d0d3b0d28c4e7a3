//! End-to-end reconstruction of host object graphs.
//!
//! Each test builds the runtime objects a `DynamicMethod` leaves behind, in one of the shapes a
//! caller may hand over, and checks the rebuilt method body.

use dynscope::{
    capture::{layout::class, HostRef, HostSnapshot, HostValue, RuntimeMethod, RuntimeType},
    prelude::*,
};

fn scope(tokens: Vec<HostValue>) -> HostSnapshot {
    HostSnapshot::new("System.Reflection.Emit.DynamicScope").with_field("_tokens", HostValue::List(tokens))
}

fn resolver(code: Vec<u8>, max_stack: i32, tokens: Vec<HostValue>) -> HostSnapshot {
    HostSnapshot::new(class::DYNAMIC_RESOLVER)
        .with_field("_code", code)
        .with_field("_stackSize", max_stack)
        .with_field("_scope", scope(tokens))
        .with_null("_exceptions")
        .with_null("_exceptionHeader")
        .with_null("_localSignature")
        .with_field("_method", RuntimeMethod::new(None, "Generated"))
}

/// The `DynamicMethod` a resolver points back to
fn owner(name: &str) -> HostSnapshot {
    HostSnapshot::new(class::DYNAMIC_METHOD)
        .with_field("_name", name)
        .with_field("_returnType", RuntimeType::class("System", "String"))
        .with_field(
            "_parameterTypes",
            HostValue::List(vec![HostValue::Type(RuntimeType::value_type("System", "Int32"))]),
        )
}

fn rebuild(handle: &HostRef) -> Result<ReconstructedMethod> {
    let space = SymbolSpace::new();
    reconstruct(Some(handle), &space, ReconstructionConfig::default())
}

#[test]
fn comparison_with_extended_opcode() -> Result<()> {
    // ldarg.0; ldarg.1; ceq; ret
    let handle = resolver(vec![0x02, 0x03, 0xFE, 0x01, 0x2A], 1, vec![HostValue::Null]).into_ref();
    let method = rebuild(&handle)?;

    let mnemonics: Vec<&str> = method.instructions.iter().map(|i| i.mnemonic).collect();
    assert_eq!(mnemonics, ["ldarg.0", "ldarg.1", "ceq", "ret"]);
    assert_eq!(method.instructions[2].offset, 2);
    assert_eq!(method.instructions[2].size, 2);
    assert_eq!(method.instructions[3].offset, 4);
    assert_eq!(method.max_stack, 1);
    assert!(method.exception_regions.is_empty());
    Ok(())
}

#[test]
fn delegate_to_dynamic_method_to_resolver() -> Result<()> {
    // ldstr "key"; call Decoder.Decode; ret
    let code = vec![
        0x72, 0x01, 0x00, 0x00, 0x70, 0x28, 0x02, 0x00, 0x00, 0x0A, 0x2A,
    ];
    let mut decode = RuntimeMethod::new(Some(RuntimeType::class("Demo", "Decoder")), "Decode");
    decode.params = vec![RuntimeType::class("System", "String")];
    decode.return_type = Some(RuntimeType::class("System", "String"));

    let body = resolver(
        code,
        2,
        vec![HostValue::Null, "key".into(), HostValue::Method(decode)],
    )
    .with_field("_method", owner("Stage1"))
    .into_ref();
    let method = owner("Stage1")
        .with_field("_resolver", body)
        .with_null("_dynamicILInfo")
        .into_ref();
    let delegate = HostSnapshot::new("System.Func`2")
        .with_field("_methodBase", method)
        .into_ref();

    let rebuilt = rebuild(&delegate)?;

    assert_eq!(rebuilt.name, "Stage1");
    assert_eq!(rebuilt.instructions[0].operand, Operand::String("key".into()));
    match &rebuilt.instructions[1].operand {
        Operand::Method(method) => {
            assert_eq!(method.name, "Decode");
            assert_eq!(method.signature.params.len(), 1);
        }
        other => panic!("expected a method operand, got {other:?}"),
    }
    assert_eq!(rebuilt.signature.params[0].base, TypeSignature::I4);
    assert_eq!(rebuilt.signature.return_type.base, TypeSignature::String);
    assert!(!rebuilt.signature.has_this);
    Ok(())
}

#[test]
fn legacy_layout_is_selected_by_probing() -> Result<()> {
    let handle = HostSnapshot::new(class::DYNAMIC_RESOLVER)
        .with_field("m_code", vec![0x00u8, 0x2A])
        .with_field("m_stackSize", 0)
        .with_field(
            "m_scope",
            HostSnapshot::new("System.Reflection.Emit.DynamicScope")
                .with_field("m_tokens", HostValue::List(vec![HostValue::Null])),
        )
        .with_null("m_exceptions")
        .with_null("m_exceptionHeader")
        .with_null("m_localSignature")
        .with_field("m_method", RuntimeMethod::new(None, "Legacy"))
        .into_ref();

    let method = rebuild(&handle)?;
    assert_eq!(method.name, "Legacy");
    assert_eq!(method.instructions.len(), 2);
    Ok(())
}

#[test]
fn null_scope_is_a_capture_error() {
    // ldstr slot 1; ret
    let handle = resolver(vec![0x72, 0x01, 0x00, 0x00, 0x70, 0x2A], 1, Vec::new())
        .with_null("_scope")
        .into_ref();

    let err = rebuild(&handle).unwrap_err();
    assert!(err.is_capture_error());
    assert!(err.to_string().contains("_scope"));
}

#[test]
fn null_owning_method_is_a_capture_error() {
    let handle = resolver(vec![0x2A], 0, vec![HostValue::Null])
        .with_null("_method")
        .into_ref();

    let err = rebuild(&handle).unwrap_err();
    assert!(err.is_capture_error());
    assert!(err.to_string().contains("_method"));
}

#[test]
fn missing_field_under_both_layouts() {
    let handle = HostSnapshot::new(class::DYNAMIC_RESOLVER)
        .with_field("_code", vec![0x2Au8])
        .with_field("m_stackSize", 0)
        .into_ref();

    let err = rebuild(&handle).unwrap_err();
    assert!(matches!(err, Error::Capture { .. }));
    assert!(err.is_capture_error());
}

#[test]
fn incremental_info_with_fat_exception_section() -> Result<()> {
    // 0: nop; 1: leave.s +2 -> 5; 3: pop; 4: endfinally; 5: ret
    let code = vec![0x00, 0xDE, 0x02, 0x26, 0xDC, 0x2A];
    let mut section = ((28u32 << 8) | 0x41).to_le_bytes().to_vec();
    for field in [2u32, 0, 3, 3, 2, 0] {
        section.extend_from_slice(&field.to_le_bytes());
    }

    let info = HostSnapshot::new(class::DYNAMIC_IL_INFO)
        .with_field("_code", code)
        .with_field("_maxStackSize", 1)
        .with_field("_scope", scope(vec![HostValue::Null]))
        .with_field("_exceptions", section)
        .with_field("_localSignature", vec![0x07u8, 0x01, 0x0E])
        .with_field("_method", owner("Incremental"))
        .into_ref();
    let method = HostSnapshot::new(class::DYNAMIC_METHOD)
        .with_field("_name", "Incremental")
        .with_null("_resolver")
        .with_field("_dynamicILInfo", info)
        .into_ref();

    let rebuilt = rebuild(&method)?;

    assert_eq!(rebuilt.name, "Incremental");
    assert_eq!(rebuilt.locals.len(), 1);
    assert_eq!(rebuilt.locals[0].base, TypeSignature::String);
    assert_eq!(rebuilt.instructions[1].operand, Operand::Target(4));

    let region = &rebuilt.exception_regions[0];
    assert_eq!(region.kind, RegionKind::Finally);
    assert_eq!(region.try_start, 0);
    assert_eq!(region.try_end, Some(2));
    assert_eq!(region.handler_start, 2);
    assert_eq!(region.handler_end, Some(4));
    Ok(())
}

#[test]
fn structured_catch_and_finally_share_try_start() -> Result<()> {
    // 0: nop; 1: leave.s -> 8; 3: pop; 4: leave.s -> 8; 6: nop; 7: endfinally; 8: ret
    let code = vec![0x00, 0xDE, 0x05, 0x26, 0xDE, 0x02, 0x00, 0xDC, 0x2A];
    let exception = RuntimeType::class("System", "InvalidOperationException");

    let info = HostSnapshot::new("System.Reflection.Emit.__ExceptionInfo")
        .with_field("m_startAddr", 0)
        .with_field("m_endAddr", 3)
        .with_field("m_endFinally", 6)
        .with_field("m_currentCatch", 2)
        .with_field("m_catchAddr", HostValue::Ints(vec![3, 6]))
        .with_field("m_catchEndAddr", HostValue::Ints(vec![6, 8]))
        .with_field(
            "m_catchClass",
            HostValue::List(vec![HostValue::Type(exception), HostValue::Null]),
        )
        .with_field("m_type", HostValue::Ints(vec![0, 2]))
        .into_ref();
    let handle = resolver(code, 2, vec![HostValue::Null])
        .with_field("_exceptions", HostValue::List(vec![HostValue::Object(info)]))
        .into_ref();

    let method = rebuild(&handle)?;
    let regions = &method.exception_regions;
    assert_eq!(regions.len(), 2);

    assert_eq!(regions[0].kind, RegionKind::Catch);
    assert_eq!(regions[0].try_start, 0);
    assert_eq!(regions[0].try_end, Some(2));
    assert_eq!(regions[0].handler_start, 2);
    assert_eq!(regions[0].handler_end, Some(4));
    assert!(matches!(regions[0].catch_type, Some(TypeSignature::Class(_))));

    assert_eq!(regions[1].kind, RegionKind::Finally);
    assert_eq!(regions[1].try_start, regions[0].try_start);
    // A finally ends its protected range at its own end-of-finally marker
    assert_eq!(regions[1].try_end, Some(4));
    assert_eq!(regions[1].handler_start, 4);
    assert_eq!(regions[1].handler_end, Some(6));
    assert_eq!(regions[1].catch_type, None);
    Ok(())
}

#[test]
fn nested_dynamic_method_is_unsupported() {
    let inner = HostSnapshot::new(class::DYNAMIC_METHOD)
        .with_field("_name", "Stage2")
        .into_ref();
    let outer = resolver(
        vec![0x28, 0x01, 0x00, 0x00, 0x06, 0x2A],
        1,
        vec![HostValue::Null, HostValue::Object(inner)],
    )
    .into_ref();

    match rebuild(&outer) {
        Err(Error::UnsupportedNestedCapture(name)) => assert_eq!(name, "Stage2"),
        other => panic!("expected an unsupported nested capture, got {other:?}"),
    }
}

#[test]
fn out_of_range_string_becomes_empty() -> Result<()> {
    // ldstr slot 5 of a 2 slot table
    let handle = resolver(
        vec![0x72, 0x05, 0x00, 0x00, 0x70, 0x2A],
        1,
        vec![HostValue::Null, "only".into()],
    )
    .into_ref();

    let method = rebuild(&handle)?;
    assert_eq!(method.instructions[0].operand, Operand::String(String::new()));
    Ok(())
}

#[test]
fn out_of_range_type_is_a_decode_error() {
    // box slot 5 of a 2 slot table
    let handle = resolver(
        vec![0x8C, 0x05, 0x00, 0x00, 0x02, 0x2A],
        1,
        vec![HostValue::Null, "only".into()],
    )
    .into_ref();

    assert!(rebuild(&handle).unwrap_err().is_decode_error());
}

#[test]
fn lone_ceq_with_empty_symbol_table() -> Result<()> {
    let space = SymbolSpace::new();
    let capture = RawMethodCapture {
        code: vec![0xFE, 0x01],
        max_stack: 1,
        ..RawMethodCapture::default()
    };
    let mut session = ReconstructionSession::new(capture, &space, ReconstructionConfig::default());
    session.decode()?;
    let method = session.finalize()?;

    assert_eq!(method.instructions.len(), 1);
    assert_eq!(method.instructions[0].offset, 0);
    assert_eq!(method.instructions[0].mnemonic, "ceq");
    assert_eq!(method.instructions[0].operand, Operand::None);
    assert!(method.exception_regions.is_empty());
    assert!(method.locals.is_empty());
    assert_eq!(method.max_stack, 1);
    Ok(())
}

#[test]
fn oversized_array_counts_in_locals_fail_the_capture() {
    let space = SymbolSpace::new();
    let capture = RawMethodCapture {
        code: vec![0x2A],
        locals_signature: Some(vec![
            0x07, 0x01, 0x14, 0x08, 0xDF, 0xFF, 0xFF, 0xFF, 0xDF, 0xFF, 0xFF, 0xFF,
        ]),
        ..RawMethodCapture::default()
    };
    let mut session = ReconstructionSession::new(capture, &space, ReconstructionConfig::default());

    assert!(matches!(session.decode(), Err(Error::OutOfBounds)));
}

#[test]
fn session_misuse_is_a_usage_error() {
    let space = SymbolSpace::new();
    let capture = RawMethodCapture {
        code: vec![0x2A],
        ..RawMethodCapture::default()
    };
    let mut session = ReconstructionSession::new(capture, &space, ReconstructionConfig::default());

    assert!(matches!(session.decode_exception_regions(), Err(Error::Usage(_))));
    assert!(matches!(session.finalize(), Err(Error::Usage(_))));
    session.decode().expect("decodes");
    session.finalize().expect("finalizes");
    assert!(matches!(session.finalize(), Err(Error::Usage(_))));
}

#[test]
fn batch_over_mixed_handles() {
    let _ = env_logger::builder().is_test(true).try_init();

    let good = resolver(vec![0x2A], 0, vec![HostValue::Null]).into_ref();
    let nested = resolver(
        vec![0x28, 0x01, 0x00, 0x00, 0x06, 0x2A],
        1,
        vec![
            HostValue::Null,
            HostValue::Object(HostSnapshot::new(class::DYNAMIC_METHOD).into_ref()),
        ],
    )
    .into_ref();
    let handles: Vec<Option<HostRef>> = (0..32)
        .map(|i| match i % 4 {
            0 => None,
            1 => Some(nested.clone()),
            _ => Some(good.clone()),
        })
        .collect();

    let space = SymbolSpace::new();
    let (results, report) = reconstruct_all(&handles, &space, ReconstructionConfig::default());

    assert_eq!(results.len(), 32);
    assert_eq!(report.restored, 16);
    assert_eq!(report.skipped, 8);
    assert_eq!(report.unsupported, 8);
    assert_eq!(report.failed, 0);
    for (handle, result) in handles.iter().zip(&results) {
        assert_eq!(handle.is_none(), matches!(result, Err(Error::Capture { .. })));
    }
}
