//! Turns a host dynamic method handle into a [`RawMethodCapture`].
//!
//! The handle passed in by a caller can be a delegate bound to a dynamic method, the dynamic
//! method itself, its internal runtime wrapper, the resolver that holds the generated body or
//! an incremental `DynamicILInfo` builder. [`CaptureHandle::classify`] maps each of those onto
//! one variant, the variants are unwrapped until a body holder is reached, and the body holder
//! is read through the field layouts in [`crate::capture::layout`].

use log::debug;

use crate::{
    capture::{
        host::{HostObject, HostRef, HostValue},
        layout::{self, class, FieldPath, ResolverLayout, INCREMENTAL_LAYOUTS, RESOLVER_LAYOUTS},
        runtime::{RuntimeMethod, RuntimeType},
        types::{
            ExceptionData, NativeHandle, NativeSignature, RawExceptionDescriptor,
            RawMethodCapture, SymbolSlot,
        },
    },
    Error, Result,
};

/// The recognized shapes of a dynamic method handle.
#[derive(Debug, Clone)]
pub enum CaptureHandle {
    /// A delegate whose target method is a dynamic method
    Delegate(HostRef),
    /// `DynamicMethod` or its `RTDynamicMethod` wrapper
    MethodLike(HostRef),
    /// `DynamicResolver`, the holder of an `ILGenerator` produced body
    ResolverLike(HostRef),
    /// `DynamicILInfo`, the holder of a body supplied as raw bytes
    IncrementalInfo(HostRef),
}

impl CaptureHandle {
    /// Classifies a host object by its runtime class.
    ///
    /// # Errors
    /// Returns [`Error::Capture`] if the object matches none of the recognized shapes.
    pub fn classify(obj: &HostRef) -> Result<CaptureHandle> {
        match obj.class_name() {
            class::DYNAMIC_RESOLVER => Ok(CaptureHandle::ResolverLike(obj.clone())),
            class::DYNAMIC_METHOD | class::RT_DYNAMIC_METHOD => {
                Ok(CaptureHandle::MethodLike(obj.clone()))
            }
            class::DYNAMIC_IL_INFO => Ok(CaptureHandle::IncrementalInfo(obj.clone())),
            _ if layout::DELEGATE_METHOD.exists(obj.as_ref()) => {
                Ok(CaptureHandle::Delegate(obj.clone()))
            }
            other => Err(capture_error!("unrecognized dynamic method shape '{}'", other)),
        }
    }

    /// Unwraps the handle down to its body holder and extracts the capture.
    ///
    /// # Errors
    /// Returns [`Error::Capture`] if a required field is missing under every known layout and
    /// [`Error::UnsupportedNestedCapture`] if the resolver is itself another dynamic method.
    pub fn into_capture(self) -> Result<RawMethodCapture> {
        let mut current = self;
        loop {
            current = match current {
                CaptureHandle::Delegate(obj) => unwrap_delegate(&obj)?,
                CaptureHandle::MethodLike(obj) => unwrap_method(&obj)?,
                CaptureHandle::ResolverLike(obj) => return extract_resolver(&obj),
                CaptureHandle::IncrementalInfo(obj) => return extract_incremental(&obj),
            };
        }
    }
}

/// Normalizes an optional host handle into a capture.
///
/// # Arguments
/// * `handle` - The object the caller obtained from the host runtime, `None` if it was null
///
/// # Errors
/// Returns [`Error::Capture`] for an absent or unrecognized handle and for missing fields, and
/// [`Error::UnsupportedNestedCapture`] when the body is held by another dynamic method.
///
/// # Examples
///
/// ```rust
/// use dynscope::capture::{normalize, HostSnapshot, HostValue, RuntimeMethod};
///
/// let resolver = HostSnapshot::new("System.Reflection.Emit.DynamicResolver")
///     .with_field("m_code", vec![0x2Au8])
///     .with_field("m_stackSize", 0)
///     .with_field(
///         "m_scope",
///         HostSnapshot::new("System.Reflection.Emit.DynamicScope")
///             .with_field("m_tokens", HostValue::List(vec![HostValue::Null])),
///     )
///     .with_null("m_exceptions")
///     .with_null("m_exceptionHeader")
///     .with_null("m_localSignature")
///     .with_field("m_method", RuntimeMethod::new(None, "Generated"))
///     .into_ref();
///
/// let capture = normalize(Some(&resolver)).unwrap();
/// assert_eq!(capture.code, vec![0x2A]);
/// assert!(normalize(None).is_err());
/// ```
pub fn normalize(handle: Option<&HostRef>) -> Result<RawMethodCapture> {
    let Some(obj) = handle else {
        return Err(capture_error!("dynamic method handle is null"));
    };

    let capture = CaptureHandle::classify(obj)?.into_capture()?;
    debug!(
        "captured '{}': {} code bytes, {} symbols, max stack {}",
        capture.name,
        capture.code.len(),
        capture.symbols.len(),
        capture.max_stack
    );

    Ok(capture)
}

fn unwrap_delegate(obj: &HostRef) -> Result<CaptureHandle> {
    match layout::DELEGATE_METHOD.read(obj.as_ref()) {
        Some(HostValue::Object(target)) => match CaptureHandle::classify(&target)? {
            method @ CaptureHandle::MethodLike(_) => Ok(method),
            _ => Err(capture_error!(
                "delegate '{}' does not target a dynamic method",
                obj.class_name()
            )),
        },
        Some(HostValue::Method(method)) => Err(capture_error!(
            "delegate targets the static method '{}'",
            method
        )),
        _ => Err(capture_error!(
            "delegate '{}' has no target method",
            obj.class_name()
        )),
    }
}

fn unwrap_method(obj: &HostRef) -> Result<CaptureHandle> {
    let method = if obj.class_name() == class::RT_DYNAMIC_METHOD {
        match layout::RT_DYNAMIC_OWNER.read(obj.as_ref()) {
            Some(HostValue::Object(owner)) if owner.class_name() == class::DYNAMIC_METHOD => owner,
            _ => return Err(capture_error!("runtime dynamic method wrapper has no owner")),
        }
    } else {
        obj.clone()
    };

    if !layout::DYNAMIC_RESOLVER.exists(method.as_ref()) {
        return Err(capture_error!(
            "missing field '{}' on '{}'",
            layout::DYNAMIC_RESOLVER.logical,
            method.class_name()
        ));
    }

    match layout::DYNAMIC_RESOLVER.read(method.as_ref()) {
        Some(HostValue::Object(resolver)) => match CaptureHandle::classify(&resolver)? {
            resolver @ CaptureHandle::ResolverLike(_) => return Ok(resolver),
            CaptureHandle::MethodLike(nested) => {
                return Err(Error::UnsupportedNestedCapture(dynamic_method_name(&nested)))
            }
            _ => {
                return Err(capture_error!(
                    "unexpected resolver class '{}'",
                    resolver.class_name()
                ))
            }
        },
        Some(HostValue::Null) | None => {}
        Some(other) => {
            return Err(capture_error!(
                "resolver field holds a {}",
                other.kind_name()
            ))
        }
    }

    match layout::DYNAMIC_IL_INFO.read(method.as_ref()) {
        Some(HostValue::Object(info)) if info.class_name() == class::DYNAMIC_IL_INFO => {
            Ok(CaptureHandle::IncrementalInfo(info))
        }
        _ => Err(capture_error!(
            "no resolver found for '{}'",
            dynamic_method_name(&method)
        )),
    }
}

fn select_layout<'l>(
    obj: &dyn HostObject,
    layouts: &'l [ResolverLayout],
) -> Result<&'l ResolverLayout> {
    let mut missing = Vec::with_capacity(layouts.len());
    for candidate in layouts {
        let absent = candidate.missing_fields(obj);
        if absent.is_empty() {
            debug!("'{}' matches the {} layout", obj.class_name(), candidate.name);
            return Ok(candidate);
        }
        missing.push(format!("{}: {}", candidate.name, absent.join(", ")));
    }

    Err(capture_error!(
        "'{}' matches no known field layout ({})",
        obj.class_name(),
        missing.join("; ")
    ))
}

fn extract_resolver(obj: &HostRef) -> Result<RawMethodCapture> {
    let fields = select_layout(obj.as_ref(), &RESOLVER_LAYOUTS)?;
    let mut capture = extract_common(obj.as_ref(), fields)?;

    let header = fields
        .exception_header
        .and_then(|name| obj.field(name))
        .unwrap_or(HostValue::Null);
    capture.exceptions = match header {
        HostValue::Bytes(bytes) if !bytes.is_empty() => ExceptionData::RawHeaderBytes(bytes),
        HostValue::Bytes(_) | HostValue::Null => {
            read_structured_exceptions(obj.field(fields.exceptions))?
        }
        other => {
            return Err(capture_error!(
                "exception header holds a {}",
                other.kind_name()
            ))
        }
    };

    Ok(capture)
}

fn extract_incremental(obj: &HostRef) -> Result<RawMethodCapture> {
    let fields = select_layout(obj.as_ref(), &INCREMENTAL_LAYOUTS)?;
    let mut capture = extract_common(obj.as_ref(), fields)?;

    capture.exceptions = match obj.field(fields.exceptions) {
        Some(HostValue::Bytes(bytes)) if !bytes.is_empty() => ExceptionData::RawHeaderBytes(bytes),
        Some(HostValue::Bytes(_) | HostValue::Null) | None => ExceptionData::None,
        Some(other) => {
            return Err(capture_error!(
                "exception bytes field holds a {}",
                other.kind_name()
            ))
        }
    };

    Ok(capture)
}

fn extract_common(obj: &dyn HostObject, fields: &ResolverLayout) -> Result<RawMethodCapture> {
    let code = match obj.field(fields.code) {
        Some(HostValue::Bytes(code)) => code,
        _ => return Err(capture_error!("'{}' holds no code bytes", fields.code)),
    };

    let max_stack = match obj.field(fields.max_stack) {
        Some(HostValue::Int(value)) => u32::try_from(value.max(0)).unwrap_or(u32::MAX),
        _ => return Err(capture_error!("'{}' is not an integer", fields.max_stack)),
    };

    let locals_signature = match obj.field(fields.locals) {
        Some(HostValue::Bytes(bytes)) if !bytes.is_empty() => Some(bytes),
        Some(HostValue::Bytes(_) | HostValue::Null) | None => None,
        Some(other) => {
            return Err(capture_error!(
                "local signature field holds a {}",
                other.kind_name()
            ))
        }
    };

    let symbols = match obj.field(fields.scope) {
        Some(HostValue::Object(scope)) => read_symbols(scope.as_ref())?,
        _ => return Err(capture_error!("'{}' holds no scope", fields.scope)),
    };

    let (name, native_signature) = read_method(fields.method, obj.field(fields.method))?;

    Ok(RawMethodCapture {
        name,
        code,
        max_stack,
        symbols,
        exceptions: ExceptionData::None,
        locals_signature,
        native_signature,
    })
}

fn read_symbols(scope: &dyn HostObject) -> Result<Vec<SymbolSlot>> {
    match layout::SCOPE_TOKENS.read(scope) {
        Some(HostValue::List(values)) => values.iter().map(convert_slot).collect(),
        Some(HostValue::Null) | None => Err(capture_error!(
            "scope '{}' holds no token list",
            scope.class_name()
        )),
        Some(other) => Err(capture_error!(
            "scope token list holds a {}",
            other.kind_name()
        )),
    }
}

fn convert_slot(value: &HostValue) -> Result<SymbolSlot> {
    let slot = match value {
        HostValue::Null => SymbolSlot::Null,
        HostValue::String(value) => SymbolSlot::Native(NativeHandle::String(value.clone())),
        HostValue::Bytes(bytes) => SymbolSlot::RawSignatureBytes(bytes.clone()),
        HostValue::Type(ty) => SymbolSlot::Native(NativeHandle::Type(ty.clone())),
        HostValue::Method(method) => SymbolSlot::Native(NativeHandle::Method {
            method: method.clone(),
            context: None,
        }),
        HostValue::Field(field) => SymbolSlot::Native(NativeHandle::Field {
            field: field.clone(),
            context: None,
        }),
        HostValue::Object(obj) => convert_object_slot(obj)?,
        other => SymbolSlot::Opaque(other.kind_name().to_string()),
    };

    Ok(slot)
}

fn convert_object_slot(obj: &HostRef) -> Result<SymbolSlot> {
    let slot = match obj.class_name() {
        class::GENERIC_METHOD_INFO => {
            let method = match layout::GENERIC_METHOD_HANDLE.read(obj.as_ref()) {
                Some(HostValue::Method(method)) => method,
                _ => return Err(capture_error!("generic method wrapper has no method handle")),
            };
            SymbolSlot::Native(NativeHandle::Method {
                method,
                context: read_context(obj.as_ref(), &layout::GENERIC_METHOD_CONTEXT),
            })
        }
        class::GENERIC_FIELD_INFO => {
            let field = match layout::GENERIC_FIELD_HANDLE.read(obj.as_ref()) {
                Some(HostValue::Field(field)) => field,
                _ => return Err(capture_error!("generic field wrapper has no field handle")),
            };
            SymbolSlot::Native(NativeHandle::Field {
                field,
                context: read_context(obj.as_ref(), &layout::GENERIC_FIELD_CONTEXT),
            })
        }
        class::VAR_ARG_METHOD => SymbolSlot::Native(convert_var_arg(obj)?),
        class::DYNAMIC_METHOD | class::RT_DYNAMIC_METHOD => {
            SymbolSlot::Native(NativeHandle::DynamicMethod(dynamic_method_name(obj)))
        }
        other => SymbolSlot::Opaque(other.to_string()),
    };

    Ok(slot)
}

fn read_context(obj: &dyn HostObject, path: &FieldPath) -> Option<RuntimeType> {
    match path.read(obj) {
        Some(HostValue::Type(context)) => Some(context),
        _ => None,
    }
}

fn convert_var_arg(obj: &HostRef) -> Result<NativeHandle> {
    let mut method = None;
    let mut dynamic_target = None;

    // Older runtimes store a DynamicMethod target in the same field as a static one
    match layout::VAR_ARG_TARGET.read(obj.as_ref()) {
        Some(HostValue::Method(target)) => method = Some(target),
        Some(HostValue::Object(target)) if is_dynamic_method(&target) => {
            dynamic_target = Some(dynamic_method_name(&target));
        }
        Some(HostValue::Null) | None => {}
        Some(other) => {
            return Err(capture_error!(
                "var-arg wrapper target holds a {}",
                other.kind_name()
            ))
        }
    }

    if let Some(HostValue::Object(target)) = layout::VAR_ARG_DYNAMIC_TARGET.read(obj.as_ref()) {
        dynamic_target = Some(dynamic_method_name(&target));
    }

    Ok(NativeHandle::VarArgAdapter {
        method,
        dynamic_target,
    })
}

fn is_dynamic_method(obj: &HostRef) -> bool {
    matches!(
        obj.class_name(),
        class::DYNAMIC_METHOD | class::RT_DYNAMIC_METHOD
    )
}

fn dynamic_method_name(obj: &HostRef) -> String {
    match layout::DYNAMIC_NAME.read(obj.as_ref()) {
        Some(HostValue::String(name)) => name,
        _ => obj.class_name().to_string(),
    }
}

fn read_method(field: &str, value: Option<HostValue>) -> Result<(String, NativeSignature)> {
    match value {
        Some(HostValue::Method(RuntimeMethod {
            name,
            return_type,
            params,
            ..
        })) => Ok((
            name,
            NativeSignature {
                params,
                return_type,
            },
        )),
        Some(HostValue::Object(method)) if is_dynamic_method(&method) => {
            let return_type = match layout::DYNAMIC_RETURN_TYPE.read(method.as_ref()) {
                Some(HostValue::Type(ty)) => Some(ty),
                _ => None,
            };
            let params = match layout::DYNAMIC_PARAMETER_TYPES.read(method.as_ref()) {
                Some(HostValue::List(values)) => values
                    .into_iter()
                    .map(|value| match value {
                        HostValue::Type(ty) => Ok(ty),
                        other => Err(capture_error!(
                            "parameter type list holds a {}",
                            other.kind_name()
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok((
                dynamic_method_name(&method),
                NativeSignature {
                    params,
                    return_type,
                },
            ))
        }
        Some(HostValue::Null) | None => Err(capture_error!("'{}' holds no owning method", field)),
        Some(other) => Err(capture_error!(
            "owning method field holds a {}",
            other.kind_name()
        )),
    }
}

fn read_structured_exceptions(value: Option<HostValue>) -> Result<ExceptionData> {
    let entries = match value {
        Some(HostValue::List(entries)) => entries,
        Some(HostValue::Null) | None => return Ok(ExceptionData::None),
        Some(other) => {
            return Err(capture_error!(
                "exception list holds a {}",
                other.kind_name()
            ))
        }
    };

    let mut descriptors = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            HostValue::Object(info) => descriptors.push(read_descriptor(info.as_ref())?),
            HostValue::Null => {}
            other => {
                return Err(capture_error!(
                    "exception list entry is a {}",
                    other.kind_name()
                ))
            }
        }
    }

    if descriptors.is_empty() {
        Ok(ExceptionData::None)
    } else {
        Ok(ExceptionData::StructuredList(descriptors))
    }
}

fn read_i32(obj: &dyn HostObject, path: &FieldPath) -> Result<i32> {
    match path.read(obj) {
        Some(HostValue::Int(value)) => i32::try_from(value)
            .map_err(|_| capture_error!("'{}' is out of range: {}", path.logical, value)),
        _ => Err(capture_error!("missing field '{}'", path.logical)),
    }
}

fn read_i32_array(obj: &dyn HostObject, path: &FieldPath) -> Result<Vec<i32>> {
    match path.read(obj) {
        Some(HostValue::Ints(values)) => values
            .into_iter()
            .map(|value| {
                i32::try_from(value)
                    .map_err(|_| capture_error!("'{}' is out of range: {}", path.logical, value))
            })
            .collect(),
        Some(HostValue::Null) => Ok(Vec::new()),
        _ => Err(capture_error!("missing field '{}'", path.logical)),
    }
}

fn read_descriptor(info: &dyn HostObject) -> Result<RawExceptionDescriptor> {
    let current_catch = read_i32(info, &layout::EH_CURRENT_CATCH)?;

    let catch_class = match layout::EH_CATCH_CLASS.read(info) {
        Some(HostValue::List(values)) => values
            .into_iter()
            .map(|value| match value {
                HostValue::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        Some(HostValue::Null) => Vec::new(),
        _ => return Err(capture_error!("missing field '{}'", layout::EH_CATCH_CLASS.logical)),
    };

    let filter_addr = if layout::EH_FILTER_ADDR.exists(info) {
        read_i32_array(info, &layout::EH_FILTER_ADDR)?
    } else {
        Vec::new()
    };

    Ok(RawExceptionDescriptor {
        start_addr: read_i32(info, &layout::EH_START_ADDR)?,
        end_addr: read_i32(info, &layout::EH_END_ADDR)?,
        end_finally: read_i32(info, &layout::EH_END_FINALLY)?,
        current_catch: usize::try_from(current_catch.max(0)).unwrap_or_default(),
        catch_addr: read_i32_array(info, &layout::EH_CATCH_ADDR)?,
        catch_end_addr: read_i32_array(info, &layout::EH_CATCH_END_ADDR)?,
        catch_class,
        kinds: read_i32_array(info, &layout::EH_TYPE)?,
        filter_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{
        host::HostSnapshot,
        runtime::RuntimeField,
        types::SlotKind,
    };

    fn empty_scope() -> HostSnapshot {
        HostSnapshot::new("System.Reflection.Emit.DynamicScope")
            .with_field("m_tokens", HostValue::List(vec![HostValue::Null]))
    }

    fn legacy_resolver(code: Vec<u8>) -> HostSnapshot {
        HostSnapshot::new(class::DYNAMIC_RESOLVER)
            .with_field("m_code", code)
            .with_field("m_stackSize", 2)
            .with_field("m_scope", empty_scope())
            .with_null("m_exceptions")
            .with_null("m_exceptionHeader")
            .with_null("m_localSignature")
            .with_field("m_method", RuntimeMethod::new(None, "Generated"))
    }

    #[test]
    fn classify_shapes() {
        let resolver = legacy_resolver(vec![0x2A]).into_ref();
        assert!(matches!(
            CaptureHandle::classify(&resolver),
            Ok(CaptureHandle::ResolverLike(_))
        ));

        let method = HostSnapshot::new(class::RT_DYNAMIC_METHOD).into_ref();
        assert!(matches!(
            CaptureHandle::classify(&method),
            Ok(CaptureHandle::MethodLike(_))
        ));

        let delegate = HostSnapshot::new("System.Func`1")
            .with_field("_methodBase", method)
            .into_ref();
        assert!(matches!(
            CaptureHandle::classify(&delegate),
            Ok(CaptureHandle::Delegate(_))
        ));

        let other = HostSnapshot::new("System.Object").into_ref();
        assert!(CaptureHandle::classify(&other).unwrap_err().is_capture_error());
    }

    #[test]
    fn delegate_to_method_to_resolver() {
        let resolver = legacy_resolver(vec![0x00, 0x2A]).into_ref();
        let method = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_field("_name", "Adder")
            .with_field("_resolver", resolver)
            .with_null("_dynamicILInfo")
            .into_ref();
        let wrapper = HostSnapshot::new(class::RT_DYNAMIC_METHOD)
            .with_field("m_owner", method)
            .into_ref();
        let delegate = HostSnapshot::new("System.Func`1")
            .with_field("Method", wrapper)
            .into_ref();

        let capture = normalize(Some(&delegate)).unwrap();
        assert_eq!(capture.code, vec![0x00, 0x2A]);
        assert_eq!(capture.max_stack, 2);
    }

    #[test]
    fn delegate_to_static_method_is_rejected() {
        let delegate = HostSnapshot::new("System.Action")
            .with_field("Method", RuntimeMethod::new(None, "Run"))
            .into_ref();

        assert!(normalize(Some(&delegate)).unwrap_err().is_capture_error());
    }

    #[test]
    fn method_without_resolver() {
        let method = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_null("m_resolver")
            .with_null("m_DynamicILInfo")
            .into_ref();

        match normalize(Some(&method)) {
            Err(Error::Capture { reason }) => assert!(reason.contains("no resolver found")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resolver_that_is_a_method_is_nested() {
        let inner = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_field("m_name", "Inner")
            .into_ref();
        let method = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_field("m_resolver", inner)
            .into_ref();

        match normalize(Some(&method)) {
            Err(Error::UnsupportedNestedCapture(name)) => assert_eq!(name, "Inner"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn incremental_info_is_used_without_resolver() {
        let info = HostSnapshot::new(class::DYNAMIC_IL_INFO)
            .with_field("m_code", vec![0x2Au8])
            .with_field("m_maxStackSize", -3)
            .with_field("m_scope", empty_scope())
            .with_field("m_exceptions", Vec::<u8>::new())
            .with_null("m_localSignature")
            .with_field("m_method", RuntimeMethod::new(None, "Generated"))
            .into_ref();
        let method = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_null("m_resolver")
            .with_field("m_DynamicILInfo", info)
            .into_ref();

        let capture = normalize(Some(&method)).unwrap();
        assert_eq!(capture.max_stack, 0);
        assert_eq!(capture.exceptions, ExceptionData::None);
    }

    #[test]
    fn null_scope_is_rejected() {
        // ldstr slot 1; ret
        let resolver = legacy_resolver(vec![0x72, 0x01, 0x00, 0x00, 0x70, 0x2A])
            .with_null("m_scope")
            .into_ref();

        match normalize(Some(&resolver)) {
            Err(Error::Capture { reason }) => assert!(reason.contains("'m_scope' holds no scope")),
            other => panic!("unexpected {other:?}"),
        }

        let resolver = legacy_resolver(vec![0x2A])
            .with_field("m_scope", vec![0x01u8])
            .into_ref();
        assert!(normalize(Some(&resolver)).unwrap_err().is_capture_error());
    }

    #[test]
    fn scope_without_tokens_is_rejected() {
        let scope = HostSnapshot::new("System.Reflection.Emit.DynamicScope").with_null("m_tokens");
        let resolver = legacy_resolver(vec![0x2A])
            .with_field("m_scope", scope)
            .into_ref();

        match normalize(Some(&resolver)) {
            Err(Error::Capture { reason }) => assert!(reason.contains("no token list")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn null_owning_method_is_rejected() {
        let resolver = legacy_resolver(vec![0x2A]).with_null("m_method").into_ref();

        match normalize(Some(&resolver)) {
            Err(Error::Capture { reason }) => {
                assert!(reason.contains("'m_method' holds no owning method"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn layout_error_lists_missing_fields() {
        let resolver = HostSnapshot::new(class::DYNAMIC_RESOLVER)
            .with_field("m_code", vec![0x2Au8])
            .into_ref();

        match normalize(Some(&resolver)) {
            Err(Error::Capture { reason }) => {
                assert!(reason.contains("current:"));
                assert!(reason.contains("legacy:"));
                assert!(reason.contains("m_stackSize"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn header_wins_over_structured_list() {
        let info = HostSnapshot::new("System.Reflection.Emit.__ExceptionInfo").into_ref();
        let resolver = legacy_resolver(vec![0x2A])
            .with_field("m_exceptionHeader", vec![0x01u8, 0x04, 0x00, 0x00])
            .with_field("m_exceptions", HostValue::List(vec![HostValue::Object(info)]))
            .into_ref();

        let capture = normalize(Some(&resolver)).unwrap();
        assert_eq!(
            capture.exceptions,
            ExceptionData::RawHeaderBytes(vec![0x01, 0x04, 0x00, 0x00])
        );
    }

    #[test]
    fn structured_descriptors() {
        let info = HostSnapshot::new("System.Reflection.Emit.__ExceptionInfo")
            .with_field("m_startAddr", 0)
            .with_field("m_endAddr", 4)
            .with_field("m_endFinally", -1)
            .with_field("m_currentCatch", 1)
            .with_field("m_catchAddr", HostValue::Ints(vec![4]))
            .with_field("m_catchEndAddr", HostValue::Ints(vec![6]))
            .with_field(
                "m_catchClass",
                HostValue::List(vec![HostValue::Type(RuntimeType::class(
                    "System",
                    "Exception",
                ))]),
            )
            .with_field("m_type", HostValue::Ints(vec![0]))
            .into_ref();
        let resolver = legacy_resolver(vec![0x2A])
            .with_field("m_exceptions", HostValue::List(vec![HostValue::Object(info)]))
            .into_ref();

        let capture = normalize(Some(&resolver)).unwrap();
        let ExceptionData::StructuredList(descriptors) = capture.exceptions else {
            panic!("expected structured exceptions");
        };
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].end_finally, -1);
        assert_eq!(descriptors[0].catch_addr, vec![4]);
        assert!(descriptors[0].filter_addr.is_empty());
        assert!(descriptors[0].catch_class[0].is_some());
    }

    #[test]
    fn symbol_slots() {
        let field = RuntimeField {
            declaring_type: RuntimeType::class("Demo", "Box`1"),
            name: "value".into(),
            field_type: RuntimeType::GenericParam {
                index: 0,
                method_owned: false,
            },
            is_static: false,
        };
        let context = RuntimeType::class("Demo", "Box`1")
            .with_generic_args(vec![RuntimeType::value_type("System", "Int32")]);

        let generic_field = HostSnapshot::new(class::GENERIC_FIELD_INFO)
            .with_field("m_fieldHandle", field)
            .with_field("m_context", context.clone())
            .into_ref();
        let nested = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_field("m_name", "Helper")
            .into_ref();
        let var_arg = HostSnapshot::new(class::VAR_ARG_METHOD)
            .with_null("m_method")
            .with_field("m_dynamicMethod", nested)
            .into_ref();
        let scope = HostSnapshot::new("System.Reflection.Emit.DynamicScope")
            .with_field(
                "m_tokens",
                HostValue::List(vec![
                    HostValue::Null,
                    HostValue::from("hello"),
                    HostValue::Object(generic_field),
                    HostValue::Object(var_arg),
                    HostValue::Object(HostSnapshot::new("Some.Unknown").into_ref()),
                    HostValue::Bytes(vec![0x00, 0x00, 0x01]),
                ]),
            )
            .into_ref();
        let resolver = legacy_resolver(vec![0x2A])
            .with_field("m_scope", scope)
            .into_ref();

        let capture = normalize(Some(&resolver)).unwrap();
        let symbols = capture.symbols;
        assert_eq!(symbols.len(), 6);
        assert_eq!(symbols[0], SymbolSlot::Null);
        assert_eq!(symbols[1].kind(), Some(SlotKind::String));
        match &symbols[2] {
            SymbolSlot::Native(NativeHandle::Field { context: Some(ctx), .. }) => {
                assert_eq!(*ctx, context)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            symbols[3],
            SymbolSlot::Native(NativeHandle::VarArgAdapter {
                method: None,
                dynamic_target: Some("Helper".into()),
            })
        );
        assert_eq!(symbols[4], SymbolSlot::Opaque("Some.Unknown".into()));
        assert_eq!(symbols[5].kind(), Some(SlotKind::Signature));
    }

    #[test]
    fn native_signature_from_dynamic_method() {
        let method = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_field("_name", "Sum")
            .with_field("_returnType", RuntimeType::value_type("System", "Int32"))
            .with_field(
                "_parameterTypes",
                HostValue::List(vec![
                    HostValue::Type(RuntimeType::value_type("System", "Int32")),
                    HostValue::Type(RuntimeType::value_type("System", "Int32")),
                ]),
            )
            .into_ref();
        let resolver = HostSnapshot::new(class::DYNAMIC_RESOLVER)
            .with_field("_code", vec![0x2Au8])
            .with_field("_stackSize", 2)
            .with_field(
                "_scope",
                HostSnapshot::new("System.Reflection.Emit.DynamicScope")
                    .with_field("_tokens", HostValue::List(Vec::new())),
            )
            .with_null("_exceptions")
            .with_null("_exceptionHeader")
            .with_null("_localSignature")
            .with_field("_method", method)
            .into_ref();

        let capture = normalize(Some(&resolver)).unwrap();
        assert_eq!(capture.name, "Sum");
        assert_eq!(capture.native_signature.params.len(), 2);
        assert!(capture.native_signature.return_type.is_some());
    }
}
