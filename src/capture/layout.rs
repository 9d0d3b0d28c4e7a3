//! Field-path tables for the runtime classes a capture is extracted from.
//!
//! Runtime versions renamed the private fields of the dynamic method machinery. Every logical
//! field is therefore described by a [`FieldPath`] listing its candidate names in preference
//! order, and resolver-like objects additionally come in whole [`ResolverLayout`] variants that
//! are tried one after another.

use crate::capture::host::{HostObject, HostValue};

/// Runtime class names the normalizer dispatches on.
pub mod class {
    /// `System.Reflection.Emit.DynamicMethod`
    pub const DYNAMIC_METHOD: &str = "System.Reflection.Emit.DynamicMethod";
    /// `System.Reflection.Emit.DynamicMethod+RTDynamicMethod`
    pub const RT_DYNAMIC_METHOD: &str = "System.Reflection.Emit.DynamicMethod+RTDynamicMethod";
    /// `System.Reflection.Emit.DynamicResolver`
    pub const DYNAMIC_RESOLVER: &str = "System.Reflection.Emit.DynamicResolver";
    /// `System.Reflection.Emit.DynamicILInfo`
    pub const DYNAMIC_IL_INFO: &str = "System.Reflection.Emit.DynamicILInfo";
    /// `System.Reflection.Emit.GenericMethodInfo`
    pub const GENERIC_METHOD_INFO: &str = "System.Reflection.Emit.GenericMethodInfo";
    /// `System.Reflection.Emit.GenericFieldInfo`
    pub const GENERIC_FIELD_INFO: &str = "System.Reflection.Emit.GenericFieldInfo";
    /// `System.Reflection.Emit.VarArgMethod`
    pub const VAR_ARG_METHOD: &str = "System.Reflection.Emit.VarArgMethod";
}

/// A logical field and the concrete names it has carried across runtime versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    /// Name used in diagnostics
    pub logical: &'static str,
    /// Concrete field names, most recent runtime first
    pub candidates: &'static [&'static str],
}

impl FieldPath {
    /// Reads the first candidate field that exists on `obj`.
    #[must_use]
    pub fn read(&self, obj: &dyn HostObject) -> Option<HostValue> {
        self.candidates.iter().find_map(|name| obj.field(name))
    }

    /// Returns `true` if any candidate exists on `obj`.
    #[must_use]
    pub fn exists(&self, obj: &dyn HostObject) -> bool {
        self.candidates.iter().any(|name| obj.has_field(name))
    }
}

macro_rules! field_path {
    ($logical:expr, [$($candidate:expr),+ $(,)?]) => {
        FieldPath {
            logical: $logical,
            candidates: &[$($candidate),+],
        }
    };
}

/// `Delegate.Method`
pub const DELEGATE_METHOD: FieldPath = field_path!("delegate method", ["Method", "_methodBase"]);
/// `RTDynamicMethod.m_owner`
pub const RT_DYNAMIC_OWNER: FieldPath = field_path!("owner", ["_owner", "m_owner"]);
/// `DynamicMethod.m_resolver`
pub const DYNAMIC_RESOLVER: FieldPath = field_path!("resolver", ["_resolver", "m_resolver"]);
/// `DynamicMethod.m_DynamicILInfo`
pub const DYNAMIC_IL_INFO: FieldPath =
    field_path!("dynamic il info", ["_dynamicILInfo", "m_DynamicILInfo"]);
/// `DynamicMethod.m_name`
pub const DYNAMIC_NAME: FieldPath = field_path!("name", ["_name", "m_name"]);
/// `DynamicMethod.m_returnType`
pub const DYNAMIC_RETURN_TYPE: FieldPath =
    field_path!("return type", ["_returnType", "m_returnType"]);
/// `DynamicMethod.m_parameterTypes`
pub const DYNAMIC_PARAMETER_TYPES: FieldPath =
    field_path!("parameter types", ["_parameterTypes", "m_parameterTypes"]);
/// `DynamicScope.m_tokens`
pub const SCOPE_TOKENS: FieldPath = field_path!("tokens", ["_tokens", "m_tokens"]);

/// `GenericMethodInfo.m_methodHandle`
pub const GENERIC_METHOD_HANDLE: FieldPath =
    field_path!("generic method handle", ["m_methodHandle", "m_method"]);
/// `GenericMethodInfo.m_context`
pub const GENERIC_METHOD_CONTEXT: FieldPath = field_path!("generic method context", ["m_context"]);
/// `GenericFieldInfo.m_fieldHandle`
pub const GENERIC_FIELD_HANDLE: FieldPath =
    field_path!("generic field handle", ["m_fieldHandle", "m_field"]);
/// `GenericFieldInfo.m_context`
pub const GENERIC_FIELD_CONTEXT: FieldPath = field_path!("generic field context", ["m_context"]);
/// `VarArgMethod.m_method`
pub const VAR_ARG_TARGET: FieldPath = field_path!("var-arg method", ["m_method"]);
/// `VarArgMethod.m_dynamicMethod`, only present on .NET 4 and later
pub const VAR_ARG_DYNAMIC_TARGET: FieldPath =
    field_path!("var-arg dynamic method", ["m_dynamicMethod"]);

/// `__ExceptionInfo.m_startAddr`
pub const EH_START_ADDR: FieldPath = field_path!("start address", ["m_startAddr", "_startAddr"]);
/// `__ExceptionInfo.m_endAddr`
pub const EH_END_ADDR: FieldPath = field_path!("end address", ["m_endAddr", "_endAddr"]);
/// `__ExceptionInfo.m_endFinally`
pub const EH_END_FINALLY: FieldPath = field_path!("end finally", ["m_endFinally", "_endFinally"]);
/// `__ExceptionInfo.m_currentCatch`
pub const EH_CURRENT_CATCH: FieldPath =
    field_path!("current catch", ["m_currentCatch", "_currentCatch"]);
/// `__ExceptionInfo.m_catchAddr`
pub const EH_CATCH_ADDR: FieldPath = field_path!("catch address", ["m_catchAddr", "_catchAddr"]);
/// `__ExceptionInfo.m_catchEndAddr`
pub const EH_CATCH_END_ADDR: FieldPath =
    field_path!("catch end address", ["m_catchEndAddr", "_catchEndAddr"]);
/// `__ExceptionInfo.m_catchClass`
pub const EH_CATCH_CLASS: FieldPath = field_path!("catch class", ["m_catchClass", "_catchClass"]);
/// `__ExceptionInfo.m_type`
pub const EH_TYPE: FieldPath = field_path!("clause type", ["m_type", "_type"]);
/// `__ExceptionInfo.m_filterAddr`, optional
pub const EH_FILTER_ADDR: FieldPath = field_path!("filter address", ["m_filterAddr", "_filterAddr"]);

/// Field names of one resolver-like object layout.
///
/// `exceptions` holds structured descriptors for `DynamicResolver` and raw header bytes for
/// `DynamicILInfo`; `exception_header` is only used by `DynamicResolver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverLayout {
    /// Layout name used in diagnostics
    pub name: &'static str,
    /// Raw opcode bytes
    pub code: &'static str,
    /// Declared max stack
    pub max_stack: &'static str,
    /// The `DynamicScope` holding the symbol table
    pub scope: &'static str,
    /// Exception data
    pub exceptions: &'static str,
    /// Raw exception header, if this layout has one
    pub exception_header: Option<&'static str>,
    /// Local signature blob
    pub locals: &'static str,
    /// The owning method object
    pub method: &'static str,
}

impl ResolverLayout {
    /// Required fields that `obj` does not declare under this layout.
    #[must_use]
    pub fn missing_fields(&self, obj: &dyn HostObject) -> Vec<&'static str> {
        let mut names = vec![
            self.code,
            self.max_stack,
            self.scope,
            self.exceptions,
            self.locals,
            self.method,
        ];
        names.extend(self.exception_header);

        names
            .into_iter()
            .filter(|name| !obj.has_field(name))
            .collect()
    }
}

/// `DynamicResolver` layouts, current runtime first.
pub const RESOLVER_LAYOUTS: [ResolverLayout; 2] = [
    ResolverLayout {
        name: "current",
        code: "_code",
        max_stack: "_stackSize",
        scope: "_scope",
        exceptions: "_exceptions",
        exception_header: Some("_exceptionHeader"),
        locals: "_localSignature",
        method: "_method",
    },
    ResolverLayout {
        name: "legacy",
        code: "m_code",
        max_stack: "m_stackSize",
        scope: "m_scope",
        exceptions: "m_exceptions",
        exception_header: Some("m_exceptionHeader"),
        locals: "m_localSignature",
        method: "m_method",
    },
];

/// `DynamicILInfo` layouts, current runtime first.
pub const INCREMENTAL_LAYOUTS: [ResolverLayout; 2] = [
    ResolverLayout {
        name: "current",
        code: "_code",
        max_stack: "_maxStackSize",
        scope: "_scope",
        exceptions: "_exceptions",
        exception_header: None,
        locals: "_localSignature",
        method: "_method",
    },
    ResolverLayout {
        name: "legacy",
        code: "m_code",
        max_stack: "m_maxStackSize",
        scope: "m_scope",
        exceptions: "m_exceptions",
        exception_header: None,
        locals: "m_localSignature",
        method: "m_method",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::host::HostSnapshot;

    #[test]
    fn field_path_prefers_first_candidate() {
        let obj = HostSnapshot::new(class::DYNAMIC_METHOD)
            .with_field("m_name", "old")
            .with_field("_name", "new");

        match DYNAMIC_NAME.read(&obj) {
            Some(HostValue::String(name)) => assert_eq!(name, "new"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn field_path_falls_back() {
        let obj = HostSnapshot::new(class::DYNAMIC_METHOD).with_null("m_resolver");

        assert!(DYNAMIC_RESOLVER.exists(&obj));
        assert!(DYNAMIC_RESOLVER.read(&obj).unwrap().is_null());
        assert!(!DYNAMIC_IL_INFO.exists(&obj));
        assert!(DYNAMIC_IL_INFO.read(&obj).is_none());
    }

    #[test]
    fn resolver_layout_missing_fields() {
        let obj = HostSnapshot::new(class::DYNAMIC_RESOLVER)
            .with_field("m_code", vec![0x2Au8])
            .with_field("m_stackSize", 1)
            .with_null("m_scope")
            .with_null("m_exceptions")
            .with_null("m_exceptionHeader")
            .with_null("m_localSignature");

        let legacy = &RESOLVER_LAYOUTS[1];
        assert_eq!(legacy.missing_fields(&obj), vec!["m_method"]);

        let current = &RESOLVER_LAYOUTS[0];
        assert_eq!(current.missing_fields(&obj).len(), 7);
    }

    #[test]
    fn incremental_layout_has_no_header() {
        for layout in &INCREMENTAL_LAYOUTS {
            assert!(layout.exception_header.is_none());
        }
    }
}
