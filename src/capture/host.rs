//! Read-only view of objects living in the host runtime.
//!
//! The engine never performs reflection itself. The host environment that produced a dynamic
//! method hands its objects over through [`HostObject`], a name-based field lookup capability,
//! and the normalizer reads everything it needs through that single seam.
//!
//! [`HostSnapshot`] is a ready-made implementation backed by a plain field map. It suits hosts
//! that serialize object graphs out of a foreign process, and it is what the test suites use.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::capture::runtime::{RuntimeField, RuntimeMethod, RuntimeType};

/// Shared reference to a host object.
pub type HostRef = Arc<dyn HostObject>;

/// A host runtime object whose fields can be read by name.
///
/// Implementations must distinguish a field that does not exist (`None`) from a field that
/// exists but holds a null reference (`Some(HostValue::Null)`). The normalizer relies on that
/// distinction to tell field layout versions apart.
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Fully qualified runtime class name, e.g. `System.Reflection.Emit.DynamicResolver`.
    fn class_name(&self) -> &str;

    /// Reads the instance field `name`, or `None` if the class has no such field.
    fn field(&self, name: &str) -> Option<HostValue>;

    /// Returns `true` if the class declares the field `name`.
    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// A value read out of a host object field.
#[derive(Debug, Clone)]
pub enum HostValue {
    /// A null reference
    Null,
    /// A boolean
    Bool(bool),
    /// Any integral value, widened
    Int(i64),
    /// A `byte[]`
    Bytes(Vec<u8>),
    /// An `int[]`
    Ints(Vec<i64>),
    /// A `string`
    String(String),
    /// An object array or list
    List(Vec<HostValue>),
    /// A nested reference type instance
    Object(HostRef),
    /// A `RuntimeTypeHandle` or `System.Type`
    Type(RuntimeType),
    /// A `RuntimeMethodHandle` or `MethodBase`
    Method(RuntimeMethod),
    /// A `RuntimeFieldHandle` or `FieldInfo`
    Field(RuntimeField),
}

impl HostValue {
    /// Returns `true` for [`HostValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Returns the nested object, if this is one.
    #[must_use]
    pub fn as_object(&self) -> Option<&HostRef> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the integral value, if this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Short description of the variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Bytes(_) => "byte[]",
            HostValue::Ints(_) => "int[]",
            HostValue::String(_) => "string",
            HostValue::List(_) => "list",
            HostValue::Object(_) => "object",
            HostValue::Type(_) => "type handle",
            HostValue::Method(_) => "method handle",
            HostValue::Field(_) => "field handle",
        }
    }
}

impl From<HostRef> for HostValue {
    fn from(value: HostRef) -> Self {
        HostValue::Object(value)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(value: Vec<u8>) -> Self {
        HostValue::Bytes(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(i64::from(value))
    }
}

impl From<RuntimeType> for HostValue {
    fn from(value: RuntimeType) -> Self {
        HostValue::Type(value)
    }
}

impl From<RuntimeMethod> for HostValue {
    fn from(value: RuntimeMethod) -> Self {
        HostValue::Method(value)
    }
}

impl From<RuntimeField> for HostValue {
    fn from(value: RuntimeField) -> Self {
        HostValue::Field(value)
    }
}

/// A detached copy of a host object: its class name and a map of field values.
///
/// # Examples
///
/// ```rust
/// use dynscope::capture::{HostObject, HostSnapshot, HostValue};
///
/// let resolver = HostSnapshot::new("System.Reflection.Emit.DynamicResolver")
///     .with_field("m_code", vec![0x00u8, 0x2A])
///     .with_field("m_stackSize", 8);
///
/// assert!(resolver.has_field("m_code"));
/// assert!(resolver.field("_code").is_none());
/// assert!(matches!(resolver.field("m_stackSize"), Some(HostValue::Int(8))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HostSnapshot {
    class_name: String,
    fields: HashMap<String, HostValue>,
}

impl HostSnapshot {
    /// Creates an empty snapshot of an instance of `class_name`.
    #[must_use]
    pub fn new(class_name: &str) -> Self {
        HostSnapshot {
            class_name: class_name.to_string(),
            fields: HashMap::new(),
        }
    }

    /// Adds or replaces a field value.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<HostValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Adds a field that exists but holds a null reference.
    #[must_use]
    pub fn with_null(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), HostValue::Null);
        self
    }

    /// Wraps the snapshot into a shared [`HostRef`].
    #[must_use]
    pub fn into_ref(self) -> HostRef {
        Arc::new(self)
    }
}

impl HostObject for HostSnapshot {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn field(&self, name: &str) -> Option<HostValue> {
        self.fields.get(name).cloned()
    }
}

impl From<HostSnapshot> for HostValue {
    fn from(value: HostSnapshot) -> Self {
        HostValue::Object(value.into_ref())
    }
}
