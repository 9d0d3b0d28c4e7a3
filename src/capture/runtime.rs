//! Plain-data descriptions of host reflection objects.
//!
//! Type, method and field handles found in a dynamic method's symbol table are described
//! structurally here so that they can be imported into a destination symbol space without
//! any access to the runtime that produced them.

use std::fmt;

/// A named (non-constructed) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NamedType {
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name; nested types use `Outer+Inner`
    pub name: String,
    /// Simple name of the defining assembly, if known
    pub assembly: Option<String>,
    /// `true` for value types and enums
    pub is_value_type: bool,
    /// Generic arguments for an instantiated generic type, empty otherwise
    pub generic_args: Vec<RuntimeType>,
}

impl NamedType {
    /// `Namespace.Name`, or just `Name` in the global namespace
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A runtime type handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    /// A class, interface, value type or generic instantiation
    Named(NamedType),
    /// Single dimension, zero based array
    SzArray(Box<RuntimeType>),
    /// Multi dimensional array of the given rank
    Array(Box<RuntimeType>, u32),
    /// Managed reference
    ByRef(Box<RuntimeType>),
    /// Unmanaged pointer
    Pointer(Box<RuntimeType>),
    /// Generic parameter of the declaring type (`!n`) or method (`!!n`)
    GenericParam {
        /// Position in the owner's generic parameter list
        index: u32,
        /// `true` if owned by a method
        method_owned: bool,
    },
}

impl RuntimeType {
    /// A reference type `namespace.name`
    #[must_use]
    pub fn class(namespace: &str, name: &str) -> Self {
        RuntimeType::Named(NamedType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..NamedType::default()
        })
    }

    /// A value type `namespace.name`
    #[must_use]
    pub fn value_type(namespace: &str, name: &str) -> Self {
        RuntimeType::Named(NamedType {
            namespace: namespace.to_string(),
            name: name.to_string(),
            is_value_type: true,
            ..NamedType::default()
        })
    }

    /// Sets the defining assembly of a named type; no effect on constructed types
    #[must_use]
    pub fn in_assembly(mut self, assembly: &str) -> Self {
        if let RuntimeType::Named(named) = &mut self {
            named.assembly = Some(assembly.to_string());
        }
        self
    }

    /// Instantiates a named generic type; no effect on constructed types
    #[must_use]
    pub fn with_generic_args(mut self, args: Vec<RuntimeType>) -> Self {
        if let RuntimeType::Named(named) = &mut self {
            named.generic_args = args;
        }
        self
    }

    /// Wraps this type into a single dimension array
    #[must_use]
    pub fn sz_array(self) -> Self {
        RuntimeType::SzArray(Box::new(self))
    }

    /// Wraps this type into a managed reference
    #[must_use]
    pub fn by_ref(self) -> Self {
        RuntimeType::ByRef(Box::new(self))
    }

    /// Returns the named part of this type, if it is not constructed
    #[must_use]
    pub fn as_named(&self) -> Option<&NamedType> {
        match self {
            RuntimeType::Named(named) => Some(named),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Named(named) => {
                write!(f, "{}", named.fullname())?;
                if !named.generic_args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in named.generic_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            RuntimeType::SzArray(elem) => write!(f, "{elem}[]"),
            RuntimeType::Array(elem, rank) => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                write!(f, "{elem}[{commas}]")
            }
            RuntimeType::ByRef(elem) => write!(f, "{elem}&"),
            RuntimeType::Pointer(elem) => write!(f, "{elem}*"),
            RuntimeType::GenericParam {
                index,
                method_owned,
            } => {
                if *method_owned {
                    write!(f, "!!{index}")
                } else {
                    write!(f, "!{index}")
                }
            }
        }
    }
}

/// A runtime method handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RuntimeMethod {
    /// Declaring type, `None` for global (module level) methods
    pub declaring_type: Option<RuntimeType>,
    /// Method name, `.ctor` for constructors
    pub name: String,
    /// Return type, `None` for `void` and constructors
    pub return_type: Option<RuntimeType>,
    /// Parameter types, without the implicit `this`
    pub params: Vec<RuntimeType>,
    /// Generic arguments of an instantiated generic method
    pub generic_args: Vec<RuntimeType>,
    /// `false` for instance methods
    pub is_static: bool,
}

impl RuntimeMethod {
    /// A static method without parameters returning `void`
    #[must_use]
    pub fn new(declaring_type: Option<RuntimeType>, name: &str) -> Self {
        RuntimeMethod {
            declaring_type,
            name: name.to_string(),
            is_static: true,
            ..RuntimeMethod::default()
        }
    }
}

impl fmt::Display for RuntimeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(declaring) = &self.declaring_type {
            write!(f, "{declaring}::")?;
        }
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

/// A runtime field handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeField {
    /// Declaring type
    pub declaring_type: RuntimeType,
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: RuntimeType,
    /// `true` for static fields
    pub is_static: bool,
}

impl fmt::Display for RuntimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}
