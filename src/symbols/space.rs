//! Destination symbol space that resolved references are imported into.
//!
//! The [`Importer`] trait is the seam between the reconstruction engine and whatever container
//! eventually receives the rebuilt method bodies. [`SymbolSpace`] is the provided implementation:
//! it interns every imported reference, assigns destination tokens and keeps an append-only log
//! of what was imported, all without locking out concurrent sessions.
//!
//! # Thread Safety
//!
//! All internal collections are concurrent (`DashMap` indices, `boxcar` log, atomic row
//! counters), so one `SymbolSpace` can be shared by every session of a parallel batch. The same
//! runtime handle always imports to the same reference, whichever session imports it first.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use dashmap::DashMap;
use log::trace;

use crate::{
    capture::{NamedType, RuntimeField, RuntimeMethod, RuntimeType},
    metadata::{
        signatures::{
            SignatureArray, SignatureMethod, SignatureParameter, SignaturePointer,
            SignatureSzArray, TypeSignature,
        },
        token::Token,
    },
    symbols::refs::{
        FieldRef, ImportedField, ImportedMethod, ImportedSymbol, ImportedType, MethodRef,
    },
    Result,
};

/// Imports runtime handles into a destination symbol space.
pub trait Importer: Send + Sync {
    /// Imports a runtime type, returning its destination signature.
    ///
    /// # Errors
    /// Returns an error if the destination cannot represent the type.
    fn import_type(&self, ty: &RuntimeType) -> Result<TypeSignature>;

    /// Imports a runtime method.
    ///
    /// `context` is the instantiated declaring type the method was bound on, and replaces the
    /// method's own declaring type when present.
    ///
    /// # Errors
    /// Returns an error if the destination cannot represent the method.
    fn import_method(
        &self,
        method: &RuntimeMethod,
        context: Option<&RuntimeType>,
    ) -> Result<MethodRef>;

    /// Imports a runtime field.
    ///
    /// `context` is the instantiated declaring type the field was bound on, and replaces the
    /// field's own declaring type when present.
    ///
    /// # Errors
    /// Returns an error if the destination cannot represent the field.
    fn import_field(&self, field: &RuntimeField, context: Option<&RuntimeType>)
        -> Result<FieldRef>;
}

/// Builds a default calling convention method signature from runtime parameter types.
///
/// ## Arguments
/// * 'importer'    - Destination the parameter types are imported into
/// * 'params'      - Parameter types, without `this`
/// * 'return_type' - Return type, `None` for `void`
/// * 'has_this'    - `true` for instance methods
///
/// # Errors
/// Returns an error if any of the types cannot be imported.
pub fn import_method_signature(
    importer: &dyn Importer,
    params: &[RuntimeType],
    return_type: Option<&RuntimeType>,
    has_this: bool,
) -> Result<SignatureMethod> {
    let return_type = match return_type {
        Some(ty) => importer.import_type(ty)?,
        None => TypeSignature::Void,
    };

    let params = params
        .iter()
        .map(|param| importer.import_type(param).map(SignatureParameter::of))
        .collect::<Result<Vec<_>>>()?;

    Ok(SignatureMethod {
        has_this,
        default: true,
        param_count: u32::try_from(params.len())
            .map_err(|_| decode_error!("Too many parameters - {}", params.len()))?,
        return_type: SignatureParameter::of(return_type),
        params,
        ..SignatureMethod::default()
    })
}

/// Maps the `System` types that have their own element type to it.
fn well_known(named: &NamedType) -> Option<TypeSignature> {
    if named.namespace != "System" || !named.generic_args.is_empty() {
        return None;
    }

    let primitive = match named.name.as_str() {
        "Void" => TypeSignature::Void,
        "Boolean" => TypeSignature::Boolean,
        "Char" => TypeSignature::Char,
        "SByte" => TypeSignature::I1,
        "Byte" => TypeSignature::U1,
        "Int16" => TypeSignature::I2,
        "UInt16" => TypeSignature::U2,
        "Int32" => TypeSignature::I4,
        "UInt32" => TypeSignature::U4,
        "Int64" => TypeSignature::I8,
        "UInt64" => TypeSignature::U8,
        "Single" => TypeSignature::R4,
        "Double" => TypeSignature::R8,
        "String" => TypeSignature::String,
        "Object" => TypeSignature::Object,
        "IntPtr" => TypeSignature::I,
        "UIntPtr" => TypeSignature::U,
        "TypedReference" => TypeSignature::TypedByRef,
        _ => return None,
    };

    Some(primitive)
}

/// Thread-safe, interning implementation of [`Importer`].
///
/// # Examples
///
/// ```rust
/// use dynscope::capture::RuntimeType;
/// use dynscope::metadata::signatures::TypeSignature;
/// use dynscope::symbols::{Importer, SymbolSpace};
///
/// let space = SymbolSpace::new();
///
/// let int32 = space.import_type(&RuntimeType::value_type("System", "Int32"))?;
/// assert_eq!(int32, TypeSignature::I4);
///
/// let first = space.import_type(&RuntimeType::class("Demo", "Widget"))?;
/// let second = space.import_type(&RuntimeType::class("Demo", "Widget"))?;
/// assert_eq!(first, second);
/// assert_eq!(space.len(), 1);
/// # Ok::<(), dynscope::Error>(())
/// ```
pub struct SymbolSpace {
    types: DashMap<(String, Option<String>), Arc<ImportedType>>,
    methods: DashMap<(RuntimeMethod, Option<RuntimeType>), MethodRef>,
    fields: DashMap<(RuntimeField, Option<RuntimeType>), FieldRef>,
    next_type_row: AtomicU32,
    next_member_row: AtomicU32,
    next_spec_row: AtomicU32,
    log: boxcar::Vec<ImportedSymbol>,
}

impl SymbolSpace {
    /// Creates an empty symbol space
    #[must_use]
    pub fn new() -> Self {
        SymbolSpace {
            types: DashMap::new(),
            methods: DashMap::new(),
            fields: DashMap::new(),
            next_type_row: AtomicU32::new(1),
            next_member_row: AtomicU32::new(1),
            next_spec_row: AtomicU32::new(1),
            log: boxcar::Vec::new(),
        }
    }

    /// Number of distinct references imported so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.count()
    }

    /// Returns `true` if nothing was imported yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.count() == 0
    }

    /// Iterates over every imported reference in import order
    pub fn imported(&self) -> impl Iterator<Item = &ImportedSymbol> {
        self.log.iter().map(|(_, symbol)| symbol)
    }

    fn next_token(counter: &AtomicU32, table: u8) -> Token {
        let row = counter.fetch_add(1, Ordering::Relaxed);
        debug_assert!(row < 0x00FF_FFFF, "destination table {table:#04X} is full");
        Token::from_parts(table, row)
    }

    fn intern_type(&self, named: &NamedType) -> Arc<ImportedType> {
        let key = (named.fullname(), named.assembly.clone());
        if let Some(existing) = self.types.get(&key) {
            return existing.clone();
        }

        self.types
            .entry(key)
            .or_insert_with(|| {
                let imported = Arc::new(ImportedType {
                    token: Self::next_token(&self.next_type_row, Token::TYPE_REF),
                    namespace: named.namespace.clone(),
                    name: named.name.clone(),
                    assembly: named.assembly.clone(),
                    is_value_type: named.is_value_type,
                });
                trace!("imported type {} as {}", imported, imported.token);
                self.log.push(ImportedSymbol::Type(imported.clone()));
                imported
            })
            .clone()
    }
}

impl Default for SymbolSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Importer for SymbolSpace {
    fn import_type(&self, ty: &RuntimeType) -> Result<TypeSignature> {
        let signature = match ty {
            RuntimeType::Named(named) => {
                if let Some(primitive) = well_known(named) {
                    return Ok(primitive);
                }

                let imported = self.intern_type(named);
                let base = if named.is_value_type {
                    TypeSignature::ValueType(imported)
                } else {
                    TypeSignature::Class(imported)
                };

                if named.generic_args.is_empty() {
                    base
                } else {
                    let args = named
                        .generic_args
                        .iter()
                        .map(|arg| self.import_type(arg))
                        .collect::<Result<Vec<_>>>()?;
                    TypeSignature::GenericInst(Box::new(base), args)
                }
            }
            RuntimeType::SzArray(element) => TypeSignature::SzArray(SignatureSzArray {
                modifiers: Vec::new(),
                base: Box::new(self.import_type(element)?),
            }),
            RuntimeType::Array(element, rank) => TypeSignature::Array(SignatureArray {
                base: Box::new(self.import_type(element)?),
                rank: *rank,
                dimensions: Vec::new(),
            }),
            RuntimeType::ByRef(element) => TypeSignature::ByRef(Box::new(self.import_type(element)?)),
            RuntimeType::Pointer(element) => TypeSignature::Ptr(SignaturePointer {
                modifiers: Vec::new(),
                base: Box::new(self.import_type(element)?),
            }),
            RuntimeType::GenericParam {
                index,
                method_owned: true,
            } => TypeSignature::GenericParamMethod(*index),
            RuntimeType::GenericParam {
                index,
                method_owned: false,
            } => TypeSignature::GenericParamType(*index),
        };

        Ok(signature)
    }

    fn import_method(
        &self,
        method: &RuntimeMethod,
        context: Option<&RuntimeType>,
    ) -> Result<MethodRef> {
        let key = (method.clone(), context.cloned());
        if let Some(existing) = self.methods.get(&key) {
            return Ok(existing.clone());
        }

        let declaring_type = context
            .or(method.declaring_type.as_ref())
            .map(|ty| self.import_type(ty))
            .transpose()?;
        let signature = import_method_signature(
            self,
            &method.params,
            method.return_type.as_ref(),
            !method.is_static,
        )?;
        let generic_args = method
            .generic_args
            .iter()
            .map(|arg| self.import_type(arg))
            .collect::<Result<Vec<_>>>()?;

        let imported = self
            .methods
            .entry(key)
            .or_insert_with(|| {
                let token = if generic_args.is_empty() {
                    Self::next_token(&self.next_member_row, Token::MEMBER_REF)
                } else {
                    Self::next_token(&self.next_spec_row, Token::METHOD_SPEC)
                };
                let imported = Arc::new(ImportedMethod {
                    token,
                    declaring_type,
                    name: method.name.clone(),
                    signature,
                    generic_args,
                });
                trace!("imported method {} as {}", method, token);
                self.log.push(ImportedSymbol::Method(imported.clone()));
                imported
            })
            .clone();

        Ok(imported)
    }

    fn import_field(
        &self,
        field: &RuntimeField,
        context: Option<&RuntimeType>,
    ) -> Result<FieldRef> {
        let key = (field.clone(), context.cloned());
        if let Some(existing) = self.fields.get(&key) {
            return Ok(existing.clone());
        }

        let declaring_type = self.import_type(context.unwrap_or(&field.declaring_type))?;
        let field_type = self.import_type(&field.field_type)?;

        let imported = self
            .fields
            .entry(key)
            .or_insert_with(|| {
                let token = Self::next_token(&self.next_member_row, Token::MEMBER_REF);
                let imported = Arc::new(ImportedField {
                    token,
                    declaring_type,
                    name: field.name.clone(),
                    field_type,
                });
                trace!("imported field {} as {}", field, token);
                self.log.push(ImportedSymbol::Field(imported.clone()));
                imported
            })
            .clone();

        Ok(imported)
    }
}
