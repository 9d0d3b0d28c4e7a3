//! Resolution of symbol table indices into destination references.

use std::collections::HashMap;

use log::trace;

use crate::{
    capture::{NativeHandle, SlotKind, SymbolSlot},
    config::ReconstructionConfig,
    metadata::{
        signatures::{parse_method_signature, SignatureMethod, TypeResolver, TypeSignature},
        token::Token,
    },
    symbols::{
        refs::{FieldRef, MethodRef},
        space::Importer,
    },
    Error, Result,
};

/// A symbol table entry resolved into the destination symbol space.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSymbol {
    /// A string literal, empty when the slot was absent
    String(String),
    /// A type
    Type(TypeSignature),
    /// A method
    Method(MethodRef),
    /// A field
    Field(FieldRef),
    /// A stand-alone method signature
    Signature(Box<SignatureMethod>),
}

impl ResolvedSymbol {
    /// The kind of reference this is
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        match self {
            ResolvedSymbol::String(_) => SlotKind::String,
            ResolvedSymbol::Type(_) => SlotKind::Type,
            ResolvedSymbol::Method(_) => SlotKind::Method,
            ResolvedSymbol::Field(_) => SlotKind::Field,
            ResolvedSymbol::Signature(_) => SlotKind::Signature,
        }
    }
}

/// Resolves symbol table indices of one capture.
///
/// A resolver borrows the symbol table of exactly one capture and lives for one session.
/// Signature slots are decoded against the same table, with the resolver itself acting as the
/// [`TypeResolver`] for their embedded type tokens.
///
/// # Examples
///
/// ```rust
/// use dynscope::capture::{NativeHandle, SlotKind, SymbolSlot};
/// use dynscope::symbols::{ResolvedSymbol, SymbolResolver, SymbolSpace};
/// use dynscope::ReconstructionConfig;
///
/// let symbols = vec![
///     SymbolSlot::Null,
///     SymbolSlot::Native(NativeHandle::String("hello".into())),
/// ];
/// let space = SymbolSpace::new();
/// let config = ReconstructionConfig::default();
/// let mut resolver = SymbolResolver::new(&symbols, &space, &config);
///
/// let hello = resolver.resolve(1, Some(SlotKind::String))?;
/// assert_eq!(hello, ResolvedSymbol::String("hello".into()));
///
/// // Absent strings resolve to an empty literal, absent types are malformed input
/// assert_eq!(resolver.resolve(9, Some(SlotKind::String))?, ResolvedSymbol::String(String::new()));
/// assert!(resolver.resolve(9, Some(SlotKind::Type)).is_err());
/// # Ok::<(), dynscope::Error>(())
/// ```
pub struct SymbolResolver<'a> {
    symbols: &'a [SymbolSlot],
    importer: &'a dyn Importer,
    config: &'a ReconstructionConfig,
    cache: HashMap<(usize, SlotKind), ResolvedSymbol>,
}

impl<'a> SymbolResolver<'a> {
    /// Creates a resolver over `symbols`, importing into `importer`
    #[must_use]
    pub fn new(
        symbols: &'a [SymbolSlot],
        importer: &'a dyn Importer,
        config: &'a ReconstructionConfig,
    ) -> Self {
        SymbolResolver {
            symbols,
            importer,
            config,
            cache: HashMap::new(),
        }
    }

    /// The destination this resolver imports into
    #[must_use]
    pub fn importer(&self) -> &'a dyn Importer {
        self.importer
    }

    /// Number of slots in the symbol table
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the symbol table has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Resolves the slot at `index`.
    ///
    /// ## Arguments
    /// * 'index'    - Position in the symbol table
    /// * 'expected' - The kind the referencing operand requires, `None` to accept the slot's own
    ///
    /// # Errors
    /// - [`Error::Decode`] if the index is out of range (unless a string is expected), the slot
    ///   is of a different kind or holds an unsupported object
    /// - [`Error::UnsupportedNestedCapture`] if the slot references another dynamic method
    pub fn resolve(&mut self, index: usize, expected: Option<SlotKind>) -> Result<ResolvedSymbol> {
        let symbols = self.symbols;
        let slot = match symbols.get(index) {
            Some(SymbolSlot::Null) | None => {
                return match expected {
                    Some(SlotKind::String) => Ok(ResolvedSymbol::String(String::new())),
                    _ => Err(decode_error!(
                        "Symbol index {} is out of range - {} slots",
                        index,
                        symbols.len()
                    )),
                };
            }
            Some(SymbolSlot::Opaque(class)) => {
                return Err(decode_error!(
                    "Symbol {} holds an unsupported object - {}",
                    index,
                    class
                ));
            }
            Some(slot) => slot,
        };

        let actual = slot
            .kind()
            .ok_or_else(|| decode_error!("Symbol {} has no kind", index))?;
        let kind = expected.unwrap_or(actual);
        if kind != actual {
            return Err(decode_error!(
                "Symbol {} is a {} but a {} is expected",
                index,
                actual,
                kind
            ));
        }

        if self.config.cache_symbols {
            if let Some(hit) = self.cache.get(&(index, kind)) {
                return Ok(hit.clone());
            }
        }

        let resolved = self.resolve_slot(index, slot)?;
        trace!("symbol {} resolved to {:?}", index, resolved);

        if self.config.cache_symbols {
            self.cache.insert((index, kind), resolved.clone());
        }

        Ok(resolved)
    }

    fn resolve_slot(&mut self, index: usize, slot: &'a SymbolSlot) -> Result<ResolvedSymbol> {
        let resolved = match slot {
            SymbolSlot::Native(NativeHandle::String(value)) => ResolvedSymbol::String(value.clone()),
            SymbolSlot::Native(NativeHandle::Type(ty)) => {
                ResolvedSymbol::Type(self.importer.import_type(ty)?)
            }
            SymbolSlot::Native(NativeHandle::Method { method, context }) => {
                ResolvedSymbol::Method(self.importer.import_method(method, context.as_ref())?)
            }
            SymbolSlot::Native(NativeHandle::Field { field, context }) => {
                ResolvedSymbol::Field(self.importer.import_field(field, context.as_ref())?)
            }
            SymbolSlot::Native(NativeHandle::VarArgAdapter {
                method,
                dynamic_target,
            }) => {
                if let Some(target) = dynamic_target {
                    return Err(Error::UnsupportedNestedCapture(target.clone()));
                }

                match method {
                    Some(method) => ResolvedSymbol::Method(self.importer.import_method(method, None)?),
                    None => {
                        return Err(decode_error!(
                            "Var-arg symbol {} has no target method",
                            index
                        ))
                    }
                }
            }
            SymbolSlot::Native(NativeHandle::DynamicMethod(name)) => {
                return Err(Error::UnsupportedNestedCapture(name.clone()));
            }
            SymbolSlot::RawSignatureBytes(bytes) => {
                let config = self.config;
                ResolvedSymbol::Signature(Box::new(parse_method_signature(bytes, self, config)?))
            }
            SymbolSlot::Null | SymbolSlot::Opaque(_) => {
                return Err(decode_error!("Symbol {} cannot be resolved", index));
            }
        };

        Ok(resolved)
    }
}

impl TypeResolver for SymbolResolver<'_> {
    fn resolve_type(&mut self, token: Token) -> Result<TypeSignature> {
        match self.resolve(token.row() as usize, Some(SlotKind::Type))? {
            ResolvedSymbol::Type(ty) => Ok(ty),
            other => Err(decode_error!(
                "Token {} resolved to a {}",
                token,
                other.kind()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::{RuntimeMethod, RuntimeType},
        symbols::SymbolSpace,
    };

    fn slots() -> Vec<SymbolSlot> {
        vec![
            SymbolSlot::Null,
            SymbolSlot::Native(NativeHandle::Type(RuntimeType::class("Demo", "Widget"))),
            SymbolSlot::Native(NativeHandle::Method {
                method: RuntimeMethod::new(Some(RuntimeType::class("System", "Console")), "WriteLine"),
                context: None,
            }),
            // void (Demo.Widget), the class token references slot 1
            SymbolSlot::RawSignatureBytes(vec![0x00, 0x01, 0x01, 0x12, 0x04]),
            SymbolSlot::Native(NativeHandle::VarArgAdapter {
                method: Some(RuntimeMethod::new(None, "printf")),
                dynamic_target: None,
            }),
            SymbolSlot::Native(NativeHandle::DynamicMethod("Stage2".into())),
            SymbolSlot::Opaque("System.Object".into()),
            // void (slot 2), the class token references a method slot
            SymbolSlot::RawSignatureBytes(vec![0x00, 0x01, 0x01, 0x12, 0x08]),
        ]
    }

    #[test]
    fn resolves_each_kind() {
        let symbols = slots();
        let space = SymbolSpace::new();
        let config = ReconstructionConfig::default();
        let mut resolver = SymbolResolver::new(&symbols, &space, &config);

        assert!(matches!(
            resolver.resolve(1, Some(SlotKind::Type)),
            Ok(ResolvedSymbol::Type(TypeSignature::Class(_)))
        ));
        match resolver.resolve(2, Some(SlotKind::Method)).unwrap() {
            ResolvedSymbol::Method(method) => assert_eq!(method.name, "WriteLine"),
            other => panic!("unexpected {other:?}"),
        }
        match resolver.resolve(3, Some(SlotKind::Signature)).unwrap() {
            ResolvedSymbol::Signature(sig) => {
                assert!(matches!(sig.params[0].base, TypeSignature::Class(_)))
            }
            other => panic!("unexpected {other:?}"),
        }
        match resolver.resolve(4, Some(SlotKind::Method)).unwrap() {
            ResolvedSymbol::Method(method) => assert_eq!(method.name, "printf"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ambiguous_token_takes_slot_kind() {
        let symbols = slots();
        let space = SymbolSpace::new();
        let config = ReconstructionConfig::default();
        let mut resolver = SymbolResolver::new(&symbols, &space, &config);

        assert_eq!(resolver.resolve(1, None).unwrap().kind(), SlotKind::Type);
        assert_eq!(resolver.resolve(2, None).unwrap().kind(), SlotKind::Method);
        assert!(resolver.resolve(0, None).is_err());
    }

    #[test]
    fn kind_mismatch_is_a_decode_error() {
        let symbols = slots();
        let space = SymbolSpace::new();
        let config = ReconstructionConfig::default();
        let mut resolver = SymbolResolver::new(&symbols, &space, &config);

        assert!(resolver
            .resolve(1, Some(SlotKind::Field))
            .unwrap_err()
            .is_decode_error());
        assert!(resolver
            .resolve(1, Some(SlotKind::String))
            .unwrap_err()
            .is_decode_error());
        assert!(resolver
            .resolve(7, Some(SlotKind::Signature))
            .unwrap_err()
            .is_decode_error());
        assert!(resolver
            .resolve(6, Some(SlotKind::Type))
            .unwrap_err()
            .is_decode_error());
    }

    #[test]
    fn out_of_range() {
        let symbols = slots();
        let space = SymbolSpace::new();
        let config = ReconstructionConfig::default();
        let mut resolver = SymbolResolver::new(&symbols, &space, &config);

        assert_eq!(
            resolver.resolve(100, Some(SlotKind::String)).unwrap(),
            ResolvedSymbol::String(String::new())
        );
        assert_eq!(
            resolver.resolve(0, Some(SlotKind::String)).unwrap(),
            ResolvedSymbol::String(String::new())
        );
        assert!(resolver.resolve(100, Some(SlotKind::Method)).is_err());
    }

    #[test]
    fn nested_dynamic_methods_are_unsupported() {
        let symbols = vec![
            SymbolSlot::Null,
            SymbolSlot::Native(NativeHandle::VarArgAdapter {
                method: Some(RuntimeMethod::new(None, "printf")),
                dynamic_target: Some("Stage3".into()),
            }),
        ];
        let space = SymbolSpace::new();
        let config = ReconstructionConfig::default();
        let mut resolver = SymbolResolver::new(&symbols, &space, &config);

        assert!(matches!(
            resolver.resolve(1, Some(SlotKind::Method)),
            Err(Error::UnsupportedNestedCapture(name)) if name == "Stage3"
        ));

        let symbols = slots();
        let mut resolver = SymbolResolver::new(&symbols, &space, &config);
        assert!(matches!(
            resolver.resolve(5, Some(SlotKind::Method)),
            Err(Error::UnsupportedNestedCapture(name)) if name == "Stage2"
        ));
    }

    #[test]
    fn cache_returns_identical_references() {
        let symbols = slots();
        let space = SymbolSpace::new();

        for config in [
            ReconstructionConfig::default(),
            ReconstructionConfig::default().without_cache(),
        ] {
            let mut resolver = SymbolResolver::new(&symbols, &space, &config);
            let first = resolver.resolve(2, Some(SlotKind::Method)).unwrap();
            let second = resolver.resolve(2, Some(SlotKind::Method)).unwrap();
            assert_eq!(first, second);
        }

        // Both passes imported into the same space
        assert_eq!(space.len(), 2);
    }
}
