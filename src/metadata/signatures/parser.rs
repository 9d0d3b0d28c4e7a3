use crate::{
    config::ReconstructionConfig,
    metadata::{
        signatures::{
            ArrayDimensions, CustomModifier, SignatureArray, SignatureField,
            SignatureLocalVariable, SignatureLocalVariables, SignatureMethod, SignatureParameter,
            SignaturePointer, SignatureSzArray, TypeSignature, CALLING_CONVENTION, ELEMENT_TYPE,
        },
        token::Token,
    },
    stream::parser::Parser,
    Error::RecursionLimit,
    Result,
};

/// Resolves the `TypeDefOrRef` coded tokens embedded in a signature blob.
///
/// Signatures produced for a dynamic method encode every type reference as an index into the
/// method's own symbol table. The resolver is handed to the parser explicitly, so nested
/// signatures decode against exactly the table they were produced for.
pub trait TypeResolver {
    /// Resolves `token` to the type it references.
    ///
    /// # Errors
    /// Returns an error if the token does not reference a type.
    fn resolve_type(&mut self, token: Token) -> Result<TypeSignature>;
}

impl<F> TypeResolver for F
where
    F: FnMut(Token) -> Result<TypeSignature>,
{
    fn resolve_type(&mut self, token: Token) -> Result<TypeSignature> {
        self(token)
    }
}

/// Signature parser that handles the signature kinds found in dynamic methods
///
/// # Example
///
/// ```rust
/// use dynscope::metadata::signatures::{SignatureParser, TypeSignature};
/// use dynscope::metadata::token::Token;
/// use dynscope::ReconstructionConfig;
///
/// let config = ReconstructionConfig::default();
/// let mut no_types = |token: Token| -> dynscope::Result<TypeSignature> {
///     Err(dynscope::Error::Usage(format!("unexpected type token {token}")))
/// };
///
/// let data = &[0x00, 0x01, 0x01, 0x0E];
/// let mut parser = SignatureParser::new(data, &mut no_types, &config);
/// let sig = parser.parse_method_signature().unwrap();
/// assert_eq!(sig.params.len(), 1);
/// assert_eq!(sig.params[0].base, TypeSignature::String);
/// ```
///
/// ## Notes:
/// - Besides ECMA-335, it's also worth looking at <https://github.com/dotnet/runtime/blob/main/docs/design/coreclr/profiling/davbr-blog-archive/samples/sigparse.cpp>
/// - Do not re-use a parser instance for multiple signatures.
pub struct SignatureParser<'a, 'r> {
    parser: Parser<'a>,
    resolver: &'r mut dyn TypeResolver,
    depth: usize,
    max_depth: usize,
    pointer_size: usize,
}

impl<'a, 'r> SignatureParser<'a, 'r> {
    /// Create a new `SignatureParser` from a byte slice
    ///
    /// ## Arguments
    /// * 'data'     - The byte slice to read from
    /// * 'resolver' - Resolves embedded type tokens
    /// * 'config'   - Supplies the nesting limit and the runtime pointer size
    #[must_use]
    pub fn new(
        data: &'a [u8],
        resolver: &'r mut dyn TypeResolver,
        config: &ReconstructionConfig,
    ) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            resolver,
            depth: 0,
            max_depth: config.max_signature_depth,
            pointer_size: config.pointer_size,
        }
    }

    /// Parse a single type from the signature blob
    fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(RecursionLimit(self.max_depth));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::PTR => Ok(TypeSignature::Ptr(SignaturePointer {
                modifiers: self.parse_custom_mods()?,
                base: Box::new(self.parse_type()?),
            })),
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE | ELEMENT_TYPE::CLASS => {
                let token = self.parser.read_compressed_token()?;
                self.resolver.resolve_type(token)
            }
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let elem_type = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                let mut dimensions: Vec<ArrayDimensions> =
                    Vec::with_capacity((num_sizes as usize).min(self.parser.remaining()));
                for _ in 0..num_sizes {
                    dimensions.push(ArrayDimensions {
                        size: Some(self.parser.read_compressed_uint()?),
                        lower_bound: None,
                    });
                }

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                for i in 0..num_lo_bounds as usize {
                    let lower_bound = Some(self.parser.read_compressed_int()?);
                    match dimensions.get_mut(i) {
                        Some(dimension) => dimension.lower_bound = lower_bound,
                        None => dimensions.push(ArrayDimensions {
                            size: None,
                            lower_bound,
                        }),
                    }
                }

                Ok(TypeSignature::Array(SignatureArray {
                    base: Box::new(elem_type),
                    rank,
                    dimensions,
                }))
            }
            ELEMENT_TYPE::GENERICINST => {
                let peek_byte = self.parser.peek_byte()?;
                if peek_byte != ELEMENT_TYPE::CLASS && peek_byte != ELEMENT_TYPE::VALUETYPE {
                    return Err(decode_error!(
                        "GENERICINST - Next byte is not TYPE_CLASS or TYPE_VALUE - {}",
                        peek_byte
                    ));
                }

                let base_type = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;

                let mut type_args = Vec::with_capacity(arg_count.min(16) as usize);
                for _ in 0..arg_count {
                    type_args.push(self.parse_type()?);
                }

                Ok(TypeSignature::GenericInst(Box::new(base_type), type_args))
            }
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::FNPTR => Ok(TypeSignature::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::SZARRAY => Ok(TypeSignature::SzArray(SignatureSzArray {
                modifiers: self.parse_custom_mods()?,
                base: Box::new(self.parse_type()?),
            })),
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::CMOD_REQD | ELEMENT_TYPE::CMOD_OPT => {
                let mut modifiers = vec![self.parse_custom_mod(current_byte)?];
                modifiers.extend(self.parse_custom_mods()?);

                Ok(TypeSignature::Modified(
                    modifiers,
                    Box::new(self.parse_type()?),
                ))
            }
            ELEMENT_TYPE::INTERNAL => {
                let address = if self.pointer_size == 4 {
                    u64::from(self.parser.read_le::<u32>()?)
                } else {
                    self.parser.read_le::<u64>()?
                };
                Ok(TypeSignature::Internal(address))
            }
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            _ => Err(decode_error!(
                "Unsupported ELEMENT_TYPE - 0x{:02X}",
                current_byte
            )),
        }
    }

    /// Parse the token following a `CMOD_OPT` or `CMOD_REQD` byte that was already consumed
    fn parse_custom_mod(&mut self, kind: u8) -> Result<CustomModifier> {
        let token = self.parser.read_compressed_token()?;
        Ok(CustomModifier {
            required: kind == ELEMENT_TYPE::CMOD_REQD,
            modifier: self.resolver.resolve_type(token)?,
        })
    }

    /// Parse custom modifiers (`CMOD_OPT` or `CMOD_REQD`)
    fn parse_custom_mods(&mut self) -> Result<Vec<CustomModifier>> {
        let mut mods = Vec::new();

        while self.parser.has_more_data() {
            let next_byte = self.parser.peek_byte()?;
            if next_byte != ELEMENT_TYPE::CMOD_OPT && next_byte != ELEMENT_TYPE::CMOD_REQD {
                break;
            }

            self.parser.advance()?;
            mods.push(self.parse_custom_mod(next_byte)?);
        }

        Ok(mods)
    }

    /// Parse a parameter including custom modifiers (`return_type` counts as parameter)
    fn parse_param(&mut self) -> Result<SignatureParameter> {
        let custom_mods = self.parse_custom_mods()?;

        let mut by_ref = false;
        if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
            self.parser.advance()?;
            by_ref = true;
        }

        Ok(SignatureParameter {
            modifiers: custom_mods,
            by_ref,
            base: self.parse_type()?,
        })
    }

    /// Parse a method signature from the blob - `MethodRefSig`, `StandAloneMethodSig`
    ///
    /// Parameters following a `SENTINEL` are collected into `varargs`.
    ///
    /// # Errors
    /// Returns an error if the signature data is malformed or if reading beyond the buffer bounds.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let convention_byte = self.parser.read_le::<u8>()?;
        let kind = convention_byte & CALLING_CONVENTION::KIND_MASK;
        if kind > CALLING_CONVENTION::VARARG {
            return Err(decode_error!(
                "SignatureMethod - invalid calling convention - 0x{:02X}",
                convention_byte
            ));
        }

        let mut method = SignatureMethod {
            has_this: convention_byte & CALLING_CONVENTION::HASTHIS != 0,
            explicit_this: convention_byte & CALLING_CONVENTION::EXPLICITTHIS != 0,
            default: kind == CALLING_CONVENTION::DEFAULT,
            vararg: kind == CALLING_CONVENTION::VARARG,
            cdecl: kind == CALLING_CONVENTION::C,
            stdcall: kind == CALLING_CONVENTION::STDCALL,
            thiscall: kind == CALLING_CONVENTION::THISCALL,
            fastcall: kind == CALLING_CONVENTION::FASTCALL,
            param_count_generic: if convention_byte & CALLING_CONVENTION::GENERIC != 0 {
                self.parser.read_compressed_uint()?
            } else {
                0
            },
            param_count: self.parser.read_compressed_uint()?,
            return_type: self.parse_param()?,
            params: Vec::new(),
            varargs: Vec::new(),
        };

        let mut after_sentinel = false;
        for _ in 0..method.param_count {
            if !after_sentinel && self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                self.parser.advance()?;
                after_sentinel = true;
            }

            let param = self.parse_param()?;
            if after_sentinel {
                method.varargs.push(param);
            } else {
                method.params.push(param);
            }
        }

        Ok(method)
    }

    /// Parse a field signature from the blob (II.23.2.4)
    ///
    /// # Errors
    /// Returns an error if the signature header is invalid or if the field type cannot be parsed.
    pub fn parse_field_signature(&mut self) -> Result<SignatureField> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != CALLING_CONVENTION::FIELD {
            return Err(decode_error!(
                "SignatureField - invalid start - {}",
                head_byte
            ));
        }

        let custom_mods = self.parse_custom_mods()?;
        let type_sig = self.parse_type()?;

        Ok(SignatureField {
            modifiers: custom_mods,
            base: type_sig,
        })
    }

    /// Parse a local variable signature from the blob (II.23.2.6)
    ///
    /// Bytes following the last declared local are ignored.
    ///
    /// # Errors
    /// Returns an error if the local variable signature header is invalid or if variable types cannot be parsed.
    pub fn parse_local_var_signature(&mut self) -> Result<SignatureLocalVariables> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != CALLING_CONVENTION::LOCAL_SIG {
            return Err(decode_error!(
                "SignatureLocalVar - invalid start - {}",
                head_byte
            ));
        }

        let count = self.parser.read_compressed_uint()?;

        let mut locals = Vec::with_capacity((count as usize).min(self.parser.remaining()));
        for _ in 0..count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::TYPEDBYREF {
                locals.push(SignatureLocalVariable {
                    modifiers: Vec::new(),
                    is_byref: false,
                    is_pinned: false,
                    base: TypeSignature::TypedByRef,
                });
                self.parser.advance()?;

                continue;
            }

            // Modifiers and the PINNED constraint may interleave (II.23.2.9)
            let mut custom_mods = Vec::new();
            let mut pinned = false;

            while self.parser.has_more_data() {
                match self.parser.peek_byte()? {
                    kind @ (ELEMENT_TYPE::CMOD_OPT | ELEMENT_TYPE::CMOD_REQD) => {
                        self.parser.advance()?;
                        custom_mods.push(self.parse_custom_mod(kind)?);
                    }
                    ELEMENT_TYPE::PINNED => {
                        self.parser.advance()?;
                        pinned = true;
                    }
                    _ => break,
                }
            }

            let by_ref = if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
                self.parser.advance()?;
                true
            } else {
                false
            };

            let type_sig = self.parse_type()?;

            locals.push(SignatureLocalVariable {
                modifiers: custom_mods,
                is_byref: by_ref,
                is_pinned: pinned,
                base: type_sig,
            });
        }

        Ok(SignatureLocalVariables { locals })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{symbols::ImportedType, Error};

    fn named(token: Token) -> Result<TypeSignature> {
        Ok(TypeSignature::Class(Arc::new(ImportedType {
            token: Token::from_parts(Token::TYPE_REF, token.row()),
            namespace: "Demo".to_string(),
            name: format!("T{}", token.row()),
            assembly: None,
            is_value_type: false,
        })))
    }

    fn class_name(sig: &TypeSignature) -> String {
        match sig {
            TypeSignature::Class(ty) => ty.name.clone(),
            other => panic!("expected class, got {other:?}"),
        }
    }

    fn parse_type_of(bytes: &[u8]) -> Result<TypeSignature> {
        let config = ReconstructionConfig::default();
        let mut resolver = named;
        let mut parser = SignatureParser::new(bytes, &mut resolver, &config);
        parser.parse_type()
    }

    #[test]
    fn test_parse_primitive_types() {
        let test_cases = [
            (vec![0x01], TypeSignature::Void),
            (vec![0x02], TypeSignature::Boolean),
            (vec![0x03], TypeSignature::Char),
            (vec![0x04], TypeSignature::I1),
            (vec![0x05], TypeSignature::U1),
            (vec![0x06], TypeSignature::I2),
            (vec![0x07], TypeSignature::U2),
            (vec![0x08], TypeSignature::I4),
            (vec![0x09], TypeSignature::U4),
            (vec![0x0A], TypeSignature::I8),
            (vec![0x0B], TypeSignature::U8),
            (vec![0x0C], TypeSignature::R4),
            (vec![0x0D], TypeSignature::R8),
            (vec![0x0E], TypeSignature::String),
            (vec![0x1C], TypeSignature::Object),
            (vec![0x18], TypeSignature::I),
            (vec![0x19], TypeSignature::U),
        ];

        for (bytes, expected_type) in test_cases {
            assert_eq!(parse_type_of(&bytes).unwrap(), expected_type);
        }
    }

    #[test]
    fn test_class_tokens_go_through_resolver() {
        // TypeDef coded index, row 3
        let result = parse_type_of(&[0x12, 0x0C]).unwrap();
        assert_eq!(class_name(&result), "T3");

        // TypeRef coded index, row 13
        let result = parse_type_of(&[0x11, 0x35]).unwrap();
        assert_eq!(class_name(&result), "T13");

        let config = ReconstructionConfig::default();
        let mut failing =
            |_: Token| -> Result<TypeSignature> { Err(decode_error!("not a type slot")) };
        let mut parser = SignatureParser::new(&[0x12, 0x0C], &mut failing, &config);
        assert!(parser.parse_type().unwrap_err().is_decode_error());
    }

    #[test]
    fn test_parse_arrays() {
        let result = parse_type_of(&[0x1D, 0x08]).unwrap();
        if let TypeSignature::SzArray(inner) = result {
            assert_eq!(*inner.base, TypeSignature::I4);
        } else {
            panic!("expected szarray");
        }

        // int[2, -1...] : rank 2, one size, two lower bounds (0, -1)
        let result = parse_type_of(&[
            0x14, // ARRAY
            0x08, // I4 (element type)
            0x02, // rank 2
            0x01, // num_sizes 1
            0x02, // size 2
            0x02, // num_lo_bounds 2
            0x00, // 0
            0x7F, // -1
        ])
        .unwrap();

        if let TypeSignature::Array(array) = result {
            assert_eq!(*array.base, TypeSignature::I4);
            assert_eq!(array.rank, 2);
            assert_eq!(array.dimensions.len(), 2);
            assert_eq!(array.dimensions[0].size, Some(2));
            assert_eq!(array.dimensions[0].lower_bound, Some(0));
            assert_eq!(array.dimensions[1].size, None);
            assert_eq!(array.dimensions[1].lower_bound, Some(-1));
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn test_parse_generic_instance() {
        let result = parse_type_of(&[
            0x15, // GENERICINST
            0x12, 0x08, // Class, row 2
            0x02, // 2 type args
            0x0E, // String
            0x1E, 0x00, // !!0
        ])
        .unwrap();

        if let TypeSignature::GenericInst(class, args) = result {
            assert_eq!(class_name(&class), "T2");
            assert_eq!(args, vec![TypeSignature::String, TypeSignature::GenericParamMethod(0)]);
        } else {
            panic!("expected generic instance");
        }

        assert!(parse_type_of(&[0x15, 0x08, 0x01, 0x08]).is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        // modreq(T1) modopt(T2) int32
        let result = parse_type_of(&[0x1F, 0x04, 0x20, 0x08, 0x08]).unwrap();
        match result {
            TypeSignature::Modified(mods, base) => {
                assert_eq!(*base, TypeSignature::I4);
                assert_eq!(mods.len(), 2);
                assert!(mods[0].required);
                assert_eq!(class_name(&mods[0].modifier), "T1");
                assert!(!mods[1].required);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_internal_type_uses_pointer_size() {
        let bytes = [0x21, 0x78, 0x56, 0x34, 0x12, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            parse_type_of(&bytes).unwrap(),
            TypeSignature::Internal(0x1234_5678)
        );

        let config = ReconstructionConfig::x86();
        let mut resolver = named;
        let mut parser = SignatureParser::new(&bytes[..5], &mut resolver, &config);
        assert_eq!(
            parser.parse_type().unwrap(),
            TypeSignature::Internal(0x1234_5678)
        );

        assert!(matches!(
            parse_type_of(&bytes[..5]),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn test_recursion_limit() {
        let config = ReconstructionConfig {
            max_signature_depth: 4,
            ..ReconstructionConfig::default()
        };
        let mut resolver = named;

        // ref ref ref int32 is exactly four levels deep
        let mut parser = SignatureParser::new(&[0x10, 0x10, 0x10, 0x08], &mut resolver, &config);
        assert!(parser.parse_type().is_ok());

        let mut parser =
            SignatureParser::new(&[0x10, 0x10, 0x10, 0x10, 0x08], &mut resolver, &config);
        assert!(matches!(parser.parse_type(), Err(Error::RecursionLimit(4))));

        // Siblings do not accumulate depth
        let mut parser = SignatureParser::new(
            &[0x00, 0x04, 0x01, 0x10, 0x08, 0x10, 0x08, 0x10, 0x08, 0x10, 0x08],
            &mut resolver,
            &config,
        );
        assert_eq!(parser.parse_method_signature().unwrap().params.len(), 4);
    }

    #[test]
    fn test_method_signature() {
        let config = ReconstructionConfig::default();
        let mut resolver = named;

        // instance generic<1> T1 (ref !!0, int32[])
        let mut parser = SignatureParser::new(
            &[0x30, 0x01, 0x02, 0x12, 0x04, 0x10, 0x1E, 0x00, 0x1D, 0x08],
            &mut resolver,
            &config,
        );
        let result = parser.parse_method_signature().unwrap();
        assert!(result.has_this);
        assert!(result.default);
        assert_eq!(result.param_count_generic, 1);
        assert_eq!(class_name(&result.return_type.base), "T1");
        assert!(result.params[0].by_ref);
        assert_eq!(result.params[0].base, TypeSignature::GenericParamMethod(0));
        assert!(matches!(result.params[1].base, TypeSignature::SzArray(_)));

        // vararg void (int32, ..., string)
        let mut parser = SignatureParser::new(
            &[0x05, 0x02, 0x01, 0x08, 0x41, 0x0E],
            &mut resolver,
            &config,
        );
        let result = parser.parse_method_signature().unwrap();
        assert!(result.vararg);
        assert!(!result.cdecl);
        assert_eq!(result.params.len(), 1);
        assert_eq!(result.varargs.len(), 1);
        assert_eq!(result.varargs[0].base, TypeSignature::String);
    }

    #[test]
    fn test_local_var_signature() {
        let config = ReconstructionConfig::default();
        let mut resolver = named;

        // int32, pinned ref uint8, typedref, trailing byte
        let mut parser = SignatureParser::new(
            &[0x07, 0x03, 0x08, 0x45, 0x10, 0x05, 0x16, 0xFF],
            &mut resolver,
            &config,
        );
        let locals = parser.parse_local_var_signature().unwrap().locals;
        assert_eq!(locals.len(), 3);
        assert_eq!(locals[0].base, TypeSignature::I4);
        assert!(locals[1].is_pinned);
        assert!(locals[1].is_byref);
        assert_eq!(locals[1].base, TypeSignature::U1);
        assert_eq!(locals[2].base, TypeSignature::TypedByRef);

        // Truncated: two locals declared, one present
        let mut parser = SignatureParser::new(&[0x07, 0x02, 0x08], &mut resolver, &config);
        assert!(matches!(
            parser.parse_local_var_signature(),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn test_array_counts_larger_than_blob() {
        let config = ReconstructionConfig::default();
        let mut resolver = named;

        // One local: int32[] with rank and size count both 0x1FFFFFFF, no sizes present
        let mut parser = SignatureParser::new(
            &[
                0x07, 0x01, 0x14, 0x08, 0xDF, 0xFF, 0xFF, 0xFF, 0xDF, 0xFF, 0xFF, 0xFF,
            ],
            &mut resolver,
            &config,
        );
        assert!(matches!(
            parser.parse_local_var_signature(),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn test_error_handling() {
        let config = ReconstructionConfig::default();
        let mut resolver = named;

        let mut parser = SignatureParser::new(&[0xFF, 0x01], &mut resolver, &config);
        assert!(parser.parse_method_signature().unwrap_err().is_decode_error());

        let mut parser = SignatureParser::new(&[0x07, 0x08], &mut resolver, &config);
        assert!(parser.parse_field_signature().is_err());

        let mut parser = SignatureParser::new(&[0x06, 0x0E], &mut resolver, &config);
        assert_eq!(
            parser.parse_field_signature().unwrap().base,
            TypeSignature::String
        );

        assert!(parse_type_of(&[0x17]).unwrap_err().is_decode_error());
    }
}
