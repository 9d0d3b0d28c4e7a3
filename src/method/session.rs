//! Step-wise reconstruction of one captured dynamic method.

use log::debug;

use crate::{
    capture::{normalize, HostRef, RawMethodCapture},
    config::ReconstructionConfig,
    disassembler::{decode_stream, Instruction},
    metadata::signatures::{parse_local_var_signature, SignatureLocalVariable},
    method::{decode_exception_regions, ExceptionRegion, ReconstructedMethod},
    symbols::{import_method_signature, Importer, SymbolResolver},
    Result,
};

/// Rebuilds one [`RawMethodCapture`] into a [`ReconstructedMethod`].
///
/// A session owns its capture and yields its result exactly once. The decode steps can be run
/// one by one, or all at once through [`ReconstructionSession::decode`]; exception regions need
/// the decoded instructions. Running a step twice, decoding regions first or finalizing before
/// every step has completed are all reported as [`crate::Error::Usage`].
///
/// # Examples
///
/// ```rust
/// use dynscope::capture::RawMethodCapture;
/// use dynscope::method::ReconstructionSession;
/// use dynscope::symbols::SymbolSpace;
/// use dynscope::ReconstructionConfig;
///
/// let capture = RawMethodCapture {
///     name: "Decrypt".into(),
///     code: vec![0x16, 0x2A], // ldc.i4.0; ret
///     max_stack: 1,
///     ..RawMethodCapture::default()
/// };
/// let space = SymbolSpace::new();
///
/// let mut session = ReconstructionSession::new(capture, &space, ReconstructionConfig::default());
/// session.decode()?;
/// let method = session.finalize()?;
///
/// assert_eq!(method.instructions.len(), 2);
/// assert!(session.finalize().is_err());
/// # Ok::<(), dynscope::Error>(())
/// ```
pub struct ReconstructionSession<'a> {
    capture: RawMethodCapture,
    importer: &'a dyn Importer,
    config: ReconstructionConfig,
    instructions: Option<Vec<Instruction>>,
    exception_regions: Option<Vec<ExceptionRegion>>,
    locals: Option<Vec<SignatureLocalVariable>>,
    finalized: bool,
}

impl<'a> ReconstructionSession<'a> {
    /// Creates a session that imports every resolved reference into `importer`
    #[must_use]
    pub fn new(
        capture: RawMethodCapture,
        importer: &'a dyn Importer,
        config: ReconstructionConfig,
    ) -> Self {
        ReconstructionSession {
            capture,
            importer,
            config,
            instructions: None,
            exception_regions: None,
            locals: None,
            finalized: false,
        }
    }

    /// The capture this session rebuilds
    #[must_use]
    pub fn capture(&self) -> &RawMethodCapture {
        &self.capture
    }

    /// Decodes the opcode stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Usage`] if instructions were already decoded, otherwise any
    /// error of [`decode_stream`].
    pub fn decode_instructions(&mut self) -> Result<()> {
        self.ensure_pending(self.instructions.is_some(), "instructions")?;

        let mut resolver = SymbolResolver::new(&self.capture.symbols, self.importer, &self.config);
        self.instructions = Some(decode_stream(&self.capture.code, &mut resolver)?);
        Ok(())
    }

    /// Decodes the exception regions against the decoded instructions.
    ///
    /// # Errors
    /// Returns [`crate::Error::Usage`] if the instructions have not been decoded yet or the
    /// regions already were, otherwise any error of [`decode_exception_regions`].
    pub fn decode_exception_regions(&mut self) -> Result<()> {
        self.ensure_pending(self.exception_regions.is_some(), "exception regions")?;
        let Some(instructions) = self.instructions.as_deref() else {
            return Err(usage_error!(
                "Exception regions of '{}' decoded before its instructions",
                self.capture.name
            ));
        };

        let mut resolver = SymbolResolver::new(&self.capture.symbols, self.importer, &self.config);
        self.exception_regions = Some(decode_exception_regions(
            &self.capture.exceptions,
            instructions,
            &mut resolver,
        )?);
        Ok(())
    }

    /// Decodes the local variable signature.
    ///
    /// # Errors
    /// Returns [`crate::Error::Usage`] if the locals were already decoded, otherwise any error
    /// of [`parse_local_var_signature`].
    pub fn decode_locals(&mut self) -> Result<()> {
        self.ensure_pending(self.locals.is_some(), "locals")?;

        let mut resolver = SymbolResolver::new(&self.capture.symbols, self.importer, &self.config);
        let locals = match self.capture.locals_signature.as_deref() {
            Some(signature) => {
                parse_local_var_signature(signature, &mut resolver, &self.config)?.locals
            }
            None => Vec::new(),
        };
        self.locals = Some(locals);
        Ok(())
    }

    /// Runs every decode step that has not run yet, sharing one symbol resolver between them.
    ///
    /// # Errors
    /// Returns [`crate::Error::Usage`] if the session was already finalized, otherwise the first
    /// error of any decode step.
    pub fn decode(&mut self) -> Result<()> {
        if self.finalized {
            return Err(usage_error!(
                "Session for '{}' was already finalized",
                self.capture.name
            ));
        }

        debug!(
            "decoding '{}' - {} bytes, {} symbols",
            self.capture.name,
            self.capture.code.len(),
            self.capture.symbols.len()
        );

        let mut resolver = SymbolResolver::new(&self.capture.symbols, self.importer, &self.config);

        if self.instructions.is_none() {
            self.instructions = Some(decode_stream(&self.capture.code, &mut resolver)?);
        }

        if self.exception_regions.is_none() {
            if let Some(instructions) = self.instructions.as_deref() {
                self.exception_regions = Some(decode_exception_regions(
                    &self.capture.exceptions,
                    instructions,
                    &mut resolver,
                )?);
            }
        }

        if self.locals.is_none() {
            let locals = match self.capture.locals_signature.as_deref() {
                Some(signature) => {
                    parse_local_var_signature(signature, &mut resolver, &self.config)?.locals
                }
                None => Vec::new(),
            };
            self.locals = Some(locals);
        }

        Ok(())
    }

    /// Moves the reconstructed method out of the session.
    ///
    /// # Errors
    /// Returns [`crate::Error::Usage`] if a decode step is still outstanding or the session was
    /// already finalized, and any error raised while importing the method signature.
    pub fn finalize(&mut self) -> Result<ReconstructedMethod> {
        if self.finalized {
            return Err(usage_error!(
                "Session for '{}' was already finalized",
                self.capture.name
            ));
        }

        if self.instructions.is_none() || self.exception_regions.is_none() || self.locals.is_none()
        {
            return Err(usage_error!(
                "Session for '{}' finalized before every decode step completed",
                self.capture.name
            ));
        }

        let native = &self.capture.native_signature;
        let signature = import_method_signature(
            self.importer,
            &native.params,
            native.return_type.as_ref(),
            false,
        )?;

        self.finalized = true;
        let method = ReconstructedMethod {
            name: std::mem::take(&mut self.capture.name),
            instructions: self.instructions.take().unwrap_or_default(),
            exception_regions: self.exception_regions.take().unwrap_or_default(),
            locals: self.locals.take().unwrap_or_default(),
            max_stack: u16::try_from(self.capture.max_stack).unwrap_or(u16::MAX),
            signature,
        };

        debug!(
            "reconstructed '{}' - {} instructions, {} regions, {} locals",
            method.name,
            method.instructions.len(),
            method.exception_regions.len(),
            method.locals.len()
        );

        Ok(method)
    }

    fn ensure_pending(&self, done: bool, step: &str) -> Result<()> {
        if self.finalized {
            return Err(usage_error!(
                "Session for '{}' was already finalized",
                self.capture.name
            ));
        }

        if done {
            return Err(usage_error!(
                "The {} of '{}' were already decoded",
                step,
                self.capture.name
            ));
        }

        Ok(())
    }
}

/// Normalizes a host handle and rebuilds it in one call.
///
/// # Arguments
/// * `handle` - The dynamic method, delegate or resolver obtained from the host
/// * `importer` - Destination of every resolved reference
/// * `config` - Decoder limits
///
/// # Errors
/// Returns the first error of [`normalize`] or any decode step.
pub fn reconstruct(
    handle: Option<&HostRef>,
    importer: &dyn Importer,
    config: ReconstructionConfig,
) -> Result<ReconstructedMethod> {
    let capture = normalize(handle)?;
    let mut session = ReconstructionSession::new(capture, importer, config);
    session.decode()?;
    session.finalize()
}
