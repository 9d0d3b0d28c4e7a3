//! Parallel reconstruction of many dynamic methods.
//!
//! Every handle gets its own [`crate::method::ReconstructionSession`]; sessions share nothing but
//! the destination [`Importer`], which is safe for concurrent use. A failure is reported for its
//! own handle only.

use std::fmt;

use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    capture::HostRef,
    config::ReconstructionConfig,
    method::{reconstruct, ReconstructedMethod},
    symbols::Importer,
    Error, Result,
};

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Methods that were rebuilt
    pub restored: usize,
    /// Handles that could not be normalized into a capture
    pub skipped: usize,
    /// Methods delegating to another unmaterialized dynamic method
    pub unsupported: usize,
    /// Methods whose capture was malformed
    pub failed: usize,
}

impl BatchReport {
    /// Tallies a list of reconstruction results
    #[must_use]
    pub fn from_results(results: &[Result<ReconstructedMethod>]) -> Self {
        let mut report = BatchReport::default();
        for result in results {
            match result {
                Ok(_) => report.restored += 1,
                Err(Error::Capture { .. }) => report.skipped += 1,
                Err(Error::UnsupportedNestedCapture(_)) => report.unsupported += 1,
                Err(_) => report.failed += 1,
            }
        }
        report
    }

    /// Total number of handles processed
    #[must_use]
    pub fn total(&self) -> usize {
        self.restored + self.skipped + self.unsupported + self.failed
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restored {} of {} ({} skipped, {} unsupported, {} failed)",
            self.restored,
            self.total(),
            self.skipped,
            self.unsupported,
            self.failed
        )
    }
}

/// Reconstructs every handle in parallel.
///
/// Results are returned in the order of `handles`.
///
/// # Examples
///
/// ```rust
/// use dynscope::batch::reconstruct_all;
/// use dynscope::capture::{HostSnapshot, HostValue, RuntimeMethod};
/// use dynscope::symbols::SymbolSpace;
/// use dynscope::ReconstructionConfig;
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
/// let space = SymbolSpace::new();
/// let (results, report) =
///     reconstruct_all(&[Some(resolver), None], &space, ReconstructionConfig::default());
///
/// assert!(results[0].is_ok());
/// assert_eq!(report.restored, 1);
/// assert_eq!(report.skipped, 1);
/// ```
pub fn reconstruct_all(
    handles: &[Option<HostRef>],
    importer: &dyn Importer,
    config: ReconstructionConfig,
) -> (Vec<Result<ReconstructedMethod>>, BatchReport) {
    let results: Vec<Result<ReconstructedMethod>> = handles
        .par_iter()
        .enumerate()
        .map(|(index, handle)| {
            let result = reconstruct(handle.as_ref(), importer, config);
            if let Err(error) = &result {
                warn!("skipping dynamic method #{} - {}", index, error);
            }
            result
        })
        .collect();

    let report = BatchReport::from_results(&results);
    debug!("batch finished - {}", report);

    (results, report)
}
