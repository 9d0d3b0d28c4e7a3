//! Assembly of reconstructed dynamic method bodies.
//!
//! A [`ReconstructionSession`] takes ownership of one [`crate::capture::RawMethodCapture`],
//! runs the instruction, exception region and local variable decoders over it and yields a
//! single [`ReconstructedMethod`]. [`reconstruct`] wraps normalization and every step into one
//! call.
//!
//! # Key Components
//!
//! - [`ReconstructionSession`] - Step-wise, single-use reconstruction of one capture
//! - [`ReconstructedMethod`] - The rebuilt body
//! - [`ExceptionRegion`] - Exception clauses mapped onto instruction indices
//! - [`decode_exception_regions`] - Decoding of raw and structured exception data

mod exceptions;
mod session;
mod types;

pub use exceptions::{decode_exception_regions, ExceptionRegion, RegionKind, SectionFlags};
pub use session::{reconstruct, ReconstructionSession};
pub use types::ReconstructedMethod;
