use thiserror::Error;

macro_rules! decode_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Decode {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Decode {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! capture_error {
    ($msg:expr) => {
        crate::Error::Capture {
            reason: $msg.to_string(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Capture {
            reason: format!($fmt, $($arg)*),
        }
    };
}

macro_rules! usage_error {
    ($msg:expr) => {
        crate::Error::Usage($msg.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Usage(format!($fmt, $($arg)*))
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure is terminal for the one capture it was raised for. Callers that process many
/// captures report the error and skip that target; sibling sessions are never affected.
///
/// # Error Categories
///
/// ## Capture Errors
/// - [`Error::Capture`] - The handle shape is unrecognized or a required field is absent
/// - [`Error::UnsupportedNestedCapture`] - The capture delegates to another unmaterialized dynamic method
///
/// ## Decode Errors
/// - [`Error::Decode`] - Malformed opcode stream, misaligned offsets, bad symbol references
/// - [`Error::OutOfBounds`] - A read ran past the end of the input
/// - [`Error::RecursionLimit`] - A signature nests deeper than the configured limit
///
/// ## Programmer Errors
/// - [`Error::Usage`] - Session operations were called out of order
///
/// # Examples
///
/// ```rust
/// use dynscope::Error;
///
/// fn report(err: &Error) -> &'static str {
///     match err {
///         Error::Capture { .. } | Error::UnsupportedNestedCapture(_) => "skipped",
///         Error::Usage(_) => "defect",
///         e if e.is_decode_error() => "corrupt",
///         _ => "unknown",
///     }
/// }
///
/// assert_eq!(report(&Error::OutOfBounds), "corrupt");
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The dynamic method handle could not be normalized into a capture.
    ///
    /// Raised when the handle is absent, its shape is not one of the recognized
    /// dynamic method shapes, or a required field is missing under every known
    /// field layout.
    #[error("Capture - {reason}")]
    Capture {
        /// Human readable description of what was missing or unrecognized
        reason: String,
    },

    /// The capture delegates to another dynamic method that was never materialized.
    ///
    /// Decoding such a method would require running the nested method's own
    /// generator first, which is outside of what a single capture contains.
    #[error("Nested dynamic method is not supported - {0}")]
    UnsupportedNestedCapture(String),

    /// The capture contents are malformed.
    ///
    /// Covers invalid opcodes, length mismatches, misaligned branch or exception
    /// region offsets, out-of-range symbol indices and unknown exception table
    /// encodings. The source location where the problem was detected is recorded.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Decode - {file}:{line}: {message}")]
    Decode {
        /// The message to be printed for the Decode error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading raw capture data.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Signature decoding exceeded the maximum allowed nesting depth.
    ///
    /// The contained value is the limit that was hit.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// A session operation was called out of order.
    ///
    /// This is a programmer error in the orchestration around a
    /// [`crate::method::ReconstructionSession`], never a property of the input data.
    #[error("Usage - {0}")]
    Usage(String),
}

impl Error {
    /// Returns `true` for every error caused by malformed capture contents.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Error::Decode { .. } | Error::OutOfBounds | Error::RecursionLimit(_)
        )
    }

    /// Returns `true` if the target should be skipped rather than treated as corrupt.
    #[must_use]
    pub fn is_capture_error(&self) -> bool {
        matches!(
            self,
            Error::Capture { .. } | Error::UnsupportedNestedCapture(_)
        )
    }
}
