//! Exit codes for the census binary.
//!
//! The codes are a stable contract for the deployment wrapper: outcome is
//! parsed from the code, not from output. A run that falls back to the
//! chunked log channel still exits 0 because the document was not lost.

use ct_common::{Error, ErrorCategory};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Census collected and handed off, possibly via the fallback channel.
    Success = 0,

    /// Configuration could not be resolved or validated.
    ConfigError = 2,

    /// A fatal provider failure prevented assembling the census.
    CollectionError = 3,

    /// The delivery pipeline failed before any handoff was possible.
    PipelineError = 4,
}

impl ExitCode {
    /// Convert to the value passed to `std::process::exit`.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an error to the exit code for its failure stage.
    pub fn from_error(error: &Error) -> Self {
        match error.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Collection => ExitCode::CollectionError,
            ErrorCategory::Compression | ErrorCategory::Delivery => ExitCode::PipelineError,
            ErrorCategory::Store | ErrorCategory::Io => ExitCode::PipelineError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::ConfigError.code(), 2);
        assert_eq!(ExitCode::CollectionError.code(), 3);
        assert_eq!(ExitCode::PipelineError.code(), 4);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::from_error(&Error::Config("missing".to_string())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from_error(&Error::PropertyLister("spawn failed".to_string())),
            ExitCode::CollectionError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Compression("stream error".to_string())),
            ExitCode::PipelineError
        );
    }
}
