// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error taxonomy for the platform services layer.
//!
//! Library code never panics on ordinary failure: every fallible operation
//! returns a [`PlatformError`], and the dispatcher additionally mirrors the
//! most recent failure into a [`LastError`] code/text pair for diagnostics.

use thiserror::Error;

/// A specialized `Result` type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Stable error codes mirrored into the last-error diagnostics pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    /// No error recorded.
    #[default]
    None,
    /// The active backend does not implement the operation.
    Unsupported,
    /// A file, directory, window, or handle could not be found.
    NotFound,
    /// A caller-supplied argument was rejected.
    InvalidArgument,
    /// A fixed-capacity table rejected a new entry.
    Exhausted,
    /// The execution guard denied a blocking operation on a no-block thread.
    Blocked,
    /// The backend reported a failure of its own.
    BackendFailure,
    /// An underlying I/O operation failed.
    Io,
}

/// An error produced by a platform operation.
///
/// Variants map one-to-one onto [`ErrorCode`] so the dispatcher can record
/// the code/text pair without losing information.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    /// The active backend does not implement the requested operation.
    #[error("operation not supported by the active backend")]
    Unsupported,
    /// The named file, directory, window, or handle does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A fixed-capacity table rejected a new entry.
    #[error("capacity exhausted: {0}")]
    Exhausted(&'static str),
    /// The execution guard denied blocking I/O on a no-block thread.
    #[error("blocking I/O denied on a no-block thread")]
    Blocked,
    /// The backend reported a failure of its own.
    #[error("backend failure: {0}")]
    Backend(String),
    /// An underlying I/O operation failed.
    #[error("i/o error: {0}")]
    Io(String),
}

impl PlatformError {
    /// Returns the stable [`ErrorCode`] for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PlatformError::Unsupported => ErrorCode::Unsupported,
            PlatformError::NotFound(_) => ErrorCode::NotFound,
            PlatformError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            PlatformError::Exhausted(_) => ErrorCode::Exhausted,
            PlatformError::Blocked => ErrorCode::Blocked,
            PlatformError::Backend(_) => ErrorCode::BackendFailure,
            PlatformError::Io(_) => ErrorCode::Io,
        }
    }
}

/// The most recent failure observed by the dispatcher, kept for diagnostics.
///
/// The pair is overwritten on every failing dispatcher call and cleared
/// explicitly; it never influences control flow.
#[derive(Debug, Clone, Default)]
pub struct LastError {
    code: ErrorCode,
    text: String,
}

impl LastError {
    /// Records a new error, replacing any previous one.
    pub fn record(&mut self, error: &PlatformError) {
        self.code = error.code();
        self.text = error.to_string();
    }

    /// Clears the stored error back to [`ErrorCode::None`].
    pub fn clear(&mut self) {
        self.code = ErrorCode::None;
        self.text.clear();
    }

    /// Returns the stored error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the stored error text, empty when no error is recorded.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip() {
        assert_eq!(PlatformError::Unsupported.code(), ErrorCode::Unsupported);
        assert_eq!(
            PlatformError::NotFound("a.txt".into()).code(),
            ErrorCode::NotFound
        );
        assert_eq!(PlatformError::Blocked.code(), ErrorCode::Blocked);
        assert_eq!(
            PlatformError::Exhausted("file handles").code(),
            ErrorCode::Exhausted
        );
    }

    #[test]
    fn last_error_records_and_clears() {
        let mut last = LastError::default();
        assert_eq!(last.code(), ErrorCode::None);

        last.record(&PlatformError::Backend("display lost".into()));
        assert_eq!(last.code(), ErrorCode::BackendFailure);
        assert!(last.text().contains("display lost"));

        last.clear();
        assert_eq!(last.code(), ErrorCode::None);
        assert!(last.text().is_empty());
    }
}
