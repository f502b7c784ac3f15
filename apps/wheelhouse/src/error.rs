//! CLI error handling

use std::fmt;

use wheelhouse_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Operations error
    Ops(wheelhouse_errors::Error),
    /// I/O error writing output
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<wheelhouse_errors::Error> for CliError {
    fn from(e: wheelhouse_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelhouse_errors::{ResolveError, TransferError};

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = CliError::from(wheelhouse_errors::Error::from(ResolveError::Ambiguous {
            requirement: "error-pkg".to_string(),
            candidates: vec!["a/one.whl".to_string(), "a/two.whl".to_string()],
        }));
        let rendered = err.to_string();
        assert!(rendered.starts_with("found too many results for error-pkg:\n  a/one.whl\n  a/two.whl"));
        assert!(rendered.contains("Code: resolve.ambiguous"));
    }

    #[test]
    fn test_retryable_errors_say_so() {
        let err = CliError::from(wheelhouse_errors::Error::from(TransferError::CommitMismatch {
            key: "a/b.tar.gz".to_string(),
            expected: 3,
            actual: 2,
        }));
        assert!(err.to_string().contains("Retry: safe to retry"));
    }
}
