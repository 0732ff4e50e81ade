use crate::program::LineNumber;

/// Every failure the interpreter can produce.
///
/// The display strings are the messages printed to the user. Several variants
/// share `SYNTAX ERROR` on screen but keep their detail for logging.
#[derive(Debug, thiserror::Error)]
pub enum BasicError {
    /// Malformed command text, wrong line context or a reserved word used as a variable.
    #[error("SYNTAX ERROR")]
    Syntax(String),
    /// The keyword is not registered.
    #[error("SYNTAX ERROR")]
    UnknownCommand(String),
    /// The expression text could not be tokenized or parsed.
    #[error("SYNTAX ERROR")]
    ExpressionSyntax(String),
    #[error("VARIABLE NOT DEFINED")]
    UndefinedVariable(String),
    #[error("DIVIDE BY ZERO")]
    DivisionByZero,
    #[error("INTEGER OVERFLOW")]
    Overflow,
    /// A jump to a line that is not stored, or the running line disappeared.
    #[error("LINE NUMBER ERROR")]
    LineReference(LineNumber),
    #[error("keyword {0} is already registered")]
    DuplicateKeyword(String),
    #[error("invalid statement pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BasicError {
    pub(crate) fn syntax(detail: impl Into<String>) -> Self {
        BasicError::Syntax(detail.into())
    }

    /// Whether the command loop should report the error and carry on.
    ///
    /// Console I/O failures and registry misconfiguration are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            BasicError::Io(_) | BasicError::DuplicateKeyword(_) | BasicError::InvalidPattern(_)
        )
    }
}

/// Result alias used across the interpreter.
pub type ExecResult<T> = Result<T, BasicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_classic_basic() {
        assert_eq!(BasicError::syntax("bad").to_string(), "SYNTAX ERROR");
        assert_eq!(
            BasicError::UnknownCommand("FOO".into()).to_string(),
            "SYNTAX ERROR"
        );
        assert_eq!(BasicError::LineReference(999).to_string(), "LINE NUMBER ERROR");
        assert_eq!(
            BasicError::UndefinedVariable("X".into()).to_string(),
            "VARIABLE NOT DEFINED"
        );
    }

    #[test]
    fn test_io_errors_are_fatal() {
        let err = BasicError::from(std::io::Error::other("closed"));
        assert!(!err.is_recoverable());
        assert!(BasicError::LineReference(10).is_recoverable());
        assert!(BasicError::DivisionByZero.is_recoverable());
    }
}
