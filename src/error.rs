use std::fmt;

/// Errors that can occur while splitting an input line into words
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A single or double quote was opened but never closed
    UnterminatedQuote(char),

    /// The line ended right after an escaping backslash
    TrailingEscape,
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::UnterminatedQuote(quote) => write!(f, "Unterminated quoted string ({})", quote),
            TokenizeError::TrailingEscape => write!(f, "Unterminated backslash-escape"),
        }
    }
}

impl std::error::Error for TokenizeError {}

/// Errors that can occur while dispatching or executing a command
#[derive(Debug)]
pub enum ShellError {
    /// Malformed flag syntax or unbalanced quoting
    Parse(String),

    /// Missing required flag or argument-count/shape violation
    Validation(String),

    /// First token did not resolve in the current scope
    UnknownCommand(String),

    /// Argument to `use` is not a known child scope
    UnknownScope(String),

    /// Command was registered without a run function
    Configuration(String),

    /// Opaque error returned by a command's run function
    Runtime(anyhow::Error),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ShellError::Validation(msg) => write!(f, "Invalid arguments: {}", msg),
            ShellError::UnknownCommand(cmd) => write!(f, "Unknown command: {}", cmd),
            ShellError::UnknownScope(scope) => write!(f, "Unknown scope: {}", scope),
            ShellError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ShellError::Runtime(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Runtime(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<TokenizeError> for ShellError {
    fn from(err: TokenizeError) -> Self {
        ShellError::Parse(err.to_string())
    }
}

impl From<anyhow::Error> for ShellError {
    /// Recover a `ShellError` that a run function wrapped in `anyhow`,
    /// otherwise treat the error as a runtime failure.
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ShellError>() {
            Ok(shell) => shell,
            Err(other) => ShellError::Runtime(other),
        }
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Runtime(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_shell_error_is_recovered() {
        let wrapped = anyhow::Error::new(ShellError::UnknownScope("nope".to_string()));
        assert!(matches!(ShellError::from(wrapped), ShellError::UnknownScope(name) if name == "nope"));
    }

    #[test]
    fn test_other_errors_become_runtime() {
        let err = ShellError::from(anyhow::anyhow!("boom"));
        assert!(matches!(err, ShellError::Runtime(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
