use thiserror::Error;

/// An error in the argument configuration, detected before any parsing occurs.
///
/// These are fatal to setup; a program with an invalid configuration cannot
/// meaningfully evaluate its command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("The argument key specification must not be empty.")]
    EmptyKeySpec,

    #[error("The short form '{0}' must be a single character.")]
    InvalidShortForm(String),

    #[error("The key specification '{0}' must contain at most two comma separated parts.")]
    MalformedKeySpec(String),

    #[error("The part '{part}' in key specification '{spec}' contains an invalid character.")]
    InvalidKeyCharacter { spec: String, part: String },

    #[error("Cannot duplicate the argument '{0}'.")]
    DuplicateKey(String),

    #[error("Cannot duplicate the handler '{0}'.")]
    DuplicateHandler(String),

    #[error("Cannot register a second free value argument ('{0}' already registered).")]
    DuplicateFreeValue(String),

    #[error("The argument '{name}' with value mode '{mode}' does not support a cardinality above one.")]
    InvalidValueModeCardinality { name: String, mode: String },
}

/// An error while evaluating the command line, reported synchronously out of
/// `Handler::eval_arguments`/`Group::eval_arguments`.
///
/// None of these are retried internally; the caller decides the user-visible
/// behaviour (`Group::eval_or_exit` implements the print-and-exit policy).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown argument '{0}'.")]
    UnknownArgument(String),

    #[error("Ambiguous argument '{token}' (candidates: {}).", candidates.join(", "))]
    AmbiguousArgument {
        token: String,
        candidates: Vec<String>,
    },

    #[error("The argument '{0}' requires a value.")]
    MissingValue(String),

    #[error("The argument '{name}' was supplied {observed} time(s), allowed {allowed}.")]
    Cardinality {
        name: String,
        observed: usize,
        allowed: String,
    },

    #[error("Missing the mandatory argument '{0}'.")]
    MissingMandatory(String),

    #[error("Constraint violated: {0}.")]
    ConstraintViolation(String),

    #[error("Cannot convert '{token}' to {expected}.")]
    Conversion { token: String, expected: String },

    #[error("The argument '{0}' does not support inversion.")]
    InvalidInversion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        assert_eq!(
            ParseError::UnknownArgument("x".to_string()).to_string(),
            "Unknown argument 'x'."
        );
        assert_eq!(
            ParseError::AmbiguousArgument {
                token: "ver".to_string(),
                candidates: vec!["verbose".to_string(), "version".to_string()],
            }
            .to_string(),
            "Ambiguous argument 'ver' (candidates: verbose, version)."
        );
        assert_eq!(
            ParseError::Cardinality {
                name: "item".to_string(),
                observed: 2,
                allowed: "[1]".to_string(),
            }
            .to_string(),
            "The argument 'item' was supplied 2 time(s), allowed [1]."
        );
    }

    #[test]
    fn config_error_display() {
        assert_eq!(
            ConfigError::DuplicateKey("q".to_string()).to_string(),
            "Cannot duplicate the argument 'q'."
        );
    }
}
