//! Error types for option registration, value conversion and parsing.
//!
//! Registration problems ([`RegistryError`]) surface while an option table is
//! being built. Everything that goes wrong while consuming tokens is a
//! [`ParseError`] and is fatal to the current parse call.

use thiserror::Error;

/// Errors raised while declaring options or adding them to a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The prototype string is empty.
    #[error("option prototype cannot be empty")]
    EmptyPrototype,
    /// One of the `|`-separated names is empty (e.g. `"a||b"`).
    #[error("empty option name in prototype: {0}")]
    EmptyName(String),
    /// A name is already registered in this registry.
    #[error("duplicate option name: {0}")]
    DuplicateName(String),
    /// Names of one prototype disagree on `=` versus `:`.
    #[error("conflicting option types in prototype: {0}")]
    ConflictingTypes(String),
    /// The maximum value count does not fit the arity.
    #[error("invalid maximum value count {count} for prototype '{prototype}'")]
    InvalidValueCount { prototype: String, count: usize },
    /// A boolean flag (no `=`/`:` marker) was declared with a non-boolean type.
    #[error("flag '{prototype}' takes no value and cannot bind type {type_name}")]
    FlagKindMismatch {
        prototype: String,
        type_name: String,
    },
}

/// Failure produced by a binding callback for a single value.
///
/// Callbacks have no idea which flag spelling triggered them, so this error
/// carries no option name. The engine attaches it when wrapping the error
/// into a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The raw string could not be converted to the target type.
    #[error("could not convert string `{value}' to type {type_name}")]
    Conversion {
        value: String,
        type_name: String,
        valid_values: Vec<String>,
    },
    /// The setter rejected the value for another reason.
    #[error("{0}")]
    Invalid(String),
}

/// A bound string that could not be converted to the option's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Could not convert string `{value}' to type {type_name} for option `{option}'.{}",
    valid_values_suffix(.valid_values)
)]
pub struct TypeConversionError {
    /// Raw value as it appeared on the command line.
    pub value: String,
    /// Target type name (enumeration name for enumerations).
    pub type_name: String,
    /// Option display name, marker included.
    pub option: String,
    /// Non-deprecated enumeration members, in declaration order.
    pub valid_values: Vec<String>,
}

/// Errors raised while parsing a token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An unregistered character appeared after the first position of a
    /// short-option bundle.
    #[error("Cannot bundle unregistered option '{option}'.")]
    UnregisteredBundledOption { option: String },
    /// More values were bound than the option accepts.
    #[error("Found {found} option values for option '{option}' when expecting {expected}.")]
    TooManyValues {
        option: String,
        found: usize,
        expected: usize,
    },
    /// A Required option reached end of input without a value.
    #[error("Missing required value for option '{option}'.")]
    MissingRequiredValue { option: String },
    /// A bound value could not be converted to the option's type.
    #[error(transparent)]
    TypeConversion(#[from] TypeConversionError),
    /// The option's setter rejected the value.
    #[error("Invalid value for option '{option}': {message}")]
    InvalidValue { option: String, message: String },
}

impl ParseError {
    /// Attaches the option display name to a callback failure.
    pub(crate) fn from_value_error(option: &str, err: ValueError) -> Self {
        match err {
            ValueError::Conversion {
                value,
                type_name,
                valid_values,
            } => ParseError::TypeConversion(TypeConversionError {
                value,
                type_name,
                option: option.to_string(),
                valid_values,
            }),
            ValueError::Invalid(message) => ParseError::InvalidValue {
                option: option.to_string(),
                message,
            },
        }
    }

    /// Returns the option display name this error was reported against.
    pub fn option(&self) -> &str {
        match self {
            ParseError::UnregisteredBundledOption { option }
            | ParseError::TooManyValues { option, .. }
            | ParseError::MissingRequiredValue { option }
            | ParseError::InvalidValue { option, .. } => option,
            ParseError::TypeConversion(err) => &err.option,
        }
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

/// Joins names for humans: `A`, `A and B`, `A, B and C`.
pub fn readable_join(items: &[String], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} {conjunction} {last}", head.join(", ")),
    }
}

fn valid_values_suffix(valid_values: &[String]) -> String {
    if valid_values.is_empty() {
        String::new()
    } else {
        format!(" Valid values are {}.", readable_join(valid_values, "and"))
    }
}
