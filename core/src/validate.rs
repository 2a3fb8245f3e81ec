//! Option table validation.
//!
//! Registration already rejects duplicates inside one group. These checks
//! catch problems that only show up across groups, or names the token
//! grammar can never match.
//!
//! # Examples
//!
//! ```
//! use optbind_core::*;
//!
//! let mut options = Options::new();
//! options.group("Common").add_typed("verbose|v", "", |_: bool| {}).unwrap();
//! assert!(validate_options(&options).is_empty());
//!
//! // Same name in a second group: unreachable during parsing
//! options.group("Test").add_typed("v", "", |_: bool| {}).unwrap();
//! assert_eq!(
//!     validate_options(&options),
//!     vec![ValidationError::DuplicateName("v".into())]
//! );
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::Options;

/// Option table validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Group label is empty or whitespace-only.
    #[error("option group label cannot be empty")]
    EmptyGroupLabel,
    /// The same name is registered in two groups.
    #[error("duplicate option name across groups: {0}")]
    DuplicateName(String),
    /// Two distinct names differ only in case; the later one is shadowed
    /// when typed with a flag marker.
    #[error("option names '{first}' and '{second}' differ only in case")]
    AmbiguousName { first: String, second: String },
    /// Name starts with a flag marker or contains a value separator.
    #[error("invalid option name: {0}")]
    InvalidName(String),
}

/// Validates an option table and returns every problem found.
pub fn validate_options(options: &Options<'_>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut exact: HashMap<&str, &str> = HashMap::new();
    let mut folded: HashMap<String, &str> = HashMap::new();

    for (label, set) in options.groups() {
        if label.trim().is_empty() {
            errors.push(ValidationError::EmptyGroupLabel);
        }

        for option in set.iter() {
            for name in option.names() {
                if !is_valid_name(name) {
                    errors.push(ValidationError::InvalidName(name.clone()));
                }

                match exact.get(name.as_str()) {
                    Some(owner) if *owner != label => {
                        errors.push(ValidationError::DuplicateName(name.clone()));
                        continue;
                    }
                    Some(_) => continue,
                    None => {
                        exact.insert(name, label);
                    }
                }

                let key = name.to_lowercase();
                match folded.get(&key) {
                    Some(first) => errors.push(ValidationError::AmbiguousName {
                        first: (*first).to_string(),
                        second: name.clone(),
                    }),
                    None => {
                        folded.insert(key, name);
                    }
                }
            }
        }
    }

    errors
}

fn is_valid_name(name: &str) -> bool {
    !name.starts_with(['-', '/']) && !name.contains([':', '=']) && !name.contains(char::is_whitespace)
}
