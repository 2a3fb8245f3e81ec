//! Option prototype grammar.
//!
//! A prototype declares every name of an option and its arity in one string:
//!
//! ```text
//! verbose|v          boolean flag, two names
//! apiKey=            Required value
//! color:             Optional value
//! define|D={=}       Required, values split on '='
//! ```
//!
//! A trailing `=` marks a Required value, `:` an Optional one. Characters
//! after the marker are value separators; braces only group them.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// How many values an option binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Arity {
    /// Boolean flag, no value.
    #[default]
    None,
    /// Value-bearing, the value may be missing at end of input.
    Optional,
    /// Value-bearing, at least one value must be supplied.
    Required,
}

impl Arity {
    /// Whether the option consumes values.
    pub fn takes_value(self) -> bool {
        !matches!(self, Arity::None)
    }

    fn from_marker(marker: char) -> Self {
        if marker == '=' {
            Arity::Required
        } else {
            Arity::Optional
        }
    }
}

/// Result of parsing a prototype string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prototype {
    /// Names in declaration order; the first is the primary name.
    pub names: Vec<String>,
    /// Arity derived from the `=` / `:` marker.
    pub arity: Arity,
    /// Declared value separators, `None` when no separator was given.
    pub separators: Option<Vec<char>>,
}

impl Prototype {
    /// Parses a prototype string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyPrototype`] for an empty string,
    /// [`RegistryError::EmptyName`] when a `|`-separated name is empty, and
    /// [`RegistryError::ConflictingTypes`] when names disagree on `=`/`:`.
    ///
    /// # Examples
    ///
    /// ```
    /// use optbind_core::{Arity, Prototype};
    ///
    /// let proto = Prototype::parse("define|D={=}").unwrap();
    /// assert_eq!(proto.names, vec!["define", "D"]);
    /// assert_eq!(proto.arity, Arity::Required);
    /// assert_eq!(proto.separators, Some(vec!['=']));
    ///
    /// let flag = Prototype::parse("verbose|v").unwrap();
    /// assert_eq!(flag.arity, Arity::None);
    /// ```
    pub fn parse(prototype: &str) -> Result<Self, RegistryError> {
        if prototype.is_empty() {
            return Err(RegistryError::EmptyPrototype);
        }

        let mut names = Vec::new();
        let mut marker: Option<char> = None;
        let mut separators: Vec<char> = Vec::new();

        for part in prototype.split('|') {
            let (name, part_marker, seps) = match part.find(['=', ':']) {
                Some(pos) => {
                    let marker_char = part[pos..].chars().next().unwrap_or('=');
                    (&part[..pos], Some(marker_char), &part[pos + 1..])
                }
                None => (part, None, ""),
            };

            if name.is_empty() {
                return Err(RegistryError::EmptyName(prototype.to_string()));
            }

            if let Some(m) = part_marker {
                match marker {
                    Some(existing) if existing != m => {
                        return Err(RegistryError::ConflictingTypes(prototype.to_string()));
                    }
                    _ => marker = Some(m),
                }
            }

            for c in seps.chars().filter(|c| *c != '{' && *c != '}') {
                if !separators.contains(&c) {
                    separators.push(c);
                }
            }
            names.push(name.to_string());
        }

        Ok(Self {
            names,
            arity: marker.map(Arity::from_marker).unwrap_or(Arity::None),
            separators: if separators.is_empty() {
                None
            } else {
                Some(separators)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required_and_optional() {
        let required = Prototype::parse("apiKey=").unwrap();
        assert_eq!(required.names, vec!["apiKey"]);
        assert_eq!(required.arity, Arity::Required);
        assert_eq!(required.separators, None);

        let optional = Prototype::parse("color|c:").unwrap();
        assert_eq!(optional.names, vec!["color", "c"]);
        assert_eq!(optional.arity, Arity::Optional);
    }

    #[test]
    fn test_marker_on_any_name_applies_to_all() {
        let proto = Prototype::parse("o=|output").unwrap();
        assert_eq!(proto.arity, Arity::Required);
        assert_eq!(proto.names, vec!["o", "output"]);
    }

    #[test]
    fn test_separators_without_braces() {
        let proto = Prototype::parse("pair=:,").unwrap();
        assert_eq!(proto.separators, Some(vec![':', ',']));
    }

    #[test]
    fn test_rejects_conflicting_markers() {
        assert_eq!(
            Prototype::parse("a=|b:"),
            Err(RegistryError::ConflictingTypes("a=|b:".into()))
        );
    }

    #[test]
    fn test_rejects_empty_names() {
        assert_eq!(Prototype::parse(""), Err(RegistryError::EmptyPrototype));
        assert_eq!(
            Prototype::parse("a||b"),
            Err(RegistryError::EmptyName("a||b".into()))
        );
        assert_eq!(Prototype::parse("="), Err(RegistryError::EmptyName("=".into())));
    }
}
