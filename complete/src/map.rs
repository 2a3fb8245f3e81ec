//! The completion map: command name → that command's option display names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Read-only input of [`suggest`](crate::suggest).
///
/// Option names are stored exactly as they should be offered, marker
/// included (`--apiKey`).
///
/// # Examples
///
/// ```
/// use optbind_complete::CompletionMap;
///
/// let map: CompletionMap = [("test", vec!["--apiKey", "--url"])].into_iter().collect();
/// assert!(map.contains_command("test"));
/// assert_eq!(map.options("test").unwrap(), ["--apiKey", "--url"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl CompletionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the option names of `command`.
    pub fn insert(&mut self, command: &str, options: Vec<String>) {
        self.entries.insert(command.to_string(), options);
    }

    /// Exact-case key lookup.
    pub fn contains_command(&self, command: &str) -> bool {
        self.entries.contains_key(command)
    }

    pub fn options(&self, command: &str) -> Option<&[String]> {
        self.entries.get(command).map(Vec::as_slice)
    }

    /// Command names in ordinal order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C, O, S> FromIterator<(C, O)> for CompletionMap
where
    C: Into<String>,
    O: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, O)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(command, options)| {
                    (command.into(), options.into_iter().map(Into::into).collect())
                })
                .collect(),
        }
    }
}
