//! Options grouped by category label.

use std::fmt;

use crate::error::Result;
use crate::parser;
use crate::registry::{ExtrasHandler, OptionSet};

/// One [`OptionSet`] per category label, parsed together.
///
/// Groups keep the order in which they were first requested. When two
/// groups register the same name, the earlier group wins during parsing;
/// [`validate_options`](crate::validate_options) reports such clashes.
///
/// # Examples
///
/// ```
/// use optbind_core::Options;
///
/// let mut help = false;
/// let mut url = String::new();
/// let extras = {
///     let mut options = Options::new();
///     options
///         .group("Common options")
///         .add_typed("help|h", "Show help", |v: bool| help = v)
///         .unwrap();
///     options
///         .group("Test options")
///         .add_typed("url=", "Server URL", |v: String| url = v)
///         .unwrap();
///     options.parse(["--url", "http://localhost", "-h", "extra"]).unwrap()
/// };
///
/// assert!(help);
/// assert_eq!(url, "http://localhost");
/// assert_eq!(extras, vec!["extra"]);
/// ```
#[derive(Default)]
pub struct Options<'a> {
    labels: Vec<String>,
    sets: Vec<OptionSet<'a>>,
    extras: Option<ExtrasHandler<'a>>,
}

impl<'a> Options<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registry for `label`, creating it on first use.
    pub fn group(&mut self, label: &str) -> &mut OptionSet<'a> {
        let idx = match self.labels.iter().position(|l| l == label) {
            Some(idx) => idx,
            None => {
                self.labels.push(label.to_string());
                self.sets.push(OptionSet::new());
                self.labels.len() - 1
            }
        };
        &mut self.sets[idx]
    }

    /// Looks up an existing group.
    pub fn get_group(&self, label: &str) -> Option<&OptionSet<'a>> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| &self.sets[idx])
    }

    /// `(label, registry)` pairs in creation order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &OptionSet<'a>)> {
        self.labels.iter().map(String::as_str).zip(self.sets.iter())
    }

    /// Installs the handler receiving the extras of [`parse`](Self::parse).
    ///
    /// Handlers installed on individual groups are not called here.
    pub fn with_extras<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&[String]) + 'a,
    {
        self.extras = Some(Box::new(handler));
        self
    }

    /// Every name of every option in every group, prefixed with `--`.
    pub fn display_names(&self) -> Vec<String> {
        self.sets.iter().flat_map(OptionSet::display_names).collect()
    }

    /// Total number of options across groups.
    pub fn len(&self) -> usize {
        self.sets.iter().map(OptionSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses `tokens` against every group and returns the extras.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`](crate::ParseError).
    pub fn parse<I, S>(&mut self, tokens: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extras = parser::parse_tokens(&mut self.sets, tokens)?;
        if let Some(handler) = self.extras.as_mut() {
            if !extras.is_empty() {
                handler(&extras);
            }
        }
        Ok(extras)
    }
}

impl fmt::Debug for Options<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.groups()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_is_created_once() {
        let mut options = Options::new();
        options.group("A").add_typed("a", "", |_: bool| {}).unwrap();
        options.group("B").add_typed("b", "", |_: bool| {}).unwrap();
        options.group("A").add_typed("c", "", |_: bool| {}).unwrap();

        let labels: Vec<&str> = options.groups().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["A", "B"]);
        assert_eq!(options.get_group("A").unwrap().len(), 2);
        assert_eq!(options.len(), 3);
        assert_eq!(options.display_names(), vec!["--a", "--c", "--b"]);
    }

    #[test]
    fn test_extras_handler_only_called_with_extras() {
        let mut calls = Vec::new();
        {
            let mut options = Options::new();
            options.group("G").add_typed("x", "", |_: bool| {}).unwrap();
            options.with_extras(|extras| calls.push(extras.to_vec()));
            options.parse(["-x"]).unwrap();
            options.parse(["-x", "left", "--", "-x"]).unwrap();
        }
        assert_eq!(calls, vec![vec!["left".to_string(), "-x".to_string()]]);
    }
}
