//! The option registry for one scope.
//!
//! Each option is stored once, keyed by its primary name. Aliases live in a
//! separate index that maps alias → primary name, so inserting or removing an
//! option keeps every name unique without duplicating records.

use std::collections::HashMap;
use std::fmt;

use crate::definition::OptionDefinition;
use crate::error::{RegistryError, Result};
use crate::parser::{self, OptionRef};
use crate::value::OptionValue;

/// Handler receiving the tokens no option consumed.
pub type ExtrasHandler<'a> = Box<dyn FnMut(&[String]) + 'a>;

/// Ordered set of recognized options.
///
/// # Examples
///
/// ```
/// use optbind_core::OptionSet;
///
/// let mut api_key = String::new();
/// let mut verbose = false;
/// let extras = {
///     let mut set = OptionSet::new();
///     set.add_typed("apiKey=", "API key", |v: String| api_key = v).unwrap();
///     set.add_typed("verbose|v", "Verbose output", |v: bool| verbose = v).unwrap();
///     set.parse(["--ApiKey=abc123", "-v", "deploy"]).unwrap()
/// };
///
/// assert_eq!(api_key, "abc123");
/// assert!(verbose);
/// assert_eq!(extras, vec!["deploy"]);
/// ```
#[derive(Default)]
pub struct OptionSet<'a> {
    options: Vec<OptionDefinition<'a>>,
    positions: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    extras: Option<ExtrasHandler<'a>>,
}

impl<'a> OptionSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an option.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] when any of the option's
    /// names is already registered; the registry is left unchanged.
    pub fn add(&mut self, option: OptionDefinition<'a>) -> std::result::Result<&mut Self, RegistryError> {
        let mut seen: Vec<&str> = Vec::with_capacity(option.names().len());
        for name in option.names() {
            if self.contains(name) || seen.contains(&name.as_str()) {
                return Err(RegistryError::DuplicateName(name.clone()));
            }
            seen.push(name);
        }

        let primary = option.primary_name().to_string();
        for alias in &option.names()[1..] {
            self.aliases.insert(alias.clone(), primary.clone());
        }
        self.positions.insert(primary, self.options.len());
        self.options.push(option);
        Ok(self)
    }

    /// Declares and registers a typed option in one step.
    ///
    /// # Errors
    ///
    /// Prototype or duplicate-name errors.
    pub fn add_typed<T, F>(
        &mut self,
        prototype: &str,
        description: &str,
        setter: F,
    ) -> std::result::Result<&mut Self, RegistryError>
    where
        T: OptionValue,
        F: FnMut(T) + 'a,
    {
        self.add(OptionDefinition::typed(prototype, description, setter)?)
    }

    /// Installs the handler that receives leftover tokens after a parse.
    pub fn with_extras<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&[String]) + 'a,
    {
        self.extras = Some(Box::new(handler));
        self
    }

    /// Returns `true` if `name` is a primary name or an alias (exact case).
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name) || self.aliases.contains_key(name)
    }

    /// Looks up an option by primary name or alias (exact case).
    pub fn get(&self, name: &str) -> Option<&OptionDefinition<'a>> {
        self.position(name).map(|idx| &self.options[idx])
    }

    /// Looks up an option by any of its names, ignoring case. Options are
    /// searched in registration order; the first match wins.
    pub fn find_ignore_case(&self, name: &str) -> Option<&OptionDefinition<'a>> {
        self.position_ignore_case(name).map(|idx| &self.options[idx])
    }

    /// Removes the option registered under `name` (primary name or alias),
    /// together with all of its aliases.
    pub fn remove(&mut self, name: &str) -> Option<OptionDefinition<'a>> {
        let idx = self.position(name)?;
        let option = self.options.remove(idx);

        self.positions.remove(option.primary_name());
        for alias in &option.names()[1..] {
            self.aliases.remove(alias);
        }
        for position in self.positions.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        Some(option)
    }

    /// Options in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionDefinition<'a>> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Every name of every option, prefixed with `--`, in registration order.
    pub fn display_names(&self) -> Vec<String> {
        self.options
            .iter()
            .flat_map(|o| o.names().iter().map(|n| format!("--{n}")))
            .collect()
    }

    /// Parses `tokens` against this registry and returns the extras.
    ///
    /// When an extras handler is installed it also receives the extras
    /// (only if there are any).
    ///
    /// # Errors
    ///
    /// Any [`ParseError`](crate::ParseError); options completed before the
    /// error stay bound.
    pub fn parse<I, S>(&mut self, tokens: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extras = parser::parse_tokens(std::slice::from_mut(self), tokens)?;
        if let Some(handler) = self.extras.as_mut() {
            if !extras.is_empty() {
                handler(&extras);
            }
        }
        Ok(extras)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        let primary = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.positions.get(primary).copied()
    }

    pub(crate) fn position_ignore_case(&self, name: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|o| o.names().iter().any(|n| n.eq_ignore_ascii_case(name)))
    }

    pub(crate) fn at(&self, option: OptionRef) -> &OptionDefinition<'a> {
        &self.options[option.index]
    }

    pub(crate) fn at_mut(&mut self, option: OptionRef) -> &mut OptionDefinition<'a> {
        &mut self.options[option.index]
    }
}

impl fmt::Debug for OptionSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSet")
            .field("options", &self.options)
            .field("has_extras_handler", &self.extras.is_some())
            .finish()
    }
}
