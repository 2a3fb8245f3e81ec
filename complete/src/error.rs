//! Errors raised by the command catalog.

use optbind_core::RegistryError;
use thiserror::Error;

/// Command catalog errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No command or alias matches the requested name.
    #[error("Unrecognized command '{0}'")]
    UnknownCommand(String),
    /// A command name or alias is already taken.
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),
    /// Command names cannot be empty or start with a flag marker.
    #[error("invalid command name: '{0}'")]
    InvalidName(String),
    /// The common options could not be registered on a command.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
