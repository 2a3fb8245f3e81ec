//! Command catalog and shell completion suggestions.
//!
//! - [`CommandCatalog`]: named commands with aliases, each owning an
//!   [`Options`](optbind_core::Options) aggregate that always includes the
//!   common options group.
//! - [`CompletionMap`]: command name → option display names, built with
//!   [`CommandCatalog::completion_map`].
//! - [`suggest`]: sorted completion candidates for the words typed so far.
//!
//! # Example
//!
//! ```
//! use optbind_complete::*;
//!
//! let mut catalog = CommandCatalog::with_builtins().unwrap();
//! catalog
//!     .register(CommandMetadata::new("test", "Runs tests"))
//!     .unwrap()
//!     .options_mut()
//!     .group("Test options")
//!     .add_typed("apiKey=", "API key", |_: String| {})
//!     .unwrap();
//!
//! let map = catalog.completion_map();
//! let names = InvocationNames::new("octo");
//!
//! assert_eq!(suggest(&["te"], &map, &names), vec!["test"]);
//! assert_eq!(suggest(&["test", "--ap"], &map, &names), vec!["--apiKey"]);
//! assert_eq!(suggest(&["--helpO"], &map, &names), vec!["--helpOutputFormat"]);
//! ```

mod catalog;
mod error;
mod map;
mod suggest;

pub use catalog::{
    COMMON_OPTIONS, Command, CommandCatalog, CommandHelp, CommandMetadata, OutputFormat,
};
pub use error::CatalogError;
pub use map::CompletionMap;
pub use suggest::{
    COMPLETE_COMMAND, CompletionContext, HELP_COMMAND, InvocationNames, LONG_FLAG_MARKER,
    suggest,
};
