//! Command-line option parsing and binding.
//!
//! This crate turns raw argument tokens into typed program state:
//!
//! - [`OptionDefinition`]: one option: names from a [`Prototype`] string,
//!   [`Arity`], value kind and the callback that binds its values.
//! - [`OptionSet`]: a registry of options with an alias index.
//! - [`Options`]: registries grouped by category label, parsed together.
//! - [`ParseContext`]: the per-parse state machine ([`State`]), driven by
//!   the pure [`classify`] and [`transition`] functions.
//! - [`ValueKind`] / [`convert`]: the closed table of value conversions,
//!   including enumerations with deprecated members.
//!
//! Token grammar: flags are written `--name`, `-name` or `/name`, with an
//! optional inline value after `=` or `:`. A literal `--` stops flag
//! recognition, `-abc` bundles single-character options and `--name+` /
//! `--name-` set a boolean option explicitly.
//!
//! Help output ([`write_option_descriptions`], [`Options::describe`]) and
//! table validation ([`validate_options`]) are built on the same registry.
//!
//! # Example
//!
//! ```
//! use optbind_core::*;
//!
//! let mut force = false;
//! let mut output = String::new();
//! let mut retries = 0u32;
//! let extras = {
//!     let mut options = Options::new();
//!     let group = options.group("Build options");
//!     group.add_typed("force|f", "Overwrite existing files", |v: bool| force = v).unwrap();
//!     group.add_typed("output|o=", "Write to {FILE}", |v: String| output = v).unwrap();
//!     group.add_typed("retries=", "Retry count", |v: u32| retries = v).unwrap();
//!     options.parse(["-foout.txt", "--RETRIES:3", "--", "--force"]).unwrap()
//! };
//!
//! assert!(force);
//! assert_eq!(output, "out.txt");
//! assert_eq!(retries, 3);
//! assert_eq!(extras, vec!["--force"]);
//! ```

mod definition;
mod error;
mod help;
mod options;
mod parser;
mod prototype;
mod registry;
mod validate;
mod value;

pub use definition::{CompletionCallback, DEFAULT_VALUE_SEPARATORS, OptionDefinition};
pub use error::{
    ParseError, RegistryError, Result, TypeConversionError, ValueError, readable_join,
};
pub use help::{
    LINE_WIDTH, OPTION_WIDTH, OptionGroupHelp, ParameterHelp, write_option_descriptions,
    write_options,
};
pub use options::Options;
pub use parser::{
    Action, BundleItem, OptionRef, ParseContext, Pending, REDACTED, State, TokenClass,
    Transition, classify, transition,
};
pub use prototype::{Arity, Prototype};
pub use registry::{ExtrasHandler, OptionSet};
pub use validate::{ValidationError, validate_options};
pub use value::{EnumKind, EnumMember, OptionValue, Value, ValueKind, convert};
