//! Named commands, their options and lookup by name or alias.
//!
//! Every [`Command`] carries the common options group (`--help` and
//! `--helpOutputFormat`). A catalog built with
//! [`CommandCatalog::with_builtins`] also holds the `help` and `complete`
//! commands, so a [`CompletionMap`] taken from it always has a `help` entry.

use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use optbind_core::{
    EnumKind, OptionDefinition, OptionGroupHelp, OptionValue, Options, ParseError, RegistryError,
    Value, ValueKind, readable_join, write_options,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;
use crate::map::CompletionMap;
use crate::suggest::{COMPLETE_COMMAND, HELP_COMMAND};

/// Label of the group every command receives.
pub const COMMON_OPTIONS: &str = "Common options";

/// Format of help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Default,
    Json,
}

impl OptionValue for OutputFormat {
    fn kind() -> ValueKind {
        ValueKind::Enumeration(EnumKind::new("OutputFormat").member("Default").member("Json"))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Enum(name) if name == "Default" => Some(OutputFormat::Default),
            Value::Enum(name) if name == "Json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Name, aliases and description of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CommandMetadata {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Serializable help for one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandHelp {
    pub command: String,
    pub description: String,
    pub options: Vec<OptionGroupHelp>,
}

/// A command and its option groups.
///
/// # Examples
///
/// ```
/// use optbind_complete::{Command, CommandMetadata, OutputFormat};
///
/// let mut command = Command::new(CommandMetadata::new("push", "Pushes a package")).unwrap();
/// command.parse(["--help", "--helpOutputFormat=json"]).unwrap();
///
/// assert!(command.print_help());
/// assert_eq!(command.help_output_format(), OutputFormat::Json);
/// assert_eq!(command.option_names(), vec!["--help", "--helpOutputFormat"]);
/// ```
pub struct Command<'a> {
    metadata: CommandMetadata,
    options: Options<'a>,
    print_help: Rc<Cell<bool>>,
    help_output_format: Rc<Cell<OutputFormat>>,
}

impl<'a> Command<'a> {
    /// A command holding only the common options group.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Registry`] when the common options cannot be
    /// registered.
    pub fn new(metadata: CommandMetadata) -> Result<Self, CatalogError> {
        let print_help = Rc::new(Cell::new(false));
        let help_output_format = Rc::new(Cell::new(OutputFormat::Default));
        let mut options = Options::new();
        add_common_options(&mut options, &print_help, &help_output_format)?;

        Ok(Self {
            metadata,
            options,
            print_help,
            help_output_format,
        })
    }

    pub fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn options(&self) -> &Options<'a> {
        &self.options
    }

    /// Mutable access for registering command-specific groups.
    pub fn options_mut(&mut self) -> &mut Options<'a> {
        &mut self.options
    }

    /// Whether `--help` was given in the last parse.
    pub fn print_help(&self) -> bool {
        self.print_help.get()
    }

    pub fn help_output_format(&self) -> OutputFormat {
        self.help_output_format.get()
    }

    /// Parses arguments against every group of this command.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`].
    pub fn parse<I, S>(&mut self, args: I) -> Result<Vec<String>, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.print_help.set(false);
        self.help_output_format.set(OutputFormat::Default);
        self.options.parse(args)
    }

    /// `--name` for every name of every option.
    pub fn option_names(&self) -> Vec<String> {
        self.options.display_names()
    }

    pub fn describe(&self) -> CommandHelp {
        CommandHelp {
            command: self.metadata.name.clone(),
            description: self.metadata.description.clone(),
            options: self.options.describe(),
        }
    }

    /// Writes the plain-text help of this command.
    ///
    /// # Errors
    ///
    /// I/O errors from `out`.
    pub fn write_help<W: Write>(&self, executable: &str, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.metadata.description)?;
        writeln!(out)?;
        writeln!(out, "Usage: {executable} {} [<options>]", self.metadata.name)?;
        writeln!(out)?;
        writeln!(out, "Where [<options>] is any of:")?;
        writeln!(out)?;
        write_options(&self.options, out)
    }
}

impl std::fmt::Debug for Command<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("metadata", &self.metadata)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn add_common_options(
    options: &mut Options<'_>,
    print_help: &Rc<Cell<bool>>,
    help_output_format: &Rc<Cell<OutputFormat>>,
) -> Result<(), RegistryError> {
    let formats = readable_join(
        &OutputFormat::kind().valid_values().unwrap_or_default(),
        "or",
    );
    let group = options.group(COMMON_OPTIONS);

    let help = Rc::clone(print_help);
    let output_format = Rc::clone(help_output_format);
    group.add(OptionDefinition::flag(
        "help",
        "[Optional] Print help for a command.",
        move |v| help.set(v),
    )?)?;
    group.add(OptionDefinition::typed(
        "helpOutputFormat=",
        &format!("[Optional] Output format for help, valid options are {formats}"),
        move |v: OutputFormat| output_format.set(v),
    )?)?;
    Ok(())
}

/// The commands a tool understands.
///
/// # Examples
///
/// ```
/// use optbind_complete::{CommandCatalog, CommandMetadata};
///
/// let mut catalog = CommandCatalog::with_builtins().unwrap();
/// catalog
///     .register(CommandMetadata::new("list-projects", "Lists projects").with_alias("lp"))
///     .unwrap();
///
/// assert_eq!(catalog.find(" LP ").unwrap().name(), "list-projects");
/// assert_eq!(catalog.resolve(&["--help"]).unwrap().name(), "help");
/// assert_eq!(catalog.resolve::<&str>(&[]).unwrap().name(), "help");
/// assert!(catalog.resolve(&["deploy"]).is_err());
/// ```
#[derive(Debug, Default)]
pub struct CommandCatalog<'a> {
    commands: Vec<Command<'a>>,
}

impl<'a> CommandCatalog<'a> {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the `help` and `complete` commands.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Registry`] when the common options cannot be
    /// registered.
    pub fn with_builtins() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.register(CommandMetadata::new(HELP_COMMAND, "Prints this help text"))?;
        catalog.register(CommandMetadata::new(
            COMPLETE_COMMAND,
            "Supports command line auto completion.",
        ))?;
        Ok(catalog)
    }

    /// Adds a command and returns it for option registration. The name and
    /// aliases are stored trimmed and lowercased.
    ///
    /// # Errors
    ///
    /// [`CatalogError::DuplicateCommand`] when the name or an alias is taken
    /// (ignoring case), [`CatalogError::InvalidName`] for empty names or
    /// names starting with `-` or `/`.
    pub fn register(&mut self, metadata: CommandMetadata) -> Result<&mut Command<'a>, CatalogError> {
        for name in metadata.names() {
            if name.trim().is_empty() || name.starts_with(['-', '/']) {
                return Err(CatalogError::InvalidName(name.to_string()));
            }
            if self.find(name).is_some() {
                return Err(CatalogError::DuplicateCommand(name.to_string()));
            }
        }
        let metadata = CommandMetadata {
            name: normalize(&metadata.name),
            aliases: metadata.aliases.iter().map(|a| normalize(a)).collect(),
            description: metadata.description,
        };
        debug!(command = %metadata.name, aliases = ?metadata.aliases, "registered command");
        self.commands.push(Command::new(metadata)?);
        let last = self.commands.len() - 1;
        Ok(&mut self.commands[last])
    }

    /// Metadata of every command, in registration order.
    pub fn list(&self) -> impl Iterator<Item = &CommandMetadata> {
        self.commands.iter().map(Command::metadata)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command<'a>> {
        self.commands.iter()
    }

    /// Finds a command by name or alias, ignoring case and surrounding
    /// whitespace.
    pub fn find(&self, name: &str) -> Option<&Command<'a>> {
        self.position(name).map(|idx| &self.commands[idx])
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Command<'a>> {
        self.position(name).map(|idx| &mut self.commands[idx])
    }

    /// Selects the command named by the first argument.
    ///
    /// The argument is lowercased and stripped of leading `-` and `/`, so
    /// `--help` and `/help` select `help`. A missing or blank argument also
    /// selects `help`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownCommand`] when nothing matches.
    pub fn resolve<S: AsRef<str>>(&self, args: &[S]) -> Result<&Command<'a>, CatalogError> {
        let idx = self.resolve_position(args)?;
        Ok(&self.commands[idx])
    }

    /// Mutable form of [`resolve`](Self::resolve).
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownCommand`] when nothing matches.
    pub fn resolve_mut<S: AsRef<str>>(&mut self, args: &[S]) -> Result<&mut Command<'a>, CatalogError> {
        let idx = self.resolve_position(args)?;
        Ok(&mut self.commands[idx])
    }

    /// Completion map over every command, keyed by command name.
    pub fn completion_map(&self) -> CompletionMap {
        self.commands
            .iter()
            .map(|c| (c.name().to_string(), c.option_names()))
            .collect()
    }

    /// Writes the command overview: usage line and every command with its
    /// description, sorted by name.
    ///
    /// # Errors
    ///
    /// I/O errors from `out`.
    pub fn write_overview<W: Write>(&self, executable: &str, out: &mut W) -> io::Result<()> {
        writeln!(out, "Usage: {executable} <command> [<options>]")?;
        writeln!(out)?;
        writeln!(out, "Where <command> is one of:")?;
        writeln!(out)?;

        let mut metadata: Vec<&CommandMetadata> = self.list().collect();
        metadata.sort_by(|a, b| a.name.cmp(&b.name));
        for command in metadata {
            writeln!(out, "  {}", command.name)?;
            writeln!(out, "   {}", command.description)?;
        }

        writeln!(out)?;
        writeln!(out, "Or use {executable} help <command> for more details.")
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = normalize(name);
        self.commands
            .iter()
            .position(|c| c.metadata.names().any(|n| n == name))
    }

    fn resolve_position<S: AsRef<str>>(&self, args: &[S]) -> Result<usize, CatalogError> {
        let first = args
            .first()
            .map(|a| a.as_ref().to_lowercase())
            .unwrap_or_default();
        let first = first.trim_start_matches(['-', '/']);

        if first.trim().is_empty() {
            return self
                .position(HELP_COMMAND)
                .ok_or_else(|| CatalogError::UnknownCommand(HELP_COMMAND.to_string()));
        }
        self.position(first)
            .ok_or_else(|| CatalogError::UnknownCommand(first.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
