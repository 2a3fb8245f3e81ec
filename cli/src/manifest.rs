//! YAML tool manifests and the catalog built from them.
//!
//! ```yaml
//! executable: octo
//! commands:
//!   - name: push
//!     aliases: [p]
//!     description: Pushes packages
//!     groups:
//!       - label: Push options
//!         options:
//!           - prototype: "apiKey="
//!             description: API key for the server
//!             sensitive: true
//!           - prototype: "packageFormat="
//!             type: enum
//!             enum_name: PackageFormat
//!             members: [Zip, NuPkg]
//!             deprecated: [Nuget]
//! ```
//!
//! Options without a `type` are booleans when the prototype has no value
//! marker and strings otherwise.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use optbind_complete::{CatalogError, CommandCatalog, CommandMetadata};
use optbind_core::{
    Arity, EnumKind, OptionDefinition, Prototype, REDACTED, RegistryError, Value, ValueKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Executable name used when a manifest does not set one.
pub const DEFAULT_EXECUTABLE: &str = "optbind";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid option '{prototype}': {message}")]
    InvalidOption { prototype: String, message: String },
    #[error("command '{command}': {source}")]
    Registry {
        command: String,
        source: RegistryError,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Top-level manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_executable")]
    pub executable: String,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub label: String,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Integer,
    Float,
    String,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub prototype: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub enum_name: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub deprecated: Vec<String>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub multiple: bool,
    /// Values per appearance; more than one binds the raw strings.
    #[serde(default)]
    pub count: Option<usize>,
}

impl Manifest {
    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// One recorded option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    One(Value),
    Values(Vec<String>),
    Repeated(Vec<Bound>),
}

/// Values recorded by the catalog's options, keyed by primary name.
pub type Bindings = Rc<RefCell<BTreeMap<String, Bound>>>;

/// Builds the catalog (builtins plus manifest commands) whose options
/// record into `bindings`.
pub fn build_catalog(
    manifest: &Manifest,
    bindings: &Bindings,
) -> Result<CommandCatalog<'static>, ManifestError> {
    let mut catalog = CommandCatalog::with_builtins()?;
    for spec in &manifest.commands {
        let mut metadata = CommandMetadata::new(&spec.name, &spec.description);
        for alias in &spec.aliases {
            metadata = metadata.with_alias(alias);
        }
        let command = catalog.register(metadata)?;

        for group in &spec.groups {
            for option in &group.options {
                let definition = build_option(option, bindings)?;
                command
                    .options_mut()
                    .group(&group.label)
                    .add(definition)
                    .map_err(|source| ManifestError::Registry {
                        command: spec.name.clone(),
                        source,
                    })?;
            }
        }
    }
    Ok(catalog)
}

fn build_option(
    spec: &OptionSpec,
    bindings: &Bindings,
) -> Result<OptionDefinition<'static>, ManifestError> {
    let invalid = |message: String| ManifestError::InvalidOption {
        prototype: spec.prototype.clone(),
        message,
    };
    let prototype = Prototype::parse(&spec.prototype).map_err(|e| invalid(e.to_string()))?;
    let mut record = recorder(
        Rc::clone(bindings),
        prototype.names[0].clone(),
        spec.multiple,
        spec.sensitive,
    );

    let definition = match spec.count {
        Some(count) if count > 1 => {
            OptionDefinition::raw(&spec.prototype, &spec.description, count, move |values| {
                record(Bound::Values(values.to_vec()));
                Ok(())
            })
        }
        _ => {
            let kind = value_kind(spec, prototype.arity).map_err(invalid)?;
            OptionDefinition::with_kind(&spec.prototype, &spec.description, kind, move |value| {
                record(Bound::One(value))
            })
        }
    }
    .map_err(|e| invalid(e.to_string()))?;

    let definition = if spec.sensitive {
        definition.sensitive()
    } else {
        definition
    };
    Ok(if spec.multiple {
        definition.allow_multiple()
    } else {
        definition
    })
}

fn value_kind(spec: &OptionSpec, arity: Arity) -> Result<ValueKind, String> {
    let value_type = spec.value_type.unwrap_or(if arity.takes_value() {
        ValueType::String
    } else {
        ValueType::Bool
    });

    Ok(match value_type {
        ValueType::Bool => ValueKind::Bool,
        ValueType::Integer => ValueKind::Integer,
        ValueType::Float => ValueKind::Float,
        ValueType::String => ValueKind::String,
        ValueType::Enum => {
            if spec.members.is_empty() {
                return Err("enumeration needs at least one member".to_string());
            }
            let name = spec.enum_name.as_deref().unwrap_or("Enumeration");
            let kind = spec
                .members
                .iter()
                .fold(EnumKind::new(name), |kind, member| kind.member(member));
            let kind = spec
                .deprecated
                .iter()
                .fold(kind, |kind, member| kind.deprecated_member(member));
            ValueKind::Enumeration(kind)
        }
    })
}

/// Setter storing each appearance under `key`.
fn recorder(bindings: Bindings, key: String, multiple: bool, sensitive: bool) -> impl FnMut(Bound) {
    move |bound| {
        let bound = if sensitive {
            Bound::One(Value::String(REDACTED.to_string()))
        } else {
            bound
        };
        let mut map = bindings.borrow_mut();
        if multiple {
            match map
                .entry(key.clone())
                .or_insert_with(|| Bound::Repeated(Vec::new()))
            {
                Bound::Repeated(items) => items.push(bound),
                other => *other = bound,
            }
        } else {
            map.insert(key.clone(), bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
executable: octo
commands:
  - name: push
    aliases: [p]
    description: Pushes packages
    groups:
      - label: Push options
        options:
          - prototype: "apiKey="
            sensitive: true
          - prototype: "packageFormat="
            type: enum
            enum_name: PackageFormat
            members: [Zip, NuPkg]
            deprecated: [Nuget]
          - prototype: "force|f"
          - prototype: "tag="
            multiple: true
          - prototype: "define|D="
            count: 2
"#;

    #[test]
    fn test_manifest_defaults() {
        let manifest = Manifest::from_yaml("commands: []").unwrap();
        assert_eq!(manifest.executable, DEFAULT_EXECUTABLE);
        assert!(manifest.commands.is_empty());
    }

    #[test]
    fn test_catalog_records_bindings() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let bindings = Bindings::default();
        let mut catalog = build_catalog(&manifest, &bindings).unwrap();

        let command = catalog.find_mut("p").unwrap();
        let extras = command
            .parse([
                "--apiKey=secret",
                "--packageFormat=zip",
                "-f",
                "--tag",
                "a",
                "--tag=b",
                "-D",
                "k=v",
                "rest",
            ])
            .unwrap();
        assert_eq!(extras, vec!["rest"]);

        let recorded = bindings.borrow();
        assert_eq!(
            recorded["apiKey"],
            Bound::One(Value::String(REDACTED.into()))
        );
        assert_eq!(recorded["packageFormat"], Bound::One(Value::Enum("Zip".into())));
        assert_eq!(recorded["force"], Bound::One(Value::Bool(true)));
        assert_eq!(
            recorded["tag"],
            Bound::Repeated(vec![
                Bound::One(Value::String("a".into())),
                Bound::One(Value::String("b".into())),
            ])
        );
        assert_eq!(
            recorded["define"],
            Bound::Values(vec!["k".into(), "v".into()])
        );
    }

    #[test]
    fn test_enum_without_members_is_rejected() {
        let manifest = Manifest::from_yaml(
            r#"
commands:
  - name: x
    groups:
      - label: G
        options:
          - prototype: "mode="
            type: enum
"#,
        )
        .unwrap();
        let err = build_catalog(&manifest, &Bindings::default()).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidOption { .. }));
    }

    #[test]
    fn test_duplicate_option_names_report_command() {
        let manifest = Manifest::from_yaml(
            r#"
commands:
  - name: x
    groups:
      - label: G
        options:
          - prototype: "help"
"#,
        )
        .unwrap();
        // `help` lives in the common group, a different registry
        assert!(build_catalog(&manifest, &Bindings::default()).is_ok());

        let manifest = Manifest::from_yaml(
            r#"
commands:
  - name: x
    groups:
      - label: G
        options:
          - prototype: "a|b"
          - prototype: "b"
"#,
        )
        .unwrap();
        let err = build_catalog(&manifest, &Bindings::default()).unwrap_err();
        assert_eq!(err.to_string(), "command 'x': duplicate option name: b");
    }
}
