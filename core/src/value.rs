//! Value kinds and string-to-value conversion.
//!
//! Conversion is a closed table: every option declares one [`ValueKind`] and
//! [`convert`] dispatches on it explicitly. Enumerations carry their member
//! table with them, so no type introspection is needed to validate input or
//! to list the valid members in an error message.

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// One member of an enumeration kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Member name as declared (matched case-insensitively).
    pub name: String,
    /// Deprecated members are never accepted and never listed.
    #[serde(default)]
    pub deprecated: bool,
}

/// An enumeration type: a name plus its members in declaration order.
///
/// # Examples
///
/// ```
/// use optbind_core::EnumKind;
///
/// let kind = EnumKind::new("PackageFormat")
///     .member("Zip")
///     .member("NuPkg")
///     .deprecated_member("Nuget");
///
/// assert_eq!(kind.valid_names(), vec!["Zip".to_string(), "NuPkg".to_string()]);
/// assert_eq!(kind.lookup("nupkg"), Some("NuPkg"));
/// assert_eq!(kind.lookup("Nuget"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumKind {
    /// Type name used in error messages and help output.
    pub name: String,
    /// Members in declaration order.
    pub members: Vec<EnumMember>,
}

impl EnumKind {
    /// Creates an enumeration with no members.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
        }
    }

    /// Appends a member.
    pub fn member(mut self, name: &str) -> Self {
        self.members.push(EnumMember {
            name: name.to_string(),
            deprecated: false,
        });
        self
    }

    /// Appends a deprecated member.
    pub fn deprecated_member(mut self, name: &str) -> Self {
        self.members.push(EnumMember {
            name: name.to_string(),
            deprecated: true,
        });
        self
    }

    /// Returns the non-deprecated member names in declaration order.
    pub fn valid_names(&self) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| !m.deprecated)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Finds the canonical name of a non-deprecated member, ignoring case.
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.members
            .iter()
            .filter(|m| !m.deprecated)
            .find(|m| m.name.eq_ignore_ascii_case(raw))
            .map(|m| m.name.as_str())
    }
}

/// The closed set of types an option value can be converted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// `true` / `false`, case-insensitive.
    Bool,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// The raw string, unchanged.
    String,
    /// One member of an enumeration.
    Enumeration(EnumKind),
}

impl ValueKind {
    /// Type name used in conversion errors and help descriptors.
    pub fn type_name(&self) -> &str {
        match self {
            ValueKind::Bool => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
            ValueKind::Enumeration(kind) => &kind.name,
        }
    }

    /// Non-deprecated members for enumerations, `None` otherwise.
    pub fn valid_values(&self) -> Option<Vec<String>> {
        match self {
            ValueKind::Enumeration(kind) => Some(kind.valid_names()),
            _ => None,
        }
    }

    fn conversion_error(&self, raw: &str) -> ValueError {
        ValueError::Conversion {
            value: raw.to_string(),
            type_name: self.type_name().to_string(),
            valid_values: self.valid_values().unwrap_or_default(),
        }
    }
}

/// A converted option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Canonical member name of an enumeration.
    Enum(String),
}

/// Converts a raw bound string to `kind`.
///
/// # Errors
///
/// Returns [`ValueError::Conversion`] naming the raw value and the type. For
/// enumerations the error lists the non-deprecated members.
///
/// # Examples
///
/// ```
/// use optbind_core::{convert, Value, ValueKind};
///
/// assert_eq!(convert("42", &ValueKind::Integer).unwrap(), Value::Integer(42));
/// assert_eq!(convert("TRUE", &ValueKind::Bool).unwrap(), Value::Bool(true));
/// assert!(convert("forty-two", &ValueKind::Integer).is_err());
/// ```
pub fn convert(raw: &str, kind: &ValueKind) -> Result<Value, ValueError> {
    match kind {
        ValueKind::Bool => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(kind.conversion_error(raw))
            }
        }
        ValueKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| kind.conversion_error(raw)),
        ValueKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| kind.conversion_error(raw)),
        ValueKind::String => Ok(Value::String(raw.to_string())),
        ValueKind::Enumeration(enum_kind) => enum_kind
            .lookup(raw)
            .map(|name| Value::Enum(name.to_string()))
            .ok_or_else(|| kind.conversion_error(raw)),
    }
}

/// Rust types that can be bound from an option value.
///
/// Implemented for the common scalars. Enumerations implement it by hand:
///
/// ```
/// use optbind_core::{EnumKind, OptionValue, Value, ValueKind};
///
/// #[derive(Debug, PartialEq)]
/// enum OutputFormat {
///     Default,
///     Json,
/// }
///
/// impl OptionValue for OutputFormat {
///     fn kind() -> ValueKind {
///         ValueKind::Enumeration(EnumKind::new("OutputFormat").member("Default").member("Json"))
///     }
///
///     fn from_value(value: Value) -> Option<Self> {
///         match value {
///             Value::Enum(name) if name == "Default" => Some(OutputFormat::Default),
///             Value::Enum(name) if name == "Json" => Some(OutputFormat::Json),
///             _ => None,
///         }
///     }
/// }
///
/// assert_eq!(OutputFormat::parse_raw("json").unwrap(), OutputFormat::Json);
/// ```
pub trait OptionValue: Sized {
    /// The kind raw strings are converted to before [`from_value`](Self::from_value).
    fn kind() -> ValueKind;

    /// Narrows a converted value. `None` is reported as a conversion failure.
    fn from_value(value: Value) -> Option<Self>;

    /// Converts a raw string straight to `Self`.
    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        let kind = Self::kind();
        let value = convert(raw, &kind)?;
        Self::from_value(value).ok_or_else(|| kind.conversion_error(raw))
    }
}

impl OptionValue for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl OptionValue for String {
    fn kind() -> ValueKind {
        ValueKind::String
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! integer_option_value {
    ($($ty:ty),*) => {
        $(
            impl OptionValue for $ty {
                fn kind() -> ValueKind {
                    ValueKind::Integer
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::Integer(n) => <$ty>::try_from(n).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_option_value!(i32, i64, u16, u32, u64, usize);

impl OptionValue for f64 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl OptionValue for f32 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) if f.is_finite() && f.abs() > f64::from(f32::MAX) => None,
            Value::Float(f) => Some(f as f32),
            _ => None,
        }
    }
}
