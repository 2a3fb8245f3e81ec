//! Option definitions: names, arity, value kind and the binding callback.

use std::fmt;

use crate::error::{RegistryError, ValueError};
use crate::prototype::{Arity, Prototype};
use crate::value::{OptionValue, Value, ValueKind, convert};

/// Separators used by multi-value options that declare none.
pub const DEFAULT_VALUE_SEPARATORS: [char; 2] = [':', '='];

/// Callback invoked once per appearance with the collected raw values.
pub type CompletionCallback<'a> = Box<dyn FnMut(&[String]) -> Result<(), ValueError> + 'a>;

/// What a scalar binder receives: a flag state or the first raw value.
enum Binding<'v> {
    Flag(bool),
    Raw(&'v str),
}

/// A registered named parameter.
///
/// Construct one from a prototype string (see [`Prototype`]) with
/// [`typed`](Self::typed), [`with_kind`](Self::with_kind),
/// [`flag`](Self::flag) or [`raw`](Self::raw), then add it to an
/// [`OptionSet`](crate::OptionSet).
///
/// # Examples
///
/// ```
/// use optbind_core::{Arity, OptionDefinition};
///
/// let mut url = String::new();
/// let def = OptionDefinition::typed("url|u=", "Server URL", |v: String| url = v)
///     .unwrap()
///     .sensitive();
///
/// assert_eq!(def.primary_name(), "url");
/// assert_eq!(def.arity(), Arity::Required);
/// assert_eq!(def.max_value_count(), 1);
/// assert!(def.is_sensitive());
/// ```
pub struct OptionDefinition<'a> {
    names: Vec<String>,
    prototype: String,
    description: String,
    arity: Arity,
    max_value_count: usize,
    value_separators: Option<Vec<char>>,
    kind: Option<ValueKind>,
    sensitive: bool,
    allows_multiple: bool,
    on_complete: CompletionCallback<'a>,
}

impl<'a> OptionDefinition<'a> {
    /// Creates an option whose callback receives the raw, separator-split
    /// values.
    ///
    /// `max_value_count` must be 0 or 1 for flags and at least 1 for
    /// value-bearing options. Multi-value options without declared
    /// separators split on [`DEFAULT_VALUE_SEPARATORS`].
    ///
    /// # Errors
    ///
    /// Prototype errors, or [`RegistryError::InvalidValueCount`].
    pub fn raw<F>(
        prototype: &str,
        description: &str,
        max_value_count: usize,
        on_complete: F,
    ) -> Result<Self, RegistryError>
    where
        F: FnMut(&[String]) -> Result<(), ValueError> + 'a,
    {
        let parsed = Prototype::parse(prototype)?;
        Self::assemble(
            parsed,
            prototype,
            description,
            max_value_count,
            None,
            Box::new(on_complete),
        )
    }

    /// Creates a single-value option converted to `T` before `setter` runs.
    ///
    /// A prototype without `=`/`:` declares a boolean flag, which requires
    /// `T = bool`.
    ///
    /// # Errors
    ///
    /// Prototype errors, or [`RegistryError::FlagKindMismatch`].
    pub fn typed<T, F>(prototype: &str, description: &str, mut setter: F) -> Result<Self, RegistryError>
    where
        T: OptionValue,
        F: FnMut(T) + 'a,
    {
        Self::scalar(prototype, description, T::kind(), move |binding| {
            let value = match binding {
                Binding::Flag(on) => T::from_value(Value::Bool(on))
                    .ok_or_else(|| ValueError::Invalid("flag cannot bind this type".to_string()))?,
                Binding::Raw(raw) => T::parse_raw(raw)?,
            };
            setter(value);
            Ok(())
        })
    }

    /// Creates a single-value option converted to `kind`; the setter
    /// receives the converted [`Value`].
    ///
    /// # Errors
    ///
    /// Prototype errors, or [`RegistryError::FlagKindMismatch`].
    pub fn with_kind<F>(
        prototype: &str,
        description: &str,
        kind: ValueKind,
        mut setter: F,
    ) -> Result<Self, RegistryError>
    where
        F: FnMut(Value) + 'a,
    {
        let convert_kind = kind.clone();
        Self::scalar(prototype, description, kind, move |binding| {
            let value = match binding {
                Binding::Flag(on) => Value::Bool(on),
                Binding::Raw(raw) => convert(raw, &convert_kind)?,
            };
            setter(value);
            Ok(())
        })
    }

    /// Creates a boolean option. `--name` sets `true`, `--name-` sets `false`.
    ///
    /// # Errors
    ///
    /// Prototype errors.
    pub fn flag<F>(prototype: &str, description: &str, setter: F) -> Result<Self, RegistryError>
    where
        F: FnMut(bool) + 'a,
    {
        Self::typed::<bool, F>(prototype, description, setter)
    }

    fn scalar<F>(
        prototype: &str,
        description: &str,
        kind: ValueKind,
        mut bind: F,
    ) -> Result<Self, RegistryError>
    where
        F: FnMut(Binding<'_>) -> Result<(), ValueError> + 'a,
    {
        let parsed = Prototype::parse(prototype)?;
        if parsed.arity == Arity::None && kind != ValueKind::Bool {
            return Err(RegistryError::FlagKindMismatch {
                prototype: prototype.to_string(),
                type_name: kind.type_name().to_string(),
            });
        }

        let arity = parsed.arity;
        let implicit_true = kind == ValueKind::Bool;
        let on_complete = move |values: &[String]| -> Result<(), ValueError> {
            if !arity.takes_value() {
                return bind(Binding::Flag(!values.is_empty()));
            }
            match values.first() {
                Some(raw) => bind(Binding::Raw(raw)),
                None if implicit_true => bind(Binding::Flag(true)),
                None => Ok(()),
            }
        };

        let count = if arity.takes_value() { 1 } else { 0 };
        Self::assemble(
            parsed,
            prototype,
            description,
            count,
            Some(kind),
            Box::new(on_complete),
        )
    }

    fn assemble(
        parsed: Prototype,
        prototype: &str,
        description: &str,
        max_value_count: usize,
        kind: Option<ValueKind>,
        on_complete: CompletionCallback<'a>,
    ) -> Result<Self, RegistryError> {
        let invalid_count = match parsed.arity {
            Arity::None => max_value_count > 1,
            Arity::Optional | Arity::Required => max_value_count == 0,
        };
        if invalid_count {
            return Err(RegistryError::InvalidValueCount {
                prototype: prototype.to_string(),
                count: max_value_count,
            });
        }

        let max_value_count = if parsed.arity.takes_value() {
            max_value_count
        } else {
            0
        };
        let value_separators = match parsed.separators {
            Some(seps) => Some(seps),
            None if max_value_count > 1 => Some(DEFAULT_VALUE_SEPARATORS.to_vec()),
            None => None,
        };

        Ok(Self {
            names: parsed.names,
            prototype: prototype.to_string(),
            description: description.to_string(),
            arity: parsed.arity,
            max_value_count,
            value_separators,
            kind,
            sensitive: false,
            allows_multiple: false,
            on_complete,
        })
    }

    /// Marks the value as not loggable.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Marks the option as expected to appear more than once.
    pub fn allow_multiple(mut self) -> Self {
        self.allows_multiple = true;
        self
    }

    /// All names; the first is the primary name.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The primary (display) name, without flag marker.
    pub fn primary_name(&self) -> &str {
        &self.names[0]
    }

    /// The prototype string this option was declared with.
    pub fn prototype(&self) -> &str {
        &self.prototype
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Maximum number of values per appearance (0 for flags).
    pub fn max_value_count(&self) -> usize {
        self.max_value_count
    }

    pub fn value_separators(&self) -> Option<&[char]> {
        self.value_separators.as_deref()
    }

    /// Declared value kind; `None` for raw options.
    pub fn kind(&self) -> Option<&ValueKind> {
        self.kind.as_ref()
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn allows_multiple(&self) -> bool {
        self.allows_multiple
    }

    /// Splits one raw token on the value separators, if any.
    pub(crate) fn split_value(&self, raw: &str) -> Vec<String> {
        match &self.value_separators {
            Some(seps) => raw.split(seps.as_slice()).map(str::to_string).collect(),
            None => vec![raw.to_string()],
        }
    }

    /// Runs the binding callback for one completed appearance.
    pub(crate) fn complete(&mut self, values: &[String]) -> Result<(), ValueError> {
        (self.on_complete)(values)
    }
}

impl fmt::Debug for OptionDefinition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDefinition")
            .field("names", &self.names)
            .field("arity", &self.arity)
            .field("max_value_count", &self.max_value_count)
            .field("value_separators", &self.value_separators)
            .field("kind", &self.kind)
            .field("sensitive", &self.sensitive)
            .field("allows_multiple", &self.allows_multiple)
            .finish_non_exhaustive()
    }
}
