//! Help output: aligned option descriptions and serializable descriptors.
//!
//! Descriptions may name their value with a placeholder: `{NAME}` for a
//! single-value option, `{0:FIRST}` / `{1:SECOND}` for multi-value ones.
//! The placeholder text becomes the argument name in the option column and
//! renders as the bare name inside the description. `{{` and `}}` escape
//! literal braces.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::definition::OptionDefinition;
use crate::options::Options;
use crate::prototype::Arity;
use crate::registry::OptionSet;

/// Column at which descriptions start.
pub const OPTION_WIDTH: usize = 29;
/// Total line width descriptions are wrapped to.
pub const LINE_WIDTH: usize = 80;

const BREAK_CHARS: [char; 5] = [' ', '-', ',', '.', ';'];

/// Serializable help for one option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OptionGroupHelp {
    pub group: String,
    pub parameters: Vec<ParameterHelp>,
}

/// Serializable help for one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterHelp {
    pub name: String,
    pub usage: String,
    pub description: String,
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allows_multiple: bool,
    /// Non-deprecated members, for enumerations only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ParameterHelp {
    pub fn from_definition(option: &OptionDefinition<'_>) -> Self {
        Self {
            name: option.primary_name().to_string(),
            usage: usage(option.prototype()),
            description: option.description().to_string(),
            type_name: option
                .kind()
                .map_or_else(|| "String".to_string(), |k| k.type_name().to_string()),
            sensitive: option.is_sensitive(),
            allows_multiple: option.allows_multiple(),
            values: option.kind().and_then(|k| k.valid_values()),
        }
    }
}

impl Options<'_> {
    /// Help descriptors for every group, ordered by label descending.
    ///
    /// # Examples
    ///
    /// ```
    /// use optbind_core::Options;
    ///
    /// let mut options = Options::new();
    /// options.group("Common options").add_typed("help", "Print help", |_: bool| {}).unwrap();
    /// options.group("Test options").add_typed("url=", "Server URL", |_: String| {}).unwrap();
    ///
    /// let groups = options.describe();
    /// assert_eq!(groups[0].group, "Test options");
    /// assert_eq!(groups[0].parameters[0].usage, "--url=VALUE");
    /// assert_eq!(groups[1].parameters[0].usage, "--help");
    /// ```
    pub fn describe(&self) -> Vec<OptionGroupHelp> {
        let mut groups: Vec<OptionGroupHelp> = self
            .groups()
            .map(|(label, set)| OptionGroupHelp {
                group: label.to_string(),
                parameters: set.iter().map(ParameterHelp::from_definition).collect(),
            })
            .collect();
        groups.sort_by(|a, b| b.group.cmp(&a.group));
        groups
    }
}

/// Usage form of a prototype: `-x`, `--name` or `--name=VALUE`.
fn usage(prototype: &str) -> String {
    let marker = if prototype.chars().count() == 1 { "-" } else { "--" };
    let value = if prototype.ends_with('=') { "VALUE" } else { "" };
    format!("{marker}{prototype}{value}")
}

/// Writes every option of `set`, one aligned entry each.
///
/// # Errors
///
/// I/O errors from `out`.
pub fn write_option_descriptions<W: Write>(set: &OptionSet<'_>, out: &mut W) -> io::Result<()> {
    for option in set.iter() {
        let prototype = option_prototype(option);
        let lines = wrap(&render_description(option.description()), LINE_WIDTH - OPTION_WIDTH);

        let written = prototype.chars().count();
        if lines.iter().all(String::is_empty) {
            writeln!(out, "{prototype}")?;
            continue;
        }
        if written < OPTION_WIDTH {
            write!(out, "{prototype}{}", " ".repeat(OPTION_WIDTH - written))?;
        } else {
            writeln!(out, "{prototype}")?;
            write!(out, "{}", " ".repeat(OPTION_WIDTH))?;
        }

        let mut lines = lines.iter();
        if let Some(first) = lines.next() {
            writeln!(out, "{first}")?;
        }
        for line in lines {
            writeln!(out, "{}{line}", " ".repeat(OPTION_WIDTH))?;
        }
    }
    Ok(())
}

/// Writes every group as `Label:` followed by its option descriptions,
/// latest group first.
///
/// # Errors
///
/// I/O errors from `out`.
pub fn write_options<W: Write>(options: &Options<'_>, out: &mut W) -> io::Result<()> {
    let groups: Vec<_> = options.groups().collect();
    for (label, set) in groups.into_iter().rev() {
        writeln!(out, "{label}:")?;
        writeln!(out)?;
        write_option_descriptions(set, out)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Option column: `  -x, --long=VALUE` or `      --long[=VALUE]`.
fn option_prototype(option: &OptionDefinition<'_>) -> String {
    let names = option.names();
    let mut line = if names[0].chars().count() == 1 {
        format!("  -{}", names[0])
    } else {
        format!("      --{}", names[0])
    };
    for name in &names[1..] {
        let marker = if name.chars().count() == 1 { "-" } else { "--" };
        line.push_str(&format!(", {marker}{name}"));
    }

    if option.arity().takes_value() {
        let optional = option.arity() == Arity::Optional;
        let max = option.max_value_count();
        if optional {
            line.push('[');
        }
        line.push('=');
        line.push_str(&argument_name(0, max, option.description()));
        let sep = option
            .value_separators()
            .and_then(|s| s.first().copied())
            .unwrap_or(' ');
        for index in 1..max {
            line.push(sep);
            line.push_str(&argument_name(index, max, option.description()));
        }
        if optional {
            line.push(']');
        }
    }
    line
}

/// Argument name for value `index` of `max`, taken from a description
/// placeholder when there is one.
fn argument_name(index: usize, max: usize, description: &str) -> String {
    let starts = if max == 1 {
        vec!["{0:".to_string(), "{".to_string()]
    } else {
        vec![format!("{{{index}:")]
    };

    for start in &starts {
        let Some(begin) = find_placeholder(description, start) else {
            continue;
        };
        let content = &description[begin + start.len()..];
        if let Some(end) = content.find('}') {
            return content[..end].to_string();
        }
    }

    if max == 1 {
        "VALUE".to_string()
    } else {
        format!("VALUE{}", index + 1)
    }
}

/// Finds `start` in `text`, skipping brace pairs escaped as `{{`.
fn find_placeholder(text: &str, start: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if bytes.get(i + 1) == Some(&b'{') {
                i += 2;
                continue;
            }
            if text[i..].starts_with(start) {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Replaces placeholders with their names and unescapes `{{` / `}}`.
fn render_description(description: &str) -> String {
    let chars: Vec<char> = description.chars().collect();
    let mut out = String::with_capacity(description.len());
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => match start {
                Some(s) if s == i => {
                    out.push('{');
                    start = None;
                }
                None => start = Some(i + 1),
                Some(_) => {}
            },
            '}' => match start {
                Some(s) => {
                    out.extend(&chars[s..i]);
                    start = None;
                }
                None => {
                    if chars.get(i + 1) == Some(&'}') {
                        i += 1;
                    }
                    out.push('}');
                }
            },
            ':' if start.is_some() => start = Some(i + 1),
            _ if start.is_some() => {}
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Greedy wrap at `width` columns, breaking after spaces and punctuation.
/// Words longer than a line are split with a trailing `-`.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let chars: Vec<char> = paragraph.chars().collect();
        let mut rest = &chars[..];
        while rest.len() > width {
            match rest[..width].iter().rposition(|c| BREAK_CHARS.contains(c)) {
                Some(pos) => {
                    let (line, tail) = rest.split_at(pos + 1);
                    lines.push(line.iter().collect::<String>().trim_end().to_string());
                    rest = tail;
                }
                None => {
                    let (line, tail) = rest.split_at(width - 1);
                    lines.push(format!("{}-", line.iter().collect::<String>()));
                    rest = tail;
                }
            }
            while rest.first() == Some(&' ') {
                rest = &rest[1..];
            }
        }
        lines.push(rest.iter().collect());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{EnumKind, ValueKind};

    #[test]
    fn test_write_option_descriptions() {
        let mut set = OptionSet::new();
        set.add_typed("help|h", "Print help for a command", |_: bool| {}).unwrap();
        set.add_typed("url=", "The {URL} to connect to", |_: String| {}).unwrap();
        set.add_typed("o|output:", "Output file", |_: String| {}).unwrap();

        let mut out = Vec::new();
        write_option_descriptions(&set, &mut out).unwrap();

        let expected = format!(
            "{:<29}Print help for a command\n{:<29}The URL to connect to\n{:<29}Output file\n",
            "      --help, -h", "      --url=URL", "  -o, --output[=VALUE]"
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_long_prototype_moves_description_to_next_line() {
        let mut set = OptionSet::new();
        set.add_typed("averyveryverylongoptionname=", "Desc", |_: String| {})
            .unwrap();

        let mut out = Vec::new();
        write_option_descriptions(&set, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("      --averyveryverylongoptionname=VALUE\n{}Desc\n", " ".repeat(29))
        );
    }

    #[test]
    fn test_multi_value_argument_names() {
        let mut set = OptionSet::new();
        set.add(OptionDefinition::raw("define|D={=}", "Define {0:KEY} as {1:VAL}", 2, |_| Ok(())).unwrap())
            .unwrap();
        let option = set.get("D").unwrap();
        assert_eq!(option_prototype(option), "      --define, -D=KEY=VAL");
        assert_eq!(render_description(option.description()), "Define KEY as VAL");
    }

    #[test]
    fn test_default_argument_names() {
        assert_eq!(argument_name(0, 1, "plain"), "VALUE");
        assert_eq!(argument_name(1, 3, "plain"), "VALUE2");
        assert_eq!(argument_name(0, 1, "literal {{braces}}"), "VALUE");
        assert_eq!(argument_name(0, 1, "escaped {{{NAME}"), "NAME");
    }

    #[test]
    fn test_escaped_brace_before_multibyte_char() {
        assert_eq!(argument_name(0, 1, "{{{é"), "VALUE");

        let mut set = OptionSet::new();
        set.add_typed("name=", "{{{é", |_: String| {}).unwrap();
        let mut out = Vec::new();
        write_option_descriptions(&set, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("      --name=VALUE"));
    }

    #[test]
    fn test_render_description_escapes() {
        assert_eq!(render_description("use {{x}} here"), "use {x} here");
        assert_eq!(render_description("the {0:NAME} arg"), "the NAME arg");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("alpha beta gamma", 11), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abc-", "def-", "ghij"]);
        assert_eq!(wrap("one\ntwo", 10), vec!["one", "two"]);
    }

    #[test]
    fn test_write_options_lists_groups_latest_first() {
        let mut options = Options::new();
        options.group("Common options").add_typed("help", "Help", |_: bool| {}).unwrap();
        options.group("Run options").add_typed("fast", "Fast", |_: bool| {}).unwrap();

        let mut out = Vec::new();
        write_options(&options, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("Run options:").unwrap() < text.find("Common options:").unwrap());
    }

    #[test]
    fn test_describe_serializes_enum_members_and_flags() {
        let kind = ValueKind::Enumeration(
            EnumKind::new("PackageFormat")
                .member("Zip")
                .member("NuPkg")
                .deprecated_member("Nuget"),
        );
        let mut options = Options::new();
        options
            .group("Pack")
            .add(
                OptionDefinition::with_kind("packageFormat=", "Format", kind, |_| {})
                    .unwrap()
                    .allow_multiple(),
            )
            .unwrap();
        options
            .group("Pack")
            .add(OptionDefinition::typed("apiKey=", "Key", |_: String| {}).unwrap().sensitive())
            .unwrap();

        let json = serde_json::to_value(options.describe()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "Group": "Pack",
                "Parameters": [
                    {
                        "Name": "packageFormat",
                        "Usage": "--packageFormat=VALUE",
                        "Description": "Format",
                        "Type": "PackageFormat",
                        "AllowsMultiple": true,
                        "Values": ["Zip", "NuPkg"]
                    },
                    {
                        "Name": "apiKey",
                        "Usage": "--apiKey=VALUE",
                        "Description": "Key",
                        "Type": "String",
                        "Sensitive": true
                    }
                ]
            }])
        );
    }
}
