//! Completion suggestions for a partially typed command line.
//!
//! The words typed so far are reduced to a [`CompletionContext`]: the
//! search term (last word), whether it is an option search (`--` prefix)
//! and which known sub-commands are present. The context then selects one
//! branch:
//!
//! | option search | sub-command | suggestions                                      |
//! |---------------|-------------|--------------------------------------------------|
//! | yes           | yes         | options of the last sub-command, prefix-filtered |
//! | yes           | no          | options of `help`, prefix-filtered               |
//! | no            | ≤ 1         | command names, prefix-filtered                   |
//! | no            | > 1         | nothing                                          |
//!
//! Prefix filtering ignores case. Output is sorted ignoring case.

use std::cmp::Ordering;
use std::path::Path;

use tracing::debug;

use crate::map::CompletionMap;

/// Marker that turns a search into an option search.
pub const LONG_FLAG_MARKER: &str = "--";

/// Command whose options are offered when no sub-command is typed.
pub const HELP_COMMAND: &str = "help";

/// Default name of the completion sub-command.
pub const COMPLETE_COMMAND: &str = "complete";

/// Names under which the tool itself may appear at the start of the words.
///
/// Shells sometimes pass the invocation line along with the words to
/// complete; up to two leading words matching one of these names are
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationNames {
    executable: String,
    executable_stem: String,
    complete_command: String,
}

impl InvocationNames {
    /// Names derived from an executable path such as `/usr/bin/octo` or
    /// `octo.exe`; the completion sub-command is `complete`.
    pub fn new(executable: &str) -> Self {
        let path = Path::new(executable);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| executable.to_string());
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        Self {
            executable: name,
            executable_stem: stem,
            complete_command: COMPLETE_COMMAND.to_string(),
        }
    }

    /// Overrides the completion sub-command name.
    pub fn with_complete_command(mut self, name: &str) -> Self {
        self.complete_command = name.to_string();
        self
    }

    /// Executable file name, extension included.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn complete_command(&self) -> &str {
        &self.complete_command
    }

    /// Whether `word` names the tool or its completion sub-command.
    pub fn matches(&self, word: &str) -> bool {
        [&self.executable, &self.executable_stem, &self.complete_command]
            .iter()
            .any(|name| name.eq_ignore_ascii_case(word))
    }
}

/// What the typed words ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    /// Last remaining word, empty when nothing remains.
    pub search_term: String,
    /// The search term starts with `--`.
    pub is_option_search: bool,
    /// More than one word remains.
    pub has_sub_command: bool,
    /// Words that are keys of the completion map, in typed order.
    pub sub_commands: Vec<String>,
}

impl CompletionContext {
    /// Classifies `words` against `map`.
    pub fn classify<S: AsRef<str>>(words: &[S], map: &CompletionMap, names: &InvocationNames) -> Self {
        let words = strip_invocation(words, names);
        let search_term = words.last().map(|w| w.to_string()).unwrap_or_default();
        let sub_commands = words
            .iter()
            .filter(|w| is_sub_command(w, map))
            .map(|w| w.to_string())
            .collect();

        Self {
            is_option_search: search_term.starts_with(LONG_FLAG_MARKER),
            has_sub_command: words.len() > 1,
            search_term,
            sub_commands,
        }
    }
}

/// Suggests completions for `words`, sorted ignoring case.
///
/// Never fails: malformed input yields fewer or no suggestions.
///
/// # Examples
///
/// ```
/// use optbind_complete::{CompletionMap, InvocationNames, suggest};
///
/// let map: CompletionMap = [
///     ("help", vec!["--help", "--helpOutputFormat"]),
///     ("test", vec!["--apiKey", "--url"]),
/// ]
/// .into_iter()
/// .collect();
/// let names = InvocationNames::new("octo");
///
/// assert_eq!(suggest(&["he"], &map, &names), vec!["help"]);
/// assert_eq!(suggest(&["octo", "test", "--ap"], &map, &names), vec!["--apiKey"]);
/// ```
pub fn suggest<S: AsRef<str>>(words: &[S], map: &CompletionMap, names: &InvocationNames) -> Vec<String> {
    let context = CompletionContext::classify(words, map, names);
    debug!(
        search_term = %context.search_term,
        option_search = context.is_option_search,
        sub_commands = ?context.sub_commands,
        "classified completion context"
    );

    let mut suggestions = match (context.is_option_search, context.has_sub_command) {
        (true, true) => match context.sub_commands.last() {
            Some(command) => option_suggestions(map, command, &context.search_term),
            None => Vec::new(),
        },
        (true, false) => option_suggestions(map, HELP_COMMAND, &context.search_term),
        (false, _) if context.sub_commands.len() <= 1 => map
            .commands()
            .filter(|c| starts_with_ignore_case(c, &context.search_term))
            .map(str::to_string)
            .collect(),
        (false, _) => Vec::new(),
    };

    suggestions.sort_by(|a, b| compare_ignore_case(a, b));
    suggestions
}

/// Drops invocation names among the first two words, then blank words.
fn strip_invocation<'w, S: AsRef<str>>(words: &'w [S], names: &InvocationNames) -> Vec<&'w str> {
    words
        .iter()
        .map(|w| w.as_ref())
        .enumerate()
        .filter(|(i, word)| *i >= 2 || !names.matches(word))
        .map(|(_, word)| word)
        .filter(|word| !word.trim().is_empty())
        .collect()
}

fn is_sub_command(word: &str, map: &CompletionMap) -> bool {
    !word.starts_with(LONG_FLAG_MARKER) && map.contains_command(word)
}

fn option_suggestions(map: &CompletionMap, command: &str, search_term: &str) -> Vec<String> {
    map.options(command)
        .unwrap_or_default()
        .iter()
        .filter(|name| starts_with_ignore_case(name, search_term))
        .cloned()
        .collect()
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
