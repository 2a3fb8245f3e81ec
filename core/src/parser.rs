//! The token-by-token parsing engine.
//!
//! Parsing is a finite-state machine over three states:
//!
//! - [`State::ScanningFlags`]: tokens are classified as flags, bundles,
//!   negations, the `--` terminator or extras.
//! - [`State::ConsumingValue`]: a value-bearing option is waiting for values;
//!   the next token is taken as a raw value whatever it looks like.
//! - [`State::Passthrough`]: entered after `--`; every remaining token is an
//!   extra. There is no way back.
//!
//! [`classify`] and [`transition`] are pure: they read the registries and
//! return what should happen. [`ParseContext`] applies the resulting
//! [`Action`]s, which is the only place binding callbacks run.
//!
//! # Examples
//!
//! ```
//! use optbind_core::{OptionSet, ParseContext, State};
//!
//! let mut url = String::new();
//! {
//!     let mut set = OptionSet::new();
//!     set.add_typed("url=", "Server URL", |v: String| url = v).unwrap();
//!
//!     let mut sets = [set];
//!     let mut ctx = ParseContext::new();
//!     ctx.step(&mut sets, "--url").unwrap();
//!     assert!(matches!(ctx.state(), State::ConsumingValue(_)));
//!     ctx.step(&mut sets, "https://example.test").unwrap();
//!     assert_eq!(ctx.state(), &State::ScanningFlags);
//!     assert!(ctx.finish(&mut sets).unwrap().is_empty());
//! }
//! assert_eq!(url, "https://example.test");
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::definition::OptionDefinition;
use crate::error::{ParseError, Result};
use crate::prototype::Arity;
use crate::registry::OptionSet;

/// Placeholder logged instead of the values of sensitive options.
pub const REDACTED: &str = "********";

/// `(flag marker)(name)` with an optional `(separator)(inline value)`.
static FLAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<flag>--|-|/)(?P<name>[^:=]+)(?:(?P<sep>[:=])(?P<value>.*))?$")
        .expect("static regex must compile")
});

/// Address of an option: registry (group) index plus position in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionRef {
    pub group: usize,
    pub index: usize,
}

/// A value-bearing option waiting for its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub option: OptionRef,
    /// The option as typed on the command line, marker included.
    pub display: String,
    pub values: Vec<String>,
}

/// Parser state between two tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    ScanningFlags,
    ConsumingValue(Pending),
    Passthrough,
}

/// One member of a short-option bundle such as `-xvf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleItem {
    pub option: OptionRef,
    /// `-` followed by the bundled character.
    pub display: String,
    /// Rest of the token, for the value-bearing member that ends the bundle.
    pub inline: Option<String>,
}

/// How a token reads while scanning for flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClass {
    /// Literal `--`.
    Terminator,
    /// A registered option name (matched ignoring case).
    Named {
        option: OptionRef,
        display: String,
        inline: Option<String>,
    },
    /// A boolean option with a `+` or `-` suffix.
    Negated {
        option: OptionRef,
        display: String,
        enabled: bool,
    },
    /// Short options packed behind one `-`.
    Bundle(Vec<BundleItem>),
    /// Anything else.
    Extra,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run the option's completion callback with these values.
    Bind {
        option: OptionRef,
        display: String,
        values: Vec<String>,
    },
    /// Collect the token as an extra.
    Extra(String),
}

/// Result of feeding one token to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: State,
    pub actions: Vec<Action>,
}

impl Transition {
    fn stay(next: State) -> Self {
        Self {
            next,
            actions: Vec::new(),
        }
    }

    fn extra(next: State, token: &str) -> Self {
        Self {
            next,
            actions: vec![Action::Extra(token.to_string())],
        }
    }

    fn bind(option: OptionRef, display: String, values: Vec<String>) -> Self {
        Self {
            next: State::ScanningFlags,
            actions: vec![Action::Bind {
                option,
                display,
                values,
            }],
        }
    }
}

/// Classifies a token read while scanning for flags.
///
/// Registries are searched in order. The exact-name lookup ignores case;
/// negation and bundling look names up with exact case.
///
/// # Errors
///
/// [`ParseError::UnregisteredBundledOption`] when a bundle contains an
/// unregistered character after its first position.
pub fn classify(sets: &[OptionSet<'_>], token: &str) -> Result<TokenClass> {
    if token == "--" {
        return Ok(TokenClass::Terminator);
    }
    let Some(caps) = FLAG_PATTERN.captures(token) else {
        return Ok(TokenClass::Extra);
    };
    let flag = caps.name("flag").map_or("", |m| m.as_str());
    let name = caps.name("name").map_or("", |m| m.as_str());

    if let Some(option) = find_ignore_case(sets, name) {
        return Ok(TokenClass::Named {
            option,
            display: format!("{flag}{name}"),
            inline: caps
                .name("sep")
                .map(|_| caps.name("value").map_or("", |m| m.as_str()).to_string()),
        });
    }

    if let Some((option, enabled)) = find_negated(sets, name) {
        return Ok(TokenClass::Negated {
            option,
            display: format!("{flag}{name}"),
            enabled,
        });
    }

    if flag == "-" {
        return classify_bundle(sets, &token[1..]);
    }
    Ok(TokenClass::Extra)
}

fn classify_bundle(sets: &[OptionSet<'_>], text: &str) -> Result<TokenClass> {
    let mut items = Vec::new();
    for (i, c) in text.char_indices() {
        let mut buf = [0u8; 4];
        let Some(option) = find_exact(sets, c.encode_utf8(&mut buf)) else {
            if i == 0 {
                return Ok(TokenClass::Extra);
            }
            return Err(ParseError::UnregisteredBundledOption {
                option: format!("-{c}"),
            });
        };

        let takes_value = definition(sets, option).arity().takes_value();
        let rest = &text[i + c.len_utf8()..];
        items.push(BundleItem {
            option,
            display: format!("-{c}"),
            inline: (takes_value && !rest.is_empty()).then(|| rest.to_string()),
        });
        if takes_value {
            break;
        }
    }
    Ok(TokenClass::Bundle(items))
}

/// Computes the next state for `token` without running any callback.
///
/// # Errors
///
/// [`ParseError::TooManyValues`] when a token yields more values than the
/// pending option accepts, or a bundle error from [`classify`].
pub fn transition(sets: &[OptionSet<'_>], state: State, token: &str) -> Result<Transition> {
    match state {
        State::Passthrough => Ok(Transition::extra(State::Passthrough, token)),
        State::ConsumingValue(pending) => accept_value(sets, pending, Some(token)),
        State::ScanningFlags => match classify(sets, token)? {
            TokenClass::Terminator => Ok(Transition::stay(State::Passthrough)),
            TokenClass::Extra => Ok(Transition::extra(State::ScanningFlags, token)),
            TokenClass::Named {
                option,
                display,
                inline,
            } => {
                let def = definition(sets, option);
                if !def.arity().takes_value() {
                    let name = display.trim_start_matches(['-', '/']).to_string();
                    return Ok(Transition::bind(option, display, vec![name]));
                }
                let pending = Pending {
                    option,
                    display,
                    values: Vec::new(),
                };
                accept_value(sets, pending, inline.as_deref())
            }
            TokenClass::Negated {
                option,
                display,
                enabled,
            } => {
                let values = if enabled { vec![display.clone()] } else { Vec::new() };
                Ok(Transition::bind(option, display, values))
            }
            TokenClass::Bundle(items) => {
                let mut actions = Vec::new();
                for item in items {
                    if definition(sets, item.option).arity().takes_value() {
                        let pending = Pending {
                            option: item.option,
                            display: item.display,
                            values: Vec::new(),
                        };
                        let mut tail = accept_value(sets, pending, item.inline.as_deref())?;
                        actions.append(&mut tail.actions);
                        return Ok(Transition {
                            next: tail.next,
                            actions,
                        });
                    }
                    let name = item.display[1..].to_string();
                    actions.push(Action::Bind {
                        option: item.option,
                        display: item.display,
                        values: vec![name],
                    });
                }
                Ok(Transition {
                    next: State::ScanningFlags,
                    actions,
                })
            }
        },
    }
}

/// Appends `raw` (split on the option's separators) and decides whether the
/// option is complete.
fn accept_value(sets: &[OptionSet<'_>], mut pending: Pending, raw: Option<&str>) -> Result<Transition> {
    let def = definition(sets, pending.option);
    if let Some(raw) = raw {
        pending.values.extend(def.split_value(raw));
    }

    let count = pending.values.len();
    let max = def.max_value_count();
    if count > max {
        return Err(ParseError::TooManyValues {
            option: pending.display,
            found: count,
            expected: max,
        });
    }
    if count == max || (def.arity() == Arity::Optional && count >= 1) {
        return Ok(Transition::bind(pending.option, pending.display, pending.values));
    }
    Ok(Transition::stay(State::ConsumingValue(pending)))
}

/// Per-parse cursor. Create one per parse call and drop it afterwards.
#[derive(Debug, Default)]
pub struct ParseContext {
    token_index: usize,
    state: State,
    extras: Vec<String>,
    last_token: String,
    seen: HashSet<OptionRef>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Number of tokens consumed so far.
    pub fn token_index(&self) -> usize {
        self.token_index
    }

    /// The most recently consumed token.
    pub fn last_token(&self) -> &str {
        &self.last_token
    }

    /// Extras collected so far.
    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    /// Feeds one token and runs any callback it completes.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`]; the context must not be reused afterwards.
    pub fn step(&mut self, sets: &mut [OptionSet<'_>], token: &str) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let Transition { next, actions } = transition(sets, state, token)?;
        trace!(
            index = self.token_index,
            state = state_name(&next),
            actions = actions.len(),
            "consumed token"
        );

        self.token_index += 1;
        self.last_token = token.to_string();
        self.state = next;
        for action in actions {
            self.apply(sets, action)?;
        }
        Ok(())
    }

    /// Ends the parse and returns the extras.
    ///
    /// An option still waiting for values is flushed: a Required option that
    /// never received one is an error, anything else completes with the
    /// values collected so far.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingRequiredValue`], or a conversion error from the
    /// flushed option.
    pub fn finish(mut self, sets: &mut [OptionSet<'_>]) -> Result<Vec<String>> {
        if let State::ConsumingValue(pending) = std::mem::take(&mut self.state) {
            let def = definition(sets, pending.option);
            if def.arity() == Arity::Required && pending.values.is_empty() {
                return Err(ParseError::MissingRequiredValue {
                    option: pending.display,
                });
            }
            self.apply(
                sets,
                Action::Bind {
                    option: pending.option,
                    display: pending.display,
                    values: pending.values,
                },
            )?;
        }
        debug!(tokens = self.token_index, extras = self.extras.len(), "parse finished");
        Ok(self.extras)
    }

    fn apply(&mut self, sets: &mut [OptionSet<'_>], action: Action) -> Result<()> {
        match action {
            Action::Extra(token) => self.extras.push(token),
            Action::Bind {
                option,
                display: shown,
                values,
            } => {
                let def = sets[option.group].at_mut(option);
                if !self.seen.insert(option) && !def.allows_multiple() {
                    debug!(option = %shown, "option repeated, rebinding");
                }
                if def.is_sensitive() {
                    debug!(option = %shown, values = REDACTED, "binding option");
                } else {
                    debug!(option = %shown, values = ?values, "binding option");
                }
                def.complete(&values)
                    .map_err(|err| ParseError::from_value_error(&shown, err))?;
            }
        }
        Ok(())
    }
}

/// Parses `tokens` against `sets` and returns the extras.
pub(crate) fn parse_tokens<I, S>(sets: &mut [OptionSet<'_>], tokens: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ctx = ParseContext::new();
    for token in tokens {
        ctx.step(sets, token.as_ref())?;
    }
    ctx.finish(sets)
}

fn state_name(state: &State) -> &'static str {
    match state {
        State::ScanningFlags => "scanning",
        State::ConsumingValue(_) => "consuming",
        State::Passthrough => "passthrough",
    }
}

fn definition<'s, 'a>(sets: &'s [OptionSet<'a>], option: OptionRef) -> &'s OptionDefinition<'a> {
    sets[option.group].at(option)
}

fn find_exact(sets: &[OptionSet<'_>], name: &str) -> Option<OptionRef> {
    sets.iter().enumerate().find_map(|(group, set)| {
        set.position(name).map(|index| OptionRef { group, index })
    })
}

fn find_ignore_case(sets: &[OptionSet<'_>], name: &str) -> Option<OptionRef> {
    sets.iter().enumerate().find_map(|(group, set)| {
        set.position_ignore_case(name)
            .map(|index| OptionRef { group, index })
    })
}

/// `name+` / `name-` for a registered boolean `name`.
fn find_negated(sets: &[OptionSet<'_>], name: &str) -> Option<(OptionRef, bool)> {
    let enabled = match name.chars().last()? {
        '+' => true,
        '-' => false,
        _ => return None,
    };
    let base = &name[..name.len() - 1];
    if base.is_empty() {
        return None;
    }
    let option = find_exact(sets, base)?;
    (definition(sets, option).arity() == Arity::None).then_some((option, enabled))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'w> MakeWriter<'w> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'w self) -> Self::Writer {
            self.clone()
        }
    }

    fn registry() -> OptionSet<'static> {
        let mut set = OptionSet::new();
        set.add(OptionDefinition::flag("force|f", "", |_| {}).unwrap()).unwrap();
        set.add(OptionDefinition::typed("output|o=", "", |_: String| {}).unwrap())
            .unwrap();
        set.add(OptionDefinition::typed("color:", "", |_: String| {}).unwrap())
            .unwrap();
        set
    }

    fn at(index: usize) -> OptionRef {
        OptionRef { group: 0, index }
    }

    #[test]
    fn test_classify_named_ignores_case_and_keeps_inline() {
        let sets = [registry()];
        assert_eq!(
            classify(&sets, "--OUTPUT=out.txt").unwrap(),
            TokenClass::Named {
                option: at(1),
                display: "--OUTPUT".into(),
                inline: Some("out.txt".into()),
            }
        );
        assert_eq!(
            classify(&sets, "/force").unwrap(),
            TokenClass::Named {
                option: at(0),
                display: "/force".into(),
                inline: None,
            }
        );
    }

    #[test]
    fn test_classify_empty_inline_value() {
        let sets = [registry()];
        assert!(matches!(
            classify(&sets, "--color=").unwrap(),
            TokenClass::Named { inline: Some(ref v), .. } if v.is_empty()
        ));
    }

    #[test]
    fn test_classify_negation() {
        let sets = [registry()];
        assert_eq!(
            classify(&sets, "--force-").unwrap(),
            TokenClass::Negated {
                option: at(0),
                display: "--force-".into(),
                enabled: false,
            }
        );
        assert!(matches!(
            classify(&sets, "-f+").unwrap(),
            TokenClass::Negated { enabled: true, .. }
        ));
        // value-bearing options are never negated
        assert_eq!(classify(&sets, "--color-").unwrap(), TokenClass::Extra);
    }

    #[test]
    fn test_classify_bundle_stops_at_value_option() {
        let sets = [registry()];
        assert_eq!(
            classify(&sets, "-foVALUE").unwrap(),
            TokenClass::Bundle(vec![
                BundleItem {
                    option: at(0),
                    display: "-f".into(),
                    inline: None,
                },
                BundleItem {
                    option: at(1),
                    display: "-o".into(),
                    inline: Some("VALUE".into()),
                },
            ])
        );
    }

    #[test]
    fn test_classify_bundle_unknown_first_char_is_extra() {
        let sets = [registry()];
        assert_eq!(classify(&sets, "-xf").unwrap(), TokenClass::Extra);
        assert_eq!(
            classify(&sets, "-fx").unwrap_err(),
            ParseError::UnregisteredBundledOption {
                option: "-x".into()
            }
        );
    }

    #[test]
    fn test_classify_plain_tokens() {
        let sets = [registry()];
        assert_eq!(classify(&sets, "--").unwrap(), TokenClass::Terminator);
        assert_eq!(classify(&sets, "-").unwrap(), TokenClass::Extra);
        assert_eq!(classify(&sets, "deploy").unwrap(), TokenClass::Extra);
        assert_eq!(classify(&sets, "--unknown").unwrap(), TokenClass::Extra);
    }

    #[test]
    fn test_transition_trace() {
        let sets = [registry()];

        let t = transition(&sets, State::ScanningFlags, "-o").unwrap();
        assert!(t.actions.is_empty());
        let State::ConsumingValue(pending) = t.next.clone() else {
            panic!("expected value-consuming state, got {:?}", t.next);
        };
        assert_eq!(pending.display, "-o");

        // the pending option takes the next token even if it looks like a flag
        let t = transition(&sets, t.next, "--force").unwrap();
        assert_eq!(t.next, State::ScanningFlags);
        assert_eq!(
            t.actions,
            vec![Action::Bind {
                option: at(1),
                display: "-o".into(),
                values: vec!["--force".into()],
            }]
        );

        let t = transition(&sets, State::ScanningFlags, "--").unwrap();
        assert_eq!(t.next, State::Passthrough);
        let t = transition(&sets, t.next, "--force").unwrap();
        assert_eq!(t.next, State::Passthrough);
        assert_eq!(t.actions, vec![Action::Extra("--force".into())]);
    }

    #[test]
    fn test_too_many_values_from_separators() {
        let mut set = OptionSet::new();
        set.add(OptionDefinition::raw("pair=", "", 2, |_| Ok(())).unwrap())
            .unwrap();
        let sets = [set];

        let err = transition(&sets, State::ScanningFlags, "--pair=a:b:c").unwrap_err();
        assert_eq!(
            err,
            ParseError::TooManyValues {
                option: "--pair".into(),
                found: 3,
                expected: 2,
            }
        );
    }

    #[test]
    fn test_multi_value_option_collects_across_tokens() {
        let collected = RefCell::new(Vec::new());
        {
            let mut set = OptionSet::new();
            set.add(
                OptionDefinition::raw("define|D=", "", 2, |values| {
                    collected.borrow_mut().push(values.to_vec());
                    Ok(())
                })
                .unwrap(),
            )
            .unwrap();
            let extras = set.parse(["-D", "key", "value", "rest"]).unwrap();
            assert_eq!(extras, vec!["rest"]);
        }
        assert_eq!(
            collected.into_inner(),
            vec![vec!["key".to_string(), "value".to_string()]]
        );
    }

    #[test]
    fn test_optional_completes_on_first_value() {
        let mut color = None;
        let extras = {
            let mut set = OptionSet::new();
            set.add_typed("color:", "", |v: String| color = Some(v)).unwrap();
            set.parse(["--color", "auto", "more"]).unwrap()
        };
        assert_eq!(color.as_deref(), Some("auto"));
        assert_eq!(extras, vec!["more"]);
    }

    #[test]
    fn test_optional_pending_at_end_is_not_an_error() {
        let mut set = OptionSet::new();
        set.add_typed("color:", "", |_: String| {}).unwrap();
        assert!(set.parse(["--color"]).unwrap().is_empty());
    }

    #[test]
    fn test_context_tracks_cursor() {
        let mut sets = [registry()];
        let mut ctx = ParseContext::new();
        ctx.step(&mut sets, "build").unwrap();
        ctx.step(&mut sets, "-f").unwrap();
        assert_eq!(ctx.token_index(), 2);
        assert_eq!(ctx.last_token(), "-f");
        assert_eq!(ctx.extras(), ["build"]);
    }

    #[test]
    fn test_first_group_wins() {
        let hits = RefCell::new(Vec::new());
        {
            let mut first = OptionSet::new();
            first
                .add(OptionDefinition::flag("v", "", |_| hits.borrow_mut().push("first")).unwrap())
                .unwrap();
            let mut second = OptionSet::new();
            second
                .add(OptionDefinition::flag("V", "", |_| hits.borrow_mut().push("second")).unwrap())
                .unwrap();
            let mut sets = [first, second];
            parse_tokens(&mut sets, ["-V"]).unwrap();
        }
        assert_eq!(hits.into_inner(), vec!["first"]);
    }

    #[test]
    fn test_sensitive_values_are_redacted_in_logs() {
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(log.clone())
            .finish();

        let mut key = String::new();
        let mut url = String::new();
        tracing::subscriber::with_default(subscriber, || {
            let mut set = OptionSet::new();
            set.add(
                OptionDefinition::typed("apiKey=", "", |v: String| key = v)
                    .unwrap()
                    .sensitive(),
            )
            .unwrap();
            set.add_typed("url=", "", |v: String| url = v).unwrap();
            let mut sets = [set];
            parse_tokens(&mut sets, ["--apiKey=secret", "--url", "https://example.test"]).unwrap();
        });

        assert_eq!(key, "secret");
        assert_eq!(url, "https://example.test");
        let logged = log.contents();
        assert!(!logged.contains("secret"), "log: {logged}");
        assert!(logged.contains(REDACTED), "log: {logged}");
        assert!(logged.contains("https://example.test"), "log: {logged}");
    }
}
