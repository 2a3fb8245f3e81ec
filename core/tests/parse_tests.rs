use std::cell::RefCell;

use optbind_core::{
    EnumKind, OptionDefinition, Options, ParseError, TypeConversionError, Value, ValueKind,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
struct Bound {
    verbose: Option<bool>,
    force: Option<bool>,
    api_key: Option<String>,
    url: Option<String>,
    output: Option<String>,
    package_format: Option<String>,
    timeout: Option<u32>,
}

fn package_format() -> ValueKind {
    ValueKind::Enumeration(
        EnumKind::new("PackageFormat")
            .member("Zip")
            .member("NuPkg")
            .deprecated_member("Nuget"),
    )
}

fn options(bound: &RefCell<Bound>) -> Options<'_> {
    let mut options = Options::new();

    let common = options.group("Common options");
    common
        .add_typed("verbose|v", "Verbose output", move |v: bool| {
            bound.borrow_mut().verbose = Some(v)
        })
        .unwrap();

    let push = options.group("Push options");
    push.add(
        OptionDefinition::typed("apiKey=", "API key", move |v: String| {
            bound.borrow_mut().api_key = Some(v)
        })
        .unwrap()
        .sensitive(),
    )
    .unwrap();
    push.add_typed("url=", "Server {URL}", move |v: String| {
        bound.borrow_mut().url = Some(v)
    })
    .unwrap();
    push.add_typed("f", "Force", move |v: bool| bound.borrow_mut().force = Some(v))
        .unwrap();
    push.add_typed("o=", "Output", move |v: String| {
        bound.borrow_mut().output = Some(v)
    })
    .unwrap();
    push.add(
        OptionDefinition::with_kind("packageFormat=", "Format", package_format(), move |v| {
            if let Value::Enum(name) = v {
                bound.borrow_mut().package_format = Some(name);
            }
        })
        .unwrap(),
    )
    .unwrap();
    push.add_typed("timeout=", "Timeout in seconds", move |v: u32| {
        bound.borrow_mut().timeout = Some(v)
    })
    .unwrap();

    options
}

fn parse(tokens: &[&str]) -> (Bound, Result<Vec<String>, ParseError>) {
    let bound = RefCell::new(Bound::default());
    let result = options(&bound).parse(tokens);
    (bound.into_inner(), result)
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[test]
fn names_match_ignoring_case() {
    let (upper, _) = parse(&["--ApiKey=X"]);
    let (lower, _) = parse(&["--apikey=X"]);
    assert_eq!(upper.api_key.as_deref(), Some("X"));
    assert_eq!(upper, lower);
}

#[test]
fn all_flag_markers_are_accepted() {
    let (bound, extras) = parse(&["/url:http://a", "-verbose", "--timeout", "30"]);
    assert!(extras.unwrap().is_empty());
    assert_eq!(bound.url.as_deref(), Some("http://a"));
    assert_eq!(bound.verbose, Some(true));
    assert_eq!(bound.timeout, Some(30));
}

#[test]
fn inline_value_keeps_later_separators() {
    let (bound, _) = parse(&["--url=http://host:8080/path"]);
    assert_eq!(bound.url.as_deref(), Some("http://host:8080/path"));
}

#[test]
fn bundle_binds_flag_and_value() {
    let (bound, extras) = parse(&["-foVALUE"]);
    assert!(extras.unwrap().is_empty());
    assert_eq!(bound.force, Some(true));
    assert_eq!(bound.output.as_deref(), Some("VALUE"));
}

#[test]
fn bundle_value_option_takes_next_token_when_nothing_remains() {
    let (bound, _) = parse(&["-fo", "out.txt"]);
    assert_eq!(bound.force, Some(true));
    assert_eq!(bound.output.as_deref(), Some("out.txt"));
}

#[test]
fn negation_suffixes() {
    let (bound, _) = parse(&["--verbose-"]);
    assert_eq!(bound.verbose, Some(false));
    let (bound, _) = parse(&["-v-", "-v+"]);
    assert_eq!(bound.verbose, Some(true));
}

#[test]
fn last_appearance_wins() {
    let (bound, _) = parse(&["--url", "first", "--url", "second"]);
    assert_eq!(bound.url.as_deref(), Some("second"));
}

// ---------------------------------------------------------------------------
// Extras
// ---------------------------------------------------------------------------

#[test]
fn terminator_stops_flag_recognition() {
    let (bound, extras) = parse(&["deploy", "--", "--verbose", "--url=x", "--"]);
    assert_eq!(extras.unwrap(), vec!["deploy", "--verbose", "--url=x", "--"]);
    assert_eq!(bound, Bound::default());
}

#[test]
fn pending_value_takes_terminator_literally() {
    let (bound, extras) = parse(&["--url", "--", "--verbose"]);
    assert_eq!(bound.url.as_deref(), Some("--"));
    assert_eq!(bound.verbose, Some(true));
    assert!(extras.unwrap().is_empty());
}

#[test]
fn unknown_tokens_are_collected_in_order() {
    let (_, extras) = parse(&["one", "--unknown", "-x", "two"]);
    assert_eq!(extras.unwrap(), vec!["one", "--unknown", "-x", "two"]);
}

#[test]
fn extras_handler_receives_leftovers() {
    let bound = RefCell::new(Bound::default());
    let mut received = Vec::new();
    {
        let mut options = options(&bound);
        options.with_extras(|extras| received.extend_from_slice(extras));
        options.parse(["pkg", "-v"]).unwrap();
    }
    assert_eq!(received, vec!["pkg"]);
}

#[test]
fn parse_is_repeatable_with_fresh_registries() {
    let tokens = ["--ApiKey=k", "-fo", "o", "a", "--", "-v"];
    let (first_bound, first_extras) = parse(&tokens);
    let (second_bound, second_extras) = parse(&tokens);
    assert_eq!(first_bound, second_bound);
    assert_eq!(first_extras, second_extras);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn enumeration_error_lists_valid_members() {
    let (_, result) = parse(&["--packageFormat", "invalidvalue"]);
    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not convert string `invalidvalue' to type PackageFormat for option `--packageFormat'. Valid values are Zip and NuPkg."
    );
    assert_eq!(
        err,
        ParseError::TypeConversion(TypeConversionError {
            value: "invalidvalue".into(),
            type_name: "PackageFormat".into(),
            option: "--packageFormat".into(),
            valid_values: vec!["Zip".into(), "NuPkg".into()],
        })
    );
}

#[test]
fn enumeration_matches_ignoring_case() {
    let (bound, _) = parse(&["--packageformat=nupkg"]);
    assert_eq!(bound.package_format.as_deref(), Some("NuPkg"));
}

#[test]
fn deprecated_member_is_rejected() {
    let (_, result) = parse(&["--packageFormat=Nuget"]);
    assert!(matches!(result, Err(ParseError::TypeConversion(_))));
}

#[test]
fn missing_required_value_names_option() {
    let (_, result) = parse(&["--url"]);
    let err = result.unwrap_err();
    assert_eq!(err, ParseError::MissingRequiredValue { option: "--url".into() });
    assert_eq!(err.to_string(), "Missing required value for option '--url'.");
}

#[test]
fn conversion_error_uses_typed_spelling() {
    let (_, result) = parse(&["/TIMEOUT=soon"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "Could not convert string `soon' to type Integer for option `/TIMEOUT'."
    );
}

#[test]
fn unregistered_bundle_character_is_fatal() {
    let (bound, result) = parse(&["-v", "-fz"]);
    assert_eq!(
        result.unwrap_err(),
        ParseError::UnregisteredBundledOption { option: "-z".into() }
    );
    // options completed before the error stay bound
    assert_eq!(bound.verbose, Some(true));
}

#[test]
fn too_many_values_for_multi_value_option() {
    let mut options = Options::new();
    options
        .group("G")
        .add(OptionDefinition::raw("define|D={=}", "Define", 2, |_| Ok(())).unwrap())
        .unwrap();
    let err = options.parse(["-Da=b=c"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Found 3 option values for option '-D' when expecting 2."
    );
}
