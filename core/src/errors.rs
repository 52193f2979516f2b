//! Error types for option declaration and argument parsing.
//!
//! Two enums split the failure surface along the line that matters to
//! integrators: [`OptionError`] covers mistakes in the option declarations
//! themselves and is raised at registration time, never during a parse;
//! [`ParseError`] covers user input problems seen while walking an argument
//! vector. A parser converts `ParseError` into a usage message and a
//! non-zero exit, while `OptionError` is left to propagate because it
//! indicates a bug in the program, not in what the user typed.

use thiserror::Error;

use crate::option::Action;

/// Structural misconfiguration of an option, or a name collision during
/// registration.
///
/// Every invalid attribute combination is checked when the option is built,
/// so an `Opt` that exists is internally consistent.
///
/// # Examples
///
/// ```
/// use optargs_core::{Action, Opt, OptionError};
///
/// let err = Opt::new(["-verbose"]).action(Action::StoreTrue).build().unwrap_err();
/// assert!(matches!(err, OptionError::InvalidLongOpt(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// No option strings were supplied at all.
    #[error("at least one option string must be supplied")]
    NoOptionStrings,
    /// An option string with fewer than two characters.
    #[error("invalid option string {0:?}: must be at least two characters long")]
    OptStringTooShort(String),
    /// A two-character string that is not `-x` with `x` a non-dash char.
    #[error("invalid short option string {0:?}: must be of the form -x, (x any non-dash char)")]
    InvalidShortOpt(String),
    /// A longer string that does not start with `--` plus a non-dash char.
    #[error("invalid long option string {0:?}: must start with --, followed by non-dash")]
    InvalidLongOpt(String),
    /// A value type was supplied for an action that never consumes a value.
    #[error("option {option}: must not supply a type for action {action}")]
    TypeForUntypedAction { option: String, action: Action },
    /// Type `choice` without a choice list.
    #[error("option {option}: must supply a list of choices for type choice")]
    MissingChoices { option: String },
    /// A choice list on a non-choice type.
    #[error("option {option}: must not supply choices for type {kind}")]
    UnexpectedChoices { option: String, kind: String },
    /// A const value on an action other than `store_const`/`append_const`.
    #[error("option {option}: 'const' must not be supplied for action {action}")]
    UnexpectedConst { option: String, action: Action },
    /// An nargs count on an action that never consumes a value.
    #[error("option {option}: 'nargs' must not be supplied for action {action}")]
    UnexpectedNargs { option: String, action: Action },
    /// An nargs count of zero.
    #[error("option {option}: nargs must be at least 1")]
    InvalidNargs { option: String },
    /// A callback on an action other than `callback`.
    #[error("option {option}: callback supplied for non-callback option")]
    UnexpectedCallback { option: String },
    /// Callback arguments on an action other than `callback`.
    #[error("option {option}: callback arguments supplied for non-callback option")]
    UnexpectedCallbackArgs { option: String },
    /// A `callback` action with no callback to invoke.
    #[error("option {option}: a callback action requires a callback")]
    MissingCallback { option: String },
    /// A short or long string already claimed by a live option, under the
    /// `error` conflict policy.
    #[error("conflicting option string(s): {} (option {option})", .strings.join(", "))]
    Conflict { option: String, strings: Vec<String> },
    /// An option string that is not registered (removal by string).
    #[error("no such option {0:?}")]
    UnknownOption(String),
}

/// A problem found while processing an argument vector.
///
/// These are user-facing: the parse entry point formats them into a usage
/// error, while `try_parse_args` hands them back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An option string nothing is registered under.
    #[error("no such option: {0}")]
    BadOption(String),
    /// A long-option prefix matching two or more registered names.
    /// `possibilities` is sorted for display.
    #[error("ambiguous option: {option} ({}?)", .possibilities.join(", "))]
    Ambiguous {
        option: String,
        possibilities: Vec<String>,
    },
    /// A value that failed conversion for its option's type.
    #[error("option {option}: invalid {expected} value: {value:?}")]
    InvalidValue {
        option: String,
        expected: &'static str,
        value: String,
    },
    /// A value outside a choice option's allowed set.
    #[error("option {option}: invalid choice: {value:?} (choose from {})", quote_choices(.choices))]
    InvalidChoice {
        option: String,
        value: String,
        choices: Vec<String>,
    },
    /// Fewer tokens left than the option's nargs.
    #[error("{option} option requires {nargs} {}", argument_noun(.nargs))]
    MissingArgument { option: String, nargs: usize },
    /// An `=`-attached value on an option that takes none.
    #[error("{option} option does not take a value")]
    UnexpectedValue { option: String },
}

fn quote_choices(choices: &[String]) -> String {
    choices
        .iter()
        .map(|choice| format!("{choice:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn argument_noun(nargs: &usize) -> &'static str {
    if *nargs == 1 { "argument" } else { "arguments" }
}
