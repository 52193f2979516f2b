//! The option model: declarations, construction checks, value conversion,
//! and action application.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{OptionError, ParseError};
use crate::values::{CallbackContext, Val};

/// The effect an option has on the result record when matched.
///
/// # Examples
///
/// ```
/// use optargs_core::Action;
///
/// assert!(Action::Store.typed());
/// assert!(Action::Count.stores_value());
/// assert!(!Action::Help.stores_value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    AppendConst,
    Count,
    Callback,
    Help,
    Version,
}

impl Action {
    /// Actions that write to a destination and therefore need one.
    pub fn stores_value(self) -> bool {
        matches!(
            self,
            Action::Store
                | Action::StoreConst
                | Action::StoreTrue
                | Action::StoreFalse
                | Action::Append
                | Action::AppendConst
                | Action::Count
        )
    }

    /// Actions for which supplying a value type makes sense.
    pub fn typed(self) -> bool {
        matches!(self, Action::Store | Action::Append | Action::Callback)
    }

    /// Actions that always consume an argument from the command line.
    pub fn always_typed(self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }

    /// Actions that take a const value.
    pub fn takes_const(self) -> bool {
        matches!(self, Action::StoreConst | Action::AppendConst)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Store => "store",
            Action::StoreConst => "store_const",
            Action::StoreTrue => "store_true",
            Action::StoreFalse => "store_false",
            Action::Append => "append",
            Action::AppendConst => "append_const",
            Action::Count => "count",
            Action::Callback => "callback",
            Action::Help => "help",
            Action::Version => "version",
        };
        f.write_str(name)
    }
}

/// The type a value-taking option converts its argument to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Str,
    Int,
    Long,
    Float,
    Complex,
    Choice,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Str => "string",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Complex => "complex",
            ValueKind::Choice => "choice",
        };
        f.write_str(name)
    }
}

/// A callback action's handler.
///
/// Invoked as `callback(option, opt_str, value, ctx)`; extra declaration
/// arguments are read back through the option
/// ([`callback_args`](Opt::callback_args) /
/// [`callback_kwargs`](Opt::callback_kwargs)).
pub type CallbackFn = Arc<
    dyn Fn(&Opt, &str, Option<&Val>, &mut CallbackContext<'_>) -> Result<(), ParseError>
        + Send
        + Sync,
>;

/// Raw value tokens collected for one option occurrence: a single token for
/// `nargs == 1`, the consumed token run otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    One(String),
    Many(Vec<String>),
}

/// One declared switch or value-taking flag.
///
/// Built through [`Opt::new`]; every attribute combination is validated at
/// [`OptBuilder::build`] time, so an `Opt` that exists is consistent and a
/// misdeclaration can never surface mid-parse.
///
/// # Examples
///
/// ```
/// use optargs_core::{Action, Opt, ValueKind};
///
/// let opt = Opt::new(["-f", "--file"])
///     .kind(ValueKind::Str)
///     .help("read data from FILE")
///     .build()
///     .unwrap();
/// assert_eq!(opt.action(), Action::Store);
/// assert_eq!(opt.dest(), Some("file"));
/// assert!(opt.takes_value());
/// assert_eq!(opt.opt_string(), "--file");
/// ```
#[derive(Clone)]
pub struct Opt {
    short_opts: Vec<String>,
    long_opts: Vec<String>,
    action: Action,
    kind: Option<ValueKind>,
    dest: Option<String>,
    default: Option<Val>,
    nargs: usize,
    const_val: Option<Val>,
    choices: Option<Vec<String>>,
    callback: Option<CallbackFn>,
    callback_args: Vec<Val>,
    callback_kwargs: BTreeMap<String, Val>,
    help: Option<String>,
    hidden: bool,
    metavar: Option<String>,
}

impl Opt {
    /// Start declaring an option from its short/long strings.
    pub fn new<I, S>(opt_strings: I) -> OptBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptBuilder {
            opt_strings: opt_strings.into_iter().map(Into::into).collect(),
            action: None,
            kind: None,
            dest: None,
            default: None,
            nargs: None,
            const_val: None,
            choices: None,
            callback: None,
            callback_args: Vec::new(),
            callback_kwargs: BTreeMap::new(),
            help: None,
            hidden: false,
            metavar: None,
        }
    }

    pub fn short_opts(&self) -> &[String] {
        &self.short_opts
    }

    pub fn long_opts(&self) -> &[String] {
        &self.long_opts
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    pub fn dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// The declared default, or `None` when no default was supplied (which
    /// is distinct from an explicit default of [`Val::None`]).
    pub fn default(&self) -> Option<&Val> {
        self.default.as_ref()
    }

    pub fn nargs(&self) -> usize {
        self.nargs
    }

    pub fn const_val(&self) -> Option<&Val> {
        self.const_val.as_ref()
    }

    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    pub fn callback_args(&self) -> &[Val] {
        &self.callback_args
    }

    pub fn callback_kwargs(&self) -> &BTreeMap<String, Val> {
        &self.callback_kwargs
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Suppressed from rendered help output.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    /// Whether matching this option consumes value tokens.
    pub fn takes_value(&self) -> bool {
        self.kind.is_some()
    }

    /// The canonical display string: first long option, else first short.
    pub fn opt_string(&self) -> &str {
        self.long_opts
            .first()
            .or_else(|| self.short_opts.first())
            .expect("a built option has at least one option string")
    }

    /// Remove one of this option's strings. Used by conflict resolution;
    /// an option that loses all its strings is dropped by its container.
    pub fn remove_opt_string(&mut self, opt_str: &str) {
        self.short_opts.retain(|s| s != opt_str);
        self.long_opts.retain(|s| s != opt_str);
    }

    pub fn has_opt_strings(&self) -> bool {
        !self.short_opts.is_empty() || !self.long_opts.is_empty()
    }

    /// Convert and validate one raw value token for this option's type.
    /// `opt` is the option string actually seen on the command line.
    pub fn check_value(&self, opt: &str, value: &str) -> Result<Val, ParseError> {
        match self.kind {
            None | Some(ValueKind::Str) => Ok(Val::Str(value.to_string())),
            Some(ValueKind::Int) | Some(ValueKind::Long) => parse_radix_int(value)
                .map(Val::Int)
                .ok_or_else(|| ParseError::InvalidValue {
                    option: opt.to_string(),
                    expected: "integer",
                    value: value.to_string(),
                }),
            Some(ValueKind::Float) => {
                value
                    .parse::<f64>()
                    .map(Val::Float)
                    .map_err(|_| ParseError::InvalidValue {
                        option: opt.to_string(),
                        expected: "floating-point",
                        value: value.to_string(),
                    })
            }
            Some(ValueKind::Complex) => parse_complex(value)
                .map(|(re, im)| Val::Complex { re, im })
                .ok_or_else(|| ParseError::InvalidValue {
                    option: opt.to_string(),
                    expected: "complex",
                    value: value.to_string(),
                }),
            Some(ValueKind::Choice) => {
                let choices = self
                    .choices
                    .as_deref()
                    .expect("a choice option has a choice list");
                if choices.iter().any(|choice| choice == value) {
                    Ok(Val::Str(value.to_string()))
                } else {
                    Err(ParseError::InvalidChoice {
                        option: opt.to_string(),
                        value: value.to_string(),
                        choices: choices.to_vec(),
                    })
                }
            }
        }
    }

    /// Convert collected value tokens: a scalar for `nargs == 1`, a tuple
    /// of converted values otherwise.
    pub fn convert_value(
        &self,
        opt: &str,
        raw: Option<&RawValue>,
    ) -> Result<Option<Val>, ParseError> {
        match raw {
            None => Ok(None),
            Some(RawValue::One(value)) => self.check_value(opt, value).map(Some),
            Some(RawValue::Many(tokens)) => {
                let mut converted = Vec::with_capacity(tokens.len());
                for token in tokens {
                    converted.push(self.check_value(opt, token)?);
                }
                Ok(Some(Val::Tuple(converted)))
            }
        }
    }

    /// Convert the collected tokens, then apply this option's action
    /// against the in-flight parse state.
    ///
    /// `Help` and `Version` are handled by the parser before it gets here.
    pub fn process(
        &self,
        opt: &str,
        raw: Option<RawValue>,
        ctx: &mut CallbackContext<'_>,
    ) -> Result<(), ParseError> {
        let value = self.convert_value(opt, raw.as_ref())?;
        self.take_action(opt, value, ctx)
    }

    fn take_action(
        &self,
        opt: &str,
        value: Option<Val>,
        ctx: &mut CallbackContext<'_>,
    ) -> Result<(), ParseError> {
        match self.action {
            Action::Store => {
                ctx.values.set(self.dest_key(), value.unwrap_or(Val::None));
            }
            Action::StoreConst => {
                let const_val = self.const_val.clone().unwrap_or(Val::None);
                ctx.values.set(self.dest_key(), const_val);
            }
            Action::StoreTrue => ctx.values.set(self.dest_key(), Val::Bool(true)),
            Action::StoreFalse => ctx.values.set(self.dest_key(), Val::Bool(false)),
            Action::Append => {
                let item = value.unwrap_or(Val::None);
                let slot = ctx.values.ensure(self.dest_key(), Val::List(Vec::new()));
                if let Val::List(items) = slot {
                    items.push(item);
                } else {
                    *slot = Val::List(vec![item]);
                }
            }
            Action::AppendConst => {
                let item = self.const_val.clone().unwrap_or(Val::None);
                let slot = ctx.values.ensure(self.dest_key(), Val::List(Vec::new()));
                if let Val::List(items) = slot {
                    items.push(item);
                } else {
                    *slot = Val::List(vec![item]);
                }
            }
            Action::Count => {
                let slot = ctx.values.ensure(self.dest_key(), Val::Int(0));
                if let Val::Int(n) = slot {
                    *n += 1;
                } else {
                    *slot = Val::Int(1);
                }
            }
            Action::Callback => {
                let callback = self
                    .callback
                    .clone()
                    .expect("a callback action has a callback");
                callback(self, opt, value.as_ref(), ctx)?;
            }
            Action::Help | Action::Version => {}
        }
        Ok(())
    }

    fn dest_key(&self) -> &str {
        self.dest
            .as_deref()
            .expect("a storing action has a destination")
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self
            .short_opts
            .iter()
            .chain(self.long_opts.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/");
        f.write_str(&label)
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt")
            .field("short_opts", &self.short_opts)
            .field("long_opts", &self.long_opts)
            .field("action", &self.action)
            .field("kind", &self.kind)
            .field("dest", &self.dest)
            .field("default", &self.default)
            .field("nargs", &self.nargs)
            .finish_non_exhaustive()
    }
}

/// In-progress option declaration; [`build`](OptBuilder::build) runs the
/// full consistency checks.
pub struct OptBuilder {
    opt_strings: Vec<String>,
    action: Option<Action>,
    kind: Option<ValueKind>,
    dest: Option<String>,
    default: Option<Val>,
    nargs: Option<usize>,
    const_val: Option<Val>,
    choices: Option<Vec<String>>,
    callback: Option<CallbackFn>,
    callback_args: Vec<Val>,
    callback_kwargs: BTreeMap<String, Val>,
    help: Option<String>,
    hidden: bool,
    metavar: Option<String>,
}

impl OptBuilder {
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.dest = Some(dest.to_string());
        self
    }

    pub fn default_value(mut self, value: impl Into<Val>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn nargs(mut self, nargs: usize) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn const_value(mut self, value: impl Into<Val>) -> Self {
        self.const_val = Some(value.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Opt, &str, Option<&Val>, &mut CallbackContext<'_>) -> Result<(), ParseError>
            + Send
            + Sync
            + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn callback_args(mut self, args: Vec<Val>) -> Self {
        self.callback_args = args;
        self
    }

    pub fn callback_kwargs(mut self, kwargs: BTreeMap<String, Val>) -> Self {
        self.callback_kwargs = kwargs;
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }

    /// Validate the declaration and produce the option.
    ///
    /// The checks run in declaration order: option strings, type/action,
    /// choices, destination derivation, const, nargs, callback. The first
    /// inconsistency fails with the [`OptionError`] kind naming this
    /// option.
    pub fn build(self) -> Result<Opt, OptionError> {
        let (short_opts, long_opts) = check_opt_strings(&self.opt_strings)?;
        let label = self.opt_strings.join("/");
        let action = self.action.unwrap_or(Action::Store);

        let kind = match self.kind {
            None if action.always_typed() => {
                if self.choices.is_some() {
                    Some(ValueKind::Choice)
                } else {
                    Some(ValueKind::Str)
                }
            }
            None => None,
            Some(kind) => {
                if !action.typed() {
                    return Err(OptionError::TypeForUntypedAction {
                        option: label,
                        action,
                    });
                }
                Some(kind)
            }
        };

        match (kind, &self.choices) {
            (Some(ValueKind::Choice), None) => {
                return Err(OptionError::MissingChoices { option: label });
            }
            (Some(ValueKind::Choice), Some(_)) => {}
            (other, Some(_)) => {
                return Err(OptionError::UnexpectedChoices {
                    option: label,
                    kind: other.map_or_else(|| "none".to_string(), |k| k.to_string()),
                });
            }
            (_, None) => {}
        }

        let stores = action.stores_value() || kind.is_some();
        let dest = match self.dest {
            Some(dest) => Some(dest),
            None if stores => Some(derive_dest(&short_opts, &long_opts)),
            None => None,
        };

        if self.const_val.is_some() && !action.takes_const() {
            return Err(OptionError::UnexpectedConst {
                option: label,
                action,
            });
        }

        let nargs = if action.typed() {
            let nargs = self.nargs.unwrap_or(1);
            if nargs == 0 {
                return Err(OptionError::InvalidNargs { option: label });
            }
            nargs
        } else if self.nargs.is_some() {
            return Err(OptionError::UnexpectedNargs {
                option: label,
                action,
            });
        } else {
            1
        };

        if action == Action::Callback {
            if self.callback.is_none() {
                return Err(OptionError::MissingCallback { option: label });
            }
        } else {
            if self.callback.is_some() {
                return Err(OptionError::UnexpectedCallback { option: label });
            }
            if !self.callback_args.is_empty() || !self.callback_kwargs.is_empty() {
                return Err(OptionError::UnexpectedCallbackArgs { option: label });
            }
        }

        Ok(Opt {
            short_opts,
            long_opts,
            action,
            kind,
            dest,
            default: self.default,
            nargs,
            const_val: self.const_val,
            choices: self.choices,
            callback: self.callback,
            callback_args: self.callback_args,
            callback_kwargs: self.callback_kwargs,
            help: self.help,
            hidden: self.hidden,
            metavar: self.metavar,
        })
    }
}

fn check_opt_strings(opts: &[String]) -> Result<(Vec<String>, Vec<String>), OptionError> {
    if opts.is_empty() {
        return Err(OptionError::NoOptionStrings);
    }
    let mut short_opts = Vec::new();
    let mut long_opts = Vec::new();
    for opt in opts {
        let length = opt.chars().count();
        if length < 2 {
            return Err(OptionError::OptStringTooShort(opt.clone()));
        }
        if length == 2 {
            if !opt.starts_with('-') || opt.chars().nth(1) == Some('-') {
                return Err(OptionError::InvalidShortOpt(opt.clone()));
            }
            short_opts.push(opt.clone());
        } else {
            if !opt.starts_with("--") || opt.chars().nth(2) == Some('-') {
                return Err(OptionError::InvalidLongOpt(opt.clone()));
            }
            long_opts.push(opt.clone());
        }
    }
    Ok((short_opts, long_opts))
}

fn derive_dest(short_opts: &[String], long_opts: &[String]) -> String {
    match long_opts.first() {
        Some(long) => long[2..].replace('-', "_"),
        None => short_opts[0][1..].to_string(),
    }
}

/// Integer parsing with radix sniffing: `0x` hex, `0b` binary (prefix
/// stripped, empty remainder reads as zero), leading `0` octal, else
/// decimal.
fn parse_radix_int(value: &str) -> Option<i64> {
    let prefix: String = value.chars().take(2).collect::<String>().to_ascii_lowercase();
    if prefix == "0x" {
        i64::from_str_radix(&value[2..], 16).ok()
    } else if prefix == "0b" {
        let digits = &value[2..];
        let digits = if digits.is_empty() { "0" } else { digits };
        i64::from_str_radix(digits, 2).ok()
    } else if value.starts_with('0') {
        i64::from_str_radix(value, 8).ok()
    } else {
        value.parse::<i64>().ok()
    }
}

/// Parse `a+bj` complex literals, including bare reals (`1.5`), bare
/// imaginaries (`2j`, `-j`), and parenthesized forms.
fn parse_complex(value: &str) -> Option<(f64, f64)> {
    let s = value.trim();
    let s = s
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(s);
    let Some(body) = s.strip_suffix(['j', 'J']) else {
        return s.parse::<f64>().ok().map(|re| (re, 0.0));
    };
    let bytes = body.as_bytes();
    let mut split = None;
    for i in (1..bytes.len()).rev() {
        if (bytes[i] == b'+' || bytes[i] == b'-') && !matches!(bytes[i - 1], b'e' | b'E') {
            split = Some(i);
            break;
        }
    }
    match split {
        Some(i) => {
            let re = body[..i].parse::<f64>().ok()?;
            let im = parse_signed_unit(&body[i..])?;
            Some((re, im))
        }
        None => parse_signed_unit(body).map(|im| (0.0, im)),
    }
}

fn parse_signed_unit(s: &str) -> Option<f64> {
    match s {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        _ => s.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Values;

    fn ctx_parts() -> (Values, Vec<String>, Vec<String>) {
        (Values::new(), Vec::new(), Vec::new())
    }

    #[test]
    fn test_short_and_long_strings_are_split() {
        let opt = Opt::new(["-f", "--file"]).kind(ValueKind::Str).build().unwrap();
        assert_eq!(opt.short_opts(), ["-f"]);
        assert_eq!(opt.long_opts(), ["--file"]);
        assert_eq!(opt.to_string(), "-f/--file");
    }

    #[test]
    fn test_malformed_opt_strings_are_rejected() {
        assert!(matches!(
            Opt::new(["x"]).build(),
            Err(OptionError::OptStringTooShort(_))
        ));
        assert!(matches!(
            Opt::new(["--"]).build(),
            Err(OptionError::InvalidShortOpt(_))
        ));
        assert!(matches!(
            Opt::new(["-xy"]).build(),
            Err(OptionError::InvalidLongOpt(_))
        ));
        assert!(matches!(
            Opt::new(["---x"]).build(),
            Err(OptionError::InvalidLongOpt(_))
        ));
        let no_strings: [&str; 0] = [];
        assert!(matches!(
            Opt::new(no_strings).build(),
            Err(OptionError::NoOptionStrings)
        ));
    }

    #[test]
    fn test_store_defaults_to_string_type_and_derives_dest() {
        let opt = Opt::new(["--log-level"]).build().unwrap();
        assert_eq!(opt.action(), Action::Store);
        assert_eq!(opt.kind(), Some(ValueKind::Str));
        assert_eq!(opt.dest(), Some("log_level"));
        assert_eq!(opt.nargs(), 1);
    }

    #[test]
    fn test_dest_falls_back_to_short_name() {
        let opt = Opt::new(["-x"]).action(Action::StoreTrue).build().unwrap();
        assert_eq!(opt.dest(), Some("x"));
        assert!(!opt.takes_value());
    }

    #[test]
    fn test_choices_imply_choice_type() {
        let opt = Opt::new(["--format"])
            .choices(["json", "text"])
            .build()
            .unwrap();
        assert_eq!(opt.kind(), Some(ValueKind::Choice));
    }

    #[test]
    fn test_choice_type_requires_choices() {
        assert!(matches!(
            Opt::new(["--format"]).kind(ValueKind::Choice).build(),
            Err(OptionError::MissingChoices { .. })
        ));
        assert!(matches!(
            Opt::new(["--format"]).kind(ValueKind::Int).choices(["a"]).build(),
            Err(OptionError::UnexpectedChoices { .. })
        ));
    }

    #[test]
    fn test_type_rejected_for_untyped_actions() {
        assert!(matches!(
            Opt::new(["-v"]).action(Action::Count).kind(ValueKind::Int).build(),
            Err(OptionError::TypeForUntypedAction { .. })
        ));
    }

    #[test]
    fn test_const_and_nargs_rejected_where_meaningless() {
        assert!(matches!(
            Opt::new(["-v"]).action(Action::StoreTrue).const_value(1i64).build(),
            Err(OptionError::UnexpectedConst { .. })
        ));
        assert!(matches!(
            Opt::new(["-v"]).action(Action::Count).nargs(2).build(),
            Err(OptionError::UnexpectedNargs { .. })
        ));
        assert!(matches!(
            Opt::new(["--point"]).nargs(0).build(),
            Err(OptionError::InvalidNargs { .. })
        ));
    }

    #[test]
    fn test_callback_checks() {
        assert!(matches!(
            Opt::new(["--cb"]).action(Action::Callback).build(),
            Err(OptionError::MissingCallback { .. })
        ));
        assert!(matches!(
            Opt::new(["-v"])
                .action(Action::StoreTrue)
                .callback(|_, _, _, _| Ok(()))
                .build(),
            Err(OptionError::UnexpectedCallback { .. })
        ));
        assert!(matches!(
            Opt::new(["-v"])
                .action(Action::StoreTrue)
                .callback_args(vec![Val::Int(1)])
                .build(),
            Err(OptionError::UnexpectedCallbackArgs { .. })
        ));
    }

    #[test]
    fn test_radix_sniffing_int_conversion() {
        let opt = Opt::new(["-n"]).kind(ValueKind::Int).build().unwrap();
        assert_eq!(opt.check_value("-n", "42").unwrap(), Val::Int(42));
        assert_eq!(opt.check_value("-n", "0x1A").unwrap(), Val::Int(26));
        assert_eq!(opt.check_value("-n", "0B101").unwrap(), Val::Int(5));
        assert_eq!(opt.check_value("-n", "0b").unwrap(), Val::Int(0));
        assert_eq!(opt.check_value("-n", "017").unwrap(), Val::Int(15));
        assert_eq!(opt.check_value("-n", "0").unwrap(), Val::Int(0));
        assert_eq!(opt.check_value("-n", "-12").unwrap(), Val::Int(-12));

        let err = opt.check_value("-n", "twelve").unwrap_err();
        assert_eq!(
            err.to_string(),
            "option -n: invalid integer value: \"twelve\""
        );
        assert!(opt.check_value("-n", "09").is_err());
    }

    #[test]
    fn test_float_and_complex_conversion() {
        let opt = Opt::new(["--ratio"]).kind(ValueKind::Float).build().unwrap();
        assert_eq!(opt.check_value("--ratio", "2.5").unwrap(), Val::Float(2.5));
        assert!(opt.check_value("--ratio", "nope").is_err());

        let opt = Opt::new(["--z"]).kind(ValueKind::Complex).build().unwrap();
        assert_eq!(
            opt.check_value("--z", "1+2j").unwrap(),
            Val::Complex { re: 1.0, im: 2.0 }
        );
        assert_eq!(
            opt.check_value("--z", "-1.5e2-2j").unwrap(),
            Val::Complex { re: -150.0, im: -2.0 }
        );
        assert_eq!(
            opt.check_value("--z", "3j").unwrap(),
            Val::Complex { re: 0.0, im: 3.0 }
        );
        assert_eq!(
            opt.check_value("--z", "4").unwrap(),
            Val::Complex { re: 4.0, im: 0.0 }
        );
        assert!(opt.check_value("--z", "one+twoj").is_err());
    }

    #[test]
    fn test_choice_membership() {
        let opt = Opt::new(["--format"])
            .choices(["json", "text"])
            .build()
            .unwrap();
        assert_eq!(
            opt.check_value("--format", "json").unwrap(),
            Val::Str("json".to_string())
        );
        let err = opt.check_value("--format", "xml").unwrap_err();
        assert!(matches!(err, ParseError::InvalidChoice { .. }));
    }

    #[test]
    fn test_convert_value_nargs_many_yields_tuple() {
        let opt = Opt::new(["--point"]).kind(ValueKind::Int).nargs(2).build().unwrap();
        let raw = RawValue::Many(vec!["3".to_string(), "0x4".to_string()]);
        assert_eq!(
            opt.convert_value("--point", Some(&raw)).unwrap(),
            Some(Val::Tuple(vec![Val::Int(3), Val::Int(4)]))
        );
    }

    #[test]
    fn test_store_action() {
        let opt = Opt::new(["-o", "--output"]).build().unwrap();
        let (mut values, mut rargs, mut largs) = ctx_parts();
        let mut ctx = CallbackContext {
            values: &mut values,
            rargs: &mut rargs,
            largs: &mut largs,
        };
        opt.process("-o", Some(RawValue::One("out.txt".to_string())), &mut ctx)
            .unwrap();
        assert_eq!(values.get_str("output"), Some("out.txt"));
    }

    #[test]
    fn test_append_accumulates_in_occurrence_order() {
        let opt = Opt::new(["-I", "--include"]).action(Action::Append).build().unwrap();
        let (mut values, mut rargs, mut largs) = ctx_parts();
        let mut ctx = CallbackContext {
            values: &mut values,
            rargs: &mut rargs,
            largs: &mut largs,
        };
        opt.process("-I", Some(RawValue::One("src".to_string())), &mut ctx)
            .unwrap();
        opt.process("-I", Some(RawValue::One("tests".to_string())), &mut ctx)
            .unwrap();
        assert_eq!(
            values.get("include"),
            Some(&Val::List(vec![Val::from("src"), Val::from("tests")]))
        );
    }

    #[test]
    fn test_count_starts_from_zero_not_none() {
        let opt = Opt::new(["-v"]).action(Action::Count).build().unwrap();
        let (mut values, mut rargs, mut largs) = ctx_parts();
        values.set("v", Val::None);
        let mut ctx = CallbackContext {
            values: &mut values,
            rargs: &mut rargs,
            largs: &mut largs,
        };
        opt.process("-v", None, &mut ctx).unwrap();
        opt.process("-v", None, &mut ctx).unwrap();
        assert_eq!(values.get_int("v"), Some(2));
    }

    #[test]
    fn test_callback_receives_option_and_value() {
        let opt = Opt::new(["--tag"])
            .action(Action::Callback)
            .kind(ValueKind::Str)
            .callback_args(vec![Val::from("extra")])
            .callback(|opt, opt_str, value, ctx| {
                assert_eq!(opt.callback_args(), [Val::from("extra")]);
                assert_eq!(opt_str, "--tag");
                let tag = match value {
                    Some(Val::Str(s)) => s.clone(),
                    other => panic!("unexpected callback value: {other:?}"),
                };
                ctx.values.set("seen_tag", tag);
                Ok(())
            })
            .build()
            .unwrap();
        let (mut values, mut rargs, mut largs) = ctx_parts();
        let mut ctx = CallbackContext {
            values: &mut values,
            rargs: &mut rargs,
            largs: &mut largs,
        };
        opt.process("--tag", Some(RawValue::One("release".to_string())), &mut ctx)
            .unwrap();
        assert_eq!(values.get_str("seen_tag"), Some("release"));
    }
}
