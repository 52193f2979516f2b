//! Option containers and the argument-vector processor.
//!
//! An [`OptionParser`] owns the canonical lookup tables (short strings,
//! long strings, destination defaults) and an arena of registered options.
//! An [`OptionGroup`] is a titled handle into the same parser: options
//! added through a group land in the shared tables and are conflict-checked
//! against the whole parser, but are listed under the group's heading in
//! help output. Groups never affect parse order.
//!
//! Parsing takes `&mut self`, so one parser instance cannot serve
//! concurrent parses; use independent instances instead.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, warn};

use optargs_core::{
    Action, CallbackContext, Opt, OptBuilder, OptionError, ParseError, RawValue, Val, Values,
};

use crate::abbrev::match_abbrev;
use crate::help::HelpFormatter;

/// Index of a registered option in its parser's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptId(pub(crate) usize);

/// Handle to an option group registered with a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(usize);

/// What to do when a new option claims an already-registered string:
/// `Error` fails the registration; `Resolve` strips the colliding string
/// from the earlier option (dropping it entirely once it has no strings
/// left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictHandler {
    #[default]
    Error,
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Parser,
    Group(usize),
}

#[derive(Debug)]
struct OptEntry {
    opt: Opt,
    owner: Owner,
}

/// A titled subset of a parser's options, used for help sectioning only.
#[derive(Debug)]
pub struct OptionGroup {
    title: String,
    description: Option<String>,
    option_list: Vec<OptId>,
}

impl OptionGroup {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn option_ids(&self) -> &[OptId] {
        &self.option_list
    }
}

struct ParseState {
    rargs: Vec<String>,
    largs: Vec<String>,
    values: Values,
}

/// The root option container and parsing engine.
///
/// # Examples
///
/// ```
/// use optargs_core::{Action, Opt};
/// use optargs_parser::OptionParser;
///
/// let mut parser = OptionParser::builder().prog("tool").build();
/// parser
///     .add_option(Opt::new(["-v", "--verbose"]).action(Action::StoreTrue))
///     .unwrap();
/// parser.add_option(Opt::new(["-o", "--output"])).unwrap();
///
/// let (values, leftover) = parser
///     .try_parse_args(["-v", "--output=report.txt", "extra"], None)
///     .unwrap();
/// assert_eq!(values.get_bool("verbose"), Some(true));
/// assert_eq!(values.get_str("output"), Some("report.txt"));
/// assert_eq!(leftover, ["extra"]);
/// ```
#[derive(Debug)]
pub struct OptionParser {
    prog: Option<String>,
    usage: Option<String>,
    version: Option<String>,
    description: Option<String>,
    epilog: Option<String>,
    conflict_handler: ConflictHandler,
    allow_interspersed_args: bool,
    process_default_values: bool,
    arena: Vec<OptEntry>,
    option_list: Vec<OptId>,
    groups: Vec<OptionGroup>,
    short_table: HashMap<String, OptId>,
    long_table: HashMap<String, OptId>,
    defaults: BTreeMap<String, Val>,
    formatter: HelpFormatter,
}

/// Configuration collected before the parser is created. `build` registers
/// the standard `--version` and `-h`/`--help` options, so they precede any
/// user-added options in help output.
pub struct ParserBuilder {
    prog: Option<String>,
    usage: Option<String>,
    suppress_usage: bool,
    version: Option<String>,
    description: Option<String>,
    epilog: Option<String>,
    conflict_handler: ConflictHandler,
    formatter: Option<HelpFormatter>,
    add_help: bool,
}

impl ParserBuilder {
    pub fn prog(mut self, prog: &str) -> Self {
        self.prog = Some(prog.to_string());
        self
    }

    /// Set the usage template; `%prog` expands to the program name and a
    /// leading `usage: ` prefix is stripped case-insensitively.
    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = Some(strip_usage_prefix(usage));
        self
    }

    /// Emit no usage line at all.
    pub fn suppress_usage(mut self) -> Self {
        self.suppress_usage = true;
        self
    }

    /// Supplying a version string auto-registers `--version`.
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn epilog(mut self, epilog: &str) -> Self {
        self.epilog = Some(epilog.to_string());
        self
    }

    pub fn conflict_handler(mut self, handler: ConflictHandler) -> Self {
        self.conflict_handler = handler;
        self
    }

    pub fn formatter(mut self, formatter: HelpFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Skip the automatic `-h`/`--help` option.
    pub fn no_help_option(mut self) -> Self {
        self.add_help = false;
        self
    }

    pub fn build(self) -> OptionParser {
        let usage = if self.suppress_usage {
            None
        } else {
            Some(self.usage.unwrap_or_else(|| "%prog [options]".to_string()))
        };
        let mut parser = OptionParser {
            prog: self.prog,
            usage,
            version: self.version,
            description: self.description,
            epilog: self.epilog,
            conflict_handler: self.conflict_handler,
            allow_interspersed_args: true,
            process_default_values: true,
            arena: Vec::new(),
            option_list: Vec::new(),
            groups: Vec::new(),
            short_table: HashMap::new(),
            long_table: HashMap::new(),
            defaults: BTreeMap::new(),
            formatter: self.formatter.unwrap_or_default(),
        };
        if parser.version.is_some() {
            parser
                .add_option(
                    Opt::new(["--version"])
                        .action(Action::Version)
                        .help("show program's version number and exit"),
                )
                .expect("the standard version option is valid");
        }
        if self.add_help {
            parser
                .add_option(
                    Opt::new(["-h", "--help"])
                        .action(Action::Help)
                        .help("show this help message and exit"),
                )
                .expect("the standard help option is valid");
        }
        parser
    }
}

impl OptionParser {
    pub fn builder() -> ParserBuilder {
        ParserBuilder {
            prog: None,
            usage: None,
            suppress_usage: false,
            version: None,
            description: None,
            epilog: None,
            conflict_handler: ConflictHandler::default(),
            formatter: None,
            add_help: true,
        }
    }

    // -- Option registration -------------------------------------------

    /// Build the declaration and register the option with the parser.
    pub fn add_option(&mut self, builder: OptBuilder) -> Result<OptId, OptionError> {
        let opt = builder.build()?;
        self.register(opt, Owner::Parser)
    }

    /// Register an already-built option with the parser.
    pub fn add_opt(&mut self, opt: Opt) -> Result<OptId, OptionError> {
        self.register(opt, Owner::Parser)
    }

    /// Create a titled group. Groups only affect help sectioning.
    pub fn add_option_group(&mut self, title: &str, description: Option<&str>) -> GroupId {
        self.groups.push(OptionGroup {
            title: title.to_string(),
            description: description.map(str::to_string),
            option_list: Vec::new(),
        });
        GroupId(self.groups.len() - 1)
    }

    /// Register an option under a group. The option shares the parser's
    /// lookup tables and is conflict-checked against every live option.
    pub fn add_group_option(
        &mut self,
        group: GroupId,
        builder: OptBuilder,
    ) -> Result<OptId, OptionError> {
        let opt = builder.build()?;
        self.register(opt, Owner::Group(group.0))
    }

    fn register(&mut self, opt: Opt, owner: Owner) -> Result<OptId, OptionError> {
        self.check_conflict(&opt)?;
        let id = OptId(self.arena.len());
        debug!(option = %opt, "registering option");
        for opt_str in opt.short_opts() {
            self.short_table.insert(opt_str.clone(), id);
        }
        for opt_str in opt.long_opts() {
            self.long_table.insert(opt_str.clone(), id);
        }
        if let Some(dest) = opt.dest() {
            if let Some(default) = opt.default() {
                self.defaults.insert(dest.to_string(), default.clone());
            } else if !self.defaults.contains_key(dest) {
                self.defaults.insert(dest.to_string(), Val::None);
            }
        }
        match owner {
            Owner::Parser => self.option_list.push(id),
            Owner::Group(group) => self.groups[group].option_list.push(id),
        }
        self.arena.push(OptEntry { opt, owner });
        Ok(id)
    }

    fn check_conflict(&mut self, option: &Opt) -> Result<(), OptionError> {
        let mut conflicts: Vec<(String, OptId)> = Vec::new();
        for opt_str in option.short_opts() {
            if let Some(&id) = self.short_table.get(opt_str) {
                conflicts.push((opt_str.clone(), id));
            }
        }
        for opt_str in option.long_opts() {
            if let Some(&id) = self.long_table.get(opt_str) {
                conflicts.push((opt_str.clone(), id));
            }
        }
        if conflicts.is_empty() {
            return Ok(());
        }
        match self.conflict_handler {
            ConflictHandler::Error => Err(OptionError::Conflict {
                option: option.to_string(),
                strings: conflicts.into_iter().map(|(s, _)| s).collect(),
            }),
            ConflictHandler::Resolve => {
                for (opt_str, id) in conflicts {
                    self.arena[id.0].opt.remove_opt_string(&opt_str);
                    if opt_str.starts_with("--") {
                        self.long_table.remove(&opt_str);
                    } else {
                        self.short_table.remove(&opt_str);
                    }
                    if !self.arena[id.0].opt.has_opt_strings() {
                        warn!(
                            option = %self.arena[id.0].opt,
                            "dropping option that lost all strings in conflict resolution"
                        );
                        self.drop_from_owner(id);
                    }
                }
                Ok(())
            }
        }
    }

    fn drop_from_owner(&mut self, id: OptId) {
        match self.arena[id.0].owner {
            Owner::Parser => self.option_list.retain(|&oid| oid != id),
            Owner::Group(group) => self.groups[group].option_list.retain(|&oid| oid != id),
        }
    }

    // -- Option queries ------------------------------------------------

    fn lookup(&self, opt_str: &str) -> Option<OptId> {
        self.short_table
            .get(opt_str)
            .or_else(|| self.long_table.get(opt_str))
            .copied()
    }

    pub fn get_option(&self, opt_str: &str) -> Option<&Opt> {
        self.lookup(opt_str).map(|id| &self.arena[id.0].opt)
    }

    pub fn has_option(&self, opt_str: &str) -> bool {
        self.lookup(opt_str).is_some()
    }

    /// Remove the option registered under `opt_str`, along with all of its
    /// other strings.
    pub fn remove_option(&mut self, opt_str: &str) -> Result<(), OptionError> {
        let id = self
            .lookup(opt_str)
            .ok_or_else(|| OptionError::UnknownOption(opt_str.to_string()))?;
        let short_opts = self.arena[id.0].opt.short_opts().to_vec();
        let long_opts = self.arena[id.0].opt.long_opts().to_vec();
        for s in &short_opts {
            self.short_table.remove(s);
        }
        for s in &long_opts {
            self.long_table.remove(s);
        }
        self.drop_from_owner(id);
        Ok(())
    }

    /// The group an option string was registered under, if any.
    pub fn get_option_group(&self, opt_str: &str) -> Option<GroupId> {
        match self.arena[self.lookup(opt_str)?.0].owner {
            Owner::Group(group) => Some(GroupId(group)),
            Owner::Parser => None,
        }
    }

    pub fn group(&self, id: GroupId) -> &OptionGroup {
        &self.groups[id.0]
    }

    pub fn groups(&self) -> &[OptionGroup] {
        &self.groups
    }

    /// All live options: the parser's own, then each group's, in
    /// registration order.
    pub fn options(&self) -> impl Iterator<Item = &Opt> {
        self.all_option_ids().into_iter().map(|id| &self.arena[id.0].opt)
    }

    pub(crate) fn direct_option_ids(&self) -> &[OptId] {
        &self.option_list
    }

    pub(crate) fn opt(&self, id: OptId) -> &Opt {
        &self.arena[id.0].opt
    }

    pub(crate) fn defaults_table(&self) -> &BTreeMap<String, Val> {
        &self.defaults
    }

    /// Resolve an exact option string to its registration identity.
    pub fn option_id(&self, opt_str: &str) -> Option<OptId> {
        self.lookup(opt_str)
    }

    fn all_option_ids(&self) -> Vec<OptId> {
        let mut ids = self.option_list.clone();
        for group in &self.groups {
            ids.extend(group.option_list.iter().copied());
        }
        ids
    }

    // -- Configuration -------------------------------------------------

    pub fn set_usage(&mut self, usage: &str) {
        self.usage = Some(strip_usage_prefix(usage));
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn epilog(&self) -> Option<&str> {
        self.epilog.as_deref()
    }

    /// Allow positional arguments between and after options (the default).
    pub fn enable_interspersed_args(&mut self) {
        self.allow_interspersed_args = true;
    }

    /// Stop processing at the first non-option argument.
    pub fn disable_interspersed_args(&mut self) {
        self.allow_interspersed_args = false;
    }

    /// Whether string defaults are run through their option's value checker
    /// before parsing (the default).
    pub fn set_process_default_values(&mut self, process: bool) {
        self.process_default_values = process;
    }

    pub fn set_conflict_handler(&mut self, handler: ConflictHandler) {
        self.conflict_handler = handler;
    }

    /// Install a default for a destination, overriding any option-declared
    /// default.
    pub fn set_default(&mut self, dest: &str, value: impl Into<Val>) {
        self.defaults.insert(dest.to_string(), value.into());
    }

    pub fn set_defaults<I, S, V>(&mut self, defaults: I)
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Val>,
    {
        for (dest, value) in defaults {
            self.defaults.insert(dest.into(), value.into());
        }
    }

    // -- Default materialization ---------------------------------------

    /// Produce the `Values` a parse starts from. With default processing
    /// enabled, every default that is currently a plain string is passed
    /// through its option's value checker so defaults and command-line
    /// values share a type after parsing.
    pub fn default_values(&self) -> Result<Values, ParseError> {
        if !self.process_default_values {
            return Ok(Values::with_defaults(self.defaults.clone()));
        }
        let mut defaults = self.defaults.clone();
        for id in self.all_option_ids() {
            let opt = &self.arena[id.0].opt;
            let Some(dest) = opt.dest() else { continue };
            if let Some(Val::Str(raw)) = defaults.get(dest) {
                let raw = raw.clone();
                let checked = opt.check_value(opt.opt_string(), &raw)?;
                defaults.insert(dest.to_string(), checked);
            }
        }
        Ok(Values::with_defaults(defaults))
    }

    // -- Parsing -------------------------------------------------------

    /// Parse an argument vector. Errors are reported as a usage message on
    /// stderr followed by process exit with status 2; the `help` and
    /// `version` actions print to stdout and exit with status 0.
    pub fn parse_args<I, S>(&mut self, args: I) -> (Values, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_parse_args(args, None) {
            Ok(result) => result,
            Err(err) => self.error(&err.to_string()),
        }
    }

    /// Parse the process's own argument vector.
    pub fn parse_args_from_env(&mut self) -> (Values, Vec<String>) {
        self.parse_args(std::env::args().skip(1))
    }

    /// Parse an argument vector, returning parse failures to the caller
    /// instead of exiting. `values` seeds the result record; when absent,
    /// it is materialized from the defaults table.
    pub fn try_parse_args<I, S>(
        &mut self,
        args: I,
        values: Option<Values>,
    ) -> Result<(Values, Vec<String>), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rargs: Vec<String> = args.into_iter().map(Into::into).collect();
        let values = match values {
            Some(values) => values,
            None => self.default_values()?,
        };
        let mut state = ParseState {
            rargs,
            largs: Vec::new(),
            values,
        };
        self.process_args(&mut state)?;
        let ParseState {
            rargs,
            mut largs,
            values,
        } = state;
        largs.extend(rargs);
        Ok((values, largs))
    }

    fn process_args(&mut self, state: &mut ParseState) -> Result<(), ParseError> {
        while let Some(arg) = state.rargs.first().cloned() {
            if arg == "--" {
                state.rargs.remove(0);
                return Ok(());
            }
            if arg.starts_with("--") {
                self.process_long_opt(state)?;
            } else if arg.starts_with('-') && arg.len() > 1 {
                self.process_short_opts(state)?;
            } else if self.allow_interspersed_args {
                state.rargs.remove(0);
                state.largs.push(arg);
            } else {
                return Ok(());
            }
        }
        Ok(())
    }

    fn process_long_opt(&mut self, state: &mut ParseState) -> Result<(), ParseError> {
        let arg = state.rargs.remove(0);

        // An `=`-attached value is spliced back in as the next token so
        // the nargs logic below stays uniform.
        let (name, had_explicit_value) = match arg.split_once('=') {
            Some((name, value)) => {
                state.rargs.insert(0, value.to_string());
                (name.to_string(), true)
            }
            None => (arg, false),
        };

        let opt_str = match_abbrev(&name, &self.long_table)?;
        let id = self.long_table[&opt_str];
        debug!(token = %name, option = %opt_str, "matched long option");
        let takes_value = self.arena[id.0].opt.takes_value();
        if takes_value {
            let nargs = self.arena[id.0].opt.nargs();
            let raw = take_value_tokens(&opt_str, nargs, &mut state.rargs)?;
            self.dispatch(id, &opt_str, Some(raw), state)
        } else if had_explicit_value {
            Err(ParseError::UnexpectedValue { option: opt_str })
        } else {
            self.dispatch(id, &opt_str, None, state)
        }
    }

    fn process_short_opts(&mut self, state: &mut ParseState) -> Result<(), ParseError> {
        let arg = state.rargs.remove(0);
        let mut stop = false;
        for (pos, ch) in arg.char_indices().skip(1) {
            let opt_str = format!("-{ch}");
            let Some(&id) = self.short_table.get(&opt_str) else {
                return Err(ParseError::BadOption(opt_str));
            };
            let raw = if self.arena[id.0].opt.takes_value() {
                // The rest of the cluster, if any, is this option's value;
                // the cluster walk ends here either way.
                let rest = pos + ch.len_utf8();
                if rest < arg.len() {
                    state.rargs.insert(0, arg[rest..].to_string());
                    stop = true;
                }
                let nargs = self.arena[id.0].opt.nargs();
                Some(take_value_tokens(&opt_str, nargs, &mut state.rargs)?)
            } else {
                None
            };
            self.dispatch(id, &opt_str, raw, state)?;
            if stop {
                break;
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        id: OptId,
        opt_str: &str,
        raw: Option<RawValue>,
        state: &mut ParseState,
    ) -> Result<(), ParseError> {
        match self.arena[id.0].opt.action() {
            Action::Help => {
                self.print_help();
                self.exit(0, None)
            }
            Action::Version => {
                self.print_version();
                self.exit(0, None)
            }
            _ => {
                let mut ctx = CallbackContext {
                    values: &mut state.values,
                    rargs: &mut state.rargs,
                    largs: &mut state.largs,
                };
                self.arena[id.0].opt.process(opt_str, raw, &mut ctx)
            }
        }
    }

    // -- Feedback ------------------------------------------------------

    pub fn get_prog_name(&self) -> String {
        if let Some(prog) = &self.prog {
            return prog.clone();
        }
        let arg0 = std::env::args().next().unwrap_or_default();
        Path::new(&arg0)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&arg0)
            .to_string()
    }

    /// Replace `%prog` with the program name.
    pub fn expand_prog_name(&self, text: &str) -> String {
        text.replace("%prog", &self.get_prog_name())
    }

    pub fn get_usage(&self) -> String {
        match &self.usage {
            Some(usage) => self
                .formatter
                .format_usage(&self.expand_prog_name(usage)),
            None => String::new(),
        }
    }

    pub fn get_version(&self) -> String {
        match &self.version {
            Some(version) => self.expand_prog_name(version),
            None => String::new(),
        }
    }

    pub fn write_usage(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.usage.is_some() {
            writeln!(out, "{}", self.get_usage())
        } else {
            Ok(())
        }
    }

    pub fn print_usage(&self) {
        let _ = self.write_usage(&mut io::stdout());
    }

    pub fn write_version(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.version.is_some() {
            writeln!(out, "{}", self.get_version())
        } else {
            Ok(())
        }
    }

    pub fn print_version(&self) {
        let _ = self.write_version(&mut io::stdout());
    }

    /// Render the full help text: usage, description, the option listing
    /// with group sections, and the epilog.
    pub fn format_help(&mut self) -> String {
        let mut formatter = std::mem::take(&mut self.formatter);
        let result = formatter.format_help(self);
        self.formatter = formatter;
        result
    }

    /// Render just the option listing (heading, options, group sections).
    pub fn format_option_help(&mut self) -> String {
        let mut formatter = std::mem::take(&mut self.formatter);
        let result = formatter.format_option_help(self);
        self.formatter = formatter;
        result
    }

    pub fn write_help(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let text = self.format_help();
        out.write_all(text.as_bytes())
    }

    pub fn print_help(&mut self) {
        let text = self.format_help();
        print!("{text}");
    }

    /// Terminate the process, writing `message` to stderr first when given.
    pub fn exit(&self, status: i32, message: Option<&str>) -> ! {
        if let Some(message) = message {
            let _ = io::stderr().write_all(message.as_bytes());
        }
        std::process::exit(status)
    }

    /// Report a usage error on stderr and terminate with status 2.
    pub fn error(&self, msg: &str) -> ! {
        let _ = self.write_usage(&mut io::stderr());
        self.exit(
            2,
            Some(&format!("{}: error: {}\n", self.get_prog_name(), msg)),
        )
    }
}

fn take_value_tokens(
    opt_str: &str,
    nargs: usize,
    rargs: &mut Vec<String>,
) -> Result<RawValue, ParseError> {
    if rargs.len() < nargs {
        return Err(ParseError::MissingArgument {
            option: opt_str.to_string(),
            nargs,
        });
    }
    if nargs == 1 {
        Ok(RawValue::One(rargs.remove(0)))
    } else {
        Ok(RawValue::Many(rargs.drain(..nargs).collect()))
    }
}

fn strip_usage_prefix(usage: &str) -> String {
    match usage.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("usage: ") => usage[7..].to_string(),
        _ => usage.to_string(),
    }
}
