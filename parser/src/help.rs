//! Help rendering: a two-pass formatter over a parser's option listing.
//!
//! Pass 1 ([`HelpFormatter::store_option_strings`]) renders every option's
//! label ("-f FILE, --file=FILE") and derives the help column from the
//! widest label, bounded by a configured ceiling. Pass 2 renders the usage
//! line, description, each option's label plus word-wrapped help text,
//! group sections, and the epilog. The formatter only reads parser state;
//! its own fields are the layout cache.

use std::collections::HashMap;
use std::fmt;

use optargs_core::{Opt, Val};

use crate::parser::{OptId, OptionGroup, OptionParser};
use crate::textwrap;

/// Substituted for `%default` when an option has no resolved default.
const NO_DEFAULT_VALUE: &str = "none";

const DEFAULT_WIDTH: usize = 78;

/// How a value-taking short option joins its metavar: `-fFILE` or
/// `-f FILE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortDelimiter {
    Attached,
    Space,
}

/// How a value-taking long option joins its metavar: `--file=FILE` or
/// `--file FILE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongDelimiter {
    Equals,
    Space,
}

/// A layout strategy: how usage lines and section headings are rendered.
pub trait HelpStyle: fmt::Debug + Send + Sync {
    fn format_usage(&self, usage: &str) -> String;
    fn format_heading(&self, heading: &str, current_indent: usize, level: usize) -> String;
}

/// Indented section bodies under plain `Heading:` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentedStyle;

impl HelpStyle for IndentedStyle {
    fn format_usage(&self, usage: &str) -> String {
        format!("Usage: {usage}\n")
    }

    fn format_heading(&self, heading: &str, current_indent: usize, _level: usize) -> String {
        format!("{:indent$}{heading}:\n", "", indent = current_indent)
    }
}

/// Underlined section headings, `=` at the top level and `-` below it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitledStyle;

impl HelpStyle for TitledStyle {
    fn format_usage(&self, usage: &str) -> String {
        format!("{}  {usage}\n", self.format_heading("Usage", 0, 0))
    }

    fn format_heading(&self, heading: &str, _current_indent: usize, level: usize) -> String {
        let underline = ['=', '-'][level.min(1)];
        let line: String = std::iter::repeat(underline)
            .take(heading.chars().count())
            .collect();
        format!("{heading}\n{line}\n")
    }
}

/// The shared two-pass layout engine behind both help styles.
///
/// # Examples
///
/// ```
/// use optargs_core::Opt;
/// use optargs_parser::{HelpFormatter, OptionParser};
///
/// let mut parser = OptionParser::builder().prog("tool").build();
/// parser.add_option(Opt::new(["-f", "--file"]).help("read data from FILE")).unwrap();
/// let help = parser.format_help();
/// assert!(help.starts_with("Usage: tool [options]\n"));
/// assert!(help.contains("-f FILE, --file=FILE"));
/// ```
#[derive(Debug)]
pub struct HelpFormatter {
    style: Box<dyn HelpStyle>,
    indent_increment: usize,
    max_help_position: usize,
    width: usize,
    short_first: bool,
    short_delimiter: ShortDelimiter,
    long_delimiter: LongDelimiter,
    default_tag: Option<String>,
    current_indent: usize,
    level: usize,
    help_position: usize,
    help_width: usize,
    option_strings: HashMap<OptId, String>,
}

impl Default for HelpFormatter {
    fn default() -> Self {
        Self::indented()
    }
}

impl HelpFormatter {
    /// The classic indented layout; short options listed first.
    pub fn indented() -> Self {
        Self::with_style(Box::new(IndentedStyle), 2, 24, true)
    }

    /// Underlined headings, no body indent; long options listed first.
    pub fn titled() -> Self {
        Self::with_style(Box::new(TitledStyle), 0, 24, false)
    }

    pub fn with_style(
        style: Box<dyn HelpStyle>,
        indent_increment: usize,
        max_help_position: usize,
        short_first: bool,
    ) -> Self {
        HelpFormatter {
            style,
            indent_increment,
            max_help_position,
            width: DEFAULT_WIDTH,
            short_first,
            short_delimiter: ShortDelimiter::Space,
            long_delimiter: LongDelimiter::Equals,
            default_tag: Some("%default".to_string()),
            current_indent: 0,
            level: 0,
            help_position: max_help_position,
            help_width: 0,
            option_strings: HashMap::new(),
        }
    }

    /// Total output width in columns. Never probed from the environment.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_short_delimiter(mut self, delimiter: ShortDelimiter) -> Self {
        self.short_delimiter = delimiter;
        self
    }

    pub fn with_long_delimiter(mut self, delimiter: LongDelimiter) -> Self {
        self.long_delimiter = delimiter;
        self
    }

    /// Turn off `%default` substitution in help strings.
    pub fn without_default_expansion(mut self) -> Self {
        self.default_tag = None;
        self
    }

    pub fn indent(&mut self) {
        self.current_indent += self.indent_increment;
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(self.indent_increment);
        self.level = self.level.saturating_sub(1);
    }

    pub fn format_usage(&self, usage: &str) -> String {
        self.style.format_usage(usage)
    }

    fn format_heading(&self, heading: &str) -> String {
        self.style
            .format_heading(heading, self.current_indent, self.level)
    }

    fn format_text(&self, text: &str) -> String {
        let text_width = self.width.saturating_sub(self.current_indent).max(11);
        let indent = " ".repeat(self.current_indent);
        textwrap::fill(text, text_width, &indent, &indent)
    }

    pub fn format_description(&self, description: &str) -> String {
        format!("{}\n", self.format_text(description))
    }

    pub fn format_epilog(&self, epilog: Option<&str>) -> String {
        match epilog {
            Some(epilog) => format!("\n{}\n", self.format_text(epilog)),
            None => String::new(),
        }
    }

    /// Render the full help text for `parser`.
    pub fn format_help(&mut self, parser: &OptionParser) -> String {
        let mut result = String::new();
        if let Some(usage) = parser.usage() {
            result.push_str(&self.format_usage(&parser.expand_prog_name(usage)));
            result.push('\n');
        }
        if let Some(description) = parser.description() {
            result.push_str(&self.format_description(&parser.expand_prog_name(description)));
            result.push('\n');
        }
        result.push_str(&self.format_option_help(parser));
        result.push_str(&self.format_epilog(parser.epilog()));
        result
    }

    /// Render the option listing: heading, the parser's own options, then
    /// each group section.
    pub fn format_option_help(&mut self, parser: &OptionParser) -> String {
        self.store_option_strings(parser);
        let mut result: Vec<String> = Vec::new();
        result.push(self.format_heading("Options"));
        self.indent();
        if !parser.direct_option_ids().is_empty() {
            result.push(self.format_container_options(parser, parser.direct_option_ids()));
            result.push("\n".to_string());
        }
        for group in parser.groups() {
            result.push(self.format_group(parser, group));
            result.push("\n".to_string());
        }
        self.dedent();
        // Drop the trailing separator, or the heading when there is
        // nothing to list under it.
        result.pop();
        result.concat()
    }

    fn format_group(&mut self, parser: &OptionParser, group: &OptionGroup) -> String {
        let mut result = self.format_heading(group.title());
        self.indent();
        let mut parts: Vec<String> = Vec::new();
        if let Some(description) = group.description() {
            parts.push(self.format_description(description));
        }
        if !group.option_ids().is_empty() {
            parts.push(self.format_container_options(parser, group.option_ids()));
        }
        result.push_str(&parts.join("\n"));
        self.dedent();
        result
    }

    fn format_container_options(&mut self, parser: &OptionParser, ids: &[OptId]) -> String {
        let mut result = String::new();
        for &id in ids {
            if !parser.opt(id).hidden() {
                result.push_str(&self.format_option(parser, id));
            }
        }
        result
    }

    /// Pass 1: compute each option's label and the final help column.
    pub fn store_option_strings(&mut self, parser: &OptionParser) {
        self.option_strings.clear();
        let mut max_len = 0usize;
        self.indent();
        for &id in parser.direct_option_ids() {
            let strings = self.format_option_strings(parser.opt(id));
            max_len = max_len.max(strings.chars().count() + self.current_indent);
            self.option_strings.insert(id, strings);
        }
        self.indent();
        for group in parser.groups() {
            for &id in group.option_ids() {
                let strings = self.format_option_strings(parser.opt(id));
                max_len = max_len.max(strings.chars().count() + self.current_indent);
                self.option_strings.insert(id, strings);
            }
        }
        self.dedent();
        self.dedent();
        self.help_position = (max_len + 2).min(self.max_help_position);
        self.help_width = self.width.saturating_sub(self.help_position).max(11);
    }

    /// The label rendered for one option, e.g. `-f FILE, --file=FILE`.
    pub fn format_option_strings(&self, opt: &Opt) -> String {
        let (short_opts, long_opts): (Vec<String>, Vec<String>) = if opt.takes_value() {
            let metavar = opt.metavar().map(str::to_string).unwrap_or_else(|| {
                opt.dest()
                    .expect("a value-taking option has a destination")
                    .to_uppercase()
            });
            (
                opt.short_opts()
                    .iter()
                    .map(|s| match self.short_delimiter {
                        ShortDelimiter::Attached => format!("{s}{metavar}"),
                        ShortDelimiter::Space => format!("{s} {metavar}"),
                    })
                    .collect(),
                opt.long_opts()
                    .iter()
                    .map(|l| match self.long_delimiter {
                        LongDelimiter::Equals => format!("{l}={metavar}"),
                        LongDelimiter::Space => format!("{l} {metavar}"),
                    })
                    .collect(),
            )
        } else {
            (opt.short_opts().to_vec(), opt.long_opts().to_vec())
        };
        let opts: Vec<String> = if self.short_first {
            short_opts.into_iter().chain(long_opts).collect()
        } else {
            long_opts.into_iter().chain(short_opts).collect()
        };
        opts.join(", ")
    }

    /// Pass 2 for one option: label column plus wrapped help text. The
    /// label and the first help line share a row only when the label fits
    /// before the help column.
    fn format_option(&mut self, parser: &OptionParser, id: OptId) -> String {
        let opt = parser.opt(id);
        let opts = self.option_strings.get(&id).cloned().unwrap_or_default();
        let opt_width = self.help_position.saturating_sub(self.current_indent + 2);
        let mut result = String::new();
        let indent_first = if opts.chars().count() > opt_width {
            result.push_str(&format!(
                "{:indent$}{opts}\n",
                "",
                indent = self.current_indent
            ));
            self.help_position
        } else {
            result.push_str(&format!(
                "{:indent$}{opts:<opt_width$}  ",
                "",
                indent = self.current_indent
            ));
            0
        };
        let help = opt.help().filter(|help| !help.is_empty());
        if let Some(help) = help {
            let help_text = self.expand_default(parser, opt, help);
            let lines = textwrap::wrap(&help_text, self.help_width);
            match lines.split_first() {
                Some((first, rest)) => {
                    result.push_str(&format!("{:indent$}{first}\n", "", indent = indent_first));
                    for line in rest {
                        result.push_str(&format!(
                            "{:indent$}{line}\n",
                            "",
                            indent = self.help_position
                        ));
                    }
                }
                None => result.push('\n'),
            }
        } else if !result.ends_with('\n') {
            result.push('\n');
        }
        result
    }

    /// Substitute `%default` with the option's resolved default.
    fn expand_default(&self, parser: &OptionParser, opt: &Opt, help: &str) -> String {
        let Some(tag) = &self.default_tag else {
            return help.to_string();
        };
        let default = opt.dest().and_then(|dest| parser.defaults_table().get(dest));
        let rendered = match default {
            None | Some(Val::None) => NO_DEFAULT_VALUE.to_string(),
            Some(value) => value.to_string(),
        };
        help.replace(tag.as_str(), &rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optargs_core::{Action, Opt, ValueKind};
    use crate::parser::OptionParser;

    #[test]
    fn test_titled_heading_underline_tracks_level() {
        let style = TitledStyle;
        assert_eq!(style.format_heading("Options", 0, 0), "Options\n=======\n");
        assert_eq!(style.format_heading("Group", 2, 1), "Group\n-----\n");
    }

    #[test]
    fn test_option_label_orders_and_delimiters() {
        let mut parser = OptionParser::builder().prog("t").no_help_option().build();
        parser
            .add_option(Opt::new(["-f", "--file"]).kind(ValueKind::Str))
            .unwrap();
        let opt = parser.get_option("-f").unwrap();

        let indented = HelpFormatter::indented();
        assert_eq!(indented.format_option_strings(opt), "-f FILE, --file=FILE");

        let titled = HelpFormatter::titled();
        assert_eq!(titled.format_option_strings(opt), "--file=FILE, -f FILE");

        let attached = HelpFormatter::indented()
            .with_short_delimiter(ShortDelimiter::Attached)
            .with_long_delimiter(LongDelimiter::Space);
        assert_eq!(attached.format_option_strings(opt), "-fFILE, --file FILE");
    }

    #[test]
    fn test_metavar_overrides_uppercased_dest() {
        let mut parser = OptionParser::builder().prog("t").no_help_option().build();
        parser
            .add_option(Opt::new(["--log-level"]).metavar("LEVEL"))
            .unwrap();
        let formatter = HelpFormatter::indented();
        assert_eq!(
            formatter.format_option_strings(parser.get_option("--log-level").unwrap()),
            "--log-level=LEVEL"
        );

        parser.add_option(Opt::new(["--out-dir"])).unwrap();
        assert_eq!(
            formatter.format_option_strings(parser.get_option("--out-dir").unwrap()),
            "--out-dir=OUT_DIR"
        );
    }

    #[test]
    fn test_switch_label_has_no_metavar() {
        let mut parser = OptionParser::builder().prog("t").no_help_option().build();
        parser
            .add_option(Opt::new(["-v", "--verbose"]).action(Action::StoreTrue))
            .unwrap();
        let formatter = HelpFormatter::indented();
        assert_eq!(
            formatter.format_option_strings(parser.get_option("-v").unwrap()),
            "-v, --verbose"
        );
    }

    #[test]
    fn test_expand_default_substitution() {
        let mut parser = OptionParser::builder().prog("t").no_help_option().build();
        parser
            .add_option(
                Opt::new(["--retries"])
                    .kind(ValueKind::Int)
                    .default_value(3i64)
                    .help("retry count (default: %default)"),
            )
            .unwrap();
        parser
            .add_option(Opt::new(["--tag"]).help("tag (default: %default)"))
            .unwrap();

        let help = parser.format_help();
        assert!(help.contains("retry count (default: 3)"));
        assert!(help.contains("tag (default: none)"));
    }

    #[test]
    fn test_default_expansion_can_be_disabled() {
        let mut parser = OptionParser::builder()
            .prog("t")
            .no_help_option()
            .formatter(HelpFormatter::indented().without_default_expansion())
            .build();
        parser
            .add_option(
                Opt::new(["--retries"])
                    .kind(ValueKind::Int)
                    .default_value(3i64)
                    .help("retry count (default: %default)"),
            )
            .unwrap();
        assert!(parser.format_help().contains("%default"));
    }

    #[test]
    fn test_hidden_options_are_skipped() {
        let mut parser = OptionParser::builder().prog("t").no_help_option().build();
        parser
            .add_option(Opt::new(["--secret"]).action(Action::StoreTrue).hidden())
            .unwrap();
        parser
            .add_option(Opt::new(["--public"]).action(Action::StoreTrue).help("visible"))
            .unwrap();
        let help = parser.format_help();
        assert!(!help.contains("--secret"));
        assert!(help.contains("--public"));
    }
}
