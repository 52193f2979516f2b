//! Getopt-style argument parsing: option containers, abbreviation
//! resolution, the argument-vector processor, and help rendering.
//!
//! The model types live in `optargs-core`; this crate drives them:
//!
//! - [`OptionParser`] — the root container. Owns the canonical short/long
//!   lookup tables and the defaults table, registers options directly or
//!   under titled [`OptionGroup`] sections, and walks argument vectors.
//! - [`match_abbrev`] — stateless resolution of abbreviated long options.
//! - [`HelpFormatter`] — the two-pass layout engine with the
//!   [`IndentedStyle`] and [`TitledStyle`] strategies.
//!
//! # Example
//!
//! ```
//! use optargs_core::{Action, Opt};
//! use optargs_parser::OptionParser;
//!
//! let mut parser = OptionParser::builder()
//!     .prog("filter")
//!     .usage("%prog [options] [file ...]")
//!     .build();
//! parser
//!     .add_option(Opt::new(["-v", "--verbose"]).action(Action::Count))
//!     .unwrap();
//! parser.add_option(Opt::new(["-o", "--output"])).unwrap();
//!
//! let (values, leftover) = parser
//!     .try_parse_args(["-vv", "-o", "out.txt", "notes.txt"], None)
//!     .unwrap();
//! assert_eq!(values.get_int("verbose"), Some(2));
//! assert_eq!(values.get_str("output"), Some("out.txt"));
//! assert_eq!(leftover, ["notes.txt"]);
//! ```

mod abbrev;
mod help;
mod parser;
mod textwrap;

pub use abbrev::match_abbrev;
pub use help::{
    HelpFormatter, HelpStyle, IndentedStyle, LongDelimiter, ShortDelimiter, TitledStyle,
};
pub use parser::{ConflictHandler, GroupId, OptId, OptionGroup, OptionParser, ParserBuilder};
