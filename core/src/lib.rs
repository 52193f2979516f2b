//! Core model for getopt-style command-line parsing.
//!
//! This crate defines the pieces a parser front end composes:
//!
//! - [`Opt`] — one declared switch or value-taking flag, built through
//!   [`OptBuilder`] so every attribute combination is validated up front.
//! - [`Action`] / [`ValueKind`] — what matching an option does, and what
//!   type its value converts to.
//! - [`Val`] / [`Values`] — the tagged value and the record that
//!   accumulates parsed results, with the `ensure`-with-default operation
//!   used by the append and count actions.
//! - [`OptionError`] / [`ParseError`] — declaration-time and parse-time
//!   failures, kept separate because only the latter reflect user input.
//!
//! No I/O happens here; argument-vector processing and help rendering live
//! in the companion parser crate.
//!
//! # Example
//!
//! ```
//! use optargs_core::{Action, Opt, Val, ValueKind, Values};
//!
//! let verbose = Opt::new(["-v", "--verbose"])
//!     .action(Action::StoreTrue)
//!     .help("explain what is being done")
//!     .build()
//!     .unwrap();
//! assert_eq!(verbose.dest(), Some("verbose"));
//!
//! let mut values = Values::new();
//! values.set(verbose.dest().unwrap(), Val::Bool(true));
//! assert_eq!(values.get_bool("verbose"), Some(true));
//! ```

mod errors;
mod option;
mod values;

pub use errors::{OptionError, ParseError};
pub use option::{Action, CallbackFn, Opt, OptBuilder, RawValue, ValueKind};
pub use values::{CallbackContext, Val, Values};
