//! Demonstration front end: declares a realistic option set, parses the
//! process argument vector with the library, and prints the result record
//! plus leftover positionals as JSON.

use optargs_core::{Action, Opt, OptionError, ValueKind};
use optargs_parser::{ConflictHandler, OptionParser};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_parser() -> Result<OptionParser, OptionError> {
    let mut parser = OptionParser::builder()
        .prog("optargs-demo")
        .usage("%prog [options] [file ...]")
        .version(&format!("%prog {VERSION}"))
        .description(
            "Scan the given files and report lines that match the configured \
             patterns. With no files, read standard input.",
        )
        .epilog("The report lands on stdout as a single JSON document.")
        .conflict_handler(ConflictHandler::Error)
        .build();

    parser.add_option(
        Opt::new(["-v", "--verbose"])
            .action(Action::Count)
            .dest("verbosity")
            .help("increase diagnostic output (repeatable)"),
    )?;
    parser.add_option(
        Opt::new(["-q", "--quiet"])
            .action(Action::StoreConst)
            .dest("verbosity")
            .const_value(0i64)
            .help("silence diagnostics"),
    )?;
    parser.add_option(
        Opt::new(["-o", "--output"])
            .metavar("FILE")
            .help("write the report to FILE instead of stdout"),
    )?;
    parser.add_option(
        Opt::new(["--format"])
            .choices(["text", "json", "csv"])
            .default_value("json")
            .help("report format (default: %default)"),
    )?;
    parser.add_option(
        Opt::new(["--max-count"])
            .kind(ValueKind::Int)
            .default_value("0x19")
            .metavar("N")
            .help("stop after N matches per file (default: %default)"),
    )?;

    let matching = parser.add_option_group(
        "Matching Options",
        Some("Patterns are tried in the order given."),
    );
    parser.add_group_option(
        matching,
        Opt::new(["-I", "--include"])
            .action(Action::Append)
            .metavar("PATTERN")
            .help("report lines matching PATTERN (repeatable)"),
    )?;
    parser.add_group_option(
        matching,
        Opt::new(["-X", "--exclude"])
            .action(Action::Append)
            .metavar("PATTERN")
            .help("drop lines matching PATTERN (repeatable)"),
    )?;
    parser.add_group_option(
        matching,
        Opt::new(["--between"])
            .kind(ValueKind::Int)
            .nargs(2)
            .metavar("START END")
            .help("only consider lines numbered START through END"),
    )?;

    Ok(parser)
}

fn main() {
    let mut parser = match build_parser() {
        Ok(parser) => parser,
        Err(err) => {
            eprintln!("optargs-demo: {err}");
            std::process::exit(1);
        }
    };

    let (values, files) = parser.parse_args_from_env();

    let report = serde_json::json!({
        "options": values,
        "files": files,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("optargs-demo: {err}");
            std::process::exit(1);
        }
    }
}
