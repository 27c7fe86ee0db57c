//! # argfig demo application
//!
//! A sample CLI tool that shows how an application wires up
//! [argfig](https://docs.rs/argfig). It exists to demonstrate and manually
//! verify argfig's features, not to do anything useful.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example argfig_demo -- --host example.org
//! cargo run --example argfig_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                       |
//! |-------------------------|--------------------------------------------------------------------------|
//! | Defaults                | `cargo run --example argfig_demo`                                        |
//! | Default config file     | Create `~/.argfig-demo.ini` with `port = 9000`, then run                |
//! | Explicit config file    | `cargo run --example argfig_demo -- -c my.ini`                           |
//! | Env var (auto prefix)   | `ARGFIG_DEMO_PORT=9999 cargo run --example argfig_demo`                  |
//! | Env var (explicit name) | `DEMO_COLOR=red cargo run --example argfig_demo`                         |
//! | Command line            | `cargo run --example argfig_demo -- --port 1234 -t a -t b`               |
//! | Where values came from  | `cargo run --example argfig_demo -- --show-sources`                      |
//! | Write-out               | `cargo run --example argfig_demo -- --port 1 -w out.ini`                 |
//! | Help with config info   | `cargo run --example argfig_demo -- --help`                              |

use argfig::{ArgParser, Arity, OptionSpec, ParsedArgs, ValueType};

// ---------------------------------------------------------------------------
// Parser setup
// ---------------------------------------------------------------------------

/// Build the demo parser.
///
/// Config files: `~/.argfig-demo.ini`, then whatever `-c` names.
/// Env prefix: `ARGFIG_DEMO_` for every option without an explicit variable.
fn make_parser() -> Result<ArgParser, argfig::ArgfigError> {
    let mut parser = ArgParser::builder()
        .prog("argfig-demo")
        .description("Sample CLI app for showcasing argfig.")
        .default_config_files(["~/.argfig-demo.ini"])
        .config_path_flags(["-c", "--config"])
        .write_out_config_flags(["-w", "--write-out-config-file"])
        .auto_env_var_prefix("ARGFIG_DEMO_")
        .build()?;

    parser
        .add_option(
            OptionSpec::new(["--host"])
                .default_value("localhost")
                .help("Server host"),
        )?
        .add_option(
            OptionSpec::new(["-p", "--port"])
                .value_type(ValueType::Integer)
                .default_value("8080")
                .help("Server port"),
        )?
        .add_option(
            OptionSpec::new(["--color"])
                .choices(["red", "green", "yellow", "blue"])
                .default_value("yellow")
                .env_var("DEMO_COLOR")
                .help("Output color"),
        )?
        .add_option(
            OptionSpec::new(["-t", "--tag"])
                .arity(Arity::ListAppend)
                .help("Tags to attach, repeatable"),
        )?
        .add_option(
            OptionSpec::new(["-v", "--verbose"])
                .arity(Arity::Counter)
                .help("More output"),
        )?
        .add_option(
            OptionSpec::new(["--show-sources"])
                .arity(Arity::Flag)
                .help("Print where every value came from"),
        )?;
    Ok(parser)
}

// ---------------------------------------------------------------------------
// ANSI color helpers
// ---------------------------------------------------------------------------

fn ansi_color_code(name: &str) -> &str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn echo_all(args: &ParsedArgs) {
    let color = ansi_color_code(args.get_str("color").unwrap_or("yellow"));

    if args.count("verbose") > 0 {
        println!("{color}[verbose] Resolved settings{RESET}");
        println!();
    }

    let tags = args.get_many::<String>("tag").unwrap_or_default().join(", ");
    let entries = [
        ("host", args.get_str("host").unwrap_or_default().to_string()),
        (
            "port",
            args.get_one::<i64>("port")
                .map(|p| p.to_string())
                .unwrap_or_default(),
        ),
        ("color", args.get_str("color").unwrap_or_default().to_string()),
        ("tags", tags),
    ];

    let max_key_len = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &entries {
        println!("{color}{key:<max_key_len$}{RESET}  {value}");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let mut parser = make_parser().unwrap_or_else(|e| {
        eprintln!("Failed to set up parser:\n{e}");
        std::process::exit(1);
    });
    let args = parser.parse_or_exit();

    if args.flag("show_sources") {
        print!("{}", parser.format_values());
        println!();
    }
    echo_all(&args);
}
