//! Command-line interface for hilite
//! Highlights a code snippet read from a file or stdin and prints markup or a token stream.
//!
//! Usage:
//!   hilite [`<path>`|-] [--language `<lang>`] [--format html|json] [--config `<file>`] [--block]
//!   hilite --list-languages

use clap::{Arg, ArgAction, ArgMatches, Command};
use hilite::hilite::config::{HiliteConfig, Loader, OutputFormat};
use hilite::Highlighter;
use std::io::Read;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("hilite")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Grammar-driven syntax highlighting for code snippets")
        .arg(
            Arg::new("path")
                .help("File to highlight; '-' or nothing reads stdin")
                .index(1),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .short('l')
                .help("Language id (e.g. 'javascript', 'py', 'c++'); detected when omitted"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default from configuration: html)")
                .value_parser(["html", "json"]),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("block")
                .long("block")
                .help("Wrap html output in <pre><code class=\"language-x\">")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-languages")
                .long("list-languages")
                .help("List registered language ids")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("More log output on stderr (repeat for trace)")
                .action(ArgAction::Count),
        )
        .get_matches();

    init_logging(matches.get_count("verbose"));

    let config = load_config(&matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    let highlighter = Highlighter::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Failed to build grammars: {}", e);
        std::process::exit(1);
    });

    if matches.get_flag("list-languages") {
        handle_list_languages_command(&highlighter);
        return;
    }

    let path = matches.get_one::<String>("path").map(String::as_str);
    let text = read_input(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.unwrap_or("stdin"), e);
        std::process::exit(1);
    });
    let requested = matches.get_one::<String>("language").map(String::as_str);
    handle_highlight_command(&highlighter, &config, &text, requested);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then the `--config` file, then flags
fn load_config(matches: &ArgMatches) -> Result<HiliteConfig, config::ConfigError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.output_format(format)?;
    }
    if matches.get_flag("block") {
        loader = loader.code_block(true)?;
    }
    loader.build()
}

fn read_input(path: Option<&str>) -> std::io::Result<String> {
    match path {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path),
    }
}

fn handle_highlight_command(
    highlighter: &Highlighter,
    config: &HiliteConfig,
    text: &str,
    requested: Option<&str>,
) {
    if let Some(language) = requested {
        if !highlighter.registry().has(language) {
            warn!(
                language,
                fallback = %highlighter.settings().fallback_language,
                "unknown language"
            );
        }
    }
    let language = highlighter.resolve_language(text, requested);
    debug!(language = %language, "resolved language");

    let output = match config.output.format {
        OutputFormat::Json => highlighter
            .tokenize(text, &language)
            .map_err(|e| e.to_string())
            .and_then(|nodes| serde_json::to_string_pretty(&nodes).map_err(|e| e.to_string())),
        OutputFormat::Html if config.render.code_block => highlighter
            .highlight_block(text, &language)
            .map_err(|e| e.to_string()),
        OutputFormat::Html => highlighter
            .highlight(text, &language)
            .map_err(|e| e.to_string()),
    };

    match output {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Highlighting failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn handle_list_languages_command(highlighter: &Highlighter) {
    println!("Available languages:\n");
    for language in highlighter.registry().list_languages() {
        println!("  {}", language);
    }
}
