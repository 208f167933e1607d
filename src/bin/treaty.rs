//! Treaty CLI
//!
//! Command-line interface for linting treaty declarations and running
//! payloads through them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use treaty::{
    adapt_response, lint, load_declaration_auto, load_json, validate_request, Direction,
    ExecutorRegistry, FileStatus, Severity, Treaty,
};

#[derive(Parser)]
#[command(name = "treaty")]
#[command(about = "Lint versioned API contracts and validate payloads against them")]
#[command(version)]
struct Cli {
    /// Log filter (e.g. debug, treaty=trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint declaration files for errors (syntax, shape, schema)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Run a payload through the request (or response) schema of a version
    Validate {
        /// Declaration source: file path or URL (http:// or https://)
        contract: String,

        /// Payload file to validate
        payload: PathBuf,

        /// Version to validate against (default version if omitted)
        #[arg(long)]
        version: Option<String>,

        /// Treat the payload as executor output; versions using the direct
        /// strategy pass it through unchanged
        #[arg(long)]
        response: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// List the versions a declaration defines
    Versions {
        /// Declaration source: file path or URL (http:// or https://)
        contract: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),

        Commands::Validate {
            contract,
            payload,
            version,
            response,
            pretty,
            output,
            json,
        } => run_validate(ValidateArgs {
            contract,
            payload,
            version,
            response,
            pretty,
            output,
            json_output: json,
        }),

        Commands::Versions { contract, json } => run_versions(&contract, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load and build a declaration. Executors aren't needed to check payloads.
fn load_treaty(source: &str, json_output: bool) -> Result<Treaty, u8> {
    let declaration = load_declaration_auto(source).map_err(|e| {
        report_error(json_output, &format!("loading contract: {}", e));
        e.exit_code() as u8
    })?;

    declaration.build(ExecutorRegistry::new()).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })
}

struct ValidateArgs {
    contract: String,
    payload: PathBuf,
    version: Option<String>,
    response: bool,
    pretty: bool,
    output: Option<PathBuf>,
    json_output: bool,
}

fn run_validate(args: ValidateArgs) -> Result<(), u8> {
    let ValidateArgs {
        contract,
        payload: payload_path,
        version,
        response,
        pretty,
        output,
        json_output,
    } = args;

    let treaty = load_treaty(&contract, json_output)?;

    let payload = load_json(&payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let factory = treaty.resolve(version.as_deref()).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let result = match Direction::from_request_flag(!response) {
        Direction::Request => validate_request(factory, &payload),
        Direction::Response => adapt_response(factory, payload),
    };

    let data = match result {
        Ok(data) => data,
        Err(e) => {
            if json_output {
                let output = json!({
                    "valid": false,
                    "version": factory.version().to_string(),
                    "status": e.http_status(),
                    "error": e.to_string(),
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                eprintln!("  {}", e);
            }
            return Err(e.exit_code() as u8);
        }
    };

    let document = if json_output {
        json!({
            "valid": true,
            "version": factory.version().to_string(),
            "data": data,
        })
    } else {
        data
    };

    write_output(&document, pretty, output.as_deref())
}

fn write_output(document: &Value, pretty: bool, output: Option<&Path>) -> Result<(), u8> {
    let rendered = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn run_versions(contract: &str, json_output: bool) -> Result<(), u8> {
    let treaty = load_treaty(contract, json_output)?;

    if json_output {
        let versions: Vec<Value> = treaty
            .versions()
            .iter()
            .map(|factory| {
                json!({
                    "version": factory.version().to_string(),
                    "default": factory.is_default(),
                    "deprecated": factory.is_deprecated(),
                    "strategy": factory.strategy().code(),
                    "summary": factory.summary(),
                })
            })
            .collect();
        println!("{}", json!({ "name": treaty.name(), "versions": versions }));
        return Ok(());
    }

    println!("{}", treaty.name());
    for factory in treaty.versions().iter() {
        let mut flags = vec![factory.strategy().code()];
        if factory.is_default() {
            flags.push("default");
        }
        if factory.is_deprecated() {
            flags.push("deprecated");
        }
        match factory.summary() {
            Some(summary) => println!("  {} [{}] {}", factory.version(), flags.join(", "), summary),
            None => println!("  {} [{}]", factory.version(), flags.join(", ")),
        }
    }
    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, strict);

    if format == "json" {
        let rendered = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        // Text output
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
