//! asmcalc - evaluate and inspect assembler formulas from the shell

use anyhow::{bail, Context, Result};
use assembler_formula::{
    bracket_hints, calculate_with_options, highlight, CalculationOptions, TokenKind, Value,
    Variables,
};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "asmcalc")]
#[command(author, version, about = "Evaluate and inspect product assembler formulas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a formula and print the result record as JSON
    #[command(alias = "calc")]
    Eval {
        #[command(flatten)]
        source: FormulaSource,

        /// Bind a variable (NAME=VALUE); may be repeated
        #[arg(short = 'v', long = "var", value_parser = parse_binding)]
        vars: Vec<(String, Value)>,

        /// JSON object file with initial variables (overridden by --var)
        #[arg(long = "vars")]
        vars_file: Option<PathBuf>,

        /// Maximum expression nesting depth
        #[arg(long, default_value = "128")]
        max_depth: usize,

        /// Look up `{A.B}` as written instead of as `{AB}`
        #[arg(long)]
        keep_dots: bool,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the highlighting tokens of a formula, one per line
    Tokens {
        #[command(flatten)]
        source: FormulaSource,

        /// Include whitespace tokens
        #[arg(long)]
        whitespace: bool,
    },

    /// Report unbalanced brackets in a formula
    Check {
        #[command(flatten)]
        source: FormulaSource,
    },
}

#[derive(Args)]
struct FormulaSource {
    /// Formula text, or '-' to read from stdin
    formula: Option<String>,

    /// Read the formula from a file
    #[arg(short, long, conflicts_with = "formula")]
    file: Option<PathBuf>,
}

/// Exit status for a failed calculation or unbalanced brackets
const FAILURE_STATUS: u8 = 2;

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    let status = match cli.command {
        Commands::Eval {
            source,
            vars,
            vars_file,
            max_depth,
            keep_dots,
            pretty,
        } => {
            let formula = read_formula(&source)?;
            let options = CalculationOptions {
                max_depth,
                strip_variable_dots: !keep_dots,
            };
            eval(
                &formula,
                vars,
                vars_file.as_deref(),
                &options,
                pretty,
                &mut stdout,
            )?
        }
        Commands::Tokens { source, whitespace } => {
            tokens(&read_formula(&source)?, whitespace, &mut stdout)?
        }
        Commands::Check { source } => check(&read_formula(&source)?, &mut stdout)?,
    };

    Ok(ExitCode::from(status))
}

fn eval(
    formula: &str,
    bindings: Vec<(String, Value)>,
    vars_file: Option<&Path>,
    options: &CalculationOptions,
    pretty: bool,
    out: &mut impl Write,
) -> Result<u8> {
    let mut variables = match vars_file {
        Some(path) => load_variables(path)?,
        None => Variables::new(),
    };
    variables.extend_from(bindings.into_iter().collect());
    log::debug!("Calculating with {} initial variables", variables.len());

    let result = calculate_with_options(formula, &mut variables, options);

    let json = if pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to serialize result")?;

    writeln!(out, "{}", json).context("Failed to write result")?;

    Ok(if result.is_ok() { 0 } else { FAILURE_STATUS })
}

fn tokens(formula: &str, whitespace: bool, out: &mut impl Write) -> Result<u8> {
    for token in highlight(formula) {
        if !whitespace && token.kind == TokenKind::Whitespace {
            continue;
        }
        writeln!(out, "{}\t{}", token.kind.as_str(), token.text.escape_debug())
            .context("Failed to write tokens")?;
    }

    Ok(0)
}

fn check(formula: &str, out: &mut impl Write) -> Result<u8> {
    let hints = bracket_hints(formula);

    if hints.is_empty() {
        writeln!(out, "ok").context("Failed to write hints")?;
        return Ok(0);
    }

    for hint in &hints {
        writeln!(out, "{}", hint).context("Failed to write hints")?;
    }
    Ok(FAILURE_STATUS)
}

fn read_formula(source: &FormulaSource) -> Result<String> {
    if let Some(path) = &source.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()));
    }

    match source.formula.as_deref() {
        Some("-") | None => {
            let mut formula = String::new();
            io::stdin()
                .read_to_string(&mut formula)
                .context("Failed to read formula from stdin")?;
            Ok(formula)
        }
        Some(text) => Ok(text.to_string()),
    }
}

/// Load a JSON object of name → number/bool/string
fn load_variables(path: &Path) -> Result<Variables> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON object of variables", path.display()))
}

/// Parse `NAME=VALUE` from the command line
fn parse_binding(arg: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("expected NAME=VALUE, got '{}'", arg);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("variable name is empty in '{}'", arg);
    }

    let raw = raw.trim();
    let value = match raw {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => match raw.parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(raw.to_string()),
        },
    };

    Ok((name.to_string(), value))
}
