//! datatpl CLI - evaluate serialized expression trees against property documents

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use datatpl::error::format_eval_error;
use datatpl::{EvalError, EvalOptions, Evaluator, Expression, StringNumberPolicy, Value};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "datatpl")]
#[command(about = "Data templates - evaluate typed expressions against feature properties", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression and print the result
    Eval {
        /// Path to the expression tree (JSON or YAML)
        expression: PathBuf,

        /// Path to the property document (JSON or YAML object)
        #[arg(short, long)]
        properties: Option<PathBuf>,

        /// Result type to evaluate as
        #[arg(long = "as", value_enum, default_value = "string")]
        result_type: ResultType,

        /// Output format (text, json, yaml)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Fail when a referenced property is absent
        #[arg(long)]
        strict: bool,

        /// Parse numeric text instead of coercing every string to 1
        #[arg(long)]
        parse_numbers: bool,

        /// Maximum evaluation depth (0 disables the limit)
        #[arg(long)]
        max_depth: Option<usize>,

        /// TOML file with evaluation options
        #[arg(long)]
        options: Option<PathBuf>,
    },

    /// Show the shape of an expression tree
    Inspect {
        /// Path to the expression tree (JSON or YAML)
        expression: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResultType {
    String,
    Number,
    Bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Change directory if specified
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }

    match cli.command {
        Commands::Eval {
            expression,
            properties,
            result_type,
            format,
            strict,
            parse_numbers,
            max_depth,
            options,
        } => {
            let expr: Expression = read_document(&expression)?;
            let props: Value = match &properties {
                Some(path) => read_document(path)?,
                None => Value::Map(Default::default()),
            };
            if !matches!(props, Value::Map(_)) {
                bail!("property document must be an object, found {}", props.type_name());
            }

            // An options file replaces defaults plus environment; flags override either
            let mut eval_options = match &options {
                Some(path) => EvalOptions::load(path)?,
                None => EvalOptions::default().with_env_overrides(),
            };
            if strict {
                eval_options = eval_options.strict();
            }
            if parse_numbers {
                eval_options = eval_options.with_string_numbers(StringNumberPolicy::Parse);
            }
            if let Some(depth) = max_depth {
                eval_options = eval_options.with_max_depth((depth > 0).then_some(depth));
            }
            debug!(
                nodes = expr.node_count(),
                depth = expr.depth(),
                options = ?eval_options,
                "evaluating expression"
            );

            let evaluator = Evaluator::with_options(eval_options);
            let result = match evaluate(&evaluator, &expr, &props, result_type) {
                Ok(result) => result,
                Err(e) => {
                    eprint!("{}", format_eval_error(&e));
                    std::process::exit(1);
                }
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&result)?),
                OutputFormat::Text => println!("{}", format_result(&result)),
            }
        }

        Commands::Inspect { expression } => {
            let expr: Expression = read_document(&expression)?;
            println!("{} {}", "Expression:".cyan().bold(), expression.display());
            println!("  {} {}", "root:".bold(), expr.kind_name());
            println!("  {} {}", "nodes:".bold(), expr.node_count());
            println!("  {} {}", "depth:".bold(), expr.depth());
        }
    }

    Ok(())
}

/// Evaluate as the requested type, carrying the result back as a `Value`
fn evaluate(
    evaluator: &Evaluator,
    expr: &Expression,
    props: &Value,
    result_type: ResultType,
) -> Result<Value, EvalError> {
    Ok(match result_type {
        ResultType::String => Value::Str(evaluator.try_evaluate_as(expr, props)?),
        ResultType::Number => Value::Float(evaluator.try_evaluate_as(expr, props)?),
        ResultType::Bool => Value::Bool(evaluator.try_evaluate_as(expr, props)?),
    })
}

/// Format a result for display
fn format_result(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        other => datatpl::coerce::to_string(other),
    }
}

/// Read a JSON or YAML document, chosen by file extension
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");

    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML: {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON: {}", path.display()))
    }
}
