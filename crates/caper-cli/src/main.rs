use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "caper")]
#[command(about = "Compiler for the caper contract language")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to a target IR module.
    Compile {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Flag additional type names as currencies.
        #[arg(long = "currency")]
        currencies: Vec<String>,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse and translate without emitting anything.
    Check {
        input: PathBuf,

        #[arg(long = "currency")]
        currencies: Vec<String>,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Compile {
            input,
            output,
            format,
            currencies,
            verbose,
        } => cmd_compile(input, output, format, currencies, verbose),
        Commands::Check {
            input,
            currencies,
            verbose,
        } => cmd_check(input, currencies, verbose),
    };

    match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), error);
            ExitCode::FAILURE
        }
    }
}

fn cmd_compile(
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    currencies: Vec<String>,
    verbose: bool,
) -> Result<ExitCode> {
    use caper_emit::ModuleEmitter;
    use std::fs;
    use std::time::Instant;

    if verbose {
        println!("{}", "caper compiler".bright_blue().bold());
        println!("  input: {}", input.display());
        if let Some(ref out) = output {
            println!("  output: {}", out.display());
        }
    }

    let start = Instant::now();
    let source = fs::read_to_string(&input)?;

    let module = match caper_transform::translate_source_with_currencies(&source, &currencies) {
        Ok(module) => module,
        Err(diagnostics) => {
            report_diagnostics(&input, &source, &diagnostics);
            return Ok(ExitCode::FAILURE);
        }
    };

    let rendered = match format {
        OutputFormat::Text => ModuleEmitter::new(module).emit_to_string()?,
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&module)?;
            json.push('\n');
            json
        }
    };

    match output {
        Some(path) => {
            fs::write(&path, &rendered)?;
            if verbose {
                println!(
                    "{} wrote {} in {:.3}s",
                    "ok:".bright_green().bold(),
                    path.display(),
                    start.elapsed().as_secs_f64()
                );
            }
        }
        None => print!("{}", rendered),
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_check(input: PathBuf, currencies: Vec<String>, verbose: bool) -> Result<ExitCode> {
    use std::fs;

    let source = fs::read_to_string(&input)?;
    match caper_transform::translate_source_with_currencies(&source, &currencies) {
        Ok(module) => {
            println!("{}", "ok".bright_green().bold());
            if verbose {
                println!(
                    "  module {}: {} field(s), {} procedure(s)",
                    module.name,
                    module.resource.fields.len(),
                    module.procedures.len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(diagnostics) => {
            report_diagnostics(&input, &source, &diagnostics);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print every diagnostic keyed by `file:line:column`.
fn report_diagnostics(
    input: &std::path::Path,
    source: &str,
    diagnostics: &caper_transform::Diagnostics,
) {
    for error in diagnostics.iter() {
        let (line, column) = error.span().line_col(source);
        eprintln!(
            "{} {}:{}:{}: {}",
            "error:".bright_red().bold(),
            input.display(),
            line,
            column,
            error
        );
    }
}
