//! CLI entry point for the test-description compiler.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use testplan_compiler::{compiler, output, schema, OutputFormat};

#[derive(Parser)]
#[command(name = "testplanc")]
#[command(author, version, about = "Compiles annotated test descriptions into test units")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile all test descriptions under a directory
    Compile {
        /// Path to the test suite directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// YAML schema description for the plan's root message type;
        /// paths resolve unconstrained when omitted
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Recompile descriptions even when their output is up-to-date
        #[arg(long, default_value = "false")]
        force: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Remove all generated test units and side files
    Clean {
        /// Path to the test suite directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            path,
            schema: schema_path,
            force,
            format,
        } => {
            let root = match schema_path {
                Some(schema_path) => match schema::MessageSchema::from_file(&schema_path) {
                    Ok(root) => Some(root),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::from(2);
                    }
                },
                None => None,
            };

            let result = compiler::compile_suite(
                &path,
                root.as_ref().map(|r| r as &dyn schema::MessageNode),
                &schema::JsonPlanSerializer,
                force,
            );
            println!("{}", output::format_batch_result(&result, format.into()));

            if result.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }

        Commands::Clean { path } => match compiler::clean_suite(&path) {
            Ok(removed) => {
                println!("Removed {} generated file(s)", removed);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(2)
            }
        },
    }
}
