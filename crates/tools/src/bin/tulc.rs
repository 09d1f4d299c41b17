//!
//! Compile a TUL program into a variable layout map.
//!
//! Usage: `tulc <input.tul> [-o map.json] [--oracle-cmd CMD] [--oracle-module FILE]`

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::info;

use tul_compiler::compile::{compile_file, CompileOptions};

#[derive(Parser, Debug)]
#[command(name = "tulc")]
#[command(about = "Compile a TUL program into a variable layout map")]
struct Args {
    /// The TUL file to be compiled
    input: PathBuf,

    /// The output JSON map file to be generated
    #[arg(short = 'o', long = "output", default_value = "map.json")]
    output: PathBuf,

    /// Command used to run the rewriting oracle
    #[arg(long = "oracle-cmd", default_value = "maude")]
    oracle_cmd: String,

    /// Module file loaded by the oracle before queries
    #[arg(long = "oracle-module")]
    oracle_module: Option<PathBuf>,
}

fn main() {
    tul_tools::init_logging();

    let args = Args::parse();

    let options = CompileOptions {
        oracle_command: args.oracle_cmd,
        oracle_module: args.oracle_module,
    };

    let result = compile_file(&args.input, &options);
    if result.has_errors() {
        eprintln!("{}", result.format_diagnostics().trim_end());
        process::exit(1);
    }

    if !result.diagnostics.is_empty() {
        eprintln!("{}", result.format_diagnostics().trim_end());
    }

    let compiled = result.program.expect("no program despite no errors");

    let json = match serde_json::to_string_pretty(&compiled.layout) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("failed to encode layout: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = fs::write(&args.output, json) {
        eprintln!("failed to write {}: {}", args.output.display(), err);
        process::exit(1);
    }

    info!(
        "wrote layout for {} variables to {}",
        compiled.layout.len(),
        args.output.display()
    );
}
