#![deny(clippy::expect_used)]
//! `hulkc`: compiles a HULK source file to MIPS32 assembly.
//!
//! Usage:
//!   hulkc input.hulk -o output.s
//!   hulkc input.hulk --emit-tac

use std::env;
use std::fs;
use std::path::Path;
use std::process;

use hulkc::pipeline::CompileOptions;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
struct Args {
    input_file: Option<String>,
    output_file: Option<String>,
    emit_tac: bool,
    verbose_errors: bool,
    json_errors: bool,
    show_help: bool,
    show_version: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args {
            input_file: None,
            output_file: None,
            emit_tac: false,
            verbose_errors: false,
            json_errors: false,
            show_help: false,
            show_version: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => parsed.show_help = true,
                "-v" | "--version" => parsed.show_version = true,
                "-o" | "--output" => {
                    i += 1;
                    if i < args.len() {
                        parsed.output_file = Some(args[i].clone());
                    }
                }
                "--emit-tac" => parsed.emit_tac = true,
                "--verbose-errors" => parsed.verbose_errors = true,
                "--json-errors" => parsed.json_errors = true,
                arg if !arg.starts_with('-') => {
                    if parsed.input_file.is_none() {
                        parsed.input_file = Some(arg.to_string());
                    }
                }
                _ => {
                    eprintln!("Unknown option: {}", args[i]);
                }
            }
            i += 1;
        }

        parsed
    }
}

fn print_help() {
    println!(
        r#"hulkc v{VERSION} — HULK to MIPS32 compiler

USAGE:
    hulkc [OPTIONS] <input.hulk>

OPTIONS:
    -h, --help           Show this help message
    -v, --version        Show version information
    -o, --output         Output file path (default: <input>.s)
    --emit-tac           Also write the lowered TAC program next to the assembly
    --verbose-errors     Print full diagnostic detail for every semantic error found
    --json-errors        Print semantic diagnostics as a JSON array instead of text
"#
    );
}

fn main() {
    let args = Args::parse();

    if args.show_help {
        print_help();
        return;
    }
    if args.show_version {
        println!("hulkc v{VERSION}");
        return;
    }

    let Some(input_path) = args.input_file else {
        eprintln!("Error: no input file provided");
        eprintln!("Use --help for usage information");
        process::exit(1);
    };

    let src = match fs::read_to_string(&input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: could not read {input_path}: {e}");
            process::exit(1);
        }
    };

    let output_path = args.output_file.unwrap_or_else(|| {
        let stem = Path::new(&input_path)
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        format!("{stem}.s")
    });

    let options = CompileOptions { emit_tac: args.emit_tac };

    match hulkc::compile(&src, &options) {
        Ok(output) => {
            if let Err(e) = fs::write(&output_path, &output.assembly) {
                eprintln!("Error: could not write {output_path}: {e}");
                process::exit(1);
            }
            if let Some(tac) = output.tac {
                let tac_path = format!("{output_path}.tac");
                if let Err(e) = fs::write(&tac_path, tac) {
                    eprintln!("Error: could not write {tac_path}: {e}");
                    process::exit(1);
                }
            }
        }
        Err(hulkc::HulkError::Parse(msg)) => {
            eprintln!("parse error: {msg}");
            process::exit(1);
        }
        Err(hulkc::HulkError::Semantic(diagnostics)) => {
            if args.json_errors {
                match serde_json::to_string_pretty(&diagnostics) {
                    Ok(json) => eprintln!("{json}"),
                    Err(e) => eprintln!("could not serialize diagnostics: {e}"),
                }
            } else {
                eprintln!("{} semantic error(s) found:", diagnostics.len());
                for d in &diagnostics {
                    if args.verbose_errors {
                        eprintln!("  {d:?}");
                    } else {
                        eprintln!("  {d}");
                    }
                }
            }
            process::exit(1);
        }
        Err(hulkc::HulkError::Internal(msg)) => {
            eprintln!("internal compiler error: {msg}");
            process::exit(2);
        }
    }
}
