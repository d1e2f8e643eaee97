use std::fs;

use clap::Parser;

use wacc::compile::Frontend;
use wacc::infra::{error_exit_code, ErrorCodes, ExitCode};

#[derive(Parser, Debug)]
#[command()]
struct Args {
    src: String,

    #[arg(long, default_value_t = 100)]
    syntax_code: u8,

    #[arg(long, default_value_t = 200)]
    semantic_code: u8,

    #[arg(long, default_value_t = 200)]
    type_code: u8,

    /// Treat loose program-scope statements as the body of main.
    #[arg(long)]
    implicit_main: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(args.src.as_str()) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {}: {}", args.src, err);
            return ExitCode::FAIL_IO;
        }
    };

    let result = Frontend::new()
        .source(source)
        .implicit_main(args.implicit_main)
        .run();

    let Err(err) = result else {
        return ExitCode::SUCCESS;
    };

    eprintln!("{}", err);

    error_exit_code(
        &err,
        ErrorCodes {
            syntax: args.syntax_code,
            semantic: args.semantic_code,
            typing: args.type_code,
        },
    )
}
