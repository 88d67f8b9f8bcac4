// cppscope: scope-resolving C++ subset front end for memory visualization

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, warn};

use cppscope::parser::lexer::{Lexer, TokenRecord};
use cppscope::{parse_source_with, FrontendConfig};

#[derive(Parser)]
#[command(name = "cppscope")]
#[command(about = "Parse a C++ subset into a scope-resolved AST (JSON)")]
#[command(version)]
struct Cli {
    /// Input C++ source file
    input: PathBuf,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Dump the token stream instead of the AST
    #[arg(long)]
    tokens: bool,

    /// First memory id to allocate
    #[arg(long, default_value_t = cppscope::semantic::ids::DEFAULT_ID_BASE)]
    id_base: u64,

    /// Log every token to stderr before parsing
    #[arg(long)]
    log_tokens: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.log_tokens { "cppscope=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&cli.input)
        .map_err(|e| format!("cannot read '{}': {}", cli.input.display(), e))?;

    let json = if cli.tokens {
        let mut lexer = Lexer::new(&source);
        let records: Vec<TokenRecord> = lexer.tokenize().iter().map(TokenRecord::from).collect();
        for error in lexer.errors() {
            warn!("{}", error);
        }
        render(&records, cli.pretty)?
    } else {
        let config = FrontendConfig::default()
            .with_id_base(cli.id_base)
            .with_log_tokens(cli.log_tokens);
        let output = parse_source_with(&source, &config);
        info!(
            "{}: {} top-level statements, {} functions, {} classes, {} diagnostics",
            cli.input.display(),
            output.ast.len(),
            output.functions.len(),
            output.classes.len(),
            output.diagnostics.len()
        );
        for diagnostic in &output.diagnostics {
            eprintln!("{}", diagnostic);
        }
        render(&output, cli.pretty)?
    };

    write_output(cli.output.as_deref(), &json)
}

fn render<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn write_output(path: Option<&Path>, json: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            fs::write(path, json)?;
            info!("wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
