use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tally_lang::cli::{self, CliError, RunOptions, RunResult};

#[derive(ClapParser)]
#[command(name = "tally")]
#[command(about = "Tally - a SQL-like query language for nested JSON records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and execute a tally program
    Run {
        /// The program to execute (query text or @file)
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the data paths a program expects, one per line
    Paths {
        /// The program to inspect (query text or @file)
        query: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            query,
            input,
            pretty,
            syntax_only,
        } => run(query, input, pretty, syntax_only),
        Commands::Paths { query } => paths(query),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// `@file` arguments load the program text from disk.
fn load_query(query: String) -> Result<String, CliError> {
    match query.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(query),
    }
}

fn run(
    query: String,
    input: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(input) => Some(input),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query: load_query(query)?,
        input,
        syntax_only,
    };

    match cli::execute_run(&options)? {
        RunResult::SyntaxValid => println!("Syntax OK"),
        RunResult::Success(output) => {
            let value = serde_json::Value::Object(output);
            if pretty {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", serde_json::to_string(&value)?);
            }
        }
    }
    Ok(())
}

fn paths(query: String) -> Result<(), CliError> {
    let compiled = tally_lang::parse(&load_query(query)?)?;
    for path in compiled.expected_paths() {
        println!("{}", path);
    }
    Ok(())
}
