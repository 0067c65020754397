use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use roux::ast_printer::AstPrinter;
use roux::error::RouxError;
use roux::parser::Parser;
use roux::runtime::Runtime;
use roux::scanner::{self, Scanner};
use roux::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Roux scripting language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to roux.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the token stream as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Roux program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file as UTF-8 text.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("roux.log").context("Failed to create roux.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'roux::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("roux::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to roux.log");
    Ok(())
}

/// Exit status for a failed pipeline: 70 for runtime failures, 65 otherwise.
fn exit_code(error: &RouxError) -> i32 {
    if error.is_runtime() {
        70
    } else {
        65
    }
}

fn no_input() -> ! {
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    if json {
        let (tokens, errors) = scanner::scan(source);

        for e in &errors {
            eprintln!("{}", e);
        }

        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );

        if !errors.is_empty() {
            std::process::exit(65);
        }

        return Ok(());
    }

    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    Ok(())
}

fn parse(source: &str) {
    let (tokens, errors): (Vec<Token>, Vec<RouxError>) = scanner::scan(source);

    let mut failed = !errors.is_empty();
    for e in &errors {
        eprintln!("{}", e);
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) if !failed => {
            let ast = AstPrinter::print(&expr);
            debug!("AST: {}", ast);
            println!("{}", ast);
        }

        Ok(_) => {}

        Err(errors) => {
            failed = true;
            for e in &errors {
                eprintln!("{}", e);
            }
        }
    }

    if failed {
        std::process::exit(65);
    }
}

fn repl() -> Result<()> {
    let mut runtime = Runtime::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Bare expressions echo their value; everything else runs as a program.
        let outcome = if line.ends_with(';') || line.ends_with('}') {
            runtime.run(line)
        } else {
            runtime.evaluate(line).map(|value| println!("{}", value))
        };

        if let Err(e) = outcome {
            debug!("REPL error: {}", e);
            runtime.reset_error_system();
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else { no_input() };
            tokenize(&read_file(filename)?, json)?;
        }

        Commands::Parse { filename } => {
            let Some(filename) = filename else { no_input() };
            parse(&read_file(filename)?);
        }

        Commands::Evaluate { filename } => {
            let Some(filename) = filename else { no_input() };
            let source = read_file(filename)?;

            match Runtime::new().evaluate(&source) {
                Ok(value) => println!("{}", value),
                Err(e) => std::process::exit(exit_code(&e)),
            }
        }

        Commands::Run { filename } => {
            let Some(filename) = filename else { no_input() };
            let source = read_file(filename)?;
            info!("Provided input:\n {}", source);

            if let Err(e) = Runtime::new().run(&source) {
                debug!("Run failed: {}", e);
                std::process::exit(exit_code(&e));
            }

            info!("Program executed successfully");
        }

        Commands::Repl => repl()?,
    }

    Ok(())
}
