use std::io::{self, Read};

use clap::{Parser as ClapParser, Subcommand};
use docmut::{
    DEFAULT_ROOT,
    cli::{self, ApplyOptions, CheckOptions, CliError},
};

#[derive(ClapParser)]
#[command(name = "docmut")]
#[command(about = "docmut - Mutate JSON documents with merge and remove expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply expressions to a JSON document and print the result
    Apply {
        /// Expression to run; repeat to run several in order
        #[arg(short, long = "expr", required = true)]
        expressions: Vec<String>,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Variable the document root is bound to
        #[arg(short, long, default_value = DEFAULT_ROOT)]
        root: String,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Parse and type-check expressions without running them
    Check {
        /// Expression to check; repeat to check several
        #[arg(short, long = "expr", required = true)]
        expressions: Vec<String>,

        /// Variable the document root is bound to
        #[arg(short, long, default_value = DEFAULT_ROOT)]
        root: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            expressions,
            input,
            root,
            pretty,
        } => run_apply(expressions, input, root, pretty),
        Commands::Check { expressions, root } => {
            cli::execute_check(&CheckOptions { expressions, root })
                .map(|()| println!("Expressions are valid"))
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_apply(
    expressions: Vec<String>,
    input: Option<String>,
    root: String,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = ApplyOptions {
        expressions,
        input,
        root,
    };

    let output = cli::execute_apply(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
