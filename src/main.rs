use clap::{Parser, Subcommand};
use ebnf_fuzz::{FuzzyGenerator, GeneratorConfig, Syntax};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate test input from ISO/IEC 14977 EBNF grammars
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON generator configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every string the grammar accepts, one per line
    Fuzz {
        /// Path to the grammar file
        grammar: PathBuf,

        /// Rule to expand instead of the configured start rule
        #[arg(short, long)]
        start: Option<String>,

        /// Iterations explored for `{ ... }` repetitions
        #[arg(short = 'k', long)]
        max_repetitions: Option<usize>,
    },
    /// Print randomly chosen strings the grammar accepts
    Random {
        /// Path to the grammar file
        grammar: PathBuf,

        /// Number of strings to print
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Rule to expand instead of the configured start rule
        #[arg(short, long)]
        start: Option<String>,
    },
    /// Parse the grammar and report its rules
    Check {
        /// Path to the grammar file
        grammar: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::default(),
    };

    match cli.command {
        Commands::Fuzz {
            grammar,
            start,
            max_repetitions,
        } => {
            if let Some(start) = start {
                config.start_rule = start;
            }
            if let Some(max_repetitions) = max_repetitions {
                config.max_repetitions = max_repetitions;
            }

            let syntax = load(&grammar)?;
            let strings = FuzzyGenerator::with_config(config).generate(&syntax)?;
            info!("Generated {} strings.", strings.len());
            print_lines(&strings)?;
        }
        Commands::Random {
            grammar,
            count,
            start,
        } => {
            if let Some(start) = start {
                config.start_rule = start;
            }

            let syntax = load(&grammar)?;
            let strings = FuzzyGenerator::with_config(config).sample(&syntax, count)?;
            print_lines(&strings)?;
        }
        Commands::Check { grammar } => {
            let syntax = load(&grammar)?;
            println!("{}: {} rules", grammar.display(), syntax.len());
            for rule in syntax.rules() {
                println!("  {} (defined at {})", rule.name, rule.defined_at);
            }
        }
    }

    Ok(())
}

fn load(path: &PathBuf) -> Result<Syntax, Box<dyn std::error::Error>> {
    info!("Loading grammar from {}", path.display());
    let syntax = Syntax::from_file(path)?;
    info!("Loaded {} rules.", syntax.len());
    Ok(syntax)
}

fn print_lines(strings: &[String]) -> io::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for s in strings {
        writeln!(out, "{}", s)?;
    }
    out.flush()
}
