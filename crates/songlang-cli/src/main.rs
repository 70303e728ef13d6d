//! The SongLang command-line runner.
//!
//! A thin, non-interactive batch driver around `songlang_interpreter::run`:
//! read a `.song` file, execute it, print whatever the program prints, and
//! report any tokenizer/parser/interpreter error. The REPL shell, graph
//! visualizer, and editor widget are separate, out-of-scope collaborators
//! that consume this same library directly.

use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser)]
#[command(name = "songlang", version, about = "Run a SongLang program")]
struct Cli {
    /// Path to a `.song` source file
    path: PathBuf,

    /// Pin the PRNG to a fixed seed, for reproducible CHANCE/RANDOM runs
    #[arg(long)]
    seed: Option<u64>,

    /// Print the post-execution graph snapshot as JSON after the program runs
    #[arg(long)]
    snapshot: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(message) = run(&cli) {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let source = std::fs::read_to_string(&cli.path)
        .map_err(|e| format!("failed to read '{}': {e}", cli.path.display()))?;

    let print_line = |line: &str| println!("{line}");
    let result = match cli.seed {
        Some(seed) => songlang_interpreter::run_with_seed(&source, seed, print_line),
        None => songlang_interpreter::run(&source, print_line),
    };
    let (interpreter, _output) = result.map_err(|e| e.to_string())?;

    if cli.snapshot {
        let snapshot = interpreter.graph.to_snapshot();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| format!("failed to serialize snapshot: {e}"))?;
        println!("{json}");
    }

    Ok(())
}
