use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use deflopt::{optimize_deflate_stream, parse_stream, serialize_stream, text, ByteLengthScore, OptimizerParams};

#[derive(Parser)]
#[command(name = "deflopt", about = "Re-encodes a raw DEFLATE stream for minimum size")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode a raw DEFLATE file in place (or to a new file).
    Optimize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = OptimizerParams::default().num_iteration)]
        iterations: u32,
        #[arg(long, default_value_t = OptimizerParams::default().num_perturbation)]
        perturbation: u32,
        #[arg(long, default_value_t = OptimizerParams::default().tolerance_bit)]
        tolerance_bit: i64,
        #[arg(long, default_value_t = OptimizerParams::default().terminate_threshold)]
        terminate_threshold: u64,
        #[arg(long, default_value_t = OptimizerParams::default().seed)]
        seed: u64,
        #[arg(long)]
        verbose: bool,
    },
    /// Dump a raw DEFLATE file to the line-oriented text format.
    Dump {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load a text dump back into a raw DEFLATE file.
    Load {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => {
            eprintln!("deflopt: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: Args) -> deflopt::Result<()> {
    match args.command {
        Command::Optimize { input, output, iterations, perturbation, tolerance_bit, terminate_threshold, seed, verbose } => {
            let raw = fs::read(&input)?;
            let blocks = parse_stream(&raw)?;
            if verbose {
                eprintln!("parsed {} block(s) from {}", blocks.len(), input.display());
            }
            let params = OptimizerParams {
                num_iteration: iterations,
                num_perturbation: perturbation,
                tolerance_bit,
                terminate_threshold,
                seed,
            };
            let scorer = ByteLengthScore;
            let optimized = optimize_deflate_stream(&blocks, &scorer, &params, verbose)?;
            if verbose {
                eprintln!("input {} bytes -> output {} bytes", raw.len(), optimized.len());
            }
            fs::write(&output, optimized)?;
            Ok(())
        }
        Command::Dump { input, output } => {
            let raw = fs::read(&input)?;
            let blocks = parse_stream(&raw)?;
            let dumped = text::dump_stream(&blocks);
            match output {
                Some(path) => fs::write(path, dumped)?,
                None => print!("{dumped}"),
            }
            Ok(())
        }
        Command::Load { input, output } => {
            let text_content = fs::read_to_string(&input)?;
            let blocks = text::load_stream(&text_content)?;
            let bytes = serialize_stream(&blocks)?;
            fs::write(&output, bytes)?;
            Ok(())
        }
    }
}
