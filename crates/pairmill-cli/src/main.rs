mod logging;
mod repl;

use clap::Parser;
use pairmill::Tokenizer;

use crate::logging::LogArgs;

/// Train, inspect, and interactively exercise byte-pair tokenizers.
#[derive(clap::Parser, Debug)]
#[command(name = "pairmill")]
pub struct Args {
    /// Target vocabulary size.
    #[arg(short = 'v', long, default_value_t = 512)]
    vocab_size: usize,

    /// Training text file.
    #[arg(short = 'i', long, default_value = "input.txt")]
    input: String,

    /// Load a tokenizer (vocab + merges) from a file instead of training.
    #[arg(short = 'l', long)]
    load: Option<String>,

    /// Save the tokenizer (vocab + merges) after training.
    #[arg(short = 's', long)]
    save: Option<String>,

    /// Start the interactive REPL after training or loading.
    #[arg(long)]
    interactive: bool,

    /// Training text file (positional alternative to --input).
    corpus: Option<String>,

    #[clap(flatten)]
    logging: LogArgs,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if err.use_stderr() => {
            // Parse and validation problems exit 1, like every other
            // failure path.
            eprint!("{err}");
            std::process::exit(1);
        }
        Err(help) => {
            // --help / --version.
            print!("{help}");
            return;
        }
    };

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    args.logging.setup_logging(3)?;

    let interactive = args.interactive || args.load.is_some();

    let tokenizer = match &args.load {
        Some(path) => {
            let tokenizer = Tokenizer::load_from_path(path)?;
            log::info!(
                "loaded tokenizer from {path}: {} tokens, {} merges",
                tokenizer.vocab_size(),
                tokenizer.rules().len()
            );
            tokenizer
        }
        None => {
            let input = args.corpus.as_ref().unwrap_or(&args.input);
            let corpus = std::fs::read(input)?;
            log::info!("read {} bytes from {input}", corpus.len());

            let (tokenizer, report) = Tokenizer::train(&corpus, args.vocab_size)?;
            log::info!(
                "trained {} merges; {} -> {} tokens ({:.2}x)",
                report.merges,
                report.initial_len,
                report.final_len,
                report.compression_ratio()
            );

            for id in 256..tokenizer.vocab_size().min(280) {
                log::debug!("token {id}: {}", tokenizer.display(id as u32));
            }

            if let Some(path) = &args.save {
                match tokenizer.save_to_path(path) {
                    Ok(()) => log::info!("saved tokenizer to {path}"),
                    Err(err) if interactive => {
                        // Keep the session; the tokenizer in memory is
                        // still good.
                        log::error!("failed to save tokenizer to {path}: {err}");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            tokenizer
        }
    };

    demo_round_trip(&tokenizer);

    if interactive {
        repl::run(&tokenizer)?;
    }
    Ok(())
}

/// Encode and decode one fixed sentence so a plain training run shows the
/// tokenizer at work.
fn demo_round_trip(tokenizer: &Tokenizer) {
    let sample = "To be or not to be, that is the question.";
    let seq = tokenizer.encode(sample);
    log::info!(
        "sample encode: {} bytes -> {} tokens ({:.2}x)",
        sample.len(),
        seq.len(),
        sample.len() as f64 / seq.len().max(1) as f64
    );

    match tokenizer.decode(&seq) {
        Ok(decoded) if decoded == sample.as_bytes() => {
            log::info!("sample round-trip: ok");
        }
        Ok(_) => log::warn!("sample round-trip mismatch"),
        Err(err) => log::warn!("sample round-trip failed: {err}"),
    }
}
