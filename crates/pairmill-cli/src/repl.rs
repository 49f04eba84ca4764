use std::io::{BufRead, Write};
use std::time::Instant;

use pairmill::Tokenizer;

const HELP: &str = "\
Type text to tokenize. Commands:
  quit/exit    Leave the session
  :help        Show this message";

/// Interactive encode loop over stdin.
///
/// Every non-command line is encoded, reported with its compression ratio
/// and encode time, then verified by decoding. Per-line failures are
/// printed and the loop continues.
pub fn run(tokenizer: &Tokenizer) -> Result<(), Box<dyn std::error::Error>> {
    println!("Interactive tokenizer");
    println!("Vocabulary size: {}", tokenizer.vocab_size());
    println!("Merge rules: {}", tokenizer.rules().len());
    println!();
    println!("{HELP}");
    println!();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            println!("EOF encountered, exiting.");
            break;
        };
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        match line {
            "quit" | "exit" => break,
            ":help" => {
                println!("{HELP}");
                continue;
            }
            "" => continue,
            _ => {}
        }

        encode_line(tokenizer, line);
        println!();
    }

    Ok(())
}

fn encode_line(
    tokenizer: &Tokenizer,
    line: &str,
) {
    let started = Instant::now();
    let seq = tokenizer.encode(line);
    let encode_ms = started.elapsed().as_secs_f64() * 1e3;

    print!("Tokens ({}):", seq.len());
    for &id in seq.tokens() {
        print!(" {}", tokenizer.display(id));
    }
    println!();

    println!("Length bytes: {}", line.len());
    println!("Token count: {}", seq.len());
    if seq.is_empty() {
        println!("Compression ratio: N/A");
    } else {
        println!(
            "Compression ratio: {:.3}x",
            line.len() as f64 / seq.len() as f64
        );
    }
    println!("Encode time: {encode_ms:.3} ms");

    match tokenizer.decode(&seq) {
        Ok(decoded) => {
            let matched = decoded == line.as_bytes();
            println!("Round-trip match: {}", if matched { "yes" } else { "no" });
        }
        Err(err) => println!("Round-trip failed: {err}"),
    }
}
