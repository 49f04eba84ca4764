//! # Tokenizer File IO
//!
//! Binary persistence for a trained tokenizer. Layout, all integers
//! little-endian `u32`:
//!
//! ```text
//! magic "BPEC" | version = 1 | vocab_count
//!   { token_len, token bytes } * vocab_count
//! merge_count
//!   { left, right, result } * merge_count
//! ```
//!
//! Loading validates the header and every merge record before any of the
//! data is handed back, so a failed load leaves the caller untouched.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{PairmillError, PmResult};
use crate::merges::MergeRules;
use crate::vocab::{BASE_TOKENS, Vocabulary};

const MAGIC: [u8; 4] = *b"BPEC";
const FORMAT_VERSION: u32 = 1;

fn write_u32<W: Write>(
    writer: &mut W,
    value: u32,
) -> PmResult<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn read_u32<R: Read>(
    reader: &mut R,
    what: &str,
) -> PmResult<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| PairmillError::Corrupt(format!("truncated {what}")))?;
    Ok(u32::from_le_bytes(buf))
}

/// Write a tokenizer to a stream.
pub fn save_tokenizer<W: Write>(
    writer: &mut W,
    vocab: &Vocabulary,
    rules: &MergeRules,
) -> PmResult<()> {
    writer.write_all(&MAGIC)?;
    write_u32(writer, FORMAT_VERSION)?;

    write_u32(writer, vocab.len() as u32)?;
    for token in vocab.iter() {
        write_u32(writer, token.len() as u32)?;
        writer.write_all(token)?;
    }

    write_u32(writer, rules.len() as u32)?;
    for rule in rules.iter() {
        write_u32(writer, rule.left)?;
        write_u32(writer, rule.right)?;
        write_u32(writer, rule.result)?;
    }

    Ok(())
}

/// Write a tokenizer to a file.
pub fn save_tokenizer_to_path<P: AsRef<Path>>(
    path: P,
    vocab: &Vocabulary,
    rules: &MergeRules,
) -> PmResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    save_tokenizer(&mut writer, vocab, rules)?;
    writer.flush()?;
    Ok(())
}

/// Read and validate a tokenizer from a stream.
///
/// ## Errors
/// [`PairmillError::Corrupt`] on a bad magic, unsupported version,
/// truncated record, or merge ids that violate the construction order
/// (each rule's sources precede its result, and result ids are dense
/// from 256).
pub fn load_tokenizer<R: Read>(reader: &mut R) -> PmResult<(Vocabulary, MergeRules)> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|_| PairmillError::Corrupt("truncated header".into()))?;
    if magic != MAGIC {
        return Err(PairmillError::Corrupt("bad magic".into()));
    }

    let version = read_u32(reader, "version")?;
    if version != FORMAT_VERSION {
        return Err(PairmillError::Corrupt(format!(
            "unsupported format version {version}"
        )));
    }

    let vocab_count = read_u32(reader, "vocab count")? as usize;
    if vocab_count < BASE_TOKENS {
        return Err(PairmillError::Corrupt(format!(
            "vocab holds {vocab_count} tokens, below the {BASE_TOKENS} base bytes"
        )));
    }

    let mut vocab = Vocabulary::with_capacity(vocab_count);
    for i in 0..vocab_count {
        let length = read_u32(reader, "token length")? as usize;
        let mut bytes = vec![0u8; length];
        reader
            .read_exact(&mut bytes)
            .map_err(|_| PairmillError::Corrupt(format!("truncated token {i}")))?;
        vocab.add(bytes)?;
    }

    let merge_count = read_u32(reader, "merge count")? as usize;
    if vocab_count != BASE_TOKENS + merge_count {
        return Err(PairmillError::Corrupt(format!(
            "{vocab_count} tokens inconsistent with {merge_count} merges"
        )));
    }

    let mut rules = MergeRules::with_capacity(merge_count);
    for i in 0..merge_count {
        let left = read_u32(reader, "merge rule")?;
        let right = read_u32(reader, "merge rule")?;
        let result = read_u32(reader, "merge rule")?;

        let expected = (BASE_TOKENS + i) as u32;
        if result != expected {
            return Err(PairmillError::Corrupt(format!(
                "merge {i} result id {result}, expected {expected}"
            )));
        }
        if left >= result || right >= result {
            return Err(PairmillError::Corrupt(format!(
                "merge {i} sources ({left}, {right}) do not precede result {result}"
            )));
        }
        rules.push(left, right, result)?;
    }

    Ok((vocab, rules))
}

/// Read and validate a tokenizer from a file.
pub fn load_tokenizer_from_path<P: AsRef<Path>>(path: P) -> PmResult<(Vocabulary, MergeRules)> {
    let mut reader = BufReader::new(File::open(path)?);
    load_tokenizer(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tokenizer() -> (Vocabulary, MergeRules) {
        let mut vocab = Vocabulary::base(258);
        vocab.add(b"ab".to_vec()).unwrap();
        vocab.add(b"abc".to_vec()).unwrap();

        let mut rules = MergeRules::with_capacity(2);
        rules.push(97, 98, 256).unwrap();
        rules.push(256, 99, 257).unwrap();
        (vocab, rules)
    }

    fn saved_bytes() -> Vec<u8> {
        let (vocab, rules) = sample_tokenizer();
        let mut buf = Vec::new();
        save_tokenizer(&mut buf, &vocab, &rules).unwrap();
        buf
    }

    #[test]
    fn test_save_load_round_trip() {
        let buf = saved_bytes();
        let (vocab, rules) = load_tokenizer(&mut buf.as_slice()).unwrap();

        assert_eq!(vocab.len(), 258);
        assert_eq!(vocab.token(256), Some(&b"ab"[..]));
        assert_eq!(vocab.token(257), Some(&b"abc"[..]));
        assert_eq!(rules.len(), 2);
        let rule = rules.as_slice()[1];
        assert_eq!((rule.left, rule.right, rule.result), (256, 99, 257));
    }

    #[test]
    fn test_save_load_via_file() {
        let (vocab, rules) = sample_tokenizer();
        let dir = tempdir::TempDir::new("pairmill_io").unwrap();
        let path = dir.path().join("tokenizer.bin");

        save_tokenizer_to_path(&path, &vocab, &rules).unwrap();
        let (loaded_vocab, loaded_rules) = load_tokenizer_from_path(&path).unwrap();

        assert_eq!(loaded_vocab.len(), vocab.len());
        assert_eq!(loaded_rules.as_slice(), rules.as_slice());
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let mut buf = saved_bytes();
        buf[0] = b'X';
        let err = load_tokenizer(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, PairmillError::Corrupt(_)));
    }

    #[test]
    fn test_load_rejects_bad_version() {
        let mut buf = saved_bytes();
        buf[4] = 9;
        let err = load_tokenizer(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, PairmillError::Corrupt(_)));
    }

    #[test]
    fn test_load_rejects_truncation() {
        let buf = saved_bytes();
        // Chop at every prefix; nothing should panic, and only the full
        // buffer should parse.
        for end in 0..buf.len() {
            let err = load_tokenizer(&mut &buf[..end]).unwrap_err();
            assert!(matches!(err, PairmillError::Corrupt(_)), "prefix {end}");
        }
        assert!(load_tokenizer(&mut buf.as_slice()).is_ok());
    }

    #[test]
    fn test_load_rejects_out_of_order_merge_ids() {
        // Patch the first rule (second-to-last 12-byte record) so its left
        // source equals its own result id.
        let mut buf = saved_bytes();
        let first_rule = buf.len() - 24;
        buf[first_rule..first_rule + 4].copy_from_slice(&256u32.to_le_bytes());

        let err = load_tokenizer(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, PairmillError::Corrupt(_)));
    }

    #[test]
    fn test_load_rejects_non_dense_result_ids() {
        // Patch the first rule's result id away from 256.
        let mut buf = saved_bytes();
        let first_result = buf.len() - 16;
        buf[first_result..first_result + 4].copy_from_slice(&300u32.to_le_bytes());

        let err = load_tokenizer(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, PairmillError::Corrupt(_)));
    }

    #[test]
    fn test_load_rejects_vocab_merge_mismatch() {
        // Drop the last merge record and patch the count down; the vocab
        // still claims 258 tokens.
        let mut buf = saved_bytes();
        buf.truncate(buf.len() - 12);
        let count_at = buf.len() - 12 - 4;
        buf[count_at..count_at + 4].copy_from_slice(&1u32.to_le_bytes());

        let err = load_tokenizer(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, PairmillError::Corrupt(_)));
    }
}
