use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde_json::Value;

/// Streams a line-delimited JSON file as fixed-size batches of raw
/// records, preserving source order. The final batch may be short; an
/// empty file yields no batches. One bad line fails the whole file.
pub struct BatchReader {
    lines: Lines<BufReader<File>>,
    batch_size: usize,
    line_no: u64,
}

impl BatchReader {
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        ensure!(batch_size > 0, "batch size must be positive");
        let file = File::open(path)
            .with_context(|| format!("failed to open input file {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            batch_size,
            line_no: 0,
        })
    }
}

impl Iterator for BatchReader {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(e).context("failed to read input line")),
                None => break,
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(value) => batch.push(value),
                Err(e) => {
                    return Some(
                        Err(e).with_context(|| format!("malformed JSON on line {}", self.line_no)),
                    )
                }
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

/// Full pre-scan for the progress-bar total. Display only, so blank
/// trailing lines making the count slightly high is acceptable.
pub fn count_records(path: &Path) -> Result<u64> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let mut count = 0u64;
    for line in BufReader::new(file).lines() {
        let line = line.context("failed to read input line")?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn jsonl_file(n: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..n {
            writeln!(file, "{{\"id\": {i}}}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_batch_count_and_order() {
        let file = jsonl_file(5);
        let batches: Vec<Vec<Value>> = BatchReader::open(file.path(), 2)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 2);
        assert_eq!(batches[2].len(), 1);

        let ids: Vec<i64> = batches
            .iter()
            .flatten()
            .map(|v| v["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_exact_multiple_of_batch_size() {
        let file = jsonl_file(4);
        let batches: Vec<Vec<Value>> = BatchReader::open(file.path(), 2)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].len(), 2);
    }

    #[test]
    fn test_empty_file_yields_no_batches() {
        let file = jsonl_file(0);
        let mut reader = BatchReader::open(file.path(), 10).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_blank_lines_are_skipped_consistently() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\": 1}}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{\"id\": 2}}").unwrap();
        file.flush().unwrap();

        let batches: Vec<Vec<Value>> = BatchReader::open(file.path(), 10)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(count_records(file.path()).unwrap(), 2);
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\": 1}}").unwrap();
        writeln!(file, "this is not json").unwrap();
        file.flush().unwrap();

        let mut reader = BatchReader::open(file.path(), 10).unwrap();
        assert!(reader.next().unwrap().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let file = jsonl_file(1);
        assert!(BatchReader::open(file.path(), 0).is_err());
    }

    #[test]
    fn test_count_records() {
        let file = jsonl_file(7);
        assert_eq!(count_records(file.path()).unwrap(), 7);
    }
}
