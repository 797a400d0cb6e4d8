use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{info, warn};

use crate::ingest::reader::{count_records, BatchReader};
use crate::model::DecodeError;

/// One record that failed validation, kept for the end-of-run summary.
#[derive(Debug)]
pub struct FailureNote {
    pub kind: &'static str,
    pub record_id: Option<i64>,
    pub error: DecodeError,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub consumed: u64,
    pub inserted: u64,
    pub failures: Vec<FailureNote>,
}

/// Drives one entity kind end to end: read batches, decode each record,
/// hand the surviving entities to `insert`, and account progress per
/// consumed record so a rejected record still advances the bar.
///
/// Decode failures are collected and summarized, never fatal. Read and
/// insert failures abort the run with the file and kind named.
pub fn run_load<T>(
    kind: &'static str,
    path: &Path,
    batch_size: usize,
    decode: impl Fn(&Value) -> Result<T, DecodeError>,
    mut insert: impl FnMut(&[T]) -> Result<()>,
) -> Result<LoadReport> {
    let total = count_records(path)
        .with_context(|| format!("cannot pre-scan {} file {}", kind, path.display()))?;
    info!("loading {kind}: {total} record(s) from {}", path.display());

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );
    bar.set_message(kind);

    let mut report = LoadReport::default();
    for batch in BatchReader::open(path, batch_size)? {
        let batch = batch
            .with_context(|| format!("while reading {} file {}", kind, path.display()))?;

        let mut entities = Vec::with_capacity(batch.len());
        for raw in &batch {
            report.consumed += 1;
            bar.inc(1);
            match decode(raw) {
                Ok(entity) => entities.push(entity),
                Err(error) => report.failures.push(FailureNote {
                    kind,
                    record_id: raw.get("id").and_then(Value::as_i64),
                    error,
                }),
            }
        }

        insert(&entities)
            .with_context(|| format!("while inserting {} batch from {}", kind, path.display()))?;
        report.inserted += entities.len() as u64;
    }
    bar.finish_and_clear();

    info!(
        "{kind} done: {} consumed, {} inserted, {} rejected",
        report.consumed,
        report.inserted,
        report.failures.len()
    );
    for failure in &report.failures {
        match failure.record_id {
            Some(id) => warn!("rejected {} record id={}: {}", failure.kind, id, failure.error),
            None => warn!("rejected {} record: {}", failure.kind, failure.error),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::post::decode_post;
    use crate::model::tag::decode_tag;
    use crate::store::repo::Store;
    use crate::store::tag_cache::TagCache;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn count(store: &Store, table: &str) -> i64 {
        store
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_rejected_record_still_advances_progress() {
        let file = write_lines(&[
            r#"{"id": 1, "rating": "g"}"#,
            r#"{"rating": "s"}"#,
            r#"{"id": 3, "rating": "e"}"#,
        ]);
        let mut store = Store::open_in_memory().unwrap();
        let mut cache = TagCache::new();

        let report = run_load("posts", file.path(), 2, decode_post, |batch| {
            store.insert_posts(batch, &mut cache, true)
        })
        .unwrap();

        assert_eq!(report.consumed, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].record_id, None);
        assert_eq!(count(&store, "posts"), 2);
    }

    #[test]
    fn test_tags_then_posts_association() {
        let tags_file = write_lines(&[r#"{"id": 1, "name": "foo"}"#]);
        let posts_file = write_lines(&[r#"{"id": 42, "tag_string": "foo bar"}"#]);

        let mut store = Store::open_in_memory().unwrap();
        run_load("tags", tags_file.path(), 1000, decode_tag, |batch| {
            store.insert_tags(batch)
        })
        .unwrap();

        let mut cache = TagCache::new();
        run_load("posts", posts_file.path(), 1000, decode_post, |batch| {
            store.insert_posts(batch, &mut cache, true)
        })
        .unwrap();

        // `foo` resolved, `bar` was silently omitted.
        assert_eq!(count(&store, "posts_tags_assoc"), 1);
        let (post_id, tag_id): (i64, i64) = store
            .connection()
            .query_row("SELECT post_id, tag_id FROM posts_tags_assoc", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!((post_id, tag_id), (42, 1));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let missing = std::path::Path::new("/definitely/not/here.json");
        let result = run_load("tags", missing, 10, decode_tag, |_| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_file_reports_nothing() {
        let file = write_lines(&[]);
        let report = run_load("tags", file.path(), 10, decode_tag, |_: &[_]| {
            panic!("insert must not run for an empty file")
        })
        .unwrap();
        assert_eq!(report.consumed, 0);
        assert_eq!(report.inserted, 0);
    }
}
