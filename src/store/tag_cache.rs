use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

/// Process-wide tag name to id mapping. Starts cold; `warm_load` takes a
/// full snapshot of the tags relation once and the cache stays warm for
/// the rest of the run. The tags relation is assumed to have no other
/// writer during a run, so there is no invalidation path.
#[derive(Debug, Default)]
pub struct TagCache {
    table: Option<HashMap<String, i64>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self { table: None }
    }

    pub fn is_warm(&self) -> bool {
        self.table.is_some()
    }

    /// Loads the whole name-to-id snapshot in one query. A second call is
    /// a no-op, so callers can invoke it lazily on first need.
    pub fn warm_load(&mut self, conn: &Connection) -> Result<()> {
        if self.table.is_some() {
            return Ok(());
        }
        let table = fetch_tags(conn, None).context("failed to warm-load tag cache")?;
        info!("tag cache warmed with {} entries", table.len());
        self.table = Some(table);
        Ok(())
    }

    /// Returns the subset of `names` that resolve to a tag id. Names with
    /// no matching tag are simply absent from the result; callers treat
    /// that as "tag not found", not as an error.
    ///
    /// When warm (and `force_remote` is false) this is a pure map probe.
    /// Cold or forced resolution issues one bulk query for exactly the
    /// requested names and leaves the cache untouched.
    pub fn resolve(
        &self,
        conn: &Connection,
        names: &[String],
        force_remote: bool,
    ) -> Result<HashMap<String, i64>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }
        if !force_remote {
            if let Some(table) = &self.table {
                return Ok(names
                    .iter()
                    .filter_map(|n| table.get(n).map(|id| (n.clone(), *id)))
                    .collect());
            }
        }
        fetch_tags(conn, Some(names)).context("failed to look up tags")
    }
}

fn fetch_tags(conn: &Connection, names: Option<&[String]>) -> Result<HashMap<String, i64>> {
    let mut out = HashMap::new();
    match names {
        None => {
            let mut stmt = conn.prepare("SELECT id, name FROM tags")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                out.insert(row.get::<_, String>(1)?, row.get::<_, i64>(0)?);
            }
        }
        Some(names) => {
            let placeholders = vec!["?"; names.len()].join(", ");
            let sql = format!("SELECT id, name FROM tags WHERE name IN ({placeholders})");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params_from_iter(names))?;
            while let Some(row) = rows.next()? {
                out.insert(row.get::<_, String>(1)?, row.get::<_, i64>(0)?);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(crate::store::schema::SCHEMA).unwrap();
        for (id, name) in [(1, "1girl"), (2, "solo"), (3, "original")] {
            conn.execute(
                "INSERT INTO tags (id, name, category, is_deprecated) VALUES (?1, ?2, 0, 0)",
                params![id, name],
            )
            .unwrap();
        }
        conn
    }

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_warm_resolve_returns_known_subset() {
        let conn = seeded_conn();
        let mut cache = TagCache::new();
        cache.warm_load(&conn).unwrap();
        assert!(cache.is_warm());

        let resolved = cache
            .resolve(&conn, &names(&["solo", "no_such_tag"]), false)
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["solo"], 2);
    }

    #[test]
    fn test_warm_resolve_skips_remote() {
        let conn = seeded_conn();
        let mut cache = TagCache::new();
        cache.warm_load(&conn).unwrap();

        // A tag added after the warm snapshot is invisible to the warm
        // path, which proves no second query is issued.
        conn.execute(
            "INSERT INTO tags (id, name) VALUES (4, 'late_tag')",
            [],
        )
        .unwrap();
        let resolved = cache.resolve(&conn, &names(&["late_tag"]), false).unwrap();
        assert!(resolved.is_empty());

        let forced = cache.resolve(&conn, &names(&["late_tag"]), true).unwrap();
        assert_eq!(forced["late_tag"], 4);
    }

    #[test]
    fn test_cold_resolve_queries_without_warming() {
        let conn = seeded_conn();
        let cache = TagCache::new();
        let resolved = cache
            .resolve(&conn, &names(&["1girl", "original"]), false)
            .unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(!cache.is_warm());
    }

    #[test]
    fn test_warm_load_is_idempotent() {
        let conn = seeded_conn();
        let mut cache = TagCache::new();
        cache.warm_load(&conn).unwrap();
        conn.execute("INSERT INTO tags (id, name) VALUES (9, 'newer')", [])
            .unwrap();
        cache.warm_load(&conn).unwrap();
        // Second call did not replace the snapshot.
        assert!(cache
            .resolve(&conn, &names(&["newer"]), false)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_name_list() {
        let conn = seeded_conn();
        let cache = TagCache::new();
        assert!(cache.resolve(&conn, &[], false).unwrap().is_empty());
    }
}
