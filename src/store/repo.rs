use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};
use tracing::{debug, warn};

use crate::model::artist::{ArtistEntry, ArtistUrlEntry};
use crate::model::post::PostBundle;
use crate::model::tag::{TagEntry, TagPairEntry};
use crate::store::schema::SCHEMA;
use crate::store::tag_cache::TagCache;

/// Owns the one connection of a run. Every insert method takes a full
/// batch, runs one transaction with a single prepared statement, and
/// commits once; an empty batch is a no-op.
pub struct Store {
    conn: Connection,
}

fn ts(value: &Option<DateTime<FixedOffset>>) -> Option<String> {
    value.map(|t| t.to_rfc3339())
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("failed to initialize schema")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        conn.execute_batch(SCHEMA)
            .context("failed to initialize schema")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn insert_tags(&mut self, batch: &[TagEntry]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tags (id, name, category, is_deprecated) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for tag in batch {
                stmt.execute(params![tag.id, tag.name, tag.category, tag.is_deprecated])?;
            }
        }
        tx.commit().context("failed to commit tags batch")
    }

    /// Aliases and implications share one row shape; `implication` picks
    /// the destination relation.
    pub fn insert_tag_pairs(&mut self, batch: &[TagPairEntry], implication: bool) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let relation = if implication {
            "tag_implications"
        } else {
            "tag_aliases"
        };
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {relation} (id, antecedent_name, consequent_name) VALUES (?1, ?2, ?3)"
            ))?;
            for pair in batch {
                stmt.execute(params![pair.id, pair.antecedent_name, pair.consequent_name])?;
            }
        }
        tx.commit()
            .with_context(|| format!("failed to commit {relation} batch"))
    }

    /// Artist rows and their expanded alias rows commit in the same unit
    /// of work, aliases after artists so the artist id they reference is
    /// already present.
    pub fn insert_artists(&mut self, batch: &[ArtistEntry]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt_artist = tx.prepare(
                "INSERT INTO artists (id, name, group_name, created_at, updated_at, is_deleted, is_banned)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let mut stmt_alias =
                tx.prepare("INSERT INTO artists_aliases (artist_id, alias) VALUES (?1, ?2)")?;
            for artist in batch {
                stmt_artist.execute(params![
                    artist.id,
                    artist.name,
                    artist.group_name,
                    ts(&artist.created_at),
                    ts(&artist.updated_at),
                    artist.is_deleted,
                    artist.is_banned,
                ])?;
                for alias in &artist.other_names {
                    stmt_alias.execute(params![artist.id, alias])?;
                }
            }
        }
        tx.commit().context("failed to commit artists batch")
    }

    pub fn insert_artist_urls(&mut self, batch: &[ArtistUrlEntry]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO artists_urls (id, artist_id, url, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for url in batch {
                stmt.execute(params![
                    url.id,
                    url.artist_id,
                    url.url,
                    url.is_active,
                    ts(&url.created_at),
                    ts(&url.updated_at),
                ])?;
            }
        }
        tx.commit().context("failed to commit artist urls batch")
    }

    /// Post ingestion runs four dependent sub-steps in order: post rows,
    /// media variant rows, file-URL rows, then tag associations. Each
    /// sub-step commits on its own, so a failure in a later sub-step
    /// leaves the earlier ones durable.
    pub fn insert_posts(
        &mut self,
        batch: &[PostBundle],
        cache: &mut TagCache,
        with_tags: bool,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO posts (id, created_at, updated_at, uploader_id, score, up_score,
                     down_score, fav_count, source, md5, rating, width, height, file_ext,
                     file_size, parent_id, pixiv_id, has_children, is_pending, is_flagged,
                     is_deleted, is_banned)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            )?;
            for bundle in batch {
                let p = &bundle.post;
                stmt.execute(params![
                    p.id,
                    ts(&p.created_at),
                    ts(&p.updated_at),
                    p.uploader_id,
                    p.score,
                    p.up_score,
                    p.down_score,
                    p.fav_count,
                    p.source,
                    p.md5,
                    p.rating,
                    p.width,
                    p.height,
                    p.file_ext,
                    p.file_size,
                    p.parent_id,
                    p.pixiv_id,
                    p.has_children,
                    p.is_pending,
                    p.is_flagged,
                    p.is_deleted,
                    p.is_banned,
                ])?;
            }
        }
        tx.commit().context("failed to commit posts batch")?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO posts_media_variants (post_id, variant_type, url, width, height)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for bundle in batch {
                for v in &bundle.variants {
                    stmt.execute(params![v.post_id, v.variant_type, v.url, v.width, v.height])?;
                }
            }
        }
        tx.commit().context("failed to commit media variants batch")?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO posts_file_urls (post_id, file_url, large_file_url, preview_file_url)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for bundle in batch {
                let f = &bundle.file_urls;
                stmt.execute(params![
                    f.post_id,
                    f.file_url,
                    f.large_file_url,
                    f.preview_file_url,
                ])?;
            }
        }
        tx.commit().context("failed to commit file urls batch")?;

        if with_tags {
            self.insert_tag_associations(batch, cache)?;
        }
        Ok(())
    }

    fn insert_tag_associations(
        &mut self,
        batch: &[PostBundle],
        cache: &mut TagCache,
    ) -> Result<()> {
        let distinct: BTreeSet<&String> = batch.iter().flat_map(|b| &b.tag_names).collect();
        if distinct.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = distinct.into_iter().cloned().collect();

        cache.warm_load(&self.conn)?;
        let resolved = cache.resolve(&self.conn, &names, false)?;
        let unresolved = names.len() - resolved.len();
        if unresolved > 0 {
            warn!(
                "{unresolved} tag name(s) in batch did not resolve; their associations are skipped"
            );
            for name in names.iter().filter(|n| !resolved.contains_key(*n)) {
                debug!("unresolved tag name: {name}");
            }
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO posts_tags_assoc (post_id, tag_id) VALUES (?1, ?2)")?;
            for bundle in batch {
                // A tag string can repeat a token; one association row per
                // resolved id keeps the (post_id, tag_id) key intact.
                let mut seen = BTreeSet::new();
                for name in &bundle.tag_names {
                    if let Some(tag_id) = resolved.get(name) {
                        if seen.insert(*tag_id) {
                            stmt.execute(params![bundle.post.id, tag_id])?;
                        }
                    }
                }
            }
        }
        tx.commit().context("failed to commit tag associations batch")
    }
}
