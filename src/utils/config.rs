use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

fn default_db_path() -> PathBuf {
    PathBuf::from("booru.db")
}

fn default_batch_count() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Input file name per entity kind, resolved against the data directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub posts: String,
    pub tags: String,
    pub artists: String,
    pub artist_urls: String,
    pub tag_aliases: String,
    pub tag_implications: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            posts: "posts.json".into(),
            tags: "tags.json".into(),
            artists: "artists.json".into(),
            artist_urls: "artist_urls.json".into(),
            tag_aliases: "tag_aliases.json".into(),
            tag_implications: "tag_implications.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsertionConfig {
    pub batch_count: usize,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            batch_count: default_batch_count(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub file_names: FileNames,
    pub insertion: InsertionConfig,
}

impl Config {
    /// Loads the TOML config, falling back to defaults when the file does
    /// not exist. A file that exists but does not parse is an error; that
    /// is a typo to fix, not a case to paper over.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Input path for one entity kind's file name.
    pub fn input_path(&self, data_dir: Option<&Path>, file_name: &str) -> PathBuf {
        match data_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Path::new("no_such_config.toml")).unwrap();
        assert_eq!(config.insertion.batch_count, 1000);
        assert_eq!(config.file_names.posts, "posts.json");
        assert_eq!(config.database.path, PathBuf::from("booru.db"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[insertion]\nbatch_count = 250\n\n[file_names]\nposts = \"p.json\"\n"
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.insertion.batch_count, 250);
        assert_eq!(config.file_names.posts, "p.json");
        assert_eq!(config.file_names.tags, "tags.json");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[").unwrap();
        file.flush().unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_input_path_resolution() {
        let config = Config::default();
        assert_eq!(
            config.input_path(Some(Path::new("/data")), "tags.json"),
            PathBuf::from("/data/tags.json")
        );
        assert_eq!(
            config.input_path(None, "tags.json"),
            PathBuf::from("tags.json")
        );
    }
}
