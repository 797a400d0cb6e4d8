mod ingest;
mod model;
mod store;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::ingest::pipeline::{run_load, LoadReport};
use crate::model::artist::{decode_artist, decode_artist_url};
use crate::model::post::decode_post;
use crate::model::tag::{decode_tag, decode_tag_pair};
use crate::store::repo::Store;
use crate::store::tag_cache::TagCache;
use crate::utils::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bulk-load imageboard JSON exports into a relational schema")]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory holding the exported .json files; defaults to the
    /// current directory.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the tags export.
    Tags,
    /// Load the tag aliases export.
    TagAliases,
    /// Load the tag implications export.
    TagImplications,
    /// Load the artists export (aliases expand alongside).
    Artists,
    /// Load the artist URLs export.
    ArtistUrls,
    /// Load the posts export with variants, file URLs and tag associations.
    Posts {
        /// Skip the tag-association sub-step.
        #[arg(long)]
        skip_tags: bool,
    },
    /// Load every export in dependency order.
    All {
        #[arg(long)]
        skip_tags: bool,
    },
}

struct Loader<'a> {
    store: Store,
    cache: TagCache,
    config: Config,
    data_dir: Option<&'a Path>,
}

impl Loader<'_> {
    fn tags(&mut self) -> Result<LoadReport> {
        let path = self
            .config
            .input_path(self.data_dir, &self.config.file_names.tags);
        let store = &mut self.store;
        run_load("tags", &path, self.config.insertion.batch_count, decode_tag, |batch| {
            store.insert_tags(batch)
        })
    }

    fn tag_aliases(&mut self) -> Result<LoadReport> {
        let path = self
            .config
            .input_path(self.data_dir, &self.config.file_names.tag_aliases);
        let store = &mut self.store;
        run_load(
            "tag aliases",
            &path,
            self.config.insertion.batch_count,
            decode_tag_pair,
            |batch| store.insert_tag_pairs(batch, false),
        )
    }

    fn tag_implications(&mut self) -> Result<LoadReport> {
        let path = self
            .config
            .input_path(self.data_dir, &self.config.file_names.tag_implications);
        let store = &mut self.store;
        run_load(
            "tag implications",
            &path,
            self.config.insertion.batch_count,
            decode_tag_pair,
            |batch| store.insert_tag_pairs(batch, true),
        )
    }

    fn artists(&mut self) -> Result<LoadReport> {
        let path = self
            .config
            .input_path(self.data_dir, &self.config.file_names.artists);
        let store = &mut self.store;
        run_load(
            "artists",
            &path,
            self.config.insertion.batch_count,
            decode_artist,
            |batch| store.insert_artists(batch),
        )
    }

    fn artist_urls(&mut self) -> Result<LoadReport> {
        let path = self
            .config
            .input_path(self.data_dir, &self.config.file_names.artist_urls);
        let store = &mut self.store;
        run_load(
            "artist urls",
            &path,
            self.config.insertion.batch_count,
            decode_artist_url,
            |batch| store.insert_artist_urls(batch),
        )
    }

    fn posts(&mut self, skip_tags: bool) -> Result<LoadReport> {
        let path = self
            .config
            .input_path(self.data_dir, &self.config.file_names.posts);
        let batch_count = self.config.insertion.batch_count;
        let store = &mut self.store;
        let cache = &mut self.cache;
        run_load("posts", &path, batch_count, decode_post, |batch| {
            store.insert_posts(batch, cache, !skip_tags)
        })
    }

    /// Runs every kind in referential dependency order. One kind failing
    /// does not block the kinds after it; the run still exits non-zero.
    fn all(&mut self, skip_tags: bool) -> Result<()> {
        let steps: [(&str, Box<dyn FnMut(&mut Self) -> Result<LoadReport>>); 6] = [
            ("tags", Box::new(|l| l.tags())),
            ("tag aliases", Box::new(|l| l.tag_aliases())),
            ("tag implications", Box::new(|l| l.tag_implications())),
            ("artists", Box::new(|l| l.artists())),
            ("artist urls", Box::new(|l| l.artist_urls())),
            ("posts", Box::new(move |l| l.posts(skip_tags))),
        ];

        let mut failed = Vec::new();
        for (kind, mut step) in steps {
            if let Err(e) = step(self) {
                error!("{kind} load failed: {e:#}");
                failed.push(kind);
            }
        }
        if !failed.is_empty() {
            bail!("load failed for: {}", failed.join(", "));
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let store = Store::open(&config.database.path)?;
    info!("database ready at {}", config.database.path.display());

    let mut loader = Loader {
        store,
        cache: TagCache::new(),
        config,
        data_dir: args.data_dir.as_deref(),
    };

    match args.command {
        Command::Tags => {
            loader.tags()?;
        }
        Command::TagAliases => {
            loader.tag_aliases()?;
        }
        Command::TagImplications => {
            loader.tag_implications()?;
        }
        Command::Artists => {
            loader.artists()?;
        }
        Command::ArtistUrls => {
            loader.artist_urls()?;
        }
        Command::Posts { skip_tags } => {
            loader.posts(skip_tags)?;
        }
        Command::All { skip_tags } => {
            loader.all(skip_tags)?;
        }
    }
    Ok(())
}
