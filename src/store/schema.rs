pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        category INTEGER,
        is_deprecated INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS tag_aliases (
        id INTEGER PRIMARY KEY,
        antecedent_name TEXT NOT NULL,
        consequent_name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tag_implications (
        id INTEGER PRIMARY KEY,
        antecedent_name TEXT NOT NULL,
        consequent_name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY,
        created_at TEXT,
        updated_at TEXT,
        uploader_id INTEGER,
        score INTEGER NOT NULL DEFAULT 0,
        up_score INTEGER NOT NULL DEFAULT 0,
        down_score INTEGER NOT NULL DEFAULT 0,
        fav_count INTEGER NOT NULL DEFAULT 0,
        source TEXT,
        md5 TEXT,
        rating TEXT,
        width INTEGER,
        height INTEGER,
        file_ext TEXT,
        file_size INTEGER,
        parent_id INTEGER,
        pixiv_id INTEGER,
        has_children INTEGER NOT NULL DEFAULT 0,
        is_pending INTEGER NOT NULL DEFAULT 0,
        is_flagged INTEGER NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_banned INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS posts_media_variants (
        post_id INTEGER NOT NULL,
        variant_type TEXT,
        url TEXT,
        width INTEGER,
        height INTEGER,
        FOREIGN KEY(post_id) REFERENCES posts(id)
    );

    CREATE TABLE IF NOT EXISTS posts_file_urls (
        post_id INTEGER PRIMARY KEY,
        file_url TEXT,
        large_file_url TEXT,
        preview_file_url TEXT,
        FOREIGN KEY(post_id) REFERENCES posts(id)
    );

    CREATE TABLE IF NOT EXISTS posts_tags_assoc (
        post_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        FOREIGN KEY(post_id) REFERENCES posts(id),
        FOREIGN KEY(tag_id) REFERENCES tags(id),
        PRIMARY KEY(post_id, tag_id)
    );

    CREATE TABLE IF NOT EXISTS artists (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        group_name TEXT,
        created_at TEXT,
        updated_at TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_banned INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS artists_aliases (
        artist_id INTEGER NOT NULL,
        alias TEXT NOT NULL,
        FOREIGN KEY(artist_id) REFERENCES artists(id)
    );

    CREATE TABLE IF NOT EXISTS artists_urls (
        id INTEGER PRIMARY KEY,
        artist_id INTEGER NOT NULL,
        url TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT,
        updated_at TEXT,
        FOREIGN KEY(artist_id) REFERENCES artists(id)
    );
";
