/// Inline SQL migrations for the timeloom database schema.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: categories table
    r#"
CREATE TABLE IF NOT EXISTS categories (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL,
    color TEXT NOT NULL DEFAULT ''
);
"#,
    // Migration 2: tags + tag/category links
    r#"
CREATE TABLE IF NOT EXISTS tags (
    id    TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    color TEXT NOT NULL DEFAULT ''
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS tag_categories (
    tag_id      TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    PRIMARY KEY (tag_id, category_id)
);
"#,
    // Migration 3: templates and their recurring definitions
    r#"
CREATE TABLE IF NOT EXISTS templates (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    name       TEXT NOT NULL,
    interval   TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date   TEXT NOT NULL
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS template_definitions (
    template_id         TEXT NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
    position            INTEGER NOT NULL,
    category_id         TEXT,
    description         TEXT,
    start_minute_offset INTEGER NOT NULL,
    end_minute_offset   INTEGER NOT NULL,
    PRIMARY KEY (template_id, position)
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS template_definition_tags (
    template_id TEXT NOT NULL,
    position    INTEGER NOT NULL,
    tag_id      TEXT NOT NULL,
    PRIMARY KEY (template_id, position, tag_id),
    FOREIGN KEY (template_id, position)
        REFERENCES template_definitions(template_id, position) ON DELETE CASCADE
);
"#,
    // Migration 4: sessions table; times are Unix seconds (UTC),
    // end_time NULL while a stopwatch session is running
    r#"
CREATE TABLE IF NOT EXISTS sessions (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    category_id  TEXT REFERENCES categories(id) ON DELETE SET NULL,
    description  TEXT,
    start_time   INTEGER NOT NULL,
    end_time     INTEGER,
    session_type TEXT NOT NULL DEFAULT 'fixed',
    template_id  TEXT REFERENCES templates(id) ON DELETE CASCADE
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS session_tags (
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    tag_id     TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (session_id, tag_id)
);
"#,
    // Migration 5: indexes for the hot filter paths
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start_time);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_category ON sessions(category_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_sessions_template ON sessions(template_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_session_tags_tag ON session_tags(tag_id);"#,
];
