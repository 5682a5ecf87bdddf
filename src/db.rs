use crate::config::Config;
use crate::model::{Highlight, StoredHighlight};
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] = &[(
    "system/000_migrations_table.sql",
    include_str!("migrations/system/000_migrations_table.sql"),
)];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

/// Whether an upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    turso_url: Option<String>,
    turso_auth_token: Option<String>,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    /// Flushes pending writes to the remote replica. No-op for local databases.
    pub async fn sync(&self) -> Result<()> {
        if Self::is_replica(&self.turso_url, &self.turso_auth_token) {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        match conn.execute(query, libsql::params![name]).await {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(())
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the configured database and brings the schema up to date.
    /// Errors here are fatal: the unique index on (text, source_id) is what
    /// makes ingestion idempotent, so the caller must not serve without it.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => Builder::new_local(&path).build().await?,
        };

        Self::init(db, turso_url, turso_auth_token).await
    }

    /// Opens a plain local database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db, None, None).await
    }

    async fn init(
        db: LibsqlDatabase,
        turso_url: Option<String>,
        turso_auth_token: Option<String>,
    ) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            turso_url,
            turso_auth_token,
        })
    }

    /// Inserts the highlight, or refreshes the metadata of the row already
    /// holding this (text, source_id) pair. The key fields themselves are
    /// never rewritten; the conflict resolution happens inside the store, so
    /// concurrent submissions of the same passage still end up as one row.
    pub async fn upsert_highlight(&self, hl: &Highlight) -> Result<UpsertOutcome> {
        let existing = self.find_highlight_id(&hl.text, &hl.source_id).await?;

        let query = r#"
            INSERT INTO highlights (source_url, text, note, colour, source_id, source_title)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (text, source_id) DO UPDATE SET
                source_url = excluded.source_url,
                note = excluded.note,
                colour = excluded.colour,
                source_title = excluded.source_title,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        "#;

        self.conn
            .execute(
                query,
                libsql::params![
                    hl.source_url.as_str(),
                    hl.text.as_str(),
                    hl.note.as_str(),
                    hl.colour.as_str(),
                    hl.source_id.as_str(),
                    hl.source_title.as_str()
                ],
            )
            .await?;

        Ok(match existing {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    async fn find_highlight_id(&self, text: &str, source_id: &str) -> Result<Option<i64>> {
        let query = "SELECT id FROM highlights WHERE text = ? AND source_id = ? LIMIT 1";
        let mut rows = self
            .conn
            .query(query, libsql::params![text, source_id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// Returns the whole collection. No filters, no pagination.
    pub async fn list_highlights(&self) -> Result<Vec<StoredHighlight>> {
        let query = r#"
            SELECT id, source_url, text, note, colour, source_id, source_title, created_at, updated_at
            FROM highlights
            ORDER BY id ASC
        "#;

        let mut rows = self.conn.query(query, ()).await?;
        let mut highlights: Vec<StoredHighlight> = vec![];

        while let Some(row) = rows.next().await? {
            highlights.push(Self::row_to_highlight(&row)?);
        }

        Ok(highlights)
    }

    fn row_to_highlight(row: &libsql::Row) -> Result<StoredHighlight> {
        Ok(StoredHighlight {
            id: row.get(0)?,
            highlight: Highlight {
                source_url: row.get::<Option<String>>(1)?.unwrap_or_default(),
                text: row.get::<Option<String>>(2)?.unwrap_or_default(),
                note: row.get::<Option<String>>(3)?.unwrap_or_default(),
                colour: row.get(4)?,
                source_id: row.get::<Option<String>>(5)?.unwrap_or_default(),
                source_title: row.get::<Option<String>>(6)?.unwrap_or_default(),
            },
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(text: &str, source_id: &str) -> Highlight {
        Highlight {
            text: text.to_string(),
            source_id: source_id.to_string(),
            source_title: "Test Book".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fresh_store_is_empty() {
        let db = Database::open(":memory:").await.unwrap();
        assert!(db.list_highlights().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resubmitting_a_highlight_refreshes_metadata() {
        let db = Database::open(":memory:").await.unwrap();

        let first = highlight("a passage worth keeping", "book-1");
        assert_eq!(
            db.upsert_highlight(&first).await.unwrap(),
            UpsertOutcome::Inserted
        );

        let mut second = highlight("a passage worth keeping", "book-1");
        second.note = "re-read this".to_string();
        second.colour = "blue".to_string();
        assert_eq!(
            db.upsert_highlight(&second).await.unwrap(),
            UpsertOutcome::Updated
        );

        let all = db.list_highlights().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].highlight.note, "re-read this");
        assert_eq!(all[0].highlight.colour, "blue");
        assert_eq!(all[0].highlight.source_title, "Test Book");
    }

    #[tokio::test]
    async fn same_text_from_another_source_is_a_new_row() {
        let db = Database::open(":memory:").await.unwrap();

        let a = highlight("the same passage", "book-1");
        let b = highlight("the same passage", "book-2");
        assert_eq!(
            db.upsert_highlight(&a).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            db.upsert_highlight(&b).await.unwrap(),
            UpsertOutcome::Inserted
        );

        assert_eq!(db.list_highlights().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn migrations_are_recorded_and_rerunnable() {
        let db = Database::open(":memory:").await.unwrap();

        for (name, sql) in MIGRATIONS {
            Database::run_migration(db.connection(), name, sql)
                .await
                .unwrap();
        }

        assert!(db.list_highlights().await.unwrap().is_empty());
    }
}
