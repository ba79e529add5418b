//! Full-text page index on sqlite FTS5.

use super::operator::{IndexError, IndexOperator};
use crate::page_store::PageStore;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub struct FulltextIndex {
    conn: Mutex<Connection>,
    store: Arc<dyn PageStore>,
}

impl FulltextIndex {
    pub fn new(store: Arc<dyn PageStore>, db_path: &Path) -> Result<Self, IndexError> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS page_fts USING fts5(
                page_id UNINDEXED,
                body
            );
        "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            store,
        })
    }

    /// Page identifiers whose body matches `query`, best match first.
    ///
    /// Query errors are logged and produce an empty result rather than
    /// failing the caller.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<String> {
        let escaped = query.replace('"', "\"\"");
        let match_expr = format!("\"{escaped}\"");

        let conn = self.conn.lock().unwrap();
        let mut stmt = match conn.prepare(
            r#"
            SELECT page_id
            FROM page_fts
            WHERE page_fts MATCH ?
            ORDER BY bm25(page_fts)
            LIMIT ?
        "#,
        ) {
            Ok(stmt) => stmt,
            Err(e) => {
                warn!("Full-text query prepare failed: {}", e);
                return Vec::new();
            }
        };

        let results = stmt.query_map(params![match_expr, max_results as i64], |row| row.get(0));

        match results {
            Ok(rows) => rows.filter_map(|r| r.ok()).collect(),
            Err(e) => {
                warn!("Full-text query failed for {:?}: {}", query, e);
                Vec::new()
            }
        }
    }
}

impl IndexOperator for FulltextIndex {
    fn name(&self) -> &'static str {
        "fulltext"
    }

    fn add_page(&self, page_id: &str) -> Result<(), IndexError> {
        let content = self.store.read(page_id)?;
        let body = String::from_utf8_lossy(&content).to_string();

        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM page_fts WHERE page_id = ?", params![page_id])?;
        conn.execute(
            "INSERT INTO page_fts (page_id, body) VALUES (?, ?)",
            params![page_id, body],
        )?;

        debug!("Full-text index updated for {}", page_id);
        Ok(())
    }

    fn remove_page(&self, page_id: &str) -> Result<(), IndexError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM page_fts WHERE page_id = ?", params![page_id])?;
        Ok(())
    }
}
