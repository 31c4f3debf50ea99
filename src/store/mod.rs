use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

use crate::city::ClimateRecord;

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The `cities` collection: one JSON document per city, keyed by its
/// Wikidata id.
pub struct Store<'a> {
    conn: &'a Connection,
}

impl<'a> Store<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cities (
                city_id TEXT PRIMARY KEY NOT NULL,
                document TEXT NOT NULL
            )",
        )?;
        Ok(())
    }

    pub fn upsert(&self, record: &ClimateRecord) -> Result<(), StoreError> {
        let document = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO cities (city_id, document) VALUES (?1, ?2)
             ON CONFLICT(city_id) DO UPDATE SET document = excluded.document",
            (&record.city_id, &document),
        )?;
        Ok(())
    }

    pub fn get(&self, city_id: &str) -> Result<Option<ClimateRecord>, StoreError> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM cities WHERE city_id = ?1",
                [city_id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(document) => Ok(Some(serde_json::from_str(&document)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, city_id: &str) -> Result<bool, StoreError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cities WHERE city_id = ?1)",
            [city_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn all(&self) -> Result<Vec<ClimateRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM cities ORDER BY city_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for document in rows {
            records.push(serde_json::from_str(&document?)?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM cities", [], |row| row.get(0))?;
        Ok(count)
    }
}
