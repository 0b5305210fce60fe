use rusqlite::{named_params, Connection, OptionalExtension};

use crate::error::AppResult;

/// String values stored under string keys in `app_kv`.
pub struct KvRepository;

impl KvRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<String>> {
        let mut stmt = conn.prepare("SELECT value FROM app_kv WHERE key = :key")?;

        let value = stmt
            .query_row(named_params! {":key": key}, |row| row.get::<_, String>(0))
            .optional()?;

        Ok(value)
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_kv (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }
}
