use crate::error::Result;
use crate::layout::{EngineKind, FieldLayout, Layout};
use rusqlite::Connection;

/// Build a layout from a live SQLite database.
///
/// Reads user tables from `sqlite_master` (skipping `sqlite_sequence`) and
/// their columns from `pragma_table_info`. SQLite types embed any length in
/// the type string itself, so `length` stays 0. A duplicate column from a
/// weird schema is logged and skipped rather than aborting the whole read.
pub fn read_layout(conn: &Connection, db_name: &str) -> Result<Layout> {
    let mut layout = Layout::new(db_name, EngineKind::Sqlite);

    let mut stmt = conn.prepare(
        "SELECT name
           FROM sqlite_master
          WHERE type = 'table' AND name <> 'sqlite_sequence'
          ORDER BY rowid",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut columns = conn.prepare(
        "SELECT name, type, [notnull], COALESCE(dflt_value, ''), pk
           FROM pragma_table_info(?1)",
    )?;

    for table in &tables {
        let fields = columns
            .query_map(rusqlite::params![table], |row| {
                Ok(FieldLayout {
                    name: row.get(0)?,
                    field_type: row.get(1)?,
                    is_nullable: row.get::<_, i64>(2)? == 0,
                    default_value: row.get(3)?,
                    is_primary_key: row.get::<_, i64>(4)? > 0,
                    ..Default::default()
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for field in fields {
            if let Err(e) = layout.add_field(None, table, field) {
                log::warn!("Skipping column while reading {table}: {e}");
            }
        }
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                 id INTEGER PRIMARY KEY,
                 email TEXT NOT NULL,
                 bio TEXT DEFAULT 'hi'
             );
             CREATE TABLE orders (
                 id INTEGER PRIMARY KEY,
                 user_id INTEGER NOT NULL
             );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn reads_tables_and_columns() {
        let layout = read_layout(&sample_db(), "app").unwrap();

        assert_eq!(layout.name, "app");
        assert_eq!(layout.kind, EngineKind::Sqlite);
        assert_eq!(layout.schemas.len(), 1);
        assert_eq!(layout.schemas[0].name, None);

        let users = layout.find_table(None, "users").unwrap();
        let names: Vec<&str> = users.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "bio"]);

        let id = layout.find_field(None, "users", "id").unwrap();
        assert!(id.is_primary_key);
        assert_eq!(id.field_type, "INTEGER");
        // pragma_table_info reports notnull = 0 for INTEGER PRIMARY KEY
        assert!(id.is_nullable);

        let email = layout.find_field(None, "users", "email").unwrap();
        assert!(!email.is_nullable);

        let bio = layout.find_field(None, "users", "bio").unwrap();
        assert_eq!(bio.default_value, "'hi'");
    }

    #[test]
    fn empty_database_yields_empty_layout() {
        let conn = Connection::open_in_memory().unwrap();
        let layout = read_layout(&conn, "empty").unwrap();
        assert!(layout.schemas.is_empty());
    }

    #[test]
    fn sqlite_sequence_is_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT);",
        )
        .unwrap();

        let layout = read_layout(&conn, "app").unwrap();
        assert!(layout.find_table(None, "items").is_some());
        assert!(layout.find_table(None, "sqlite_sequence").is_none());
    }
}
