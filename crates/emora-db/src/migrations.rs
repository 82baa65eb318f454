use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 1;

/// Brings the schema up to [`SCHEMA_VERSION`].
///
/// Table and column names match databases written by earlier Emora builds,
/// so `CREATE TABLE IF NOT EXISTS` adopts an existing file as-is.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, chats, messages)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE IF NOT EXISTS users (
                id              TEXT PRIMARY KEY,
                name            TEXT,
                age             INTEGER,
                dob             TEXT,
                guardian_email  TEXT,
                guardian_phone  TEXT,
                username        TEXT UNIQUE,
                password_hash   TEXT,
                created_at      TEXT
            );

            CREATE TABLE IF NOT EXISTS chats (
                id          TEXT PRIMARY KEY,
                user_id     TEXT,
                title       TEXT,
                category    TEXT,
                created_at  TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_chats_user
                ON chats(user_id, created_at);

            CREATE TABLE IF NOT EXISTS messages (
                id          TEXT PRIMARY KEY,
                chat_id     TEXT,
                role        TEXT,
                content     TEXT,
                created_at  TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_messages_chat
                ON messages(chat_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
