use crate::Database;
use crate::models::{ChatRow, MessageRow, UserRow};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str =
    "id, name, age, dob, guardian_email, guardian_phone, username, password_hash, created_at";
const CHAT_COLUMNS: &str = "id, user_id, title, category, created_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, role, content, created_at";

impl Database {
    // -- Users --

    /// Inserts a user unless the username is already taken.
    /// Returns `false` on a username conflict, leaving the existing row untouched.
    pub fn create_user(&self, user: &UserRow) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name, age, dob, guardian_email, guardian_phone, username, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(username) DO NOTHING",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.age,
                    user.dob,
                    user.guardian_email,
                    user.guardian_phone,
                    user.username,
                    user.password_hash,
                    user.created_at,
                ],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
    }

    // -- Chats --

    pub fn insert_chat(&self, chat: &ChatRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO chats (id, user_id, title, category, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![chat.id, chat.user_id, chat.title, chat.category, chat.created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1");
            let row = conn.query_row(&sql, [id], chat_from_row).optional()?;
            Ok(row)
        })
    }

    /// Newest first. Chats created within the same timestamp keep reverse
    /// insertion order.
    pub fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], chat_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_chats(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM chats WHERE user_id = ?1", [user_id], |row| {
                row.get(0)
            })?)
        })
    }

    // -- Messages --

    /// Full history of a chat, oldest first. Equal timestamps fall back to
    /// insertion order.
    pub fn get_messages(&self, chat_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1 ORDER BY created_at ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([chat_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Writes the user message and the assistant reply of one turn in a single
    /// transaction. Either both rows are committed or neither is.
    pub fn insert_turn(&self, user: &MessageRow, assistant: &MessageRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for message in [user, assistant] {
                tx.execute(
                    "INSERT INTO messages (id, chat_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        message.id,
                        message.chat_id,
                        message.role,
                        message.content,
                        message.created_at,
                    ],
                )
                .with_context(|| format!("failed to insert {} message", message.role))?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                age: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                dob: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                guardian_email: row.get(4)?,
                guardian_phone: row.get(5)?,
                username: row.get(6)?,
                password_hash: row.get(7)?,
                created_at: row.get(8)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        category: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        created_at: row.get(4)?,
    })
}
