use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Usernames that are reserved before any user registers.
pub const RESERVED_USERNAMES: &[&str] = &[
    "@blaxgram",
    "@bot",
    "@anna_s",
    "@ivan_p",
    "@blaxgram_chat",
    "@botfather",
];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                last_name       TEXT NOT NULL DEFAULT '',
                username        TEXT NOT NULL UNIQUE,
                phone           TEXT NOT NULL DEFAULT '',
                bio             TEXT NOT NULL DEFAULT '',
                stars           INTEGER NOT NULL DEFAULT 1000000 CHECK(stars >= 0),
                premium_until   TEXT,
                two_fa_enabled  INTEGER NOT NULL DEFAULT 0,
                two_fa_password TEXT,
                avatar          TEXT NOT NULL DEFAULT '👤',
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS chats (
                id                  INTEGER PRIMARY KEY,
                type                TEXT NOT NULL CHECK(type IN ('private', 'channel', 'group', 'bot')),
                name                TEXT NOT NULL,
                username            TEXT,
                avatar              TEXT NOT NULL DEFAULT '👤',
                last_message        TEXT,
                last_message_time   TEXT,
                unread              INTEGER NOT NULL DEFAULT 0,
                online              INTEGER NOT NULL DEFAULT 0,
                verified            INTEGER NOT NULL DEFAULT 0,
                created_by          INTEGER REFERENCES users(id),
                bot_id              TEXT
            );

            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id         INTEGER NOT NULL REFERENCES chats(id),
                user_id         INTEGER REFERENCES users(id),
                text            TEXT NOT NULL DEFAULT '',
                sender          TEXT NOT NULL CHECK(sender IN ('me', 'them', 'system', 'channel')),
                sender_name     TEXT,
                time            TEXT NOT NULL,
                date            TEXT NOT NULL,
                type            TEXT NOT NULL DEFAULT 'text'
                                CHECK(type IN ('text', 'file', 'sticker', 'gift', 'call')),
                file_name       TEXT,
                file_size       TEXT,
                gift_id         INTEGER,
                gift_data       TEXT,
                reactions       TEXT NOT NULL DEFAULT '{}',
                star_reactions  INTEGER NOT NULL DEFAULT 0,
                edited          INTEGER NOT NULL DEFAULT 0,
                reply_to        INTEGER REFERENCES messages(id),
                call_info       TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_messages_chat
                ON messages(chat_id, id);

            CREATE TABLE IF NOT EXISTS bots (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                username    TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                token       TEXT NOT NULL UNIQUE,
                commands    TEXT NOT NULL DEFAULT '[]',
                chats       INTEGER NOT NULL DEFAULT 0,
                users       INTEGER NOT NULL DEFAULT 0,
                created_by  INTEGER REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS gift_links (
                id                      TEXT PRIMARY KEY,
                code                    TEXT NOT NULL UNIQUE,
                created_by              INTEGER NOT NULL REFERENCES users(id),
                created_by_username     TEXT NOT NULL,
                created_at              TEXT NOT NULL DEFAULT (datetime('now')),
                expires_at              TEXT NOT NULL,
                activated_by            INTEGER REFERENCES users(id),
                activated_by_username   TEXT,
                activated_at            TEXT
            );

            CREATE TABLE IF NOT EXISTS xost_bots (
                id                  TEXT PRIMARY KEY,
                token               TEXT NOT NULL,
                language            TEXT NOT NULL,
                code                TEXT NOT NULL,
                name                TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'stopped'
                                    CHECK(status IN ('running', 'stopped', 'error')),
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                requests            INTEGER NOT NULL DEFAULT 0,
                uptime              TEXT NOT NULL DEFAULT '0h',
                ram                 TEXT NOT NULL DEFAULT '32MB',
                payment_deadline    TEXT,
                logs                TEXT NOT NULL DEFAULT '[]',
                user_id             INTEGER REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS taken_usernames (
                username    TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS chat_participants (
                chat_id     INTEGER NOT NULL REFERENCES chats(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                role        TEXT NOT NULL DEFAULT 'member'
                            CHECK(role IN ('member', 'admin', 'owner')),
                joined_at   TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (chat_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_participants_user
                ON chat_participants(user_id);

            CREATE TABLE IF NOT EXISTS user_gifts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                gift_id     INTEGER NOT NULL,
                gift_name   TEXT NOT NULL,
                gift_icon   TEXT NOT NULL,
                gift_price  INTEGER NOT NULL,
                received_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    seed_reserved_usernames(conn)?;

    info!("Database migrations complete");
    Ok(())
}

/// Seeds the reserved set only while it is still empty.
fn seed_reserved_usernames(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM taken_usernames", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let mut stmt = conn.prepare("INSERT INTO taken_usernames (username) VALUES (?1)")?;
    for username in RESERVED_USERNAMES {
        stmt.execute([username])?;
    }
    info!("Seeded {} reserved usernames", RESERVED_USERNAMES.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);

        let reserved: i64 = conn
            .query_row("SELECT COUNT(*) FROM taken_usernames", [], |r| r.get(0))
            .unwrap();
        assert_eq!(reserved as usize, RESERVED_USERNAMES.len());
    }

    #[test]
    fn chat_type_is_constrained() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        let res = conn.execute(
            "INSERT INTO chats (id, type, name) VALUES (1, 'supergroup', 'x')",
            [],
        );
        assert!(res.is_err());
    }
}
