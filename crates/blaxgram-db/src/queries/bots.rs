use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::models::{BotRow, NewBot};
use crate::{Database, timestamp};

impl Database {
    // -- Bots --

    /// Insert a bot. Duplicate id, username or token fail with a UNIQUE
    /// violation (see [`crate::is_unique_violation`]).
    pub fn create_bot(&self, new: &NewBot<'_>, now: DateTime<Utc>) -> Result<BotRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO bots (id, name, username, description, token, commands, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.id,
                    new.name,
                    new.username,
                    new.description,
                    new.token,
                    new.commands,
                    new.created_by,
                    timestamp(now)
                ],
            )?;

            let sql = format!("SELECT {} FROM bots WHERE id = ?1", BotRow::COLUMNS);
            conn.query_row(&sql, [new.id], BotRow::from_row)
                .map_err(|e| anyhow!("bot {} not readable after insert: {}", new.id, e))
        })
    }

    pub fn get_bots_by_creator(&self, user_id: i64) -> Result<Vec<BotRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM bots WHERE created_by = ?1 ORDER BY created_at, id",
                BotRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], BotRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_unique_violation;
    use crate::queries::test_support::register;

    fn bot<'a>(id: &'a str, username: &'a str, token: &'a str, created_by: i64) -> NewBot<'a> {
        NewBot {
            id,
            name: "Helper",
            username,
            description: "",
            token,
            commands: r#"[{"command":"/start"}]"#.to_string(),
            created_by,
        }
    }

    #[test]
    fn bots_are_listed_per_creator() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "@alice");
        let bob = register(&db, "@bob");

        db.create_bot(&bot("b1", "@helper_bot", "t1", alice.id), Utc::now()).unwrap();
        db.create_bot(&bot("b2", "@other_bot", "t2", bob.id), Utc::now()).unwrap();

        let mine = db.get_bots_by_creator(alice.id).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].username, "@helper_bot");
        assert_eq!(mine[0].commands, r#"[{"command":"/start"}]"#);
    }

    #[test]
    fn duplicate_token_is_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        let alice = register(&db, "@alice");

        db.create_bot(&bot("b1", "@one_bot", "same", alice.id), Utc::now()).unwrap();
        let err = db.create_bot(&bot("b2", "@two_bot", "same", alice.id), Utc::now()).unwrap_err();
        assert!(is_unique_violation(&err));

        let err = db.create_bot(&bot("b1", "@three_bot", "t3", alice.id), Utc::now()).unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
