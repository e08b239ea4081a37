use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use rusqlite::params;

use blaxgram_types::models::XostBotStatus;

use crate::models::{NewXostBot, XostBotRow};
use crate::{Database, timestamp};

/// Days a freshly hosted bot runs before payment is due.
pub const PAYMENT_GRACE_DAYS: i64 = 7;

impl Database {
    // -- Hosted bots --

    /// Record a hosted bot as running with a payment deadline
    /// [`PAYMENT_GRACE_DAYS`] from `now`. A duplicate id fails with a
    /// UNIQUE violation.
    pub fn create_xost_bot(&self, new: &NewXostBot<'_>, now: DateTime<Utc>) -> Result<XostBotRow> {
        let deadline = now + Duration::days(PAYMENT_GRACE_DAYS);

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO xost_bots (id, token, language, code, name, status, payment_deadline, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    new.id,
                    new.token,
                    new.language,
                    new.code,
                    new.name,
                    XostBotStatus::Running.as_str(),
                    timestamp(deadline),
                    new.user_id,
                    timestamp(now)
                ],
            )?;

            let sql = format!("SELECT {} FROM xost_bots WHERE id = ?1", XostBotRow::COLUMNS);
            conn.query_row(&sql, [new.id], XostBotRow::from_row)
                .map_err(|e| anyhow!("hosted bot {} not readable after insert: {}", new.id, e))
        })
    }

    pub fn get_xost_bots_for_user(&self, user_id: i64) -> Result<Vec<XostBotRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM xost_bots WHERE user_id = ?1 ORDER BY created_at, id",
                XostBotRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], XostBotRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::register;

    #[test]
    fn hosted_bot_defaults() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@host");
        let now = Utc::now();

        let row = db
            .create_xost_bot(
                &NewXostBot {
                    id: "x1",
                    token: "123:abc",
                    language: "python",
                    code: "print('hi')",
                    name: "Echo",
                    user_id: user.id,
                },
                now,
            )
            .unwrap();

        assert_eq!(row.status, "running");
        assert_eq!(row.logs, "[]");
        assert_eq!(row.ram, "32MB");
        assert_eq!(row.payment_deadline, Some(timestamp(now + Duration::days(7))));

        assert_eq!(db.get_xost_bots_for_user(user.id).unwrap().len(), 1);
        assert!(db.get_xost_bots_for_user(user.id + 1).unwrap().is_empty());
    }
}
