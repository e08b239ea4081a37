mod bots;
mod chats;
mod gift_links;
mod messages;
mod users;
mod xost_bots;

pub use gift_links::{GIFT_LINK_PRICE, PREMIUM_DAYS};
pub use users::ProfileUpdate;
pub use xost_bots::PAYMENT_GRACE_DAYS;

use anyhow::Result;
use rusqlite::Connection;

/// Whether a username is reserved or already belongs to a user.
pub(crate) fn username_taken(conn: &Connection, username: &str) -> Result<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM taken_usernames WHERE username = ?1)
             OR EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [username],
        |row| row.get(0),
    )?;
    Ok(taken)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::Database;
    use crate::models::{NewUser, RegisterOutcome, UserRow};

    pub fn register(db: &Database, username: &str) -> UserRow {
        let outcome = db
            .register_user(
                &NewUser {
                    name: "Test",
                    last_name: "",
                    username,
                    phone: "",
                },
                Utc::now(),
            )
            .unwrap();
        match outcome {
            RegisterOutcome::Created(user) => user,
            RegisterOutcome::UsernameTaken => panic!("username {username} already taken"),
        }
    }
}
