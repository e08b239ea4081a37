use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{
    BalanceOutcome, NewUser, NewUserGift, ProfileOutcome, RegisterOutcome, UserGiftRow, UserRow,
};
use crate::queries::username_taken;
use crate::{Database, timestamp};

/// Fields written by a profile update.
pub struct ProfileUpdate<'a> {
    pub name: &'a str,
    pub last_name: &'a str,
    pub bio: &'a str,
    pub two_fa_enabled: bool,
    /// New Argon2 hash; `None` keeps the stored one.
    pub two_fa_password_hash: Option<&'a str>,
}

impl Database {
    // -- Users --

    /// Create a user and reserve its username in one transaction.
    pub fn register_user(&self, new: &NewUser<'_>, now: DateTime<Utc>) -> Result<RegisterOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if username_taken(&tx, new.username)? {
                return Ok(RegisterOutcome::UsernameTaken);
            }

            tx.execute(
                "INSERT INTO users (name, last_name, username, phone, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![new.name, new.last_name, new.username, new.phone, timestamp(now)],
            )?;
            let id = tx.last_insert_rowid();

            tx.execute("INSERT INTO taken_usernames (username) VALUES (?1)", [new.username])?;

            let user = query_user_by_id(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))?;
            tx.commit()?;
            Ok(RegisterOutcome::Created(user))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE username = ?1", UserRow::COLUMNS);
            let row = conn.query_row(&sql, [username], UserRow::from_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Apply a profile update. Enabling 2FA needs either a new hash in
    /// `update` or one already stored; both are checked in the same
    /// transaction as the write.
    pub fn update_profile(&self, id: i64, update: &ProfileUpdate<'_>) -> Result<ProfileOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let stored_hash: Option<Option<String>> = tx
                .query_row("SELECT two_fa_password FROM users WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            let Some(stored_hash) = stored_hash else {
                return Ok(ProfileOutcome::UserNotFound);
            };
            if update.two_fa_enabled && update.two_fa_password_hash.is_none() && stored_hash.is_none() {
                return Ok(ProfileOutcome::TwoFactorPasswordRequired);
            }

            tx.execute(
                "UPDATE users
                 SET name = ?1, last_name = ?2, bio = ?3, two_fa_enabled = ?4,
                     two_fa_password = COALESCE(?5, two_fa_password)
                 WHERE id = ?6",
                params![
                    update.name,
                    update.last_name,
                    update.bio,
                    update.two_fa_enabled,
                    update.two_fa_password_hash,
                    id
                ],
            )?;

            let user = query_user_by_id(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished during update", id))?;
            tx.commit()?;
            Ok(ProfileOutcome::Updated(user))
        })
    }

    // -- Stars --

    /// Add a signed amount to the balance. The balance never drops below zero.
    pub fn adjust_stars(&self, id: i64, amount: i64) -> Result<BalanceOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(stars) = query_stars(&tx, id)? else {
                return Ok(BalanceOutcome::UserNotFound);
            };
            let Some(updated) = stars.checked_add(amount).filter(|s| *s >= 0) else {
                return Ok(BalanceOutcome::InsufficientStars);
            };

            tx.execute("UPDATE users SET stars = ?1 WHERE id = ?2", params![updated, id])?;
            tx.commit()?;
            Ok(BalanceOutcome::Updated { stars: updated })
        })
    }

    /// Debit the gift price and record the gift atomically.
    pub fn purchase_gift(
        &self,
        user_id: i64,
        gift: &NewUserGift<'_>,
        now: DateTime<Utc>,
    ) -> Result<BalanceOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(stars) = query_stars(&tx, user_id)? else {
                return Ok(BalanceOutcome::UserNotFound);
            };
            if stars < gift.gift_price {
                return Ok(BalanceOutcome::InsufficientStars);
            }
            let remaining = stars - gift.gift_price;

            tx.execute("UPDATE users SET stars = ?1 WHERE id = ?2", params![remaining, user_id])?;
            tx.execute(
                "INSERT INTO user_gifts (user_id, gift_id, gift_name, gift_icon, gift_price, received_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user_id,
                    gift.gift_id,
                    gift.gift_name,
                    gift.gift_icon,
                    gift.gift_price,
                    timestamp(now)
                ],
            )?;
            tx.commit()?;
            Ok(BalanceOutcome::Updated { stars: remaining })
        })
    }

    /// Gifts owned by a user, newest first.
    pub fn get_user_gifts(&self, user_id: i64) -> Result<Vec<UserGiftRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM user_gifts WHERE user_id = ?1 ORDER BY received_at DESC, id DESC",
                UserGiftRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], UserGiftRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", UserRow::COLUMNS);
    let row = conn.query_row(&sql, [id], UserRow::from_row).optional()?;
    Ok(row)
}

pub(crate) fn query_stars(conn: &Connection, id: i64) -> Result<Option<i64>> {
    let stars = conn
        .query_row("SELECT stars FROM users WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(stars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::register;

    #[test]
    fn register_reserves_username() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@kate");
        assert_eq!(user.stars, 1_000_000);
        assert!(!user.two_fa_enabled);

        let again = db
            .register_user(
                &NewUser { name: "Other", last_name: "", username: "@kate", phone: "" },
                Utc::now(),
            )
            .unwrap();
        assert!(matches!(again, RegisterOutcome::UsernameTaken));
    }

    #[test]
    fn seeded_usernames_cannot_register() {
        let db = Database::open_in_memory().unwrap();
        let outcome = db
            .register_user(
                &NewUser { name: "Fake", last_name: "", username: "@botfather", phone: "" },
                Utc::now(),
            )
            .unwrap();
        assert!(matches!(outcome, RegisterOutcome::UsernameTaken));
    }

    #[test]
    fn balance_never_goes_negative() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@saver");

        assert_eq!(
            db.adjust_stars(user.id, -1_000_001).unwrap(),
            BalanceOutcome::InsufficientStars
        );
        assert_eq!(
            db.adjust_stars(user.id, -1_000_000).unwrap(),
            BalanceOutcome::Updated { stars: 0 }
        );
        assert_eq!(
            db.adjust_stars(user.id, 25).unwrap(),
            BalanceOutcome::Updated { stars: 25 }
        );
        assert_eq!(db.adjust_stars(9999, 1).unwrap(), BalanceOutcome::UserNotFound);
    }

    #[test]
    fn purchase_debits_and_records() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@buyer");
        let gift = NewUserGift { gift_id: 7, gift_name: "Rose", gift_icon: "🌹", gift_price: 600_000 };

        assert_eq!(
            db.purchase_gift(user.id, &gift, Utc::now()).unwrap(),
            BalanceOutcome::Updated { stars: 400_000 }
        );
        assert_eq!(
            db.purchase_gift(user.id, &gift, Utc::now()).unwrap(),
            BalanceOutcome::InsufficientStars
        );

        let gifts = db.get_user_gifts(user.id).unwrap();
        assert_eq!(gifts.len(), 1);
        assert_eq!(gifts[0].gift_name, "Rose");
        assert_eq!(db.get_user_by_id(user.id).unwrap().unwrap().stars, 400_000);
    }

    #[test]
    fn profile_update_keeps_hash_when_absent() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@private");

        let update = ProfileUpdate {
            name: "Priv",
            last_name: "Ate",
            bio: "hello",
            two_fa_enabled: true,
            two_fa_password_hash: Some("hash-1"),
        };
        assert!(matches!(db.update_profile(user.id, &update).unwrap(), ProfileOutcome::Updated(_)));

        let update = ProfileUpdate { two_fa_password_hash: None, bio: "bye", ..update };
        let ProfileOutcome::Updated(row) = db.update_profile(user.id, &update).unwrap() else {
            panic!("second update rejected");
        };
        assert_eq!(row.bio, "bye");
        assert!(row.two_fa_enabled);
        assert_eq!(row.two_fa_password.as_deref(), Some("hash-1"));
    }

    #[test]
    fn enabling_two_factor_needs_a_password() {
        let db = Database::open_in_memory().unwrap();
        let user = register(&db, "@careful");

        let update = ProfileUpdate {
            name: "Care",
            last_name: "",
            bio: "",
            two_fa_enabled: true,
            two_fa_password_hash: None,
        };
        assert!(matches!(
            db.update_profile(user.id, &update).unwrap(),
            ProfileOutcome::TwoFactorPasswordRequired
        ));
        assert!(!db.get_user_by_id(user.id).unwrap().unwrap().two_fa_enabled);

        assert!(matches!(db.update_profile(9999, &update).unwrap(), ProfileOutcome::UserNotFound));
    }
}
