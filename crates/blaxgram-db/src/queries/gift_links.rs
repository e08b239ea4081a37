use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use crate::models::{ActivationOutcome, CreateGiftLinkOutcome, GiftLinkRow, NewGiftLink};
use crate::{Database, parse_timestamp, timestamp};

/// Stars debited from the creator of a gift link.
pub const GIFT_LINK_PRICE: i64 = 100_000;

/// Premium granted by redeeming a gift link.
pub const PREMIUM_DAYS: i64 = 30;

impl Database {
    // -- Gift links --

    /// Debit [`GIFT_LINK_PRICE`] from the creator and store the link.
    pub fn create_gift_link(&self, new: &NewGiftLink<'_>, now: DateTime<Utc>) -> Result<CreateGiftLinkOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let creator: Option<(String, i64)> = tx
                .query_row(
                    "SELECT username, stars FROM users WHERE id = ?1",
                    [new.created_by],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((username, stars)) = creator else {
                return Ok(CreateGiftLinkOutcome::UserNotFound);
            };
            if stars < GIFT_LINK_PRICE {
                return Ok(CreateGiftLinkOutcome::InsufficientStars);
            }
            if query_gift_link(&tx, new.code)?.is_some() {
                return Ok(CreateGiftLinkOutcome::CodeTaken);
            }

            tx.execute(
                "UPDATE users SET stars = stars - ?1 WHERE id = ?2",
                params![GIFT_LINK_PRICE, new.created_by],
            )?;
            tx.execute(
                "INSERT INTO gift_links (id, code, created_by, created_by_username, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.id,
                    new.code,
                    new.created_by,
                    username,
                    timestamp(now),
                    timestamp(new.expires_at)
                ],
            )?;

            let link = query_gift_link(&tx, new.code)?
                .ok_or_else(|| anyhow::anyhow!("gift link {} vanished after insert", new.code))?;
            tx.commit()?;
            Ok(CreateGiftLinkOutcome::Created(link))
        })
    }

    #[cfg(test)]
    pub(crate) fn get_gift_link(&self, code: &str) -> Result<Option<GiftLinkRow>> {
        self.with_conn(|conn| query_gift_link(conn, code))
    }

    /// Redeem a gift link for `user_id`. Premium is extended by
    /// [`PREMIUM_DAYS`] from the later of `now` and the current expiry.
    pub fn activate_gift_link(&self, code: &str, user_id: i64, now: DateTime<Utc>) -> Result<ActivationOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(link) = query_gift_link(&tx, code)? else {
                return Ok(ActivationOutcome::NotFound);
            };
            if link.activated_by.is_some() {
                return Ok(ActivationOutcome::AlreadyActivated);
            }
            let expires_at = parse_timestamp(&link.expires_at).unwrap_or_else(|| {
                warn!("Corrupt expires_at '{}' on gift link '{}'", link.expires_at, link.id);
                DateTime::<Utc>::MIN_UTC
            });
            if expires_at < now {
                return Ok(ActivationOutcome::Expired);
            }

            let user: Option<(String, Option<String>)> = tx
                .query_row(
                    "SELECT username, premium_until FROM users WHERE id = ?1",
                    [user_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((username, premium)) = user else {
                return Ok(ActivationOutcome::UserNotFound);
            };

            let base = premium
                .as_deref()
                .and_then(parse_timestamp)
                .filter(|current| *current > now)
                .unwrap_or(now);
            let premium_until = base + Duration::days(PREMIUM_DAYS);

            tx.execute(
                "UPDATE gift_links SET activated_by = ?1, activated_by_username = ?2, activated_at = ?3
                 WHERE id = ?4",
                params![user_id, username, timestamp(now), link.id],
            )?;
            tx.execute(
                "UPDATE users SET premium_until = ?1 WHERE id = ?2",
                params![timestamp(premium_until), user_id],
            )?;
            tx.commit()?;
            Ok(ActivationOutcome::Activated { premium_until })
        })
    }
}

fn query_gift_link(conn: &Connection, code: &str) -> Result<Option<GiftLinkRow>> {
    let sql = format!("SELECT {} FROM gift_links WHERE code = ?1", GiftLinkRow::COLUMNS);
    let row = conn.query_row(&sql, [code], GiftLinkRow::from_row).optional()?;
    Ok(row)
}
