use chrono::{DateTime, Utc};
use tracing::instrument;

use shinbun_core::{Category, LocalChannelId, Message, MessageTs, Priority};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_time, narrow, parse_enum};

type RawMessage = (String, String, String, String, String, i64);

fn into_message(
    (ts, text, permalink, channel_name, category, priority): RawMessage,
) -> Result<Message, StoreError> {
    let category: Category = parse_enum(&category, "messages", "category")?;
    let priority = Priority::new(narrow(priority, "messages", "priority")?);
    Ok(Message {
        text,
        ts: MessageTs::from_raw(ts),
        permalink,
        channel_name,
        category,
        priority,
    })
}

/// Archive of synced messages, keyed on (channel, ts).
#[derive(Clone)]
pub struct MessageRepo {
    db: Database,
}

impl MessageRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a message or overwrite the stored copy with the same ts.
    #[instrument(skip(self, message), fields(channel_id = %channel, ts = %message.ts))]
    pub fn upsert(&self, channel: LocalChannelId, message: &Message) -> Result<(), StoreError> {
        let posted_at = message
            .ts
            .to_datetime()
            .map_err(|e| StoreError::InvalidValue(e.to_string()))?;
        let now = format_time(Utc::now());
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages \
                 (channel_id, ts, posted_at, text, permalink, category, priority, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) \
                 ON CONFLICT(channel_id, ts) DO UPDATE SET \
                 text = excluded.text, permalink = excluded.permalink, \
                 category = excluded.category, priority = excluded.priority, \
                 updated_at = excluded.updated_at",
                rusqlite::params![
                    channel.get(),
                    message.ts.as_str(),
                    format_time(posted_at),
                    message.text,
                    message.permalink,
                    message.category.as_str(),
                    i64::from(message.priority.get()),
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Messages posted at or after `since`, newest first.
    #[instrument(skip(self), fields(channel_id = %channel, since = %since))]
    pub fn query_recent(
        &self,
        channel: LocalChannelId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.ts, m.text, m.permalink, c.name, m.category, m.priority \
                 FROM messages m JOIN channels c ON c.id = m.channel_id \
                 WHERE m.channel_id = ?1 AND m.posted_at >= ?2 \
                 ORDER BY m.posted_at DESC, m.id DESC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![channel.get(), format_time(since)], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })?
                .collect::<Result<Vec<RawMessage>, _>>()?;
            Ok(rows)
        })?;
        rows.into_iter().map(into_message).collect()
    }

    #[instrument(skip(self), fields(channel_id = %channel))]
    pub fn count(&self, channel: LocalChannelId) -> Result<u64, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE channel_id = ?1",
                [channel.get()],
                |row| row.get(0),
            )?;
            narrow(n, "messages", "count")
        })
    }
}
