use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tracing::instrument;

use shinbun_core::{CachedChannel, ChannelId, LocalChannelId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{format_time, parse_time};

const COLUMNS: &str = "id, remote_id, name, last_synced_at";

type RawChannel = (i64, String, String, Option<String>);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawChannel> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_channel((id, remote_id, name, synced): RawChannel) -> Result<CachedChannel, StoreError> {
    let last_synced_at = synced
        .as_deref()
        .map(|raw| parse_time(raw, "channels", "last_synced_at"))
        .transpose()?;
    Ok(CachedChannel {
        local_id: LocalChannelId::new(id),
        remote_id: ChannelId::from_raw(remote_id),
        name,
        last_synced_at,
    })
}

/// Channel cache and per-channel watermarks.
#[derive(Clone)]
pub struct ChannelRepo {
    db: Database,
}

impl ChannelRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find a cached channel by display name. When a rename left two rows
    /// with the same name, the most recently updated one wins.
    #[instrument(skip(self))]
    pub fn lookup_by_name(&self, name: &str) -> Result<Option<CachedChannel>, StoreError> {
        let raw = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM channels WHERE name = ?1 \
                         ORDER BY updated_at DESC, id DESC LIMIT 1"
                    ),
                    [name],
                    raw_row,
                )
                .optional()?)
        })?;
        raw.map(into_channel).transpose()
    }

    /// Insert a channel or refresh its name. The local id is kept on conflict.
    #[instrument(skip(self), fields(remote_id = %remote_id))]
    pub fn upsert(&self, remote_id: &ChannelId, name: &str) -> Result<LocalChannelId, StoreError> {
        let now = format_time(Utc::now());
        self.db.with_conn(|conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO channels (remote_id, name, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?3) \
                 ON CONFLICT(remote_id) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at \
                 RETURNING id",
                rusqlite::params![remote_id.as_str(), name, now],
                |row| row.get(0),
            )?;
            Ok(LocalChannelId::new(id))
        })
    }

    #[instrument(skip(self), fields(channel_id = %id))]
    pub fn get(&self, id: LocalChannelId) -> Result<CachedChannel, StoreError> {
        let raw = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM channels WHERE id = ?1"),
                    [id.get()],
                    raw_row,
                )
                .optional()?)
        })?;
        match raw {
            Some(raw) => into_channel(raw),
            None => Err(StoreError::NotFound(format!("channel {id}"))),
        }
    }

    #[instrument(skip(self), fields(channel_id = %id))]
    pub fn watermark(&self, id: LocalChannelId) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.get(id)?.last_synced_at)
    }

    #[instrument(skip(self), fields(channel_id = %id, at = %at))]
    pub fn set_watermark(&self, id: LocalChannelId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let updated = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE channels SET last_synced_at = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![format_time(at), format_time(Utc::now()), id.get()],
            )?)
        })?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("channel {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<CachedChannel>, StoreError> {
        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM channels ORDER BY name"))?;
            let rows = stmt
                .query_map([], raw_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        rows.into_iter().map(into_channel).collect()
    }
}
