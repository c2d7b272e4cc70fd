use crate::build_insert_sql;
use crate::models::{AttributeValue, Device, UpdateExpression};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::{Arguments, SqlitePool};
use thiserror::Error;

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record with key '{0}' already exists")]
    AlreadyExists(String),
    #[error("refusing to apply an empty update to '{0}'")]
    EmptyUpdate(String),
    #[error("device store query failed")]
    Database(#[from] sqlx::Error),
}

/// Durable key-value storage of devices, keyed by MAC.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Inserts the device unless a record with the same MAC exists, in which
    /// case [`StoreError::AlreadyExists`] is returned and nothing is written.
    async fn create_if_absent(&self, device: &Device) -> Result<(), StoreError>;

    /// Reads the current record, observing every write that completed before.
    async fn get_consistent(&self, mac: &str) -> Result<Option<Device>, StoreError>;

    /// Writes only the attributes named by `update`. No precondition is
    /// checked, the last writer wins.
    async fn partial_update(&self, mac: &str, update: &UpdateExpression)
    -> Result<(), StoreError>;
}

pub struct SqliteDeviceStore {
    pool: SqlitePool,
}

impl SqliteDeviceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
        MIGRATOR.run(pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for SqliteDeviceStore {
    async fn create_if_absent(&self, device: &Device) -> Result<(), StoreError> {
        let now = chrono::Utc::now();
        let (sql, args) = build_insert_sql!(
            "devices",
            [
                ("mac", device.mac.as_str()),
                ("name", device.name.as_str()),
                ("owner", device.owner.as_str()),
                ("status", device.status),
                ("created_at", now),
                ("updated_at", now)
            ]
        );
        match sqlx::query_with(&sql, args).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StoreError::AlreadyExists(device.mac.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_consistent(&self, mac: &str) -> Result<Option<Device>, StoreError> {
        let device = sqlx::query_as::<_, Device>(
            "SELECT mac, name, owner, status FROM devices WHERE mac = ?",
        )
        .bind(mac)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn partial_update(
        &self,
        mac: &str,
        update: &UpdateExpression,
    ) -> Result<(), StoreError> {
        if update.is_empty() {
            return Err(StoreError::EmptyUpdate(mac.to_string()));
        }
        let mut columns = Vec::new();
        let mut args = sqlx::sqlite::SqliteArguments::default();
        for (field, value) in update.assignments() {
            // column names only ever come from the allow-list
            columns.push(format!("\"{}\" = ?", field.attribute()));
            match value {
                AttributeValue::Text(text) => args.add(text.as_str()),
                AttributeValue::Status(status) => args.add(*status),
            }
            .map_err(sqlx::Error::Encode)?;
        }
        columns.push("updated_at = ?".to_string());
        let sql = format!("UPDATE devices SET {} WHERE mac = ?", columns.join(", "));
        args.add(chrono::Utc::now()).map_err(sqlx::Error::Encode)?;
        args.add(mac).map_err(sqlx::Error::Encode)?;

        let result = sqlx::query_with(&sql, args).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            tracing::warn!("Partial update of {} matched no record", mac);
        }
        Ok(())
    }
}
