use anyhow::Result;
use async_trait::async_trait;
use libsql::{Connection, params};
use printwatch_monitor::{StoreError, StoredTarget, TargetId, TargetMetadata, TargetStore};

use crate::pool::{LibsqlManager, LibsqlPool};

/// LibSQL database implementation
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }

    /// Id of the printer using `address`, ignoring `except`
    async fn address_owner(
        conn: &Connection,
        address: &str,
        except: Option<TargetId>,
    ) -> Result<Option<TargetId>> {
        let mut rows = conn
            .query(
                "SELECT id FROM printers WHERE ip_address = ? AND id != ?",
                params![address, except.unwrap_or(-1)],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

/// Map a failed write, recognising the address uniqueness constraint
fn write_error(address: &str, error: libsql::Error) -> StoreError {
    if error.to_string().contains("UNIQUE constraint failed") {
        StoreError::DuplicateAddress(address.to_string())
    } else {
        StoreError::Backend(error.into())
    }
}

#[async_trait]
impl TargetStore for DatabaseImpl {
    async fn create_target(&self, metadata: &TargetMetadata) -> Result<TargetId, StoreError> {
        let conn = self.get_conn().await?;
        if Self::address_owner(&conn, &metadata.address, None).await?.is_some() {
            return Err(StoreError::DuplicateAddress(metadata.address.clone()));
        }

        conn.execute(
            "INSERT INTO printers (name, ip_address, model, location) VALUES (?, ?, ?, ?)",
            params![
                metadata.name.clone(),
                metadata.address.clone(),
                metadata.model.clone(),
                metadata.location.clone()
            ],
        )
        .await
        .map_err(|e| write_error(&metadata.address, e))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(target_id = id, address = %metadata.address, "Stored printer");
        Ok(id)
    }

    async fn update_target(
        &self,
        id: TargetId,
        metadata: &TargetMetadata,
    ) -> Result<bool, StoreError> {
        let conn = self.get_conn().await?;
        if Self::address_owner(&conn, &metadata.address, Some(id)).await?.is_some() {
            return Err(StoreError::DuplicateAddress(metadata.address.clone()));
        }

        let affected = conn
            .execute(
                "UPDATE printers SET name = ?, ip_address = ?, model = ?, location = ? WHERE id = ?",
                params![
                    metadata.name.clone(),
                    metadata.address.clone(),
                    metadata.model.clone(),
                    metadata.location.clone(),
                    id
                ],
            )
            .await
            .map_err(|e| write_error(&metadata.address, e))?;

        Ok(affected > 0)
    }

    async fn delete_target(&self, id: TargetId) -> Result<bool, StoreError> {
        let conn = self.get_conn().await?;
        let affected = conn
            .execute("DELETE FROM printers WHERE id = ?", params![id])
            .await
            .map_err(anyhow::Error::from)?;

        Ok(affected > 0)
    }

    async fn list_targets(&self) -> Result<Vec<StoredTarget>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT id, name, ip_address, model, location FROM printers ORDER BY id", ())
            .await
            .map_err(anyhow::Error::from)?;

        let mut targets = Vec::new();
        while let Some(row) = rows.next().await.map_err(anyhow::Error::from)? {
            let read = || -> Result<StoredTarget> {
                Ok(StoredTarget {
                    id: row.get(0)?,
                    metadata: TargetMetadata {
                        name: row.get(1)?,
                        address: row.get(2)?,
                        model: row.get::<Option<String>>(3)?.unwrap_or_default(),
                        location: row.get::<Option<String>>(4)?.unwrap_or_default(),
                    },
                })
            };
            targets.push(read()?);
        }

        Ok(targets)
    }
}
