//! Postgres-backed movement ledger.
//!
//! Movements are stored as JSON documents next to the columns the ledger
//! filters on (`item_id`, `is_active`, `occurred_at`). A per-item row in
//! `item_ledger_versions` carries the version counter; conditional appends
//! lock that row (`SELECT ... FOR UPDATE`) for the duration of the
//! transaction, so two exits against the same item serialize on it.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | LedgerError |
//! |------------|----------------------|-------------|
//! | Database (unique violation) | `23505` | `Concurrency` |
//! | Database (serialization failure) | `40001` | `Concurrency` |
//! | Database (other) | Any other | `InvalidWrite` |
//! | PoolClosed / Io / other | N/A | `Unavailable` |
//!
//! Schema: `migrations/0001_movement_ledger.sql`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockroom_core::{ExpectedVersion, ItemId, MovementId};
use stockroom_inventory::{Movement, NewMovement};

use super::r#trait::{LedgerError, LedgerSnapshot, MovementFilter, MovementLedger};

#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: Arc<PgPool>,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl MovementLedger for PostgresLedger {
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn load_item(&self, item_id: ItemId) -> Result<LedgerSnapshot, LedgerError> {
        // One snapshot: version and movements must be read consistently.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let version = read_version(&mut tx, item_id, false).await?;

        let rows = sqlx::query(
            r#"
            SELECT document, is_active
            FROM movements
            WHERE item_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(item_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let movements = rows
            .iter()
            .map(movement_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LedgerSnapshot {
            item_id,
            version,
            movements,
        })
    }

    #[instrument(
        skip(self, movement),
        fields(item_id = %movement.item_id, kind = %movement.kind, expected = ?expected),
        err
    )]
    async fn append_movement(
        &self,
        movement: NewMovement,
        expected: ExpectedVersion,
    ) -> Result<Movement, LedgerError> {
        let item_id = movement.item_id;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let current = read_version(&mut tx, item_id, true).await?;
        if !expected.matches(current) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(LedgerError::Concurrency(format!(
                "item {item_id}: expected {expected:?}, found {current}"
            )));
        }

        let stored = movement.into_movement(MovementId::new(), Utc::now());
        let document = serde_json::to_value(&stored)
            .map_err(|e| LedgerError::InvalidWrite(format!("document serialization failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO movements (id, item_id, occurred_at, is_active, document)
            VALUES ($1, $2, $3, TRUE, $4)
            "#,
        )
        .bind(stored.id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(stored.occurred_at)
        .bind(&document)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        bump_version(&mut tx, item_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(stored)
    }

    #[instrument(skip(self), fields(movement_id = %id), err)]
    async fn deactivate_movement(&self, id: MovementId) -> Result<Movement, LedgerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query("SELECT document, is_active FROM movements WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("select_movement", e))?
            .ok_or(LedgerError::NotFound(id))?;

        let mut movement = movement_from_row(&row)?;
        if !movement.is_active {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(movement);
        }

        // Take the item lock so a concurrent conditional append sees the bump.
        read_version(&mut tx, movement.item_id, true).await?;

        sqlx::query("UPDATE movements SET is_active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("deactivate_movement", e))?;

        bump_version(&mut tx, movement.item_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        movement.is_active = false;
        Ok(movement)
    }

    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, LedgerError> {
        let row = sqlx::query("SELECT document, is_active FROM movements WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_movement", e))?;

        row.as_ref().map(movement_from_row).transpose()
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<Movement>, LedgerError> {
        let item_param: Option<uuid::Uuid> = filter.item_id.map(|id| *id.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT document, is_active
            FROM movements
            WHERE ($1::uuid IS NULL OR item_id = $1)
                AND ($2 = FALSE OR is_active = TRUE)
            ORDER BY occurred_at DESC, id DESC
            "#,
        )
        .bind(item_param)
        .bind(filter.active_only)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.iter().map(movement_from_row).collect()
    }
}

/// Current version of an item's ledger, optionally locking its version row.
async fn read_version(
    tx: &mut Transaction<'_, Postgres>,
    item_id: ItemId,
    for_update: bool,
) -> Result<u64, LedgerError> {
    if for_update {
        sqlx::query(
            r#"
            INSERT INTO item_ledger_versions (item_id, version)
            VALUES ($1, 0)
            ON CONFLICT (item_id) DO NOTHING
            "#,
        )
        .bind(item_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("ensure_version_row", e))?;
    }

    let sql = if for_update {
        "SELECT version FROM item_ledger_versions WHERE item_id = $1 FOR UPDATE"
    } else {
        "SELECT version FROM item_ledger_versions WHERE item_id = $1"
    };

    let version: Option<i64> = sqlx::query(sql)
        .bind(item_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("read_version", e))?
        .map(|row| row.try_get("version"))
        .transpose()
        .map_err(|e| map_sqlx_error("read_version", e))?;

    Ok(version.map(|v| v as u64).unwrap_or(0))
}

async fn bump_version(tx: &mut Transaction<'_, Postgres>, item_id: ItemId) -> Result<(), LedgerError> {
    sqlx::query("UPDATE item_ledger_versions SET version = version + 1 WHERE item_id = $1")
        .bind(item_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("bump_version", e))?;
    Ok(())
}

fn movement_from_row(row: &sqlx::postgres::PgRow) -> Result<Movement, LedgerError> {
    let document: serde_json::Value = row
        .try_get("document")
        .map_err(|e| map_sqlx_error("read_document", e))?;
    let is_active: bool = row
        .try_get("is_active")
        .map_err(|e| map_sqlx_error("read_is_active", e))?;

    let mut movement: Movement = serde_json::from_value(document)
        .map_err(|e| LedgerError::InvalidWrite(format!("failed to deserialize movement document: {e}")))?;
    // The column is authoritative for the soft-delete flag.
    movement.is_active = is_active;
    Ok(movement)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("40001") => LedgerError::Concurrency(msg),
                _ => LedgerError::InvalidWrite(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            LedgerError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => LedgerError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
