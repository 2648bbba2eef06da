//! PostgreSQL-backed inventory ledger.
//!
//! Serializes concurrent reservations with `SELECT ... FOR UPDATE` on the
//! stock row, so the availability check and the reservation insert happen
//! inside one transaction. Requires a live database; the in-memory ledger
//! covers the same contract for in-process tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{OrderId, ProductId, ReservationId, VariantId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{InventoryError, Result};
use crate::ledger::InventoryLedger;
use crate::reservation::{InventoryReservation, ReservationState};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stock_levels (
    product_id UUID NOT NULL,
    variant_id UUID,
    on_hand BIGINT NOT NULL DEFAULT 0,
    UNIQUE NULLS NOT DISTINCT (product_id, variant_id)
);

CREATE TABLE IF NOT EXISTS inventory_reservations (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL,
    product_id UUID NOT NULL,
    variant_id UUID,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    reserved_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    state TEXT NOT NULL DEFAULT 'active'
);

CREATE INDEX IF NOT EXISTS idx_reservations_stock_row
    ON inventory_reservations (product_id, variant_id) WHERE state = 'active';

CREATE INDEX IF NOT EXISTS idx_reservations_order
    ON inventory_reservations (order_id);
"#;

/// PostgreSQL inventory ledger.
#[derive(Clone)]
pub struct PostgresInventoryLedger {
    pool: PgPool,
}

impl PostgresInventoryLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the ledger schema. Idempotent.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_reservation(row: PgRow) -> Result<InventoryReservation> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| {
            InventoryError::Database(sqlx::Error::Decode(
                format!("reservation quantity out of range: {quantity}").into(),
            ))
        })?;

        let state_str: String = row.try_get("state")?;
        let state = ReservationState::parse(&state_str).ok_or_else(|| {
            InventoryError::Database(sqlx::Error::Decode(
                format!("unknown reservation state: {state_str}").into(),
            ))
        })?;

        Ok(InventoryReservation {
            id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            variant_id: row
                .try_get::<Option<Uuid>, _>("variant_id")?
                .map(VariantId::from_uuid),
            quantity,
            reserved_at: row.try_get("reserved_at")?,
            expires_at: row.try_get("expires_at")?,
            state,
        })
    }
}

#[async_trait]
impl InventoryLedger for PostgresInventoryLedger {
    async fn set_stock(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        on_hand: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (product_id, variant_id, on_hand)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, variant_id) DO UPDATE SET on_hand = EXCLUDED.on_hand
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(variant_id.map(|v| v.as_uuid()))
        .bind(on_hand)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn stock_on_hand(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<i64> {
        let on_hand: Option<i64> = sqlx::query_scalar(
            "SELECT on_hand FROM stock_levels WHERE product_id = $1 AND variant_id IS NOT DISTINCT FROM $2",
        )
        .bind(product_id.as_uuid())
        .bind(variant_id.map(|v| v.as_uuid()))
        .fetch_optional(&self.pool)
        .await?;
        Ok(on_hand.unwrap_or(0))
    }

    async fn available(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<i64> {
        let available: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(s.on_hand, 0) - COALESCE((
                SELECT SUM(r.quantity) FROM inventory_reservations r
                WHERE r.product_id = $1
                  AND r.variant_id IS NOT DISTINCT FROM $2
                  AND r.state = 'active'
                  AND r.expires_at > $3
            ), 0)
            FROM (SELECT 1) one
            LEFT JOIN stock_levels s
              ON s.product_id = $1 AND s.variant_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(variant_id.map(|v| v.as_uuid()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(available)
    }

    async fn reserve(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
        order_id: OrderId,
        ttl: Duration,
    ) -> Result<ReservationId> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Lock the stock row so concurrent reservations serialize here.
        let on_hand: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT on_hand FROM stock_levels
            WHERE product_id = $1 AND variant_id IS NOT DISTINCT FROM $2
            FOR UPDATE
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(variant_id.map(|v| v.as_uuid()))
        .fetch_optional(&mut *tx)
        .await?;
        let on_hand = on_hand.unwrap_or(0);

        let reserved: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0) FROM inventory_reservations
            WHERE product_id = $1
              AND variant_id IS NOT DISTINCT FROM $2
              AND state = 'active'
              AND expires_at > $3
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(variant_id.map(|v| v.as_uuid()))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let available = on_hand - reserved;
        if i64::from(quantity) > available {
            // The transaction rolls back on drop; no side effects.
            return Err(InventoryError::InsufficientStock {
                product_id,
                variant_id,
                requested: quantity,
                available,
            });
        }

        let reservation_id = ReservationId::new();
        sqlx::query(
            r#"
            INSERT INTO inventory_reservations
                (id, order_id, product_id, variant_id, quantity, reserved_at, expires_at, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
            "#,
        )
        .bind(reservation_id.as_uuid())
        .bind(order_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(variant_id.map(|v| v.as_uuid()))
        .bind(i64::from(quantity))
        .bind(now)
        .bind(now + ttl)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reservation_id)
    }

    async fn release(&self, reservation_id: ReservationId) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE inventory_reservations SET state = 'released' WHERE id = $1 AND state = 'active'",
        )
        .bind(reservation_id.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM inventory_reservations WHERE id = $1")
                    .bind(reservation_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;
            if exists.is_none() {
                return Err(InventoryError::ReservationNotFound { reservation_id });
            }
            // Already released or committed: idempotent no-op.
        }
        Ok(())
    }

    async fn commit(&self, reservation_id: ReservationId) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM inventory_reservations WHERE id = $1 FOR UPDATE")
            .bind(reservation_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(InventoryError::ReservationNotFound { reservation_id })?;
        let reservation = Self::row_to_reservation(row)?;

        match reservation.state {
            ReservationState::Committed => {
                tx.commit().await?;
                Ok(())
            }
            ReservationState::Released => {
                Err(InventoryError::ReservationReleased { reservation_id })
            }
            ReservationState::Active if reservation.is_expired(now) => {
                sqlx::query("UPDATE inventory_reservations SET state = 'released' WHERE id = $1")
                    .bind(reservation_id.as_uuid())
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                Err(InventoryError::ReservationExpired { reservation_id })
            }
            ReservationState::Active => {
                sqlx::query(
                    r#"
                    INSERT INTO stock_levels (product_id, variant_id, on_hand)
                    VALUES ($1, $2, 0)
                    ON CONFLICT (product_id, variant_id) DO NOTHING
                    "#,
                )
                .bind(reservation.product_id.as_uuid())
                .bind(reservation.variant_id.map(|v| v.as_uuid()))
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE stock_levels SET on_hand = on_hand - $3
                    WHERE product_id = $1 AND variant_id IS NOT DISTINCT FROM $2
                    "#,
                )
                .bind(reservation.product_id.as_uuid())
                .bind(reservation.variant_id.map(|v| v.as_uuid()))
                .bind(i64::from(reservation.quantity))
                .execute(&mut *tx)
                .await?;

                sqlx::query("UPDATE inventory_reservations SET state = 'committed' WHERE id = $1")
                    .bind(reservation_id.as_uuid())
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;
                Ok(())
            }
        }
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let swept = sqlx::query(
            "UPDATE inventory_reservations SET state = 'released' WHERE state = 'active' AND expires_at < $1",
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if swept > 0 {
            tracing::debug!(swept, "released expired reservations");
        }
        Ok(swept as usize)
    }

    async fn reservations_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<InventoryReservation>> {
        let rows = sqlx::query(
            "SELECT * FROM inventory_reservations WHERE order_id = $1 ORDER BY reserved_at",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn get_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<InventoryReservation>> {
        let row = sqlx::query("SELECT * FROM inventory_reservations WHERE id = $1")
            .bind(reservation_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_reservation).transpose()
    }
}
