use chrono::{DateTime, Datelike, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::order::{
    format_order_number, order_number_sequence, NewOrder, Order, OrderStatus,
};
use crate::utils::errors::AppError;

/// Campos del pedido principal tras una fusión
pub struct ConsolidatedUpdate {
    pub distance_km: i32,
    pub response_json: String,
    pub merged_orders_json: String,
}

/// Campos del pedido principal tras deshacer una fusión
pub struct UnmergedUpdate {
    pub distance_km: Option<i32>,
    pub response_json: String,
    pub notes: Option<String>,
}

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abrir la transacción que cubre una fusión o separación completa.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        Ok(self.pool.begin().await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Order>, AppError> {
        let result = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    /// Fetch en lote; el llamador compara el tamaño del resultado con el
    /// de la lista pedida para detectar ids inexistentes.
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Order>, AppError> {
        let result = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(result)
    }

    /// Siguiente número de pedido del mes en curso. Se consulta dentro de
    /// la transacción para que la secuencia avance con la inserción.
    pub async fn next_order_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let month = at.month();
        let year = at.year();
        let pattern = format!("%/{}/{}", month, year);

        let numbers: Vec<String> =
            sqlx::query_scalar("SELECT order_number FROM orders WHERE order_number LIKE $1")
                .bind(&pattern)
                .fetch_all(&mut **tx)
                .await?;

        let next = numbers
            .iter()
            .filter_map(|number| order_number_sequence(number))
            .max()
            .unwrap_or(0)
            + 1;

        Ok(format_order_number(next, month, year))
    }

    /// Insertar un pedido restaurado desde el snapshot de una fusión.
    /// Recibe id y número de pedido nuevos; los originales no se reutilizan.
    pub async fn insert_restored(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new_order: &NewOrder,
    ) -> Result<Order, AppError> {
        let order_number = self.next_order_number(tx, new_order.created_at).await?;

        let result = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                order_number, status, client_name, mpk,
                loading_json, unloading_json, loading_contact, unloading_contact,
                documents, notes, distance_km, is_merged, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE, $12)
            RETURNING *
            "#,
        )
        .bind(&order_number)
        .bind(new_order.status)
        .bind(&new_order.client_name)
        .bind(&new_order.mpk)
        .bind(&new_order.loading_json)
        .bind(&new_order.unloading_json)
        .bind(&new_order.loading_contact)
        .bind(&new_order.unloading_contact)
        .bind(&new_order.documents)
        .bind(&new_order.notes)
        .bind(new_order.distance_km)
        .bind(new_order.created_at)
        .fetch_one(&mut **tx)
        .await?;

        Ok(result)
    }

    pub async fn delete_by_ids(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[i64],
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// Consolidar el pedido principal: pasa a respondido y fusionado con
    /// la distancia recalculada, el payload de respuesta y el snapshot.
    pub async fn apply_merge(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        update: &ConsolidatedUpdate,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, is_merged = TRUE, distance_km = $3,
                response_json = $4, merged_orders_json = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(OrderStatus::Responded)
        .bind(update.distance_km)
        .bind(&update.response_json)
        .bind(&update.merged_orders_json)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Limpiar el estado de consolidación del principal tras la separación.
    pub async fn apply_unmerge(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        update: &UnmergedUpdate,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET is_merged = FALSE, merged_orders_json = NULL,
                response_json = $2, distance_km = $3, notes = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.response_json)
        .bind(update.distance_km)
        .bind(&update.notes)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Persistir una distancia recalculada fuera de una fusión.
    pub async fn update_distance(
        &self,
        id: i64,
        distance_km: i32,
        response_json: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE orders SET distance_km = $2, response_json = $3 WHERE id = $1")
            .bind(id)
            .bind(distance_km)
            .bind(response_json)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
