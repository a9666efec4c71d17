use sqlx::PgPool;

use crate::dto::order_dto::OrderResponse;
use crate::repositories::order_repository::OrderRepository;
use crate::utils::errors::{not_found_error, AppError};

pub struct OrderController {
    repository: OrderRepository,
}

impl OrderController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: OrderRepository::new(pool),
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<OrderResponse, AppError> {
        let order = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Transport", id))?;

        Ok(OrderResponse::from(order))
    }
}
