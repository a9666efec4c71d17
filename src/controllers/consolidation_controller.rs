//! Controlador de consolidación de transportes
//!
//! Orquesta la fusión de varios pedidos de spedycja en un solo transporte
//! físico y su operación inversa. La fusión borra las filas secundarias y
//! guarda su snapshot en el principal; la separación reinserta cada pedido
//! absorbido como fila nueva. Ambas operaciones son todo-o-nada: cualquier
//! fallo dentro de la transacción revierte el estado completo.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use num_traits::ToPrimitive;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::consolidation_dto::{
    CostSplitData, CostSplitParams, MergeResultData, MergeTransportsRequest,
    RecalculateDistanceData, UnmergeResultData, UnmergeTransportRequest,
};
use crate::dto::order_dto::ApiResponse;
use crate::middleware::identity::Identity;
use crate::models::consolidation::{AbsorbedOrder, ResponseData};
use crate::models::order::{Order, OrderStatus};
use crate::repositories::order_repository::{
    ConsolidatedUpdate, OrderRepository, UnmergedUpdate,
};
use crate::services::cost_allocation::{build_cost_breakdown, equal_split, primary_residual};
use crate::services::geodistance_service::GeodistanceResolver;
use crate::services::route_builder::build_route_points;
use crate::services::route_distance::route_distance_with_fallback;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::json::encode;

pub struct ConsolidationController {
    repository: OrderRepository,
    resolver: Arc<dyn GeodistanceResolver>,
}

/// Un pedido solo puede entrar en una fusión si sigue sin responder.
fn ensure_mergeable(order: &Order) -> Result<(), AppError> {
    if order.is_merged {
        return Err(AppError::Conflict(format!(
            "El pedido {} ya forma parte de un transporte fusionado",
            order.order_number
        )));
    }
    if order.status != OrderStatus::New {
        return Err(AppError::Conflict(format!(
            "El pedido {} ya fue procesado",
            order.order_number
        )));
    }
    Ok(())
}

impl ConsolidationController {
    pub fn new(pool: PgPool, resolver: Arc<dyn GeodistanceResolver>) -> Self {
        Self {
            repository: OrderRepository::new(pool),
            resolver,
        }
    }

    /// Fusionar N pedidos secundarios en el principal.
    pub async fn merge(
        &self,
        request: MergeTransportsRequest,
        actor: Identity,
    ) -> Result<ApiResponse<MergeResultData>, AppError> {
        request.validate()?;

        let correlation = Uuid::new_v4();
        log::info!(
            "🚚 [{}] Fusionando {} transportes en el pedido {} (usuario {})",
            correlation,
            request.transports_to_merge.len(),
            request.id,
            actor.user_id
        );

        let secondary_ids: Vec<i64> = request
            .transports_to_merge
            .iter()
            .map(|transport| transport.id)
            .collect();

        if secondary_ids.contains(&request.id) {
            return Err(AppError::BadRequest(
                "El pedido principal no puede fusionarse consigo mismo".to_string(),
            ));
        }
        let mut unique_ids = secondary_ids.clone();
        unique_ids.sort_unstable();
        unique_ids.dedup();
        if unique_ids.len() != secondary_ids.len() {
            return Err(AppError::BadRequest(
                "La lista de transportes a fusionar contiene duplicados".to_string(),
            ));
        }

        let primary = self
            .repository
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| not_found_error("Transport", request.id))?;
        ensure_mergeable(&primary)?;

        // fetch en lote: si falta aunque sea uno, la fusión no se intenta
        let fetched = self.repository.find_by_ids(&secondary_ids).await?;
        if fetched.len() != secondary_ids.len() {
            return Err(AppError::BadRequest(
                "No se encontraron todos los pedidos a fusionar".to_string(),
            ));
        }
        for secondary in &fetched {
            ensure_mergeable(secondary)?;
        }

        // reordenar según la lista pedida: el orden de emisión decide los
        // empates de la secuencia de paradas
        let mut by_id: HashMap<i64, Order> =
            fetched.into_iter().map(|order| (order.id, order)).collect();
        let secondaries: Vec<Order> = secondary_ids
            .iter()
            .map(|id| by_id.remove(id))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                AppError::BadRequest("No se encontraron todos los pedidos a fusionar".to_string())
            })?;

        let route_points =
            build_route_points(&primary, &secondaries, &request.route_configuration);
        let total_distance =
            route_distance_with_fallback(&route_points, Arc::clone(&self.resolver)).await;

        let residual = primary_residual(
            request.delivery_price,
            &request.cost_distribution,
            &secondary_ids,
        );
        let cost_breakdown = build_cost_breakdown(
            primary.id,
            request.delivery_price,
            &request.cost_distribution,
            &secondary_ids,
        );

        let snapshot: Vec<AbsorbedOrder> = secondaries
            .iter()
            .map(|secondary| {
                AbsorbedOrder::capture(
                    secondary,
                    request.cost_distribution.get(&secondary.id).copied(),
                )
            })
            .collect();

        let mut distance_breakdown = HashMap::new();
        if let Some(km) = primary.distance_km {
            distance_breakdown.insert(primary.id, km);
        }
        for secondary in &secondaries {
            if let Some(km) = secondary.distance_km {
                distance_breakdown.insert(secondary.id, km);
            }
        }

        let response_data = ResponseData {
            driver_name: Some(request.driver_name.clone()),
            driver_phone: request.driver_phone.clone(),
            vehicle_number: Some(request.vehicle_number.clone()),
            delivery_price: Some(request.delivery_price),
            is_merged: Some(true),
            route_points: Some(route_points.clone()),
            real_route_distance: Some(total_distance),
            cost_breakdown: Some(cost_breakdown),
            distance_breakdown: Some(distance_breakdown),
            main_transport_cost: Some(residual),
            main_transport_distance: primary.distance_km,
        };

        let update = ConsolidatedUpdate {
            distance_km: i32::try_from(total_distance).unwrap_or(i32::MAX),
            response_json: encode(&response_data)?,
            merged_orders_json: encode(&snapshot)?,
        };

        // transacción todo-o-nada: o desaparecen todos los secundarios y
        // el principal queda consolidado, o no cambia nada
        let mut tx = self.repository.begin().await?;
        let deleted = self.repository.delete_by_ids(&mut tx, &secondary_ids).await?;
        if deleted != secondary_ids.len() as u64 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Los pedidos a fusionar cambiaron durante la operación".to_string(),
            ));
        }
        self.repository
            .apply_merge(&mut tx, primary.id, &update)
            .await?;
        tx.commit().await?;

        log::info!(
            "✅ [{}] Fusión completada: {} pedidos absorbidos, {} km, precio total {}",
            correlation,
            snapshot.len(),
            total_distance,
            request.delivery_price.to_f64().unwrap_or_default()
        );

        Ok(ApiResponse::success_with_message(
            MergeResultData {
                merged_count: snapshot.len(),
                total_distance,
                total_cost: request.delivery_price,
                route_point_count: route_points.len(),
            },
            "Transportes fusionados correctamente".to_string(),
        ))
    }

    /// Deshacer una fusión: reinsertar los pedidos absorbidos como filas
    /// nuevas y limpiar el estado de consolidación del principal.
    pub async fn unmerge(
        &self,
        request: UnmergeTransportRequest,
        actor: Identity,
    ) -> Result<ApiResponse<UnmergeResultData>, AppError> {
        if !actor.elevated {
            return Err(AppError::Forbidden(
                "Solo un administrador puede separar transportes fusionados".to_string(),
            ));
        }

        log::info!(
            "🔀 Separando el transporte {} (usuario {})",
            request.transport_id,
            actor.user_id
        );

        let primary = self
            .repository
            .find_by_id(request.transport_id)
            .await?
            .ok_or_else(|| not_found_error("Transport", request.transport_id))?;

        let snapshot = primary.merge_snapshot();
        if snapshot.is_empty() {
            return Err(AppError::BadRequest(
                "El transporte no está fusionado".to_string(),
            ));
        }

        let now = Utc::now();
        let mut response_data = primary.response_data();
        let restored_distance = response_data.strip_consolidation();

        let unmerge_note = format!(
            "Transporte separado por el usuario {} el {}; {} pedidos restaurados",
            actor.user_id,
            now.format("%Y-%m-%d %H:%M"),
            snapshot.len()
        );
        let notes = match &primary.notes {
            Some(existing) if !existing.trim().is_empty() => {
                Some(format!("{}\n{}", existing, unmerge_note))
            }
            _ => Some(unmerge_note),
        };

        let update = UnmergedUpdate {
            // si el payload no conserva la distancia original se deja la
            // consolidada en lugar de adivinar
            distance_km: restored_distance.or(primary.distance_km),
            response_json: encode(&response_data)?,
            notes,
        };

        let mut tx = self.repository.begin().await?;
        let mut restored_count = 0usize;
        for absorbed in &snapshot {
            let new_order = absorbed.to_restored_order(&primary.order_number, actor.user_id, now);
            let restored = self.repository.insert_restored(&mut tx, &new_order).await?;
            log::info!(
                "📦 Pedido {} restaurado como {} (id {})",
                absorbed.order_number,
                restored.order_number,
                restored.id
            );
            restored_count += 1;
        }
        self.repository
            .apply_unmerge(&mut tx, primary.id, &update)
            .await?;
        tx.commit().await?;

        log::info!(
            "✅ Transporte {} separado: {} pedidos restaurados",
            primary.order_number,
            restored_count
        );

        Ok(ApiResponse::success_with_message(
            UnmergeResultData { restored_count },
            "Transporte separado correctamente".to_string(),
        ))
    }

    /// Recalcular la distancia de una ruta consolidada a petición del
    /// usuario; no hay reintentos automáticos.
    pub async fn recalculate_distance(
        &self,
        id: i64,
    ) -> Result<ApiResponse<RecalculateDistanceData>, AppError> {
        let order = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Transport", id))?;

        let mut response_data = order.response_data();
        let route_points = response_data
            .route_points
            .clone()
            .filter(|points| !points.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest(
                    "El transporte no tiene una ruta consolidada que recalcular".to_string(),
                )
            })?;

        let total_distance =
            route_distance_with_fallback(&route_points, Arc::clone(&self.resolver)).await;
        response_data.real_route_distance = Some(total_distance);

        self.repository
            .update_distance(
                id,
                i32::try_from(total_distance).unwrap_or(i32::MAX),
                &encode(&response_data)?,
            )
            .await?;

        log::info!(
            "📏 Distancia del transporte {} recalculada: {} km sobre {} paradas",
            id,
            total_distance,
            route_points.len()
        );

        Ok(ApiResponse::success(RecalculateDistanceData {
            transport_id: id,
            total_distance,
            route_point_count: route_points.len(),
        }))
    }

    /// Preview del reparto equitativo del precio total.
    pub fn cost_split(
        &self,
        params: CostSplitParams,
    ) -> Result<ApiResponse<CostSplitData>, AppError> {
        if params.orders == 0 {
            return Err(AppError::BadRequest(
                "El número de pedidos debe ser mayor que cero".to_string(),
            ));
        }
        let shares = equal_split(params.total, params.orders as usize);
        Ok(ApiResponse::success(CostSplitData {
            total: params.total,
            shares,
        }))
    }
}
