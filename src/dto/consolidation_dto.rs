//! DTOs de consolidación de transportes
//!
//! Formas de petición y respuesta para fusionar y separar transportes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Petición de fusión: el pedido principal absorbe a los secundarios.
#[derive(Debug, Deserialize, Validate)]
pub struct MergeTransportsRequest {
    /// Id del pedido principal
    pub id: i64,

    #[validate(length(min = 1, message = "at least one transport to merge is required"))]
    pub transports_to_merge: Vec<TransportToMerge>,

    /// Coste asignado a cada pedido secundario; los ids ausentes cuentan
    /// como 0. El residuo queda para el principal.
    #[serde(default)]
    pub cost_distribution: HashMap<i64, Decimal>,

    #[validate(length(min = 1, max = 100))]
    pub driver_name: String,

    pub driver_phone: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub vehicle_number: String,

    /// Precio total cotizado del transporte consolidado
    pub delivery_price: Decimal,

    /// Configuración de paradas por pedido secundario
    #[serde(default)]
    pub route_configuration: HashMap<i64, RouteStopConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportToMerge {
    pub id: i64,
}

/// Qué extremos de un pedido secundario participan en la ruta y en qué
/// posición. Un orden sin configurar va al final (999).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteStopConfig {
    pub use_loading: bool,
    pub loading_order: Option<i32>,
    pub use_unloading: bool,
    pub unloading_order: Option<i32>,
}

/// Resultado de una fusión
#[derive(Debug, Serialize)]
pub struct MergeResultData {
    pub merged_count: usize,
    pub total_distance: i64,
    pub total_cost: Decimal,
    pub route_point_count: usize,
}

/// Petición de separación de un transporte fusionado
#[derive(Debug, Deserialize)]
pub struct UnmergeTransportRequest {
    pub transport_id: i64,
}

/// Resultado de una separación
#[derive(Debug, Serialize)]
pub struct UnmergeResultData {
    pub restored_count: usize,
}

/// Resultado de recalcular la distancia de una ruta consolidada
#[derive(Debug, Serialize)]
pub struct RecalculateDistanceData {
    pub transport_id: i64,
    pub total_distance: i64,
    pub route_point_count: usize,
}

/// Parámetros del preview de reparto equitativo
#[derive(Debug, Deserialize)]
pub struct CostSplitParams {
    pub total: Decimal,
    pub orders: u32,
}

/// Preview de reparto equitativo
#[derive(Debug, Serialize)]
pub struct CostSplitData {
    pub total: Decimal,
    pub shares: Vec<Decimal>,
}
