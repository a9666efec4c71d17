//! Modelo de RoutePoint
//!
//! Un punto de la ruta consolidada (carga o descarga). Es una entidad
//! efímera: solo se persiste serializada dentro del payload de respuesta
//! del pedido principal.

use serde::{Deserialize, Serialize};

use crate::models::order::EndpointDescriptor;

/// Tipo de parada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePointKind {
    Loading,
    Unloading,
}

/// Una parada de la ruta consolidada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub kind: RoutePointKind,
    /// Pedido al que pertenece la parada; `None` = transporte principal.
    pub order_id: Option<i64>,
    pub sort_order: i32,
    pub descriptor: EndpointDescriptor,
    pub description: String,
}

impl RoutePoint {
    pub fn new(
        kind: RoutePointKind,
        order_id: Option<i64>,
        sort_order: i32,
        descriptor: EndpointDescriptor,
    ) -> Self {
        let description = descriptor.summary();
        Self {
            kind,
            order_id,
            sort_order,
            descriptor,
            description,
        }
    }
}
