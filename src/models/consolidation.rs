//! Modelos de consolidación de transportes
//!
//! Payload de respuesta del spedytor (`response_json`) y snapshot de
//! pedidos absorbidos (`merged_orders_json`). El snapshot captura todo lo
//! necesario para reconstruir cada pedido secundario como fila nueva al
//! deshacer una fusión: la fusión borra las filas secundarias.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::order::{EndpointDescriptor, NewOrder, Order, OrderStatus};
use crate::models::route_point::RoutePoint;

/// Payload de respuesta almacenado en `orders.response_json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseData {
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub vehicle_number: Option<String>,
    pub delivery_price: Option<Decimal>,
    pub is_merged: Option<bool>,
    pub route_points: Option<Vec<RoutePoint>>,
    pub real_route_distance: Option<i64>,
    /// Reparto de costes por pedido (clave = id del pedido).
    pub cost_breakdown: Option<HashMap<i64, Decimal>>,
    /// Distancia original de cada pedido antes de la fusión.
    pub distance_breakdown: Option<HashMap<i64, i32>>,
    /// Coste residual del transporte principal; permite restaurar su
    /// precio al deshacer la fusión.
    pub main_transport_cost: Option<Decimal>,
    /// Distancia del transporte principal antes de la fusión.
    pub main_transport_distance: Option<i32>,
}

impl ResponseData {
    /// Eliminar el estado de consolidación tras deshacer una fusión.
    /// El precio se restaura solo si el payload conserva
    /// `main_transport_cost`; si no, se mantiene el valor consolidado.
    /// Devuelve la distancia original del principal si era recuperable.
    pub fn strip_consolidation(&mut self) -> Option<i32> {
        if let Some(original_cost) = self.main_transport_cost.take() {
            self.delivery_price = Some(original_cost);
        }
        let original_distance = self.main_transport_distance.take();
        self.is_merged = None;
        self.route_points = None;
        self.real_route_distance = None;
        self.cost_breakdown = None;
        self.distance_breakdown = None;
        original_distance
    }
}

/// Un pedido secundario absorbido por una fusión, tal y como quedó
/// capturado en el snapshot del pedido principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsorbedOrder {
    pub id: i64,
    pub order_number: String,
    pub client_name: Option<String>,
    pub mpk: Option<String>,
    /// Resumen legible "origen → destino".
    pub route: Option<String>,
    pub loading: EndpointDescriptor,
    pub unloading: EndpointDescriptor,
    pub loading_contact: Option<String>,
    pub unloading_contact: Option<String>,
    pub documents: Option<String>,
    pub notes: Option<String>,
    /// Coste asignado a este pedido dentro de la fusión.
    pub cost: Option<Decimal>,
    /// Distancia del pedido antes de ser absorbido.
    pub original_distance_km: Option<i32>,
}

impl AbsorbedOrder {
    /// Capturar un pedido secundario antes de borrarlo.
    pub fn capture(order: &Order, cost: Option<Decimal>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            client_name: order.client_name.clone(),
            mpk: order.mpk.clone(),
            route: Some(order.route_summary()),
            loading: order.loading_descriptor(),
            unloading: order.unloading_descriptor(),
            loading_contact: order.loading_contact.clone(),
            unloading_contact: order.unloading_contact.clone(),
            documents: order.documents.clone(),
            notes: order.notes.clone(),
            cost,
            original_distance_km: order.distance_km,
        }
    }

    /// Reconstruir el pedido como fila nueva al deshacer la fusión.
    /// El id y el número de pedido originales no se restauran: la fila
    /// original ya no existe y el número se regenera en la inserción.
    pub fn to_restored_order(
        &self,
        split_from: &str,
        actor_id: i64,
        now: DateTime<Utc>,
    ) -> NewOrder {
        let split_note = format!(
            "Separado del transporte fusionado {} por el usuario {} el {}",
            split_from,
            actor_id,
            now.format("%Y-%m-%d %H:%M")
        );
        let notes = match &self.notes {
            Some(existing) if !existing.trim().is_empty() => {
                Some(format!("{}\n{}", existing, split_note))
            }
            _ => Some(split_note),
        };

        NewOrder {
            status: OrderStatus::New,
            client_name: self.client_name.clone(),
            mpk: self.mpk.clone(),
            loading_json: serde_json::to_string(&self.loading).ok(),
            unloading_json: serde_json::to_string(&self.unloading).ok(),
            loading_contact: self.loading_contact.clone(),
            unloading_contact: self.unloading_contact.clone(),
            documents: self.documents.clone(),
            notes,
            distance_km: self.original_distance_km,
            created_at: now,
        }
    }
}
