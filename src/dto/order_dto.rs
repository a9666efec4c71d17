//! DTOs de pedidos
//!
//! Respuesta de pedido para la API y el sobre genérico `ApiResponse`.

use serde::Serialize;

use crate::models::consolidation::{AbsorbedOrder, ResponseData};
use crate::models::order::{EndpointDescriptor, Order, OrderStatus};

/// Sobre genérico de respuesta de la API
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            data: None,
        }
    }
}

/// Respuesta de pedido con los payloads JSON ya decodificados
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub client_name: Option<String>,
    pub mpk: Option<String>,
    pub route: String,
    pub loading: EndpointDescriptor,
    pub unloading: EndpointDescriptor,
    pub loading_contact: Option<String>,
    pub unloading_contact: Option<String>,
    pub documents: Option<String>,
    pub notes: Option<String>,
    pub distance_km: Option<i32>,
    pub is_merged: bool,
    pub response: ResponseData,
    pub merge_snapshot: Vec<AbsorbedOrder>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            route: order.route_summary(),
            loading: order.loading_descriptor(),
            unloading: order.unloading_descriptor(),
            response: order.response_data(),
            merge_snapshot: order.merge_snapshot(),
            id: order.id,
            order_number: order.order_number,
            status: order.status,
            client_name: order.client_name,
            mpk: order.mpk,
            loading_contact: order.loading_contact,
            unloading_contact: order.unloading_contact,
            documents: order.documents,
            notes: order.notes,
            distance_km: order.distance_km,
            is_merged: order.is_merged,
            created_at: order.created_at.to_rfc3339(),
            completed_at: order.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}
