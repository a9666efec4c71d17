//! Modelo de Order (pedido de spedycja)
//!
//! Este módulo contiene el struct Order y sus variantes para operaciones
//! CRUD. Mapea exactamente al schema PostgreSQL con primary key 'id'.
//! Los datos de carga/descarga y la respuesta del spedytor viven en
//! columnas de texto JSON y se decodifican de forma tolerante.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use crate::models::consolidation::{AbsorbedOrder, ResponseData};
use crate::utils::json::decode_or_default;

/// Estado del pedido - mapea al ENUM order_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Responded,
    Completed,
    Rejected,
}

/// Magazyn fijo de la empresa - se serializa con su código
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Warehouse {
    Gliwice,
    Tychy,
    Wroclaw,
}

impl Warehouse {
    pub fn display_name(&self) -> &'static str {
        match self {
            Warehouse::Gliwice => "Magazyn Gliwice",
            Warehouse::Tychy => "Magazyn Tychy",
            Warehouse::Wroclaw => "Magazyn Wrocław",
        }
    }
}

/// Descriptor de un extremo del transporte: magazyn fijo o dirección libre
/// ("odbiór własny"). Todos los campos son opcionales; una fila corrupta
/// degrada a un descriptor vacío.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointDescriptor {
    pub warehouse: Option<Warehouse>,
    pub city: Option<String>,
    pub post_code: Option<String>,
    pub street: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl EndpointDescriptor {
    /// Dirección postal libre para geocodificar, si el punto no es un magazyn.
    pub fn postal_address(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(street) = &self.street {
            if !street.trim().is_empty() {
                parts.push(street.trim().to_string());
            }
        }
        match (&self.post_code, &self.city) {
            (Some(code), Some(city)) => parts.push(format!("{} {}", code.trim(), city.trim())),
            (None, Some(city)) => parts.push(city.trim().to_string()),
            (Some(code), None) => parts.push(code.trim().to_string()),
            (None, None) => {}
        }
        if parts.is_empty() {
            return None;
        }
        parts.push("Polska".to_string());
        Some(parts.join(", "))
    }

    /// Descripción corta del punto para el resumen de ruta.
    pub fn summary(&self) -> String {
        if let Some(warehouse) = self.warehouse {
            return warehouse.display_name().to_string();
        }
        match (&self.post_code, &self.city) {
            (Some(code), Some(city)) => format!("{} {}", code, city),
            (None, Some(city)) => city.clone(),
            _ => "?".to_string(),
        }
    }
}

/// Order principal - mapea exactamente a la tabla orders
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub client_name: Option<String>,
    pub mpk: Option<String>,
    pub loading_json: Option<String>,
    pub unloading_json: Option<String>,
    pub loading_contact: Option<String>,
    pub unloading_contact: Option<String>,
    pub documents: Option<String>,
    pub notes: Option<String>,
    pub distance_km: Option<i32>,
    pub is_merged: bool,
    pub response_json: Option<String>,
    pub merged_orders_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn loading_descriptor(&self) -> EndpointDescriptor {
        decode_or_default(
            self.loading_json.as_deref(),
            &format!("orders.loading_json (id={})", self.id),
        )
    }

    pub fn unloading_descriptor(&self) -> EndpointDescriptor {
        decode_or_default(
            self.unloading_json.as_deref(),
            &format!("orders.unloading_json (id={})", self.id),
        )
    }

    pub fn response_data(&self) -> ResponseData {
        decode_or_default(
            self.response_json.as_deref(),
            &format!("orders.response_json (id={})", self.id),
        )
    }

    /// Snapshot de pedidos absorbidos; vacío si el pedido no está fusionado.
    pub fn merge_snapshot(&self) -> Vec<AbsorbedOrder> {
        decode_or_default(
            self.merged_orders_json.as_deref(),
            &format!("orders.merged_orders_json (id={})", self.id),
        )
    }

    /// Resumen legible "origen → destino".
    pub fn route_summary(&self) -> String {
        format!(
            "{} → {}",
            self.loading_descriptor().summary(),
            self.unloading_descriptor().summary()
        )
    }
}

/// Formato del número de pedido: secuencia de 4 dígitos que se reinicia
/// cada mes, mes sin relleno y año completo, p.ej. "0012/3/2026".
pub fn format_order_number(sequence: u32, month: u32, year: i32) -> String {
    format!("{:04}/{}/{}", sequence, month, year)
}

/// Secuencia mensual de un número de pedido; `None` si el formato no cuadra.
pub fn order_number_sequence(order_number: &str) -> Option<u32> {
    order_number.split('/').next()?.parse().ok()
}

/// Datos para insertar un pedido nuevo; el número de pedido se asigna
/// dentro de la transacción de inserción.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub status: OrderStatus,
    pub client_name: Option<String>,
    pub mpk: Option<String>,
    pub loading_json: Option<String>,
    pub unloading_json: Option<String>,
    pub loading_contact: Option<String>,
    pub unloading_contact: Option<String>,
    pub documents: Option<String>,
    pub notes: Option<String>,
    pub distance_km: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own_pickup() -> EndpointDescriptor {
        EndpointDescriptor {
            warehouse: None,
            city: Some("Katowice".to_string()),
            post_code: Some("40-001".to_string()),
            street: Some("ul. Warszawska 10".to_string()),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_postal_address_own_pickup() {
        let address = own_pickup().postal_address().unwrap();
        assert_eq!(address, "ul. Warszawska 10, 40-001 Katowice, Polska");
    }

    #[test]
    fn test_postal_address_empty_descriptor() {
        assert_eq!(EndpointDescriptor::default().postal_address(), None);
    }

    #[test]
    fn test_summary_prefers_warehouse() {
        let descriptor = EndpointDescriptor {
            warehouse: Some(Warehouse::Gliwice),
            city: Some("Katowice".to_string()),
            ..Default::default()
        };
        assert_eq!(descriptor.summary(), "Magazyn Gliwice");
    }

    #[test]
    fn test_descriptor_roundtrip_through_json_column() {
        let descriptor = own_pickup();
        let raw = serde_json::to_string(&descriptor).unwrap();
        let decoded: EndpointDescriptor = decode_or_default(Some(&raw), "test");
        assert_eq!(decoded, descriptor);
    }

    #[test]
    fn test_order_number_format_and_sequence() {
        assert_eq!(format_order_number(12, 3, 2026), "0012/3/2026");
        assert_eq!(format_order_number(1, 11, 2026), "0001/11/2026");
        assert_eq!(order_number_sequence("0012/3/2026"), Some(12));
        assert_eq!(order_number_sequence("garbage"), None);
    }

    #[test]
    fn test_malformed_endpoint_column_degrades() {
        let order = Order {
            id: 1,
            order_number: "0001/1/2026".to_string(),
            status: OrderStatus::New,
            client_name: None,
            mpk: None,
            loading_json: Some("{broken".to_string()),
            unloading_json: None,
            loading_contact: None,
            unloading_contact: None,
            documents: None,
            notes: None,
            distance_km: None,
            is_merged: false,
            response_json: None,
            merged_orders_json: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert_eq!(order.loading_descriptor(), EndpointDescriptor::default());
        assert_eq!(order.route_summary(), "? → ?");
    }
}
