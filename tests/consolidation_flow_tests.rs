//! Flujo de consolidación de punta a punta, sin red ni base de datos.
//!
//! Ejercita el motor completo tal y como lo usa el orquestador de fusión:
//! construcción de la secuencia de paradas, distancia secuencial con un
//! proveedor determinista, reparto de costes, captura del snapshot y
//! reconstrucción de los pedidos al separar.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use spedycja_backend::dto::consolidation_dto::RouteStopConfig;
use spedycja_backend::models::consolidation::{AbsorbedOrder, ResponseData};
use spedycja_backend::models::order::{EndpointDescriptor, Order, OrderStatus, Warehouse};
use spedycja_backend::models::route_point::RoutePointKind;
use spedycja_backend::services::cost_allocation::{build_cost_breakdown, primary_residual};
use spedycja_backend::services::geodistance_service::{
    haversine_km, Coordinates, GeodistanceResolver, ROAD_CIRCUITY_FACTOR,
};
use spedycja_backend::services::route_builder::build_route_points;
use spedycja_backend::services::route_distance::route_distance_with_fallback;

/// Proveedor determinista: todas las rutas de conducción miden lo mismo
struct FixedDistanceResolver {
    km: f64,
}

#[async_trait::async_trait]
impl GeodistanceResolver for FixedDistanceResolver {
    async fn geocode(&self, _address: &str) -> anyhow::Result<Option<Coordinates>> {
        Ok(None)
    }

    async fn driving_distance_km(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
    ) -> anyhow::Result<Option<f64>> {
        Ok(Some(self.km))
    }
}

/// Proveedor caído: fuerza la cadena de fallbacks
struct UnreachableResolver;

#[async_trait::async_trait]
impl GeodistanceResolver for UnreachableResolver {
    async fn geocode(&self, _address: &str) -> anyhow::Result<Option<Coordinates>> {
        Err(anyhow::anyhow!("connection timed out"))
    }

    async fn driving_distance_km(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
    ) -> anyhow::Result<Option<f64>> {
        Err(anyhow::anyhow!("connection timed out"))
    }
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn order(id: i64, number: &str, destination: (f64, f64), city: &str) -> Order {
    let loading = EndpointDescriptor {
        warehouse: Some(Warehouse::Gliwice),
        ..Default::default()
    };
    let unloading = EndpointDescriptor {
        city: Some(city.to_string()),
        post_code: Some("00-001".to_string()),
        street: Some("ul. Główna 1".to_string()),
        latitude: Some(destination.0),
        longitude: Some(destination.1),
        ..Default::default()
    };
    Order {
        id,
        order_number: number.to_string(),
        status: OrderStatus::New,
        client_name: Some(format!("Klient {}", id)),
        mpk: Some(format!("MPK-{}", id)),
        loading_json: Some(serde_json::to_string(&loading).unwrap()),
        unloading_json: Some(serde_json::to_string(&unloading).unwrap()),
        loading_contact: Some("magazyn 600100200".to_string()),
        unloading_contact: Some(format!("odbiorca {}", id)),
        documents: Some(format!("WZ {}/2026", id)),
        notes: Some("uwaga: rampa".to_string()),
        distance_km: Some(100 + id as i32),
        is_merged: false,
        response_json: None,
        merged_orders_json: None,
        created_at: Utc::now(),
        completed_at: None,
    }
}

fn stop_config(use_loading: bool, loading_order: Option<i32>, use_unloading: bool, unloading_order: Option<i32>) -> RouteStopConfig {
    RouteStopConfig {
        use_loading,
        loading_order,
        use_unloading,
        unloading_order,
    }
}

#[tokio::test]
async fn test_merge_pipeline_route_distance_and_costs() {
    init_logs();
    let primary = order(10, "0001/3/2026", (50.0647, 19.945), "Kraków");
    let secondaries = vec![
        order(11, "0002/3/2026", (51.4027, 21.1471), "Radom"),
        order(12, "0003/3/2026", (51.7592, 19.456), "Łódź"),
    ];

    let mut configuration = HashMap::new();
    configuration.insert(11, stop_config(true, Some(2), false, None));
    configuration.insert(12, stop_config(false, None, true, Some(3)));

    // secuencia: carga principal, carga 11, descarga 12, descarga principal
    let points = build_route_points(&primary, &secondaries, &configuration);
    assert_eq!(points.len(), 4);
    assert_eq!(points[0].kind, RoutePointKind::Loading);
    assert_eq!(points[0].order_id, None);
    assert_eq!(points[1].order_id, Some(11));
    assert_eq!(points[2].order_id, Some(12));
    assert_eq!(points[3].order_id, None);

    let resolver: Arc<dyn GeodistanceResolver> = Arc::new(FixedDistanceResolver { km: 50.0 });
    let total_distance = route_distance_with_fallback(&points, resolver).await;
    assert_eq!(total_distance, 150); // 3 segmentos de 50 km

    // escenario de referencia de costes: 900.00 = 350.00 + 300.00 + 250.00
    let mut distribution = HashMap::new();
    distribution.insert(11, dec("300.00"));
    distribution.insert(12, dec("250.00"));

    let residual = primary_residual(dec("900.00"), &distribution, &[11, 12]);
    assert_eq!(residual, dec("350.00"));

    let breakdown = build_cost_breakdown(10, dec("900.00"), &distribution, &[11, 12]);
    let sum: Decimal = breakdown.values().copied().sum();
    assert_eq!(sum, dec("900.00"));

    // snapshot: un registro por secundario con sus valores pre-fusión
    let snapshot: Vec<AbsorbedOrder> = secondaries
        .iter()
        .map(|secondary| AbsorbedOrder::capture(secondary, distribution.get(&secondary.id).copied()))
        .collect();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].order_number, "0002/3/2026");
    assert_eq!(snapshot[0].cost, Some(dec("300.00")));
    assert_eq!(snapshot[0].original_distance_km, Some(111));
    assert_eq!(snapshot[1].mpk.as_deref(), Some("MPK-12"));

    // payload consolidado: refetch idempotente (decode(encode(x)) == x)
    let response_data = ResponseData {
        driver_name: Some("Jan Kowalski".to_string()),
        vehicle_number: Some("SG 12345".to_string()),
        delivery_price: Some(dec("900.00")),
        is_merged: Some(true),
        route_points: Some(points.clone()),
        real_route_distance: Some(total_distance),
        cost_breakdown: Some(breakdown),
        main_transport_cost: Some(residual),
        main_transport_distance: primary.distance_km,
        ..Default::default()
    };
    let raw = serde_json::to_string(&response_data).unwrap();
    let decoded: ResponseData = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded, response_data);
    let raw_again = serde_json::to_string(&decoded).unwrap();
    let decoded_again: ResponseData = serde_json::from_str(&raw_again).unwrap();
    assert_eq!(decoded_again, response_data);
}

#[tokio::test]
async fn test_unmerge_restores_orders_from_snapshot() {
    init_logs();
    let secondaries = vec![
        order(11, "0002/3/2026", (51.4027, 21.1471), "Radom"),
        order(12, "0003/3/2026", (51.7592, 19.456), "Łódź"),
    ];
    let snapshot: Vec<AbsorbedOrder> = secondaries
        .iter()
        .map(|secondary| AbsorbedOrder::capture(secondary, Some(dec("100.00"))))
        .collect();

    let now = Utc::now();
    for (absorbed, original) in snapshot.iter().zip(&secondaries) {
        let restored = absorbed.to_restored_order("0001/3/2026", 7, now);

        // vuelve como pedido nuevo sin estado de respuesta
        assert_eq!(restored.status, OrderStatus::New);
        assert_eq!(restored.client_name, original.client_name);
        assert_eq!(restored.mpk, original.mpk);
        assert_eq!(restored.loading_json, original.loading_json);
        assert_eq!(restored.unloading_json, original.unloading_json);
        assert_eq!(restored.loading_contact, original.loading_contact);
        assert_eq!(restored.unloading_contact, original.unloading_contact);
        assert_eq!(restored.documents, original.documents);
        assert_eq!(restored.distance_km, original.distance_km);
        assert!(restored
            .notes
            .as_deref()
            .unwrap()
            .contains("Separado del transporte fusionado 0001/3/2026"));
    }

    // el principal recupera su precio y distancia pre-fusión
    let mut response_data = ResponseData {
        delivery_price: Some(dec("900.00")),
        is_merged: Some(true),
        real_route_distance: Some(450),
        main_transport_cost: Some(dec("350.00")),
        main_transport_distance: Some(110),
        ..Default::default()
    };
    let restored_distance = response_data.strip_consolidation();
    assert_eq!(restored_distance, Some(110));
    assert_eq!(response_data.delivery_price, Some(dec("350.00")));
    assert_eq!(response_data.is_merged, None);
    assert_eq!(response_data.route_points, None);
}

#[tokio::test]
async fn test_distance_degrades_when_provider_is_down() {
    init_logs();
    let primary = order(10, "0001/3/2026", (50.0647, 19.945), "Kraków");
    let secondaries = vec![order(11, "0002/3/2026", (51.4027, 21.1471), "Radom")];
    let mut configuration = HashMap::new();
    configuration.insert(11, stop_config(false, None, true, Some(2)));

    let points = build_route_points(&primary, &secondaries, &configuration);
    let resolver: Arc<dyn GeodistanceResolver> = Arc::new(UnreachableResolver);
    let total = route_distance_with_fallback(&points, resolver).await;

    // cada segmento cae a gran círculo × factor vial, nada falla
    let gliwice = Coordinates::new(50.2945, 18.6714);
    let radom = Coordinates::new(51.4027, 21.1471);
    let krakow = Coordinates::new(50.0647, 19.945);
    let expected = (haversine_km(gliwice, radom) * ROAD_CIRCUITY_FACTOR).round() as i64
        + (haversine_km(radom, krakow) * ROAD_CIRCUITY_FACTOR).round() as i64;
    assert_eq!(total, expected);
    assert!(total > 0);
}
