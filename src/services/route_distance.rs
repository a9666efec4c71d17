//! Calculador secuencial de distancia de ruta
//!
//! Recorre la secuencia ordenada de paradas par a par, resuelve las
//! coordenadas de cada parada una sola vez por llamada y suma la distancia
//! de conducción de cada segmento. Un fallo del proveedor de mapas degrada
//! el resultado (gran círculo × factor vial, o 0 km si el punto no
//! resuelve) pero nunca aborta la operación: una fusión se completa aunque
//! el servicio de mapas esté caído.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::models::order::EndpointDescriptor;
use crate::models::route_point::RoutePoint;
use crate::services::geodistance_service::{
    haversine_km, Coordinates, GeodistanceResolver, ROAD_CIRCUITY_FACTOR, WAREHOUSE_COORDINATES,
};

/// Resolución sin red: coordenadas embebidas o magazyn fijo.
fn offline_coordinates(descriptor: &EndpointDescriptor) -> Option<Coordinates> {
    if let (Some(latitude), Some(longitude)) = (descriptor.latitude, descriptor.longitude) {
        return Some(Coordinates::new(latitude, longitude));
    }
    descriptor
        .warehouse
        .and_then(|warehouse| WAREHOUSE_COORDINATES.get(&warehouse).copied())
}

/// Resolver las coordenadas de una parada: coordenadas embebidas, magazyn
/// fijo o geocodificación de la dirección postal, en ese orden. Un fallo
/// resuelve a `None` en lugar de propagar el error.
pub async fn resolve_point(
    point: &RoutePoint,
    resolver: &dyn GeodistanceResolver,
) -> Option<Coordinates> {
    if let Some(coordinates) = offline_coordinates(&point.descriptor) {
        return Some(coordinates);
    }

    let address = point.descriptor.postal_address()?;
    match resolver.geocode(&address).await {
        Ok(coordinates) => coordinates,
        Err(e) => {
            log::warn!("⚠️ Geocoding no disponible para '{}': {}", address, e);
            None
        }
    }
}

/// Distancia de un segmento entre dos paradas ya resueltas. Si la API de
/// conducción falla, cae a gran círculo × factor vial para ese segmento.
async fn segment_distance_km(
    origin: Coordinates,
    destination: Coordinates,
    resolver: &dyn GeodistanceResolver,
) -> f64 {
    match resolver.driving_distance_km(origin, destination).await {
        Ok(Some(km)) => km,
        Ok(None) => {
            log::warn!("⚠️ Sin ruta de conducción para el segmento, usando gran círculo");
            haversine_km(origin, destination) * ROAD_CIRCUITY_FACTOR
        }
        Err(e) => {
            log::warn!("⚠️ API de conducción no disponible: {}, usando gran círculo", e);
            haversine_km(origin, destination) * ROAD_CIRCUITY_FACTOR
        }
    }
}

/// Distancia total de la ruta en kilómetros, redondeada por segmento.
/// Menos de 2 paradas devuelve 0. El recorrido es estrictamente secuencial
/// y cada parada se resuelve una sola vez dentro de la llamada.
pub async fn calculate_route_distance(
    points: &[RoutePoint],
    resolver: &dyn GeodistanceResolver,
) -> i64 {
    if points.len() < 2 {
        return 0;
    }

    let mut resolved: Vec<Option<Coordinates>> = Vec::with_capacity(points.len());
    for point in points {
        resolved.push(resolve_point(point, resolver).await);
    }

    let mut total: i64 = 0;
    for window in resolved.windows(2) {
        let segment = match (window[0], window[1]) {
            (Some(origin), Some(destination)) => {
                segment_distance_km(origin, destination, resolver).await
            }
            _ => {
                log::warn!("⚠️ Segmento con parada sin resolver, contribuye 0 km");
                0.0
            }
        };
        total += segment.round() as i64;
    }

    total
}

/// Estimación de último recurso: gran círculo × factor vial sobre las
/// paradas resolubles sin red. Solo se usa si el recorrido por segmentos
/// revienta de forma inesperada.
pub fn great_circle_route_estimate(points: &[RoutePoint]) -> i64 {
    if points.len() < 2 {
        return 0;
    }

    let resolved: Vec<Option<Coordinates>> = points
        .iter()
        .map(|point| offline_coordinates(&point.descriptor))
        .collect();

    let mut total: i64 = 0;
    for window in resolved.windows(2) {
        if let (Some(origin), Some(destination)) = (window[0], window[1]) {
            total += (haversine_km(origin, destination) * ROAD_CIRCUITY_FACTOR).round() as i64;
        }
    }

    total
}

/// Entrada pública del cálculo de ruta: protege al orquestador de un
/// pánico inesperado en el recorrido cayendo a la estimación de gran
/// círculo en lugar de tumbar la petición.
pub async fn route_distance_with_fallback(
    points: &[RoutePoint],
    resolver: Arc<dyn GeodistanceResolver>,
) -> i64 {
    let walk = AssertUnwindSafe(calculate_route_distance(points, resolver.as_ref()));
    match walk.catch_unwind().await {
        Ok(total) => total,
        Err(_) => {
            log::error!("❌ El cálculo de ruta falló de forma inesperada, usando estimación de gran círculo");
            great_circle_route_estimate(points)
        }
    }
}
