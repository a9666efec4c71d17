//! Servicio de geodistancia
//!
//! Este módulo maneja la resolución de coordenadas y distancias de
//! conducción contra Mapbox. Es la única frontera con el proveedor de
//! mapas: el resto del sistema habla con el trait `GeodistanceResolver`,
//! lo que permite un fake determinista en tests.
//!
//! Tabla de constantes del componente: coordenadas de los magazyny fijos,
//! factor de circuito vial y radio terrestre.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::models::order::Warehouse;

/// Par de coordenadas WGS84
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Factor de circuito vial: distancia real ≈ gran círculo × 1.3
pub const ROAD_CIRCUITY_FACTOR: f64 = 1.3;

/// Radio medio de la Tierra en kilómetros
pub const EARTH_RADIUS_KM: f64 = 6371.0;

lazy_static! {
    /// Coordenadas fijas de los magazyny de la empresa
    pub static ref WAREHOUSE_COORDINATES: HashMap<Warehouse, Coordinates> = {
        let mut coords = HashMap::new();
        coords.insert(Warehouse::Gliwice, Coordinates::new(50.2945, 18.6714));
        coords.insert(Warehouse::Tychy, Coordinates::new(50.1297, 18.9866));
        coords.insert(Warehouse::Wroclaw, Coordinates::new(51.1079, 17.0385));
        coords
    };
}

/// Distancia de gran círculo (haversine) en kilómetros.
pub fn haversine_km(origin: Coordinates, destination: Coordinates) -> f64 {
    let lat1 = origin.latitude.to_radians();
    let lat2 = destination.latitude.to_radians();
    let delta_lat = (destination.latitude - origin.latitude).to_radians();
    let delta_lon = (destination.longitude - origin.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Frontera con el proveedor de mapas. `Ok(None)` = el proveedor respondió
/// pero no encontró resultado; `Err` = fallo de red o de protocolo. Ambos
/// casos los absorbe el calculador de rutas, nunca tumban una fusión.
#[async_trait]
pub trait GeodistanceResolver: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;

    async fn driving_distance_km(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Option<f64>>;
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodingResponse {
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<f64>, // [longitude, latitude]
}

#[derive(Debug, Deserialize)]
struct MapboxDirectionsResponse {
    routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    distance: f64, // metros
}

/// Implementación de producción contra Mapbox
pub struct MapboxGeodistance {
    mapbox_token: String,
    client: reqwest::Client,
}

impl MapboxGeodistance {
    pub fn new(mapbox_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            mapbox_token,
            client,
        }
    }
}

#[async_trait]
impl GeodistanceResolver for MapboxGeodistance {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        log::info!("🗺️ Geocodificando dirección: {}", address);

        let encoded_address = urlencoding::encode(address);
        let url = format!(
            "https://api.mapbox.com/search/geocode/v6/forward?q={}&access_token={}&country=pl&limit=1",
            encoded_address, self.mapbox_token
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "SpedycjaBackend/1.0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Geocoding falló con status {}: {}", status, error_text);
            return Ok(None);
        }

        let response_text = response.text().await?;
        let mapbox_response: MapboxGeocodingResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse geocoding response: {}", e))?;

        if let Some(feature) = mapbox_response.features.first() {
            if feature.geometry.coordinates.len() >= 2 {
                let longitude = feature.geometry.coordinates[0];
                let latitude = feature.geometry.coordinates[1];
                log::info!("✅ Geocoding exitoso: {} -> ({}, {})", address, latitude, longitude);
                return Ok(Some(Coordinates::new(latitude, longitude)));
            }
        }

        log::warn!("⚠️ Sin coordenadas para la dirección: {}", address);
        Ok(None)
    }

    async fn driving_distance_km(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Option<f64>> {
        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/driving/{},{};{},{}?access_token={}&overview=false",
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
            self.mapbox_token
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "SpedycjaBackend/1.0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Directions falló con status {}: {}", status, error_text);
            return Ok(None);
        }

        let response_text = response.text().await?;
        let directions: MapboxDirectionsResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse directions response: {}", e))?;

        match directions.routes.first() {
            Some(route) => {
                let km = route.distance / 1000.0;
                log::info!(
                    "✅ Distancia de conducción: ({}, {}) -> ({}, {}) = {:.1} km",
                    origin.latitude,
                    origin.longitude,
                    destination.latitude,
                    destination.longitude,
                    km
                );
                Ok(Some(km))
            }
            None => {
                log::warn!("⚠️ Directions no devolvió ninguna ruta");
                Ok(None)
            }
        }
    }
}
