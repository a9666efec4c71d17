//! Decodificación tolerante de columnas JSON
//!
//! Los payloads de los pedidos viven en columnas de texto. Una fila antigua
//! o corrupta nunca debe tumbar la operación que la carga: si el JSON no
//! parsea, el campo degrada a su valor por defecto y se deja un warning.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::errors::AppError;

/// Decodificar una columna JSON opcional; en fallo devuelve `T::default()`.
pub fn decode_or_default<T>(raw: Option<&str>, context: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match raw {
        None => T::default(),
        Some(text) if text.trim().is_empty() => T::default(),
        Some(text) => match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("⚠️ JSON inválido en {}: {} (campo degradado)", context, e);
                T::default()
            }
        },
    }
}

/// Serializar un payload antes de persistirlo.
pub fn encode<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Error serializing payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
    #[serde(default)]
    struct Sample {
        city: Option<String>,
        latitude: Option<f64>,
    }

    #[test]
    fn test_decode_valid_json() {
        let decoded: Sample = decode_or_default(Some(r#"{"city":"Gliwice"}"#), "test");
        assert_eq!(decoded.city.as_deref(), Some("Gliwice"));
        assert_eq!(decoded.latitude, None);
    }

    #[test]
    fn test_decode_malformed_json_degrades_to_default() {
        let decoded: Sample = decode_or_default(Some(r#"{"city": unquoted}"#), "test");
        assert_eq!(decoded, Sample::default());
    }

    #[test]
    fn test_decode_missing_and_empty_columns() {
        let missing: Sample = decode_or_default(None, "test");
        let empty: Sample = decode_or_default(Some("   "), "test");
        assert_eq!(missing, Sample::default());
        assert_eq!(empty, Sample::default());
    }

    #[test]
    fn test_encode_then_decode_is_identity() {
        let sample = Sample {
            city: Some("Tychy".to_string()),
            latitude: Some(50.1297),
        };
        let raw = encode(&sample).unwrap();
        let decoded: Sample = decode_or_default(Some(&raw), "test");
        assert_eq!(decoded, sample);
    }
}
