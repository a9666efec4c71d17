//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores y
//! decodificación tolerante de columnas JSON.

pub mod errors;
pub mod json;
