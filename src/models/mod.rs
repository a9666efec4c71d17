//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL y a los payloads JSON de las columnas de texto.

pub mod consolidation;
pub mod order;
pub mod route_point;
