//! DTOs de la API
//!
//! Formas de petición y respuesta que viajan por la capa HTTP.

pub mod consolidation_dto;
pub mod order_dto;
