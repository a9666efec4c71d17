//! Identidad del actor
//!
//! La sesión vive en una capa superior; este servicio confía en las
//! cabeceras que inyecta el proxy de sesión y no vuelve a autenticar.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::utils::errors::AppError;

/// Usuario actuante que se extrae de cada request
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i64,
    /// Rol elevado (admin); requerido para separar transportes fusionados.
    pub elevated: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("Cabecera x-user-id requerida".to_string())
            })?;

        let elevated = parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
            .map(|role| role.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);

        Ok(Identity { user_id, elevated })
    }
}
