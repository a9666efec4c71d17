//! Constructor de la secuencia de paradas de una ruta consolidada
//!
//! A partir del pedido principal, los secundarios y la configuración de
//! paradas por pedido produce la secuencia ordenada de puntos de ruta.
//! La carga del principal abre la ruta y su descarga la cierra; las
//! paradas de los secundarios se intercalan según su orden configurado.

use std::collections::HashMap;

use crate::dto::consolidation_dto::RouteStopConfig;
use crate::models::order::Order;
use crate::models::route_point::{RoutePoint, RoutePointKind};

/// La carga del principal siempre abre la secuencia.
pub const PRIMARY_LOADING_SORT_ORDER: i32 = 1;

/// La descarga del principal cierra la secuencia: constante alta que
/// ordena después de cualquier orden configurado razonable.
pub const PRIMARY_UNLOADING_SORT_ORDER: i32 = 15;

/// Una parada seleccionada sin orden explícito va al final.
pub const DEFAULT_STOP_SORT_ORDER: i32 = 999;

/// Construir la secuencia ordenada de paradas. Un secundario que no
/// aporta ningún extremo queda fuera de la geometría (sigue recibiendo
/// su asignación de coste). El sort es estable: a igual clave se conserva
/// el orden de emisión.
pub fn build_route_points(
    primary: &Order,
    secondaries: &[Order],
    configuration: &HashMap<i64, RouteStopConfig>,
) -> Vec<RoutePoint> {
    let mut points = Vec::new();

    points.push(RoutePoint::new(
        RoutePointKind::Loading,
        None,
        PRIMARY_LOADING_SORT_ORDER,
        primary.loading_descriptor(),
    ));

    for secondary in secondaries {
        let config = configuration.get(&secondary.id).cloned().unwrap_or_default();

        if config.use_loading {
            points.push(RoutePoint::new(
                RoutePointKind::Loading,
                Some(secondary.id),
                config.loading_order.unwrap_or(DEFAULT_STOP_SORT_ORDER),
                secondary.loading_descriptor(),
            ));
        }

        if config.use_unloading {
            points.push(RoutePoint::new(
                RoutePointKind::Unloading,
                Some(secondary.id),
                config.unloading_order.unwrap_or(DEFAULT_STOP_SORT_ORDER),
                secondary.unloading_descriptor(),
            ));
        }
    }

    points.push(RoutePoint::new(
        RoutePointKind::Unloading,
        None,
        PRIMARY_UNLOADING_SORT_ORDER,
        primary.unloading_descriptor(),
    ));

    points.sort_by_key(|point| point.sort_order);
    points
}
