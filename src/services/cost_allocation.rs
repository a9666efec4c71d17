//! Reparto de costes de una fusión
//!
//! El principal se queda con el resto exacto del precio total una vez
//! descontadas las asignaciones de los secundarios, de modo que la suma
//! del desglose siempre cuadra con el precio cotizado. Un resto negativo
//! (secundarios sobreasignados) está permitido: avisar antes de enviar es
//! responsabilidad del formulario.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// Coste residual del pedido principal: total menos lo asignado a los
/// secundarios. Los ids sin asignación cuentan como 0.
pub fn primary_residual(
    total: Decimal,
    distribution: &HashMap<i64, Decimal>,
    secondary_ids: &[i64],
) -> Decimal {
    let assigned: Decimal = secondary_ids
        .iter()
        .filter_map(|id| distribution.get(id))
        .copied()
        .sum();
    total - assigned
}

/// Desglose completo de costes por pedido, con el residuo en el principal.
pub fn build_cost_breakdown(
    primary_id: i64,
    total: Decimal,
    distribution: &HashMap<i64, Decimal>,
    secondary_ids: &[i64],
) -> HashMap<i64, Decimal> {
    let mut breakdown = HashMap::with_capacity(secondary_ids.len() + 1);
    breakdown.insert(primary_id, primary_residual(total, distribution, secondary_ids));
    for id in secondary_ids {
        breakdown.insert(*id, distribution.get(id).copied().unwrap_or(Decimal::ZERO));
    }
    breakdown
}

/// Reparto equitativo de conveniencia: el total dividido entre todos los
/// pedidos participantes, truncado a céntimos; el último receptor absorbe
/// el resto para que la suma sea exactamente el total.
pub fn equal_split(total: Decimal, recipients: usize) -> Vec<Decimal> {
    if recipients == 0 {
        return Vec::new();
    }

    let count = Decimal::from(recipients as u64);
    let share = (total / count).round_dp_with_strategy(2, RoundingStrategy::ToZero);

    let mut shares = vec![share; recipients];
    if let Some(last) = shares.last_mut() {
        *last = total - share * Decimal::from((recipients - 1) as u64);
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_residual_exact_remainder() {
        // escenario de referencia: 900.00 = 350.00 + 300.00 + 250.00
        let mut distribution = HashMap::new();
        distribution.insert(11, dec("300.00"));
        distribution.insert(12, dec("250.00"));

        let residual = primary_residual(dec("900.00"), &distribution, &[11, 12]);
        assert_eq!(residual, dec("350.00"));

        let breakdown = build_cost_breakdown(10, dec("900.00"), &distribution, &[11, 12]);
        assert_eq!(breakdown[&10], dec("350.00"));
        assert_eq!(breakdown[&11], dec("300.00"));
        assert_eq!(breakdown[&12], dec("250.00"));
        let sum: Decimal = breakdown.values().copied().sum();
        assert_eq!(sum, dec("900.00"));
    }

    #[test]
    fn test_missing_assignments_count_as_zero() {
        let distribution = HashMap::new();
        let residual = primary_residual(dec("500.00"), &distribution, &[11, 12]);
        assert_eq!(residual, dec("500.00"));

        let breakdown = build_cost_breakdown(10, dec("500.00"), &distribution, &[11, 12]);
        assert_eq!(breakdown[&11], Decimal::ZERO);
        assert_eq!(breakdown[&12], Decimal::ZERO);
    }

    #[test]
    fn test_ids_outside_merge_are_ignored() {
        let mut distribution = HashMap::new();
        distribution.insert(11, dec("100.00"));
        distribution.insert(99, dec("400.00"));

        let residual = primary_residual(dec("300.00"), &distribution, &[11]);
        assert_eq!(residual, dec("200.00"));
    }

    #[test]
    fn test_negative_residual_is_permitted() {
        let mut distribution = HashMap::new();
        distribution.insert(11, dec("700.00"));

        let residual = primary_residual(dec("500.00"), &distribution, &[11]);
        assert_eq!(residual, dec("-200.00"));
    }

    #[test]
    fn test_equal_split_last_recipient_absorbs_remainder() {
        let shares = equal_split(dec("1000.00"), 3);
        assert_eq!(shares, vec![dec("333.33"), dec("333.33"), dec("333.34")]);
        let sum: Decimal = shares.iter().copied().sum();
        assert_eq!(sum, dec("1000.00"));
    }

    #[test]
    fn test_equal_split_exact_division() {
        let shares = equal_split(dec("900.00"), 3);
        assert_eq!(shares, vec![dec("300.00"); 3]);
    }

    #[test]
    fn test_equal_split_sum_is_always_exact() {
        for (total, count) in [("100.01", 3usize), ("0.05", 4), ("999.99", 7)] {
            let total = dec(total);
            let shares = equal_split(total, count);
            let sum: Decimal = shares.iter().copied().sum();
            assert_eq!(sum, total, "reparto de {} entre {}", total, count);
        }
    }

    #[test]
    fn test_equal_split_without_recipients() {
        assert!(equal_split(dec("100.00"), 0).is_empty());
    }
}
