use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

/// Accelerated (MACRS 5-year, half-year convention) percentages by year offset.
pub const DEPRECIATION_TABLE: [Rate; 6] = [
    dec!(0.20),
    dec!(0.32),
    dec!(0.192),
    dec!(0.1152),
    dec!(0.1152),
    dec!(0.0576),
];

/// Share of the base tax credit that reduces the depreciable basis.
pub const CREDIT_BASIS_REDUCTION: Rate = dec!(0.5);

/// Depreciation charge for a 0-based project year. Zero once the table runs out.
pub fn depreciation(year: usize, depreciable_basis: Money) -> Money {
    DEPRECIATION_TABLE
        .get(year)
        .map_or(Decimal::ZERO, |pct| pct.saturating_mul(depreciable_basis))
}

/// Total cost less half of the base tax credit.
pub fn depreciable_basis(total_project_cost: Money, base_tax_credit_amount: Money) -> Money {
    total_project_cost
        .saturating_sub(base_tax_credit_amount.saturating_mul(CREDIT_BASIS_REDUCTION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sums_to_full_basis() {
        let basis = dec!(323_000);
        let total: Decimal = (0..DEPRECIATION_TABLE.len())
            .map(|y| depreciation(y, basis))
            .sum();
        assert_eq!(total, basis);
    }

    #[test]
    fn test_zero_after_table() {
        for year in 6..30 {
            assert_eq!(depreciation(year, dec!(1_000_000)), Decimal::ZERO);
        }
    }

    #[test]
    fn test_front_loaded() {
        let basis = dec!(100_000);
        assert_eq!(depreciation(0, basis), dec!(20_000));
        assert_eq!(depreciation(1, basis), dec!(32_000));
        assert_eq!(depreciation(5, basis), dec!(5_760));
    }

    #[test]
    fn test_basis_reduced_by_half_credit() {
        assert_eq!(depreciable_basis(dec!(380_000), dec!(114_000)), dec!(323_000));
    }
}
