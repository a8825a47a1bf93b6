use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::Money;

/// Fixed monthly payment on an amortizing loan.
///
/// `annual_rate_pct` is the lender's quoted APR as a whole percentage
/// (5 = 5%). A zero rate repays principal in equal instalments; a zero term
/// has no payment stream and yields zero. A growth factor beyond the decimal
/// range is treated as its limit, an interest-only payment.
pub fn monthly_payment(principal: Money, annual_rate_pct: Decimal, term_years: u32) -> Money {
    let periods = i64::from(term_years) * 12;
    if periods == 0 {
        return Decimal::ZERO;
    }

    let monthly_rate = annual_rate_pct / dec!(12) / dec!(100);
    if monthly_rate.is_zero() {
        return principal / Decimal::from(periods);
    }

    let annuity_factor = (Decimal::ONE + monthly_rate)
        .checked_powi(periods)
        .and_then(|growth| growth.checked_div(growth - Decimal::ONE))
        .unwrap_or(Decimal::ONE);
    principal
        .saturating_mul(monthly_rate)
        .saturating_mul(annuity_factor)
}

/// Twelve monthly payments.
pub fn annual_payment(principal: Money, annual_rate_pct: Decimal, term_years: u32) -> Money {
    monthly_payment(principal, annual_rate_pct, term_years).saturating_mul(dec!(12))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_loan_payment() {
        // 100k at 5% over 10 years: 1060.655...
        let pmt = monthly_payment(dec!(100_000), dec!(5), 10);
        assert!(
            (pmt - dec!(1060.66)).abs() < dec!(0.01),
            "Expected ~1060.66, got {pmt}"
        );
    }

    #[test]
    fn test_matches_closed_form() {
        let p = dec!(250_000);
        let r = dec!(6.5) / dec!(1200);
        let n = 180i64;
        let g = (Decimal::ONE + r).powi(n);
        let expected = p * r * g / (g - Decimal::ONE);
        let pmt = monthly_payment(p, dec!(6.5), 15);
        assert!(
            (pmt - expected).abs() < dec!(0.000001),
            "Expected {expected}, got {pmt}"
        );
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        let pmt = monthly_payment(dec!(120_000), Decimal::ZERO, 10);
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_zero_term_has_no_payment() {
        assert_eq!(monthly_payment(dec!(50_000), dec!(7), 0), Decimal::ZERO);
    }

    #[test]
    fn test_very_long_term_tends_to_interest_only() {
        // 1.5%/month compounded over 12000 months leaves the decimal range
        let pmt = monthly_payment(dec!(100_000), dec!(18), 1000);
        assert_eq!(pmt, dec!(1500));
    }

    #[test]
    fn test_annual_payment_is_twelve_months() {
        let monthly = monthly_payment(dec!(80_000), dec!(4.25), 7);
        assert_eq!(annual_payment(dec!(80_000), dec!(4.25), 7), monthly * dec!(12));
    }

    #[test]
    fn test_payments_repay_principal() {
        // Rolling the balance forward month by month lands on zero.
        let principal = dec!(100_000);
        let pmt = monthly_payment(principal, dec!(5), 10);
        let r = dec!(5) / dec!(1200);
        let mut balance = principal;
        for _ in 0..120 {
            balance = balance * (Decimal::ONE + r) - pmt;
        }
        assert!(balance.abs() < dec!(0.0001), "Residual balance {balance}");
    }
}
