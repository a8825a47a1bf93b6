use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{Money, Rate, Years};

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const IRR_INITIAL_GUESS: Rate = dec!(0.1);

/// Net Present Value of year-end cash flows less an undiscounted upfront
/// investment. Flow `t` (0-based) is discounted by `(1 + rate)^(t + 1)`.
///
/// Returns `None` when `rate <= -100%` or a discount factor leaves the
/// decimal range.
pub fn npv(cash_flows: &[Money], rate: Rate, initial_investment: Money) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for cf in cash_flows {
        discount = discount.checked_mul(one_plus_r)?;
        result = result.checked_add(cf.checked_div(discount)?)?;
    }

    result.checked_sub(initial_investment)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Finds the rate at which `npv(cash_flows, r, initial_investment)` is zero,
/// starting from 10%. There is no bracketing fallback: sequences with several
/// sign changes may fail to converge or settle on a root without economic
/// meaning. Returns `None` on a zero derivative, on leaving `r > -1`, or after
/// `MAX_IRR_ITERATIONS` without convergence.
pub fn irr(cash_flows: &[Money], initial_investment: Money) -> Option<Rate> {
    let flows: Vec<Money> = std::iter::once(-initial_investment)
        .chain(cash_flows.iter().copied())
        .collect();

    let mut rate = IRR_INITIAL_GUESS;

    for iteration in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(&flows, rate) else {
            debug!(iteration, %rate, "IRR iterate left the discountable domain");
            return None;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }

        if dnpv.is_zero() {
            debug!(iteration, %rate, "IRR derivative vanished");
            return None;
        }

        let step = npv_val.checked_div(dnpv)?;
        rate = rate.checked_sub(step)?;

        if step.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }
    }

    debug!(
        iterations = MAX_IRR_ITERATIONS,
        %rate,
        "IRR did not converge"
    );
    None
}

/// `f(r) = sum(c_t / (1+r)^t)` and `f'(r) = sum(-t * c_t / (1+r)^(t+1))`
/// with `t` 0-based, so the outlay at `t = 0` is undiscounted.
fn npv_and_derivative(flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let weighted = Decimal::from(t).checked_mul(*cf)?;
            derivative = derivative
                .checked_sub(weighted.checked_div(discount.checked_mul(one_plus_r)?)?)?;
        }
    }

    Some((value, derivative))
}

/// Fractional years until cumulative cash flow, starting from
/// `-initial_investment`, is non-negative.
///
/// The crossing year is linearly interpolated. An investment that is already
/// covered (zero or negative) pays back at `0`. `None` if the investment is
/// never recovered within the horizon.
pub fn payback_period(cash_flows: &[Money], initial_investment: Money) -> Option<Years> {
    if initial_investment <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let mut cumulative = -initial_investment;

    for (year, cf) in cash_flows.iter().enumerate() {
        let previous = cumulative;
        cumulative = cumulative.saturating_add(*cf);
        if cumulative >= Decimal::ZERO {
            let fraction = if cf.is_zero() {
                Decimal::ZERO
            } else {
                -previous / cf
            };
            return Some(Decimal::from(year) + fraction);
        }
    }

    None
}
