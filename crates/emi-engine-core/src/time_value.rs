use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EmiEngineError;
use crate::types::{Money, Rate};
use crate::EmiEngineResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Present value of per-period cash flows, the first flow at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> EmiEngineResult<Money> {
    if rate <= dec!(-1) {
        return Err(EmiEngineError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let out_of_range = || EmiEngineError::invalid("rate", "NPV overflows at this discount rate");
    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for cf in cash_flows.iter().skip(1) {
        discount = discount.checked_mul(one_plus_r).ok_or_else(out_of_range)?;
        let pv = cf.checked_div(discount).ok_or_else(out_of_range)?;
        result = result.checked_add(pv).ok_or_else(out_of_range)?;
    }
    if let Some(first) = cash_flows.first() {
        result = result.checked_add(*first).ok_or_else(out_of_range)?;
    }

    Ok(result)
}

/// Per-period internal rate of return using Newton-Raphson.
///
/// For an installment loan the flows are `[-principal, emi, emi, ...]` and the
/// result is the effective rate per installment period.
pub fn irr(cash_flows: &[Money], guess: Rate) -> EmiEngineResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(EmiEngineError::invalid(
            "cash_flows",
            "IRR requires at least 2 cash flows",
        ));
    }

    let mut rate = guess;
    let not_converged = |iterations: u32| EmiEngineError::ConvergenceFailure {
        function: "IRR".into(),
        iterations,
    };

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_with_derivative(cash_flows, rate) else {
            // Long or steep flows push (1 + r)^t past what Decimal can hold.
            tracing::debug!(iterations = i, %rate, "irr left the representable range");
            return Err(not_converged(i));
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            tracing::trace!(iterations = i, %rate, "irr converged");
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(not_converged(i));
        }

        let step = npv_val.checked_div(dnpv).ok_or_else(|| not_converged(i))?;
        rate = rate.checked_sub(step).ok_or_else(|| not_converged(i))?;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(10.0) {
            rate = dec!(10.0);
        }
    }

    Err(not_converged(MAX_IRR_ITERATIONS))
}

/// NPV and its derivative with respect to the rate, or `None` if any term
/// overflows.
fn npv_with_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    // discount = (1 + r)^t, built up incrementally
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            continue;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let weighted = Decimal::from(t as i64).checked_mul(*cf)?;
            let term = weighted.checked_div(discount.checked_mul(one_plus_r)?)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv_val, dnpv))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_zero_rate_is_sum() {
        let flows = [dec!(-100), dec!(60), dec!(60)];
        assert_eq!(npv(Decimal::ZERO, &flows).unwrap(), dec!(20));
    }

    #[test]
    fn test_irr_level_annuity() {
        // 1000 repaid as 12 x 100: the rate solving the annuity is ~2.92%
        let mut flows = vec![dec!(-1000)];
        flows.extend(std::iter::repeat(dec!(100)).take(12));
        let r = irr(&flows, dec!(0.01)).unwrap();
        assert!(r > dec!(0.029) && r < dec!(0.030), "got {r}");
        assert!(npv(r, &flows).unwrap().abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_zero_interest() {
        let flows = [dec!(-300), dec!(100), dec!(100), dec!(100)];
        let r = irr(&flows, dec!(0.01)).unwrap();
        assert!(r.abs() < dec!(0.000001), "got {r}");
    }

    #[test]
    fn test_irr_overflow_is_convergence_failure() {
        // 1.02^4000 is far outside Decimal's range
        let mut flows = vec![dec!(-1000)];
        flows.extend(std::iter::repeat(dec!(20.25)).take(4000));
        match irr(&flows, dec!(0.02)).unwrap_err() {
            EmiEngineError::ConvergenceFailure { function, .. } => assert_eq!(function, "IRR"),
            other => panic!("Expected ConvergenceFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_npv_overflow_is_error() {
        let mut flows = vec![dec!(-1000)];
        flows.extend(std::iter::repeat(dec!(100)).take(200));
        assert!(npv(dec!(2), &flows).is_err());
    }

    #[test]
    fn test_irr_needs_two_flows() {
        assert!(irr(&[dec!(-1)], dec!(0.1)).is_err());
    }
}
