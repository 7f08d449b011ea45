use crate::error::{LedgerFrameError, Result};
use serde::{Deserialize, Serialize};

/// Per-period breakdown of a loan repayment: the principal portion, the
/// interest portion and the resulting payment, one entry per period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub amortization: Vec<f64>,
    pub interest: Vec<f64>,
    pub payment: Vec<f64>,
}

impl AmortizationSchedule {
    pub fn periods(&self) -> usize {
        self.payment.len()
    }

    pub fn total_paid(&self) -> f64 {
        self.payment.iter().sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.interest.iter().sum()
    }
}

/// Constant-amortization (SAC) schedule: a fixed principal portion per
/// period plus interest on the declining balance, so payments shrink over
/// time.
pub fn sac_schedule(rate: f64, periods: usize, principal: f64) -> Result<AmortizationSchedule> {
    validate(rate, periods, principal)?;

    let amortization = principal / periods as f64;
    let mut schedule = AmortizationSchedule {
        amortization: Vec::with_capacity(periods),
        interest: Vec::with_capacity(periods),
        payment: Vec::with_capacity(periods),
    };

    for period in 0..periods {
        let interest = rate * (principal - period as f64 * amortization);
        schedule.amortization.push(amortization);
        schedule.interest.push(interest);
        schedule.payment.push(amortization + interest);
    }

    Ok(schedule)
}

/// French (Price) schedule: a constant payment from the annuity formula,
/// interest on the declining balance, amortization as the remainder. A zero
/// rate degenerates to straight division of the principal.
pub fn price_schedule(rate: f64, periods: usize, principal: f64) -> Result<AmortizationSchedule> {
    validate(rate, periods, principal)?;

    let payment = if rate == 0.0 {
        principal / periods as f64
    } else {
        principal * rate / (1.0 - (1.0 + rate).powi(-(periods as i32)))
    };

    let mut schedule = AmortizationSchedule {
        amortization: Vec::with_capacity(periods),
        interest: Vec::with_capacity(periods),
        payment: Vec::with_capacity(periods),
    };

    let mut balance = principal;
    for _ in 0..periods {
        let interest = balance * rate;
        let amortization = payment - interest;
        balance -= amortization;

        schedule.amortization.push(amortization);
        schedule.interest.push(interest);
        schedule.payment.push(payment);
    }

    Ok(schedule)
}

fn validate(rate: f64, periods: usize, principal: f64) -> Result<()> {
    if periods == 0 {
        return Err(LedgerFrameError::InvalidSchedule(
            "periods must be at least 1".to_string(),
        ));
    }
    if rate < 0.0 {
        return Err(LedgerFrameError::InvalidSchedule(format!(
            "rate must not be negative, got {}",
            rate
        )));
    }
    if principal < 0.0 {
        return Err(LedgerFrameError::InvalidSchedule(format!(
            "principal must not be negative, got {}",
            principal
        )));
    }
    Ok(())
}
