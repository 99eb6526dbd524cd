use log::debug;

use crate::error::{RcpspError, Result};
use crate::instance::Instance;

/// An instance whose time data was divided by `divisor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub instance: Instance,
    pub divisor: u32,
}

impl Normalized {
    /// Convert a time value of the normalized instance back to original units
    pub fn restore(&self, value: f64) -> f64 {
        value * self.divisor as f64
    }
}

/// Shrink the time grid by the greatest common divisor of the horizon and all
/// durations.
pub fn normalize(instance: &Instance) -> Result<Normalized> {
    let divisor = (0..instance.activities())
        .flat_map(|i| instance.durations(i).iter().copied())
        .fold(instance.horizon(), gcd);

    if divisor == 0 {
        return Err(RcpspError::invalid(
            "horizon and all durations are zero, time data cannot be normalized",
        ));
    }

    normalize_with(instance, divisor)
}

/// Divide all time data by a given divisor, failing if any value is not a
/// multiple of it.
pub fn normalize_with(instance: &Instance, divisor: u32) -> Result<Normalized> {
    if divisor == 0 {
        return Err(RcpspError::invalid("time divisor must be positive"));
    }

    let durations = (0..instance.activities())
        .map(|i| {
            instance
                .durations(i)
                .iter()
                .map(|&duration| exact_div(duration, divisor))
                .collect::<Result<Vec<u32>>>()
        })
        .collect::<Result<Vec<Vec<u32>>>>()?;
    let horizon = exact_div(instance.horizon(), divisor)?;

    debug!(
        "normalized time data by {divisor}, horizon {} -> {horizon}",
        instance.horizon()
    );

    Ok(Normalized {
        instance: instance.with_time_data(durations, horizon),
        divisor,
    })
}

fn exact_div(value: u32, divisor: u32) -> Result<u32> {
    if value % divisor != 0 {
        return Err(RcpspError::IrreducibleInstance { value, divisor });
    }

    Ok(value / divisor)
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
