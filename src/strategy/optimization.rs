// src/strategy/optimization.rs

//! Order-up-to targets from the newsvendor model.
//!
//! Each unit short costs the margin on a lost sale; each unit too many ties up
//! its purchase cost. The target balances the two over the time it takes a
//! new order to land.

/// Probability of not stocking out that balances underage against overage.
///
/// CR = underage / (underage + overage)
pub fn critical_ratio(underage_cost: f64, overage_cost: f64) -> f64 {
    if underage_cost + overage_cost <= 0.0 {
        return 0.0;
    }
    underage_cost / (underage_cost + overage_cost)
}

/// Approximate quantile function of the standard normal distribution.
///
/// Abramowitz and Stegun 26.2.23, absolute error below 4.5e-4.
fn inverse_normal_cdf(p: f64) -> f64 {
    if p >= 1.0 {
        return 5.0;
    }
    if p <= 0.0 {
        return -5.0;
    }
    if p == 0.5 {
        return 0.0;
    }

    // Valid for 0 < p <= 0.5; mirror the upper half.
    let q = if p < 0.5 { p } else { 1.0 - p };
    let t = (-2.0 * q.ln()).sqrt();

    const C: [f64; 3] = [2.515517, 0.802853, 0.010328];
    const D: [f64; 3] = [1.432788, 0.189269, 0.001308];

    let numerator = C[0] + C[1] * t + C[2] * t * t;
    let denominator = 1.0 + D[0] * t + D[1] * t * t + D[2] * t * t * t;
    let x = t - numerator / denominator;

    if p < 0.5 {
        -x
    } else {
        x
    }
}

/// Units to hold on hand plus in transit right after ordering.
///
/// Target = μ·(L + 1) + z·σ·√(L + 1), where L is the lead time in days and
/// the extra day is the review period until the next decision.
pub fn optimal_base_stock(
    underage_cost: f64,
    overage_cost: f64,
    avg_daily_demand: f64,
    std_dev_daily_demand: f64,
    lead_time_days: u32,
) -> u32 {
    let z = inverse_normal_cdf(critical_ratio(underage_cost, overage_cost));
    let horizon = f64::from(lead_time_days + 1);

    let mean = avg_daily_demand * horizon;
    let spread = std_dev_daily_demand * horizon.sqrt();
    let target = mean + z * spread;

    if target < 0.0 {
        0
    } else {
        target.round() as u32
    }
}
