//! Size-dependent score weighting
//!
//! Guild aggregates are damped for small guilds. The multiplier blends
//! linearly towards full credit at the nominal guild size, with a sinusoidal
//! term keeping small guilds from being penalized linearly.

/// Member count at which a guild receives full credit.
pub const NOMINAL_GUILD_SIZE: f64 = 125.0;

/// Phase constant of the sinusoidal damping term.
const PHASE: f64 = 0.927296;

/// Compute the weight multiplier for a guild of the given size.
///
/// `multiplier(125) == 1.0`, `multiplier(0) == 0.2`.
pub fn multiplier(member_count: u32) -> f64 {
    let members = f64::from(member_count);
    let frequency = (members / (NOMINAL_GUILD_SIZE / PHASE)).sin() + 0.2;
    let share = members / NOMINAL_GUILD_SIZE;
    share + (1.0 - share) * frequency
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply a multiplier to a raw score. Absent scores stay absent.
pub fn weigh(raw: Option<f64>, multiplier: f64) -> Option<f64> {
    raw.map(|value| round2(value * multiplier))
}
