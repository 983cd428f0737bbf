pub mod dry_run;
pub mod steem;

pub use dry_run::LogDispatcher;
pub use steem::SteemDispatcher;

/// Upper bound of a vote weight in basis points.
pub const MAX_VOTE_WEIGHT: i64 = 10_000;

/// Basis points for a final vote expressed as a percentage, capped at 100%.
pub fn vote_weight(final_vote: f64) -> i64 {
    let weight = (final_vote * 100.0).round();
    if !weight.is_finite() || weight <= 0.0 {
        return 0;
    }
    (weight as i64).min(MAX_VOTE_WEIGHT)
}
