/// Convert a raw on-chain reputation into the 25-based display score.
///
/// The score grows with the base-10 magnitude of the raw value: 9 points per
/// order of magnitude above 10^9, centred on 25. Negative raw reputation
/// mirrors below 25.
pub fn format_reputation(raw: i64) -> i64 {
    if raw == 0 {
        return 25;
    }
    let negative = raw < 0;
    let digits = raw.unsigned_abs().to_string();
    let leading: f64 = digits[..digits.len().min(4)].parse().unwrap_or(0.0);
    let log = leading.log10();
    let magnitude = (digits.len() - 1) as f64 + (log - log.trunc());

    let mut out = if magnitude.is_finite() { magnitude } else { 0.0 };
    out = (out - 9.0).max(0.0);
    if negative {
        out = -out;
    }
    (out * 9.0 + 25.0).trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_values() {
        assert_eq!(format_reputation(0), 25);
        assert_eq!(format_reputation(95_832_978_796_820), 69);
        assert_eq!(format_reputation(1_000_000_000), 25);
        assert_eq!(format_reputation(10_000_000_000), 34);
    }

    #[test]
    fn negative_reputation_drops_below_25() {
        assert!(format_reputation(-10_000_000_000) < 25);
    }
}
