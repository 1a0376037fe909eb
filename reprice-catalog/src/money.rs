//! Presentation helpers. Internal math keeps full precision; rounding happens
//! only where a value leaves the engine.

/// Round to whole cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render an amount with two decimals, e.g. `23.80`.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Render an amount in euros, e.g. `€23.80`.
pub fn format_eur(value: f64) -> String {
    format!("€{}", format_amount(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_at_boundary() {
        assert_eq!(round2(20.0 * 1.19), 23.8);
        assert_eq!(format_amount(21.0), "21.00");
        assert_eq!(format_eur(0.005), "€0.01");
    }
}
