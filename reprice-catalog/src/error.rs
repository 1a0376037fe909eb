/// Errors raised by the pricing engine.
///
/// Business-data gaps (no factory price, unknown size tier, no content) are
/// not errors; they surface as warnings on the breakdown.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed input for {field}: {value}")]
    MalformedInput { field: &'static str, value: f64 },
}
