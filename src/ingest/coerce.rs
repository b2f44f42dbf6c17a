/// Parse an integer field; anything that is not a plain integer becomes `0`.
#[inline]
#[must_use]
pub fn coerce_int(field: &str) -> i64 {
    field.parse::<i64>().unwrap_or(0)
}

/// Parse a floating-point field; anything unparsable becomes `0.0`.
#[inline]
#[must_use]
pub fn coerce_float(field: &str) -> f64 {
    field.parse::<f64>().unwrap_or(0.0)
}
