/// Converts an amount in major units to cents, truncating toward zero.
///
/// The product is truncated, not rounded: `0.29` becomes `28` cents because
/// `0.29 * 100.0` is `28.999999999999996` in binary floating point.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0) as i64
}

/// Number of digits after the decimal point in the shortest representation
/// of `amount` that round-trips.
pub fn decimal_places(amount: f64) -> usize {
    let repr = amount.to_string();
    repr.split_once('.').map_or(0, |(_, fraction)| fraction.len())
}

/// Formats cents as a major-unit amount with two decimals and thousands
/// separators, e.g. `-9983334` becomes `-99,833.34`.
pub fn format_cents(cents: i64) -> String {
    let magnitude = cents.unsigned_abs();
    let major = (magnitude / 100).to_string();
    let minor = magnitude % 100;

    let mut grouped = String::with_capacity(major.len() + major.len() / 3 + 4);
    if cents < 0 {
        grouped.push('-');
    }
    for (idx, digit) in major.chars().enumerate() {
        if idx > 0 && (major.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped}.{minor:02}")
}
