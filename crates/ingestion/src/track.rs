//! Track metadata helpers.

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.34;

/// Parse a track length such as `"2.236 km"` or `"1.5 mi"` into meters
///
/// The first number followed by a `km`/`mi` unit (case-insensitive,
/// optional whitespace) wins. Anything unparseable yields `0.0`.
pub fn parse_track_length(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut start = 0;

    while start < bytes.len() {
        if !is_number_byte(bytes[start]) {
            start += 1;
            continue;
        }

        let mut end = start;
        while end < bytes.len() && is_number_byte(bytes[end]) {
            end += 1;
        }
        let number = &text[start..end];

        let rest = text[end..].trim_start();
        if let Some(factor) = unit_factor(rest) {
            return number
                .parse::<f64>()
                .map(|value| value * factor)
                .unwrap_or(0.0);
        }
        start = end;
    }
    0.0
}

fn is_number_byte(b: u8) -> bool {
    b.is_ascii_digit() || b == b'.'
}

fn unit_factor(rest: &str) -> Option<f64> {
    let unit = rest.get(..2)?.to_ascii_lowercase();
    match unit.as_str() {
        "km" => Some(METERS_PER_KILOMETER),
        "mi" => Some(METERS_PER_MILE),
        _ => None,
    }
}
