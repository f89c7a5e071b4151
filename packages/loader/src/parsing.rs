//! Cell parsing helpers shared by the record extractors.

/// Strips whitespace and `,` thousands separators.
///
/// Returns `None` when a comma does not separate groups of three digits in
/// the integer part, so a decimal comma (`"7,5"`) is rejected rather than
/// read as `75`.
fn normalize_number(s: &str) -> Option<String> {
    let s = s.trim();
    if !s.contains(',') {
        return Some(s.to_owned());
    }

    let (integer, fraction) = s.split_once('.').unwrap_or((s, ""));
    if fraction.contains(',') {
        return None;
    }
    let digits = integer.strip_prefix(['-', '+']).unwrap_or(integer);
    let mut groups = digits.split(',');
    let leading = groups.next()?;
    let is_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    if leading.is_empty() || leading.len() > 3 || !is_digits(leading) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && is_digits(g)) {
        return None;
    }

    Some(s.chars().filter(|c| *c != ',').collect())
}

/// Parses a finite decimal number such as `"7"`, `"7.5"` or `"1,234.5"`.
#[must_use]
pub fn parse_number(s: &str) -> Option<f64> {
    let value = normalize_number(s)?.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parses a non-negative count. Empty cells count as zero and integral
/// floats (`"12.0"`, as written by spreadsheet exports) are accepted.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn parse_count(s: &str) -> Option<u64> {
    let normalized = normalize_number(s)?;
    if normalized.is_empty() {
        return Some(0);
    }
    if let Ok(value) = normalized.parse::<u64>() {
        return Some(value);
    }
    let value = normalized.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then_some(value as u64)
}

/// Parses a latitude/longitude pair. Returns `None` if either is missing,
/// unparseable, out of range, or zero.
#[must_use]
pub fn parse_lat_lng(lat: &str, lng: &str) -> Option<(f64, f64)> {
    let latitude = parse_number(lat)?;
    let longitude = parse_number(lng)?;
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_with_separators() {
        assert!((parse_number(" 1,234.5 ").unwrap() - 1234.5).abs() < f64::EPSILON);
        assert!((parse_number("7").unwrap() - 7.0).abs() < f64::EPSILON);
        assert!(parse_number("").is_none());
        assert!(parse_number("seven").is_none());
        assert!(parse_number("NaN").is_none());
        assert!(parse_number("inf").is_none());
    }

    #[test]
    fn rejects_commas_outside_thousands_groups() {
        assert!(parse_number("7,5").is_none());
        assert!(parse_number("1,23").is_none());
        assert!(parse_number(",123").is_none());
        assert!(parse_number("1,234.5,6").is_none());
        assert!((parse_number("-12,345,678").unwrap() + 12_345_678.0).abs() < f64::EPSILON);
        assert_eq!(parse_count("1,2,3"), None);
        assert_eq!(parse_count("1234,567"), None);
        assert_eq!(parse_count("1,350"), Some(1350));
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count("1,204"), Some(1204));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count(""), Some(0));
        assert_eq!(parse_count("  "), Some(0));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn parses_lat_lng() {
        let (lat, lng) = parse_lat_lng("35.1802", "128.1076").unwrap();
        assert!((lat - 35.1802).abs() < f64::EPSILON);
        assert!((lng - 128.1076).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_and_out_of_range_lat_lng() {
        assert!(parse_lat_lng("0", "128.1").is_none());
        assert!(parse_lat_lng("135.1", "128.1").is_none());
        assert!(parse_lat_lng("35.1", "228.1").is_none());
        assert!(parse_lat_lng("", "128.1").is_none());
    }
}
