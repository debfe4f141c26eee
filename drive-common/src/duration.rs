//! Duration strings as written in pipeline configuration: `2d3h9s`, `15m`, `6000s`.

use serde::{Deserialize, Deserializer};

use crate::error::Error;

const UNITS: [(char, i64); 4] = [('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)];

/// Parses a duration string into whole seconds.
///
/// Each of the units `d`, `h`, `m`, `s` may appear at most once, in any order.
/// Whitespace is ignored. A string without any recognised unit is rejected.
pub fn parse_duration_secs(input: &str) -> Result<i64, Error> {
    let mut total: i64 = 0;
    let mut seen = [false; UNITS.len()];
    let mut digits = String::new();

    for ch in input.chars().filter(|c| !c.is_whitespace()) {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let Some(idx) = UNITS.iter().position(|(unit, _)| *unit == ch) else {
            return Err(Error::InvalidInput(format!(
                "Unsupported unit '{ch}' in duration '{input}'"
            )));
        };

        if digits.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Unit '{ch}' without a value in duration '{input}'"
            )));
        }

        if seen[idx] {
            return Err(Error::InvalidInput(format!(
                "Unit '{ch}' repeated in duration '{input}'"
            )));
        }
        seen[idx] = true;

        let value: i64 = digits
            .parse()
            .map_err(|e| Error::InvalidInput(format!("Bad number in '{input}': {e}")))?;
        digits.clear();

        total = value
            .checked_mul(UNITS[idx].1)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| Error::InvalidInput(format!("Duration '{input}' overflows")))?;
    }

    if !digits.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Trailing number without unit in duration '{input}'"
        )));
    }

    if !seen.iter().any(|s| *s) {
        return Err(Error::InvalidInput(format!(
            "No valid time units (d/h/m/s) found in duration '{input}'"
        )));
    }

    Ok(total)
}

/// Accepts either whole seconds (`900`) or a duration string (`"15m"`).
pub fn de_opt_secs<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Secs(secs)) if secs < 0 => Err(serde::de::Error::custom(format!(
            "duration must not be negative, got {secs}"
        ))),
        Some(Raw::Secs(secs)) => Ok(Some(secs)),
        Some(Raw::Text(text)) => parse_duration_secs(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_units() {
        assert_eq!(parse_duration_secs("2d3h9s").unwrap(), 2 * 86_400 + 3 * 3_600 + 9);
        assert_eq!(parse_duration_secs("1h 30m").unwrap(), 5_400);
    }

    #[test]
    fn test_single_unit() {
        assert_eq!(parse_duration_secs("6000s").unwrap(), 6000);
        assert_eq!(parse_duration_secs("15m").unwrap(), 900);
        assert_eq!(parse_duration_secs("0s").unwrap(), 0);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_duration_secs("").is_err());
        assert!(parse_duration_secs("10").is_err());
        assert!(parse_duration_secs("3w").is_err());
        assert!(parse_duration_secs("h").is_err());
        assert!(parse_duration_secs("1h2h").is_err());
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "de_opt_secs")]
        expected: Option<i64>,
    }

    #[test]
    fn test_deserialize_secs_or_string() {
        let h: Holder = serde_json::from_str(r#"{"expected": 90}"#).unwrap();
        assert_eq!(h.expected, Some(90));

        let h: Holder = serde_json::from_str(r#"{"expected": "1m30s"}"#).unwrap();
        assert_eq!(h.expected, Some(90));

        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(h.expected, None);

        assert!(serde_json::from_str::<Holder>(r#"{"expected": "soon"}"#).is_err());
    }
}
