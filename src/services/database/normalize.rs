//! Value normalization for query results.
//!
//! Cells returned by `query`/`query_with_params` pass through [`normalize`]
//! before they reach callers:
//!
//! 1. NULL stays NULL.
//! 2. Byte strings are decoded as UTF-8 text.
//! 3. Native date-times lose their fractional seconds.
//! 4. Text shaped like a date-time is rewritten to `YYYY-MM-DD HH:MM:SS`
//!    (timezone suffix, fraction and ISO `T`/`Z` markers dropped).
//! 5. Everything else passes through.
//!
//! Every rule is idempotent.

use chrono::Timelike;

use super::traits::{Cell, Row, Value};

/// Normalize a single value.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bytes(bytes) => {
            let text = match String::from_utf8(bytes) {
                Ok(s) => s,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            };
            normalize(Value::Text(text))
        }
        Value::DateTime(dt) => Value::DateTime(dt.with_nanosecond(0).unwrap_or(dt)),
        Value::Time(t) => Value::Time(t.with_nanosecond(0).unwrap_or(t)),
        Value::Text(s) => match canonicalize_datetime(&s) {
            Some(canonical) => Value::Text(canonical),
            None => Value::Text(s),
        },
        other => other,
    }
}

/// Normalize every cell of a row.
pub fn normalize_row(row: Row) -> Row {
    Row::new(
        row.into_iter()
            .map(|cell| Cell::new(cell.column, normalize(cell.value)))
            .collect(),
    )
}

/// Apply the date-time rule to an already stringified cell.
pub fn normalize_text(text: &str) -> String {
    canonicalize_datetime(text).unwrap_or_else(|| text.to_string())
}

/// Rewrite a date-time-shaped string to `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts a `YYYY-MM-DD` date, a space or `T` separator, `HH:MM[:SS]`, and
/// then only an optional fraction followed by timezone tokens (`Z`, `+08`,
/// `+0800`, `+08:00`, ` MST`). Returns `None` for anything else, including
/// date-only strings, so unrelated text containing `-` and `:` is untouched.
pub fn canonicalize_datetime(text: &str) -> Option<String> {
    let s = text.trim();
    let b = s.as_bytes();
    if b.len() < 16 {
        return None;
    }

    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);
    let date_ok = digits(0..4) && b[4] == b'-' && digits(5..7) && b[7] == b'-' && digits(8..10);
    let sep_ok = b[10] == b' ' || b[10] == b'T';
    let hm_ok = digits(11..13) && b[13] == b':' && digits(14..16);
    if !(date_ok && sep_ok && hm_ok) {
        return None;
    }

    let (seconds, pos) = if b.len() >= 19 && b[16] == b':' && digits(17..19) {
        (&s[17..19], 19)
    } else {
        ("00", 16)
    };

    if !is_datetime_suffix(&s[pos..]) {
        return None;
    }

    Some(format!("{} {}:{}", &s[..10], &s[11..16], seconds))
}

/// Zone abbreviations accepted without a numeric offset before them.
const ZONE_NAMES: &[&str] = &[
    "UTC", "GMT", "UT", "CST", "EST", "MST", "PST", "CDT", "EDT", "MDT", "PDT", "CET", "CEST",
    "EET", "WET", "BST", "JST", "KST", "HKT", "SGT", "AEST", "IST",
];

/// Fraction and timezone tokens that may trail a date-time.
///
/// A letter token is a zone name only after a numeric offset (Go's
/// `-0700 MST`) or when it is a known abbreviation, so `PM` is rejected.
fn is_datetime_suffix(rest: &str) -> bool {
    let mut rest = rest;
    let mut after_offset = false;

    if let Some(frac) = rest.strip_prefix('.') {
        let n = frac.bytes().take_while(u8::is_ascii_digit).count();
        if n == 0 {
            return false;
        }
        rest = &frac[n..];
    }

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return true;
        }
        let b = rest.as_bytes();
        let consumed = match b[0] {
            b'Z' if b.len() == 1 || !b[1].is_ascii_alphabetic() => {
                after_offset = true;
                1
            }
            b'+' | b'-' => match offset_len(&b[1..]) {
                Some(n) => {
                    after_offset = true;
                    n + 1
                }
                None => 0,
            },
            c if c.is_ascii_uppercase() => {
                let n = b.iter().take_while(|c| c.is_ascii_uppercase()).count();
                let zone_ok = n <= 5 && (after_offset || ZONE_NAMES.contains(&&rest[..n]));
                if zone_ok { n } else { 0 }
            }
            _ => 0,
        };
        if consumed == 0 {
            return false;
        }
        rest = &rest[consumed..];
    }
}

/// Length of `HH`, `HHMM` or `HH:MM` at the start of `b`.
fn offset_len(b: &[u8]) -> Option<usize> {
    let d = |i: usize| b.get(i).is_some_and(u8::is_ascii_digit);
    if !(d(0) && d(1)) {
        return None;
    }
    if d(2) && d(3) {
        Some(4)
    } else if b.get(2) == Some(&b':') && d(3) && d(4) {
        Some(5)
    } else {
        Some(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_canonicalize_common_encodings() {
        let cases = [
            ("2024-01-02 03:04:05", "2024-01-02 03:04:05"),
            ("2024-01-02 03:04:05.678+00", "2024-01-02 03:04:05"),
            ("2024-01-02T03:04:05Z", "2024-01-02 03:04:05"),
            ("2024-01-02T03:04:05.123456Z", "2024-01-02 03:04:05"),
            ("2024-01-02T03:04:05+08:00", "2024-01-02 03:04:05"),
            ("2025-04-28 15:00:13.727014 +0800 +0800", "2025-04-28 15:00:13"),
            ("2025-04-28 15:00:13 +0800 CST", "2025-04-28 15:00:13"),
            ("2006-01-02 15:04:05.999999999 -0700 MST", "2006-01-02 15:04:05"),
            ("2024-01-02 03:04:05 UTC", "2024-01-02 03:04:05"),
            ("2024-01-02 03:04:05 +0900 KST", "2024-01-02 03:04:05"),
            ("2024-01-02 03:04", "2024-01-02 03:04:00"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                canonicalize_datetime(input).as_deref(),
                Some(expected),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_canonicalize_rejects_non_datetimes() {
        for input in [
            "2024-01-02",
            "IPv6::1",
            "fe80::1-2",
            "2024-01-02 03:04:05 meeting notes",
            "12:30 - lunch",
            "2024-01-02 03:04:05 PM",
            "2024-01-02 03:04 AM",
            "2024-01-02 03:04:05 TODO",
            "",
        ] {
            assert_eq!(canonicalize_datetime(input), None, "input: {input}");
        }
    }

    #[test]
    fn test_normalize_rules() {
        assert_eq!(normalize(Value::Null), Value::Null);
        assert_eq!(normalize(Value::Bytes(b"hello".to_vec())), text("hello"));
        assert_eq!(
            normalize(Value::Bytes(b"2024-01-02T03:04:05Z".to_vec())),
            text("2024-01-02 03:04:05")
        );
        assert_eq!(normalize(Value::Int64(7)), Value::Int64(7));
        assert_eq!(normalize(text("plain")), text("plain"));

        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 678)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(normalize(Value::DateTime(dt)), Value::DateTime(expected));
    }

    #[test]
    fn test_normalize_idempotent() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .unwrap();
        let values = vec![
            Value::Null,
            Value::Bytes(vec![0xff, 0x41]),
            Value::DateTime(dt),
            text("2024-01-02 03:04:05.678+00"),
            text("2024-01-02T03:04:05Z"),
            text("IPv6::1"),
            text("2024-01-02"),
            Value::Float64(1.5),
        ];
        for v in values {
            let once = normalize(v.clone());
            let twice = normalize(once.clone());
            assert_eq!(once, twice, "value: {v:?}");
        }
    }

    #[test]
    fn test_normalize_row_keeps_order() {
        let row = Row::from_pairs(vec![
            ("b", text("2024-01-02T03:04:05Z")),
            ("a", Value::Bytes(b"x".to_vec())),
        ]);
        let row = normalize_row(row);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(row.get("b"), Some(&text("2024-01-02 03:04:05")));
        assert_eq!(row.get("a"), Some(&text("x")));
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("2024-01-02 03:04:05.1"), "2024-01-02 03:04:05");
        assert_eq!(normalize_text("abc"), "abc");
    }
}
