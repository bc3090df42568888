// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use time::OffsetDateTime;

const BYTE_LIMIT: u64 = 512;
const KIB_LIMIT: u64 = 524_288;
const MIB_LIMIT: u64 = 536_870_912;
const KIB: f64 = 1024.0;

const MILLIS_LIMIT: f64 = 0.8;
const SECONDS_LIMIT: f64 = 60.0;
const MINUTES_LIMIT: f64 = 3600.0;

/// Renders a byte count in B, KiB, MiB or GiB.
///
/// Each unit takes over once the value reaches 512 of the previous unit, so a
/// rendered KiB/MiB/GiB value is always in `[0.5, 512)`.
pub fn format_size(bytes: u64) -> String {
    if bytes < BYTE_LIMIT {
        return format!("{bytes} B");
    }
    let value = bytes as f64;
    if bytes < KIB_LIMIT {
        return format!("{:.2} KiB", value / KIB);
    }
    if bytes < MIB_LIMIT {
        return format!("{:.2} MiB", value / KIB / KIB);
    }
    format!("{:.2} GiB", value / KIB / KIB / KIB)
}

/// Renders a duration given in seconds. Negative and NaN inputs render as zero.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < MILLIS_LIMIT {
        return format!("{}ms", (seconds * 1000.0).round() as u64);
    }
    if seconds < SECONDS_LIMIT {
        return format!("{seconds:.1}s");
    }
    if seconds < MINUTES_LIMIT {
        return format!("{:.1}m", seconds / 60.0);
    }
    format!("{:.1}h", seconds / 3600.0)
}

/// Numeric values are Unix seconds rendered as UTC; strings pass through.
pub fn format_timestamp(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number
            .as_f64()
            .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds.floor() as i64).ok())
            .and_then(|stamp| {
                stamp
                    .format(time::macros::format_description!(
                        "[year]-[month]-[day] [hour]:[minute]:[second]"
                    ))
                    .ok()
            })
            .unwrap_or_else(|| number.to_string()),
        other => other.to_string(),
    }
}

/// Byte counts may arrive as integers or floats; anything negative clamps to zero.
pub fn size_from_value(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|raw| raw.max(0.0).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::{format_duration, format_size, format_timestamp, size_from_value};
    use serde_json::json;

    #[test]
    fn size_picks_unit_by_512_thresholds() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(511), "511 B");
        assert_eq!(format_size(512), "0.50 KiB");
        assert_eq!(format_size(2048), "2.00 KiB");
        assert_eq!(format_size(524_287), "512.00 KiB");
        assert_eq!(format_size(524_288), "0.50 MiB");
        assert_eq!(format_size(536_870_911), "512.00 MiB");
        assert_eq!(format_size(536_870_912), "0.50 GiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }

    #[test]
    fn size_is_monotonic_within_a_unit_band() {
        let mut previous = 0.0;
        for bytes in (512..524_288).step_by(4099) {
            let rendered = format_size(bytes);
            let numeric: f64 = rendered
                .trim_end_matches(" KiB")
                .parse()
                .expect("KiB band renders a number");
            assert!(numeric >= previous, "{rendered} after {previous}");
            previous = numeric;
        }
    }

    #[test]
    fn duration_boundaries_land_in_expected_buckets() {
        assert_eq!(format_duration(0.0), "0ms");
        assert_eq!(format_duration(0.1), "100ms");
        assert_eq!(format_duration(0.79), "790ms");
        assert_eq!(format_duration(0.8), "0.8s");
        assert_eq!(format_duration(1.2), "1.2s");
        assert_eq!(format_duration(59.9), "59.9s");
        assert_eq!(format_duration(60.0), "1.0m");
        // Bands pick on the raw value, so rounding can show the next band's edge.
        assert_eq!(format_duration(59.96), "60.0s");
        assert_eq!(format_duration(3599.0), "60.0m");
        assert_eq!(format_duration(3600.0), "1.0h");
        assert_eq!(format_duration(5400.0), "1.5h");
    }

    #[test]
    fn duration_clamps_negative_and_nan_to_zero() {
        assert_eq!(format_duration(-3.0), "0ms");
        assert_eq!(format_duration(f64::NAN), "0ms");
    }

    #[test]
    fn timestamp_formats_unix_seconds_and_passes_strings() {
        assert_eq!(format_timestamp(&json!(0)), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(&json!(86_400.75)), "1970-01-02 00:00:00");
        assert_eq!(
            format_timestamp(&json!("2019-05-01 10:00:00")),
            "2019-05-01 10:00:00"
        );
        assert_eq!(format_timestamp(&json!(null)), "");
    }

    #[test]
    fn size_from_value_accepts_integers_and_floats() {
        assert_eq!(size_from_value(&json!(2048)), Some(2048));
        assert_eq!(size_from_value(&json!(10.6)), Some(11));
        assert_eq!(size_from_value(&json!(-4)), Some(0));
        assert_eq!(size_from_value(&json!("12")), None);
    }
}
