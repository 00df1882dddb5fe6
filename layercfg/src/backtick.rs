//! Back-tick literal conversion: the three rules in order — ISO date-time,
//! `$NAME[|default]` environment lookup, `${path}` interpolation — with a
//! plain-string fallback. The converter is pluggable per `Config`; this
//! module provides the default implementation.
//!
//! Parsing here is hand-rolled rather than built on a pattern crate,
//! matching how the rest of this crate reads text: character-at-a-time,
//! the same way the tokenizer and datetime-offset splitting below do it.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

use layercfg_util::{ConfigError, Result};

use crate::config::Config;
use crate::value::{CfgDateTime, ConfigValue};

/// A pluggable back-tick literal converter. `convert` receives the literal's
/// raw content (without the surrounding back-ticks) and the `Config` it was
/// read from, so interpolation can resolve `${path}` against it.
pub trait StringConverter {
    fn convert(&self, raw: &str, config: &mut Config) -> Result<ConfigValue>;
}

/// The default converter: ISO date-time, then environment lookup, then
/// `${...}` interpolation, then the raw string.
pub struct DefaultStringConverter;

impl StringConverter for DefaultStringConverter {
    fn convert(&self, raw: &str, config: &mut Config) -> Result<ConfigValue> {
        if let Some(dt) = parse_iso_datetime(raw) {
            return Ok(ConfigValue::DateTime(dt));
        }

        match env_reference(raw) {
            EnvLookup::Value(v) => return Ok(ConfigValue::String(v)),
            EnvLookup::NoneValue => return Ok(ConfigValue::None),
            EnvLookup::NotApplicable => {}
        }

        let strict = config.strict_conversions();
        if let Some(interpolated) = interpolate(raw, config, strict)? {
            return Ok(ConfigValue::String(interpolated));
        }

        if strict {
            return Err(ConfigError::UnableToConvertString { text: raw.to_string() }.into());
        }
        Ok(ConfigValue::String(raw.to_string()))
    }
}

enum EnvLookup {
    NotApplicable,
    Value(String),
    NoneValue,
}

fn env_reference(raw: &str) -> EnvLookup {
    let Some(rest) = raw.strip_prefix('$') else {
        return EnvLookup::NotApplicable;
    };
    // `${path}` is the interpolation form, not a bare environment lookup.
    if rest.is_empty() || rest.starts_with('{') {
        return EnvLookup::NotApplicable;
    }
    let (name, default) = match rest.split_once('|') {
        Some((n, d)) => (n, Some(d)),
        None => (rest, None),
    };
    if name.is_empty() || !is_env_name(name) {
        return EnvLookup::NotApplicable;
    }
    match std::env::var(name) {
        Ok(value) => EnvLookup::Value(value),
        Err(_) => match default {
            Some(d) => EnvLookup::Value(d.to_string()),
            None => EnvLookup::NoneValue,
        },
    }
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn interpolate(raw: &str, config: &mut Config, strict: bool) -> Result<Option<String>> {
    if !raw.contains("${") {
        return Ok(None);
    }
    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    loop {
        match rest.find("${") {
            None => {
                output.push_str(rest);
                break;
            }
            Some(start) => {
                output.push_str(&rest[..start]);
                let after = &rest[start + 2..];
                let Some(end) = after.find('}') else {
                    return if strict {
                        Err(ConfigError::UnableToConvertString { text: raw.to_string() }.into())
                    } else {
                        Ok(None)
                    };
                };
                let path_text = &after[..end];
                match config.resolve_interpolation_path(path_text) {
                    Ok(value) => output.push_str(&value),
                    Err(_) => {
                        return if strict {
                            Err(ConfigError::UnableToConvertString { text: raw.to_string() }.into())
                        } else {
                            Ok(None)
                        };
                    }
                }
                rest = &after[end + 1..];
            }
        }
    }
    Ok(Some(output))
}

/// Matches `YYYY-MM-DD`, optionally followed by `[ T]HH:MM:SS[.ffffff]`
/// and an optional zone `(Z | ±HH:MM[:SS[.ffffff]])`.
fn parse_iso_datetime(raw: &str) -> Option<CfgDateTime> {
    let bytes = raw.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    if !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    if !bytes[5..7].iter().all(u8::is_ascii_digit) || !bytes[8..10].iter().all(u8::is_ascii_digit) {
        return None;
    }

    let year: i32 = raw[0..4].parse().ok()?;
    let month: u32 = raw[5..7].parse().ok()?;
    let day: u32 = raw[8..10].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    if raw.len() == 10 {
        return Some(CfgDateTime::Naive(date.and_hms_opt(0, 0, 0)?));
    }

    let rest = &raw[10..];
    let rest = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' '))?;

    let (time_part, offset_part) = split_offset(rest);
    let (hour, minute, second, nanos) = parse_time_of_day(time_part)?;
    let naive: NaiveDateTime = date.and_hms_nano_opt(hour, minute, second, nanos)?;

    match offset_part {
        None => Some(CfgDateTime::Naive(naive)),
        Some(offset_text) => {
            let offset_seconds = parse_offset_seconds(offset_text)?;
            let offset = FixedOffset::east_opt(offset_seconds)?;
            Some(CfgDateTime::Zoned(offset.from_local_datetime(&naive).single()?))
        }
    }
}

fn split_offset(s: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = s.strip_suffix('Z') {
        return (stripped, Some("Z"));
    }
    if let Some(pos) = s.find(['+', '-']) {
        if pos > 0 {
            return (&s[..pos], Some(&s[pos..]));
        }
    }
    (s, None)
}

fn parse_offset_seconds(offset: &str) -> Option<i32> {
    if offset == "Z" {
        return Some(0);
    }
    let sign = match offset.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let mut parts = offset[1..].split(':');
    let hours: i32 = parts.next()?.parse().ok()?;
    let minutes: i32 = parts.next().unwrap_or("0").parse().ok()?;
    let seconds: i32 = parts
        .next()
        .unwrap_or("0")
        .split('.')
        .next()
        .unwrap_or("0")
        .parse()
        .ok()?;
    Some(sign * (hours * 3600 + minutes * 60 + seconds))
}

fn parse_time_of_day(s: &str) -> Option<(u32, u32, u32, u32)> {
    let mut top = s.splitn(2, '.');
    let hms = top.next()?;
    let frac = top.next();

    let mut parts = hms.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let second: u32 = parts.next().unwrap_or("0").parse().ok()?;

    let nanos = match frac {
        None => 0,
        Some(f) => {
            let mut digits: String = f.chars().filter(char::is_ascii_digit).take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            digits.parse().ok()?
        }
    };
    Some((hour, minute, second, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_only() {
        let dt = parse_iso_datetime("2024-03-05").unwrap();
        match dt {
            CfgDateTime::Naive(naive) => {
                assert_eq!(naive.date().to_string(), "2024-03-05");
            }
            CfgDateTime::Zoned(_) => panic!("expected naive date-time"),
        }
    }

    #[test]
    fn parses_zoned_datetime_with_fraction() {
        let dt = parse_iso_datetime("2024-03-05T10:15:30.250+02:00").unwrap();
        match dt {
            CfgDateTime::Zoned(zoned) => {
                assert_eq!(zoned.offset().local_minus_utc(), 7200);
                assert_eq!(zoned.naive_local().and_utc().timestamp_subsec_millis(), 250);
            }
            CfgDateTime::Naive(_) => panic!("expected zoned date-time"),
        }
    }

    #[test]
    fn rejects_non_date_content() {
        assert!(parse_iso_datetime("not-a-date").is_none());
        assert!(parse_iso_datetime("hello world").is_none());
    }

    #[test]
    fn env_reference_uses_default_when_unset() {
        match env_reference("$LAYERCFG_TEST_UNSET_VAR|fallback") {
            EnvLookup::Value(v) => assert_eq!(v, "fallback"),
            _ => panic!("expected a default value"),
        }
    }

    #[test]
    fn bare_dollar_brace_is_not_an_env_reference() {
        assert!(matches!(env_reference("${a.b}"), EnvLookup::NotApplicable));
    }
}
