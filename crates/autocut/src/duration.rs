//! Parsing and rendering of human-readable durations (`"1h30m"`, `"2.5s"`).
//!
//! Input is a sequence of `<decimal><unit>` groups with units `ns`,
//! `us`/`µs`/`μs`, `ms`, `s`, `m` and `h`, or a bare `0`. Output uses hours,
//! minutes and seconds (`"1h0m0s"`) for anything of one second or more and the
//! largest sub-second unit that keeps the integer part non-zero otherwise.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// A duration string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration {input:?}: {reason}")]
pub struct ParseDurationError {
    /// The rejected input, verbatim.
    pub input: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

pub(crate) fn parse(input: &str) -> Result<Duration, ParseDurationError> {
    let fail = |reason| ParseDurationError {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(fail("negative durations are not allowed"));
    }
    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(fail("duration is empty"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let int_part = &rest[..int_end];
        rest = &rest[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(fail("expected a number"));
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3_600 * NANOS_PER_SECOND,
            "" => return Err(fail("missing unit")),
            _ => return Err(fail("unknown unit")),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| fail("value out of range"))?
        };
        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| fail("value out of range"))?;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond precision of the largest unit are dropped.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| fail("value out of range"))?;
            value += frac * scale / 10u128.pow(digits.len() as u32);
        }

        total = total
            .checked_add(value)
            .ok_or_else(|| fail("value out of range"))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| fail("value out of range"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SECOND) as u32))
}

pub(crate) fn format(negative: bool, duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    let sign = if negative { "-" } else { "" };

    if nanos < NANOS_PER_SECOND {
        let (unit, scale) = if nanos < 1_000 {
            ("ns", 1)
        } else if nanos < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{sign}{}{unit}", fixed_point(nanos, scale));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = fixed_point(
        u128::from(total_secs % 60) * NANOS_PER_SECOND + u128::from(duration.subsec_nanos()),
        NANOS_PER_SECOND,
    );

    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

/// Renders `value / scale` with trailing fractional zeros trimmed.
///
/// `scale` must be a power of ten.
fn fixed_point(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
