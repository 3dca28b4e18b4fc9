use crate::models::locale::Locale;

const TRILLION: f64 = 1_000_000_000_000.0;
const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;

/// Abbreviate a value for axis ticks and tooltips.
///
/// Tiers:
/// - `>= 10^12`: value / 10^9 with two decimals, billions unit
/// - `>= 10^6`:  value / 10^6 rounded, digit-grouped, millions unit
/// - `>= 10^3`:  value / 10^3 rounded, thousands unit
/// - otherwise:  the raw value
///
/// Lossy: only for display, never for stored or computed values.
#[must_use]
pub fn format_magnitude(value: f64, locale: Locale) -> String {
    if value >= TRILLION {
        let scaled = round_to(value / BILLION, 2);
        format!("{scaled:.2} {}", locale.billions_unit())
    } else if value >= MILLION {
        let scaled = (value / MILLION).round();
        format!("{} {}", group_digits(scaled, locale), locale.millions_unit())
    } else if value >= THOUSAND {
        let scaled = (value / THOUSAND).round();
        format!("{scaled} {}", locale.thousands_unit())
    } else {
        format!("{value}")
    }
}

/// Render a whole number with the locale's thousands separator.
///
/// Grouping only applies once the integer part reaches the locale's
/// minimum grouping width.
#[must_use]
pub fn group_digits(value: f64, locale: Locale) -> String {
    let rendered = format!("{:.0}", value.round());
    let (sign, digits) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };

    if digits.len() < locale.min_grouping_digits() {
        return rendered;
    }

    let separator = locale.group_separator();
    let mut out = String::with_capacity(rendered.len() + digits.len() / 3 * separator.len());
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

// Half away from zero, matching how displayed decimals are expected to round.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
