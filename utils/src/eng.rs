//! Engineering notation, i.e. numbers like `4.7k` or `100n` where the exponent is always a multiple
//! of 3 and is written as an SI prefix.

use std::fmt::{Display, Formatter};

/// SI prefixes understood by [`eng_format`], as `(exponent, symbol)`.
const PREFIXES: [(i32, &str); 7] = [
    (6, "M"),
    (3, "k"),
    (0, ""),
    (-3, "m"),
    (-6, "u"),
    (-9, "n"),
    (-12, "p"),
];

/// Prefixes accepted by [`parse_eng`], as `(symbol, exponent)`.  This is a superset of
/// [`PREFIXES`], also accepting the common alternative spellings used on schematics.
const PARSE_PREFIXES: [(char, i32); 11] = [
    ('G', 9),
    ('M', 6),
    ('k', 3),
    ('K', 3),
    ('R', 0),
    ('r', 0),
    ('m', -3),
    ('u', -6),
    ('µ', -6),
    ('n', -9),
    ('p', -12),
];

/// Number of decimal places kept in the mantissa before trailing zeros are removed
const MANTISSA_DECIMALS: usize = 4;

/// Format `value` in engineering notation, e.g. `4700.0` becomes `"4.7k"`.  Exponents with no
/// SI prefix in the table fall back to `"<mantissa>*10^<exp>"`.
pub fn eng_format(value: f64) -> String {
    match split_exponent(value, 3) {
        Some((mantissa, exp)) => match PREFIXES.iter().find(|(e, _)| *e == exp) {
            Some((_, symbol)) => format!("{}{}", fmt_mantissa(mantissa), symbol),
            None => format!("{}*10^{}", fmt_mantissa(mantissa), exp),
        },
        None => fmt_special(value),
    }
}

/// Parse a number written in engineering notation.  Accepts plain numbers (`"100"`, `"1e-6"`), SI
/// suffixes (`"4.7k"`, `"10u"`) and RKM codes where the prefix replaces the decimal point
/// (`"4k7"`, `"2R2"`, `"R47"`).  The result is the `f64` nearest to the decimal value, so `"10u"`
/// gives exactly `1e-5`.
pub fn parse_eng(s: &str) -> Result<f64, ParseEngError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseEngError::Empty);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Ok(v);
    }

    let (prefix_idx, prefix_char, exponent) = trimmed
        .char_indices()
        .find_map(|(i, c)| {
            PARSE_PREFIXES
                .iter()
                .find(|(p, _)| *p == c)
                .map(|(_, e)| (i, c, *e))
        })
        .ok_or_else(|| ParseEngError::Invalid(trimmed.to_owned()))?;
    let whole = &trimmed[..prefix_idx];
    let fraction = &trimmed[prefix_idx + prefix_char.len_utf8()..];

    let is_rkm_fraction = !whole.contains('.') && fraction.chars().all(|c| c.is_ascii_digit());
    let number_str = match (whole.is_empty(), fraction.is_empty()) {
        (true, true) => return Err(ParseEngError::Invalid(trimmed.to_owned())),
        (false, true) => whole.to_owned(),
        // RKM code: the prefix acts as the decimal point, so the whole part can't have its own
        (true, false) if is_rkm_fraction => format!("0.{}", fraction),
        (false, false) if is_rkm_fraction => format!("{}.{}", whole, fraction),
        _ => return Err(ParseEngError::Invalid(trimmed.to_owned())),
    };
    format!("{}e{}", number_str, exponent)
        .parse::<f64>()
        .map_err(|_| ParseEngError::Invalid(trimmed.to_owned()))
}

/// The ways that [`parse_eng`] can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEngError {
    Empty,
    Invalid(String),
}

impl Display for ParseEngError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseEngError::Empty => write!(f, "Expected a number, found an empty string"),
            ParseEngError::Invalid(s) => write!(
                f,
                "Can't parse {:?} as a number (expected something like `4.7k`, `4k7` or `1e-6`)",
                s
            ),
        }
    }
}

impl std::error::Error for ParseEngError {}

/// Split a finite, non-zero `value` into `(mantissa, exponent)` where `|mantissa|` is in
/// `[1, 10^step)` and `exponent` is a multiple of `step`.  Returns `None` for zero and non-finite
/// values.
fn split_exponent(value: f64, step: i32) -> Option<(f64, i32)> {
    if value == 0.0 || !value.is_finite() {
        return None;
    }
    // The nudge stops values like 0.9999999999999999 (which are really 1) from rounding down into
    // the next prefix
    let decimal_exp = (value.abs().log10() + 1e-9).floor() as i32;
    let exp = decimal_exp.div_euclid(step) * step;
    Some((value / 10f64.powi(exp), exp))
}

fn fmt_mantissa(mantissa: f64) -> String {
    let s = format!("{:.*}", MANTISSA_DECIMALS, mantissa);
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

fn fmt_special(value: f64) -> String {
    if value == 0.0 {
        "0".to_owned()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eng_format_prefixes() {
        #[track_caller]
        fn check(v: f64, exp: &str) {
            assert_eq!(eng_format(v), exp);
        }

        check(4700.0, "4.7k");
        check(1000.0, "1k");
        check(1.0, "1");
        check(220.0, "220");
        check(2.2e6, "2.2M");
        check(0.0047, "4.7m");
        check(1e-6, "1u");
        check(100e-9, "100n");
        check(22e-12, "22p");
        check(-4700.0, "-4.7k");
        check(0.0, "0");
        check(3.3e9, "3.3*10^9");
        check(1e-15, "1*10^-15");
        check(0.9999999999999999, "1");
    }

    #[test]
    fn parse_ok() {
        #[track_caller]
        fn check(s: &str, exp: f64) {
            let v = parse_eng(s).unwrap();
            assert!(
                (v - exp).abs() <= exp.abs() * 1e-12,
                "parsing {:?} gave {}, expected {}",
                s,
                v,
                exp
            );
        }

        check("100", 100.0);
        check("1e-6", 1e-6);
        check("4.7k", 4700.0);
        check("4k7", 4700.0);
        check("4K7", 4700.0);
        check("2R2", 2.2);
        check("10u", 10e-6);
        check("10µ", 10e-6);
        check("2.2M", 2.2e6);
        check("1m", 1e-3);
        check("33n", 33e-9);
        check(" 15p ", 15e-12);
        check("R47", 0.47);
        check("n47", 0.47e-9);
    }

    #[test]
    fn parse_nearest_f64() {
        #[track_caller]
        fn check(s: &str, exp: f64) {
            assert_eq!(parse_eng(s), Ok(exp));
        }

        check("10u", 1e-5);
        check("4k7", 4700.0);
        check("2u2", 2.2e-6);
        check("4.7n", 4.7e-9);
        check("R47", 0.47);
        check("10.7M", 10.7e6);
    }

    #[test]
    fn parse_err() {
        assert_eq!(parse_eng(""), Err(ParseEngError::Empty));
        assert_eq!(parse_eng("   "), Err(ParseEngError::Empty));
        assert!(parse_eng("k").is_err());
        assert!(parse_eng("k.5").is_err());
        assert!(parse_eng("1e3k").is_err());
        assert!(parse_eng("4.7k3").is_err());
        assert!(parse_eng("4kx").is_err());
        assert!(parse_eng("abc").is_err());
    }
}
