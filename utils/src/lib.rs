//! 'Kitchen sink' helpers shared between the ECPF crates.  Mostly to do with turning numbers into
//! strings (and back again).

use std::fmt::{Display, Formatter};

use number_prefix::NumberPrefix;

pub mod eng;

pub use eng::{eng_format, parse_eng, ParseEngError};

/// Wrapper over [`usize`] which displays big counts using Kilo, Mega, Giga, etc.  Small numbers are
/// displayed exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigNumInt(pub usize);

impl Display for BigNumInt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match NumberPrefix::decimal(self.0 as f64) {
            NumberPrefix::Standalone(n) => write!(f, "{:.0}", n),
            NumberPrefix::Prefixed(prefix, n) => write!(f, "{:.1}{}", n, prefix),
        }
    }
}

/// Wrapper over [`f64`] which displays a value in engineering notation (see [`eng_format`]).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Eng(pub f64);

impl Display for Eng {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&eng_format(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::{BigNumInt, Eng};

    #[test]
    fn big_num_int() {
        #[track_caller]
        fn check(n: usize, exp: &str) {
            assert_eq!(BigNumInt(n).to_string(), exp);
        }

        check(0, "0");
        check(999, "999");
        check(1_000, "1.0k");
        check(24_000, "24.0k");
        check(3_500_000, "3.5M");
    }

    #[test]
    fn eng_padding() {
        assert_eq!(format!("{:>6}", Eng(4700.0)), "  4.7k");
        assert_eq!(format!("{:<5}|", Eng(0.01)), "10m  |");
    }
}
