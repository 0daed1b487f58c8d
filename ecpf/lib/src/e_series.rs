//! The IEC 60063 'E series' of preferred component values.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::Magnitudes;

const E3: [f64; 3] = [1.0, 2.2, 4.7];
const E6: [f64; 6] = [1.0, 1.5, 2.2, 3.3, 4.7, 6.8];
const E12: [f64; 12] = [1.0, 1.2, 1.5, 1.8, 2.2, 2.7, 3.3, 3.9, 4.7, 5.6, 6.8, 8.2];
#[rustfmt::skip]
const E24: [f64; 24] = [
    1.0, 1.1, 1.2, 1.3, 1.5, 1.6, 1.8, 2.0, 2.2, 2.4, 2.7, 3.0,
    3.3, 3.6, 3.9, 4.3, 4.7, 5.1, 5.6, 6.2, 6.8, 7.5, 8.2, 9.1,
];
#[rustfmt::skip]
const E48: [f64; 48] = [
    1.00, 1.05, 1.10, 1.15, 1.21, 1.27, 1.33, 1.40, 1.47, 1.54, 1.62, 1.69,
    1.78, 1.87, 1.96, 2.05, 2.15, 2.26, 2.37, 2.49, 2.61, 2.74, 2.87, 3.01,
    3.16, 3.32, 3.48, 3.65, 3.83, 4.02, 4.22, 4.42, 4.64, 4.87, 5.11, 5.36,
    5.62, 5.90, 6.19, 6.49, 6.81, 7.15, 7.50, 7.87, 8.25, 8.66, 9.09, 9.53,
];
#[rustfmt::skip]
const E96: [f64; 96] = [
    1.00, 1.02, 1.05, 1.07, 1.10, 1.13, 1.15, 1.18, 1.21, 1.24, 1.27, 1.30,
    1.33, 1.37, 1.40, 1.43, 1.47, 1.50, 1.54, 1.58, 1.62, 1.65, 1.69, 1.74,
    1.78, 1.82, 1.87, 1.91, 1.96, 2.00, 2.05, 2.10, 2.15, 2.21, 2.26, 2.32,
    2.37, 2.43, 2.49, 2.55, 2.61, 2.67, 2.74, 2.80, 2.87, 2.94, 3.01, 3.09,
    3.16, 3.24, 3.32, 3.40, 3.48, 3.57, 3.65, 3.74, 3.83, 3.92, 4.02, 4.12,
    4.22, 4.32, 4.42, 4.53, 4.64, 4.75, 4.87, 4.99, 5.11, 5.23, 5.36, 5.49,
    5.62, 5.76, 5.90, 6.04, 6.19, 6.34, 6.49, 6.65, 6.81, 6.98, 7.15, 7.32,
    7.50, 7.68, 7.87, 8.06, 8.25, 8.45, 8.66, 8.87, 9.09, 9.31, 9.53, 9.76,
];

/// One of the standard E series.  Each series contains the values of one decade, `[1, 10)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ESeries {
    E3,
    E6,
    E12,
    E24,
    E48,
    E96,
}

impl ESeries {
    pub const ALL: [ESeries; 6] = [
        ESeries::E3,
        ESeries::E6,
        ESeries::E12,
        ESeries::E24,
        ESeries::E48,
        ESeries::E96,
    ];

    /// The values in one decade of this series, in ascending order
    pub fn values(self) -> &'static [f64] {
        match self {
            ESeries::E3 => &E3,
            ESeries::E6 => &E6,
            ESeries::E12 => &E12,
            ESeries::E24 => &E24,
            ESeries::E48 => &E48,
            ESeries::E96 => &E96,
        }
    }

    /// Every value of this series scaled by every power of ten in `decades`.  The values are
    /// ordered by series value first, then by decade (so `E3.over_decades([0, 1])` gives `1, 10,
    /// 2.2, 22, 4.7, 47`).
    pub fn over_decades(self, decades: impl IntoIterator<Item = i32>) -> Vec<f64> {
        let decades: Vec<i32> = decades.into_iter().collect();
        self.values()
            .iter()
            .flat_map(|&v| decades.iter().map(move |&d| scale(v, d)))
            .collect()
    }

    /// [`ESeries::over_decades`] as repeatable [`Magnitudes`]
    pub fn magnitudes(self, decades: impl IntoIterator<Item = i32>) -> Magnitudes {
        Magnitudes::Fixed(self.over_decades(decades))
    }
}

impl Display for ESeries {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for ESeries {
    type Err = String;

    fn from_str(v: &str) -> Result<Self, String> {
        ESeries::ALL
            .into_iter()
            .find(|s| s.to_string().eq_ignore_ascii_case(v.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown E series {:?}. Expected one of E3, E6, E12, E24, E48 or E96.",
                    v
                )
            })
    }
}

/// Multiply `v` by `10^decade`, rounding to the `f64` nearest the decimal result.  Going through
/// the decimal string gives `2.2e-9` rather than `2.2000000000000003e-9`.
fn scale(v: f64, decade: i32) -> f64 {
    format!("{}e{}", v, decade)
        .parse()
        .unwrap_or_else(|_| v * 10f64.powi(decade))
}
