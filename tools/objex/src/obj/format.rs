//! Locale-independent fixed-point number formatting.

use std::fmt;

use objex_shared::Color;

/// Decimals for positions, normals and UVs.
pub const VECTOR_DECIMALS: usize = 5;
/// Decimals for colour channels.
pub const COLOR_DECIMALS: usize = 3;
/// Decimals for the dissolve (alpha) value.
pub const ALPHA_DECIMALS: usize = 2;

/// Formats a float with a fixed number of decimals.
///
/// Ties round away from zero (`0.125` with two decimals is `0.13`). Values
/// that round to zero print as an unsigned zero, so `-0.0` and `-0.000001`
/// both become `0.00000`.
#[derive(Debug, Clone, Copy)]
pub struct Fixed {
    value: f32,
    decimals: usize,
}

impl Fixed {
    pub fn new(value: f32, decimals: usize) -> Self {
        Self { value, decimals }
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10f64.powi(self.decimals as i32);
        let scaled = (self.value as f64 * scale).round();
        let value = if scaled == 0.0 { 0.0 } else { scaled / scale };
        write!(f, "{:.*}", self.decimals, value)
    }
}

/// Space-separated fixed-point fields.
pub(crate) struct Fields<'a> {
    values: &'a [f32],
    decimals: usize,
}

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", Fixed::new(value, self.decimals))?;
        }
        Ok(())
    }
}

pub(crate) fn vector(values: &[f32]) -> Fields<'_> {
    Fields {
        values,
        decimals: VECTOR_DECIMALS,
    }
}

/// RGB channels of `color`, three decimals each.
pub(crate) fn color(color: Color) -> impl fmt::Display {
    struct Rgb([f32; 3]);
    impl fmt::Display for Rgb {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let fields = Fields {
                values: &self.0,
                decimals: COLOR_DECIMALS,
            };
            write!(f, "{fields}")
        }
    }
    Rgb([color.r, color.g, color.b])
}

/// Convert between left- and right-handed coordinates by negating X.
pub fn flip_handedness(v: [f32; 3]) -> [f32; 3] {
    [-v[0], v[1], v[2]]
}
