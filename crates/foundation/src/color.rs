use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fill used for points that have no assigned colour.
pub const NEUTRAL_GRAY: Rgb = Rgb::new(0xbd, 0xbd, 0xbd);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("expected 6 hex digits, got {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

/// 24-bit colour, written as `#rrggbb` on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `rrggbb` with an optional leading `#`.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Sum of the three channels; the draw-order key for sorted rendering.
    pub fn channel_sum(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    /// Linear interpolation towards `other`; `t` is clamped to `[0, 1]`.
    pub fn blend(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha.clamp(0.0, 1.0),
        ]
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
        Rgb::new(rng.r#gen(), rng.r#gen(), rng.r#gen())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&s)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorParseError, NEUTRAL_GRAY, Rgb};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("#ff8000"), Ok(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("FF8000"), Ok(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::new(1, 2, 3).to_hex(), "#010203");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(matches!(
            Rgb::from_hex("#fff"),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            Rgb::from_hex("zz0000"),
            Err(ColorParseError::BadDigit(_))
        ));
    }

    #[test]
    fn channel_sum_orders_dark_before_light() {
        assert!(Rgb::new(0, 0, 0).channel_sum() < NEUTRAL_GRAY.channel_sum());
        assert_eq!(Rgb::new(255, 255, 255).channel_sum(), 765);
    }

    #[test]
    fn blend_endpoints() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(200, 100, 50);
        assert_eq!(a.blend(b, 0.0), a);
        assert_eq!(a.blend(b, 1.0), b);
        assert_eq!(a.blend(b, 0.5), Rgb::new(100, 50, 25));
    }

    #[test]
    fn serde_uses_hex_strings() {
        let c: Rgb = serde_json::from_str("\"#0a0b0c\"").expect("parse");
        assert_eq!(c, Rgb::new(10, 11, 12));
        assert_eq!(serde_json::to_string(&c).expect("encode"), "\"#0a0b0c\"");
        assert!(serde_json::from_str::<Rgb>("\"#0a0b\"").is_err());
    }

    #[test]
    fn random_is_seedable() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(Rgb::random(&mut a), Rgb::random(&mut b));
    }
}
