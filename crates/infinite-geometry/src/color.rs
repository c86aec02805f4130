//! HSL colour conversion.
//!
//! Matches the conversion the renderer applies when a colour is set from
//! hue, saturation, and lightness: hue wraps into `[0, 1)`, saturation and
//! lightness clamp into `[0, 1]`.

use serde::{Deserialize, Serialize};

/// A colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

impl Rgb {
    /// Build a colour from channels.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// Convert hue, saturation, lightness (all nominally in `[0, 1]`) to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s <= 0.0 {
        return Rgb::new(l, l, l);
    }

    let high = if l <= 0.5 {
        l * (1.0 + s)
    } else {
        (-l).mul_add(s, l + s)
    };
    let low = 2.0f64.mul_add(l, -high);

    Rgb::new(
        hue_to_channel(low, high, h + 1.0 / 3.0),
        hue_to_channel(low, high, h),
        hue_to_channel(low, high, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(low: f64, high: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        (high - low).mul_add(6.0 * t, low)
    } else if t < 0.5 {
        high
    } else if t < 2.0 / 3.0 {
        (high - low).mul_add(6.0 * (2.0 / 3.0 - t), low)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-9 && (a.g - b.g).abs() < 1e-9 && (a.b - b.b).abs() < 1e-9
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Rgb::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert!(close(hsl_to_rgb(0.7, 0.0, 0.3), Rgb::new(0.3, 0.3, 0.3)));
    }

    #[test]
    fn hue_wraps() {
        assert!(close(hsl_to_rgb(1.25, 0.8, 0.5), hsl_to_rgb(0.25, 0.8, 0.5)));
        assert!(close(hsl_to_rgb(-0.75, 0.8, 0.5), hsl_to_rgb(0.25, 0.8, 0.5)));
    }
}
