//! Easing functions
//!
//! Power-curve easings (`in(p)`, `out(p)`, `inOut(p)`, `outIn(p)`), stepped and
//! cubic-bezier curves, and spring curves. Easings can be parsed from the
//! short names used in scene configuration, e.g. `"linear"`, `"inOut(3)"`,
//! `"steps(10)"`, `"cubicBezier(.2,.8,.3,1)"` or `"spring(0.7)"`.

use crate::spring::SpringConfig;
use std::str::FromStr;
use vantage_core::VantageError;

/// Default power for the power-curve easings when none is given
const DEFAULT_POWER: f32 = 2.0;

/// An easing curve mapping normalized time to normalized progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    /// `t^p`
    In(f32),
    /// `1 - (1 - t)^p`
    Out(f32),
    /// Accelerate through the first half, decelerate through the second
    InOut(f32),
    /// Decelerate through the first half, accelerate through the second
    OutIn(f32),
    /// Discrete jumps
    Steps(u32),
    /// CSS-style cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
    /// Damped spring response
    Spring(SpringConfig),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Out(DEFAULT_POWER)
    }
}

impl Easing {
    /// Apply the easing to `t` (clamped to 0.0..=1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::In(p) => t.powf(p),
            Easing::Out(p) => 1.0 - (1.0 - t).powf(p),
            Easing::InOut(p) => {
                if t < 0.5 {
                    (2.0 * t).powf(p) / 2.0
                } else {
                    1.0 - (2.0 - 2.0 * t).powf(p) / 2.0
                }
            }
            Easing::OutIn(p) => {
                if t < 0.5 {
                    (1.0 - (1.0 - 2.0 * t).powf(p)) / 2.0
                } else {
                    0.5 + (2.0 * t - 1.0).powf(p) / 2.0
                }
            }
            Easing::Steps(n) => {
                let n = n.max(1) as f32;
                ((t * n).floor() / n).min(1.0)
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
            Easing::Spring(config) => config.ease(t),
        }
    }
}

fn bezier_component(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

fn bezier_slope(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn cubic_bezier(x: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x <= 0.0 || x >= 1.0 {
        return x;
    }

    // Newton-Raphson first, bisection if the slope flattens out
    let mut t = x;
    for _ in 0..8 {
        let err = bezier_component(t, x1, x2) - x;
        if err.abs() < 1e-6 {
            return bezier_component(t, y1, y2);
        }
        let slope = bezier_slope(t, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= err / slope;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    t = x;
    for _ in 0..32 {
        let value = bezier_component(t, x1, x2);
        if (value - x).abs() < 1e-6 {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    bezier_component(t, y1, y2)
}

/// Split `name(args)` into the name and its comma-separated numeric arguments
fn parse_call(s: &str) -> Option<(&str, Vec<f32>)> {
    let s = s.trim();
    match s.find('(') {
        None => Some((s, Vec::new())),
        Some(open) => {
            let inner = s[open + 1..].strip_suffix(')')?;
            let args = inner
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| a.parse::<f32>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some((s[..open].trim(), args))
        }
    }
}

impl FromStr for Easing {
    type Err = VantageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VantageError::InvalidEasing(s.to_string());
        let (name, args) = parse_call(s).ok_or_else(invalid)?;
        let power = || args.first().copied().unwrap_or(DEFAULT_POWER);

        let easing = match (name, args.len()) {
            ("linear", 0) => Easing::Linear,
            ("in" | "easeIn", 0 | 1) => Easing::In(power()),
            ("out" | "easeOut", 0 | 1) => Easing::Out(power()),
            ("inOut" | "easeInOut", 0 | 1) => Easing::InOut(power()),
            ("outIn" | "easeOutIn", 0 | 1) => Easing::OutIn(power()),
            ("steps", 1) if args[0] >= 1.0 => Easing::Steps(args[0] as u32),
            ("cubicBezier", 4) => Easing::CubicBezier(args[0], args[1], args[2], args[3]),
            ("spring", 0) => Easing::Spring(SpringConfig::default()),
            ("spring", 1) => Easing::Spring(SpringConfig::from_bounce(args[0])),
            _ => return Err(invalid()),
        };

        if let Easing::In(p) | Easing::Out(p) | Easing::InOut(p) | Easing::OutIn(p) = easing {
            if !(p.is_finite() && p > 0.0) {
                return Err(invalid());
            }
        }
        Ok(easing)
    }
}
