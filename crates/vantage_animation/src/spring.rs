//! Spring easing
//!
//! Closed-form damped harmonic oscillator used as an easing curve. The curve
//! is the step response of a spring released from 0 toward 1 with zero
//! initial velocity, stretched so that its settle time maps onto `t = 1`.

use serde::{Deserialize, Serialize};

/// Envelope amplitude below which the spring counts as settled
const SETTLE_THRESHOLD: f32 = 1e-3;

/// Upper bound on the settle time (seconds) for very soft springs
const MAX_SETTLE_SECS: f32 = 10.0;

/// Configuration for a spring curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    /// Create a new spring configuration
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Build a spring from a bounce amount in `[0, 1)`
    ///
    /// 0 is critically damped (no overshoot); values toward 1 oscillate more.
    pub fn from_bounce(bounce: f32) -> Self {
        let stiffness = 100.0;
        let mass = 1.0;
        let zeta = 1.0 - bounce.clamp(0.0, 0.99);
        Self {
            stiffness,
            damping: 2.0 * zeta * (stiffness * mass).sqrt(),
            mass,
        }
    }

    /// A stiff, snappy spring (good for buttons)
    pub fn stiff() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    /// Calculate critical damping for this spring's stiffness and mass
    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    fn natural_frequency(&self) -> f32 {
        (self.stiffness / self.mass.max(f32::EPSILON)).sqrt()
    }

    fn damping_ratio(&self) -> f32 {
        let critical = self.critical_damping();
        if critical <= 0.0 {
            return 1.0;
        }
        self.damping / critical
    }

    /// Time in seconds until the oscillation envelope falls below the threshold
    pub fn settle_time(&self) -> f32 {
        let omega = self.natural_frequency();
        let zeta = self.damping_ratio();
        // Slowest decaying mode
        let decay = if zeta < 1.0 {
            zeta * omega
        } else {
            omega * (zeta - (zeta * zeta - 1.0).sqrt())
        };
        if decay <= 0.0 {
            return MAX_SETTLE_SECS;
        }
        ((1.0 / SETTLE_THRESHOLD).ln() / decay).min(MAX_SETTLE_SECS)
    }

    /// Position of the spring at `secs`, released from 0 toward 1
    pub fn response(&self, secs: f32) -> f32 {
        let omega = self.natural_frequency();
        let zeta = self.damping_ratio();
        let t = secs.max(0.0);

        if (zeta - 1.0).abs() < 1e-3 {
            1.0 - (-omega * t).exp() * (1.0 + omega * t)
        } else if zeta < 1.0 {
            let omega_d = omega * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega * t).exp();
            1.0 - envelope
                * ((omega_d * t).cos() + (zeta * omega / omega_d) * (omega_d * t).sin())
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            1.0 + (r2 * (r1 * t).exp() - r1 * (r2 * t).exp()) / (r1 - r2)
        }
    }

    /// Sample the spring as an easing curve over normalized time
    pub fn ease(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        self.response(t * self.settle_time())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::stiff()
    }
}
