//! Keyframe tracks
//!
//! A [`FieldSpec`] describes how one named field moves: either between two
//! endpoints or through an ordered list of [`KeyframeStep`]s. Specs are
//! compiled into a [`FieldTrack`] of timed segments when a tween registers,
//! at which point the field's current value becomes the implicit start.

use crate::easing::Easing;
use smallvec::SmallVec;
use vantage_core::{Result, VantageError};

/// One step of a keyframe sequence
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeStep {
    /// Value reached at the end of this step
    pub to: f32,
    /// Easing while moving into this step (tween default when `None`)
    pub easing: Option<Easing>,
    /// Step duration in milliseconds (an equal share of the tween duration when `None`)
    pub duration_ms: Option<f32>,
}

impl KeyframeStep {
    /// Create a step toward `to` with default easing and duration
    pub fn to(to: f32) -> Self {
        Self {
            to,
            easing: None,
            duration_ms: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn duration(mut self, duration_ms: f32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// How a single field should move
#[derive(Clone, Debug, PartialEq)]
pub enum FieldSpec {
    /// Move from `from` (or the current value) to `to`
    FromTo { from: Option<f32>, to: f32 },
    /// Move through each step in order, starting from the current value
    Keyframes(Vec<KeyframeStep>),
}

impl FieldSpec {
    /// Explicit endpoints `[from, to]`
    pub fn between(from: f32, to: f32) -> Self {
        FieldSpec::FromTo {
            from: Some(from),
            to,
        }
    }

    /// From whatever the field currently holds to `to`
    pub fn to(to: f32) -> Self {
        FieldSpec::FromTo { from: None, to }
    }

    pub fn keyframes(steps: impl IntoIterator<Item = KeyframeStep>) -> Self {
        FieldSpec::Keyframes(steps.into_iter().collect())
    }
}

/// A timed interpolation segment
#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    start_ms: f32,
    end_ms: f32,
    from: f32,
    to: f32,
    easing: Easing,
}

/// A compiled, sampleable timeline for one field
#[derive(Clone, Debug)]
pub struct FieldTrack {
    field: String,
    segments: SmallVec<[Segment; 2]>,
}

fn check_finite(field: &str, what: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(VantageError::InvalidKeyframes(format!(
            "field '{}' has non-finite {}",
            field, what
        )))
    }
}

impl FieldTrack {
    /// Compile a spec into a track
    ///
    /// `current` is the field's value at registration time, `duration_ms` and
    /// `easing` are the owning tween's defaults.
    pub fn compile(
        field: &str,
        spec: &FieldSpec,
        current: f32,
        duration_ms: f32,
        easing: Easing,
    ) -> Result<Self> {
        check_finite(field, "duration", duration_ms)?;
        if duration_ms < 0.0 {
            return Err(VantageError::InvalidKeyframes(format!(
                "field '{}' has negative duration",
                field
            )));
        }

        let mut segments = SmallVec::new();
        match spec {
            FieldSpec::FromTo { from, to } => {
                let from = from.unwrap_or(current);
                check_finite(field, "start value", from)?;
                check_finite(field, "end value", *to)?;
                segments.push(Segment {
                    start_ms: 0.0,
                    end_ms: duration_ms,
                    from,
                    to: *to,
                    easing,
                });
            }
            FieldSpec::Keyframes(steps) => {
                if steps.is_empty() {
                    return Err(VantageError::InvalidKeyframes(format!(
                        "field '{}' has no keyframes",
                        field
                    )));
                }
                let share = duration_ms / steps.len() as f32;
                let mut cursor = 0.0;
                let mut from = current;
                check_finite(field, "start value", from)?;
                for step in steps {
                    let step_ms = step.duration_ms.unwrap_or(share);
                    check_finite(field, "keyframe value", step.to)?;
                    check_finite(field, "keyframe duration", step_ms)?;
                    if step_ms < 0.0 {
                        return Err(VantageError::InvalidKeyframes(format!(
                            "field '{}' has a keyframe with negative duration",
                            field
                        )));
                    }
                    segments.push(Segment {
                        start_ms: cursor,
                        end_ms: cursor + step_ms,
                        from,
                        to: step.to,
                        easing: step.easing.unwrap_or(easing),
                    });
                    cursor += step_ms;
                    from = step.to;
                }
            }
        }

        Ok(Self {
            field: field.to_string(),
            segments,
        })
    }

    /// Name of the animated field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Total length of the track in milliseconds
    pub fn duration_ms(&self) -> f32 {
        self.segments.last().map(|s| s.end_ms).unwrap_or(0.0)
    }

    /// Value at the start of the track
    pub fn first_value(&self) -> f32 {
        self.segments.first().map(|s| s.from).unwrap_or(0.0)
    }

    /// Value at the end of the track
    pub fn last_value(&self) -> f32 {
        self.segments.last().map(|s| s.to).unwrap_or(0.0)
    }

    /// Sample the track at `time_ms`; times outside the track clamp to its ends
    pub fn sample(&self, time_ms: f32) -> f32 {
        if time_ms <= 0.0 {
            return self.first_value();
        }
        for segment in &self.segments {
            if time_ms < segment.end_ms {
                let span = segment.end_ms - segment.start_ms;
                let local = if span > f32::EPSILON {
                    ((time_ms - segment.start_ms) / span).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let eased = segment.easing.apply(local);
                return segment.from + (segment.to - segment.from) * eased;
            }
        }
        self.last_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_track() {
        let track = FieldTrack::compile(
            "width",
            &FieldSpec::between(0.0, 100.0),
            42.0,
            1000.0,
            Easing::Linear,
        )
        .unwrap();
        assert_eq!(track.sample(0.0), 0.0);
        assert!((track.sample(250.0) - 25.0).abs() < 1e-4);
        assert_eq!(track.sample(1000.0), 100.0);
        assert_eq!(track.sample(5000.0), 100.0);
    }

    #[test]
    fn test_to_track_starts_from_current() {
        let track =
            FieldTrack::compile("z", &FieldSpec::to(0.0), 5.0, 100.0, Easing::Linear).unwrap();
        assert_eq!(track.first_value(), 5.0);
        assert!((track.sample(50.0) - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_keyframes_share_duration_and_chain_values() {
        let spec = FieldSpec::keyframes([
            KeyframeStep::to(1.25).easing(Easing::InOut(3.0)),
            KeyframeStep::to(1.0),
        ]);
        let track = FieldTrack::compile("scale", &spec, 1.0, 400.0, Easing::Linear).unwrap();
        assert_eq!(track.duration_ms(), 400.0);
        assert!((track.sample(200.0) - 1.25).abs() < 1e-4);
        // Second step eases linearly back from 1.25
        assert!((track.sample(300.0) - 1.125).abs() < 1e-4);
        assert_eq!(track.sample(400.0), 1.0);
    }

    #[test]
    fn test_keyframe_explicit_durations() {
        let spec = FieldSpec::keyframes([
            KeyframeStep::to(10.0).duration(200.0),
            KeyframeStep::to(20.0).duration(800.0),
        ]);
        let track = FieldTrack::compile("x", &spec, 0.0, 300.0, Easing::Linear).unwrap();
        assert_eq!(track.duration_ms(), 1000.0);
        assert!((track.sample(100.0) - 5.0).abs() < 1e-4);
        assert!((track.sample(600.0) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_malformed_specs_fail_fast() {
        let empty = FieldSpec::Keyframes(Vec::new());
        assert!(FieldTrack::compile("x", &empty, 0.0, 100.0, Easing::Linear).is_err());

        let nan = FieldSpec::between(f32::NAN, 1.0);
        assert!(FieldTrack::compile("x", &nan, 0.0, 100.0, Easing::Linear).is_err());

        let negative = FieldSpec::keyframes([KeyframeStep::to(1.0).duration(-5.0)]);
        assert!(FieldTrack::compile("x", &negative, 0.0, 100.0, Easing::Linear).is_err());
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let track =
            FieldTrack::compile("x", &FieldSpec::between(0.0, 1.0), 0.0, 0.0, Easing::Linear)
                .unwrap();
        assert_eq!(track.sample(0.0), 0.0);
        assert_eq!(track.sample(0.001), 1.0);
    }
}
