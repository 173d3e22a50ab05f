//! Scene configuration
//!
//! A scene is described by a TOML (or JSON) document. Every section has
//! defaults, so an empty file yields the stock scene:
//!
//! ```toml
//! [viewport]
//! height = 800.0
//! content_height = 8000.0
//!
//! [camera]
//! alpha = 0.15
//!
//! [camera.track]
//! enter = "top top"
//! leave = "bottom bottom"
//! sync = "true"
//!
//! [[camera.track.keyframes]]
//! z = 3.5
//! y = 1.0
//!
//! [progress_bar.reveal]
//! enter = "top 150px"
//! sync = "play reverse"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use vantage_3d::{default_node_styles, CameraState, NodeStyle, Smoothing};
use vantage_animation::{Easing, FieldSpec, KeyframeStep, ScrollWindow, SyncMode};
use vantage_core::{Result, VantageError};

/// Complete scene description
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub progress_bar: ProgressBarConfig,
    pub logo: LogoConfig,
    pub model: ModelConfig,
}

/// Page geometry used by headless hosts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    /// Total scrollable height of the page
    pub content_height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            content_height: 8000.0,
        }
    }
}

/// Camera, rig smoothing and orbit settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub near: f32,
    pub far: f32,
    /// Smoothing factor per frame
    pub alpha: f32,
    /// Normalize `alpha` by frame duration
    pub time_normalized: bool,
    pub reference_frame_ms: f32,
    /// Pose the camera state starts from
    pub initial: CameraState,
    pub orbit: OrbitConfig,
    pub track: TrackConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 1000.0,
            alpha: vantage_3d::DEFAULT_ALPHA,
            time_normalized: false,
            reference_frame_ms: vantage_3d::DEFAULT_REFERENCE_FRAME_MS,
            initial: CameraState::default(),
            orbit: OrbitConfig::default(),
            track: TrackConfig::default(),
        }
    }
}

impl CameraConfig {
    pub fn smoothing(&self) -> Smoothing {
        if self.time_normalized {
            Smoothing::TimeNormalized {
                alpha: self.alpha,
                reference_frame_ms: self.reference_frame_ms,
            }
        } else {
            Smoothing::PerFrame { alpha: self.alpha }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enabled: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom: bool,
    /// Radians per pixel of pointer movement
    pub rotation_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_distance: 3.0,
            max_distance: 20.0,
            zoom: false,
            rotation_speed: 0.005,
        }
    }
}

/// One camera keyframe; omitted fields hold their previous value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseKeyframe {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tz: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fov: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    /// Step duration in milliseconds; steps without one take an equal share of the track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
}

impl PoseKeyframe {
    fn value(&self, field: &str) -> Option<f32> {
        match field {
            "x" => self.x,
            "y" => self.y,
            "z" => self.z,
            "tx" => self.tx,
            "ty" => self.ty,
            "tz" => self.tz,
            "fov" => self.fov,
            _ => None,
        }
    }
}

const POSE_FIELDS: [&str; 7] = ["x", "y", "z", "tx", "ty", "tz", "fov"];

/// Scroll-driven camera track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub enabled: bool,
    pub enter: String,
    pub leave: String,
    pub sync: String,
    /// Easing applied to steps without their own
    pub easing: String,
    pub debug: bool,
    pub keyframes: Vec<PoseKeyframe>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enter: "top top".to_string(),
            leave: "bottom bottom".to_string(),
            sync: "true".to_string(),
            easing: "inOut(2)".to_string(),
            debug: false,
            keyframes: vec![
                PoseKeyframe {
                    y: Some(1.0),
                    z: Some(3.5),
                    ..Default::default()
                },
                PoseKeyframe {
                    x: Some(2.5),
                    z: Some(4.0),
                    ty: Some(0.5),
                    fov: Some(50.0),
                    ..Default::default()
                },
                PoseKeyframe {
                    x: Some(0.0),
                    y: Some(0.0),
                    z: Some(6.0),
                    ty: Some(0.0),
                    fov: Some(55.0),
                    ..Default::default()
                },
            ],
        }
    }
}

impl TrackConfig {
    pub fn window(&self) -> Result<ScrollWindow> {
        ScrollWindow::parse(&self.enter, &self.leave)
    }

    pub fn sync_mode(&self) -> Result<SyncMode> {
        self.sync.parse()
    }

    /// Per-field keyframe specs for the camera state
    ///
    /// Only fields named by at least one keyframe are animated. A keyframe
    /// that omits an animated field holds the value reached so far, starting
    /// from `initial`.
    pub fn field_specs(&self, initial: &CameraState) -> Result<Vec<(String, FieldSpec)>> {
        let default_easing: Easing = self.easing.parse()?;
        let mut easings = Vec::with_capacity(self.keyframes.len());
        for keyframe in &self.keyframes {
            let easing = match &keyframe.easing {
                Some(name) => name.parse()?,
                None => default_easing,
            };
            easings.push(easing);
        }

        let mut specs = Vec::new();
        for field in POSE_FIELDS {
            if self.keyframes.iter().all(|k| k.value(field).is_none()) {
                continue;
            }
            let mut held = initial_value(initial, field);
            let steps: Vec<KeyframeStep> = self
                .keyframes
                .iter()
                .zip(&easings)
                .map(|(keyframe, easing)| {
                    held = keyframe.value(field).unwrap_or(held);
                    let step = KeyframeStep::to(held).easing(*easing);
                    match keyframe.duration {
                        Some(duration) => step.duration(duration),
                        None => step,
                    }
                })
                .collect();
            specs.push((field.to_string(), FieldSpec::keyframes(steps)));
        }
        Ok(specs)
    }
}

fn initial_value(state: &CameraState, field: &str) -> f32 {
    match field {
        "x" => state.x,
        "y" => state.y,
        "z" => state.z,
        "tx" => state.tx,
        "ty" => state.ty,
        "tz" => state.tz,
        _ => state.fov,
    }
}

/// Scroll window with its sync mode
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub enter: String,
    pub leave: String,
    pub sync: String,
    /// Log every progress recomputation
    pub debug: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            enter: "top top".to_string(),
            leave: "bottom bottom".to_string(),
            sync: "true".to_string(),
            debug: false,
        }
    }
}

impl WindowConfig {
    pub fn window(&self) -> Result<ScrollWindow> {
        ScrollWindow::parse(&self.enter, &self.leave)
    }

    pub fn sync_mode(&self) -> Result<SyncMode> {
        self.sync.parse()
    }
}

/// Progress bar binding settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressBarConfig {
    pub enabled: bool,
    pub container_class: String,
    pub bar_class: String,
    /// Fade-in duration of the container, in milliseconds
    pub fade_duration_ms: f32,
    /// Vertical offset the container slides in from, in pixels
    pub slide_offset: f32,
    /// Container fade and slide
    pub reveal: WindowConfig,
    /// Inner bar width
    pub fill: WindowConfig,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            container_class: "progressBarContainer".to_string(),
            bar_class: "progressBar".to_string(),
            fade_duration_ms: 300.0,
            slide_offset: 100.0,
            reveal: WindowConfig {
                enter: "top 150px".to_string(),
                sync: "play reverse".to_string(),
                debug: true,
                ..WindowConfig::default()
            },
            fill: WindowConfig::default(),
        }
    }
}

/// Logo nodes: the `rotate_logo` scope method and the idle bounce loop
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    pub class: String,
    pub duration_ms: f32,
    pub easing: String,
    pub bounce: BounceConfig,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            class: "logo".to_string(),
            duration_ms: 1500.0,
            easing: "out(4)".to_string(),
            bounce: BounceConfig::default(),
        }
    }
}

/// Endless scale pulse: grow to `peak`, then spring back to rest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceConfig {
    pub enabled: bool,
    pub peak: f32,
    pub rise_ms: f32,
    pub rise_easing: String,
    pub settle_easing: String,
    /// Length of the settle step; a spring easing uses its own settle time
    pub settle_ms: Option<f32>,
    /// Extra start delay per logo node, in document order
    pub stagger_ms: f32,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            peak: 1.25,
            rise_ms: 200.0,
            rise_easing: "inOut(3)".to_string(),
            settle_easing: "spring(0.7)".to_string(),
            settle_ms: None,
            stagger_ms: 300.0,
        }
    }
}

impl BounceConfig {
    /// Scale keyframes for one cycle, ending back at 1
    pub fn steps(&self) -> Result<[KeyframeStep; 2]> {
        let rise: Easing = self.rise_easing.parse()?;
        let settle: Easing = self.settle_easing.parse()?;
        let settle_ms = match (self.settle_ms, settle) {
            (Some(ms), _) => ms,
            (None, Easing::Spring(spring)) => spring.settle_time() * 1000.0,
            (None, _) => self.rise_ms,
        };
        Ok([
            KeyframeStep::to(self.peak).easing(rise).duration(self.rise_ms),
            KeyframeStep::to(1.0).easing(settle).duration(settle_ms),
        ])
    }
}

/// Outlined model settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub nodes: Vec<NodeStyle>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            nodes: default_node_styles(),
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| VantageError::Config(e.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| VantageError::Config(e.to_string()))
    }

    /// Load from a file, choosing JSON for `.json` and TOML otherwise
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| VantageError::Config(format!("{}: {}", path.display(), e)))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_toml_str(&source)
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VantageError::Config(e.to_string()))
    }

    /// Parse every descriptor and check numeric ranges
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(VantageError::Config(msg));

        let v = &self.viewport;
        if !(v.height > 0.0 && v.width > 0.0) {
            return invalid(format!("viewport must be positive, got {}x{}", v.width, v.height));
        }
        if v.content_height < v.height {
            return invalid(format!(
                "content height {} is smaller than the viewport",
                v.content_height
            ));
        }

        let c = &self.camera;
        if !(c.alpha > 0.0 && c.alpha <= 1.0) {
            return invalid(format!("camera alpha must be in (0, 1], got {}", c.alpha));
        }
        if c.time_normalized && c.reference_frame_ms <= 0.0 {
            return invalid(format!(
                "reference frame duration must be positive, got {}",
                c.reference_frame_ms
            ));
        }
        if !(c.near > 0.0 && c.near < c.far) {
            return invalid(format!("invalid clip planes {}..{}", c.near, c.far));
        }
        if c.orbit.min_distance > c.orbit.max_distance {
            return invalid(format!(
                "orbit min distance {} exceeds max distance {}",
                c.orbit.min_distance, c.orbit.max_distance
            ));
        }
        if c.track.enabled {
            c.track.window()?;
            c.track.sync_mode()?;
            if c.track.keyframes.is_empty() {
                return invalid("camera track has no keyframes".to_string());
            }
            c.track.field_specs(&c.initial)?;
        }

        let p = &self.progress_bar;
        if p.enabled {
            for window in [&p.reveal, &p.fill] {
                window.window()?;
                window.sync_mode()?;
            }
            if p.fade_duration_ms < 0.0 {
                return invalid(format!("negative fade duration {}", p.fade_duration_ms));
            }
        }

        self.logo.easing.parse::<Easing>()?;
        let bounce = &self.logo.bounce;
        if bounce.enabled {
            bounce.steps()?;
            if !bounce.peak.is_finite() || bounce.rise_ms < 0.0 || bounce.stagger_ms < 0.0 {
                return invalid(format!(
                    "invalid logo bounce: peak {}, rise {}ms, stagger {}ms",
                    bounce.peak, bounce.rise_ms, bounce.stagger_ms
                ));
            }
            if bounce.settle_ms.is_some_and(|ms| ms < 0.0) {
                return invalid("negative logo bounce settle time".to_string());
            }
        }

        for node in &self.model.nodes {
            if node.style.threshold < 0.0 || node.style.threshold > 180.0 {
                return invalid(format!(
                    "node '{}' threshold {} is outside 0..180 degrees",
                    node.name, node.style.threshold
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default_scene() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
        config.validate().unwrap();
        assert_eq!(config.camera.smoothing(), Smoothing::PerFrame { alpha: 0.15 });
        assert_eq!(config.model.nodes.len(), 10);
    }

    #[test]
    fn test_partial_sections() {
        let config = SceneConfig::from_toml_str(
            r#"
            [camera]
            alpha = 0.3
            time_normalized = true

            [camera.initial]
            z = 5.0
            fov = 65.0

            [progress_bar.fill]
            sync = "0.8"

            [[model.nodes]]
            name = "I_Tube"
            threshold = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.initial.z, 5.0);
        assert_eq!(config.camera.initial.x, 0.0);
        assert_eq!(config.progress_bar.fill.sync_mode().unwrap(), SyncMode::Smoothed(0.8));
        assert_eq!(config.progress_bar.reveal.enter, "top 150px");
        assert_eq!(config.model.nodes.len(), 1);
        assert_eq!(config.model.nodes[0].style.threshold, 4.0);
        assert!(config.model.nodes[0].style.spin);
        assert!(matches!(
            config.camera.smoothing(),
            Smoothing::TimeNormalized { alpha, .. } if alpha == 0.3
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(SceneConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_json_source() {
        let config =
            SceneConfig::from_json_str(r#"{"camera": {"track": {"enabled": false}}}"#).unwrap();
        assert!(!config.camera.track.enabled);
        assert!(SceneConfig::from_json_str("{").is_err());
    }

    #[test]
    fn test_validate_names_bad_strings() {
        let mut config = SceneConfig::default();
        config.progress_bar.reveal.enter = "sideways".to_string();
        assert!(matches!(config.validate(), Err(VantageError::InvalidBoundary(_))));

        let mut config = SceneConfig::default();
        config.camera.track.sync = "play wiggle".to_string();
        assert!(config.validate().is_err());

        let mut config = SceneConfig::default();
        config.camera.track.keyframes[0].easing = Some("bouncy".to_string());
        assert_eq!(
            config.validate(),
            Err(VantageError::InvalidEasing("bouncy".to_string()))
        );

        let mut config = SceneConfig::default();
        config.camera.alpha = 0.0;
        assert!(matches!(config.validate(), Err(VantageError::Config(_))));
    }

    #[test]
    fn test_bounce_steps() {
        let bounce = BounceConfig::default();
        let [rise, settle] = bounce.steps().unwrap();
        assert_eq!(rise.to, 1.25);
        assert_eq!(rise.duration_ms, Some(200.0));
        assert_eq!(rise.easing, Some(Easing::InOut(3.0)));
        assert_eq!(settle.to, 1.0);
        let spring = vantage_animation::SpringConfig::from_bounce(0.7);
        assert_eq!(settle.easing, Some(Easing::Spring(spring)));
        assert_eq!(settle.duration_ms, Some(spring.settle_time() * 1000.0));

        let timed = BounceConfig {
            settle_easing: "out(2)".to_string(),
            ..BounceConfig::default()
        };
        assert_eq!(timed.steps().unwrap()[1].duration_ms, Some(200.0));

        let mut config = SceneConfig::default();
        config.logo.bounce.settle_easing = "wobble".to_string();
        assert!(matches!(config.validate(), Err(VantageError::InvalidEasing(_))));
        config.logo.bounce.enabled = false;
        assert!(config.validate().is_ok());

        let config = SceneConfig::from_toml_str("[logo.bounce]\nstagger_ms = -5.0\n").unwrap();
        assert!(matches!(config.validate(), Err(VantageError::Config(_))));
    }

    #[test]
    fn test_field_specs_hold_previous_values() {
        let track = TrackConfig {
            keyframes: vec![
                PoseKeyframe {
                    z: Some(4.0),
                    ..Default::default()
                },
                PoseKeyframe {
                    x: Some(1.0),
                    ..Default::default()
                },
            ],
            ..TrackConfig::default()
        };
        let specs = track.field_specs(&CameraState::default()).unwrap();
        let names: Vec<_> = specs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["x", "z"]);

        let FieldSpec::Keyframes(z_steps) = &specs[1].1 else {
            panic!("expected keyframes");
        };
        let z: Vec<f32> = z_steps.iter().map(|s| s.to).collect();
        assert_eq!(z, [4.0, 4.0]);

        let FieldSpec::Keyframes(x_steps) = &specs[0].1 else {
            panic!("expected keyframes");
        };
        assert_eq!(x_steps[0].to, 0.0);
        assert_eq!(x_steps[1].to, 1.0);
    }
}
