//! Scene lifecycle
//!
//! A [`SceneHost`] owns everything that outlives a mount: the animation
//! scheduler, the document, the scroll container, the render camera and
//! the model asset. [`MountedScene::mount`] creates one animation scope and
//! registers the progress bar, the camera track, the logo bounce loop and
//! the scope methods inside it. [`MountedScene::unmount`] reverts that scope exactly once.
//!
//! Per frame the order is fixed: scheduler tick, camera rig, model spin.
//! Scroll notices are handled as they arrive, so the rig always reads the
//! camera state committed for the latest scroll offset.

use crate::config::SceneConfig;
use crate::dom::{Document, ScrollArea};
use crate::progress_bar::{bind_progress_bar, ProgressBarBinding};
use std::sync::Arc;
use vantage_3d::{
    CameraRig, CameraState, ModelAsset, OrbitController, OutlinedModel, PerspectiveCamera,
    RigCamera, RigState, SharedCameraState,
};
use vantage_animation::{
    AnimationScheduler, AnimationScope, Easing, FieldSpec, LoopMode, RootId, ScrollBinding,
    ScrollContainer, SharedTarget, TweenId, TweenSpec,
};
use vantage_core::{Result, Vec3};

/// Root used when none is given
pub const DEFAULT_ROOT: RootId = 1;

/// Long-lived resources a scene mounts into
pub struct SceneHost {
    config: SceneConfig,
    root: RootId,
    scheduler: AnimationScheduler,
    document: Document,
    scroll: Option<Arc<ScrollArea>>,
    camera: Option<PerspectiveCamera>,
    controls: Option<OrbitController>,
    model: Option<ModelAsset>,
}

impl SceneHost {
    /// Host with nothing mounted yet: no scroll container, camera or model
    pub fn new(config: SceneConfig, document: Document) -> Self {
        Self {
            config,
            root: DEFAULT_ROOT,
            scheduler: AnimationScheduler::new(),
            document,
            scroll: None,
            camera: None,
            controls: None,
            model: None,
        }
    }

    /// Fully populated host for running a scene without a window
    ///
    /// Creates the progress bar and logo nodes, a scroll container sized by
    /// the viewport section, and a camera (plus orbit controls when enabled)
    /// at the initial pose.
    pub fn headless(config: SceneConfig) -> Result<Self> {
        config.validate()?;

        let mut document = Document::new();
        document.create_element(&[config.progress_bar.container_class.as_str()]);
        document.create_element(&[config.progress_bar.bar_class.as_str()]);
        document.create_element(&[config.logo.class.as_str()]);

        let v = &config.viewport;
        let scroll = ScrollArea::new((v.width, v.height), (v.width, v.content_height));

        let c = &config.camera;
        let camera = PerspectiveCamera::new(c.initial.fov, v.width / v.height, c.near, c.far)
            .with_position(c.initial.position());
        let controls = c.orbit.enabled.then(|| {
            let mut controls = OrbitController::new(c.initial.look_at())
                .with_distance_limits(c.orbit.min_distance, c.orbit.max_distance);
            controls.zoom_enabled = c.orbit.zoom;
            controls.rotation_speed = c.orbit.rotation_speed;
            controls
        });

        let mut host = Self::new(config, document);
        host.scroll = Some(scroll);
        host.camera = Some(camera);
        host.controls = controls;
        Ok(host)
    }

    pub fn with_root(mut self, root: RootId) -> Self {
        self.root = root;
        self
    }

    pub fn with_model(mut self, model: ModelAsset) -> Self {
        self.model = Some(model);
        self
    }

    pub fn set_scroll_area(&mut self, scroll: Option<Arc<ScrollArea>>) {
        self.scroll = scroll;
    }

    pub fn set_camera(&mut self, camera: Option<PerspectiveCamera>) {
        self.camera = camera;
    }

    pub fn set_controls(&mut self, controls: Option<OrbitController>) {
        self.controls = controls;
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn root(&self) -> RootId {
        self.root
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn scroll_area(&self) -> Option<Arc<ScrollArea>> {
        self.scroll.clone()
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitController> {
        self.controls.as_mut()
    }
}

impl std::fmt::Debug for SceneHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneHost")
            .field("root", &self.root)
            .field("document", &self.document)
            .field("scroll", &self.scroll)
            .field("camera", &self.camera.is_some())
            .field("controls", &self.controls.is_some())
            .field("model", &self.model.as_ref().map(ModelAsset::len))
            .finish()
    }
}

/// A scene mounted into a host
///
/// Dropping a mounted scene without calling [`unmount`](Self::unmount)
/// still reverts its scope.
pub struct MountedScene<'h> {
    host: &'h mut SceneHost,
    scope: AnimationScope,
    rig: CameraRig,
    camera_state: SharedCameraState,
    progress_bar: ProgressBarBinding,
    track: Option<TweenId>,
    model: Option<OutlinedModel>,
}

impl<'h> MountedScene<'h> {
    /// Create the scene's scope and register everything inside it
    pub fn mount(host: &'h mut SceneHost) -> Result<Self> {
        let mut scope = AnimationScope::new(host.scheduler.handle(), host.root)?;
        let config = &host.config;
        let camera_state = config.camera.initial.shared();
        let container: Option<Arc<dyn ScrollContainer>> = host
            .scroll
            .clone()
            .map(|area| area as Arc<dyn ScrollContainer>);

        let mut progress_bar = ProgressBarBinding::default();
        let mut track = None;
        scope.add(|ctx| {
            if config.progress_bar.enabled {
                progress_bar =
                    bind_progress_bar(ctx, &host.document, container.clone(), &config.progress_bar)?;
            }

            if config.camera.track.enabled {
                match container.clone() {
                    Some(container) => {
                        let track_config = &config.camera.track;
                        let mut spec = TweenSpec::new().scroll(
                            ScrollBinding::new(container, track_config.window()?)
                                .sync(track_config.sync_mode()?)
                                .debug(track_config.debug),
                        );
                        for (field, field_spec) in track_config.field_specs(&config.camera.initial)? {
                            spec = spec.field(field, field_spec);
                        }
                        let target: SharedTarget = camera_state.clone();
                        track = Some(ctx.animate(target, spec)?);
                    }
                    None => tracing::warn!("scroll container not mounted, skipping camera track"),
                }
            }

            let logos = host.document.query_all(&config.logo.class);
            match logos.first().cloned() {
                Some(logo) => {
                    let easing: Easing = config.logo.easing.parse()?;
                    let duration_ms = config.logo.duration_ms;
                    ctx.add_method("rotate_logo", move |ctx, turns| {
                        let target: SharedTarget = logo.clone();
                        let spec = TweenSpec::new()
                            .field("rotate", FieldSpec::to(turns * 360.0))
                            .duration(duration_ms)
                            .easing(easing);
                        ctx.animate(target, spec)?;
                        Ok(())
                    });
                }
                None => tracing::warn!(class = %config.logo.class, "logo node not found"),
            }

            let bounce = &config.logo.bounce;
            if bounce.enabled && !logos.is_empty() {
                let steps = bounce.steps()?;
                for (index, logo) in logos.into_iter().enumerate() {
                    let target: SharedTarget = logo;
                    let spec = TweenSpec::new()
                        .field("scale", FieldSpec::keyframes(steps.clone()))
                        .repeat(LoopMode::Infinite)
                        .delay(index as f32 * bounce.stagger_ms);
                    ctx.animate(target, spec)?;
                }
                tracing::debug!(peak = bounce.peak, "logo bounce loop started");
            }
            Ok(())
        })?;

        let mut rig = CameraRig::new(config.camera.smoothing());
        rig.attach(camera_state.clone());
        let model = host
            .model
            .as_ref()
            .map(|asset| OutlinedModel::build(asset, &config.model.nodes));

        tracing::info!(
            root = host.root,
            tweens = scope.tweens().len(),
            progress_bar = progress_bar.is_bound(),
            camera_track = track.is_some(),
            "scene mounted"
        );
        Ok(Self {
            host,
            scope,
            rig,
            camera_state,
            progress_bar,
            track,
            model,
        })
    }

    /// Run one frame: scheduler, camera rig, then model spin
    pub fn frame(&mut self, dt_ms: f32) -> RigState {
        self.host.scheduler.tick_ms(dt_ms);
        let camera = self.host.camera.as_mut().map(|c| c as &mut dyn RigCamera);
        let state = self.rig.frame(dt_ms, camera, self.host.controls.as_mut());
        if let Some(model) = self.model.as_mut() {
            model.spin(dt_ms);
        }
        state
    }

    /// Invoke a scope method such as `rotate_logo`
    pub fn call(&mut self, method: &str, arg: f32) -> Result<()> {
        self.scope.call(method, arg)
    }

    pub fn host(&self) -> &SceneHost {
        self.host
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera_state
            .lock()
            .map(|state| *state)
            .unwrap_or_default()
    }

    /// Live camera position, if a camera is mounted
    pub fn camera_position(&self) -> Option<Vec3> {
        self.host.camera.as_ref().map(|c| c.position)
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn progress_bar(&self) -> ProgressBarBinding {
        self.progress_bar
    }

    pub fn camera_track(&self) -> Option<TweenId> {
        self.track
    }

    pub fn model(&self) -> Option<&OutlinedModel> {
        self.model.as_ref()
    }

    /// Revert every animation and release the host
    pub fn unmount(self) {
        let MountedScene {
            scope, mut rig, ..
        } = self;
        let root = scope.root();
        scope.revert();
        rig.detach();
        tracing::info!(root, frames = rig.frames_applied(), "scene unmounted");
    }
}
