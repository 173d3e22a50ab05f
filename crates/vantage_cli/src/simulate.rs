//! Headless scroll simulation

use anyhow::{Context, Result};
use vantage_app::{MountedScene, SceneConfig, SceneHost};

pub struct SimulateOptions {
    pub steps: u32,
    pub frames: u32,
    pub frame_ms: f32,
}

/// Scroll offsets for a sweep down the page and back up
fn sweep(max_scroll: f32, steps: u32) -> Vec<f32> {
    let steps = steps.max(1);
    let down = (0..=steps).map(|i| max_scroll * i as f32 / steps as f32);
    let up = (0..steps).rev().map(|i| max_scroll * i as f32 / steps as f32);
    down.chain(up).collect()
}

pub fn run(config: SceneConfig, options: &SimulateOptions) -> Result<()> {
    let max_scroll = (config.viewport.content_height - config.viewport.height).max(0.0);
    let bar_class = config.progress_bar.bar_class.clone();
    let container_class = config.progress_bar.container_class.clone();

    let mut host = SceneHost::headless(config).context("Invalid scene config")?;
    let area = host
        .scroll_area()
        .context("Headless host has no scroll container")?;
    let bar = host.document().query(&bar_class);
    let outer = host.document().query(&container_class);

    let mut scene = MountedScene::mount(&mut host).context("Failed to mount scene")?;

    println!(
        "{:>8} {:>7} {:>8} {:>8} {:>7}   {:>22}",
        "offset", "width%", "opacity", "y", "fov", "camera"
    );
    for offset in sweep(max_scroll, options.steps) {
        area.scroll_to(offset);
        for _ in 0..options.frames {
            scene.frame(options.frame_ms);
        }

        let width = bar
            .as_ref()
            .and_then(|b| b.lock().ok().map(|b| b.width))
            .unwrap_or(0.0);
        let (opacity, y) = outer
            .as_ref()
            .and_then(|o| o.lock().ok().map(|o| (o.opacity, o.y)))
            .unwrap_or((0.0, 0.0));
        let camera = scene
            .camera_position()
            .map(|p| format!("({:6.2}, {:6.2}, {:6.2})", p.x, p.y, p.z))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>8.1} {:>7.1} {:>8.3} {:>8.1} {:>7.1}   {:>22}",
            offset,
            width,
            opacity,
            y,
            scene.camera_state().fov,
            camera
        );
    }

    scene.unmount();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_goes_down_and_back() {
        assert_eq!(sweep(100.0, 2), vec![0.0, 50.0, 100.0, 50.0, 0.0]);
        assert_eq!(sweep(100.0, 0), vec![0.0, 100.0, 0.0]);
    }

    #[test]
    fn test_run_default_scene() {
        let options = SimulateOptions {
            steps: 4,
            frames: 2,
            frame_ms: 16.0,
        };
        run(SceneConfig::default(), &options).unwrap();
    }
}
