//! Figure display capability.
//!
//! Showing the figure is the only step that may block indefinitely, so it
//! sits behind a small trait: automated runs and tests use [`NoopViewer`].

use crate::config::DisplayMode;
use crate::gui::chart_viewer::{ChartViewer, MAX_TEXTURE_SIDE};
use eframe::egui;
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to decode {} for display: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Viewer window failed: {0}")]
    Window(String),
    #[error("Failed to open {} with the system viewer: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can present a written figure to the user.
pub trait FigureViewer {
    /// Present the image at `path`. May block until the user dismisses it.
    fn show(&self, path: &Path) -> Result<(), ViewerError>;
}

/// Does nothing; for non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopViewer;

impl FigureViewer for NoopViewer {
    fn show(&self, path: &Path) -> Result<(), ViewerError> {
        debug!("Display disabled, not showing {}", path.display());
        Ok(())
    }
}

/// Blocking native window; returns once the window is closed.
#[derive(Debug, Clone)]
pub struct WindowViewer {
    pub title: String,
}

impl Default for WindowViewer {
    fn default() -> Self {
        Self {
            title: "Legendre Plot".to_string(),
        }
    }
}

impl FigureViewer for WindowViewer {
    fn show(&self, path: &Path) -> Result<(), ViewerError> {
        let mut image = image::open(path).map_err(|source| ViewerError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        if image.width() > MAX_TEXTURE_SIDE || image.height() > MAX_TEXTURE_SIDE {
            image = image.thumbnail(MAX_TEXTURE_SIDE, MAX_TEXTURE_SIDE);
        }
        let image = image.to_rgba8();

        // Open at most 1200 px wide, keeping the figure's aspect ratio
        let aspect = image.height() as f32 / image.width().max(1) as f32;
        let width = (image.width() as f32).min(1200.0);
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([width, width * aspect + 24.0])
                .with_min_inner_size([320.0, 240.0])
                .with_title(&self.title),
            ..Default::default()
        };

        info!("Showing {} (close the window to continue)", path.display());
        let caption = path.display().to_string();
        eframe::run_native(
            &self.title,
            options,
            Box::new(move |_cc| Ok(Box::new(ChartViewer::new(&image, caption)))),
        )
        .map_err(|e| ViewerError::Window(e.to_string()))
    }
}

/// Hands the file to the platform's default image application.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl FigureViewer for SystemViewer {
    fn show(&self, path: &Path) -> Result<(), ViewerError> {
        info!("Opening {} with the system viewer", path.display());
        open::that(path).map_err(|source| ViewerError::Open {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Viewer implementing a display mode.
pub fn viewer_for(mode: DisplayMode) -> Box<dyn FigureViewer> {
    match mode {
        DisplayMode::None => Box::new(NoopViewer),
        DisplayMode::Window => Box::new(WindowViewer::default()),
        DisplayMode::System => Box::new(SystemViewer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_viewer_returns_immediately() {
        // The path need not exist: nothing is read
        NoopViewer.show(Path::new("does/not/exist.png")).unwrap();
    }

    #[test]
    fn test_window_viewer_reports_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = WindowViewer::default().show(&path).unwrap_err();
        assert!(matches!(err, ViewerError::Decode { .. }));
    }

    #[test]
    fn test_viewer_for_none_is_noop() {
        viewer_for(DisplayMode::None).show(Path::new("x.png")).unwrap();
    }
}
