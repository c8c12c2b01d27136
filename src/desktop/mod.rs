//! Desktop capability boundary
//!
//! Everything that touches the live session (screen capture, template
//! lookup, pointer movement, clicking) sits behind the [`Desktop`] trait so
//! the watch loop's policy can be unit-tested against fakes. The real
//! implementation captures with xcap and drives the pointer through X11.

mod x11;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;

pub use x11::X11Desktop;

/// A point in root-window coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A matched region on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn center(&self) -> Point {
        Point {
            x: (self.x + self.width / 2) as i32,
            y: (self.y + self.height / 2) as i32,
        }
    }
}

/// Trait for live-session operations
#[async_trait]
pub trait Desktop: Send + Sync {
    /// Capture the full primary screen
    async fn capture_screen(&self) -> anyhow::Result<RgbaImage>;

    /// Search a capture for a reference image file.
    ///
    /// `Ok(None)` means the reference is simply not on screen; an `Err` is a
    /// genuine matching fault (unreadable file, oversized reference).
    async fn locate(
        &self,
        screen: &RgbaImage,
        reference: &Path,
        confidence: f32,
        grayscale: bool,
    ) -> anyhow::Result<Option<Region>>;

    /// Current pointer position
    async fn pointer_position(&self) -> anyhow::Result<Point>;

    /// Warp the pointer to a position
    async fn move_pointer(&self, to: Point) -> anyhow::Result<()>;

    /// Move the pointer to a position and left-click there
    async fn click(&self, at: Point) -> anyhow::Result<()>;
}

/// Connect to the desktop session for the current environment
pub fn connect() -> anyhow::Result<Arc<dyn Desktop>> {
    // XWayland sessions also expose DISPLAY, so this covers Wayland
    // desktops running an X compatibility layer.
    let display_env = std::env::var("DISPLAY").ok();

    if let Some(ref disp) = display_env {
        tracing::info!("Using X11 desktop (DISPLAY={})", disp);
        Ok(Arc::new(X11Desktop::new()?))
    } else {
        anyhow::bail!("No display server detected. Set DISPLAY for X11 or XWayland.")
    }
}
