//! X11 desktop implementation using xcap and x11rb
//!
//! Captures go through xcap (which is blocking, so they run in a blocking
//! task); pointer queries use core protocol requests and clicks are
//! synthesized with the XTest extension.

use std::path::Path;

use async_trait::async_trait;
use image::RgbaImage;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, ConnectionExt as _, Window};
use x11rb::protocol::xtest::ConnectionExt as _;
use x11rb::rust_connection::RustConnection;

use super::{Desktop, Point, Region};
use crate::matcher;

const LEFT_BUTTON: u8 = 1;

/// Live X11 session
pub struct X11Desktop {
    conn: RustConnection,
    root: Window,
}

impl X11Desktop {
    pub fn new() -> anyhow::Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        Ok(Self { conn, root })
    }

    fn warp_pointer(&self, to: Point) -> anyhow::Result<()> {
        self.conn.warp_pointer(
            x11rb::NONE,
            self.root,
            0,
            0,
            0,
            0,
            to.x as i16,
            to.y as i16,
        )?;
        self.conn.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Desktop for X11Desktop {
    async fn capture_screen(&self) -> anyhow::Result<RgbaImage> {
        // xcap is not async, so run it in a blocking task
        let image = tokio::task::spawn_blocking(|| -> anyhow::Result<RgbaImage> {
            let monitors = xcap::Monitor::all()?;
            let monitor = monitors
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("No monitors found"))?;
            Ok(monitor.capture_image()?)
        })
        .await??;

        Ok(image)
    }

    async fn locate(
        &self,
        screen: &RgbaImage,
        reference: &Path,
        confidence: f32,
        grayscale: bool,
    ) -> anyhow::Result<Option<Region>> {
        // Matching a full-screen capture is CPU-heavy; keep it off the
        // async runtime like the capture itself.
        let screen = screen.clone();
        let reference = reference.to_path_buf();

        let region = tokio::task::spawn_blocking(move || {
            matcher::locate(&screen, &reference, confidence, grayscale)
        })
        .await??;

        Ok(region)
    }

    async fn pointer_position(&self) -> anyhow::Result<Point> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        Ok(Point {
            x: reply.root_x as i32,
            y: reply.root_y as i32,
        })
    }

    async fn move_pointer(&self, to: Point) -> anyhow::Result<()> {
        self.warp_pointer(to)
    }

    async fn click(&self, at: Point) -> anyhow::Result<()> {
        self.warp_pointer(at)?;

        self.conn.xtest_fake_input(
            xproto::BUTTON_PRESS_EVENT,
            LEFT_BUTTON,
            x11rb::CURRENT_TIME,
            self.root,
            0,
            0,
            0,
        )?;
        self.conn.xtest_fake_input(
            xproto::BUTTON_RELEASE_EVENT,
            LEFT_BUTTON,
            x11rb::CURRENT_TIME,
            self.root,
            0,
            0,
            0,
        )?;
        self.conn.flush()?;

        Ok(())
    }
}
