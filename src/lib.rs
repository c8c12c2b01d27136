//! Popwatch - popup auto-closer for Linux desktops
//!
//! This library implements a watch loop that periodically screenshots the
//! display, searches it for known close-button images with template
//! matching, and clicks the first match to dismiss the popup.
//!
//! ## Features
//!
//! - Full-screen capture and grayscale template matching
//! - Synthetic clicks with pointer save/restore
//! - Append-only journal and self-purging debug screenshots
//! - An environment doctor binary for host diagnostics
//!
//! ## Supported Environments
//!
//! - X11 (native)
//! - XWayland (Wayland sessions with an X compatibility layer)

pub mod config;
pub mod desktop;
pub mod doctor;
pub mod journal;
pub mod matcher;
pub mod shots;
pub mod watcher;
