//! Watch loop configuration
//!
//! All tuning knobs live in one structure that is handed to the watcher at
//! construction, so tests can substitute their own paths and timings.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Reference image filenames scanned each cycle, in priority order.
pub const REFERENCE_IMAGE_NAMES: &[&str] = &["close_button.png", "close_add.png", "badspam.png"];

/// Configuration for the popup watcher
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Seconds to wait between scan cycles that found nothing
    pub scan_interval: Duration,
    /// Minimum template-match similarity (0.0 to 1.0) to accept a hit
    pub confidence: f32,
    /// Match on grayscale images rather than per-channel color
    pub grayscale: bool,
    /// Pause after a successful click before the next scan
    pub post_click_delay: Duration,
    /// Close-button reference images, scanned in order; missing files are skipped
    pub reference_images: Vec<PathBuf>,
    /// Append-only journal file
    pub log_file: PathBuf,
    /// Directory holding debug screenshots
    pub debug_dir: PathBuf,
}

impl WatchConfig {
    /// Build a configuration with all files rooted under `base`.
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            scan_interval: Duration::from_secs(30),
            confidence: 0.8,
            grayscale: true,
            post_click_delay: Duration::from_millis(500),
            reference_images: REFERENCE_IMAGE_NAMES.iter().map(|name| base.join(name)).collect(),
            log_file: base.join("popwatch.log"),
            debug_dir: base.join("debug_screenshots"),
        }
    }
}

impl Default for WatchConfig {
    /// Root everything next to the running executable, falling back to the
    /// working directory when the executable path cannot be resolved.
    fn default() -> Self {
        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::rooted_at(&base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_config_joins_all_paths() {
        let config = WatchConfig::rooted_at(Path::new("/tmp/pw"));
        assert_eq!(config.reference_images.len(), 3);
        assert_eq!(config.reference_images[0], PathBuf::from("/tmp/pw/close_button.png"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/pw/popwatch.log"));
        assert_eq!(config.debug_dir, PathBuf::from("/tmp/pw/debug_screenshots"));
    }

    #[test]
    fn defaults_match_tuning_constants() {
        let config = WatchConfig::rooted_at(Path::new("."));
        assert_eq!(config.scan_interval, Duration::from_secs(30));
        assert_eq!(config.confidence, 0.8);
        assert!(config.grayscale);
        assert_eq!(config.post_click_delay, Duration::from_millis(500));
    }
}
