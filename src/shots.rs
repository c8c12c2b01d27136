//! Debug screenshot store
//!
//! Timestamped full-screen PNGs written around faults and missing-asset
//! startup, and purged in one sweep after any clean no-match cycle. Only
//! `.png` files are touched on purge; anything else in the directory is
//! left alone.

use std::path::{Path, PathBuf};

use image::RgbaImage;

pub struct ShotStore {
    dir: PathBuf,
}

impl ShotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the screenshot directory if it does not exist. Safe to call
    /// repeatedly.
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Write a capture as `screen_YYYYMMDD_HHMMSS.png` and return its path.
    pub fn save(&self, screen: &RgbaImage) -> anyhow::Result<PathBuf> {
        self.ensure_dir()?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("screen_{stamp}.png"));
        screen.save(&path)?;
        Ok(path)
    }

    /// Delete every PNG in the directory, returning how many were removed.
    /// A missing directory is not an error.
    pub fn clear(&self) -> anyhow::Result<usize> {
        if !self.dir.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")) {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn tiny_capture() -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ShotStore::new(dir.path().join("debug_screenshots"));

        store.ensure_dir().unwrap();
        store.ensure_dir().unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn saved_shots_use_the_timestamp_naming_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let store = ShotStore::new(dir.path().to_path_buf());

        let path = store.save(&tiny_capture()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("screen_"));
        assert!(name.ends_with(".png"));
        // screen_ + 8 date digits + _ + 6 time digits + .png
        assert_eq!(name.len(), "screen_YYYYMMDD_HHMMSS.png".len());
    }

    #[test]
    fn clear_removes_only_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ShotStore::new(dir.path().to_path_buf());
        store.save(&tiny_capture()).unwrap();
        std::fs::write(dir.path().join("screen_a.png"), b"stale").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        let removed = store.clear().unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn clear_on_missing_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ShotStore::new(dir.path().join("never_created"));
        assert_eq!(store.clear().unwrap(), 0);
    }
}
