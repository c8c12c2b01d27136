//! The popup watch loop
//!
//! Policy lives here; everything touching the live session goes through the
//! [`Desktop`] trait. Each scan cycle walks the reference images in order
//! against one fresh capture: the first hit is clicked and the rest of the
//! list is skipped, and a cycle that closed something rolls straight into
//! the next one without the inter-cycle sleep. Faults are contained to the
//! cycle they happen in; only operator cancellation stops the loop.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::WatchConfig;
use crate::desktop::{Desktop, Point};
use crate::journal::Journal;
use crate::shots::ShotStore;

/// What a single scan cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// A reference matched and its center was clicked
    Closed { reference: PathBuf, at: Point },
    /// Nothing matched and nothing went wrong; debug screenshots were purged
    Nothing,
    /// At least one fault occurred; debug screenshots were kept
    Fault,
}

pub struct Watcher {
    config: WatchConfig,
    desktop: Arc<dyn Desktop>,
    journal: Journal,
    shots: ShotStore,
}

impl Watcher {
    pub fn new(config: WatchConfig, desktop: Arc<dyn Desktop>) -> anyhow::Result<Self> {
        let journal = Journal::open(&config.log_file)?;
        let shots = ShotStore::new(config.debug_dir.clone());
        Ok(Self { config, desktop, journal, shots })
    }

    /// Run scan cycles until the task is cancelled from outside.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.journal.info("Popup watcher started");
        println!("Popup watcher is running in the background...");
        println!(
            "Scanning for popups every {} seconds.",
            self.config.scan_interval.as_secs()
        );
        println!("Debug screenshots are cleared whenever a scan finds nothing.");
        println!("Press Ctrl+C to stop");

        self.shots.ensure_dir()?;

        if !self.any_reference_on_disk() {
            self.journal.warn("No close button reference images found.");
            println!("Warning: no close button reference images found.");
            println!("Please ensure at least one of the following files exists:");
            for path in &self.config.reference_images {
                println!("- {}", path.display());
            }
            println!("Capturing initial screen for debugging...");
            self.save_debug_shot().await;
            wait_for_operator_ack().await?;
        }

        loop {
            match self.run_cycle().await {
                // A closed popup may have siblings behind it; rescan at once.
                CycleOutcome::Closed { .. } => continue,
                CycleOutcome::Nothing | CycleOutcome::Fault => {
                    tokio::time::sleep(self.config.scan_interval).await;
                }
            }
        }
    }

    /// Note operator cancellation in the journal.
    pub fn record_stop(&mut self) {
        self.journal.info("Popup watcher stopped by user");
    }

    /// Run one scan cycle. Faults are logged and absorbed here; the caller
    /// only decides whether to sleep before the next cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let mut faulted = false;
        match self.scan_once(&mut faulted).await {
            Ok(Some((reference, at))) => CycleOutcome::Closed { reference, at },
            Ok(None) if faulted => CycleOutcome::Fault,
            Ok(None) => {
                self.purge_shots();
                CycleOutcome::Nothing
            }
            Err(err) => {
                self.journal.error(&format!("Error during detection cycle: {err:#}"));
                self.save_debug_shot().await;
                CycleOutcome::Fault
            }
        }
    }

    /// Walk the reference list against one fresh capture. Returns the match
    /// that was clicked, if any. Per-image matching faults set `faulted`
    /// and move on; anything else propagates as a cycle-level error.
    async fn scan_once(
        &mut self,
        faulted: &mut bool,
    ) -> anyhow::Result<Option<(PathBuf, Point)>> {
        let screen = self.desktop.capture_screen().await?;

        let references = self.config.reference_images.clone();
        for reference in references {
            // A reference the operator never supplied is not worth a log line.
            if !reference.exists() {
                continue;
            }
            let name = display_name(&reference);

            match self
                .desktop
                .locate(&screen, &reference, self.config.confidence, self.config.grayscale)
                .await
            {
                Ok(Some(region)) => {
                    let at = region.center();

                    let saved = self.desktop.pointer_position().await?;
                    self.desktop.click(at).await?;
                    self.desktop.move_pointer(saved).await?;

                    let message =
                        format!("Closed popup using '{name}' at position {}, {}", at.x, at.y);
                    self.journal.info(&message);
                    println!("{message}");

                    // Give the popup a moment to go away before rescanning.
                    tokio::time::sleep(self.config.post_click_delay).await;

                    return Ok(Some((reference, at)));
                }
                Ok(None) => continue,
                Err(err) => {
                    *faulted = true;
                    self.journal.error(&format!("Error locating image '{name}': {err:#}"));
                    self.save_debug_shot().await;
                }
            }
        }

        Ok(None)
    }

    fn any_reference_on_disk(&self) -> bool {
        self.config.reference_images.iter().any(|path| path.exists())
    }

    fn purge_shots(&mut self) {
        match self.shots.clear() {
            Ok(0) => {}
            Ok(removed) => {
                self.journal.info(&format!(
                    "Clearing {removed} debug screenshots from {} as no popups were detected in the last scan.",
                    self.shots.dir().display()
                ));
                println!("Cleared {removed} debug screenshots.");
            }
            Err(err) => {
                self.journal.warn(&format!("Could not clear debug screenshots: {err:#}"));
            }
        }
    }

    /// Best effort: a failed debug capture only earns a journal entry.
    async fn save_debug_shot(&mut self) {
        match self.desktop.capture_screen().await {
            Ok(screen) => match self.shots.save(&screen) {
                Ok(path) => {
                    self.journal.info(&format!("Saved debug screenshot to {}", path.display()));
                }
                Err(err) => {
                    self.journal.error(&format!("Failed to save debug screenshot: {err:#}"));
                }
            },
            Err(err) => {
                self.journal.error(&format!("Failed to capture debug screenshot: {err:#}"));
            }
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn wait_for_operator_ack() -> anyhow::Result<()> {
    println!("Press Enter to continue after ensuring at least one image exists...");
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await??;
    Ok(())
}
