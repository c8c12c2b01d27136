//! Environment doctor
//!
//! Four independent checks over the host: toolchain version, runtime
//! capability probes, on-disk setup, and platform/display compatibility.
//! Each prints a colorized section; the overall verdict is the AND of all
//! four. The setup check is deliberately advisory: it warns about missing
//! assets but always reports success, so in practice it cannot fail the run.

use std::path::Path;

use image::ImageEncoder;
use imageproc::template_matching::{MatchTemplateMethod, match_template};

use crate::config::WatchConfig;
use crate::shots::ShotStore;

/// Minimum supported compiler version (major, minor).
pub const MIN_RUST_VERSION: (u64, u64) = (1, 75);

const BLUE: &str = "\x1b[94m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn print_section(title: &str) {
    println!("\n{BLUE}{BOLD}==== {title} ===={RESET}\n");
}

fn print_success(message: &str) {
    println!("{GREEN}[SUCCESS]{RESET} {message}");
}

fn print_error(message: &str) {
    println!("{RED}[ERROR]{RESET} {message}");
}

fn print_warning(message: &str) {
    println!("{YELLOW}[WARNING]{RESET} {message}");
}

fn print_info(message: &str) {
    println!("{CYAN}[INFO]{RESET} {message}");
}

/// Aggregated results of the four checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub toolchain_ok: bool,
    pub capabilities_ok: bool,
    pub setup_ok: bool,
    pub platform_ok: bool,
}

impl Report {
    pub fn overall(&self) -> bool {
        self.toolchain_ok && self.capabilities_ok && self.setup_ok && self.platform_ok
    }

    pub fn exit_code(&self) -> i32 {
        if self.overall() { 0 } else { 1 }
    }
}

/// Parse a `rustc --version` line like `rustc 1.82.0 (f6e511eec 2024-10-15)`
/// into (major, minor).
pub fn parse_rustc_version(raw: &str) -> Option<(u64, u64)> {
    let version = raw.split_whitespace().nth(1)?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

pub fn toolchain_meets_minimum(version: (u64, u64), minimum: (u64, u64)) -> bool {
    version >= minimum
}

/// Platform policy: Windows and macOS are fine as-is; Linux needs a
/// display server; anything else is unsupported.
pub fn platform_compatible(os: &str, has_display: bool) -> bool {
    match os {
        "windows" | "macos" => true,
        "linux" => has_display,
        _ => false,
    }
}

fn check_toolchain() -> bool {
    print_section("Checking Toolchain Version");

    let raw = env!("POPWATCH_RUSTC_VERSION");
    let (min_major, min_minor) = MIN_RUST_VERSION;
    match parse_rustc_version(raw) {
        Some(version) if toolchain_meets_minimum(version, MIN_RUST_VERSION) => {
            print_success(&format!("Rust version {}.{} is adequate", version.0, version.1));
            true
        }
        Some(version) => {
            print_error(&format!(
                "Rust version {}.{} is too old. Minimum required: {min_major}.{min_minor}",
                version.0, version.1
            ));
            false
        }
        None => {
            print_error(&format!("Could not determine the compiler version from '{raw}'"));
            false
        }
    }
}

fn check_capabilities() -> bool {
    print_section("Checking Capabilities");

    let probes: [(&str, fn() -> Result<(), String>); 3] = [
        ("display control (x11)", probe_display_control),
        ("image handling (png)", probe_image_handling),
        ("template matching", probe_template_matching),
    ];

    let mut all_ok = true;
    for (name, probe) in probes {
        match probe() {
            Ok(()) => print_success(&format!("Capability '{name}' is working")),
            Err(err) => {
                print_error(&format!("Capability '{name}' is NOT working: {err}"));
                all_ok = false;
            }
        }
    }

    if !all_ok {
        print_info("Check that an X11 or XWayland session is running and DISPLAY is set");
    }

    all_ok
}

fn probe_display_control() -> Result<(), String> {
    x11rb::rust_connection::RustConnection::connect(None)
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn probe_image_handling() -> Result<(), String> {
    let sample = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(sample.as_raw(), 2, 2, image::ExtendedColorType::Rgba8)
        .map_err(|err| err.to_string())?;
    image::load_from_memory(&buffer)
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn probe_template_matching() -> Result<(), String> {
    let screen = image::GrayImage::from_fn(4, 4, |x, y| image::Luma([(x * 40 + y * 20) as u8]));
    let template = image::imageops::crop_imm(&screen, 1, 1, 2, 2).to_image();
    let scores = match_template(&screen, &template, MatchTemplateMethod::CrossCorrelationNormalized);
    if scores.dimensions() == (3, 3) {
        Ok(())
    } else {
        Err(format!("unexpected score dimensions {:?}", scores.dimensions()))
    }
}

/// Advisory only: warns about missing pieces but always reports success.
fn check_setup(config: &WatchConfig) -> bool {
    print_section("Checking Watcher Setup");

    let watcher_bin = sibling_binary("popwatch");
    if watcher_bin.exists() {
        print_success(&format!("Watcher binary found at: {}", watcher_bin.display()));
    } else {
        print_warning(&format!("Watcher binary not found at: {}", watcher_bin.display()));
    }

    match config.reference_images.iter().find(|path| path.exists()) {
        Some(path) => print_success(&format!("Close button image found at: {}", path.display())),
        None => {
            print_warning("No close button reference image found");
            print_info("You'll need to capture one before running the watcher, e.g.:");
            for path in &config.reference_images {
                print_info(&format!("  {}", path.display()));
            }
        }
    }

    let shots = ShotStore::new(config.debug_dir.clone());
    match shots.ensure_dir() {
        Ok(()) => print_info(&format!("Debug screenshots directory ready at: {}", shots.dir().display())),
        Err(err) => print_warning(&format!("Could not create debug directory: {err:#}")),
    }

    true
}

fn sibling_binary(name: &str) -> std::path::PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(name)
}

fn check_platform() -> bool {
    print_section("Checking Platform Compatibility");

    let os = std::env::consts::OS;
    let has_display = std::env::var("DISPLAY").is_ok();

    if platform_compatible(os, has_display) {
        print_success(&format!("Platform '{os}' is compatible"));
        true
    } else if os == "linux" {
        print_error("No display server is running. The watcher requires a graphical session");
        false
    } else {
        print_error(&format!("Platform '{os}' is not supported"));
        false
    }
}

/// Run every check, print the summary, and return the process exit code.
pub fn run(config: &WatchConfig) -> i32 {
    println!("\nChecking popwatch configuration...");

    let report = Report {
        toolchain_ok: check_toolchain(),
        capabilities_ok: check_capabilities(),
        setup_ok: check_setup(config),
        platform_ok: check_platform(),
    };

    print_section("Summary");
    let verdict = |ok: bool| if ok { format!("{GREEN}ok{RESET}") } else { format!("{RED}FAIL{RESET}") };
    println!("Toolchain:     {}", verdict(report.toolchain_ok));
    println!("Capabilities:  {}", verdict(report.capabilities_ok));
    println!("Setup:         {}", verdict(report.setup_ok));
    println!("Platform:      {}", verdict(report.platform_ok));

    if report.overall() {
        println!("\n{GREEN}Popwatch configuration looks good!{RESET}\n");
        println!("To start the watcher, run:");
        println!("  popwatch");
    } else {
        println!("\n{RED}Some configuration checks failed. Please fix the issues above.{RESET}\n");
    }

    report.exit_code()
}
