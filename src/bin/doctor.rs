//! Environment doctor for popwatch
//!
//! Checks the host configuration and exits 0 only when every check passes.

use popwatch::config::WatchConfig;
use popwatch::doctor;

fn main() {
    let config = WatchConfig::default();
    std::process::exit(doctor::run(&config));
}
