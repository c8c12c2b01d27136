use std::env;
use std::process::Command;

fn main() {
    // Embed the compiler version so the doctor can report it at runtime.
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_default();

    println!("cargo:rustc-env=POPWATCH_RUSTC_VERSION={version}");
    println!("cargo:rerun-if-changed=build.rs");
}
