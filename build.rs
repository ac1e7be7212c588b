use std::env;
use std::fs;
use std::process::Command;

const BUILD_NUMBER_FILE: &str = "BUILD_NUMBER";
const VERSION_FILE: &str = "VERSION";

/// Bump the persisted build counter and return the new value
fn next_build_number() -> u64 {
    let previous = fs::read_to_string(BUILD_NUMBER_FILE)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let next = previous + 1;
    if let Err(e) = fs::write(BUILD_NUMBER_FILE, next.to_string()) {
        println!("cargo:warning=cannot update {}: {}", BUILD_NUMBER_FILE, e);
    }
    next
}

/// Package version, overridden by a non-empty VERSION file
fn crate_version() -> String {
    fs::read_to_string(VERSION_FILE)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into()))
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    let profile = match env::var("PROFILE").as_deref() {
        Ok("release") => "release",
        _ => "development",
    };

    let vars = [
        ("SBWT_VERSION", crate_version()),
        ("SBWT_BUILD", next_build_number().to_string()),
        ("SBWT_PROFILE", profile.to_string()),
        ("SBWT_GIT_HASH", git_short_hash().unwrap_or_else(|| "unknown".into())),
    ];
    for (name, value) in vars {
        println!("cargo:rustc-env={}={}", name, value);
    }

    for file in [BUILD_NUMBER_FILE, VERSION_FILE] {
        println!("cargo:rerun-if-changed={}", file);
    }
    println!("cargo:rerun-if-env-changed=PROFILE");
}
