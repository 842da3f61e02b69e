// Build script to stamp the binary version with the commit it was built from
//
// Produces "<crate version>" for release tags and
// "<crate version>+<short hash>[-dirty]" otherwise. Falls back to the plain
// crate version when git is unavailable.

use std::process::Command;

fn main() {
    let base = env!("CARGO_PKG_VERSION");
    let version = match describe() {
        Some(tag) if tag.trim_start_matches('v') == base => base.to_string(),
        Some(other) => format!("{}+{}", base, other),
        None => base.to_string(),
    };

    println!("cargo:rustc-env=FWSIZE_VERSION={}", version);
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads");
    println!("cargo:rerun-if-changed=../.git/refs/tags");
}

/// `git describe` output: an exact tag, or an abbreviated hash
fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--exact-match"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .or_else(|| {
            Command::new("git")
                .args(["describe", "--always", "--dirty", "--abbrev=8"])
                .output()
                .ok()
        })?;

    if !output.status.success() {
        return None;
    }

    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
