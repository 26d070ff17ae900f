// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=INAPP_CAMERA_VERSION");

    // Packagers can pin the version without a git checkout
    let version = match std::env::var("INAPP_CAMERA_VERSION") {
        Ok(v) => v,
        Err(_) => git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`, reshaped as:
/// - "0.1.0-abcdef1" when HEAD is exactly at tag v0.1.0
/// - "0.1.0-dirty-abcdef1" when HEAD is past the tag
/// - "abcdef1" when there is no tag at all
fn git_version() -> Option<String> {
    let described = run_git(&["describe", "--tags", "--always", "--match", "v*"])?;
    let described = described.strip_prefix('v').unwrap_or(&described).to_string();
    let hash = run_git(&["rev-parse", "--short", "HEAD"])?;

    if described == hash {
        return Some(hash);
    }

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    if parts.len() >= 3 {
        let commit = parts[0].strip_prefix('g').unwrap_or(parts[0]);
        Some(format!("{}-dirty-{}", parts[2], commit))
    } else {
        Some(format!("{}-{}", described, hash))
    }
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
