use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";
const SHORT_COMMIT_LEN: usize = 7;

/// Build metadata shown by `teleinfo --version`: each value comes from an
/// environment override when set (CI, reproducible builds), else from git.
fn main() {
    for var in ["GITHUB_SHA", "TELEINFO_BUILD_DATE"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=build.rs");

    let mut commit = env_or_git("GITHUB_SHA", &["rev-parse", "HEAD"])
        .map(|sha| sha.chars().take(SHORT_COMMIT_LEN).collect::<String>())
        .unwrap_or_else(|| UNKNOWN.to_string());
    if git(&["status", "--porcelain", "--untracked-files=no"]).is_some() {
        commit.push_str("-dirty");
    }
    let date = env_or_git("TELEINFO_BUILD_DATE", &["log", "-1", "--format=%cI"])
        .unwrap_or_else(|| UNKNOWN.to_string());

    println!("cargo:rustc-env=TELEINFO_BUILD_COMMIT={commit}");
    println!("cargo:rustc-env=TELEINFO_BUILD_DATE={date}");
}

fn env_or_git(var: &str, git_args: &[&str]) -> Option<String> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| git(git_args))
}

/// Trimmed stdout of a successful git command; `None` when git is missing,
/// fails, or prints nothing.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !stdout.is_empty()).then_some(stdout)
}
