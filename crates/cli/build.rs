use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/heads");
    println!("cargo:rerun-if-env-changed=ROLLCALL_COMMIT");

    // Source tarballs have no .git; packagers can pass the hash in.
    let commit = std::env::var("ROLLCALL_COMMIT").ok().or_else(git_short_hash);
    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit.as_deref().unwrap_or("unknown"));

    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TARGET={}", target);
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short=7", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}
