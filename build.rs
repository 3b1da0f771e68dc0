use std::process::Command;

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!rev.is_empty()).then_some(rev)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=MEISTER_BUILD_REV");

    println!(
        "cargo:rustc-env=MEISTER_BUILT_AT={}",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );

    // Packagers without a checkout can pin the revision explicitly.
    let rev = std::env::var("MEISTER_BUILD_REV")
        .ok()
        .or_else(git_describe)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=MEISTER_BUILD_REV={rev}");
}
