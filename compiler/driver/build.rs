use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../../.git/index");

    let commit = Command::new("git")
        .args(["log", "-1", "--date=short", "--pretty=format:%h %cd"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .filter(|commit| !commit.is_empty());

    let version = env!("CARGO_PKG_VERSION");
    match commit {
        Some(commit) => println!("cargo:rustc-env=VERSION={version} ({commit})"),
        None => println!("cargo:rustc-env=VERSION={version}"),
    }
}
