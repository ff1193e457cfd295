fn main() {
    // Release builds set LAZYBEADS_VERSION; otherwise derive it from git.
    if let Ok(version) = std::env::var("LAZYBEADS_VERSION") {
        println!("cargo:rustc-env=LAZYBEADS_VERSION={version}");
    } else {
        let hash = std::process::Command::new("git")
            .args(["rev-parse", "--short=7", "HEAD"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .unwrap_or_default()
            .trim()
            .to_string();

        if hash.is_empty() {
            println!("cargo:rustc-env=LAZYBEADS_VERSION=dev");
        } else {
            println!("cargo:rustc-env=LAZYBEADS_VERSION=dev-{hash}");
        }
    }
    println!("cargo:rerun-if-env-changed=LAZYBEADS_VERSION");
}
