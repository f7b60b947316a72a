/// Name printed in front of the version number.
const PROJECT_NAME: &str = "cini";

/// License line printed under the version.
const LICENSE_LINE: &str = "Licensed under GNU LGPL v3";

/// Get local version from Cargo.toml at compile time
fn get_local_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// `debug` for unoptimised builds, `release` otherwise.
fn build_flavor() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

/// Full text of `cini --version`.
pub fn render() -> String {
    format!(
        "{PROJECT_NAME}, version {}-{}\n{LICENSE_LINE}\n",
        get_local_version(),
        build_flavor()
    )
}

/// Print version information
pub fn run() {
    print!("{}", render());
}
