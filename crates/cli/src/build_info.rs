use std::sync::OnceLock;

// Prefix of every environment variable the CLI reads.
pub const ENV_PREFIX: &str = "EXTIP_";

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(value) => value,
        None => "unknown",
    }
}

// Build and git information from vergen via cargo:rustc-env
pub const BUILD_DATE: &str = or_unknown(option_env!("VERGEN_BUILD_DATE"));
pub const GIT_SHA: &str = or_unknown(option_env!("VERGEN_GIT_SHA"));
pub const GIT_DESCRIBE: &str = or_unknown(option_env!("VERGEN_GIT_DESCRIBE"));

pub const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the short Git SHA (first 7 characters).
pub fn git_sha_short() -> &'static str {
    GIT_SHA.get(..7).unwrap_or(GIT_SHA)
}

/// Checks if the build was made from uncommitted changes.
pub fn is_dirty_build() -> bool {
    GIT_DESCRIBE.contains("dirty")
}

/// Returns the string that is shown when CLI is invoked with "--version".
pub fn version() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        let dirty_flag = match is_dirty_build() {
            true => " (dirty)",
            false => "",
        };
        format!(
            "v{}, git: {}{}, built: {}",
            CARGO_PKG_VERSION,
            git_sha_short(),
            dirty_flag,
            BUILD_DATE
        )
    })
}
