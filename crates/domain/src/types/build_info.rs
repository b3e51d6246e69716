//! Immutable build information captured at compile time

use crate::constants::SDK_NAME;

/// Diagnostics about the running SDK build.
///
/// `git_commit` and `build_date` are read from the `XDR_GIT_COMMIT` and
/// `XDR_BUILD_DATE` environment variables when the crate is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_commit: Option<&'static str>,
    pub build_date: Option<&'static str>,
}

impl BuildInfo {
    /// Build information for this compilation.
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: option_env!("XDR_GIT_COMMIT"),
            build_date: option_env!("XDR_BUILD_DATE"),
        }
    }

    /// Default `User-Agent` identifying the SDK, its version, the runtime and
    /// the OS/architecture.
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (rust; {}/{})",
            SDK_NAME,
            self.version,
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}
