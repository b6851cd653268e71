use ranked_searcher_release::Target;
use serde::Serialize;
use tracing::instrument;

/// Build and package information.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// Package name
    pub name: &'static str,
    /// Package version
    pub version: &'static str,
    /// Release target of the running binary, if it is one we publish
    pub target: Option<&'static str>,
    /// Correlation id of this process
    pub correlation_id: String,
}

/// Collects version information for the running binary.
#[instrument]
#[must_use]
pub fn get_version_info() -> VersionInfo {
    let info = VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        target: Target::current().map(|t| t.short_id()),
        correlation_id: crate::tracing::correlation_id().to_string(),
    };
    tracing::debug!(
        package_name = info.name,
        package_version = info.version,
        target = ?info.target,
        "Gathered package information"
    );
    info
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}\nTarget: {}\nCorrelation ID: {}",
            self.name,
            self.version,
            self.target.unwrap_or("unsupported"),
            self.correlation_id
        )
    }
}
