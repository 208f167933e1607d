//! Version resolution - picks the version that serves a request.

use tracing::{debug, warn};

use crate::error::TreatyError;
use crate::version::{SemanticVersion, VersionCollection, VersionFactory};

/// Extracts the requested version from a caller-defined request context.
pub type VersionExtractor<C> = Box<dyn Fn(&C) -> Option<String> + Send + Sync>;

/// Resolves versions using a caller-supplied extractor, e.g. one reading an
/// `Accept` header or a URL segment.
pub struct VersionResolver<C> {
    extractor: VersionExtractor<C>,
}

impl<C> std::fmt::Debug for VersionResolver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver").finish_non_exhaustive()
    }
}

impl<C> VersionResolver<C> {
    pub fn new(extractor: impl Fn(&C) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            extractor: Box::new(extractor),
        }
    }

    /// The version string the context asks for, if any.
    pub fn requested(&self, context: &C) -> Option<String> {
        (self.extractor)(context)
    }

    /// Resolve the version for a request context.
    ///
    /// # Errors
    ///
    /// See [`resolve_version`].
    pub fn resolve<'a>(
        &self,
        context: &C,
        versions: &'a VersionCollection,
    ) -> Result<&'a VersionFactory, TreatyError> {
        resolve_version(self.requested(context).as_deref(), versions)
    }
}

/// Select the version for a requested version string.
///
/// A blank request selects the default version. A deprecated match is
/// refused even though the version exists.
///
/// # Errors
///
/// Returns `TreatyError::VersionRequired` when nothing was requested and no
/// default exists, `TreatyError::VersionNotFound` when no version matches,
/// and `TreatyError::Deprecated` when the match is deprecated.
pub fn resolve_version<'a>(
    requested: Option<&str>,
    versions: &'a VersionCollection,
) -> Result<&'a VersionFactory, TreatyError> {
    let requested = requested.map(str::trim).filter(|v| !v.is_empty());

    let factory = match requested {
        None => versions.find_default().ok_or(TreatyError::VersionRequired)?,
        Some(raw) => {
            let not_found = || TreatyError::VersionNotFound {
                version: raw.to_string(),
            };
            let version = SemanticVersion::parse(raw).map_err(|_| not_found())?;
            versions.find(&version).ok_or_else(not_found)?
        }
    };

    if factory.is_deprecated() {
        warn!(version = %factory.version(), "deprecated version requested");
        return Err(TreatyError::Deprecated {
            message: format!("Version {} is deprecated", factory.version()),
        });
    }

    debug!(
        requested = requested.unwrap_or("<default>"),
        version = %factory.version(),
        strategy = %factory.strategy(),
        "resolved version"
    );
    Ok(factory)
}
