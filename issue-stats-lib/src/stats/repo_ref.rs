use core::fmt::{Display, Formatter};
use std::sync::Arc;
use url::Url;

/// A source repository on a supported hosting provider, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    host: Arc<str>,
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepoRef {
    /// Resolve a package's declared repository URL against the supported host.
    ///
    /// Returns `None` when the URL is absent, unparseable, hosted elsewhere, or lacks
    /// an owner or repository segment. Any path beyond `owner/name` is ignored and a
    /// trailing `.git` is stripped from the name.
    #[must_use]
    pub fn resolve(repository: Option<&str>, supported_host: &str) -> Option<Self> {
        let url = Url::parse(repository?.trim()).ok()?;
        Self::from_url(&url, supported_host)
    }

    fn from_url(url: &Url, supported_host: &str) -> Option<Self> {
        let host = url.host_str()?;
        if !host.eq_ignore_ascii_case(supported_host) {
            return None;
        }

        let mut segments = url.path_segments()?;
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let name = segments.next().map(|s| s.trim_end_matches(".git")).filter(|s| !s.is_empty())?;

        Some(Self {
            host: Arc::from(host),
            owner: Arc::from(owner),
            name: Arc::from(name),
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RepoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.name)
    }
}
