use super::{ActivitySource, CredentialLookup, Package, PackageRegistry, RepoRef, SnapshotStore, Windows, aggregate};
use crate::Result;
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use ohno::EnrichableExt;

const LOG_TARGET: &str = "       job";

/// Why a package was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The declared repository is missing or doesn't point at a supported host.
    InvalidRepository(Option<String>),

    /// The package's developer has no token for the provider.
    MissingCredential,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidRepository(None) => write!(f, "no repository declared"),
            Self::InvalidRepository(Some(url)) => write!(f, "unsupported repository '{url}'"),
            Self::MissingCredential => write!(f, "no provider credentials for the developer"),
        }
    }
}

/// What happened to a single package during a run.
#[derive(Debug)]
pub enum PackageOutcome {
    /// Fresh snapshots were written for every window.
    Updated,

    /// The package was not processed and nothing was written.
    Skipped(SkipReason),

    /// Processing failed; the error names the stage that failed.
    Failed(ohno::AppError),
}

impl PackageOutcome {
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Per-package outcomes of one run, in processing order.
#[derive(Debug, Default)]
pub struct JobReport {
    entries: Vec<(Package, PackageOutcome)>,
}

impl JobReport {
    /// All packages and their outcomes.
    #[must_use]
    pub fn entries(&self) -> &[(Package, PackageOutcome)] {
        &self.entries
    }

    pub fn updated(&self) -> impl Iterator<Item = &Package> {
        self.entries.iter().filter(|(_, outcome)| outcome.is_updated()).map(|(package, _)| package)
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&Package, &SkipReason)> {
        self.entries.iter().filter_map(|(package, outcome)| match outcome {
            PackageOutcome::Skipped(reason) => Some((package, reason)),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&Package, &ohno::AppError)> {
        self.entries.iter().filter_map(|(package, outcome)| match outcome {
            PackageOutcome::Failed(e) => Some((package, e)),
            _ => None,
        })
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn record(&mut self, package: Package, outcome: PackageOutcome) {
        self.entries.push((package, outcome));
    }
}

/// Recomputes issue statistics for registered packages.
///
/// Packages are processed one at a time. Each one ends up updated, skipped, or failed,
/// and no outcome influences how the remaining packages are handled.
#[derive(Debug)]
pub struct JobRunner<'a, R, C, A, S> {
    registry: &'a R,
    credentials: &'a C,
    source: &'a A,
    store: &'a S,
    supported_host: String,
    credential_provider: String,
    now: DateTime<Utc>,
}

impl<'a, R, C, A, S> JobRunner<'a, R, C, A, S>
where
    R: PackageRegistry,
    C: CredentialLookup,
    A: ActivitySource,
    S: SnapshotStore,
{
    pub fn new(registry: &'a R, credentials: &'a C, source: &'a A, store: &'a S) -> Self {
        Self {
            registry,
            credentials,
            source,
            store,
            supported_host: "github.com".to_string(),
            credential_provider: "Github".to_string(),
            now: Utc::now(),
        }
    }

    /// Only repositories on this host are resolved; everything else is skipped.
    #[must_use]
    pub fn with_supported_host(mut self, host: impl Into<String>) -> Self {
        self.supported_host = host.into();
        self
    }

    /// Provider name used when looking up developer tokens.
    #[must_use]
    pub fn with_credential_provider(mut self, provider: impl Into<String>) -> Self {
        self.credential_provider = provider.into();
        self
    }

    /// Reference time for the window thresholds and the snapshot timestamps.
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Process every registered package, or only the one with the given handle.
    ///
    /// # Errors
    ///
    /// Fails only if the registry cannot be read. Per-package problems are recorded in
    /// the returned report instead.
    pub async fn run(&self, handle: Option<&str>) -> Result<JobReport> {
        let packages = self
            .registry
            .packages(handle)
            .map_err(|e| e.enrich("listing registered packages"))?;

        if let Some(handle) = handle
            && packages.is_empty()
        {
            log::warn!(target: LOG_TARGET, "No package registered with handle '{handle}'");
        }

        let windows = Windows::new(self.now);
        let mut report = JobReport::default();

        for package in packages {
            let outcome = self.process_package(&package, &windows).await;
            match &outcome {
                PackageOutcome::Updated => log::info!(target: LOG_TARGET, "Updated issue statistics for '{package}'"),
                PackageOutcome::Skipped(reason) => log::info!(target: LOG_TARGET, "Skipping '{package}': {reason}"),
                PackageOutcome::Failed(e) => log::error!(target: LOG_TARGET, "Could not update '{package}': {e:#}"),
            }
            report.record(package, outcome);
        }

        Ok(report)
    }

    async fn process_package(&self, package: &Package, windows: &Windows) -> PackageOutcome {
        let Some(repo) = RepoRef::resolve(package.repository.as_deref(), &self.supported_host) else {
            return PackageOutcome::Skipped(SkipReason::InvalidRepository(package.repository.clone()));
        };

        let token = match self.credentials.lookup(&self.credential_provider, package.developer_id) {
            Ok(Some(token)) => token,
            Ok(None) => return PackageOutcome::Skipped(SkipReason::MissingCredential),
            Err(e) => {
                return PackageOutcome::Failed(
                    e.enrich_with(|| format!("looking up {} credentials for package '{package}'", self.credential_provider)),
                );
            }
        };

        match self.update_package(package, &repo, &token, windows).await {
            Ok(()) => PackageOutcome::Updated,
            Err(e) => PackageOutcome::Failed(e),
        }
    }

    async fn update_package(&self, package: &Package, repo: &RepoRef, token: &str, windows: &Windows) -> Result<()> {
        let items = self
            .source
            .fetch_activity(repo, token, windows.since())
            .await
            .map_err(|e| e.enrich_with(|| format!("fetching activity of '{repo}' for package '{package}'")))?;

        let totals = aggregate(&items, windows);

        log::debug!(
            target: LOG_TARGET,
            "Aggregated {} item(s) for '{package}' into {:?}",
            items.len(),
            totals.get(super::Window::WIDEST)
        );

        self.store
            .save(package.id, &totals, windows.now())
            .map_err(|e| e.enrich_with(|| format!("saving issue statistics for package '{package}'")))
    }
}
