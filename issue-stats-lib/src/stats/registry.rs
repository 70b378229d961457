use crate::Result;
use core::fmt::{Display, Formatter};

/// A registered package whose repository activity is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: i64,
    pub handle: String,
    pub name: String,
    /// Declared source repository URL, which may be absent or malformed.
    pub repository: Option<String>,
    /// The user whose provider credentials are used to query the repository.
    pub developer_id: i64,
}

impl Display for Package {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Read-only access to the package registry.
pub trait PackageRegistry {
    /// List all packages, or only the one with the given handle, in a stable order.
    fn packages(&self, handle: Option<&str>) -> Result<Vec<Package>>;
}
