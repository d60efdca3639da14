/// Owner and repository name a pull request lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Both owner and repository name are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }
}

impl std::fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A pull request as given by the user: either a bare number, resolved
/// against the configured repository, or a full PR URL carrying its own.
/// Produced by parse_pr_ref() in pr/mod.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    /// Repository named by a PR URL, if one was given
    pub repo: Option<RepoCoordinates>,
    /// PR number (always positive)
    pub number: u64,
}

impl PrRef {
    /// The repository to query: the URL's own, else `default`.
    pub fn resolve_repo(&self, default: &RepoCoordinates) -> RepoCoordinates {
        self.repo.clone().unwrap_or_else(|| default.clone())
    }
}

/// Line counts for a unified diff, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files: usize,
    pub additions: usize,
    pub deletions: usize,
    pub new_files: usize,
    pub deleted_files: usize,
}
