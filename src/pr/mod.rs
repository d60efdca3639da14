pub mod diff;
pub mod types;

pub use types::{PrRef, RepoCoordinates};

use async_trait::async_trait;
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("pr-describer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid PR reference {0:?}: expected a positive number or a GitHub PR URL")]
    InvalidReference(String),

    #[error("Failed to read PR number: {0}")]
    Input(#[from] std::io::Error),
}

/// Anything that can produce the raw unified diff of a pull request.
#[async_trait]
pub trait DiffSource: Send + Sync {
    async fn fetch_diff(&self, repo: &RepoCoordinates, number: u64) -> Result<String, PrError>;
}

/// Parse user input naming a pull request.
///
/// Accepts a bare PR number (`42`) or a github.com PR URL
/// (`https://github.com/{owner}/{repo}/pull/{number}`, optionally followed by
/// a tab such as `/files`). Zero, negative and non-numeric input are rejected
/// rather than defaulted.
pub fn parse_pr_ref(input: &str) -> Result<PrRef, PrError> {
    let input = input.trim();
    let invalid = || PrError::InvalidReference(input.to_string());

    if let Ok(number) = input.parse::<u64>() {
        if number == 0 {
            return Err(invalid());
        }
        return Ok(PrRef { repo: None, number });
    }

    let parsed = reqwest::Url::parse(input).map_err(|_| invalid())?;
    if parsed.host_str() != Some("github.com") {
        return Err(invalid());
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() < 4 || segments[2] != "pull" {
        return Err(invalid());
    }

    let number = segments[3]
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(invalid)?;

    Ok(PrRef {
        repo: Some(RepoCoordinates::new(segments[0], segments[1])),
        number,
    })
}

/// Prompt for a PR reference on `output` and read one line from `input`.
pub fn prompt_pr_ref<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<PrRef, PrError> {
    write!(output, "PR number: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    parse_pr_ref(&line)
}

/// GitHub REST client bound to a single token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn pull_url(&self, repo: &RepoCoordinates, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            number
        )
    }
}

#[async_trait]
impl DiffSource for GitHubClient {
    #[instrument(skip_all, fields(repo = %repo, pr = number))]
    async fn fetch_diff(&self, repo: &RepoCoordinates, number: u64) -> Result<String, PrError> {
        let url = self.pull_url(repo, number);

        debug!("fetching PR diff from GitHub API");
        let response = self
            .http
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github.diff")
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // GitHub explains 401/403/404 in a JSON body
            let body = response.text().await.unwrap_or_default();
            return Err(PrError::Status { status, body });
        }

        let diff_text = response.text().await?;
        debug!(diff_bytes = diff_text.len(), "received PR diff");

        Ok(diff_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_bare_number() {
        let pr = parse_pr_ref("42").unwrap();
        assert_eq!(pr.number, 42);
        assert!(pr.repo.is_none());

        let padded = parse_pr_ref("  7\n").unwrap();
        assert_eq!(padded.number, 7);
    }

    #[test]
    fn test_parse_valid_pr_url() {
        let pr = parse_pr_ref("https://github.com/org/repo/pull/42").unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.repo, Some(RepoCoordinates::new("org", "repo")));
    }

    #[test]
    fn test_parse_pr_url_with_trailing_segment() {
        for input in [
            "https://github.com/org/repo/pull/42/files",
            "https://github.com/org/repo/pull/42/commits/",
            "https://github.com/org/repo/pull/42#discussion_r1",
        ] {
            let pr = parse_pr_ref(input).unwrap();
            assert_eq!(pr.number, 42, "{input}");
            assert_eq!(pr.repo, Some(RepoCoordinates::new("org", "repo")));
        }
    }

    #[test]
    fn test_parse_rejects_non_github_host() {
        let result = parse_pr_ref("https://ghe.example.com/org/repo/pull/42");
        assert!(matches!(result, Err(PrError::InvalidReference(_))));
    }

    #[test]
    fn test_status_error_keeps_body() {
        let err = PrError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: r#"{"message":"Not Found"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"GitHub API returned 404 Not Found: {"message":"Not Found"}"#
        );
    }

    #[test]
    fn test_parse_invalid_references() {
        for input in ["", "abc", "0", "-3", "4.2", "https://example.com/org/repo/pull/1"] {
            assert!(
                matches!(parse_pr_ref(input), Err(PrError::InvalidReference(_))),
                "{input:?} should be rejected"
            );
        }
        assert!(parse_pr_ref("https://github.com/org/repo/pulls/42").is_err());
        assert!(parse_pr_ref("https://github.com/org/repo/pull/0").is_err());
    }

    #[test]
    fn test_prompt_pr_ref() {
        let mut out: Vec<u8> = Vec::new();
        let pr = prompt_pr_ref(Cursor::new("42\n"), &mut out).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(String::from_utf8(out).unwrap(), "PR number: ");
    }

    #[test]
    fn test_prompt_pr_ref_rejects_garbage() {
        let result = prompt_pr_ref(Cursor::new("forty-two\n"), Vec::<u8>::new());
        assert!(matches!(result, Err(PrError::InvalidReference(s)) if s == "forty-two"));
    }

    #[test]
    fn test_pull_url() {
        let client = GitHubClient::new("token", "https://ghe.example.com/api/v3/");
        let url = client.pull_url(&RepoCoordinates::new("org", "repo"), 42);
        assert_eq!(url, "https://ghe.example.com/api/v3/repos/org/repo/pulls/42");
    }
}
