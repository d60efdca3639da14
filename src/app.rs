use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{Config, GITHUB_TOKEN_VAR, OPENAI_TOKEN_VAR};
use crate::describe::{DescriptionGenerator, GenerationError, GeneratorConfig};
use crate::llm::{CompletionClient, OpenAiClient};
use crate::pr::{diff, DiffSource, GitHubClient, PrError, RepoCoordinates};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{var} environment variable not set")]
    MissingCredential { var: &'static str },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] PrError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl AppError {
    /// Prefix printed in front of the error on stdout.
    pub fn context(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "Error fetching PR diff",
            AppError::Generation(_) => "Error generating PR description",
        }
    }
}

/// The two authenticated API handles a run needs.
pub struct Clients {
    pub github: GitHubClient,
    pub generator: DescriptionGenerator<OpenAiClient>,
}

/// Build both clients from `config`.
///
/// The GitHub token is checked before the OpenAI token, so with neither set
/// the error names `GITHUB_TOKEN`.
pub fn setup_clients(config: &Config) -> Result<Clients, SetupError> {
    if config.github_token.is_empty() {
        return Err(SetupError::MissingCredential {
            var: GITHUB_TOKEN_VAR,
        });
    }
    if config.openai_token.is_empty() {
        return Err(SetupError::MissingCredential {
            var: OPENAI_TOKEN_VAR,
        });
    }

    let settings = &config.settings;
    let github = GitHubClient::new(&config.github_token, &settings.github.api_url);
    let openai = OpenAiClient::new(&config.openai_token, &settings.openai.api_url);
    Ok(Clients {
        github,
        generator: DescriptionGenerator::new(openai, GeneratorConfig::from_settings(settings)),
    })
}

/// One describe run: which PR, and what to do if its diff can't be fetched.
#[derive(Debug, Clone)]
pub struct DescribeRequest {
    pub repo: RepoCoordinates,
    pub number: u64,
    /// Continue with an empty diff instead of aborting when the fetch fails
    pub allow_empty_diff: bool,
}

/// Fetch the PR diff, then generate its description.
#[instrument(skip_all, fields(repo = %request.repo, pr = request.number))]
pub async fn run<D, C>(
    request: &DescribeRequest,
    diff_source: &D,
    generator: &DescriptionGenerator<C>,
) -> Result<String, AppError>
where
    D: DiffSource + ?Sized,
    C: CompletionClient,
{
    info!("fetching pull request diff");
    let diff_text = match diff_source.fetch_diff(&request.repo, request.number).await {
        Ok(text) => text,
        Err(err) if request.allow_empty_diff => {
            warn!(error = %err, "diff fetch failed, continuing with an empty diff");
            String::new()
        }
        Err(err) => return Err(err.into()),
    };

    let stats = diff::summarize(&diff_text);
    info!(
        files = stats.files,
        additions = stats.additions,
        deletions = stats.deletions,
        new_files = stats.new_files,
        deleted_files = stats.deleted_files,
        "fetched diff"
    );

    info!("generating description");
    let description = generator.generate(&diff_text).await?;
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvSource, Settings, OWNER_VAR, REPO_VAR};
    use crate::describe::tests::FakeCompletion;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeDiff {
        diff: Option<String>,
        calls: Mutex<Vec<(RepoCoordinates, u64)>>,
    }

    impl FakeDiff {
        fn returning(diff: &str) -> Self {
            Self {
                diff: Some(diff.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                diff: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DiffSource for FakeDiff {
        async fn fetch_diff(&self, repo: &RepoCoordinates, number: u64) -> Result<String, PrError> {
            self.calls.lock().unwrap().push((repo.clone(), number));
            self.diff
                .clone()
                .ok_or_else(|| PrError::InvalidReference("not found".to_string()))
        }
    }

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        Config::from_env(&EnvSource::from_pairs(pairs.iter().copied()), Settings::default())
    }

    fn request(number: u64, allow_empty_diff: bool) -> DescribeRequest {
        DescribeRequest {
            repo: RepoCoordinates::new("org", "repo"),
            number,
            allow_empty_diff,
        }
    }

    #[test]
    fn test_setup_without_tokens_names_github_first() {
        let err = setup_clients(&config_with(&[])).err().unwrap();
        assert!(matches!(
            err,
            SetupError::MissingCredential { var: "GITHUB_TOKEN" }
        ));
        assert_eq!(err.to_string(), "GITHUB_TOKEN environment variable not set");
    }

    #[test]
    fn test_setup_without_openai_token() {
        let config = config_with(&[(GITHUB_TOKEN_VAR, "gh")]);
        let err = setup_clients(&config).err().unwrap();
        assert!(matches!(
            err,
            SetupError::MissingCredential { var: "OPENAI_TOKEN" }
        ));
    }

    #[test]
    fn test_setup_with_empty_token_fails() {
        let config = config_with(&[(GITHUB_TOKEN_VAR, ""), (OPENAI_TOKEN_VAR, "oa")]);
        assert!(setup_clients(&config).is_err());
    }

    #[test]
    fn test_setup_does_not_validate_repo() {
        let config = config_with(&[(GITHUB_TOKEN_VAR, "gh"), (OPENAI_TOKEN_VAR, "oa")]);
        assert!(config.owner.is_empty());
        assert!(setup_clients(&config).is_ok());

        let full = config_with(&[
            (GITHUB_TOKEN_VAR, "gh"),
            (OPENAI_TOKEN_VAR, "oa"),
            (OWNER_VAR, "org"),
            (REPO_VAR, "repo"),
        ]);
        assert!(setup_clients(&full).is_ok());
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let source = FakeDiff::returning("diff --git a/x b/x\n+foo");
        let generator = DescriptionGenerator::new(
            FakeCompletion::replying(&["## Summary\nAdds foo."]),
            GeneratorConfig::default(),
        );

        let description = run(&request(42, false), &source, &generator).await.unwrap();
        assert_eq!(description, "## Summary\nAdds foo.");

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(RepoCoordinates::new("org", "repo"), 42)]);

        let requests = generator.client().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[0]
            .content
            .contains("diff --git a/x b/x\n+foo"));
    }

    #[tokio::test]
    async fn test_run_fetch_error_aborts_by_default() {
        let source = FakeDiff::failing();
        let generator =
            DescriptionGenerator::new(FakeCompletion::replying(&["x"]), GeneratorConfig::default());

        let err = run(&request(1, false), &source, &generator).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
        assert_eq!(err.context(), "Error fetching PR diff");
        assert_eq!(generator.client().request_count(), 0);
    }

    #[tokio::test]
    async fn test_run_fetch_error_with_empty_diff_allowed() {
        let source = FakeDiff::failing();
        let generator = DescriptionGenerator::new(
            FakeCompletion::replying(&["No changes."]),
            GeneratorConfig::default(),
        );

        let description = run(&request(1, true), &source, &generator).await.unwrap();
        assert_eq!(description, "No changes.");
        assert_eq!(generator.client().request_count(), 1);
    }

    #[tokio::test]
    async fn test_run_generation_error() {
        let source = FakeDiff::returning("+foo");
        let generator = DescriptionGenerator::new(FakeCompletion::replying(&[]), GeneratorConfig::default());

        let err = run(&request(1, false), &source, &generator).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(GenerationError::NoChoices)));
        assert_eq!(err.context(), "Error generating PR description");
    }
}
