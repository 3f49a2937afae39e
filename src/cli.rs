//! CLI orchestration for the quality analyzer.
//!
//! Exactly one input selector is accepted per invocation. Every input unit
//! (diff file, repository dump, PR record, fetched PR) yields one
//! `AnalysisResult`; per-unit failures are embedded into the output JSON so
//! that one bad unit never aborts its siblings. Only missing configuration
//! or a failed GitHub fetch aborts the whole run with a non-zero exit.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use tracing::{error, info, warn};

use ai_llm_service::{YandexGptConfig, YandexGptService};
use git_context_engine::{DEFAULT_GITHUB_API, GitHubClient, PrSearchQuery, PullRequestExport};
use mr_analyzer::{AnalysisResult, MergeRequestAnalyzer, PrFile, PullRequestRecord};

/// Analyze pull-request / merge-request data for quality.
#[derive(Debug, Parser)]
#[command(name = "mr-quality-ai", version)]
#[command(about = "Analyze pull request data for quality.", long_about = None)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["diff", "repo", "input_json", "github_user"])
))]
pub struct Cli {
    /// File containing raw git diff content. Single analysis performed.
    #[arg(long)]
    diff: Option<PathBuf>,

    /// Repository dump file (`FILE:` sections between `=` delimiter lines).
    /// Single analysis performed.
    #[arg(long)]
    repo: Option<PathBuf>,

    /// JSON file containing a list of PR records. One analysis per record.
    #[arg(long = "input_json")]
    input_json: Option<PathBuf>,

    /// Fetch closed PRs authored by this GitHub user. One analysis per PR.
    #[arg(long = "github_user")]
    github_user: Option<String>,

    /// GitHub repository name (e.g. `owner/repo`). Required with `--github_user`.
    #[arg(long = "github_repo", requires = "github_user")]
    github_repo: Option<String>,

    /// Start date (YYYY-MM-DD) for the GitHub fetch window.
    #[arg(long = "start_date", requires = "github_user")]
    start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD) for the GitHub fetch window.
    #[arg(long = "end_date", requires = "github_user")]
    end_date: Option<NaiveDate>,

    /// Output file for analysis results (JSON format, default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Parses arguments, wires the services and runs the selected mode.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Completion credentials are required for every mode; fail fast and
    // report the whole missing-variable list at once.
    let llm_cfg = YandexGptConfig::from_env().inspect_err(|e| error!("{e}"))?;
    let service = Arc::new(YandexGptService::new(llm_cfg)?);
    let analyzer = MergeRequestAnalyzer::new(service);

    let results: Vec<AnalysisResult> = if let Some(user) = &cli.github_user {
        run_github_fetch_and_analyze(&analyzer, &cli, user).await?
    } else if let Some(path) = &cli.input_json {
        analyze_pr_records_file(&analyzer, path).await
    } else if let Some(path) = &cli.diff {
        vec![analyze_diff_file(&analyzer, path).await]
    } else if let Some(path) = &cli.repo {
        vec![analyze_dump_file(&analyzer, path).await]
    } else {
        unreachable!("clap enforces exactly one input selector")
    };

    if results.iter().any(|r| r.error.is_some()) {
        warn!("analysis completed, but one or more items encountered errors (see output JSON)");
    } else {
        info!("analysis completed successfully");
    }

    write_results(&results, cli.output.as_deref())
}

/// Reads a raw diff file and analyzes it as a single unit.
async fn analyze_diff_file(analyzer: &MergeRequestAnalyzer, path: &Path) -> AnalysisResult {
    info!("analyzing diff file: {}", path.display());
    match std::fs::read_to_string(path) {
        Ok(diff_content) => analyzer.analyze_code_changes(&diff_content).await,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            error!("input diff file '{}' not found", path.display());
            AnalysisResult::from_error(format!("File not found: {}", path.display()))
        }
        Err(err) => {
            error!("error reading diff file '{}': {err}", path.display());
            AnalysisResult::from_error(format!(
                "Error reading diff file '{}': {err}",
                path.display()
            ))
        }
    }
}

/// Parses a repository dump file and analyzes its synthesized diff.
async fn analyze_dump_file(analyzer: &MergeRequestAnalyzer, path: &Path) -> AnalysisResult {
    info!("analyzing repository file: {}", path.display());
    match analyzer.analyze_repository_dump(path).await {
        Ok(result) => result,
        Err(err) => {
            error!("error processing repository file '{}': {err}", path.display());
            AnalysisResult::from_error(err.to_string())
        }
    }
}

/// Loads a JSON array of PR records and analyzes each record sequentially.
async fn analyze_pr_records_file(analyzer: &MergeRequestAnalyzer, path: &Path) -> Vec<AnalysisResult> {
    info!("analyzing PR data from JSON file: {}", path.display());

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            error!("input JSON file '{}' not found", path.display());
            return vec![AnalysisResult::from_error(format!(
                "File not found: {}",
                path.display()
            ))];
        }
        Err(err) => {
            error!("error reading JSON file '{}': {err}", path.display());
            return vec![AnalysisResult::from_error(format!(
                "Error reading JSON file '{}': {err}",
                path.display()
            ))];
        }
    };

    let records: Vec<PullRequestRecord> = match serde_json::from_str(&text) {
        Ok(records) => records,
        Err(err) => {
            error!("'{}' is not a valid JSON list of PR records: {err}", path.display());
            return vec![AnalysisResult::from_error(format!(
                "Invalid JSON in file: {}",
                path.display()
            ))];
        }
    };

    info!("analyzing {} pull requests from JSON file", records.len());
    let mut results = Vec::with_capacity(records.len());
    for record in &records {
        results.push(analyzer.analyze_pull_request(record).await);
    }
    results
}

/// Fetches closed PRs from GitHub and analyzes each one sequentially.
///
/// A fetch or setup failure aborts the run; per-PR analysis errors are
/// embedded into the corresponding result instead.
async fn run_github_fetch_and_analyze(
    analyzer: &MergeRequestAnalyzer,
    cli: &Cli,
    user: &str,
) -> Result<Vec<AnalysisResult>, Box<dyn Error>> {
    let (Some(repo), Some(start), Some(end)) =
        (cli.github_repo.as_ref(), cli.start_date, cli.end_date)
    else {
        return Err(
            "--start_date, --end_date, and --github_repo are required when using --github_user"
                .into(),
        );
    };

    let token = std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or("GITHUB_TOKEN environment variable is missing")?;
    let base_api =
        std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_GITHUB_API.to_string());

    let client = GitHubClient::from_token(base_api, token)?;
    let query = PrSearchQuery {
        repo: repo.clone(),
        author: user.to_string(),
        closed_from: start,
        closed_to: end,
    };

    info!("fetching PR data for user '{}' in repo '{}'", user, query.repo);
    let exports = client.export_pr_data(&query).await?;
    info!("fetched {} pull requests from GitHub", exports.len());

    let mut results = Vec::with_capacity(exports.len());
    for export in exports {
        let record = to_record(export);
        results.push(analyzer.analyze_pull_request(&record).await);
    }
    Ok(results)
}

/// Maps an exported PR from the provider crate into an analyzer record.
fn to_record(export: PullRequestExport) -> PullRequestRecord {
    PullRequestRecord {
        title: export.title,
        description: export.description,
        files: export
            .files
            .into_iter()
            .map(|f| PrFile {
                filename: f.filename,
                patch: f.patch,
            })
            .collect(),
        commit_messages: export.commits_messages,
        comments: export.comments,
        url: export.url,
    }
}

/// Serializes results as a pretty JSON array to the output file or stdout.
fn write_results(results: &[AnalysisResult], output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(results)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("analysis results saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
