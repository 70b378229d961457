use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::stats::hosting::{Client, RetryPolicy};
use crate::stats::{Database, GitHubFetcher, JobReport, JobRunner, PackageOutcome};
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::app_err;
use owo_colors::OwoColorize;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Only update the package with this handle
    #[arg(value_name = "HANDLE")]
    pub handle: Option<String>,

    /// Path to configuration file (default is `issue-stats.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// SQLite database to use instead of the one named in the configuration
    #[arg(long, value_name = "PATH")]
    pub database: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Exit with status code 1 if any package failed to update
    #[arg(long)]
    pub error_if_failed: bool,
}

pub async fn update_stats<H: Host>(host: &mut H, args: &UpdateArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(args.config.as_deref())?;
    let database_path = args.database.as_ref().unwrap_or(&config.database);
    let database = Database::open(database_path)?;

    let client = Client::new(&config.api_base_url, config.request_timeout, RetryPolicy::default())?;
    let fetcher = GitHubFetcher::new(client, config.page_size, config.max_pages, config.max_rate_limit_wait);

    let report = JobRunner::new(&database, &database, &fetcher, &database)
        .with_supported_host(&config.supported_host)
        .with_credential_provider(&config.credential_provider)
        .run(args.handle.as_deref())
        .await?;

    print_report(host, &report, args.color.use_colors_on_stdout(), args.color.use_colors_on_stderr());

    if report.has_failures() && (config.fail_on_error || args.error_if_failed) {
        host.exit(1);
        return Err(app_err!("{} package(s) could not be updated", report.failed().count()));
    }

    Ok(())
}

fn print_report<H: Host>(host: &mut H, report: &JobReport, output_colors: bool, error_colors: bool) {
    for (package, outcome) in report.entries() {
        match outcome {
            PackageOutcome::Updated => {
                let line = format!("- Updated {package}");
                let _ = writeln!(host.output(), "{}", if output_colors { line.green().to_string() } else { line });
            }
            PackageOutcome::Skipped(reason) => {
                let line = format!("- Skipping {package} ({reason})");
                let _ = writeln!(host.output(), "{}", if output_colors { line.bright_black().to_string() } else { line });
            }
            PackageOutcome::Failed(e) => {
                let line = format!("- Error updating {package}: {e:#}");
                let _ = writeln!(host.error(), "{}", if error_colors { line.red().to_string() } else { line });
            }
        }
    }

    let _ = writeln!(
        host.output(),
        "\nUpdated {} package(s), skipped {}, failed {}",
        report.updated().count(),
        report.skipped().count(),
        report.failed().count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::stats::{Package, SkipReason};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_config(dir: &std::path::Path, api_base_url: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.join("issue-stats.toml")).unwrap();
        std::fs::write(&path, format!("api_base_url = \"{api_base_url}\"\nrequest_timeout = \"5s\"\n")).unwrap();
        path
    }

    fn args(config: Utf8PathBuf, database: Utf8PathBuf) -> UpdateArgs {
        UpdateArgs {
            handle: None,
            config: Some(config),
            database: Some(database),
            color: ColorMode::Never,
            log_level: LogLevel::None,
            error_if_failed: false,
        }
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_skipped_packages_are_listed() {
        let tmp = tempfile::tempdir().unwrap();
        let config = write_config(tmp.path(), "http://127.0.0.1:9");
        let db_path = Utf8PathBuf::try_from(tmp.path().join("stats.db")).unwrap();

        {
            let db = Database::open(&db_path).unwrap();
            db.insert_package(&Package {
                id: 1,
                handle: "acme/widget".to_string(),
                name: "Widget".to_string(),
                repository: Some("https://gitlab.com/acme/widget".to_string()),
                developer_id: 7,
            })
            .unwrap();
            db.insert_package(&Package {
                id: 2,
                handle: "acme/gadget".to_string(),
                name: "Gadget".to_string(),
                repository: Some("https://github.com/acme/gadget".to_string()),
                developer_id: 8,
            })
            .unwrap();
        }

        let mut host = TestHost::new();
        update_stats(&mut host, &args(config, db_path)).await.unwrap();

        let output = host.output_text();
        assert!(output.contains("- Skipping Widget (unsupported repository 'https://gitlab.com/acme/widget')"));
        assert!(output.contains("- Skipping Gadget (no provider credentials for the developer)"));
        assert!(output.contains("Updated 0 package(s), skipped 2, failed 0"));
        assert!(host.error_buf.is_empty());
        assert_eq!(host.exit_code, None);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_failures_exit_only_when_requested() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/issues"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"Bad credentials"}"#))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = write_config(tmp.path(), &server.uri());
        let db_path = Utf8PathBuf::try_from(tmp.path().join("stats.db")).unwrap();

        {
            let db = Database::open(&db_path).unwrap();
            db.insert_package(&Package {
                id: 1,
                handle: "acme/widget".to_string(),
                name: "Widget".to_string(),
                repository: Some("https://github.com/acme/widget".to_string()),
                developer_id: 7,
            })
            .unwrap();
            db.insert_token("github", 7, "secret").unwrap();
        }

        let mut host = TestHost::new();
        update_stats(&mut host, &args(config.clone(), db_path.clone())).await.unwrap();
        assert!(host.error_text().contains("- Error updating Widget"));
        assert_eq!(host.exit_code, None);

        let mut host = TestHost::new();
        let mut strict = args(config, db_path);
        strict.error_if_failed = true;
        assert!(update_stats(&mut host, &strict).await.is_err());
        assert_eq!(host.exit_code, Some(1));
    }

    fn package(id: i64, name: &str) -> Package {
        Package {
            id,
            handle: format!("acme/{}", name.to_lowercase()),
            name: name.to_string(),
            repository: None,
            developer_id: 1,
        }
    }

    #[test]
    fn test_error_lines_follow_the_error_stream_color() {
        let mut report = JobReport::default();
        report.record(package(1, "Widget"), PackageOutcome::Updated);
        report.record(package(2, "Legacy"), PackageOutcome::Skipped(SkipReason::InvalidRepository(None)));
        report.record(package(3, "Gadget"), PackageOutcome::Failed(app_err!("Bad credentials")));

        let mut host = TestHost::new();
        print_report(&mut host, &report, false, true);
        assert!(!host.output_text().contains('\u{1b}'));
        assert!(host.output_text().contains("- Updated Widget\n"));
        assert!(host.error_text().contains('\u{1b}'));
        assert!(host.error_text().contains("- Error updating Gadget"));

        let mut host = TestHost::new();
        print_report(&mut host, &report, true, false);
        assert!(host.output_text().contains('\u{1b}'));
        assert!(!host.error_text().contains('\u{1b}'));
        assert!(host.error_text().starts_with("- Error updating Gadget: "));
    }
}
