//! Integration tests for the `update` command.
//!
//! These run the whole command through `issue_stats_lib::run` against a SQLite
//! database in a temporary directory and a wiremock stand-in for the GitHub API.

use camino::Utf8PathBuf;
use chrono::{Duration, SecondsFormat, Utc};
use issue_stats_lib::Host;
use issue_stats_lib::stats::{Database, Package, SnapshotStore, Window};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
    exit_code: Option<i32>,
}

impl TestHost {
    const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
            exit_code: None,
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl std::io::Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

struct Workspace {
    _dir: TempDir,
    config: Utf8PathBuf,
    database: Utf8PathBuf,
}

impl Workspace {
    fn new(server: &MockServer, extra_config: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("UTF-8 temp dir");

        let config = root.join("issue-stats.toml");
        std::fs::write(
            &config,
            format!("api_base_url = \"{}\"\nrequest_timeout = \"5s\"\n{extra_config}", server.uri()),
        )
        .expect("write config");

        let database = root.join("issue-stats.db");
        let db = Database::open(&database).expect("open database");
        db.insert_package(&Package {
            id: 1,
            handle: "acme/widget".to_string(),
            name: "Widget".to_string(),
            repository: Some("https://github.com/acme/widget.git".to_string()),
            developer_id: 100,
        })
        .expect("insert widget");
        db.insert_package(&Package {
            id: 2,
            handle: "acme/gadget".to_string(),
            name: "Gadget".to_string(),
            repository: Some("https://github.com/acme/gadget".to_string()),
            developer_id: 200,
        })
        .expect("insert gadget");
        db.insert_package(&Package {
            id: 3,
            handle: "acme/legacy".to_string(),
            name: "Legacy".to_string(),
            repository: Some("https://bitbucket.org/acme/legacy".to_string()),
            developer_id: 100,
        })
        .expect("insert legacy");
        db.insert_token("GitHub", 100, "widget-token").expect("insert token");
        db.insert_token("GitHub", 200, "gadget-token").expect("insert token");

        Self { _dir: dir, config, database }
    }

    async fn run(&self, host: &mut TestHost, extra_args: &[&str]) -> issue_stats_lib::Result<()> {
        let mut args = vec![
            "issue-stats",
            "update",
            "--config",
            self.config.as_str(),
            "--database",
            self.database.as_str(),
            "--color",
            "never",
        ];
        args.extend_from_slice(extra_args);
        issue_stats_lib::run(host, args).await
    }
}

fn hours_ago(hours: i64) -> String {
    (Utc::now() - Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn mount_widget_activity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"state": "open", "updated_at": hours_ago(2)},
            {"state": "closed", "updated_at": hours_ago(5 * 24)},
            {"state": "open", "updated_at": hours_ago(2 * 24), "pull_request": {"merged_at": null}},
            {"state": "closed", "updated_at": hours_ago(20 * 24), "pull_request": {"merged_at": hours_ago(20 * 24)}},
            {"state": "closed", "updated_at": hours_ago(3), "pull_request": {"merged_at": null}}
        ])))
        .mount(server)
        .await;
}

async fn mount_gadget_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/gadget/issues"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_update_writes_snapshots_and_isolates_failures() {
    let server = MockServer::start().await;
    mount_widget_activity(&server).await;
    mount_gadget_failure(&server).await;

    let workspace = Workspace::new(&server, "");
    let mut host = TestHost::new();
    let result = workspace.run(&mut host, &[]).await;
    assert!(result.is_ok(), "update command failed: {result:?}");
    assert_eq!(host.exit_code, None);

    let output = host.output_str();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "- Updated Widget", "{output}");
    assert_eq!(
        lines[1],
        "- Skipping Legacy (unsupported repository 'https://bitbucket.org/acme/legacy')",
        "{output}"
    );
    assert_eq!(lines.last(), Some(&"Updated 1 package(s), skipped 1, failed 1"), "{output}");
    assert!(!output.contains("Gadget"), "{output}");

    let errors = host.error_str();
    assert!(errors.starts_with("- Error updating Gadget"), "{errors}");
    assert!(!errors.contains("Widget"), "{errors}");

    let db = Database::open(&workspace.database).expect("reopen database");
    let snapshots = db.load(1).expect("load widget snapshots");
    assert_eq!(snapshots.len(), 4);

    let counts = |window: Window| {
        let snapshot = snapshots.iter().find(|s| s.window == window).expect("snapshot for window");
        let c = snapshot.counts;
        (c.open_issues, c.closed_issues, c.open_pulls, c.merged_pulls)
    };
    assert_eq!(counts(Window::Days30), (1, 1, 1, 1));
    assert_eq!(counts(Window::Days7), (1, 1, 1, 0));
    assert_eq!(counts(Window::Days3), (1, 0, 1, 0));
    assert_eq!(counts(Window::Days1), (1, 0, 0, 0));

    assert!(db.load(2).expect("load gadget snapshots").is_empty());
    assert!(db.load(3).expect("load legacy snapshots").is_empty());
}

#[tokio::test]
async fn test_rerun_replaces_rows() {
    let server = MockServer::start().await;
    mount_widget_activity(&server).await;
    mount_gadget_failure(&server).await;

    let workspace = Workspace::new(&server, "");

    let mut host = TestHost::new();
    workspace.run(&mut host, &["acme/widget"]).await.expect("first run");
    let first = Database::open(&workspace.database).expect("reopen").load(1).expect("load");

    let mut host = TestHost::new();
    workspace.run(&mut host, &["acme/widget"]).await.expect("second run");
    let second = Database::open(&workspace.database).expect("reopen").load(1).expect("load");

    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 4);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.window, b.window);
        assert_eq!(a.counts, b.counts);
        assert!(b.computed_at >= a.computed_at);
    }

    let output = host.output_str();
    assert!(output.contains("- Updated Widget"), "{output}");
    assert!(output.contains("Updated 1 package(s), skipped 0, failed 0"), "{output}");
    assert!(!output.contains("Gadget"), "{output}");
}

#[tokio::test]
async fn test_fail_on_error_from_config() {
    let server = MockServer::start().await;
    mount_widget_activity(&server).await;
    mount_gadget_failure(&server).await;

    let workspace = Workspace::new(&server, "fail_on_error = true\n");
    let mut host = TestHost::new();
    let result = workspace.run(&mut host, &[]).await;

    assert!(result.is_err());
    assert_eq!(host.exit_code, Some(1));

    // The failure of one package still leaves the others updated
    let db = Database::open(&workspace.database).expect("reopen database");
    assert_eq!(db.load(1).expect("load").len(), 4);
}

#[tokio::test]
async fn test_unknown_handle_updates_nothing() {
    let server = MockServer::start().await;
    let workspace = Workspace::new(&server, "");

    let mut host = TestHost::new();
    workspace.run(&mut host, &["acme/unknown"]).await.expect("run");

    assert!(host.output_str().contains("Updated 0 package(s), skipped 0, failed 0"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_init_then_update_with_generated_config() {
    let server = MockServer::start().await;
    let workspace = Workspace::new(&server, "");
    let generated = workspace.config.with_file_name("generated.toml");

    let mut host = TestHost::new();
    issue_stats_lib::run(&mut host, ["issue-stats", "init", generated.as_str()])
        .await
        .expect("init");
    assert!(host.output_str().contains("generated.toml"));

    let text = std::fs::read_to_string(&generated).expect("read generated config");
    assert!(text.contains("page_size = 100"));
}
