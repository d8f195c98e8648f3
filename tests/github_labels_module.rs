use actionkit::config::ConfigError;
use actionkit::github::labels::{
    default_labels, load_labels, sync_labels, LabelSyncAction, LabelSyncOutcome,
};
use actionkit::github::{GithubClient, GithubError, IssueTracker, Label, LabelAdmin, Repository};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::tempdir;

#[derive(Default)]
struct FakeAdmin {
    labels: Mutex<BTreeMap<String, Label>>,
    writes: Mutex<Vec<String>>,
}

impl FakeAdmin {
    fn with_existing(names: &[&str]) -> Self {
        let admin = Self::default();
        for name in names {
            admin.labels.lock().expect("lock").insert(
                name.to_string(),
                Label {
                    name: name.to_string(),
                    color: "000000".to_string(),
                    description: None,
                },
            );
        }
        admin
    }
}

impl LabelAdmin for FakeAdmin {
    fn get_label(&self, name: &str) -> Result<Option<Label>, GithubError> {
        Ok(self.labels.lock().expect("lock").get(name).cloned())
    }

    fn create_label(&self, label: &Label) -> Result<(), GithubError> {
        self.writes
            .lock()
            .expect("lock")
            .push(format!("create {}", label.name));
        self.labels
            .lock()
            .expect("lock")
            .insert(label.name.clone(), label.clone());
        Ok(())
    }

    fn update_label(&self, label: &Label) -> Result<(), GithubError> {
        self.writes
            .lock()
            .expect("lock")
            .push(format!("update {}", label.name));
        self.labels
            .lock()
            .expect("lock")
            .insert(label.name.clone(), label.clone());
        Ok(())
    }
}

#[test]
fn default_label_set_matches_guidance_values() {
    let labels = default_labels();
    let summary: Vec<(&str, &str)> = labels
        .iter()
        .map(|l| (l.name.as_str(), l.color.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("semver-guidance:major", "DE1C95"),
            ("semver-guidance:minor", "A3B4DB"),
            ("semver-guidance:patch", "E4B02D"),
            ("semver-guidance:no-bump", "5319e7"),
        ]
    );
    assert_eq!(labels[0].description.as_deref(), Some("The 'x' in x.y.z"));
}

#[test]
fn sync_creates_missing_and_updates_existing() {
    let admin = FakeAdmin::with_existing(&["semver-guidance:minor"]);
    let outcomes = sync_labels(&admin, &default_labels(), true).expect("sync");
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[0].action, LabelSyncAction::Created);
    assert_eq!(outcomes[1].action, LabelSyncAction::Updated);
    assert_eq!(outcomes[1].to_string(), "Updated label semver-guidance:minor");

    let stored = admin.get_label("semver-guidance:minor").expect("get").expect("exists");
    assert_eq!(stored.color, "A3B4DB");
}

#[test]
fn no_recreate_keeps_existing_labels() {
    let admin = FakeAdmin::with_existing(&["semver-guidance:major"]);
    let outcomes = sync_labels(&admin, &default_labels(), false).expect("sync");
    assert_eq!(
        outcomes[0],
        LabelSyncOutcome {
            name: "semver-guidance:major".to_string(),
            action: LabelSyncAction::Kept,
        }
    );
    let writes = admin.writes.lock().expect("lock").clone();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|w| w.starts_with("create ")));
}

#[test]
fn label_file_is_parsed_and_validated() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("labels.yaml");
    fs::write(
        &path,
        "- name: semver-guidance:prerelease\n  color: '0E8A16'\n  description: Pre-release bump\n",
    )
    .expect("write labels");
    let labels = load_labels(&path).expect("load");
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "semver-guidance:prerelease");

    fs::write(&path, "- name: bad\n  color: '#12345'\n").expect("write labels");
    let err = load_labels(&path).expect_err("bad color");
    assert!(matches!(err, ConfigError::InvalidLabel { ref label, .. } if label == "bad"));
}

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    auth_header: String,
    body: String,
}

struct MockGithubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockGithubServer {
    fn start<F>(expected_requests: usize, responder: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_for_thread = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for _ in 0..expected_requests {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

                let mut request_line = String::new();
                reader
                    .read_line(&mut request_line)
                    .expect("read request line");
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or("GET").to_string();
                let path = parts.next().unwrap_or("/").to_string();

                let mut auth_header = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).expect("read header");
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    let lower = line.to_ascii_lowercase();
                    if lower.starts_with("authorization:") {
                        auth_header = line
                            .split_once(':')
                            .map(|(_, v)| v.trim().to_string())
                            .unwrap_or_default();
                    }
                    if lower.starts_with("content-length:") {
                        content_length = line
                            .split_once(':')
                            .map(|(_, v)| v.trim().parse::<usize>().unwrap_or(0))
                            .unwrap_or(0);
                    }
                }

                let mut body = vec![0_u8; content_length];
                if content_length > 0 {
                    reader.read_exact(&mut body).expect("read body");
                }
                let body = String::from_utf8_lossy(&body).to_string();

                let (status, response_body) = responder(&method, &path);
                requests_for_thread
                    .lock()
                    .expect("lock requests")
                    .push(RecordedRequest {
                        method,
                        path,
                        auth_header,
                        body,
                    });

                let reason = if status < 300 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response_body.len(),
                    response_body
                );
                stream
                    .write_all(response.as_bytes())
                    .expect("write response");
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            handle: Some(handle),
        }
    }

    fn finish(mut self) -> Vec<RecordedRequest> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("join mock server");
        }
        self.requests.lock().expect("lock requests").clone()
    }
}

fn client(server: &MockGithubServer) -> GithubClient {
    GithubClient::new(
        server.base_url.clone(),
        Some("ghp_test".to_string()),
        Repository::parse("octo/widgets").expect("repository"),
    )
}

#[test]
fn client_syncs_labels_through_rest_api() {
    let server = MockGithubServer::start(4, |method, path| match (method, path) {
        ("GET", "/repos/octo/widgets/labels/semver-guidance%3Amajor") => {
            (404, r#"{"message":"Not Found"}"#.to_string())
        }
        ("POST", "/repos/octo/widgets/labels") => (201, "{}".to_string()),
        ("GET", "/repos/octo/widgets/labels/semver-guidance%3Aminor") => (
            200,
            r#"{"name":"semver-guidance:minor","color":"ffffff","description":null}"#.to_string(),
        ),
        ("PATCH", "/repos/octo/widgets/labels/semver-guidance%3Aminor") => {
            (200, "{}".to_string())
        }
        _ => (500, "{}".to_string()),
    });

    let labels = default_labels()[..2].to_vec();
    let outcomes = sync_labels(&client(&server), &labels, true).expect("sync");
    assert_eq!(outcomes[0].action, LabelSyncAction::Created);
    assert_eq!(outcomes[1].action, LabelSyncAction::Updated);

    let requests = server.finish();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.auth_header == "Bearer ghp_test"));
    let created: Value = serde_json::from_str(&requests[1].body).expect("create body");
    assert_eq!(created["name"], "semver-guidance:major");
    assert_eq!(created["color"], "DE1C95");
    assert_eq!(requests[3].method, "PATCH");
}

#[test]
fn client_reads_pull_request_labels() {
    let server = MockGithubServer::start(1, |_, _| {
        (
            200,
            r#"{"number":9,"labels":[{"name":"semver-guidance:patch","color":"E4B02D"},{"name":"docs"}]}"#
                .to_string(),
        )
    });
    let labels = client(&server).pull_request_labels(9).expect("labels");
    assert_eq!(labels, vec!["semver-guidance:patch", "docs"]);
    let requests = server.finish();
    assert_eq!(requests[0].path, "/repos/octo/widgets/pulls/9");
}

#[test]
fn repository_names_must_be_owner_slash_name() {
    assert!(Repository::parse("octo/widgets").is_ok());
    assert!(matches!(
        Repository::parse("widgets"),
        Err(GithubError::InvalidRepository(_))
    ));
    assert!(Repository::parse("a/b/c").is_err());
}
