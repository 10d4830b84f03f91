use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use tempfile::TempDir;

use review_harness::artifacts::ArtifactStore;
use review_harness::models::{ReviewDataset, ReviewRecord};

fn rvh_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("rvh");
    path
}

fn setup_test_env(extra: &str) -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let output_dir = root.join("results");

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[pipeline]
output_dir = "{}"

[filter]
stopwords_language = "none"
extra_stopwords = ["być", "i"]
{}
"#,
        output_dir.display(),
        extra
    );
    let config_path = config_dir.join("rvh.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, output_dir)
}

fn seed_dataset(output_dir: &Path) {
    let mut dataset = ReviewDataset::new("https://portal.test/hotele/");
    for text in [
        "Hotel było bardzo czyste i miłe. Obsługa była miła.",
        "Pokoje czyste, basen duży.",
    ] {
        dataset.records.push(ReviewRecord {
            entity_id: "alpha-h1".into(),
            text: text.into(),
            page: 1,
        });
    }
    ArtifactStore::new(output_dir).write_dataset(&dataset).unwrap();
}

fn run_rvh(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rvh_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rvh binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(rvh_binary()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["collect", "process", "stats"] {
        assert!(stdout.contains(cmd), "help is missing {cmd}");
    }
}

#[test]
fn test_process_without_dataset_fails() {
    let (_tmp, config, output_dir) = setup_test_env("");
    let (_, stderr, success) = run_rvh(&config, &["process"]);
    assert!(!success);
    assert!(stderr.contains("missing or empty"), "stderr: {stderr}");
    assert!(!output_dir.join("2_corpus.txt").exists());
}

#[test]
fn test_process_then_stats() {
    let (_tmp, config, output_dir) = setup_test_env("");
    seed_dataset(&output_dir);

    let (stdout, stderr, success) = run_rvh(&config, &["process"]);
    assert!(success, "stderr: {stderr}");
    assert!(stdout.contains("Total Words:"));
    assert!(stdout.contains("Unique Words:"));
    assert!(stdout.trim_end().ends_with("ok"));

    for file in [
        "2_corpus.txt",
        "3_tokenized.txt",
        "4_lemmatized.txt",
        "5_stemmed.txt",
        "6_filtered.txt",
        "7_frequency.json",
        "7_wordcloud.svg",
        "7_top_tokens.svg",
        "8_vectorized.json",
    ] {
        assert!(output_dir.join(file).is_file(), "missing {file}");
    }

    let (stdout, _, success) = run_rvh(&config, &["stats"]);
    assert!(success);
    assert!(stdout.contains("czysty"));
}

#[test]
fn test_process_stage_range() {
    let (_tmp, config, output_dir) = setup_test_env("");
    seed_dataset(&output_dir);

    let (stdout, stderr, success) = run_rvh(&config, &["process", "--to", "tokenize"]);
    assert!(success, "stderr: {stderr}");
    assert!(stdout.contains("tokens:"));
    assert!(output_dir.join("3_tokenized.txt").is_file());
    assert!(!output_dir.join("4_lemmatized.txt").exists());

    let (_, _, success) = run_rvh(&config, &["process", "--from", "bogus"]);
    assert!(!success);
}

#[test]
fn test_unsupported_language_fails_before_any_stage() {
    let (_tmp, config, output_dir) = setup_test_env("");
    let content = fs::read_to_string(&config).unwrap();
    fs::write(&config, content.replace("[pipeline]", "[pipeline]\nlanguage = \"xx\"")).unwrap();
    seed_dataset(&output_dir);

    let (_, stderr, success) = run_rvh(&config, &["process"]);
    assert!(!success);
    assert!(stderr.contains("xx"), "stderr: {stderr}");
    assert!(!output_dir.join("2_corpus.txt").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config, _) = setup_test_env("min_count = 0");
    let (_, stderr, success) = run_rvh(&config, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("min_count"), "stderr: {stderr}");
}

/// Serve canned pages on 127.0.0.1 from a background thread. Unknown paths
/// get 404; `(status, body)` pairs let a route fail with a server error.
fn serve_pages(routes: HashMap<String, (u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }
            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = routes
                .get(path)
                .cloned()
                .unwrap_or((404, "not found".to_string()));
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    format!("http://{}", addr)
}

fn review_html(texts: &[String], next: Option<String>) -> String {
    let items: String = texts
        .iter()
        .map(|t| format!(r#"<p class="opinion__attributes-content">{t}</p>"#))
        .collect();
    let pager = next
        .map(|href| {
            format!(r#"<ul><li class="pagination__item--next"><a href="{href}">next</a></li></ul>"#)
        })
        .unwrap_or_default();
    format!(r#"<html><body><div class="opinions__list">{items}</div>{pager}</body></html>"#)
}

#[test]
fn test_collect_partial_failure_exits_ok() {
    let mut routes = HashMap::new();
    routes.insert(
        "/hotele/".to_string(),
        (
            200,
            r#"<html><body><div class="swiper-wrapper">
                <a href="/wczasy/egipt/beta-2/">Beta</a>
                <a href="/wczasy/grecja/gamma-3/">Gamma</a>
            </div></body></html>"#
                .to_string(),
        ),
    );
    for n in 1..=5u32 {
        let path = if n == 1 {
            "/opinie/hotele/beta-h2/".to_string()
        } else {
            format!("/opinie/hotele/beta-h2/?p={n}")
        };
        let texts: Vec<String> = (0..20).map(|i| format!("beta opinia {n}-{i}")).collect();
        let next = (n < 5).then(|| format!("/opinie/hotele/beta-h2/?p={}", n + 1));
        routes.insert(path, (200, review_html(&texts, next)));
    }
    routes.insert(
        "/opinie/hotele/beta-h2/?p=3".to_string(),
        (503, "unavailable".to_string()),
    );
    routes.insert(
        "/opinie/hotele/gamma-h3/".to_string(),
        (200, review_html(&["gamma opinia".to_string()], None)),
    );
    let base = serve_pages(routes);

    let extra = format!(
        r#"
[collector]
listing_url = "{base}/hotele/"
reviews_base = "{base}/opinie/hotele/"
max_retries = 0
backoff_ms = 1
timeout_secs = 5
"#
    );
    let (_tmp, config, output_dir) = setup_test_env(&extra);

    let output = Command::new(rvh_binary())
        .arg("--config")
        .arg(&config)
        .args(["--progress", "off", "collect"])
        .env("NO_PROXY", "127.0.0.1")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stdout.contains("  entities: 2"), "stdout: {stdout}");
    assert!(stdout.contains("  reviews: 41"), "stdout: {stdout}");
    assert!(stdout.contains("  skipped: 1"), "stdout: {stdout}");
    assert!(stdout.contains("[transient_fetch]"), "stdout: {stdout}");
    assert!(stdout.trim_end().ends_with("ok"));
    assert!(stderr.contains("stopping pagination early"), "stderr: {stderr}");

    let dataset = ArtifactStore::new(&output_dir).read_dataset().unwrap();
    assert_eq!(dataset.len(), 41);
    assert_eq!(dataset.skips.len(), 1);
    assert_eq!(dataset.skips[0].page, Some(3));
}
