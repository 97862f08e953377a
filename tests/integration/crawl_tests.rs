//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Lodestone directory and run
//! the full crawl cycle end-to-end into a temporary CSV file.

use linkshell_harvest::config::Config;
use linkshell_harvest::crawler::crawl;
use linkshell_harvest::HarvestError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/lodestone/linkshell/";

/// Creates a test configuration pointing at the mock directory
fn create_test_config(base_url: &str, csv_path: &Path, single_shot: bool) -> Config {
    let mut config = Config::default();
    config.directory.base_url = base_url.to_string();
    config.crawler.spread_window_ms = 20; // Keep a little jitter, but short
    config.crawler.min_delay_ms = 0;
    config.crawler.single_shot = single_shot;
    config.output.csv_path = csv_path.display().to_string();
    config
}

fn search_page(groups: &[(&str, &str, u32)], pager: Option<&str>) -> String {
    let entries: String = groups
        .iter()
        .map(|(href, name, count)| {
            format!(
                r#"<div class="entry">
                    <a href="{}" class="entry__link">
                        <div class="entry__linkshell__name"><p class="entry__name">{}</p></div>
                        <div class="entry__linkshell__member"><span>{}</span></div>
                    </a>
                </div>"#,
                href, name, count
            )
        })
        .collect();
    let pager = pager
        .map(|p| format!(r#"<ul class="btn__pager"><li><a class="btn__pager__current">{}</a></li></ul>"#, p))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Linkshell | Lodestone</title></head><body><div class="ldst__window">{}{}</div></body></html>"#,
        entries, pager
    )
}

fn member_page(members: &[(&str, &str, &str)]) -> String {
    let entries: String = members
        .iter()
        .map(|(name, fc, rank)| {
            format!(
                r#"<div class="entry">
                    <a href="/lodestone/character/1/" class="entry__bg">
                        <div class="entry__box entry__box--world">
                            <p class="entry__name">{}</p>
                            <div class="entry__chara_info__linkshell"><span>{}</span></div>
                        </div>
                    </a>
                    <div class="entry__freecompany__box"><a class="entry__freecompany__link"><span>{}</span></a></div>
                </div>"#,
                name, rank, fc
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="ldst__window">{}</div></body></html>"#,
        entries
    )
}

async fn mount_search_page(server: &MockServer, page: u32, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", "Hunt"))
        .and(query_param("worldname", "Zodiark"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_member_page(server: &MockServer, locator: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(locator))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn read_rows(csv_path: &Path) -> Vec<String> {
    std::fs::read_to_string(csv_path)
        .expect("Failed to read CSV output")
        .lines()
        .map(str::to_string)
        .collect()
}

async fn linkshell_requests(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("Request recording is enabled")
        .into_iter()
        .map(|request| request.url.path().to_string())
        .filter(|p| p != SEARCH_PATH)
        .collect()
}

#[tokio::test]
async fn test_full_harvest_two_linkshells() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("hunt.csv");

    // Page 1 is fetched twice: once for the pager, once for its linkshells
    mount_search_page(
        &mock_server,
        1,
        search_page(
            &[
                ("/lodestone/linkshell/111/", "Hunt Alpha", 10),
                ("/lodestone/linkshell/222/", "Hunt Beta", 60),
            ],
            None,
        ),
        2,
    )
    .await;

    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/111/",
        1,
        member_page(&[("Mira Tali", "Hunt Club", "Master"), ("Oro Ruu", "", "")]),
    )
    .await;
    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/222/",
        1,
        member_page(&[("Kana Oda", "Zodiark Watch", "Leader")]),
    )
    .await;
    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/222/",
        2,
        member_page(&[("Lyse Hext", "Zodiark Watch", "")]),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, false);
    let report = crawl(&config, "Hunt").await.expect("Crawl failed");

    assert_eq!(report.result_pages, 1);
    assert_eq!(report.groups_found, 2);
    assert_eq!(report.group_pages_fetched, 3);
    assert_eq!(report.rows_written, 4);
    assert_eq!(report.total_failures(), 0);

    let rows = read_rows(&csv_path);
    assert_eq!(rows[0], "Linkshell,Player name,Free company,Linkshell Rank");

    let mut data = rows[1..].to_vec();
    data.sort();
    assert_eq!(
        data,
        vec![
            "Hunt Alpha,Mira Tali,Hunt Club,Master".to_string(),
            "Hunt Alpha,Oro Ruu,,".to_string(),
            "Hunt Beta,Kana Oda,Zodiark Watch,Leader".to_string(),
            "Hunt Beta,Lyse Hext,Zodiark Watch,".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_failed_member_page_is_isolated() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("hunt.csv");

    mount_search_page(
        &mock_server,
        1,
        search_page(
            &[
                ("/lodestone/linkshell/111/", "Alpha", 60),
                ("/lodestone/linkshell/222/", "Beta", 5),
            ],
            None,
        ),
        2,
    )
    .await;

    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/111/",
        1,
        member_page(&[("Mira Tali", "Hunt Club", "")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/lodestone/linkshell/111/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/222/",
        1,
        member_page(&[("Kana Oda", "", "")]),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, false);
    let report = crawl(&config, "Hunt").await.expect("Crawl failed");

    assert_eq!(report.group_page_failures, 1);
    assert_eq!(report.rows_written, 2);

    let rows = read_rows(&csv_path);
    assert!(rows.contains(&"Alpha,Mira Tali,Hunt Club,".to_string()));
    assert!(rows.contains(&"Beta,Kana Oda,,".to_string()));
}

#[tokio::test]
async fn test_all_result_pages_are_visited() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("hunt.csv");

    mount_search_page(
        &mock_server,
        1,
        search_page(&[("/lodestone/linkshell/111/", "Alpha", 1)], Some("Page 1 of 2")),
        2,
    )
    .await;
    mount_search_page(
        &mock_server,
        2,
        search_page(&[("/lodestone/linkshell/222/", "Beta", 1)], Some("Page 2 of 2")),
        1,
    )
    .await;
    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/111/",
        1,
        member_page(&[("Mira Tali", "", "")]),
    )
    .await;
    mount_member_page(
        &mock_server,
        "/lodestone/linkshell/222/",
        1,
        member_page(&[("Kana Oda", "", "")]),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, false);
    let report = crawl(&config, "Hunt").await.expect("Crawl failed");

    assert_eq!(report.result_pages, 2);
    assert_eq!(report.search_pages_fetched, 2);
    assert_eq!(read_rows(&csv_path).len(), 3);
}

#[tokio::test]
async fn test_single_shot_looks_up_one_linkshell() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("hunt.csv");

    let linkshells = [
        ("/lodestone/linkshell/111/", "Alpha", 10),
        ("/lodestone/linkshell/222/", "Beta", 10),
        ("/lodestone/linkshell/333/", "Gamma", 10),
    ];
    mount_search_page(&mock_server, 1, search_page(&linkshells, None), 2).await;
    for (locator, _, _) in &linkshells {
        Mock::given(method("GET"))
            .and(path(*locator))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(member_page(&[("Member", "", "")])),
            )
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), &csv_path, true);
    let report = crawl(&config, "Hunt").await.expect("Crawl failed");

    assert_eq!(linkshell_requests(&mock_server).await.len(), 1);
    assert_eq!(report.groups_suppressed, 2);
    assert_eq!(read_rows(&csv_path).len(), 2);
}

#[tokio::test]
async fn test_unavailable_directory_fails_run() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("hunt.csv");

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, false);
    let result = crawl(&config, "Hunt").await;

    assert!(matches!(result, Err(HarvestError::Fetch(_))));
    assert!(linkshell_requests(&mock_server).await.is_empty());

    // The output was opened before the failure and holds only its header
    assert_eq!(read_rows(&csv_path).len(), 1);
}
