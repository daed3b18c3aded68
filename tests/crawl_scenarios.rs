// tests/crawl_scenarios.rs
// =============================================================================
// End-to-end crawls against a local mock site.
//
// Each test mounts a small website on a wiremock server, runs the public
// Crawler API over it and checks the final report, including which requests
// actually reached the server.
// =============================================================================

use std::time::Duration;

use broken_link_crawler::report::{write_annotations, write_json};
use broken_link_crawler::{CrawlConfig, Crawler, FilterRules, Verdict};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.to_string(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn status(server: &MockServer, verb: &str, route: &str, code: u16) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(code))
        .mount(server)
        .await;
}

fn quick(seed: String) -> broken_link_crawler::CrawlConfigBuilder {
    CrawlConfig::builder(seed)
        .request_timeout(Duration::from_secs(2))
        .backoff(Duration::from_millis(1), Duration::from_millis(5))
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn broken_link_fails_run_and_excluded_link_is_never_requested() {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<a href="/ok">ok</a> <a href="/missing">gone</a> <a href="/skip/me">skip</a>"#,
    )
    .await;
    status(&server, "HEAD", "/ok", 200).await;
    status(&server, "HEAD", "/missing", 404).await;

    let config = quick(format!("{}/", server.uri()))
        .max_depth(Some(1))
        .filters(FilterRules {
            exclude_contained: vec!["/skip".into()],
            ..Default::default()
        })
        .build()
        .unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    assert_eq!(report.total_checked, 3);
    assert_eq!(report.broken.len(), 1);
    assert_eq!(report.broken[0].status, Some(404));
    assert!(report.broken[0].url.as_str().ends_with("/missing"));
    assert_eq!(report.verdict(), Verdict::Failure);
    assert_eq!(report.verdict().exit_code(), 1);

    let paths = requested_paths(&server).await;
    assert!(!paths.iter().any(|p| p.starts_with("/skip")));

    let mut annotations = Vec::new();
    write_annotations(&mut annotations, &report).unwrap();
    let annotations = String::from_utf8(annotations).unwrap();
    assert_eq!(annotations.lines().count(), 1);
    assert!(annotations.starts_with("::error ::HttpError: 404 - "));
}

#[tokio::test]
async fn offsite_prefix_exclusion_with_one_missing_page() {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<a href="/ok">ok</a>
           <a href="/missing">missing</a>
           <a href="https://excluded.example/x">excluded</a>"#,
    )
    .await;
    status(&server, "HEAD", "/ok", 200).await;
    status(&server, "HEAD", "/missing", 404).await;

    let config = quick(format!("{}/", server.uri()))
        .max_depth(Some(1))
        .filters(FilterRules {
            exclude_prefix: vec!["https://excluded.example".into()],
            ..Default::default()
        })
        .build()
        .unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    // excluded.example never resolves, so requesting it would add a broken entry
    assert_eq!(report.total_checked, 3);
    assert_eq!(report.broken.len(), 1);
    assert!(report.broken[0].url.as_str().ends_with("/missing"));
    assert!(report
        .broken
        .iter()
        .all(|o| o.url.host_str() != Some("excluded.example")));
    assert_eq!(report.verdict().exit_code(), 1);
}

#[tokio::test]
async fn seed_that_redirects_to_another_host_is_still_crawled() {
    let old_home = MockServer::start().await;
    let new_home = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/", new_home.uri())),
        )
        .mount(&old_home)
        .await;
    page(&new_home, "/", r#"<a href="/missing">missing</a>"#).await;
    status(&new_home, "HEAD", "/missing", 404).await;

    let config = quick(format!("{}/", old_home.uri()))
        .max_depth(Some(1))
        .build()
        .unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    assert_eq!(report.total_checked, 2);
    assert_eq!(report.broken.len(), 1);
    assert!(report.broken[0]
        .url
        .as_str()
        .starts_with(&format!("{}/missing", new_home.uri())));
    assert_eq!(report.verdict(), Verdict::Failure);
    assert_eq!(report.verdict().exit_code(), 1);
}

#[tokio::test]
async fn depth_zero_checks_only_the_seed() {
    let server = MockServer::start().await;
    status(&server, "HEAD", "/", 200).await;
    page(&server, "/", r#"<a href="/never">never</a>"#).await;

    let config = quick(format!("{}/", server.uri()))
        .max_depth(Some(0))
        .build()
        .unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    assert_eq!(report.total_checked, 1);
    assert_eq!(requested_paths(&server).await, vec!["/".to_string()]);
    assert_eq!(report.verdict(), Verdict::Success);
}

#[tokio::test]
async fn healthy_site_succeeds_and_each_url_is_requested_once() {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<a href="/a">a</a> <a href="/b">b</a> <a href="/a#top">a again</a>
           <img src="/logo.png">"#,
    )
    .await;
    page(&server, "/a", r#"<a href="/">home</a> <a href="./b">b</a>"#).await;
    page(&server, "/b", r#"<a href="/a">a</a> <a href="/b">self</a>"#).await;
    // onsite resources are followable, so they are fetched with GET
    status(&server, "GET", "/logo.png", 200).await;

    let config = quick(format!("{}/", server.uri())).build().unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    assert!(report.complete);
    assert_eq!(report.verdict(), Verdict::Success);
    assert_eq!(report.verdict().exit_code(), 0);

    let mut paths = requested_paths(&server).await;
    let total = paths.len();
    paths.sort();
    paths.dedup();
    assert_eq!(total, 4);
    assert_eq!(total, paths.len(), "no path requested twice: {:?}", paths);
    assert_eq!(report.total_checked, total);
}

#[tokio::test]
async fn transient_failures_are_retried_until_budget_runs_out() {
    let server = MockServer::start().await;
    page(&server, "/", r#"<a href="/flaky">flaky</a>"#).await;
    Mock::given(method("HEAD"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = quick(format!("{}/", server.uri()))
        .max_depth(Some(1))
        .max_retries(2)
        .build()
        .unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    assert_eq!(report.broken.len(), 1);
    assert_eq!(report.broken[0].status, Some(503));
    assert_eq!(report.broken[0].attempts, 3);
    assert_eq!(report.stats.attempts, 4);
}

#[tokio::test]
async fn offsite_pages_are_checked_but_not_crawled() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    page(
        &site,
        "/",
        &format!(r#"<a href="{}/external">external</a>"#, other.uri()),
    )
    .await;
    status(&other, "HEAD", "/external", 200).await;
    page(&other, "/external", r#"<a href="/deeper">deeper</a>"#).await;

    let config = quick(format!("{}/", site.uri())).build().unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    assert_eq!(report.total_checked, 2);
    assert_eq!(requested_paths(&other).await, vec!["/external".to_string()]);
}

#[tokio::test]
async fn json_report_lists_broken_links() {
    let server = MockServer::start().await;
    page(&server, "/", r#"<a href="/gone">gone</a>"#).await;
    status(&server, "HEAD", "/gone", 410).await;

    let config = quick(format!("{}/", server.uri()))
        .max_depth(Some(1))
        .verbose(true)
        .build()
        .unwrap();
    let report = Crawler::new(config).unwrap().run().await;

    let mut out = Vec::new();
    write_json(&mut out, &report).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["total_checked"], 2);
    assert_eq!(value["complete"], true);
    assert_eq!(value["broken"][0]["status"], 410);
    assert_eq!(value["healthy"].as_array().unwrap().len(), 1);
}
