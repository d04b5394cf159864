use integration_tests::harness::TestServer;
use integration_tests::harness::server::write_file;
use pretty_assertions::assert_eq;
use reqwest::{Method, StatusCode};
use reqwest::header::{
    ACCEPT, ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    IF_NONE_MATCH, LAST_MODIFIED, RANGE,
};
use servedir_core::conf::{Applicability, HeaderRule};
use servedir_core::matcher::SourcePattern;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

fn site() -> TestServer {
    TestServer::start(|root, _| {
        write_file(root, "index.html", "<h1>home</h1>");
        write_file(root, "about.html", "<h1>about</h1>");
        write_file(root, "docs/index.html", "<h1>docs</h1>");
        write_file(root, "style.css", "body{}");
    })
}

#[test]
fn serves_root_index_html() {
    let srv = site();

    let res = srv.get("/").send().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/html");
    assert_eq!(res.text().unwrap(), "<h1>home</h1>");
}

#[test]
fn clean_urls_resolve_sibling_and_nested_index() {
    let srv = site();

    let about = srv.get("/about").send().unwrap();
    let docs = srv.get("/docs").send().unwrap();

    assert_eq!(about.status(), StatusCode::OK);
    assert_eq!(about.text().unwrap(), "<h1>about</h1>");
    assert_eq!(docs.status(), StatusCode::OK);
    assert_eq!(docs.text().unwrap(), "<h1>docs</h1>");
}

#[test]
fn file_responses_carry_length_and_range_support() {
    let srv = site();

    let res = srv.get("/style.css").send().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/css");
    assert_eq!(res.headers()[CONTENT_LENGTH], "6");
    assert_eq!(res.headers()[ACCEPT_RANGES], "bytes");
    assert!(res.headers().contains_key(LAST_MODIFIED));
    assert!(!res.headers().contains_key(ETAG));
}

#[test]
fn head_has_headers_but_no_body() {
    let srv = site();

    let res = srv.head("/style.css").send().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_LENGTH], "6");
    assert_eq!(res.bytes().unwrap().len(), 0);
}

#[test]
fn path_traversal_is_rejected() {
    let srv = site();

    let res = srv.get("/docs/%2e%2e/%2e%2e/etc/passwd").send().unwrap();

    assert!(
        res.status().is_client_error(),
        "expected client error, got {}",
        res.status()
    );
}

#[test]
fn missing_file_is_404_with_builtin_page() {
    let srv = site();

    let res = srv.get("/nope.txt").send().unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.text().unwrap().contains("The requested path could not be found"));
}

#[test]
fn missing_file_is_json_error_for_json_clients() {
    let srv = site();

    let res = srv
        .get("/nope.txt")
        .header(ACCEPT, "application/json")
        .send()
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[test]
fn custom_404_page_is_served_from_root() {
    let srv = TestServer::start(|root, _| {
        write_file(root, "404.html", "<p>lost</p>");
    });

    let res = srv.get("/missing").send().unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().unwrap(), "<p>lost</p>");
}

#[test]
fn unsupported_method_is_405() {
    let srv = site();

    let res = srv.request(Method::DELETE, "/style.css").send().unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[ALLOW], "GET, HEAD");
}

#[test]
fn range_request_returns_partial_content() {
    let srv = TestServer::start(|root, _| {
        write_file(root, "data.txt", "0123456789");
    });

    let res = srv.get("/data.txt").header(RANGE, "bytes=2-5").send().unwrap();

    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()[CONTENT_RANGE], "bytes 2-5/10");
    assert_eq!(res.headers()[CONTENT_LENGTH], "4");
    assert_eq!(res.text().unwrap(), "2345");
}

#[test]
fn out_of_bounds_range_is_416() {
    let srv = TestServer::start(|root, _| {
        write_file(root, "data.txt", "0123456789");
    });

    let res = srv.get("/data.txt").header(RANGE, "bytes=50-60").send().unwrap();

    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(res.headers()[CONTENT_RANGE], "bytes */10");
}

#[test]
fn large_file_range_is_streamed() {
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let expected = data[100_000..=100_099].to_vec();
    let srv = TestServer::start(move |root, _| {
        write_file(root, "blob.bin", &data);
    });

    let res = srv
        .get("/blob.bin")
        .header(RANGE, "bytes=100000-100099")
        .send()
        .unwrap();

    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.bytes().unwrap().to_vec(), expected);
}

#[test]
fn large_file_is_served_whole() {
    let data: Vec<u8> = (0..300_000u32).map(|i| (i % 7) as u8).collect();
    let expected = data.clone();
    let srv = TestServer::start(move |root, _| {
        write_file(root, "blob.bin", &data);
    });

    let res = srv.get("/blob.bin").send().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_LENGTH], "300000");
    assert_eq!(res.bytes().unwrap().to_vec(), expected);
}

#[test]
fn etag_round_trip_yields_304() {
    let srv = TestServer::start(|root, serve| {
        write_file(root, "app.js", "console.log(1)");
        serve.etag = true;
    });

    let first = srv.get("/app.js").send().unwrap();
    let etag = first.headers()[ETAG].to_str().unwrap().to_string();
    assert!(!first.headers().contains_key(LAST_MODIFIED));

    let second = srv
        .get("/app.js")
        .header(IF_NONE_MATCH, etag.as_str())
        .send()
        .unwrap();

    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers()[ETAG], etag.as_str());
    assert_eq!(second.bytes().unwrap().len(), 0);
}

#[test]
fn configured_headers_are_applied() {
    let srv = TestServer::start(|root, serve| {
        write_file(root, "assets/app.css", "a{}");
        serve.headers = vec![HeaderRule {
            source: SourcePattern::new("**/*.css").unwrap(),
            headers: BTreeMap::from([("Cache-Control".to_string(), "max-age=60".to_string())]),
        }];
    });

    let res = srv.get("/assets/app.css").send().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CACHE_CONTROL], "max-age=60");
}

#[test]
fn listing_shows_folders_first_as_json() {
    let srv = TestServer::start(|root, _| {
        write_file(root, "b.txt", "b");
        write_file(root, "a/x.txt", "x");
        write_file(root, ".DS_Store", "");
    });

    let res = srv.get("/").header(ACCEPT, "application/json").send().unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().unwrap();
    let bases: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["base"].as_str().unwrap())
        .collect();
    assert_eq!(bases, vec!["a/", "b.txt"]);
}

#[test]
fn listing_can_be_disabled() {
    let srv = TestServer::start(|root, serve| {
        write_file(root, "a/x.txt", "x");
        write_file(root, "a/y.txt", "y");
        serve.directory_listing = Applicability::Toggle(false);
    });

    let res = srv.get("/a/").send().unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn responses_carry_request_id() {
    let srv = site();

    let res = srv
        .get("/style.css")
        .header("x-request-id", "it-123")
        .send()
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "it-123");
}

#[test]
fn served_requests_are_logged() {
    let srv = site();

    srv.get("/style.css").send().unwrap();

    // The access log is written after the response, so poll briefly.
    let deadline = Instant::now() + Duration::from_secs(1);
    let logged = loop {
        let found = srv.events().into_iter().any(|e| {
            e.message() == Some("request served")
                && e.field("path") == Some("/style.css")
                && e.field("status") == Some("200")
        });
        if found || Instant::now() > deadline {
            break found;
        }
        thread::sleep(Duration::from_millis(10));
    };

    assert!(logged, "missing access log event");
}
