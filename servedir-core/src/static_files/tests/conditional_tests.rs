use super::{body_text, get, get_with, header, state_for};
use crate::static_files::StaticBody;

use http::StatusCode;
use pretty_assertions::assert_eq;
use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn thousand_bytes() -> Vec<u8> {
    (0..1000u32).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn satisfiable_range_is_partial_content() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.bin"), thousand_bytes()).unwrap();
    let state = state_for(dir.path(), |_| {});

    // Act
    let response = get_with(&state, "/data.bin", &[("range", "bytes=0-99")]).await;

    // Assert
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&response, "content-range"), Some("bytes 0-99/1000"));
    assert_eq!(header(&response, "content-length"), Some("100"));
    assert_eq!(response.body_bytes().unwrap(), &thousand_bytes()[..100]);
}

#[tokio::test]
async fn range_starting_at_size_is_unsatisfiable() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.bin"), thousand_bytes()).unwrap();
    let state = state_for(dir.path(), |_| {});

    // Act
    let response = get_with(&state, "/data.bin", &[("range", "bytes=1000-")]).await;

    // Assert
    assert_eq!(response.status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header(&response, "content-range"), Some("bytes */1000"));
    assert_eq!(response.body_bytes().unwrap(), b"");
}

#[tokio::test]
async fn suffix_range_returns_tail() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.bin"), thousand_bytes()).unwrap();
    let state = state_for(dir.path(), |_| {});

    // Act
    let response = get_with(&state, "/data.bin", &[("range", "bytes=-10")]).await;

    // Assert
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&response, "content-range"), Some("bytes 990-999/1000"));
    assert_eq!(response.body_bytes().unwrap(), &thousand_bytes()[990..]);
}

#[tokio::test]
async fn range_on_empty_file_is_ignored() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("empty.txt"), "").unwrap();
    let state = state_for(dir.path(), |_| {});

    // Act
    let response = get_with(&state, "/empty.txt", &[("range", "bytes=0-10")]).await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(header(&response, "content-length"), Some("0"));
}

#[tokio::test]
async fn large_file_range_streams_remaining_bytes() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("big.bin"), vec![1u8; 200 * 1024]).unwrap();
    let state = state_for(dir.path(), |_| {});

    // Act
    let response = get_with(&state, "/big.bin", &[("range", "bytes=100000-100099")]).await;

    // Assert
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(header(&response, "content-length"), Some("100"));
    assert!(matches!(
        response.body,
        StaticBody::RangedFile { remaining: 100, .. }
    ));
}

#[tokio::test]
async fn etag_is_stable_and_honors_if_none_match() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "content").unwrap();
    let state = state_for(dir.path(), |c| c.etag = true);

    // Act
    let first = get(&state, "/a.txt").await;
    let etag = header(&first, "etag").unwrap().to_string();
    let second = get(&state, "/a.txt").await;
    let cached = get_with(&state, "/a.txt", &[("if-none-match", etag.as_str())]).await;

    // Assert
    assert_eq!(header(&second, "etag"), Some(etag.as_str()));
    assert!(header(&first, "last-modified").is_none());
    assert_eq!(cached.status, StatusCode::NOT_MODIFIED);
    assert_eq!(cached.body_bytes().unwrap(), b"");
    assert_eq!(state.etags.len(), 1);
}

#[tokio::test]
async fn if_none_match_is_ignored_for_range_requests() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "content").unwrap();
    let state = state_for(dir.path(), |c| c.etag = true);
    let etag = header(&get(&state, "/a.txt").await, "etag")
        .unwrap()
        .to_string();

    // Act
    let response = get_with(
        &state,
        "/a.txt",
        &[("if-none-match", etag.as_str()), ("range", "bytes=0-2")],
    )
    .await;

    // Assert
    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_text(&response), "con");
}

#[tokio::test]
async fn changed_mtime_invalidates_etag() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, "version one").unwrap();
    let state = state_for(dir.path(), |c| c.etag = true);
    let before = header(&get(&state, "/a.txt").await, "etag")
        .unwrap()
        .to_string();

    // Act
    fs::write(&path, "version two").unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    let after = get_with(&state, "/a.txt", &[("if-none-match", before.as_str())]).await;

    // Assert
    assert_eq!(after.status, StatusCode::OK);
    assert_ne!(header(&after, "etag"), Some(before.as_str()));
    assert_eq!(body_text(&after), "version two");
}

#[tokio::test]
async fn if_modified_since_yields_not_modified_without_etags() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "content").unwrap();
    let state = state_for(dir.path(), |_| {});
    let last_modified = header(&get(&state, "/a.txt").await, "last-modified")
        .unwrap()
        .to_string();

    // Act
    let response = get_with(&state, "/a.txt", &[("if-modified-since", last_modified.as_str())]).await;

    // Assert
    assert_eq!(response.status, StatusCode::NOT_MODIFIED);
}
