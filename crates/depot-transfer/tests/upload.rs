mod common;

use std::time::Duration;

use common::{MockRepository, dir_pattern, init_tracing, write_file};
use depot_spec::{MatchSpec, Properties, SYMLINK_DEST, SYMLINK_DEST_SHA1};
use depot_transfer::{KIB, TransferConfig, TransferDetails, TransferError, TransferSession};

fn config() -> TransferConfig {
    TransferConfig::default()
        .threads(3)
        .retry_backoff(Duration::from_millis(1))
        .commit_poll_interval(Duration::from_millis(1))
        .save_summary(true)
}

fn details(summary: &mut depot_transfer::Summary) -> Vec<TransferDetails> {
    summary.transfer_details.as_mut().map(|r| r.by_ref().collect()).unwrap_or_default()
}

#[tokio::test]
async fn test_checksum_deploy_makes_rerun_free() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.bin", &[1u8; 64]);
    write_file(dir.path(), "b.bin", &[2u8; 64]);
    let specs = [MatchSpec::new(dir_pattern(dir.path(), "*.bin")).target("repo/up/")];
    let session = TransferSession::new(MockRepository::new(), config().min_checksum_deploy(16)).unwrap();

    let mut first = session.upload(&specs).await.unwrap();
    assert_eq!((first.total_succeeded, first.total_failed), (2, 0));
    assert!(details(&mut first).iter().all(|d| d.bytes == 64));
    first.close().unwrap();

    let mut second = session.upload(&specs).await.unwrap();
    assert_eq!((second.total_succeeded, second.total_failed), (2, 0));
    assert!(details(&mut second).iter().all(|d| d.bytes == 0 && d.success));
    second.close().unwrap();

    assert_eq!(session.client().count("put"), 2);
    assert_eq!(session.client().content("repo/up/a.bin").unwrap(), [1u8; 64]);
}

#[tokio::test]
async fn test_small_files_skip_checksum_deploy() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "tiny.txt", b"abc");
    let session = TransferSession::new(MockRepository::new(), config()).unwrap();

    let summary = session.upload(&[MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/")]).await.unwrap();
    assert_eq!(summary.total_succeeded, 1);
    assert_eq!(session.client().count("checksum_deploy"), 0);
    assert_eq!(session.client().content("repo/tiny.txt").unwrap(), b"abc");
}

#[tokio::test]
async fn test_same_session_collision_first_dispatch_wins() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a/file", b"first");
    write_file(dir.path(), "b/file", b"second");
    let spec = MatchSpec::new(dir_pattern(dir.path(), "*/file")).target("repo/out/file");
    let session = TransferSession::new(MockRepository::new(), config()).unwrap();

    let mut summary = session.upload(&[spec]).await.unwrap();
    assert_eq!(summary.total_succeeded, 1);
    assert_eq!(summary.total_failed, 0);
    assert_eq!(summary.total_skipped, 1);

    let logged = details(&mut summary);
    assert_eq!(logged.len(), 1);
    assert!(logged[0].source.ends_with("a/file"));
    assert_eq!(session.client().content("repo/out/file").unwrap(), b"first");
    summary.close().unwrap();
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"payload");
    let repo = MockRepository::new();
    repo.transient_put_failures.store(2, std::sync::atomic::Ordering::SeqCst);
    let session = TransferSession::new(repo, config().max_retries(3)).unwrap();

    let summary = session.upload(&[MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/")]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (1, 0));
    assert_eq!(session.client().count("put"), 3);
}

#[tokio::test]
async fn test_retry_budget_exhausted_fails_file_not_session() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"payload");
    let repo = MockRepository::new();
    repo.transient_put_failures.store(100, std::sync::atomic::Ordering::SeqCst);
    let session = TransferSession::new(repo, config().max_retries(2)).unwrap();

    let mut summary = session.upload(&[MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/")]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (0, 1));
    assert_eq!(session.client().count("put"), 3);

    let logged = details(&mut summary);
    assert!(!logged[0].success);
    assert!(logged[0].error.as_deref().unwrap().contains("max retries exceeded"));
    assert!(summary.artifacts_details.as_ref().unwrap().is_empty().unwrap());
}

#[tokio::test]
async fn test_multipart_selected_and_properties_preserved() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..3 * KIB).map(|i| (i % 251) as u8).collect();
    write_file(dir.path(), "big.bin", &payload);
    write_file(dir.path(), "other/small.bin", b"small");

    let repo = MockRepository { multipart: true, ..MockRepository::default() };
    repo.merge_failures.store(1, std::sync::atomic::Ordering::SeqCst);
    let config = config()
        .min_split_size(3 * KIB)
        .min_checksum_deploy(3 * KIB + 1)
        .chunk_size(KIB)
        .split_count(2)
        .commit_retries(2);
    let session = TransferSession::new(repo, config).unwrap();

    let big = MatchSpec::new(dir_pattern(dir.path(), "big.bin"))
        .target("repo/dist/")
        .props(Properties::new().with("component", "core"));
    let small = MatchSpec::new(dir_pattern(dir.path(), "other/*")).target("repo/dist/");
    let summary = session.upload(&[big, small]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (2, 0));

    let repo = session.client();
    assert_eq!(repo.count("checksum_deploy"), 0);
    assert_eq!(repo.count("multipart_create"), 1);
    assert_eq!(repo.count("multipart_upload_part"), 3);
    assert_eq!(repo.count("multipart_commit"), 2);
    assert_eq!(repo.count("multipart_abort"), 0);
    assert_eq!(repo.content("repo/dist/big.bin").unwrap(), payload);
    assert_eq!(session.multipart_supported(), Some(true));

    let by_property = MatchSpec::new("repo/dist/").with_props_str("component=core").unwrap();
    let mut found = session.search(&by_property).await.unwrap();
    let paths: Vec<String> = found.by_ref().map(|c| c.repo_path).collect();
    assert_eq!(paths, ["repo/dist/big.bin"]);
}

fn multipart_config() -> TransferConfig {
    config()
        .min_split_size(KIB)
        .min_checksum_deploy(u64::MAX)
        .chunk_size(KIB)
        .split_count(2)
}

#[tokio::test]
async fn test_multipart_waits_for_merge() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "big.bin", &[3u8; 2048]);
    let repo = MockRepository { multipart: true, ..MockRepository::default() };
    repo.pending_merges.store(2, std::sync::atomic::Ordering::SeqCst);
    let session = TransferSession::new(repo, multipart_config().commit_max_polls(5)).unwrap();

    let summary = session.upload(&[MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/")]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (1, 0));
    assert_eq!(session.client().count("multipart_status"), 3);
    assert_eq!(session.client().content("repo/big.bin").unwrap(), [3u8; 2048]);
}

#[tokio::test]
async fn test_multipart_merge_that_never_finishes_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "big.bin", &[3u8; 2048]);
    let repo = MockRepository { multipart: true, ..MockRepository::default() };
    repo.pending_merges.store(u32::MAX, std::sync::atomic::Ordering::SeqCst);
    let session = TransferSession::new(repo, multipart_config().commit_max_polls(3)).unwrap();

    let mut summary = session.upload(&[MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/")]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (0, 1));
    assert_eq!(session.client().count("multipart_status"), 4);
    assert_eq!(session.client().count("multipart_abort"), 1);
    assert_eq!(session.client().count("multipart_create"), 1);
    assert!(session.client().content("repo/big.bin").is_none());

    let logged = details(&mut summary);
    assert!(logged[0].error.as_deref().unwrap().contains("merge timed out"));
}

#[tokio::test]
async fn test_multipart_unsupported_falls_back_to_put() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.bin", &[7u8; 2048]);
    write_file(dir.path(), "b.bin", &[8u8; 2048]);
    let config = config().min_split_size(KIB).min_checksum_deploy(u64::MAX);
    let session = TransferSession::new(MockRepository::new(), config).unwrap();

    let summary = session.upload(&[MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/")]).await.unwrap();
    assert_eq!(summary.total_succeeded, 2);
    assert_eq!(session.client().count("multipart_supported"), 1);
    assert_eq!(session.client().count("multipart_create"), 0);
    assert_eq!(session.client().count("put"), 2);
}

#[tokio::test]
async fn test_directories_created_with_include_dirs() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "sub/a.txt", b"a");
    let spec = MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/tree/").include_dirs(true);
    let session = TransferSession::new(MockRepository::new(), config()).unwrap();

    let summary = session.upload(&[spec]).await.unwrap();
    assert_eq!(summary.total_succeeded, 2);
    assert!(session.client().is_folder("repo/tree/sub"));
    assert_eq!(session.client().content("repo/tree/sub/a.txt").unwrap(), b"a");
}

#[tokio::test]
async fn test_invalid_spec_aborts_before_transfers() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"a");
    let good = MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/");
    let bad = MatchSpec::new(dir_pattern(dir.path(), "*")).target("repo/{1}/");
    let session = TransferSession::new(MockRepository::new(), config()).unwrap();

    let err = session.upload(&[good, bad]).await.unwrap_err();
    assert!(matches!(err, TransferError::Configuration(_)));
    assert_eq!(session.client().count("put"), 0);
}

#[test]
fn test_invalid_config_rejected() {
    let result = TransferSession::new(MockRepository::new(), TransferConfig::default().threads(0));
    assert!(matches!(result, Err(TransferError::Configuration(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinks_upload_as_links() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "real.txt", b"real content");
    std::os::unix::fs::symlink("real.txt", dir.path().join("link.txt")).unwrap();
    let session = TransferSession::new(MockRepository::new(), config()).unwrap();

    let spec = MatchSpec::new(dir_pattern(dir.path(), "*.txt")).target("repo/").symlinks(true);
    let summary = session.upload(&[spec]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (2, 0));

    let (real, _) = depot_verify::checksum_file(dir.path().join("real.txt")).unwrap();
    let files = session.client().files.lock().unwrap();
    let link = &files["repo/link.txt"];
    assert!(link.data.is_empty());
    assert!(!link.folder);
    assert_eq!(link.properties.get(SYMLINK_DEST).unwrap()[0], "real.txt");
    assert_eq!(link.properties.get(SYMLINK_DEST_SHA1).unwrap()[0], real.sha1);
    assert_eq!(files["repo/real.txt"].data, b"real content");
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.bin", &[1u8; 64]);
    write_file(dir.path(), "b.bin", &[2u8; 64]);
    let session = TransferSession::new(MockRepository::new(), config().dry_run(true).min_checksum_deploy(16)).unwrap();

    let spec = MatchSpec::new(dir_pattern(dir.path(), "*.bin")).target("repo/");
    let mut summary = session.upload(&[spec]).await.unwrap();
    assert_eq!((summary.total_succeeded, summary.total_failed), (2, 0));
    assert!(details(&mut summary).iter().all(|d| d.success && d.bytes == 0));
    summary.close().unwrap();

    assert_eq!(session.client().count("put"), 0);
    assert_eq!(session.client().count("checksum_deploy"), 0);
    assert!(session.client().files.lock().unwrap().is_empty());
}
