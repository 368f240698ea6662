use relvfs::{FileData, ReadEncoding, Vfs};

use super::common::Fixture;

#[tokio::test]
async fn rename_moves_content_and_old_path_then_raises_enoent() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("a", b"payload").await.unwrap();
    fixture.fs.rename("a", "b").await.unwrap();

    assert_eq!(
        fixture.fs.read_file("b", ReadEncoding::Bytes).await.unwrap().into_bytes(),
        b"payload".to_vec()
    );
    let err = fixture.fs.read_file("a", ReadEncoding::Bytes).await.unwrap_err();
    assert_eq!(err.code(), Some("ENOENT"));
}

#[tokio::test]
async fn rename_of_a_missing_source_raises_enoent() {
    let fixture = Fixture::new().await;
    let err = fixture.fs.rename("missing", "dest").await.unwrap_err();
    assert_eq!(err.code(), Some("ENOENT"));
}

#[tokio::test]
async fn rename_preserves_multichunk_content() {
    let fixture = Fixture::new().await;
    let data = vec![0x7Eu8; 5_000_000];
    fixture.fs.write_file("big", &data).await.unwrap();
    fixture.fs.rename("big", "moved").await.unwrap();
    assert_eq!(
        fixture.fs.read_file("moved", ReadEncoding::Bytes).await.unwrap().into_bytes(),
        data
    );
}

#[tokio::test]
async fn symlink_round_trips_through_read_link_and_read_file() {
    let fixture = Fixture::new().await;
    fixture.fs.symlink("HEAD", "refs/head-link").await.unwrap();
    assert_eq!(fixture.fs.read_link("refs/head-link").await.unwrap(), "HEAD");
    assert_eq!(
        fixture.fs.read_file("refs/head-link", ReadEncoding::Utf8).await.unwrap(),
        FileData::Utf8("HEAD".to_string())
    );
}

#[tokio::test]
async fn stat_and_lstat_agree_and_never_report_a_symlink() {
    let fixture = Fixture::new().await;
    fixture.fs.symlink("HEAD", "refs/head-link").await.unwrap();
    let stat = fixture.fs.stat("refs/head-link").await.unwrap();
    let lstat = fixture.fs.lstat("refs/head-link").await.unwrap();
    assert_eq!(stat, lstat);
    assert!(!stat.is_symbolic_link());
}
