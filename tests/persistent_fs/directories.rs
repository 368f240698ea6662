use relvfs::Vfs;

use super::common::Fixture;

#[tokio::test]
async fn mkdir_is_idempotent_for_an_existing_directory() {
    let fixture = Fixture::new().await;
    fixture.fs.make_dir("d").await.unwrap();
    fixture.fs.make_dir("d").await.unwrap();
}

#[tokio::test]
async fn mkdir_conflicts_with_an_existing_file() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("f", b"x").await.unwrap();
    let err = fixture.fs.make_dir("f").await.unwrap_err();
    assert_eq!(err.code(), Some("EEXIST"));
}

#[tokio::test]
async fn mkdir_with_missing_parent_raises_enoent() {
    let fixture = Fixture::new().await;
    let err = fixture.fs.make_dir("missing/child").await.unwrap_err();
    assert_eq!(err.code(), Some("ENOENT"));
}

#[tokio::test]
async fn rmdir_rejects_nonempty_directory_then_succeeds_once_empty() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("d/f", b"1").await.unwrap();
    let err = fixture.fs.remove_dir("d").await.unwrap_err();
    assert_eq!(err.code(), Some("ENOTEMPTY"));
    fixture.fs.unlink("d/f").await.unwrap();
    fixture.fs.remove_dir("d").await.unwrap();
}

#[tokio::test]
async fn rmdir_on_a_file_raises_enotdir() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("f", b"x").await.unwrap();
    let err = fixture.fs.remove_dir("f").await.unwrap_err();
    assert_eq!(err.code(), Some("ENOTDIR"));
}

#[tokio::test]
async fn unlink_on_a_directory_raises_eperm() {
    let fixture = Fixture::new().await;
    fixture.fs.make_dir("d").await.unwrap();
    let err = fixture.fs.unlink("d").await.unwrap_err();
    assert_eq!(err.code(), Some("EPERM"));
}

#[tokio::test]
async fn exists_reports_false_then_true() {
    let fixture = Fixture::new().await;
    assert!(!fixture.fs.exists("nope").await.unwrap());
    fixture.fs.write_file("nope", b"x").await.unwrap();
    assert!(fixture.fs.exists("nope").await.unwrap());
}

#[tokio::test]
async fn read_dir_on_a_file_raises_enotdir() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("f", b"x").await.unwrap();
    let err = fixture.fs.read_dir("f").await.unwrap_err();
    assert_eq!(err.code(), Some("ENOTDIR"));
}
