use relvfs::{FileData, ReadEncoding, Vfs};

use super::common::Fixture;

#[tokio::test]
async fn writes_and_reads_nested_file() {
    let fixture = Fixture::new();
    fixture.fs.write_file("a/b/c.txt", b"hello").await.unwrap();

    let data = fixture.fs.read_file("a/b/c.txt", ReadEncoding::Utf8).await.unwrap();
    assert_eq!(data, FileData::Utf8("hello".to_string()));
    assert_eq!(fixture.fs.stat("a/b/c.txt").await.unwrap().size, 5);
}

#[tokio::test]
async fn rewriting_a_path_replaces_its_contents() {
    let fixture = Fixture::new();
    fixture.fs.write_file("f", b"first").await.unwrap();
    fixture.fs.write_file("f", b"second").await.unwrap();
    assert_eq!(
        fixture.fs.read_file("f", ReadEncoding::Bytes).await.unwrap().into_bytes(),
        b"second".to_vec()
    );
}

#[tokio::test]
async fn reading_an_implicit_directory_raises_eisdir() {
    let fixture = Fixture::new();
    fixture.fs.write_file("a/b", b"x").await.unwrap();
    let err = fixture.fs.read_file("a", ReadEncoding::Bytes).await.unwrap_err();
    assert_eq!(err.code(), Some("EISDIR"));
}

#[tokio::test]
async fn reading_a_missing_path_raises_enoent() {
    let fixture = Fixture::new();
    let err = fixture.fs.read_file("missing", ReadEncoding::Bytes).await.unwrap_err();
    assert_eq!(err.code(), Some("ENOENT"));
}

#[tokio::test]
async fn unlink_on_a_directory_raises_eperm_and_on_missing_raises_enoent() {
    let fixture = Fixture::new();
    fixture.fs.write_file("d/f", b"x").await.unwrap();
    let err = fixture.fs.unlink("d").await.unwrap_err();
    assert_eq!(err.code(), Some("EPERM"));

    let err = fixture.fs.unlink("missing").await.unwrap_err();
    assert_eq!(err.code(), Some("ENOENT"));
}
