use relvfs::{FileData, ReadEncoding, Vfs};

use super::common::Fixture;

#[tokio::test]
async fn writes_and_reads_nested_file() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("a/b/c.txt", b"hello").await.unwrap();

    assert_eq!(fixture.fs.read_dir("").await.unwrap(), vec!["a".to_string()]);
    assert_eq!(fixture.fs.read_dir("a").await.unwrap(), vec!["b".to_string()]);
    assert_eq!(fixture.fs.read_dir("a/b").await.unwrap(), vec!["c.txt".to_string()]);

    let data = fixture.fs.read_file("a/b/c.txt", ReadEncoding::Utf8).await.unwrap();
    assert_eq!(data, FileData::Utf8("hello".to_string()));
    assert_eq!(fixture.fs.stat("a/b/c.txt").await.unwrap().size, 5);
}

#[tokio::test]
async fn large_file_splits_into_three_chunks_and_round_trips() {
    let fixture = Fixture::new().await;
    let data = vec![0xABu8; 5_000_000];
    fixture.fs.write_file("big.bin", &data).await.unwrap();

    let read_back = fixture.fs.read_file("big.bin", ReadEncoding::Bytes).await.unwrap().into_bytes();
    assert_eq!(read_back.len(), 5_000_000);
    assert!(read_back.iter().all(|&b| b == 0xAB));
}

#[tokio::test]
async fn rewriting_a_path_replaces_its_chunks() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("f", &vec![0u8; 5_000_000]).await.unwrap();
    fixture.fs.write_file("f", b"short").await.unwrap();
    assert_eq!(fixture.fs.stat("f").await.unwrap().size, 5);
    assert_eq!(
        fixture.fs.read_file("f", ReadEncoding::Bytes).await.unwrap().into_bytes(),
        b"short".to_vec()
    );
}

#[tokio::test]
async fn empty_file_writes_as_single_zero_length_chunk() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("empty", b"").await.unwrap();
    assert_eq!(fixture.fs.stat("empty").await.unwrap().size, 0);
    assert_eq!(
        fixture.fs.read_file("empty", ReadEncoding::Bytes).await.unwrap().into_bytes(),
        Vec::<u8>::new()
    );
}

#[tokio::test]
async fn write_to_root_is_rejected_without_a_posix_code() {
    let fixture = Fixture::new().await;
    let err = fixture.fs.write_file("", b"x").await.unwrap_err();
    assert_eq!(err.code(), None);
}

#[tokio::test]
async fn reading_a_directory_raises_eisdir() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("a/b", b"x").await.unwrap();
    let err = fixture.fs.read_file("a", ReadEncoding::Bytes).await.unwrap_err();
    assert_eq!(err.code(), Some("EISDIR"));
}

#[tokio::test]
async fn reading_a_missing_path_raises_enoent() {
    let fixture = Fixture::new().await;
    let err = fixture.fs.read_file("missing", ReadEncoding::Bytes).await.unwrap_err();
    assert_eq!(err.code(), Some("ENOENT"));
}

#[tokio::test]
async fn write_creates_ancestor_directories() {
    let fixture = Fixture::new().await;
    fixture.fs.write_file("a/b/c.txt", b"x").await.unwrap();
    assert!(fixture.fs.stat("a").await.unwrap().is_directory());
    assert!(fixture.fs.stat("a/b").await.unwrap().is_directory());
}
