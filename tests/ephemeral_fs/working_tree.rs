use relvfs::Vfs;

use super::common::Fixture;

#[tokio::test]
async fn working_tree_files_exclude_the_git_directory() {
    let fixture = Fixture::new();
    fixture.fs.write_file(".git/config", b"x").await.unwrap();
    fixture.fs.write_file(".git/HEAD", b"ref: refs/heads/main").await.unwrap();
    fixture.fs.write_file("src/main.rs", b"fn main() {}").await.unwrap();
    fixture.fs.write_file("README.md", b"hi").await.unwrap();

    let mut files = fixture.fs.get_working_tree_files().await;
    files.sort();
    assert_eq!(files, vec!["README.md".to_string(), "src/main.rs".to_string()]);
}

#[tokio::test]
async fn working_tree_files_is_empty_for_a_fresh_filesystem() {
    let fixture = Fixture::new();
    assert!(fixture.fs.get_working_tree_files().await.is_empty());
}
