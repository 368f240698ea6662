use relvfs::Vfs;

use super::common::Fixture;

#[tokio::test]
async fn symlink_read_link_round_trips() {
    let fixture = Fixture::new();
    fixture.fs.symlink("HEAD", "refs/head-link").await.unwrap();
    assert_eq!(fixture.fs.read_link("refs/head-link").await.unwrap(), "HEAD");
}

#[tokio::test]
async fn lstat_reports_the_symlink_bit_with_zero_size() {
    let fixture = Fixture::new();
    fixture.fs.symlink("HEAD", "refs/head-link").await.unwrap();
    let lstat = fixture.fs.lstat("refs/head-link").await.unwrap();
    assert!(lstat.is_symbolic_link());
    assert_eq!(lstat.size, 0);
    assert_eq!(lstat.mode, 0o120000);
}

#[tokio::test]
async fn stat_follows_the_symlink_to_its_target_length() {
    let fixture = Fixture::new();
    fixture.fs.write_file("HEAD", b"ref: refs/heads/main").await.unwrap();
    fixture.fs.symlink("HEAD", "refs/head-link").await.unwrap();

    let stat = fixture.fs.stat("refs/head-link").await.unwrap();
    assert!(stat.is_file());
    assert_eq!(stat.size, "ref: refs/heads/main".len() as u64);
}

#[tokio::test]
async fn stat_on_a_symlink_with_an_absent_target_reports_zero_size() {
    let fixture = Fixture::new();
    fixture.fs.symlink("missing-target", "dangling").await.unwrap();
    let stat = fixture.fs.stat("dangling").await.unwrap();
    assert!(stat.is_file());
    assert_eq!(stat.size, 0);
}

#[tokio::test]
async fn rename_of_a_missing_source_is_a_silent_noop() {
    let fixture = Fixture::new();
    fixture.fs.rename("missing", "dest").await.unwrap();
    assert!(!fixture.fs.exists("dest").await.unwrap());
}

#[tokio::test]
async fn rename_moves_a_directory_subtree() {
    let fixture = Fixture::new();
    fixture.fs.write_file("a/b/c.txt", b"x").await.unwrap();
    fixture.fs.rename("a", "z").await.unwrap();
    assert_eq!(fixture.fs.read_dir("z/b").await.unwrap(), vec!["c.txt".to_string()]);
    assert!(!fixture.fs.exists("a").await.unwrap());
}
