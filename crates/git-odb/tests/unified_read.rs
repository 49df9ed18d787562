//! Integration tests: unified reads from mixed loose/packed storage.
//!
//! These tests verify that the ObjectDatabase correctly reads objects
//! regardless of whether they are stored loose or packed, and that the
//! search order (loose before packs) is respected.

use std::process::Command;

use git_hash::ObjectId;
use git_object::{Object, ObjectType};
use git_odb::ObjectDatabase;

/// Create a temporary bare git repository and return (tempdir, objects_dir).
fn setup_git_repo() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let status = Command::new("git")
        .args(["init", "--bare"])
        .current_dir(dir.path())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git init failed");
    let objects_dir = dir.path().join("objects");
    (dir, objects_dir)
}

/// Use C git to write a blob and return the hex OID.
fn git_hash_object(repo_dir: &std::path::Path, content: &[u8]) -> String {
    let mut child = Command::new("git")
        .args(["hash-object", "-w", "--stdin"])
        .current_dir(repo_dir)
        .env("GIT_DIR", repo_dir)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .unwrap();

    use std::io::Write;
    child.stdin.take().unwrap().write_all(content).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "git hash-object failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Use C git to repack all objects into a packfile.
fn git_repack(repo_dir: &std::path::Path) {
    let status = Command::new("git")
        .args(["repack", "-a", "-d"])
        .current_dir(repo_dir)
        .env("GIT_DIR", repo_dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git repack failed");
}

/// Use C git to prune all loose objects.
fn git_prune_packed(repo_dir: &std::path::Path) {
    let status = Command::new("git")
        .args(["prune-packed"])
        .current_dir(repo_dir)
        .env("GIT_DIR", repo_dir)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git prune-packed failed");
}

#[test]
fn read_loose_object_through_odb() {
    let (dir, objects_dir) = setup_git_repo();
    let content = b"hello from odb test\n";
    let oid_hex = git_hash_object(dir.path(), content);

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    let obj = odb.read(&oid).unwrap().expect("object should exist");
    match &obj {
        Object::Blob(blob) => assert_eq!(blob.data, content),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn read_packed_object_through_odb() {
    let (dir, objects_dir) = setup_git_repo();
    let content = b"packed object content\n";
    let oid_hex = git_hash_object(dir.path(), content);

    git_repack(dir.path());
    git_prune_packed(dir.path());

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    let obj = odb.read(&oid).unwrap().expect("object should exist");
    match &obj {
        Object::Blob(blob) => assert_eq!(blob.data, content),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn read_returns_none_for_missing_object() {
    let (_dir, objects_dir) = setup_git_repo();
    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();

    assert!(odb.read(&oid).unwrap().is_none());
}

#[test]
fn read_from_mixed_loose_and_packed() {
    let (dir, objects_dir) = setup_git_repo();

    let content1 = b"first object (will be packed)\n";
    let oid1_hex = git_hash_object(dir.path(), content1);
    git_repack(dir.path());
    git_prune_packed(dir.path());

    let content2 = b"second object (stays loose)\n";
    let oid2_hex = git_hash_object(dir.path(), content2);

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid1 = ObjectId::from_hex(&oid1_hex).unwrap();
    let oid2 = ObjectId::from_hex(&oid2_hex).unwrap();

    let obj1 = odb.read(&oid1).unwrap().expect("packed object should exist");
    match &obj1 {
        Object::Blob(blob) => assert_eq!(blob.data, content1),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }

    let obj2 = odb.read(&oid2).unwrap().expect("loose object should exist");
    match &obj2 {
        Object::Blob(blob) => assert_eq!(blob.data, content2),
        other => panic!("expected blob, got {:?}", other.object_type()),
    }
}

#[test]
fn multiple_packfiles_all_searched() {
    let (dir, objects_dir) = setup_git_repo();

    let content1 = b"pack one object\n";
    let oid1_hex = git_hash_object(dir.path(), content1);
    git_repack(dir.path());
    git_prune_packed(dir.path());

    let content2 = b"pack two object\n";
    let oid2_hex = git_hash_object(dir.path(), content2);
    git_repack(dir.path());
    git_prune_packed(dir.path());

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid1 = ObjectId::from_hex(&oid1_hex).unwrap();
    let oid2 = ObjectId::from_hex(&oid2_hex).unwrap();

    assert!(odb.contains(&oid1), "first object should be found");
    assert!(odb.contains(&oid2), "second object should be found");
}

#[test]
fn read_header_for_loose_object() {
    let (dir, objects_dir) = setup_git_repo();
    let content = b"header test content\n";
    let oid_hex = git_hash_object(dir.path(), content);

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    let info = odb.read_header(&oid).unwrap().expect("header should exist");
    assert_eq!(info.obj_type, ObjectType::Blob);
    assert_eq!(info.size, content.len());
}

#[test]
fn read_header_for_packed_object() {
    let (dir, objects_dir) = setup_git_repo();
    let content = b"packed header test\n";
    let oid_hex = git_hash_object(dir.path(), content);
    git_repack(dir.path());
    git_prune_packed(dir.path());

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    let info = odb.read_header(&oid).unwrap().expect("header should exist");
    assert_eq!(info.obj_type, ObjectType::Blob);
    assert_eq!(info.size, content.len());
}

#[test]
fn read_header_returns_none_for_missing() {
    let (_dir, objects_dir) = setup_git_repo();
    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();

    assert!(odb.read_header(&oid).unwrap().is_none());
}

#[test]
fn contains_loose_object() {
    let (dir, objects_dir) = setup_git_repo();
    let oid_hex = git_hash_object(dir.path(), b"exists check");

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    assert!(odb.contains(&oid));
}

#[test]
fn contains_packed_object() {
    let (dir, objects_dir) = setup_git_repo();
    let oid_hex = git_hash_object(dir.path(), b"packed exists check");
    git_repack(dir.path());
    git_prune_packed(dir.path());

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    assert!(odb.contains(&oid));
}

#[test]
fn contains_returns_false_for_missing() {
    let (_dir, objects_dir) = setup_git_repo();
    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();

    assert!(!odb.contains(&oid));
}

#[test]
fn read_twice_returns_byte_identical_content() {
    let (dir, objects_dir) = setup_git_repo();
    let content = b"cache test content\n";
    let oid_hex = git_hash_object(dir.path(), content);

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();

    let obj1 = odb.read(&oid).unwrap().expect("should exist");
    let obj2 = odb.read(&oid).unwrap().expect("should exist (cached)");
    assert_eq!(obj1, obj2);
}

#[test]
fn packs_present_at_open_are_discovered() {
    let (dir, objects_dir) = setup_git_repo();

    let content = b"created before open\n";
    let oid_hex = git_hash_object(dir.path(), content);
    git_repack(dir.path());
    git_prune_packed(dir.path());

    let odb = ObjectDatabase::open(&objects_dir).unwrap();
    let oid = ObjectId::from_hex(&oid_hex).unwrap();
    assert!(odb.contains(&oid));
}
