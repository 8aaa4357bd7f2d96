use kiln_util::fs::{ensure_dir, find_ancestor_with, remove_path, write_atomic};
use tempfile::TempDir;

#[test]
fn test_find_ancestor_with_direct() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Kilnfile"), "").unwrap();
    let result = find_ancestor_with(tmp.path(), "Kilnfile");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_nested() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Kilnfile"), "").unwrap();
    let nested = tmp.path().join("a").join("b").join("c");
    std::fs::create_dir_all(&nested).unwrap();
    let result = find_ancestor_with(&nested, "Kilnfile");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_not_found() {
    let tmp = TempDir::new().unwrap();
    let result = find_ancestor_with(tmp.path(), "NonExistent.file");
    assert_eq!(result, None);
}

#[test]
fn test_ensure_dir_creates_nested() {
    let tmp = TempDir::new().unwrap();
    let deep = tmp.path().join("x").join("y").join("z");
    assert!(!deep.exists());
    ensure_dir(&deep).unwrap();
    assert!(deep.is_dir());
}

#[test]
fn test_write_atomic_replaces_content() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("Kilnfile.resolved");
    write_atomic(&path, b"first").unwrap();
    write_atomic(&path, b"second").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
}

#[test]
fn test_remove_path_missing_is_false() {
    let tmp = TempDir::new().unwrap();
    assert!(!remove_path(&tmp.path().join("nope")).unwrap());
}

#[test]
fn test_remove_path_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("Checkouts").join("A");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("file"), "x").unwrap();
    assert!(remove_path(&tmp.path().join("Checkouts")).unwrap());
    assert!(!tmp.path().join("Checkouts").exists());
}

#[cfg(unix)]
#[test]
fn test_remove_path_symlink_keeps_target() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("target");
    std::fs::create_dir(&target).unwrap();
    let link = tmp.path().join("link");
    kiln_util::fs::symlink_dir(&target, &link).unwrap();
    assert!(remove_path(&link).unwrap());
    assert!(target.is_dir());
}
