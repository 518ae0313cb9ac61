use super::*;
use crate::security::PathResolver;
use tempfile::tempdir;

struct Fixture {
    _dir: tempfile::TempDir,
    resolver: PathResolver,
    ops: FileOps,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::sandboxed(dir.path()).unwrap();
        Self {
            _dir: dir,
            resolver,
            ops: FileOps::new(7),
        }
    }

    fn path(&self, rel: &str) -> ResolvedPath {
        self.resolver.resolve(rel).unwrap()
    }

    fn write(&self, rel: &str, data: &[u8]) {
        self.ops.write(&self.path(rel), data).unwrap();
    }
}

#[test]
fn test_copy_file_creates_parents() {
    let fx = Fixture::new();
    fx.write("src.txt", b"hello world, streamed in small chunks");

    fx.ops.copy(&fx.path("src.txt"), &fx.path("deep/nested/dst.txt")).unwrap();

    let copied = fx.ops.read(&fx.path("deep/nested/dst.txt")).unwrap();
    assert_eq!(copied, b"hello world, streamed in small chunks");
}

#[test]
fn test_copy_directory_preserves_structure_and_empty_dirs() {
    let fx = Fixture::new();
    fx.write("tree/a.txt", b"a");
    fx.write("tree/sub/b.txt", b"bb");
    fx.ops.create_directory(&fx.path("tree/empty")).unwrap();

    fx.ops.copy(&fx.path("tree"), &fx.path("copy")).unwrap();

    assert_eq!(fx.ops.read(&fx.path("copy/a.txt")).unwrap(), b"a");
    assert_eq!(fx.ops.read(&fx.path("copy/sub/b.txt")).unwrap(), b"bb");
    assert!(fx.path("copy/empty").is_dir());
    assert_eq!(fx.ops.read(&fx.path("tree/a.txt")).unwrap(), b"a");
}

#[test]
fn test_copy_missing_source_fails() {
    let fx = Fixture::new();
    let err = fx.ops.copy(&fx.path("ghost"), &fx.path("out")).unwrap_err();
    assert!(matches!(err, SandboxError::NotFound { .. }));
}

#[test]
fn test_copy_directory_into_itself_rejected() {
    let fx = Fixture::new();
    fx.write("tree/a.txt", b"a");

    let err = fx.ops.copy(&fx.path("tree"), &fx.path("tree/inner")).unwrap_err();
    assert!(matches!(err, SandboxError::InvalidPath(_)));
    assert!(!fx.path("tree/inner").exists());
}

#[test]
fn test_move_renames_file() {
    let fx = Fixture::new();
    fx.write("from.txt", b"payload");

    fx.ops.move_path(&fx.path("from.txt"), &fx.path("to.txt")).unwrap();

    assert!(!fx.path("from.txt").exists());
    assert_eq!(fx.ops.read(&fx.path("to.txt")).unwrap(), b"payload");
}

#[test]
fn test_move_falls_back_to_copy_when_parent_missing() {
    let fx = Fixture::new();
    fx.write("dir/file.txt", b"x");

    fx.ops.move_path(&fx.path("dir"), &fx.path("new/parent/dir")).unwrap();

    assert!(!fx.path("dir").exists());
    assert_eq!(fx.ops.read(&fx.path("new/parent/dir/file.txt")).unwrap(), b"x");
}

#[test]
fn test_move_keeps_source_when_copy_fails() {
    let fx = Fixture::new();
    fx.write("keep.txt", b"precious");
    fx.write("blocker", b"i am a file");

    let result = fx.ops.move_path(&fx.path("keep.txt"), &fx.path("blocker/inner/out.txt"));

    assert!(result.is_err());
    assert_eq!(fx.ops.read(&fx.path("keep.txt")).unwrap(), b"precious");
}

#[test]
fn test_delete_directory_removes_tree() {
    let fx = Fixture::new();
    fx.write("gone/a.txt", b"a");
    fx.write("gone/x/y/z.txt", b"z");
    fx.ops.create_directory(&fx.path("gone/empty")).unwrap();

    fx.ops.delete_directory(&fx.path("gone")).unwrap();
    assert!(!fx.path("gone").exists());
}

#[cfg(unix)]
#[test]
fn test_delete_directory_continues_past_failures() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    fx.write("tree/gone.txt", b"sibling");
    fx.write("tree/locked/stuck.txt", b"stuck");
    let locked = fx.path("tree/locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // privileged users bypass directory permissions, so there is nothing to observe
    let write_check = locked.join("write-check");
    if fs::write(&write_check, b"").is_ok() {
        let _ = fs::remove_file(&write_check);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = fx.ops.delete_directory(&fx.path("tree"));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // stuck.txt, then locked/ and tree/ which are left non-empty
    match result {
        Err(SandboxError::DeleteIncomplete { failed, .. }) => assert_eq!(failed, 3),
        other => panic!("expected DeleteIncomplete, got {other:?}"),
    }
    assert!(!fx.path("tree/gone.txt").exists());
    assert!(fx.path("tree/locked/stuck.txt").exists());
}

#[test]
fn test_delete_directory_on_file() {
    let fx = Fixture::new();
    fx.write("single.txt", b"1");

    fx.ops.delete_directory(&fx.path("single.txt")).unwrap();
    assert!(!fx.path("single.txt").exists());
}

#[test]
fn test_remove_is_idempotent() {
    let fx = Fixture::new();
    assert!(fx.ops.remove(&fx.path("never-existed")).is_ok());

    fx.write("once.txt", b"1");
    assert!(fx.ops.remove(&fx.path("once.txt")).is_ok());
    assert!(fx.ops.remove(&fx.path("once.txt")).is_ok());
}

#[test]
fn test_delete_missing_path_fails() {
    let fx = Fixture::new();
    let err = fx.ops.delete(&fx.path("missing.txt")).unwrap_err();
    assert!(matches!(err, SandboxError::NotFound { .. }));
}

#[test]
fn test_create_directory_is_idempotent() {
    let fx = Fixture::new();
    fx.ops.create_directory(&fx.path("a/b/c")).unwrap();
    assert!(fx.path("a/b/c").is_dir());
    fx.ops.create_directory(&fx.path("a/b/c")).unwrap();

    fx.write("file.txt", b"x");
    fx.ops.create_directory(&fx.path("file.txt")).unwrap();
    assert!(fx.path("file.txt").is_file());
}

#[test]
fn test_append_creates_then_extends() {
    let fx = Fixture::new();
    fx.ops.append(&fx.path("log/out.txt"), b"one\n").unwrap();
    fx.ops.append(&fx.path("log/out.txt"), b"two\n").unwrap();
    assert_eq!(fx.ops.read(&fx.path("log/out.txt")).unwrap(), b"one\ntwo\n");
}

#[test]
fn test_metadata_snapshot() {
    let fx = Fixture::new();
    fx.write("meta/info.txt", b"12345");

    let entry = fx.ops.metadata(&fx.path("meta/info.txt")).unwrap();
    assert_eq!(entry.name, "info.txt");
    assert!(!entry.is_directory);
    assert_eq!(entry.size_bytes, 5);
    assert!(entry.last_modified_epoch_ms > 0);

    let dir = fx.ops.metadata(&fx.path("meta")).unwrap();
    assert!(dir.is_directory);
    assert_eq!(dir.size_bytes, 0);
}

#[test]
fn test_storage_size_sums_subtree() {
    let fx = Fixture::new();
    fx.write("data/a.bin", &[0u8; 1024]);
    fx.write("data/sub/b.bin", &[0u8; 2048]);
    fx.ops.create_directory(&fx.path("data/empty")).unwrap();

    assert_eq!(byte_size(&fx.path("data")), Some(3072));
    assert_eq!(storage_size(&fx.path("data"), SizeUnit::Kb), Some(3.0));
    assert_eq!(storage_size(&fx.path("data/a.bin"), SizeUnit::B), Some(1024.0));
    assert_eq!(storage_size(&fx.path("data/nope"), SizeUnit::Mb), None);
}

#[test]
fn test_storage_size_is_additive_over_children() {
    let fx = Fixture::new();
    fx.write("root/x.txt", b"abc");
    fx.write("root/d1/y.txt", b"defgh");
    fx.write("root/d1/d2/z.txt", b"ij");

    let children: u64 = ["root/x.txt", "root/d1"]
        .iter()
        .map(|p| byte_size(&fx.path(p)).unwrap())
        .sum();
    assert_eq!(byte_size(&fx.path("root")), Some(children));
}

#[test]
fn test_size_unit_conversion_and_parsing() {
    assert_eq!(SizeUnit::Mb.convert(1024 * 1024), 1.0);
    assert_eq!(SizeUnit::Kb.convert(1536), 1.5);
    assert_eq!(SizeUnit::Kb.convert(1000), 0.98);
    assert_eq!(SizeUnit::Gb.convert(0), 0.0);

    assert_eq!(SizeUnit::from_name_or_default(Some("KB")), SizeUnit::Kb);
    assert_eq!(SizeUnit::from_name_or_default(Some("parsecs")), SizeUnit::Mb);
    assert_eq!(SizeUnit::from_name_or_default(None), SizeUnit::Mb);
}
