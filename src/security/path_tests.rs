use super::*;
use std::fs;
use tempfile::tempdir;

fn sandbox() -> (tempfile::TempDir, PathResolver, PathBuf) {
    let dir = tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    let resolver = PathResolver::sandboxed(&base).unwrap();
    (dir, resolver, base)
}

#[test]
fn test_relative_path_resolves_under_base() {
    let (_dir, resolver, base) = sandbox();
    let resolved = resolver.resolve("subdir/file.txt").unwrap();
    assert_eq!(resolved.as_path(), base.join("subdir").join("file.txt"));
}

#[test]
fn test_reject_parent_directory_traversal() {
    let (_dir, resolver, _base) = sandbox();
    let result = resolver.resolve("../../etc/passwd");
    assert!(result.unwrap_err().is_security_violation());
}

#[test]
fn test_reject_parent_in_middle() {
    let (_dir, resolver, _base) = sandbox();
    let result = resolver.resolve("src/../../outside.txt");
    assert!(result.unwrap_err().is_security_violation());
}

#[test]
fn test_parent_segments_that_stay_inside_are_folded() {
    let (_dir, resolver, base) = sandbox();
    let resolved = resolver.resolve("a/./b/../c.txt").unwrap();
    assert_eq!(resolved.as_path(), base.join("a").join("c.txt"));
}

#[test]
fn test_reject_absolute_path_outside_base() {
    let (_dir, resolver, _base) = sandbox();
    let outside = tempdir().unwrap();
    let result = resolver.resolve(outside.path().join("x.txt"));
    assert!(result.unwrap_err().is_security_violation());
}

#[test]
fn test_absolute_path_inside_base_accepted() {
    let (_dir, resolver, base) = sandbox();
    let inside = base.join("docs").join("readme.md");
    let resolved = resolver.resolve(&inside).unwrap();
    assert_eq!(resolved.as_path(), inside);
}

#[test]
fn test_base_itself_resolves() {
    let (_dir, resolver, base) = sandbox();
    let resolved = resolver.resolve(".").unwrap();
    assert_eq!(resolved.as_path(), base);
}

#[test]
fn test_sibling_with_shared_prefix_rejected() {
    let parent = tempdir().unwrap();
    let base = parent.path().join("sandbox");
    let sibling = parent.path().join("sandboxXYZ");
    fs::create_dir_all(&base).unwrap();
    fs::create_dir_all(&sibling).unwrap();

    let resolver = PathResolver::sandboxed(&base).unwrap();
    let canonical_sibling = fs::canonicalize(&sibling).unwrap();
    let result = resolver.resolve(canonical_sibling.join("file.txt"));
    assert!(result.unwrap_err().is_security_violation());

    let result = resolver.resolve("../sandboxXYZ/file.txt");
    assert!(result.unwrap_err().is_security_violation());
}

#[test]
fn test_reject_empty_path() {
    let (_dir, resolver, _base) = sandbox();
    let err = resolver.resolve("").unwrap_err();
    assert!(err.to_string().contains("Empty path"));

    let err = resolver.resolve("   ").unwrap_err();
    assert!(matches!(err, SandboxError::InvalidPath(_)));
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_rejected() {
    let (_dir, resolver, base) = sandbox();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
    std::os::unix::fs::symlink(outside.path(), base.join("link")).unwrap();

    let result = resolver.resolve("link/secret.txt");
    assert!(result.unwrap_err().is_security_violation());
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_invalid() {
    let (_dir, resolver, base) = sandbox();
    std::os::unix::fs::symlink(base.join("missing-target"), base.join("dangling")).unwrap();

    let err = resolver.resolve("dangling").unwrap_err();
    assert!(matches!(err, SandboxError::InvalidPath(_)));
}

#[test]
fn test_unrestricted_resolver_accepts_any_path() {
    let resolver = PathResolver::unrestricted();
    assert!(!resolver.is_sandboxed());

    let outside = tempdir().unwrap();
    let canonical = fs::canonicalize(outside.path()).unwrap();
    let resolved = resolver.resolve(canonical.join("x").join("..").join("y")).unwrap();
    assert_eq!(resolved.as_path(), canonical.join("y"));
}

#[test]
fn test_trusted_root_resolved_directly() {
    let (_dir, resolver, _base) = sandbox();
    let external = tempdir().unwrap();
    let external_root = fs::canonicalize(external.path()).unwrap();
    let resolver = resolver.with_trusted_root(&external_root).unwrap();

    let resolved = resolver.resolve(external_root.join("photos/a.jpg")).unwrap();
    assert_eq!(resolved.as_path(), external_root.join("photos").join("a.jpg"));

    let result = resolver.resolve(external_root.join("../escape.txt"));
    assert!(result.unwrap_err().is_security_violation());
}

#[test]
fn test_is_root_matches_base_and_trusted_roots() {
    let (_dir, resolver, base) = sandbox();
    let external = tempdir().unwrap();
    let external_root = fs::canonicalize(external.path()).unwrap();
    let resolver = resolver.with_trusted_root(&external_root).unwrap();

    assert!(resolver.is_root(&resolver.resolve(".").unwrap()));
    assert!(resolver.is_root(&base));
    assert!(resolver.is_root(&external_root));
    assert!(!resolver.is_root(&resolver.resolve("child").unwrap()));
    assert!(!PathResolver::unrestricted().is_root(&base));
}

#[cfg(unix)]
#[test]
fn test_boundary_comparison() {
    let root = Path::new("/base");
    assert!(is_within(root, Path::new("/base")));
    assert!(is_within(root, Path::new("/base/a")));
    assert!(!is_within(root, Path::new("/base2")));
    assert!(!is_within(root, Path::new("/base2/a")));
    assert!(!is_within(root, Path::new("/bas")));

    assert!(!is_strictly_within(root, Path::new("/base")));
    assert!(is_strictly_within(root, Path::new("/base/a/b")));
    assert!(is_strictly_within(Path::new("/"), Path::new("/etc")));
}

#[test]
fn test_lenient_canonicalize_missing_tail() {
    let dir = tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    let canonical = canonicalize_lenient(&base.join("new/deeper/../file.txt")).unwrap();
    assert_eq!(canonical, base.join("new").join("file.txt"));
}
