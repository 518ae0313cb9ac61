use super::*;
use crate::security::PathResolver;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[derive(Default)]
struct Recorder;

#[derive(Debug, PartialEq)]
enum Seen {
    Dir(String),
    File(String),
}

impl Visitor<Vec<Seen>> for Recorder {
    fn on_file(&mut self, entry: &WalkEntry<'_>, ctx: &mut Vec<Seen>) {
        ctx.push(Seen::File(entry.relative_name()));
    }

    fn on_dir(&mut self, entry: &WalkEntry<'_>, ctx: &mut Vec<Seen>) {
        ctx.push(Seen::Dir(entry.relative_name()));
    }
}

fn resolve(path: &Path) -> ResolvedPath {
    PathResolver::unrestricted().resolve(path).unwrap()
}

fn sample_tree(root: &Path) {
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("top.txt"), b"top").unwrap();
    fs::write(root.join("a/one.txt"), b"one").unwrap();
    fs::write(root.join("a/b/two.txt"), b"two").unwrap();
}

fn position(seen: &[Seen], wanted: &Seen) -> usize {
    seen.iter().position(|s| s == wanted).unwrap()
}

#[test]
fn test_pre_order_visits_directory_before_contents() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());

    let seen = DirectoryWalker::pre_order().walk(&resolve(dir.path()), &mut Recorder, Vec::new());

    assert_eq!(seen[0], Seen::Dir(String::new()));
    assert!(position(&seen, &Seen::Dir("a".into())) < position(&seen, &Seen::File("a/one.txt".into())));
    assert!(position(&seen, &Seen::Dir("a/b".into())) < position(&seen, &Seen::File("a/b/two.txt".into())));
    assert_eq!(seen.len(), 7);
}

#[test]
fn test_post_order_visits_directory_after_contents() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());

    let seen = DirectoryWalker::post_order().walk(&resolve(dir.path()), &mut Recorder, Vec::new());

    assert_eq!(seen.last(), Some(&Seen::Dir(String::new())));
    let a = position(&seen, &Seen::Dir("a".into()));
    assert!(position(&seen, &Seen::File("a/one.txt".into())) < a);
    assert!(position(&seen, &Seen::Dir("a/b".into())) < a);
    assert!(position(&seen, &Seen::File("a/b/two.txt".into())) < a);
}

#[test]
fn test_missing_root_returns_context_unchanged() {
    let dir = tempdir().unwrap();
    let missing = resolve(&dir.path().join("nope"));

    let seen = DirectoryWalker::pre_order().walk(&missing, &mut Recorder, vec![Seen::File("seed".into())]);
    assert_eq!(seen, vec![Seen::File("seed".into())]);
}

#[test]
fn test_file_root_yields_single_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("lonely.txt");
    fs::write(&file, b"x").unwrap();

    let seen = DirectoryWalker::post_order().walk(&resolve(&file), &mut Recorder, Vec::new());
    assert_eq!(seen, vec![Seen::File(String::new())]);
}

#[test]
fn test_deep_tree_does_not_exhaust_stack() {
    let dir = tempdir().unwrap();
    let mut deep = dir.path().to_path_buf();
    for _ in 0..200 {
        deep.push("d");
    }
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join("leaf.txt"), b"leaf").unwrap();

    struct Depth;
    impl Visitor<usize> for Depth {
        fn on_file(&mut self, entry: &WalkEntry<'_>, ctx: &mut usize) {
            *ctx = entry.depth();
        }
    }

    let depth = DirectoryWalker::pre_order().walk(&resolve(dir.path()), &mut Depth, 0);
    assert_eq!(depth, 201);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_leaves() {
    let dir = tempdir().unwrap();
    let target = tempdir().unwrap();
    fs::write(target.path().join("hidden.txt"), b"x").unwrap();
    std::os::unix::fs::symlink(target.path(), dir.path().join("link")).unwrap();

    let seen = DirectoryWalker::pre_order().walk(&resolve(dir.path()), &mut Recorder, Vec::new());
    assert!(seen.contains(&Seen::File("link".into())));
    assert!(!seen.iter().any(|s| matches!(s, Seen::File(name) if name.contains("hidden"))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_does_not_abort_walk() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir_all(&locked).unwrap();
    fs::write(locked.join("inside.txt"), b"x").unwrap();
    fs::write(dir.path().join("visible.txt"), b"x").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let seen = DirectoryWalker::pre_order().walk(&resolve(dir.path()), &mut Recorder, Vec::new());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    assert!(seen.contains(&Seen::File("visible.txt".into())));
    assert!(seen.contains(&Seen::Dir("locked".into())));
}
