//! Truss Directory Utilities
//!
//! Tree copy/remove and staleness helpers for packaged model directories,
//! plus deterministic shadow-directory naming under the `~/.truss/models`
//! cache root.
//!
//! All recursive walks refuse to traverse symlinks: a packaged directory
//! containing a link is rejected outright rather than risking loops or
//! escapes out of the tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::gitignore::GitignoreBuilder;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use crate::constants::cache;
use crate::types::{Result, TrussError};

// =============================================================================
// Tree Copy / Remove
// =============================================================================

/// Recursively copy a directory tree, returning the copied file paths.
///
/// Creates `dest` (and parents) as needed. Fails with
/// [`TrussError::SymlinkNotAllowed`] on the first symlink encountered.
pub fn copy_tree_path(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    ensure_not_symlink(src)?;
    if !src.is_dir() {
        return Err(TrussError::NotADirectory(src.to_path_buf()));
    }

    fs::create_dir_all(dest)?;
    let mut copied = Vec::new();

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        ensure_not_symlink(&path)?;

        let target = dest.join(entry.file_name());
        if path.is_dir() {
            copied.extend(copy_tree_path(&path, &target)?);
        } else {
            fs::copy(&path, &target)?;
            copied.push(target);
        }
    }

    Ok(copied)
}

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file_path(src: &Path, dest: &Path) -> Result<()> {
    ensure_not_symlink(src)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dest)?;
    Ok(())
}

/// Copy a file or a whole tree depending on what `src` is.
pub fn copy_tree_or_file(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    if src.is_file() {
        copy_file_path(src, dest)?;
        return Ok(vec![dest.to_path_buf()]);
    }
    copy_tree_path(src, dest)
}

/// Recursively remove a directory tree.
///
/// Walks the tree explicitly so a symlink anywhere inside aborts the removal
/// before anything outside the tree can be touched.
pub fn remove_tree_path(target: &Path) -> Result<()> {
    ensure_not_symlink(target)?;
    if !target.is_dir() {
        return Err(TrussError::NotADirectory(target.to_path_buf()));
    }

    for entry in fs::read_dir(target)? {
        let entry = entry?;
        let path = entry.path();
        ensure_not_symlink(&path)?;

        if path.is_dir() {
            remove_tree_path(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    fs::remove_dir(target)?;
    Ok(())
}

fn ensure_not_symlink(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path)?.file_type().is_symlink() {
        return Err(TrussError::SymlinkNotAllowed(path.to_path_buf()));
    }
    Ok(())
}

// =============================================================================
// Staleness
// =============================================================================

/// Maximum modification time across a directory tree.
///
/// Dot-files and dot-directories are skipped, so editor droppings do not mark
/// a cached package stale. Fails on any symlink encountered.
pub fn max_modified_time_of_dir(path: &Path) -> Result<SystemTime> {
    ensure_not_symlink(path)?;
    let mut max_modified = fs::metadata(path)?.modified()?;
    visit_modified_times(path, &mut max_modified)?;
    Ok(max_modified)
}

fn visit_modified_times(dir: &Path, max_modified: &mut SystemTime) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        ensure_not_symlink(&path)?;

        let modified = entry.metadata()?.modified()?;
        if modified > *max_modified {
            *max_modified = modified;
        }

        if path.is_dir() {
            visit_modified_times(&path, max_modified)?;
        }
    }
    Ok(())
}

// =============================================================================
// Target Directories
// =============================================================================

/// Deterministic, collision-resistant directory name for a source path.
///
/// SHA-256 over the absolute form of the path, hex encoded. The same source
/// path always maps to the same shadow name.
pub fn shadow_dirname(source: &Path) -> Result<String> {
    let absolute = std::path::absolute(source)?;
    let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
    Ok(format!("{:x}", digest))
}

/// Root under which packaged model directories live (`~/.truss/models`).
pub fn models_root() -> Result<PathBuf> {
    let base = directories::BaseDirs::new()
        .ok_or(TrussError::UnresolvedDirectory("home"))?;
    Ok(base
        .home_dir()
        .join(cache::TRUSS_DIR)
        .join(cache::MODELS_DIR))
}

/// Create a fresh `<stub>-<random>` directory under the models root.
pub fn build_target_directory(stub: &str) -> Result<PathBuf> {
    target_directory_in(&models_root()?, stub)
}

/// Create (or reuse) the `<stub>-<hash>` shadow directory for a source path.
pub fn build_shadow_target_directory(stub: &str, source: &Path) -> Result<PathBuf> {
    shadow_target_directory_in(&models_root()?, stub, source)
}

fn target_directory_in(root: &Path, stub: &str) -> Result<PathBuf> {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(cache::RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();
    let target = root.join(format!("{}-{}", stub, suffix));
    fs::create_dir_all(&target)?;
    Ok(target)
}

fn shadow_target_directory_in(root: &Path, stub: &str, source: &Path) -> Result<PathBuf> {
    let suffix = shadow_dirname(source)?;
    let target = root.join(format!("{}-{}", stub, suffix));
    fs::create_dir_all(&target)?;
    Ok(target)
}

// =============================================================================
// Scratch Directories
// =============================================================================

/// A working directory that is either caller-provided or temporary.
///
/// The temporary variant is deleted when the value is dropped; a given
/// directory is left untouched.
pub enum ScratchDir {
    Given(PathBuf),
    Temporary(TempDir),
}

impl ScratchDir {
    pub fn new(given: Option<PathBuf>) -> Result<Self> {
        match given {
            Some(dir) => Ok(Self::Given(dir)),
            None => Ok(Self::Temporary(tempfile::tempdir()?)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Given(dir) => dir,
            Self::Temporary(temp) => temp.path(),
        }
    }
}

// =============================================================================
// Ignore Scrubbing
// =============================================================================

/// Delete files and directories matching `.gitignore`-style patterns from a
/// packaged tree.
///
/// Used to strip build artifacts and caches before a directory is hashed and
/// uploaded.
pub fn remove_ignored_files(directory: &Path, gitignore_file: &Path) -> Result<()> {
    let mut builder = GitignoreBuilder::new(directory);
    if let Some(err) = builder.add(gitignore_file) {
        return Err(TrussError::config(format!(
            "invalid ignore file {}: {}",
            gitignore_file.display(),
            err
        )));
    }
    let matcher = builder
        .build()
        .map_err(|e| TrussError::config(format!("invalid ignore patterns: {}", e)))?;

    scrub_dir(directory, &matcher)
}

fn scrub_dir(dir: &Path, matcher: &ignore::gitignore::Gitignore) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = path.is_dir();

        if matcher.matched(&path, is_dir).is_ignore() {
            tracing::debug!("Removing ignored path: {}", path.display());
            if is_dir {
                remove_tree_path(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            continue;
        }

        if is_dir {
            scrub_dir(&path, matcher)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copy_tree_copies_nested_files() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&src.path().join("model.py"), "print('hi')");
        write(&src.path().join("data/weights.bin"), "0000");

        let dest_root = dest.path().join("copy");
        let copied = copy_tree_path(src.path(), &dest_root).unwrap();

        assert_eq!(copied.len(), 2);
        assert!(dest_root.join("model.py").is_file());
        assert!(dest_root.join("data/weights.bin").is_file());
    }

    #[test]
    fn test_copy_tree_or_file_on_file() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = src.path().join("config.yaml");
        write(&file, "model_name: test");

        let target = dest.path().join("out/config.yaml");
        let copied = copy_tree_or_file(&file, &target).unwrap();

        assert_eq!(copied, vec![target.clone()]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "model_name: test");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_rejects_symlink() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&src.path().join("model.py"), "");
        std::os::unix::fs::symlink(src.path().join("model.py"), src.path().join("link.py"))
            .unwrap();

        let result = copy_tree_path(src.path(), &dest.path().join("copy"));
        assert!(matches!(result, Err(TrussError::SymlinkNotAllowed(_))));
    }

    #[test]
    fn test_remove_tree_removes_everything() {
        let root = TempDir::new().unwrap();
        let tree = root.path().join("pkg");
        write(&tree.join("a/b/c.txt"), "x");
        write(&tree.join("top.txt"), "y");

        remove_tree_path(&tree).unwrap();
        assert!(!tree.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_tree_rejects_symlink() {
        let root = TempDir::new().unwrap();
        let tree = root.path().join("pkg");
        write(&tree.join("real.txt"), "x");
        std::os::unix::fs::symlink(tree.join("real.txt"), tree.join("link.txt")).unwrap();

        let result = remove_tree_path(&tree);
        assert!(matches!(result, Err(TrussError::SymlinkNotAllowed(_))));
        // The link itself was never followed or removed
        assert!(tree.join("link.txt").symlink_metadata().is_ok());
    }

    #[test]
    fn test_max_modified_time_matches_latest_file() {
        let root = TempDir::new().unwrap();
        write(&root.path().join("a.txt"), "1");
        write(&root.path().join("nested/deep/b.txt"), "2");

        let expected = [
            fs::metadata(root.path()).unwrap().modified().unwrap(),
            fs::metadata(root.path().join("a.txt")).unwrap().modified().unwrap(),
            fs::metadata(root.path().join("nested")).unwrap().modified().unwrap(),
            fs::metadata(root.path().join("nested/deep")).unwrap().modified().unwrap(),
            fs::metadata(root.path().join("nested/deep/b.txt"))
                .unwrap()
                .modified()
                .unwrap(),
        ]
        .into_iter()
        .max()
        .unwrap();

        assert_eq!(max_modified_time_of_dir(root.path()).unwrap(), expected);
    }

    #[test]
    fn test_max_modified_time_skips_dot_entries() {
        let root = TempDir::new().unwrap();
        write(&root.path().join("a.txt"), "1");
        write(&root.path().join(".cache/blob"), "2");
        let baseline = max_modified_time_of_dir(root.path()).unwrap();

        // Later writes inside the dot-directory must not move the result
        std::thread::sleep(std::time::Duration::from_millis(20));
        write(&root.path().join(".cache/blob"), "updated");

        assert_eq!(max_modified_time_of_dir(root.path()).unwrap(), baseline);
    }

    #[cfg(unix)]
    #[test]
    fn test_max_modified_time_rejects_symlink() {
        let root = TempDir::new().unwrap();
        write(&root.path().join("a.txt"), "1");
        std::os::unix::fs::symlink(root.path().join("a.txt"), root.path().join("b.txt")).unwrap();

        let result = max_modified_time_of_dir(root.path());
        assert!(matches!(result, Err(TrussError::SymlinkNotAllowed(_))));
    }

    #[test]
    fn test_shadow_target_directory_is_stable() {
        let root = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();

        let first = shadow_target_directory_in(root.path(), "model", source.path()).unwrap();
        let second = shadow_target_directory_in(root.path(), "model", source.path()).unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("model-"));
    }

    #[test]
    fn test_target_directory_uses_random_suffix() {
        let root = TempDir::new().unwrap();
        let first = target_directory_in(root.path(), "model").unwrap();
        let second = target_directory_in(root.path(), "model").unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
    }

    #[test]
    fn test_scratch_dir_given_and_temporary() {
        let given = TempDir::new().unwrap();
        let scratch = ScratchDir::new(Some(given.path().to_path_buf())).unwrap();
        assert_eq!(scratch.path(), given.path());

        let temp_path;
        {
            let scratch = ScratchDir::new(None).unwrap();
            temp_path = scratch.path().to_path_buf();
            assert!(temp_path.is_dir());
        }
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_remove_ignored_files() {
        let root = TempDir::new().unwrap();
        write(&root.path().join("model.py"), "keep");
        write(&root.path().join("model.pyc"), "scrub");
        write(&root.path().join("__pycache__/cached.pyc"), "scrub");

        let ignore_file = root.path().join("ignore.txt");
        write(&ignore_file, "*.pyc\n__pycache__/\n");

        remove_ignored_files(root.path(), &ignore_file).unwrap();

        assert!(root.path().join("model.py").exists());
        assert!(!root.path().join("model.pyc").exists());
        assert!(!root.path().join("__pycache__").exists());
    }

    proptest! {
        #[test]
        fn prop_shadow_dirname_is_deterministic_hex(name in "[a-z][a-z0-9_-]{0,24}") {
            let path = Path::new("/srv/models").join(&name);
            let first = shadow_dirname(&path).unwrap();
            let second = shadow_dirname(&path).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), 64);
            prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

            let other = shadow_dirname(&Path::new("/srv/models").join(format!("{}x", name)))
                .unwrap();
            prop_assert_ne!(first, other);
        }
    }
}
