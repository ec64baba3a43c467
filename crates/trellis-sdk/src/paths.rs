//! Repository discovery and path helpers.

use std::fs;
use std::path::{Component, Path, PathBuf};

use trellis_status::workdir::REPO_DIR;

/// Where the parts of a repository live below its working tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoPaths {
    work_dir: PathBuf,
}

impl RepoPaths {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.work_dir.join(REPO_DIR)
    }

    pub fn objects(&self) -> PathBuf {
        self.meta_dir().join("objects")
    }

    pub fn refs(&self) -> PathBuf {
        self.meta_dir().join("refs.json")
    }

    pub fn index(&self) -> PathBuf {
        self.meta_dir().join("index")
    }

    pub fn config(&self) -> PathBuf {
        self.meta_dir().join("config.toml")
    }
}

/// Find the working tree containing `start`: the nearest directory at or
/// above it that holds a repository directory.
pub fn discover(start: &Path) -> Option<PathBuf> {
    let start = fs::canonicalize(start).ok()?;
    let mut dir = if start.is_dir() {
        start.as_path()
    } else {
        start.parent()?
    };
    loop {
        if dir.join(REPO_DIR).is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// `path` made absolute and canonical as far as it exists on disk.
///
/// A missing file is resolved through its parent directory.
pub fn canonical(path: &Path) -> PathBuf {
    if let Ok(canon) = fs::canonicalize(path) {
        return canon;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            canonical(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}

/// `path` expressed relative to the directory `base`, using `..` where the
/// two diverge. Components compare case-insensitively. Paths with different
/// roots come back unchanged.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let root = |p: &Path| {
        p.components()
            .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
            .collect::<PathBuf>()
    };
    if base.is_absolute() && path.is_absolute() && root(base) != root(path) {
        return path.to_path_buf();
    }

    let from: Vec<Component<'_>> = base.components().collect();
    let to: Vec<Component<'_>> = path.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| {
            a.as_os_str()
                .to_string_lossy()
                .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
        })
        .count();
    if common == 0 {
        return path.to_path_buf();
    }

    let mut out = PathBuf::new();
    for component in &from[common..] {
        if matches!(component, Component::Normal(_)) {
            out.push("..");
        }
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths() {
        assert_eq!(
            relative_path(Path::new("/work/repo"), Path::new("/work/repo/src/main.rs")),
            PathBuf::from("src/main.rs")
        );
        assert_eq!(
            relative_path(Path::new("/work/repo/docs"), Path::new("/work/repo/src/main.rs")),
            PathBuf::from("../src/main.rs")
        );
        assert_eq!(
            relative_path(Path::new("/Work/Repo"), Path::new("/work/repo/a")),
            PathBuf::from("a")
        );
        assert_eq!(
            relative_path(Path::new("a/b"), Path::new("c/d")),
            PathBuf::from("c/d")
        );
        assert_eq!(
            relative_path(Path::new("/work/repo"), Path::new("/work/repo")),
            PathBuf::new()
        );
    }

    #[test]
    fn discovers_enclosing_repository() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join(REPO_DIR)).unwrap();
        fs::create_dir_all(root.join("src/deep")).unwrap();
        fs::write(root.join("src/deep/file.rs"), b"").unwrap();

        assert_eq!(discover(&root), Some(root.clone()));
        assert_eq!(discover(&root.join("src/deep")), Some(root.clone()));
        assert_eq!(discover(&root.join("src/deep/file.rs")), Some(root.clone()));
        assert_eq!(discover(&root.join("missing")), None);
    }

    #[test]
    fn no_repository_found() {
        let dir = tempfile::tempdir().unwrap();
        // The temp dir itself may sit under a repository; only assert when
        // it does not.
        if let Some(found) = discover(dir.path()) {
            assert!(!found.starts_with(fs::canonicalize(dir.path()).unwrap()));
        }
    }

    #[test]
    fn canonical_resolves_missing_files_through_parent() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(canonical(&dir.path().join("new.txt")), root.join("new.txt"));
    }

    #[test]
    fn repo_layout() {
        let paths = RepoPaths::new("/work");
        assert_eq!(paths.meta_dir(), PathBuf::from("/work/.trellis"));
        assert_eq!(paths.index(), PathBuf::from("/work/.trellis/index"));
        assert_eq!(paths.config(), PathBuf::from("/work/.trellis/config.toml"));
    }
}
