//! Source discovery: finds the yz files under a set of source roots.

use std::{
    collections::HashSet,
    io,
    path::{Component, Path, PathBuf},
};

use log::{debug, trace};

/// File extension of yz sources.
pub const SOURCE_SUFFIX: &str = "yz";

/// A discovered source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// The (canonical) root the file was found under.
    pub root: PathBuf,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path of the file relative to `root`.
    pub relative: PathBuf,
}

impl SourceFile {
    /// The segments the parser nests the file's block under, such as
    /// `["parent", "child.yz"]` for `parent/child.yz`.
    pub fn path_segments(&self) -> Vec<String> {
        self.relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }

    /// Name of the compilation unit: the file name without its extension.
    pub fn unit_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Collects every file ending in [`SOURCE_SUFFIX`] under the given roots,
/// sorted by path.
///
/// Roots must be distinct and may not contain one another.
pub fn collect<P: AsRef<Path>>(roots: &[P]) -> Result<Vec<SourceFile>, Error> {
    let mut canonical: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let root = root.as_ref();
        let path = root.canonicalize().map_err(|source| Error::Io {
            path: root.to_path_buf(),
            source,
        })?;
        for other in &canonical {
            if *other == path {
                return Err(Error::DuplicateRoot(path));
            }
            if path.starts_with(other) || other.starts_with(&path) {
                return Err(Error::OverlappingRoots(other.clone(), path));
            }
        }
        canonical.push(path);
    }

    let mut files = Vec::new();
    for root in canonical {
        debug!("walking {}", root.display());
        walk(&root, &mut files)?;
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("found {} source files", files.len());
    Ok(files)
}

fn walk(root: &Path, files: &mut Vec<SourceFile>) -> Result<(), Error> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| Error::Io { path, source }
    };

    let mut stack = vec![root.to_path_buf()];
    let mut visited = HashSet::new();
    while let Some(path) = stack.pop() {
        // Symlinks may lead back into the tree; dangling ones are skipped.
        let Ok(canonical) = path.canonicalize() else {
            trace!("skipping unresolvable {}", path.display());
            continue;
        };
        if !visited.insert(canonical) {
            continue;
        }
        if path.is_dir() {
            for entry in std::fs::read_dir(&path).map_err(io_error(&path))? {
                stack.push(entry.map_err(io_error(&path))?.path());
            }
        } else if is_source(&path) {
            trace!("source {}", path.display());
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.push(SourceFile {
                root: root.to_path_buf(),
                path,
                relative,
            });
        }
    }
    Ok(())
}

fn is_source(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_SUFFIX)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source root {} given twice", .0.display())]
    DuplicateRoot(PathBuf),
    #[error("source roots {} and {} overlap", .0.display(), .1.display())]
    OverlappingRoots(PathBuf, PathBuf),
}
