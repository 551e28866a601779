use std::fs;
use std::path::Path;

use depot_stream::{ResultReader, ResultWriter};

use crate::core::UploadMapper;
use crate::data::{MatchSpec, UploadCandidate};
use crate::error::{Error, Result};

/// Resolves a [`MatchSpec`] against the local filesystem for upload.
///
/// The walk starts at the wildcard-free root of the pattern. Entries are visited in
/// name order, so repeated runs dispatch in the same order. Symbolic links are followed
/// unless [`MatchSpec::symlinks`] asks for them to be uploaded as links.
#[derive(Clone, Debug)]
pub struct LocalResolver {
    mapper:       UploadMapper,
    max_depth:    usize,
    include_dirs: bool,
    symlinks:     bool,
}

impl LocalResolver {
    pub fn new(spec: &MatchSpec) -> Result<Self> {
        let mapper = UploadMapper::new(spec)?;
        let max_depth = if spec.recursive { usize::MAX } else { mapper.matcher().depth_below_root() };
        Ok(Self {
            mapper,
            max_depth,
            include_dirs: spec.include_dirs,
            symlinks: spec.symlinks,
        })
    }

    /// Call `visit` for every matching entry. A missing root yields nothing.
    pub fn walk<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(UploadCandidate) -> Result<()>,
    {
        let root = match self.mapper.root() {
            "" => ".",
            root => root,
        };
        if self.symlinks && fs::symlink_metadata(root).is_ok_and(|m| m.file_type().is_symlink()) {
            return self.visit_link(root, &mut visit);
        }
        let meta = match fs::metadata(root) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(root, "upload root does not exist");
                return Ok(());
            }
            Err(source) => return Err(Error::Scan { path: root.into(), source }),
        };

        if meta.is_file() {
            if let Some(candidate) = self.mapper.map(root, false, meta.len()) {
                visit(candidate)?;
            }
            return Ok(());
        }
        self.walk_dir(root, 1, &mut visit)
    }

    /// Collect every match into a disk-backed reader.
    pub fn resolve(&self) -> Result<ResultReader<UploadCandidate>> {
        let writer = ResultWriter::new();
        self.walk(|candidate| Ok(writer.write(&candidate)?))?;
        Ok(writer.finish()?)
    }

    fn walk_dir<F>(&self, dir: &str, depth: usize, visit: &mut F) -> Result<()>
    where
        F: FnMut(UploadCandidate) -> Result<()>,
    {
        if depth > self.max_depth {
            return Ok(());
        }
        let scan_err = |source| Error::Scan { path: dir.into(), source };
        let mut entries = fs::read_dir(dir)
            .map_err(scan_err)?
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(scan_err)?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let path = child_path(dir, &name);

            let file_type = entry.file_type().map_err(scan_err)?;
            if file_type.is_symlink() && self.symlinks {
                self.visit_link(&path, visit)?;
                continue;
            }
            let meta = if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(meta) => meta,
                    Err(e) => {
                        tracing::warn!(path, error = %e, "skipping broken symlink");
                        continue;
                    }
                }
            } else {
                entry.metadata().map_err(scan_err)?
            };

            if meta.is_dir() {
                if self.include_dirs {
                    if let Some(candidate) = self.mapper.map(&path, true, 0) {
                        visit(candidate)?;
                    }
                }
                if !file_type.is_symlink() {
                    self.walk_dir(&path, depth + 1, visit)?;
                }
            } else if let Some(candidate) = self.mapper.map(&path, false, meta.len()) {
                visit(candidate)?;
            }
        }
        Ok(())
    }

    /// Emit the link itself, never its target.
    fn visit_link<F>(&self, path: &str, visit: &mut F) -> Result<()>
    where
        F: FnMut(UploadCandidate) -> Result<()>,
    {
        let dest = fs::read_link(path).map_err(|source| Error::Scan { path: path.into(), source })?;
        if let Some(mut candidate) = self.mapper.map(path, false, 0) {
            candidate.symlink = Some(dest.to_string_lossy().replace('\\', "/"));
            visit(candidate)?;
        }
        Ok(())
    }
}

fn child_path(dir: &str, name: &str) -> String {
    match dir {
        "." => name.to_string(),
        _ if dir.ends_with('/') => format!("{dir}{name}"),
        _ => Path::new(dir).join(name).to_string_lossy().replace('\\', "/"),
    }
}
