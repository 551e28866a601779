use crate::data::{Candidate, MatchSpec, Properties, RemoteItem, SYMLINK_DEST, UploadCandidate};
use crate::error::Result;

use super::pattern::PatternMatcher;

/// Join two path fragments with a single `/`, treating empty and `.` as absent.
pub fn join_path(base: &str, child: &str) -> String {
    let base_absent = base.is_empty() || base == ".";
    let child_absent = child.is_empty() || child == ".";
    match (base_absent, child_absent) {
        (true, true) => String::new(),
        (true, false) => child.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base.trim_end_matches('/'), child.trim_start_matches('/')),
    }
}

fn split_last(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Local destination for a downloaded item.
///
/// The last segment of `target` renames the file unless it is empty or `.`.
/// Without `flat` or placeholders, the item's directory inside the repository is kept.
///
/// ```
/// use depot_spec::local_destination;
///
/// assert_eq!(local_destination("out/", "a/b", "x.jar", false, false), "out/a/b/x.jar");
/// assert_eq!(local_destination("out/", "a/b", "x.jar", true, false), "out/x.jar");
/// assert_eq!(local_destination("out/y.jar", ".", "x.jar", false, false), "out/y.jar");
/// ```
pub fn local_destination(target: &str, item_path: &str, name: &str, flat: bool, placeholders_used: bool) -> String {
    let (dir, file) = split_last(target);
    let dir = if flat || placeholders_used { dir.to_string() } else { join_path(dir, item_path) };
    let file = if file.is_empty() || file == "." { name } else { file };
    join_path(&dir, file)
}

/// Maps remote items matched by a spec to download candidates.
#[derive(Clone, Debug)]
pub struct DownloadMapper {
    matcher:      PatternMatcher,
    exclusions:   Vec<PatternMatcher>,
    flat:         bool,
    include_dirs: bool,
    props:        Option<Properties>,
    symlinks:     bool,
}

impl DownloadMapper {
    pub fn new(spec: &MatchSpec) -> Result<Self> {
        Ok(Self {
            matcher:      spec.remote_matcher()?,
            exclusions:   spec.exclusion_matchers()?,
            flat:         spec.flat,
            include_dirs: spec.include_dirs,
            props:        spec.props.clone().filter(|p| !p.is_empty()),
            symlinks:     spec.symlinks,
        })
    }

    /// `None` when the item does not match, is excluded, or is filtered out.
    pub fn map(&self, item: &RemoteItem) -> Option<Candidate> {
        if item.is_folder() && !self.include_dirs {
            return None;
        }
        let full = item.full_path();
        if self.exclusions.iter().any(|e| e.is_match(&full)) {
            return None;
        }
        if let Some(filter) = &self.props {
            if !item.properties.contains_all(filter) {
                return None;
            }
        }
        let (target, used) = self.matcher.resolve_target(&full)?;
        let destination = local_destination(&target, &item.path, &item.name, self.flat, used);
        let symlink = self
            .symlinks
            .then(|| item.properties.get(SYMLINK_DEST).and_then(|v| v.first().cloned()))
            .flatten();

        Some(Candidate {
            repo_path: full,
            name: item.name.clone(),
            is_folder: item.is_folder(),
            size: item.size,
            checksums: item.checksums(),
            properties: item.properties.clone(),
            destination,
            symlink,
        })
    }
}

/// Maps local paths matched by a spec to upload candidates.
#[derive(Clone, Debug)]
pub struct UploadMapper {
    matcher:    PatternMatcher,
    exclusions: Vec<PatternMatcher>,
    flat:       bool,
    root:       String,
    props:      Properties,
}

impl UploadMapper {
    pub fn new(spec: &MatchSpec) -> Result<Self> {
        let matcher = spec.matcher()?;
        Ok(Self {
            root: matcher.root(),
            matcher,
            exclusions: spec.exclusion_matchers()?,
            flat: spec.flat,
            props: spec.props.clone().unwrap_or_default(),
        })
    }

    pub fn matcher(&self) -> &PatternMatcher { &self.matcher }

    /// Directory the filesystem walk starts from.
    pub fn root(&self) -> &str { &self.root }

    /// Remote target for `local_path`, or `None` when it does not match or is excluded.
    ///
    /// A target without `/` names a repository. A target ending in `/` is a directory:
    /// the file name is appended when flat or placeholders were used, and otherwise the
    /// path relative to the walk root.
    pub fn target(&self, local_path: &str) -> Option<String> {
        if self.exclusions.iter().any(|e| e.is_match(local_path)) {
            return None;
        }
        let (mut target, used) = self.matcher.resolve_target(local_path)?;
        if !target.contains('/') {
            target.push('/');
        }
        if !target.ends_with('/') {
            return Some(target);
        }
        let (_, name) = split_last(local_path);
        let tail = if self.flat || used { name } else { self.relative(local_path).unwrap_or(name) };
        Some(format!("{target}{tail}"))
    }

    pub fn map(&self, local_path: &str, is_dir: bool, size: u64) -> Option<UploadCandidate> {
        let target = self.target(local_path)?;
        Some(UploadCandidate {
            local_path: local_path.to_string(),
            target,
            is_dir,
            size,
            properties: self.props.clone(),
            symlink: None,
        })
    }

    fn relative<'a>(&self, local_path: &'a str) -> Option<&'a str> {
        let rel = match self.root.as_str() {
            "" | "." => local_path,
            "/" => local_path.strip_prefix('/')?,
            root => local_path.strip_prefix(root)?.strip_prefix('/')?,
        };
        (!rel.is_empty()).then_some(rel)
    }
}
