use serde::{Deserialize, Serialize};

use super::properties::Properties;
use crate::core::PatternMatcher;
use crate::error::{Error, Result};

/// Which items to operate on and where to place them.
///
/// # Examples
///
/// ```
/// use depot_spec::MatchSpec;
///
/// let spec = MatchSpec::new("libs-release/(*)/*.jar")
///     .target("out/{1}/")
///     .flat(true)
///     .exclude("*-sources.jar");
/// assert!(spec.recursive);
/// spec.validate().unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSpec {
    /// Glob with optional capture groups in parentheses.
    pub pattern: String,

    /// Destination, which may reference groups as `{1}`, `{2}`.
    ///
    /// A trailing `/` marks a directory. Otherwise the last segment names the file.
    pub target: String,

    /// Descend into subdirectories below the fixed part of the pattern.
    pub recursive: bool,

    /// Drop the source directory structure from the destination.
    pub flat: bool,

    /// Include folder entries as candidates.
    pub include_dirs: bool,

    /// Globs matched against the full path; matching items are dropped.
    pub exclusions: Vec<String>,

    /// Only items carrying all of these properties are matched on download.
    /// On upload they are attached to every artifact.
    pub props: Option<Properties>,

    /// Transfer symbolic links as links instead of following them.
    ///
    /// Uploads record the link target in the `symlink.dest` property of an empty
    /// artifact. Downloads recreate the link from that property.
    pub symlinks: bool,
}

impl Default for MatchSpec {
    fn default() -> Self {
        Self {
            pattern:      String::new(),
            target:       String::new(),
            recursive:    true,
            flat:         false,
            include_dirs: false,
            exclusions:   Vec::new(),
            props:        None,
            symlinks:     false,
        }
    }
}

impl MatchSpec {
    pub fn new(pattern: impl Into<String>) -> Self { Self { pattern: pattern.into(), ..Self::default() } }

    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn flat(mut self, flat: bool) -> Self {
        self.flat = flat;
        self
    }

    #[must_use]
    pub fn include_dirs(mut self, include_dirs: bool) -> Self {
        self.include_dirs = include_dirs;
        self
    }

    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclusions.push(pattern.into());
        self
    }

    #[must_use]
    pub fn props(mut self, props: Properties) -> Self {
        self.props = Some(props);
        self
    }

    #[must_use]
    pub fn symlinks(mut self, symlinks: bool) -> Self {
        self.symlinks = symlinks;
        self
    }

    /// Parse and attach properties in `k=v1,v2;k2=v3` form.
    pub fn with_props_str(self, props: &str) -> Result<Self> { Ok(self.props(Properties::parse(props)?)) }

    /// Compile the pattern and exclusions, checking every placeholder in the target.
    ///
    /// Errors here are configuration errors and never involve I/O.
    pub fn validate(&self) -> Result<()> {
        self.matcher()?;
        self.exclusion_matchers()?;
        Ok(())
    }

    pub(crate) fn matcher(&self) -> Result<PatternMatcher> {
        if self.pattern.trim().is_empty() {
            return Err(Error::InvalidPattern {
                pattern: self.pattern.clone(),
                reason:  "pattern is empty".into(),
            });
        }
        PatternMatcher::compile(&self.pattern, &self.target, self.recursive)
    }

    /// Remote patterns always start with a repository, so a bare name means the whole repository.
    pub(crate) fn remote_matcher(&self) -> Result<PatternMatcher> {
        if self.pattern.contains('/') {
            return self.matcher();
        }
        let mut spec = self.clone();
        spec.pattern.push('/');
        spec.matcher()
    }

    pub(crate) fn exclusion_matchers(&self) -> Result<Vec<PatternMatcher>> {
        self.exclusions.iter().map(|e| PatternMatcher::exclusion(e)).collect()
    }
}
