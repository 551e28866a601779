use serde_json::{Map, Value, json};

use super::mapping::join_path;
use crate::data::{MatchSpec, Properties};
use crate::error::Result;

/// Fields every query row carries.
pub const INCLUDED_FIELDS: [&str; 9] =
    ["name", "repo", "path", "actual_md5", "actual_sha1", "sha256", "size", "type", "property"];

/// One `repo`/`path`/`name` wildcard triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTriple {
    pub repo: String,
    pub path: String,
    pub name: String,
}

impl PathTriple {
    pub fn new(repo: impl Into<String>, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self { repo: repo.into(), path: path.into(), name: name.into() }
    }

    fn repo_clause(&self, op: &str) -> Value {
        if self.repo.contains('*') || op == "$nmatch" {
            json!({ op: self.repo })
        } else {
            Value::String(self.repo.clone())
        }
    }

    fn to_match(&self) -> Value {
        json!({
            "repo": self.repo_clause("$match"),
            "path": { "$match": self.path },
            "name": { "$match": self.name },
        })
    }

    fn to_nmatch(&self) -> Value {
        json!({ "$or": [
            { "repo": self.repo_clause("$nmatch") },
            { "path": { "$nmatch": self.path } },
            { "name": { "$nmatch": self.name } },
        ]})
    }
}

/// Split a `repo/path/name` pattern into query triples.
///
/// The first segment is the repository. When recursive and the name holds a wildcard,
/// a second triple widens the path to any depth below the fixed directory.
///
/// ```
/// use depot_spec::{PathTriple, path_triples};
///
/// assert_eq!(path_triples("repo/a/*.jar", false), [PathTriple::new("repo", "a", "*.jar")]);
/// assert_eq!(path_triples("repo/*.jar", true), [
///     PathTriple::new("repo", ".", "*.jar"),
///     PathTriple::new("repo", "*", "*.jar"),
/// ]);
/// ```
pub fn path_triples(pattern: &str, recursive: bool) -> Vec<PathTriple> {
    let (repo, rest) = pattern.split_once('/').unwrap_or((pattern, ""));
    let mut rest = rest.to_string();
    if rest.is_empty() || rest.ends_with('/') {
        rest.push('*');
    }
    let (path, name) = match rest.rsplit_once('/') {
        Some((path, name)) => (path.to_string(), name.to_string()),
        None => (".".to_string(), rest),
    };

    let mut triples = vec![PathTriple::new(repo, path.as_str(), name.as_str())];
    if recursive && name.contains('*') {
        let deep = PathTriple::new(repo, join_path(&path, "*"), name.as_str());
        if !triples.contains(&deep) {
            triples.push(deep);
        }
    }
    triples
}

/// Exclusion globs may omit the repository, in which case they apply to all of them.
fn exclusion_triples(pattern: &str) -> Vec<PathTriple> {
    if pattern.contains('/') {
        path_triples(pattern, true)
    } else {
        vec![PathTriple::new("*", "*", pattern)]
    }
}

/// A compiled remote item query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemQuery {
    pub triples:      Vec<PathTriple>,
    pub exclusions:   Vec<PathTriple>,
    pub include_dirs: bool,
    pub props:        Option<Properties>,
}

impl ItemQuery {
    pub fn from_spec(spec: &MatchSpec) -> Result<Self> {
        let matcher = spec.remote_matcher()?;
        spec.exclusion_matchers()?;
        Ok(Self {
            triples:      path_triples(matcher.literal(), spec.recursive),
            exclusions:   spec.exclusions.iter().flat_map(|e| exclusion_triples(e)).collect(),
            include_dirs: spec.include_dirs,
            props:        spec.props.clone().filter(|p| !p.is_empty()),
        })
    }

    /// The query body as a JSON object.
    pub fn criteria(&self) -> Value {
        let mut clauses = vec![json!({ "$or": self.triples.iter().map(PathTriple::to_match).collect::<Vec<_>>() })];
        clauses.extend(self.exclusions.iter().map(PathTriple::to_nmatch));
        clauses.push(json!({ "type": if self.include_dirs { "any" } else { "file" } }));

        if let Some(props) = &self.props {
            for key in props.keys() {
                let values = props.get(key).unwrap_or_default();
                let every: Vec<Value> = values
                    .iter()
                    .map(|v| {
                        let mut prop = Map::new();
                        prop.insert(format!("@{key}"), json!({ "$match": v }));
                        Value::Object(prop)
                    })
                    .collect();
                clauses.push(json!({ "$and": every }));
            }
        }
        json!({ "$and": clauses })
    }

    /// AQL text: `items.find({...}).include(...)`.
    pub fn to_aql(&self) -> String {
        let include = INCLUDED_FIELDS.iter().map(|f| format!("\"{f}\"")).collect::<Vec<_>>().join(",");
        format!("items.find({}).include({include})", self.criteria())
    }
}
