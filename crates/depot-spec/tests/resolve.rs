use std::collections::BTreeSet;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use depot_spec::{
    DownloadMapper, Error, ItemQuery, LocalResolver, MatchSpec, PatternMatcher, QueryClient, RemoteItem,
    RemoteResolver, Result,
};
use depot_stream::{ResultReader, ResultWriter};
use proptest::prelude::*;

struct MockQuery {
    items: Vec<RemoteItem>,
    fail:  bool,
    calls: AtomicUsize,
}

impl MockQuery {
    fn new(paths: &[(&str, &str)]) -> Self {
        Self {
            items: paths.iter().map(|(path, name)| RemoteItem::file("repo", *path, *name)).collect(),
            fail:  false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl QueryClient for MockQuery {
    async fn search(&self, _query: &ItemQuery) -> Result<ResultReader<RemoteItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Query("401 unauthorized".into()));
        }
        Ok(ResultWriter::collect_from(self.items.iter().cloned())?)
    }
}

fn destinations(mut reader: ResultReader<depot_spec::Candidate>) -> BTreeSet<String> {
    let out = reader.by_ref().map(|c| c.destination).collect();
    assert!(reader.error().is_none());
    reader.close().unwrap();
    out
}

#[tokio::test]
async fn test_scenario_a_flat_recursive() {
    let client = MockQuery::new(&[("test", "a.in"), (".", "b.in"), (".", "c.tar.gz")]);
    let spec = MatchSpec::new("repo/*").recursive(true).flat(true);

    let reader = RemoteResolver::new(&client).resolve(&spec).await.unwrap();
    let got = destinations(reader);

    let want: BTreeSet<String> = ["a.in", "b.in", "c.tar.gz"].into_iter().map(String::from).collect();
    assert_eq!(got, want);
}

#[tokio::test]
async fn test_scenario_b_placeholders() {
    let client = MockQuery::new(&[("test", "a.in"), (".", "b.in")]);
    let spec = MatchSpec::new("repo/(*).in").target("out/{1}/").flat(true);

    let got = destinations(RemoteResolver::new(&client).resolve(&spec).await.unwrap());

    let want: BTreeSet<String> = ["out/a/a.in", "out/b/b.in"].into_iter().map(String::from).collect();
    assert_eq!(got, want);
}

#[tokio::test]
async fn test_configuration_error_before_query() {
    let client = MockQuery::new(&[(".", "a.in")]);
    let spec = MatchSpec::new("repo/*.in").target("out/{1}/");

    let err = RemoteResolver::new(&client).resolve(&spec).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_query_failure_surfaces() {
    let mut client = MockQuery::new(&[]);
    client.fail = true;

    let err = RemoteResolver::new(&client).resolve(&MatchSpec::new("repo/*")).await.unwrap_err();
    assert!(matches!(err, Error::Query(_)));
}

#[tokio::test]
async fn test_zero_matches_is_empty() {
    let client = MockQuery::new(&[(".", "a.out")]);
    let reader = RemoteResolver::new(&client).resolve(&MatchSpec::new("repo/*.in")).await.unwrap();
    assert_eq!(reader.len().unwrap(), 0);
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let client = MockQuery::new(&[(".", "a.in"), (".", "b.out"), ("x", "c.in")]);
    let mut resolved = RemoteResolver::new(&client).stream(&MatchSpec::new("repo/*.in")).await.unwrap();

    assert_eq!(resolved.next_candidate().unwrap().repo_path, "repo/a.in");
    assert_eq!(resolved.next_candidate().unwrap().repo_path, "repo/x/c.in");
    assert!(resolved.next_candidate().is_none());
    resolved.close().unwrap();
}

#[test]
fn test_local_resolver_non_flat() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data");
    fs::create_dir_all(root.join("sub/deep")).unwrap();
    fs::write(root.join("a.txt"), b"a").unwrap();
    fs::write(root.join("b.log"), b"b").unwrap();
    fs::write(root.join("sub/c.txt"), b"cc").unwrap();
    fs::write(root.join("sub/deep/d.txt"), b"ddd").unwrap();

    let pattern = format!("{}/*.txt", root.to_string_lossy());
    let spec = MatchSpec::new(pattern).target("repo/up/");
    let mut reader = LocalResolver::new(&spec).unwrap().resolve().unwrap();

    let got: Vec<(String, u64)> = reader.by_ref().map(|c| (c.target, c.size)).collect();
    assert_eq!(got, [
        ("repo/up/a.txt".to_string(), 1),
        ("repo/up/sub/c.txt".to_string(), 2),
        ("repo/up/sub/deep/d.txt".to_string(), 3),
    ]);
}

#[test]
fn test_local_resolver_single_level() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), b"a").unwrap();
    fs::write(dir.path().join("sub/c.txt"), b"c").unwrap();

    let pattern = format!("{}/*", dir.path().to_string_lossy());
    let spec = MatchSpec::new(pattern).target("repo/").recursive(false).include_dirs(true);
    let mut reader = LocalResolver::new(&spec).unwrap().resolve().unwrap();

    let got: Vec<(String, bool)> = reader.by_ref().map(|c| (c.target, c.is_dir)).collect();
    assert_eq!(got, [("repo/a.txt".to_string(), false), ("repo/sub".to_string(), true)]);
}

#[test]
fn test_local_resolver_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/missing/*", dir.path().to_string_lossy());
    let reader = LocalResolver::new(&MatchSpec::new(pattern).target("repo/")).unwrap().resolve().unwrap();
    assert_eq!(reader.len().unwrap(), 0);
}

#[cfg(unix)]
#[test]
fn test_local_resolver_symlinks_as_links() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("real")).unwrap();
    fs::write(dir.path().join("real/a.txt"), b"aaaa").unwrap();
    std::os::unix::fs::symlink("real/a.txt", dir.path().join("link.txt")).unwrap();
    std::os::unix::fs::symlink("real", dir.path().join("linkdir")).unwrap();

    let pattern = format!("{}/*", dir.path().to_string_lossy());
    let spec = MatchSpec::new(pattern.clone()).target("repo/").symlinks(true);
    let mut reader = LocalResolver::new(&spec).unwrap().resolve().unwrap();
    let got: Vec<(String, u64, Option<String>)> = reader.by_ref().map(|c| (c.target, c.size, c.symlink)).collect();
    assert_eq!(got, [
        ("repo/link.txt".to_string(), 0, Some("real/a.txt".to_string())),
        ("repo/linkdir".to_string(), 0, Some("real".to_string())),
        ("repo/real/a.txt".to_string(), 4, None),
    ]);

    // Without the flag links are followed.
    let mut reader = LocalResolver::new(&MatchSpec::new(pattern).target("repo/")).unwrap().resolve().unwrap();
    let got: Vec<(String, u64, Option<String>)> = reader.by_ref().map(|c| (c.target, c.size, c.symlink)).collect();
    assert_eq!(got, [
        ("repo/link.txt".to_string(), 4, None),
        ("repo/real/a.txt".to_string(), 4, None),
    ]);
}

fn item_strategy() -> impl Strategy<Value = RemoteItem> {
    (prop::collection::vec("[ab]{1,2}", 0..3), "[ab]{1,2}", prop::sample::select(vec!["in", "out"])).prop_map(
        |(dirs, stem, ext)| {
            let path = if dirs.is_empty() { ".".to_string() } else { dirs.join("/") };
            RemoteItem::file("repo", path, format!("{stem}.{ext}"))
        },
    )
}

fn pattern_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["repo/*", "repo/*.in", "repo/a/*", "repo/a*/*.out", "repo/b/", "repo/*/a*"])
}

fn mapped(spec: &MatchSpec, items: &[RemoteItem]) -> BTreeSet<String> {
    let mapper = DownloadMapper::new(spec).unwrap();
    items.iter().filter_map(|i| mapper.map(i)).map(|c| c.destination).collect()
}

proptest! {
    #[test]
    fn test_prop_recursion_is_additive(
        items in prop::collection::vec(item_strategy(), 1..24),
        pattern in pattern_strategy(),
    ) {
        let shallow = mapped(&MatchSpec::new(pattern).target("out/").recursive(false), &items);
        let deep = mapped(&MatchSpec::new(pattern).target("out/").recursive(true), &items);

        prop_assert!(shallow.is_subset(&deep));

        let mut normalized = pattern.to_string();
        if normalized.ends_with('/') {
            normalized.push('*');
        }
        let pattern_depth = normalized.split('/').count();
        for extra in deep.difference(&shallow) {
            // "out/" replaces the repository segment
            prop_assert!(extra.split('/').count() > pattern_depth, "{extra} is not below {pattern}");
        }
    }

    #[test]
    fn test_prop_exclusions_are_subtractive(
        items in prop::collection::vec(item_strategy(), 1..24),
        pattern in pattern_strategy(),
        exclusion in prop::sample::select(vec!["*.out", "repo/a/*", "*b*", "repo/*/*"]),
    ) {
        let base = MatchSpec::new(pattern).target("out/");
        let mapper = DownloadMapper::new(&base.clone().exclude(exclusion)).unwrap();
        let excluded = PatternMatcher::exclusion(exclusion).unwrap();

        let mut kept = BTreeSet::new();
        for item in &items {
            if let Some(candidate) = mapper.map(item) {
                prop_assert!(!excluded.is_match(&candidate.repo_path));
                kept.insert(candidate.destination);
            }
        }

        let unfiltered = mapped(&base, &items);
        let expected: BTreeSet<String> = items
            .iter()
            .filter(|i| !excluded.is_match(&i.full_path()))
            .filter_map(|i| DownloadMapper::new(&base).unwrap().map(i))
            .map(|c| c.destination)
            .collect();
        prop_assert!(kept.is_subset(&unfiltered));
        prop_assert_eq!(kept, expected);
    }
}
