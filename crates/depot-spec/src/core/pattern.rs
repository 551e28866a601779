use std::collections::BTreeSet;

use regex::Regex;

use crate::error::{Error, Result};

/// Anchored regex compiled from a glob pattern.
///
/// - `*` in a directory segment matches across separators
/// - `*` in the final segment stays within one segment
/// - with `recursive`, the final segment may sit at any depth below the fixed prefix
/// - a trailing `/` means everything below
/// - parentheses referenced by a `{n}` placeholder in the target become capture groups;
///   all other characters, unreferenced parentheses included, match literally
#[derive(Clone, Debug)]
pub struct PatternMatcher {
    regex:   Regex,
    /// Pattern with trailing `/` expanded and capture parentheses removed.
    literal: String,
    target:  String,
    /// Regex group for the n-th parenthesis pair, `None` when the pair is literal.
    slots:   Vec<Option<usize>>,
}

impl PatternMatcher {
    /// Compile `pattern`, validating every placeholder used in `target`.
    pub fn compile(pattern: &str, target: &str, recursive: bool) -> Result<Self> {
        let pairs = parenthesis_pairs(pattern);
        let used: BTreeSet<usize> = placeholders(target).into_iter().map(|p| p.index).collect();

        for &index in &used {
            if index == 0 || index > pairs.len() {
                return Err(Error::UnmatchedPlaceholder {
                    pattern: pattern.to_string(),
                    target:  target.to_string(),
                    index,
                    groups:  pairs.len(),
                });
            }
        }

        let mut kept = BTreeSet::new();
        let mut slots = Vec::with_capacity(pairs.len());
        let mut group = 0;
        for (i, &(open, close)) in pairs.iter().enumerate() {
            if used.contains(&(i + 1)) {
                group += 1;
                slots.push(Some(group));
                kept.insert(open);
                kept.insert(close);
            } else {
                slots.push(None);
            }
        }

        let mut normalized = pattern.to_string();
        if normalized.ends_with('/') {
            normalized.push('*');
        }

        let final_start = normalized.rfind('/').map_or(0, |i| i + 1);
        let final_wildcard = normalized[final_start..].contains('*');

        let mut expr = String::with_capacity(normalized.len() * 2 + 16);
        let mut literal = String::with_capacity(normalized.len());
        expr.push('^');
        for (i, c) in normalized.char_indices() {
            if i == final_start && recursive && final_wildcard {
                expr.push_str("(?:.*/)?");
            }
            match c {
                '*' if recursive && i < final_start => expr.push_str(".*"),
                '*' => expr.push_str("[^/]*"),
                '(' | ')' if kept.contains(&i) => {
                    expr.push(c);
                    continue;
                }
                _ => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
            literal.push(c);
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason:  e.to_string(),
        })?;

        Ok(Self {
            regex,
            literal,
            target: target.to_string(),
            slots,
        })
    }

    /// Compile an exclusion glob. Exclusions never capture and always match at any depth.
    pub fn exclusion(pattern: &str) -> Result<Self> { Self::compile(pattern, "", true) }

    pub fn is_match(&self, path: &str) -> bool { self.regex.is_match(path) }

    /// Text of every parenthesis pair, in pattern order. Literal pairs yield an empty string.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.slots
                .iter()
                .map(|slot| {
                    slot.and_then(|g| caps.get(g))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        )
    }

    /// Substitute the groups captured from `path` into the target.
    ///
    /// Returns the resolved target and whether any placeholder was used,
    /// or `None` when `path` does not match.
    pub fn resolve_target(&self, path: &str) -> Option<(String, bool)> {
        let captures = self.captures(path)?;
        let found = placeholders(&self.target);
        let mut resolved = String::with_capacity(self.target.len());
        let mut last = 0;
        for p in &found {
            resolved.push_str(&self.target[last..p.start]);
            if let Some(text) = captures.get(p.index.wrapping_sub(1)) {
                resolved.push_str(text);
            }
            last = p.end;
        }
        resolved.push_str(&self.target[last..]);
        Some((resolved, !found.is_empty()))
    }

    /// Pattern text without capture parentheses, as used for remote queries.
    pub fn literal(&self) -> &str { &self.literal }

    pub fn group_count(&self) -> usize { self.slots.iter().flatten().count() }

    /// Longest leading run of segments without a wildcard.
    ///
    /// ```
    /// use depot_spec::PatternMatcher;
    ///
    /// let m = PatternMatcher::compile("dir/sub/*.txt", "", true).unwrap();
    /// assert_eq!(m.root(), "dir/sub");
    /// ```
    pub fn root(&self) -> String {
        let segments: Vec<&str> = self.literal.split('/').collect();
        let fixed = segments.iter().take_while(|s| !s.contains('*')).count();
        let root = segments[..fixed].join("/");
        if root.is_empty() && self.literal.starts_with('/') {
            "/".to_string()
        } else {
            root
        }
    }

    /// Number of segments below [`root`](Self::root).
    pub fn depth_below_root(&self) -> usize {
        let segments: Vec<&str> = self.literal.split('/').collect();
        let fixed = segments.iter().take_while(|s| !s.contains('*')).count();
        segments.len() - fixed
    }
}

/// Balanced parenthesis pairs as `(open, close)` byte offsets, ordered by the open offset.
fn parenthesis_pairs(pattern: &str) -> Vec<(usize, usize)> {
    let mut stack = Vec::new();
    let mut pairs = Vec::new();
    for (i, c) in pattern.char_indices() {
        match c {
            '(' => stack.push(i),
            ')' => {
                if let Some(open) = stack.pop() {
                    pairs.push((open, i));
                }
            }
            _ => {}
        }
    }
    pairs.sort_unstable();
    pairs
}

struct Placeholder {
    start: usize,
    end:   usize,
    index: usize,
}

/// Every `{n}` token in `target`, left to right.
fn placeholders(target: &str) -> Vec<Placeholder> {
    let bytes = target.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let digits = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
            let close = i + 1 + digits;
            if digits > 0 && bytes.get(close) == Some(&b'}') {
                if let Ok(index) = target[i + 1..close].parse() {
                    found.push(Placeholder { start: i, end: close + 1, index });
                    i = close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }
    found
}
