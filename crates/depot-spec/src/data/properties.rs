use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const PROPS_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';
const VALUES_SEPARATOR: char = ',';

/// Link target of an artifact uploaded as a symbolic link.
pub const SYMLINK_DEST: &str = "symlink.dest";
/// SHA-1 of the file a symbolic link pointed to at upload time.
pub const SYMLINK_DEST_SHA1: &str = "symlink.destsha1";

/// One key/value pair as it appears in query results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key:   String,
    #[serde(default)]
    pub value: String,
}

/// Ordered multimap of artifact properties.
///
/// Keys keep their first-insertion order and each key holds distinct values.
/// Serialized as a flat list of [`Property`] pairs, which is the shape the
/// remote query returns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Property>", into = "Vec<Property>")]
pub struct Properties {
    entries: Vec<(String, Vec<String>)>,
}

impl Properties {
    pub fn new() -> Self { Self::default() }

    /// Parse `key=v1,v2;key2=v3`.
    ///
    /// A separator prefixed with `\` belongs to the key or value.
    ///
    /// ```
    /// use depot_spec::Properties;
    ///
    /// let props = Properties::parse(r"build=42;tags=a,b\,c").unwrap();
    /// assert_eq!(props.get("tags").unwrap(), ["a", "b,c"]);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let mut props = Self::new();
        for prop in split_unescaped(input, PROPS_SEPARATOR) {
            if prop.is_empty() {
                continue;
            }
            let parts = split_unescaped(&prop, KEY_VALUE_SEPARATOR);
            let [key, values] = parts.as_slice() else {
                return Err(Error::InvalidProperty(prop));
            };
            if key.is_empty() {
                return Err(Error::InvalidProperty(prop));
            }
            for value in split_unescaped(values, VALUES_SEPARATOR) {
                props.add(key.clone(), value);
            }
        }
        Ok(props)
    }

    /// Add a value under `key`, ignoring it if already present.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.entries.push((key, vec![value])),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    /// Add every pair of `other`.
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in other.iter() {
            self.add(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Number of distinct keys.
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|(k, _)| k.as_str()) }

    /// All key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// True when every key/value pair of `filter` is present.
    pub fn contains_all(&self, filter: &Properties) -> bool {
        filter
            .entries
            .iter()
            .all(|(key, wanted)| self.get(key).is_some_and(|have| wanted.iter().all(|w| have.contains(w))))
    }

    /// Encode as URL matrix parameters: `;key=v1,v2;key2=v3`.
    ///
    /// Commas inside values are escaped with `\` before percent-encoding.
    pub fn to_matrix_params(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.entries {
            out.push(PROPS_SEPARATOR);
            out.push_str(&urlencoding::encode(key));
            out.push(KEY_VALUE_SEPARATOR);
            let joined = values
                .iter()
                .map(|v| urlencoding::encode(&v.replace(VALUES_SEPARATOR, "\\,")).into_owned())
                .collect::<Vec<_>>()
                .join(&urlencoding::encode(",").into_owned());
            out.push_str(&joined);
        }
        out
    }
}

impl FromStr for Properties {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, values)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{PROPS_SEPARATOR}")?;
            }
            let escaped: Vec<String> = values.iter().map(|v| v.replace(VALUES_SEPARATOR, "\\,")).collect();
            write!(f, "{key}{KEY_VALUE_SEPARATOR}{}", escaped.join(","))?;
        }
        Ok(())
    }
}

impl From<Vec<Property>> for Properties {
    fn from(list: Vec<Property>) -> Self {
        let mut props = Self::new();
        for Property { key, value } in list {
            props.add(key, value);
        }
        props
    }
}

impl From<Properties> for Vec<Property> {
    fn from(props: Properties) -> Self {
        props
            .iter()
            .map(|(key, value)| Property { key: key.to_string(), value: value.to_string() })
            .collect()
    }
}

/// Split on `sep`, treating `\sep` as a literal separator character.
fn split_unescaped(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&sep) {
            current.push(sep);
            chars.next();
        } else if c == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}
