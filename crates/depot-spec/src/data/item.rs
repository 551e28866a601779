use depot_verify::Checksums;
use serde::{Deserialize, Serialize};

use super::properties::Properties;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    File,
    Folder,
    #[serde(other)]
    Other,
}

/// Raw item descriptor as returned by the remote query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteItem {
    pub repo:        String,
    pub path:        String,
    pub name:        String,
    #[serde(rename = "type")]
    pub item_type:   ItemType,
    pub size:        u64,
    pub actual_sha1: String,
    pub actual_md5:  String,
    pub sha256:      String,
    pub properties:  Properties,
}

impl RemoteItem {
    pub fn file(repo: impl Into<String>, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_folder(&self) -> bool { self.item_type == ItemType::Folder }

    /// `repo/path/name`, or `repo/name` for items at the repository root.
    pub fn full_path(&self) -> String {
        if self.path.is_empty() || self.path == "." {
            format!("{}/{}", self.repo, self.name)
        } else {
            format!("{}/{}/{}", self.repo, self.path, self.name)
        }
    }

    pub fn checksums(&self) -> Checksums {
        Checksums {
            sha1:   self.actual_sha1.clone(),
            sha256: self.sha256.clone(),
            md5:    self.actual_md5.clone(),
        }
    }
}

/// A matched remote item with its resolved local destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub repo_path:   String,
    pub name:        String,
    pub is_folder:   bool,
    pub size:        u64,
    pub checksums:   Checksums,
    pub properties:  Properties,
    pub destination: String,
    /// Link target when the item is recreated as a symbolic link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink:     Option<String>,
}

/// A matched local file or directory with its resolved remote target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    pub local_path: String,
    /// `repo/path/name` on the remote.
    pub target:     String,
    pub is_dir:     bool,
    pub size:       u64,
    pub properties: Properties,
    /// Link target when the entry is uploaded as a symbolic link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink:    Option<String>,
}
