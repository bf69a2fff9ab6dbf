// Data shapes: the entries handed back to callers plus the raw Drive v3
// JSON they are decoded from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// MIME type Drive uses to mark a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

impl EntryKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }

    /// Console icon shown next to an entry in listings.
    pub fn icon(self) -> &'static str {
        match self {
            EntryKind::Folder => "📁",
            EntryKind::File => "📄",
        }
    }
}

/// Snapshot of one remote file or folder. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    pub mime_type: String,
    /// Byte count; Drive omits it for folders and native documents.
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

impl RemoteEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Restricts a search to one folder's direct children, or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    Anywhere,
    Parent(String),
}

impl SearchScope {
    pub fn parent(id: impl Into<String>) -> Self {
        SearchScope::Parent(id.into())
    }
}

/// One element of `files` in a `files.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, deserialize_with = "size_from_string")]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl From<DriveFile> for RemoteEntry {
    fn from(f: DriveFile) -> Self {
        let kind = EntryKind::from_mime_type(&f.mime_type);
        RemoteEntry {
            id: f.id,
            name: f.name,
            kind,
            mime_type: f.mime_type,
            // folders never carry a meaningful size
            size: if kind == EntryKind::Folder { None } else { f.size },
            modified: f.modified_time,
        }
    }
}

// Drive encodes int64 fields as JSON strings.
fn size_from_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse::<u64>().map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_file_list_with_string_sizes() {
        let body = r#"{
            "files": [
                {"id": "f1", "name": "docs", "mimeType": "application/vnd.google-apps.folder",
                 "modifiedTime": "2024-03-01T10:15:00.000Z"},
                {"id": "abc123", "name": "report.drawio", "mimeType": "application/octet-stream",
                 "size": "48213"}
            ]
        }"#;
        let list: FileList = serde_json::from_str(body).unwrap();
        let entries: Vec<RemoteEntry> = list.files.into_iter().map(Into::into).collect();

        assert_eq!(entries[0].kind, EntryKind::Folder);
        assert_eq!(entries[0].size, None);
        assert_eq!(
            entries[0].modified.map(|t| t.to_rfc3339()),
            Some("2024-03-01T10:15:00+00:00".to_string())
        );
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].size, Some(48213));
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn missing_files_key_is_an_empty_listing() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }

    #[test]
    fn non_numeric_size_is_rejected() {
        let body = r#"{"id": "x", "name": "x", "size": "lots"}"#;
        assert!(serde_json::from_str::<DriveFile>(body).is_err());
    }
}
