// Builds the `q` filter and the query-string parameters for `files.list`.

use crate::model::{EntryKind, SearchScope, FOLDER_MIME_TYPE};

/// Metadata projection requested for every listing.
pub const FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, modifiedTime)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub scope: SearchScope,
    pub name: Option<String>,
    pub kind: Option<EntryKind>,
    pub page_size: u32,
    pub order_by: Option<&'static str>,
}

impl FileQuery {
    pub fn new(scope: SearchScope, page_size: u32) -> Self {
        FileQuery {
            scope,
            name: None,
            kind: None,
            page_size,
            order_by: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn of_kind(mut self, kind: Option<EntryKind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn ordered_by(mut self, key: &'static str) -> Self {
        self.order_by = Some(key);
        self
    }

    /// The filter expression, predicates joined with `and`:
    /// parent scope, name, mime type, then the trashed flag.
    pub fn filter(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if let SearchScope::Parent(id) = &self.scope {
            parts.push(format!("'{}' in parents", escape(id)));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name='{}'", escape(name)));
        }
        match self.kind {
            Some(EntryKind::Folder) => parts.push(format!("mimeType='{FOLDER_MIME_TYPE}'")),
            Some(EntryKind::File) => parts.push(format!("mimeType!='{FOLDER_MIME_TYPE}'")),
            None => {}
        }
        parts.push("trashed=false".to_string());
        parts.join(" and ")
    }

    /// Query-string pairs for the request, ready for `RequestBuilder::query`.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.filter()),
            ("spaces", "drive".to_string()),
            ("fields", FIELDS.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(order) = self.order_by {
            params.push(("orderBy", order.to_string()));
        }
        params
    }
}

// Drive query literals are single-quoted; `'` and `\` need a backslash.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
