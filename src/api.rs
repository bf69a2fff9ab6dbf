// API client module: a small blocking HTTP client for the Drive v3 REST
// API. The resolver and the fetcher only see the `DriveApi` trait, so
// they can be driven by an in-memory fake in tests.

use crate::auth::{self, ServiceAccountKey};
use crate::config::Settings;
use crate::error::DriveError;
use crate::model::{FileList, RemoteEntry};
use crate::query::FileQuery;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Bytes returned by one ranged download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResponse {
    /// Position of `bytes[0]` in the object. A server that ignores `Range`
    /// answers from 0 with the whole body.
    pub offset: u64,
    pub bytes: Vec<u8>,
    /// Full object size as reported by the server, when it said.
    pub total_size: Option<u64>,
}

/// Operations the resolver and fetcher need from the storage service.
pub trait DriveApi {
    /// Run one `files.list` page.
    fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError>;

    /// Fetch up to `len` bytes of a file's content starting at `offset`.
    fn fetch_chunk(&self, file_id: &str, offset: u64, len: u64)
        -> Result<ChunkResponse, DriveError>;
}

/// Drive client holding a reqwest blocking client, the API base URL and
/// the access token obtained at connect time.
pub struct DriveClient {
    client: Client,
    base_url: String,
    token: String,
    account: String,
}

impl DriveClient {
    /// Build the HTTP client and exchange the service-account key for an
    /// access token. Failure here is fatal for the caller.
    pub fn connect(key: &ServiceAccountKey, settings: &Settings) -> Result<Self, DriveError> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        let token = auth::fetch_access_token(&client, key)?;
        Ok(Self::with_token(client, settings, token, key.client_email.clone()))
    }

    /// Use an already obtained bearer token.
    pub fn with_token(client: Client, settings: &Settings, token: String, account: String) -> Self {
        DriveClient {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            token,
            account,
        }
    }

    /// Email of the service account the client is acting as.
    pub fn account(&self) -> &str {
        &self.account
    }

    fn check(res: Response) -> Result<Response, DriveError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let txt = res.text().unwrap_or_default();
        Err(DriveError::from_response(status, &txt))
    }
}

impl DriveApi for DriveClient {
    fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError> {
        let url = format!("{}/files", self.base_url);
        let filter = query.filter();
        debug!(q = %filter, page_size = query.page_size, "files.list");

        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query.params())
            .send()?;
        let list: FileList = serde_json::from_str(&Self::check(res)?.text()?)?;
        if list.next_page_token.is_some() {
            warn!(q = %filter, page_size = query.page_size, "listing truncated to one page");
        }
        Ok(list.files.into_iter().map(RemoteEntry::from).collect())
    }

    fn fetch_chunk(
        &self,
        file_id: &str,
        offset: u64,
        len: u64,
    ) -> Result<ChunkResponse, DriveError> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        let range = range_header(offset, len);
        debug!(file_id, %range, "files.get media chunk");

        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .header(RANGE, range)
            .send()?;

        let status = res.status();
        let (range_start, reported_total) = res
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(parse_content_range)
            .unwrap_or((None, None));

        // Asking at or past the end, e.g. any range of an empty object.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            if let Some(total) = reported_total.filter(|t| *t <= offset) {
                return Ok(ChunkResponse {
                    offset: total,
                    bytes: Vec::new(),
                    total_size: Some(total),
                });
            }
        }

        let bytes = Self::check(res)?.bytes()?.to_vec();
        if status == StatusCode::PARTIAL_CONTENT {
            return Ok(ChunkResponse {
                offset: range_start.unwrap_or(offset),
                bytes,
                total_size: reported_total,
            });
        }
        // Any other success carries the whole object from byte 0.
        let total_size = Some(bytes.len() as u64);
        Ok(ChunkResponse {
            offset: 0,
            bytes,
            total_size,
        })
    }
}

/// `Range` value for `len` bytes from `offset`, clamped at `u64::MAX`.
pub fn range_header(offset: u64, len: u64) -> String {
    let last = offset.saturating_add(len.max(1) - 1);
    format!("bytes={offset}-{last}")
}

/// First byte and total length from a `Content-Range` value such as
/// `bytes 0-99/1234`, `bytes 0-99/*` or `bytes */0`. Unknown parts are
/// `None`.
pub fn parse_content_range(value: &str) -> (Option<u64>, Option<u64>) {
    let value = value.trim();
    let rest = value.strip_prefix("bytes").unwrap_or(value).trim();
    let Some((range, total)) = rest.split_once('/') else {
        return (None, None);
    };
    let start = range
        .split_once('-')
        .and_then(|(first, _)| first.trim().parse().ok());
    (start, total.trim().parse().ok())
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::model::{EntryKind, SearchScope, FOLDER_MIME_TYPE};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory drive: a flat list of (parent, entry) pairs plus file bodies.
    #[derive(Default)]
    pub struct FakeDrive {
        pub entries: Vec<(Option<String>, RemoteEntry)>,
        pub contents: HashMap<String, Vec<u8>>,
        pub fail_listing: bool,
        pub queries: RefCell<Vec<FileQuery>>,
    }

    pub fn file(id: &str, name: &str) -> RemoteEntry {
        RemoteEntry {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::File,
            mime_type: "application/octet-stream".into(),
            size: Some(10),
            modified: None,
        }
    }

    pub fn folder(id: &str, name: &str) -> RemoteEntry {
        RemoteEntry {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::Folder,
            mime_type: FOLDER_MIME_TYPE.into(),
            size: None,
            modified: None,
        }
    }

    impl FakeDrive {
        pub fn with(mut self, parent: Option<&str>, entry: RemoteEntry) -> Self {
            self.entries.push((parent.map(String::from), entry));
            self
        }

        pub fn with_content(mut self, id: &str, body: &[u8]) -> Self {
            self.contents.insert(id.to_string(), body.to_vec());
            self
        }
    }

    impl DriveApi for FakeDrive {
        fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError> {
            self.queries.borrow_mut().push(query.clone());
            if self.fail_listing {
                return Err(DriveError::Api {
                    status: StatusCode::FORBIDDEN,
                    message: "insufficient permissions".into(),
                });
            }
            Ok(self
                .entries
                .iter()
                .filter(|(parent, _)| match &query.scope {
                    SearchScope::Anywhere => true,
                    SearchScope::Parent(id) => parent.as_deref() == Some(id.as_str()),
                })
                .filter(|(_, e)| query.name.as_ref().map_or(true, |n| &e.name == n))
                .filter(|(_, e)| query.kind.map_or(true, |k| e.kind == k))
                .map(|(_, e)| e.clone())
                .collect())
        }

        fn fetch_chunk(
            &self,
            file_id: &str,
            offset: u64,
            len: u64,
        ) -> Result<ChunkResponse, DriveError> {
            let body = self.contents.get(file_id).ok_or_else(|| DriveError::Api {
                status: StatusCode::NOT_FOUND,
                message: format!("File not found: {file_id}."),
            })?;
            let start = (offset as usize).min(body.len());
            let end = start.saturating_add(len as usize).min(body.len());
            Ok(ChunkResponse {
                offset,
                bytes: body[start..end].to_vec(),
                total_size: Some(body.len() as u64),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_parts() {
        assert_eq!(parse_content_range("bytes 0-99/1234"), (Some(0), Some(1234)));
        assert_eq!(parse_content_range("bytes 4-7/*"), (Some(4), None));
        assert_eq!(parse_content_range("bytes */0"), (None, Some(0)));
        assert_eq!(parse_content_range("garbage"), (None, None));
    }

    #[test]
    fn range_header_saturates() {
        assert_eq!(range_header(0, 4), "bytes=0-3");
        assert_eq!(range_header(8, 4), "bytes=8-11");
        assert_eq!(range_header(0, 0), "bytes=0-0");
        assert_eq!(
            range_header(4, u64::MAX),
            format!("bytes=4-{}", u64::MAX)
        );
    }
}
