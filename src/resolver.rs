// Remote directory resolver: name lookups and one-level folder listings.

use crate::api::DriveApi;
use crate::config::Settings;
use crate::error::DriveError;
use crate::model::{EntryKind, RemoteEntry, SearchScope};
use crate::query::FileQuery;
use tracing::{debug, error};

pub struct Resolver<'a, A: DriveApi + ?Sized> {
    api: &'a A,
    search_page_size: u32,
    listing_page_size: u32,
}

impl<'a, A: DriveApi + ?Sized> Resolver<'a, A> {
    pub fn new(api: &'a A, settings: &Settings) -> Self {
        Resolver {
            api,
            search_page_size: settings.search_page_size,
            listing_page_size: settings.listing_page_size,
        }
    }

    /// Entries named exactly `name` within `scope`, in the API's default
    /// order. Errors are returned, not swallowed.
    pub fn search(
        &self,
        scope: &SearchScope,
        name: &str,
        kind: Option<EntryKind>,
    ) -> Result<Vec<RemoteEntry>, DriveError> {
        let query = FileQuery::new(scope.clone(), self.search_page_size)
            .named(name)
            .of_kind(kind);
        let mut entries = self.api.list_files(&query)?;
        entries.truncate(self.search_page_size as usize);
        debug!(name, matches = entries.len(), "name lookup");
        Ok(entries)
    }

    /// Direct children of `parent_id`, sorted by name. Only the first page
    /// is read.
    pub fn children(&self, parent_id: &str) -> Result<Vec<RemoteEntry>, DriveError> {
        let query = FileQuery::new(SearchScope::parent(parent_id), self.listing_page_size)
            .ordered_by("name");
        let mut entries = self.api.list_files(&query)?;
        entries.truncate(self.listing_page_size as usize);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Like [`Resolver::search`], but a failed request is logged and
    /// reported as no matches.
    pub fn find_by_name(
        &self,
        scope: &SearchScope,
        name: &str,
        kind: Option<EntryKind>,
    ) -> Vec<RemoteEntry> {
        self.search(scope, name, kind).unwrap_or_else(|e| {
            error!(name, error = %e, "error searching");
            Vec::new()
        })
    }

    /// Like [`Resolver::children`], but a failed request is logged and
    /// reported as an empty folder.
    pub fn list_children(&self, parent_id: &str) -> Vec<RemoteEntry> {
        self.children(parent_id).unwrap_or_else(|e| {
            error!(parent_id, error = %e, "error listing folder contents");
            Vec::new()
        })
    }
}
