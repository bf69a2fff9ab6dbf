// Chunked fetcher: pulls a file's content in ranged requests, reports
// progress after every chunk and writes the whole buffer to disk once
// the transfer is complete.

use crate::api::DriveApi;
use crate::config::Settings;
use crate::error::DriveError;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Lifecycle of a single download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    NotStarted,
    Downloading,
    Complete,
    Flushed,
    Failed,
}

impl FetchState {
    fn name(self) -> &'static str {
        match self {
            FetchState::NotStarted => "not-started",
            FetchState::Downloading => "downloading",
            FetchState::Complete => "complete",
            FetchState::Flushed => "flushed",
            FetchState::Failed => "failed",
        }
    }

    fn can_move_to(self, next: FetchState) -> bool {
        use FetchState::*;
        matches!(
            (self, next),
            (NotStarted, Downloading)
                | (Downloading, Downloading)
                | (Downloading, Complete)
                | (NotStarted, Failed)
                | (Downloading, Failed)
                | (Complete, Flushed)
                | (Complete, Failed)
        )
    }
}

/// Destination path plus the bytes received so far.
#[derive(Debug)]
pub struct DownloadTarget {
    path: PathBuf,
    buffer: Vec<u8>,
    state: FetchState,
}

impl DownloadTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DownloadTarget {
            path: path.into(),
            buffer: Vec::new(),
            state: FetchState::NotStarted,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn received(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn transition(&mut self, next: FetchState) -> Result<(), DriveError> {
        if !self.state.can_move_to(next) {
            return Err(DriveError::InvalidTransition {
                from: self.state.name(),
                to: next.name(),
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<(), DriveError> {
        self.write_at(self.received(), bytes)
    }

    /// Place `bytes` starting at `offset`, dropping anything already held
    /// from that point on. A start past the end of the buffer is a gap.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<(), DriveError> {
        if offset > self.received() {
            return Err(DriveError::UnexpectedOffset {
                expected: self.received(),
                got: offset,
            });
        }
        self.transition(FetchState::Downloading)?;
        self.buffer.truncate(offset as usize);
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), DriveError> {
        self.transition(FetchState::Complete)
    }

    pub fn fail(&mut self) {
        if self.state.can_move_to(FetchState::Failed) {
            self.state = FetchState::Failed;
        }
    }

    /// Write the buffer in one go. Parent directories are created first.
    pub fn flush(&mut self) -> Result<u64, DriveError> {
        if self.state != FetchState::Complete {
            return Err(DriveError::InvalidTransition {
                from: self.state.name(),
                to: FetchState::Flushed.name(),
            });
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, &self.buffer)?;
        self.transition(FetchState::Flushed)?;
        Ok(self.received())
    }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub chunks: usize,
}

pub struct Fetcher<'a, A: DriveApi + ?Sized> {
    api: &'a A,
    chunk_size: u64,
}

impl<'a, A: DriveApi + ?Sized> Fetcher<'a, A> {
    pub fn new(api: &'a A, settings: &Settings) -> Self {
        Fetcher {
            api,
            chunk_size: settings.chunk_size.max(1),
        }
    }

    /// Download `file_id` into `destination`, calling `on_progress` with a
    /// fraction in `[0, 1]` after each chunk. The fraction never goes
    /// down and the final call is exactly `1.0`.
    pub fn try_download(
        &self,
        file_id: &str,
        destination: &Path,
        mut on_progress: impl FnMut(f64),
    ) -> Result<DownloadReport, DriveError> {
        let mut target = DownloadTarget::new(destination);
        let mut chunks = 0;
        let mut last_progress = 0.0_f64;

        let result = loop {
            let chunk = match self.api.fetch_chunk(file_id, target.received(), self.chunk_size) {
                Ok(chunk) => chunk,
                Err(e) => break Err(e),
            };
            let got = chunk.bytes.len() as u64;
            if let Err(e) = target.write_at(chunk.offset, &chunk.bytes) {
                break Err(e);
            }
            chunks += 1;

            let received = target.received();
            // without a total, a short chunk marks the end of the object
            let done = match chunk.total_size {
                Some(total) => received >= total,
                None => got < self.chunk_size,
            };
            debug!(file_id, chunk = chunks, got, received, total = ?chunk.total_size, "chunk");

            if done {
                on_progress(1.0);
                break target.complete();
            }
            if got == 0 {
                break Err(DriveError::Truncated {
                    file_id: file_id.to_string(),
                    received,
                    total: chunk.total_size.unwrap_or(received),
                });
            }

            if let Some(total) = chunk.total_size {
                last_progress = last_progress.max(received as f64 / total.max(1) as f64);
            }
            on_progress(last_progress);
        };

        if let Err(e) = result {
            target.fail();
            return Err(e);
        }

        let bytes = match target.flush() {
            Ok(bytes) => bytes,
            Err(e) => {
                target.fail();
                return Err(e);
            }
        };
        info!(file_id, bytes, path = %destination.display(), "download flushed");
        Ok(DownloadReport {
            path: destination.to_path_buf(),
            bytes,
            chunks,
        })
    }

    /// Boolean form: failures are logged and reported as `false`.
    pub fn download(&self, file_id: &str, destination: &Path, on_progress: impl FnMut(f64)) -> bool {
        match self.try_download(file_id, destination, on_progress) {
            Ok(_) => true,
            Err(e) => {
                error!(file_id, error = %e, "error downloading file");
                false
            }
        }
    }
}
