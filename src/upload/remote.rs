use std::sync::Arc;

use crate::foundation::core::RemoteRef;
use crate::foundation::error::{StrataError, StrataResult};

/// One uploadable unit: a user-selected file or a rasterized text bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPayload {
    /// File name presented to the asset store.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Encoded file contents.
    pub bytes: Arc<Vec<u8>>,
}

impl UploadPayload {
    /// Construct a payload from owned bytes.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Wrap PNG bytes (the rasterizer's output format).
    pub fn png(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(file_name, "image/png", bytes)
    }
}

/// Remote asset-store boundary.
///
/// Contract: a call is all-or-nothing, and on success returns exactly one [`RemoteRef`] per input
/// file, in input order. Position is the only correlation key.
pub trait RemoteAssetStore {
    /// Upload `files` as a single batch.
    fn submit_batch(&mut self, files: &[UploadPayload]) -> StrataResult<Vec<RemoteRef>>;
}

/// In-memory asset store for tests, previews and the CLI.
///
/// Issues `remote:<n>` references, records every call, and can be told to reject upcoming calls.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    calls: Vec<Vec<UploadPayload>>,
    issued: u64,
    fail_next: usize,
}

impl MemoryAssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` batch calls.
    pub fn fail_next(&mut self, n: usize) {
        self.fail_next = n;
    }

    /// Every batch received so far, rejected ones included.
    pub fn calls(&self) -> &[Vec<UploadPayload>] {
        &self.calls
    }

    /// Number of batch calls received.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

impl RemoteAssetStore for MemoryAssetStore {
    fn submit_batch(&mut self, files: &[UploadPayload]) -> StrataResult<Vec<RemoteRef>> {
        self.calls.push(files.to_vec());
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(StrataError::upload("asset store rejected batch"));
        }
        Ok(files
            .iter()
            .map(|_| {
                self.issued += 1;
                RemoteRef(format!("remote:{}", self.issued))
            })
            .collect())
    }
}
