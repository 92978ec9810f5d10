//! [`LocalSource`]: a seekable, byte-addressable resource of known size.

use std::io::{self, SeekFrom};
use std::path::{Component, Path, PathBuf};

use common::RelayError;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::debug;

use super::{ByteSource, OpenedSource, SourceSlice};
use crate::range::{self, RangeRequest};

/// A local resource addressed by offset.
///
/// The range is validated against `size` before anything is read; the reader
/// is then positioned once at the range start and limited to its length.
#[derive(Debug)]
pub struct LocalSource<R> {
    reader: R,
    size: u64,
}

impl<R> LocalSource<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    /// Wrap a seekable reader holding `size` bytes.
    pub fn new(reader: R, size: u64) -> Self {
        Self { reader, size }
    }
}

impl LocalSource<File> {
    /// Open the regular file at `path`, taking its size from metadata.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotFound`] if the file does not exist or is not a
    /// regular file, and [`RelayError::Transport`] on other I/O failures.
    pub async fn open_file(path: &Path) -> Result<Self, RelayError> {
        let file = File::open(path)
            .await
            .map_err(|e| file_error(path, e))?;
        let metadata = file.metadata().await.map_err(|e| file_error(path, e))?;
        if !metadata.is_file() {
            return Err(RelayError::NotFound(path.display().to_string()));
        }
        Ok(Self::new(file, metadata.len()))
    }
}

impl<R> ByteSource for LocalSource<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn open(mut self, range_header: &str) -> Result<OpenedSource, RelayError> {
        let request = range::parse(range_header, self.size)?;
        let offset = request.offset();
        let slice = match request {
            RangeRequest::Whole => SourceSlice::whole(Some(self.size)),
            RangeRequest::Bytes { length, .. } => SourceSlice {
                offset,
                length: Some(length),
                total: Some(self.size),
                partial: true,
            },
        };
        let length = slice.length.unwrap_or(self.size);

        self.reader
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| RelayError::Transport(format!("seek to {offset}: {e}")))?;
        debug!(offset, length, size = self.size, "local source positioned");

        Ok(OpenedSource {
            slice,
            reader: Box::pin(self.reader.take(length)),
        })
    }
}

/// Join `relative` onto `root`, refusing anything but plain path components.
///
/// Returns `None` for empty paths and for paths containing `..`, `.`, a root
/// or a drive prefix, so the result can never escape `root`.
pub fn resolve_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut resolved = root.to_path_buf();
    let mut pushed = false;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                pushed = true;
            }
            _ => return None,
        }
    }
    pushed.then_some(resolved)
}

fn file_error(path: &Path, err: io::Error) -> RelayError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            RelayError::NotFound(path.display().to_string())
        }
        _ => RelayError::Transport(format!("{}: {err}", path.display())),
    }
}
