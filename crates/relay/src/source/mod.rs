//! Byte sources the relay can stream from.
//!
//! Both kinds of source expose one capability, [`ByteSource::open`]: given the
//! client's `Range` header, produce a bounded, forward-only reader plus a
//! description of which bytes it actually serves. Keystream positioning and
//! response metadata are derived from that description alone, so the relay
//! logic is written once for every source.

pub mod local;
pub mod remote;

pub use local::LocalSource;
pub use remote::RemoteSource;

use std::future::Future;
use std::pin::Pin;

use common::RelayError;
use tokio::io::AsyncRead;

/// Forward-only reader over the bytes a source serves.
pub type BoxedReader = Pin<Box<dyn AsyncRead + Send>>;

/// Which bytes of the resource an opened source will deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSlice {
    /// Offset of the first delivered byte within the whole resource.
    pub offset: u64,
    /// Number of bytes that will flow, when known up front.
    pub length: Option<u64>,
    /// Total resource size, when known.
    pub total: Option<u64>,
    /// Whether this is a partial (`206`) delivery of a requested range.
    pub partial: bool,
}

impl SourceSlice {
    /// Slice describing an entire resource of `total` bytes.
    pub fn whole(total: Option<u64>) -> Self {
        Self {
            offset: 0,
            length: total,
            total,
            partial: false,
        }
    }
}

/// An opened source: the slice description plus its reader.
pub struct OpenedSource {
    pub slice: SourceSlice,
    pub reader: BoxedReader,
}

impl std::fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSource")
            .field("slice", &self.slice)
            .finish_non_exhaustive()
    }
}

/// A resource that can be opened for a (possibly ranged) forward read.
pub trait ByteSource {
    /// Short label used in logs (`"remote"`, `"local"`).
    fn kind(&self) -> &'static str;

    /// Validate `range_header` and open the bytes it selects.
    ///
    /// An empty header selects the whole resource. Range errors must be
    /// reported here, before any byte is produced.
    fn open(
        self,
        range_header: &str,
    ) -> impl Future<Output = Result<OpenedSource, RelayError>> + Send;
}
