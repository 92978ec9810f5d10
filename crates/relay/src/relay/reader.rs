//! [`KeystreamReader`]: XORs a byte stream with a CTR keystream as it is read.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tracing::{debug, warn};

use crate::crypto::Keystream;

/// Wraps a reader so every byte read is XORed with the next keystream byte.
///
/// Encryption and decryption are the same operation. Read errors from the
/// inner reader are passed through untouched and the keystream is not
/// advanced for bytes that were never delivered.
pub struct KeystreamReader<R> {
    inner: R,
    keystream: Keystream,
    transformed: u64,
}

impl<R> KeystreamReader<R> {
    pub fn new(inner: R, keystream: Keystream) -> Self {
        Self {
            inner,
            keystream,
            transformed: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for KeystreamReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let wanted = buf.remaining();
        if let Err(err) = ready!(Pin::new(&mut this.inner).poll_read(cx, buf)) {
            warn!(bytes = this.transformed, error = %err, "source read failed");
            return Poll::Ready(Err(err));
        }

        let fresh = &mut buf.filled_mut()[before..];
        if fresh.is_empty() && wanted > 0 {
            debug!(bytes = this.transformed, "source exhausted");
        }
        this.keystream.apply(fresh);
        this.transformed += fresh.len() as u64;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, IV, PLAINTEXT};
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn decrypts_while_reading() {
        let keystream = Keystream::new(&testing::key(), &IV).unwrap();
        let mut reader = KeystreamReader::new(Cursor::new(testing::ciphertext()), keystream);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, PLAINTEXT);
    }

    /// Yields `data` in one read, then fails.
    struct CutOff {
        data: Option<Vec<u8>>,
    }

    impl AsyncRead for CutOff {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.data.take() {
                Some(data) => {
                    buf.put_slice(&data);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                ))),
            }
        }
    }

    #[tokio::test]
    async fn read_error_passes_through_with_count_of_delivered_bytes() {
        let ciphertext = testing::ciphertext();
        let keystream = Keystream::new(&testing::key(), &IV).unwrap();
        let mut reader = KeystreamReader::new(
            CutOff {
                data: Some(ciphertext[..20].to_vec()),
            },
            keystream,
        );
        let mut buf = [0u8; 64];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &PLAINTEXT[..20]);

        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.transformed, 20);
    }

    #[tokio::test]
    async fn small_reads_keep_keystream_in_step() {
        let keystream = Keystream::new(&testing::key(), &IV).unwrap();
        let mut reader = KeystreamReader::new(Cursor::new(testing::ciphertext()), keystream);
        let mut out = Vec::new();
        let mut chunk = [0u8; 5];
        loop {
            let n = reader.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(out, PLAINTEXT);
    }
}
