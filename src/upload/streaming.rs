//! Body stream that digests bytes on their way to the transport

use crate::digest::{Digest, DigestAccumulator};
use crate::registry::transport::ByteStream;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;

pub const DEFAULT_READ_CHUNK: usize = 1024 * 1024;

/// Body stream reading `reader` in chunks of at most `chunk_size` bytes
pub fn reader_stream<R>(reader: R, chunk_size: usize) -> ByteStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    stream::try_unfold(reader, move |mut reader| async move {
        let mut buffer = vec![0u8; chunk_size.max(1)];
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buffer.truncate(read);
        Ok(Some((Bytes::from(buffer), reader)))
    })
    .boxed()
}

/// What an [`ObservedStream`] saw by the time its source ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub digest: Digest,
    pub size: u64,
}

/// Wraps a body stream, hashing and counting every chunk the consumer pulls.
///
/// The final digest and size are sent once, when the inner stream ends. If
/// the stream is dropped early the receiver sees a closed channel instead.
pub struct ObservedStream {
    inner: ByteStream,
    accumulator: DigestAccumulator,
    report: Option<oneshot::Sender<Observed>>,
}

impl ObservedStream {
    pub fn new(inner: ByteStream) -> (Self, oneshot::Receiver<Observed>) {
        let (report, receiver) = oneshot::channel();
        let stream = Self {
            inner,
            accumulator: DigestAccumulator::new(),
            report: Some(report),
        };
        (stream, receiver)
    }
}

impl Stream for ObservedStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.accumulator.update(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(None) => {
                if let Some(report) = this.report.take() {
                    let (digest, size) = std::mem::take(&mut this.accumulator).finish();
                    // Receiver gone means the upload was already abandoned.
                    let _ = report.send(Observed { digest, size });
                }
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reader_stream_chunks() {
        let data: &'static [u8] = b"0123456789";
        let chunks: Vec<Bytes> = reader_stream(data, 4)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), data.to_vec());
    }

    #[tokio::test]
    async fn test_reports_after_completion() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ])
        .boxed();
        let (observed, receiver) = ObservedStream::new(source);

        let chunks: Vec<_> = observed.collect().await;
        assert_eq!(chunks.len(), 2);

        let report = receiver.await.unwrap();
        assert_eq!(report.size, 11);
        assert_eq!(report.digest, Digest::compute(b"hello world"));
    }

    #[tokio::test]
    async fn test_empty_stream_reports_empty_digest() {
        let (observed, receiver) = ObservedStream::new(stream::empty::<std::io::Result<Bytes>>().boxed());
        let chunks: Vec<_> = observed.collect().await;
        assert!(chunks.is_empty());
        assert_eq!(
            receiver.await.unwrap(),
            Observed {
                digest: Digest::empty(),
                size: 0
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_stream_closes_channel() {
        let source = stream::iter(vec![Ok(Bytes::from_static(b"partial"))]).boxed();
        let (mut observed, receiver) = ObservedStream::new(source);
        let _ = observed.next().await;
        drop(observed);
        assert!(receiver.await.is_err());
    }
}
