//! Streaming request body that reports upload progress.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;
use http_body::{Frame, SizeHint};
use s3_backup_sync::progress::ProgressCallback;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Bytes read from disk per body frame.
const CHUNK_SIZE: usize = 256 * 1024;

/// File-backed `http_body::Body` that calls
/// [`ProgressCallback::set_position`] with the running byte count after
/// every frame it yields.
///
/// The body can only be read once, so the SDK cannot replay it on retry.
pub struct ProgressBody {
    stream: ReaderStream<File>,
    sent: u64,
    total: u64,
    progress: Arc<dyn ProgressCallback>,
}

impl ProgressBody {
    pub fn new(file: File, total: u64, progress: Arc<dyn ProgressCallback>) -> Self {
        Self {
            stream: ReaderStream::with_capacity(file, CHUNK_SIZE),
            sent: 0,
            total,
            progress,
        }
    }
}

impl http_body::Body for ProgressBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.stream).poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.sent += chunk.len() as u64;
                this.progress.set_position(this.sent);
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            Some(Err(e)) => Poll::Ready(Some(Err(e))),
            None => Poll::Ready(None),
        }
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.total.saturating_sub(self.sent))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http_body::Body as _;

    use super::*;

    #[derive(Default)]
    struct Positions(Mutex<Vec<u64>>);

    impl ProgressCallback for Positions {
        fn set_total(&self, _total: u64) {}
        fn set_position(&self, pos: u64) {
            self.0.lock().unwrap().push(pos);
        }
        fn inc(&self, _delta: u64) {}
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
        fn finish_and_clear(&self) {}
    }

    async fn next_frame(body: &mut ProgressBody) -> Option<Bytes> {
        futures::future::poll_fn(|cx| Pin::new(&mut *body).poll_frame(cx))
            .await
            .map(|frame| frame.unwrap().into_data().unwrap())
    }

    #[tokio::test]
    async fn yields_file_contents_and_counts_bytes() {
        let path = std::env::temp_dir().join("s3_backup_progress_body.bin");
        let data = vec![7u8; CHUNK_SIZE + 10];
        std::fs::write(&path, &data).unwrap();

        let total = data.len() as u64;
        let positions = Arc::new(Positions::default());
        let file = File::open(&path).await.unwrap();
        let mut body = ProgressBody::new(file, total, positions.clone());
        assert_eq!(body.size_hint().exact(), Some(total));

        let mut received = Vec::new();
        while let Some(chunk) = next_frame(&mut body).await {
            received.extend_from_slice(&chunk);
        }

        assert_eq!(received, data);
        assert_eq!(body.size_hint().exact(), Some(0));
        let positions = positions.0.lock().unwrap();
        assert_eq!(positions.last().copied(), Some(total));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let _ = std::fs::remove_file(&path);
    }
}
