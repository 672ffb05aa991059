//! Streaming MD5 of the local file.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::BackupError;

/// Read buffer size.
const CHUNK_SIZE: usize = 256 * 1024;

/// Computes the lower-case hex MD5 of everything `reader` yields.
///
/// Memory use is bounded by [`CHUNK_SIZE`] regardless of input length.
///
/// # Errors
///
/// Returns the reader's I/O error if it fails before end of stream.
pub async fn hash_reader<R: AsyncRead + Unpin>(mut reader: R) -> Result<String, std::io::Error> {
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        context.consume(&buffer[..n]);
    }
    Ok(format!("{:x}", context.finalize()))
}

/// Computes the MD5 of the file at `path`.
///
/// # Errors
///
/// Returns [`BackupError::Stream`] if the file cannot be opened or read.
pub async fn hash_file(path: &str) -> Result<String, BackupError> {
    let stream_error = |source| BackupError::Stream {
        path: path.to_string(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(stream_error)?;
    let digest = hash_reader(file).await.map_err(stream_error)?;

    log::debug!("local md5 of {path}: {digest}");
    Ok(digest)
}
