pub type CopyCancellationToken = tokio_util::sync::CancellationToken;

/// One token per process. Every storage, worker and copier holds a clone of it.
pub fn create_copy_cancellation_token() -> CopyCancellationToken {
    tokio_util::sync::CancellationToken::new()
}
