use thiserror::Error;

/// Failures that abort a single unit of work (a tenant or a block).
/// The underlying cause is attached as `anyhow` context by the caller.
#[derive(Error, Debug, PartialEq)]
pub enum BlocksCopyError {
    #[error("failed to list prefix: {prefix}")]
    ListError { prefix: String },
    #[error("failed to read block metadata: {path}")]
    MetadataReadError { path: String },
    #[error("failed to copy object: {path}")]
    CopyError { path: String },
    #[error("failed to write copied marker: {path}")]
    MarkerWriteError { path: String },
    #[error("object not found: {path}")]
    ObjectNotFound { path: String },
    #[error("cancelled")]
    Cancelled,
}

pub fn is_cancelled_error(e: &anyhow::Error) -> bool {
    if e.downcast_ref::<BlocksCopyError>() == Some(&BlocksCopyError::Cancelled) {
        return true;
    }

    e.chain().any(|cause| {
        cause
            .downcast_ref::<BlocksCopyError>()
            .is_some_and(|error| *error == BlocksCopyError::Cancelled)
    })
}

pub fn is_not_found_error(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<BlocksCopyError>(),
            Some(BlocksCopyError::ObjectNotFound { .. })
        )
    })
}
