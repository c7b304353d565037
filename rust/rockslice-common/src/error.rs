use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn unbound_access(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnboundAccess {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn use_after_dispose(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::UseAfterDispose {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn offset_out_of_range(offset: usize, len: usize) -> Error {
        Error(ErrorKind::OffsetOutOfRange { offset, len }.into())
    }

    pub fn premature_dispose(live: u64) -> Error {
        Error(ErrorKind::PrematureDispose { live }.into())
    }

    pub fn unknown_handle(handle: u64) -> Error {
        Error(ErrorKind::UnknownHandle { handle }.into())
    }

    pub fn allocation(size: usize, reason: impl Into<String>) -> Error {
        Error(
            ErrorKind::Allocation {
                size,
                reason: reason.into(),
            }
            .into(),
        )
    }

    /// `true` for the slice lifecycle violations (as opposed to engine or
    /// configuration failures).
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnboundAccess { .. }
                | ErrorKind::UseAfterDispose { .. }
                | ErrorKind::PrematureDispose { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("'{operation}' requires a slice bound to a native buffer")]
    UnboundAccess { operation: String },

    #[error("'{operation}' invoked on a disposed slice")]
    UseAfterDispose { operation: String },

    #[error("offset {offset} is out of range for a source of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("native buffer is still referenced by {live} lease(s)")]
    PrematureDispose { live: u64 },

    #[error("unknown native handle {handle:#x}")]
    UnknownHandle { handle: u64 },

    #[error("failed to allocate a native buffer of {size} bytes: {reason}")]
    Allocation { size: usize, reason: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
