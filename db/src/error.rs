use crate::store::StoreError;

/// Domain failures surfaced by session and ledger operations.
///
/// Infrastructure failures travel as `Store`; handlers map each variant to
/// its HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("session is not active")]
    SessionInactive,
    #[error("attendance already marked for this session")]
    AlreadyMarked,
    #[error(transparent)]
    Store(#[from] StoreError),
}
