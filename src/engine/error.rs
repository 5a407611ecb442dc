pub const START_REQUIRED: &str = "startTime is required";
pub const END_REQUIRED: &str = "endTime is required";
pub const INVALID_FORMAT: &str = "Time format is invalid";
pub const END_NOT_AFTER_START: &str = "endTime must be after startTime";
pub const OCCUPIED: &str = "Time slot occupied by another provider";

/// Every failure `submit` can produce. Both variants are terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or impossible input; the message is reported verbatim to the caller.
    InvalidRange(&'static str),
    /// The candidate overlaps the slot with this id, held by another owner.
    Conflict(u64),
}

impl EngineError {
    /// Caller-facing message, without internal ids.
    pub fn message(&self) -> &'static str {
        match self {
            EngineError::InvalidRange(msg) => msg,
            EngineError::Conflict(_) => OCCUPIED,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            EngineError::Conflict(id) => write!(f, "conflict with slot: {id}"),
        }
    }
}

impl std::error::Error for EngineError {}
