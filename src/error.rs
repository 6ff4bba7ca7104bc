use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Not enough memory in the work buffer")]
    NotEnoughMemory = 1,
    #[error("Start of image marker not found")]
    StartOfImageMarkerNotFound = 2,
    #[error("Invalid marker segment size")]
    InvalidMarkerSegmentSize = 3,
    #[error("Malformed header segment")]
    MalformedHeader = 4,
    #[error("Encoding not supported")]
    UnsupportedEncoding = 5,
    #[error("Input stream truncated")]
    TruncatedInput = 6,
    #[error("Invalid entropy-coded segment")]
    InvalidEntropyCode = 7,
    #[error("Restart marker not found")]
    RestartMarkerNotFound = 8,
    #[error("Output callback failed")]
    CallbackFailed = 9,

    // Logic errors
    #[error("Invalid argument")]
    InvalidArgument = 100,
}
