use thiserror::Error;

/// Main error type for chunking, splitting and stitching operations.
///
/// The set is closed: every failure a caller can observe maps onto exactly
/// one of these kinds.
#[derive(Error, Debug)]
pub enum ChunkError {
    /// The underlying FFmpeg library rejected a call
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// The source file does not contain a video stream
    #[error("No video stream found in source file")]
    NoVideoStream,

    /// Failure opening an input media file
    #[error("Failed to open input: {0}")]
    OpenInput(String),

    /// Failure allocating or opening an output container
    #[error("Failed to create output: {0}")]
    Output(String),

    /// Failure configuring an output stream
    #[error("Stream setup failed: {0}")]
    StreamSetup(String),

    /// Failure writing the container header, a packet, or the trailer
    #[error("Write failed: {0}")]
    Write(String),

    /// Failure seeking in the source container
    #[error("Seek failed: {0}")]
    Seek(String),

    /// A chunk presented a stream layout that differs from the first chunk
    #[error("Stream layout mismatch: {0}")]
    LayoutMismatch(String),

    /// FFmpeg reported an allocation failure
    #[error("Out of memory")]
    OutOfMemory,

    /// An argument precondition was violated
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The stitcher was handed an unusable plan or chunk set
    #[error("Stitch input error: {0}")]
    StitchInput(String),

    /// A standard I/O error (directory creation, plan JSON files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ffmpeg_next::Error> for ChunkError {
    fn from(e: ffmpeg_next::Error) -> Self {
        ChunkError::Ffmpeg(e.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ChunkError>;
