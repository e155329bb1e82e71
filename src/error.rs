use crate::transport::TransportError;
use crate::types::{Format, Stream};

/// Errors that can occur when configuring or streaming from a camera.
#[derive(Debug, thiserror::Error)]
pub enum UvcamError {
    #[error("{call}(...) returned {status}")]
    Transport {
        call: &'static str,
        status: TransportError,
    },

    #[error("Unsupported mode for {stream:?}: {width}x{height} @ {fps} fps, {format:?}")]
    UnsupportedMode {
        stream: Stream,
        width: u32,
        height: u32,
        fps: u32,
        format: Format,
    },

    #[error("Stream {0:?} is not enabled")]
    StreamDisabled(Stream),

    #[error("Invalid stream index {0}")]
    InvalidStream(usize),

    #[error("No streams are enabled")]
    NoStreamsEnabled,

    #[error("Camera is already streaming")]
    AlreadyStreaming,

    #[error("Camera is not streaming")]
    NotStreaming,

    #[error("Frame slot for {0:?} already has an active writer")]
    SlotBusy(Stream),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Timeout waiting for frames")]
    Timeout,

    #[error("Frame stream stopped")]
    StreamStopped,
}
