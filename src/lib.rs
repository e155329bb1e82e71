//! # uvcam - stream core for UVC depth cameras
//!
//! Sits between a UVC transport and an application-facing camera API:
//! - Maps requested stream modes onto the wire modes the device advertises
//! - Hands frames from the transport's callback threads to the application
//!   through per-stream triple buffers, without copying pixels under a lock
//! - Answers intrinsics and extrinsics queries from device calibration
//!
//! The transport ([`UvcDevice`], [`SubdeviceHandle`]) and the per-model
//! behavior ([`DeviceProfile`]) are supplied by the caller.
//!
//! ## Quick Start
//! ```no_run
//! use uvcam::{Camera, DeviceProfile, Format, Stream, UvcDevice};
//!
//! fn capture(device: Box<dyn UvcDevice>, profile: Box<dyn DeviceProfile>) -> uvcam::Result<()> {
//!     let mut camera = Camera::open(device, profile)?;
//!     camera.enable_stream(Stream::Depth, 640, 480, 30, Format::Z16)?;
//!     camera.start_streaming()?;
//!
//!     for _ in 0..100 {
//!         camera.wait_all_streams()?;
//!         let depth = camera.image_pixels(Stream::Depth).unwrap_or_default();
//!         println!("{} bytes, scale {}", depth.len(), camera.depth_scale());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod types;
pub mod pose;
pub mod protocol;
pub mod calibration;
pub mod buffer;
pub mod transport;
pub mod channel;
pub mod profile;
pub mod config;
pub mod camera;

pub use error::UvcamError;
pub use types::*;
pub use pose::{Float3, Float3x3, Pose};
pub use calibration::{CalibrationInfo, ResolutionMode};
pub use buffer::{FrameSlot, FrameWriter};
pub use transport::{SubdeviceHandle, TransportError, UvcDevice, UvcFrame};
pub use channel::{FrameCounts, StreamChannel};
pub use profile::{DeviceProfile, StaticProfile};
pub use config::CameraConfig;
pub use camera::Camera;

/// Result type alias for uvcam operations.
pub type Result<T> = std::result::Result<T, UvcamError>;
