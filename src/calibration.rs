use crate::pose::Pose;
use crate::protocol::{self, WireFormat};
use crate::types::{Extrinsics, Format, Intrinsics, Stream, MAX_STREAMS};
use crate::{Result, UvcamError};

/// A supported stream mode: what the client sees, and what is negotiated
/// over UVC to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionMode {
    pub stream: Stream,

    /// Resolution, frame rate and format visible to the client.
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: Format,

    /// Resolution, frame rate and format advertised over UVC.
    pub uvc_width: u32,
    pub uvc_height: u32,
    pub uvc_fps: u32,
    pub uvc_format: WireFormat,

    pub intrinsics: Intrinsics,
}

impl ResolutionMode {
    /// Bytes of one client-visible frame.
    pub fn frame_size(&self) -> usize {
        protocol::frame_size(self.width, self.height, self.format.bytes_per_pixel())
    }

    /// Bytes of one frame as delivered by the transport.
    pub fn wire_frame_size(&self) -> usize {
        protocol::frame_size(
            self.uvc_width,
            self.uvc_height,
            self.uvc_format.bytes_per_pixel(),
        )
    }

    pub fn matches(&self, stream: Stream, width: u32, height: u32, fps: u32, format: Format) -> bool {
        self.stream == stream
            && self.width == width
            && self.height == height
            && self.fps == fps
            && self.format == format
    }
}

/// Per-device calibration, retrieved once when the camera is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationInfo {
    pub modes: Vec<ResolutionMode>,
    /// Device frame to stream frame, indexed by [`Stream::index`].
    pub stream_poses: [Pose; MAX_STREAMS],
    /// Meters per depth unit.
    pub depth_scale: f32,
}

impl CalibrationInfo {
    pub fn find_mode(
        &self,
        stream: Stream,
        width: u32,
        height: u32,
        fps: u32,
        format: Format,
    ) -> Option<&ResolutionMode> {
        self.modes
            .iter()
            .find(|m| m.matches(stream, width, height, fps, format))
    }

    pub fn modes_for(&self, stream: Stream) -> impl Iterator<Item = &ResolutionMode> {
        self.modes.iter().filter(move |m| m.stream == stream)
    }

    pub fn stream_pose(&self, stream: Stream) -> &Pose {
        &self.stream_poses[stream.index()]
    }

    /// Transform from the `from` stream's frame into the `to` stream's frame.
    pub fn extrinsics(&self, from: Stream, to: Stream) -> Extrinsics {
        (self.stream_pose(from).inverse() * *self.stream_pose(to)).into()
    }

    /// Reject calibration data that could not describe a working device.
    pub fn validate(&self) -> Result<()> {
        if !self.depth_scale.is_finite() || self.depth_scale <= 0.0 {
            return Err(UvcamError::InvalidCalibration(format!(
                "depth scale must be positive, got {}",
                self.depth_scale
            )));
        }
        for mode in &self.modes {
            let dims = [
                mode.width,
                mode.height,
                mode.fps,
                mode.uvc_width,
                mode.uvc_height,
                mode.uvc_fps,
            ];
            if dims.contains(&0) {
                return Err(UvcamError::InvalidCalibration(format!(
                    "{:?} mode {}x{} @ {} fps has a zero dimension",
                    mode.stream, mode.width, mode.height, mode.fps
                )));
            }
            // Payloads reach the slot undecoded.
            if mode.wire_frame_size() != mode.frame_size() {
                return Err(UvcamError::InvalidCalibration(format!(
                    "{:?} mode {}x{} {:?} is {} bytes on the wire but {} bytes to the client",
                    mode.stream,
                    mode.width,
                    mode.height,
                    mode.format,
                    mode.wire_frame_size(),
                    mode.frame_size()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::pose::{Float3, Float3x3};

    pub(crate) fn mode(stream: Stream, width: u32, height: u32, fps: u32, format: Format) -> ResolutionMode {
        let uvc_format = match format {
            Format::Z16 => WireFormat::Z16,
            Format::Yuyv => WireFormat::Yuyv,
            Format::Rgb8 => WireFormat::Rgb,
            Format::Bgr8 => WireFormat::Bgr,
            Format::Y8 => WireFormat::Gray8,
            Format::Y16 | Format::Rgba8 | Format::Bgra8 => WireFormat::Gray16,
        };
        ResolutionMode {
            stream,
            width,
            height,
            fps,
            format,
            uvc_width: width,
            uvc_height: height,
            uvc_fps: fps,
            uvc_format,
            intrinsics: Intrinsics::pinhole(
                width,
                height,
                [width as f32 * 0.9, width as f32 * 0.9],
                [width as f32 / 2.0, height as f32 / 2.0],
            ),
        }
    }

    /// Depth and infrared share the device origin, color sits 25 mm to the
    /// side and is rolled 90 degrees.
    pub(crate) fn calibration() -> CalibrationInfo {
        CalibrationInfo {
            modes: vec![
                mode(Stream::Depth, 640, 480, 30, Format::Z16),
                mode(Stream::Depth, 320, 240, 60, Format::Z16),
                mode(Stream::Color, 640, 480, 30, Format::Rgb8),
                mode(Stream::Color, 1920, 1080, 30, Format::Yuyv),
                mode(Stream::Infrared, 640, 480, 30, Format::Y8),
            ],
            stream_poses: [
                Pose::IDENTITY,
                Pose::new(
                    Float3x3::from_rows([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                    Float3::new(0.025, 0.0, 0.0),
                ),
                Pose::IDENTITY,
            ],
            depth_scale: 0.001,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::pose::tests::assert_pose_eq;
    use crate::pose::{Float3, Float3x3};

    #[test]
    fn test_find_mode() {
        let calib = calibration();
        let m = calib
            .find_mode(Stream::Color, 1920, 1080, 30, Format::Yuyv)
            .unwrap();
        assert_eq!(m.uvc_format, WireFormat::Yuyv);
        assert_eq!(m.frame_size(), 1920 * 1080 * 2);

        // Right resolution, wrong stream or format.
        assert!(calib.find_mode(Stream::Infrared, 640, 480, 30, Format::Z16).is_none());
        assert!(calib.find_mode(Stream::Depth, 640, 480, 30, Format::Y16).is_none());
        assert!(calib.find_mode(Stream::Depth, 640, 480, 60, Format::Z16).is_none());
    }

    #[test]
    fn test_modes_for_stream() {
        let calib = calibration();
        assert_eq!(calib.modes_for(Stream::Depth).count(), 2);
        assert_eq!(calib.modes_for(Stream::Infrared).count(), 1);
    }

    #[test]
    fn test_wire_footprint_can_differ() {
        let mut m = mode(Stream::Infrared, 640, 480, 30, Format::Y8);
        m.uvc_format = WireFormat::Y12i;
        assert_eq!(m.frame_size(), 640 * 480);
        assert_eq!(m.wire_frame_size(), 640 * 480 * 3);
    }

    #[test]
    fn test_extrinsics_to_self_is_identity() {
        let calib = calibration();
        for stream in Stream::ALL {
            let e = calib.extrinsics(stream, stream);
            let pose = Pose::new(
                Float3x3::from_cols(
                    Float3::new(e.rotation[0], e.rotation[1], e.rotation[2]),
                    Float3::new(e.rotation[3], e.rotation[4], e.rotation[5]),
                    Float3::new(e.rotation[6], e.rotation[7], e.rotation[8]),
                ),
                Float3::new(e.translation[0], e.translation[1], e.translation[2]),
            );
            assert_pose_eq(&pose, &Pose::IDENTITY);
        }
    }

    #[test]
    fn test_extrinsics_depth_to_color() {
        let calib = calibration();
        let e = calib.extrinsics(Stream::Depth, Stream::Color);
        // Depth pose is identity, so depth->color is the color pose itself.
        assert_eq!(e, Extrinsics::from(calib.stream_poses[Stream::Color.index()]));

        let back = calib.extrinsics(Stream::Color, Stream::Depth);
        let expected = Extrinsics::from(calib.stream_poses[Stream::Color.index()].inverse());
        assert_eq!(back, expected);
    }

    #[test]
    fn test_validate() {
        assert!(calibration().validate().is_ok());

        let mut bad_scale = calibration();
        bad_scale.depth_scale = 0.0;
        assert!(matches!(
            bad_scale.validate(),
            Err(UvcamError::InvalidCalibration(_))
        ));

        let mut bad_mode = calibration();
        bad_mode.modes[0].uvc_fps = 0;
        assert!(matches!(
            bad_mode.validate(),
            Err(UvcamError::InvalidCalibration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_footprint_mismatch() {
        let mut calib = calibration();
        let ir = calib.modes.iter_mut().find(|m| m.stream == Stream::Infrared).unwrap();
        ir.uvc_format = WireFormat::Y12i;
        let err = calib.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid calibration: Infrared mode 640x480 Y8 is 921600 bytes on the wire but 307200 bytes to the client"
        );

        // Same footprint through a different wire layout is fine.
        let mut calib = calibration();
        calib.modes[3].uvc_format = WireFormat::Uyvy;
        assert!(calib.validate().is_ok());
    }
}
