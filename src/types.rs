use crate::pose::Pose;
use crate::UvcamError;

/// Upper bound on logical streams per camera.
pub const MAX_STREAMS: usize = 3;

/// Logical stream exposed to applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Depth = 0,
    Color = 1,
    Infrared = 2,
}

impl Stream {
    pub const ALL: [Stream; MAX_STREAMS] = [Stream::Depth, Stream::Color, Stream::Infrared];

    /// Slot index of this stream, in `0..MAX_STREAMS`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn flag(self) -> StreamSet {
        match self {
            Stream::Depth => StreamSet::DEPTH,
            Stream::Color => StreamSet::COLOR,
            Stream::Infrared => StreamSet::INFRARED,
        }
    }
}

impl TryFrom<usize> for Stream {
    type Error = UvcamError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Stream::ALL
            .get(index)
            .copied()
            .ok_or(UvcamError::InvalidStream(index))
    }
}

bitflags::bitflags! {
    /// Set of logical streams, as signalled to the device before streaming.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StreamSet: u8 {
        const DEPTH    = 1 << 0;
        const COLOR    = 1 << 1;
        const INFRARED = 1 << 2;
    }
}

/// Pixel format visible to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// 16-bit depth, scaled by the camera's depth scale.
    Z16,
    Yuyv,
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Y8,
    Y16,
}

impl Format {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Format::Y8 => 1,
            Format::Z16 | Format::Yuyv | Format::Y16 => 2,
            Format::Rgb8 | Format::Bgr8 => 3,
            Format::Rgba8 | Format::Bgra8 => 4,
        }
    }
}

/// Lens distortion model for [`Intrinsics::distortion_coeff`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistortionModel {
    /// Rectified image, coefficients are zero.
    #[default]
    None,
    ModifiedBrownConrady,
    InverseBrownConrady,
}

/// Pinhole camera model for one stream mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intrinsics {
    /// Image [width, height] in pixels.
    pub image_size: [u32; 2],
    /// Focal length [fx, fy] in pixels.
    pub focal_length: [f32; 2],
    /// Principal point [ppx, ppy] in pixels.
    pub principal_point: [f32; 2],
    pub distortion_model: DistortionModel,
    /// Brown-Conrady coefficients [k1, k2, p1, p2, k3].
    pub distortion_coeff: [f32; 5],
}

impl Intrinsics {
    /// Undistorted pinhole model.
    pub fn pinhole(width: u32, height: u32, focal_length: [f32; 2], principal_point: [f32; 2]) -> Self {
        Self {
            image_size: [width, height],
            focal_length,
            principal_point,
            distortion_model: DistortionModel::None,
            distortion_coeff: [0.0; 5],
        }
    }

    pub fn width(&self) -> u32 {
        self.image_size[0]
    }

    pub fn height(&self) -> u32 {
        self.image_size[1]
    }
}

/// Rigid transform from one stream's coordinate frame to another's.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extrinsics {
    /// Column-major 3x3 rotation.
    pub rotation: [f32; 9],
    /// Translation in meters.
    pub translation: [f32; 3],
}

impl From<Pose> for Extrinsics {
    fn from(pose: Pose) -> Self {
        Self {
            rotation: pose.orientation.to_cols_array(),
            translation: pose.position.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Float3, Float3x3};

    #[test]
    fn test_stream_index_roundtrip() {
        for stream in Stream::ALL {
            assert_eq!(Stream::try_from(stream.index()).unwrap(), stream);
        }
        assert!(matches!(
            Stream::try_from(MAX_STREAMS),
            Err(UvcamError::InvalidStream(3))
        ));
    }

    #[test]
    fn test_stream_flags() {
        let set = Stream::Depth.flag() | Stream::Infrared.flag();
        assert_eq!(set.bits(), 0b101);
        assert!(!set.contains(StreamSet::COLOR));
    }

    #[test]
    fn test_extrinsics_from_pose() {
        let pose = Pose::new(
            Float3x3::from_rows([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            Float3::new(0.025, 0.0, 0.0),
        );
        let e = Extrinsics::from(pose);
        assert_eq!(e.rotation, [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(e.translation, [0.025, 0.0, 0.0]);
    }
}
