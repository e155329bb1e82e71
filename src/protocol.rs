/// Frame formats a UVC subdevice can advertise.
///
/// Besides the standard uncompressed formats, depth cameras expose vendor
/// GUIDs whose first four bytes are the fourcc below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Yuyv,
    Uyvy,
    Rgb,
    Bgr,
    Gray8,
    Gray16,
    /// 16-bit depth.
    Z16,
    /// 16-bit depth, vendor GUID.
    Invz,
    /// 8-bit infrared.
    Invi,
    /// 16-bit infrared, 10 significant bits.
    Invr,
    /// Interleaved 16-bit depth and 8-bit infrared.
    Inri,
    /// Interleaved 12-bit left/right infrared pair.
    Y12i,
}

impl WireFormat {
    pub const ALL: [WireFormat; 12] = [
        WireFormat::Yuyv,
        WireFormat::Uyvy,
        WireFormat::Rgb,
        WireFormat::Bgr,
        WireFormat::Gray8,
        WireFormat::Gray16,
        WireFormat::Z16,
        WireFormat::Invz,
        WireFormat::Invi,
        WireFormat::Invr,
        WireFormat::Inri,
        WireFormat::Y12i,
    ];

    /// First four bytes of the format GUID.
    pub fn fourcc(self) -> [u8; 4] {
        match self {
            WireFormat::Yuyv => *b"YUY2",
            WireFormat::Uyvy => *b"UYVY",
            WireFormat::Rgb => *b"RGB3",
            WireFormat::Bgr => *b"BGR3",
            WireFormat::Gray8 => *b"Y800",
            WireFormat::Gray16 => *b"Y16 ",
            WireFormat::Z16 => *b"Z16 ",
            WireFormat::Invz => *b"INVZ",
            WireFormat::Invi => *b"INVI",
            WireFormat::Invr => *b"INVR",
            WireFormat::Inri => *b"INRI",
            WireFormat::Y12i => *b"Y12I",
        }
    }

    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<WireFormat> {
        WireFormat::ALL.into_iter().find(|f| &f.fourcc() == fourcc)
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            WireFormat::Gray8 | WireFormat::Invi => 1,
            WireFormat::Yuyv
            | WireFormat::Uyvy
            | WireFormat::Gray16
            | WireFormat::Z16
            | WireFormat::Invz
            | WireFormat::Invr => 2,
            WireFormat::Rgb | WireFormat::Bgr | WireFormat::Inri | WireFormat::Y12i => 3,
        }
    }
}

/// dwFrameInterval for a frame rate, in 100 ns units.
pub fn frame_interval(fps: u32) -> u32 {
    if fps == 0 {
        return 0;
    }
    10_000_000 / fps
}

/// Byte footprint of a tightly packed image.
pub fn frame_size(width: u32, height: u32, bytes_per_pixel: usize) -> usize {
    width as usize * height as usize * bytes_per_pixel
}
