use crate::calibration::CalibrationInfo;
use crate::transport::{check_uvc, SubdeviceHandle};
use crate::types::{Stream, StreamSet, MAX_STREAMS};
use crate::Result;

/// Device-model specific behavior the camera is constructed with.
pub trait DeviceProfile: Send {
    /// Subdevice backing a logical stream.
    fn subdevice_for(&self, stream: Stream) -> u8;

    /// Subdevice whose handle carries calibration reads and the stream intent.
    fn control_subdevice(&self) -> u8 {
        0
    }

    /// Read calibration from device memory. Called once, when the camera is opened.
    fn retrieve_calibration(&self, handle: &mut dyn SubdeviceHandle) -> Result<CalibrationInfo>;

    /// Announce which streams are about to start, before any channel starts.
    fn set_stream_intent(&self, handle: &mut dyn SubdeviceHandle, streams: StreamSet) -> Result<()>;
}

/// A profile whose mapping and calibration are plain data.
///
/// If an intent control is configured, the stream intent is a single SET_CUR
/// of the [`StreamSet`] bits on that extension unit control.
#[derive(Debug, Clone)]
pub struct StaticProfile {
    subdevices: [u8; MAX_STREAMS],
    calibration: CalibrationInfo,
    intent_control: Option<(u8, u8)>,
}

impl StaticProfile {
    /// `subdevices` is indexed by [`Stream::index`].
    pub fn new(subdevices: [u8; MAX_STREAMS], calibration: CalibrationInfo) -> Self {
        Self {
            subdevices,
            calibration,
            intent_control: None,
        }
    }

    pub fn with_intent_control(mut self, unit: u8, selector: u8) -> Self {
        self.intent_control = Some((unit, selector));
        self
    }
}

impl DeviceProfile for StaticProfile {
    fn subdevice_for(&self, stream: Stream) -> u8 {
        self.subdevices[stream.index()]
    }

    fn retrieve_calibration(&self, _handle: &mut dyn SubdeviceHandle) -> Result<CalibrationInfo> {
        Ok(self.calibration.clone())
    }

    fn set_stream_intent(&self, handle: &mut dyn SubdeviceHandle, streams: StreamSet) -> Result<()> {
        match self.intent_control {
            Some((unit, selector)) => check_uvc(
                "uvc_set_ctrl",
                handle.set_control(unit, selector, &[streams.bits()]),
            ),
            None => Ok(()),
        }
    }
}
