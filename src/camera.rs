use crate::buffer::FrameSlot;
use crate::calibration::{CalibrationInfo, ResolutionMode};
use crate::channel::{FrameCounts, StreamChannel};
use crate::config::CameraConfig;
use crate::profile::DeviceProfile;
use crate::transport::{check_uvc, SubdeviceHandle, UvcDevice};
use crate::types::{Extrinsics, Format, Intrinsics, Stream, StreamSet, MAX_STREAMS};
use crate::{Result, UvcamError};
use std::time::Instant;

/// Slot and channel for one logical stream. Both present means enabled.
#[derive(Default)]
struct StreamEntry {
    slot: Option<FrameSlot>,
    channel: Option<StreamChannel>,
}

impl StreamEntry {
    fn is_enabled(&self) -> bool {
        self.slot.is_some() && self.channel.is_some()
    }
}

/// An opened depth camera.
///
/// Control-plane calls (`enable_stream`, `start_streaming`, `stop_streaming`,
/// `wait_all_streams`) are issued from one thread; only frame delivery runs
/// concurrently, on the transport's threads.
pub struct Camera {
    // Field order is drop order: channels close before the control handle
    // and the device.
    streams: [StreamEntry; MAX_STREAMS],
    control: Box<dyn SubdeviceHandle>,
    profile: Box<dyn DeviceProfile>,
    device: Box<dyn UvcDevice>,
    name: String,
    calib: CalibrationInfo,
    config: CameraConfig,
    streaming: bool,
}

impl Camera {
    /// Open a camera with configuration read from the environment.
    pub fn open(device: Box<dyn UvcDevice>, profile: Box<dyn DeviceProfile>) -> Result<Camera> {
        Self::open_with_config(device, profile, CameraConfig::from_env())
    }

    /// Open the control handle and retrieve calibration.
    pub fn open_with_config(
        device: Box<dyn UvcDevice>,
        profile: Box<dyn DeviceProfile>,
        config: CameraConfig,
    ) -> Result<Camera> {
        let name = device.product_name();
        let mut control = check_uvc(
            "uvc_open2",
            device.open_subdevice(profile.control_subdevice()),
        )?;
        let calib = profile.retrieve_calibration(control.as_mut())?;
        calib.validate()?;

        log::info!(
            "Opened {}: {} modes, depth scale {}",
            name,
            calib.modes.len(),
            calib.depth_scale
        );

        Ok(Camera {
            streams: Default::default(),
            control,
            profile,
            device,
            name,
            calib,
            config,
            streaming: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth_scale(&self) -> f32 {
        self.calib.depth_scale
    }

    pub fn calibration(&self) -> &CalibrationInfo {
        &self.calib
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Select a mode for `stream`, allocating its buffers and opening its
    /// subdevice. Re-enabling an enabled stream switches its mode.
    ///
    /// Unsupported modes fail without touching the stream's current state.
    pub fn enable_stream(
        &mut self,
        stream: Stream,
        width: u32,
        height: u32,
        fps: u32,
        format: Format,
    ) -> Result<()> {
        if self.streaming {
            return Err(UvcamError::AlreadyStreaming);
        }

        let mode = self
            .calib
            .find_mode(stream, width, height, fps, format)
            .cloned()
            .ok_or(UvcamError::UnsupportedMode {
                stream,
                width,
                height,
                fps,
                format,
            })?;

        let entry = &mut self.streams[stream.index()];
        match entry.channel.as_mut() {
            Some(channel) => channel.set_mode(mode.clone())?,
            None => {
                let subdevice = self.profile.subdevice_for(stream);
                entry.channel = Some(StreamChannel::open(
                    self.device.as_ref(),
                    subdevice,
                    mode.clone(),
                    self.config.drop_warn_interval,
                )?);
            }
        }
        match entry.slot.as_mut() {
            Some(slot) => slot.set_mode(mode)?,
            None => entry.slot = Some(FrameSlot::new(mode)),
        }

        log::info!(
            "Enabled {:?}: {}x{} @ {} fps, {:?}",
            stream,
            width,
            height,
            fps,
            format
        );
        Ok(())
    }

    /// Release a stream's buffers and close its subdevice.
    pub fn disable_stream(&mut self, stream: Stream) -> Result<()> {
        if self.streaming {
            return Err(UvcamError::AlreadyStreaming);
        }
        let entry = &mut self.streams[stream.index()];
        if entry.is_enabled() {
            log::info!("Disabled {:?}", stream);
        }
        *entry = StreamEntry::default();
        Ok(())
    }

    pub fn is_stream_enabled(&self, stream: Stream) -> bool {
        self.streams[stream.index()].is_enabled()
    }

    pub fn enabled_streams(&self) -> StreamSet {
        Stream::ALL
            .into_iter()
            .filter(|s| self.is_stream_enabled(*s))
            .fold(StreamSet::empty(), |set, s| set | s.flag())
    }

    /// Start every enabled stream as one batch.
    ///
    /// The device is told which streams are coming first. If any channel
    /// fails to start, the ones already started are stopped again.
    pub fn start_streaming(&mut self) -> Result<()> {
        if self.streaming {
            return Err(UvcamError::AlreadyStreaming);
        }
        let enabled = self.enabled_streams();
        if enabled.is_empty() {
            return Err(UvcamError::NoStreamsEnabled);
        }

        log::debug!("Stream intent: {:?}", enabled);
        self.profile
            .set_stream_intent(self.control.as_mut(), enabled)?;

        for i in 0..self.streams.len() {
            let entry = &mut self.streams[i];
            let (Some(channel), Some(slot)) = (entry.channel.as_mut(), entry.slot.as_ref()) else {
                continue;
            };
            if let Err(e) = channel.start_streaming(slot) {
                log::warn!(
                    "Failed to start {:?}: {}; stopping streams already started",
                    Stream::ALL[i],
                    e
                );
                for entry in &mut self.streams[..i] {
                    if let Some(channel) = entry.channel.as_mut() {
                        channel.stop_streaming();
                    }
                }
                return Err(e);
            }
        }

        self.streaming = true;
        log::info!("{}: streaming {:?}", self.name, enabled);
        Ok(())
    }

    /// Stop all streaming channels. No-op if nothing is streaming.
    pub fn stop_streaming(&mut self) {
        for entry in &mut self.streams {
            if let Some(channel) = entry.channel.as_mut() {
                channel.stop_streaming();
            }
        }
        if self.streaming {
            self.streaming = false;
            log::info!("{}: streaming stopped", self.name);
        }
    }

    /// Block until every streaming stream has a new frame, then promote all
    /// of them together so the images seen by the caller belong together.
    ///
    /// Blocks indefinitely unless `CameraConfig::wait_timeout` is set. Fails
    /// with [`UvcamError::StreamStopped`] if the transport releases a stream's
    /// frame callback while waiting.
    pub fn wait_all_streams(&mut self) -> Result<()> {
        if !self.streaming {
            return Err(UvcamError::NotStreaming);
        }

        let deadline = self.config.wait_timeout.map(|t| Instant::now() + t);
        for slot in self.streams.iter().filter_map(|e| e.slot.as_ref()) {
            slot.wait_for_frame(deadline)?;
        }
        for slot in self.streams.iter_mut().filter_map(|e| e.slot.as_mut()) {
            slot.update_image();
        }
        Ok(())
    }

    /// Pixels of the most recently promoted frame, or `None` if `stream` is disabled.
    pub fn image_pixels(&self, stream: Stream) -> Option<&[u8]> {
        self.streams[stream.index()].slot.as_ref().map(|s| s.image())
    }

    pub fn stream_mode(&self, stream: Stream) -> Option<&ResolutionMode> {
        self.streams[stream.index()].slot.as_ref().map(|s| s.mode())
    }

    pub fn stream_intrinsics(&self, stream: Stream) -> Result<Intrinsics> {
        self.stream_mode(stream)
            .map(|m| m.intrinsics)
            .ok_or(UvcamError::StreamDisabled(stream))
    }

    /// Transform from `from`'s coordinate frame into `to`'s. Defined whether
    /// or not either stream is enabled.
    pub fn stream_extrinsics(&self, from: Stream, to: Stream) -> Extrinsics {
        self.calib.extrinsics(from, to)
    }

    pub fn stream_stats(&self, stream: Stream) -> Option<FrameCounts> {
        self.streams[stream.index()]
            .channel
            .as_ref()
            .map(|c| c.stats())
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.stop_streaming();
    }
}
