use crate::buffer::{FrameSlot, FrameWriter};
use crate::calibration::ResolutionMode;
use crate::transport::{check_uvc, FrameCallback, SubdeviceHandle, UvcDevice, UvcFrame};
use crate::types::Stream;
use crate::{Result, UvcamError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Frame counters for one channel, updated from the capture callback.
#[derive(Debug, Default)]
pub struct ChannelStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl ChannelStats {
    pub fn snapshot(&self) -> FrameCounts {
        FrameCounts {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameCounts {
    pub delivered: u64,
    /// Frames whose payload size did not match the active mode.
    pub dropped: u64,
}

/// One open subdevice feeding a [`FrameSlot`].
///
/// The transport's callback owns the slot's [`FrameWriter`] while streaming;
/// stopping drops the callback and returns the write buffer to the slot.
pub struct StreamChannel {
    handle: Box<dyn SubdeviceHandle>,
    subdevice: u8,
    mode: ResolutionMode,
    stats: Arc<ChannelStats>,
    streaming: bool,
    drop_warn_interval: u64,
}

impl StreamChannel {
    /// Open `subdevice` for streaming `mode`.
    pub fn open(
        device: &dyn UvcDevice,
        subdevice: u8,
        mode: ResolutionMode,
        drop_warn_interval: u64,
    ) -> Result<StreamChannel> {
        let handle = check_uvc("uvc_open2", device.open_subdevice(subdevice))?;
        log::debug!("Opened subdevice {} for {:?}", subdevice, mode.stream);
        Ok(StreamChannel {
            handle,
            subdevice,
            mode,
            stats: Arc::new(ChannelStats::default()),
            streaming: false,
            drop_warn_interval,
        })
    }

    pub fn subdevice(&self) -> u8 {
        self.subdevice
    }

    pub fn mode(&self) -> &ResolutionMode {
        &self.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn stats(&self) -> FrameCounts {
        self.stats.snapshot()
    }

    /// Retarget the channel. Only valid while stopped.
    pub fn set_mode(&mut self, mode: ResolutionMode) -> Result<()> {
        if self.streaming {
            return Err(UvcamError::AlreadyStreaming);
        }
        self.mode = mode;
        Ok(())
    }

    /// Negotiate the wire mode and start delivering frames into `slot`.
    pub fn start_streaming(&mut self, slot: &FrameSlot) -> Result<()> {
        if self.streaming {
            return Err(UvcamError::AlreadyStreaming);
        }

        let mode = &self.mode;
        let control = check_uvc(
            "uvc_get_stream_ctrl_format_size",
            self.handle
                .negotiate(mode.uvc_format, mode.uvc_width, mode.uvc_height, mode.uvc_fps),
        )?;
        log::debug!(
            "{:?} negotiated {:?} {}x{} interval={} max_frame={}",
            mode.stream,
            control.format,
            control.width,
            control.height,
            control.frame_interval,
            control.max_frame_size
        );

        let mut writer = slot.writer()?;
        let stats = Arc::clone(&self.stats);
        let stream = mode.stream;
        let warn_interval = self.drop_warn_interval;
        let callback: FrameCallback = Box::new(move |frame: &UvcFrame<'_>| {
            on_frame(stream, &mut writer, &stats, warn_interval, frame);
        });

        check_uvc(
            "uvc_start_streaming",
            self.handle.start_streaming(&control, callback),
        )?;
        self.streaming = true;

        log::info!(
            "{:?} streaming on subdevice {} ({}x{} @ {} fps)",
            self.mode.stream,
            self.subdevice,
            self.mode.width,
            self.mode.height,
            self.mode.fps
        );
        Ok(())
    }

    /// Stop delivery and release the slot. No-op if not streaming.
    pub fn stop_streaming(&mut self) {
        if !self.streaming {
            return;
        }
        self.handle.stop_streaming();
        self.streaming = false;
        log::info!("{:?} stopped on subdevice {}", self.mode.stream, self.subdevice);
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.stop_streaming();
    }
}

/// Capture-callback body. Runs on the transport's delivery thread.
fn on_frame(
    stream: Stream,
    writer: &mut FrameWriter,
    stats: &ChannelStats,
    warn_interval: u64,
    frame: &UvcFrame<'_>,
) {
    if writer.publish(frame.data) {
        stats.delivered.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let dropped = stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
    log::trace!(
        "{:?} frame {} dropped: {} bytes, expected {}",
        stream,
        frame.sequence,
        frame.data.len(),
        writer.frame_size()
    );
    if warn_interval > 0 && (dropped - 1) % warn_interval == 0 {
        log::warn!(
            "{:?}: {} frame(s) dropped for size mismatch (last: {} bytes, expected {})",
            stream,
            dropped,
            frame.data.len(),
            writer.frame_size()
        );
    }
}
