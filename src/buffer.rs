use crate::calibration::ResolutionMode;
use crate::{Result, UvcamError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Buffers in flight between the capture callback and the reader.
struct Exchange {
    /// Most recently completed frame, not yet promoted to front.
    back: Vec<u8>,
    /// Write target, parked here while no [`FrameWriter`] holds it.
    middle: Option<Vec<u8>>,
    updated: bool,
    /// Wake-ups from the current writer. Disconnected once it is dropped.
    ready_rx: Receiver<()>,
}

struct Shared {
    exchange: Mutex<Exchange>,
}

impl Shared {
    // Critical sections only swap buffer identities, so a poisoned lock
    // still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, Exchange> {
        self.exchange.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Triple-buffered image holder for one logical stream.
///
/// The reader owns `front`, the capture callback owns `middle` through a
/// [`FrameWriter`], and `back` sits behind the lock. Handing a buffer from
/// one side to the other is a `Vec` swap under the lock; pixels are never
/// copied while it is held.
pub struct FrameSlot {
    mode: ResolutionMode,
    front: Vec<u8>,
    shared: Arc<Shared>,
}

impl FrameSlot {
    /// Allocate three zeroed buffers sized for `mode`.
    pub fn new(mode: ResolutionMode) -> Self {
        let size = mode.frame_size();
        // No writer yet, so start out disconnected.
        let (_, ready_rx) = crossbeam_channel::bounded(1);
        Self {
            mode,
            front: vec![0; size],
            shared: Arc::new(Shared {
                exchange: Mutex::new(Exchange {
                    back: vec![0; size],
                    middle: Some(vec![0; size]),
                    updated: false,
                    ready_rx,
                }),
            }),
        }
    }

    pub fn mode(&self) -> &ResolutionMode {
        &self.mode
    }

    pub fn frame_size(&self) -> usize {
        self.front.len()
    }

    /// Resize all three buffers for a new mode and discard any pending frame.
    ///
    /// Fails with [`UvcamError::SlotBusy`] while a writer is bound, i.e. while
    /// the owning channel is still streaming.
    pub fn set_mode(&mut self, mode: ResolutionMode) -> Result<()> {
        let size = mode.frame_size();
        {
            let mut guard = self.shared.lock();
            let exchange = &mut *guard;
            let middle = exchange
                .middle
                .as_mut()
                .ok_or(UvcamError::SlotBusy(self.mode.stream))?;
            middle.clear();
            middle.resize(size, 0);
            exchange.back.clear();
            exchange.back.resize(size, 0);
            exchange.updated = false;
            while exchange.ready_rx.try_recv().is_ok() {}
        }
        self.front.clear();
        self.front.resize(size, 0);
        self.mode = mode;
        Ok(())
    }

    /// Take the producer half. Only one writer can exist at a time; dropping
    /// it hands the write buffer back to the slot and wakes any waiter with
    /// [`UvcamError::StreamStopped`].
    pub fn writer(&self) -> Result<FrameWriter> {
        let mut guard = self.shared.lock();
        let middle = guard
            .middle
            .take()
            .ok_or(UvcamError::SlotBusy(self.mode.stream))?;
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        guard.ready_rx = ready_rx;
        Ok(FrameWriter {
            middle,
            shared: Arc::clone(&self.shared),
            ready_tx,
        })
    }

    /// Whether a completed frame is waiting to be promoted.
    pub fn has_new_frame(&self) -> bool {
        self.shared.lock().updated
    }

    /// Promote the latest completed frame to front.
    ///
    /// Returns `false` and leaves [`image`](Self::image) untouched if nothing
    /// arrived since the last promotion.
    pub fn update_image(&mut self) -> bool {
        let mut guard = self.shared.lock();
        if !guard.updated {
            return false;
        }
        std::mem::swap(&mut self.front, &mut guard.back);
        guard.updated = false;
        true
    }

    /// The front buffer. Stable until the next `update_image()` that returns `true`.
    pub fn image(&self) -> &[u8] {
        &self.front
    }

    /// Block until a completed frame is waiting, or until `deadline`.
    ///
    /// Fails with [`UvcamError::StreamStopped`] if no writer is bound, or
    /// if the writer goes away while waiting.
    pub(crate) fn wait_for_frame(&self, deadline: Option<Instant>) -> Result<()> {
        let ready_rx = self.shared.lock().ready_rx.clone();
        while !self.has_new_frame() {
            match deadline {
                None => ready_rx
                    .recv()
                    .map_err(|_| UvcamError::StreamStopped)?,
                Some(deadline) => {
                    ready_rx
                        .recv_deadline(deadline)
                        .map_err(|e| match e {
                            RecvTimeoutError::Timeout => UvcamError::Timeout,
                            RecvTimeoutError::Disconnected => UvcamError::StreamStopped,
                        })?
                }
            }
        }
        Ok(())
    }
}

/// Producer half of a [`FrameSlot`], owned by the capture callback.
pub struct FrameWriter {
    middle: Vec<u8>,
    shared: Arc<Shared>,
    ready_tx: Sender<()>,
}

impl FrameWriter {
    pub fn frame_size(&self) -> usize {
        self.middle.len()
    }

    /// Copy a complete frame into the write buffer and publish it.
    ///
    /// A payload whose length differs from the slot's footprint is dropped
    /// and `false` is returned; no buffer changes.
    pub fn publish(&mut self, payload: &[u8]) -> bool {
        if payload.len() != self.middle.len() {
            return false;
        }
        self.middle.copy_from_slice(payload);
        {
            let mut guard = self.shared.lock();
            std::mem::swap(&mut self.middle, &mut guard.back);
            guard.updated = true;
        }
        // A full channel already holds a pending wake-up.
        let _ = self.ready_tx.try_send(());
        true
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        let middle = std::mem::take(&mut self.middle);
        self.shared.lock().middle = Some(middle);
    }
}
