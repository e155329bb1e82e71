use crate::protocol::WireFormat;
use crate::{Result, UvcamError};

/// Status reported by the UVC transport when a request fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Attach the name of the failing transport call to its status.
pub fn check_uvc<T>(call: &'static str, result: TransportResult<T>) -> Result<T> {
    result.map_err(|status| UvcamError::Transport { call, status })
}

/// Stream parameters agreed with a subdevice during probe/commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamControl {
    pub format: WireFormat,
    pub width: u32,
    pub height: u32,
    /// dwFrameInterval, 100 ns units.
    pub frame_interval: u32,
    /// dwMaxVideoFrameSize.
    pub max_frame_size: u32,
}

/// One completed frame, borrowed from the transport for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct UvcFrame<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: WireFormat,
    pub sequence: u32,
}

/// Frame-ready callback, invoked on the transport's delivery thread.
pub type FrameCallback = Box<dyn FnMut(&UvcFrame<'_>) + Send + 'static>;

/// An open handle on one UVC subdevice. Dropping it closes the handle.
pub trait SubdeviceHandle: Send {
    /// Probe the subdevice for a format, size and rate.
    fn negotiate(
        &mut self,
        format: WireFormat,
        width: u32,
        height: u32,
        fps: u32,
    ) -> TransportResult<StreamControl>;

    /// Commit `control` and begin delivering frames to `callback`.
    ///
    /// On failure the callback is dropped without being invoked.
    fn start_streaming(&mut self, control: &StreamControl, callback: FrameCallback)
        -> TransportResult<()>;

    /// Halt delivery. When this returns, the callback has finished its last
    /// invocation and has been dropped. Calling it while stopped is a no-op.
    fn stop_streaming(&mut self);

    /// SET_CUR on an extension unit control.
    fn set_control(&mut self, unit: u8, selector: u8, data: &[u8]) -> TransportResult<()>;

    /// GET_CUR on an extension unit control. Returns the bytes written to `data`.
    fn get_control(&mut self, unit: u8, selector: u8, data: &mut [u8]) -> TransportResult<usize>;
}

/// A physical UVC device whose subdevices can be opened independently.
pub trait UvcDevice: Send {
    /// Product string from the device descriptor.
    fn product_name(&self) -> String;

    /// Open subdevice `subdevice`. The same subdevice may be opened more than
    /// once, for control access alongside streaming.
    fn open_subdevice(&self, subdevice: u8) -> TransportResult<Box<dyn SubdeviceHandle>>;
}

/// In-memory transport for tests.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex, MutexGuard};

    #[derive(Default)]
    pub(crate) struct MockState {
        pub streams: HashMap<u8, (StreamControl, FrameCallback)>,
        pub negotiated: Vec<(u8, StreamControl)>,
        pub opened: Vec<u8>,
        pub closed: Vec<u8>,
        /// (subdevice, unit, selector, data) for every SET_CUR.
        pub controls: Vec<(u8, u8, u8, Vec<u8>)>,
        /// GET_CUR replies keyed by (unit, selector).
        pub control_values: HashMap<(u8, u8), Vec<u8>>,
        pub reject_open: HashSet<u8>,
        pub reject_negotiation: HashSet<u8>,
        pub reject_start: HashSet<u8>,
        pub sequence: u32,
    }

    #[derive(Clone, Default)]
    pub(crate) struct MockDevice {
        pub state: Arc<Mutex<MockState>>,
    }

    impl MockDevice {
        pub fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap()
        }

        /// Run the subdevice's frame callback on the calling thread. Returns
        /// `false` if the subdevice is not streaming.
        pub fn deliver(&self, subdevice: u8, data: &[u8]) -> bool {
            let mut state = self.state();
            state.sequence += 1;
            let sequence = state.sequence;
            match state.streams.get_mut(&subdevice) {
                Some((control, callback)) => {
                    let frame = UvcFrame {
                        data,
                        width: control.width,
                        height: control.height,
                        format: control.format,
                        sequence,
                    };
                    (*callback)(&frame);
                    true
                }
                None => false,
            }
        }

        pub fn is_streaming(&self, subdevice: u8) -> bool {
            self.state().streams.contains_key(&subdevice)
        }
    }

    impl UvcDevice for MockDevice {
        fn product_name(&self) -> String {
            "Mock Depth Camera".into()
        }

        fn open_subdevice(&self, subdevice: u8) -> TransportResult<Box<dyn SubdeviceHandle>> {
            let mut state = self.state();
            if state.reject_open.contains(&subdevice) {
                return Err(TransportError::new("No such device"));
            }
            state.opened.push(subdevice);
            Ok(Box::new(MockHandle {
                subdevice,
                state: Arc::clone(&self.state),
                streaming: false,
            }))
        }
    }

    struct MockHandle {
        subdevice: u8,
        state: Arc<Mutex<MockState>>,
        streaming: bool,
    }

    impl SubdeviceHandle for MockHandle {
        fn negotiate(
            &mut self,
            format: WireFormat,
            width: u32,
            height: u32,
            fps: u32,
        ) -> TransportResult<StreamControl> {
            let mut state = self.state.lock().unwrap();
            if state.reject_negotiation.contains(&self.subdevice) {
                return Err(TransportError::new("Invalid mode"));
            }
            let control = StreamControl {
                format,
                width,
                height,
                frame_interval: crate::protocol::frame_interval(fps),
                max_frame_size: crate::protocol::frame_size(width, height, format.bytes_per_pixel())
                    as u32,
            };
            state.negotiated.push((self.subdevice, control.clone()));
            Ok(control)
        }

        fn start_streaming(
            &mut self,
            control: &StreamControl,
            callback: FrameCallback,
        ) -> TransportResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.reject_start.contains(&self.subdevice) {
                return Err(TransportError::new("Busy"));
            }
            state
                .streams
                .insert(self.subdevice, (control.clone(), callback));
            self.streaming = true;
            Ok(())
        }

        fn stop_streaming(&mut self) {
            if self.streaming {
                self.state.lock().unwrap().streams.remove(&self.subdevice);
                self.streaming = false;
            }
        }

        fn set_control(&mut self, unit: u8, selector: u8, data: &[u8]) -> TransportResult<()> {
            self.state
                .lock()
                .unwrap()
                .controls
                .push((self.subdevice, unit, selector, data.to_vec()));
            Ok(())
        }

        fn get_control(&mut self, unit: u8, selector: u8, data: &mut [u8]) -> TransportResult<usize> {
            let state = self.state.lock().unwrap();
            let value = state
                .control_values
                .get(&(unit, selector))
                .ok_or_else(|| TransportError::new("Invalid control"))?;
            let len = value.len().min(data.len());
            data[..len].copy_from_slice(&value[..len]);
            Ok(len)
        }
    }

    impl Drop for MockHandle {
        fn drop(&mut self) {
            self.stop_streaming();
            self.state.lock().unwrap().closed.push(self.subdevice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_uvc_names_the_call() {
        let err = check_uvc::<()>("uvc_start_streaming", Err(TransportError::new("Busy")))
            .unwrap_err();
        assert_eq!(err.to_string(), "uvc_start_streaming(...) returned Busy");
        assert_eq!(check_uvc("uvc_open2", Ok(5)).unwrap(), 5);
    }
}
