//! Test doubles for the hardware traits

use std::vec::Vec;

use plantwatch_protocol::{Frame, Payload};

use crate::traits::{ConfigStore, ControlError, FrameSink, ModuleControl, SinkError, StoreError};

/// Sink that keeps every frame it is given
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<Frame>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            frames: Vec::new(),
            fail: true,
        }
    }

    /// Decoded payloads, in send order
    pub fn payloads(&self) -> Vec<Payload> {
        self.frames
            .iter()
            .map(|f| Payload::from_frame(f).expect("sink holds valid payloads"))
            .collect()
    }
}

impl FrameSink for RecordingSink {
    fn send(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Full);
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// What a [`RecordingControl`] was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCall {
    SetEnabled(u8, bool),
    ReducePower(u8, u8),
    Shutdown(u8),
    ShutdownAll,
}

/// Module control with `modules` rectifiers that records every call
#[derive(Debug)]
pub struct RecordingControl {
    pub modules: u8,
    pub calls: Vec<ControlCall>,
}

impl Default for RecordingControl {
    fn default() -> Self {
        Self {
            modules: 4,
            calls: Vec::new(),
        }
    }
}

impl RecordingControl {
    fn check(&self, module: u8) -> Result<(), ControlError> {
        if module < self.modules {
            Ok(())
        } else {
            Err(ControlError::UnknownModule)
        }
    }
}

impl ModuleControl for RecordingControl {
    fn set_enabled(&mut self, module: u8, enabled: bool) -> Result<(), ControlError> {
        self.check(module)?;
        self.calls.push(ControlCall::SetEnabled(module, enabled));
        Ok(())
    }

    fn reduce_power(&mut self, module: u8, percent: u8) -> Result<(), ControlError> {
        self.check(module)?;
        if percent > 100 {
            return Err(ControlError::InvalidLevel);
        }
        self.calls.push(ControlCall::ReducePower(module, percent));
        Ok(())
    }

    fn shutdown_module(&mut self, module: u8) -> Result<(), ControlError> {
        self.check(module)?;
        self.calls.push(ControlCall::Shutdown(module));
        Ok(())
    }

    fn shutdown_all(&mut self) {
        self.calls.push(ControlCall::ShutdownAll);
    }
}

/// In-memory single-slot store
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub image: Option<Vec<u8>>,
}

impl ConfigStore for MemoryStore {
    fn load(&mut self, buffer: &mut [u8]) -> Result<usize, StoreError> {
        let image = self.image.as_ref().ok_or(StoreError::Empty)?;
        let target = buffer
            .get_mut(..image.len())
            .ok_or(StoreError::BufferTooSmall)?;
        target.copy_from_slice(image);
        Ok(image.len())
    }

    fn save(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.image = Some(data.to_vec());
        Ok(())
    }
}
