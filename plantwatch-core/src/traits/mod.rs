//! Hardware abstraction traits
//!
//! These traits define the interface between the plant logic and
//! board-specific implementations.

pub mod control;
pub mod storage;
pub mod transport;

pub use control::{ControlError, ModuleControl};
pub use storage::{ConfigStore, StoreError};
pub use transport::{FrameSink, SinkError};
