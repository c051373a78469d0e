//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod indicator;
pub mod serial_rx;
pub mod serial_tx;
pub mod supervisor;

pub use indicator::indicator_task;
pub use serial_rx::serial_rx_task;
pub use serial_tx::serial_tx_task;
pub use supervisor::{supervisor_task, Plant};
