//! Host UART receive task
//!
//! Moves raw bytes from the UART into the receive queue. Framing happens
//! on the supervisor side.

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartRx;
use embassy_time::{Duration, Timer};
use plantwatch_protocol::RxProducer;

use crate::channels::RX_READY;
use crate::RX_QUEUE_SIZE;

/// Buffer size for one UART read
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn serial_rx_task(
    mut rx: UartRx<'static, Async>,
    mut queue: RxProducer<'static, RX_QUEUE_SIZE>,
) {
    info!("Serial RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];
    let mut reported_overflow = 0;

    loop {
        match rx.read_until_idle(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                queue.push_slice(&buf[..n]);
                RX_READY.signal(());

                if queue.overflow_count() != reported_overflow {
                    reported_overflow = queue.overflow_count();
                    warn!("RX queue overflow, {} bytes dropped so far", reported_overflow);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
                Timer::after(Duration::from_millis(10)).await;
            }
        }
    }
}
