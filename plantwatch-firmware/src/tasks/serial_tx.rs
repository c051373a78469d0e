//! Host UART transmit task
//!
//! Encodes queued frames onto the wire in the order they were sent.

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartTx;
use plantwatch_protocol::MAX_FRAME_SIZE;

use crate::channels::TX_FRAMES;

#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: UartTx<'static, Async>) {
    info!("Serial TX task started");

    let mut buf = [0u8; MAX_FRAME_SIZE];

    loop {
        let frame = TX_FRAMES.receive().await;
        match frame.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write(&buf[..len]).await {
                    warn!("Failed to send frame: {:?}", e);
                } else {
                    trace!("TX: type {=u8}, {} bytes", frame.msg_type, len);
                }
            }
            Err(e) => warn!("Frame encode failed: {:?}", e),
        }
    }
}
