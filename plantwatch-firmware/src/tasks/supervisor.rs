//! Supervisor task
//!
//! Owns the plant logic. Wakes on received bytes or on the system tick,
//! answers host commands, runs the producer sweeps and the safety monitor
//! on the latest readings, and reports status and telemetry on their
//! configured intervals.

use defmt::*;
use embassy_futures::select::select;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Instant, Ticker};
use plantwatch_core::safety::InputSource;
use plantwatch_core::sweep::PlantReadings;
use plantwatch_core::Supervisor;
use plantwatch_protocol::{FrameParser, RxConsumer};

use crate::channels::{INDICATION, RX_READY};
use crate::config::{TIMING_STATUS_INTERVAL_MS, TIMING_SWEEP_INTERVAL_MS};
use crate::control::RectifierBank;
use crate::readings::SimulatedReadings;
use crate::transport::ChannelSink;
use crate::{RECTIFIER_COUNT, RX_QUEUE_SIZE};

/// Main loop period
const TICK_INTERVAL_MS: u64 = 100;

/// Supervisor wired to this board
pub type Plant = Supervisor<ChannelSink, RectifierBank<Output<'static>, RECTIFIER_COUNT>>;

#[embassy_executor::task]
pub async fn supervisor_task(
    mut plant: Plant,
    mut rx: RxConsumer<'static, RX_QUEUE_SIZE>,
    mut readings: SimulatedReadings,
) {
    info!("Supervisor task started");

    let mut parser = FrameParser::new();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut next_sweep_ms = 0;
    let mut next_status_ms = 0;
    let mut latest = PlantReadings::default();

    loop {
        select(RX_READY.wait(), ticker.next()).await;
        let now_ms = Instant::now().as_millis();

        loop {
            match rx.poll_frame(&mut parser) {
                Ok(Some(frame)) => {
                    if let Some(response) = plant.on_frame(now_ms, &frame) {
                        debug!("answered command {=u8}: {}", response.command_id, response.status);
                    }
                }
                Ok(None) => break,
                Err(e) => debug!("discarded frame: {:?}", e),
            }
        }

        if now_ms >= next_sweep_ms {
            next_sweep_ms = now_ms + TIMING_SWEEP_INTERVAL_MS;
            let bank = plant.modules();
            latest =
                readings.sample((0..RECTIFIER_COUNT as u8).map(|module| bank.is_enabled(module)));
            plant.sweep(now_ms, &latest);
            if let Err(e) = plant.send_readings(&latest) {
                debug!("telemetry dropped: {:?}", e);
            }
        }

        if let Some(result) = plant.poll(now_ms, InputSource::Live(&latest.modules)) {
            trace!("safety pass: {=u8} failed", result.failed_count());
        }

        if now_ms >= next_status_ms {
            next_status_ms = now_ms + TIMING_STATUS_INTERVAL_MS;
            if let Err(e) = plant.send_status(now_ms) {
                warn!("status not sent: {:?}", e);
            }
        }

        INDICATION.signal(plant.indication());
    }
}
