//! Plantwatch - DC Power Plant Controller Firmware
//!
//! Main firmware binary for STM32F407 plant controllers. Supervises the
//! rectifier bank, raises alarms and talks to the supervisory host over
//! USART1 using the framed protocol from `plantwatch-protocol`.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::peripherals::USART1;
use embassy_stm32::usart::{self, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use plantwatch_core::persist::PersistError;
use plantwatch_core::safety::{SafetyLimits, SafetyMonitor};
use plantwatch_core::traits::{ModuleControl, StoreError};
use plantwatch_core::Supervisor;
use plantwatch_protocol::RxQueue;

use crate::control::RectifierBank;
use crate::readings::SimulatedReadings;
use crate::storage::FlashConfigStore;
use crate::transport::ChannelSink;

mod channels;
mod control;
mod readings;
mod storage;
mod tasks;
mod transport;

/// Plant settings from plant.toml, generated by build.rs
mod config {
    include!(concat!(env!("OUT_DIR"), "/plant_config.rs"));
}

/// Rectifier enable lines on this board
pub const RECTIFIER_COUNT: usize = 4;

/// Receive ring between the UART task and the supervisor
pub const RX_QUEUE_SIZE: usize = 256;

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<USART1>;
});

static RX_QUEUE: StaticCell<RxQueue<RX_QUEUE_SIZE>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Plantwatch firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    // Host link: USART1 (PA9 = TX, PA10 = RX)
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = config::LINK_BAUD;

    let uart = unwrap!(Uart::new(
        p.USART1,
        p.PA10, // RX
        p.PA9,  // TX
        Irqs,
        p.DMA2_CH7,
        p.DMA2_CH5,
        uart_config,
    ));
    let (tx, rx) = uart.split();
    info!("UART initialized at {} baud", config::LINK_BAUD);

    let (rx_producer, rx_consumer) = RX_QUEUE.init(RxQueue::new()).split();

    // Rectifier enables on PA0-PA3, active high
    let bank = RectifierBank::new([
        Output::new(p.PA0, Level::Low, Speed::Low),
        Output::new(p.PA1, Level::Low, Speed::Low),
        Output::new(p.PA2, Level::Low, Speed::Low),
        Output::new(p.PA3, Level::Low, Speed::Low),
    ]);

    // Front panel: alarm LED on PC13, status LED on PC14
    let alarm_led = Output::new(p.PC13, Level::Low, Speed::Low);
    let status_led = Output::new(p.PC14, Level::High, Speed::Low);

    let monitor = SafetyMonitor::new(default_limits());
    let mut plant = Supervisor::new(ChannelSink, bank, monitor);

    let mut store = FlashConfigStore::new(Flash::new_blocking(p.FLASH));
    match plant.load_settings(&mut store) {
        Ok(()) => info!("Loaded settings from flash"),
        Err(PersistError::Store(StoreError::Empty)) => {
            info!("No settings in flash, writing plant.toml defaults");
            if let Err(e) = plant.save_settings(&mut store) {
                warn!("Failed to save settings: {:?}", e);
            }
        }
        Err(e) => warn!("Stored settings rejected ({:?}), using plant.toml defaults", e),
    }

    for module in 0..RECTIFIER_COUNT as u8 {
        if let Err(e) = plant.modules_mut().set_enabled(module, true) {
            warn!("rectifier {}: {:?}", module, e);
        }
    }

    let readings = SimulatedReadings::new(config::SIMULATION_SEED);

    unwrap!(spawner.spawn(tasks::serial_rx_task(rx, rx_producer)));
    unwrap!(spawner.spawn(tasks::serial_tx_task(tx)));
    unwrap!(spawner.spawn(tasks::indicator_task(alarm_led, status_led)));
    unwrap!(spawner.spawn(tasks::supervisor_task(plant, rx_consumer, readings)));

    info!("All tasks spawned, firmware running");
}

/// Power-on safety limits from plant.toml
fn default_limits() -> SafetyLimits {
    let mut limits = SafetyLimits::default();
    if let Err(e) =
        limits.set_voltage_limits(config::LIMITS_VOLTAGE_MIN_MV, config::LIMITS_VOLTAGE_MAX_MV)
    {
        // build.rs rejects inverted ranges, keep the built-in window anyway
        error!("Invalid voltage window: {:?}", e);
    }
    limits.set_current_limit(config::LIMITS_CURRENT_MAX_MA);
    limits.set_temperature_limit(config::LIMITS_TEMPERATURE_MAX_C);
    limits.set_power_limit(config::LIMITS_POWER_MAX_MW);
    limits
}
