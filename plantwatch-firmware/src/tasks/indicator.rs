//! Front-panel LED task
//!
//! Drives the alarm and status LEDs from the latest indication published
//! by the supervisor. Blinking LEDs toggle every tick.

use defmt::*;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Ticker};
use plantwatch_core::alarm::{Indication, LedPattern};

use crate::channels::INDICATION;

const BLINK_INTERVAL_MS: u64 = 250;

#[embassy_executor::task]
pub async fn indicator_task(mut alarm_led: Output<'static>, mut status_led: Output<'static>) {
    info!("Indicator task started");

    let mut ticker = Ticker::every(Duration::from_millis(BLINK_INTERVAL_MS));
    let mut indication = Indication {
        alarm: LedPattern::Off,
        status: LedPattern::Solid,
    };
    let mut phase = false;

    loop {
        if let Some(latest) = INDICATION.try_take() {
            indication = latest;
        }
        phase = !phase;

        drive(&mut alarm_led, indication.alarm, phase);
        drive(&mut status_led, indication.status, phase);

        ticker.next().await;
    }
}

fn drive(led: &mut Output<'static>, pattern: LedPattern, phase: bool) {
    let on = match pattern {
        LedPattern::Off => false,
        LedPattern::Solid => true,
        LedPattern::Blink => phase,
    };
    if on {
        led.set_high();
    } else {
        led.set_low();
    }
}
