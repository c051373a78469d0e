//! Simulated plant signals
//!
//! Stand-in input for boards without analog front ends. Each signal is a
//! triangle wave that reverses once it steps past its band; link and health
//! faults are drawn from a seeded xorshift generator so runs are repeatable.

/// Default generator seed
pub const DEFAULT_SEED: u32 = 0x2545_F491;

/// Triangle wave between two bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oscillator {
    value: i32,
    step: i32,
    min: i32,
    max: i32,
}

impl Oscillator {
    pub const fn new(start: i32, step: i32, min: i32, max: i32) -> Self {
        Self {
            value: start,
            step,
            min,
            max,
        }
    }

    /// Advance one step and return the new value
    ///
    /// The value may overshoot a bound by one step before turning around.
    pub fn advance(&mut self) -> i32 {
        self.value += self.step;
        if self.value > self.max || self.value < self.min {
            self.step = -self.step;
        }
        self.value
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

/// 32-bit xorshift generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub const fn new(seed: u32) -> Self {
        // Zero is a fixed point of xorshift
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// True with roughly `percent` % probability
    pub fn chance(&mut self, percent: u32) -> bool {
        self.next_u32() % 100 < percent
    }
}

/// Simulated rectifier bus
#[derive(Debug, Clone)]
pub struct SimulatedPlant {
    pub voltage_mv: Oscillator,
    pub current_ma: Oscillator,
    pub temperature_c: Oscillator,
    pub power_mw: Oscillator,
    pub rng: XorShift32,
}

impl Default for SimulatedPlant {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl SimulatedPlant {
    pub const fn new(seed: u32) -> Self {
        Self {
            voltage_mv: Oscillator::new(53_000, 1, 45_000, 55_000),
            current_ma: Oscillator::new(25_000, 2, 20_000, 30_000),
            temperature_c: Oscillator::new(45, 1, 35, 55),
            power_mw: Oscillator::new(1_200_000, 50_000, 900_000, 1_500_000),
            rng: XorShift32::new(seed),
        }
    }
}
