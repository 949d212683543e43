use crate::{XYZData, XYZId, XYZ_ID_LIST};

/*
* Stepping port bit layout (one 8 bit port drives all three drivers).
*   bit 0..2  step      X Y Z
*   bit 3..5  direction X Y Z
* Limit input port
*   bit 0 X1, bit 1 X2, bit 2 Y1, bit 3 Y2, bit 4 Z1, bit 5 Z2
*/
pub const X_STEP_BIT: u8 = 0;
pub const Y_STEP_BIT: u8 = 1;
pub const Z_STEP_BIT: u8 = 2;
pub const X_DIRECTION_BIT: u8 = 3;
pub const Y_DIRECTION_BIT: u8 = 4;
pub const Z_DIRECTION_BIT: u8 = 5;
pub const STEPPING_MASK: u8 = (1 << X_STEP_BIT) | (1 << Y_STEP_BIT) | (1 << Z_STEP_BIT);
pub const DIRECTION_MASK: u8 = (1 << X_DIRECTION_BIT) | (1 << Y_DIRECTION_BIT) | (1 << Z_DIRECTION_BIT);

pub const X1_LIMIT_BIT: u8 = 0;
pub const X2_LIMIT_BIT: u8 = 1;
pub const Y1_LIMIT_BIT: u8 = 2;
pub const Y2_LIMIT_BIT: u8 = 3;
pub const Z1_LIMIT_BIT: u8 = 4;
pub const Z2_LIMIT_BIT: u8 = 5;
pub const LIMIT_MASK: u8 = (1 << X1_LIMIT_BIT) | (1 << X2_LIMIT_BIT) | (1 << Y1_LIMIT_BIT)
    | (1 << Y2_LIMIT_BIT) | (1 << Z1_LIMIT_BIT) | (1 << Z2_LIMIT_BIT);

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingConfig {
    pub approach_us_per_pulse: u32,
    pub leave_us_per_pulse: u32,
    /// Extra pulses an axis keeps stepping after its switch changed state.
    pub overshoot_pulses: u8,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperConfig {
    pub cpu_hz: u32,
    pub acceleration_ticks_per_second: u32,
    pub minimum_steps_per_minute: u32,
    pub pulse_microseconds: u32,
    /// XOR'ed onto every pattern written to the stepping port.
    pub invert_mask: u8,
    pub steps_per_mm: XYZData<f32>,
    pub homing: HomingConfig,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ClockTooSlow,
    /// cycles per minute no longer fits in 32 bits.
    ClockTooFast,
    NoAccelerationTicks,
    AccelerationTicksAboveClock,
    NoMinimumRate,
    StepsPerMm(XYZId),
    InvertMask,
    HomingPulseTooShort,
}

impl StepperConfig {
    pub const DEFAULT: StepperConfig = StepperConfig {
        cpu_hz: 16_000_000,
        acceleration_ticks_per_second: 100,
        minimum_steps_per_minute: 1200,
        pulse_microseconds: 5,
        invert_mask: 0,
        steps_per_mm: XYZData::new(32.80839, 32.80839, 32.80839),
        homing: HomingConfig {
            approach_us_per_pulse: 1000,
            leave_us_per_pulse: 10000,
            overshoot_pulses: 6,
        },
    };

    pub const fn cycles_per_microsecond(&self) -> u32 {
        self.cpu_hz / 1_000_000
    }

    pub const fn cycles_per_minute(&self) -> u32 {
        self.cycles_per_microsecond() * 60_000_000
    }

    pub const fn cycles_per_acceleration_tick(&self) -> u32 {
        self.cpu_hz / self.acceleration_ticks_per_second
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycles_per_microsecond() == 0 {
            return Err(ConfigError::ClockTooSlow);
        }
        if self.cycles_per_microsecond().checked_mul(60_000_000).is_none() {
            return Err(ConfigError::ClockTooFast);
        }
        if self.acceleration_ticks_per_second == 0 {
            return Err(ConfigError::NoAccelerationTicks);
        }
        if self.acceleration_ticks_per_second > self.cpu_hz {
            return Err(ConfigError::AccelerationTicksAboveClock);
        }
        if self.minimum_steps_per_minute == 0 {
            return Err(ConfigError::NoMinimumRate);
        }
        if let Some(id) = XYZ_ID_LIST.iter().find(|id| !(*self.steps_per_mm.match_id(**id) > 0.0)) {
            return Err(ConfigError::StepsPerMm(*id));
        }
        if self.invert_mask & !(STEPPING_MASK | DIRECTION_MASK) != 0 {
            return Err(ConfigError::InvertMask);
        }
        let shortest_homing = self.homing.approach_us_per_pulse.min(self.homing.leave_us_per_pulse);
        if shortest_homing <= self.pulse_microseconds {
            return Err(ConfigError::HomingPulseTooShort);
        }
        Ok(())
    }
}

impl Default for StepperConfig {
    fn default() -> Self { Self::DEFAULT }
}
