//! Host side board used by the tests: records every pin and timer write and
//! models the physical carriage so limit switches trip at a fixed travel.

use embedded_hal::blocking::delay::DelayUs;

use crate::{
    Actuators, PositionSync, Prescaler, PulseTimer, SenseInputs, Sensors, StepTimer, StepperPort,
    XYZData, XYZ_ID_LIST, DIRECTION_MASK, STEPPING_MASK,
};

#[derive(Clone, Debug, Default)]
pub struct SimBoard {
    pub invert_mask: u8,
    pub direction_pins: u8,
    pub step_pins: u8,
    /// Pulses seen per axis.
    pub pulses: XYZData<u32>,
    /// Where the carriage physically is, in steps.
    pub travel: XYZData<i32>,
    pub prescaler: Option<Prescaler>,
    pub ceiling: u16,
    pub configures: u32,
    pub interrupt_enabled: bool,
    pub pulse_armed: bool,
    pub arms: u32,
    pub nesting_allowed: u32,
    pub laser_intensity: u8,
    pub air: bool,
    pub gas: bool,
    pub inputs: SenseInputs,
    /// Switch position per axis, engaged while `travel <= limit`.
    pub limit_at: XYZData<Option<i32>>,
}

impl SimBoard {
    pub fn with_invert(invert_mask: u8) -> Self {
        Self { invert_mask, ..Default::default() }
    }

    pub fn total_pulses(&self) -> u32 {
        self.pulses.x + self.pulses.y + self.pulses.z
    }
}

impl StepperPort for SimBoard {
    fn write_direction(&mut self, bits: u8) {
        self.direction_pins = bits & DIRECTION_MASK;
    }

    fn write_steps(&mut self, bits: u8) {
        let bits = bits & STEPPING_MASK;
        let active = bits ^ (self.invert_mask & STEPPING_MASK);
        let reversed = self.direction_pins ^ (self.invert_mask & DIRECTION_MASK);
        for axis in XYZ_ID_LIST {
            if active & axis.step_bit() != 0 {
                *self.pulses.match_id_mut(axis) += 1;
                let delta = if reversed & axis.direction_bit() != 0 { -1 } else { 1 };
                *self.travel.match_id_mut(axis) += delta;
            }
        }
        self.step_pins = bits;
    }
}

impl StepTimer for SimBoard {
    fn configure(&mut self, prescaler: Prescaler, ceiling: u16) {
        self.prescaler = Some(prescaler);
        self.ceiling = ceiling;
        self.configures += 1;
    }

    fn enable_interrupt(&mut self) {
        self.interrupt_enabled = true;
    }

    fn disable_interrupt(&mut self) {
        self.interrupt_enabled = false;
    }

    fn allow_nesting(&mut self) {
        self.nesting_allowed += 1;
    }
}

impl PulseTimer for SimBoard {
    fn arm(&mut self, _microseconds: u32) {
        self.pulse_armed = true;
        self.arms += 1;
    }

    fn disarm(&mut self) {
        self.pulse_armed = false;
    }
}

impl Sensors for SimBoard {
    fn sense(&mut self) -> SenseInputs {
        self.inputs
    }

    fn limit_switches(&mut self) -> u8 {
        XYZ_ID_LIST.iter().fold(0, |bits, axis| {
            match self.limit_at.match_id(*axis) {
                Some(at) if *self.travel.match_id(*axis) <= *at => bits | axis.limit_bit(),
                _ => bits,
            }
        })
    }
}

impl Actuators for SimBoard {
    fn set_laser_intensity(&mut self, intensity: u8) {
        self.laser_intensity = intensity;
    }

    fn set_air(&mut self, on: bool) {
        self.air = on;
    }

    fn set_gas(&mut self, on: bool) {
        self.gas = on;
    }
}

/// Adds up requested delays instead of sleeping.
#[derive(Clone, Debug, Default)]
pub struct SimDelay {
    pub total_us: u64,
    pub calls: u32,
}

impl DelayUs<u32> for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
        self.calls += 1;
    }
}

#[derive(Clone, Debug, Default)]
pub struct SyncCounter {
    pub requests: u32,
}

impl PositionSync for SyncCounter {
    fn request_position_update(&mut self) {
        self.requests += 1;
    }
}
