use crate::{Prescaler, StopReason};

/// The shared stepping/direction output port.
pub trait StepperPort {
    /// Drive the direction pins to `bits & DIRECTION_MASK`.
    fn write_direction(&mut self, bits: u8);
    /// Drive the step pins to `bits & STEPPING_MASK`.
    fn write_steps(&mut self, bits: u8);
}

/// The variable rate timer whose compare interrupt runs the dispatcher.
pub trait StepTimer {
    fn configure(&mut self, prescaler: Prescaler, ceiling: u16);
    fn enable_interrupt(&mut self);
    fn disable_interrupt(&mut self);
    /// Called from inside the dispatcher once the pulse is out, so other
    /// interrupts may preempt the rest of the handler.
    fn allow_nesting(&mut self) {}
}

/// One-shot timer ending each step pulse.
pub trait PulseTimer {
    fn arm(&mut self, microseconds: u32);
    fn disarm(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SenseInputs {
    pub limit_hit: bool,
    pub chiller_off: bool,
    pub power_off: bool,
    pub door_open: bool,
}

impl SenseInputs {
    pub fn any(&self) -> bool {
        self.limit_hit || self.chiller_off || self.power_off || self.door_open
    }

    /// The stop a sensor demands, most severe first. An open door only pauses.
    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.limit_hit {
            Some(StopReason::LimitHit)
        } else if self.chiller_off {
            Some(StopReason::ChillerOff)
        } else if self.power_off {
            Some(StopReason::PowerOff)
        } else {
            None
        }
    }
}

pub trait Sensors {
    fn sense(&mut self) -> SenseInputs;
    /// Raw limit switch levels, a set bit is an engaged switch (see `*_LIMIT_BIT`).
    fn limit_switches(&mut self) -> u8;
}

pub trait Actuators {
    fn set_laser_intensity(&mut self, intensity: u8);
    fn set_air(&mut self, on: bool);
    fn set_gas(&mut self, on: bool);
}

pub trait Board: StepperPort + StepTimer + PulseTimer + Sensors + Actuators {}

impl<T> Board for T where T: StepperPort + StepTimer + PulseTimer + Sensors + Actuators {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_only_pauses() {
        let inputs = SenseInputs { door_open: true, ..Default::default() };
        assert!(inputs.any());
        assert_eq!(inputs.stop_reason(), None);
    }

    #[test]
    fn limit_outranks_other_stops() {
        let inputs = SenseInputs { limit_hit: true, chiller_off: true, power_off: true, door_open: false };
        assert_eq!(inputs.stop_reason(), Some(StopReason::LimitHit));
        let inputs = SenseInputs { chiller_off: true, power_off: true, ..Default::default() };
        assert_eq!(inputs.stop_reason(), Some(StopReason::ChillerOff));
        let inputs = SenseInputs { power_off: true, ..Default::default() };
        assert_eq!(inputs.stop_reason(), Some(StopReason::PowerOff));
        assert!(!SenseInputs::default().any());
    }
}
