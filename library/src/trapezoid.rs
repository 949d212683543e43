//! Trapezoidal speed profile of a line block.
//!
//! ```text
//!          __________________________
//!         /|                        |\     _________________
//!        / |                        | \   /|               |\
//!       /  |                        |  \ / |               | \
//!      +---+------------------------+---+--+---------------+--+
//!      |            BLOCK 1             |      BLOCK 2        |
//! ```
//!
//! A block starts at `initial_rate`, gains `rate_delta` per acceleration tick
//! until `accelerate_until`, cruises at `nominal_rate`, and from
//! `decelerate_after` on loses `rate_delta` per tick down to `final_rate`.
//! Ticks are derived from the elapsed step timer cycles, so the pulse
//! interrupt doubles as the acceleration clock.

use crate::{config_step_timer, LineBlock, StepTimer, StepperConfig};

#[derive(Clone, Debug, PartialEq)]
pub struct Trapezoid {
    cycles_per_minute: u32,
    cycles_per_acceleration_tick: u32,
    minimum_steps_per_minute: u32,
    adjusted_rate: u32,
    cycles_per_step_event: u32,
    acceleration_tick_counter: u32,
}

impl Trapezoid {
    pub fn new(config: &StepperConfig) -> Self {
        Self {
            cycles_per_minute: config.cycles_per_minute(),
            cycles_per_acceleration_tick: config.cycles_per_acceleration_tick(),
            minimum_steps_per_minute: config.minimum_steps_per_minute,
            adjusted_rate: config.minimum_steps_per_minute,
            cycles_per_step_event: 0,
            acceleration_tick_counter: 0,
        }
    }

    pub fn adjusted_rate(&self) -> u32 { self.adjusted_rate }
    pub fn cycles_per_step_event(&self) -> u32 { self.cycles_per_step_event }

    /// Reset for a new line and program its initial rate.
    pub fn begin<T: StepTimer + ?Sized>(&mut self, line: &LineBlock, timer: &mut T) {
        self.adjusted_rate = line.initial_rate;
        // start halfway, midpoint rule
        self.acceleration_tick_counter = self.cycles_per_acceleration_tick / 2;
        self.adjust_speed(timer, self.adjusted_rate);
    }

    /// Retime the step timer for `steps_per_minute`, floored at the minimum rate.
    pub fn adjust_speed<T: StepTimer + ?Sized>(&mut self, timer: &mut T, steps_per_minute: u32) {
        let steps_per_minute = steps_per_minute.max(self.minimum_steps_per_minute);
        self.cycles_per_step_event = config_step_timer(timer, self.cycles_per_minute / steps_per_minute);
    }

    /// Book one step event worth of cycles; true when an acceleration tick is due.
    /// Fires at most once per event; the carry is capped at one full budget.
    fn acceleration_tick(&mut self) -> bool {
        self.acceleration_tick_counter = self.acceleration_tick_counter
            .saturating_add(self.cycles_per_step_event)
            .min(2 * self.cycles_per_acceleration_tick);
        if self.acceleration_tick_counter > self.cycles_per_acceleration_tick {
            self.acceleration_tick_counter -= self.cycles_per_acceleration_tick;
            true
        } else {
            false
        }
    }

    /// Speed adjustment after step event `completed` of an unfinished line.
    /// Returns true when the rate changed and the step timer was reprogrammed.
    pub fn advance<T: StepTimer + ?Sized>(&mut self, line: &LineBlock, completed: u32, timer: &mut T) -> bool {
        if completed < line.accelerate_until {
            if !self.acceleration_tick() {
                return false;
            }
            self.adjusted_rate = self.adjusted_rate.saturating_add(line.rate_delta).min(line.nominal_rate);
        } else if completed == line.decelerate_after {
            // restart the tick phase so deceleration does not depend on the cruise length
            self.acceleration_tick_counter = self.cycles_per_acceleration_tick / 2;
            return false;
        } else if completed > line.decelerate_after {
            if !self.acceleration_tick() {
                return false;
            }
            self.adjusted_rate = self.adjusted_rate.saturating_sub(line.rate_delta).max(line.final_rate);
        } else if self.adjusted_rate != line.nominal_rate {
            self.adjusted_rate = line.nominal_rate;
        } else {
            return false;
        }
        self.adjust_speed(timer, self.adjusted_rate);
        true
    }
}
