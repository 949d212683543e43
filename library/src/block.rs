use crate::{XYZData, XYZId, XYZ_ID_LIST};

/// Motion data of a line block, as computed by the planner.
///
/// Rates are in steps per minute; `accelerate_until` and `decelerate_after`
/// are step event indices with
/// `accelerate_until <= decelerate_after <= step_event_count`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineBlock {
    pub steps: XYZData<u32>,
    /// Set direction bit = the axis moves towards negative positions.
    pub direction_bits: u8,
    pub step_event_count: u32,
    pub initial_rate: u32,
    pub nominal_rate: u32,
    pub final_rate: u32,
    pub rate_delta: u32,
    pub accelerate_until: u32,
    pub decelerate_after: u32,
    pub nominal_laser_intensity: u8,
}

impl LineBlock {
    /// A line travelling `delta` steps at a constant `rate`, without ramps.
    pub fn from_delta(delta: XYZData<i32>, rate: u32) -> Self {
        let steps = delta.map(|d| d.unsigned_abs());
        let direction_bits = XYZ_ID_LIST.iter()
            .filter(|id| *delta.match_id(**id) < 0)
            .fold(0, |bits, id| bits | id.direction_bit());
        let step_event_count = steps.iter().copied().max().unwrap_or(0);
        Self {
            steps,
            direction_bits,
            step_event_count,
            initial_rate: rate,
            nominal_rate: rate,
            final_rate: rate,
            rate_delta: 0,
            accelerate_until: 0,
            decelerate_after: step_event_count,
            nominal_laser_intensity: 0,
        }
    }

    pub fn is_negative(&self, axis: XYZId) -> bool {
        self.direction_bits & axis.direction_bit() != 0
    }
}

/// One entry of the planner's queue.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Block {
    Line(LineBlock),
    AirGasDisable,
    AirEnable,
    GasEnable,
}

/// The planner's block queue, seen from the stepper interrupt.
pub trait Planner {
    /// The block at the head of the queue, left in place until discarded.
    fn current_block(&mut self) -> Option<Block>;
    fn discard_current_block(&mut self);
    fn reset_block_buffer(&mut self);
    /// Planner positions went stale (stop processed), re-read them from the stepper.
    fn request_position_update(&mut self);
}

/// The command front end's idea of the current position.
pub trait PositionSync {
    fn request_position_update(&mut self);
}

impl PositionSync for () {
    fn request_position_update(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_delta_directions_and_counts() {
        let line = LineBlock::from_delta(XYZData::new(-30, 12, 0), 6000);
        assert_eq!(line.steps, XYZData::new(30, 12, 0));
        assert_eq!(line.step_event_count, 30);
        assert!(line.is_negative(XYZId::X));
        assert!(!line.is_negative(XYZId::Y));
        assert!(!line.is_negative(XYZId::Z));
        assert_eq!(line.decelerate_after, line.step_event_count, "constant rate never decelerates");
        assert_eq!(line.initial_rate, line.final_rate);
    }

    #[test]
    fn from_delta_zero_move() {
        let line = LineBlock::from_delta(XYZData::default(), 6000);
        assert_eq!(line.step_event_count, 0);
        assert_eq!(line.direction_bits, 0);
    }
}
