use crate::{LineBlock, Position, XYZData, XYZ_ID_LIST};

/// Bresenham line tracer driving all three axes from one event counter.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Tracer {
    counters: XYZData<i32>,
    pub step_events_completed: u32,
}

impl Tracer {
    /// Centre the error terms for a new line.
    pub fn begin(&mut self, line: &LineBlock) {
        let start = -((line.step_event_count >> 1) as i32);
        self.counters = XYZData::from_clone(start);
        self.step_events_completed = 0;
    }

    /// One step event: returns the port pattern (direction plus the step bits
    /// of every axis that moves, `invert_mask` applied) and books the steps
    /// into `position`.
    pub fn trace(&mut self, line: &LineBlock, position: &Position, invert_mask: u8) -> u8 {
        let mut out_bits = line.direction_bits;
        for axis in XYZ_ID_LIST {
            let counter = self.counters.match_id_mut(axis);
            *counter += *line.steps.match_id(axis) as i32;
            if *counter > 0 {
                out_bits |= axis.step_bit();
                *counter -= line.step_event_count as i32;
                position.step(axis, line.is_negative(axis));
            }
        }
        self.step_events_completed += 1;
        out_bits ^ invert_mask
    }

    pub fn is_finished(&self, line: &LineBlock) -> bool {
        self.step_events_completed >= line.step_event_count
    }
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;
    use crate::{STEPPING_MASK, XYZId};
    use super::*;

    fn run(line: &LineBlock, position: &Position) -> XYZData<u32> {
        let mut tracer = Tracer::default();
        tracer.begin(line);
        let mut pulses = XYZData::<u32>::default();
        while !tracer.is_finished(line) {
            let bits = tracer.trace(line, position, 0);
            for axis in XYZ_ID_LIST {
                if bits & axis.step_bit() != 0 {
                    *pulses.match_id_mut(axis) += 1;
                }
            }
        }
        pulses
    }

    #[test]
    fn pulses_match_steps_exactly() {
        let cases = [
            (1, 0, 0),
            (7, 7, 7),
            (100, 33, 1),
            (99, 98, 97),
            (1000, 1, 999),
            (13, 0, 5),
            (64, 32, 16),
            (5, 3, 0),
        ];
        for (x, y, z) in cases {
            let line = LineBlock::from_delta(XYZData::new(x, y, z), 6000);
            let pulses = run(&line, &Position::new());
            assert_eq!(pulses, XYZData::new(x as u32, y as u32, z as u32), "pulses for ({}, {}, {})", x, y, z);
        }
    }

    #[test]
    fn dominant_axis_pulses_every_event() {
        let line = LineBlock::from_delta(XYZData::new(3, 12, 0), 6000);
        let mut tracer = Tracer::default();
        tracer.begin(&line);
        for _ in 0..12 {
            let bits = tracer.trace(&line, &Position::new(), 0);
            assert_ne!(bits & XYZId::Y.step_bit(), 0);
        }
        assert!(tracer.is_finished(&line));
    }

    #[test]
    fn slow_axis_spread_evenly() {
        // 2 steps over 8 events with centred error terms land at events 3 and 7.
        let line = LineBlock::from_delta(XYZData::new(8, 2, 0), 6000);
        let mut tracer = Tracer::default();
        tracer.begin(&line);
        let mut y_events = ArrayVec::<u32, 8>::new();
        for event in 1..=8 {
            if tracer.trace(&line, &Position::new(), 0) & XYZId::Y.step_bit() != 0 {
                y_events.push(event);
            }
        }
        assert_eq!(y_events.as_slice(), &[3, 7]);
    }

    #[test]
    fn deterministic_output() {
        let line = LineBlock::from_delta(XYZData::new(-17, 11, 5), 6000);
        let record = || {
            let mut tracer = Tracer::default();
            tracer.begin(&line);
            let mut bits = ArrayVec::<u8, 17>::new();
            while !tracer.is_finished(&line) {
                bits.push(tracer.trace(&line, &Position::new(), 0));
            }
            (bits, tracer)
        };
        assert_eq!(record(), record());
    }

    #[test]
    fn invert_mask_applied_to_pattern() {
        let line = LineBlock::from_delta(XYZData::new(1, 0, 0), 6000);
        let mut tracer = Tracer::default();
        tracer.begin(&line);
        let bits = tracer.trace(&line, &Position::new(), STEPPING_MASK);
        assert_eq!(bits & STEPPING_MASK, STEPPING_MASK ^ XYZId::X.step_bit());
    }

    #[test]
    fn position_follows_direction() {
        let position = Position::new();
        run(&LineBlock::from_delta(XYZData::new(-40, 25, 3), 6000), &position);
        assert_eq!(position.load(), XYZData::new(-40, 25, 3));
    }

    #[test]
    fn split_moves_end_at_same_position() {
        let whole = Position::new();
        run(&LineBlock::from_delta(XYZData::new(120, -45, 9), 6000), &whole);
        let split = Position::new();
        run(&LineBlock::from_delta(XYZData::new(70, -20, 4), 6000), &split);
        run(&LineBlock::from_delta(XYZData::new(50, -25, 5), 6000), &split);
        assert_eq!(whole.load(), split.load());
    }
}
