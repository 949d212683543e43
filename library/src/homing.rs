use embedded_hal::blocking::delay::DelayUs;

use crate::{
    Board, Planner, PositionSync, Stepper, XYZData, XYZId, XYZ_ID_LIST, DIRECTION_MASK, LIMIT_MASK,
};

/// Axes whose switches end a homing pass. Z is driven when selected but has
/// no stop check, so nothing homes it yet.
const CHECKED_AXES: [XYZId; 2] = [XYZId::X, XYZId::Y];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingPass {
    /// Toward the minimum switches until they engage.
    Approach,
    /// Back off until they release.
    Leave,
}

impl<'a, B: Board, P: Planner, G: PositionSync> Stepper<'a, B, P, G> {
    /// Drive X and Y into their minimum switches and back off, then make
    /// that spot the origin. Waits for queued motion first; blocks until done.
    ///
    /// The wait needs the step interrupt to keep running, so a caller holding
    /// interrupts off must drain the queue with [`crate::Shared::synchronize`] first.
    pub fn run_homing_cycle<D: DelayUs<u32>>(&mut self, delay: &mut D, idle: impl FnMut()) {
        self.synchronize(idle);
        self.board_mut().disable_interrupt();
        let homing = self.config().homing;
        let axes = XYZData::new(true, true, false);
        self.homing_cycle(axes, HomingPass::Approach, homing.approach_us_per_pulse, delay);
        self.homing_cycle(axes, HomingPass::Leave, homing.leave_us_per_pulse, delay);
    }

    /// Step `axes` together at `us_per_pulse` until each checked axis saw its
    /// switch change plus the overshoot allowance. Runs with the step
    /// interrupt off, so nothing else touches the port.
    fn homing_cycle<D: DelayUs<u32>>(&mut self, axes: XYZData<bool>, pass: HomingPass, us_per_pulse: u32, delay: &mut D) {
        let config = *self.config();
        let step_delay = us_per_pulse.saturating_sub(config.pulse_microseconds);
        let mut active = axes;
        let mut overshoot = XYZData::from_clone(config.homing.overshoot_pulses);

        let mut out_bits = XYZ_ID_LIST.iter()
            .filter(|axis| *axes.match_id(**axis))
            .fold(DIRECTION_MASK, |bits, axis| bits | axis.step_bit());
        if pass == HomingPass::Leave {
            out_bits ^= DIRECTION_MASK;
        }
        out_bits ^= config.invert_mask;

        info!("homing {} at {} us per pulse", pass, us_per_pulse);
        let board = self.board_mut();
        board.write_direction(out_bits);
        loop {
            let mut engaged = board.limit_switches();
            if pass == HomingPass::Leave {
                engaged ^= LIMIT_MASK;
            }
            for axis in CHECKED_AXES {
                if !*active.match_id(axis) || engaged & axis.limit_bit() == 0 {
                    continue;
                }
                let remaining = overshoot.match_id_mut(axis);
                if *remaining == 0 {
                    *active.match_id_mut(axis) = false;
                    out_bits ^= axis.step_bit();
                } else {
                    *remaining -= 1;
                }
            }
            if !active.iter().any(|a| *a) {
                break;
            }
            board.write_steps(out_bits);
            delay.delay_us(config.pulse_microseconds);
            board.write_steps(config.invert_mask);
            delay.delay_us(step_delay);
        }
        self.shared().position.clear();
        info!("homing {} done", pass);
    }
}
