use crate::StepTimer;

// datasheet: https://ww1.microchip.com/downloads/en/DeviceDoc/doc7799.pdf
// 16 bit timer in CTC mode, the compare value is the ceiling.
//
// ╔═══════════╦═══════════════╦══════════════════╗
// ║ PRESCALER ║ MAX CYCLES    ║ @16MHz           ║
// ╠═══════════╬═══════════════╬══════════════════╣
// ║         1 ║       0xffff  ║         4.096 ms ║
// ║         8 ║      0x7ffff  ║        32.77 ms  ║
// ║        64 ║     0x3fffff  ║       262.1 ms   ║
// ║       256 ║     0xffffff  ║        1.049 s   ║
// ║      1024 ║    0x3ffffff  ║        4.194 s   ║
// ╚═══════════╩═══════════════╩══════════════════╝

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Direct,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    const ALL: [Prescaler; 5] = [Prescaler::Direct, Prescaler::Div8, Prescaler::Div64, Prescaler::Div256, Prescaler::Div1024];

    pub const fn shift(self) -> u32 {
        match self {
            Prescaler::Direct => 0,
            Prescaler::Div8 => 3,
            Prescaler::Div64 => 6,
            Prescaler::Div256 => 8,
            Prescaler::Div1024 => 10,
        }
    }

    pub const fn divider(self) -> u32 {
        1 << self.shift()
    }
}

pub const MAX_CEILING: u32 = 0xffff;
/// Slowest period the step timer can produce.
pub const MAX_STEP_TIMER_CYCLES: u32 = MAX_CEILING * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerSetting {
    pub prescaler: Prescaler,
    pub ceiling: u16,
    /// What the hardware really produces, `ceiling * divider`.
    pub actual_cycles: u32,
}

/// Finest prescaler that can express `cycles`, saturating at the slowest setting.
pub fn timer_setting(cycles: u32) -> TimerSetting {
    for prescaler in Prescaler::ALL {
        let ceiling = cycles >> prescaler.shift();
        if ceiling <= MAX_CEILING {
            return TimerSetting {
                prescaler,
                ceiling: ceiling as u16,
                actual_cycles: ceiling * prescaler.divider(),
            };
        }
    }
    TimerSetting {
        prescaler: Prescaler::Div1024,
        ceiling: MAX_CEILING as u16,
        actual_cycles: MAX_STEP_TIMER_CYCLES,
    }
}

/// Program the step timer as close to `cycles` as it gets and return the
/// cycles per interrupt it actually runs at.
pub fn config_step_timer<T: StepTimer + ?Sized>(timer: &mut T, cycles: u32) -> u32 {
    let setting = timer_setting(cycles);
    timer.configure(setting.prescaler, setting.ceiling);
    setting.actual_cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RegisterTimer {
        prescaler: Option<Prescaler>,
        ceiling: u16,
    }
    impl StepTimer for RegisterTimer {
        fn configure(&mut self, prescaler: Prescaler, ceiling: u16) {
            self.prescaler = Some(prescaler);
            self.ceiling = ceiling;
        }
        fn enable_interrupt(&mut self) {}
        fn disable_interrupt(&mut self) {}
    }

    #[test]
    fn exact_fit_without_prescaler() {
        let setting = timer_setting(65535);
        assert_eq!(setting, TimerSetting { prescaler: Prescaler::Direct, ceiling: 65535, actual_cycles: 65535 });
    }

    #[test]
    fn first_value_needing_prescaler() {
        let setting = timer_setting(70000);
        assert_eq!(setting, TimerSetting { prescaler: Prescaler::Div8, ceiling: 8750, actual_cycles: 70000 });
    }

    #[test]
    fn quantized_to_divider() {
        let setting = timer_setting(0x7ffff + 1);
        assert_eq!(setting.prescaler, Prescaler::Div64);
        assert_eq!(setting.ceiling, 0x2000);
        assert_eq!(setting.actual_cycles, 0x80000);
        let setting = timer_setting(70007);
        assert_eq!(setting.actual_cycles, 70000, "rounds down to the divider");
    }

    #[test]
    fn boundaries_pick_finest_prescaler() {
        assert_eq!(timer_setting(0x7ffff).prescaler, Prescaler::Div8);
        assert_eq!(timer_setting(0x3fffff).prescaler, Prescaler::Div64);
        assert_eq!(timer_setting(0xffffff).prescaler, Prescaler::Div256);
        assert_eq!(timer_setting(0x3ffffff).prescaler, Prescaler::Div1024);
    }

    #[test]
    fn saturates_beyond_slowest() {
        for cycles in [MAX_STEP_TIMER_CYCLES + 1, 0x4000000, u32::MAX] {
            let setting = timer_setting(cycles);
            assert_eq!(setting.prescaler, Prescaler::Div1024);
            assert_eq!(setting.ceiling, 0xffff);
            assert_eq!(setting.actual_cycles, MAX_STEP_TIMER_CYCLES);
        }
    }

    #[test]
    fn config_writes_registers() {
        let mut timer = RegisterTimer::default();
        let actual = config_step_timer(&mut timer, 800_000);
        assert_eq!(timer.prescaler, Some(Prescaler::Div64));
        assert_eq!(timer.ceiling, 12_500);
        assert_eq!(actual, 800_000);
    }
}
