use core::mem::MaybeUninit;

use laser_stepper::{reset_step_pulse, BlockQueue, ConfigError, Shared, Stepper};

use crate::{pins::AvrBoard, CONFIG};

pub const QUEUE_SIZE: usize = 8;

pub type Engine = Stepper<'static, AvrBoard, BlockQueue<QUEUE_SIZE>>;

pub static SHARED: Shared = Shared::new();
static mut STEPPER: MaybeUninit<Engine> = MaybeUninit::uninit();

/// Build the stepper, leaving it idle. Call before interrupts are enabled.
pub fn stepper_interrupt_init() -> Result<(), ConfigError> {
    let stepper = Stepper::new(&SHARED, AvrBoard, BlockQueue::new(), (), CONFIG)?;
    #[allow(static_mut_refs)]
    unsafe { STEPPER.write(stepper) };
    Ok(())
}

/// Main line access to the stepper, with interrupts held off.
pub fn with_stepper<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    avr_device::interrupt::free(|_| {
        #[allow(static_mut_refs)]
        let stepper = unsafe { STEPPER.assume_init_mut() };
        f(stepper)
    })
}

#[avr_device::interrupt(atmega2560)]
fn TIMER1_COMPA() {
    // nested re-fire while the previous dispatch still runs, drop it before
    // taking a second &mut
    if SHARED.is_busy() {
        return;
    }
    #[allow(static_mut_refs)]
    let stepper = unsafe { STEPPER.assume_init_mut() };
    stepper.on_step_interrupt();
}

#[avr_device::interrupt(atmega2560)]
fn TIMER2_OVF() {
    reset_step_pulse(&mut AvrBoard, CONFIG.invert_mask);
}
