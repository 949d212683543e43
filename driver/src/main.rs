#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

mod pins;
mod stepper_interrupt;

use micromath::F32Ext;
use panic_halt as _;
use laser_stepper::{Block, LineBlock, StepperConfig, StopReason, XYZData};
use pins::{init_static_pins, read_uart, write_uart};
use stepper_interrupt::{stepper_interrupt_init, with_stepper, SHARED};

pub const CONFIG: StepperConfig = StepperConfig {
    invert_mask: 0,
    ..StepperConfig::DEFAULT
};

// 20mm square at 2000mm/min, 32.8 steps/mm
const SQUARE_RATE: u32 = 65_617;
const SQUARE: [(i32, i32); 4] = [(656, 0), (0, 656), (-656, 0), (0, -656)];

fn sleep() {
    avr_device::asm::sleep();
}

fn report_position() {
    let mm = SHARED.get_position(&CONFIG);
    let um = mm.map(|v| (v * 1000.0).round() as i32);
    let mut line = str_buf::StrBuf::<48>::new();
    let _ = ufmt::uwriteln!(&mut line, "X{} Y{} Z{} um", um.x, um.y, um.z);
    write_uart(line.as_str());
}

fn report_stop(reason: StopReason) {
    let mut line = str_buf::StrBuf::<16>::new();
    let _ = ufmt::uwriteln!(&mut line, "STOP {}", reason.code());
    write_uart(line.as_str());
}

fn queue_square() {
    with_stepper(|stepper| {
        let blocks = core::iter::once(Block::AirEnable)
            .chain(SQUARE.iter().map(|(x, y)| {
                let mut line = LineBlock::from_delta(XYZData::new(*x, *y, 0), SQUARE_RATE);
                line.nominal_laser_intensity = 128;
                Block::Line(line)
            }))
            .chain(core::iter::once(Block::AirGasDisable));
        for block in blocks {
            if stepper.planner_mut().push(block).is_err() {
                write_uart("queue full\n");
                break;
            }
        }
        stepper.wake_up();
    });
}

fn home() {
    SHARED.synchronize(sleep);
    with_stepper(|stepper| stepper.run_homing_cycle(&mut arduino_hal::Delay::new(), || {}));
    write_uart("homed\n");
}

#[arduino_hal::entry]
fn main() -> ! {
    unsafe { init_static_pins() };
    if stepper_interrupt_init().is_err() {
        write_uart("stepper config rejected\n");
        loop {
            sleep();
        }
    }
    unsafe { avr_device::interrupt::enable(); }
    write_uart("Startup\n");

    let mut stop_reported = false;
    loop {
        if SHARED.is_stop_requested() && !SHARED.is_processing() && !stop_reported {
            report_stop(SHARED.stop_reason());
            stop_reported = true;
        }
        match read_uart() {
            Some(b'!') => SHARED.request_stop(StopReason::Requested),
            Some(b'~') => {
                SHARED.resume();
                stop_reported = false;
            }
            Some(b'?') => report_position(),
            Some(b'h') if !SHARED.is_stop_requested() => home(),
            Some(b't') if !SHARED.is_stop_requested() => queue_square(),
            _ => {}
        }
    }
}
