use core::mem::MaybeUninit;
use arduino_hal::{clock::MHz16, hal::{port::{PE0, PE1}, Atmega}, pac::USART0, port::mode::{Input, Output}};
use avr_hal_generic::usart::{UsartReader, UsartWriter};
use embedded_hal::serial::{Read, Write};
use laser_stepper::{
    Actuators, Prescaler, PulseTimer, SenseInputs, Sensors, StepTimer, StepperPort, DIRECTION_MASK,
    LIMIT_MASK, STEPPING_MASK,
};

/*
* Arduino mega pinout.
* Stepping port A (one write drives all drivers)
*   PA0 D22 X step      PA3 D25 X dir
*   PA1 D23 Y step      PA4 D26 Y dir
*   PA2 D24 Z step      PA5 D27 Z dir
* Limit port C, pulled up, a closed switch reads low
*   PC0 D37 X1  PC1 D36 X2  PC2 D35 Y1  PC3 D34 Y2  PC4 D33 Z1  PC5 D32 Z2
* Sense port L, pulled up, a fault reads low
*   PL0 D49 power  PL1 D48 chiller  PL2 D47 door
* Outputs
*   PB7 D13 laser pwm (OC0A)   PB4 D10 air   PB5 D11 gas
*/
const POWER_BIT: u8 = 0;
const CHILLER_BIT: u8 = 1;
const DOOR_BIT: u8 = 2;
const SENSE_MASK: u8 = (1 << POWER_BIT) | (1 << CHILLER_BIT) | (1 << DOOR_BIT);

const LASER_BIT: u8 = 7;
const AIR_BIT: u8 = 4;
const GAS_BIT: u8 = 5;

const CYCLES_PER_MICROSECOND: u32 = 16;

pub static mut WRITER: MaybeUninit<UsartWriter<Atmega, USART0, arduino_hal::port::Pin<Input, PE0>, arduino_hal::port::Pin<Output, PE1>, MHz16>> = MaybeUninit::uninit();
pub static mut READER: MaybeUninit<UsartReader<Atmega, USART0, arduino_hal::port::Pin<Input, PE0>, arduino_hal::port::Pin<Output, PE1>, MHz16>> = MaybeUninit::uninit();

pub fn write_uart(source: &str) {
    write_uart_u8(source.as_bytes());
}
pub fn write_uart_u8(source: &[u8]) {
    #[allow(static_mut_refs)]
    let writer = unsafe{WRITER.assume_init_mut()};
    for b in source {
        let _ = nb::block!(writer.write(*b));
    }
}

pub fn read_uart() -> Option<u8> {
    #[allow(static_mut_refs)]
    let reader = unsafe{READER.assume_init_mut()};
    reader.read().ok()
}

/// Take the peripherals, start the serial port and put every pin and timer
/// the stepper uses into its reset state. Must run once, before interrupts
/// are enabled.
pub unsafe fn init_static_pins() {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let serial = arduino_hal::default_serial!(dp, pins, 57600);
    let (serial_reader, serial_writer) = serial.split();
    #[allow(static_mut_refs)]
    unsafe {
        WRITER.write(serial_writer);
        READER.write(serial_reader);
    }

    // the port singletons now belong to `pins`, the stepper drives whole ports
    port_a().ddra.write(|w| w.bits(STEPPING_MASK | DIRECTION_MASK));
    port_c().ddrc.write(|w| w.bits(0));
    port_c().portc.write(|w| w.bits(LIMIT_MASK));
    port_l().ddrl.write(|w| w.bits(0));
    port_l().portl.write(|w| w.bits(SENSE_MASK));
    port_b().ddrb.modify(|r, w| w.bits(r.bits() | (1 << LASER_BIT) | (1 << AIR_BIT) | (1 << GAS_BIT)));

    // laser pwm, fast pwm at 16MHz / 64 / 256 = ~1kHz
    dp.TC0.tccr0a.write(|w| w.wgm0().pwm_fast().com0a().match_clear());
    dp.TC0.tccr0b.write(|w| w.cs0().prescale_64());
    dp.TC0.ocr0a.write(|w| w.bits(0));

    // step timer in CTC mode, stopped until the first configure
    dp.TC1.tccr1a.write(|w| w.wgm1().bits(0b00));
    dp.TC1.tccr1b.write(|w| w.wgm1().bits(0b01));
    dp.TC1.timsk1.write(|w| w.ocie1a().clear_bit());

    // pulse timer: normal mode, overflow ends the pulse, clock off until armed
    dp.TC2.tccr2a.write(|w| w.bits(0));
    dp.TC2.tccr2b.write(|w| w.cs2().no_clock());
    dp.TC2.timsk2.write(|w| w.toie2().set_bit());

    // idle sleep mode for synchronize
    dp.CPU.smcr.write(|w| w.se().set_bit());
}

fn port_a() -> &'static arduino_hal::pac::porta::RegisterBlock {
    unsafe { &*arduino_hal::pac::PORTA::ptr() }
}

fn port_b() -> &'static arduino_hal::pac::portb::RegisterBlock {
    unsafe { &*arduino_hal::pac::PORTB::ptr() }
}

fn port_c() -> &'static arduino_hal::pac::portc::RegisterBlock {
    unsafe { &*arduino_hal::pac::PORTC::ptr() }
}

fn port_l() -> &'static arduino_hal::pac::portl::RegisterBlock {
    unsafe { &*arduino_hal::pac::PORTL::ptr() }
}

fn tc1() -> &'static arduino_hal::pac::tc1::RegisterBlock {
    unsafe { &*arduino_hal::pac::TC1::ptr() }
}

fn tc2() -> &'static arduino_hal::pac::tc2::RegisterBlock {
    unsafe { &*arduino_hal::pac::TC2::ptr() }
}

/// The stepper's view of the mega. Stateless, every call goes straight to the
/// registers, so the pulse reset interrupt can use its own instance.
#[derive(Clone, Copy)]
pub struct AvrBoard;

impl StepperPort for AvrBoard {
    fn write_direction(&mut self, bits: u8) {
        port_a().porta.modify(|r, w| unsafe { w.bits((r.bits() & !DIRECTION_MASK) | (bits & DIRECTION_MASK)) });
    }

    fn write_steps(&mut self, bits: u8) {
        port_a().porta.modify(|r, w| unsafe { w.bits((r.bits() & !STEPPING_MASK) | (bits & STEPPING_MASK)) });
    }
}

impl StepTimer for AvrBoard {
    fn configure(&mut self, prescaler: Prescaler, ceiling: u16) {
        let tc1 = tc1();
        tc1.ocr1a.write(|w| unsafe { w.bits(ceiling) });
        tc1.tccr1b.modify(|_, w| match prescaler {
            Prescaler::Direct => w.cs1().direct(),
            Prescaler::Div8 => w.cs1().prescale_8(),
            Prescaler::Div64 => w.cs1().prescale_64(),
            Prescaler::Div256 => w.cs1().prescale_256(),
            Prescaler::Div1024 => w.cs1().prescale_1024(),
        });
    }

    fn enable_interrupt(&mut self) {
        tc1().timsk1.modify(|_, w| w.ocie1a().set_bit());
    }

    fn disable_interrupt(&mut self) {
        tc1().timsk1.modify(|_, w| w.ocie1a().clear_bit());
    }

    fn allow_nesting(&mut self) {
        unsafe { avr_device::interrupt::enable() };
    }
}

impl PulseTimer for AvrBoard {
    fn arm(&mut self, microseconds: u32) {
        // 2us are spent getting into the handler, the timer counts at clk/8
        let ticks = (microseconds.saturating_sub(2) * CYCLES_PER_MICROSECOND) >> 3;
        let tc2 = tc2();
        tc2.tcnt2.write(|w| unsafe { w.bits(0u8.wrapping_sub(ticks as u8)) });
        tc2.tccr2b.write(|w| w.cs2().prescale_8());
    }

    fn disarm(&mut self) {
        tc2().tccr2b.write(|w| w.cs2().no_clock());
    }
}

impl Sensors for AvrBoard {
    fn sense(&mut self) -> SenseInputs {
        let faults = !port_l().pinl.read().bits();
        SenseInputs {
            limit_hit: self.limit_switches() != 0,
            chiller_off: faults & (1 << CHILLER_BIT) != 0,
            power_off: faults & (1 << POWER_BIT) != 0,
            door_open: faults & (1 << DOOR_BIT) != 0,
        }
    }

    fn limit_switches(&mut self) -> u8 {
        !port_c().pinc.read().bits() & LIMIT_MASK
    }
}

impl Actuators for AvrBoard {
    fn set_laser_intensity(&mut self, intensity: u8) {
        unsafe { &*arduino_hal::pac::TC0::ptr() }.ocr0a.write(|w| unsafe { w.bits(intensity) });
    }

    fn set_air(&mut self, on: bool) {
        set_port_b(AIR_BIT, on);
    }

    fn set_gas(&mut self, on: bool) {
        set_port_b(GAS_BIT, on);
    }
}

fn set_port_b(bit: u8, on: bool) {
    port_b().portb.modify(|r, w| unsafe {
        match on {
            true => w.bits(r.bits() | (1 << bit)),
            false => w.bits(r.bits() & !(1 << bit)),
        }
    });
}
