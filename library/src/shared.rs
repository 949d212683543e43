//! State touched by both the stepper interrupt and the main line.
//!
//! Everything here is a single atomic word, so a preempting interrupt never
//! sees a half written value. On AVR the driver enables portable-atomic's
//! single-core mode.

use portable_atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::{StepperConfig, XYZData, XYZId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopReason {
    Ok,
    Requested,
    PowerOff,
    ChillerOff,
    LimitHit,
}

impl StopReason {
    pub const fn code(self) -> u8 {
        match self {
            StopReason::Ok => 0,
            StopReason::Requested => 4,
            StopReason::PowerOff => 7,
            StopReason::ChillerOff => 8,
            StopReason::LimitHit => 9,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => StopReason::Ok,
            7 => StopReason::PowerOff,
            8 => StopReason::ChillerOff,
            9 => StopReason::LimitHit,
            _ => StopReason::Requested,
        }
    }
}

/// Absolute position in steps.
pub struct Position {
    axes: XYZData<AtomicI32>,
}

impl Position {
    pub const fn new() -> Self {
        Self { axes: XYZData::new(AtomicI32::new(0), AtomicI32::new(0), AtomicI32::new(0)) }
    }

    /// One step on `axis`.
    pub fn step(&self, axis: XYZId, negative: bool) {
        let delta = if negative { -1 } else { 1 };
        self.axes.match_id(axis).fetch_add(delta, Ordering::Relaxed);
    }

    pub fn load(&self) -> XYZData<i32> {
        self.axes.map(|a| a.load(Ordering::Relaxed))
    }

    pub fn store(&self, steps: XYZData<i32>) {
        self.axes.x.store(steps.x, Ordering::Relaxed);
        self.axes.y.store(steps.y, Ordering::Relaxed);
        self.axes.z.store(steps.z, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.store(XYZData::default());
    }
}

impl Default for Position {
    fn default() -> Self { Self::new() }
}

/// Clears the dispatcher's busy flag when dropped, on every return path.
pub struct DispatchGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct Shared {
    busy: AtomicBool,
    processing: AtomicBool,
    stop_requested: AtomicBool,
    stop_reason: AtomicU8,
    pub position: Position,
}

impl Shared {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            processing: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            stop_reason: AtomicU8::new(StopReason::Ok.code()),
            position: Position::new(),
        }
    }

    /// `None` while another dispatch is still running.
    pub fn try_begin_dispatch(&self) -> Option<DispatchGuard<'_>> {
        if self.busy.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(DispatchGuard { busy: &self.busy })
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub(crate) fn set_processing(&self, processing: bool) {
        self.processing.store(processing, Ordering::Release);
    }

    /// Latch a stop. The dispatcher acts on it at its next invocation.
    pub fn request_stop(&self, reason: StopReason) {
        // reason first, a reader seeing the flag must see its reason
        self.stop_reason.store(reason.code(), Ordering::Relaxed);
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.stop_requested.store(false, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn stop_reason(&self) -> StopReason {
        StopReason::from_code(self.stop_reason.load(Ordering::Acquire))
    }

    pub(crate) fn clear_stop(&self) {
        self.stop_reason.store(StopReason::Ok.code(), Ordering::Relaxed);
        self.stop_requested.store(false, Ordering::Release);
    }

    /// Block until every queued block has been executed. `idle` is called
    /// between checks, e.g. to sleep the cpu until the next interrupt.
    pub fn synchronize(&self, mut idle: impl FnMut()) {
        while self.is_processing() {
            idle();
        }
    }

    /// Position in millimetres.
    pub fn get_position(&self, config: &StepperConfig) -> XYZData<f32> {
        self.position.load().zip_map(&config.steps_per_mm, |steps, per_mm| *steps as f32 / *per_mm)
    }

    /// Overwrite the position (millimetres) once all queued motion is done.
    pub fn set_position(&self, config: &StepperConfig, mm: XYZData<f32>, idle: impl FnMut()) {
        self.synchronize(idle);
        let steps = mm.zip_map(&config.steps_per_mm, |mm, per_mm| (mm * per_mm + 0.5).floor() as i32);
        self.position.store(steps);
    }
}

impl Default for Shared {
    fn default() -> Self { Self::new() }
}
