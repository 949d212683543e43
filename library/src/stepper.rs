use crate::{
    Block, Board, ConfigError, LineBlock, Planner, PositionSync, PulseTimer, Shared, StepperConfig,
    StepperPort, StopReason, Tracer, Trapezoid, XYZData, DIRECTION_MASK, STEPPING_MASK,
};

/// End the step pulse armed by the dispatcher: step pins back to rest, pulse timer off.
pub fn reset_step_pulse<B: StepperPort + PulseTimer + ?Sized>(board: &mut B, invert_mask: u8) {
    board.write_steps(invert_mask & STEPPING_MASK);
    board.disarm();
}

/// What became of the block at the head of the queue this invocation.
enum BlockProgress {
    Tracing,
    Complete,
}

/// Executes the planner's block queue from the step timer interrupt.
///
/// Every invocation first puts out the pulse computed by the previous one,
/// then computes the next, so the pulse train has no jitter from the
/// computation itself.
pub struct Stepper<'a, B: Board, P: Planner, G: PositionSync = ()> {
    shared: &'a Shared,
    board: B,
    planner: P,
    gcode: G,
    config: StepperConfig,
    current_block: Option<Block>,
    out_bits: u8,
    tracer: Tracer,
    trapezoid: Trapezoid,
}

impl<'a, B: Board, P: Planner, G: PositionSync> Stepper<'a, B, P, G> {
    pub fn new(shared: &'a Shared, board: B, planner: P, gcode: G, config: StepperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut stepper = Self {
            shared,
            board,
            planner,
            gcode,
            current_block: None,
            out_bits: config.invert_mask,
            tracer: Tracer::default(),
            trapezoid: Trapezoid::new(&config),
            config,
        };
        stepper.initialize();
        Ok(stepper)
    }

    /// Pins to rest, timers to the minimum rate, position zeroed, stop cleared, idle.
    pub fn initialize(&mut self) {
        let rest = self.config.invert_mask;
        self.board.write_direction(rest);
        self.board.write_steps(rest);
        self.board.disarm();
        self.out_bits = rest;
        self.trapezoid.adjust_speed(&mut self.board, self.config.minimum_steps_per_minute);
        self.shared.position.clear();
        self.shared.clear_stop();
        self.go_idle();
        info!("stepper ready, {} cycles per step event", self.trapezoid.cycles_per_step_event());
    }

    /// Start processing the queue. No effect while already processing.
    pub fn wake_up(&mut self) {
        if self.shared.is_processing() {
            return;
        }
        self.shared.set_processing(true);
        self.out_bits = self.config.invert_mask;
        self.board.enable_interrupt();
    }

    pub fn go_idle(&mut self) {
        self.shared.set_processing(false);
        self.current_block = None;
        self.board.disable_interrupt();
        self.board.set_laser_intensity(0);
    }

    /// Step timer compare handler. Returns at once if a previous invocation is
    /// still running.
    pub fn on_step_interrupt(&mut self) {
        let shared = self.shared;
        let Some(_busy) = shared.try_begin_dispatch() else {
            return;
        };
        self.dispatch();
    }

    pub fn reset_step_pulse(&mut self) {
        reset_step_pulse(&mut self.board, self.config.invert_mask);
    }

    fn dispatch(&mut self) {
        if self.shared.is_stop_requested() {
            self.go_idle();
            self.planner.reset_block_buffer();
            self.planner.request_position_update();
            self.gcode.request_position_update();
            warn!("stopped ({}), block queue discarded", self.shared.stop_reason().code());
            return;
        }

        let inputs = self.board.sense();
        if inputs.any() {
            if let Some(reason) = inputs.stop_reason() {
                self.shared.request_stop(reason);
                warn!("stop latched by sensor ({})", reason.code());
            }
            // door open: hold the pending pulse and the block until it closes
            trace!("paused, door open");
            return;
        }

        self.board.write_direction(self.out_bits);
        self.board.write_steps(self.out_bits);
        self.board.arm(self.config.pulse_microseconds);
        self.board.allow_nesting();

        let block = match self.current_block {
            Some(block) => block,
            None => match self.planner.current_block() {
                Some(block) => {
                    trace!("next block: {}", block);
                    if let Block::Line(line) = &block {
                        self.begin_line(line);
                    }
                    self.current_block = Some(block);
                    block
                }
                None => {
                    self.go_idle();
                    debug!("block queue drained");
                    return;
                }
            },
        };

        if let BlockProgress::Complete = self.execute(&block) {
            self.current_block = None;
            self.planner.discard_current_block();
        }
    }

    fn begin_line(&mut self, line: &LineBlock) {
        self.trapezoid.begin(line, &mut self.board);
        self.board.set_laser_intensity(line.nominal_laser_intensity);
        self.tracer.begin(line);
        debug!("line: {} step events, intensity {}", line.step_event_count, line.nominal_laser_intensity);
    }

    fn execute(&mut self, block: &Block) -> BlockProgress {
        let line = match block {
            Block::Line(line) => line,
            Block::AirGasDisable => {
                self.board.set_air(false);
                self.board.set_gas(false);
                return self.finish_command();
            }
            Block::AirEnable => {
                self.board.set_air(true);
                return self.finish_command();
            }
            Block::GasEnable => {
                self.board.set_gas(true);
                return self.finish_command();
            }
        };

        self.out_bits = self.tracer.trace(line, &self.shared.position, self.config.invert_mask);
        if self.tracer.is_finished(line) {
            return BlockProgress::Complete;
        }
        if self.trapezoid.advance(line, self.tracer.step_events_completed, &mut self.board) {
            self.board.set_laser_intensity(line.nominal_laser_intensity);
        }
        BlockProgress::Tracing
    }

    /// The pulse pending from a preceding line went out this invocation, so
    /// the next one must not repeat it.
    fn finish_command(&mut self) -> BlockProgress {
        self.out_bits = (self.out_bits & DIRECTION_MASK) | (self.config.invert_mask & STEPPING_MASK);
        BlockProgress::Complete
    }

    pub fn is_processing(&self) -> bool {
        self.shared.is_processing()
    }

    pub fn synchronize(&self, idle: impl FnMut()) {
        self.shared.synchronize(idle);
    }

    pub fn request_stop(&self, reason: StopReason) {
        self.shared.request_stop(reason);
    }

    pub fn resume(&self) {
        self.shared.resume();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.is_stop_requested()
    }

    pub fn stop_reason(&self) -> StopReason {
        self.shared.stop_reason()
    }

    pub fn get_position(&self) -> XYZData<f32> {
        self.shared.get_position(&self.config)
    }

    /// Waits for the queue to drain like [`Shared::synchronize`], so it must
    /// not be called with interrupts held off while processing.
    pub fn set_position(&self, mm: XYZData<f32>, idle: impl FnMut()) {
        self.shared.set_position(&self.config, mm, idle);
    }

    pub fn config(&self) -> &StepperConfig { &self.config }
    pub fn shared(&self) -> &'a Shared { self.shared }
    pub fn board(&self) -> &B { &self.board }
    pub fn board_mut(&mut self) -> &mut B { &mut self.board }
    pub fn planner(&self) -> &P { &self.planner }
    pub fn planner_mut(&mut self) -> &mut P { &mut self.planner }
    pub fn gcode(&self) -> &G { &self.gcode }
}
