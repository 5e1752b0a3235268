//! A simulator wired to a controller and a clock.
//!
//! [`Session`] is what a front end drives: it reads the clock, turns key
//! transitions into commands, and interleaves simulator timers with key
//! repeats in time order.

use tracing::trace;

use crate::clock::Clock;
use crate::input::{Controller, RepeatTiming, VirtualKey};
use crate::presenter::{GameSummary, Presenter};
use crate::rules::{Rules, RulesError};
use crate::simulator::{ControllerSignal, Simulator};
use crate::types::{Command, GameMode, ParseGameModeError};

pub struct Session<P, C> {
    simulator: Simulator<P>,
    controller: Controller,
    clock: C,
}

impl<P: Presenter, C: Clock> Session<P, C> {
    pub fn new(rules: Rules, presenter: P, clock: C) -> Result<Self, RulesError> {
        let timing = RepeatTiming {
            delay_ms: rules.shift_delay_ms,
            frequency_hz: rules.shift_frequency_hz,
        };
        Ok(Self {
            simulator: Simulator::new(rules, presenter)?,
            controller: Controller::new(timing),
            clock,
        })
    }

    /// Start a new game now
    pub fn start(&mut self, mode: GameMode, seed: u32) {
        self.controller.start();
        let now = self.clock.now_ms();
        self.simulator.start(mode, seed, now);
        self.sync_controller();
    }

    pub fn start_named(&mut self, mode: &str, seed: u32) -> Result<(), ParseGameModeError> {
        let mode: GameMode = mode.parse()?;
        self.start(mode, seed);
        Ok(())
    }

    pub fn key_down(&mut self, key: VirtualKey) {
        let now = self.pump();
        let commands = self.controller.key_down(key, now);
        self.apply_all(commands);
    }

    pub fn key_up(&mut self, key: VirtualKey) {
        self.pump();
        let commands = self.controller.key_up(key);
        self.apply_all(commands);
    }

    /// Catch up with the clock; returns the current time
    pub fn pump(&mut self) -> u64 {
        let now = self.clock.now_ms();
        self.advance_to(now);
        now
    }

    /// Fire timers and key repeats due up to `now`, earliest first
    ///
    /// A timer and a repeat due at the same millisecond fire timer first.
    pub fn advance_to(&mut self, now: u64) {
        loop {
            let timer_at = self.simulator.next_timer_at().filter(|&at| at <= now);
            let repeat_at = self.controller.next_repeat_at().filter(|&at| at <= now);
            match (timer_at, repeat_at) {
                (Some(t), Some(r)) if r < t => self.fire_repeat(r),
                (Some(t), _) => {
                    self.simulator.fire_next_due(t);
                    self.sync_controller();
                }
                (None, Some(r)) => self.fire_repeat(r),
                (None, None) => break,
            }
        }
        self.simulator.set_now(now);
    }

    /// Earliest time anything is due
    pub fn next_wakeup(&mut self) -> Option<u64> {
        let timer_at = self.simulator.next_timer_at();
        let repeat_at = self.controller.next_repeat_at();
        match (timer_at, repeat_at) {
            (Some(t), Some(r)) => Some(t.min(r)),
            (t, r) => t.or(r),
        }
    }

    pub fn simulator(&self) -> &Simulator<P> {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator<P> {
        &mut self.simulator
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn presenter(&self) -> &P {
        self.simulator.presenter()
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        self.simulator.presenter_mut()
    }

    pub fn summary(&self) -> Option<GameSummary> {
        self.simulator.summary()
    }

    fn fire_repeat(&mut self, at: u64) {
        self.simulator.set_now(at);
        if let Some(command) = self.controller.fire_repeat(at) {
            trace!(command = command.as_str(), at, "repeat");
            self.apply(command);
        }
    }

    fn apply_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        self.simulator.apply(command);
        self.sync_controller();
    }

    fn sync_controller(&mut self) {
        match self.simulator.take_controller_signal() {
            Some(ControllerSignal::Interrupt) => {
                let commands = self.controller.interrupt();
                self.apply_all(commands);
            }
            Some(ControllerSignal::Stop) => self.controller.stop(),
            None => {}
        }
    }
}
