use std::collections::VecDeque;
use std::ops::ControlFlow;

use crate::clock::{AgentSnapshot, CellSnapshot, Command, SimulationClock, TickReport};
use crate::stats::SimulationStats;

/// Receives a read-only picture of the world between ticks.
pub trait RenderSink {
    fn begin_frame(&mut self) {}

    fn draw_cell(&mut self, cell: &CellSnapshot, max_value: f64);

    fn draw_agent(&mut self, agent: &AgentSnapshot);

    fn end_frame(&mut self, _stats: &SimulationStats) {}
}

/// Source of external commands, polled once per iteration.
pub trait InputSink {
    fn poll(&mut self) -> Vec<Command>;
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRender;

impl RenderSink for NullRender {
    fn draw_cell(&mut self, _cell: &CellSnapshot, _max_value: f64) {}

    fn draw_agent(&mut self, _agent: &AgentSnapshot) {}
}

/// Queue of commands; every poll drains it.
#[derive(Debug, Default, Clone)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        CommandQueue::default()
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }
}

impl InputSink for CommandQueue {
    fn poll(&mut self) -> Vec<Command> {
        self.pending.drain(..).collect()
    }
}

/// Sends every cell and agent of `clock` to `sink`.
pub fn render(clock: &SimulationClock, stats: &SimulationStats, sink: &mut impl RenderSink) {
    let max_value = clock.grid().max_value();
    sink.begin_frame();
    for cell in clock.cells() {
        sink.draw_cell(&cell, max_value);
    }
    for agent in clock.agents().filter(|a| a.alive) {
        sink.draw_agent(&agent);
    }
    sink.end_frame(stats);
}

/// One loop iteration is: poll input, maybe tick, render.
pub struct Driver<R, I> {
    clock: SimulationClock,
    renderer: R,
    input: I,
    stats: SimulationStats,
}

impl<R: RenderSink, I: InputSink> Driver<R, I> {
    pub fn new(clock: SimulationClock, renderer: R, input: I) -> Self {
        Driver {
            clock,
            renderer,
            input,
            stats: SimulationStats::default(),
        }
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Applies pending commands. Breaks on `Command::Quit`.
    pub fn pump_input(&mut self) -> ControlFlow<()> {
        for command in self.input.poll() {
            match command {
                Command::Quit => return ControlFlow::Break(()),
                Command::Reset => {
                    self.clock.reset();
                    self.stats = SimulationStats::default();
                }
                other => self.clock.apply(other),
            }
        }
        ControlFlow::Continue(())
    }

    pub fn advance(&mut self) -> Option<TickReport> {
        let report = self.clock.step()?;
        self.stats.record(&report);
        Some(report)
    }

    pub fn draw(&mut self) {
        render(&self.clock, &self.stats, &mut self.renderer);
    }

    pub fn iterate(&mut self) -> ControlFlow<()> {
        if self.pump_input().is_break() {
            return ControlFlow::Break(());
        }
        self.advance();
        self.draw();
        ControlFlow::Continue(())
    }
}
