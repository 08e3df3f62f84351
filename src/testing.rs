//! Simulated open-drain bus with a TM1637 on the far end
//!
//! Each [`SimLine`] records every reconfiguration in a log that may be shared
//! between several buses, so tests can check the order of pin activity across
//! instances. The simulated chip watches clock and data edges: it detects start
//! and stop conditions, shifts in bits on rising clock edges (least significant
//! bit first) and pulls data low for the ninth clock of every byte.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::interface::{GpioBank, GpioLine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Line {
    Clk,
    Dio,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Release,
    AssertLow,
    Inert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PinEvent {
    pub tag: u8,
    pub line: Line,
    pub op: Op,
}

pub(crate) type EventLog = Rc<RefCell<Vec<PinEvent>>>;

#[derive(Debug, Default)]
pub(crate) struct Chip {
    in_frame: bool,
    acking: bool,
    bits: u8,
    shift: u8,
    current: Vec<u8>,
    bytes_seen: usize,
    /// Completed frames, one entry per start/stop pair
    pub frames: Vec<Vec<u8>>,
    /// Withhold the acknowledge for this byte index
    pub nack_byte: Option<usize>,
    /// Clock pulses that carried a data bit
    pub data_bits: usize,
}

impl Chip {
    fn clock_rise(&mut self, dio_high: bool) {
        if self.in_frame && !self.acking && self.bits < 8 {
            if dio_high {
                self.shift |= 1 << self.bits;
            }
            self.bits += 1;
            self.data_bits += 1;
        }
    }

    fn clock_fall(&mut self) {
        if !self.in_frame {
            return;
        }
        if self.acking {
            self.acking = false;
        } else if self.bits == 8 {
            self.current.push(self.shift);
            self.acking = self.nack_byte != Some(self.bytes_seen);
            self.bytes_seen += 1;
            self.bits = 0;
            self.shift = 0;
        }
    }

    fn start(&mut self) {
        self.in_frame = true;
        self.acking = false;
        self.bits = 0;
        self.shift = 0;
        self.current.clear();
    }

    fn stop(&mut self) {
        if self.in_frame {
            // the clock edge ahead of a stop is not data
            self.data_bits -= usize::from(self.bits);
            self.bits = 0;
            self.frames.push(core::mem::take(&mut self.current));
            self.in_frame = false;
        }
    }

    /// All bytes received, in order
    pub fn bytes(&self) -> Vec<u8> {
        self.frames.iter().flatten().copied().collect()
    }
}

#[derive(Debug)]
pub(crate) struct BusState {
    tag: u8,
    log: EventLog,
    clk_low: bool,
    dio_low: bool,
    /// Something holds the clock low
    pub hold_clk: bool,
    /// A stuck device holds data low for this many more clock pulses
    pub stuck_dio_pulses: u32,
    /// Reads fail with an error
    pub fail_reads: bool,
    /// Driving a line low fails with an error
    pub fail_asserts: bool,
    pub chip: Chip,
    pub reads: u32,
}

impl BusState {
    fn clk_high(&self) -> bool {
        !(self.clk_low || self.hold_clk)
    }

    fn dio_high(&self) -> bool {
        !(self.dio_low || self.chip.acking || self.stuck_dio_pulses > 0)
    }

    fn apply(&mut self, line: Line, op: Op) {
        self.log.borrow_mut().push(PinEvent {
            tag: self.tag,
            line,
            op,
        });
        let clk_before = self.clk_high();
        let dio_before = self.dio_high();
        let low = op == Op::AssertLow;
        match line {
            Line::Clk => self.clk_low = low,
            Line::Dio => self.dio_low = low,
        }
        let clk_after = self.clk_high();
        if !clk_before && clk_after {
            self.stuck_dio_pulses = self.stuck_dio_pulses.saturating_sub(1);
            let dio = self.dio_high();
            self.chip.clock_rise(dio);
        } else if clk_before && !clk_after {
            self.chip.clock_fall();
        } else if clk_before && clk_after {
            let dio_after = self.dio_high();
            if dio_before && !dio_after {
                self.chip.start();
            } else if !dio_before && dio_after {
                self.chip.stop();
            }
        }
    }
}

pub(crate) type SharedBus = Rc<RefCell<BusState>>;

#[derive(Debug)]
pub(crate) struct SimLine {
    bus: SharedBus,
    line: Line,
}

impl GpioLine for SimLine {
    type Error = ();

    fn configure_input_pull_up(&mut self) -> Result<(), Self::Error> {
        self.bus.borrow_mut().apply(self.line, Op::Release);
        Ok(())
    }

    fn configure_output_low(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        if bus.fail_asserts {
            return Err(());
        }
        bus.apply(self.line, Op::AssertLow);
        Ok(())
    }

    fn configure_inert(&mut self) -> Result<(), Self::Error> {
        self.bus.borrow_mut().apply(self.line, Op::Inert);
        Ok(())
    }

    fn read(&mut self) -> Result<bool, Self::Error> {
        let mut bus = self.bus.borrow_mut();
        bus.reads += 1;
        if bus.fail_reads {
            return Err(());
        }
        Ok(match self.line {
            Line::Clk => bus.clk_high(),
            Line::Dio => bus.dio_high(),
        })
    }
}

pub(crate) fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A display wired to its own clock and data lines
pub(crate) fn sim_bus(tag: u8, log: &EventLog) -> (SharedBus, SimLine, SimLine) {
    let bus = Rc::new(RefCell::new(BusState {
        tag,
        log: Rc::clone(log),
        clk_low: false,
        dio_low: false,
        hold_clk: false,
        stuck_dio_pulses: 0,
        fail_reads: false,
        fail_asserts: false,
        chip: Chip::default(),
        reads: 0,
    }));
    let clk = SimLine {
        bus: Rc::clone(&bus),
        line: Line::Clk,
    };
    let dio = SimLine {
        bus: Rc::clone(&bus),
        line: Line::Dio,
    };
    (bus, clk, dio)
}

/// GPIO bank where pin `2n` is the clock and `2n + 1` the data line of display `n`
#[derive(Debug)]
pub(crate) struct SimBank {
    pub buses: Vec<SharedBus>,
}

impl SimBank {
    pub fn new(displays: u8, log: &EventLog) -> Self {
        let buses = (0..displays).map(|tag| sim_bus(tag, log).0).collect();
        Self { buses }
    }
}

impl GpioBank for SimBank {
    type Line = SimLine;

    fn line(&mut self, pin: u32) -> Option<Self::Line> {
        let bus = self.buses.get((pin / 2) as usize)?;
        let line = if pin % 2 == 0 { Line::Clk } else { Line::Dio };
        Some(SimLine {
            bus: Rc::clone(bus),
            line,
        })
    }
}
