//! TM1637 wire protocol state machine
//!
//! The TM1637 speaks a two-wire protocol that looks like I2C without addresses:
//! a start condition, bytes sent least significant bit first with an acknowledge
//! clock after each byte, then a stop condition. A full display update is a
//! 9-byte [`Session`] split into three frames by the bit boundaries below:
//!
//! | Bits sent | Bytes | Content |
//! |---|---|---|
//! | [`COMMAND_BYTE_BITS`] | 0 | Data setting command |
//! | [`FRAME_BYTES_BITS`] | 1..=7 | Address command and six grid bytes |
//! | [`TOTAL_BITS`] | 8 | Display control command |
//!
//! Every call to [`Session::step`] performs exactly one [`Stage`] (one pin
//! operation or one check), so the caller controls the bus timing by how often
//! it steps.
//!
//! Any [`Fault`], a GPIO error included, ends the session on the spot. There is no retry besides the bus reset done when the
//! session finds the bus busy at start.

use crate::interface::{BusPin, GpioLine};

/// Payload length of one session in bytes
pub const PAYLOAD_LEN: usize = 9;

/// Bits sent when the leading command byte is done
pub const COMMAND_BYTE_BITS: u8 = 8;

/// Bits sent when the address and grid bytes are done
pub const FRAME_BYTES_BITS: u8 = 64;

/// Bits in a full payload
pub const TOTAL_BITS: u8 = (PAYLOAD_LEN * 8) as u8;

/// Sub-steps of a bus reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetStep {
    /// Pull clock low
    ClockLow,
    /// Pull data low
    DataLow,
    /// Release clock
    ClockRelease,
    /// Release data and count the pulse
    DataRelease,
    /// Check that both lines are free
    Verify,
}

/// Sub-steps of a start condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartStep {
    /// Pull data low while clock is released
    DataLow,
    /// Pull clock low
    ClockLow,
}

/// Sub-steps of writing one bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitStep {
    /// Pull clock low
    ClockLow,
    /// Put the bit on the data line
    Drive,
    /// Release clock; the display latches the bit
    ClockRelease,
}

/// Sub-steps of the acknowledge clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckStep {
    /// Pull clock low
    ClockLow,
    /// Let go of data so the display can pull it low
    DataRelease,
    /// Release clock
    ClockRelease,
    /// Sample data; low means acknowledged
    Sample,
    /// Pull clock low before a stop
    HoldClock,
    /// Pull data low before a stop
    HoldData,
}

/// Sub-steps of a stop condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopStep {
    /// Pull clock low
    ClockLow,
    /// Pull data low
    DataLow,
    /// Release clock
    ClockRelease,
    /// Release data while clock is released
    DataRelease,
}

/// Position of the state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    /// No transfer in progress; the next step checks the bus
    #[default]
    Idle,
    /// Clocking the bus to free a stuck device
    BusReset(ResetStep),
    /// Start condition
    Start(StartStep),
    /// Writing payload bits
    WriteBit(BitStep),
    /// Acknowledge clock after a byte
    Ack(AckStep),
    /// Stop condition
    Stop(StopStep),
}

impl Stage {
    /// Numeric stage code, as used in trace output
    ///
    /// Phases are numbered in tens: idle 0, bus reset 10, start 20, write bit
    /// 30, acknowledge 40, stop 50, with the sub-step in the units digit.
    pub const fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::BusReset(step) => 10 + step as u8,
            Self::Start(step) => 20 + step as u8,
            Self::WriteBit(step) => 30 + step as u8,
            Self::Ack(step) => 40 + step as u8,
            Self::Stop(step) => 50 + step as u8,
        }
    }
}

/// Reason a session was abandoned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// A line was still held low after a bus reset
    BusStuck,
    /// Clock stayed low after being released
    ClockHeld,
    /// Data stayed low after being released
    DataHeld,
    /// Display did not acknowledge a byte
    Nack,
    /// A line could not be configured or read
    Pin,
}

/// Result of one micro-step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The session needs more steps
    Active,
    /// The session is back at [`Stage::Idle`]
    Complete(Result<(), Fault>),
}

impl Progress {
    /// Whether the session needs more steps
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// One 9-byte transfer and its position on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    payload: [u8; PAYLOAD_LEN],
    bits_sent: u8,
    reset_pulses: u8,
    stage: Stage,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty, idle session
    pub const fn new() -> Self {
        Self {
            payload: [0; PAYLOAD_LEN],
            bits_sent: 0,
            reset_pulses: 0,
            stage: Stage::Idle,
        }
    }

    /// Load a payload and rewind to the start
    pub fn load(&mut self, payload: &[u8; PAYLOAD_LEN]) {
        self.payload = *payload;
        self.rewind();
    }

    /// Zero the payload and rewind to the start
    pub fn clear(&mut self) {
        self.payload = [0; PAYLOAD_LEN];
        self.rewind();
    }

    fn rewind(&mut self) {
        self.bits_sent = 0;
        self.reset_pulses = 0;
        self.stage = Stage::Idle;
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bits written so far, 0..=[`TOTAL_BITS`]
    pub fn bits_sent(&self) -> u8 {
        self.bits_sent
    }

    /// Loaded payload
    pub fn payload(&self) -> &[u8; PAYLOAD_LEN] {
        &self.payload
    }

    /// Value of the next bit to write
    fn next_bit(&self) -> bool {
        let byte = self.payload[usize::from(self.bits_sent / 8)];
        (byte >> (self.bits_sent % 8)) & 1 == 1
    }

    /// Whether a stop condition follows the byte just acknowledged
    fn at_frame_end(&self) -> bool {
        matches!(
            self.bits_sent,
            COMMAND_BYTE_BITS | FRAME_BYTES_BITS | TOTAL_BITS
        )
    }

    /// Whether a new start condition follows the stop just sent
    fn more_frames(&self) -> bool {
        matches!(self.bits_sent, COMMAND_BYTE_BITS | FRAME_BYTES_BITS)
    }

    fn abort(&mut self, fault: Fault) -> Progress {
        log::warn!(
            "tm1637: {:?} at stage {} after {} bits",
            fault,
            self.stage.code(),
            self.bits_sent
        );
        self.stage = Stage::Idle;
        Progress::Complete(Err(fault))
    }

    /// Perform one micro-step on the bus
    ///
    /// `bus_reset_pulses` is the number of clock pulses a bus reset emits before
    /// checking the lines again.
    pub fn step<L: GpioLine>(
        &mut self,
        clk: &mut BusPin<L>,
        dio: &mut BusPin<L>,
        bus_reset_pulses: u8,
    ) -> Progress {
        log::trace!("tm1637: stage {}", self.stage.code());
        match self.advance(clk, dio, bus_reset_pulses) {
            Ok(Stage::Idle) => {
                self.stage = Stage::Idle;
                Progress::Complete(Ok(()))
            }
            Ok(next) => {
                self.stage = next;
                Progress::Active
            }
            Err(fault) => self.abort(fault),
        }
    }

    /// Run the current stage and return the next one
    ///
    /// Only a finished transfer leads back to [`Stage::Idle`].
    fn advance<L: GpioLine>(
        &mut self,
        clk: &mut BusPin<L>,
        dio: &mut BusPin<L>,
        bus_reset_pulses: u8,
    ) -> Result<Stage, Fault> {
        let next = match self.stage {
            Stage::Idle => {
                if pin(clk.release())? && pin(dio.release())? {
                    Stage::Start(StartStep::DataLow)
                } else {
                    log::debug!("tm1637: bus busy, resetting");
                    Stage::BusReset(ResetStep::ClockLow)
                }
            }

            Stage::BusReset(ResetStep::ClockLow) => {
                pin(clk.assert_low())?;
                Stage::BusReset(ResetStep::DataLow)
            }
            Stage::BusReset(ResetStep::DataLow) => {
                pin(dio.assert_low())?;
                Stage::BusReset(ResetStep::ClockRelease)
            }
            Stage::BusReset(ResetStep::ClockRelease) => {
                pin(clk.release())?;
                Stage::BusReset(ResetStep::DataRelease)
            }
            Stage::BusReset(ResetStep::DataRelease) => {
                pin(dio.release())?;
                self.reset_pulses += 1;
                if self.reset_pulses >= bus_reset_pulses {
                    self.reset_pulses = 0;
                    Stage::BusReset(ResetStep::Verify)
                } else {
                    Stage::BusReset(ResetStep::ClockLow)
                }
            }
            Stage::BusReset(ResetStep::Verify) => {
                if !(pin(clk.release())? && pin(dio.release())?) {
                    return Err(Fault::BusStuck);
                }
                Stage::Start(StartStep::DataLow)
            }

            Stage::Start(StartStep::DataLow) => {
                pin(dio.assert_low())?;
                Stage::Start(StartStep::ClockLow)
            }
            Stage::Start(StartStep::ClockLow) => {
                pin(clk.assert_low())?;
                Stage::WriteBit(BitStep::ClockLow)
            }

            Stage::WriteBit(BitStep::ClockLow) => {
                pin(clk.assert_low())?;
                Stage::WriteBit(BitStep::Drive)
            }
            Stage::WriteBit(BitStep::Drive) => {
                if self.next_bit() {
                    if !pin(dio.release())? {
                        return Err(Fault::DataHeld);
                    }
                } else {
                    pin(dio.assert_low())?;
                }
                Stage::WriteBit(BitStep::ClockRelease)
            }
            Stage::WriteBit(BitStep::ClockRelease) => {
                self.bits_sent += 1;
                if !pin(clk.release())? {
                    return Err(Fault::ClockHeld);
                }
                if self.bits_sent % 8 == 0 {
                    Stage::Ack(AckStep::ClockLow)
                } else {
                    Stage::WriteBit(BitStep::ClockLow)
                }
            }

            Stage::Ack(AckStep::ClockLow) => {
                pin(clk.assert_low())?;
                Stage::Ack(AckStep::DataRelease)
            }
            Stage::Ack(AckStep::DataRelease) => {
                pin(dio.release())?;
                Stage::Ack(AckStep::ClockRelease)
            }
            Stage::Ack(AckStep::ClockRelease) => {
                if !pin(clk.release())? {
                    return Err(Fault::ClockHeld);
                }
                Stage::Ack(AckStep::Sample)
            }
            Stage::Ack(AckStep::Sample) => {
                if pin(dio.release())? {
                    return Err(Fault::Nack);
                }
                if self.at_frame_end() {
                    Stage::Ack(AckStep::HoldClock)
                } else {
                    Stage::WriteBit(BitStep::ClockLow)
                }
            }
            Stage::Ack(AckStep::HoldClock) => {
                pin(clk.assert_low())?;
                Stage::Ack(AckStep::HoldData)
            }
            Stage::Ack(AckStep::HoldData) => {
                pin(dio.assert_low())?;
                Stage::Stop(StopStep::ClockLow)
            }

            Stage::Stop(StopStep::ClockLow) => {
                pin(clk.assert_low())?;
                Stage::Stop(StopStep::DataLow)
            }
            Stage::Stop(StopStep::DataLow) => {
                pin(dio.assert_low())?;
                Stage::Stop(StopStep::ClockRelease)
            }
            Stage::Stop(StopStep::ClockRelease) => {
                if !pin(clk.release())? {
                    return Err(Fault::ClockHeld);
                }
                Stage::Stop(StopStep::DataRelease)
            }
            Stage::Stop(StopStep::DataRelease) => {
                if !pin(dio.release())? {
                    return Err(Fault::DataHeld);
                }
                if self.more_frames() {
                    Stage::Start(StartStep::DataLow)
                } else {
                    Stage::Idle
                }
            }
        };
        Ok(next)
    }
}

/// Map a GPIO error to [`Fault::Pin`]
fn pin<T, E: core::fmt::Debug>(result: Result<T, E>) -> Result<T, Fault> {
    result.map_err(|e| {
        log::warn!("tm1637: pin error: {:?}", e);
        Fault::Pin
    })
}
