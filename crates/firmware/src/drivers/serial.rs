//! Low-energy serial link: transmitter and framed receiver.
//!
//! [`SerialTx::start`] copies the frame into an internal buffer and blocks
//! [`SERIAL_EM`](crate::config::SERIAL_EM). [`SerialTx::on_tx_ready`] hands
//! out one byte per data-register-empty event; [`SerialTx::on_tx_complete`]
//! runs when the last bit has left the shift register, releases the block
//! and raises [`AppEvent::SERIAL_TX_DONE`].
//!
//! [`SerialRx`] collects command frames delimited by [`FRAME_START`] and
//! [`FRAME_SIGNAL`] (`#F?`, `#C?`). Bytes outside a frame are discarded,
//! mirroring a receiver that blocks input until the start character. While
//! listening it holds its energy mode so the receiver stays clocked; a
//! completed frame raises [`AppEvent::SERIAL_RX`].
//!
//! The callbacks can be interrupt bodies or be called from a polling loop.
//! The firmware binary polls USART3 from the main loop, so a transmit hold
//! spans one loop iteration rather than an `idle_step`; the receive hold
//! spans the whole time the receiver is listening.

use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use energy::{EnergyArbiter, EnergyMode, EventScheduler, Fatal};
use heapless::Vec;

use crate::config::AppEvent;

/// Reasons a transmission could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// A previous frame is still going out.
    Busy,
    /// The frame does not fit the transmit buffer.
    TooLong {
        /// Bytes offered.
        len: usize,
        /// Bytes the buffer holds.
        capacity: usize,
    },
    /// A received frame did not end before the buffer filled; the partial
    /// frame was dropped.
    FrameOverrun {
        /// Receive buffer size.
        capacity: usize,
    },
    /// The arbiter refused the block.
    Fatal(Fatal),
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "transmitter busy"),
            Self::TooLong { len, capacity } => {
                write!(f, "frame of {} bytes exceeds {}-byte buffer", len, capacity)
            }
            Self::FrameOverrun { capacity } => {
                write!(f, "received frame overran {}-byte buffer", capacity)
            }
            Self::Fatal(fatal) => write!(f, "{}", fatal),
        }
    }
}

impl From<Fatal> for SerialError {
    fn from(fatal: Fatal) -> Self {
        Self::Fatal(fatal)
    }
}

struct TxState<const N: usize> {
    buffer: Vec<u8, N>,
    next: usize,
    busy: bool,
}

/// Transmitter with an `N`-byte frame buffer.
pub struct SerialTx<'a, const N: usize> {
    arbiter: &'a EnergyArbiter,
    scheduler: &'a EventScheduler<AppEvent>,
    block_mode: EnergyMode,
    state: Mutex<CriticalSectionRawMutex, RefCell<TxState<N>>>,
}

impl<'a, const N: usize> SerialTx<'a, N> {
    /// Create an idle transmitter that holds `block_mode` while a frame is out.
    pub const fn new(
        arbiter: &'a EnergyArbiter,
        scheduler: &'a EventScheduler<AppEvent>,
        block_mode: EnergyMode,
    ) -> Self {
        Self {
            arbiter,
            scheduler,
            block_mode,
            state: Mutex::new(RefCell::new(TxState {
                buffer: Vec::new(),
                next: 0,
                busy: false,
            })),
        }
    }

    /// Queue `frame` for transmission and block the serial energy mode.
    ///
    /// Nothing is blocked if the frame is rejected.
    pub fn start(&self, frame: &[u8]) -> Result<(), SerialError> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.busy {
                return Err(SerialError::Busy);
            }
            let mut buffer = Vec::new();
            buffer
                .extend_from_slice(frame)
                .map_err(|_| SerialError::TooLong {
                    len: frame.len(),
                    capacity: N,
                })?;
            self.arbiter.block(self.block_mode)?;
            state.buffer = buffer;
            state.next = 0;
            state.busy = true;
            Ok(())
        })
    }

    /// Next byte for the data register, or `None` once the frame is drained.
    pub fn on_tx_ready(&self) -> Option<u8> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let byte = state.buffer.get(state.next).copied()?;
            state.next = state.next.saturating_add(1);
            Some(byte)
        })
    }

    /// Last bit left the shift register: release the block and raise the event.
    ///
    /// Spurious completions while idle are ignored.
    pub fn on_tx_complete(&self) {
        let finished = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if !state.busy {
                return false;
            }
            state.busy = false;
            state.buffer.clear();
            state.next = 0;
            self.arbiter.unblock(self.block_mode);
            true
        });
        if finished {
            self.scheduler.add(AppEvent::SERIAL_TX_DONE);
        }
    }

    /// `true` from `start` until the completion interrupt.
    pub fn is_busy(&self) -> bool {
        self.state.lock(|state| state.borrow().busy)
    }
}

// ── Receiver ────────────────────────────────────────────────────────────────

/// Character that opens a command frame.
pub const FRAME_START: u8 = b'#';

/// Character that closes a command frame.
pub const FRAME_SIGNAL: u8 = b'?';

#[derive(Clone, Copy, PartialEq, Eq)]
enum RxPhase {
    /// Receiver off: bytes are dropped and no block is held.
    Off,
    /// Waiting for [`FRAME_START`].
    Idle,
    /// Inside a frame, collecting the body.
    Receiving,
}

struct RxState<const N: usize> {
    phase: RxPhase,
    body: Vec<u8, N>,
    frame: Option<Vec<u8, N>>,
}

/// Framed receiver with an `N`-byte frame body buffer.
pub struct SerialRx<'a, const N: usize> {
    arbiter: &'a EnergyArbiter,
    scheduler: &'a EventScheduler<AppEvent>,
    block_mode: EnergyMode,
    state: Mutex<CriticalSectionRawMutex, RefCell<RxState<N>>>,
}

impl<'a, const N: usize> SerialRx<'a, N> {
    /// Create a receiver that is not yet listening.
    pub const fn new(
        arbiter: &'a EnergyArbiter,
        scheduler: &'a EventScheduler<AppEvent>,
        block_mode: EnergyMode,
    ) -> Self {
        Self {
            arbiter,
            scheduler,
            block_mode,
            state: Mutex::new(RefCell::new(RxState {
                phase: RxPhase::Off,
                body: Vec::new(),
                frame: None,
            })),
        }
    }

    /// Start listening for frames, blocking `block_mode` if not already
    /// listening.
    pub fn listen(&self) -> Result<(), Fatal> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.phase == RxPhase::Off {
                self.arbiter.block(self.block_mode)?;
                state.phase = RxPhase::Idle;
                state.body.clear();
            }
            Ok(())
        })
    }

    /// Stop listening and release the block. A partial frame is dropped; a
    /// completed frame stays available to [`take_frame`](Self::take_frame).
    pub fn stop(&self) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.phase != RxPhase::Off {
                state.phase = RxPhase::Off;
                state.body.clear();
                self.arbiter.unblock(self.block_mode);
            }
        });
    }

    /// `true` between `listen` and `stop`.
    pub fn is_listening(&self) -> bool {
        self.state.lock(|state| state.borrow().phase != RxPhase::Off)
    }

    /// `true` while a frame has started but not yet ended.
    pub fn in_frame(&self) -> bool {
        self.state
            .lock(|state| state.borrow().phase == RxPhase::Receiving)
    }

    /// Receive-data body: feed one received byte.
    ///
    /// A start character inside a frame restarts the frame. A body longer
    /// than `N` drops the frame and returns [`SerialError::FrameOverrun`];
    /// the receiver goes back to waiting for a start character.
    pub fn on_rx_byte(&self, byte: u8) -> Result<(), SerialError> {
        let completed = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            match state.phase {
                RxPhase::Off => Ok(false),
                RxPhase::Idle => {
                    if byte == FRAME_START {
                        state.body.clear();
                        state.phase = RxPhase::Receiving;
                    }
                    Ok(false)
                }
                RxPhase::Receiving => match byte {
                    FRAME_START => {
                        state.body.clear();
                        Ok(false)
                    }
                    FRAME_SIGNAL => {
                        let body = core::mem::take(&mut state.body);
                        state.frame = Some(body);
                        state.phase = RxPhase::Idle;
                        Ok(true)
                    }
                    _ => {
                        if state.body.push(byte).is_err() {
                            state.body.clear();
                            state.phase = RxPhase::Idle;
                            return Err(SerialError::FrameOverrun { capacity: N });
                        }
                        Ok(false)
                    }
                },
            }
        })?;

        if completed {
            self.scheduler.add(AppEvent::SERIAL_RX);
        }
        Ok(())
    }

    /// Body of the most recent completed frame, delimiters stripped.
    ///
    /// A frame completed before the previous one was taken replaces it.
    pub fn take_frame(&self) -> Option<Vec<u8, N>> {
        self.state.lock(|state| state.borrow_mut().frame.take())
    }
}
