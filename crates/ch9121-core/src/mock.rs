//! Scripted transport, pin and delay for unit tests

use core::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin};

use crate::error::{Error, Result};
use crate::session::{ConfigSession, SessionConfig};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PinLevel {
    Low,
    High,
}

enum Reply {
    /// Visible after this many empty polls
    Bytes(u32, Vec<u8>),
    /// First part visible at once, the rest after this many empty polls
    Split(Vec<u8>, u32, Vec<u8>),
    Silent,
}

/// Pin write failure injected by a test
#[derive(Debug)]
pub(crate) struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Default)]
struct State {
    frames: Vec<Vec<u8>>,
    replies: VecDeque<Reply>,
    pending: Option<(u32, Vec<u8>)>,
    rx: VecDeque<u8>,
    chunk: Option<usize>,
    pin: Vec<PinLevel>,
    fail_pin: bool,
    fail_write: bool,
    elapsed_ns: u64,
}

/// Test-side view of the mock chip
#[derive(Clone, Default)]
pub(crate) struct MockChip(Rc<RefCell<State>>);

impl MockChip {
    pub fn queue_reply(&self, bytes: &[u8]) {
        self.queue_delayed_reply(0, bytes);
    }

    pub fn queue_delayed_reply(&self, polls: u32, bytes: &[u8]) {
        self.0
            .borrow_mut()
            .replies
            .push_back(Reply::Bytes(polls, bytes.to_vec()));
    }

    pub fn queue_split_reply(&self, first: &[u8], polls: u32, rest: &[u8]) {
        self.0
            .borrow_mut()
            .replies
            .push_back(Reply::Split(first.to_vec(), polls, rest.to_vec()));
    }

    pub fn queue_silence(&self) {
        self.0.borrow_mut().replies.push_back(Reply::Silent);
    }

    pub fn preload_rx(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes.iter().copied());
    }

    pub fn set_chunk_size(&self, chunk: Option<usize>) {
        self.0.borrow_mut().chunk = chunk;
    }

    /// Make the next pin write fail without changing the level
    pub fn fail_next_pin_write(&self) {
        self.0.borrow_mut().fail_pin = true;
    }

    /// Make the next transport write fail
    pub fn fail_next_write(&self) {
        self.0.borrow_mut().fail_write = true;
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.borrow().frames.clone()
    }

    pub fn pin_levels(&self) -> Vec<PinLevel> {
        self.0.borrow().pin.clone()
    }

    pub fn pending_rx(&self) -> usize {
        self.0.borrow().rx.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.0.borrow().elapsed_ns / 1_000_000
    }
}

pub(crate) struct MockTransport(MockChip);
pub(crate) struct MockPin(MockChip);
pub(crate) struct MockDelay(MockChip);

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = (self.0).0.borrow_mut();
        if state.fail_write {
            state.fail_write = false;
            return Err(Error::TransportUnavailable);
        }
        state.frames.push(data.to_vec());
        match state.replies.pop_front() {
            Some(Reply::Bytes(polls, bytes)) => state.pending = Some((polls, bytes)),
            Some(Reply::Split(first, polls, rest)) => {
                state.rx.extend(first);
                state.pending = Some((polls, rest));
            }
            Some(Reply::Silent) | None => {}
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let mut state = (self.0).0.borrow_mut();
        if let Some((polls, bytes)) = state.pending.take() {
            if polls == 0 {
                state.rx.extend(bytes);
            } else {
                state.pending = Some((polls - 1, bytes));
            }
        }
        Ok(state.rx.len())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = (self.0).0.borrow_mut();
        let limit = state.chunk.unwrap_or(usize::MAX);
        let n = buf.len().min(state.rx.len()).min(limit);
        for slot in buf.iter_mut().take(n) {
            *slot = state.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl MockPin {
    fn drive(&mut self, level: PinLevel) -> core::result::Result<(), MockPinError> {
        let mut state = (self.0).0.borrow_mut();
        if state.fail_pin {
            state.fail_pin = false;
            return Err(MockPinError);
        }
        state.pin.push(level);
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> core::result::Result<(), MockPinError> {
        self.drive(PinLevel::Low)
    }

    fn set_high(&mut self) -> core::result::Result<(), MockPinError> {
        self.drive(PinLevel::High)
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        (self.0).0.borrow_mut().elapsed_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        (self.0).0.borrow_mut().elapsed_ns += ms as u64 * 1_000_000;
    }
}

pub(crate) type MockSession = ConfigSession<MockTransport, MockPin, MockDelay>;

pub(crate) fn mock_parts() -> (MockTransport, MockPin, MockDelay, MockChip) {
    let chip = MockChip::default();
    (
        MockTransport(chip.clone()),
        MockPin(chip.clone()),
        MockDelay(chip.clone()),
        chip,
    )
}

pub(crate) fn mock_session(config: SessionConfig) -> (MockSession, MockChip) {
    let (transport, pin, delay, chip) = mock_parts();
    (ConfigSession::new(transport, pin, delay, config), chip)
}
