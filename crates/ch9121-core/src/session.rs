//! Configuration-mode session
//!
//! A [`ConfigSession`] owns the serial transport, the CFG0 mode pin and a
//! delay source for as long as it lives. It tracks whether the chip is in
//! configuration mode and performs single request/response round trips.
//! [`ConfigReader`](crate::ConfigReader) and
//! [`ConfigWriter`](crate::ConfigWriter) are built on top of it.
//!
//! ```text
//!            enter()                 exit()
//!   Idle  -----------> Configuring -----------> Idle
//!         drain rx,                 de-assert pin,
//!         assert pin, settle        settle
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};
use crate::protocol::{self, Response, MAX_RESPONSE_LEN};
use crate::transport::Transport;

/// Upper bound on receive-buffer reads while draining stale bytes
const MAX_DRAIN_READS: usize = 64;

/// Timing and pin options for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Wait after every mode pin change, in milliseconds
    pub settle_ms: u32,
    /// Interval between response polls, in milliseconds
    pub poll_interval_ms: u32,
    /// Give up on a response after this long (`None` waits forever)
    pub response_timeout_ms: Option<u32>,
    /// Configuration mode is selected by driving the pin low
    pub mode_pin_active_low: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            poll_interval_ms: 10,
            response_timeout_ms: Some(1000),
            mode_pin_active_low: true,
        }
    }
}

impl SessionConfig {
    /// Set the settle interval
    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Set the response poll interval
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the response timeout (`None` waits forever)
    pub fn with_response_timeout_ms(mut self, ms: Option<u32>) -> Self {
        self.response_timeout_ms = ms;
        self
    }

    /// Set the mode pin polarity
    pub fn with_active_low(mut self, active_low: bool) -> Self {
        self.mode_pin_active_low = active_low;
        self
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Mode pin inactive, chip bridging data
    Idle,
    /// Mode pin asserted, chip accepting commands
    Configuring,
}

/// Exclusive handle on the chip's configuration interface
pub struct ConfigSession<T, P, D> {
    transport: T,
    pin: P,
    delay: D,
    config: SessionConfig,
    state: SessionState,
}

impl<T, P, D> ConfigSession<T, P, D>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    /// Create an idle session
    ///
    /// Nothing is sent and the pin is not touched until [`enter`](Self::enter).
    pub fn new(transport: T, pin: P, delay: D, config: SessionConfig) -> Self {
        Self {
            transport,
            pin,
            delay,
            config,
            state: SessionState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether requests may be issued
    pub fn is_configuring(&self) -> bool {
        self.state == SessionState::Configuring
    }

    /// Session options
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Put the chip into configuration mode
    ///
    /// Stale bytes left in the receive buffer are discarded first so they
    /// cannot be mistaken for the first response.
    pub fn enter(&mut self) -> Result<()> {
        if self.is_configuring() {
            return Err(Error::AlreadyConfiguring);
        }

        let drained = self.drain()?;
        if drained > 0 {
            log::debug!("ch9121: Discarded {} stale bytes", drained);
        }

        self.drive_mode_pin(true)?;
        self.delay.delay_ms(self.config.settle_ms);
        self.state = SessionState::Configuring;
        log::debug!("ch9121: Entered configuration mode");

        Ok(())
    }

    /// Release the mode pin and return to idle
    ///
    /// Does nothing if the session is already idle.
    pub fn exit(&mut self) -> Result<()> {
        if !self.is_configuring() {
            return Ok(());
        }

        // Idle only once the pin is actually released
        self.drive_mode_pin(false)?;
        self.state = SessionState::Idle;
        self.delay.delay_ms(self.config.settle_ms);
        log::debug!("ch9121: Left configuration mode");

        Ok(())
    }

    /// Send a read request and wait for a reply of `expected` bytes
    pub fn round_trip(&mut self, command: u8, expected: usize) -> Result<Response> {
        self.transact(&protocol::encode_request(command), expected)
    }

    /// Send an already-encoded frame and wait for a reply of `expected` bytes
    ///
    /// Bytes left over from an earlier exchange are discarded before the
    /// frame goes out. The reply may arrive in any number of pieces; it is
    /// collected until `expected` bytes are in or the response timeout
    /// expires, in which case a partial reply is returned as-is for the
    /// decoder to reject.
    pub fn transact(&mut self, frame: &[u8], expected: usize) -> Result<Response> {
        if !self.is_configuring() {
            return Err(Error::NotConfiguring);
        }

        let command = frame.get(2).copied().unwrap_or_default();
        let stale = self.drain()?;
        if stale > 0 {
            log::debug!(
                "ch9121: Discarded {} stale bytes before command 0x{:02X}",
                stale,
                command
            );
        }

        log::trace!("ch9121: -> {:02X?}", frame);
        self.transport.write(frame)?;

        let response = self.await_response(command, expected)?;
        log::trace!("ch9121: <- {:02X?}", &response[..]);
        Ok(response)
    }

    /// Hand back the transport, pin and delay
    pub fn release(self) -> (T, P, D) {
        (self.transport, self.pin, self.delay)
    }

    /// Poll until `expected` bytes have been collected or the timeout expires
    fn await_response(&mut self, command: u8, expected: usize) -> Result<Response> {
        let expected = expected.clamp(1, MAX_RESPONSE_LEN);
        let step = self.config.poll_interval_ms.max(1);
        let mut waited_ms: u32 = 0;
        let mut response = Response::new();

        loop {
            self.collect(&mut response)?;
            if response.len() >= expected {
                return Ok(response);
            }

            if let Some(limit) = self.config.response_timeout_ms {
                if waited_ms >= limit {
                    if response.is_empty() {
                        log::warn!(
                            "ch9121: No response to command 0x{:02X} after {} ms",
                            command,
                            waited_ms
                        );
                        return Err(Error::ResponseTimeout { command });
                    }
                    log::warn!(
                        "ch9121: Short response to command 0x{:02X}: {} of {} bytes",
                        command,
                        response.len(),
                        expected
                    );
                    return Ok(response);
                }
            }

            self.delay.delay_ms(step);
            waited_ms = waited_ms.saturating_add(step);
        }
    }

    /// Append everything the transport has ready, up to the buffer capacity
    fn collect(&mut self, response: &mut Response) -> Result<()> {
        let mut buf = [0u8; MAX_RESPONSE_LEN];

        while response.len() < MAX_RESPONSE_LEN && self.transport.bytes_available()? > 0 {
            let room = MAX_RESPONSE_LEN - response.len();
            let n = self.transport.read_available(&mut buf[..room])?;
            if n == 0 {
                break;
            }
            // n <= room, so this cannot overflow
            let total = response.len() + n;
            response
                .extend_from_slice(&buf[..n])
                .map_err(|()| Error::MalformedResponse {
                    expected: MAX_RESPONSE_LEN,
                    actual: total,
                })?;
        }

        Ok(())
    }

    fn drain(&mut self) -> Result<usize> {
        let mut scratch = [0u8; MAX_RESPONSE_LEN];
        let mut total = 0;

        for _ in 0..MAX_DRAIN_READS {
            if self.transport.bytes_available()? == 0 {
                break;
            }
            let n = self.transport.read_available(&mut scratch)?;
            if n == 0 {
                break;
            }
            total += n;
        }

        Ok(total)
    }

    fn drive_mode_pin(&mut self, asserted: bool) -> Result<()> {
        let low = asserted == self.config.mode_pin_active_low;
        let result = if low {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };

        result.map_err(|e| {
            log::error!("ch9121: Failed to drive mode pin: {:?}", e);
            Error::ModePin
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_session, PinLevel};
    use std::vec;

    #[test]
    fn test_request_while_idle_fails() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        assert_eq!(session.round_trip(0x61, 4), Err(Error::NotConfiguring));
        assert!(chip.frames().is_empty());
    }

    #[test]
    fn test_enter_exit_pin_levels() {
        let (mut session, chip) = mock_session(SessionConfig::default());

        session.enter().unwrap();
        assert_eq!(session.state(), SessionState::Configuring);
        assert_eq!(chip.pin_levels(), vec![PinLevel::Low]);

        session.exit().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(chip.pin_levels(), vec![PinLevel::Low, PinLevel::High]);

        // Two settle waits, nothing sent
        assert_eq!(chip.elapsed_ms(), 20);
        assert!(chip.frames().is_empty());
        assert_eq!(chip.pending_rx(), 0);
    }

    #[test]
    fn test_active_high_pin() {
        let (mut session, chip) = mock_session(SessionConfig::default().with_active_low(false));
        session.enter().unwrap();
        session.exit().unwrap();
        assert_eq!(chip.pin_levels(), vec![PinLevel::High, PinLevel::Low]);
    }

    #[test]
    fn test_enter_twice_fails() {
        let (mut session, _chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();
        assert_eq!(session.enter(), Err(Error::AlreadyConfiguring));
    }

    #[test]
    fn test_exit_while_idle_is_noop() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.exit().unwrap();
        assert!(chip.pin_levels().is_empty());
    }

    #[test]
    fn test_enter_drains_stale_bytes() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        chip.preload_rx(&[0xDE, 0xAD, 0xBE, 0xEF]);

        session.enter().unwrap();
        assert_eq!(chip.pending_rx(), 0);

        chip.queue_reply(&[10, 0, 0, 5]);
        let response = session.round_trip(0x61, 4).unwrap();
        assert_eq!(&response[..], &[10, 0, 0, 5]);
    }

    #[test]
    fn test_round_trip_frames_request() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();

        chip.queue_reply(&[0x01]);
        session.round_trip(0x60, 1).unwrap();
        assert_eq!(chip.frames(), vec![vec![0x57, 0xAB, 0x60]]);
    }

    #[test]
    fn test_round_trip_polls_until_data() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();
        let after_enter = chip.elapsed_ms();

        chip.queue_delayed_reply(3, &[0x08]);
        let response = session.round_trip(0x73, 1).unwrap();
        assert_eq!(&response[..], &[0x08]);

        // Three empty polls, 10 ms apart
        assert_eq!(chip.elapsed_ms() - after_enter, 30);
    }

    #[test]
    fn test_round_trip_times_out() {
        let config = SessionConfig::default()
            .with_poll_interval_ms(10)
            .with_response_timeout_ms(Some(50));
        let (mut session, chip) = mock_session(config);
        session.enter().unwrap();
        let after_enter = chip.elapsed_ms();

        chip.queue_silence();
        assert_eq!(
            session.round_trip(0x61, 4),
            Err(Error::ResponseTimeout { command: 0x61 })
        );
        assert_eq!(chip.elapsed_ms() - after_enter, 50);

        // Session stays usable after a timeout
        assert!(session.is_configuring());
    }

    #[test]
    fn test_round_trip_reassembles_split_reply() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();

        // Two bytes per read
        chip.set_chunk_size(Some(2));
        chip.queue_reply(&[192, 168, 1, 51]);
        chip.queue_reply(&[255, 255, 255, 0]);

        let ip = session.round_trip(0x61, 4).unwrap();
        assert_eq!(&ip[..], &[192, 168, 1, 51]);
        let mask = session.round_trip(0x62, 4).unwrap();
        assert_eq!(&mask[..], &[255, 255, 255, 0]);
        assert_eq!(chip.pending_rx(), 0);
    }

    #[test]
    fn test_round_trip_waits_for_late_piece() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();

        // First half now, the rest only after two empty polls
        chip.queue_split_reply(&[0x00, 0x1A, 0x2B], 2, &[0x3C, 0x4D, 0x5E]);
        let mac = session.round_trip(0x81, 6).unwrap();
        assert_eq!(&mac[..], &[0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]);
    }

    #[test]
    fn test_leftover_bytes_do_not_leak_into_next_reply() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();

        // Chip sends more than was asked for
        chip.queue_reply(&[0x05, 0xEE, 0xEE]);
        let version = session.round_trip(0x01, 1).unwrap();
        assert_eq!(version[0], 0x05);

        chip.preload_rx(&[0xEE]);
        chip.queue_reply(&[10, 0, 0, 5]);
        let ip = session.round_trip(0x61, 4).unwrap();
        assert_eq!(&ip[..], &[10, 0, 0, 5]);
    }

    #[test]
    fn test_short_reply_returned_at_timeout() {
        let config = SessionConfig::default().with_response_timeout_ms(Some(50));
        let (mut session, chip) = mock_session(config);
        session.enter().unwrap();

        chip.queue_reply(&[1, 2, 3]);
        let response = session.round_trip(0x63, 4).unwrap();
        assert_eq!(&response[..], &[1, 2, 3]);
    }

    #[test]
    fn test_exit_retries_after_pin_failure() {
        let (mut session, chip) = mock_session(SessionConfig::default());
        session.enter().unwrap();

        chip.fail_next_pin_write();
        assert_eq!(session.exit(), Err(Error::ModePin));
        assert!(session.is_configuring());
        assert_eq!(chip.pin_levels(), vec![PinLevel::Low]);

        session.exit().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(chip.pin_levels(), vec![PinLevel::Low, PinLevel::High]);
    }

    #[test]
    fn test_release_returns_parts() {
        let (session, _chip) = mock_session(SessionConfig::default());
        let (_transport, _pin, _delay) = session.release();
    }
}
