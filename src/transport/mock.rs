use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::Transport;
use crate::error::ScopeError;

/// In-memory instrument for tests and offline development.
///
/// Every write and query is recorded in order. A write of the form
/// `HEADER value` stores `value` under the upper-cased header, and a later
/// `HEADER?` query echoes it back (`ON`/`OFF` read back as `1`/`0`, like the
/// instrument does). Scripted replies take precedence over echoed state.
///
/// ```
/// use rusty_mdo::{MockTransport, Transport};
///
/// let mut mock = MockTransport::new();
/// mock.write("CH1:SCAle 0.5")?;
/// assert_eq!(mock.query("CH1:SCAle?")?, "0.5\n");
/// assert_eq!(mock.writes(), ["CH1:SCAle 0.5"]);
/// # Ok::<(), rusty_mdo::ScopeError>(())
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    writes: Vec<String>,
    queries: Vec<String>,
    state: HashMap<String, String>,
    replies: HashMap<String, String>,
    raw: VecDeque<Vec<u8>>,
    timeout: Option<Duration>,
}

fn header_key(header: &str) -> String {
    header.trim().trim_end_matches('?').to_ascii_uppercase()
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply returned verbatim (plus terminator) whenever `command` is queried
    pub fn with_reply(mut self, command: &str, reply: &str) -> Self {
        self.set_reply(command, reply);
        self
    }

    pub fn set_reply(&mut self, command: &str, reply: &str) {
        self.replies.insert(header_key(command), reply.to_string());
    }

    /// Preload an instrument setting as if it had been written
    pub fn set_state(&mut self, header: &str, value: &str) {
        self.state.insert(header_key(header), value.to_string());
    }

    /// Queue a payload for the next [`Transport::read_raw`]
    pub fn push_raw(&mut self, data: impl Into<Vec<u8>>) {
        self.raw.push_back(data.into());
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.queries.clear();
    }
}

impl Transport for MockTransport {
    fn write(&mut self, command: &str) -> Result<(), ScopeError> {
        self.writes.push(command.to_string());
        if let Some((header, value)) = command.split_once(' ') {
            self.state.insert(header_key(header), value.trim().to_string());
        }
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, ScopeError> {
        self.queries.push(command.to_string());
        let key = header_key(command);

        if let Some(reply) = self.replies.get(&key) {
            return Ok(format!("{reply}\n"));
        }
        match self.state.get(&key) {
            Some(value) if value.eq_ignore_ascii_case("ON") => Ok("1\n".to_string()),
            Some(value) if value.eq_ignore_ascii_case("OFF") => Ok("0\n".to_string()),
            Some(value) => Ok(format!("{value}\n")),
            None => Err(ScopeError::Timeout),
        }
    }

    fn read_raw(&mut self, max_bytes: Option<usize>) -> Result<Vec<u8>, ScopeError> {
        let mut data = self.raw.pop_front().ok_or(ScopeError::Timeout)?;
        if let Some(limit) = max_bytes {
            data.truncate(limit);
        }
        Ok(data)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        self.timeout = Some(timeout);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_is_case_insensitive() {
        let mut mock = MockTransport::new();
        mock.write("sel:CH2 on").unwrap();
        assert_eq!(mock.query("SEL:CH2?").unwrap(), "1\n");
        mock.write("SEL:ch2 OFF").unwrap();
        assert_eq!(mock.query("sel:CH2?").unwrap(), "0\n");
    }

    #[test]
    fn test_scripted_reply_wins() {
        let mut mock = MockTransport::new().with_reply("*IDN?", "TEKTRONIX,MDO4104B-6,X,Y");
        mock.write("*IDN? ignored").unwrap();
        assert_eq!(mock.query("*IDN?").unwrap(), "TEKTRONIX,MDO4104B-6,X,Y\n");
        assert_eq!(mock.queries(), ["*IDN?"]);
    }

    #[test]
    fn test_preset_state_and_cleared_log() {
        let mut mock = MockTransport::new();
        mock.set_state("RF:REFLevel", "-25.0");
        mock.write("HOR:SCA 1e-3").unwrap();
        assert_eq!(mock.query("rf:reflevel?").unwrap(), "-25.0\n");

        mock.clear_log();
        assert!(mock.writes().is_empty());
        assert!(mock.queries().is_empty());
        assert_eq!(mock.query("HOR:SCA?").unwrap(), "1e-3\n");
    }

    #[test]
    fn test_unknown_query_times_out() {
        let mut mock = MockTransport::new();
        assert!(matches!(mock.query("HOR:SCA?"), Err(ScopeError::Timeout)));
    }

    #[test]
    fn test_raw_payloads_are_consumed_in_order() {
        let mut mock = MockTransport::new();
        mock.push_raw(b"first".to_vec());
        mock.push_raw(b"second".to_vec());
        assert_eq!(mock.read_raw(Some(3)).unwrap(), b"fir");
        assert_eq!(mock.read_raw(None).unwrap(), b"second");
        assert!(mock.read_raw(None).is_err());
    }
}
