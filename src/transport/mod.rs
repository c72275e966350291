use std::time::Duration;

use crate::error::ScopeError;

pub mod mock;
pub mod tcp;

pub use mock::MockTransport;
pub use tcp::{ConnectionConfig, TcpTransport, TcpTransportBuilder};

/// Blocking request/response link to an SCPI instrument.
///
/// Implementations only move text and bytes. Command formatting and reply
/// parsing live in [`crate::TekScope`].
pub trait Transport {
    /// Send a command that produces no reply
    fn write(&mut self, command: &str) -> Result<(), ScopeError>;

    /// Send a command and return its reply line, terminator included
    fn query(&mut self, command: &str) -> Result<String, ScopeError>;

    /// Read a raw reply.
    ///
    /// With `Some(n)` at most `n` bytes are returned. With `None` the read
    /// stops at the message terminator.
    fn read_raw(&mut self, max_bytes: Option<usize>) -> Result<Vec<u8>, ScopeError>;

    /// Timeout applied to every subsequent read
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, command: &str) -> Result<(), ScopeError> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String, ScopeError> {
        (**self).query(command)
    }

    fn read_raw(&mut self, max_bytes: Option<usize>) -> Result<Vec<u8>, ScopeError> {
        (**self).read_raw(max_bytes)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        (**self).set_timeout(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, command: &str) -> Result<(), ScopeError> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String, ScopeError> {
        (**self).query(command)
    }

    fn read_raw(&mut self, max_bytes: Option<usize>) -> Result<Vec<u8>, ScopeError> {
        (**self).read_raw(max_bytes)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        (**self).set_timeout(timeout)
    }
}
