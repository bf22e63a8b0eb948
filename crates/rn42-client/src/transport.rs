//! Byte-stream transports.
//!
//! The client never configures the link. Whoever opens the port owns baud
//! rate, flow control and per-read timeouts; the client only writes bytes,
//! polls for single bytes and asks how many are waiting.

use std::io;

/// A duplex byte stream to the module.
pub trait Transport {
    /// Write all bytes.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read one byte, or `None` if nothing arrived within the transport's
    /// read timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Number of bytes that can be read without waiting.
    fn available(&mut self) -> io::Result<usize>;

    /// Push buffered output to the device.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(feature = "serial")]
pub use serial::*;

#[cfg(feature = "serial")]
mod serial {
    use std::io::{self, Read, Write};
    use std::time::Duration;

    use serialport::SerialPort;
    use tracing::debug;

    use super::Transport;

    /// Default baud rate of the RN-42 UART.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// A serial port opened with `serialport`.
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open `port_name` at `baud_rate` with the given per-read timeout.
        pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> io::Result<Self> {
            debug!("Opening serial port {} @ {} baud", port_name, baud_rate);
            let port = serialport::new(port_name, baud_rate)
                .timeout(read_timeout)
                .open()?;
            Ok(SerialTransport { port })
        }

        /// Wrap a port opened elsewhere.
        pub fn from_port(port: Box<dyn SerialPort>) -> Self {
            SerialTransport { port }
        }

        /// Names of the serial ports present on this machine.
        pub fn available_ports() -> io::Result<Vec<String>> {
            Ok(serialport::available_ports()?
                .into_iter()
                .map(|p| p.port_name)
                .collect())
        }
    }

    impl Transport for SerialTransport {
        fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            Write::write_all(&mut self.port, data)
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            let mut byte = [0u8; 1];
            match self.port.read(&mut byte) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
                Err(e) => Err(e),
            }
        }

        fn available(&mut self) -> io::Result<usize> {
            Ok(self.port.bytes_to_read()? as usize)
        }

        fn flush(&mut self) -> io::Result<()> {
            Write::flush(&mut self.port)
        }
    }
}
