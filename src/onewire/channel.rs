use std::io;
use std::time::Duration;

use crate::AResult;

/// Bounded wait for a single response byte.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Byte-oriented serial channel the single-wire protocol is bit-banged over.
/// 8 data bits, no parity, 1 stop bit, no flow control; `recv` returns
/// `Ok(None)` when the read timeout expires.
pub trait ByteChannel {
	fn set_baud_rate(&mut self, baud: u32) -> AResult<()>;
	fn send(&mut self, byte: u8) -> AResult<()>;
	fn recv(&mut self) -> AResult<Option<u8>>;
}

pub struct SerialChannel {
	port: Box<dyn serialport::SerialPort>,
}

impl SerialChannel {
	pub fn open(name: &str) -> AResult<SerialChannel> {
		with_context!(("couldn't open serial port {}", name), {
			let port = serialport::new(name, super::BAUD_DATA)
				.data_bits(serialport::DataBits::Eight)
				.parity(serialport::Parity::None)
				.stop_bits(serialport::StopBits::One)
				.flow_control(serialport::FlowControl::None)
				.timeout(READ_TIMEOUT)
				.open()?;
			debug!("opened serial port {}", name);
			Ok(SerialChannel { port })
		})
	}
}

impl ByteChannel for SerialChannel {
	fn set_baud_rate(&mut self, baud: u32) -> AResult<()> {
		self.port.set_baud_rate(baud)?;
		Ok(())
	}

	fn send(&mut self, byte: u8) -> AResult<()> {
		io::Write::write_all(&mut self.port, &[byte])?;
		Ok(())
	}

	fn recv(&mut self) -> AResult<Option<u8>> {
		let mut buf = [0u8; 1];
		match io::Read::read(&mut self.port, &mut buf) {
			Ok(0) => Ok(None),
			Ok(_) => Ok(Some(buf[0])),
			Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
			Err(e) => Err(e.into()),
		}
	}
}

/// Names of the serial ports the OS knows about, for the selection menu.
pub fn list_port_names() -> AResult<Vec<String>> {
	let ports = serialport::available_ports()?;
	Ok(ports.into_iter().map(|p| p.port_name).collect())
}
