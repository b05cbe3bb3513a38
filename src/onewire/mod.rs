//! Single-wire bus master, approximated through UART byte values:
//!
//! - reset: probe byte 0xF0 at 9600 baud; an attached slave pulls the shared
//!   line low during some of the probe's bit times, so the byte the master's
//!   UART samples back reads below 0xF0
//! - bit write at 115200 baud: drive 0xFF for 1 / 0x00 for 0 and require the
//!   exact byte echoed back
//! - bit read at 115200 baud: drive the release byte 0xFF; the slave pulling
//!   the line low shows up as a sampled value of 0xFE or less
//!
//! Bytes travel least-significant bit first. A single slave is assumed (SKIP
//! ROM addressing only); any fault aborts the operation, retry is up to the
//! caller.

mod channel;
pub mod transport;

pub use self::channel::{
	ByteChannel,
	SerialChannel,
	list_port_names,
};

use crate::AResult;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum BusError {
	#[fail(display = "no response within the read timeout")]
	Timeout,
	#[fail(display = "drove 0x{:02x} but read back 0x{:02x}", sent, echoed)]
	Mismatch { sent: u8, echoed: u8 },
	#[fail(display = "no presence pulse after bus reset")]
	NotPresent,
}

const BAUD_RESET: u32 = 9600;
pub(crate) const BAUD_DATA: u32 = 115200;

const RESET_PROBE: u8 = 0xF0;
const RELEASE: u8 = 0xFF;

// fixed protocol constants, tied to the UART timing of the reference
// hardware; do not change without re-validating against a real device
const PRESENCE_LIMIT: u8 = 0xF0;
const READ_ONE_THRESHOLD: u8 = 0xFE;

pub trait OneWire: ByteChannel {
	/// Issue a bus reset and report whether a slave answered with a presence
	/// pulse. The channel is always left at the data bit rate afterwards;
	/// the caller must check the flag before any further bus traffic.
	fn reset(&mut self) -> AResult<bool> {
		self.set_baud_rate(BAUD_RESET)?;
		self.send(RESET_PROBE)?;
		let response = self.recv()?;
		self.set_baud_rate(BAUD_DATA)?;
		match response {
			None => {
				warn!("Timeout! Did you forget to connect diode RX -|>|- TX?");
				Ok(false)
			},
			Some(byte) => Ok(byte < PRESENCE_LIMIT),
		}
	}

	fn write_bit(&mut self, bit: bool) -> AResult<()> {
		let driven = if bit { 0xFF } else { 0x00 };
		self.send(driven)?;
		match self.recv()? {
			None => Err(BusError::Timeout.into()),
			Some(echoed) if echoed == driven => Ok(()),
			Some(echoed) => Err(BusError::Mismatch {
				sent: driven,
				echoed,
			}.into()),
		}
	}

	fn read_bit(&mut self) -> AResult<bool> {
		self.send(RELEASE)?;
		match self.recv()? {
			None => Err(BusError::Timeout.into()),
			Some(byte) => Ok(byte > READ_ONE_THRESHOLD),
		}
	}

	fn write_byte(&mut self, byte: u8) -> AResult<()> {
		for bit in 0..8 {
			self.write_bit(0 != byte & (1 << bit))?;
		}
		Ok(())
	}

	fn read_byte(&mut self) -> AResult<u8> {
		let mut value = 0u8;
		for bit in 0..8 {
			if self.read_bit()? {
				value |= 1 << bit;
			}
		}
		Ok(value)
	}

	fn write_bytes(&mut self, bytes: &[u8]) -> AResult<()> {
		for byte in bytes {
			self.write_byte(*byte)?;
		}
		Ok(())
	}

	fn read_bytes(&mut self, count: usize) -> AResult<Vec<u8>> {
		let mut bytes = Vec::with_capacity(count);
		for offset in 0..count {
			bytes.push(self.read_byte()?);
			// progress only, one row per 16 bytes
			if offset % 16 == 15 || offset + 1 == count {
				let row = offset / 16 * 16;
				debug!("read {:3}: {}", row, hex_row(&bytes[row..]));
			}
		}
		Ok(bytes)
	}
}

impl<C: ByteChannel + ?Sized> OneWire for C {}

fn hex_row(bytes: &[u8]) -> String {
	let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
	hex.join(" ")
}
