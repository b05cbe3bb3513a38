use crate::image::{
	ImageStore,
	EEPROM_SIZE,
};
use crate::AResult;

use super::{
	BusError,
	ByteChannel,
	OneWire,
};

/// SKIP ROM, READ MEM, 16-bit start address 0 (little endian)
const READ_MEM: [u8; 4] = [0xCC, 0xF0, 0x00, 0x00];
/// SKIP ROM, WRITE MEM; followed by address (little endian) and data byte
const WRITE_MEM: [u8; 2] = [0xCC, 0x0F];

/// The slave frames the memory contents with one extra byte on each side.
const READ_FRAMING: usize = 2;

/// Read the whole EEPROM into `store`. Any fault aborts the transaction and
/// leaves the store byte-for-byte unchanged.
pub fn read_all<C>(link: &mut C, store: &mut ImageStore) -> AResult<()>
where
	C: ByteChannel + ?Sized,
{
	if !link.reset()? {
		return Err(BusError::NotPresent.into());
	}
	with_context!("couldn't send READ MEM command", link.write_bytes(&READ_MEM))?;
	info!("Reading EEPROM...");
	let response = with_context!(
		"couldn't read EEPROM contents",
		link.read_bytes(EEPROM_SIZE + READ_FRAMING)
	)?;
	store.replace(&response[1..1 + EEPROM_SIZE]);
	Ok(())
}

/// Write the whole store to the EEPROM, one byte per bus transaction. A
/// missing presence pulse aborts everything; a failed per-byte acknowledgment
/// is only reported and the remaining offsets are still written.
pub fn write_all<C>(link: &mut C, store: &ImageStore) -> AResult<()>
where
	C: ByteChannel + ?Sized,
{
	info!("Writing EEPROM...");
	for offset in 0..EEPROM_SIZE {
		let byte = store.as_bytes()[offset];
		with_context!(("EEPROM write failed at offset {}", offset), {
			if !link.reset()? {
				return Err(BusError::NotPresent.into());
			}
			let command = [
				WRITE_MEM[0],
				WRITE_MEM[1],
				offset as u8,
				(offset >> 8) as u8,
				byte,
			];
			link.write_bytes(&command)
		})?;
		match link.read_bit() {
			Ok(_) => {},
			Err(e) => warn!("write not acknowledged at offset {}: {}", offset, e),
		}
	}
	Ok(())
}
