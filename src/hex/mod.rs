//! Intel-HEX style text records, restricted to what the charger images use:
//!
//! `:LLOOOOTT<payload>CC`
//!
//! - `LL`: payload byte count
//! - `OOOO`: 16-bit offset, big endian
//! - `TT`: record type, 0x00 (data) or 0x01 (end of file)
//! - `CC`: two's complement mod-256 sum over {LL, OOOO-hi, OOOO-lo, TT, payload}
//!
//! All hex digits are emitted uppercase; any chunking is accepted on input.

use crate::image::EEPROM_SIZE;
use crate::AResult;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum FormatError {
	#[fail(display = "line doesn't start with record marker ':'")]
	NoMarker,
	#[fail(display = "record line truncated")]
	Truncated,
	#[fail(display = "invalid hex digits in record")]
	InvalidHex,
	#[fail(display = "unsupported record type 0x{:02x}", _0)]
	UnknownRecordType(u8),
	#[fail(display = "record range {}+{} exceeds the 128-byte image", offset, length)]
	OutOfRange { offset: u16, length: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
	Data,
	EndOfFile,
}

impl RecordType {
	fn from_code(code: u8) -> Result<RecordType, FormatError> {
		match code {
			0x00 => Ok(RecordType::Data),
			0x01 => Ok(RecordType::EndOfFile),
			other => Err(FormatError::UnknownRecordType(other)),
		}
	}

	fn code(self) -> u8 {
		match self {
			RecordType::Data => 0x00,
			RecordType::EndOfFile => 0x01,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRecord {
	pub length: u8,
	pub offset: u16,
	pub record_type: RecordType,
	pub payload: Vec<u8>,
	pub checksum: u8,
}

fn hex_field(line: &str, pos: usize, digits: usize) -> Result<u32, FormatError> {
	let s = line.get(pos..pos + digits).ok_or(FormatError::Truncated)?;
	u32::from_str_radix(s, 16).map_err(|_| FormatError::InvalidHex)
}

fn record_checksum(length: u8, offset: u16, type_code: u8, payload: &[u8]) -> u8 {
	let mut sum = length
		.wrapping_add((offset >> 8) as u8)
		.wrapping_add(offset as u8)
		.wrapping_add(type_code);
	for b in payload {
		sum = sum.wrapping_add(*b);
	}
	sum.wrapping_neg()
}

pub fn decode_record(line: &str) -> Result<HexRecord, FormatError> {
	let line = line.trim_end();
	if !line.starts_with(':') {
		return Err(FormatError::NoMarker);
	}
	let length = hex_field(line, 1, 2)? as u8;
	let offset = hex_field(line, 3, 4)? as u16;
	let record_type = RecordType::from_code(hex_field(line, 7, 2)? as u8)?;

	let mut payload = Vec::with_capacity(length as usize);
	for i in 0..length as usize {
		payload.push(hex_field(line, 9 + 2 * i, 2)? as u8);
	}
	let checksum = hex_field(line, 9 + 2 * length as usize, 2)? as u8;

	Ok(HexRecord {
		length,
		offset,
		record_type,
		payload,
		checksum,
	})
}

pub fn encode_record(record: &HexRecord) -> String {
	let mut line = format!(
		":{:02X}{:04X}{:02X}",
		record.length,
		record.offset,
		record.record_type.code(),
	);
	for b in &record.payload {
		line.push_str(&format!("{:02X}", b));
	}
	line.push_str(&format!("{:02X}", record.checksum));
	line
}

/// Decode a whole image from record lines. Data payloads are applied at their
/// offsets over a 0xFF-filled buffer; decoding stops at the first end-of-file
/// record. Any malformed line aborts the whole load.
pub fn decode_image<'a, I>(lines: I) -> Result<[u8; EEPROM_SIZE], FormatError>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut data = [0xFFu8; EEPROM_SIZE];
	for line in lines {
		let record = decode_record(line)?;
		match record.record_type {
			RecordType::EndOfFile => break,
			RecordType::Data => {
				let offset = record.offset as usize;
				if offset + record.payload.len() > EEPROM_SIZE {
					return Err(FormatError::OutOfRange {
						offset: record.offset,
						length: record.length,
					});
				}
				data[offset..offset + record.payload.len()]
					.copy_from_slice(&record.payload);
			},
		}
	}
	Ok(data)
}

/// Encode a whole image: one 16-byte data record per chunk, offsets 0..127 in
/// order, followed by the end-of-file record.
pub fn encode_image(image: &[u8; EEPROM_SIZE]) -> String {
	let mut out = String::new();
	for (i, chunk) in image.chunks(16).enumerate() {
		let offset = (i * 16) as u16;
		let record = HexRecord {
			length: chunk.len() as u8,
			offset,
			record_type: RecordType::Data,
			payload: chunk.to_vec(),
			checksum: record_checksum(chunk.len() as u8, offset, 0x00, chunk),
		};
		out.push_str(&encode_record(&record));
		out.push('\n');
	}
	out.push_str(":00000001FF\n");
	out
}

pub fn load_image_file(path: &str) -> AResult<[u8; EEPROM_SIZE]> {
	with_context!(("couldn't load image file {}", path), {
		let contents = std::fs::read_to_string(path)?;
		Ok(decode_image(contents.lines())?)
	})
}

pub fn save_image_file(path: &str, image: &[u8; EEPROM_SIZE]) -> AResult<()> {
	with_context!(("couldn't save image file {}", path), {
		std::fs::write(path, encode_image(image))?;
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_data_record() {
		let record = decode_record(":0400000044454C4CDB").unwrap();
		assert_eq!(record.length, 4);
		assert_eq!(record.offset, 0);
		assert_eq!(record.record_type, RecordType::Data);
		assert_eq!(record.payload, b"DELL");
		assert_eq!(record.checksum, 0xDB);
	}

	#[test]
	fn stored_checksum_is_not_verified_on_load() {
		// bogus trailing checksum, still loads
		let record = decode_record(":0400000044454C4C4A").unwrap();
		assert_eq!(record.payload, b"DELL");
		assert_eq!(record.checksum, 0x4A);
	}

	#[test]
	fn decode_end_of_file_record() {
		let record = decode_record(":00000001FF").unwrap();
		assert_eq!(record.record_type, RecordType::EndOfFile);
		assert!(record.payload.is_empty());
	}

	#[test]
	fn decode_rejects_malformed_lines() {
		assert_eq!(decode_record("0400000044454C4C4A"), Err(FormatError::NoMarker));
		assert_eq!(decode_record(":04000000"), Err(FormatError::Truncated));
		assert_eq!(decode_record(":0G00000000"), Err(FormatError::InvalidHex));
		assert_eq!(
			decode_record(":00000002FE"),
			Err(FormatError::UnknownRecordType(0x02))
		);
	}

	#[test]
	fn decode_image_applies_payload_and_stops_at_eof() {
		let lines = vec![":0400000044454C4C4A", ":00000001FF", "garbage after eof"];
		let data = decode_image(lines).unwrap();
		assert_eq!(&data[0..4], b"DELL");
		assert!(data[4..].iter().all(|b| *b == 0xFF));
	}

	#[test]
	fn decode_image_rejects_out_of_range_record() {
		// 4 bytes at offset 126 would run past the end
		let line = format!(
			":{:02X}{:04X}00{}{:02X}",
			4,
			126,
			"AABBCCDD",
			record_checksum(4, 126, 0, &[0xAA, 0xBB, 0xCC, 0xDD])
		);
		assert_eq!(
			decode_image(vec![line.as_str()]),
			Err(FormatError::OutOfRange { offset: 126, length: 4 })
		);
	}

	#[test]
	fn decode_image_aborts_on_any_bad_line() {
		let lines = vec![":0400000044454C4C4A", "not a record", ":00000001FF"];
		assert!(decode_image(lines).is_err());
	}

	#[test]
	fn encode_image_emits_full_chunked_records() {
		let image = [0xFFu8; EEPROM_SIZE];
		let text = encode_image(&image);
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines.len(), 9);
		assert_eq!(lines[0], ":10000000FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00");
		assert_eq!(lines[7], ":10007000FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF90");
		assert_eq!(lines[8], ":00000001FF");
	}

	#[test]
	fn image_round_trip() {
		let mut image = [0u8; EEPROM_SIZE];
		for (i, b) in image.iter_mut().enumerate() {
			*b = (i as u8).wrapping_mul(7).wrapping_add(3);
		}
		let text = encode_image(&image);
		let decoded = decode_image(text.lines()).unwrap();
		assert_eq!(&decoded[..], &image[..]);
	}

	#[test]
	fn record_round_trip_normalizes_case() {
		let record = decode_record(":03001000616263c7").unwrap();
		let encoded = encode_record(&record);
		assert_eq!(encoded, ":03001000616263C7");
		assert_eq!(decode_record(&encoded).unwrap(), record);
	}
}
