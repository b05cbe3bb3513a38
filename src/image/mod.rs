use crate::crc::crc16;

mod fields;

pub use self::fields::{
	is_text_byte,
	DecodeError,
	Encoding,
	FieldSpec,
	ADAPTER_TYPE,
	AMPS,
	MANUFACTURER,
	SERIAL_NUMBER,
	VOLTS,
	WATTS,
};

pub const EEPROM_SIZE: usize = 128;

/// byte range covered by the stored CRC
const CHECKSUM_RANGE: usize = 40;
/// offset of the little-endian stored CRC
const CHECKSUM_OFFSET: usize = 40;

/// Sole owner of the in-memory identification image. Everything that mutates
/// the image (field setters, the bus transport) goes through a `&mut` borrow
/// of this store.
pub struct ImageStore {
	data: [u8; EEPROM_SIZE],
}

impl Default for ImageStore {
	/// The factory image of a 45W Dell charger, used whenever loading an
	/// image file fails.
	fn default() -> Self {
		let mut data = [0xFFu8; EEPROM_SIZE];
		data[..CHECKSUM_RANGE].copy_from_slice(b"DELL00AC045195023CN0CDF577243865Q27F2A05");
		data[CHECKSUM_OFFSET] = 0x3D;
		data[CHECKSUM_OFFSET + 1] = 0x94;
		ImageStore { data }
	}
}

impl ImageStore {
	pub fn from_bytes(data: [u8; EEPROM_SIZE]) -> Self {
		ImageStore { data }
	}

	pub fn as_bytes(&self) -> &[u8; EEPROM_SIZE] {
		&self.data
	}

	/// Replace the whole image, e.g. after a successful bus read.
	pub fn replace(&mut self, data: &[u8]) {
		assert_eq!(data.len(), EEPROM_SIZE);
		self.data.copy_from_slice(data);
	}

	fn field_bytes(&self, field: &FieldSpec) -> &[u8] {
		&self.data[field.offset..field.offset + field.len]
	}

	/// Decode a text field. Every byte in the range must be a digit or an
	/// uppercase letter.
	pub fn text_field(&self, field: &FieldSpec) -> Result<String, DecodeError> {
		let mut out = String::with_capacity(field.len);
		for (i, byte) in self.field_bytes(field).iter().enumerate() {
			if !fields::is_text_byte(*byte) {
				return Err(DecodeError::InvalidByte {
					field: field.name,
					offset: field.offset + i,
					byte: *byte,
				});
			}
			out.push(*byte as char);
		}
		Ok(out)
	}

	/// Decode a fixed-width decimal field. Every byte in the range must be a
	/// digit. For `DecimalTenths` fields the returned value is in tenths.
	pub fn decimal_field(&self, field: &FieldSpec) -> Result<u32, DecodeError> {
		let mut value = 0u32;
		for (i, byte) in self.field_bytes(field).iter().enumerate() {
			if !fields::is_decimal_byte(*byte) {
				return Err(DecodeError::InvalidByte {
					field: field.name,
					offset: field.offset + i,
					byte: *byte,
				});
			}
			value = value * 10 + u32::from(byte - b'0');
		}
		Ok(value)
	}

	/// Overwrite a text field. The caller has validated length and character
	/// class; this writes exactly `field.len` bytes and nothing else.
	pub fn set_text_field(&mut self, field: &FieldSpec, value: &str) {
		debug_assert_eq!(value.len(), field.len);
		self.data[field.offset..field.offset + field.len]
			.copy_from_slice(value.as_bytes());
	}

	/// Overwrite a decimal field with the zero-padded fixed-width encoding of
	/// `value`. For `DecimalTenths` fields the caller passes tenths.
	pub fn set_decimal_field(&mut self, field: &FieldSpec, value: u32) {
		debug_assert!(value < 10u32.pow(field.len as u32));
		let encoded = format!("{:0width$}", value, width = field.len);
		self.data[field.offset..field.offset + field.len]
			.copy_from_slice(encoded.as_bytes());
	}

	/// Recompute the CRC over the identification header and store it
	/// little-endian. Returns whether the stored value changed.
	pub fn recompute_checksum(&mut self) -> bool {
		let crc = crc16(&self.data[..CHECKSUM_RANGE]);
		let stored = [self.data[CHECKSUM_OFFSET], self.data[CHECKSUM_OFFSET + 1]];
		if stored == crc.to_le_bytes() {
			return false;
		}
		self.data[CHECKSUM_OFFSET] = crc as u8;
		self.data[CHECKSUM_OFFSET + 1] = (crc >> 8) as u8;
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_image_fields_decode() {
		let store = ImageStore::default();
		assert_eq!(store.text_field(&MANUFACTURER).unwrap(), "DELL");
		assert_eq!(store.text_field(&ADAPTER_TYPE).unwrap(), "00AC");
		assert_eq!(store.decimal_field(&WATTS).unwrap(), 45);
		assert_eq!(store.decimal_field(&VOLTS).unwrap(), 195);
		assert_eq!(store.decimal_field(&AMPS).unwrap(), 23);
		assert_eq!(
			store.text_field(&SERIAL_NUMBER).unwrap(),
			"CN0CDF577243865Q27F2A05"
		);
	}

	#[test]
	fn default_image_checksum_is_current() {
		let mut store = ImageStore::default();
		assert!(!store.recompute_checksum());
	}

	#[test]
	fn loading_image_from_records_exposes_manufacturer() {
		let data =
			crate::hex::decode_image(vec![":0400000044454C4C4A", ":00000001FF"]).unwrap();
		let store = ImageStore::from_bytes(data);
		assert_eq!(store.text_field(&MANUFACTURER).unwrap(), "DELL");
	}

	#[test]
	fn single_out_of_class_byte_fails_decode() {
		let mut store = ImageStore::default();
		let mut data = *store.as_bytes();
		data[2] = b'l'; // lowercase is out of class
		store.replace(&data);
		assert_eq!(
			store.text_field(&MANUFACTURER),
			Err(DecodeError::InvalidByte {
				field: "manufacturer",
				offset: 2,
				byte: b'l',
			})
		);

		let mut data = *store.as_bytes();
		data[9] = b'A'; // letters are out of class for decimal fields
		store.replace(&data);
		assert!(store.decimal_field(&WATTS).is_err());
	}

	#[test]
	fn set_watts_writes_fixed_width_ascii() {
		let mut store = ImageStore::default();
		store.set_decimal_field(&WATTS, 65);
		assert_eq!(&store.as_bytes()[8..11], b"065");
		assert_eq!(store.decimal_field(&WATTS).unwrap(), 65);
	}

	#[test]
	fn setters_leave_adjacent_fields_alone() {
		let mut store = ImageStore::default();
		let before = *store.as_bytes();
		store.set_text_field(&ADAPTER_TYPE, "45W0");
		let after = *store.as_bytes();
		assert_eq!(&after[4..8], b"45W0");
		assert_eq!(&after[..4], &before[..4]);
		assert_eq!(&after[8..], &before[8..]);
	}

	#[test]
	fn recompute_checksum_stores_little_endian_crc() {
		let mut store = ImageStore::default();
		store.set_decimal_field(&WATTS, 65);
		assert!(store.recompute_checksum());
		let crc = crate::crc::crc16(&store.as_bytes()[..40]);
		assert_eq!(store.as_bytes()[40], crc as u8);
		assert_eq!(store.as_bytes()[41], (crc >> 8) as u8);
		// now current, second pass is a no-op
		assert!(!store.recompute_checksum());
	}

	#[test]
	fn all_zero_header_with_zero_stored_crc_is_untouched() {
		// CRC-16/ARC of 40 zero bytes is 0x0000
		let mut store = ImageStore::from_bytes([0u8; EEPROM_SIZE]);
		assert!(!store.recompute_checksum());
		assert!(store.as_bytes()[40..42].iter().all(|b| *b == 0));
	}
}
