//! Named byte ranges of the identification image and their encodings.
//!
//! Text fields only ever contain ASCII digits and uppercase letters; decimal
//! fields only digits. Anything else in the range is an `InvalidByte` when
//! reading the field back.

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum DecodeError {
	#[fail(display = "field {}: invalid byte 0x{:02x} at image offset {}", field, byte, offset)]
	InvalidByte {
		field: &'static str,
		offset: usize,
		byte: u8,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
	/// digits and uppercase letters
	Text,
	/// fixed-width decimal integer
	Decimal,
	/// fixed-width decimal integer, value scaled by 0.1
	DecimalTenths,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
	pub name: &'static str,
	pub offset: usize,
	pub len: usize,
	pub encoding: Encoding,
}

pub const MANUFACTURER: FieldSpec = FieldSpec {
	name: "manufacturer",
	offset: 0,
	len: 4,
	encoding: Encoding::Text,
};

pub const ADAPTER_TYPE: FieldSpec = FieldSpec {
	name: "adapter type",
	offset: 4,
	len: 4,
	encoding: Encoding::Text,
};

pub const WATTS: FieldSpec = FieldSpec {
	name: "watts",
	offset: 8,
	len: 3,
	encoding: Encoding::Decimal,
};

pub const VOLTS: FieldSpec = FieldSpec {
	name: "volts",
	offset: 11,
	len: 3,
	encoding: Encoding::DecimalTenths,
};

pub const AMPS: FieldSpec = FieldSpec {
	name: "amps",
	offset: 14,
	len: 3,
	encoding: Encoding::DecimalTenths,
};

pub const SERIAL_NUMBER: FieldSpec = FieldSpec {
	name: "serial number",
	offset: 17,
	len: 23,
	encoding: Encoding::Text,
};

pub fn is_text_byte(byte: u8) -> bool {
	byte.is_ascii_digit() || byte.is_ascii_uppercase()
}

pub fn is_decimal_byte(byte: u8) -> bool {
	byte.is_ascii_digit()
}
