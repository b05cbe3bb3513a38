/// CRC-16/ARC: polynomial 0xA001 (reflected 0x8005), initial value 0,
/// LSB-first bit processing, no final XOR.
///
/// The charger image stores this over its first 40 bytes, little-endian
/// at offsets 40/41.
pub fn crc16(data: &[u8]) -> u16 {
	let mut crc: u16 = 0;
	for byte in data {
		crc ^= u16::from(*byte);
		for _ in 0..8 {
			if crc & 1 != 0 {
				crc = (crc >> 1) ^ 0xA001;
			} else {
				crc >>= 1;
			}
		}
	}
	crc
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_bytes_have_zero_crc() {
		assert_eq!(crc16(&[0u8; 40]), 0x0000);
		assert_eq!(crc16(&[]), 0x0000);
	}

	#[test]
	fn check_value() {
		// standard CRC-16/ARC check input
		assert_eq!(crc16(b"123456789"), 0xBB3D);
	}

	#[test]
	fn default_image_header_matches_stored_checksum() {
		// the factory image stores 0x943D at offsets 40/41
		assert_eq!(crc16(b"DELL00AC045195023CN0CDF577243865Q27F2A05"), 0x943D);
	}
}
