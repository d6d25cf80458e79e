//! # CRC8-DVB-S2
//!
//! Checksum used by every CRSF frame, computed over type + payload
//! (everything between the length byte and the CRC itself).
//!
//! **Polynomial**: 0xD5, **Initial Value**: 0x00, no reflection, no final XOR.

const CRC8_POLY: u8 = 0xD5;

const CRC8_TABLE: [u8; 256] = build_table();

const fn crc8_byte(mut crc: u8) -> u8 {
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ CRC8_POLY
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = crc8_byte(i as u8);
        i += 1;
    }
    table
}

/// Calculate the CRC8-DVB-S2 checksum of `data`
///
/// # Examples
///
/// ```
/// use sbus_bridge::crsf::crc::crc8_dvb_s2;
///
/// assert_eq!(crc8_dvb_s2(b"123456789"), 0xBC);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}
