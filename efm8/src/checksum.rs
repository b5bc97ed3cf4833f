use crc_any::CRCu16;

/// Calculate the unsigned value whose binary matches the two's complement of the input, for `num_bits` bits.
pub fn twos_complement(value: u32, num_bits: u32) -> u32 {
    debug_assert!((1..=32).contains(&num_bits));

    let value = u64::from(value);
    let mask = 1_u64 << (num_bits - 1);
    let all_bits = (1_u64 << num_bits) - 1;

    ((value & mask).wrapping_sub(value & !mask) & all_bits) as u32
}

/// Intel HEX record checksum: two's complement of the byte sum.
pub fn line_checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0_u8, |acc, b| acc.wrapping_add(*b));

    twos_complement(u32::from(sum), 8) as u8
}

/// CITT-16, XModem. Big endian, as the bootloader expects it on the wire.
pub fn crc16(data: &[u8]) -> [u8; 2] {
    let mut xmodem = CRCu16::crc16xmodem();
    xmodem.digest(data);

    xmodem.get_crc().to_be_bytes()
}
