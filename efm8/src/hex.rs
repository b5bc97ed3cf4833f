use crate::checksum::line_checksum;
use crate::frame::BANK_SIZE;
use crate::Error;
use scroll::{ctx, Pread, Pwrite, BE};
use std::path::Path;

const DATA: u8 = 0x00;
const END_OF_FILE: u8 = 0x01;
const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;

/// Byte count, address, record type and checksum.
const RECORD_OVERHEAD: usize = 5;

/// Data records are always written 16 bytes per line.
const LINE_LENGTH: usize = 16;

/// Confirms the default extended linear address.
const EXTENDED_LINEAR_ADDRESS_ZERO: &str = ":020000040000FA";
const EOF_LINE: &str = ":00000001FF";

/// One line of an Intel HEX file, after the hex digits have been decoded.
#[derive(Debug, PartialEq)]
struct Record<'a> {
    address: u16,
    kind: u8,
    data: &'a [u8],
    checksum: u8,
}

impl<'a> Record<'a> {
    fn data(address: u16, data: &'a [u8]) -> Self {
        let mut record = Record {
            address,
            kind: DATA,
            data,
            checksum: 0,
        };
        record.checksum = record.expected_checksum();
        record
    }

    fn header(&self) -> [u8; 4] {
        let address = self.address.to_be_bytes();
        [self.data.len() as u8, address[0], address[1], self.kind]
    }

    fn expected_checksum(&self) -> u8 {
        let mut bytes = self.header().to_vec();
        bytes.extend_from_slice(self.data);
        line_checksum(&bytes)
    }

    fn verify(&self) -> Result<(), Error> {
        if self.checksum != self.expected_checksum() {
            log::debug!(
                "record @{:04X} checksum {:02X} != {:02X}",
                self.address,
                self.checksum,
                self.expected_checksum()
            );
            return Err(Error::BadChecksum);
        }
        Ok(())
    }
}

impl<'a> ctx::TryFromCtx<'a, scroll::Endian> for Record<'a> {
    type Error = Error;
    fn try_from_ctx(this: &'a [u8], be: scroll::Endian) -> Result<(Self, usize), Self::Error> {
        if this.len() < RECORD_OVERHEAD {
            return Err(Error::Unsupported("Truncated Intel HEX record"));
        }

        let mut offset = 0;
        let count = this.gread_with::<u8>(&mut offset, be)? as usize;
        if this.len() != RECORD_OVERHEAD + count {
            return Err(Error::Unsupported("Intel HEX record length mismatch"));
        }
        let address = this.gread_with::<u16>(&mut offset, be)?;
        let kind = this.gread_with::<u8>(&mut offset, be)?;
        let data = &this[offset..offset + count];
        offset += count;
        let checksum = this.gread_with::<u8>(&mut offset, be)?;

        Ok((
            Record {
                address,
                kind,
                data,
                checksum,
            },
            offset,
        ))
    }
}

impl<'a> ctx::TryIntoCtx<scroll::Endian> for &'a Record<'a> {
    type Error = scroll::Error;

    fn try_into_ctx(self, dst: &mut [u8], ctx: scroll::Endian) -> Result<usize, Self::Error> {
        let mut offset = 0;

        dst.gwrite_with(self.data.len() as u8, &mut offset, ctx)?;
        dst.gwrite_with(self.address, &mut offset, ctx)?;
        dst.gwrite_with(self.kind, &mut offset, ctx)?;
        for byte in self.data {
            dst.gwrite_with(*byte, &mut offset, ctx)?;
        }
        dst.gwrite_with(self.checksum, &mut offset, ctx)?;

        Ok(offset)
    }
}

/// Turns the digits after the leading ':' into bytes.
fn hex_bytes(digits: &str) -> Result<Vec<u8>, Error> {
    let digits = digits.as_bytes();
    if digits.is_empty() {
        return Err(Error::Unsupported("Empty Intel HEX record"));
    }
    if digits.len() % 2 != 0 {
        return Err(Error::Unsupported("Odd number of hex digits"));
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16);
            let low = (pair[1] as char).to_digit(16);
            match (high, low) {
                (Some(high), Some(low)) => Ok(((high << 4) | low) as u8),
                _ => Err(Error::Unsupported("Not a hex digit")),
            }
        })
        .collect()
}

/// Read simple Intel format HEX text into a byte array, zero padding any gaps.
///
/// Only linear files using the default 64KiB bank are understood: records
/// must not run backwards in address and any addressing record other than
/// the all-zero extended linear address is refused.
pub fn decode(text: &str) -> Result<Vec<u8>, Error> {
    let mut data = vec![];
    let mut address = 0_usize;

    for line in text.lines() {
        let line = line.trim_end();
        if !line.starts_with(':') {
            continue;
        }

        let bytes = hex_bytes(&line[1..])?;
        let record: Record = bytes.as_slice().pread_with(0, BE)?;

        match record.kind {
            END_OF_FILE => {
                record.verify()?;
                break;
            }
            EXTENDED_LINEAR_ADDRESS if record.data == [0, 0] => {
                record.verify()?;
                continue;
            }
            DATA => {}
            _ => return Err(Error::Unsupported("We only cope with very simple HEX files")),
        }

        let start = usize::from(record.address);
        if start < address {
            return Err(Error::Unsupported("We only cope with linear HEX files"));
        }
        if start + record.data.len() > BANK_SIZE {
            return Err(Error::Unsupported("Record runs past the 64KiB bank"));
        }
        record.verify()?;

        data.resize(start, 0);
        data.extend_from_slice(record.data);
        address = start + record.data.len();
    }

    if data.is_empty() {
        return Err(Error::Unsupported("No Intel HEX lines found"));
    }

    Ok(data)
}

/// Write a byte array as Intel format HEX text, 16 bytes per data record.
pub fn encode(image: &[u8]) -> Result<String, Error> {
    if image.len() > BANK_SIZE {
        return Err(Error::Unsupported("Image larger than a 64KiB bank"));
    }

    let mut text = String::from(EXTENDED_LINEAR_ADDRESS_ZERO);
    text.push('\n');

    for (index, line) in image.chunks(LINE_LENGTH).enumerate() {
        let record = Record::data((index * LINE_LENGTH) as u16, line);

        let mut buffer = vec![0_u8; RECORD_OVERHEAD + line.len()];
        let len = buffer.pwrite_with(&record, 0, BE)?;

        text.push(':');
        text.extend(buffer[..len].iter().map(|byte| format!("{:02X}", byte)));
        text.push('\n');
    }

    text.push_str(EOF_LINE);
    text.push('\n');

    Ok(text)
}

/// Read an Intel HEX file from disk.
pub fn read_hex_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, Error> {
    let raw = std::fs::read(path)?;

    decode(&String::from_utf8_lossy(&raw))
}

/// Write an Intel HEX file to disk.
pub fn write_hex_file<P: AsRef<Path>>(path: P, image: &[u8]) -> Result<(), Error> {
    std::fs::write(path, encode(image)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "\
:020000040000FA
:10000000000102030405060708090A0B0C0D0E0F78
:10001000000102030405060708090A0B0C0D0E0F68
:00000001FF
";

    #[test]
    fn good() {
        let expected: Vec<u8> = (0..16).chain(0..16).collect();
        assert_eq!(decode(GOOD).unwrap(), expected);
    }

    #[test]
    fn crlf_and_lowercase() {
        let text = ":10000000000102030405060708090a0b0c0d0e0f78\r\n:00000001FF\r\n";
        let expected: Vec<u8> = (0..16).collect();
        assert_eq!(decode(text).unwrap(), expected);
    }

    #[test]
    fn gaps_are_zero_padded() {
        let text = ":0100040042B9\n:00000001FF\n";
        assert_eq!(decode(text).unwrap(), vec![0, 0, 0, 0, 0x42]);
    }

    #[test]
    fn stops_at_eof() {
        let text = ":0100000042BD\n:00000001FF\n:0100010043BB\n";
        assert_eq!(decode(text).unwrap(), vec![0x42]);
    }

    #[test]
    fn bad_checksum() {
        let text = ":10000000000102030405060708090A0B0C0D0E0F79\n:00000001FF\n";
        assert!(matches!(decode(text), Err(Error::BadChecksum)));
    }

    #[test]
    fn nonlinear() {
        let text = "\
:10001000000102030405060708090A0B0C0D0E0F68
:10000000000102030405060708090A0B0C0D0E0F78
:00000001FF
";
        assert!(matches!(decode(text), Err(Error::Unsupported(_))));
    }

    #[test]
    fn overlapping_is_nonlinear() {
        let text = ":0200000042427A\n:0100010043BB\n:00000001FF\n";
        assert!(matches!(decode(text), Err(Error::Unsupported(_))));
    }

    #[test]
    fn not_intel() {
        let text = "fn main() {\n    println!(\"hello\");\n}\n";
        assert!(matches!(decode(text), Err(Error::Unsupported(_))));
    }

    #[test]
    fn empty() {
        assert!(matches!(decode(""), Err(Error::Unsupported(_))));
        assert!(matches!(decode(":00000001FF\n"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn extended_address_refused() {
        let text = ":020000040001F9\n:0100000042BD\n:00000001FF\n";
        assert!(matches!(decode(text), Err(Error::Unsupported(_))));
    }

    #[test]
    fn segment_address_refused() {
        let text = ":020000021000EC\n:0100000042BD\n:00000001FF\n";
        assert!(matches!(decode(text), Err(Error::Unsupported(_))));
    }

    #[test]
    fn malformed_records() {
        assert!(matches!(decode(":\n"), Err(Error::Unsupported(_))));
        assert!(matches!(decode(":1000\n"), Err(Error::Unsupported(_))));
        assert!(matches!(decode(":0100000042\n"), Err(Error::Unsupported(_))));
        assert!(matches!(decode(":01000000ZZBD\n"), Err(Error::Unsupported(_))));
        assert!(matches!(decode(":0100000042BD0\n"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn encode_layout() {
        let image: Vec<u8> = (0..16).chain(0..16).collect();
        assert_eq!(encode(&image).unwrap(), GOOD);
    }

    #[test]
    fn encode_short_last_line() {
        let text = encode(&[0x42]).unwrap();
        assert_eq!(text, ":020000040000FA\n:0100000042BD\n:00000001FF\n");
    }

    #[test]
    fn round_trip() {
        let image: Vec<u8> = (0..0x400_u32).map(|i| (i * 7 + 3) as u8).collect();
        assert_eq!(decode(&encode(&image).unwrap()).unwrap(), image);

        let odd: Vec<u8> = vec![0xFF; 37];
        assert_eq!(decode(&encode(&odd).unwrap()).unwrap(), odd);
    }

    #[test]
    fn encode_too_large() {
        let image = vec![0; BANK_SIZE + 1];
        assert!(matches!(encode(&image), Err(Error::Unsupported(_))));
    }
}
