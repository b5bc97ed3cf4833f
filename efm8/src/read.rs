use crate::checksum::crc16;
use crate::flash::{confirmation, send_frame, ACK};
use crate::frame::{Frame, BANK_SIZE, PAGE_SIZE};
use crate::{Error, FeatureReport};

/// Find the byte at `address` by asking the device to VERIFY a one byte range
/// against the CRC of every candidate value, lowest first. The first value the
/// device confirms wins.
///
/// If two values ever both matched, only the lower one would be seen.
pub fn probe_byte<T: FeatureReport>(d: &T, address: u16) -> Result<u8, Error> {
    for candidate in 0..=u8::MAX {
        let frame = Frame::Verify {
            start: address,
            end: address,
            crc: crc16(&[candidate]),
        };

        send_frame(d, &frame)?;

        if confirmation(d)? == Some(ACK) {
            return Ok(candidate);
        }
    }

    log::warn!("no possible CRC matches @{:04X}", address);

    Err(Error::NoPossibleMatch { address })
}

/// Exploit CRC to read back `length` bytes of flash from address 0.
///
/// Up to 256 round trips per byte; 16KiB takes the better part of a quarter hour.
pub fn read_flash<T: FeatureReport>(d: &T, length: usize) -> Result<Vec<u8>, Error> {
    if length == 0 {
        return Err(Error::Unsupported("Nothing to read"));
    }
    if length > BANK_SIZE {
        return Err(Error::Unsupported("Can't read past a 64KiB bank"));
    }

    // SETUP is not confirmed here, the first VERIFY tells us soon enough
    send_frame(d, &Frame::Setup)?;

    let mut buf = Vec::with_capacity(length);

    for address in 0..length {
        if address % PAGE_SIZE == 0 {
            log::info!("{:.3}kB", address as f32 / 1024.0);
        }

        buf.push(probe_byte(d, address as u16)?);
    }

    Ok(buf)
}

/// Open the device, read back flash, and close it again whatever the outcome.
#[cfg(feature = "hidapi")]
pub fn read_device(
    vid: u16,
    pid: u16,
    serial: Option<&str>,
    length: usize,
) -> Result<Vec<u8>, Error> {
    let d = crate::open(vid, pid, serial)?;

    read_flash(&d, length)
}
