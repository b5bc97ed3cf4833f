use crate::checksum::crc16;
use crate::Error;
use scroll::{ctx, Pwrite, BE};

/// Addresses are 16 bit, so one bank is all the bootloader can see.
pub const BANK_SIZE: usize = 0x1_0000;

/// Data carried by a single ERASE or WRITE frame.
pub const PAGE_SIZE: usize = 128;

/// Flash is erased in blocks of this size, ERASE clears the block before writing.
pub const ERASE_BLOCK_SIZE: usize = 0x200;

/// Unlocks the bootloader for the rest of the session.
pub const SETUP_KEY: [u8; 3] = [0xA5, 0xF1, 0x00];

const FRAME_START: u8 = b'$';

///Bootloader command byte
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Setup = 0x31,
    Erase = 0x32,
    Write = 0x33,
    Verify = 0x34,
    Run = 0x36,
}

/// A single bootloader command. Addresses and CRC go out big endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Setup,
    ///Erase the 512 byte block holding `address`, then write `data` from it.
    Erase { address: u16, data: Vec<u8> },
    Write { address: u16, data: Vec<u8> },
    ///Ask the device to compare the CRC of `start..=end` against `crc`.
    Verify { start: u16, end: u16, crc: [u8; 2] },
    Run { address: u16 },
}

impl Frame {
    pub fn command(&self) -> Command {
        match self {
            Frame::Setup => Command::Setup,
            Frame::Erase { .. } => Command::Erase,
            Frame::Write { .. } => Command::Write,
            Frame::Verify { .. } => Command::Verify,
            Frame::Run { .. } => Command::Run,
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            Frame::Setup => SETUP_KEY.len(),
            Frame::Erase { data, .. } | Frame::Write { data, .. } => 2 + data.len(),
            Frame::Verify { .. } => 6,
            Frame::Run { .. } => 2,
        }
    }

    /// Wire bytes: '$', length of command plus payload, command, payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = vec![0_u8; 3 + self.payload_len()];
        let len = buffer.pwrite_with(self, 0, BE)?;
        buffer.truncate(len);

        Ok(buffer)
    }
}

impl<'a> ctx::TryIntoCtx<scroll::Endian> for &'a Frame {
    type Error = scroll::Error;

    fn try_into_ctx(self, dst: &mut [u8], ctx: scroll::Endian) -> Result<usize, Self::Error> {
        let length = 1 + self.payload_len();
        if length > usize::from(u8::MAX) {
            return Err(scroll::Error::TooBig {
                size: length,
                len: usize::from(u8::MAX),
            });
        }

        let mut offset = 0;

        dst.gwrite_with(FRAME_START, &mut offset, ctx)?;
        dst.gwrite_with(length as u8, &mut offset, ctx)?;
        dst.gwrite_with(self.command() as u8, &mut offset, ctx)?;

        match self {
            Frame::Setup => {
                for byte in &SETUP_KEY {
                    dst.gwrite_with(*byte, &mut offset, ctx)?;
                }
            }
            Frame::Erase { address, data } | Frame::Write { address, data } => {
                dst.gwrite_with(*address, &mut offset, ctx)?;
                for byte in data {
                    dst.gwrite_with(*byte, &mut offset, ctx)?;
                }
            }
            Frame::Verify { start, end, crc } => {
                dst.gwrite_with(*start, &mut offset, ctx)?;
                dst.gwrite_with(*end, &mut offset, ctx)?;
                dst.gwrite_with(crc[0], &mut offset, ctx)?;
                dst.gwrite_with(crc[1], &mut offset, ctx)?;
            }
            Frame::Run { address } => {
                dst.gwrite_with(*address, &mut offset, ctx)?;
            }
        }

        Ok(offset)
    }
}

/// Which optional frames `to_frames` adds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameOptions {
    ///Check the CRC of the image before committing byte 0.
    pub verify: bool,
    ///Jump into the application once flashed.
    pub run: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        FrameOptions {
            verify: true,
            run: true,
        }
    }
}

/// Returns a copy of the image with byte 0 blanked to 0xFF, and the real byte 0.
///
/// Flash is written with byte 0 erased so a half-written firmware never boots;
/// the real value is only written once everything else is confirmed.
///
/// `None` for an empty image, which has no byte 0 to hold back.
pub fn defer_first_byte(image: &[u8]) -> Option<(Vec<u8>, u8)> {
    let (&first, rest) = image.split_first()?;

    let mut deferred = Vec::with_capacity(image.len());
    deferred.push(0xFF);
    deferred.extend_from_slice(rest);

    Some((deferred, first))
}

/// Convert a firmware image into the sequence of bootloader frames for one session.
///
/// SETUP, one ERASE or WRITE per 128 byte page (ERASE when the page opens a
/// 512 byte block), an optional VERIFY over the image with byte 0 still
/// blank, the WRITE committing byte 0, then an optional RUN.
pub fn to_frames(image: &[u8], options: FrameOptions) -> Result<Vec<Frame>, Error> {
    if image.len() > BANK_SIZE {
        return Err(Error::Unsupported("Image larger than a 64KiB bank"));
    }

    let (deferred, first) =
        defer_first_byte(image).ok_or(Error::Unsupported("Nothing to flash"))?;

    let mut frames = vec![Frame::Setup];

    for (index, page) in deferred.chunks(PAGE_SIZE).enumerate() {
        let address = index * PAGE_SIZE;
        let data = page.to_vec();

        frames.push(if address % ERASE_BLOCK_SIZE == 0 {
            Frame::Erase {
                address: address as u16,
                data,
            }
        } else {
            Frame::Write {
                address: address as u16,
                data,
            }
        });
    }

    if options.verify {
        frames.push(Frame::Verify {
            start: 0,
            end: (deferred.len() - 1) as u16,
            crc: crc16(&deferred),
        });
    }

    frames.push(Frame::Write {
        address: 0,
        data: vec![first],
    });

    if options.run {
        frames.push(Frame::Run { address: 0 });
    }

    log::debug!(
        "{} bytes in {} frames, byte 0 {:02X} deferred",
        image.len(),
        frames.len(),
        first
    );

    Ok(frames)
}
