use crate::frame::{Command, Frame};
use crate::{Error, FeatureReport};

/// Frames go out in feature reports of this many bytes, after the report id.
pub const REPORT_SIZE: usize = 64;

/// '@', the bootloader's answer to an accepted frame.
pub const ACK: u8 = 0x40;

/// Send one frame, split into report sized chunks each led by report id 0.
pub fn send_frame<T: FeatureReport>(d: &T, frame: &Frame) -> Result<(), Error> {
    let bytes = frame.to_bytes()?;

    log::debug!("$ {:02X?}", &bytes[1..bytes.len().min(9)]);

    for chunk in bytes.chunks(REPORT_SIZE) {
        let mut report = Vec::with_capacity(chunk.len() + 1);
        report.push(0);
        report.extend_from_slice(chunk);

        d.send_feature(&report)?;
    }

    Ok(())
}

/// Read back the 2 byte confirmation report, returning its status byte.
pub fn confirmation<T: FeatureReport>(d: &T) -> Result<Option<u8>, Error> {
    let report = d.get_feature(0, 2)?;

    Ok(report.last().copied())
}

/// Send bootloader frames in order, stopping at the first one not confirmed.
///
/// There are no retries. A failed session leaves byte 0 erased, so the device
/// stays in the bootloader rather than booting a partial image.
pub fn flash<T: FeatureReport>(d: &T, frames: &[Frame]) -> Result<(), Error> {
    for (index, frame) in frames.iter().enumerate() {
        send_frame(d, frame)?;

        let status = confirmation(d)?;
        if status != Some(ACK) {
            log::warn!(
                "frame {} of {} ({:?}) answered {:02X?}",
                index + 1,
                frames.len(),
                frame.command(),
                status
            );

            return Err(match frame.command() {
                Command::Verify => Error::VerifyFailed,
                command => Error::BadResponse { command, status },
            });
        }
    }

    log::info!("{} frames confirmed", frames.len());

    Ok(())
}

/// Open the device, flash, and close it again whatever the outcome.
#[cfg(feature = "hidapi")]
pub fn flash_device(
    vid: u16,
    pid: u16,
    serial: Option<&str>,
    frames: &[Frame],
) -> Result<(), Error> {
    let d = crate::open(vid, pid, serial)?;

    flash(&d, frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{to_frames, FrameOptions};
    use crate::mock::MockDevice;
    use std::cell::{Cell, RefCell};

    fn image(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 0x20) as u8 + 0x40).collect()
    }

    #[test]
    fn all_confirmed() {
        let frames = to_frames(&image(1000), FrameOptions::default()).unwrap();
        let asked = Cell::new(0);

        let d = MockDevice {
            reader: || {
                asked.set(asked.get() + 1);
                vec![0, ACK]
            },
            writer: |data: &[u8]| data.len(),
        };

        flash(&d, &frames).unwrap();
        assert_eq!(asked.get(), frames.len());
    }

    #[test]
    fn frames_are_chunked_with_report_id() {
        let frame = Frame::Erase {
            address: 0x0200,
            data: vec![0x55; 128],
        };
        let sent = RefCell::new(vec![]);

        let d = MockDevice {
            reader: || vec![0, ACK],
            writer: |data: &[u8]| {
                sent.borrow_mut().push(data.to_vec());
                data.len()
            },
        };

        flash(&d, &[frame.clone()]).unwrap();

        let sent = sent.into_inner();
        let lengths: Vec<usize> = sent.iter().map(|report| report.len()).collect();
        assert_eq!(lengths, vec![65, 65, 6]);
        assert!(sent.iter().all(|report| report[0] == 0));

        let rejoined: Vec<u8> = sent.iter().flat_map(|report| report[1..].to_vec()).collect();
        assert_eq!(rejoined, frame.to_bytes().unwrap());
        assert_eq!(&rejoined[..5], &[b'$', 131, 0x32, 0x02, 0x00]);
    }

    #[test]
    fn verify_rejected_is_checksum_mismatch() {
        let frames = to_frames(&image(300), FrameOptions::default()).unwrap();
        let verify_index = frames
            .iter()
            .position(|frame| frame.command() == Command::Verify)
            .unwrap();
        let asked = Cell::new(0);

        let d = MockDevice {
            reader: || {
                let index = asked.get();
                asked.set(index + 1);
                if index == verify_index {
                    vec![0, b'C']
                } else {
                    vec![0, ACK]
                }
            },
            writer: |data: &[u8]| data.len(),
        };

        let err = flash(&d, &frames).unwrap_err();
        assert!(matches!(err, Error::VerifyFailed));
        assert!(err.is_checksum_mismatch());
        // commit and run never went out
        assert_eq!(asked.get(), verify_index + 1);
    }

    #[test]
    fn other_rejection_is_bad_response() {
        let frames = to_frames(&image(600), FrameOptions::default()).unwrap();
        for reject in (0..frames.len()).filter(|i| frames[*i].command() != Command::Verify) {
            let asked = Cell::new(0);

            let d = MockDevice {
                reader: || {
                    let index = asked.get();
                    asked.set(index + 1);
                    if index == reject {
                        vec![0, 0x00]
                    } else {
                        vec![0, ACK]
                    }
                },
                writer: |data: &[u8]| data.len(),
            };

            match flash(&d, &frames) {
                Err(Error::BadResponse { command, status }) => {
                    assert_eq!(command, frames[reject].command());
                    assert_eq!(status, Some(0x00));
                }
                other => panic!("frame {}: {:?}", reject, other),
            }
            assert_eq!(asked.get(), reject + 1);
        }
    }

    #[test]
    fn empty_report_is_bad_response() {
        let frames = to_frames(&[0x02], FrameOptions::default()).unwrap();

        let d = MockDevice {
            reader: Vec::new,
            writer: |data: &[u8]| data.len(),
        };

        assert!(matches!(
            flash(&d, &frames),
            Err(Error::BadResponse {
                command: Command::Setup,
                status: None
            })
        ));
    }
}
