use crate::{Error, FeatureReport, SILABS_VID};

/// Product id of a U2F-Zero running its application, under the Silicon Labs vendor id.
pub const PID: u16 = 0x8ACF;

const U2F_CONFIG_BOOTLOADER: u8 = 0x88;

/// Send the U2F-Zero application its jump to bootloader command. The device
/// drops off the bus and comes back as the factory bootloader.
pub fn jump_to_bootloader<T: FeatureReport>(d: &T) -> Result<(), Error> {
    d.write_output(&[0, U2F_CONFIG_BOOTLOADER])?;
    d.write_output(&[0, 0xFF, 0xFF, 0xFF, 0xFF, U2F_CONFIG_BOOTLOADER])?;

    Ok(())
}

/// Open a running U2F-Zero and jump to its bootloader.
#[cfg(feature = "hidapi")]
pub fn reset(serial: Option<&str>) -> Result<(), Error> {
    let d = crate::open(SILABS_VID, PID, serial)?;
    log::info!("Jumping to bootloader (LED should go out)");

    jump_to_bootloader(&d)
}
