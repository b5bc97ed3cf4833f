use crate::Error;

/// Silicon Labs vendor id.
pub const SILABS_VID: u16 = 0x10C4;

/// Product id of the EFM8 factory HID bootloader.
pub const BOOTLOADER_PID: u16 = 0xEAC9;

///trait to implement HID devices
///
///The bootloader only talks feature reports. Output reports are needed to
///kick some applications back into the bootloader, see `u2fzero`.
pub trait FeatureReport {
    ///Send a feature report, `data[0]` being the report id.
    fn send_feature(&self, data: &[u8]) -> Result<(), Error>;
    ///Read `length` bytes of feature report `report_id`, report id included.
    fn get_feature(&self, report_id: u8, length: usize) -> Result<Vec<u8>, Error>;
    ///Send an output report, `data[0]` being the report id.
    fn write_output(&self, data: &[u8]) -> Result<usize, Error>;
}
