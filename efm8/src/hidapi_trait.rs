use crate::{Error, FeatureReport};
use hidapi::{HidApi, HidDevice};

impl FeatureReport for HidDevice {
    fn send_feature(&self, data: &[u8]) -> Result<(), Error> {
        self.send_feature_report(data).map_err(|e| e.into())
    }
    fn get_feature(&self, report_id: u8, length: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0_u8; length];
        if let Some(first) = buf.first_mut() {
            *first = report_id;
        }
        let len = self.get_feature_report(&mut buf)?;
        buf.truncate(len);
        Ok(buf)
    }
    fn write_output(&self, data: &[u8]) -> Result<usize, Error> {
        self.write(data).map_err(|e| e.into())
    }
}

impl From<hidapi::HidError> for Error {
    fn from(err: hidapi::HidError) -> Self {
        log::debug!("{}", err);
        Error::Transmission
    }
}

/// Open a device by vendor id, product id and optionally serial number.
///
/// The device is closed when the returned handle is dropped.
pub fn open(vid: u16, pid: u16, serial: Option<&str>) -> Result<HidDevice, Error> {
    let api = HidApi::new()?;

    let d = match serial {
        Some(serial) => api.open_serial(vid, pid, serial)?,
        None => api.open(vid, pid)?,
    };

    log::info!("Download over port: HID:{:X}:{:X}", vid, pid);
    log::debug!(
        "found {:?} {:?}",
        d.get_manufacturer_string(),
        d.get_product_string()
    );

    Ok(d)
}
