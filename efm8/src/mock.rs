use crate::{Error, FeatureReport};

///Stand-in for a HID device. `reader` answers every feature report request,
///`writer` sees every report sent and returns how many bytes it took.
pub struct MockDevice<R, W>
where
    R: Fn() -> Vec<u8>,
    W: Fn(&[u8]) -> usize,
{
    pub reader: R,
    pub writer: W,
}

impl<R, W> FeatureReport for MockDevice<R, W>
where
    R: Fn() -> Vec<u8>,
    W: Fn(&[u8]) -> usize,
{
    fn send_feature(&self, data: &[u8]) -> Result<(), Error> {
        let _ = (self.writer)(data);

        Ok(())
    }
    fn get_feature(&self, _report_id: u8, length: usize) -> Result<Vec<u8>, Error> {
        let mut data = (self.reader)();
        data.truncate(length);

        Ok(data)
    }
    fn write_output(&self, data: &[u8]) -> Result<usize, Error> {
        Ok((self.writer)(data))
    }
}
