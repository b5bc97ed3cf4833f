///Checksums used by the two sub protocols: the Intel HEX line checksum and the CRC-16-CCITT (XMODEM) frame checksum.
pub mod checksum;
pub use checksum::*;

///Read simple, linear Intel HEX files into a flat byte image and write them back out.
pub mod hex;

///Bootloader frames. A frame starts with '$', 1 byte length, 1 byte command and the command data.
mod frame;
pub use frame::*;

///Trait to implement HID devices.
mod device;
pub use device::*;

///Send a sequence of bootloader frames and check each confirmation.
mod flash;
pub use flash::*;

///There is no read command, instead the VERIFY checksum is brute-forced one byte at a time.
mod read;
pub use read::*;

///Extra utils for U2F-Zero devices.
pub mod u2fzero;

///Closure driven stand-in for a HID device.
pub mod mock;

mod error;
pub use error::Error;

#[cfg(feature = "hidapi")]
mod hidapi_trait;
#[cfg(feature = "hidapi")]
pub use hidapi_trait::open;
