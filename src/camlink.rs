use std::time::Duration;

pub const VID: u16 = 0x04B4;
pub const PID: u16 = 0x4720;

/// 8-byte identity returned by the exploration firmware.
pub const FIRMWARE_ID: [u8; 8] = *b"CAMLINK\0";

pub const FLASH_SIZE: u32 = 4_194_304;
pub const CHUNK_SIZE: usize = 4096;
pub const SECTOR_SIZE: u32 = 65_536;

/// The boot magic lives in the first two bytes of this block.
pub const BOOT_BLOCK_LEN: usize = 256;
pub const BOOT_MAGIC_LEN: usize = 2;

// Vendor request codes. Erase and busy-poll share 0xC4: the busy flag is the
// IN direction, erase is OUT with value=1.
pub const REQ_FIRMWARE_ID: u8 = 0xB0;
pub const REQ_FLASH_WRITE: u8 = 0xC2;
pub const REQ_FLASH_READ: u8 = 0xC3;
pub const REQ_FLASH_STATUS: u8 = 0xC4;

pub const ERASE_VALUE: u16 = 1;

/// Read/write requests carry the flash address in the 16-bit index field,
/// scaled down by 256.
pub const ADDRESS_SHIFT: u32 = 256;

/// Timeout for every control transfer.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(3000);
