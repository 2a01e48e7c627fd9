pub const EXIT_OK: i32 = 0;
pub const EXIT_NO_DEVICE: i32 = 10;
pub const EXIT_UNEXPECTED_FIRMWARE: i32 = 11;
pub const EXIT_TRANSPORT: i32 = 12;
pub const EXIT_FLASH_TIMEOUT: i32 = 13;
pub const EXIT_IO: i32 = 14;
pub const EXIT_UNEXPECTED: i32 = 20;
