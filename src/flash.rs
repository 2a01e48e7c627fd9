use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::camlink;
use crate::operation::OperationEvent;
use crate::transport::{self, ControlTransport, OpenError, UsbTransport};

#[derive(Error, Debug)]
pub enum FlashError {
    #[error("no Cam Link device found (VID:PID {:04X}:{:04X})", camlink::VID, camlink::PID)]
    DeviceNotFound,

    #[error("unexpected firmware id {id:02X?}")]
    UnexpectedFirmware { id: [u8; 8] },

    #[error("usb: {0}")]
    Transport(#[from] rusb::Error),

    #[error("short transfer: {got} != {expected}")]
    ShortTransfer { got: usize, expected: usize },

    #[error("flash still busy after {waited:?}")]
    BusyTimeout { waited: Duration },

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Driver for the SPI flash behind the Cam Link exploration firmware.
///
/// Owns its transport for the whole session. Construction validates the
/// firmware identity; every other method is a thin sequence of vendor
/// control transfers. All calls block the current thread.
pub struct FlashDriver<T: ControlTransport> {
    pub(crate) transport: T,
    busy_timeout: Option<Duration>,
}

impl FlashDriver<UsbTransport> {
    /// Open the first connected Cam Link device and validate its firmware.
    ///
    /// With `wait`, polls for the device to appear, bounded by
    /// `wait_timeout` (`None` = forever).
    pub fn open(wait: bool, wait_timeout: Option<Duration>) -> Result<Self, FlashError> {
        let transport = transport::open_device(wait, wait_timeout).map_err(|e| match e {
            OpenError::NoDevice => FlashError::DeviceNotFound,
            OpenError::Usb(e) => FlashError::Transport(e),
        })?;
        Self::new(transport)
    }
}

impl<T: ControlTransport> FlashDriver<T> {
    pub fn new(transport: T) -> Result<Self, FlashError> {
        let driver = Self {
            transport,
            busy_timeout: None,
        };
        let id = driver.firmware_id()?;
        if id != camlink::FIRMWARE_ID {
            return Err(FlashError::UnexpectedFirmware { id });
        }
        Ok(driver)
    }

    /// Bound the post-write/erase busy poll. `None` (the default) polls
    /// forever, which matches the device's documented contract but hangs
    /// indefinitely on a wedged device.
    pub fn with_busy_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn firmware_id(&self) -> Result<[u8; 8], FlashError> {
        let mut id = [0u8; 8];
        let n = self
            .transport
            .vendor_read(camlink::REQ_FIRMWARE_ID, 0, 0, &mut id)?;
        if n != id.len() {
            return Err(FlashError::ShortTransfer {
                got: n,
                expected: id.len(),
            });
        }
        Ok(id)
    }

    /// Read up to one chunk from flash. Returns the number of bytes the
    /// device actually delivered, which may be short.
    pub fn read_chunk(&self, addr: u32, buf: &mut [u8]) -> Result<usize, FlashError> {
        debug_assert!(buf.len() <= camlink::CHUNK_SIZE);
        let index = (addr / camlink::ADDRESS_SHIFT) as u16;
        let n = self
            .transport
            .vendor_read(camlink::REQ_FLASH_READ, 0, index, buf)?;
        Ok(n)
    }

    /// Write one chunk, then block until the device reports idle.
    pub fn write_chunk(&self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        debug_assert!(data.len() <= camlink::CHUNK_SIZE);
        let index = (addr / camlink::ADDRESS_SHIFT) as u16;
        let n = self
            .transport
            .vendor_write(camlink::REQ_FLASH_WRITE, 0, index, data)?;
        if n != data.len() {
            return Err(FlashError::ShortTransfer {
                got: n,
                expected: data.len(),
            });
        }
        self.wait_while_busy()
    }

    /// Erase the 64 KiB sector containing `addr`, then block until the
    /// device reports idle.
    pub fn erase_sector(&self, addr: u32) -> Result<(), FlashError> {
        let index = (addr / camlink::SECTOR_SIZE) as u16;
        self.transport
            .vendor_write(camlink::REQ_FLASH_STATUS, camlink::ERASE_VALUE, index, &[])?;
        self.wait_while_busy()
    }

    pub fn is_busy(&self) -> Result<bool, FlashError> {
        let mut flag = [0u8; 1];
        let n = self
            .transport
            .vendor_read(camlink::REQ_FLASH_STATUS, 0, 0, &mut flag)?;
        if n != 1 {
            return Err(FlashError::ShortTransfer {
                got: n,
                expected: 1,
            });
        }
        Ok(flag[0] != 0)
    }

    // Tight poll, no backoff: the flash must not be touched until the busy
    // flag drops, and the firmware tolerates back-to-back status reads.
    fn wait_while_busy(&self) -> Result<(), FlashError> {
        let start = Instant::now();
        while self.is_busy()? {
            if let Some(t) = self.busy_timeout {
                if start.elapsed() >= t {
                    return Err(FlashError::BusyTimeout {
                        waited: start.elapsed(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Read `length` bytes starting at `start` into `sink`, chunk by chunk.
    ///
    /// Advances by whatever each read actually returns, so short reads near
    /// the end of range are handled. Returns the byte count written to the
    /// sink. Closing the sink stays with whoever opened it.
    pub fn dump<W, F>(
        &self,
        sink: &mut W,
        start: u32,
        length: u64,
        mut on_event: F,
    ) -> Result<u64, FlashError>
    where
        W: Write + ?Sized,
        F: FnMut(OperationEvent),
    {
        tracing::debug!(start, length, "dump flash");
        on_event(OperationEvent::DumpStart { start, length });

        let mut addr = start;
        let mut remaining = length as i64;
        let mut total: u64 = 0;
        let mut buf = vec![0u8; camlink::CHUNK_SIZE];

        while remaining > 0 {
            let want = camlink::CHUNK_SIZE.min(remaining as usize);
            let n = self.read_chunk(addr, &mut buf[..want])?;
            if n == 0 {
                // A zero-length response makes no forward progress.
                break;
            }
            sink.write_all(&buf[..n])?;
            addr = addr.wrapping_add(n as u32);
            remaining -= n as i64;
            total += n as u64;
            on_event(OperationEvent::ChunkRead {
                addr,
                start,
                length,
            });
        }

        Ok(total)
    }

    /// Erase sectors in fixed 64 KiB strides until the requested length is
    /// covered. A final partial sector still consumes a full stride, and a
    /// length of 1 still erases one whole sector.
    pub fn erase<F>(&self, start: u32, length: u64, mut on_event: F) -> Result<(), FlashError>
    where
        F: FnMut(OperationEvent),
    {
        tracing::debug!(start, length, "erase flash");
        on_event(OperationEvent::EraseStart { start, length });

        let mut addr = start;
        let mut remaining = length as i64;

        while remaining > 0 {
            self.erase_sector(addr)?;
            addr = addr.wrapping_add(camlink::SECTOR_SIZE);
            remaining -= camlink::SECTOR_SIZE as i64;
            on_event(OperationEvent::SectorErased {
                addr,
                start,
                length,
            });
        }

        Ok(())
    }

    /// Erase the target range, then program it from `source`.
    ///
    /// The loop budget moves in whole 4096-byte chunks regardless of how
    /// many bytes each read actually returned, as the original protocol
    /// tooling did; behavior is exact only when the source length is a
    /// multiple of the chunk size. A zero-byte read ends the loop early
    /// since an empty write transfers nothing. Returns the byte count
    /// written to flash.
    pub fn program<R, F>(
        &self,
        source: &mut R,
        start: u32,
        length: u64,
        mut on_event: F,
    ) -> Result<u64, FlashError>
    where
        R: Read + ?Sized,
        F: FnMut(OperationEvent),
    {
        self.erase(start, length, &mut on_event)?;

        tracing::debug!(start, length, "program flash");
        on_event(OperationEvent::ProgramStart { start, length });

        let mut addr = start;
        let mut remaining = length as i64;
        let mut total: u64 = 0;
        let mut buf = vec![0u8; camlink::CHUNK_SIZE];

        while remaining > 0 {
            let n = read_up_to(source, &mut buf)?;
            if n == 0 {
                break;
            }
            self.write_chunk(addr, &buf[..n])?;
            addr = addr.wrapping_add(n as u32);
            remaining -= camlink::CHUNK_SIZE as i64;
            total += n as u64;
            on_event(OperationEvent::ChunkWritten {
                addr,
                start,
                length,
            });
        }

        Ok(total)
    }

    /// Zero the two boot-magic bytes at the start of flash.
    ///
    /// Reads the first 256 bytes, clears bytes 0..2 in memory, and writes
    /// the whole block back. No erase: NOR flash clears bits in place, and
    /// the surrounding 254 bytes are rewritten with their current values.
    pub fn clear_boot_magic<F>(&self, mut on_event: F) -> Result<(), FlashError>
    where
        F: FnMut(OperationEvent),
    {
        tracing::debug!("clear boot magic");

        let mut block = [0u8; camlink::BOOT_BLOCK_LEN];
        let n = self.read_chunk(0, &mut block)?;
        if n != block.len() {
            return Err(FlashError::ShortTransfer {
                got: n,
                expected: block.len(),
            });
        }

        for b in &mut block[..camlink::BOOT_MAGIC_LEN] {
            *b = 0;
        }
        self.write_chunk(0, &block)?;

        on_event(OperationEvent::BootMagicCleared);
        Ok(())
    }
}

// Fill `buf` from `source` until full or EOF.
fn read_up_to<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
