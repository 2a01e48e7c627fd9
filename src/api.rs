use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::camlink;
use crate::flash::{FlashDriver, FlashError};
use crate::operation::OperationEvent;
use crate::transport::{ControlTransport, UsbTransport};

#[derive(Debug, Clone, Default)]
pub struct DeviceOptions {
    /// Wait for the device to appear instead of failing immediately.
    pub wait: bool,
    /// Max time to wait when `wait=true` (None = forever).
    pub wait_timeout: Option<Duration>,
    /// Max time to poll the busy flag after a write/erase (None = forever).
    pub busy_timeout: Option<Duration>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskErrorKind {
    NoDevice,
    UnexpectedFirmware,
    Transport,
    FlashTimeout,
    Io,
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Flash(#[from] FlashError),

    #[error("unable to open {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to finish writing {path}: {source}")]
    FlushFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TaskError {
    pub fn kind(&self) -> TaskErrorKind {
        match self {
            TaskError::Flash(e) => match e {
                FlashError::DeviceNotFound => TaskErrorKind::NoDevice,
                FlashError::UnexpectedFirmware { .. } => TaskErrorKind::UnexpectedFirmware,
                FlashError::Transport(_) | FlashError::ShortTransfer { .. } => {
                    TaskErrorKind::Transport
                }
                FlashError::BusyTimeout { .. } => TaskErrorKind::FlashTimeout,
                FlashError::Io(_) => TaskErrorKind::Io,
            },
            TaskError::OpenFile { .. } | TaskError::FlushFile { .. } => TaskErrorKind::Io,
        }
    }
}

/// Open the first connected Cam Link device, validate its firmware, and
/// apply the busy-poll budget.
pub fn open_driver(opts: &DeviceOptions) -> Result<FlashDriver<UsbTransport>, TaskError> {
    let driver = FlashDriver::open(opts.wait, opts.wait_timeout)?;
    Ok(driver.with_busy_timeout(opts.busy_timeout))
}

/// Dump `length` bytes from `start` into a file the driver opens and closes
/// itself.
pub fn dump_to_path<T, F>(
    driver: &FlashDriver<T>,
    path: &Path,
    start: u32,
    length: u64,
    on_event: F,
) -> Result<u64, TaskError>
where
    T: ControlTransport,
    F: FnMut(OperationEvent),
{
    let file = File::create(path).map_err(|e| TaskError::OpenFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut sink = BufWriter::new(file);

    let total = driver.dump(&mut sink, start, length, on_event)?;

    sink.flush().map_err(|e| TaskError::FlushFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(total)
}

/// Dump into an already-open sink; closing it stays with the caller.
pub fn dump_to_writer<T, W, F>(
    driver: &FlashDriver<T>,
    sink: &mut W,
    start: u32,
    length: u64,
    on_event: F,
) -> Result<u64, TaskError>
where
    T: ControlTransport,
    W: Write + ?Sized,
    F: FnMut(OperationEvent),
{
    Ok(driver.dump(sink, start, length, on_event)?)
}

/// Erase-then-program flash from a file. When `length` is not given it
/// defaults to the remainder of flash from `start`, so the erase pass
/// covers everything up to the end of the part; programming still stops
/// once the image is exhausted.
pub fn program_from_path<T, F>(
    driver: &FlashDriver<T>,
    path: &Path,
    start: u32,
    length: Option<u64>,
    on_event: F,
) -> Result<u64, TaskError>
where
    T: ControlTransport,
    F: FnMut(OperationEvent),
{
    let file = File::open(path).map_err(|e| TaskError::OpenFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let length = length.unwrap_or_else(|| full_flash_length().saturating_sub(u64::from(start)));
    let mut source = BufReader::new(file);

    Ok(driver.program(&mut source, start, length, on_event)?)
}

/// Program from an already-open source; the caller supplies the length and
/// keeps ownership of the source.
pub fn program_from_reader<T, R, F>(
    driver: &FlashDriver<T>,
    source: &mut R,
    start: u32,
    length: u64,
    on_event: F,
) -> Result<u64, TaskError>
where
    T: ControlTransport,
    R: Read + ?Sized,
    F: FnMut(OperationEvent),
{
    Ok(driver.program(source, start, length, on_event)?)
}

/// Erase a range; defaults are applied by the caller (one sector when the
/// CLI passes no length).
pub fn erase_range<T, F>(
    driver: &FlashDriver<T>,
    start: u32,
    length: u64,
    on_event: F,
) -> Result<(), TaskError>
where
    T: ControlTransport,
    F: FnMut(OperationEvent),
{
    Ok(driver.erase(start, length, on_event)?)
}

/// Clear the boot magic so the device falls back to the vendor bootloader.
pub fn clear_boot_magic<T, F>(driver: &FlashDriver<T>, on_event: F) -> Result<(), TaskError>
where
    T: ControlTransport,
    F: FnMut(OperationEvent),
{
    Ok(driver.clear_boot_magic(on_event)?)
}

/// Default dump length: the whole part.
pub fn full_flash_length() -> u64 {
    u64::from(camlink::FLASH_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockTransport;

    use tempfile::tempdir;

    fn driver(flash_len: usize) -> FlashDriver<MockTransport> {
        let mock = MockTransport::new(flash_len);
        mock.fill_pattern();
        FlashDriver::new(mock).unwrap()
    }

    #[test]
    fn dump_to_path_writes_the_requested_range() {
        let d = driver(16384);
        let dir = tempdir().unwrap();
        let out = dir.path().join("dump.bin");

        let total = dump_to_path(&d, &out, 4096, 8192, |_| {}).unwrap();
        assert_eq!(total, 8192);

        let written = std::fs::read(&out).unwrap();
        assert_eq!(written, d.transport.mem.borrow()[4096..12288].to_vec());
    }

    #[test]
    fn program_from_path_defaults_length_to_remaining_flash() {
        let d = driver(131_072);
        let dir = tempdir().unwrap();
        let image_path = dir.path().join("image.bin");
        std::fs::write(&image_path, vec![0x42u8; 4096]).unwrap();

        // Start two sectors shy of the end of the part: the default length
        // runs from `start` to the end, not just over the image bytes.
        let start = camlink::FLASH_SIZE - 2 * camlink::SECTOR_SIZE;
        let total = program_from_path(&d, &image_path, start, None, |_| {}).unwrap();

        assert_eq!(total, 4096);
        assert_eq!(d.transport.erase_indices(), vec![62, 63]);
    }

    #[test]
    fn open_file_errors_carry_the_path() {
        let d = driver(8192);
        let missing = Path::new("/nonexistent/image.bin");

        let err = match program_from_path(&d, missing, 0, None, |_| {}) {
            Ok(_) => panic!("expected OpenFile"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), TaskErrorKind::Io);
        assert!(err.to_string().contains("image.bin"));
    }
}
