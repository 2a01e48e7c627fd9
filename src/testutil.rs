//! Mock control transport for driver tests.
//!
//! Models the device's NOR flash semantics: erase sets a sector to 0xFF,
//! writes AND bytes into place (so bit-clearing without an erase behaves
//! like the real part). Every transfer is recorded for assertions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::camlink;
use crate::transport::ControlTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FirmwareId,
    Read { index: u16, len: usize },
    Write { index: u16, len: usize },
    Erase { index: u16 },
    BusyPoll,
}

pub struct MockTransport {
    pub mem: Rc<RefCell<Vec<u8>>>,
    pub calls: Rc<RefCell<Vec<Call>>>,
    firmware_id: [u8; 8],

    /// Report busy for this many polls after each write/erase.
    pub busy_polls: Cell<u32>,
    pending_busy: Cell<u32>,
    /// Never report idle.
    pub stuck_busy: Cell<bool>,

    /// Fail flash reads with a timeout once this many have succeeded.
    pub fail_reads_after: Cell<Option<u32>>,
    reads_seen: Cell<u32>,
}

impl MockTransport {
    pub fn new(flash_len: usize) -> Self {
        Self {
            mem: Rc::new(RefCell::new(vec![0xFF; flash_len])),
            calls: Rc::new(RefCell::new(Vec::new())),
            firmware_id: camlink::FIRMWARE_ID,
            busy_polls: Cell::new(0),
            pending_busy: Cell::new(0),
            stuck_busy: Cell::new(false),
            fail_reads_after: Cell::new(None),
            reads_seen: Cell::new(0),
        }
    }

    pub fn with_firmware_id(mut self, id: [u8; 8]) -> Self {
        self.firmware_id = id;
        self
    }

    pub fn fill_pattern(&self) {
        for (i, b) in self.mem.borrow_mut().iter_mut().enumerate() {
            *b = (i % 253) as u8;
        }
    }

    pub fn count_reads(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Read { .. }))
            .count()
    }

    pub fn erase_indices(&self) -> Vec<u16> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Erase { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<(u16, usize)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Write { index, len } => Some((*index, *len)),
                _ => None,
            })
            .collect()
    }
}

impl ControlTransport for MockTransport {
    fn vendor_read(
        &self,
        request: u8,
        _value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize> {
        match request {
            camlink::REQ_FIRMWARE_ID => {
                self.calls.borrow_mut().push(Call::FirmwareId);
                buf.copy_from_slice(&self.firmware_id);
                Ok(buf.len())
            }
            camlink::REQ_FLASH_READ => {
                self.calls.borrow_mut().push(Call::Read {
                    index,
                    len: buf.len(),
                });
                if let Some(limit) = self.fail_reads_after.get() {
                    if self.reads_seen.get() >= limit {
                        return Err(rusb::Error::Timeout);
                    }
                }
                self.reads_seen.set(self.reads_seen.get() + 1);

                let addr = index as usize * camlink::ADDRESS_SHIFT as usize;
                let mem = self.mem.borrow();
                let n = buf.len().min(mem.len().saturating_sub(addr));
                buf[..n].copy_from_slice(&mem[addr..addr + n]);
                Ok(n)
            }
            camlink::REQ_FLASH_STATUS => {
                self.calls.borrow_mut().push(Call::BusyPoll);
                let busy = if self.stuck_busy.get() {
                    true
                } else if self.pending_busy.get() > 0 {
                    self.pending_busy.set(self.pending_busy.get() - 1);
                    true
                } else {
                    false
                };
                buf[0] = u8::from(busy);
                Ok(1)
            }
            _ => Err(rusb::Error::NotSupported),
        }
    }

    fn vendor_write(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> rusb::Result<usize> {
        match request {
            camlink::REQ_FLASH_WRITE => {
                self.calls.borrow_mut().push(Call::Write {
                    index,
                    len: data.len(),
                });
                let addr = index as usize * camlink::ADDRESS_SHIFT as usize;
                let mut mem = self.mem.borrow_mut();
                for (i, b) in data.iter().enumerate() {
                    if let Some(cell) = mem.get_mut(addr + i) {
                        *cell &= b;
                    }
                }
                self.pending_busy.set(self.busy_polls.get());
                Ok(data.len())
            }
            camlink::REQ_FLASH_STATUS if value == camlink::ERASE_VALUE => {
                self.calls.borrow_mut().push(Call::Erase { index });
                let start = index as usize * camlink::SECTOR_SIZE as usize;
                let mut mem = self.mem.borrow_mut();
                let end = (start + camlink::SECTOR_SIZE as usize).min(mem.len());
                if start < end {
                    mem[start..end].fill(0xFF);
                }
                self.pending_busy.set(self.busy_polls.get());
                Ok(data.len())
            }
            _ => Err(rusb::Error::NotSupported),
        }
    }
}
