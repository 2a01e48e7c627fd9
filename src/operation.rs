/// Progress events emitted by flash operations.
///
/// Chunk and sector events carry the cumulative address reached after the
/// transfer, together with the range the operation was asked to cover, so a
/// renderer can derive a percentage without tracking state of its own.
#[derive(Debug, Clone)]
pub enum OperationEvent {
    DumpStart {
        start: u32,
        length: u64,
    },
    ChunkRead {
        addr: u32,
        start: u32,
        length: u64,
    },

    EraseStart {
        start: u32,
        length: u64,
    },
    SectorErased {
        addr: u32,
        start: u32,
        length: u64,
    },

    ProgramStart {
        start: u32,
        length: u64,
    },
    ChunkWritten {
        addr: u32,
        start: u32,
        length: u64,
    },

    BootMagicCleared,
}
