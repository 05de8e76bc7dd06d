/// Write cursor of a circular-buffer sink, in bytes from the ring start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircularBufferSinkState {
    /// Next write position.
    pub current_offset: u32,
}
