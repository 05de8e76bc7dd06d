//! Output device abstraction.
//!
//! The device sink hands one frame of interleaved 16-bit PCM to an
//! [`OutputDevice`] per pass. Backends (audio APIs, files, network) live
//! outside this crate; [`CapturingDevice`] records frames in memory.

/// Final consumer of rendered PCM.
pub trait OutputDevice {
    /// Device sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Interleaved channels per frame.
    fn channel_count(&self) -> u32;

    /// Queue `frame_count` frames of interleaved PCM.
    fn append_buffer(&mut self, interleaved: &[i16], frame_count: usize);
}

/// Device that keeps everything appended to it.
#[derive(Debug, Clone)]
pub struct CapturingDevice {
    sample_rate: u32,
    channel_count: u32,
    samples: Vec<i16>,
    frames: usize,
    appends: usize,
}

impl CapturingDevice {
    /// New empty device.
    pub fn new(sample_rate: u32, channel_count: u32) -> Self {
        Self {
            sample_rate,
            channel_count,
            samples: Vec::new(),
            frames: 0,
            appends: 0,
        }
    }

    /// All interleaved samples appended so far.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Total frames appended.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Number of `append_buffer` calls.
    pub fn append_count(&self) -> usize {
        self.appends
    }

    /// Drop recorded audio.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.frames = 0;
        self.appends = 0;
    }
}

impl OutputDevice for CapturingDevice {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> u32 {
        self.channel_count
    }

    fn append_buffer(&mut self, interleaved: &[i16], frame_count: usize) {
        self.samples.extend_from_slice(interleaved);
        self.frames += frame_count;
        self.appends += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture() {
        let mut device = CapturingDevice::new(48000, 2);
        device.append_buffer(&[1, 2, 3, 4], 2);
        device.append_buffer(&[5, 6], 1);
        assert_eq!(device.samples(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(device.frame_count(), 3);
        assert_eq!(device.append_count(), 2);
        device.clear();
        assert!(device.samples().is_empty());
    }
}
