//! Sample buffer arena.
//!
//! All per-frame audio lives in one contiguous `Vec<f32>` of
//! `buffer_count * sample_count` samples. Buffer `index` is the window
//! `[index * sample_count, (index + 1) * sample_count)`.
//!
//! Indices come from the command list, never from guest data, so an
//! out-of-range index is a programming error and panics. Distinct indices never
//! alias; commands that read and write the same index go through
//! [`SampleBufferArena::input_output`], which stages the input in a scratch
//! window first.

/// Flat arena of fixed-length sample buffers.
#[derive(Debug, Clone)]
pub struct SampleBufferArena {
    samples: Vec<f32>,
    scratch: Vec<f32>,
    buffer_count: usize,
    sample_count: usize,
}

impl SampleBufferArena {
    /// Creates a zeroed arena.
    ///
    /// # Arguments
    ///
    /// * `buffer_count` - Number of buffers
    /// * `sample_count` - Samples per buffer, constant for the arena's lifetime
    pub fn new(buffer_count: usize, sample_count: usize) -> Self {
        Self {
            samples: vec![0.0; buffer_count * sample_count],
            scratch: vec![0.0; sample_count],
            buffer_count,
            sample_count,
        }
    }

    /// Number of buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    /// Samples per buffer.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    fn window(&self, index: usize) -> core::ops::Range<usize> {
        assert!(
            index < self.buffer_count,
            "buffer index {index} out of range ({} buffers)",
            self.buffer_count
        );
        let start = index * self.sample_count;
        start..start + self.sample_count
    }

    /// Mutable view of buffer `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= buffer_count()`.
    #[inline]
    pub fn get(&mut self, index: usize) -> &mut [f32] {
        let range = self.window(index);
        &mut self.samples[range]
    }

    /// Read-only view of buffer `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= buffer_count()`.
    #[inline]
    pub fn get_const(&self, index: usize) -> &[f32] {
        &self.samples[self.window(index)]
    }

    /// Borrow an input buffer and an output buffer at the same time.
    ///
    /// When `input == output` the input is copied to the scratch window first,
    /// so the returned input slice is a snapshot taken before any write.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn input_output(&mut self, input: usize, output: usize) -> (&[f32], &mut [f32]) {
        let in_range = self.window(input);
        let out_range = self.window(output);

        if input == output {
            self.scratch.copy_from_slice(&self.samples[in_range]);
            return (&self.scratch, &mut self.samples[out_range]);
        }

        if input < output {
            let (head, tail) = self.samples.split_at_mut(out_range.start);
            (&head[in_range], &mut tail[..self.sample_count])
        } else {
            let (head, tail) = self.samples.split_at_mut(in_range.start);
            (&tail[..self.sample_count], &mut head[out_range])
        }
    }

    /// Mutable views of two distinct buffers.
    ///
    /// # Panics
    ///
    /// Panics if `a == b` or either index is out of range.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> (&mut [f32], &mut [f32]) {
        assert_ne!(a, b, "pair_mut requires distinct buffers");
        let a_range = self.window(a);
        let b_range = self.window(b);
        if a < b {
            let (head, tail) = self.samples.split_at_mut(b_range.start);
            (&mut head[a_range], &mut tail[..self.sample_count])
        } else {
            let (head, tail) = self.samples.split_at_mut(a_range.start);
            (&mut tail[..self.sample_count], &mut head[b_range])
        }
    }

    /// Read one sample.
    #[inline]
    pub fn sample(&self, index: usize, offset: usize) -> f32 {
        self.get_const(index)[offset]
    }

    /// Write one sample.
    #[inline]
    pub fn set_sample(&mut self, index: usize, offset: usize, value: f32) {
        self.get(index)[offset] = value;
    }

    /// Copy buffer `input` into buffer `output`. No-op when they are equal.
    pub fn copy(&mut self, input: usize, output: usize) {
        if input != output {
            let src = self.window(input);
            let dst = self.window(output);
            self.samples.copy_within(src, dst.start);
        }
    }

    /// Zero one buffer.
    pub fn clear(&mut self, index: usize) {
        self.get(index).fill(0.0);
    }

    /// Zero every buffer.
    pub fn clear_all(&mut self) {
        self.samples.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_do_not_overlap() {
        let mut arena = SampleBufferArena::new(3, 4);
        arena.get(1).fill(1.0);
        assert_eq!(arena.get_const(0), &[0.0; 4]);
        assert_eq!(arena.get_const(1), &[1.0; 4]);
        assert_eq!(arena.get_const(2), &[0.0; 4]);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_panics() {
        let arena = SampleBufferArena::new(2, 4);
        let _ = arena.get_const(2);
    }

    #[test]
    fn test_input_output_distinct_both_orders() {
        let mut arena = SampleBufferArena::new(3, 2);
        arena.get(0).copy_from_slice(&[1.0, 2.0]);
        arena.get(2).copy_from_slice(&[5.0, 6.0]);

        let (input, output) = arena.input_output(0, 2);
        output[0] = input[1];
        let (input, output) = arena.input_output(2, 0);
        output[1] = input[1];

        assert_eq!(arena.get_const(0), &[1.0, 6.0]);
        assert_eq!(arena.get_const(2), &[2.0, 6.0]);
    }

    #[test]
    fn test_input_output_same_index_snapshots_input() {
        let mut arena = SampleBufferArena::new(1, 3);
        arena.get(0).copy_from_slice(&[1.0, 2.0, 3.0]);
        let (input, output) = arena.input_output(0, 0);
        for i in 0..3 {
            output[i] = input[2 - i];
        }
        assert_eq!(arena.get_const(0), &[3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_pair_mut() {
        let mut arena = SampleBufferArena::new(2, 2);
        let (a, b) = arena.pair_mut(1, 0);
        a[0] = 1.0;
        b[0] = 2.0;
        assert_eq!(arena.sample(1, 0), 1.0);
        assert_eq!(arena.sample(0, 0), 2.0);
    }

    #[test]
    fn test_copy_and_clear() {
        let mut arena = SampleBufferArena::new(2, 2);
        arena.get(0).copy_from_slice(&[7.0, 8.0]);
        arena.copy(0, 1);
        assert_eq!(arena.get_const(1), &[7.0, 8.0]);
        arena.clear(0);
        assert_eq!(arena.get_const(0), &[0.0, 0.0]);
        arena.clear_all();
        assert_eq!(arena.get_const(1), &[0.0, 0.0]);
    }
}
