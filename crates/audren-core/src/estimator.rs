//! Processing-time estimates per command kind.
//!
//! Costs are nanoseconds measured for 160-sample (32 kHz) and 240-sample
//! (48 kHz) frames. The engine compares these against the measured time of
//! each metered command and reports overruns.

use crate::parameter::{ChannelLayout, SampleFormat};
use crate::resampler::SampleRateConversionQuality;

/// Frame length a cost table was measured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameSize {
    Short,
    Long,
}

/// Per-layout costs, indexed mono, stereo, quad, surround.
type LayoutCosts = [f32; 4];

/// Enabled and disabled cost rows of one effect at one frame size.
struct EffectCosts {
    enabled: LayoutCosts,
    disabled: LayoutCosts,
}

const DELAY: [EffectCosts; 2] = [
    EffectCosts {
        enabled: [8929.04, 25500.75, 47759.62, 82203.07],
        disabled: [1295.20, 1213.60, 942.03, 1001.55],
    },
    EffectCosts {
        enabled: [11941.05, 37197.37, 69749.84, 120042.40],
        disabled: [997.67, 977.63, 792.30, 875.43],
    },
];

const REVERB: [EffectCosts; 2] = [
    EffectCosts {
        enabled: [81475.05, 84975.0, 91625.15, 95332.27],
        disabled: [536.30, 588.70, 643.70, 706.0],
    },
    EffectCosts {
        enabled: [120174.47, 25262.22, 135751.23, 141129.23],
        disabled: [617.64, 659.54, 711.43, 778.07],
    },
];

const REVERB_3D: [EffectCosts; 2] = [
    EffectCosts {
        enabled: [116754.0, 125912.05, 146336.03, 165812.66],
        disabled: [734.0, 766.62, 797.46, 867.43],
    },
    EffectCosts {
        enabled: [170292.34, 183875.63, 214696.19, 243846.77],
        disabled: [508.47, 582.45, 626.42, 682.47],
    },
];

const LIMITER: [EffectCosts; 2] = [
    EffectCosts {
        enabled: [21392.0, 26829.0, 32405.0, 52219.0],
        disabled: [897.0, 931.55, 975.39, 1016.8],
    },
    EffectCosts {
        enabled: [30556.0, 39011.0, 48270.0, 76712.0],
        disabled: [874.43, 921.55, 945.26, 992.26],
    },
];

const LIMITER_WITH_STATISTICS: [LayoutCosts; 2] = [
    [23309.0, 29954.0, 35807.0, 58340.0],
    [33526.0, 43549.0, 52190.0, 85527.0],
];

/// Estimates command costs for one frame configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingTimeEstimator {
    sample_count: u32,
    buffer_count: u32,
    frame: FrameSize,
}

impl ProcessingTimeEstimator {
    /// Estimator for frames of `sample_count` samples over `buffer_count` mix buffers.
    ///
    /// Cost tables exist for 160 and 240 samples; anything else uses the
    /// 240-sample table.
    pub fn new(sample_count: u32, buffer_count: u32) -> Self {
        debug_assert!(
            sample_count == 160 || sample_count == 240,
            "no cost table for {sample_count}-sample frames"
        );
        let frame = if sample_count == 160 {
            FrameSize::Short
        } else {
            FrameSize::Long
        };
        Self {
            sample_count,
            buffer_count,
            frame,
        }
    }

    /// Samples per frame.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Mix buffers in the arena.
    pub fn buffer_count(&self) -> u32 {
        self.buffer_count
    }

    #[inline]
    fn pick(&self, short: f32, long: f32) -> u32 {
        match self.frame {
            FrameSize::Short => short as u32,
            FrameSize::Long => long as u32,
        }
    }

    fn row(&self) -> usize {
        match self.frame {
            FrameSize::Short => 0,
            FrameSize::Long => 1,
        }
    }

    fn effect(&self, table: &[EffectCosts; 2], layout: ChannelLayout, enabled: bool) -> u32 {
        let costs = &table[self.row()];
        let row = if enabled { &costs.enabled } else { &costs.disabled };
        row[layout_index(layout)] as u32
    }

    /// Source blocks per output block, scaled by pitch.
    fn source_blocks(&self, sample_rate: u32, pitch: f32) -> f32 {
        (sample_rate as f32 / 200.0) / self.sample_count as f32 * pitch
    }

    /// Zeroing every mix buffer.
    pub fn clear_mix_buffer(&self) -> u32 {
        let per_buffer = match self.frame {
            FrameSize::Short => 266.65,
            FrameSize::Long => 440.68,
        };
        (per_buffer * self.buffer_count as f32) as u32
    }

    /// One buffer-to-buffer copy.
    pub fn copy_mix_buffer(&self) -> u32 {
        self.pick(842.59, 986.72)
    }

    /// A version 1 data source of `format`.
    pub fn data_source_version1(&self, format: SampleFormat, sample_rate: u32, pitch: f32) -> u32 {
        let (base, per_block) = match (format, self.frame) {
            (SampleFormat::PcmInt16, FrameSize::Short) => (6329.442, 427.52),
            (SampleFormat::PcmInt16, FrameSize::Long) => (7853.286, 710.143),
            (SampleFormat::PcmFloat, FrameSize::Short) => (7845.25, 2310.4),
            (SampleFormat::PcmFloat, FrameSize::Long) => (10090.9, 3490.9),
            (SampleFormat::Adpcm, FrameSize::Short) => (7913.808, 2125.6),
            (SampleFormat::Adpcm, FrameSize::Long) => (9736.702, 3564.1),
        };
        (base + per_block * self.source_blocks(sample_rate, pitch)) as u32
    }

    /// The unified data source, costed by format and conversion quality.
    pub fn data_source_version2(
        &self,
        format: SampleFormat,
        quality: SampleRateConversionQuality,
        sample_rate: u32,
        pitch: f32,
    ) -> u32 {
        use SampleRateConversionQuality as Q;

        let short = self.frame == FrameSize::Short;
        let (base, per_block): (f32, f32) = match (format, quality) {
            (SampleFormat::PcmInt16, Q::Default) if short => (6329.44, 427.52),
            (SampleFormat::PcmInt16, Q::Default) => (7853.28, 710.14),
            (SampleFormat::PcmInt16, Q::High) if short => (8049.42, 371.88),
            (SampleFormat::PcmInt16, Q::High) => (10138.84, 610.49),
            (SampleFormat::PcmInt16, Q::Low) if short => (5062.66, 423.43),
            (SampleFormat::PcmInt16, Q::Low) => (5810.96, 676.72),
            (SampleFormat::PcmFloat, Q::Default) if short => (7845.25, 2310.4),
            (SampleFormat::PcmFloat, Q::Default) => (10090.9, 3490.9),
            (SampleFormat::PcmFloat, Q::High | Q::Low) if short => (9446.36, 2308.91),
            (SampleFormat::PcmFloat, Q::High | Q::Low) => (12520.85, 3480.61),
            (SampleFormat::Adpcm, Q::Default) if short => (7913.81, 1827.66),
            (SampleFormat::Adpcm, Q::Default) => (9736.70, 2756.37),
            (SampleFormat::Adpcm, Q::High) if short => (9607.81, 1829.29),
            (SampleFormat::Adpcm, Q::High) => (12154.38, 2731.31),
            (SampleFormat::Adpcm, Q::Low) if short => (6517.48, 1824.61),
            (SampleFormat::Adpcm, Q::Low) => (7929.44, 2732.15),
        };
        (base + per_block * (self.source_blocks(sample_rate, pitch) - 1.0)).max(0.0) as u32
    }

    /// Single biquad stage.
    pub fn biquad_filter(&self) -> u32 {
        self.pick(4173.2, 5585.1)
    }

    /// Constant-volume accumulate.
    pub fn mix(&self) -> u32 {
        self.pick(1402.8, 1853.2)
    }

    /// Ramped accumulate.
    pub fn mix_ramp(&self) -> u32 {
        self.pick(1968.7, 2459.4)
    }

    /// Grouped ramp over `active_count` buffers with a non-zero endpoint.
    pub fn mix_ramp_grouped(&self, active_count: usize) -> u32 {
        let per_sample = match self.frame {
            FrameSize::Short => 6.708,
            FrameSize::Long => 6.4434,
        };
        (self.sample_count as f32 * per_sample * active_count as f32) as u32
    }

    /// In-place constant volume.
    pub fn volume(&self) -> u32 {
        self.pick(1311.1, 1713.6)
    }

    /// In-place ramped volume.
    pub fn volume_ramp(&self) -> u32 {
        self.pick(1425.3, 1700.0)
    }

    /// Applying depop to the mix buffers.
    pub fn depop_for_mix_buffers(&self) -> u32 {
        self.pick(739.64, 910.97)
    }

    /// Delay effect for `layout`.
    pub fn delay(&self, layout: ChannelLayout, enabled: bool) -> u32 {
        self.effect(&DELAY, layout, enabled)
    }

    /// Reverb effect for `layout`.
    pub fn reverb(&self, layout: ChannelLayout, enabled: bool) -> u32 {
        self.effect(&REVERB, layout, enabled)
    }

    /// 3D reverb effect for `layout`.
    pub fn reverb3d(&self, layout: ChannelLayout, enabled: bool) -> u32 {
        self.effect(&REVERB_3D, layout, enabled)
    }

    /// Limiter without statistics.
    pub fn limiter(&self, layout: ChannelLayout, enabled: bool) -> u32 {
        self.effect(&LIMITER, layout, enabled)
    }

    /// Limiter with optional statistics.
    pub fn limiter_with_statistics(&self, layout: ChannelLayout, enabled: bool, statistics: bool) -> u32 {
        if !(enabled && statistics) {
            return self.limiter(layout, enabled);
        }
        LIMITER_WITH_STATISTICS[self.row()][layout_index(layout)] as u32
    }

    /// Upsampling to the target rate.
    pub fn upsample(&self) -> u32 {
        self.pick(312_990.0, 0.0)
    }

    /// Surround to stereo downmix.
    pub fn downmix_surround_to_stereo(&self) -> u32 {
        self.pick(9949.7, 14679.0)
    }

    /// Circular buffer sink over `input_count` buffers.
    pub fn circular_buffer_sink(&self, input_count: usize) -> u32 {
        let per_buffer = match self.frame {
            FrameSize::Short => 531.07,
            FrameSize::Long => 770.26,
        };
        (per_buffer * input_count as f32) as u32
    }

    /// Device sink over `input_count` buffers.
    pub fn device_sink(&self, input_count: usize) -> u32 {
        debug_assert!(input_count == 2 || input_count == 6);
        if input_count == 2 {
            self.pick(8980.0, 9221.9)
        } else {
            self.pick(9177.9, 9725.9)
        }
    }
}

fn layout_index(layout: ChannelLayout) -> usize {
    match layout {
        ChannelLayout::Mono => 0,
        ChannelLayout::Stereo => 1,
        ChannelLayout::Quad => 2,
        ChannelLayout::Surround => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_costs_by_frame_size() {
        let short = ProcessingTimeEstimator::new(160, 24);
        let long = ProcessingTimeEstimator::new(240, 24);
        assert_eq!(short.mix(), 1402);
        assert_eq!(long.mix(), 1853);
        assert_eq!(short.upsample(), 312_990);
        assert_eq!(long.upsample(), 0);
    }

    #[test]
    fn test_per_buffer_costs_scale() {
        let est = ProcessingTimeEstimator::new(240, 10);
        assert_eq!(est.clear_mix_buffer(), 4406);
        assert_eq!(est.circular_buffer_sink(2), 1540);
        assert_eq!(est.mix_ramp_grouped(0), 0);
        assert_eq!(est.mix_ramp_grouped(2), (240.0_f32 * 6.4434 * 2.0) as u32);
    }

    #[test]
    fn test_effect_tables() {
        let est = ProcessingTimeEstimator::new(160, 24);
        assert_eq!(est.delay(ChannelLayout::Surround, true), 82203);
        assert_eq!(est.delay(ChannelLayout::Mono, false), 1295);
        assert_eq!(est.reverb3d(ChannelLayout::Quad, true), 146_336);
        assert_eq!(est.limiter_with_statistics(ChannelLayout::Stereo, true, true), 29954);
        assert_eq!(est.limiter_with_statistics(ChannelLayout::Stereo, true, false), 26829);
        assert_eq!(est.limiter_with_statistics(ChannelLayout::Stereo, false, true), 931);
    }

    #[test]
    fn test_data_source_costs() {
        let est = ProcessingTimeEstimator::new(240, 24);
        // One source block per output block.
        assert_eq!(est.data_source_version1(SampleFormat::PcmInt16, 48_000, 1.0), (7853.286_f32 + 710.143) as u32);
        assert_eq!(
            est.data_source_version2(SampleFormat::PcmInt16, SampleRateConversionQuality::Default, 48_000, 1.0),
            7853
        );
        assert!(
            est.data_source_version2(SampleFormat::Adpcm, SampleRateConversionQuality::High, 48_000, 2.0)
                > est.data_source_version2(SampleFormat::Adpcm, SampleRateConversionQuality::High, 48_000, 1.0)
        );
    }
}
