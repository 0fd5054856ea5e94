use crate::feature::{ColorSpace, Feature, ImageRecord};
use crate::rng::with_worker_rng;
use crate::transforms::vision::{conversion, ops, range::FactorRange};
use crate::transforms::{RandomTransform, Transform};
use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tch::Tensor;

// ============================================================================
// ColorJitter
// ============================================================================

/// The four adjustments a [`ColorJitter`] can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterOp {
    Brightness,
    Contrast,
    Saturation,
    Hue,
}

const JITTER_OPS: [JitterOp; 4] = [
    JitterOp::Brightness,
    JitterOp::Contrast,
    JitterOp::Saturation,
    JitterOp::Hue,
];

/// One invocation's worth of jitter randomness: an application order plus one
/// sampled factor per enabled adjustment (`None` means skipped).
#[derive(Debug, Clone)]
pub struct ColorJitterParams {
    pub order: [JitterOp; 4],
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
    pub hue: Option<f64>,
}

impl ColorJitterParams {
    fn factor(&self, op: JitterOp) -> Option<f64> {
        match op {
            JitterOp::Brightness => self.brightness,
            JitterOp::Contrast => self.contrast,
            JitterOp::Saturation => self.saturation,
            JitterOp::Hue => self.hue,
        }
    }
}

/// Randomly jitters brightness, contrast, saturation, and hue.
///
/// Each enabled adjustment gets a factor range fixed at construction; every
/// call draws one factor per range and applies the enabled adjustments in a
/// fresh uniformly random order. Adjustments left unset (or configured to
/// their no-op value) are skipped entirely.
///
/// # Example
/// ```ignore
/// let jitter = ColorJitter::new()
///     .brightness(0.2)?            // factor in [0.8, 1.2]
///     .contrast_range(0.5, 1.5)?
///     .hue(0.05)?;                 // shift in [-0.05, 0.05]
/// let out = jitter.apply(Feature::Tensor(img))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColorJitter {
    brightness: Option<FactorRange>,
    contrast: Option<FactorRange>,
    saturation: Option<FactorRange>,
    hue: Option<FactorRange>,
}

impl ColorJitter {
    /// A jitter with every adjustment disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Brightness factor in `[max(1 - amount, 0), 1 + amount]`.
    pub fn brightness(mut self, amount: f64) -> Result<Self> {
        self.brightness = FactorRange::symmetric("brightness", amount, 1.0, true)?;
        Ok(self)
    }

    /// Explicit brightness factor range, `0 <= lo <= hi`.
    pub fn brightness_range(mut self, lo: f64, hi: f64) -> Result<Self> {
        self.brightness =
            FactorRange::explicit("brightness", lo, hi, 1.0, (0.0, f64::INFINITY))?;
        Ok(self)
    }

    /// Contrast factor in `[max(1 - amount, 0), 1 + amount]`.
    pub fn contrast(mut self, amount: f64) -> Result<Self> {
        self.contrast = FactorRange::symmetric("contrast", amount, 1.0, true)?;
        Ok(self)
    }

    /// Explicit contrast factor range, `0 <= lo <= hi`.
    pub fn contrast_range(mut self, lo: f64, hi: f64) -> Result<Self> {
        self.contrast = FactorRange::explicit("contrast", lo, hi, 1.0, (0.0, f64::INFINITY))?;
        Ok(self)
    }

    /// Saturation factor in `[max(1 - amount, 0), 1 + amount]`.
    pub fn saturation(mut self, amount: f64) -> Result<Self> {
        self.saturation = FactorRange::symmetric("saturation", amount, 1.0, true)?;
        Ok(self)
    }

    /// Explicit saturation factor range, `0 <= lo <= hi`.
    pub fn saturation_range(mut self, lo: f64, hi: f64) -> Result<Self> {
        self.saturation =
            FactorRange::explicit("saturation", lo, hi, 1.0, (0.0, f64::INFINITY))?;
        Ok(self)
    }

    /// Hue shift in `[-amount, amount]`, `amount <= 0.5`.
    pub fn hue(mut self, amount: f64) -> Result<Self> {
        ensure!(
            amount <= 0.5,
            "hue amount must be at most 0.5 (got {})",
            amount
        );
        self.hue = FactorRange::symmetric("hue", amount, 0.0, false)?;
        Ok(self)
    }

    /// Explicit hue shift range within `[-0.5, 0.5]`.
    pub fn hue_range(mut self, lo: f64, hi: f64) -> Result<Self> {
        self.hue = FactorRange::explicit("hue", lo, hi, 0.0, (-0.5, 0.5))?;
        Ok(self)
    }
}

impl RandomTransform for ColorJitter {
    type Params = ColorJitterParams;

    fn sample_params<R: Rng + ?Sized>(&self, _input: &Feature, rng: &mut R) -> ColorJitterParams {
        let mut order = JITTER_OPS;
        order.shuffle(rng);
        ColorJitterParams {
            order,
            brightness: self.brightness.map(|r| r.sample(rng)),
            contrast: self.contrast.map(|r| r.sample(rng)),
            saturation: self.saturation.map(|r| r.sample(rng)),
            hue: self.hue.map(|r| r.sample(rng)),
        }
    }

    fn apply_with(&self, input: Feature, params: &ColorJitterParams) -> Result<Feature> {
        let mut output = input;
        for op in params.order {
            let Some(factor) = params.factor(op) else {
                continue;
            };
            output = ops::map_image_tensor(output, |t| match op {
                JitterOp::Brightness => ops::adjust_brightness(t, factor),
                JitterOp::Contrast => ops::adjust_contrast(t, factor),
                JitterOp::Saturation => ops::adjust_saturation(t, factor),
                JitterOp::Hue => ops::adjust_hue(t, factor),
            })?;
        }
        Ok(output)
    }
}

impl Transform<Feature, Feature> for ColorJitter {
    fn apply(&self, input: Feature) -> Result<Feature> {
        let params = with_worker_rng(|rng| self.sample_params(&input, rng));
        self.apply_with(input, &params)
    }
}

// ============================================================================
// RandomChannelShuffle
// ============================================================================

/// Permutation drawn for one [`RandomChannelShuffle`] call; empty for
/// non-image inputs.
#[derive(Debug, Clone)]
pub struct ChannelShuffleParams {
    pub permutation: Vec<i64>,
}

/// Reorders an image's channels by a uniformly random permutation.
///
/// Non-image inputs pass through untouched. Structured records come back
/// tagged [`ColorSpace::Other`] since the permutation invalidates any named
/// channel semantics; decoded images round-trip through the lossless u8
/// tensor conversion and keep their buffer format.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChannelShuffle;

impl RandomChannelShuffle {
    pub fn new() -> Self {
        Self
    }
}

impl RandomTransform for RandomChannelShuffle {
    type Params = ChannelShuffleParams;

    fn sample_params<R: Rng + ?Sized>(&self, input: &Feature, rng: &mut R) -> ChannelShuffleParams {
        // Sampling is infallible; a malformed image gets an empty permutation
        // here and apply_with reports the shape error.
        let channels = input.channels().unwrap_or(0);
        let mut permutation: Vec<i64> = (0..channels).collect();
        permutation.shuffle(rng);
        ChannelShuffleParams { permutation }
    }

    fn apply_with(&self, input: Feature, params: &ChannelShuffleParams) -> Result<Feature> {
        if !input.is_image() {
            return Ok(input);
        }
        let channels = input.channels()?;
        ensure!(
            params.permutation.len() as i64 == channels,
            "permutation length {} does not match channel count {}",
            params.permutation.len(),
            channels
        );
        let index = Tensor::from_slice(&params.permutation);
        match input {
            Feature::Tensor(t) => Ok(Feature::Tensor(t.index_select(0, &index))),
            Feature::Image(rec) => Ok(Feature::Image(ImageRecord {
                data: rec.data.index_select(0, &index),
                color_space: ColorSpace::Other,
            })),
            Feature::Dynamic(img) => {
                let tensor = conversion::image_to_tensor(&img)?;
                let shuffled = tensor.index_select(0, &index);
                Ok(Feature::Dynamic(conversion::tensor_to_image(&shuffled)?))
            }
            other => Ok(other),
        }
    }
}

impl Transform<Feature, Feature> for RandomChannelShuffle {
    fn apply(&self, input: Feature) -> Result<Feature> {
        let params = with_worker_rng(|rng| self.sample_params(&input, rng));
        self.apply_with(input, &params)
    }
}
