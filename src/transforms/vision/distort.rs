use crate::feature::Feature;
use crate::rng::with_worker_rng;
use crate::transforms::vision::ops;
use crate::transforms::vision::photometric::{
    ChannelShuffleParams, ColorJitter, ColorJitterParams, RandomChannelShuffle,
};
use crate::transforms::{RandomTransform, Transform};
use anyhow::{ensure, Result};
use rand::Rng;

// ============================================================================
// RandomPhotometricDistort
// ============================================================================

/// Gates and sub-parameters drawn for one [`RandomPhotometricDistort`] call.
///
/// A `Some` field means the corresponding gate opened; it carries the
/// sub-transform's own freshly sampled parameters, so gating and factor
/// sampling stay separate randomness draws.
#[derive(Debug, Clone)]
pub struct PhotometricDistortParams {
    pub brightness: Option<ColorJitterParams>,
    pub contrast: Option<ColorJitterParams>,
    pub saturation: Option<ColorJitterParams>,
    pub hue: Option<ColorJitterParams>,
    pub channel_shuffle: Option<ChannelShuffleParams>,
    /// Whether contrast runs before saturation/hue or after.
    pub contrast_before: bool,
}

/// The SSD-style photometric distortion policy: five independently gated
/// sub-transforms (brightness, contrast, saturation, hue, channel shuffle),
/// with contrast randomly placed before or after the saturation/hue pair.
///
/// Each gate opens with probability `p`; an open gate then runs its
/// single-adjustment [`ColorJitter`] with its own sampled factor.
#[derive(Debug, Clone)]
pub struct RandomPhotometricDistort {
    brightness: ColorJitter,
    contrast: ColorJitter,
    saturation: ColorJitter,
    hue: ColorJitter,
    channel_shuffle: RandomChannelShuffle,
    p: f64,
}

impl RandomPhotometricDistort {
    pub fn new(
        brightness: (f64, f64),
        contrast: (f64, f64),
        saturation: (f64, f64),
        hue: (f64, f64),
        p: f64,
    ) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&p),
            "Probability must be in [0.0, 1.0] range (got {})",
            p
        );
        Ok(Self {
            brightness: ColorJitter::new().brightness_range(brightness.0, brightness.1)?,
            contrast: ColorJitter::new().contrast_range(contrast.0, contrast.1)?,
            saturation: ColorJitter::new().saturation_range(saturation.0, saturation.1)?,
            hue: ColorJitter::new().hue_range(hue.0, hue.1)?,
            channel_shuffle: RandomChannelShuffle::new(),
            p,
        })
    }
}

impl Default for RandomPhotometricDistort {
    /// The reference detection-pipeline ranges with `p = 0.5`.
    fn default() -> Self {
        Self::new((0.875, 1.125), (0.5, 1.5), (0.5, 1.5), (-0.05, 0.05), 0.5)
            .expect("default distortion ranges are valid")
    }
}

impl RandomTransform for RandomPhotometricDistort {
    type Params = PhotometricDistortParams;

    fn sample_params<R: Rng + ?Sized>(
        &self,
        input: &Feature,
        rng: &mut R,
    ) -> PhotometricDistortParams {
        // Gates first, then one parameter draw per open gate
        let brightness = rng.random_bool(self.p);
        let contrast = rng.random_bool(self.p);
        let saturation = rng.random_bool(self.p);
        let hue = rng.random_bool(self.p);
        let channel_shuffle = rng.random_bool(self.p);
        let contrast_before = rng.random_bool(0.5);

        PhotometricDistortParams {
            brightness: brightness.then(|| self.brightness.sample_params(input, rng)),
            contrast: contrast.then(|| self.contrast.sample_params(input, rng)),
            saturation: saturation.then(|| self.saturation.sample_params(input, rng)),
            hue: hue.then(|| self.hue.sample_params(input, rng)),
            channel_shuffle: channel_shuffle.then(|| self.channel_shuffle.sample_params(input, rng)),
            contrast_before,
        }
    }

    fn apply_with(&self, input: Feature, params: &PhotometricDistortParams) -> Result<Feature> {
        let mut output = input;
        if let Some(p) = &params.brightness {
            output = self.brightness.apply_with(output, p)?;
        }
        if params.contrast_before {
            if let Some(p) = &params.contrast {
                output = self.contrast.apply_with(output, p)?;
            }
        }
        if let Some(p) = &params.saturation {
            output = self.saturation.apply_with(output, p)?;
        }
        if let Some(p) = &params.hue {
            output = self.hue.apply_with(output, p)?;
        }
        if !params.contrast_before {
            if let Some(p) = &params.contrast {
                output = self.contrast.apply_with(output, p)?;
            }
        }
        if let Some(p) = &params.channel_shuffle {
            output = self.channel_shuffle.apply_with(output, p)?;
        }
        Ok(output)
    }
}

impl Transform<Feature, Feature> for RandomPhotometricDistort {
    fn apply(&self, input: Feature) -> Result<Feature> {
        let params = with_worker_rng(|rng| self.sample_params(&input, rng));
        self.apply_with(input, &params)
    }
}

// ============================================================================
// RandomEqualize
// ============================================================================

/// Single Bernoulli gate used by p-gated transforms.
#[derive(Debug, Clone, Copy)]
pub struct RandomApplyParams {
    pub apply: bool,
}

/// Histogram-equalizes the image with probability `p`, otherwise returns the
/// input bit-for-bit. Requires 8-bit pixel data when the gate opens.
#[derive(Debug, Clone)]
pub struct RandomEqualize {
    p: f64,
}

impl RandomEqualize {
    pub fn new(p: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&p),
            "Probability must be in [0.0, 1.0] range (got {})",
            p
        );
        Ok(Self { p })
    }
}

impl RandomTransform for RandomEqualize {
    type Params = RandomApplyParams;

    fn sample_params<R: Rng + ?Sized>(&self, _input: &Feature, rng: &mut R) -> RandomApplyParams {
        RandomApplyParams {
            apply: rng.random_bool(self.p),
        }
    }

    fn apply_with(&self, input: Feature, params: &RandomApplyParams) -> Result<Feature> {
        if params.apply {
            ops::map_image_tensor(input, |t| ops::equalize(t))
        } else {
            Ok(input)
        }
    }
}

impl Transform<Feature, Feature> for RandomEqualize {
    fn apply(&self, input: Feature) -> Result<Feature> {
        let params = with_worker_rng(|rng| self.sample_params(&input, rng));
        self.apply_with(input, &params)
    }
}
