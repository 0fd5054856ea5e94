use anyhow::{bail, Context, Result};
use image::DynamicImage;
use tch::Tensor;

/// Channel-semantics tag carried by [`ImageRecord`].
///
/// Once channels are permuted the original semantics no longer hold, so
/// channel shuffle re-tags its output as [`ColorSpace::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Grayscale,
    Rgb,
    Rgba,
    Other,
}

/// A structured image: a `[C, H, W]` pixel tensor plus its color-space tag.
#[derive(Debug)]
pub struct ImageRecord {
    pub data: Tensor,
    pub color_space: ColorSpace,
}

impl Clone for ImageRecord {
    fn clone(&self) -> Self {
        Self {
            data: self.data.shallow_clone(),
            color_space: self.color_space,
        }
    }
}

/// The polymorphic input accepted by every transform in this crate.
///
/// Transforms preserve the variant of their input: a `Tensor` comes back as a
/// `Tensor`, a `Dynamic` image round-trips through a lossless u8 tensor when a
/// pixel kernel needs array access. `BoundingBoxes` is a non-image payload
/// that photometric transforms pass through unchanged.
#[derive(Debug)]
pub enum Feature {
    /// Dense `[C, H, W]` pixel tensor, `Uint8` or float.
    Tensor(Tensor),
    /// Structured image record with color-space metadata.
    Image(ImageRecord),
    /// Decoded `image`-crate representation.
    Dynamic(DynamicImage),
    /// Per-instance box coordinates; carried alongside images in detection
    /// samples and never touched by photometric transforms.
    BoundingBoxes(Tensor),
}

/// Shallow clone: tensors share storage, decoded images copy their buffer.
impl Clone for Feature {
    fn clone(&self) -> Self {
        match self {
            Feature::Tensor(t) => Feature::Tensor(t.shallow_clone()),
            Feature::Image(rec) => Feature::Image(rec.clone()),
            Feature::Dynamic(img) => Feature::Dynamic(img.clone()),
            Feature::BoundingBoxes(t) => Feature::BoundingBoxes(t.shallow_clone()),
        }
    }
}

impl Feature {
    /// Whether this variant carries pixel data.
    pub fn is_image(&self) -> bool {
        !matches!(self, Feature::BoundingBoxes(_))
    }

    /// Number of channels along the channel axis.
    pub fn channels(&self) -> Result<i64> {
        match self {
            Feature::Tensor(t) => Ok(t.size3().context("image tensors must be [C, H, W]")?.0),
            Feature::Image(rec) => Ok(rec
                .data
                .size3()
                .context("image tensors must be [C, H, W]")?
                .0),
            Feature::Dynamic(img) => Ok(i64::from(img.color().channel_count())),
            Feature::BoundingBoxes(_) => bail!("bounding boxes have no channel axis"),
        }
    }

    /// Returns the underlying tensor for the dense-array variant.
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Feature::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the decoded image for the `Dynamic` variant.
    pub fn as_dynamic(&self) -> Option<&DynamicImage> {
        match self {
            Feature::Dynamic(img) => Some(img),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_channel_counts() -> Result<()> {
        let tensor = Feature::Tensor(Tensor::zeros(&[3, 4, 4], (Kind::Uint8, Device::Cpu)));
        assert_eq!(tensor.channels()?, 3);

        let record = Feature::Image(ImageRecord {
            data: Tensor::zeros(&[1, 4, 4], (Kind::Float, Device::Cpu)),
            color_space: ColorSpace::Grayscale,
        });
        assert_eq!(record.channels()?, 1);

        let rgba = Feature::Dynamic(DynamicImage::new_rgba8(2, 2));
        assert_eq!(rgba.channels()?, 4);

        let luma16 = Feature::Dynamic(DynamicImage::new_luma16(2, 2));
        assert_eq!(luma16.channels()?, 1);

        let boxes = Feature::BoundingBoxes(Tensor::zeros(&[2, 4], (Kind::Float, Device::Cpu)));
        assert!(boxes.channels().is_err());
        assert!(!boxes.is_image());
        Ok(())
    }

    #[test]
    fn test_shallow_clone_shares_storage() {
        let t = Tensor::zeros(&[3, 2, 2], (Kind::Float, Device::Cpu));
        let feature = Feature::Tensor(t);
        let cloned = feature.clone();
        // Same storage, not a deep copy
        if let (Feature::Tensor(a), Feature::Tensor(b)) = (&feature, &cloned) {
            assert_eq!(a.data_ptr(), b.data_ptr());
        } else {
            panic!("clone changed variant");
        }
    }
}
