//! Photometric augmentation transforms for vision data pipelines.
//!
//! This crate is a policy layer over vectorized pixel kernels: each transform
//! samples random parameters (factors, permutations, Bernoulli gates) and then
//! deterministically dispatches into brightness/contrast/saturation/hue and
//! equalization primitives. Transforms are immutable after construction and
//! compose into pipelines via [`Transform::then`].
//!
//! ```ignore
//! use vision_augment::{ColorJitter, Feature, RandomEqualize, Transform};
//!
//! let pipeline = ColorJitter::new()
//!     .brightness(0.2)?
//!     .contrast_range(0.5, 1.5)?
//!     .then(RandomEqualize::new(0.5)?);
//! let augmented = pipeline.apply(Feature::Tensor(image_tensor))?;
//! ```

pub mod feature;
pub mod rng;
pub mod transforms;

pub use feature::{ColorSpace, Feature, ImageRecord};
pub use transforms::vision::{
    ColorJitter, RandomChannelShuffle, RandomEqualize, RandomPhotometricDistort,
};
pub use transforms::{Chain, RandomTransform, Transform};
