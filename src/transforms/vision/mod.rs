//! Photometric vision transforms.
//!
//! ```text
//! transforms/vision/
//! ├── range.rs        → factor-range validation and sampling
//! ├── ops.rs          → pixel kernels (blend, adjust_*, equalize)
//! ├── conversion.rs   → lossless DynamicImage ⇄ u8 CHW tensor
//! ├── photometric.rs  → ColorJitter, RandomChannelShuffle
//! └── distort.rs      → RandomPhotometricDistort, RandomEqualize
//! ```

pub mod conversion;
pub mod distort;
pub mod ops;
pub mod photometric;
pub mod range;

pub use distort::{RandomApplyParams, RandomEqualize, RandomPhotometricDistort};
pub use photometric::{
    ChannelShuffleParams, ColorJitter, ColorJitterParams, JitterOp, RandomChannelShuffle,
};
pub use range::FactorRange;
