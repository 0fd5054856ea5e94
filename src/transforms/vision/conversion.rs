//! Lossless boundary between the `image`-crate representation and u8 CHW
//! tensors. Channel shuffle and the pixel kernels route `DynamicImage` inputs
//! through here and convert back afterwards, so only the exactly
//! representable `Luma8`/`Rgb8`/`Rgba8` buffers are accepted; 16-bit and
//! float formats are rejected rather than silently truncated.

use anyhow::{anyhow, bail, ensure, Context, Result};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};
use tch::{Kind, Tensor};

/// Converts a decoded image to a `[C, H, W]` u8 tensor.
pub fn image_to_tensor(img: &DynamicImage) -> Result<Tensor> {
    let (width, height) = img.dimensions();
    ensure!(
        width > 0 && height > 0,
        "Image dimensions must be positive (got {}x{})",
        width,
        height
    );

    let (raw, channels): (Vec<u8>, i64) = match img {
        DynamicImage::ImageLuma8(buf) => (buf.as_raw().clone(), 1),
        DynamicImage::ImageRgb8(buf) => (buf.as_raw().clone(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.as_raw().clone(), 4),
        other => bail!(
            "cannot losslessly convert {:?} pixels to a tensor (expected 8-bit Luma, Rgb, or Rgba)",
            other.color()
        ),
    };

    let hwc = Tensor::from_slice(&raw).reshape(&[height as i64, width as i64, channels]);
    Ok(hwc.permute(&[2, 0, 1]).contiguous())
}

/// Converts a `[C, H, W]` u8 tensor back to the `DynamicImage` variant
/// matching its channel count (1, 3, or 4).
pub fn tensor_to_image(tensor: &Tensor) -> Result<DynamicImage> {
    ensure!(
        tensor.kind() == Kind::Uint8,
        "tensor_to_image expects 8-bit pixel data (got {:?})",
        tensor.kind()
    );
    let (channels, height, width) = tensor
        .size3()
        .context("image tensors must be [C, H, W]")?;

    let hwc = tensor.permute(&[1, 2, 0]).contiguous().reshape(&[-1]);
    let raw = Vec::<u8>::try_from(&hwc).context("Failed to read pixel data")?;
    let (width, height) = (width as u32, height as u32);

    let img = match channels {
        1 => GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8),
        n => return Err(anyhow!("unsupported channel count {} (expected 1, 3, or 4)", n)),
    };
    img.ok_or_else(|| anyhow!("pixel buffer does not match {}x{} dimensions", width, height))
}
