//! Pixel kernels behind the augmentation policies.
//!
//! All kernels operate on `[C, H, W]` tensors. `Uint8` inputs are lifted to
//! float `[0, 1]`, adjusted, then rounded back, so one code path serves both
//! dtypes. Factors follow the usual convention: 1.0 is a no-op for
//! brightness/contrast/saturation, 0.0 for hue shift.

use crate::feature::{Feature, ImageRecord};
use crate::transforms::vision::conversion;
use anyhow::{ensure, Context, Result};
use tch::{Kind, Tensor};

/// Applies a tensor kernel to any image variant, preserving the variant.
/// Structured records keep their color-space tag; decoded images round-trip
/// through the lossless u8 conversion. Non-image inputs pass through.
pub(crate) fn map_image_tensor(
    input: Feature,
    f: impl Fn(&Tensor) -> Result<Tensor>,
) -> Result<Feature> {
    match input {
        Feature::Tensor(t) => Ok(Feature::Tensor(f(&t)?)),
        Feature::Image(rec) => Ok(Feature::Image(ImageRecord {
            data: f(&rec.data)?,
            color_space: rec.color_space,
        })),
        Feature::Dynamic(img) => {
            let tensor = conversion::image_to_tensor(&img)?;
            let adjusted = f(&tensor)?;
            Ok(Feature::Dynamic(conversion::tensor_to_image(&adjusted)?))
        }
        other => Ok(other),
    }
}

/// Lifts `Uint8` pixels to float `[0, 1]`; float inputs pass through.
fn to_unit_float(img: &Tensor) -> (Tensor, bool) {
    if img.kind() == Kind::Uint8 {
        (img.to_kind(Kind::Float) / 255.0, true)
    } else {
        (img.shallow_clone(), false)
    }
}

/// Inverse of [`to_unit_float`]: rounds back to `Uint8` when the input was.
fn from_unit_float(out: Tensor, was_u8: bool) -> Tensor {
    if was_u8 {
        (out * 255.0).round().clamp(0.0, 255.0).to_kind(Kind::Uint8)
    } else {
        out
    }
}

/// `ratio * a + (1 - ratio) * b`, clamped to the unit interval.
fn blend(a: &Tensor, b: &Tensor, ratio: f64) -> Tensor {
    (a * ratio + b * (1.0 - ratio)).clamp(0.0, 1.0)
}

/// ITU-R 601 luma weights, `[1, H, W]` output for broadcasting.
fn rgb_to_grayscale(img: &Tensor) -> Result<Tensor> {
    let (channels, _height, _width) =
        img.size3().context("expected [C, H, W] image tensor")?;
    ensure!(
        channels == 3,
        "expected 3-channel RGB input (got {} channels)",
        channels
    );
    let rgb = img.unbind(0);
    Ok((&rgb[0] * 0.2989 + &rgb[1] * 0.587 + &rgb[2] * 0.114).unsqueeze(0))
}

/// Scales pixel intensity. 0 gives a black image, 1 is a no-op.
pub fn adjust_brightness(img: &Tensor, factor: f64) -> Result<Tensor> {
    ensure!(
        factor >= 0.0,
        "brightness factor must be non-negative (got {})",
        factor
    );
    let (unit, was_u8) = to_unit_float(img);
    let black = unit.zeros_like();
    Ok(from_unit_float(blend(&unit, &black, factor), was_u8))
}

/// Blends towards the mean luma. 0 gives a flat gray image, 1 is a no-op.
pub fn adjust_contrast(img: &Tensor, factor: f64) -> Result<Tensor> {
    ensure!(
        factor >= 0.0,
        "contrast factor must be non-negative (got {})",
        factor
    );
    let (unit, was_u8) = to_unit_float(img);
    let (channels, _height, _width) =
        unit.size3().context("expected [C, H, W] image tensor")?;
    ensure!(
        channels == 1 || channels == 3,
        "contrast adjustment needs a grayscale or RGB image (got {} channels)",
        channels
    );
    let mean = if channels == 3 {
        rgb_to_grayscale(&unit)?.mean(Kind::Float)
    } else {
        unit.mean(Kind::Float)
    };
    Ok(from_unit_float(blend(&unit, &mean, factor), was_u8))
}

/// Blends towards the grayscale image. 0 fully desaturates, 1 is a no-op.
pub fn adjust_saturation(img: &Tensor, factor: f64) -> Result<Tensor> {
    ensure!(
        factor >= 0.0,
        "saturation factor must be non-negative (got {})",
        factor
    );
    let (unit, was_u8) = to_unit_float(img);
    let gray = rgb_to_grayscale(&unit)?;
    Ok(from_unit_float(blend(&unit, &gray, factor), was_u8))
}

/// Rotates hue by `factor` turns of the hue wheel, `factor` in `[-0.5, 0.5]`.
///
/// The shift runs through an HSV round trip computed per pixel; the H channel
/// wraps modulo 1.0 while S and V are untouched.
pub fn adjust_hue(img: &Tensor, factor: f64) -> Result<Tensor> {
    ensure!(
        (-0.5..=0.5).contains(&factor),
        "hue factor must be in [-0.5, 0.5] range (got {})",
        factor
    );
    let (unit, was_u8) = to_unit_float(img);
    let (channels, height, width) =
        unit.size3().context("expected [C, H, W] image tensor")?;
    ensure!(
        channels == 3,
        "hue adjustment needs a 3-channel RGB image (got {} channels)",
        channels
    );

    let flat = unit.to_kind(Kind::Float).contiguous().reshape(&[-1]);
    let mut data = Vec::<f32>::try_from(&flat).context("Failed to read pixel data")?;
    let plane = (height * width) as usize;
    let shift = factor as f32;

    for i in 0..plane {
        let (r, g, b) = (data[i], data[plane + i], data[2 * plane + i]);
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r, g, b) = hsv_to_rgb((h + shift).rem_euclid(1.0), s, v);
        data[i] = r;
        data[plane + i] = g;
        data[2 * plane + i] = b;
    }

    let out = Tensor::from_slice(&data)
        .reshape(&[channels, height, width])
        .to_kind(unit.kind());
    Ok(from_unit_float(out, was_u8))
}

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    if maxc == minc {
        return (0.0, 0.0, maxc);
    }
    let cr = maxc - minc;
    let s = cr / maxc;
    let h = if maxc == r {
        (g - b) / cr
    } else if maxc == g {
        2.0 + (b - r) / cr
    } else {
        4.0 + (r - g) / cr
    };
    ((h / 6.0).rem_euclid(1.0), s, maxc)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let sector = h * 6.0;
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, q),
        _ => (v, p, q),
    }
}

/// PIL-style per-channel histogram equalization on `Uint8` pixel data.
pub fn equalize(img: &Tensor) -> Result<Tensor> {
    ensure!(
        img.kind() == Kind::Uint8,
        "equalize expects 8-bit pixel data (got {:?})",
        img.kind()
    );
    let (channels, height, width) =
        img.size3().context("expected [C, H, W] image tensor")?;
    ensure!(
        height > 0 && width > 0,
        "Image dimensions must be positive (got {}x{})",
        width,
        height
    );

    let flat = img.contiguous().reshape(&[-1]);
    let data = Vec::<u8>::try_from(&flat).context("Failed to read pixel data")?;
    let plane = (height * width) as usize;

    let mut out = Vec::with_capacity(data.len());
    for chan in data.chunks(plane) {
        out.extend(equalize_channel(chan));
    }
    Ok(Tensor::from_slice(&out).reshape(&[channels, height, width]))
}

fn equalize_channel(chan: &[u8]) -> Vec<u8> {
    let mut hist = [0u64; 256];
    for &px in chan {
        hist[px as usize] += 1;
    }

    // Number of pixels per output level, excluding the brightest bucket
    let last_nonzero = hist.iter().rev().find(|&&n| n != 0).copied().unwrap_or(0);
    let step = (chan.len() as u64 - last_nonzero) / 255;
    if step == 0 {
        return chan.to_vec();
    }

    // lut[p] maps through the shifted cumulative histogram; level 0 stays 0
    let mut lut = [0u8; 256];
    let mut cumsum = 0u64;
    for (level, &count) in hist.iter().enumerate().take(255) {
        cumsum += count;
        lut[level + 1] = ((cumsum + step / 2) / step).min(255) as u8;
    }
    chan.iter().map(|&px| lut[px as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    fn unit_rgb(values: &[f32], height: i64, width: i64) -> Tensor {
        Tensor::from_slice(values).reshape(&[3, height, width])
    }

    #[test]
    fn test_brightness_extremes() -> Result<()> {
        let img = unit_rgb(&[0.2, 0.4, 0.6], 1, 1);

        let dark = adjust_brightness(&img, 0.0)?;
        assert!(dark.allclose(&img.zeros_like(), 1e-6, 1e-6, false));

        let same = adjust_brightness(&img, 1.0)?;
        assert!(same.allclose(&img, 1e-6, 1e-6, false));
        Ok(())
    }

    #[test]
    fn test_brightness_on_u8_pixels() -> Result<()> {
        let img = Tensor::from_slice(&[100u8, 200, 40]).reshape(&[3, 1, 1]);
        let half = adjust_brightness(&img, 0.5)?;
        assert_eq!(half.kind(), Kind::Uint8);
        assert_eq!(half.int64_value(&[0, 0, 0]), 50);
        assert_eq!(half.int64_value(&[1, 0, 0]), 100);
        assert_eq!(half.int64_value(&[2, 0, 0]), 20);
        Ok(())
    }

    #[test]
    fn test_brightness_rejects_negative_factor() {
        let img = unit_rgb(&[0.5, 0.5, 0.5], 1, 1);
        assert!(adjust_brightness(&img, -0.1).is_err());
    }

    #[test]
    fn test_contrast_is_identity_on_flat_image() -> Result<()> {
        let img = Tensor::full(&[3, 4, 4], 0.5, (Kind::Float, Device::Cpu));
        let adjusted = adjust_contrast(&img, 0.3)?;
        // Luma weights sum to 0.9999, so the flat image moves by < 1e-4
        assert!(adjusted.allclose(&img, 1e-3, 1e-3, false));
        Ok(())
    }

    #[test]
    fn test_saturation_zero_desaturates() -> Result<()> {
        let img = unit_rgb(&[1.0, 0.0, 0.0], 1, 1);
        let gray = adjust_saturation(&img, 0.0)?;
        // All channels collapse onto the luma value of pure red
        let expected = 0.2989;
        for c in 0..3 {
            assert!((gray.double_value(&[c, 0, 0]) - expected).abs() < 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_saturation_noop_on_gray_pixels() -> Result<()> {
        let img = unit_rgb(&[0.3, 0.3, 0.3], 1, 1);
        let boosted = adjust_saturation(&img, 1.8)?;
        assert!(boosted.allclose(&img, 1e-3, 1e-3, false));
        Ok(())
    }

    #[test]
    fn test_hue_shift_rotates_red_to_green() -> Result<()> {
        let img = unit_rgb(&[1.0, 0.0, 0.0], 1, 1);
        let shifted = adjust_hue(&img, 1.0 / 3.0)?;
        assert!((shifted.double_value(&[0, 0, 0])).abs() < 1e-5);
        assert!((shifted.double_value(&[1, 0, 0]) - 1.0).abs() < 1e-5);
        assert!((shifted.double_value(&[2, 0, 0])).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_hue_zero_shift_is_identity() -> Result<()> {
        let img = unit_rgb(&[0.7, 0.2, 0.5, 0.1, 0.9, 0.3], 1, 2);
        let same = adjust_hue(&img, 0.0)?;
        assert!(same.allclose(&img, 1e-5, 1e-5, false));
        Ok(())
    }

    #[test]
    fn test_hue_rejects_out_of_range_factor() {
        let img = unit_rgb(&[0.5, 0.5, 0.5], 1, 1);
        assert!(adjust_hue(&img, 0.6).is_err());
        assert!(adjust_hue(&img, -0.6).is_err());
    }

    #[test]
    fn test_equalize_small_bimodal_image_is_identity() -> Result<()> {
        // 2x2 [[0, 0], [255, 255]]: the histogram step is zero, so the
        // kernel leaves the pixels untouched
        let img = Tensor::from_slice(&[0u8, 0, 255, 255]).reshape(&[1, 2, 2]);
        let out = equalize(&img)?;
        assert!(out.equal(&img));
        Ok(())
    }

    #[test]
    fn test_equalize_stretches_narrow_histogram() -> Result<()> {
        // 256 pixels at 10 and 256 at 20 stretch to the full range
        let mut values = vec![10u8; 256];
        values.extend(vec![20u8; 256]);
        let img = Tensor::from_slice(&values).reshape(&[1, 16, 32]);

        let out = equalize(&img)?;
        assert_eq!(out.int64_value(&[0, 0, 0]), 0);
        assert_eq!(out.int64_value(&[0, 15, 31]), 255);
        Ok(())
    }

    #[test]
    fn test_equalize_uniform_ramp_is_identity() -> Result<()> {
        let values: Vec<u8> = (0..=255).collect();
        let img = Tensor::from_slice(&values).reshape(&[1, 16, 16]);
        let out = equalize(&img)?;
        assert!(out.equal(&img));
        Ok(())
    }

    #[test]
    fn test_equalize_rejects_float_input() {
        let img = Tensor::zeros(&[1, 2, 2], (Kind::Float, Device::Cpu));
        assert!(equalize(&img).is_err());
    }
}
