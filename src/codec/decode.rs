use std::f64::consts::PI;

use crate::{
    codec::base83,
    foundation::error::{BlurestError, BlurestResult, DecodeError},
    foundation::math::{linear_to_srgb, sign_pow, srgb_to_linear},
};

/// Component grid size packed into the first symbol of a placeholder string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Horizontal component count, `1..=9`.
    pub num_x: u32,
    /// Vertical component count, `1..=9`.
    pub num_y: u32,
}

impl Header {
    /// Total number of colour components (DC included).
    pub fn component_count(self) -> usize {
        (self.num_x * self.num_y) as usize
    }

    /// Length a placeholder string with this header must have.
    pub fn expected_len(self) -> usize {
        4 + 2 * self.component_count()
    }
}

/// Colour components of a placeholder string, in linear light.
#[derive(Clone, Debug, PartialEq)]
pub struct Components {
    /// Grid size.
    pub header: Header,
    /// Scale applied to every AC component (before `punch`).
    pub maximum_value: f64,
    /// DC first, then AC components in row-major order (`i + j * num_x`).
    pub colors: Vec<[f64; 3]>,
}

impl Components {
    /// The average-colour term.
    pub fn dc(&self) -> [f64; 3] {
        self.colors[0]
    }

    /// The detail terms.
    pub fn ac(&self) -> &[[f64; 3]] {
        &self.colors[1..]
    }
}

/// Decoded RGBA8 pixels, row-major, alpha always 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the raster and return its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// RGBA of the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[off..off + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copy into an [`image::RgbaImage`] for encoding.
    pub fn to_rgba_image(&self) -> BlurestResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| BlurestError::validation("raster buffer does not match its dimensions"))
    }
}

/// Check the structure of `hash` without decoding any colour.
///
/// Fails with [`BlurestError::Validation`] when the length is wrong (the message names the
/// actual and the expected length) and with [`BlurestError::Decode`] on a foreign symbol.
pub fn validate(hash: &str) -> BlurestResult<Header> {
    let len = hash.chars().count();
    if len < 6 {
        return Err(BlurestError::validation(format!(
            "blurhash must be at least 6 characters, got {len}"
        )));
    }

    if let Some((position, symbol)) = hash
        .chars()
        .enumerate()
        .find(|(_, c)| !base83::is_symbol(*c))
    {
        return Err(DecodeError::InvalidSymbol { symbol, position }.into());
    }

    let size_flag = base83::decode(&hash[..1])?;
    let num_y = (size_flag / 9) as u32 + 1;
    let num_x = (size_flag % 9) as u32 + 1;
    if num_y > 9 {
        return Err(BlurestError::validation(format!(
            "size flag {size_flag} encodes {num_x}x{num_y} components, each axis must be at most 9"
        )));
    }

    let header = Header { num_x, num_y };
    let expected = header.expected_len();
    if len != expected {
        return Err(BlurestError::validation(format!(
            "blurhash length mismatch: length is {len} but it should be {expected}"
        )));
    }

    Ok(header)
}

/// Decode the DC and AC colour terms of `hash`. `punch` scales the AC terms.
pub fn components(hash: &str, punch: f64) -> BlurestResult<Components> {
    let header = validate(hash)?;
    if !punch.is_finite() || punch < 0.0 {
        return Err(BlurestError::validation(format!(
            "punch must be finite and >= 0, got {punch}"
        )));
    }

    // validate() guarantees an ASCII string of the expected length.
    let quantized_max = base83::decode(&hash[1..2])?;
    let maximum_value = (quantized_max + 1) as f64 / 166.0;

    let count = header.component_count();
    let mut colors = Vec::with_capacity(count);
    colors.push(decode_dc(base83::decode(&hash[2..6])?));
    for i in 1..count {
        let start = 4 + 2 * i;
        let value = base83::decode(&hash[start..start + 2])?;
        colors.push(decode_ac(value, maximum_value * punch));
    }

    Ok(Components {
        header,
        maximum_value,
        colors,
    })
}

/// Reconstruct a `width x height` RGBA8 raster from `hash`.
#[tracing::instrument(level = "debug")]
pub fn decode(hash: &str, width: u32, height: u32, punch: f64) -> BlurestResult<Raster> {
    if width == 0 || height == 0 {
        return Err(BlurestError::validation(format!(
            "raster dimensions must be > 0, got {width}x{height}"
        )));
    }
    let comps = components(hash, punch)?;

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BlurestError::validation("raster buffer size overflow"))?;

    let nx = comps.header.num_x as usize;
    let ny = comps.header.num_y as usize;
    let cos_x = cosine_table(width, nx);
    let cos_y = cosine_table(height, ny);

    let mut data = vec![0u8; len];
    for (y, row) in data.chunks_exact_mut(width as usize * 4).enumerate() {
        let cy = &cos_y[y * ny..(y + 1) * ny];
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let cx = &cos_x[x * nx..(x + 1) * nx];
            let mut acc = [0.0f64; 3];
            for (j, &basis_y) in cy.iter().enumerate() {
                for (i, &basis_x) in cx.iter().enumerate() {
                    let basis = basis_x * basis_y;
                    let c = &comps.colors[i + j * nx];
                    acc[0] += c[0] * basis;
                    acc[1] += c[1] * basis;
                    acc[2] += c[2] * basis;
                }
            }
            px[0] = linear_to_srgb(acc[0]);
            px[1] = linear_to_srgb(acc[1]);
            px[2] = linear_to_srgb(acc[2]);
            px[3] = 255;
        }
    }

    Ok(Raster {
        width,
        height,
        data,
    })
}

/// `cos(pi * p * k / extent)` laid out as `[p * count + k]`.
fn cosine_table(extent: u32, count: usize) -> Vec<f64> {
    let extent_f = f64::from(extent);
    let mut table = Vec::with_capacity(extent as usize * count);
    for p in 0..extent {
        for k in 0..count {
            table.push((PI * f64::from(p) * k as f64 / extent_f).cos());
        }
    }
    table
}

fn decode_dc(value: u64) -> [f64; 3] {
    let r = (value >> 16) as u8;
    let g = ((value >> 8) & 0xff) as u8;
    let b = (value & 0xff) as u8;
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b)]
}

fn decode_ac(value: u64, scale: f64) -> [f64; 3] {
    let q_r = value / (19 * 19);
    let q_g = (value / 19) % 19;
    let q_b = value % 19;
    let unquantize = |q: u64| sign_pow((q as f64 - 9.0) / 9.0, 2.0) * scale;
    [unquantize(q_r), unquantize(q_g), unquantize(q_b)]
}

#[cfg(test)]
#[path = "../../tests/unit/codec/decode.rs"]
mod tests;
