/// sRGB byte to linear-light `[0, 1]`.
pub fn srgb_to_linear(value: u8) -> f64 {
    let v = f64::from(value) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear-light value to sRGB byte. Input is clamped to `[0, 1]`.
pub fn linear_to_srgb(value: f64) -> u8 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        (v * 12.92 * 255.0).round() as u8
    } else {
        ((1.055 * v.powf(1.0 / 2.4) - 0.055) * 255.0).round() as u8
    }
}

/// `|value|^exp` carrying the sign of `value`.
pub fn sign_pow(value: f64, exp: f64) -> f64 {
    value.abs().powf(exp).copysign(value)
}
