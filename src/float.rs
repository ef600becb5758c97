//! Width conversions for CBOR floats. The writer always emits the 64-bit
//! form; the reader widens half and single precision losslessly.

/// Widen an IEEE-754 binary16 bit pattern to f64.
pub(crate) fn f64_from_half_bits(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = (bits >> 10) & 0x1f;
    let mant = f64::from(bits & 0x3ff);
    let value = match exp {
        0 => mant * (-24f64).exp2(),
        31 => {
            if mant == 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (mant + 1024.0) * f64::from(i32::from(exp) - 25).exp2(),
    };
    sign * value
}

/// Widen an IEEE-754 binary32 bit pattern to f64.
pub(crate) fn f64_from_single_bits(bits: u32) -> f64 {
    f64::from(f32::from_bits(bits))
}
