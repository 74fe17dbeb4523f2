/// Scale one 8-bit channel by `weight`, rounding to nearest and saturating to `[0, 255]`.
pub fn scale_channel(v: u8, weight: f32) -> u8 {
    let scaled = (f32::from(v) * weight).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 255.0) as u8
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// The last entry is exactly `end`. A single-entry table is `[end]`.
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![end],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            let mut out: Vec<f32> = (0..n).map(|i| start + step * i as f32).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Lookup table for multiplying every possible channel value by one fixed weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaleLut {
    table: [u8; 256],
    identity: bool,
}

impl ScaleLut {
    /// Precompute `scale_channel(v, weight)` for all 256 inputs.
    pub fn new(weight: f32) -> Self {
        let mut table = [0u8; 256];
        for (v, slot) in table.iter_mut().enumerate() {
            *slot = scale_channel(v as u8, weight);
        }
        Self {
            table,
            identity: weight == 1.0,
        }
    }

    /// Scaled value of `v`.
    #[inline]
    pub fn apply(&self, v: u8) -> u8 {
        self.table[usize::from(v)]
    }

    /// `true` when the weight is exactly `1.0`, so scaling can be skipped.
    pub fn is_identity(&self) -> bool {
        self.identity
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
