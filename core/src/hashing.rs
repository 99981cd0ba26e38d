//! Float canonicalization for key hashing.
//!
//! Key lookup needs an exact `Eq`/`Hash` pair, so numeric key components are reduced to a
//! canonical bit pattern instead of being compared with a tolerance. Only the encodings that
//! denote the same value are folded: `-0.0` onto `0.0` and every NaN onto one NaN. Any other
//! difference in the bits is a different key.

pub(crate) fn normalize_float_for_hash(n: f64) -> u64 {
    if n.is_nan() {
        return f64::NAN.to_bits();
    }
    if n == 0.0 {
        // folds -0.0 onto +0.0
        return 0;
    }
    n.to_bits()
}
