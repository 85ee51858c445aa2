//! Total-order mapping of float bit patterns to signed integer bit patterns
//! (spec.md §4.1 "Numeric comparisons use sortable encodings for floating
//! types ... so that lexicographic integer compares yield float ordering").
//!
//! The trick: flip the sign bit of a non-negative float's bit pattern, or
//! flip every bit of a negative float's bit pattern. Either transform is its
//! own inverse, so encode and decode share the same shape.

pub fn f64_to_sortable(v: f64) -> i64 {
    let bits = v.to_bits() as i64;
    if bits >= 0 {
        bits ^ i64::MIN
    } else {
        !bits
    }
}

pub fn sortable_to_f64(s: i64) -> f64 {
    let bits = if s < 0 { s ^ i64::MIN } else { !s };
    f64::from_bits(bits as u64)
}

pub fn f32_to_sortable(v: f32) -> i32 {
    let bits = v.to_bits() as i32;
    if bits >= 0 {
        bits ^ i32::MIN
    } else {
        !bits
    }
}

pub fn sortable_to_f32(s: i32) -> f32 {
    let bits = if s < 0 { s ^ i32::MIN } else { !s };
    f32::from_bits(bits as u32)
}
