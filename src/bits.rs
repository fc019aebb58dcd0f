use std::ops::{BitAnd, Shl};

use num_traits::Unsigned;

/// A multi-bit signal, index 0 first.
pub type Bits = Vec<bool>;

/// Sets `bits[index]`, growing the vector with `false` as needed.
pub fn set_bit(bits: &mut Bits, index: usize, value: bool) {
    if index >= bits.len() {
        bits.resize(index + 1, false);
    }
    bits[index] = value;
}

/// Reads the vector as an unsigned integer, bit 0 being the least significant.
///
/// Bits beyond the width of `T` are ignored.
pub fn read<T>(bits: &[bool]) -> T
where
    T: Unsigned + Shl<usize, Output = T>,
{
    let width = std::mem::size_of::<T>() * 8;
    let mut sum = T::zero();
    for (bit, active) in bits.iter().cloned().enumerate().take(width) {
        if active {
            sum = sum + (T::one() << bit);
        }
    }
    sum
}

/// The lowest `width` bits of `val`.
pub fn from_uint<T>(val: T, width: usize) -> Bits
where
    T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
{
    let max = std::mem::size_of::<T>() * 8;
    (0..width)
        .map(|bit| bit < max && (val & (T::one() << bit)).is_one())
        .collect()
}

pub fn format(bits: &[bool]) -> String {
    bits.iter().map(|&bit| if bit { '1' } else { '0' }).collect()
}
