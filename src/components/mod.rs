//! Reusable subcircuit definitions.

pub mod adder;
pub mod gates;

use crate::loader::MemoryLoader;

/// A loader holding every definition in this module under its type name.
pub fn library() -> MemoryLoader {
    MemoryLoader::new()
        .with(gates::XOR, gates::xor())
        .with(adder::SUM, adder::sum())
        .with(adder::CARRY, adder::carry())
}
