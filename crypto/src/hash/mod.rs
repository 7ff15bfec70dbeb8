pub mod poseidon;

pub use poseidon::{Poseidon, PoseidonError, MAX_WIDTH, MIN_WIDTH};
