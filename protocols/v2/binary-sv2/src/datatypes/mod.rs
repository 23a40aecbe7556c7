mod copy_data_types;
mod non_copy_data_types;

pub use copy_data_types::{U24, U256};
pub use non_copy_data_types::{Seq0255, Seq064K, Str0255, B016M, B0255, B032, B064K};
