pub mod rle_dp;

pub use rle_dp::{ClEmission, RleDpCache};
