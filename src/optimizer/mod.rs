pub mod header_builder;
pub mod params;
pub mod search;

pub use params::OptimizerParams;
pub use search::{optimize_deflate_block, optimize_deflate_stream, BlockOptimizeResult};
