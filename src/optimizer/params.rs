/// Perturbation-search tuning, named and defaulted the way the reference
/// search loop configures itself.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerParams {
    /// Maximum number of accepted-or-rejected perturbation attempts per
    /// block before giving up.
    pub num_iteration: u32,
    /// Number of individual length swaps applied per perturbation round.
    pub num_perturbation: u32,
    /// A candidate is only fully re-serialized and scored if its fast bit
    /// estimate is within this many bits of the current search base.
    pub tolerance_bit: i64,
    /// Search stops early once `best_score` drops to this value or below.
    pub terminate_threshold: u64,
    /// Seed for the perturbation RNG; fixes the search deterministically.
    pub seed: u64,
}

/// Probability a perturbation round swaps a literal/length code length
/// rather than a distance code length.
pub const LITLEN_PERTURBATION_PROBABILITY: f64 = 0.65;

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            num_iteration: 3000,
            num_perturbation: 3,
            tolerance_bit: 16,
            terminate_threshold: 0,
            seed: 0,
        }
    }
}
