use crate::dose::RoundingPolicy;
use crate::plan::MAX_PLAN_ID_LENGTH;

pub struct Config {
    /// Suppresses the banner printed at start-up.
    pub no_banner: bool,
    /// 0 prints everything, 1 skips headers, 2 prints results only.
    pub quiet: u8,
    /// How EQD2 doses are quantized back into voxel values.
    pub rounding: RoundingPolicy,
    /// Upper bound on the length of generated plan identifiers.
    pub max_id_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_banner: false,
            quiet: 0,
            rounding: RoundingPolicy::default(),
            max_id_length: MAX_PLAN_ID_LENGTH,
        }
    }
}
