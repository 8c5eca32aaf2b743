/// Applied to the sample standard deviation before it is used anywhere.
///
/// Matches the legacy TTT calculator the pacing bands are calibrated against.
pub const SAMPLE_STDDEV_CALIBRATION_FACTOR: f64 = 0.5;

/// Smallest team the options accept
pub const MIN_RIDERS: usize = 3;

/// Largest team the options accept
pub const MAX_RIDERS: usize = 8;

/// Default team size
pub const DEFAULT_RIDERS: usize = 8;

/// Default average pull duration in seconds
pub const DEFAULT_TARGET_TURN_LENGTH: u32 = 30;

/// Default exponent applied to a rider's relative strength
pub const DEFAULT_REFERENCE_POWER_SCALE: f64 = 3.0;

/// Turn lengths are reported to the nearest multiple of this many seconds
pub const TURN_LENGTH_ROUNDING_SECONDS: f64 = 5.0;

/// Scalar multipliers per effort level (easy, medium, hard)
pub const EFFORT_MULTIPLIERS: [f64; 3] = [1.25, 1.3, 1.35];
