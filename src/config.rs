/// Default snap tolerance of join operations, in drawing units.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 10.0;

/// Settings of the join, split and merge operations.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinConfig {
    /// Maximum positional deviation for two points to be treated as
    /// coincident. Default: 10 drawing units.
    pub tolerance: f64,

    /// Auto-join gives up after `pass_limit_factor * (walls + 1)^2`
    /// resolutions; 0 refuses any resolution. Default: 4.
    pub pass_limit_factor: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_SNAP_TOLERANCE,
            pass_limit_factor: 4,
        }
    }
}

impl JoinConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the snap tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder-style setter for the auto-join pass limit factor.
    #[must_use]
    pub fn with_pass_limit_factor(mut self, factor: usize) -> Self {
        self.pass_limit_factor = factor;
        self
    }
}

/// Settings of the undo history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of undoable commands. Default: 100.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }
}
