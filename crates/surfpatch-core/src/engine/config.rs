use thiserror::Error;

pub const DEFAULT_PROBE_GAP: f64 = 2.8;
pub const DEFAULT_PAE_POWER: f64 = 1.0;
pub const DEFAULT_PAE_CUTOFF: f64 = 5.0;
pub const DEFAULT_GRAPH_RESOLUTION: f64 = 1.0;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 70.0;
pub const DEFAULT_MIN_DOMAIN_SIZE: usize = 30;
pub const DEFAULT_MAX_PATCHES: usize = 20;
pub const DEFAULT_ACCESSIBILITY_THRESHOLD: f64 = 0.001;
pub const DEFAULT_MAX_SOLVER_ITERATIONS: usize = 1000;
pub const DEFAULT_SOLVER_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeelingConfig {
    /// Minimum surface-to-surface gap (Å) between two atoms of a boundary face
    /// for the tetrahedron behind it to be eroded.
    pub probe_gap: f64,
    /// When false only the hull of the tetrahedralization counts as surface.
    pub peel: bool,
}

impl Default for PeelingConfig {
    fn default() -> Self {
        Self {
            probe_gap: DEFAULT_PROBE_GAP,
            peel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainConfig {
    pub pae_power: f64,
    pub pae_cutoff: f64,
    pub resolution: f64,
    pub min_confidence: f64,
    pub min_domain_size: usize,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            pae_power: DEFAULT_PAE_POWER,
            pae_cutoff: DEFAULT_PAE_CUTOFF,
            resolution: DEFAULT_GRAPH_RESOLUTION,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_domain_size: DEFAULT_MIN_DOMAIN_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralityConfig {
    pub max_patches: usize,
    pub accessibility_threshold: f64,
    pub max_solver_iterations: usize,
    pub solver_tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            max_patches: DEFAULT_MAX_PATCHES,
            accessibility_threshold: DEFAULT_ACCESSIBILITY_THRESHOLD,
            max_solver_iterations: DEFAULT_MAX_SOLVER_ITERATIONS,
            solver_tolerance: DEFAULT_SOLVER_TOLERANCE,
        }
    }
}

/// Full configuration of an analysis run.
///
/// `domains` is `None` when domain splitting is disabled; every chain is
/// then analysed as a single unit. Splitting is on by default but only takes
/// effect when a PAE matrix is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub peeling: PeelingConfig,
    pub domains: Option<DomainConfig>,
    pub centrality: CentralityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            peeling: PeelingConfig::default(),
            domains: Some(DomainConfig::default()),
            centrality: CentralityConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    probe_gap: Option<f64>,
    peel: Option<bool>,
    split_domains: Option<bool>,
    pae_power: Option<f64>,
    pae_cutoff: Option<f64>,
    resolution: Option<f64>,
    min_confidence: Option<f64>,
    min_domain_size: Option<usize>,
    max_patches: Option<usize>,
    accessibility_threshold: Option<f64>,
    max_solver_iterations: Option<usize>,
    solver_tolerance: Option<f64>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe_gap(mut self, gap: f64) -> Self {
        self.probe_gap = Some(gap);
        self
    }
    pub fn peel(mut self, peel: bool) -> Self {
        self.peel = Some(peel);
        self
    }
    pub fn split_domains(mut self, enabled: bool) -> Self {
        self.split_domains = Some(enabled);
        self
    }
    pub fn pae_power(mut self, power: f64) -> Self {
        self.pae_power = Some(power);
        self
    }
    pub fn pae_cutoff(mut self, cutoff: f64) -> Self {
        self.pae_cutoff = Some(cutoff);
        self
    }
    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = Some(confidence);
        self
    }
    pub fn min_domain_size(mut self, size: usize) -> Self {
        self.min_domain_size = Some(size);
        self
    }
    pub fn max_patches(mut self, n: usize) -> Self {
        self.max_patches = Some(n);
        self
    }
    pub fn accessibility_threshold(mut self, threshold: f64) -> Self {
        self.accessibility_threshold = Some(threshold);
        self
    }
    pub fn max_solver_iterations(mut self, iterations: usize) -> Self {
        self.max_solver_iterations = Some(iterations);
        self
    }
    pub fn solver_tolerance(mut self, tolerance: f64) -> Self {
        self.solver_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let peeling = PeelingConfig {
            probe_gap: non_negative(
                "probe_gap",
                self.probe_gap.unwrap_or(DEFAULT_PROBE_GAP),
            )?,
            peel: self.peel.unwrap_or(true),
        };

        let domains = if self.split_domains.unwrap_or(true) {
            Some(DomainConfig {
                pae_power: non_negative(
                    "pae_power",
                    self.pae_power.unwrap_or(DEFAULT_PAE_POWER),
                )?,
                pae_cutoff: positive(
                    "pae_cutoff",
                    self.pae_cutoff.unwrap_or(DEFAULT_PAE_CUTOFF),
                )?,
                resolution: positive(
                    "resolution",
                    self.resolution.unwrap_or(DEFAULT_GRAPH_RESOLUTION),
                )?,
                min_confidence: finite(
                    "min_confidence",
                    self.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
                )?,
                min_domain_size: self.min_domain_size.unwrap_or(DEFAULT_MIN_DOMAIN_SIZE),
            })
        } else {
            None
        };

        let max_patches = self.max_patches.unwrap_or(DEFAULT_MAX_PATCHES);
        if max_patches == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_patches",
                reason: "at least one iteration is required".to_string(),
            });
        }
        let max_solver_iterations = self
            .max_solver_iterations
            .unwrap_or(DEFAULT_MAX_SOLVER_ITERATIONS);
        if max_solver_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_solver_iterations",
                reason: "must be greater than zero".to_string(),
            });
        }
        let centrality = CentralityConfig {
            max_patches,
            accessibility_threshold: finite(
                "accessibility_threshold",
                self.accessibility_threshold
                    .unwrap_or(DEFAULT_ACCESSIBILITY_THRESHOLD),
            )?,
            max_solver_iterations,
            solver_tolerance: positive(
                "solver_tolerance",
                self.solver_tolerance.unwrap_or(DEFAULT_SOLVER_TOLERANCE),
            )?,
        };

        Ok(AnalysisConfig {
            peeling,
            domains,
            centrality,
        })
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{value} is not a finite number"),
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{value} must not be negative"),
        });
    }
    Ok(value)
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(name, value)?;
    if value <= 0.0 {
        return Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{value} must be greater than zero"),
        });
    }
    Ok(value)
}
