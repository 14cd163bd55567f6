use crate::cli::{AnalyzeArgs, DomainsArgs, SurfaceArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use serde::Deserialize;
use std::path::Path;
use surfpatch::engine::config::{
    AnalysisConfig, AnalysisConfigBuilder, DomainConfig, PeelingConfig,
};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPeelingConfig {
    probe_gap: Option<f64>,
    peel: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDomainConfig {
    enabled: Option<bool>,
    pae_power: Option<f64>,
    pae_cutoff: Option<f64>,
    resolution: Option<f64>,
    min_confidence: Option<f64>,
    min_domain_size: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCentralityConfig {
    max_patches: Option<usize>,
    accessibility_threshold: Option<f64>,
    max_solver_iterations: Option<usize>,
    solver_tolerance: Option<f64>,
}

/// Analysis settings as read from a TOML file, before CLI overrides.
///
/// Every key is optional; anything left unset falls back to the library
/// defaults when the final configuration is built.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    peeling: Option<PartialPeelingConfig>,
    domains: Option<PartialDomainConfig>,
    centrality: Option<PartialCentralityConfig>,
}

impl PartialAnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_analyze_args(mut self, args: &AnalyzeArgs) -> Result<AnalysisConfig> {
        self.apply_set_values(&args.set_values)?;

        let mut builder = self.into_builder();
        if let Some(n) = args.iterations {
            builder = builder.max_patches(n);
        }
        if let Some(gap) = args.probe_gap {
            builder = builder.probe_gap(gap);
        }
        if args.no_domains {
            builder = builder.split_domains(false);
        }
        if args.no_peel {
            builder = builder.peel(false);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_with_surface_args(self, args: &SurfaceArgs) -> Result<PeelingConfig> {
        let mut builder = self.into_builder();
        if let Some(gap) = args.probe_gap {
            builder = builder.probe_gap(gap);
        }
        if args.no_peel {
            builder = builder.peel(false);
        }

        let config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config.peeling)
    }

    pub fn merge_with_domains_args(mut self, args: &DomainsArgs) -> Result<DomainConfig> {
        self.apply_set_values(&args.set_values)?;

        let config = self
            .into_builder()
            .split_domains(true)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config.domains.unwrap_or_default())
    }

    fn into_builder(self) -> AnalysisConfigBuilder {
        let peeling = self.peeling.unwrap_or_default();
        let domains = self.domains.unwrap_or_default();
        let centrality = self.centrality.unwrap_or_default();

        let mut builder = AnalysisConfigBuilder::new();
        if let Some(v) = peeling.probe_gap {
            builder = builder.probe_gap(v);
        }
        if let Some(v) = peeling.peel {
            builder = builder.peel(v);
        }
        if let Some(v) = domains.enabled {
            builder = builder.split_domains(v);
        }
        if let Some(v) = domains.pae_power {
            builder = builder.pae_power(v);
        }
        if let Some(v) = domains.pae_cutoff {
            builder = builder.pae_cutoff(v);
        }
        if let Some(v) = domains.resolution {
            builder = builder.resolution(v);
        }
        if let Some(v) = domains.min_confidence {
            builder = builder.min_confidence(v);
        }
        if let Some(v) = domains.min_domain_size {
            builder = builder.min_domain_size(v);
        }
        if let Some(v) = centrality.max_patches {
            builder = builder.max_patches(v);
        }
        if let Some(v) = centrality.accessibility_threshold {
            builder = builder.accessibility_threshold(v);
        }
        if let Some(v) = centrality.max_solver_iterations {
            builder = builder.max_solver_iterations(v);
        }
        if let Some(v) = centrality.solver_tolerance {
            builder = builder.solver_tolerance(v);
        }
        builder
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            self.apply_set_value(kv_pair)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }
        Ok(())
    }

    fn apply_set_value(&mut self, kv_pair: &str) -> std::result::Result<(), ParseError> {
        let (key, value) = parser::parse_key_value(kv_pair)?;
        let float = |v: &str| parser::parse_value::<f64>(key, v, "float");
        let integer = |v: &str| parser::parse_value::<usize>(key, v, "integer");
        let boolean = |v: &str| parser::parse_value::<bool>(key, v, "boolean");

        match key {
            "peeling.probe-gap" => {
                self.peeling.get_or_insert_with(Default::default).probe_gap = Some(float(value)?)
            }
            "peeling.peel" => self.peeling.get_or_insert_with(Default::default).peel = Some(boolean(value)?),
            "domains.enabled" => {
                self.domains.get_or_insert_with(Default::default).enabled = Some(boolean(value)?)
            }
            "domains.pae-power" => {
                self.domains.get_or_insert_with(Default::default).pae_power = Some(float(value)?)
            }
            "domains.pae-cutoff" => {
                self.domains.get_or_insert_with(Default::default).pae_cutoff = Some(float(value)?)
            }
            "domains.resolution" => {
                self.domains.get_or_insert_with(Default::default).resolution = Some(float(value)?)
            }
            "domains.min-confidence" => {
                self.domains.get_or_insert_with(Default::default).min_confidence = Some(float(value)?)
            }
            "domains.min-domain-size" => {
                self.domains.get_or_insert_with(Default::default).min_domain_size = Some(integer(value)?)
            }
            "centrality.max-patches" => {
                self.centrality.get_or_insert_with(Default::default).max_patches = Some(integer(value)?)
            }
            "centrality.accessibility-threshold" => {
                self.centrality
                    .get_or_insert_with(Default::default)
                    .accessibility_threshold = Some(float(value)?)
            }
            "centrality.max-solver-iterations" => {
                self.centrality
                    .get_or_insert_with(Default::default)
                    .max_solver_iterations = Some(integer(value)?)
            }
            "centrality.solver-tolerance" => {
                self.centrality.get_or_insert_with(Default::default).solver_tolerance =
                    Some(float(value)?)
            }
            _ => {
                return Err(ParseError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "supported configuration key",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn analyze_args(extra: &[&str]) -> AnalyzeArgs {
        let mut args = vec![
            "surfpatch",
            "analyze",
            "-i",
            "in.pdb",
            "-c",
            "cons.json",
            "-o",
            "out.json",
        ];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Analyze(args) => args,
            other => panic!("Expected 'analyze' subcommand, got {other:?}"),
        }
    }

    const FILE_CONFIG: &str = r#"
        [peeling]
        probe-gap = 3.1

        [domains]
        pae-cutoff = 6.0
        min-domain-size = 25

        [centrality]
        max-patches = 7
        "#;

    #[test]
    fn file_values_are_merged_with_defaults() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "config.toml", FILE_CONFIG);

        let config = PartialAnalysisConfig::from_file(&path)
            .unwrap()
            .merge_with_analyze_args(&analyze_args(&[]))
            .unwrap();

        assert_eq!(config.peeling.probe_gap, 3.1);
        assert!(config.peeling.peel);
        let domains = config.domains.unwrap();
        assert_eq!(domains.pae_cutoff, 6.0);
        assert_eq!(domains.min_domain_size, 25);
        assert_eq!(domains.min_confidence, 70.0);
        assert_eq!(config.centrality.max_patches, 7);
        assert_eq!(config.centrality.accessibility_threshold, 0.001);
    }

    #[test]
    fn cli_flags_override_set_values_and_file() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "config.toml", FILE_CONFIG);
        let args = analyze_args(&[
            "-n",
            "3",
            "-S",
            "centrality.max-patches=12",
            "-S",
            "peeling.probe-gap=4.0",
            "--no-domains",
            "--no-peel",
        ]);

        let config = PartialAnalysisConfig::from_file(&path)
            .unwrap()
            .merge_with_analyze_args(&args)
            .unwrap();

        assert_eq!(config.centrality.max_patches, 3);
        assert_eq!(config.peeling.probe_gap, 4.0);
        assert!(!config.peeling.peel);
        assert!(config.domains.is_none());
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = PartialAnalysisConfig::load(None)
            .unwrap()
            .merge_with_analyze_args(&analyze_args(&[]))
            .unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "bad.toml", "[peeling]\nprobe-radius = 1.4\n");

        let result = PartialAnalysisConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn bad_set_values_are_config_errors() {
        for bad in [
            "centrality.max-patches",
            "centrality.max-patches=many",
            "output.format=json",
        ] {
            let result =
                PartialAnalysisConfig::default().merge_with_analyze_args(&analyze_args(&["-S", bad]));
            assert!(
                matches!(result, Err(CliError::Config(_))),
                "'{bad}' was accepted"
            );
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let result = PartialAnalysisConfig::default()
            .merge_with_analyze_args(&analyze_args(&["-S", "domains.pae-cutoff=-2"]));
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("pae_cutoff")),
            other => panic!("Expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn domains_command_always_gets_a_domain_config() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "off.toml", "[domains]\nenabled = false\nresolution = 0.5\n");
        let cli = Cli::parse_from(["surfpatch", "domains", "-i", "in.pdb", "--pae", "pae.json"]);
        let Commands::Domains(args) = cli.command else {
            panic!("Expected 'domains' subcommand");
        };

        let config = PartialAnalysisConfig::from_file(&path)
            .unwrap()
            .merge_with_domains_args(&args)
            .unwrap();
        assert_eq!(config.resolution, 0.5);
    }

    #[test]
    fn surface_flags_shape_the_peeling_config() {
        let cli = Cli::parse_from([
            "surfpatch",
            "surface",
            "-i",
            "in.pdb",
            "--probe-gap",
            "2.0",
            "--no-peel",
        ]);
        let Commands::Surface(args) = cli.command else {
            panic!("Expected 'surface' subcommand");
        };

        let config = PartialAnalysisConfig::default()
            .merge_with_surface_args(&args)
            .unwrap();
        assert_eq!(config.probe_gap, 2.0);
        assert!(!config.peel);
    }
}
