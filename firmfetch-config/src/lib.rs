//! Loader for firmfetch configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, the YAML file (if any), then
//! `FIRMFETCH__`-prefixed environment variables using `__` as the section
//! separator (`FIRMFETCH__DOWNLOAD__DIR=/srv/fw`). String values may contain
//! `${VAR}` placeholders which are expanded after merging.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde_json::Value;
use std::path::Path;

pub mod schema;

pub use schema::{
    BrowserConfig, DownloadConfig, EmptyPolicy, FirmfetchConfig, LoggingConfig, ProbeKind,
    ProbeSpec, ScanConfig, SearchEntry, SelectorConfig, SiteConfig, TargetSpec, TimingConfig,
    WindowSize, default_targets,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "FIRMFETCH";

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FirmfetchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FirmfetchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FirmfetchConfigLoader {
    /// Start from the built-in defaults; environment overrides are applied at [`load`](Self::load).
    ///
    /// ```
    /// use firmfetch_config::FirmfetchConfigLoader;
    ///
    /// let config = FirmfetchConfigLoader::new().load().expect("defaults are valid");
    /// assert_eq!(config.targets.len(), 21);
    /// assert_eq!(config.download.dir, "downloads");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use firmfetch_config::{EmptyPolicy, FirmfetchConfigLoader};
    ///
    /// let cfg = FirmfetchConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// on_empty: prompt
    /// targets:
    ///   - code: US008
    ///     name: Ubuntu Server 20.04 LTS
    ///     fallbacks: [US001, US004, RHEL9, RHEL8]
    ///     verify: ubuntu
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.on_empty, EmptyPolicy::Prompt);
    /// assert_eq!(cfg.targets.len(), 1);
    /// assert_eq!(cfg.targets[0].fallbacks.len(), 4);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use firmfetch_config::FirmfetchConfigLoader;
    ///
    /// unsafe { std::env::set_var("FW_ROOT", "/srv/firmware"); }
    ///
    /// let config = FirmfetchConfigLoader::new()
    ///     .with_yaml_str("download:\n  dir: \"${FW_ROOT}/r440\"\n")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.download.dir, "/srv/firmware/r440");
    ///
    /// unsafe { std::env::remove_var("FW_ROOT"); }
    /// ```
    pub fn load(self) -> Result<FirmfetchConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        let typed: FirmfetchConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        validate(&typed)?;
        Ok(typed)
    }
}

/// Reject configurations that cannot produce a meaningful run.
pub fn validate(cfg: &FirmfetchConfig) -> Result<(), ConfigError> {
    if cfg.targets.is_empty() {
        return Err(ConfigError::Message("at least one target is required".into()));
    }
    if let Some(t) = cfg.targets.iter().find(|t| t.code.trim().is_empty()) {
        return Err(ConfigError::Message(format!(
            "target '{}' has an empty code",
            t.name
        )));
    }
    if cfg.scan.extensions.iter().all(|e| e.trim().is_empty()) {
        return Err(ConfigError::Message(
            "scan.extensions must name at least one extension".into(),
        ));
    }
    if cfg.download.timeout_secs == 0 {
        return Err(ConfigError::Message(
            "download.timeout_secs must be greater than zero".into(),
        ));
    }
    if let Some(t) = cfg
        .selectors
        .option_templates
        .iter()
        .find(|t| !t.contains("{code}"))
    {
        return Err(ConfigError::Message(format!(
            "selectors.option_templates entry '{t}' lacks a {{code}} placeholder"
        )));
    }
    Ok(())
}
