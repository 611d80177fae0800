//! Configuration file support for Autoplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/autoplan/config.toml`.
//! Every field has a default, so partial files are fine.

use crate::{Equipment, Error, Result, Split};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.api_key`
pub const API_KEY_ENV: &str = "AUTOPLAN_API_KEY";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub progression: ProgressionConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub routine: RoutineConfig,

    #[serde(default)]
    pub loads: LoadConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Remote tracking service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_template_page_size")]
    pub template_page_size: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            page_size: default_page_size(),
            template_page_size: default_template_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Resolve the API key, preferring the environment over the file
    pub fn resolve_api_key(&self) -> Result<String> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => self
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "No API key configured (set {} or api.api_key)",
                        API_KEY_ENV
                    ))
                }),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// File holding the last scheduled split
    pub fn assignment_path(&self) -> PathBuf {
        self.data_dir.join("state").join("split_assignment.json")
    }

    /// File holding the last fetched remote routine list
    pub fn routine_cache_path(&self) -> PathBuf {
        self.data_dir.join("cache").join("routines.json")
    }
}

/// History analysis windows
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_sessions")]
    pub window_sessions: usize,

    #[serde(default = "default_week_days")]
    pub week_days: i64,

    #[serde(default = "default_recent_title_hours")]
    pub recent_title_hours: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_sessions: default_window_sessions(),
            week_days: default_week_days(),
            recent_title_hours: default_recent_title_hours(),
        }
    }
}

/// Progression parameters configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_rep_ceiling")]
    pub rep_ceiling: u32,

    #[serde(default = "default_increase_factor")]
    pub increase_factor: f64,

    #[serde(default = "default_rounding_increment_kg")]
    pub rounding_increment_kg: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            rep_ceiling: default_rep_ceiling(),
            increase_factor: default_increase_factor(),
            rounding_increment_kg: default_rounding_increment_kg(),
        }
    }
}

/// Exercise selection parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_standard_count")]
    pub standard_count: usize,

    #[serde(default = "default_core_count")]
    pub core_count: usize,

    #[serde(default = "default_cardio_count")]
    pub cardio_count: usize,

    #[serde(default = "default_abs_finishers")]
    pub abs_finishers: usize,

    #[serde(default = "default_recency_days")]
    pub recency_days: i64,

    #[serde(default = "default_abs_recency_days")]
    pub abs_recency_days: i64,

    #[serde(default = "default_variety_window_days")]
    pub variety_window_days: i64,

    #[serde(default = "default_variety_max_uses")]
    pub variety_max_uses: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            standard_count: default_standard_count(),
            core_count: default_core_count(),
            cardio_count: default_cardio_count(),
            abs_finishers: default_abs_finishers(),
            recency_days: default_recency_days(),
            abs_recency_days: default_abs_recency_days(),
            variety_window_days: default_variety_window_days(),
            variety_max_uses: default_variety_max_uses(),
        }
    }
}

impl SelectionConfig {
    /// Number of main exercises wanted for a split
    pub fn count_for(&self, split: Split) -> usize {
        match split {
            Split::Core => self.core_count,
            Split::Cardio => self.cardio_count,
            _ => self.standard_count,
        }
    }

    /// Number of abs finishers wanted for a split
    pub fn abs_count_for(&self, split: Split) -> usize {
        match split {
            Split::Core | Split::Cardio => 0,
            _ => self.abs_finishers,
        }
    }
}

/// Routine shape and set prescription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutineConfig {
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    #[serde(default = "default_max_supersets")]
    pub max_supersets: usize,

    #[serde(default = "default_min_entries")]
    pub min_entries: usize,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_cardio_entries")]
    pub cardio_entries: usize,

    #[serde(default = "default_sets_per_exercise")]
    pub sets_per_exercise: u32,

    #[serde(default = "default_reps")]
    pub default_reps: u32,

    #[serde(default = "default_hold_seconds")]
    pub hold_seconds: u32,

    #[serde(default = "default_cardio_seconds")]
    pub cardio_seconds: u32,

    #[serde(default = "default_superset_rest")]
    pub superset_rest_seconds: u32,

    #[serde(default = "default_solo_rest")]
    pub solo_rest_seconds: u32,

    #[serde(default = "default_finisher_rest")]
    pub finisher_rest_seconds: u32,
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            title_prefix: default_title_prefix(),
            max_supersets: default_max_supersets(),
            min_entries: default_min_entries(),
            max_entries: default_max_entries(),
            cardio_entries: default_cardio_entries(),
            sets_per_exercise: default_sets_per_exercise(),
            default_reps: default_reps(),
            hold_seconds: default_hold_seconds(),
            cardio_seconds: default_cardio_seconds(),
            superset_rest_seconds: default_superset_rest(),
            solo_rest_seconds: default_solo_rest(),
            finisher_rest_seconds: default_finisher_rest(),
        }
    }
}

/// Bounds on the number of routine entries for one split
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutineShape {
    pub max_supersets: usize,
    pub min_entries: usize,
    pub max_entries: usize,
}

impl RoutineConfig {
    pub fn shape_for(&self, split: Split) -> RoutineShape {
        match split {
            Split::Cardio => RoutineShape {
                max_supersets: 0,
                min_entries: self.cardio_entries,
                max_entries: self.cardio_entries,
            },
            _ => RoutineShape {
                max_supersets: self.max_supersets,
                min_entries: self.min_entries,
                max_entries: self.max_entries,
            },
        }
    }

    /// Title for the managed routine of a split
    pub fn title_for(&self, split: Split) -> String {
        format!("{}: {} Day", self.title_prefix, split)
    }

    /// Whether a remote routine title marks it as managed by this tool
    pub fn is_managed_title(&self, title: &str) -> bool {
        title
            .strip_prefix(self.title_prefix.as_str())
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

/// Conservative starting loads (kg) when no history exists
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_band_kg")]
    pub resistance_band: f64,

    #[serde(default = "default_dumbbell_kg")]
    pub dumbbell: f64,

    #[serde(default = "default_barbell_kg")]
    pub barbell: f64,

    #[serde(default = "default_machine_kg")]
    pub machine: f64,

    #[serde(default = "default_kettlebell_kg")]
    pub kettlebell: f64,

    #[serde(default = "default_other_kg")]
    pub other: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            resistance_band: default_band_kg(),
            dumbbell: default_dumbbell_kg(),
            barbell: default_barbell_kg(),
            machine: default_machine_kg(),
            kettlebell: default_kettlebell_kg(),
            other: default_other_kg(),
        }
    }
}

impl LoadConfig {
    pub fn default_for(&self, equipment: Equipment) -> f64 {
        match equipment {
            Equipment::None | Equipment::Suspension => 0.0,
            Equipment::ResistanceBand => self.resistance_band,
            Equipment::Dumbbell => self.dumbbell,
            Equipment::Barbell => self.barbell,
            Equipment::Machine => self.machine,
            Equipment::Kettlebell => self.kettlebell,
            Equipment::Plate | Equipment::Other => self.other,
        }
    }
}

/// Retry policy for remote calls
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

// Default value functions
fn home_relative(dir: &str) -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(dir),
        Err(_) => PathBuf::from(".").join(dir),
    }
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_relative(".local/share"));
    base.join("autoplan")
}

fn default_base_url() -> String {
    "https://api.hevyapp.com".into()
}

fn default_page_size() -> u32 {
    10
}

fn default_template_page_size() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_window_sessions() -> usize {
    30
}

fn default_week_days() -> i64 {
    7
}

fn default_recent_title_hours() -> i64 {
    24
}

fn default_rep_ceiling() -> u32 {
    10
}

fn default_increase_factor() -> f64 {
    1.05
}

fn default_rounding_increment_kg() -> f64 {
    0.25
}

fn default_standard_count() -> usize {
    6
}

fn default_core_count() -> usize {
    8
}

fn default_cardio_count() -> usize {
    1
}

fn default_abs_finishers() -> usize {
    3
}

fn default_recency_days() -> i64 {
    7
}

fn default_abs_recency_days() -> i64 {
    5
}

fn default_variety_window_days() -> i64 {
    21
}

fn default_variety_max_uses() -> u32 {
    3
}

fn default_title_prefix() -> String {
    "Autoplan".into()
}

fn default_max_supersets() -> usize {
    3
}

fn default_min_entries() -> usize {
    6
}

fn default_max_entries() -> usize {
    10
}

fn default_cardio_entries() -> usize {
    1
}

fn default_sets_per_exercise() -> u32 {
    3
}

fn default_reps() -> u32 {
    10
}

fn default_hold_seconds() -> u32 {
    30
}

fn default_cardio_seconds() -> u32 {
    1200
}

fn default_superset_rest() -> u32 {
    30
}

fn default_solo_rest() -> u32 {
    90
}

fn default_finisher_rest() -> u32 {
    60
}

fn default_band_kg() -> f64 {
    5.0
}

fn default_dumbbell_kg() -> f64 {
    10.0
}

fn default_barbell_kg() -> f64 {
    20.0
}

fn default_machine_kg() -> f64 {
    25.0
}

fn default_kettlebell_kg() -> f64 {
    12.0
}

fn default_other_kg() -> f64 {
    10.0
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_relative(".config"));
        base.join("autoplan").join("config.toml")
    }

    /// Reject values that would make the engine misbehave
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.analysis.window_sessions == 0 {
            return Err(Error::Config(
                "analysis.window_sessions must be at least 1".into(),
            ));
        }
        if self.progression.increase_factor < 1.0 {
            return Err(Error::Config(
                "progression.increase_factor must be >= 1.0".into(),
            ));
        }
        if self.routine.max_entries == 0 {
            return Err(Error::Config("routine.max_entries must be at least 1".into()));
        }
        if self.routine.max_entries < self.routine.min_entries {
            return Err(Error::Config(format!(
                "routine.max_entries ({}) must be >= routine.min_entries ({})",
                self.routine.max_entries, self.routine.min_entries
            )));
        }
        if self.routine.title_prefix.trim().is_empty() {
            return Err(Error::Config("routine.title_prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
