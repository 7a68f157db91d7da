use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub restaurant: RestaurantConfig,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub staff: StaffConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub menu: Vec<MenuEntry>,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestaurantConfig {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PriorityConfig {
    /// Item-count ceilings for tiers 1 to 4.
    pub thresholds: [u32; 4],
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            thresholds: [2, 4, 6, 8],
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StaffConfig {
    #[serde(default)]
    pub chefs: Vec<StaffEntry>,
    #[serde(default)]
    pub couriers: Vec<StaffEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StaffEntry {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
}

fn default_tick_ms() -> u64 { 250 }
fn default_max_ticks() -> u32 { 200 }

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MenuEntry {
    pub id: u64,
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    #[serde(default = "default_demo_orders")]
    pub orders: usize,
}

fn default_demo_orders() -> usize { 5 }

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            orders: default_demo_orders(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `BISTRO__WORKER__TICK_MS=50`
            .add_source(config::Environment::with_prefix("BISTRO").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
