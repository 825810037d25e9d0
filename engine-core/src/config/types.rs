use crate::signals::SignalWeights;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub symbols: Vec<String>,
    pub signals: SignalsConfig,
    pub execution: ExecutionSectionConfig,
    pub risk: RiskSectionConfig,
    pub monitoring: MonitoringSectionConfig,
    pub cost: CostSectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsConfig {
    pub weights: SignalWeights,
    pub thresholds: ThresholdsConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub theta_1: f64,
    pub theta_2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSectionConfig {
    pub strategy: String,
    pub shallow_maker: ShallowMakerSectionConfig,
    pub ioc: IocSectionConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShallowMakerSectionConfig {
    pub timeout_high_secs: u64,
    pub timeout_medium_secs: u64,
    pub tick_offset: u32,
    pub post_only: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IocSectionConfig {
    pub fallback_on_high: bool,
    pub fallback_on_medium: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskSectionConfig {
    pub max_single_loss_pct: f64,
    pub max_daily_drawdown_pct: f64,
    pub max_position_usd: Decimal,
    #[serde(default = "default_worst_adverse_move_bps")]
    pub worst_adverse_move_bps: Decimal,
}

fn default_worst_adverse_move_bps() -> Decimal {
    Decimal::from(30)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSectionConfig {
    pub fill_rate: FillRateSectionConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FillRateSectionConfig {
    pub window_size: usize,
    pub alert_threshold_high: f64,
    pub alert_threshold_medium: f64,
    pub critical_threshold: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostSectionConfig {
    pub maker_fee_bps: Decimal,
    pub taker_fee_bps: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
