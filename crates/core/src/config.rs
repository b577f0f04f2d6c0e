use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::session::SessionHours;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub trading: TradingConfig,
    pub session: SessionConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the webhook payload must carry verbatim.
    pub webhook_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Stop-loss trigger as a multiple of entry price (e.g. 0.97).
    pub stop_loss_ratio: Decimal,
    /// Take-profit trigger as a multiple of entry price (e.g. 1.03).
    pub take_profit_ratio: Decimal,
    /// Once the contract trades above entry * this ratio, the stop is
    /// raised to break-even.
    pub break_even_ratio: Decimal,
    /// Decimal places of the instrument tick (US options: 2).
    pub tick_decimals: u32,
    /// Strikes taken on each side of the at-the-money index.
    pub strike_window: usize,
    /// Minimum seconds between entries.
    pub cooldown_secs: i64,
    /// Entry orders older than this are swept and canceled.
    pub pending_timeout_secs: i64,
    /// No entries this many minutes after open / before close.
    pub guard_minutes: i64,
    /// Fraction of the estimated max purchasable quantity to buy.
    pub quantity_fraction: Decimal,
    /// Report policy rejections as HTTP 403 instead of 200/no_action.
    pub policy_rejection_as_forbidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session open/close in the reference timezone; refreshed daily
    /// for daylight-saving shifts of the target market.
    pub hours: SessionHours,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Cron for the forced end-of-session close (reference-local time).
    pub forced_close_cron: String,
    /// Cron for the daily session-hours refresh.
    pub session_refresh_cron: String,
    /// Interval of the pending-order sweep.
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            webhook_token: String::new(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            stop_loss_ratio: Decimal::new(97, 2),
            take_profit_ratio: Decimal::new(103, 2),
            break_even_ratio: Decimal::new(11, 1),
            tick_decimals: 2,
            strike_window: 3,
            cooldown_secs: 600,
            pending_timeout_secs: 30,
            guard_minutes: 30,
            quantity_fraction: Decimal::ONE,
            policy_rejection_as_forbidden: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // US regular session seen from Asia/Shanghai during DST.
            hours: SessionHours::new(21, 30, 4, 0),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            // 03:45 reference-local, shortly before the 04:00 close.
            forced_close_cron: "0 45 3 * * *".to_string(),
            // Recompute hours before the session opens.
            session_refresh_cron: "0 0 12 * * *".to_string(),
            sweep_interval_secs: 5,
        }
    }
}
