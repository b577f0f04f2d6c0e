pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod session;

pub use config::{
    AppConfig, AuthConfig, ScheduleConfig, ServerConfig, SessionConfig, TradingConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{PolicyRejection, TradeError};
pub use events::{Direction, OrderSide, OrderStatus, OrderStatusEvent, TradeSignal};
pub use session::SessionHours;
