pub mod app;
pub mod config;
pub mod staking;

pub use app::{ParamEntry, ParamsApp};
pub use config::GenesisConfig;
pub use staking::StakingParams;
