pub mod api;
pub mod config;
pub mod core;
pub mod db;

pub use db::DbPool;

use config::Config;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        Self { config, db }
    }
}
