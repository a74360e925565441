use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::models::TodoRules;
use crate::models::todo::DEFAULT_TITLE_MAX_LEN;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub title_max_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://todo.db?mode=rwc".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_connections: 5,
            title_max_len: DEFAULT_TITLE_MAX_LEN,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| AppError::Config(format!("BIND_ADDR is not a socket address: {}", addr)))?;
        }
        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = match max.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AppError::Config(format!(
                        "DB_MAX_CONNECTIONS must be a positive integer, got {}",
                        max
                    )));
                }
            };
        }
        if let Some(len) = lookup("TODO_TITLE_MAX_LEN") {
            config.title_max_len = match len.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AppError::Config(format!(
                        "TODO_TITLE_MAX_LEN must be a positive integer, got {}",
                        len
                    )));
                }
            };
        }

        Ok(config)
    }

    pub fn todo_rules(&self) -> TodoRules {
        TodoRules {
            title_max_len: self.title_max_len,
        }
    }
}
