use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

pub use crate::errors::ConfigError;

const MIN_DPI: u32 = 72;
const MAX_DPI: u32 = 600;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub render: RenderConfig,
    pub orders: OrderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Where uploaded files land.
    pub base_path: PathBuf,
    /// Where composed image layouts are written.
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub dpi: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfig {
    pub max_copies: u32,
    /// Largest document, in pages, that can be quoted or queued.
    pub max_pages: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
        };

        let base_path = std::env::var("STORAGE_PATH")
            .unwrap_or_else(|_| "/usr/local/share/print_kiosk".to_string());
        let storage = StorageConfig {
            base_path: PathBuf::from(&base_path),
            output_path: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(&base_path).join("outputs")),
        };

        let dpi = std::env::var("RENDER_DPI").unwrap_or_else(|_| "150".to_string());
        let render = RenderConfig {
            dpi: dpi
                .parse()
                .map_err(|_| ConfigError::InvalidDpi { value: dpi.clone() })?,
        };

        let max_copies = std::env::var("MAX_COPIES").unwrap_or_else(|_| "99".to_string());
        let max_pages = std::env::var("MAX_PAGES").unwrap_or_else(|_| "2000".to_string());
        let orders = OrderConfig {
            max_copies: max_copies
                .parse()
                .map_err(|_| ConfigError::InvalidMaxCopies {
                    value: max_copies.clone(),
                })?,
            max_pages: max_pages
                .parse()
                .map_err(|_| ConfigError::InvalidMaxPages {
                    value: max_pages.clone(),
                })?,
        };

        let config = Config {
            server,
            storage,
            render,
            orders,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if !(MIN_DPI..=MAX_DPI).contains(&self.render.dpi) {
            return Err(ConfigError::InvalidDpi {
                value: self.render.dpi.to_string(),
            });
        }

        if self.orders.max_copies == 0 {
            return Err(ConfigError::InvalidMaxCopies {
                value: self.orders.max_copies.to_string(),
            });
        }

        if self.orders.max_pages == 0 {
            return Err(ConfigError::InvalidMaxPages {
                value: self.orders.max_pages.to_string(),
            });
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| ConfigError::InvalidPort)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.storage.base_path.clone()
    }

    pub fn outputs_path(&self) -> PathBuf {
        self.storage.output_path.clone()
    }
}
