use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_STAGE_DELAY_MS: u64 = 2000;
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Ninguna etapa espera menos que esto, aunque se configure 0.
pub const MIN_STAGE_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub stage_delay: Duration,
    pub recent_limit: usize,
    /// Si está, el generador de datos es determinista.
    pub seed: Option<u64>,
}

impl Config {
    /// Lee la configuración de variables de entorno:
    /// - TRENDCAST_BIND_ADDR      (default 0.0.0.0:8000)
    /// - TRENDCAST_STAGE_DELAY_MS (default 2000)
    /// - TRENDCAST_RECENT_LIMIT   (default 10)
    /// - TRENDCAST_SEED           (opcional)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("TRENDCAST_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("TRENDCAST_BIND_ADDR inválida")?;

        let stage_delay_ms = match lookup("TRENDCAST_STAGE_DELAY_MS") {
            Some(s) => s
                .parse::<u64>()
                .context("TRENDCAST_STAGE_DELAY_MS debe ser un entero")?,
            None => DEFAULT_STAGE_DELAY_MS,
        };

        let recent_limit = match lookup("TRENDCAST_RECENT_LIMIT") {
            Some(s) => s
                .parse::<usize>()
                .context("TRENDCAST_RECENT_LIMIT debe ser un entero")?,
            None => DEFAULT_RECENT_LIMIT,
        };

        let seed = lookup("TRENDCAST_SEED")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("TRENDCAST_SEED debe ser un u64")?;

        Ok(Self {
            bind_addr,
            stage_delay: clamp_delay(Duration::from_millis(stage_delay_ms)),
            recent_limit,
            seed,
        })
    }
}

pub fn clamp_delay(d: Duration) -> Duration {
    d.max(MIN_STAGE_DELAY)
}
