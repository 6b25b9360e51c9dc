use std::{env, net::SocketAddr};

use anyhow::{anyhow, Context};
use pillbox_domain::medications::SummaryOptions;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub summary: SummaryOptions,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("PILLBOX_BIND_ADDR")
            .unwrap_or("127.0.0.1:3000".to_string())
            .parse()
            .context("PILLBOX_BIND_ADDR must be a socket address")?;

        let offset_minutes: i32 = lookup("PILLBOX_UTC_OFFSET_MINUTES")
            .unwrap_or("0".to_string())
            .parse()
            .context("PILLBOX_UTC_OFFSET_MINUTES must be an integer")?;

        let summary = SummaryOptions::with_offset_minutes(offset_minutes)
            .ok_or_else(|| anyhow!("UTC offset out of range: {} minutes", offset_minutes))?;

        Ok(Self { bind_addr, summary })
    }
}
