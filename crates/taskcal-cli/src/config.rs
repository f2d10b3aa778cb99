use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// CLI configuration, layered defaults < `taskcal.toml` < `TASKCAL_*` env.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database_path: String,
    /// Minimum materialization lookahead past a requested window, in days.
    pub lookahead_days: i64,
    /// Upper bound on instances created in one materialization pass.
    pub max_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "taskcal.db".to_string(),
            lookahead_days: 31,
            max_batch_size: 500,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    let config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file("taskcal.toml"))
        .merge(Env::prefixed("TASKCAL_"))
        .extract()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TASKCAL_DATABASE_PATH", "/tmp/other.db");
            jail.set_env("TASKCAL_LOOKAHEAD_DAYS", "90");
            let config = load().expect("config should load");
            assert_eq!(config.database_path, "/tmp/other.db");
            assert_eq!(config.lookahead_days, 90);
            assert_eq!(config.max_batch_size, 500);
            Ok(())
        });
    }
}
