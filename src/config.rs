use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::events::Resolution;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub topology: TopologyConfig,
    pub timing: TimingConfig,
    pub windows: WindowsConfig,
    pub escalation: EscalationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Исходная конфигурация экранов (например, с подключённой док-станцией)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopologyConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    pub poll_period_ms: u64,
    pub capture_debounce_ms: u64,
    pub restore_settle_ms: u64,
    pub fullscreen_settle_ms: u64,
    /// Пауза между снятием и возвратом fullscreen у активированного окна
    pub activation_settle_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowsConfig {
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EscalationConfig {
    #[serde(default)]
    pub target: Option<String>,
    pub delay_ms: u64,
}

/// Значения из командной строки, перекрывающие файл и окружение
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub poll_period_ms: Option<u64>,
    pub capture_debounce_ms: Option<u64>,
    pub restore_settle_ms: Option<u64>,
    pub fullscreen_settle_ms: Option<u64>,
    pub exclude: Option<Vec<String>>,
    pub escalation_target: Option<String>,
    pub escalation_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "full".to_string(),
            },
            topology: TopologyConfig {
                width: 0,
                height: 0,
            },
            timing: TimingConfig {
                poll_period_ms: 5000,
                capture_debounce_ms: 2000,
                restore_settle_ms: 2000,
                fullscreen_settle_ms: 1000,
                activation_settle_ms: 3000,
            },
            windows: WindowsConfig {
                exclude: vec!["nemo-desktop".to_string(), "Desktop".to_string()],
            },
            escalation: EscalationConfig {
                target: None,
                delay_ms: 0,
            },
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&Path>, overrides: CliOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        let figment = figment.merge(Env::prefixed("WINRESTORE_").split("__"));

        let mut config: Config = figment.extract().with_context(|| match config_path {
            Some(path) => format!("Не удалось загрузить конфигурацию из {:?}", path),
            None => "Не удалось загрузить конфигурацию из окружения".to_string(),
        })?;

        config.apply_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(width) = overrides.width {
            self.topology.width = width;
        }
        if let Some(height) = overrides.height {
            self.topology.height = height;
        }
        if let Some(ms) = overrides.poll_period_ms {
            self.timing.poll_period_ms = ms;
        }
        if let Some(ms) = overrides.capture_debounce_ms {
            self.timing.capture_debounce_ms = ms;
        }
        if let Some(ms) = overrides.restore_settle_ms {
            self.timing.restore_settle_ms = ms;
        }
        if let Some(ms) = overrides.fullscreen_settle_ms {
            self.timing.fullscreen_settle_ms = ms;
        }
        if let Some(exclude) = overrides.exclude {
            self.windows.exclude = exclude;
        }
        if let Some(target) = overrides.escalation_target {
            self.escalation.target = Some(target);
        }
        if let Some(ms) = overrides.escalation_delay_ms {
            self.escalation.delay_ms = ms;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.topology.width == 0 || self.topology.height == 0 {
            anyhow::bail!(
                "Исходное разрешение должно быть задано (-x и -y), получено {}x{}",
                self.topology.width,
                self.topology.height
            );
        }

        if self.timing.poll_period_ms == 0 {
            anyhow::bail!("poll_period_ms должно быть больше 0");
        }

        for (i, title) in self.windows.exclude.iter().enumerate() {
            if title.is_empty() {
                anyhow::bail!("Пустой заголовок в списке исключений #{}", i + 1);
            }
        }

        if let Some(target) = &self.escalation.target {
            if target.is_empty() {
                anyhow::bail!("Заголовок окна для активации не может быть пустым");
            }
        }

        Ok(())
    }

    pub fn original_resolution(&self) -> Resolution {
        Resolution::new(self.topology.width, self.topology.height)
    }

    pub fn exclusions(&self) -> HashSet<String> {
        self.windows.exclude.iter().cloned().collect()
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.timing.poll_period_ms)
    }

    pub fn capture_debounce(&self) -> Duration {
        Duration::from_millis(self.timing.capture_debounce_ms)
    }

    pub fn restore_settle(&self) -> Duration {
        Duration::from_millis(self.timing.restore_settle_ms)
    }

    pub fn fullscreen_settle(&self) -> Duration {
        Duration::from_millis(self.timing.fullscreen_settle_ms)
    }

    pub fn activation_settle(&self) -> Duration {
        Duration::from_millis(self.timing.activation_settle_ms)
    }

    pub fn escalation_delay(&self) -> Duration {
        Duration::from_millis(self.escalation.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn with_resolution(width: u32, height: u32) -> CliOverrides {
        CliOverrides {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_needs_resolution() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.apply_overrides(with_resolution(1920, 1080));
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_period(), Duration::from_millis(5000));
        assert_eq!(config.capture_debounce(), Duration::from_millis(2000));
        assert_eq!(config.restore_settle(), Duration::from_millis(2000));
        assert_eq!(config.fullscreen_settle(), Duration::from_millis(1000));
        assert_eq!(config.activation_settle(), Duration::from_millis(3000));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.apply_overrides(with_resolution(1920, 1080));

        let mut bad = config.clone();
        bad.timing.poll_period_ms = 0;
        assert!(bad.validate().is_err());

        let mut bad = config.clone();
        bad.logging.level = "verbose".to_string();
        assert!(bad.validate().is_err());

        let mut bad = config.clone();
        bad.escalation.target = Some(String::new());
        assert!(bad.validate().is_err());

        let mut bad = config;
        bad.windows.exclude = vec!["Desktop".to_string(), String::new()];
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_replace_exclusions() {
        let mut config = Config::default();
        config.apply_overrides(CliOverrides {
            exclude: Some(vec!["conky".to_string()]),
            escalation_target: Some("Slack".to_string()),
            escalation_delay_ms: Some(1500),
            ..with_resolution(2560, 1440)
        });

        assert_eq!(config.exclusions(), HashSet::from(["conky".to_string()]));
        assert_eq!(config.escalation.target.as_deref(), Some("Slack"));
        assert_eq!(config.escalation_delay(), Duration::from_millis(1500));
        assert_eq!(config.original_resolution(), Resolution::new(2560, 1440));
    }

    #[test]
    fn test_load_layers_file_env_and_cli() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "winrestore.toml",
                r#"
                    [timing]
                    poll_period_ms = 1000
                    restore_settle_ms = 3000
                    activation_settle_ms = 1500

                    [windows]
                    exclude = ["Desktop", "xfce4-panel"]

                    [escalation]
                    target = "Mail"
                "#,
            )?;
            jail.set_env("WINRESTORE_TIMING__RESTORE_SETTLE_MS", "4000");

            let config = Config::load(
                Some(Path::new("winrestore.toml")),
                CliOverrides {
                    poll_period_ms: Some(250),
                    ..with_resolution(1920, 1080)
                },
            )
            .map_err(|e| e.to_string())?;

            assert_eq!(config.timing.poll_period_ms, 250);
            assert_eq!(config.timing.restore_settle_ms, 4000);
            assert_eq!(config.timing.capture_debounce_ms, 2000);
            assert_eq!(config.activation_settle(), Duration::from_millis(1500));
            assert_eq!(config.fullscreen_settle(), Duration::from_millis(1000));
            assert_eq!(config.windows.exclude, vec!["Desktop", "xfce4-panel"]);
            assert_eq!(config.escalation.target.as_deref(), Some("Mail"));
            Ok(())
        });
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_| {
            let config =
                Config::load(None, with_resolution(1366, 768)).map_err(|e| e.to_string())?;
            assert_eq!(config.windows.exclude, vec!["nemo-desktop", "Desktop"]);
            assert!(config.escalation.target.is_none());
            Ok(())
        });
    }
}
