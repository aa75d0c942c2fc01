// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{OptionOverrides, OptionSection, RawSchedulerConfig, SchedulerConfig};
use crate::errors::{DagRunError, Result};
use crate::logging::LogLevel;

impl TryFrom<RawSchedulerConfig> for SchedulerConfig {
    type Error = DagRunError;

    fn try_from(raw: RawSchedulerConfig) -> std::result::Result<Self, Self::Error> {
        let defaults = validate_section("[default]", &raw.default)?;

        let mut tasks = BTreeMap::new();
        for (name, section) in raw.task.iter() {
            if name.trim().is_empty() {
                return Err(DagRunError::Config(
                    "[task.<name>] sections must have a non-empty name".to_string(),
                ));
            }
            let overrides = validate_section(&format!("[task.{name}]"), section)?;
            tasks.insert(name.clone(), overrides);
        }

        let log_level = match raw.log.level.as_deref() {
            Some(level) => Some(
                level
                    .parse::<LogLevel>()
                    .map_err(|e| DagRunError::Config(format!("[log].level: {e}")))?,
            ),
            None => None,
        };

        Ok(SchedulerConfig {
            defaults,
            tasks,
            log_level,
        })
    }
}

fn validate_section(label: &str, section: &OptionSection) -> Result<OptionOverrides> {
    let timeout = match section.timeout.as_deref() {
        Some(s) => Some(
            parse_duration(s).map_err(|e| DagRunError::Config(format!("{label}.timeout: {e}")))?,
        ),
        None => None,
    };

    Ok(OptionOverrides {
        retry: section.retry,
        timeout,
    })
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
