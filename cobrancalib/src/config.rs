//! Настройки установки: база «fator de vencimento», поведение после 9999, код валюты.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CobrancaError, Result};

/// Что делать, когда число дней от базы перестаёт помещаться в 4 цифры.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rollover {
    /// Новый цикл с 1000 (FEBRABAN: 22.02.2025 → 1000).
    Wrap,
    /// Фактор > 9999 — ошибка валидации срока.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub due_factor_epoch: NaiveDate,
    pub due_factor_rollover: Rollover,
    pub currency_code: char,
}

fn febraban_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 10, 7).unwrap_or_default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            due_factor_epoch: febraban_epoch(),
            due_factor_rollover: Rollover::Wrap,
            currency_code: '9',
        }
    }
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Config =
            serde_json::from_str(s).map_err(|e| CobrancaError::Config(e.to_string()))?;
        if !cfg.currency_code.is_ascii_digit() {
            return Err(CobrancaError::Config(format!(
                "currency_code must be a digit, got {:?}",
                cfg.currency_code
            )));
        }
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
