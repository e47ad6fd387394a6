// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::table::DedupPolicy;
use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Fundflow", "fundflow"));

/// Trailing windows in observed trading dates, not calendar days.
static DEFAULT_HORIZONS: Lazy<Vec<Horizon>> = Lazy::new(|| {
    vec![
        Horizon::new("1w", "1 Hafta", 5),
        Horizon::new("1m", "1 Ay", 22),
        Horizon::new("3m", "3 Ay", 66),
        Horizon::new("6m", "6 Ay", 126),
        Horizon::new("1y", "1 Yıl", 252),
    ]
});

static DEFAULT_MAIN_ITEMS: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "Hisse Senedi",
        "Devlet Tahvili",
        "Finansman Bonosu",
        "Kamu Dış Borçlanma Araçları",
        "Özel Sektör Dış Borçlanma Araçları",
        "Takasbank Para Piyasası İşlemleri",
        "Kamu Kira Sertifikaları (Döviz)",
        "Özel Sektör Kira Sertifikaları",
        "Özel Sektör Yurt Dışı Kira Sertifikaları",
        "Vadeli Mevduat (Döviz)",
        "Katılma Hesabı (Döviz)",
        "Repo Islemleri",
        "Kıymetli Madenler",
        "Yabancı Borsa Yatırım Fonları",
        "Borsa Yatırım Fonları Katılma Payları",
        "Vadeli İşlemler Nakit Teminatları",
        "Diğer",
        "TOPLAM",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub key: String,
    pub name: String,
    pub dates: usize,
}

impl Horizon {
    fn new(key: &str, name: &str, dates: usize) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            dates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundColumns {
    pub fund_code: String,
    pub classification: String,
    pub date: String,
    pub net_flow: String,
    /// Headers ending with this suffix hold allocation percentages.
    pub allocation_suffix: String,
    /// When non-empty, only these asset classes are read.
    pub asset_classes: Vec<String>,
}

impl Default for FundColumns {
    fn default() -> Self {
        Self {
            fund_code: "fund_code".into(),
            classification: "PYŞ".into(),
            date: "Tarih".into(),
            net_flow: "net_flow".into(),
            allocation_suffix: "_pct".into(),
            asset_classes: Vec::new(),
        }
    }
}

impl FundColumns {
    /// Asset classes named by `headers`, in header order.
    pub fn asset_classes_in(&self, headers: &[String]) -> Vec<String> {
        if !self.asset_classes.is_empty() {
            return self.asset_classes.clone();
        }
        headers
            .iter()
            .filter_map(|h| h.strip_suffix(self.allocation_suffix.as_str()))
            .filter(|h| !h.is_empty())
            .map(|h| h.to_string())
            .collect()
    }

    pub fn allocation_column(&self, asset_class: &str) -> String {
        format!("{}{}", asset_class, self.allocation_suffix)
    }
}

/// Where a snapshot's share denominator comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// The aggregate row when present, otherwise the sum of categories.
    #[default]
    TotalRowOrSum,
    /// Always the sum of the (allow-listed) category rows.
    CategorySum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionSettings {
    pub total_label: String,
    /// Empty means every row of the source is a category.
    pub main_items: Vec<String>,
    pub normalization: Normalization,
    pub offsets_days: Vec<u32>,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            total_label: "TOPLAM".into(),
            main_items: DEFAULT_MAIN_ITEMS.clone(),
            normalization: Normalization::default(),
            offsets_days: vec![7, 28],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub horizons: Vec<Horizon>,
    pub fund_columns: FundColumns,
    pub composition: CompositionSettings,
    pub dedup_policy: DedupPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizons: DEFAULT_HORIZONS.clone(),
            fund_columns: FundColumns::default(),
            composition: CompositionSettings::default(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

impl Settings {
    /// Resolves `1w`-style keys, horizon names, or a bare positive count.
    pub fn window(&self, spec: &str) -> Result<NonZeroUsize> {
        let spec = spec.trim();
        let dates = match self
            .horizons
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(spec) || h.name == spec)
        {
            Some(h) => h.dates,
            None => spec.parse::<usize>().with_context(|| {
                let known: Vec<&str> = self.horizons.iter().map(|h| h.key.as_str()).collect();
                format!(
                    "Unknown range '{}', expected one of {} or a date count",
                    spec,
                    known.join("|")
                )
            })?,
        };
        NonZeroUsize::new(dates)
            .ok_or_else(|| anyhow!("Range '{}' must cover at least one date", spec))
    }

    pub fn comparison_labels(&self) -> Vec<String> {
        self.composition
            .offsets_days
            .iter()
            .map(|d| format!("t-{}", d))
            .collect()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific config dir")?;
    Ok(proj.config_dir().join("settings.json"))
}

pub fn load_from(path: &Path) -> Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Read settings {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parse settings {}", path.display()))?;
    for h in &settings.horizons {
        if h.dates == 0 {
            return Err(anyhow!("Horizon '{}' must cover at least one date", h.key));
        }
    }
    Ok(settings)
}

/// Explicit path first, then the platform config file, then defaults.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(p) = explicit {
        return load_from(p);
    }
    match config_path() {
        Ok(p) if p.exists() => {
            tracing::debug!(path = %p.display(), "loading settings");
            load_from(&p)
        }
        _ => Ok(Settings::default()),
    }
}
