//! Batch Orchestrator: fan out Scenario Runner invocations over a bounded
//! rayon thread pool, fuzzy CSV column mapping, per-asset deadline and
//! cancellation, request-order-preserving result collection (spec.md
//! §4.8/§5). Pool sizing and `pool.install` fan-out pattern grounded on
//! `monistowl-gat`'s `gat-batch/src/runner.rs::run_batch` — the only
//! rayon-based batch runner in the retrieval pack.

use std::sync::mpsc;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cancellation::CancellationToken;
use crate::error::AtlasError;
use crate::hazard::{HazardProvider, WeatherWindow};
use crate::scenario_runner::{Asset, Geometry, ProjectKind, Report, Scenario};

/// Hard cap on worker threads regardless of `available_parallelism`
/// (spec.md §4.8: `W <= 8`).
pub const MAX_WORKERS: usize = 8;

/// Default per-asset deadline before that slot is marked `Timeout`.
pub const DEFAULT_DEADLINE_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssetSlot {
    Success(Report),
    Error { code: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<AssetSlot>,
    pub success_count: usize,
    pub failure_count: usize,
}

/// Portfolio-level rollup of a completed batch (spec.md §3's `PortfolioReport`
/// entity and §6's batch response `portfolio_summary`). Distinct from
/// [`crate::portfolio::PortfolioReport`], which is the correlation/volatility
/// analysis of §4.10 — this is the plain aggregate a batch caller sees
/// alongside its per-asset results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_assets: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_value_usd: f64,
    pub total_var_usd: f64,
    pub avg_resilience: f64,
    pub total_npv: f64,
    pub total_expected_loss: f64,
    pub risk_exposure_pct: f64,
    pub crop_distribution: std::collections::BTreeMap<String, usize>,
}

/// Aggregate a [`BatchReport`] against the originating asset list into the
/// portfolio-summary rollup. `assets` must be the same slice (in the same
/// order) passed to [`run_batch`].
pub fn summarize_batch(assets: &[Asset], report: &BatchReport) -> BatchSummary {
    let total_value_usd: f64 = assets.iter().map(|a| a.exposure.asset_value_usd).sum();

    let mut total_var_usd = 0.0;
    let mut total_npv = 0.0;
    let mut total_expected_loss = 0.0;
    let mut resilience_sum = 0.0;
    let mut resilience_count = 0usize;

    for slot in &report.results {
        if let AssetSlot::Success(r) = slot {
            total_var_usd += r.value_at_risk_usd;
            total_npv += r.financial.npv_usd;
            total_expected_loss += r.value_at_risk_usd * r.monte_carlo.default_probability;
            resilience_sum += 1.0 - r.physics.damage_pct / 100.0;
            resilience_count += 1;
        }
    }

    let avg_resilience = if resilience_count > 0 {
        resilience_sum / resilience_count as f64
    } else {
        0.0
    };
    let risk_exposure_pct = if total_value_usd > 0.0 {
        (total_var_usd / total_value_usd * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let mut crop_distribution = std::collections::BTreeMap::new();
    for asset in assets {
        if let Some(crop) = asset.crop {
            *crop_distribution.entry(format!("{crop:?}")).or_insert(0usize) += 1;
        }
    }

    BatchSummary {
        total_assets: report.results.len(),
        successful: report.success_count,
        failed: report.failure_count,
        total_value_usd,
        total_var_usd,
        avg_resilience,
        total_npv,
        total_expected_loss,
        risk_exposure_pct,
        crop_distribution,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub max_workers: usize,
    pub deadline_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            max_workers: MAX_WORKERS,
            deadline_ms: DEFAULT_DEADLINE_MS,
        }
    }
}

fn worker_count(n_assets: usize, max_workers: usize) -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
        .min(n_assets.max(1))
        .min(max_workers.max(1))
}

fn build_pool(workers: usize) -> Result<ThreadPool, AtlasError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| AtlasError::Internal {
            detail: format!("failed to build orchestrator thread pool: {e}"),
        })
}

/// Run one asset with a deadline: the scenario pipeline executes on an OS
/// thread; the caller blocks on a channel with `recv_timeout` so a slow
/// `HazardProvider`/surrogate call cannot wedge the whole pool (spec.md
/// §5: the deadline wraps the worker thread, not the pure kernel).
fn run_with_deadline(
    asset: Asset,
    scenario: Scenario,
    hazard: crate::hazard::HazardSample,
    seed: u64,
    deadline_ms: u64,
) -> AssetSlot {
    let asset_id = asset.id.clone();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = crate::scenario_runner::run(&asset, &scenario, &hazard, seed);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(Duration::from_millis(deadline_ms)) {
        Ok(Ok(report)) => AssetSlot::Success(report),
        Ok(Err(err)) => {
            error!(asset_id = %asset_id, code = err.kind(), "scenario runner failed for asset");
            AssetSlot::Error {
                code: err.kind().to_string(),
                reason: err.to_string(),
            }
        }
        Err(_) => {
            error!(asset_id = %asset_id, deadline_ms, "asset exceeded its per-slot deadline");
            AssetSlot::Error {
                code: "TIMEOUT".to_string(),
                reason: format!("exceeded deadline of {deadline_ms}ms"),
            }
        }
    }
}

/// Fan out one Scenario Runner invocation per asset; results preserve
/// request order regardless of completion order. A failure on one asset
/// never aborts the batch.
pub fn run_batch(
    assets: &[Asset],
    scenario: &Scenario,
    provider: &dyn HazardProvider,
    seed_base: u64,
    config: OrchestratorConfig,
    token: &CancellationToken,
) -> Result<BatchReport, AtlasError> {
    if assets.is_empty() {
        return Err(AtlasError::invalid("assets", "batch must contain at least one asset"));
    }

    let workers = worker_count(assets.len(), config.max_workers);
    info!(assets = assets.len(), workers, "starting batch run");
    let pool = build_pool(workers)?;

    let slots: Vec<AssetSlot> = pool.install(|| {
        use rayon::prelude::*;
        assets
            .par_iter()
            .enumerate()
            .map(|(i, asset)| {
                if token.is_cancelled() {
                    return AssetSlot::Error {
                        code: "INTERNAL".to_string(),
                        reason: "batch cancelled before this asset started".to_string(),
                    };
                }
                let (lat, lon) = asset.geometry.representative_point();
                let hazard = provider.weather(lat, lon, WeatherWindow::Annual);
                run_with_deadline(
                    asset.clone(),
                    scenario.clone(),
                    hazard,
                    seed_base.wrapping_add(i as u64),
                    config.deadline_ms,
                )
            })
            .collect()
    });

    let success_count = slots
        .iter()
        .filter(|s| matches!(s, AssetSlot::Success(_)))
        .count();
    let failure_count = slots.len() - success_count;
    info!(success_count, failure_count, "batch run complete");

    Ok(BatchReport {
        results: slots,
        success_count,
        failure_count,
    })
}

// ---------------------------------------------------------------------------
// Fuzzy CSV column mapping
// ---------------------------------------------------------------------------

const LAT_SUBSTRINGS: &[&str] = &["lat", "latitude"];
const LON_SUBSTRINGS: &[&str] = &["lon", "lng", "longitude"];
const VALUE_SUBSTRINGS: &[&str] = &["val", "price", "amount", "cost", "invest", "usd"];

fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let normalized = normalize_header(h);
        candidates.iter().any(|c| normalized.contains(c))
    })
}

/// Parse a numeric string tolerating `k`/`m`/`b` suffixes (x1e3/1e6/1e9)
/// and surrounding currency symbols/commas (spec.md §4.8).
pub fn parse_numeric_suffix(raw: &str) -> Result<f64, AtlasError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Err(AtlasError::invalid("value", "empty numeric field"));
    }
    let lower = cleaned.to_lowercase();
    let (digits, multiplier) = if let Some(stripped) = lower.strip_suffix('k') {
        (stripped.to_string(), 1e3)
    } else if let Some(stripped) = lower.strip_suffix('m') {
        (stripped.to_string(), 1e6)
    } else if let Some(stripped) = lower.strip_suffix('b') {
        (stripped.to_string(), 1e9)
    } else {
        (lower, 1.0)
    };
    digits
        .parse::<f64>()
        .map(|v| v * multiplier)
        .map_err(|_| AtlasError::invalid("value", format!("could not parse numeric field '{raw}'")))
}

/// Parse a batch CSV of assets, resolving lat/lon/value columns by fuzzy
/// substring match. Missing required columns is rejected before any
/// fan-out begins (spec.md §4.8).
pub fn parse_asset_csv(csv_text: &str) -> Result<Vec<Asset>, AtlasError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AtlasError::invalid("csv", format!("failed to read header row: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let lat_idx = find_column(&headers, LAT_SUBSTRINGS)
        .ok_or_else(|| AtlasError::invalid("csv", "no latitude column found"))?;
    let lon_idx = find_column(&headers, LON_SUBSTRINGS)
        .ok_or_else(|| AtlasError::invalid("csv", "no longitude column found"))?;
    let value_idx = find_column(&headers, VALUE_SUBSTRINGS)
        .ok_or_else(|| AtlasError::invalid("csv", "no asset-value column found"))?;
    let id_idx = headers.iter().position(|h| normalize_header(h) == "id");
    let type_idx = headers
        .iter()
        .position(|h| normalize_header(h).contains("type") || normalize_header(h).contains("project"));

    let mut assets = Vec::new();
    for (row_num, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AtlasError::invalid("csv", format!("row {row_num}: {e}")))?;
        let lat: f64 = record
            .get(lat_idx)
            .ok_or_else(|| AtlasError::invalid("csv", format!("row {row_num}: missing latitude")))?
            .parse()
            .map_err(|_| AtlasError::invalid("csv", format!("row {row_num}: invalid latitude")))?;
        let lon: f64 = record
            .get(lon_idx)
            .ok_or_else(|| AtlasError::invalid("csv", format!("row {row_num}: missing longitude")))?
            .parse()
            .map_err(|_| AtlasError::invalid("csv", format!("row {row_num}: invalid longitude")))?;
        let asset_value_usd = parse_numeric_suffix(
            record
                .get(value_idx)
                .ok_or_else(|| AtlasError::invalid("csv", format!("row {row_num}: missing value")))?,
        )?;
        let id = id_idx
            .and_then(|i| record.get(i))
            .map(str::to_string)
            .unwrap_or_else(|| format!("asset-{row_num}"));
        let project_type = type_idx
            .and_then(|i| record.get(i))
            .map(parse_project_kind)
            .unwrap_or(ProjectKind::UrbanFlood);

        assets.push(Asset {
            id,
            geometry: Geometry::Point { lat, lon },
            project_type,
            crop: None,
            financial_overrides: crate::scenario_runner::FinancialOverrides::default(),
            intervention: None,
            exposure: crate::scenario_runner::AssetExposure {
                asset_value_usd,
                ..Default::default()
            },
            current_imperviousness: 0.60,
        });
    }

    Ok(assets)
}

fn parse_project_kind(raw: &str) -> ProjectKind {
    let lowered = raw.to_lowercase();
    if lowered.contains("agri") || lowered.contains("crop") || lowered.contains("farm") {
        ProjectKind::Agriculture
    } else if lowered.contains("coast") || lowered.contains("sea") {
        ProjectKind::Coastal
    } else if lowered.contains("flash") {
        ProjectKind::FlashFlood
    } else if lowered.contains("health") || lowered.contains("heat") {
        ProjectKind::Health
    } else {
        ProjectKind::UrbanFlood
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::FallbackHazardProvider;

    fn scenario() -> Scenario {
        Scenario {
            year: 2050,
            temp_delta: 2.0,
            rain_pct_change: -10.0,
            slr_projection_m: 0.8,
            rain_intensity_pct: 20.0,
            global_warming_c: 1.8,
        }
    }

    fn asset(id: &str, lat: f64, lon: f64) -> Asset {
        Asset {
            id: id.to_string(),
            geometry: Geometry::Point { lat, lon },
            project_type: ProjectKind::UrbanFlood,
            crop: None,
            financial_overrides: crate::scenario_runner::FinancialOverrides::default(),
            intervention: None,
            exposure: crate::scenario_runner::AssetExposure {
                asset_value_usd: 500_000.0,
                ..Default::default()
            },
            current_imperviousness: 0.60,
        }
    }

    #[test]
    fn batch_preserves_request_order() {
        let assets = vec![asset("a", 10.0, 10.0), asset("b", -5.0, 40.0), asset("c", 35.0, -90.0)];
        let token = CancellationToken::new();
        let report = run_batch(
            &assets,
            &scenario(),
            &FallbackHazardProvider,
            7,
            OrchestratorConfig::default(),
            &token,
        )
        .unwrap();
        assert_eq!(report.results.len(), 3);
        for (slot, expected) in report.results.iter().zip(["a", "b", "c"]) {
            if let AssetSlot::Success(r) = slot {
                assert_eq!(r.asset_id, expected);
            } else {
                panic!("expected success for {expected}");
            }
        }
    }

    #[test]
    fn empty_batch_rejected() {
        let token = CancellationToken::new();
        let result = run_batch(&[], &scenario(), &FallbackHazardProvider, 1, OrchestratorConfig::default(), &token);
        assert!(result.is_err());
    }

    #[test]
    fn worker_count_is_capped() {
        assert!(worker_count(1000, MAX_WORKERS) <= MAX_WORKERS);
        assert_eq!(worker_count(1, MAX_WORKERS), 1);
    }

    #[test]
    fn numeric_suffix_parsing() {
        assert_eq!(parse_numeric_suffix("1.5m").unwrap(), 1_500_000.0);
        assert_eq!(parse_numeric_suffix("250k").unwrap(), 250_000.0);
        assert_eq!(parse_numeric_suffix("$2,000").unwrap(), 2_000.0);
        assert!(parse_numeric_suffix("").is_err());
    }

    #[test]
    fn fuzzy_csv_column_mapping() {
        let csv_text = "Asset ID,Latitude (deg),Longitude (deg),Asset Value (USD),Project Type\n\
                         a1,25.76,-80.19,1.5m,Urban Flood\n\
                         a2,10.5,-20.3,500k,Coastal\n";
        let assets = parse_asset_csv(csv_text).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].id, "a1");
        assert_eq!(assets[0].exposure.asset_value_usd, 1_500_000.0);
        assert_eq!(assets[1].project_type, ProjectKind::Coastal);
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let csv_text = "name,foo\nbar,1\n";
        assert!(parse_asset_csv(csv_text).is_err());
    }

    #[test]
    fn batch_summary_aggregates_across_successes() {
        let assets = vec![asset("a", 10.0, 10.0), asset("b", -5.0, 40.0), asset("c", 35.0, -90.0)];
        let token = CancellationToken::new();
        let report = run_batch(
            &assets,
            &scenario(),
            &FallbackHazardProvider,
            7,
            OrchestratorConfig::default(),
            &token,
        )
        .unwrap();
        let summary = summarize_batch(&assets, &report);
        assert_eq!(summary.total_assets, 3);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total_value_usd, 1_500_000.0);
        assert!(summary.total_var_usd >= 0.0);
        assert!(summary.risk_exposure_pct >= 0.0 && summary.risk_exposure_pct <= 100.0);
    }

    #[test]
    fn batch_summary_counts_crop_distribution() {
        let mut a = asset("a", 10.0, 10.0);
        a.crop = Some(crate::physics::agriculture::Crop::Maize);
        let mut b = asset("b", 20.0, 20.0);
        b.crop = Some(crate::physics::agriculture::Crop::Maize);
        let c = asset("c", 30.0, 30.0);
        let assets = vec![a, b, c];
        let token = CancellationToken::new();
        let report = run_batch(
            &assets,
            &scenario(),
            &FallbackHazardProvider,
            3,
            OrchestratorConfig::default(),
            &token,
        )
        .unwrap();
        let summary = summarize_batch(&assets, &report);
        assert_eq!(summary.crop_distribution.get("Maize"), Some(&2));
    }
}
