use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{CoreError, CoreResult};

fn elem_key(elem_id: Option<i64>) -> String {
	elem_id.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Clone, PartialEq)]
struct ElementRecord {
	element_id: String,
	category: String,
	classification: String,
	strategy_used: Option<String>,
	confidence: Option<String>,
	extraction_outcome: Option<String>,
	failure_reason: Option<String>,
}

/// Success/failure rate for one AREAL strategy, derived from its
/// `<name>_success` / `<name>_failure` counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyRate {
	pub success_count: u64,
	pub failure_count: u64,
	pub total_attempts: u64,
	pub success_rate_pct: f64,
}

/// Rolled-up statistics produced by [`StrategyDiagnostics::get_summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
	pub total_elements: usize,
	pub classification_counts: HashMap<String, u64>,
	pub classification_rates_pct: HashMap<String, f64>,
	pub confidence_counts: HashMap<String, u64>,
	pub confidence_rates_pct: HashMap<String, f64>,
	pub areal_strategy_counts: HashMap<String, u64>,
	pub areal_strategy_rates: HashMap<String, StrategyRate>,
	pub extraction_outcome_counts: HashMap<String, u64>,
	pub extraction_outcome_rates_pct: HashMap<String, f64>,
}

/// Tracks element classification, AREAL strategy outcomes, and geometry
/// extraction results across a render pass, for post-hoc quality analysis.
///
/// This is purely an observability sink: nothing here feeds back into
/// raster or silhouette decisions. It is safe to omit entirely (every
/// `record_*` call site in this crate takes it as `Option`).
#[derive(Debug, Default)]
pub struct StrategyDiagnostics {
	classification_counts: HashMap<String, u64>,
	category_classification: HashMap<String, HashMap<String, u64>>,
	areal_strategy_counts: HashMap<String, u64>,
	category_areal_strategy: HashMap<String, HashMap<String, u64>>,
	extraction_outcome_counts: HashMap<String, u64>,
	category_extraction_outcome: HashMap<String, HashMap<String, u64>>,
	confidence_counts: HashMap<String, u64>,
	category_confidence: HashMap<String, HashMap<String, u64>>,
	element_records: Vec<ElementRecord>,
	recorded_elements: HashSet<String>,
}

impl StrategyDiagnostics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_element_classification(&mut self, elem_id: Option<i64>, classification: &str, category: &str) {
		let elem_id = elem_key(elem_id);
		*self.classification_counts.entry(classification.to_string()).or_insert(0) += 1;
		*self.category_classification.entry(category.to_string()).or_default().entry(classification.to_string()).or_insert(0) += 1;

		if self.recorded_elements.insert(elem_id.clone()) {
			self.element_records.push(ElementRecord {
				element_id: elem_id,
				category: category.to_string(),
				classification: classification.to_string(),
				strategy_used: None,
				confidence: None,
				extraction_outcome: None,
				failure_reason: None,
			});
		}
	}

	/// Records an AREAL strategy attempt, deriving the `_success`/`_failure`
	/// counter key from `success` (callers pass the bare strategy name).
	pub fn record_areal_strategy(&mut self, elem_id: Option<i64>, strategy: &str, success: bool, category: &str) {
		let elem_id = elem_key(elem_id);
		let suffix = if success { "_success" } else { "_failure" };
		let strategy_key = if strategy.ends_with(suffix) { strategy.to_string() } else { format!("{strategy}{suffix}") };

		*self.areal_strategy_counts.entry(strategy_key.clone()).or_insert(0) += 1;
		*self.category_areal_strategy.entry(category.to_string()).or_default().entry(strategy_key).or_insert(0) += 1;

		if let Some(record) = self.element_records.iter_mut().find(|r| r.element_id == elem_id) {
			if record.strategy_used.is_none() && success {
				record.strategy_used = Some(strategy.to_string());
				record.confidence = Some("high".to_string());
			}
		}
	}

	pub fn record_geometry_extraction(&mut self, elem_id: Option<i64>, outcome: &str, category: &str, failure_reason: Option<&str>) {
		let elem_id = elem_key(elem_id);
		*self.extraction_outcome_counts.entry(outcome.to_string()).or_insert(0) += 1;
		*self.category_extraction_outcome.entry(category.to_string()).or_default().entry(outcome.to_string()).or_insert(0) += 1;

		if let Some(record) = self.element_records.iter_mut().find(|r| r.element_id == elem_id) {
			record.extraction_outcome = Some(outcome.to_string());
			if outcome != "success" {
				record.failure_reason = Some(outcome.to_string());
			}
			if let Some(reason) = failure_reason {
				record.failure_reason = Some(reason.to_string());
			}
		}
	}

	pub fn record_confidence(&mut self, elem_id: Option<i64>, confidence: &str, category: &str) {
		let elem_id = elem_key(elem_id);
		let confidence = confidence.to_uppercase();
		*self.confidence_counts.entry(confidence.clone()).or_insert(0) += 1;
		*self.category_confidence.entry(category.to_string()).or_default().entry(confidence.clone()).or_insert(0) += 1;

		if let Some(record) = self.element_records.iter_mut().find(|r| r.element_id == elem_id) {
			record.confidence = Some(confidence);
		}
	}

	pub fn get_summary(&self) -> Summary {
		let total_elements = self.element_records.len();

		let classification_rates_pct = rates_pct(&self.classification_counts, total_elements as u64);

		let mut strategy_base_names = HashSet::new();
		for key in self.areal_strategy_counts.keys() {
			if let Some(base) = key.strip_suffix("_success").or_else(|| key.strip_suffix("_failure")) {
				strategy_base_names.insert(base.to_string());
			}
		}
		let mut areal_strategy_rates = HashMap::new();
		for base in strategy_base_names {
			let success_count = *self.areal_strategy_counts.get(&format!("{base}_success")).unwrap_or(&0);
			let failure_count = *self.areal_strategy_counts.get(&format!("{base}_failure")).unwrap_or(&0);
			let total_attempts = success_count + failure_count;
			if total_attempts > 0 {
				areal_strategy_rates.insert(
					base,
					StrategyRate { success_count, failure_count, total_attempts, success_rate_pct: (success_count as f64 * 100.0) / total_attempts as f64 },
				);
			}
		}

		let total_extractions: u64 = self.extraction_outcome_counts.values().sum();
		let extraction_outcome_rates_pct = rates_pct(&self.extraction_outcome_counts, total_extractions);

		let total_with_confidence: u64 = self.confidence_counts.values().sum();
		let confidence_rates_pct = rates_pct(&self.confidence_counts, total_with_confidence);

		Summary {
			total_elements,
			classification_counts: self.classification_counts.clone(),
			classification_rates_pct,
			confidence_counts: self.confidence_counts.clone(),
			confidence_rates_pct,
			areal_strategy_counts: self.areal_strategy_counts.clone(),
			areal_strategy_rates,
			extraction_outcome_counts: self.extraction_outcome_counts.clone(),
			extraction_outcome_rates_pct,
		}
	}

	/// Logs the summary at `info` level, one line per section. Intended for
	/// an end-of-run diagnostic dump, not per-element tracing.
	pub fn log_summary(&self) {
		let summary = self.get_summary();
		log::info!("strategy diagnostics: {} elements processed", summary.total_elements);
		for cls in ["TINY", "LINEAR", "AREAL"] {
			let count = summary.classification_counts.get(cls).copied().unwrap_or(0);
			let rate = summary.classification_rates_pct.get(cls).copied().unwrap_or(0.0);
			log::info!("  classification {cls}: {count} ({rate:.1}%)");
		}
		for conf in ["HIGH", "MEDIUM", "LOW"] {
			if let Some(&count) = summary.confidence_counts.get(conf) {
				let rate = summary.confidence_rates_pct.get(conf).copied().unwrap_or(0.0);
				log::info!("  confidence {conf}: {count} ({rate:.1}%)");
			}
		}
		let mut strategies: Vec<_> = summary.areal_strategy_rates.iter().collect();
		strategies.sort_by_key(|(name, _)| name.clone());
		for (name, rate) in strategies {
			log::info!("  areal strategy {name}: {}/{} ({:.1}%)", rate.success_count, rate.total_attempts, rate.success_rate_pct);
		}
		for outcome in ["success", "no_geometry", "no_solids", "insufficient_points", "exception", "failed_all_strategies"] {
			if let Some(&count) = summary.extraction_outcome_counts.get(outcome) {
				let rate = summary.extraction_outcome_rates_pct.get(outcome).copied().unwrap_or(0.0);
				log::info!("  extraction outcome {outcome}: {count} ({rate:.1}%)");
			}
		}
	}

	/// Writes the per-element table to `path` with header
	/// `element_id,category,classification,strategy_used,confidence,extraction_outcome,failure_reason`.
	pub fn export_to_csv(&self, path: impl AsRef<Path>) -> CoreResult<()> {
		let mut writer = csv::Writer::from_path(path.as_ref()).map_err(|e| CoreError::SubsystemFailure(format!("opening diagnostics csv: {e}")))?;
		writer
			.write_record(["element_id", "category", "classification", "strategy_used", "confidence", "extraction_outcome", "failure_reason"])
			.map_err(|e| CoreError::SubsystemFailure(format!("writing diagnostics csv header: {e}")))?;

		for record in &self.element_records {
			writer
				.write_record([
					record.element_id.as_str(),
					record.category.as_str(),
					record.classification.as_str(),
					record.strategy_used.as_deref().unwrap_or(""),
					record.confidence.as_deref().unwrap_or(""),
					record.extraction_outcome.as_deref().unwrap_or(""),
					record.failure_reason.as_deref().unwrap_or(""),
				])
				.map_err(|e| CoreError::SubsystemFailure(format!("writing diagnostics csv row: {e}")))?;
		}

		writer.flush().map_err(|e| CoreError::SubsystemFailure(format!("flushing diagnostics csv: {e}")))?;
		Ok(())
	}
}

fn rates_pct(counts: &HashMap<String, u64>, total: u64) -> HashMap<String, f64> {
	if total == 0 {
		return HashMap::new();
	}
	counts.iter().map(|(k, &v)| (k.clone(), (v as f64 * 100.0) / total as f64)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn classification_counts_and_rates() {
		let mut diag = StrategyDiagnostics::new();
		diag.record_element_classification(Some(1), "AREAL", "Floors");
		diag.record_element_classification(Some(2), "TINY", "Doors");

		let summary = diag.get_summary();
		assert_eq!(summary.total_elements, 2);
		assert_eq!(summary.classification_counts.get("AREAL"), Some(&1));
		assert_eq!(summary.classification_rates_pct.get("AREAL"), Some(&50.0));
	}

	#[test]
	fn areal_strategy_success_rate_is_computed_from_suffixed_counters() {
		let mut diag = StrategyDiagnostics::new();
		diag.record_areal_strategy(Some(1), "planar_face", true, "Floors");
		diag.record_areal_strategy(Some(2), "planar_face", false, "Floors");

		let summary = diag.get_summary();
		let rate = summary.areal_strategy_rates.get("planar_face").unwrap();
		assert_eq!(rate.success_count, 1);
		assert_eq!(rate.failure_count, 1);
		assert_eq!(rate.success_rate_pct, 50.0);
	}

	#[test]
	fn element_record_captures_first_successful_strategy_only() {
		let mut diag = StrategyDiagnostics::new();
		diag.record_element_classification(Some(1), "AREAL", "Floors");
		diag.record_areal_strategy(Some(1), "planar_face", true, "Floors");
		diag.record_areal_strategy(Some(1), "silhouette", true, "Floors");

		assert_eq!(diag.element_records[0].strategy_used.as_deref(), Some("planar_face"));
	}

	#[test]
	fn unrecorded_element_keeps_default_fields() {
		let mut diag = StrategyDiagnostics::new();
		diag.record_geometry_extraction(Some(99), "no_geometry", "Walls", None);
		let summary = diag.get_summary();
		assert_eq!(summary.extraction_outcome_counts.get("no_geometry"), Some(&1));
	}
}
