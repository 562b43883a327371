use crate::config::ScoreWeights;

/// Measurements for one provider from one benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
	pub name: String,
	pub ping_ms: Option<f64>,
	pub resolve_ms: Option<f64>,
	pub score: Option<f64>,
}

impl ProbeResult {
	/// Build a result, scoring it when both measurements are present.
	pub fn new(
		name: &str,
		ping_ms: Option<f64>,
		resolve_ms: Option<f64>,
		weights: ScoreWeights,
	) -> Self {
		let score = match (ping_ms, resolve_ms) {
			(Some(p), Some(r)) => Some(composite_score(p, r, weights)),
			_ => None,
		};
		Self {
			name: name.to_string(),
			ping_ms,
			resolve_ms,
			score,
		}
	}
}

/// Scored and ranked provider
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProvider {
	pub rank: usize,
	pub name: String,
	pub ping_ms: f64,
	pub resolve_ms: f64,
	pub score: f64,
}

/// Weighted combination of ping and resolution latency. Lower is better.
///
/// Formula: ping_weight * ping_ms + resolve_weight * resolve_ms
pub fn composite_score(ping_ms: f64, resolve_ms: f64, weights: ScoreWeights) -> f64 {
	weights.ping * ping_ms + weights.resolve * resolve_ms
}

/// Rank scored results ascending and split off the unscored ones.
///
/// Returns (ranked, unreachable). Unreachable results keep their input order.
pub fn rank_results(results: Vec<ProbeResult>) -> (Vec<ScoredProvider>, Vec<ProbeResult>) {
	let mut scored = Vec::new();
	let mut unreachable = Vec::new();
	for r in results {
		match (r.ping_ms, r.resolve_ms, r.score) {
			(Some(ping_ms), Some(resolve_ms), Some(score)) => {
				scored.push((r.name, ping_ms, resolve_ms, score));
			}
			_ => unreachable.push(r),
		}
	}

	// Sort by score ascending (lower is better); ties broken by name for stable output
	scored.sort_by(|a, b| {
		a.3.partial_cmp(&b.3)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| a.0.cmp(&b.0))
	});

	let ranked = scored.into_iter()
		.enumerate()
		.map(|(i, (name, ping_ms, resolve_ms, score))| ScoredProvider {
			rank: i + 1,
			name,
			ping_ms,
			resolve_ms,
			score,
		})
		.collect();
	(ranked, unreachable)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_composite_score_default_weights() {
		let w = ScoreWeights::default();
		assert!((composite_score(10.0, 20.0, w) - 14.0).abs() < 1e-9);
		assert!((composite_score(5.0, 50.0, w) - 23.0).abs() < 1e-9);
	}

	#[test]
	fn test_composite_score_custom_weights() {
		let w = ScoreWeights::from_ping_weight(1.0).unwrap();
		assert!((composite_score(10.0, 500.0, w) - 10.0).abs() < 1e-9);
	}

	#[test]
	fn test_unscored_when_measurement_missing() {
		let w = ScoreWeights::default();
		assert_eq!(ProbeResult::new("a", None, Some(5.0), w).score, None);
		assert_eq!(ProbeResult::new("b", Some(5.0), None, w).score, None);
		assert!(ProbeResult::new("c", Some(5.0), Some(5.0), w).score.is_some());
	}

	#[test]
	fn test_ranking_order() {
		let w = ScoreWeights::default();
		let results = vec![
			ProbeResult::new("P2", Some(5.0), Some(50.0), w),
			ProbeResult::new("down", None, None, w),
			ProbeResult::new("P1", Some(10.0), Some(20.0), w),
		];
		let (ranked, unreachable) = rank_results(results);
		assert_eq!(ranked.len(), 2);
		assert_eq!(ranked[0].rank, 1);
		assert_eq!(ranked[0].name, "P1");
		assert!((ranked[0].score - 14.0).abs() < 1e-9);
		assert_eq!(ranked[1].rank, 2);
		assert_eq!(ranked[1].name, "P2");
		assert!((ranked[1].score - 23.0).abs() < 1e-9);
		assert_eq!(unreachable.len(), 1);
		assert_eq!(unreachable[0].name, "down");
	}

	#[test]
	fn test_ranking_tie_broken_by_name() {
		let w = ScoreWeights::default();
		let results = vec![
			ProbeResult::new("b", Some(10.0), Some(10.0), w),
			ProbeResult::new("a", Some(10.0), Some(10.0), w),
		];
		let (ranked, _) = rank_results(results);
		assert_eq!(ranked[0].name, "a");
		assert_eq!(ranked[1].name, "b");
	}

	#[test]
	fn test_ranking_empty() {
		let (ranked, unreachable) = rank_results(Vec::new());
		assert!(ranked.is_empty());
		assert!(unreachable.is_empty());
	}
}
