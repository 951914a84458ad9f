//! Statistical forensics: Benford's law and p-value consistency.

use serde_json::{json, Map, Value};

use crate::tools::registry::{required_array, required_f64};
use crate::tools::{FnTool, ToolDefinition, ToolError};

pub const CHECK_BENFORDS_LAW: &str = "check_benfords_law";
pub const CHECK_P_VALUE_CONSISTENCY: &str = "check_p_value_consistency";

const HIGH_DEVIATION_THRESHOLD: u32 = 50;
const P_VALUE_TOLERANCE: f64 = 0.05;

/// Result of a Benford first-digit check.
#[derive(Debug, Clone, PartialEq)]
pub struct BenfordReport {
	/// 0 to 100, higher means further from Benford's distribution
	pub risk_score: u32,
	/// Counts of leading digits 1..=9, index 0 is digit 1
	pub distribution: [usize; 9],
	pub message: String,
}

impl BenfordReport {
	pub fn to_json(&self) -> Value {
		let distribution: Map<String, Value> = self
			.distribution
			.iter()
			.enumerate()
			.map(|(i, count)| ((i + 1).to_string(), json!(count)))
			.collect();
		json!({
			"risk_score": self.risk_score,
			"distribution": distribution,
			"message": self.message,
		})
	}
}

/// First significant digit of `value`.
///
/// Zero, negative and non-finite values have none and count as invalid.
pub fn leading_digit(value: f64) -> Option<u8> {
	if !value.is_finite() || value <= 0.0 {
		return None;
	}
	// Scientific notation puts the first significant digit first.
	let formatted = format!("{:e}", value);
	formatted
		.chars()
		.next()
		.and_then(|c| c.to_digit(10))
		.map(|d| d as u8)
		.filter(|d| *d > 0)
}

/// Compare the leading-digit distribution of `numbers` with Benford's law.
pub fn check_benfords_law(numbers: &[f64]) -> BenfordReport {
	let mut distribution = [0usize; 9];
	if numbers.is_empty() {
		return BenfordReport {
			risk_score: 0,
			distribution,
			message: "No data provided.".to_string(),
		};
	}

	for digit in numbers.iter().filter_map(|n| leading_digit(*n)) {
		distribution[(digit - 1) as usize] += 1;
	}

	let total: usize = distribution.iter().sum();
	if total == 0 {
		return BenfordReport {
			risk_score: 0,
			distribution,
			message: "No valid numbers found.".to_string(),
		};
	}

	let deviation: f64 = distribution
		.iter()
		.enumerate()
		.map(|(i, count)| {
			let d = (i + 1) as f64;
			let expected = (1.0 + 1.0 / d).log10();
			let observed = *count as f64 / total as f64;
			(observed - expected).abs()
		})
		.sum();

	let risk_score = ((deviation * 200.0).floor() as u32).min(100);
	let message = if risk_score > HIGH_DEVIATION_THRESHOLD {
		"High deviation detected"
	} else {
		"Natural distribution"
	};

	BenfordReport {
		risk_score,
		distribution,
		message: message.to_string(),
	}
}

/// Result of a p-value consistency check.
#[derive(Debug, Clone, PartialEq)]
pub struct PValueReport {
	pub consistent: bool,
	pub reported_p: f64,
	/// Two-tailed p implied by the statistic, rounded to 4 places
	pub calculated_p: f64,
	pub difference: f64,
	pub sample_size: u64,
}

impl PValueReport {
	pub fn to_json(&self) -> Value {
		json!({
			"consistent": self.consistent,
			"reported_p": self.reported_p,
			"calculated_p": self.calculated_p,
			"difference": self.difference,
			"sample_size": self.sample_size,
		})
	}
}

/// Check a reported p-value against the two-tailed z-test p of `stat`.
pub fn check_p_value_consistency(stat: f64, p_value: f64, sample_size: u64) -> Result<PValueReport, ToolError> {
	if !stat.is_finite() {
		return Err(ToolError::invalid_arguments(
			CHECK_P_VALUE_CONSISTENCY,
			"stat must be a finite number",
		));
	}
	if !(0.0..=1.0).contains(&p_value) {
		return Err(ToolError::invalid_arguments(
			CHECK_P_VALUE_CONSISTENCY,
			format!("p_value {} is outside [0, 1]", p_value),
		));
	}

	let expected = erfc(stat.abs() / std::f64::consts::SQRT_2);
	let difference = (expected - p_value).abs();

	Ok(PValueReport {
		consistent: difference < P_VALUE_TOLERANCE,
		reported_p: p_value,
		calculated_p: (expected * 10_000.0).round() / 10_000.0,
		difference,
		sample_size,
	})
}

/// Complementary error function, Chebyshev fit with fractional error below 1.2e-7.
pub fn erfc(x: f64) -> f64 {
	let z = x.abs();
	let t = 1.0 / (1.0 + 0.5 * z);
	let poly = -z * z - 1.265_512_23
		+ t * (1.000_023_68
			+ t * (0.374_091_96
				+ t * (0.096_784_18
					+ t * (-0.186_288_06
						+ t * (0.278_868_07
							+ t * (-1.135_203_98
								+ t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
	let r = t * poly.exp();
	if x >= 0.0 {
		r
	} else {
		2.0 - r
	}
}

pub fn check_benfords_law_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			CHECK_BENFORDS_LAW,
			"Check whether a list of numbers follows Benford's law. Returns a 0-100 risk score.",
			json!({
				"type": "object",
				"properties": {
					"numbers": {"type": "array", "items": {"type": "number"}}
				},
				"required": ["numbers"]
			}),
		),
		|args| {
			let raw = required_array(CHECK_BENFORDS_LAW, args, "numbers")?;
			// Entries that are not numbers (or numeric strings) are counted as invalid.
			let numbers: Vec<f64> = raw
				.iter()
				.map(|v| match v {
					Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
					Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
					_ => f64::NAN,
				})
				.collect();
			Ok(check_benfords_law(&numbers).to_json())
		},
	)
}

pub fn check_p_value_consistency_tool() -> FnTool {
	FnTool::new(
		ToolDefinition::new(
			CHECK_P_VALUE_CONSISTENCY,
			"Check that a reported p-value matches its test statistic (two-tailed z-test).",
			json!({
				"type": "object",
				"properties": {
					"stat": {"type": "number", "description": "Z or t statistic"},
					"p_value": {"type": "number", "description": "Reported p-value"},
					"sample_size": {"type": "integer", "default": 100}
				},
				"required": ["stat", "p_value"]
			}),
		),
		|args| {
			let stat = required_f64(CHECK_P_VALUE_CONSISTENCY, args, "stat")?;
			let p_value = required_f64(CHECK_P_VALUE_CONSISTENCY, args, "p_value")?;
			let sample_size = args.get("sample_size").and_then(Value::as_u64).unwrap_or(100);
			Ok(check_p_value_consistency(stat, p_value, sample_size)?.to_json())
		},
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tools::Tool;

	#[test]
	fn test_leading_digit() {
		assert_eq!(leading_digit(123.0), Some(1));
		assert_eq!(leading_digit(0.0456), Some(4));
		assert_eq!(leading_digit(-987.0), None);
		assert_eq!(leading_digit(7e-12), Some(7));
		assert_eq!(leading_digit(0.0), None);
		assert_eq!(leading_digit(f64::NAN), None);
		assert_eq!(leading_digit(f64::INFINITY), None);
	}

	#[test]
	fn test_benford_uniform_ones_is_high_risk() {
		let report = check_benfords_law(&[1.0, 10.0, 100.0, 1000.0, 1.5]);
		assert_eq!(report.distribution[0], 5);
		assert_eq!(report.risk_score, 100);
		assert_eq!(report.message, "High deviation detected");
	}

	#[test]
	fn test_benford_natural_series() {
		// 30 values with leading digits close to Benford proportions.
		let mut numbers = Vec::new();
		for (digit, count) in [(1, 9), (2, 5), (3, 4), (4, 3), (5, 2), (6, 2), (7, 2), (8, 2), (9, 1)] {
			for k in 0..count {
				numbers.push(digit as f64 * 10f64.powi(k) + 0.5);
			}
		}
		let report = check_benfords_law(&numbers);
		assert_eq!(report.distribution.iter().sum::<usize>(), 30);
		assert!(report.risk_score <= 50, "risk {}", report.risk_score);
		assert_eq!(report.message, "Natural distribution");
	}

	#[test]
	fn test_benford_empty_and_invalid() {
		let empty = check_benfords_law(&[]);
		assert_eq!(empty.risk_score, 0);
		assert_eq!(empty.message, "No data provided.");
		assert_eq!(empty.distribution, [0; 9]);

		let invalid = check_benfords_law(&[0.0, f64::NAN]);
		assert_eq!(invalid.risk_score, 0);
		assert_eq!(invalid.message, "No valid numbers found.");
	}

	#[test]
	fn test_benford_negative_values_are_invalid() {
		let report = check_benfords_law(&[-5.0]);
		assert_eq!(report.risk_score, 0);
		assert_eq!(report.message, "No valid numbers found.");
		assert_eq!(report.distribution, [0; 9]);

		// Negatives are dropped before the deviation is computed.
		let mixed = check_benfords_law(&[-5.0, -50.0, 1.0, 10.0]);
		assert_eq!(mixed.distribution[0], 2);
		assert_eq!(mixed.distribution.iter().sum::<usize>(), 2);
	}

	#[tokio::test]
	async fn test_benford_mixed_digit_sample() {
		let report = check_benfords_law_tool()
			.call(json!({"numbers": [123, 456, 789, 111, 222, 333, 999, 888, 777, 111]}))
			.await
			.unwrap();

		let risk = report["risk_score"].as_u64().unwrap();
		assert!(risk <= 100);
		let distribution = report["distribution"].as_object().unwrap();
		let mut total = 0;
		for digit in 1..=9 {
			let count = distribution[&digit.to_string()].as_u64().unwrap();
			total += count;
		}
		assert_eq!(distribution.len(), 9);
		assert_eq!(total, 10);
		assert_eq!(distribution["1"], 3);
		assert_eq!(distribution["7"], 2);
		assert_eq!(distribution["5"], 0);
	}

	#[test]
	fn test_erfc_reference_values() {
		assert!((erfc(0.0) - 1.0).abs() < 1e-6);
		assert!((erfc(1.0) - 0.157_299_207).abs() < 1e-6);
		assert!((erfc(-1.0) - 1.842_700_793).abs() < 1e-6);
	}

	#[test]
	fn test_p_value_consistency() {
		let report = check_p_value_consistency(1.96, 0.05, 100).unwrap();
		assert!(report.consistent);
		assert_eq!(report.calculated_p, 0.05);

		let report = check_p_value_consistency(3.0, 0.2, 40).unwrap();
		assert!(!report.consistent);
		assert_eq!(report.calculated_p, 0.0027);
		assert_eq!(report.sample_size, 40);

		assert!(check_p_value_consistency(1.0, 1.5, 100).is_err());
		assert!(check_p_value_consistency(f64::NAN, 0.5, 100).is_err());
	}

	#[tokio::test]
	async fn test_forensics_tools_json() {
		let benford = check_benfords_law_tool()
			.call(json!({"numbers": [1, 10, "100", "abc"]}))
			.await
			.unwrap();
		assert_eq!(benford["distribution"]["1"], 3);
		assert_eq!(benford["risk_score"], 100);

		let p = check_p_value_consistency_tool()
			.call(json!({"stat": 1.96, "p_value": 0.05}))
			.await
			.unwrap();
		assert_eq!(p["consistent"], true);
		assert_eq!(p["sample_size"], 100);

		let missing = check_p_value_consistency_tool().call(json!({"stat": 1.0})).await;
		assert!(matches!(missing, Err(ToolError::InvalidArguments { .. })));
	}
}
