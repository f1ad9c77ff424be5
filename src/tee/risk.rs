// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Marker-based risk scoring.
//!
//! The payload is read as a sequence of little-endian `u64` markers, each
//! normalized by `2^63`. The first four markers are combined with fixed
//! weights and the sum is bucketed into a level from 1 to 4.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::InputError;

/// Weights applied to the first four markers.
pub const MARKER_WEIGHTS: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

/// Upper bounds (exclusive) of levels 1, 2 and 3.
const LEVEL_THRESHOLDS: [f64; 3] = [0.25, 0.50, 0.75];

/// `2^63` as a float.
const MARKER_SCALE: f64 = 9_223_372_036_854_775_808.0;

/// Coarse risk classification in `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u8", into = "u8")]
pub struct RiskLevel(u8);

impl RiskLevel {
    pub const LOW: RiskLevel = RiskLevel(1);
    pub const MODERATE: RiskLevel = RiskLevel(2);
    pub const ELEVATED: RiskLevel = RiskLevel(3);
    pub const HIGH: RiskLevel = RiskLevel(4);

    /// Bucket a weighted marker sum.
    pub fn from_weighted_sum(sum: f64) -> Self {
        if sum < LEVEL_THRESHOLDS[0] {
            Self::LOW
        } else if sum < LEVEL_THRESHOLDS[1] {
            Self::MODERATE
        } else if sum < LEVEL_THRESHOLDS[2] {
            Self::ELEVATED
        } else {
            Self::HIGH
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RiskLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=4).contains(&value) {
            Ok(RiskLevel(value))
        } else {
            Err(format!("risk level must be between 1 and 4, got {value}"))
        }
    }
}

impl From<RiskLevel> for u8 {
    fn from(level: RiskLevel) -> Self {
        level.0
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a payload into normalized markers.
pub fn markers_from_bytes(payload: &[u8]) -> Result<Vec<f64>, InputError> {
    if payload.len() % 8 != 0 {
        return Err(InputError::InvalidMarkerLength(payload.len()));
    }

    Ok(payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            u64::from_le_bytes(raw) as f64 / MARKER_SCALE
        })
        .collect())
}

/// Weighted sum of the first four markers; later markers are ignored.
pub fn weighted_sum(markers: &[f64]) -> f64 {
    markers
        .iter()
        .zip(MARKER_WEIGHTS.iter())
        .map(|(marker, weight)| marker * weight)
        .sum()
}

/// Classify a marker sequence.
pub fn score(markers: &[f64]) -> RiskLevel {
    RiskLevel::from_weighted_sum(weighted_sum(markers))
}

/// Markers of an upload payload. Unlike [`markers_from_bytes`], an empty
/// payload is rejected.
pub fn payload_markers(payload: &[u8]) -> Result<Vec<f64>, InputError> {
    if payload.is_empty() {
        return Err(InputError::EmptyPayload);
    }
    markers_from_bytes(payload)
}

/// Validate and score a raw payload in one step.
pub fn score_payload(payload: &[u8]) -> Result<RiskLevel, InputError> {
    Ok(score(&payload_markers(payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(values: &[u64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn markers_are_normalized_by_two_pow_63() {
        let markers = markers_from_bytes(&encode(&[0, 1 << 62, 1 << 63])).unwrap();
        assert_eq!(markers, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn marker_length_must_be_multiple_of_eight() {
        for len in [1usize, 3, 7, 9, 15] {
            assert_eq!(
                markers_from_bytes(&vec![0u8; len]),
                Err(InputError::InvalidMarkerLength(len))
            );
        }
        assert_eq!(markers_from_bytes(&[]), Ok(Vec::new()));
    }

    #[test]
    fn empty_payload_is_rejected_by_score_payload() {
        assert_eq!(score_payload(&[]), Err(InputError::EmptyPayload));
        assert_eq!(
            score_payload(&[1, 2, 3]),
            Err(InputError::InvalidMarkerLength(3))
        );
    }

    #[test]
    fn only_first_four_markers_are_weighted() {
        let four = [0.5, 0.5, 0.5, 0.5];
        let six = [0.5, 0.5, 0.5, 0.5, 1.0, 1.0];
        assert_eq!(weighted_sum(&four), weighted_sum(&six));
        assert!((weighted_sum(&four) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fewer_than_four_markers_contribute_fewer_terms() {
        assert_eq!(weighted_sum(&[]), 0.0);
        assert!((weighted_sum(&[1.0]) - 0.1).abs() < 1e-12);
        assert!((weighted_sum(&[1.0, 1.0]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn bucket_edges_are_exclusive_upper_bounds() {
        let eps = 1e-9;
        let cases = [
            (0.0, 1),
            (0.25 - eps, 1),
            (0.25, 2),
            (0.25 + eps, 2),
            (0.50 - eps, 2),
            (0.50, 3),
            (0.50 + eps, 3),
            (0.75 - eps, 3),
            (0.75, 4),
            (0.75 + eps, 4),
            (2.0, 4),
        ];
        for (sum, expected) in cases {
            assert_eq!(
                RiskLevel::from_weighted_sum(sum).value(),
                expected,
                "sum {sum}"
            );
        }
    }

    #[test]
    fn level_never_decreases_as_sum_grows() {
        let mut previous = RiskLevel::LOW;
        for step in 0..=2000 {
            let level = RiskLevel::from_weighted_sum(step as f64 / 1000.0);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(previous, RiskLevel::HIGH);
    }

    #[test]
    fn zero_markers_score_low() {
        let payload = vec![0u8; 40 * 8];
        assert_eq!(score_payload(&payload), Ok(RiskLevel::LOW));
    }

    #[test]
    fn saturated_markers_score_high() {
        // Every marker is 1.0, so the weighted sum is exactly 1.0.
        let payload = encode(&[1 << 63; 4]);
        assert_eq!(score_payload(&payload), Ok(RiskLevel::HIGH));
    }

    #[test]
    fn last_marker_alone_reaches_moderate() {
        // 0.4 * 0.75 = 0.3
        let payload = encode(&[0, 0, 0, 3 << 61]);
        assert_eq!(score_payload(&payload), Ok(RiskLevel::MODERATE));
    }

    #[test]
    fn risk_level_rejects_out_of_range_values() {
        assert!(RiskLevel::try_from(0).is_err());
        assert!(RiskLevel::try_from(5).is_err());
        assert_eq!(RiskLevel::try_from(3), Ok(RiskLevel::ELEVATED));
    }

    #[test]
    fn risk_level_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&RiskLevel::HIGH).unwrap(), "4");
        let parsed: RiskLevel = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, RiskLevel::MODERATE);
        assert!(serde_json::from_str::<RiskLevel>("9").is_err());
    }
}
