//! Assertion helpers with diagnostic output.
//!
//! Every failure says what was expected, what was found, and which
//! features carried errors at the time.

use feature_engine::{ComponentTree, Feature, FeatureState, Timeline};
use uuid::Uuid;

use crate::helpers::HarnessError;

/// Fail if any feature carries an error or warning.
pub fn assert_no_feature_errors(timeline: &Timeline) -> Result<(), HarnessError> {
    let problems = error_summary(timeline);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("expected no feature errors, got: {}", problems.join("; ")),
        })
    }
}

pub fn assert_feature_state(feature: &Feature, expected: FeatureState) -> Result<(), HarnessError> {
    if feature.state == expected {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{} {}] expected state {:?}, got {:?} (error: {})",
                feature.title(),
                feature.id,
                expected,
                feature.state,
                feature
                    .error
                    .as_ref()
                    .map_or("none".to_string(), |e| e.to_string()),
            ),
        })
    }
}

pub fn assert_close(actual: f64, expected: f64, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    if (actual - expected).abs() <= tol * expected.abs().max(1.0) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] expected {expected:.6}, got {actual:.6} (tol={tol})"),
        })
    }
}

/// Assert the changed-component set, ignoring order.
pub fn assert_changed(actual: &[Uuid], expected: &[Uuid]) -> Result<(), HarnessError> {
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort();
    e.sort();
    if a == e {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("expected changed components {e:?}, got {a:?}"),
        })
    }
}

/// Assert two snapshots are the same object, not merely equal.
pub fn assert_shared(a: &ComponentTree, b: &ComponentTree, ctx: &str) -> Result<(), HarnessError> {
    if ComponentTree::ptr_eq(a, b) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] snapshots are distinct objects"),
        })
    }
}

/// One line per feature that carries an error or warning.
pub fn error_summary(timeline: &Timeline) -> Vec<String> {
    timeline
        .features()
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            f.error
                .as_ref()
                .map(|e| format!("#{i} {} ({:?}): {}", f.title(), e.severity, e.message))
        })
        .collect()
}
