//! Agent reputation scoring.

/// Scores an agent from its job history, clamped to `[0, 5]`.
///
/// Completed jobs pull the score up, failed jobs pull it down twice as
/// hard, so a worker cannot wash out rejections with volume alone.
#[must_use]
pub fn reputation_score(completed: u32, failed: u32) -> f64 {
    let total = completed + failed;
    let raw = (5.0 * f64::from(completed) - 2.0 * f64::from(failed)) / f64::from(total.max(1));
    raw.clamp(0.0, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flawless_record_scores_five() {
        assert!((reputation_score(5, 0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn pure_failure_clamps_to_zero() {
        assert!((reputation_score(0, 3) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_record_is_weighted() {
        // (5*3 - 2*1) / 4 = 3.25
        assert!((reputation_score(3, 1) - 3.25).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_record_scores_zero() {
        assert!((reputation_score(0, 0) - 0.0).abs() < f64::EPSILON);
    }
}
