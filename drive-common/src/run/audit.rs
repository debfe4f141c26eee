use super::{AuditResult, RecordCounts, StageRecords};

/// Compares the counts that the enabled transfers make comparable.
///
/// - both transfers: source vs target, and the stage count when present
/// - source to stage only: source vs stage
/// - stage to target only: stage vs target
///
/// Any missing required count, or no enabled transfer at all, yields `Unknown`.
pub fn compute_audit(stages: &StageRecords, counts: &RecordCounts) -> AuditResult {
    let src_stg = stages.src_stg_xfer.enabled;
    let stg_tgt = stages.stg_tgt_xfer.enabled;

    let required: Vec<Option<i64>> = match (src_stg, stg_tgt) {
        (true, true) => {
            let mut required = vec![counts.source_count, counts.target_count];
            if counts.stage_count.is_some() {
                required.push(counts.stage_count);
            }
            required
        }
        (true, false) => vec![counts.source_count, counts.stage_count],
        (false, true) => vec![counts.stage_count, counts.target_count],
        (false, false) => return AuditResult::Unknown,
    };

    let Some(values) = required.into_iter().collect::<Option<Vec<i64>>>() else {
        return AuditResult::Unknown;
    };

    if values.windows(2).all(|pair| pair[0] == pair[1]) {
        AuditResult::Matched
    } else {
        AuditResult::Mismatched
    }
}
