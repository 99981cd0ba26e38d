//! Comparison pipeline for two keyed datasets.
//!
//! Provides the entry point [`diff_datasets`]: validate config, index both sides, match keys,
//! compare common rows, assemble the [`DiffReport`]. Any fatal condition aborts the run; there
//! is no state carried between runs.

use crate::compare::{compare_common_rows, plan_columns};
use crate::config::ComparisonConfig;
use crate::dataset::{Dataset, DatasetSide};
use crate::diff::{DiffError, DiffReport};
use crate::key_index::{KeyIndex, build_key_index, key_positions};
use crate::matcher::match_rows;
use crate::progress::{
    NoProgress, PHASE_ASSEMBLE, PHASE_COMPARE, PHASE_INDEX, PHASE_MATCH, ProgressCallback,
};
use crate::report::{ReportInputs, assemble_report};

/// Compares `old` against `new` using `config`.
pub fn diff_datasets(
    old: &Dataset,
    new: &Dataset,
    config: &ComparisonConfig,
) -> Result<DiffReport, DiffError> {
    diff_datasets_with_progress(old, new, config, &NoProgress)
}

pub fn diff_datasets_with_progress(
    old: &Dataset,
    new: &Dataset,
    config: &ComparisonConfig,
    progress: &dyn ProgressCallback,
) -> Result<DiffReport, DiffError> {
    config.validate()?;
    // Missing key columns on either side abort before any indexing work.
    key_positions(old, DatasetSide::Old, config)?;
    key_positions(new, DatasetSide::New, config)?;

    progress.on_progress(PHASE_INDEX, 0.0);
    let (old_index, new_index) = build_indexes(old, new, config)?;
    log::debug!(
        "indexed {} old key(s), {} new key(s)",
        old_index.len(),
        new_index.len()
    );
    progress.on_progress(PHASE_INDEX, 1.0);

    progress.on_progress(PHASE_MATCH, 0.0);
    let matched = match_rows(&old_index, &new_index);
    log::debug!(
        "matched keys: added={}, removed={}, common={}",
        matched.added.len(),
        matched.removed.len(),
        matched.common.len()
    );
    progress.on_progress(PHASE_MATCH, 1.0);

    progress.on_progress(PHASE_COMPARE, 0.0);
    let plan = plan_columns(old, new, config);
    let cell_diffs = compare_common_rows(&matched.common, &plan, config);
    progress.on_progress(PHASE_COMPARE, 1.0);

    progress.on_progress(PHASE_ASSEMBLE, 0.0);
    let report = assemble_report(ReportInputs {
        old,
        new,
        old_index: &old_index,
        new_index: &new_index,
        matched,
        cell_diffs,
        plan,
        config,
    });
    for warning in &report.warnings {
        log::warn!("{warning}");
    }
    log::debug!(
        "diff complete: added={}, removed={}, modified={}, unchanged={}",
        report.summary.added,
        report.summary.removed,
        report.summary.modified,
        report.summary.unchanged
    );
    progress.on_progress(PHASE_ASSEMBLE, 1.0);

    Ok(report)
}

#[cfg(feature = "parallel")]
fn build_indexes<'a>(
    old: &'a Dataset,
    new: &'a Dataset,
    config: &'a ComparisonConfig,
) -> Result<(KeyIndex<'a>, KeyIndex<'a>), DiffError> {
    let (old_index, new_index) = rayon::join(
        || build_key_index(old, DatasetSide::Old, config),
        || build_key_index(new, DatasetSide::New, config),
    );
    Ok((old_index?, new_index?))
}

#[cfg(not(feature = "parallel"))]
fn build_indexes<'a>(
    old: &'a Dataset,
    new: &'a Dataset,
    config: &'a ComparisonConfig,
) -> Result<(KeyIndex<'a>, KeyIndex<'a>), DiffError> {
    let old_index = build_key_index(old, DatasetSide::Old, config)?;
    let new_index = build_key_index(new, DatasetSide::New, config)?;
    Ok((old_index, new_index))
}
