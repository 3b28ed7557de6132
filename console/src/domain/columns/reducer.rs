//! Pure visible-list transitions.
//!
//! Every function takes the catalogue and the current list and returns the
//! next list. The manager owns state and persistence; these own the rules.

use std::collections::HashSet;

use crate::domain::ColumnId;

use super::ColumnVisibilityError;
use super::table_config::TableConfig;

/// Insert `column` after every visible column ranked before it.
fn insert_by_rank(config: &TableConfig, visible: &mut Vec<ColumnId>, column: ColumnId) {
    let Some(rank) = config.rank(&column) else {
        return;
    };
    let insert_at = visible
        .iter()
        .filter(|candidate| config.rank(candidate).is_some_and(|other| other < rank))
        .count();
    visible.insert(insert_at, column);
}

/// Drop unknown and repeated ids, then add any missing always-visible column
/// at its ranked position.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::{ColumnId, TableConfig, normalize_columns};
/// let id = |raw: &str| ColumnId::new(raw).expect("valid column id");
/// let config = TableConfig::new([id("name"), id("email"), id("role")])
///     .with_always_visible([id("name")]);
/// let visible = normalize_columns(&config, [id("role"), id("ghost"), id("role")]);
/// assert_eq!(visible, vec![id("name"), id("role")]);
/// ```
#[must_use]
pub fn normalize_columns(
    config: &TableConfig,
    columns: impl IntoIterator<Item = ColumnId>,
) -> Vec<ColumnId> {
    let mut seen = HashSet::new();
    let mut visible: Vec<ColumnId> = columns
        .into_iter()
        .filter(|column| config.is_available(column) && seen.insert(column.clone()))
        .collect();
    for column in &config.available_columns {
        if config.is_always_visible(column) && !seen.contains(column) {
            insert_by_rank(config, &mut visible, column.clone());
        }
    }
    visible
}

/// The catalogue's default list, normalised.
#[must_use]
pub fn default_columns(config: &TableConfig) -> Vec<ColumnId> {
    normalize_columns(config, config.default_visible_columns.iter().cloned())
}

/// Show a hidden column or hide a visible one.
///
/// Always-visible and unknown columns leave the list unchanged. A shown column
/// lands after every visible column that precedes it in `availableColumns`.
#[must_use]
pub fn toggle_column(config: &TableConfig, visible: &[ColumnId], column: &ColumnId) -> Vec<ColumnId> {
    if !config.is_available(column) {
        return visible.to_vec();
    }
    let mut next = visible.to_vec();
    if let Some(position) = next.iter().position(|candidate| candidate == column) {
        if config.is_always_visible(column) {
            return next;
        }
        next.remove(position);
    } else {
        insert_by_rank(config, &mut next, column.clone());
    }
    normalize_columns(config, next)
}

/// Move the column at `from` so it sits at `to` once removed from the list.
///
/// # Errors
///
/// [`ColumnVisibilityError::InvalidIndex`] when either index is outside the
/// current list.
pub fn reorder_columns(
    visible: &[ColumnId],
    from: usize,
    to: usize,
) -> Result<Vec<ColumnId>, ColumnVisibilityError> {
    let len = visible.len();
    if from >= len || to >= len {
        return Err(ColumnVisibilityError::InvalidIndex { from, to, len });
    }
    let mut next = visible.to_vec();
    let column = next.remove(from);
    next.insert(to, column);
    Ok(next)
}

/// Turn a persisted override into a valid list for `config`.
///
/// Ids that fail validation or are no longer available are dropped.
#[must_use]
pub fn sanitize_override(config: &TableConfig, stored: Vec<String>) -> Vec<ColumnId> {
    normalize_columns(
        config,
        stored
            .into_iter()
            .filter_map(|raw| ColumnId::new(raw).ok()),
    )
}
