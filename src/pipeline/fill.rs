//! Forward fill
//!
//! Replaces missing cells of one column with the most recent non-missing
//! value above them. Leading missing cells stay missing.

use crate::frame::{TimeFrame, Value};

/// Forward fill `field` in timestamp order.
///
/// Returns the number of cells filled. An absent field is a no-op.
pub fn forward_fill(frame: &mut TimeFrame, field: &str) -> usize {
    let Some(idx) = frame.column_index(field) else {
        return 0;
    };

    let mut last: Option<Value> = None;
    let mut filled = 0;
    for row in &mut frame.rows {
        let Some(cell) = row.values.get_mut(idx) else {
            continue;
        };
        if cell.is_missing() {
            if let Some(prev) = &last {
                *cell = prev.clone();
                filled += 1;
            }
        } else {
            last = Some(cell.clone());
        }
    }

    if filled > 0 {
        tracing::debug!(field, filled, "Forward filled missing values");
    }
    filled
}
