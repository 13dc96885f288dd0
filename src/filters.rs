use tracing::info;

use crate::constants::{ECOSYSTEM_TYPE_COLUMN, EXCHANGE_VALUE_COLUMN, SPECIES_GROUP_COLUMN};
use crate::dataset::DatasetDescriptor;
use crate::table::RecordTable;

/// Drop every row whose exchange value is null. Returns the number removed.
pub fn remove_null_exchange_values(table: &mut RecordTable) -> usize {
    info!("🧹 Removing null/NA exchange values...");

    let removed = table.retain_rows(|row| row.get(EXCHANGE_VALUE_COLUMN).is_some_and(|v| !v.is_null()));

    if removed > 0 {
        info!("Removed {} records with null/NA exchange values", removed);
    } else {
        info!("No null/NA values to remove");
    }
    removed
}

/// Drop rows whose species group or ecosystem type is an aggregate sentinel.
/// A row matching either sentinel is removed. No-op when disabled.
pub fn remove_aggregate_rows(table: &mut RecordTable, descriptor: &DatasetDescriptor, enabled: bool) -> usize {
    if !enabled {
        info!("Skipping aggregate row removal (remove_aggregates=false)");
        return 0;
    }

    info!("🧹 Removing aggregate rows...");

    let removed = table.retain_rows(|row| {
        !is_sentinel(row.text(SPECIES_GROUP_COLUMN), &descriptor.aggregate_species)
            && !is_sentinel(row.text(ECOSYSTEM_TYPE_COLUMN), &descriptor.aggregate_ecosystems)
    });

    if removed > 0 {
        info!("Removed {} aggregate rows", removed);
    } else {
        info!("No aggregate rows found to remove");
    }
    removed
}

fn is_sentinel(value: Option<&str>, sentinels: &[String]) -> bool {
    value.is_some_and(|v| sentinels.iter().any(|s| s == v))
}

/// Drop the display-only columns that are present. Returns the dropped names.
pub fn remove_display_columns(table: &mut RecordTable, descriptor: &DatasetDescriptor, enabled: bool) -> Vec<String> {
    if !enabled {
        info!("Keeping display columns (remove_display=false)");
        return Vec::new();
    }

    info!("🧹 Removing display-only columns...");

    let dropped = table.drop_columns(&descriptor.display_columns);
    if dropped.is_empty() {
        info!("No display columns to remove");
    } else {
        info!("Removed columns: {:?}", dropped);
    }
    dropped
}
