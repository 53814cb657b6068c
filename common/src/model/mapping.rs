use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted association between one external row-identifier value and the
/// internal ad copy it resolves to.
///
/// `external_value` is the natural key: the store never holds two records for
/// the same value, and upserting an existing value updates `adcopy_name` and
/// `updated_at` in place. Field names match the on-disk JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    pub id: u32,
    pub external_value: String,
    pub adcopy_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
