use serde::{Deserialize, Serialize};

use crate::error::LimitError;

/// Smallest accepted `limit` query parameter.
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest accepted `limit` query parameter.
pub const MAX_PAGINATION_LIMIT: u32 = 500;

/// Page size applied when the request does not carry `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Server-wide resource limits, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of collections the server will register.
    #[serde(default = "default_max_collections")]
    pub max_collections_per_server: usize,
    /// Maximum columns per collection, system columns counted.
    #[serde(default = "default_max_columns")]
    pub max_columns_per_collection: usize,
    /// Maximum filter parameters per list request.
    #[serde(default = "default_max_filters")]
    pub max_filters_per_request: usize,
    /// Maximum sort fields per list request.
    #[serde(default = "default_max_sort_fields")]
    pub max_sort_fields_per_request: usize,
    /// Maximum items in one batch request.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Maximum request body size in bytes for write endpoints.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_collections_per_server: default_max_collections(),
            max_columns_per_collection: default_max_columns(),
            max_filters_per_request: default_max_filters(),
            max_sort_fields_per_request: default_max_sort_fields(),
            max_batch_size: default_max_batch_size(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_max_collections() -> usize {
    100
}

fn default_max_columns() -> usize {
    64
}

fn default_max_filters() -> usize {
    20
}

fn default_max_sort_fields() -> usize {
    5
}

fn default_max_batch_size() -> usize {
    100
}

fn default_max_payload_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Limits {
    /// Checks the collection count after adding one more collection.
    pub fn check_collection_count(&self, current: usize) -> Result<(), LimitError> {
        if current + 1 > self.max_collections_per_server {
            return Err(LimitError::TooManyCollections {
                count: current + 1,
                max: self.max_collections_per_server,
            });
        }
        Ok(())
    }

    /// Checks the total column count of a collection. `user_columns` excludes
    /// the two implicit system columns, which count against the limit.
    pub fn check_column_count(&self, user_columns: usize) -> Result<(), LimitError> {
        let total = user_columns + crate::reserved::SYSTEM_COLUMNS.len();
        if total > self.max_columns_per_collection {
            return Err(LimitError::TooManyColumns {
                count: total,
                max: self.max_columns_per_collection,
            });
        }
        Ok(())
    }

    /// Checks the number of filter parameters in a list request.
    pub fn check_filter_count(&self, count: usize) -> Result<(), LimitError> {
        if count > self.max_filters_per_request {
            return Err(LimitError::TooManyFilters {
                count,
                max: self.max_filters_per_request,
            });
        }
        Ok(())
    }

    /// Checks the number of sort fields in a list request.
    pub fn check_sort_field_count(&self, count: usize) -> Result<(), LimitError> {
        if count > self.max_sort_fields_per_request {
            return Err(LimitError::TooManySortFields {
                count,
                max: self.max_sort_fields_per_request,
            });
        }
        Ok(())
    }

    /// Checks the item count of a batch request.
    pub fn check_batch_size(&self, count: usize) -> Result<(), LimitError> {
        if count > self.max_batch_size {
            return Err(LimitError::BatchTooLarge {
                count,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    /// Checks a request body size against the payload cap.
    pub fn check_payload_bytes(&self, bytes: u64) -> Result<(), LimitError> {
        if bytes > self.max_payload_bytes {
            return Err(LimitError::PayloadTooLarge {
                bytes,
                max: self.max_payload_bytes,
            });
        }
        Ok(())
    }
}
