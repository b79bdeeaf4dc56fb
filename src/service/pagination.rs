//! Connection listing pagination utilities
//!
//! Helper functions for validating listing criteria and computing page metadata.

use crate::error::{ConnectionError, Result};
use crate::store::{ConnectionPage, ConnectionQuery};
use crate::types::{ConnectionSearchCriteria, PaginatedConnections, SortDirection};

/// Page size used when the caller sends none
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Validate caller criteria into a store query
///
/// # Arguments
/// * `criteria` - Raw listing criteria
/// * `max_page_size` - Largest page size a caller may request
///
/// # Errors
/// Returns `Validation` if the page size is outside `1..=max_page_size`, the
/// page number is zero, or the page offset does not fit in `usize`
pub(crate) fn build_query(
    criteria: ConnectionSearchCriteria,
    max_page_size: usize,
) -> Result<ConnectionQuery> {
    let page_size = criteria.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > max_page_size {
        return Err(ConnectionError::validation(format!(
            "pageSize must be between 1 and {max_page_size}, got {page_size}"
        )));
    }

    let page_number = criteria.page_number.unwrap_or(1);
    if page_number == 0 {
        return Err(ConnectionError::validation("pageNumber must be at least 1"));
    }
    if page_size.checked_mul(page_number).is_none() {
        return Err(ConnectionError::validation(format!(
            "pageNumber {page_number} is out of range for pageSize {page_size}"
        )));
    }

    let search_text = criteria
        .search_by_text
        .map(|text| text.trim().to_lowercase())
        .filter(|text| !text.is_empty());

    Ok(ConnectionQuery {
        search_text,
        page_size,
        page_number,
        sort_field: criteria.sort_field.unwrap_or_default(),
        direction: criteria
            .sort_by
            .as_deref()
            .map(SortDirection::parse)
            .unwrap_or_default(),
    })
}

/// Attach pagination metadata to a page of results
///
/// `hasNextPage` holds while `page_size * page_number` is below the total,
/// `lastPage` is the total divided by the page size, rounded up.
pub(crate) fn paginate(page: ConnectionPage, page_size: usize, page_number: usize) -> PaginatedConnections {
    let total_items = page.total_items;
    PaginatedConnections {
        total_items,
        has_next_page: page_size.saturating_mul(page_number) < total_items,
        has_previous_page: page_number > 1,
        next_page: page_number.saturating_add(1),
        previous_page: page_number.saturating_sub(1),
        last_page: total_items.div_ceil(page_size.max(1)),
        data: page.items,
    }
}
