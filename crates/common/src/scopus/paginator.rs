//! Accumulates entries across remote pages until a target count is met.

use super::client::PageFetcher;
use super::query::SortBy;
use crate::errors::Result;
use serde_json::Value;

/// Collect up to `target` raw entries starting at offset `start`.
///
/// Returns the entries (never more than `target`) and the total the first
/// response reported. Stops on the first of: target reached, an empty page,
/// the cursor passing the reported total, or a short page. A short page ends
/// collection even when the total says more results exist.
pub async fn collect<F>(
    fetcher: &F,
    query: &str,
    target: u32,
    sort: SortBy,
    start: u64,
) -> Result<(Vec<Value>, u64)>
where
    F: PageFetcher + ?Sized,
{
    let page_max = fetcher.max_per_page().max(1);
    let mut entries: Vec<Value> = Vec::with_capacity(target as usize);
    let mut total: Option<u64> = None;
    let mut remaining = target;
    let mut cursor = start;

    while remaining > 0 {
        let count = page_max.min(remaining);
        let page = fetcher.fetch_page(query, count, cursor, sort).await?;

        let total_available = *total.get_or_insert(page.total_available);

        if page.entries.is_empty() {
            break;
        }

        let retrieved = page.entries.len();
        entries.extend(page.entries);
        remaining = remaining.saturating_sub(retrieved as u32);
        cursor += retrieved as u64;

        if cursor >= total_available {
            break;
        }
        if retrieved < count as usize {
            break;
        }
    }

    entries.truncate(target as usize);
    Ok((entries, total.unwrap_or(0)))
}
