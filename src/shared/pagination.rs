//! Pagination math for the gallery pager.

use serde::Serialize;

/// Pages always shown at full length
const COMPACT_LIMIT: u32 = 7;
/// Pages on each side of the current one
const WINDOW: u32 = 2;

/// One slot of the pager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// `ceil(total_items / page_size)`; zero when `page_size` is zero
pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size as u64) as u32
}

/// Zero-based half-open item range `[start, end)` covered by `page`,
/// clipped to `total_items`
pub fn page_bounds(page: u32, page_size: u32, total_items: u64) -> (u64, u64) {
    let page = page.max(1) as u64;
    let size = page_size as u64;
    let start = ((page - 1) * size).min(total_items);
    let end = (page * size).min(total_items);
    (start, end)
}

/// One-based "showing X to Y of Z" numbers; `None` when the page is empty
pub fn showing_range(page: u32, page_size: u32, total_items: u64) -> Option<(u64, u64)> {
    let (start, end) = page_bounds(page, page_size, total_items);
    (end > start).then_some((start + 1, end))
}

/// Compact list of page numbers with ellipsis markers.
///
/// With seven pages or fewer every page is listed. Otherwise the first and
/// last pages are always present, together with a window of two pages on
/// each side of `current`, and every gap collapses into one ellipsis. A
/// single page (or none) produces an empty pager.
pub fn visible_pages(current: u32, total: u32) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }
    if total <= COMPACT_LIMIT {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let start = current.saturating_sub(WINDOW).max(2);
    let end = (current + WINDOW).min(total - 1);

    let mut items = vec![PageItem::Page(1)];
    if start > 2 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total - 1 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total));
    items
}
