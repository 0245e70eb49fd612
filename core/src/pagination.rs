//! Page-count arithmetic for a fixed page size.

/// Items per page shown by the list.
pub const PAGE_SIZE: u32 = 3;

/// Number of pages needed for `total_count` items, never less than 1.
pub fn compute_bounds(total_count: usize, page_size: u32) -> u32 {
    let page_size = page_size.max(1) as usize;
    let pages = total_count.div_ceil(page_size);
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Pull `requested` into `[1, total_pages]`.
pub fn clamp(requested: u32, total_pages: u32) -> u32 {
    requested.min(total_pages.max(1)).max(1)
}

/// Offset of the first item on a 1-based `page`.
pub fn page_offset(page: u32, page_size: u32) -> usize {
    (page.max(1) as usize - 1) * page_size as usize
}

/// Coerce raw page input (query string, form field) to a positive page
/// number. Anything unparseable or zero reads as page 1.
pub fn parse_page(raw: &str) -> u32 {
    raw.trim().parse::<u32>().ok().filter(|page| *page > 0).unwrap_or(1)
}
