use serde::{Serialize, Serializer};

/// Entry of a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    /// Collapsed run of pages
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Page(n) => serializer.serialize_u64(*n as u64),
            PageItem::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

const MAX_PLAIN: usize = 7;

/// Page links to show for `current` out of `total` pages.
///
/// Up to seven pages are listed in full. Beyond that the first and last
/// page are always shown, with a window around the current page; near either
/// end a fixed run of five pages replaces the window.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Page};

    let all = || -> Vec<PageItem> { (1..=total).map(Page).collect() };
    if total <= MAX_PLAIN {
        return all();
    }

    let near_start = current <= 3;
    let near_end = current + 2 >= total;
    match (near_start, near_end) {
        (true, true) => all(),
        (true, false) => (1..=5).map(Page).chain([Ellipsis, Page(total)]).collect(),
        (false, true) => [Page(1), Ellipsis]
            .into_iter()
            .chain((total - 4..=total).map(Page))
            .collect(),
        (false, false) => vec![
            Page(1),
            Ellipsis,
            Page(current - 1),
            Page(current),
            Page(current + 1),
            Ellipsis,
            Page(total),
        ],
    }
}
