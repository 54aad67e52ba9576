use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::Listing;

/// Anchors wrapping one organic (non-ad) search result.
const LISTING_SELECTOR: &str = "a.listing-link.wt-display-inline-block";

/// Nested `div`s between a listing anchor and its thumbnail `img`.
const THUMBNAIL_DEPTH: usize = 6;

/// Extract up to `limit` listings from a search-results page, in document
/// order.  An anchor whose markup is missing the link or the thumbnail
/// container chain is skipped, so fewer than `limit` may come back.
pub(crate) fn parse_listings(html: &str, limit: usize) -> Vec<Listing> {
    if limit == 0 {
        return Vec::new();
    }

    let doc = Html::parse_document(html);
    let Ok(anchors) = Selector::parse(LISTING_SELECTOR) else {
        return Vec::new();
    };

    doc.select(&anchors)
        .take(limit)
        .filter_map(|anchor| {
            let listing = listing_from_anchor(anchor);
            if listing.is_none() {
                warn!(
                    id = anchor.value().attr("data-listing-id").unwrap_or(""),
                    "skipping listing with unexpected markup"
                );
            }
            listing
        })
        .collect()
}

fn listing_from_anchor(anchor: ElementRef<'_>) -> Option<Listing> {
    let attr = |name: &str| anchor.value().attr(name).map(str::to_string);

    Some(Listing {
        title: attr("title").unwrap_or_default(),
        href: attr("href")?,
        id: attr("data-listing-id"),
        position: attr("data-position-num"),
        thumbnail: thumbnail(anchor)?,
    })
}

/// Walk `THUMBNAIL_DEPTH` first-descendant `div`s, then the first `img`.
/// `None` when the chain is broken; `Some(None)` when the image has no `src`.
fn thumbnail(anchor: ElementRef<'_>) -> Option<Option<String>> {
    let mut node = anchor;
    for _ in 0..THUMBNAIL_DEPTH {
        node = first_descendant(node, "div")?;
    }
    let img = first_descendant(node, "img")?;
    Some(img.value().attr("src").map(str::to_string))
}

fn first_descendant<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == name)
}
