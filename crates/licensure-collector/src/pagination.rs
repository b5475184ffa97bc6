//! Pagination link discovery for the results page.

/// Page links to open from a rendered pagination control.
///
/// The control is a flat list of anchors. Ellipsis placeholders carry no
/// `href`. The real page links are exactly those strictly between the
/// first and the second placeholder, which leaves out the previous and
/// next buttons on either side. Order is preserved. With fewer than two
/// placeholders there is no inner range and nothing is returned.
#[must_use]
pub fn inner_page_links(hrefs: &[Option<String>]) -> Vec<String> {
    let mut placeholders = hrefs
        .iter()
        .enumerate()
        .filter(|(_, href)| href.is_none())
        .map(|(i, _)| i);

    match (placeholders.next(), placeholders.next()) {
        (Some(first), Some(second)) => hrefs[first + 1..second]
            .iter()
            .flatten()
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}
