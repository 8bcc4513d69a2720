//! Splitting long lists into pages and rendering the links between them.

use maud::{Markup, html};

use crate::html::LINK_STYLE;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
    /// The maximum number of page links to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
            max_pages: 5,
        }
    }
}

/// A page number and page size taken from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Read the page and page size from raw query values.
    ///
    /// Missing, unparseable or zero values fall back to the defaults in
    /// `config`, and the page size is capped at [PaginationConfig::max_page_size].
    pub fn from_query(page: Option<&str>, per_page: Option<&str>, config: &PaginationConfig) -> Self {
        let parse = |value: Option<&str>| {
            value
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|&value| value > 0)
        };

        Self {
            page: parse(page).unwrap_or(config.default_page).max(1),
            per_page: parse(per_page)
                .unwrap_or(config.default_page_size)
                .clamp(1, config.max_page_size.max(1)),
        }
    }

    /// The number of pages needed for `item_count` items, at least one.
    pub fn page_count(&self, item_count: u64) -> u64 {
        item_count.div_ceil(self.per_page).max(1)
    }

    /// Move the page back to the last page if it is past the end.
    pub fn clamp_to(self, page_count: u64) -> Self {
        Self {
            page: self.page.min(page_count.max(1)),
            ..self
        }
    }

    /// The number of items to skip to reach this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// Lay out the page links for `curr_page`, showing at most `max_pages`
/// numbered pages around it plus the first and last page.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let to_indicator = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let half = max_pages / 2;
    let window = if page_count <= max_pages {
        1..=page_count
    } else if curr_page <= half {
        1..=max_pages
    } else if curr_page > page_count - half {
        (page_count - max_pages + 1)..=page_count
    } else {
        (curr_page - half)..=(curr_page + half)
    };

    let mut indicators = Vec::new();

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if page_count > max_pages && curr_page > half + 1 {
        indicators.push(PaginationIndicator::Page(1));
        indicators.push(PaginationIndicator::Ellipsis);
    }

    indicators.extend(window.map(to_indicator));

    if page_count > max_pages && curr_page < page_count - half {
        indicators.push(PaginationIndicator::Ellipsis);
        indicators.push(PaginationIndicator::Page(page_count));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

const PAGE_LINK_STYLE: &str = "block px-3 py-2 rounded hover:bg-gray-100 dark:hover:bg-gray-700";
const CURRENT_PAGE_STYLE: &str =
    "block px-3 py-2 rounded bg-blue-600 text-white font-semibold dark:bg-blue-500";

/// Render the page links, using `page_url` to build the link for a page number.
pub fn pagination_nav(indicators: &[PaginationIndicator], page_url: impl Fn(u64) -> String) -> Markup {
    html! {
        @if !indicators.is_empty() {
            nav class="pagination flex justify-center mt-6" aria-label="Pagination"
            {
                ul class="pagination flex flex-wrap items-center gap-1 text-sm"
                {
                    @for indicator in indicators {
                        li {
                            @match indicator {
                                PaginationIndicator::Page(page) => {
                                    a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { (page) }
                                }
                                PaginationIndicator::CurrPage(page) => {
                                    p aria-current="page" class=(CURRENT_PAGE_STYLE) { (page) }
                                }
                                PaginationIndicator::Ellipsis => {
                                    p class="px-2 text-gray-500" { "…" }
                                }
                                PaginationIndicator::BackButton(page) => {
                                    a href=(page_url(*page)) class=(LINK_STYLE) rel="prev" { "Back" }
                                }
                                PaginationIndicator::NextButton(page) => {
                                    a href=(page_url(*page)) class=(LINK_STYLE) rel="next" { "Next" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod indicator_tests {
    use super::{PaginationIndicator::*, create_pagination_indicators};

    #[test]
    fn few_pages_are_all_shown() {
        let got = create_pagination_indicators(2, 3, 5);

        assert_eq!(got, [BackButton(1), Page(1), CurrPage(2), Page(3), NextButton(3)]);
    }

    #[test]
    fn single_page_has_no_buttons() {
        assert_eq!(create_pagination_indicators(1, 1, 5), [CurrPage(1)]);
    }

    #[test]
    fn first_page_of_many() {
        let got = create_pagination_indicators(1, 10, 5);

        assert_eq!(
            got,
            [
                CurrPage(1),
                Page(2),
                Page(3),
                Page(4),
                Page(5),
                Ellipsis,
                Page(10),
                NextButton(2)
            ]
        );
    }

    #[test]
    fn middle_page_has_ellipsis_on_both_sides() {
        let got = create_pagination_indicators(5, 10, 5);

        assert_eq!(
            got,
            [
                BackButton(4),
                Page(1),
                Ellipsis,
                Page(3),
                Page(4),
                CurrPage(5),
                Page(6),
                Page(7),
                Ellipsis,
                Page(10),
                NextButton(6)
            ]
        );
    }

    #[test]
    fn last_page_of_many() {
        let got = create_pagination_indicators(10, 10, 5);

        assert_eq!(
            got,
            [
                BackButton(9),
                Page(1),
                Ellipsis,
                Page(6),
                Page(7),
                Page(8),
                Page(9),
                CurrPage(10)
            ]
        );
    }
}
