//! The navigation bar shown at the top of every page, and at the bottom on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Tailwind classes for a link, depending on whether it is the current page.
struct LinkClasses {
    current: &'static str,
    other: &'static str,
}

impl LinkClasses {
    fn pick(&self, is_current: bool) -> &'static str {
        if is_current { self.current } else { self.other }
    }
}

const DESKTOP_LINK: LinkClasses = LinkClasses {
    current: "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent \
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500",
    other: "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 \
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 \
        dark:hover:text-white lg:dark:hover:bg-transparent",
};

const BOTTOM_BAR_ITEM: LinkClasses = LinkClasses {
    current: "flex w-full min-w-0 items-center justify-center rounded-lg \
        bg-blue-50 px-2.5 py-2 text-xs font-semibold leading-tight \
        text-blue-700 shadow-sm sm:px-4 sm:text-sm cursor-pointer \
        dark:bg-blue-900/30 dark:text-blue-200",
    other: "flex w-full min-w-0 items-center justify-center rounded-lg \
        px-2.5 py-2 text-xs font-semibold leading-tight text-gray-600 \
        sm:px-4 sm:text-sm cursor-pointer \
        hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
        dark:hover:bg-blue-900/20 dark:hover:text-blue-200",
};

const MORE_MENU_ITEM: LinkClasses = LinkClasses {
    current: "block rounded-lg bg-blue-50 px-3 py-2 text-blue-700 \
        dark:bg-blue-900/30 dark:text-blue-200",
    other: "block rounded-lg px-3 py-2 text-gray-700 hover:bg-gray-100 \
        hover:text-blue-700 dark:text-gray-200 dark:hover:bg-gray-800/80 \
        dark:hover:text-blue-200",
};

/// Where a link goes in the bottom bar on small screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Always visible.
    Primary,
    /// Tucked away in the "More" menu.
    More,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    url: &'static str,
    title: &'static str,
    placement: Placement,
    is_current: bool,
}

impl Link {
    fn html(&self, classes: &LinkClasses) -> Markup {
        html!(
            a
                href=(self.url)
                class=(classes.pick(self.is_current))
                aria-current=[self.is_current.then_some("page")]
            { (self.title) }
        )
    }
}

/// Whether `endpoint` is the page at `url` or one of its sub-pages.
fn is_within(endpoint: &str, url: &str) -> bool {
    endpoint
        .strip_prefix(url)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// The links to every section of the app, with the current section highlighted.
pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Get the navigation bar.
    ///
    /// A link is marked as active when `active_endpoint` is the link's page
    /// or one of its sub-pages, e.g. "/transactions/new" for "Transactions".
    pub fn new(active_endpoint: &str) -> NavBar {
        let link = |url: &'static str, title: &'static str, placement: Placement| Link {
            url,
            title,
            placement,
            is_current: is_within(active_endpoint, url),
        };

        let links = vec![
            link(endpoints::DASHBOARD_VIEW, "Dashboard", Placement::Primary),
            link(endpoints::TRANSACTIONS_VIEW, "Transactions", Placement::Primary),
            link(endpoints::CATEGORIES_VIEW, "Categories", Placement::Primary),
            link(endpoints::REPORT_VIEW, "Report", Placement::More),
            link(endpoints::CURRENCY_SETTINGS_VIEW, "Settings", Placement::More),
            // Log out is an action, never the current page.
            Link {
                is_current: false,
                ..link(endpoints::LOG_OUT, "Log out", Placement::More)
            },
        ];

        NavBar { links }
    }

    fn placed(&self, placement: Placement) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |link| link.placement == placement)
    }

    fn top_bar(&self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        img src="/static/favicon.svg" alt="Ledgerly Logo" class="h-8";

                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Ledgerly"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4 \
                            border border-gray-100 rounded bg-gray-50 \
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0 \
                            lg:border-0 lg:bg-white dark:bg-gray-800 \
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in &self.links {
                                li { (link.html(&DESKTOP_LINK)) }
                            }
                        }
                    }
                }
            }
        )
    }

    fn bottom_bar(&self) -> Markup {
        let more_is_current = self.placed(Placement::More).any(|link| link.is_current);

        html!(
            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    div
                        class="rounded-xl border border-gray-200 bg-white/95 \
                        shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul
                            class="grid grid-cols-4 gap-2 px-4 py-3"
                            aria-label="Primary"
                        {
                            @for link in self.placed(Placement::Primary) {
                                li class="min-w-0" {
                                    a
                                        href=(link.url)
                                        class=(BOTTOM_BAR_ITEM.pick(link.is_current))
                                        aria-current=[link.is_current.then_some("page")]
                                    {
                                        span class="truncate" { (link.title) }
                                    }
                                }
                            }

                            li class="min-w-0" {
                                details class="group relative"
                                {
                                    summary
                                        class={
                                            "list-none [&::-webkit-details-marker]:hidden "
                                            (BOTTOM_BAR_ITEM.pick(more_is_current))
                                        }
                                        aria-current=[more_is_current.then_some("page")]
                                    {
                                        span class="truncate" { "More" }
                                    }

                                    div
                                        class="absolute bottom-full right-0 mb-3 w-40 rounded-xl \
                                        border border-gray-200 bg-white/95 p-2 shadow-xl \
                                        backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                                    {
                                        ul class="flex flex-col gap-1 text-sm font-medium"
                                        {
                                            @for link in self.placed(Placement::More) {
                                                li { (link.html(&MORE_MENU_ITEM)) }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }

    pub fn into_html(self) -> Markup {
        html!(
            (self.top_bar())
            (self.bottom_bar())
        )
    }
}
