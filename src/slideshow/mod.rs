/// Slideshow page model
///
/// Keeps the ordered pages of a slideshow, the current position and which
/// pages are loaded. Pages near the current one (the preload window) are
/// loaded; pages that leave the window are released so their memory and
/// any in-flight request go away.
///
/// Load outcomes arrive asynchronously. Each load carries a `LoadTicket`;
/// outcomes for a page that was released in the meantime are ignored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitmap::Image;
use crate::loader::{ImageLoader, ImageView};
use crate::source::{Callback, ImageSource};

/// How many pages around the current one are kept loaded
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preload {
    /// Load every page up front
    #[default]
    All,
    /// Load pages at most this far from the current page
    Fixed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlideshowOptions {
    /// Wrap from the last page to the first and back
    pub circular: bool,
    pub preload: Preload,
}

/// Load state of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Empty,
    Loading,
    Loaded,
    Failed,
}

/// Identifies one load of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub page: usize,
    generation: u64,
}

struct Page {
    source: Arc<dyn ImageSource>,
    view: ImageView,
    state: PageState,
    generation: u64,
}

pub struct Slideshow {
    pages: Vec<Page>,
    current: usize,
    options: SlideshowOptions,
    loader: ImageLoader,
}

impl Slideshow {
    pub fn new(sources: Vec<Arc<dyn ImageSource>>, loader: &ImageLoader, options: SlideshowOptions) -> Self {
        let mut slideshow = Self {
            pages: Vec::new(),
            current: 0,
            options,
            loader: loader.clone(),
        };
        slideshow.extend(sources);
        slideshow
    }

    /// Append pages at the end
    pub fn extend(&mut self, sources: impl IntoIterator<Item = Arc<dyn ImageSource>>) {
        for source in sources {
            self.pages.push(Page {
                source,
                view: ImageView::new(&self.loader),
                state: PageState::Empty,
                generation: 0,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn options(&self) -> SlideshowOptions {
        self.options
    }

    /// Image displayed by the current page
    pub fn current_image(&self) -> Option<Image> {
        self.pages.get(self.current).and_then(|page| page.view.image())
    }

    pub fn view(&self, page: usize) -> Option<&ImageView> {
        self.pages.get(page).map(|page| &page.view)
    }

    pub fn page_state(&self, page: usize) -> Option<PageState> {
        self.pages.get(page).map(|page| page.state)
    }

    /// Move to the next page; returns whether the position changed
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.pages.len() {
            self.set_page(self.current + 1)
        } else if self.options.circular {
            self.set_page(0)
        } else {
            false
        }
    }

    /// Move to the previous page; returns whether the position changed
    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.set_page(self.current - 1)
        } else if self.options.circular && !self.pages.is_empty() {
            self.set_page(self.pages.len() - 1)
        } else {
            false
        }
    }

    /// Jump to `page`, clamped to the last page
    pub fn set_page(&mut self, page: usize) -> bool {
        let page = page.min(self.pages.len().saturating_sub(1));
        let changed = page != self.current;
        self.current = page;
        changed
    }

    /// Whether `page` is inside the preload window
    pub fn in_window(&self, page: usize) -> bool {
        match self.options.preload {
            Preload::All => page < self.pages.len(),
            Preload::Fixed(offset) => self.distance(page) <= offset,
        }
    }

    /// Distance from the current page, going round when circular
    fn distance(&self, page: usize) -> usize {
        let direct = page.abs_diff(self.current);
        if self.options.circular {
            direct.min(self.pages.len() - direct)
        } else {
            direct
        }
    }

    /// Start loads for empty pages in the window and release the rest
    ///
    /// `callback_for` builds the completion for each started load; pass
    /// its outcome back through `finish_load`.
    pub fn refresh_loads(&mut self, mut callback_for: impl FnMut(LoadTicket) -> Callback) {
        for index in 0..self.pages.len() {
            if self.in_window(index) {
                if self.pages[index].state == PageState::Empty {
                    let page = &mut self.pages[index];
                    page.state = PageState::Loading;
                    let ticket = LoadTicket {
                        page: index,
                        generation: page.generation,
                    };
                    debug!(page = index, "loading page");
                    page.source.load(&page.view, callback_for(ticket));
                }
            } else if self.pages[index].state != PageState::Empty {
                self.release(index);
            }
        }
    }

    /// Record the outcome of a load
    ///
    /// Returns false when the ticket is stale.
    pub fn finish_load(&mut self, ticket: LoadTicket, loaded: bool) -> bool {
        let Some(page) = self.pages.get_mut(ticket.page) else {
            return false;
        };
        if page.generation != ticket.generation || page.state != PageState::Loading {
            return false;
        }

        page.state = if loaded {
            PageState::Loaded
        } else {
            PageState::Failed
        };
        true
    }

    /// Cancel the page's load and drop its image
    pub fn release(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index) {
            debug!(page = index, "releasing page");
            page.generation += 1;
            page.state = PageState::Empty;
            page.source.cancel_load(&page.view);
            page.view.display(None);
        }
    }
}

impl std::fmt::Debug for Slideshow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slideshow")
            .field("pages", &self.pages.len())
            .field("current", &self.current)
            .field("options", &self.options)
            .finish()
    }
}
