//! Paged windows over DAW collections
//!
//! Every collection the surface looks at (tracks, scenes, parameters, devices)
//! is seen through a fixed-size page. The window knows how many items the
//! document currently holds but never the items themselves; content is always
//! fetched from the [`DawModel`](crate::daw::DawModel) by absolute index.
//!
//! ```text
//! items:   0 1 2 3 4 5 6 7 8 9 10 11
//!                  └──page──┘            page_size = 4, scroll_position = 4
//! page index:      0 1 2 3
//! ```

/// Scrollable, fixed-size page over an ordered collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankWindow {
    /// Number of items visible at once (never 0)
    page_size: usize,
    /// Number of items the document currently holds
    item_count: usize,
    /// Absolute index of the first visible item
    scroll_position: usize,
    /// Absolute index of the selected item, if any
    selected: Option<usize>,
    /// Whether deactivated items are hidden from the window
    skip_disabled: bool,
}

impl BankWindow {
    /// Create an empty window with the given page size
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            item_count: 0,
            scroll_position: 0,
            selected: None,
            skip_disabled: false,
        }
    }

    /// Create a window that already knows its item count
    pub fn with_items(page_size: usize, item_count: usize) -> Self {
        let mut bank = Self::new(page_size);
        bank.item_count = item_count;
        bank
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn scroll_position(&self) -> usize {
        self.scroll_position
    }

    /// Update the item count after the document changed
    ///
    /// Selection pointing past the end is dropped; the scroll position is
    /// pulled back so the window still starts on an existing item.
    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        if self.selected.is_some_and(|s| s >= item_count) {
            self.selected = None;
        }
        self.scroll_to(self.scroll_position);
    }

    /// Zero-based page the window currently starts in
    pub fn current_page(&self) -> usize {
        self.scroll_position / self.page_size
    }

    /// Number of pages needed to show every item (at least one)
    pub fn page_count(&self) -> usize {
        self.item_count.div_ceil(self.page_size).max(1)
    }

    /// Resolve a page-relative index to an absolute one
    ///
    /// Returns `None` when the index falls outside the page or past the end of
    /// the document.
    pub fn absolute_index(&self, page_index: usize) -> Option<usize> {
        if page_index >= self.page_size {
            return None;
        }
        let absolute = self.scroll_position + page_index;
        (absolute < self.item_count).then_some(absolute)
    }

    /// Resolve an absolute index to its position in the current page
    pub fn page_index_of(&self, absolute: usize) -> Option<usize> {
        (absolute >= self.scroll_position && absolute < self.scroll_position + self.page_size)
            .then(|| absolute - self.scroll_position)
    }

    /// Scroll so the window starts at `position`, clamped to the last item
    pub fn scroll_to(&mut self, position: usize) {
        self.scroll_position = if self.item_count == 0 {
            0
        } else {
            position.min(self.item_count - 1)
        };
    }

    pub fn can_scroll_forwards(&self) -> bool {
        self.scroll_position + self.page_size < self.item_count
    }

    pub fn can_scroll_backwards(&self) -> bool {
        self.scroll_position > 0
    }

    /// Move the window one item forwards
    pub fn scroll_forwards(&mut self) {
        if self.can_scroll_forwards() {
            self.scroll_position += 1;
        }
    }

    /// Move the window one item backwards
    pub fn scroll_backwards(&mut self) {
        self.scroll_position = self.scroll_position.saturating_sub(1);
    }

    /// Scroll to the start of `page`, clamped to the last page
    pub fn scroll_to_page(&mut self, page: usize) {
        let page = page.min(self.page_count() - 1);
        self.scroll_to(page * self.page_size);
    }

    /// Scroll one page forwards and select the first item of the new page
    ///
    /// Returns the newly selected absolute index, or `None` when already on the
    /// last page.
    pub fn select_next_page(&mut self) -> Option<usize> {
        if !self.can_scroll_forwards() {
            return None;
        }
        self.scroll_to(self.scroll_position + self.page_size);
        self.selected = Some(self.scroll_position);
        self.selected
    }

    /// Scroll one page backwards and select the first item of the new page
    pub fn select_previous_page(&mut self) -> Option<usize> {
        if !self.can_scroll_backwards() {
            return None;
        }
        self.scroll_to(self.scroll_position.saturating_sub(self.page_size));
        self.selected = Some(self.scroll_position);
        self.selected
    }

    /// Absolute index of the selected item
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Select the item at an absolute index (ignored past the end)
    pub fn select(&mut self, absolute: usize) {
        if absolute < self.item_count {
            self.selected = Some(absolute);
        }
    }

    /// Select the item after the current selection
    ///
    /// With nothing selected the first item of the page is picked. The window
    /// follows the selection to the next page when it leaves the current one.
    pub fn select_next_item(&mut self) -> Option<usize> {
        let next = match self.selected {
            None => self.scroll_position,
            Some(s) if s + 1 < self.item_count => s + 1,
            Some(_) => return None,
        };
        if next >= self.item_count {
            return None;
        }
        self.selected = Some(next);
        if self.page_index_of(next).is_none() {
            self.scroll_to(next - next % self.page_size);
        }
        self.selected
    }

    /// Select the item before the current selection
    pub fn select_previous_item(&mut self) -> Option<usize> {
        let previous = match self.selected {
            None if self.item_count > 0 => self.scroll_position,
            Some(s) if s > 0 => s - 1,
            _ => return None,
        };
        self.selected = Some(previous);
        if self.page_index_of(previous).is_none() {
            self.scroll_to(previous - previous % self.page_size);
        }
        self.selected
    }

    pub fn skips_disabled(&self) -> bool {
        self.skip_disabled
    }

    pub fn set_skip_disabled(&mut self, skip: bool) {
        self.skip_disabled = skip;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_index_sentinel() {
        let mut bank = BankWindow::with_items(8, 10);
        assert_eq!(bank.absolute_index(0), Some(0));
        assert_eq!(bank.absolute_index(7), Some(7));
        assert_eq!(bank.absolute_index(8), None);

        bank.scroll_to_page(1);
        assert_eq!(bank.scroll_position(), 8);
        assert_eq!(bank.absolute_index(1), Some(9));
        // Past the end of the document
        assert_eq!(bank.absolute_index(2), None);
    }

    #[test]
    fn test_page_navigation_clamps() {
        let mut bank = BankWindow::with_items(4, 10);
        assert_eq!(bank.page_count(), 3);

        assert_eq!(bank.select_previous_page(), None);
        assert_eq!(bank.select_next_page(), Some(4));
        assert_eq!(bank.select_next_page(), Some(8));
        assert_eq!(bank.select_next_page(), None);
        assert_eq!(bank.current_page(), 2);

        bank.scroll_to_page(42);
        assert_eq!(bank.current_page(), 2);

        assert_eq!(bank.select_previous_page(), Some(4));
        assert_eq!(bank.current_page(), 1);
    }

    #[test]
    fn test_item_selection_follows_page() {
        let mut bank = BankWindow::with_items(4, 6);
        assert_eq!(bank.select_next_item(), Some(0));
        bank.select(3);
        assert_eq!(bank.select_next_item(), Some(4));
        assert_eq!(bank.scroll_position(), 4);
        assert_eq!(bank.select_previous_item(), Some(3));
        assert_eq!(bank.scroll_position(), 0);

        bank.select(5);
        assert_eq!(bank.select_next_item(), None);
        assert_eq!(bank.selected_index(), Some(5));
    }

    #[test]
    fn test_shrinking_document() {
        let mut bank = BankWindow::with_items(4, 12);
        bank.scroll_to_page(2);
        bank.select(10);

        bank.set_item_count(5);
        assert_eq!(bank.selected_index(), None);
        assert_eq!(bank.scroll_position(), 4);
        assert_eq!(bank.absolute_index(0), Some(4));
        assert_eq!(bank.absolute_index(1), None);
    }

    #[test]
    fn test_empty_bank() {
        let mut bank = BankWindow::new(0);
        assert_eq!(bank.page_size(), 1);
        assert_eq!(bank.page_count(), 1);
        assert_eq!(bank.absolute_index(0), None);
        assert_eq!(bank.select_next_item(), None);
        assert_eq!(bank.select_previous_item(), None);
        bank.scroll_forwards();
        assert_eq!(bank.scroll_position(), 0);
    }
}
