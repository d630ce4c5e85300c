use std::sync::Arc;

use chrono::NaiveDate;

use crate::data::filter::{
    filtered_indices, CategoryFilter, DateRange, FilterCriteria, FilteredView, MarketplaceFilter,
};
use crate::data::model::SalesTable;
use crate::views::{render_page, Page, PageView};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// One viewer's controls and the rows they select, independent of rendering.
/// Every control change re-runs the filter; `render` runs the active page's
/// aggregator.
pub struct DashboardState {
    /// Shared, immutable loaded table.
    pub dataset: Arc<SalesTable>,

    /// Selected navigation page.
    pub page: Page,

    /// Current filter controls.
    pub criteria: FilterCriteria,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,
}

impl DashboardState {
    /// Start on the Overview page with every row selected.
    pub fn new(dataset: Arc<SalesTable>) -> Self {
        let criteria = FilterCriteria::defaults_for(&dataset);
        let visible_indices = filtered_indices(&dataset, &criteria);
        Self {
            dataset,
            page: Page::default(),
            criteria,
            visible_indices,
        }
    }

    /// Marketplace choices for the selector, `"All"` first.
    pub fn marketplace_options(&self) -> Vec<String> {
        std::iter::once(crate::data::filter::ALL.to_string())
            .chain(self.dataset.marketplaces())
            .collect()
    }

    /// Category choices for the multi-select, `"All"` first.
    pub fn category_options(&self) -> Vec<String> {
        std::iter::once(crate::data::filter::ALL.to_string())
            .chain(self.dataset.categories())
            .collect()
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.criteria);
    }

    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::from_indices(&self.dataset, self.visible_indices.clone())
    }

    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.criteria.date_range = Some(DateRange::new(start, end));
        self.refilter();
    }

    pub fn set_marketplace(&mut self, marketplace: MarketplaceFilter) {
        self.criteria.marketplace = marketplace;
        self.refilter();
    }

    pub fn set_categories(&mut self, categories: CategoryFilter) {
        self.criteria.categories = categories;
        self.refilter();
    }

    /// Toggle a single category in the selection.
    pub fn toggle_category(&mut self, category: &str) {
        let selected = &mut self.criteria.categories.0;
        if !selected.remove(category) {
            selected.insert(category.to_string());
        }
        self.refilter();
    }

    /// Select every category present in the dataset.
    pub fn select_all_categories(&mut self) {
        self.criteria.categories = CategoryFilter::of(self.dataset.categories());
        self.refilter();
    }

    /// Aggregate the visible rows for the active page.
    pub fn render(&self) -> PageView {
        render_page(self.page, &self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{record, table};

    fn state() -> DashboardState {
        let mut uk = record(2, "B", "Apparel", 2, 20, 20.0);
        uk.marketplace = "UK".into();
        DashboardState::new(Arc::new(table(vec![
            record(1, "A", "Books", 1, 10, 10.0),
            uk,
            record(3, "C", "Electronics", 3, 30, 30.0),
        ])))
    }

    #[test]
    fn starts_with_everything_visible() {
        let s = state();
        assert_eq!(s.visible_indices, vec![0, 1, 2]);
        assert_eq!(s.page, Page::Overview);
        assert_eq!(s.marketplace_options(), vec!["All", "US", "UK"]);
        assert_eq!(s.category_options(), vec!["All", "Books", "Apparel", "Electronics"]);
    }

    #[test]
    fn controls_refilter() {
        let mut s = state();
        s.set_marketplace(MarketplaceFilter::Only("US".into()));
        assert_eq!(s.visible_indices, vec![0, 2]);

        s.toggle_category("Books");
        assert_eq!(s.visible_indices, vec![2]);

        let jan = |d| NaiveDate::from_ymd_opt(2022, 1, d).unwrap();
        s.set_date_range(jan(1), jan(2));
        assert!(s.visible_indices.is_empty());
        s.set_page(Page::Finance);
        assert!(matches!(s.render(), PageView::NoData { page: Page::Finance, .. }));

        s.select_all_categories();
        assert_eq!(s.visible_indices, vec![0]);
    }

    #[test]
    fn deselecting_every_category_means_unrestricted() {
        let mut s = state();
        s.set_categories(CategoryFilter::all());
        assert_eq!(s.visible_indices.len(), 3);
    }
}
