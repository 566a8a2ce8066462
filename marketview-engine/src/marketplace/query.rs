//! Filtered, sorted, paginated views of a [`Collection`].

use super::record::{AppRecord, Collection};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(24);

/// Field the listing is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// What slice of the collection to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub filter_text: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub page_offset: usize,
    pub page_size: NonZeroUsize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
            page_offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryParams {
    #[must_use]
    pub fn with_filter(mut self, text: impl Into<String>) -> Self {
        self.filter_text = text.into();
        self
    }

    #[must_use]
    pub fn with_sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.sort_direction = direction;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.page_offset = offset;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, size: NonZeroUsize) -> Self {
        self.page_size = size;
        self
    }

    /// Column-header click: the active key flips direction, another key
    /// becomes active in ascending order.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_key = key;
            self.sort_direction = SortDirection::Asc;
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub items: Vec<Arc<AppRecord>>,
    /// Number of records matching the filter, across all pages.
    pub total: usize,
    /// Offset actually used, after any reset.
    pub offset: usize,
}

impl QueryPage {
    /// Whether records remain after this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

fn sort_value(record: &AppRecord, key: SortKey) -> String {
    match key {
        SortKey::Name => record.name.to_lowercase(),
    }
}

/// Sort, filter and paginate `collection`.
///
/// The sort is stable in both directions, so records with equal keys keep
/// their collection order. An offset past the number of matches falls back
/// to the first page. The collection itself is never reordered.
#[must_use]
pub fn query(collection: &Collection, params: &QueryParams) -> QueryPage {
    let mut rows: Vec<(String, &Arc<AppRecord>)> = collection
        .records()
        .iter()
        .map(|record| (sort_value(record, params.sort_key), record))
        .collect();
    rows.sort_by(|(a, _), (b, _)| match params.sort_direction {
        SortDirection::Asc => a.cmp(b),
        SortDirection::Desc => b.cmp(a),
    });

    let needle = params.filter_text.to_lowercase();
    let matches: Vec<&Arc<AppRecord>> = rows
        .into_iter()
        .filter(|(_, record)| needle.is_empty() || record.name.to_lowercase().contains(&needle))
        .map(|(_, record)| record)
        .collect();

    let total = matches.len();
    let offset = if params.page_offset > total {
        0
    } else {
        params.page_offset
    };
    let items = matches
        .into_iter()
        .skip(offset)
        .take(params.page_size.get())
        .cloned()
        .collect();

    QueryPage {
        items,
        total,
        offset,
    }
}

/// A query kept up to date with a watched collection.
///
/// The page is recomputed only when the collection version or the parameters
/// change.
pub struct LiveQuery {
    receiver: watch::Receiver<Collection>,
    params: QueryParams,
    cached: Option<(u64, QueryPage)>,
    recomputations: usize,
}

impl LiveQuery {
    pub fn new(receiver: watch::Receiver<Collection>, params: QueryParams) -> Self {
        Self {
            receiver,
            params,
            cached: None,
            recomputations: 0,
        }
    }

    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Replace the parameters. The next [`LiveQuery::page`] recomputes only
    /// if they differ.
    pub fn set_params(&mut self, params: QueryParams) {
        if self.params != params {
            self.params = params;
            self.cached = None;
        }
    }

    /// Edit the parameters in place.
    pub fn update_params(&mut self, edit: impl FnOnce(&mut QueryParams)) {
        let mut params = self.params.clone();
        edit(&mut params);
        self.set_params(params);
    }

    /// The current page.
    pub fn page(&mut self) -> &QueryPage {
        let collection = self.receiver.borrow_and_update().clone();
        if matches!(&self.cached, Some((version, _)) if *version != collection.version()) {
            self.cached = None;
        }
        let (_, page) = self.cached.get_or_insert_with(|| {
            trace!("Recomputing query at collection version {}", collection.version());
            self.recomputations += 1;
            (collection.version(), query(&collection, &self.params))
        });
        page
    }

    /// Wait for the next collection change.
    ///
    /// Returns `false` once the listing that owns the collection is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// How many times the page has been computed.
    #[must_use]
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::reconcile::reconcile;
    use crate::marketplace::testing::{app, id};

    fn fruit() -> Collection {
        reconcile(
            vec![
                app("banana", "Banana", "1.0.0"),
                app("apple", "apple", "1.0.0"),
                app("cherry", "Cherry", "1.0.0"),
            ],
            Vec::new(),
        )
    }

    fn names(page: &QueryPage) -> Vec<&str> {
        page.items.iter().map(|r| r.name.as_str()).collect()
    }

    fn numbered(count: usize) -> Collection {
        reconcile(
            (0..count)
                .map(|i| app(&format!("app-{i:02}"), &format!("App {i:02}"), "1.0.0"))
                .collect(),
            Vec::new(),
        )
    }

    #[test]
    fn test_sort_then_filter() {
        let collection = fruit();
        let page = query(&collection, &QueryParams::default());
        assert_eq!(names(&page), vec!["apple", "Banana", "Cherry"]);
        assert_eq!(page.total, 3);

        let page = query(&collection, &QueryParams::default().with_filter("an"));
        assert_eq!(names(&page), vec!["Banana"]);
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let page = query(&fruit(), &QueryParams::default().with_filter("CHER"));
        assert_eq!(names(&page), vec!["Cherry"]);
    }

    #[test]
    fn test_descending_sort() {
        let params = QueryParams::default().with_sort(SortKey::Name, SortDirection::Desc);
        let page = query(&fruit(), &params);
        assert_eq!(names(&page), vec!["Cherry", "Banana", "apple"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let collection = reconcile(
            vec![
                app("one", "Same", "1.0.0"),
                app("two", "same", "1.0.0"),
                app("three", "SAME", "1.0.0"),
            ],
            Vec::new(),
        );
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let params = QueryParams::default().with_sort(SortKey::Name, direction);
            let page = query(&collection, &params);
            let ids: Vec<&str> = page.items.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(ids, vec!["one", "two", "three"]);
        }
    }

    #[test]
    fn test_repeated_toggles_do_not_drift() {
        let collection = fruit();
        let mut params = QueryParams::default();
        let first = query(&collection, &params);
        params.toggle_sort(SortKey::Name);
        params.toggle_sort(SortKey::Name);
        assert_eq!(params.sort_direction, SortDirection::Asc);
        assert_eq!(query(&collection, &params), first);
    }

    #[test]
    fn test_pagination_window() {
        let collection = numbered(30);
        const TEN: NonZeroUsize = NonZeroUsize::MIN.saturating_add(9);
        let params = QueryParams::default().with_page_size(TEN).with_offset(20);
        let page = query(&collection, &params);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.offset, 20);
        assert_eq!(page.items[0].name, "App 20");
        assert!(!page.has_more());

        let page = query(&collection, &params.with_offset(5));
        assert_eq!(page.items[0].name, "App 05");
        assert!(page.has_more());
    }

    #[test]
    fn test_offset_past_matches_resets_to_first_page() {
        let collection = numbered(5);
        let page = query(&collection, &QueryParams::default().with_offset(10));
        assert_eq!(page.offset, 0);
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn test_offset_equal_to_total_is_an_empty_page() {
        let collection = numbered(5);
        let page = query(&collection, &QueryParams::default().with_offset(5));
        assert_eq!(page.offset, 5);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_empty_collection() {
        let page = query(&Collection::default(), &QueryParams::default().with_filter("x"));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert!(!page.has_more());
    }

    #[test]
    fn test_query_does_not_reorder_collection() {
        let collection = fruit();
        let order: Vec<String> = collection.iter().map(|r| r.name.clone()).collect();
        let params = QueryParams::default().with_sort(SortKey::Name, SortDirection::Desc);
        let _ = query(&collection, &params);
        let after: Vec<String> = collection.iter().map(|r| r.name.clone()).collect();
        assert_eq!(order, after);
    }

    #[test]
    fn test_toggle_sort() {
        let mut params = QueryParams::default();
        params.toggle_sort(SortKey::Name);
        assert_eq!(params.sort_direction, SortDirection::Desc);
        params.toggle_sort(SortKey::Name);
        assert_eq!(params.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn test_page_serializes_camel_case() -> Result<(), serde_json::Error> {
        let page = query(&fruit(), &QueryParams::default());
        let json = serde_json::to_value(&page)?;
        assert_eq!(json["total"], 3);
        assert_eq!(json["items"][0]["name"], "apple");
        Ok(())
    }

    #[test]
    fn test_live_query_recomputes_on_change_only() {
        let (sender, receiver) = watch::channel(fruit());
        let mut live = LiveQuery::new(receiver, QueryParams::default());

        assert_eq!(live.page().total, 3);
        assert_eq!(live.page().total, 3);
        assert_eq!(live.recomputations(), 1);

        // Same parameters again: still cached.
        live.set_params(QueryParams::default());
        let _ = live.page();
        assert_eq!(live.recomputations(), 1);

        live.update_params(|p| p.filter_text = "an".to_string());
        assert_eq!(live.page().total, 1);
        assert_eq!(live.recomputations(), 2);

        let current = sender.borrow().clone();
        let Some(record) = current.get(&id("banana")) else {
            panic!("banana missing");
        };
        let mut renamed = AppRecord::clone(record);
        renamed.name = "Plantain".to_string();
        let Some(next) = current.with_record(renamed) else {
            panic!("rename should change the collection");
        };
        sender.send_replace(next);

        assert_eq!(live.page().total, 1);
        assert_eq!(names(live.page()), vec!["Plantain"]);
        assert_eq!(live.recomputations(), 3);
    }

    #[test]
    fn test_earlier_page_survives_later_patch() {
        let (sender, receiver) = watch::channel(fruit());
        let mut live = LiveQuery::new(receiver, QueryParams::default());
        let before = live.page().clone();

        let current = sender.borrow().clone();
        let Some(record) = current.get(&id("apple")) else {
            panic!("apple missing");
        };
        let mut renamed = AppRecord::clone(record);
        renamed.name = "Zucchini".to_string();
        if let Some(next) = current.with_record(renamed) {
            sender.send_replace(next);
        }

        assert_eq!(names(&before), vec!["apple", "Banana", "Cherry"]);
        assert_eq!(names(live.page()), vec!["Banana", "Cherry", "Zucchini"]);
    }

    #[tokio::test]
    async fn test_live_query_changed_ends_with_sender() {
        let (sender, receiver) = watch::channel(Collection::default());
        let mut live = LiveQuery::new(receiver, QueryParams::default());
        sender.send_replace(fruit());
        assert!(live.changed().await);
        drop(sender);
        assert!(!live.changed().await);
    }
}
