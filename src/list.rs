use std::cmp::Ordering;
use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::trace;

/// Rank assigned to values that are absent from a field's rank table.
/// Pushes unrecognized labels behind every ranked one.
const UNRANKED: u32 = 99;

/// A stringable value produced by a field extractor. `Missing` stands in
/// for absent or unparsable data and behaves like an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Missing,
}

impl CellValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Text(_) | CellValue::Missing => None,
        }
    }

    fn as_text(&self) -> &str {
        match self {
            CellValue::Text(s) => s,
            _ => "",
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Missing => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One column of a table view: an explicit accessor instead of reflective
/// property probing. `rank` overrides the default comparison with a fixed
/// ordinal table (e.g. Low/Medium/High), matched case-insensitively.
pub struct Field<T> {
    pub key: &'static str,
    pub label: &'static str,
    pub get: fn(&T) -> CellValue,
    pub rank: Option<&'static [(&'static str, u32)]>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

fn rank_of(table: &[(&str, u32)], value: &str) -> u32 {
    table
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(value))
        .map(|(_, rank)| *rank)
        .unwrap_or(UNRANKED)
}

// Numbers order numerically and come before text; text orders
// lexicographically; Missing degrades to the empty string.
fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.as_text().cmp(b.as_text()),
    }
}

fn compare_rows<T>(field: &Field<T>, a: &T, b: &T) -> Ordering {
    let va = (field.get)(a);
    let vb = (field.get)(b);
    match field.rank {
        Some(table) => rank_of(table, &va.to_string()).cmp(&rank_of(table, &vb.to_string())),
        None => compare_values(&va, &vb),
    }
}

/// View parameters of one table. Selection is keyed by position within the
/// current paginated view, not by row identity, and is cleared whenever the
/// visible ordering or window changes. This mirrors checkbox-per-line
/// behavior and avoids silently carrying a mark onto the wrong row.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub search: String,
    pub order_by: Option<usize>,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
    pub selected: BTreeSet<usize>,
}

impl QueryState {
    fn new(page_size: usize) -> Self {
        QueryState {
            search: String::new(),
            order_by: None,
            direction: SortDirection::Ascending,
            page: 1,
            page_size: page_size.max(1),
            selected: BTreeSet::new(),
        }
    }
}

/// Generic list controller: owns the raw rows plus the query state and
/// derives filtered/sorted/paginated views on read. Pure and synchronous;
/// fetching rows is the caller's business.
pub struct ListState<T> {
    rows: Vec<T>,
    fields: Vec<Field<T>>,
    query: QueryState,
}

impl<T: Sync> ListState<T> {
    pub fn new(rows: Vec<T>, fields: Vec<Field<T>>, page_size: usize) -> Self {
        ListState {
            rows,
            fields,
            query: QueryState::new(page_size),
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Wholesale replacement of the row collection resets the whole query
    /// state except the configured page size.
    pub fn replace_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.query = QueryState::new(self.query.page_size);
    }

    fn matches(&self, row: &T, needle: &str) -> bool {
        self.fields
            .iter()
            .any(|field| (field.get)(row).to_string().to_lowercase().contains(needle))
    }

    /// Raw indices of rows matching the current search, in collection order.
    /// The needle is trimmed and lowercased once; an empty needle matches all.
    pub fn filtered_indices(&self) -> Vec<usize> {
        let needle = self.query.search.trim().to_lowercase();
        if needle.is_empty() {
            return (0..self.rows.len()).collect();
        }
        self.rows
            .par_iter()
            .enumerate()
            .filter(|&(_, row)| self.matches(row, &needle))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Filtered indices ordered by the active sort field. The sort is stable,
    /// so equal-key rows keep their relative collection order; descending
    /// reverses the comparator, not the slice.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices = self.filtered_indices();
        let Some(field_idx) = self.query.order_by else {
            return indices;
        };
        let Some(field) = self.fields.get(field_idx) else {
            return indices;
        };
        indices.sort_by(|&a, &b| {
            let ord = compare_rows(field, &self.rows[a], &self.rows[b]);
            match self.query.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        indices
    }

    pub fn page_count(&self) -> usize {
        self.filtered_indices()
            .len()
            .div_ceil(self.query.page_size)
            .max(1)
    }

    /// Requested page clamped into `[1, page_count()]`.
    pub fn current_page(&self) -> usize {
        self.query.page.clamp(1, self.page_count())
    }

    /// Raw indices of the rows on the current page.
    pub fn page_indices(&self) -> Vec<usize> {
        let start = (self.current_page() - 1) * self.query.page_size;
        self.sorted_indices()
            .into_iter()
            .skip(start)
            .take(self.query.page_size)
            .collect()
    }

    pub fn visible_rows(&self) -> Vec<&T> {
        self.page_indices().iter().map(|&idx| &self.rows[idx]).collect()
    }

    /// Sorting on the field already active flips direction; a new field
    /// starts ascending.
    pub fn request_sort(&mut self, field_idx: usize) {
        if self.query.order_by == Some(field_idx) {
            self.query.direction = self.query.direction.flipped();
        } else {
            self.query.order_by = Some(field_idx);
            self.query.direction = SortDirection::Ascending;
        }
        self.query.selected.clear();
        trace!(
            "Sort by field {} {:?}",
            field_idx, self.query.direction
        );
    }

    /// Explicit field + direction variant used by the s/S keys.
    pub fn sort_by(&mut self, field_idx: usize, direction: SortDirection) {
        self.query.order_by = Some(field_idx);
        self.query.direction = direction;
        self.query.selected.clear();
    }

    /// A new search invalidates the page position and the selection.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.query.search = text.into();
        self.query.page = 1;
        self.query.selected.clear();
    }

    pub fn set_page(&mut self, page: usize) {
        if page != self.query.page {
            self.query.selected.clear();
        }
        self.query.page = page;
    }

    pub fn next_page(&mut self) {
        let page = self.current_page();
        if page < self.page_count() {
            self.set_page(page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        let page = self.current_page();
        if page > 1 {
            self.set_page(page - 1);
        }
    }

    /// Changing the window size invalidates the page position.
    pub fn set_page_size(&mut self, size: usize) {
        self.query.page_size = size.max(1);
        self.query.page = 1;
        self.query.selected.clear();
    }

    pub fn is_selected(&self, visible: usize) -> bool {
        self.query.selected.contains(&visible)
    }

    pub fn selected_count(&self) -> usize {
        self.query.selected.len()
    }

    pub fn toggle_selected(&mut self, visible: usize) {
        if visible >= self.page_indices().len() {
            return;
        }
        if !self.query.selected.remove(&visible) {
            self.query.selected.insert(visible);
        }
    }

    pub fn select_all_visible(&mut self) {
        self.query.selected = (0..self.page_indices().len()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.query.selected.clear();
    }

    /// Maps a visible position on the current page back to its raw index.
    pub fn raw_index(&self, visible: usize) -> Option<usize> {
        self.page_indices().get(visible).copied()
    }

    /// Removes the row at the given visible position from the raw collection
    /// and drops that position from the selection. Returns the removed row,
    /// or None if the position is outside the current page.
    pub fn delete(&mut self, visible: usize) -> Option<T> {
        let raw = self.raw_index(visible)?;
        let row = self.rows.remove(raw);
        self.query.selected.remove(&visible);
        trace!("Deleted visible row {} (raw {})", visible, raw);
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: &'static str,
        priority: &'static str,
        amount: i64,
    }

    const PRIORITY_RANKS: &[(&str, u32)] = &[("Low", 0), ("Medium", 1), ("High", 2)];

    fn fields() -> Vec<Field<Item>> {
        vec![
            Field {
                key: "name",
                label: "Name",
                get: |r: &Item| CellValue::Text(r.name.to_string()),
                rank: None,
            },
            Field {
                key: "priority",
                label: "Priority",
                get: |r: &Item| CellValue::Text(r.priority.to_string()),
                rank: Some(PRIORITY_RANKS),
            },
            Field {
                key: "amount",
                label: "Amount",
                get: |r: &Item| CellValue::Int(r.amount),
                rank: None,
            },
        ]
    }

    fn items() -> Vec<Item> {
        vec![
            Item { name: "printer broken", priority: "High", amount: 3 },
            Item { name: "payslip missing", priority: "Low", amount: 10 },
            Item { name: "vpn access", priority: "Medium", amount: 7 },
            Item { name: "Laptop swap", priority: "Low", amount: 1 },
        ]
    }

    fn list() -> ListState<Item> {
        ListState::new(items(), fields(), 10)
    }

    fn numbered(n: usize) -> ListState<Item> {
        let rows = (0..n)
            .map(|i| Item {
                name: "row",
                priority: "Low",
                amount: i as i64,
            })
            .collect();
        ListState::new(rows, fields(), 10)
    }

    #[test]
    fn derived_views_are_nested_subsets() {
        let mut list = list();
        list.set_search("o");
        list.request_sort(2);
        let filtered = list.filtered_indices();
        let sorted = list.sorted_indices();
        let paged = list.page_indices();
        assert!(sorted.iter().all(|i| filtered.contains(i)));
        assert!(paged.iter().all(|i| sorted.contains(i)));
        assert!(filtered.iter().all(|&i| i < list.len()));
        assert!(paged.len() <= list.query().page_size);
    }

    #[test]
    fn empty_query_matches_everything() {
        let list = list();
        assert_eq!(list.filtered_indices().len(), list.len());
    }

    #[test]
    fn search_is_case_insensitive() {
        let mut list = list();
        list.set_search("LOW");
        let upper = list.filtered_indices();
        list.set_search("low");
        let lower = list.filtered_indices();
        assert_eq!(upper, lower);
        assert_eq!(upper, vec![1, 3]);
    }

    #[test]
    fn search_covers_numeric_fields() {
        let mut list = list();
        list.set_search("10");
        assert_eq!(list.filtered_indices(), vec![1]);
    }

    #[test]
    fn repeated_sort_request_flips_the_order() {
        let mut list = list();
        list.request_sort(2);
        let ascending = list.sorted_indices();
        assert_eq!(ascending, vec![3, 0, 2, 1]);
        list.request_sort(2);
        let descending = list.sorted_indices();
        let mut reversed = ascending.clone();
        reversed.reverse();
        assert_eq!(descending, reversed);
        list.request_sort(2);
        assert_eq!(list.sorted_indices(), ascending);
    }

    #[test]
    fn new_sort_field_starts_ascending() {
        let mut list = list();
        list.request_sort(2);
        list.request_sort(2);
        assert_eq!(list.query().direction, SortDirection::Descending);
        list.request_sort(0);
        assert_eq!(list.query().direction, SortDirection::Ascending);
        assert_eq!(list.query().order_by, Some(0));
    }

    #[test]
    fn priority_sorts_by_rank_not_lexicographically() {
        let mut list = ListState::new(
            vec![
                Item { name: "a", priority: "High", amount: 0 },
                Item { name: "b", priority: "Low", amount: 0 },
                Item { name: "c", priority: "Medium", amount: 0 },
            ],
            fields(),
            10,
        );
        list.sort_by(1, SortDirection::Ascending);
        let order: Vec<&str> = list.visible_rows().iter().map(|r| r.priority).collect();
        assert_eq!(order, vec!["Low", "Medium", "High"]);
        list.sort_by(1, SortDirection::Descending);
        let order: Vec<&str> = list.visible_rows().iter().map(|r| r.priority).collect();
        assert_eq!(order, vec!["High", "Medium", "Low"]);
    }

    #[test]
    fn unrecognized_priority_sorts_last() {
        let mut list = ListState::new(
            vec![
                Item { name: "a", priority: "Urgent???", amount: 0 },
                Item { name: "b", priority: "high", amount: 0 },
            ],
            fields(),
            10,
        );
        list.sort_by(1, SortDirection::Ascending);
        let order: Vec<&str> = list.visible_rows().iter().map(|r| r.name).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn equal_keys_keep_collection_order() {
        let mut list = list();
        list.sort_by(1, SortDirection::Ascending);
        // Both Low rows, collection order 1 then 3.
        let lows: Vec<usize> = list
            .sorted_indices()
            .into_iter()
            .filter(|&i| list.rows()[i].priority == "Low")
            .collect();
        assert_eq!(lows, vec![1, 3]);
    }

    #[test]
    fn page_request_is_clamped() {
        let mut list = numbered(25);
        assert_eq!(list.page_count(), 3);
        list.set_page(3);
        let last = list.page_indices();
        assert_eq!(last.len(), 5);
        list.set_page(99);
        assert_eq!(list.current_page(), 3);
        assert_eq!(list.page_indices(), last);
        list.set_page(0);
        assert_eq!(list.current_page(), 1);
        let first = list.page_indices();
        list.set_page(1);
        assert_eq!(list.page_indices(), first);
    }

    #[test]
    fn empty_collection_reports_one_empty_page() {
        let list = ListState::new(Vec::new(), fields(), 10);
        assert_eq!(list.page_count(), 1);
        assert_eq!(list.current_page(), 1);
        assert!(list.page_indices().is_empty());
        assert!(list.sorted_indices().is_empty());
    }

    #[test]
    fn changing_page_size_resets_the_page() {
        let mut list = numbered(30);
        list.set_page(3);
        assert_eq!(list.current_page(), 3);
        list.set_page_size(25);
        assert_eq!(list.current_page(), 1);
        assert_eq!(list.page_indices().len(), 25);
    }

    #[test]
    fn search_resets_the_page() {
        let mut list = numbered(30);
        list.set_page(3);
        list.set_search("row");
        assert_eq!(list.current_page(), 1);
    }

    #[test]
    fn selection_toggles_and_clears() {
        let mut list = list();
        list.toggle_selected(0);
        list.toggle_selected(2);
        assert!(list.is_selected(0));
        assert!(list.is_selected(2));
        assert!(!list.is_selected(1));
        list.toggle_selected(0);
        assert!(!list.is_selected(0));
        list.select_all_visible();
        assert_eq!(list.selected_count(), list.len());
        list.clear_selection();
        assert_eq!(list.selected_count(), 0);
    }

    #[test]
    fn selection_ignores_positions_past_the_page() {
        let mut list = list();
        list.toggle_selected(57);
        assert_eq!(list.selected_count(), 0);
    }

    #[test]
    fn reordering_clears_the_selection() {
        let mut list = list();
        list.toggle_selected(1);
        list.request_sort(0);
        assert_eq!(list.selected_count(), 0);
        list.toggle_selected(1);
        list.set_search("low");
        assert_eq!(list.selected_count(), 0);
        list.toggle_selected(1);
        list.set_page_size(25);
        assert_eq!(list.selected_count(), 0);
    }

    #[test]
    fn page_change_clears_the_selection() {
        let mut list = numbered(25);
        list.toggle_selected(4);
        list.set_page(2);
        assert_eq!(list.selected_count(), 0);
    }

    #[test]
    fn delete_maps_the_visible_position_to_the_raw_row() {
        let mut list = list();
        list.sort_by(2, SortDirection::Ascending);
        // Ascending by amount the first visible row is "Laptop swap" (raw 3).
        list.toggle_selected(0);
        let before = list.len();
        let removed = list.delete(0).unwrap();
        assert_eq!(removed.name, "Laptop swap");
        assert_eq!(list.len(), before - 1);
        assert!(!list.is_selected(0));
    }

    #[test]
    fn delete_outside_the_page_is_a_noop() {
        let mut list = list();
        assert!(list.delete(99).is_none());
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn missing_values_sort_without_panicking() {
        let fields = vec![Field {
            key: "ghost",
            label: "Ghost",
            get: |_: &Item| CellValue::Missing,
            rank: None,
        }];
        let mut list = ListState::new(items(), fields, 10);
        list.request_sort(0);
        assert_eq!(list.sorted_indices().len(), 4);
        // Sorting by an index with no field behind it degrades to no sort.
        list.sort_by(42, SortDirection::Ascending);
        assert_eq!(list.sorted_indices(), list.filtered_indices());
    }

    #[test]
    fn replacing_rows_resets_the_query_state() {
        let mut list = list();
        list.set_search("low");
        list.request_sort(1);
        list.toggle_selected(0);
        list.replace_rows(items());
        assert!(list.query().search.is_empty());
        assert_eq!(list.query().order_by, None);
        assert_eq!(list.current_page(), 1);
        assert_eq!(list.selected_count(), 0);
    }
}
