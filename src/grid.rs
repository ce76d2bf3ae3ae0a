//! HugeList - the grid engine
//!
//! Owns the source rows, the working view over them, the column topology,
//! the order keys, the search index, the viewport and the totals, and keeps
//! them consistent:
//!
//! - loading replaces everything and sorts by the payload's keys
//! - queries and resets rebuild the working view, re-sort, recompute totals
//!   and show the first page
//! - sorting re-orders the working view and shows the first page
//! - column moves permute every positional structure and invalidate the
//!   search index
//!
//! Presenters read [`RenderedWindow`] snapshots; user code hooks in through
//! typed row/lifecycle callbacks and formatting closures.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::aggregate::{compute_totals, TotalCell};
use crate::data::data_view::DataView;
use crate::data::datatable::{DataRow, DataTable};
use crate::data::field::Field;
use crate::data::order::{OrderKeys, SortMode};
use crate::data::topology::ColumnTopology;
use crate::search::{split_field_list, FieldScope, Query, SearchIndex};
use crate::source::{DataSource, Payload, SourceError, SourceRequest};
use crate::viewport::{
    MeasureSettings, Navigation, NavigationResult, RowMeasurer, ScrollIntent, Viewport,
};

/// User activation of a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowEvent {
    Click,
    DoubleClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// A payload arrived and is about to be loaded
    BeforeInit,
    /// The payload is loaded and the first page rendered
    AfterInit,
    /// The source failed or reported `ok == false`
    NotOk,
    StartIndexing,
    EndIndexing,
}

/// What a row formatter sees for one rendered row
pub struct RowContext<'a> {
    /// Working row index
    pub index: usize,
    /// Copy of the row; return a modified version to change only the display
    pub row: DataRow,
    pub fields: &'a [Field],
    /// The stored row itself; changes here persist and are picked up by the
    /// next search and the totals row
    pub live: &'a mut DataRow,
}

/// Returns the row to display, or `None` to display the copy unchanged
pub type RowFormatter = Box<dyn FnMut(RowContext<'_>) -> Option<DataRow>>;
/// Rewrites the displayed totals row in place
pub type TotalsFormatter = Box<dyn FnMut(&mut Vec<String>, &[Field])>;
pub type RowCallback = Box<dyn FnMut(&DataRow, usize)>;
pub type LifecycleCallback = Box<dyn FnMut()>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    /// Working row index
    pub index: usize,
    pub cells: Vec<String>,
}

/// Read-only snapshot of the current window
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWindow {
    pub from: usize,
    /// Last rendered working row; `None` when nothing is rendered
    pub to: Option<usize>,
    pub rows: Vec<RenderedRow>,
    pub fields: Vec<Field>,
    pub hidden: BTreeSet<usize>,
    /// Positions to draw, in order
    pub visible: Vec<usize>,
    pub fixed_columns: usize,
    /// Working row under the cursor
    pub cursor: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub index_on_load: bool,
    pub show_total_row: bool,
    /// Mode used by [`HugeList::sort_by_column`]
    pub sort_mode: SortMode,
    pub rows_to_render: usize,
    pub measure: MeasureSettings,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GridOptions {
    fn from(config: &Config) -> Self {
        Self {
            index_on_load: config.behavior.index_on_load,
            show_total_row: config.behavior.show_total_row,
            sort_mode: if config.behavior.multi_sort {
                SortMode::Multi
            } else {
                SortMode::Single
            },
            rows_to_render: config.viewport.rows_to_render,
            measure: MeasureSettings::from(&config.viewport),
        }
    }
}

pub struct HugeList {
    options: GridOptions,
    table: DataTable,
    topology: ColumnTopology,
    view: DataView,
    order: OrderKeys,
    index: SearchIndex,
    viewport: Viewport,
    totals: Vec<TotalCell>,
    container_id: String,
    table_css: String,
    table_class: Vec<String>,
    row_events: HashMap<RowEvent, RowCallback>,
    lifecycle: HashMap<LifecycleEvent, LifecycleCallback>,
    row_formatter: Option<RowFormatter>,
    totals_formatter: Option<TotalsFormatter>,
}

impl Default for HugeList {
    fn default() -> Self {
        Self::new(GridOptions::default())
    }
}

impl HugeList {
    pub fn new(options: GridOptions) -> Self {
        let viewport = Viewport::new(options.rows_to_render);
        Self {
            options,
            table: DataTable::default(),
            topology: ColumnTopology::default(),
            view: DataView::default(),
            order: OrderKeys::new(),
            index: SearchIndex::new(),
            viewport,
            totals: Vec::new(),
            container_id: String::new(),
            table_css: String::new(),
            table_class: Vec::new(),
            row_events: HashMap::new(),
            lifecycle: HashMap::new(),
            row_formatter: None,
            totals_formatter: None,
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Self::new(GridOptions::from(config))
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    // ----- loading -----

    /// Replace the dataset with `payload` and render the first page
    pub fn load(&mut self, payload: Payload) {
        let Payload {
            fields,
            rows,
            order_keys,
            fixed_column_count,
            container_id,
            table_css,
            table_class,
        } = payload;

        let field_count = fields.len();
        self.table = DataTable::new(field_count, rows);
        self.topology = ColumnTopology::new(fields, fixed_column_count);
        self.order = OrderKeys::from_raw(&order_keys, field_count);
        self.index = SearchIndex::new();
        self.container_id = container_id;
        self.table_css = table_css;
        self.table_class = table_class;

        self.view = DataView::all(self.table.row_count());
        self.view.sort_by(&self.order, &self.table);
        self.recompute_totals();

        if self.options.index_on_load {
            self.ensure_index();
        }

        self.viewport.clear_cursor();
        self.viewport
            .render(ScrollIntent::jump(0), self.view.row_count());

        info!(target: "hugelist", "Loaded {} rows x {} fields, order {:?}", self.table.row_count(), field_count, self.order.raw());
    }

    /// Fetch from `source` and load the result, firing lifecycle events.
    /// Returns the number of loaded rows.
    pub fn load_from(
        &mut self,
        source: &dyn DataSource,
        request: &SourceRequest,
    ) -> Result<usize, SourceError> {
        match source.fetch(request) {
            Ok(payload) => {
                self.fire(LifecycleEvent::BeforeInit);
                self.load(payload);
                self.fire(LifecycleEvent::AfterInit);
                Ok(self.table.row_count())
            }
            Err(e) => {
                warn!(target: "hugelist", "Loading from {} failed: {}", source.describe(), e);
                self.fire(LifecycleEvent::NotOk);
                Err(e)
            }
        }
    }

    /// Build the search index if it is missing or stale
    pub fn ensure_index(&mut self) {
        if self.index.is_indexed() {
            return;
        }
        self.fire(LifecycleEvent::StartIndexing);
        self.index.rebuild(self.table.rows());
        self.fire(LifecycleEvent::EndIndexing);
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_indexed()
    }

    // ----- searching -----

    /// Filter the working rows by `query`, optionally restricted to the named
    /// fields (names may also be comma-separated lists). Returns the number of
    /// matches; an unusable query returns 0 and changes nothing.
    pub fn find<S: AsRef<str>>(&mut self, query: &str, fields: &[S]) -> usize {
        let parsed = match Query::parse(query) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(target: "hugelist", "Ignoring query {:?}: {}", query, e);
                return 0;
            }
        };

        let names: Vec<String> = fields
            .iter()
            .flat_map(|f| split_field_list(f.as_ref()))
            .collect();
        let positions = self.topology.positions_of(&names);
        if !names.is_empty() && positions.is_empty() {
            debug!(target: "hugelist", "No field matched {:?}, searching all fields", names);
        }

        self.ensure_index();
        let matches = parsed.filter(&self.index, &FieldScope::from_positions(&positions));
        info!(target: "hugelist", "Query {:?} matched {} of {} rows", query, matches.len(), self.table.row_count());

        self.view = DataView::with_rows(matches);
        self.view.sort_by(&self.order, &self.table);
        self.recompute_totals();
        self.viewport.clear_cursor();
        self.viewport
            .render(ScrollIntent::jump(0), self.view.row_count());

        self.view.row_count()
    }

    /// Show every source row again, in the current order
    pub fn find_reset(&mut self) -> usize {
        self.view = DataView::all(self.table.row_count());
        self.view.sort_by(&self.order, &self.table);
        self.recompute_totals();
        self.viewport.clear_cursor();
        self.viewport
            .render(ScrollIntent::jump(0), self.view.row_count());
        debug!(target: "hugelist", "Reset to {} rows", self.view.row_count());
        self.view.row_count()
    }

    // ----- ordering -----

    /// Header activation. `multi` appends to / flips within the key list
    /// instead of replacing it. Returns `false` for an unknown position.
    pub fn click_header(&mut self, position: usize, multi: bool) -> bool {
        let mode = if multi {
            SortMode::Multi
        } else {
            SortMode::Single
        };
        self.toggle_sort(position, mode)
    }

    /// Header activation using the configured sort mode
    pub fn sort_by_column(&mut self, position: usize) -> bool {
        self.toggle_sort(position, self.options.sort_mode)
    }

    fn toggle_sort(&mut self, position: usize, mode: SortMode) -> bool {
        if position >= self.topology.field_count() {
            warn!(target: "hugelist", "Sort on unknown column {}", position);
            return false;
        }
        self.order.toggle(position, mode);
        self.apply_order();
        true
    }

    /// Replace the key list with signed 1-based keys
    pub fn set_order(&mut self, raw: &[i32]) {
        self.order = OrderKeys::from_raw(raw, self.topology.field_count());
        self.apply_order();
    }

    /// Drop every key; working rows return to source order
    pub fn clear_order(&mut self) {
        self.order.clear();
        self.view.sort_by_source_order();
        self.show_first_page();
    }

    pub fn order_keys(&self) -> &OrderKeys {
        &self.order
    }

    fn apply_order(&mut self) {
        self.view.sort_by(&self.order, &self.table);
        self.show_first_page();
    }

    /// Render the first page; the cursor keeps its slot without firing events
    fn show_first_page(&mut self) {
        let slot = self.viewport.cursor_slot();
        self.viewport
            .render(ScrollIntent::jump(0), self.view.row_count());
        if let Some(slot) = slot {
            self.select_silently(slot);
        }
    }

    // ----- columns -----

    /// Move the column at `from` to `to`. Rows, order keys, hidden set,
    /// widths and totals follow; the search index is rebuilt on next use.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        let Some(column_move) = self.topology.move_column(from, to) else {
            return false;
        };

        self.table.permute_columns(&column_move.permutation);
        self.order.remap(&column_move.old_to_new);
        self.totals = column_move.apply(&self.totals);
        self.index.invalidate();

        self.viewport.render(
            ScrollIntent::jump(self.viewport.render_from()),
            self.view.row_count(),
        );
        true
    }

    /// Show or hide a column; hiding the last visible column is refused
    pub fn set_column_visible(&mut self, position: usize, visible: bool) -> bool {
        self.topology.set_visible(position, visible)
    }

    pub fn hide_by_name(&mut self, name: &str) -> bool {
        self.topology.set_visible_by_name(name, false)
    }

    pub fn show_by_name(&mut self, name: &str) -> bool {
        self.topology.set_visible_by_name(name, true)
    }

    pub fn show_all_columns(&mut self) {
        self.topology.show_all();
    }

    /// Record a measured column width; returns the cached (maximum) width
    pub fn observe_column_width(&mut self, position: usize, width: u32) -> u32 {
        self.topology.observe_width(position, width)
    }

    pub fn reset_column_widths(&mut self) {
        self.topology.reset_widths();
    }

    pub fn fixed_offsets(&self) -> Vec<u32> {
        self.topology.fixed_offsets()
    }

    pub fn fields(&self) -> &[Field] {
        self.topology.fields()
    }

    pub fn topology(&self) -> &ColumnTopology {
        &self.topology
    }

    // ----- windowing -----

    pub fn render(&mut self, intent: ScrollIntent) -> Range<usize> {
        self.viewport.render(intent, self.view.row_count())
    }

    pub fn navigate(&mut self, navigation: Navigation) -> NavigationResult {
        self.viewport.navigate(navigation, self.view.row_count())
    }

    /// Change the page size; widths are re-measured from scratch
    pub fn resize(&mut self, rows_to_render: usize) -> Range<usize> {
        self.topology.reset_widths();
        self.viewport.resize(rows_to_render, self.view.row_count())
    }

    /// Measure the page size against the host surface
    pub fn measure(&mut self, measurer: &mut dyn RowMeasurer) -> usize {
        let settings = self.options.measure;
        self.viewport
            .measure(measurer, self.view.row_count(), &settings)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Snapshot of the current window with formatted cells. The row
    /// formatter, when installed, runs once per rendered row.
    pub fn window(&mut self) -> RenderedWindow {
        let range = self.viewport.window();
        let fields = self.topology.fields();
        let mut rows = Vec::with_capacity(range.len());
        let mut edited = false;

        for index in range {
            let Some(source_index) = self.view.source_index(index) else {
                continue;
            };
            let Some(live) = self.table.row_mut(source_index) else {
                continue;
            };
            let copy = live.clone();

            let displayed = match self.row_formatter.as_mut() {
                Some(formatter) => {
                    let context = RowContext {
                        index,
                        row: copy.clone(),
                        fields,
                        live,
                    };
                    let displayed = formatter(context);
                    if self.table.row(source_index) != Some(&copy) {
                        edited = true;
                    }
                    displayed.unwrap_or(copy)
                }
                None => copy,
            };

            rows.push(RenderedRow {
                index,
                cells: displayed.to_strings(),
            });
        }

        let window = RenderedWindow {
            from: self.viewport.render_from(),
            to: self.viewport.render_to(),
            rows,
            fields: fields.to_vec(),
            hidden: self.topology.hidden().clone(),
            visible: self.topology.visible_positions(),
            fixed_columns: self.topology.fixed_columns(),
            cursor: self.viewport.cursor_row(),
        };

        if edited {
            debug!(target: "hugelist", "Row formatter edited stored rows, index invalidated");
            self.index.invalidate();
            self.recompute_totals();
        }
        window
    }

    // ----- totals -----

    fn recompute_totals(&mut self) {
        if !self.options.show_total_row {
            self.totals.clear();
            return;
        }
        self.totals = compute_totals(
            self.view.visible_row_indices(),
            self.table.rows(),
            self.topology.fields(),
        );
    }

    /// Roll-ups over the working rows; empty when the totals row is off
    pub fn totals(&self) -> &[TotalCell] {
        &self.totals
    }

    /// Totals as displayed, after the totals formatter
    pub fn formatted_totals(&mut self) -> Option<Vec<String>> {
        if !self.options.show_total_row {
            return None;
        }
        let mut cells: Vec<String> = self.totals.iter().map(|t| t.to_string()).collect();
        if let Some(formatter) = self.totals_formatter.as_mut() {
            formatter(&mut cells, self.topology.fields());
        }
        Some(cells)
    }

    // ----- selection and events -----

    /// User activation of the row in window slot `slot`: selects it and
    /// fires the registered callback once
    pub fn activate(&mut self, slot: usize, event: RowEvent) -> bool {
        if !self.viewport.select_slot(slot) {
            return false;
        }
        let Some(index) = self.viewport.cursor_row() else {
            return false;
        };
        let Some(row) = self.view.get_row(&self.table, index) else {
            return false;
        };

        if let Some(callback) = self.row_events.get_mut(&event) {
            debug!(target: "hugelist", "{:?} on row {}", event, index);
            callback(row, index);
        }
        true
    }

    /// Select the row in window slot `slot` without firing any event
    pub fn select_silently(&mut self, slot: usize) -> bool {
        self.viewport.select_slot(slot)
    }

    /// Working row index under the cursor
    pub fn cursor_row(&self) -> Option<usize> {
        self.viewport.cursor_row()
    }

    pub fn selected_row(&self) -> Option<&DataRow> {
        self.view.get_row(&self.table, self.viewport.cursor_row()?)
    }

    pub fn on_row_event<F>(&mut self, event: RowEvent, callback: F)
    where
        F: FnMut(&DataRow, usize) + 'static,
    {
        self.row_events.insert(event, Box::new(callback));
    }

    pub fn on_lifecycle<F>(&mut self, event: LifecycleEvent, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.lifecycle.insert(event, Box::new(callback));
    }

    pub fn set_row_formatter<F>(&mut self, formatter: F)
    where
        F: FnMut(RowContext<'_>) -> Option<DataRow> + 'static,
    {
        self.row_formatter = Some(Box::new(formatter));
    }

    pub fn clear_row_formatter(&mut self) {
        self.row_formatter = None;
    }

    pub fn set_totals_formatter<F>(&mut self, formatter: F)
    where
        F: FnMut(&mut Vec<String>, &[Field]) + 'static,
    {
        self.totals_formatter = Some(Box::new(formatter));
    }

    fn fire(&mut self, event: LifecycleEvent) {
        if let Some(callback) = self.lifecycle.get_mut(&event) {
            debug!(target: "hugelist", "Lifecycle {:?}", event);
            callback();
        }
    }

    // ----- accessors -----

    /// Source indices of the working rows, in display order
    pub fn working_rows(&self) -> &[usize] {
        self.view.visible_row_indices()
    }

    pub fn working_len(&self) -> usize {
        self.view.row_count()
    }

    /// Working row at `index`
    pub fn get_row(&self, index: usize) -> Option<&DataRow> {
        self.view.get_row(&self.table, index)
    }

    pub fn source_rows(&self) -> &[DataRow] {
        self.table.rows()
    }

    pub fn source_len(&self) -> usize {
        self.table.row_count()
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn table_css(&self) -> &str {
        &self.table_css
    }

    pub fn table_class(&self) -> &[String] {
        &self.table_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataValue;
    use crate::data::field::ColumnOp;

    fn grid() -> HugeList {
        let fields = vec![
            Field::new("name").with_col_op(ColumnOp::Count),
            Field::new("city"),
            Field::new("saldo").with_col_op(ColumnOp::Sum),
        ];
        let rows = vec![
            DataRow::new(vec!["Juan".into(), "Madrid".into(), DataValue::Integer(10)]),
            DataRow::new(vec!["Juan".into(), "Sevilla".into(), DataValue::Integer(20)]),
            DataRow::new(vec!["Pedro".into(), "Madrid".into(), DataValue::Integer(30)]),
        ];
        let mut grid = HugeList::default();
        grid.load(Payload::new(fields, rows));
        grid
    }

    #[test]
    fn test_load_renders_first_page_and_totals() {
        let grid = grid();
        assert_eq!(grid.working_len(), 3);
        assert_eq!(grid.viewport().window(), 0..3);
        assert_eq!(grid.totals()[0], TotalCell::Count(3));
        assert_eq!(grid.totals()[2], TotalCell::Sum(60.0));
        assert!(!grid.is_indexed());
    }

    #[test]
    fn test_find_builds_index_and_recomputes_totals() {
        let mut grid = grid();
        assert_eq!(grid.find("madrid", &["city"]), 2);
        assert!(grid.is_indexed());
        assert_eq!(grid.working_rows(), &[0, 2]);
        assert_eq!(grid.totals()[2], TotalCell::Sum(40.0));
    }

    #[test]
    fn test_invalid_query_changes_nothing() {
        let mut grid = grid();
        grid.find("juan", &[] as &[&str]);
        assert_eq!(grid.find("&juan+madrid", &[] as &[&str]), 0);
        assert_eq!(grid.working_rows(), &[0, 1]);
        assert_eq!(grid.find("   ", &[] as &[&str]), 0);
        assert_eq!(grid.working_len(), 2);
    }

    #[test]
    fn test_move_column_invalidates_index() {
        let mut grid = grid();
        grid.ensure_index();
        assert!(grid.move_column(2, 0));
        assert!(!grid.is_indexed());
        assert_eq!(grid.fields()[0].name, "saldo");
        assert_eq!(grid.totals()[0], TotalCell::Sum(60.0));
        assert_eq!(grid.find("madrid", &["city"]), 2);
    }

    #[test]
    fn test_window_formatter_sees_copy_and_live_row() {
        let mut grid = grid();
        grid.set_row_formatter(|mut ctx| {
            if ctx.index == 0 {
                if let Some(cell) = ctx.live.get_mut(1) {
                    *cell = "Toledo".into();
                }
            }
            let mut shown = ctx.row;
            if let Some(cell) = shown.get_mut(0) {
                *cell = DataValue::String(format!("{}*", cell));
            }
            Some(shown)
        });

        let window = grid.window();
        assert_eq!(window.rows[0].cells, vec!["Juan*", "Madrid", "10"]);
        // Display-only change stays out of storage, live edit persists
        assert_eq!(grid.source_rows()[0].to_strings(), vec!["Juan", "Toledo", "10"]);
    }
}
