/// Viewport - the window of working rows that is actually rendered
///
/// Only `rows_to_render` rows are ever materialized. The window is computed
/// from a scroll intent and clamped so that, for non-empty data,
/// `0 <= render_from <= render_to <= len - 1`.
///
/// Architecture:
/// DataTable (source rows)
///     → DataView (filtered/sorted working rows)
///         → Viewport (visible window + cursor)
///             → Presenter
use std::ops::Range;

use tracing::debug;

use crate::config::config::ViewportConfig;

/// Where the next window should be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIntent {
    /// Continue after the current window
    NextPage,
    /// The page ending where the current window starts
    PreviousPage,
    /// Absolute range; `to` defaults to `from + rows_to_render`
    Jump { from: i64, to: Option<i64> },
}

impl ScrollIntent {
    pub fn jump(from: usize) -> Self {
        ScrollIntent::Jump {
            from: from as i64,
            to: None,
        }
    }
}

/// Keyboard and wheel navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    PageDown,
    PageUp,
    Home,
    End,
    Up,
    Down,
    WheelUp,
    WheelDown,
}

/// Result of a navigation operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResult {
    /// The rendered window of working rows
    pub window: Range<usize>,
    /// Working row under the cursor, if any
    pub row: Option<usize>,
    /// Human-readable description of the operation
    pub description: String,
    /// Whether the operation changed the window
    pub window_changed: bool,
}

/// Reports how many rows of a probe window fit on the host surface
pub trait RowMeasurer {
    fn visible_rows(&mut self, probe: Range<usize>) -> usize;
}

/// Page-size measurement parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureSettings {
    pub probe_rows: usize,
    pub extended_probe_rows: usize,
    /// Rows kept back from the measured count so the last row is never cut
    pub edge_margin: usize,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self::from(&ViewportConfig::default())
    }
}

impl From<&ViewportConfig> for MeasureSettings {
    fn from(config: &ViewportConfig) -> Self {
        Self {
            probe_rows: config.probe_rows,
            extended_probe_rows: config.extended_probe_rows,
            edge_margin: config.edge_margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    render_from: usize,
    /// Exclusive end of the window
    render_end: usize,
    rows_to_render: usize,
    /// Window-relative slot of the cursor
    cursor: Option<usize>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default().rows_to_render)
    }
}

impl Viewport {
    pub fn new(rows_to_render: usize) -> Self {
        Self {
            render_from: 0,
            render_end: 0,
            rows_to_render: rows_to_render.max(1),
            cursor: None,
        }
    }

    pub fn render_from(&self) -> usize {
        self.render_from
    }

    /// Last rendered row; `None` for an empty window
    pub fn render_to(&self) -> Option<usize> {
        (self.render_end > self.render_from).then(|| self.render_end - 1)
    }

    pub fn window(&self) -> Range<usize> {
        self.render_from..self.render_end
    }

    pub fn rows_to_render(&self) -> usize {
        self.rows_to_render
    }

    pub fn cursor_slot(&self) -> Option<usize> {
        self.cursor
    }

    /// Working row under the cursor
    pub fn cursor_row(&self) -> Option<usize> {
        self.cursor.map(|slot| self.render_from + slot)
    }

    /// Place the cursor on a window slot; `false` when the slot is outside
    /// the window
    pub fn select_slot(&mut self, slot: usize) -> bool {
        if slot < self.render_end - self.render_from {
            self.cursor = Some(slot);
            true
        } else {
            false
        }
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Compute and store the window for `intent` over `len` working rows
    pub fn render(&mut self, intent: ScrollIntent, len: usize) -> Range<usize> {
        if len == 0 {
            self.render_from = 0;
            self.render_end = 0;
            self.cursor = None;
            return self.window();
        }

        let rows = self.rows_to_render as i64;
        let len_i = len as i64;
        let (mut from, mut to) = match intent {
            ScrollIntent::NextPage => {
                let from = self.render_end as i64;
                (from, from.saturating_add(rows))
            }
            ScrollIntent::PreviousPage => {
                let to = self.render_from as i64;
                (to.saturating_sub(rows), to)
            }
            ScrollIntent::Jump { from, to } => match to {
                Some(to) if to > from => (from, to),
                _ => (from, from.saturating_add(rows)),
            },
        };

        if from < 0 {
            from = 0;
            to = rows;
        }
        if to > len_i - 1 {
            to = len_i;
            from = to - rows;
        }

        self.render_from = from.max(0) as usize;
        self.render_end = to.min(len_i) as usize;
        self.clamp_cursor();

        debug!(target: "viewport", "Rendered {:?} of {} ({:?})", self.window(), len, intent);
        self.window()
    }

    /// Change the page size and re-render from the current start
    pub fn resize(&mut self, rows_to_render: usize, len: usize) -> Range<usize> {
        self.rows_to_render = rows_to_render.max(1);
        self.render(ScrollIntent::jump(self.render_from), len)
    }

    /// Measure the page size with probe renders and re-render from the
    /// current start
    pub fn measure(
        &mut self,
        measurer: &mut dyn RowMeasurer,
        len: usize,
        settings: &MeasureSettings,
    ) -> usize {
        if len == 0 {
            return self.rows_to_render;
        }

        let start = self.render_from;
        let probe = settings.probe_rows.min(len).max(1);
        let mut visible = measurer.visible_rows(0..probe);

        if visible >= probe && probe < len && settings.extended_probe_rows > probe {
            let extended = settings.extended_probe_rows.min(len);
            visible = measurer.visible_rows(0..extended);
        }

        let rows = if visible <= settings.edge_margin {
            visible
        } else {
            visible - settings.edge_margin
        };
        self.rows_to_render = rows.max(1);
        debug!(target: "viewport", "Measured {} visible rows, rendering {}", visible, self.rows_to_render);

        self.render(ScrollIntent::jump(start), len);
        self.rows_to_render
    }

    pub fn navigate(&mut self, navigation: Navigation, len: usize) -> NavigationResult {
        let before = self.window();
        let description = match navigation {
            Navigation::PageDown => {
                self.render(ScrollIntent::NextPage, len);
                "Page down".to_string()
            }
            Navigation::PageUp => {
                self.render(ScrollIntent::PreviousPage, len);
                "Page up".to_string()
            }
            Navigation::Home => {
                self.render(ScrollIntent::jump(0), len);
                self.cursor = self.first_slot();
                "Jumped to first row".to_string()
            }
            Navigation::End => {
                let from = len as i64 - self.rows_to_render as i64;
                self.render(
                    ScrollIntent::Jump {
                        from,
                        to: Some(len as i64),
                    },
                    len,
                );
                self.cursor = self.render_to().map(|last| last - self.render_from);
                "Jumped to last row".to_string()
            }
            Navigation::Up => self.step_up(len),
            Navigation::Down => self.step_down(len),
            Navigation::WheelUp => {
                self.render(ScrollIntent::PreviousPage, len);
                "Scrolled up".to_string()
            }
            Navigation::WheelDown => {
                self.render(ScrollIntent::NextPage, len);
                "Scrolled down".to_string()
            }
        };

        let window = self.window();
        NavigationResult {
            window_changed: window != before,
            window,
            row: self.cursor_row(),
            description,
        }
    }

    fn step_up(&mut self, len: usize) -> String {
        let Some(row) = self.cursor_row() else {
            self.cursor = self.first_slot();
            return "Selected first visible row".to_string();
        };

        if row > self.render_from {
            self.cursor = Some(row - 1 - self.render_from);
            format!("Row {}", row - 1)
        } else if self.render_from > 0 {
            self.render(ScrollIntent::PreviousPage, len);
            self.select_row(row - 1);
            format!("Row {} (previous page)", row - 1)
        } else {
            "Already at first row".to_string()
        }
    }

    fn step_down(&mut self, len: usize) -> String {
        let Some(row) = self.cursor_row() else {
            self.cursor = self.first_slot();
            return "Selected first visible row".to_string();
        };

        if row + 1 < self.render_end {
            self.cursor = Some(row + 1 - self.render_from);
            format!("Row {}", row + 1)
        } else if self.render_end < len {
            self.render(ScrollIntent::NextPage, len);
            self.select_row(row + 1);
            format!("Row {} (next page)", row + 1)
        } else {
            "Already at last row".to_string()
        }
    }

    fn select_row(&mut self, row: usize) {
        self.cursor = self
            .window()
            .contains(&row)
            .then(|| row - self.render_from);
    }

    fn first_slot(&self) -> Option<usize> {
        (self.render_end > self.render_from).then_some(0)
    }

    fn clamp_cursor(&mut self) {
        let size = self.render_end - self.render_from;
        self.cursor = match self.cursor {
            Some(_) if size == 0 => None,
            Some(slot) => Some(slot.min(size - 1)),
            None => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHeight(usize);

    impl RowMeasurer for FixedHeight {
        fn visible_rows(&mut self, probe: Range<usize>) -> usize {
            probe.len().min(self.0)
        }
    }

    #[test]
    fn test_jump_clamps_negative_start() {
        let mut vp = Viewport::new(20);
        let window = vp.render(
            ScrollIntent::Jump {
                from: -5,
                to: Some(3),
            },
            50,
        );
        assert_eq!(window, 0..20);
        assert_eq!(vp.render_to(), Some(19));
    }

    #[test]
    fn test_next_page_clamps_at_end() {
        let mut vp = Viewport::new(20);
        vp.render(ScrollIntent::jump(0), 50);
        assert_eq!(vp.render(ScrollIntent::NextPage, 50), 20..40);
        assert_eq!(vp.render(ScrollIntent::NextPage, 50), 30..50);
        assert_eq!(vp.render(ScrollIntent::NextPage, 50), 30..50);
    }

    #[test]
    fn test_previous_page() {
        let mut vp = Viewport::new(20);
        vp.render(ScrollIntent::jump(45), 100);
        assert_eq!(vp.render(ScrollIntent::PreviousPage, 100), 25..45);
        assert_eq!(vp.render(ScrollIntent::PreviousPage, 100), 5..25);
        assert_eq!(vp.render(ScrollIntent::PreviousPage, 100), 0..20);
    }

    #[test]
    fn test_small_and_empty_data() {
        let mut vp = Viewport::new(20);
        assert_eq!(vp.render(ScrollIntent::jump(0), 5), 0..5);
        assert_eq!(vp.render_to(), Some(4));
        assert_eq!(vp.render(ScrollIntent::jump(0), 0), 0..0);
        assert_eq!(vp.render_to(), None);
    }

    #[test]
    fn test_jump_with_inverted_range_uses_page_size() {
        let mut vp = Viewport::new(10);
        let window = vp.render(
            ScrollIntent::Jump {
                from: 30,
                to: Some(12),
            },
            100,
        );
        assert_eq!(window, 30..40);
    }

    #[test]
    fn test_extreme_jumps_clamp() {
        let mut vp = Viewport::new(20);
        let far = ScrollIntent::Jump {
            from: i64::MAX - 1,
            to: None,
        };
        assert_eq!(vp.render(far, 50), 30..50);

        let before = ScrollIntent::Jump {
            from: i64::MIN,
            to: None,
        };
        assert_eq!(vp.render(before, 50), 0..20);

        let everything = ScrollIntent::Jump {
            from: i64::MIN,
            to: Some(i64::MAX),
        };
        assert_eq!(vp.render(everything, 50), 0..20);
    }

    #[test]
    fn test_window_invariant_over_many_intents() {
        for len in [1usize, 2, 7, 20, 21, 99] {
            let mut vp = Viewport::new(10);
            let intents = [
                ScrollIntent::jump(0),
                ScrollIntent::NextPage,
                ScrollIntent::NextPage,
                ScrollIntent::Jump {
                    from: -100,
                    to: None,
                },
                ScrollIntent::Jump {
                    from: 1000,
                    to: Some(2000),
                },
                ScrollIntent::PreviousPage,
                ScrollIntent::PreviousPage,
            ];
            for intent in intents {
                let window = vp.render(intent, len);
                assert!(window.start < window.end, "len {} {:?}", len, intent);
                assert!(window.end <= len);
                assert!(window.len() <= 10);
            }
        }
    }

    #[test]
    fn test_cursor_steps_across_pages() {
        let mut vp = Viewport::new(5);
        vp.render(ScrollIntent::jump(0), 12);

        let result = vp.navigate(Navigation::Down, 12);
        assert_eq!(result.row, Some(0));
        assert!(!result.window_changed);

        for _ in 0..4 {
            vp.navigate(Navigation::Down, 12);
        }
        assert_eq!(vp.cursor_row(), Some(4));

        let result = vp.navigate(Navigation::Down, 12);
        assert!(result.window_changed);
        assert_eq!(result.window, 5..10);
        assert_eq!(result.row, Some(5));

        let result = vp.navigate(Navigation::Up, 12);
        assert_eq!(result.window, 0..5);
        assert_eq!(result.row, Some(4));
    }

    #[test]
    fn test_cursor_stays_at_edges() {
        let mut vp = Viewport::new(5);
        vp.navigate(Navigation::Home, 8);
        let result = vp.navigate(Navigation::Up, 8);
        assert_eq!(result.row, Some(0));
        assert!(!result.window_changed);

        let result = vp.navigate(Navigation::End, 8);
        assert_eq!(result.window, 3..8);
        assert_eq!(result.row, Some(7));
        let result = vp.navigate(Navigation::Down, 8);
        assert_eq!(result.row, Some(7));
        assert!(!result.window_changed);
    }

    #[test]
    fn test_wheel_keeps_slot() {
        let mut vp = Viewport::new(5);
        vp.render(ScrollIntent::jump(0), 20);
        assert!(vp.select_slot(2));
        let result = vp.navigate(Navigation::WheelDown, 20);
        assert_eq!(result.window, 5..10);
        assert_eq!(result.row, Some(7));
    }

    #[test]
    fn test_measure_keeps_margin() {
        let mut vp = Viewport::new(20);
        vp.render(ScrollIntent::jump(40), 1000);
        let rows = vp.measure(&mut FixedHeight(33), 1000, &MeasureSettings::default());
        assert_eq!(rows, 30);
        assert_eq!(vp.window(), 40..70);
    }

    #[test]
    fn test_measure_reprobes_tall_surfaces() {
        let mut vp = Viewport::new(20);
        let rows = vp.measure(&mut FixedHeight(150), 1000, &MeasureSettings::default());
        assert_eq!(rows, 147);

        let rows = vp.measure(&mut FixedHeight(2), 1000, &MeasureSettings::default());
        assert_eq!(rows, 2);
    }
}
