use crate::tracker::{Task, TaskStatus};

use super::hit_test::{self, Bounds};

/// Height of the Closed panel while collapsed: borders plus a summary row.
pub const COLLAPSED_HEIGHT: u16 = 3;

const MIN_PANEL_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelFocus {
    InProgress,
    Open,
    Closed,
}

impl PanelFocus {
    pub const ALL: [PanelFocus; 3] = [PanelFocus::InProgress, PanelFocus::Open, PanelFocus::Closed];

    pub fn title(self) -> &'static str {
        match self {
            PanelFocus::InProgress => "In Progress",
            PanelFocus::Open => "Open",
            PanelFocus::Closed => "Closed",
        }
    }

    /// Which panel a task with this status belongs in.
    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::InProgress => PanelFocus::InProgress,
            TaskStatus::Closed => PanelFocus::Closed,
            TaskStatus::Open | TaskStatus::Blocked => PanelFocus::Open,
        }
    }
}

/// One bordered, scrollable task list.
#[derive(Debug, Clone)]
pub struct TaskPanel {
    pub kind: PanelFocus,
    pub items: Vec<Task>,
    pub selected: usize,
    /// First item drawn; kept so that `selected` is always on screen.
    pub offset: usize,
    pub height: u16,
    pub focused: bool,
    pub collapsed: bool,
}

impl TaskPanel {
    pub fn new(kind: PanelFocus) -> Self {
        TaskPanel {
            kind,
            items: vec![],
            selected: 0,
            offset: 0,
            height: MIN_PANEL_HEIGHT,
            focused: false,
            collapsed: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Replace the items, keeping the selection on the same task when it
    /// survives and clamping it otherwise.
    pub fn set_items(&mut self, items: Vec<Task>) {
        let previous = self.selected_task().map(|t| t.id.clone());
        self.items = items;
        self.selected = previous
            .and_then(|id| self.items.iter().position(|t| t.id == id))
            .unwrap_or(self.selected)
            .min(self.items.len().saturating_sub(1));
        self.ensure_visible();
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.items.get(self.selected)
    }

    /// Rows available for items inside the borders.
    pub fn visible_rows(&self) -> usize {
        usize::from(self.height.saturating_sub(2)).max(1)
    }

    /// Select the item drawn at `row` (relative to the first visible item).
    /// Rows past the last item are ignored.
    pub fn select_row(&mut self, row: usize) {
        let index = self.offset + row;
        if index < self.items.len() {
            self.selected = index;
            self.ensure_visible();
        }
    }

    pub fn move_by(&mut self, delta: i32) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        let target = self.selected as i64 + i64::from(delta);
        self.selected = target.clamp(0, last as i64) as usize;
        self.ensure_visible();
    }

    pub fn page(&mut self, down: bool) {
        let step = (self.visible_rows() / 2).max(1) as i32;
        self.move_by(if down { step } else { -step });
    }

    pub fn go_top(&mut self) {
        self.selected = 0;
        self.ensure_visible();
    }

    pub fn go_bottom(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        let rows = self.visible_rows();
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }
        let max_offset = self.items.len().saturating_sub(rows);
        self.offset = self.offset.min(max_offset);
    }
}

/// The three stacked task lists and which one holds focus.
#[derive(Debug, Clone)]
pub struct Panels {
    pub in_progress: TaskPanel,
    pub open: TaskPanel,
    pub closed: TaskPanel,
    focused: PanelFocus,
    available_height: u16,
}

impl Default for Panels {
    fn default() -> Self {
        Self::new()
    }
}

impl Panels {
    pub fn new() -> Self {
        let mut panels = Panels {
            in_progress: TaskPanel::new(PanelFocus::InProgress),
            open: TaskPanel::new(PanelFocus::Open),
            closed: TaskPanel::new(PanelFocus::Closed),
            focused: PanelFocus::Open,
            available_height: 0,
        };
        panels.open.focused = true;
        panels.closed.collapsed = true;
        panels
    }

    pub fn focused(&self) -> PanelFocus {
        self.focused
    }

    pub fn get(&self, kind: PanelFocus) -> &TaskPanel {
        match kind {
            PanelFocus::InProgress => &self.in_progress,
            PanelFocus::Open => &self.open,
            PanelFocus::Closed => &self.closed,
        }
    }

    pub fn get_mut(&mut self, kind: PanelFocus) -> &mut TaskPanel {
        match kind {
            PanelFocus::InProgress => &mut self.in_progress,
            PanelFocus::Open => &mut self.open,
            PanelFocus::Closed => &mut self.closed,
        }
    }

    pub fn focused_panel(&self) -> &TaskPanel {
        self.get(self.focused)
    }

    pub fn focused_panel_mut(&mut self) -> &mut TaskPanel {
        self.get_mut(self.focused)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.focused_panel().selected_task()
    }

    /// In Progress drops out of the layout while it has nothing in it.
    pub fn visible(&self) -> Vec<PanelFocus> {
        PanelFocus::ALL
            .into_iter()
            .filter(|&p| p != PanelFocus::InProgress || !self.in_progress.is_empty())
            .collect()
    }

    /// Move focus to `target`. The Closed panel expands while focused and
    /// collapses again when focus leaves it.
    pub fn focus(&mut self, target: PanelFocus) {
        let was_closed = self.focused == PanelFocus::Closed;
        self.focused_panel_mut().focused = false;
        self.focused = target;
        self.focused_panel_mut().focused = true;

        let now_closed = target == PanelFocus::Closed;
        if was_closed != now_closed {
            self.closed.collapsed = !now_closed;
            self.relayout();
        }
    }

    /// Step focus by `direction` (±1) through the visible panels, wrapping.
    pub fn cycle_focus(&mut self, direction: i32) {
        let visible = self.visible();
        let count = visible.len() as i32;
        let current = visible.iter().position(|&p| p == self.focused).unwrap_or(0) as i32;
        let next = (current + direction).rem_euclid(count);
        self.focus(visible[next as usize]);
    }

    /// Forward a scroll to the focused panel only.
    pub fn scroll(&mut self, amount: i32) {
        self.focused_panel_mut().move_by(amount);
    }

    /// Partition `tasks` into the three panels by status.
    pub fn distribute(&mut self, tasks: &[Task]) {
        let mut in_progress = vec![];
        let mut open = vec![];
        let mut closed = vec![];
        for task in tasks {
            match PanelFocus::for_status(task.status) {
                PanelFocus::InProgress => in_progress.push(task.clone()),
                PanelFocus::Open => open.push(task.clone()),
                PanelFocus::Closed => closed.push(task.clone()),
            }
        }
        in_progress.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        open.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        self.in_progress.set_items(in_progress);
        self.open.set_items(open);
        self.closed.set_items(closed);

        if self.focused == PanelFocus::InProgress && self.in_progress.is_empty() {
            self.focus(PanelFocus::Open);
        }
        self.relayout();
    }

    /// Recompute panel heights for `available` rows.
    pub fn layout(&mut self, available: u16) {
        self.available_height = available;
        self.relayout();
    }

    fn relayout(&mut self) {
        let available = self.available_height;
        let in_progress = if self.in_progress.is_empty() {
            0
        } else {
            let wanted = u16::try_from(self.in_progress.len())
                .unwrap_or(u16::MAX)
                .saturating_add(2);
            wanted.min((available / 3).max(MIN_PANEL_HEIGHT))
        };
        let rest = available.saturating_sub(in_progress);
        let (open, closed) = if self.closed.collapsed {
            (rest.saturating_sub(COLLAPSED_HEIGHT), COLLAPSED_HEIGHT.min(rest))
        } else {
            let open = rest.div_ceil(2);
            (open, rest - open)
        };
        self.in_progress.height = in_progress;
        self.open.height = open;
        self.closed.height = closed;
        for kind in PanelFocus::ALL {
            self.get_mut(kind).ensure_visible();
        }
    }

    /// Screen rectangles of the visible panels, top to bottom.
    pub fn bounds(&self, width: u16) -> Vec<(PanelFocus, Bounds)> {
        let heights: Vec<(PanelFocus, u16)> = self
            .visible()
            .into_iter()
            .map(|p| (p, self.get(p).height))
            .collect();
        hit_test::stack_panels(&heights, width)
    }
}

/// Scroll state for a read-only text view (detail, help).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub content_len: usize,
    pub height: usize,
}

impl Viewport {
    pub fn set_content_len(&mut self, len: usize) {
        self.content_len = len;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    fn max_offset(&self) -> usize {
        self.content_len.saturating_sub(self.height)
    }

    pub fn scroll(&mut self, amount: i32) {
        let target = self.offset as i64 + i64::from(amount);
        self.offset = target.clamp(0, self.max_offset() as i64) as usize;
    }

    pub fn half_page(&mut self, down: bool) {
        let step = (self.height / 2).max(1) as i32;
        self.scroll(if down { step } else { -step });
    }

    pub fn goto_top(&mut self) {
        self.offset = 0;
    }

    pub fn goto_bottom(&mut self) {
        self.offset = self.max_offset();
    }
}
