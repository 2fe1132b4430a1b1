#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Enter,
    Space,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Moved(usize),
    Unchanged,
    /// The focused cell was activated.
    Activate(usize),
}

/// Roving focus over the rendered day cells. Indices run across both
/// month grids as one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridFocus {
    index: usize,
    len: usize,
}

impl GridFocus {
    pub fn new(len: usize) -> Self {
        GridFocus { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves that would leave the grid are ignored, never wrapped.
    pub fn handle_key(&mut self, key: NavKey) -> FocusOutcome {
        let step: isize = match key {
            NavKey::Enter | NavKey::Space => {
                return if self.index < self.len {
                    FocusOutcome::Activate(self.index)
                } else {
                    FocusOutcome::Unchanged
                };
            }
            NavKey::Left => -1,
            NavKey::Right => 1,
            NavKey::Up => -7,
            NavKey::Down => 7,
        };
        match self.index.checked_add_signed(step) {
            Some(next) if next < self.len => {
                self.index = next;
                FocusOutcome::Moved(next)
            }
            _ => FocusOutcome::Unchanged,
        }
    }

    /// `0` for the first cell of each rendered grid, `-1` for every other
    /// cell. `grid_starts` holds the index where each grid begins.
    pub fn tab_index(&self, i: usize, grid_starts: &[usize]) -> i32 {
        if i < self.len && grid_starts.contains(&i) { 0 } else { -1 }
    }

    /// Jumps to the next tab stop after the focused cell, wrapping back to
    /// the first grid.
    pub fn next_tab_stop(&mut self, grid_starts: &[usize]) -> FocusOutcome {
        let next = (self.index + 1..self.len)
            .chain(0..self.index)
            .find(|&i| self.tab_index(i, grid_starts) == 0);
        match next {
            Some(i) => {
                self.index = i;
                FocusOutcome::Moved(i)
            }
            None => FocusOutcome::Unchanged,
        }
    }

    /// Keeps the focus inside a grid whose cell count changed.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }
}
