use super::domain::VacancyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Position inside a result set, used to decide which arrows to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
    pub len: usize,
}

impl Cursor {
    /// A lone vacancy shown outside any search.
    pub const fn single() -> Self {
        Self { index: 0, len: 1 }
    }

    pub const fn has_previous(self) -> bool {
        self.index > 0
    }

    pub const fn has_next(self) -> bool {
        self.index + 1 < self.len
    }
}

/// Vacancy ids captured at search time, in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    ids: Vec<VacancyId>,
    index: usize,
}

impl SearchResults {
    /// `None` for an empty result set; there is nothing to navigate.
    pub fn new(ids: Vec<VacancyId>) -> Option<Self> {
        if ids.is_empty() {
            None
        } else {
            Some(Self { ids, index: 0 })
        }
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            index: self.index,
            len: self.ids.len(),
        }
    }

    pub fn current(&self) -> VacancyId {
        self.ids[self.index]
    }

    /// Move one step from `from` (the index the tapped button was rendered at),
    /// clamped to the result bounds. Steps past either end leave the cursor on
    /// the boundary.
    pub fn step(&mut self, from: usize, direction: Direction) -> VacancyId {
        let last = self.ids.len() - 1;
        let from = from.min(last);
        self.index = match direction {
            Direction::Previous => from.saturating_sub(1),
            Direction::Next => (from + 1).min(last),
        };
        self.current()
    }

    /// Point the cursor at `id` if it is part of the result set.
    pub fn focus(&mut self, id: VacancyId) -> Option<Cursor> {
        let position = self.ids.iter().position(|candidate| *candidate == id)?;
        self.index = position;
        Some(self.cursor())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
