//! Cursor and follow-mode bookkeeping.
//!
//! The viewport only knows positions and counts. It never reads record contents, so it is
//! indifferent to how the store keeps records and to what the search matched.

/// Selection state over the store's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    cursor: usize,
    follow: bool,
}

impl Viewport {
    pub fn new(follow: bool) -> Self {
        Self { cursor: 0, follow }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn set_follow(&mut self, follow: bool, len: usize) {
        self.follow = follow;
        self.clamp_cursor(len);
    }

    pub fn toggle_follow(&mut self, len: usize) -> bool {
        self.set_follow(!self.follow, len);
        self.follow
    }

    /// Bring the cursor back into `[0, len)`; pin it to the newest record while following.
    ///
    /// Every operation that moves the cursor or follows a store mutation ends here.
    pub fn clamp_cursor(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let last = len - 1;
        self.cursor = if self.follow {
            last
        } else {
            self.cursor.min(last)
        };
    }

    /// Relative movement by lines or pages.
    ///
    /// Moving up always leaves follow mode. Moving down keeps the current follow setting,
    /// except that pushing down while already on the newest record resumes following.
    pub fn move_by(&mut self, delta: isize, len: usize) {
        if delta < 0 {
            self.follow = false;
            self.cursor = self.cursor.saturating_sub(delta.unsigned_abs());
        } else if delta > 0 {
            let at_bottom = len > 0 && self.cursor + 1 >= len;
            if at_bottom {
                self.follow = true;
            }
            self.cursor = self.cursor.saturating_add(delta as usize);
        }
        self.clamp_cursor(len);
    }

    pub fn jump_to_start(&mut self, len: usize) {
        self.follow = false;
        self.cursor = 0;
        self.clamp_cursor(len);
    }

    /// Explicit "go to latest": selects the newest record and resumes following.
    pub fn jump_to_end(&mut self, len: usize) {
        self.follow = true;
        self.clamp_cursor(len);
    }

    /// Select a specific record, leaving follow mode.
    pub fn center_on(&mut self, position: usize, len: usize) {
        self.follow = false;
        self.cursor = position;
        self.clamp_cursor(len);
    }

    /// Keep pointing at the same record after `evicted` records fell off the front.
    pub fn shift_for_eviction(&mut self, evicted: usize, len: usize) {
        if !self.follow {
            self.cursor = self.cursor.saturating_sub(evicted);
        }
        self.clamp_cursor(len);
    }

    pub fn reset(&mut self, follow: bool) {
        self.cursor = 0;
        self.follow = follow;
    }

    /// Window of `height` positions centred on the cursor, clamped to `[0, len)`.
    pub fn visible_range(&self, len: usize, height: usize) -> (usize, usize) {
        let height = height.max(1);
        if len <= height {
            return (0, len);
        }
        let mut start = self.cursor.saturating_sub(height / 2);
        let mut end = start + height;
        if end > len {
            end = len;
            start = len - height;
        }
        (start, end)
    }
}
