//! Line history for the left and right images.
//!
//! The buffer keeps the last `window_size` rows of each image in a flat arena
//! with one slot per row. Rows are stored in padded coordinates: image column
//! `x` lives at padded column `x + half`, and everything outside the image,
//! above, below, left or right, reads as 0. Slots are reused in arrival order,
//! so after a push slot `head` holds the oldest row.

/// Sliding `window_size`-row history of both images.
#[derive(Clone, Debug)]
pub struct WindowBuffer {
    window_size: usize,
    half: usize,
    width: usize,
    padded_width: usize,
    left: Vec<u8>,
    right: Vec<u8>,
    head: usize,
}

impl WindowBuffer {
    /// Creates an all-zero history for images `width` pixels wide.
    pub fn new(window_size: usize, width: usize) -> Self {
        let half = window_size / 2;
        let padded_width = width + window_size - 1;
        Self {
            window_size,
            half,
            width,
            padded_width,
            left: vec![0; window_size * padded_width],
            right: vec![0; window_size * padded_width],
            head: 0,
        }
    }

    /// Window height in rows.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of padded columns, `width + window_size - 1`.
    pub fn padded_width(&self) -> usize {
        self.padded_width
    }

    /// Clears the history back to the zero border.
    pub fn reset(&mut self) {
        self.left.fill(0);
        self.right.fill(0);
        self.head = 0;
    }

    /// Replaces the oldest row with a new one; `None` pushes a border row.
    ///
    /// Slices must be exactly `width` long; the engine checks this before
    /// calling.
    pub fn push_row(&mut self, left: Option<&[u8]>, right: Option<&[u8]>) {
        let start = self.head * self.padded_width;
        let end = start + self.padded_width;
        let inner = start + self.half..start + self.half + self.width;
        for (arena, row) in [(&mut self.left, left), (&mut self.right, right)] {
            match row {
                Some(row) => {
                    arena[start..inner.start].fill(0);
                    arena[inner.clone()].copy_from_slice(row);
                    arena[inner.end..end].fill(0);
                }
                None => arena[start..end].fill(0),
            }
        }
        self.head = (self.head + 1) % self.window_size;
    }

    #[inline]
    fn slot(&self, i: usize) -> usize {
        (self.head + i) % self.window_size
    }

    /// Padded left row `i` of the window, 0 being the top.
    #[inline]
    pub fn left_row(&self, i: usize) -> &[u8] {
        let start = self.slot(i) * self.padded_width;
        &self.left[start..start + self.padded_width]
    }

    /// Padded right row `i` of the window, 0 being the top.
    #[inline]
    pub fn right_row(&self, i: usize) -> &[u8] {
        let start = self.slot(i) * self.padded_width;
        &self.right[start..start + self.padded_width]
    }
}
