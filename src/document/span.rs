//! Half-open position ranges.

/// A `[from, to)` range in document positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Number of positions covered
    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    /// Whether `pos` lies inside the half-open range
    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos < self.to
    }

    /// Whether the two ranges share at least one position
    pub fn intersects(&self, other: Span) -> bool {
        self.from < other.to && other.from < self.to
    }

    /// Move both ends by `delta`, clamping at zero.
    pub fn shifted(self, delta: isize) -> Self {
        Self {
            from: self.from.saturating_add_signed(delta),
            to: self.to.saturating_add_signed(delta),
        }
    }

    /// Move only the end by `delta`, never past `from`.
    pub fn resized(self, delta: isize) -> Self {
        Self {
            from: self.from,
            to: self.to.saturating_add_signed(delta).max(self.from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifting_clamps_at_zero() {
        assert_eq!(Span::new(3, 6).shifted(-5), Span::new(0, 1));
        assert_eq!(Span::new(3, 6).shifted(4), Span::new(7, 10));
    }

    #[test]
    fn resizing_keeps_start() {
        assert_eq!(Span::new(0, 4).resized(-2), Span::new(0, 2));
        assert_eq!(Span::new(5, 7).resized(-10), Span::new(5, 5));
    }

    #[test]
    fn intersection_is_half_open() {
        let span = Span::new(4, 8);
        assert!(span.intersects(Span::new(7, 9)));
        assert!(!span.intersects(Span::new(8, 9)));
        assert!(!span.intersects(Span::new(0, 4)));
        assert!(span.contains(4));
        assert!(!span.contains(8));
    }
}
