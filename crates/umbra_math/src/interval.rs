use std::ops::Add;

/// A closed range of real values, used for ray parameters and box extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// Returns true if the interval contains no values.
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    /// Returns true if x is strictly within the interval (min, max) (exclusive).
    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// Clamps x to be within the interval [min, max].
    pub fn clamp(&self, x: f64) -> f64 {
        // f64::clamp panics when min > max, which an empty interval is.
        if x < self.min {
            self.min
        } else if x > self.max {
            self.max
        } else {
            x
        }
    }

    /// Expands the interval by delta/2 on each side.
    pub fn expand(&self, delta: f64) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// Creates the tightest interval enclosing both `a` and `b`.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval::new(f64::INFINITY, f64::NEG_INFINITY);

    /// A universe interval (contains everything).
    pub const UNIVERSE: Interval = Interval::new(f64::NEG_INFINITY, f64::INFINITY);
}

impl Default for Interval {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Shifts both ends by a scalar displacement.
impl Add<f64> for Interval {
    type Output = Interval;

    fn add(self, displacement: f64) -> Interval {
        Interval::new(self.min + displacement, self.max + displacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_size() {
        assert_eq!(Interval::new(2.0, 7.0).size(), 5.0);
        assert_eq!(Interval::new(-5.0, 5.0).size(), 10.0);
    }

    #[test]
    fn test_interval_contains() {
        let interval = Interval::new(0.0, 10.0);

        // Inclusive bounds
        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
        assert!(interval.contains(5.0));

        assert!(!interval.contains(-0.1));
        assert!(!interval.contains(10.1));
    }

    #[test]
    fn test_interval_surrounds() {
        let interval = Interval::new(0.0, 10.0);

        // Exclusive bounds - endpoints NOT included
        assert!(!interval.surrounds(0.0));
        assert!(!interval.surrounds(10.0));
        assert!(interval.surrounds(5.0));
        assert!(!interval.surrounds(-0.1));
    }

    #[test]
    fn test_interval_clamp() {
        let interval = Interval::new(0.0, 10.0);

        assert_eq!(interval.clamp(-5.0), 0.0);
        assert_eq!(interval.clamp(5.0), 5.0);
        assert_eq!(interval.clamp(15.0), 10.0);
    }

    #[test]
    fn test_interval_expand() {
        let expanded = Interval::new(0.0, 10.0).expand(4.0);

        // Expanded by 2.0 on each side (4.0 / 2)
        assert_eq!(expanded.min, -2.0);
        assert_eq!(expanded.max, 12.0);
    }

    #[test]
    fn test_interval_surrounding() {
        let joined = Interval::surrounding(&Interval::new(1.0, 3.0), &Interval::new(-2.0, 2.0));
        assert_eq!(joined, Interval::new(-2.0, 3.0));

        // The empty interval is the identity for union.
        let same = Interval::surrounding(&Interval::EMPTY, &Interval::new(1.0, 3.0));
        assert_eq!(same, Interval::new(1.0, 3.0));
    }

    #[test]
    fn test_interval_shift() {
        assert_eq!(Interval::new(1.0, 5.0) + 2.0, Interval::new(3.0, 7.0));
    }

    #[test]
    fn test_interval_empty_and_universe() {
        let empty = Interval::EMPTY;
        assert!(empty.is_empty());
        assert!(!empty.contains(0.0));
        assert!(!empty.contains(f64::INFINITY));

        let universe = Interval::UNIVERSE;
        assert!(!universe.is_empty());
        assert!(universe.contains(1e300));
        assert!(universe.contains(-1e300));
        assert_eq!(universe.size(), f64::INFINITY);
    }
}
