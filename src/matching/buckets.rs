//! Spatial bucket grid with a one-cell margin.
//!
//! Cell `(bx, by)` with `bx ∈ −1..=nr_h`, `by ∈ −1..=nr_v` maps to a flat
//! bucket id, so the 3×3 neighbourhood of every interior cell is in bounds.

/// Reference to a point stored in a [`BucketGrid`].
pub type Slot = (usize, usize);

/// A corner registered for matching.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointInfo {
    /// Integer position used for the disparity test.
    pub x: i64,
    pub y: i64,
    /// Index of the corner in the caller's list.
    pub id: usize,
    /// Current best partner in the other grid.
    pub best: Option<Slot>,
    pub score: f64,
    /// Patch index in the matcher's arena.
    pub patch: usize,
}

#[derive(Clone, Debug, Default)]
pub struct BucketGrid {
    nr_h: usize,
    nr_v: usize,
    capacity: usize,
    counts: Vec<usize>,
    points: Vec<PointInfo>,
}

impl BucketGrid {
    pub fn new(nr_h: usize, nr_v: usize, capacity: usize) -> Self {
        let buckets = (nr_h + 2) * (nr_v + 2);
        let filler = PointInfo {
            x: 0,
            y: 0,
            id: 0,
            best: None,
            score: 0.0,
            patch: 0,
        };
        Self {
            nr_h,
            nr_v,
            capacity,
            counts: vec![0; buckets],
            points: vec![filler; buckets * capacity],
        }
    }

    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    /// Flat id of cell `(bx, by)`, or `None` outside the margin.
    #[inline]
    pub fn bucket_id(&self, bx: i64, by: i64) -> Option<usize> {
        let in_x = (-1..=self.nr_h as i64).contains(&bx);
        let in_y = (-1..=self.nr_v as i64).contains(&by);
        (in_x && in_y).then(|| (by + 1) as usize * (self.nr_h + 2) + (bx + 1) as usize)
    }

    /// Append a point; returns `false` when the bucket is full.
    pub fn insert(&mut self, bucket: usize, point: PointInfo) -> bool {
        let count = self.counts[bucket];
        if count >= self.capacity {
            return false;
        }
        self.points[bucket * self.capacity + count] = point;
        self.counts[bucket] = count + 1;
        true
    }

    /// Points currently stored in `bucket`.
    #[inline]
    pub fn bucket(&self, bucket: usize) -> &[PointInfo] {
        let start = bucket * self.capacity;
        &self.points[start..start + self.counts[bucket]]
    }

    #[inline]
    pub fn len_of(&self, bucket: usize) -> usize {
        self.counts[bucket]
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> &PointInfo {
        &self.points[slot.0 * self.capacity + slot.1]
    }

    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> &mut PointInfo {
        &mut self.points[slot.0 * self.capacity + slot.1]
    }

    /// Ids of the 3×3 cells around interior cell `(bx, by)`, row by row.
    pub fn neighbourhood(&self, bx: usize, by: usize) -> [usize; 9] {
        let stride = self.nr_h + 2;
        let mut ids = [0; 9];
        for (k, id) in ids.iter_mut().enumerate() {
            *id = (by + k / 3) * stride + bx + k % 3;
        }
        ids
    }

    /// Flat id of interior cell `(bx, by)`.
    #[inline]
    pub fn interior_id(&self, bx: usize, by: usize) -> usize {
        (by + 1) * (self.nr_h + 2) + bx + 1
    }

    #[inline]
    pub fn is_full(&self, bucket: usize) -> bool {
        self.counts[bucket] >= self.capacity
    }

    pub fn total_points(&self) -> usize {
        self.counts.iter().sum()
    }
}
