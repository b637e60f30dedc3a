use std::collections::HashMap;

/// Bucket grid over canvas pixels for radius lookups.
/// Items are kept in insertion order; cells hold indices into `items`.
pub struct PointGrid<T> {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<T>,
    /// Cell edge length in pixels
    cell_size: f64,
}

impl<T> PointGrid<T> {
    /// Create a new grid. `cell_size` is floored at one pixel.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size: cell_size.max(1.0),
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, x: f64, y: f64, item: T) {
        let idx = self.items.len();
        self.items.push(item);

        let cell = self.to_cell(x, y);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Indices of items whose cell lies within `radius` of (x, y).
    /// May include items slightly outside the radius; callers filter by distance.
    pub fn query_radius_into(&self, x: f64, y: f64, radius: f64, results: &mut Vec<usize>) {
        let min = self.to_cell(x - radius, y - radius);
        let max = self.to_cell(x + radius, y + radius);

        for cy in min.1..=max.1 {
            for cx in min.0..=max.0 {
                if let Some(indices) = self.cells.get(&(cx, cy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
