//! Dense contingency tables
//!
//! A [`SeedMatrix`] has one axis per dimension, each axis listing the
//! categories it carries. Every combination of axis categories is a cell,
//! zero when no record falls in it, so a target category can never be
//! silently missing from the table. Cells are stored row-major.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::config::SeedWeighting;
use crate::error::{RefinerError, Result};
use crate::models::categories::{Category, CategoryValue, Dimension};
use crate::models::record::Person;

/// Maximum number of axes of a table
pub const MAX_AXES: usize = 4;

/// Category tuple of a cell, one entry per axis
pub type CellKey = SmallVec<[CategoryValue; MAX_AXES]>;

/// One dimension of a table with its ordered categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    dimension: Dimension,
    categories: Vec<CategoryValue>,
}

impl Axis {
    /// Create an axis; categories must be non-empty, distinct and of `dimension`
    pub fn new(dimension: Dimension, categories: Vec<CategoryValue>) -> Result<Self> {
        if categories.is_empty() {
            return Err(RefinerError::Config(format!(
                "axis {dimension} has no categories"
            )));
        }
        if let Some(stray) = categories.iter().find(|c| c.dimension() != dimension) {
            return Err(RefinerError::UnknownCategory {
                dimension: dimension.to_string(),
                category: stray.label().to_string(),
            });
        }
        let mut seen = FxHashSet::default();
        if let Some(duplicate) = categories.iter().find(|c| !seen.insert(**c)) {
            return Err(RefinerError::Config(format!(
                "axis {dimension} lists '{duplicate}' twice"
            )));
        }
        Ok(Self {
            dimension,
            categories,
        })
    }

    /// Axis over a slice of typed categories
    #[must_use]
    pub fn of<C>(categories: &[C]) -> Self
    where
        C: Category + Into<CategoryValue>,
    {
        Self {
            dimension: C::DIMENSION,
            categories: categories.iter().map(|&c| c.into()).collect(),
        }
    }

    /// Axis over every category of `C`
    #[must_use]
    pub fn all<C>() -> Self
    where
        C: Category + Into<CategoryValue>,
    {
        Self::of(C::all())
    }

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryValue] {
        &self.categories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Position of a category on the axis
    #[must_use]
    pub fn position(&self, category: CategoryValue) -> Option<usize> {
        self.categories.iter().position(|c| *c == category)
    }
}

/// Dense table of non-negative cell values
#[derive(Debug, Clone, PartialEq)]
pub struct SeedMatrix {
    axes: Vec<Axis>,
    strides: SmallVec<[usize; MAX_AXES]>,
    values: Vec<f64>,
}

impl SeedMatrix {
    /// Table of zeros over 1 to 4 axes of distinct dimensions
    pub fn zeros(axes: Vec<Axis>) -> Result<Self> {
        if axes.is_empty() || axes.len() > MAX_AXES {
            return Err(RefinerError::Config(format!(
                "a seed table needs 1 to {MAX_AXES} axes, got {}",
                axes.len()
            )));
        }
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|a| a.dimension == axis.dimension) {
                return Err(RefinerError::Config(format!(
                    "dimension {} appears on two axes",
                    axis.dimension
                )));
            }
        }

        let mut strides: SmallVec<[usize; MAX_AXES]> = SmallVec::from_elem(1, axes.len());
        for i in (0..axes.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * axes[i + 1].len();
        }
        let cells = axes.iter().map(Axis::len).product();

        Ok(Self {
            axes,
            strides,
            values: vec![0.0; cells],
        })
    }

    /// Cross-tabulate persons over `axes`.
    ///
    /// Persons whose category on some axis is unknown or not listed are
    /// skipped; the returned table still holds every combination.
    pub fn from_persons(persons: &[Person], axes: Vec<Axis>, weighting: SeedWeighting) -> Result<Self> {
        let mut table = Self::zeros(axes)?;
        let mut skipped = 0usize;

        'persons: for person in persons {
            let mut cell = 0;
            for (axis, stride) in table.axes.iter().zip(&table.strides) {
                let Some(position) = person
                    .category(axis.dimension)
                    .and_then(|c| axis.position(c))
                else {
                    skipped += 1;
                    continue 'persons;
                };
                cell += position * stride;
            }
            table.values[cell] += match weighting {
                SeedWeighting::Count => 1.0,
                SeedWeighting::SamplingWeight => person.weight,
            };
        }

        if skipped > 0 {
            log::debug!(
                "Seed over {:?}: skipped {skipped} of {} persons outside the axis categories",
                table.dimensions(),
                persons.len()
            );
        }
        Ok(table)
    }

    /// Build a table from explicit cells; unlisted cells are zero
    pub fn from_cells<I>(axes: Vec<Axis>, cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<CategoryValue>, f64)>,
    {
        let mut table = Self::zeros(axes)?;
        for (key, value) in cells {
            table.set(&key, value)?;
        }
        Ok(table)
    }

    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Dimensions of the axes, in axis order
    #[must_use]
    pub fn dimensions(&self) -> Vec<Dimension> {
        self.axes.iter().map(Axis::dimension).collect()
    }

    /// Index of the axis carrying `dimension`
    #[must_use]
    pub fn axis_index(&self, dimension: Dimension) -> Option<usize> {
        self.axes.iter().position(|a| a.dimension == dimension)
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum over all cells
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Position of cell `cell` on axis `axis`
    #[inline]
    fn coordinate(&self, cell: usize, axis: usize) -> usize {
        (cell / self.strides[axis]) % self.axes[axis].len()
    }

    fn cell_index(&self, key: &[CategoryValue]) -> Result<usize> {
        if key.len() != self.axes.len() {
            return Err(RefinerError::Config(format!(
                "cell key has {} categories, table has {} axes",
                key.len(),
                self.axes.len()
            )));
        }
        let mut cell = 0;
        for ((axis, stride), category) in self.axes.iter().zip(&self.strides).zip(key) {
            let position = axis.position(*category).ok_or_else(|| RefinerError::UnknownCategory {
                dimension: axis.dimension.to_string(),
                category: category.label().to_string(),
            })?;
            cell += position * stride;
        }
        Ok(cell)
    }

    /// Value of the cell with categories `key` (in axis order)
    pub fn get(&self, key: &[CategoryValue]) -> Result<f64> {
        Ok(self.values[self.cell_index(key)?])
    }

    /// Overwrite the cell with categories `key` (in axis order)
    pub fn set(&mut self, key: &[CategoryValue], value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(RefinerError::Config(format!(
                "cell values must be finite and non-negative, got {value}"
            )));
        }
        let cell = self.cell_index(key)?;
        self.values[cell] = value;
        Ok(())
    }

    /// Categories of a cell
    #[must_use]
    pub fn cell_key(&self, cell: usize) -> CellKey {
        (0..self.axes.len())
            .map(|axis| self.axes[axis].categories[self.coordinate(cell, axis)])
            .collect()
    }

    /// Every cell with its categories, in storage order
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(cell, &value)| (self.cell_key(cell), value))
    }

    /// Sum of the cells per category of axis `axis`, in axis order
    #[must_use]
    pub fn axis_sums(&self, axis: usize) -> Vec<f64> {
        let mut sums = vec![0.0; self.axes[axis].len()];
        for (cell, value) in self.values.iter().enumerate() {
            sums[self.coordinate(cell, axis)] += value;
        }
        sums
    }

    /// Multiply every cell by the factor of its category on axis `axis`
    pub(crate) fn scale_axis(&mut self, axis: usize, factors: &[f64]) {
        debug_assert_eq!(factors.len(), self.axes[axis].len());
        let stride = self.strides[axis];
        let len = self.axes[axis].len();
        for (cell, value) in self.values.iter_mut().enumerate() {
            *value *= factors[(cell / stride) % len];
        }
    }

    /// Per-category sums of a dimension
    #[must_use]
    pub fn marginal(&self, dimension: Dimension) -> Option<BTreeMap<CategoryValue, f64>> {
        let axis = self.axis_index(dimension)?;
        Some(
            self.axes[axis]
                .categories
                .iter()
                .copied()
                .zip(self.axis_sums(axis))
                .collect(),
        )
    }

    /// Sub-table keeping only the listed categories of some dimensions.
    ///
    /// Dimensions not named keep all their categories. Retained cells keep
    /// their values.
    pub fn restrict(&self, keep: &[(Dimension, Vec<CategoryValue>)]) -> Result<Self> {
        let axes = self
            .axes
            .iter()
            .map(|axis| match keep.iter().find(|(d, _)| *d == axis.dimension) {
                Some((dimension, categories)) => {
                    if let Some(unknown) = categories.iter().find(|c| axis.position(**c).is_none()) {
                        return Err(RefinerError::UnknownCategory {
                            dimension: dimension.to_string(),
                            category: unknown.label().to_string(),
                        });
                    }
                    Axis::new(*dimension, categories.clone())
                }
                None => Ok(axis.clone()),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut restricted = Self::zeros(axes)?;
        for cell in 0..restricted.values.len() {
            let key = restricted.cell_key(cell);
            restricted.values[cell] = self.values[self.cell_index(&key)?];
        }
        Ok(restricted)
    }

    /// Sum cells into groups; cells for which `key` returns `None` are dropped
    pub fn collapse<K, F>(&self, key: F) -> BTreeMap<K, f64>
    where
        K: Ord,
        F: Fn(&[CategoryValue]) -> Option<K>,
    {
        let mut groups = BTreeMap::new();
        for (cell_key, value) in self.cells() {
            if let Some(group) = key(cell_key.as_slice()) {
                *groups.entry(group).or_insert(0.0) += value;
            }
        }
        groups
    }
}
