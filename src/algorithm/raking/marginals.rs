//! Marginal targets and their extraction from published totals

use std::collections::BTreeMap;

use crate::error::{RefinerError, Result};
use crate::models::categories::{AgeBand, Category, CategoryValue, Dimension, Education};
use crate::models::totals::PublishedTotals;

/// Target totals for the categories of one dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Marginal {
    dimension: Dimension,
    targets: BTreeMap<CategoryValue, f64>,
}

impl Marginal {
    /// Validate that every target is a finite, non-negative total of `dimension`
    pub fn new(dimension: Dimension, targets: BTreeMap<CategoryValue, f64>) -> Result<Self> {
        for (category, target) in &targets {
            if category.dimension() != dimension {
                return Err(RefinerError::UnknownCategory {
                    dimension: dimension.to_string(),
                    category: category.label().to_string(),
                });
            }
            if !target.is_finite() || *target < 0.0 {
                return Err(RefinerError::InvalidMarginal {
                    column: category.column().unwrap_or(category.label()).to_string(),
                    reason: format!("target must be finite and non-negative, got {target}"),
                });
            }
        }
        Ok(Self { dimension, targets })
    }

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn targets(&self) -> &BTreeMap<CategoryValue, f64> {
        &self.targets
    }

    /// Target of one category
    #[must_use]
    pub fn target(&self, category: CategoryValue) -> Option<f64> {
        self.targets.get(&category).copied()
    }

    /// Sum of all targets
    #[must_use]
    pub fn total(&self) -> f64 {
        self.targets.values().sum()
    }
}

/// Ordered marginals of one raking pass; the order is the sweep order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarginalSet {
    marginals: Vec<Marginal>,
}

impl MarginalSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a marginal; each dimension may be constrained once
    pub fn push(&mut self, marginal: Marginal) -> Result<()> {
        if self.get(marginal.dimension).is_some() {
            return Err(RefinerError::Config(format!(
                "dimension {} is constrained twice",
                marginal.dimension
            )));
        }
        self.marginals.push(marginal);
        Ok(())
    }

    /// Builder-style [`MarginalSet::push`]
    pub fn with(mut self, marginal: Marginal) -> Result<Self> {
        self.push(marginal)?;
        Ok(self)
    }

    /// Marginal of a dimension
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&Marginal> {
        self.marginals.iter().find(|m| m.dimension == dimension)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marginal> {
        self.marginals.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marginals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marginals.is_empty()
    }
}

impl<'a> IntoIterator for &'a MarginalSet {
    type Item = &'a Marginal;
    type IntoIter = std::slice::Iter<'a, Marginal>;

    fn into_iter(self) -> Self::IntoIter {
        self.marginals.iter()
    }
}

/// Reads marginal targets from a published totals row
pub struct MarginalExtractor;

impl MarginalExtractor {
    /// Absolute counts read from the column of each category
    pub fn counts<C>(totals: &PublishedTotals, categories: &[C]) -> Result<Marginal>
    where
        C: Category + Into<CategoryValue>,
    {
        let mut targets = BTreeMap::new();
        for &category in categories {
            let column = category.column().ok_or_else(|| RefinerError::InvalidMarginal {
                column: category.label().to_string(),
                reason: "category has no published column".to_string(),
            })?;
            targets.insert(category.into(), totals.value(column)?);
        }
        Marginal::new(C::DIMENSION, targets)
    }

    /// Education targets from published percentage shares.
    ///
    /// Each share is rescaled against `population` (the 25-and-over total),
    /// so the targets sum to `population`.
    pub fn education_shares(totals: &PublishedTotals, population: f64) -> Result<Marginal> {
        let shares = Self::counts(totals, Education::all())?;
        let targets = rescale_shares(shares.targets(), population)?;
        Marginal::new(Dimension::Education, targets)
    }
}

/// Turn percentage shares into absolute targets summing to `population`
pub fn rescale_shares(
    shares: &BTreeMap<CategoryValue, f64>,
    population: f64,
) -> Result<BTreeMap<CategoryValue, f64>> {
    let share_total: f64 = shares.values().sum();
    if !(share_total.is_finite() && share_total > 0.0) {
        return Err(RefinerError::InvalidMarginal {
            column: "education shares".to_string(),
            reason: format!("shares sum to {share_total}"),
        });
    }
    if !(population.is_finite() && population >= 0.0) {
        return Err(RefinerError::InvalidMarginal {
            column: "population 25 and over".to_string(),
            reason: format!("population is {population}"),
        });
    }

    Ok(shares
        .iter()
        .map(|(&category, &share)| (category, population * share / share_total))
        .collect())
}

/// Population 25 and over from an age marginal: the adult bands only, the
/// 25-34 band being excluded everywhere after the first pass
#[must_use]
pub fn population_25_plus(age: &Marginal) -> f64 {
    age.targets()
        .iter()
        .filter_map(|(category, target)| match category {
            CategoryValue::Age(band) if band.is_adult() => Some(*target),
            _ => None,
        })
        .sum()
}

/// Convert the per-category sums of a table into a marginal
pub fn marginal_from_sums(
    dimension: Dimension,
    sums: BTreeMap<CategoryValue, f64>,
) -> Result<Marginal> {
    Marginal::new(dimension, sums)
}

/// The adult age bands as categories
#[must_use]
pub fn adult_age_categories() -> Vec<CategoryValue> {
    AgeBand::ADULT.iter().map(|&band| band.into()).collect()
}
