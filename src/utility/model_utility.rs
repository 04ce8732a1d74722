//! Utility defined by refitting a model on subsets of a dataset.

use std::sync::Arc;

use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::error::UtilityError;
use crate::types::Subset;

use super::{CacheStats, Dataset, SupervisedModel, Utility, UtilityCache};

/// `u(S)` = score on the test split of a model fitted on the rows `S` of the
/// training split.
///
/// The model passed at construction is a prototype: every evaluation fits a
/// fresh clone, so the utility is safe to share between workers.
///
/// Scores are optionally memoised in a bounded [`UtilityCache`]. The cache is
/// tied to this exact `(model, dataset)` pair; [`with_model`](Self::with_model)
/// and [`with_dataset`](Self::with_dataset) return a utility with a new, empty
/// cache.
#[derive(Debug)]
pub struct ModelUtility<M> {
    model: M,
    data: Arc<Dataset>,
    catch_errors: bool,
    cache: Option<UtilityCache>,
}

impl<M: SupervisedModel> ModelUtility<M> {
    /// Create a utility with a cache of the default capacity.
    ///
    /// Fit and score failures are returned as errors.
    pub fn new(model: M, data: impl Into<Arc<Dataset>>) -> Self {
        Self {
            model,
            data: data.into(),
            catch_errors: false,
            cache: Some(UtilityCache::new(DEFAULT_CACHE_CAPACITY)),
        }
    }

    /// Score failed fits as `NaN` instead of returning an error.
    ///
    /// Useful when a model cannot be fitted on very small subsets.
    pub fn catch_errors(mut self, catch: bool) -> Self {
        self.catch_errors = catch;
        self
    }

    /// Use a cache holding at most `capacity` scores.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = Some(UtilityCache::new(capacity));
        self
    }

    /// Disable caching.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Same settings, different model. The cache starts empty.
    pub fn with_model<N: SupervisedModel>(&self, model: N) -> ModelUtility<N> {
        ModelUtility {
            model,
            data: Arc::clone(&self.data),
            catch_errors: self.catch_errors,
            cache: self.fresh_cache(),
        }
    }

    /// Same settings, different data. The cache starts empty.
    pub fn with_dataset(&self, data: impl Into<Arc<Dataset>>) -> Self {
        Self {
            model: self.model.clone(),
            data: data.into(),
            catch_errors: self.catch_errors,
            cache: self.fresh_cache(),
        }
    }

    /// Drop all cached scores.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Cache counters, if caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(UtilityCache::stats)
    }

    /// The dataset being valued.
    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn fresh_cache(&self) -> Option<UtilityCache> {
        self.cache.as_ref().map(|c| UtilityCache::new(c.capacity()))
    }

    fn fit_and_score(&self, subset: &Subset) -> Result<f64, UtilityError> {
        let (x, y) = self.data.train_subset(subset)?;
        let mut model = self.model.clone();
        let result = model
            .fit(&x, &y)
            .and_then(|()| model.score(self.data.x_test(), self.data.y_test()));
        match result {
            Ok(score) => Ok(score),
            Err(err @ UtilityError::IndexOutOfRange { .. }) => Err(err),
            Err(err) if self.catch_errors => {
                log::debug!("fit failed on {} points, scoring NaN: {err}", subset.len());
                Ok(f64::NAN)
            }
            Err(err) => Err(err),
        }
    }
}

impl<M: SupervisedModel> Utility for ModelUtility<M> {
    fn n_points(&self) -> usize {
        self.data.n_train()
    }

    fn evaluate(&self, subset: &Subset) -> Result<f64, UtilityError> {
        if subset.is_empty() {
            return Ok(0.0);
        }
        match &self.cache {
            Some(cache) => cache.get_or_insert_with(subset, || self.fit_and_score(subset)),
            None => self.fit_and_score(subset),
        }
    }

    fn data_names(&self) -> Vec<String> {
        self.data.data_names().to_vec()
    }
}
