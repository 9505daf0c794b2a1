//! Builder utilities for configuring a [`Clusterer`].
//!
//! Collects the linkage method and leaf-ordering options and validates them
//! before a [`Clusterer`] is constructed.

use std::sync::Arc;

use crate::{Result, clusterer::Clusterer, linkage::LinkageMethod};

#[derive(Debug, Clone, PartialEq, Eq)]
enum MethodSelection {
    Known(LinkageMethod),
    Named(Arc<str>),
}

/// Configures and constructs [`Clusterer`] instances.
///
/// Defaults to average linkage with leaf-order optimisation disabled and an
/// ignore threshold of zero, which never skips the exhaustive search.
///
/// # Examples
/// ```
/// use dendro_core::{ClusterBuilder, LinkageMethod};
///
/// let clusterer = ClusterBuilder::new()
///     .with_method(LinkageMethod::Ward)
///     .with_optimization(true)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(clusterer.method(), LinkageMethod::Ward);
/// assert!(clusterer.optimization());
/// ```
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    method: MethodSelection,
    optimization: bool,
    ignore_threshold: usize,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self {
            method: MethodSelection::Known(LinkageMethod::default()),
            optimization: false,
            ignore_threshold: 0,
        }
    }
}

impl ClusterBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::ClusterBuilder;
    ///
    /// let builder = ClusterBuilder::new();
    /// assert!(!builder.optimization());
    /// assert_eq!(builder.ignore_threshold(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the linkage method.
    #[must_use]
    pub fn with_method(mut self, method: LinkageMethod) -> Self {
        self.method = MethodSelection::Known(method);
        self
    }

    /// Selects the linkage method by name. The name is parsed by
    /// [`Self::build`], so an unknown name surfaces there.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::{ClusterBuilder, ClusterErrorCode};
    ///
    /// let err = ClusterBuilder::new()
    ///     .with_method_name("bogus")
    ///     .build()
    ///     .expect_err("bogus is not a linkage method");
    /// assert_eq!(err.code(), ClusterErrorCode::UnknownMethod);
    /// ```
    #[must_use]
    pub fn with_method_name(mut self, name: &str) -> Self {
        self.method = MethodSelection::Named(Arc::from(name));
        self
    }

    /// Enables or disables optimal leaf ordering after clustering.
    #[must_use]
    pub fn with_optimization(mut self, enabled: bool) -> Self {
        self.optimization = enabled;
        self
    }

    /// Returns whether leaf-order optimisation is enabled.
    #[must_use]
    pub fn optimization(&self) -> bool {
        self.optimization
    }

    /// Sets the pool-size product above which the optimiser skips the
    /// exhaustive search for a node. Zero disables skipping.
    ///
    /// # Examples
    /// ```
    /// use dendro_core::ClusterBuilder;
    ///
    /// let builder = ClusterBuilder::new().with_ignore_threshold(64);
    /// assert_eq!(builder.ignore_threshold(), 64);
    /// ```
    #[must_use]
    pub fn with_ignore_threshold(mut self, threshold: usize) -> Self {
        self.ignore_threshold = threshold;
        self
    }

    /// Returns the configured ignore threshold.
    #[must_use]
    pub fn ignore_threshold(&self) -> usize {
        self.ignore_threshold
    }

    /// Validates the configuration and constructs a [`Clusterer`].
    ///
    /// # Errors
    /// Returns [`crate::ClusterError::UnknownMethod`] when the method was given
    /// by a name that does not parse.
    pub fn build(self) -> Result<Clusterer> {
        let method = match self.method {
            MethodSelection::Known(method) => method,
            MethodSelection::Named(name) => name.parse()?,
        };
        Ok(Clusterer::new(method, self.optimization, self.ignore_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::error::ClusterError;

    #[test]
    fn defaults_to_average_without_optimization() {
        let clusterer = ClusterBuilder::new().build().expect("defaults are valid");
        assert_eq!(clusterer.method(), LinkageMethod::Average);
        assert!(!clusterer.optimization());
        assert_eq!(clusterer.ignore_threshold(), 0);
    }

    #[rstest]
    #[case("complete", LinkageMethod::Complete)]
    #[case("Weighted", LinkageMethod::McQuitty)]
    #[case("median", LinkageMethod::Median)]
    fn named_methods_parse_on_build(#[case] name: &str, #[case] expected: LinkageMethod) {
        let clusterer = ClusterBuilder::new()
            .with_method_name(name)
            .build()
            .expect("method name is valid");
        assert_eq!(clusterer.method(), expected);
    }

    #[test]
    fn unknown_method_name_fails_build() {
        let err = ClusterBuilder::new()
            .with_method_name("furthest")
            .build()
            .expect_err("furthest is not a linkage method");
        assert!(matches!(err, ClusterError::UnknownMethod { name } if &*name == "furthest"));
    }

    #[test]
    fn later_method_overrides_earlier_name() {
        let clusterer = ClusterBuilder::new()
            .with_method_name("bogus")
            .with_method(LinkageMethod::Single)
            .with_optimization(true)
            .with_ignore_threshold(10)
            .build()
            .expect("known method replaces the bad name");
        assert_eq!(clusterer.method(), LinkageMethod::Single);
        assert!(clusterer.optimization());
        assert_eq!(clusterer.ignore_threshold(), 10);
    }
}
