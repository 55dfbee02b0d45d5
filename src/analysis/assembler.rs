//! Payload assembly.
//!
//! Runs column resolution once, feeds the resulting role mapping to every
//! aggregator and merges their outputs with dataset metadata. A failing
//! aggregator is replaced by its degraded shape so the payload is always
//! well formed once a dataset has loaded.

use crate::analysis::aggregator::{self, ChartOptions};
use crate::analysis::resolver::{ColumnResolver, RoleKeywords};
use crate::config::Config;
use crate::models::{
    Dataset, Distribution, Efficiency, Evolution, Marquee, Payload, PayloadMeta, RoleMapping,
    UNKNOWN_LABEL,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Composes the chart payload for a dataset.
#[derive(Debug, Clone, Default)]
pub struct PayloadAssembler {
    resolver: ColumnResolver,
    options: ChartOptions,
}

impl PayloadAssembler {
    /// Create an assembler from a resolver and chart options.
    pub fn new(resolver: ColumnResolver, options: ChartOptions) -> Self {
        Self { resolver, options }
    }

    /// Create an assembler from the `[resolver]` and `[charts]` config sections.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ColumnResolver::new(RoleKeywords::from(&config.resolver)),
            ChartOptions::from(&config.charts),
        )
    }

    /// The resolver used by this assembler.
    pub fn resolver(&self) -> &ColumnResolver {
        &self.resolver
    }

    /// Resolve roles and build the payload.
    pub fn assemble(&self, dataset: &Dataset) -> Payload {
        let roles = self.resolver.resolve(dataset.columns());
        self.assemble_with_roles(dataset, &roles)
    }

    /// Build the payload from an already resolved role mapping.
    pub fn assemble_with_roles(&self, dataset: &Dataset, roles: &RoleMapping) -> Payload {
        let options = &self.options;
        let mut degraded = Vec::new();

        for role in roles.unresolved() {
            debug!("Role {} unresolved, aggregators will degrade", role);
        }

        let polar = guarded("polar", &mut degraded, Distribution::default, || {
            aggregator::distribution(dataset, roles, options)
        });
        let evolution = guarded("evolution", &mut degraded, Evolution::default, || {
            aggregator::evolution(dataset, roles, options)
        });
        let scatter = guarded("scatter", &mut degraded, Efficiency::default, || {
            aggregator::efficiency(dataset, roles)
        });
        let big4 = guarded("big4", &mut degraded, Marquee::placeholder, || {
            aggregator::marquee(dataset, roles, options)
        });
        let year_range = guarded("meta.yearRange", &mut degraded, unknown_range, || {
            aggregator::year_range(dataset, roles)
        });

        Payload {
            polar,
            evolution,
            scatter,
            big4,
            meta: PayloadMeta {
                row_count: dataset.row_count(),
                column_names: dataset.columns().to_vec(),
                year_range,
                roles: roles.clone(),
                degraded,
            },
        }
    }
}

fn unknown_range() -> String {
    UNKNOWN_LABEL.to_string()
}

/// Run one section, substituting `fallback` if it panics.
fn guarded<T>(
    section: &str,
    degraded: &mut Vec<String>,
    fallback: impl FnOnce() -> T,
    build: impl FnOnce() -> T,
) -> T {
    match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(value) => value,
        Err(cause) => {
            let message = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("Section {} failed, using degraded shape: {}", section, message);
            degraded.push(section.to_string());
            fallback()
        }
    }
}
