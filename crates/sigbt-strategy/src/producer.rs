use std::collections::BTreeMap;

use sigbt_md::Candle;

use crate::anchor_lag::AnchorLagStrategy;
use crate::types::{Signal, StrategyError, StrategyMetadata};

/// Opaque signal producer.
///
/// `anchors` is keyed by anchor symbol as declared in [`StrategyMetadata`].
/// Output order follows the target series; timestamps a producer cannot
/// evaluate (e.g. missing anchor data) are simply not emitted.
pub trait SignalProducer {
    fn name(&self) -> &str;

    fn metadata(&self) -> StrategyMetadata;

    fn generate(
        &self,
        target: &[Candle],
        anchors: &BTreeMap<String, Vec<Candle>>,
    ) -> Result<Vec<Signal>, StrategyError>;
}

/// Registry of built-in producers.
pub fn producer_by_name(name: &str) -> Result<Box<dyn SignalProducer>, StrategyError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "anchor-lag" | "anchor_lag" => Ok(Box::new(AnchorLagStrategy::default())),
        other => Err(StrategyError::UnknownProducer(other.to_string())),
    }
}
