//! Literal-versus-formula decision per block.

use crate::model::{AggregatedBlock, ClassifiedRegion, Decision};

/// Classifies blocks by mean recognition confidence.
///
/// Text recognizers return low confidence on mathematical notation, so a
/// block whose mean confidence falls strictly below the threshold is routed
/// to the formula recognizer.
#[derive(Debug, Clone, Copy)]
pub struct BlockClassifier {
    threshold: f64,
}

impl BlockClassifier {
    /// Create a classifier with a threshold in 0..=100.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: f64::from(threshold),
        }
    }

    /// Decide for a single mean confidence.
    pub fn decide(&self, mean_confidence: f64) -> Decision {
        if mean_confidence < self.threshold {
            Decision::Formula
        } else {
            Decision::Literal
        }
    }

    /// Classify one block.
    pub fn classify(&self, block: AggregatedBlock) -> ClassifiedRegion {
        let decision = self.decide(block.mean_confidence);
        ClassifiedRegion { block, decision }
    }

    /// Classify every block, keeping order.
    pub fn classify_all(&self, blocks: Vec<AggregatedBlock>) -> Vec<ClassifiedRegion> {
        blocks.into_iter().map(|b| self.classify(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn block(mean: f64) -> AggregatedBlock {
        let bbox = BBox::from_xywh(0, 0, 10, 10);
        AggregatedBlock {
            block: 1,
            text: "t".to_string(),
            mean_confidence: mean,
            bbox,
            region: bbox,
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let classifier = BlockClassifier::new(50);
        assert_eq!(classifier.decide(49.99), Decision::Formula);
        assert_eq!(classifier.decide(50.0), Decision::Literal);
        assert_eq!(classifier.decide(85.0), Decision::Literal);
    }

    #[test]
    fn test_extreme_thresholds() {
        assert_eq!(BlockClassifier::new(0).decide(0.0), Decision::Literal);
        assert_eq!(BlockClassifier::new(100).decide(99.5), Decision::Formula);
        assert_eq!(BlockClassifier::new(100).decide(100.0), Decision::Literal);
    }

    #[test]
    fn test_classify_all_keeps_order() {
        let regions = BlockClassifier::new(50).classify_all(vec![block(15.0), block(85.0)]);
        assert!(regions[0].is_formula());
        assert!(!regions[1].is_formula());
    }
}
