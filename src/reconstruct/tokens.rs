//! Grouping of recognition tokens into blocks.

use std::collections::BTreeMap;

use crate::geometry::BBox;
use crate::model::{AggregatedBlock, RecognitionToken};

/// Groups recognizer tokens by block id.
#[derive(Debug, Clone, Copy)]
pub struct TokenAggregator {
    margin: u32,
}

impl TokenAggregator {
    /// Create an aggregator that pads each block's region by `margin` pixels.
    pub fn new(margin: u32) -> Self {
        Self { margin }
    }

    /// Aggregate tokens into blocks, ordered by ascending block id.
    ///
    /// Tokens with no confidence or blank text are discarded; a block left
    /// with no tokens is not emitted.
    pub fn aggregate(&self, tokens: &[RecognitionToken]) -> Vec<AggregatedBlock> {
        let mut groups: BTreeMap<u32, Vec<&RecognitionToken>> = BTreeMap::new();
        for token in tokens.iter().filter(|t| t.is_usable()) {
            groups.entry(token.block).or_default().push(token);
        }

        groups
            .into_iter()
            .filter_map(|(block, members)| self.build_block(block, &members))
            .collect()
    }

    fn build_block(&self, block: u32, members: &[&RecognitionToken]) -> Option<AggregatedBlock> {
        let boxes: Vec<BBox> = members.iter().map(|t| t.bbox()).collect();
        let bbox = BBox::union_all(&boxes)?;

        let total: i64 = members.iter().map(|t| i64::from(t.confidence)).sum();
        let mean_confidence = total as f64 / members.len() as f64;

        let text = members
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Some(AggregatedBlock {
            block,
            text,
            mean_confidence,
            bbox,
            region: bbox.expand(self.margin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NO_CONFIDENCE;

    fn token(text: &str, conf: i32, x: u32, y: u32, block: u32) -> RecognitionToken {
        RecognitionToken::new(text, conf, BBox::from_xywh(x, y, 10, 10), block)
    }

    #[test]
    fn test_token_text_joined_as_returned() {
        let tokens = vec![token("x ", 40, 0, 0, 2), token(" = 1", 40, 12, 0, 2)];
        let blocks = TokenAggregator::new(0).aggregate(&tokens);
        assert_eq!(blocks[0].text, "x   = 1");
    }

    #[test]
    fn test_aggregate_groups_and_orders() {
        let tokens = vec![
            token("b", 60, 50, 50, 2),
            token("hello", 80, 10, 10, 1),
            token("world", 90, 30, 10, 1),
        ];
        let blocks = TokenAggregator::new(5).aggregate(&tokens);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block, 1);
        assert_eq!(blocks[0].text, "hello world");
        assert_eq!(blocks[0].mean_confidence, 85.0);
        assert_eq!(blocks[0].bbox, BBox::new(10, 10, 40, 20));
        assert_eq!(blocks[0].region, BBox::new(5, 5, 45, 25));
        assert_eq!(blocks[1].block, 2);
    }

    #[test]
    fn test_discards_unusable_tokens() {
        let tokens = vec![
            token("x", NO_CONFIDENCE, 0, 0, 1),
            token(" ", 99, 0, 0, 1),
            token("kept", 40, 0, 0, 2),
            token("", 10, 0, 0, 2),
        ];
        let blocks = TokenAggregator::new(0).aggregate(&tokens);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block, 2);
        assert_eq!(blocks[0].text, "kept");
        assert_eq!(blocks[0].mean_confidence, 40.0);
    }

    #[test]
    fn test_region_clamped_at_zero() {
        let blocks = TokenAggregator::new(5).aggregate(&[token("e", 30, 2, 3, 1)]);
        assert_eq!(blocks[0].region, BBox::new(0, 0, 17, 18));
    }

    #[test]
    fn test_empty_input() {
        assert!(TokenAggregator::new(5).aggregate(&[]).is_empty());
    }
}
