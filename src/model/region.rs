//! Recognition tokens and the blocks built from them.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// Confidence reported by recognizers for a token where nothing was detected.
pub const NO_CONFIDENCE: i32 = -1;

/// A word-level result from the text recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionToken {
    /// Recognized text
    pub text: String,

    /// Confidence 0-100, or -1 if nothing was detected
    pub confidence: i32,

    /// Left edge in page pixels
    pub left: u32,

    /// Top edge in page pixels
    pub top: u32,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Recognizer-assigned block id
    pub block: u32,
}

impl RecognitionToken {
    /// Create a token.
    pub fn new(text: impl Into<String>, confidence: i32, bbox: BBox, block: u32) -> Self {
        Self {
            text: text.into(),
            confidence,
            left: bbox.left,
            top: bbox.top,
            width: bbox.width(),
            height: bbox.height(),
            block,
        }
    }

    /// Bounding box of the token.
    pub fn bbox(&self) -> BBox {
        BBox::from_xywh(self.left, self.top, self.width, self.height)
    }

    /// Check whether the token counts toward its block.
    pub fn is_usable(&self) -> bool {
        self.confidence != NO_CONFIDENCE && !self.text.trim().is_empty()
    }
}

/// Tokens of one recognizer block, merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBlock {
    /// Block id
    pub block: u32,

    /// Token texts joined by single spaces
    pub text: String,

    /// Arithmetic mean of token confidences
    pub mean_confidence: f64,

    /// Tight union of token boxes
    pub bbox: BBox,

    /// `bbox` grown by the crop margin
    pub region: BBox,
}

/// Per-block outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Emit the recognized text as a paragraph
    Literal,
    /// Send the region to the formula recognizer
    Formula,
}

/// An aggregated block with its decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRegion {
    /// The aggregated block
    pub block: AggregatedBlock,

    /// Literal or formula
    pub decision: Decision,
}

impl ClassifiedRegion {
    /// Check if the region goes to the formula recognizer.
    pub fn is_formula(&self) -> bool {
        self.decision == Decision::Formula
    }
}
