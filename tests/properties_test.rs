//! Property tests for text handling and page ordering.

use docrecon::geometry::BBox;
use docrecon::model::{Decision, Line, PageContent, PrimitiveBlock, RawSpan, RecognitionToken};
use docrecon::reconstruct::{
    BlockClassifier, ReconstructOptions, ReconstructionPipeline, TokenAggregator,
};
use docrecon::render::{escape_latex, unescape_latex};
use docrecon::sanitize::{is_allowed_char, sanitize};
use docrecon::source::MemorySource;
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitize_is_idempotent(s in any::<String>()) {
        let once = sanitize(&s).into_owned();
        let twice = sanitize(&once).into_owned();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_keeps_only_allowed(s in any::<String>()) {
        let clean = sanitize(&s);
        prop_assert!(clean.chars().all(is_allowed_char));
        let kept: String = s.chars().filter(|&c| is_allowed_char(c)).collect();
        prop_assert_eq!(clean.as_ref(), kept.as_str());
    }

    #[test]
    fn latex_escape_round_trips(s in any::<String>()) {
        let clean = sanitize(&s).into_owned();
        prop_assert_eq!(unescape_latex(&escape_latex(&clean)), clean);
    }

    #[test]
    fn latex_escape_leaves_no_bare_specials(s in "[a-z&%$#_{}~^\\\\ \n]{0,40}") {
        let escaped = escape_latex(&s);
        for special in ['&', '%', '$', '#', '_', '~', '^', '\n'] {
            let bare = escaped
                .char_indices()
                .filter(|&(_, c)| c == special)
                .any(|(i, _)| i == 0 || !escaped[..i].ends_with('\\'));
            prop_assert!(!bare, "bare {:?} in {:?}", special, escaped);
        }
    }

    #[test]
    fn aggregated_blocks_are_sorted_and_padded(
        raw in prop::collection::vec((0u32..6, 0i32..100, 0u32..500, 0u32..500, 1u32..50, 1u32..50), 0..40),
        margin in 0u32..20,
    ) {
        let tokens: Vec<RecognitionToken> = raw
            .iter()
            .map(|&(block, conf, x, y, w, h)| RecognitionToken::new("t", conf, BBox::from_xywh(x, y, w, h), block))
            .collect();
        let blocks = TokenAggregator::new(margin).aggregate(&tokens);

        prop_assert!(blocks.windows(2).all(|w| w[0].block < w[1].block));
        for block in &blocks {
            prop_assert!(block.region.contains(&block.bbox));
            prop_assert!(block.mean_confidence >= 0.0 && block.mean_confidence < 100.0);
        }
    }

    #[test]
    fn classifier_splits_at_threshold(threshold in 0u32..=100, mean in 0.0f64..100.0) {
        let decision = BlockClassifier::new(threshold).decide(mean);
        if mean < f64::from(threshold) {
            prop_assert_eq!(decision, Decision::Formula);
        } else {
            prop_assert_eq!(decision, Decision::Literal);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn parallel_order_matches_sequential(failures in prop::collection::vec(any::<bool>(), 1..30)) {
        let mut source = MemorySource::new("prop");
        for (i, fail) in failures.iter().enumerate() {
            source = if *fail {
                source.with_failing_page("broken")
            } else {
                source.with_page(PageContent::Primitives(vec![PrimitiveBlock::text(vec![
                    Line::new(vec![RawSpan::new(format!("page {}", i), 11.0, "Serif")]),
                ])]))
            };
        }

        let sequential = ReconstructionPipeline::new(ReconstructOptions::new().sequential())
            .run(&source)
            .unwrap();
        let parallel = ReconstructionPipeline::new(ReconstructOptions::new().with_threads(3))
            .run(&source)
            .unwrap();

        prop_assert_eq!(&sequential.elements, &parallel.elements);
        let ok = failures.iter().filter(|f| !**f).count();
        let breaks = parallel.elements.iter().filter(|e| e.is_page_break()).count();
        prop_assert_eq!(breaks, ok.saturating_sub(1));
    }
}
