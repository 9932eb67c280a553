//! Property-based tests for the pairing processor

use capmatch_engine::*;
use proptest::prelude::*;

fn block_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ,.]{0,40}",
        (1u32..5, "[a-z ]{0,15}").prop_map(|(n, label)| format!("Figure {n}: {label}")),
        (1u32..5).prop_map(|n| format!("Table {n}")),
        (1u32..5, 1u32..3).prop_map(|(n, m)| format!("圖{n}-{m} 結構")),
        (1u32..5).prop_map(|n| format!("As shown in Figure {n}, it works.")),
        (1u32..5).prop_map(|n| format!("如表{n}所示。")),
        Just(String::new()),
    ]
}

fn document() -> impl Strategy<Value = Vec<TextBlock>> {
    prop::collection::vec(block_text(), 0..40).prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextBlock::new((i / 8) as u32, (i % 8) as u32, text))
            .collect()
    })
}

/// Property: output is identical across execution modes and runs
#[test]
fn proptest_deterministic_across_modes() {
    let processor = PairingProcessor::new().unwrap();
    proptest!(ProptestConfig::with_cases(64), |(blocks in document())| {
        let sequential = processor.process_with_mode(&blocks, ExecutionMode::Sequential).unwrap();
        let parallel = processor.process_with_mode(&blocks, ExecutionMode::Parallel).unwrap();
        let again = processor.process_with_mode(&blocks, ExecutionMode::Sequential).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&sequential).unwrap(),
            serde_json::to_string(&parallel).unwrap()
        );
        prop_assert_eq!(&sequential, &again);
    });
}

/// Property: pair counts are bounded, pairs are ordered, context excludes
/// the caption block and confidence lies in [0, 1]
#[test]
fn proptest_result_invariants() {
    let processor = PairingProcessor::new().unwrap();
    proptest!(|(blocks in document())| {
        let result = processor.process(&blocks).unwrap();
        let stats = &result.stats;

        prop_assert!(result.pairs.len() <= stats.total_candidates_raw);
        prop_assert!(stats.total_candidates_deduped <= stats.total_candidates_raw);
        prop_assert_eq!(stats.total_blocks_scanned, blocks.len());

        for pair in &result.pairs {
            let source = pair.candidate().source_block;
            prop_assert!((0.0..=1.0).contains(&pair.confidence));
            prop_assert!(pair
                .bundle
                .primary_context
                .iter()
                .all(|b| !(b.page == source.page && b.index == source.index)));
        }
        for window in result.pairs.windows(2) {
            prop_assert!(window[0].candidate().position() <= window[1].candidate().position());
            let same_key = window[0].kind() == window[1].kind()
                && window[0].candidate().number_key() == window[1].candidate().number_key();
            if same_key {
                prop_assert!(window[1].candidate().position() - window[0].candidate().position() > 1);
            }
        }
    });
}

/// Property: widening the window radius never removes a context block
#[test]
fn proptest_wider_window_superset() {
    proptest!(|(blocks in document(), radius in 1usize..5)| {
        let narrow = PairingProcessorBuilder::new()
            .context_window_radius(radius)
            .build()
            .unwrap()
            .process(&blocks)
            .unwrap();
        let wide = PairingProcessorBuilder::new()
            .context_window_radius(radius + 2)
            .build()
            .unwrap()
            .process(&blocks)
            .unwrap();

        prop_assert_eq!(narrow.pairs.len(), wide.pairs.len());
        for (n, w) in narrow.pairs.iter().zip(wide.pairs.iter()) {
            prop_assert!(n
                .bundle
                .primary_context
                .iter()
                .all(|block| w.bundle.primary_context.contains(block)));
        }
    });
}
