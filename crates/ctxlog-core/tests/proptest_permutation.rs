// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use ctxlog_core::{compare_logs, CanonicalLog};

// Seed pinned so failures reproduce across machines. Override locally with
// PROPTEST_SEED when exploring.
const SEED_BYTES: [u8; 32] = [
    0x7c, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0,
];

fn runner() -> TestRunner {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    TestRunner::new_with_rng(PropConfig::default(), rng)
}

/// One block of lines per context; context `i` owns `blocks[i]`.
fn context_blocks() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z0-9 =.]{0,12}", 1..6), 1..6).prop_map(
        |blocks| {
            blocks
                .into_iter()
                .enumerate()
                .map(|(ctx, payloads)| {
                    payloads
                        .into_iter()
                        .enumerate()
                        .map(|(step, p)| format!("ctx {ctx}: #{step} {p}\n"))
                        .collect()
                })
                .collect()
        },
    )
}

/// Interleaves blocks by repeatedly taking the head of the block chosen by
/// `picks`, preserving each block's internal order.
fn interleave(blocks: &[Vec<String>], picks: &[usize]) -> String {
    let mut cursors = vec![0usize; blocks.len()];
    let mut out = String::new();
    let mut picks = picks.iter().copied().cycle();
    let total: usize = blocks.iter().map(Vec::len).sum();
    for _ in 0..total {
        let start = picks.next().unwrap_or(0) % blocks.len();
        let ctx = (0..blocks.len())
            .map(|k| (start + k) % blocks.len())
            .find(|&c| cursors[c] < blocks[c].len())
            .unwrap();
        out.push_str(&blocks[ctx][cursors[ctx]]);
        cursors[ctx] += 1;
    }
    out
}

#[test]
fn proptest_cross_context_interleavings_canonicalize_equal() {
    let strategy = context_blocks().prop_flat_map(|blocks| {
        let picks = prop::collection::vec(any::<usize>(), 1..32);
        (Just(blocks), picks.clone(), picks)
    });

    runner()
        .run(&strategy, |(blocks, picks_a, picks_b)| {
            let a = interleave(&blocks, &picks_a);
            let b = interleave(&blocks, &picks_b);
            let verdict = compare_logs(CanonicalLog::from_text(&a), CanonicalLog::from_text(&b));
            prop_assert!(verdict.is_match(), "a:\n{a}\nb:\n{b}");
            Ok(())
        })
        .unwrap();
}

#[test]
fn proptest_whole_block_permutations_canonicalize_equal() {
    let strategy = context_blocks().prop_flat_map(|blocks| {
        let shuffled = Just(blocks.clone()).prop_shuffle();
        (Just(blocks), shuffled)
    });

    runner()
        .run(&strategy, |(blocks, shuffled)| {
            let a: String = blocks.concat().concat();
            let b: String = shuffled.concat().concat();
            prop_assert_eq!(CanonicalLog::from_text(&a), CanonicalLog::from_text(&b));
            Ok(())
        })
        .unwrap();
}

#[test]
fn proptest_within_context_swap_is_detected() {
    let strategy = context_blocks()
        .prop_filter("need a context with two lines", |blocks| {
            blocks.iter().any(|b| b.len() >= 2)
        })
        .prop_flat_map(|blocks| {
            let picks = prop::collection::vec(any::<usize>(), 1..32);
            (Just(blocks), picks, any::<prop::sample::Index>())
        });

    runner()
        .run(&strategy, |(blocks, picks, which)| {
            let candidates: Vec<usize> = (0..blocks.len()).filter(|&i| blocks[i].len() >= 2).collect();
            let ctx = candidates[which.index(candidates.len())];
            let mut swapped = blocks.clone();
            swapped[ctx].swap(0, 1);

            let a = interleave(&blocks, &picks);
            let b = interleave(&swapped, &picks);
            let verdict = compare_logs(CanonicalLog::from_text(&a), CanonicalLog::from_text(&b));
            prop_assert!(!verdict.is_match());
            Ok(())
        })
        .unwrap();
}

#[test]
fn proptest_canonicalization_is_idempotent_with_noise() {
    let strategy = (
        context_blocks(),
        prop::collection::vec(any::<usize>(), 1..32),
        prop::collection::vec("[A-Z][a-z ]{0,10}", 0..4),
    );

    runner()
        .run(&strategy, |(blocks, picks, noise)| {
            let mut text = interleave(&blocks, &picks);
            for n in &noise {
                text.push_str(n);
                text.push('\n');
            }
            let first = CanonicalLog::from_text(&text);
            let second = CanonicalLog::from_text(&text);
            prop_assert_eq!(first.render(), second.render());
            prop_assert_eq!(first.len(), text.lines().count());
            Ok(())
        })
        .unwrap();
}
