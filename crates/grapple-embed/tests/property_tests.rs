//! Property-based tests for corpus preparation.

use grapple_embed::skipgram::Vocabulary;
use grapple_embed::walklets::select_walklets;
use proptest::prelude::*;

fn arb_corpus() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..20, 1..30), 1..10)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn vocabulary_counts_cover_corpus(corpus in arb_corpus()) {
        let vocab = Vocabulary::build(&corpus, 1);
        let total: usize = corpus.iter().map(Vec::len).sum();
        prop_assert_eq!(vocab.counts().iter().sum::<u64>() as usize, total);
        for sentence in &corpus {
            prop_assert_eq!(vocab.encode(sentence).len(), sentence.len());
        }
    }

    #[test]
    fn min_count_filters_rare_tokens(corpus in arb_corpus(), min_count in 1usize..5) {
        let vocab = Vocabulary::build(&corpus, min_count);
        prop_assert!(vocab.counts().iter().all(|&c| c >= min_count as u64));
    }

    #[test]
    fn walklets_step_through_the_walk(
        walk in prop::collection::vec(0usize..50, 1..40),
        power in 1usize..6,
    ) {
        let walklets = select_walklets(std::slice::from_ref(&walk), power);
        prop_assert!(walklets.len() <= power + 1);
        for (offset, walklet) in walklets.iter().enumerate() {
            for (i, &node) in walklet.iter().enumerate() {
                prop_assert_eq!(node, walk[offset + i * power]);
            }
        }
    }

    #[test]
    fn power_one_keeps_whole_walk(walk in prop::collection::vec(0usize..50, 1..40)) {
        let walklets = select_walklets(std::slice::from_ref(&walk), 1);
        prop_assert_eq!(&walklets[0], &walk);
    }
}
