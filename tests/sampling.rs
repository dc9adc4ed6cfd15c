use fanout::{
    sample_link_batches, Block, BlockSampler, CsrGraph, EdgeId, Error, Fanout, Graph,
    LinkPredictionSampler, NegativeSampler, NegativeSamplerConfig, NodeId,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn path5() -> CsrGraph {
    CsrGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap()
}

fn fanout_limit(f: Fanout) -> usize {
    match f {
        Fanout::Limit(k) => k,
        Fanout::All => usize::MAX,
    }
}

fn dedup(nodes: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    nodes.iter().copied().filter(|v| seen.insert(*v)).collect()
}

/// Structural checks every block chain must satisfy.
fn assert_blocks_sane(g: &CsrGraph, blocks: &[Block], seeds: &[NodeId], fanouts: &[Fanout]) {
    assert_eq!(blocks.len(), fanouts.len());
    assert_eq!(blocks.last().unwrap().dst_nodes, dedup(seeds), "last block must end at the seeds");

    for i in 1..blocks.len() {
        assert_eq!(
            blocks[i - 1].dst_nodes,
            blocks[i].src_nodes,
            "block {} destinations must be block {i} sources",
            i - 1
        );
    }

    for (block, &fanout) in blocks.iter().zip(fanouts) {
        let distinct_src: HashSet<_> = block.src_nodes.iter().collect();
        assert_eq!(distinct_src.len(), block.src_nodes.len(), "src nodes must be distinct");
        assert_eq!(block.edges.len(), block.edge_ids.len());

        let limit = fanout_limit(fanout);
        let per_dst = block.in_degrees();
        for (d_local, &v) in block.dst_nodes.iter().enumerate() {
            assert_eq!(per_dst[d_local], g.in_degree(v).min(limit));
        }
        assert!(block.num_edges() <= block.num_dst_nodes().saturating_mul(limit));

        let mut seen_edges = HashSet::new();
        for (&(s_local, d_local), &e) in block.edges.iter().zip(&block.edge_ids) {
            assert!(seen_edges.insert(e), "edge {e} sampled twice");
            let (s, d) = g.edge_endpoints(e).unwrap();
            assert_eq!(block.src_nodes[s_local], s);
            assert_eq!(block.dst_nodes[d_local], d);
        }
    }
}

#[test]
fn path_graph_single_predecessor_scenario() {
    let g = path5();
    let sampler = BlockSampler::new(&g, vec![Fanout::Limit(2)]).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let blocks = sampler.sample_blocks(&[4], &mut rng).unwrap();
    assert_eq!(blocks[0].src_nodes, vec![3]);
    assert_eq!(blocks[0].dst_nodes, vec![4]);
}

#[test]
fn k5_single_positive_scenario() {
    let g = path5();
    let sampler = NegativeSampler::new(&g, 5).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    // Edge 0 is (0, 1).
    let neg = sampler.sample(&[0], &mut rng).unwrap();
    assert_eq!(neg.src, vec![0; 5]);
    assert_eq!(neg.dst.len(), 5);
    assert!(neg.dst.iter().all(|&v| v < 5));
}

#[test]
fn negative_destinations_follow_degree_power() {
    // In-degrees: [0, 1, 2, 4, 8].
    let mut edges = Vec::new();
    for (v, deg) in [(1usize, 1usize), (2, 2), (3, 4), (4, 8)] {
        edges.extend(std::iter::repeat((0usize, v)).take(deg));
    }
    let g = CsrGraph::from_edges(5, &edges).unwrap();

    let trials = 200_000usize;
    let sampler = NegativeSampler::new(&g, trials).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let neg = sampler.sample(&[0], &mut rng).unwrap();

    let mut counts = [0usize; 5];
    for &v in &neg.dst {
        counts[v] += 1;
    }

    let w: Vec<f64> = [0.0f64, 1.0, 2.0, 4.0, 8.0].iter().map(|d| d.powf(0.75)).collect();
    let total: f64 = w.iter().sum();
    for v in 0..5 {
        let expected = w[v] / total;
        let observed = counts[v] as f64 / trials as f64;
        assert!(
            (observed - expected).abs() < 0.01,
            "node {v}: observed {observed:.4}, expected {expected:.4}"
        );
    }
    assert_eq!(counts[0], 0, "zero in-degree node must never be drawn");
}

#[test]
fn fanout_above_degree_returns_every_parallel_edge_once() {
    // Two parallel edges 0 -> 2 and one 1 -> 2.
    let g = CsrGraph::from_edges(3, &[(0, 2), (0, 2), (1, 2)]).unwrap();
    let sampler = BlockSampler::new(&g, vec![Fanout::Limit(10)]).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let blocks = sampler.sample_blocks(&[2], &mut rng).unwrap();

    assert_eq!(blocks[0].edge_ids, vec![0, 1, 2]);
    assert_eq!(blocks[0].src_nodes, vec![0, 1]);
    assert_eq!(blocks[0].in_degrees(), vec![3]);
}

#[test]
fn seeded_block_sampling_is_reproducible() {
    let g = CsrGraph::undirected(
        8,
        &[(0, 1), (0, 2), (0, 3), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 7), (7, 0), (2, 6)],
    )
    .unwrap();
    let sampler = BlockSampler::new(&g, vec![Fanout::Limit(2), Fanout::Limit(2)]).unwrap();

    let a = sampler.sample_blocks(&[0, 5], &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
    let b = sampler.sample_blocks(&[0, 5], &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
    assert_eq!(a, b);
    assert_blocks_sane(&g, &a, &[0, 5], sampler.fanouts());
}

#[test]
fn full_neighborhood_takes_all_in_edges() {
    let g = CsrGraph::undirected(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
    let sampler = BlockSampler::full(&g, 1).unwrap();
    let blocks = sampler.sample_blocks(&[0], &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
    assert_eq!(blocks[0].num_edges(), 3);
    let mut src = blocks[0].src_nodes.clone();
    src.sort_unstable();
    assert_eq!(src, vec![1, 2, 3]);
}

/// An adapter that knows edge endpoints but exposes no in-edge index, so every
/// node reports in-degree zero.
struct EdgeListOnly {
    n: usize,
    edges: Vec<(NodeId, NodeId)>,
}

impl Graph for EdgeListOnly {
    fn node_count(&self) -> usize {
        self.n
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(edge).copied()
    }

    fn in_edges_ref(&self, _node: NodeId) -> &[EdgeId] {
        &[]
    }
}

#[test]
fn zero_mass_distribution_yields_empty_negatives() {
    let g = EdgeListOnly { n: 3, edges: vec![(0, 1), (1, 2)] };
    let sampler = NegativeSampler::new(&g, 4).unwrap();
    assert!(sampler.probabilities().iter().all(|&p| p == 0.0));

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let neg = sampler.sample(&[0, 1], &mut rng).unwrap();
    assert!(neg.is_empty());

    // Edge ids are still validated.
    assert!(matches!(sampler.sample(&[5], &mut rng), Err(Error::IndexOutOfBounds { .. })));
}

#[test]
fn link_batches_cover_an_epoch() {
    let g = CsrGraph::undirected(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]).unwrap();
    let sampler = LinkPredictionSampler::new(
        &g,
        vec![Fanout::Limit(3), Fanout::Limit(3)],
        NegativeSamplerConfig { k: 2, exponent: 0.75 },
    )
    .unwrap();
    let cfg = fanout::LoaderConfig { batch_size: 4, ..Default::default() };
    let batches = fanout::edge_minibatches(&g, cfg).unwrap();
    let out = sample_link_batches(&sampler, &batches, 1).unwrap();

    assert_eq!(out.len(), batches.len());
    let total_pos: usize = out.iter().map(|b| b.pos_pairs.len()).sum();
    assert_eq!(total_pos, g.edge_count());
    for b in &out {
        assert_eq!(b.neg_pairs.len(), 2 * b.pos_pairs.len());
        assert_blocks_sane(&g, &b.blocks, &b.seed_nodes, sampler.block_sampler().fanouts());
    }
}

proptest! {
    // Property: negative batches have exactly k entries per positive, each
    // repeating that positive's source, with in-range destinations.
    #[test]
    fn prop_negative_shape(
        n in 1usize..10,
        raw_edges in prop::collection::vec((0usize..10, 0usize..10), 1..30),
        k in 1usize..6,
        picks in prop::collection::vec(0usize..30, 1..8),
        seed in any::<u64>(),
    ) {
        let edges: Vec<(usize, usize)> = raw_edges.iter().map(|&(s, d)| (s % n, d % n)).collect();
        let g = CsrGraph::from_edges(n, &edges).unwrap();
        let pos: Vec<EdgeId> = picks.iter().map(|&p| p % edges.len()).collect();

        let sampler = NegativeSampler::new(&g, k).unwrap();
        let neg = sampler.sample(&pos, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();

        prop_assert_eq!(neg.len(), pos.len() * k);
        for (i, &e) in pos.iter().enumerate() {
            let (s, _) = g.edge_endpoints(e).unwrap();
            prop_assert!(neg.src[i * k..(i + 1) * k].iter().all(|&x| x == s));
        }
        for &v in &neg.dst {
            prop_assert!(v < n);
            prop_assert!(g.in_degree(v) > 0, "zero-weight node {} drawn", v);
        }
    }

    // Property: block chains are well-formed and bounded by the fanout for any
    // graph, seed set, and fanout list.
    #[test]
    fn prop_block_chain_is_well_formed(
        n in 1usize..10,
        raw_edges in prop::collection::vec((0usize..10, 0usize..10), 0..40),
        raw_fanouts in prop::collection::vec(-1i64..4, 1..4),
        raw_seeds in prop::collection::vec(0usize..10, 1..6),
        seed in any::<u64>(),
    ) {
        let edges: Vec<(usize, usize)> = raw_edges.iter().map(|&(s, d)| (s % n, d % n)).collect();
        let g = CsrGraph::from_edges(n, &edges).unwrap();
        let fanouts: Vec<Fanout> = raw_fanouts
            .iter()
            .map(|&f| Fanout::try_from(if f == 0 { 1 } else { f }).unwrap())
            .collect();
        let seeds: Vec<NodeId> = raw_seeds.iter().map(|&s| s % n).collect();

        let sampler = BlockSampler::new(&g, fanouts.clone()).unwrap();
        let a = sampler.sample_blocks(&seeds, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        assert_blocks_sane(&g, &a, &seeds, &fanouts);

        let b = sampler.sample_blocks(&seeds, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_is_thread_count_invariant() {
    use fanout::sample_link_batches_parallel;

    let g = CsrGraph::undirected(
        8,
        &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 7), (7, 0), (0, 4), (2, 6)],
    )
    .unwrap();
    let sampler = LinkPredictionSampler::new(
        &g,
        vec![Fanout::Limit(2), Fanout::Limit(2)],
        NegativeSamplerConfig::default(),
    )
    .unwrap();
    let ids: Vec<EdgeId> = (0..g.edge_count()).collect();
    let batches: Vec<Vec<EdgeId>> = ids.chunks(3).map(<[EdgeId]>::to_vec).collect();

    let pool1 = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let pool4 = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();

    let p1 = pool1.install(|| sample_link_batches_parallel(&sampler, &batches, 77)).unwrap();
    let p4 = pool4.install(|| sample_link_batches_parallel(&sampler, &batches, 77)).unwrap();
    assert_eq!(p1, p4, "parallel output must be thread-count invariant");

    let seq = sample_link_batches(&sampler, &batches, 77).unwrap();
    assert_eq!(p1, seq, "parallel output must match the sequential path");
}
