//! End-to-end sketch: Karate Club → shuffled edge batches → link batches.
//!
//! No model is trained here; the point is to exercise every seam a
//! data-parallel link-prediction loop touches:
//! - contiguous per-rank sharding of the edge ids
//! - per-epoch reshuffling with a derived seed
//! - degree-weighted negatives + two-layer sampled blocks per batch
//!
//! Run with `RUST_LOG=fanout=debug` to see per-batch sampling sizes.

use fanout::{
    epoch_seed, minibatches, rank_seed, sample_link_batches, shard_range, CsrGraph, EdgeType,
    Fanout, Graph, HeteroGraph, HeteroNegativeSampler, LinkPredictionSampler, LoaderConfig,
    NegativeSamplerConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Zachary's Karate Club, 34 nodes, 78 undirected edges, as
/// `node: neighbors` lines listing each edge once from its lower endpoint.
const KARATE: &str = "
0: 1 2 3 4 5 6 7 8 10 11 12 13 17 19 21 31
1: 2 3 7 13 17 19 21 30
2: 3 7 8 9 13 27 28 32
3: 7 12 13
4: 6 10
5: 6 10 16
6: 16
8: 30 32 33
9: 33
13: 33
14: 32 33
15: 32 33
18: 32 33
19: 33
20: 32 33
22: 32 33
23: 25 27 29 32 33
24: 25 27 31
25: 31
26: 29 33
27: 33
28: 31 33
29: 32 33
30: 32 33
31: 32 33
32: 33
";

fn parse_adjacency(text: &str) -> Result<Vec<(usize, usize)>, Box<dyn std::error::Error>> {
    let mut edges = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (node, neighbors) =
            line.split_once(':').ok_or_else(|| format!("missing ':' in {line:?}"))?;
        let u: usize = node.trim().parse()?;
        for v in neighbors.split_whitespace() {
            edges.push((u, v.parse()?));
        }
    }
    Ok(edges)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let edges = parse_adjacency(KARATE)?;
    let graph = CsrGraph::undirected(34, &edges)?;
    info!(nodes = graph.node_count(), edges = graph.edge_count(), "loaded karate club");

    let sampler = LinkPredictionSampler::new(
        &graph,
        vec![Fanout::Limit(10), Fanout::Limit(5)],
        NegativeSamplerConfig { k: 5, exponent: 0.75 },
    )?;

    let base_seed = 42u64;
    let world_size = 2;
    let edge_ids: Vec<usize> = (0..graph.edge_count()).collect();

    // Ranks would be separate processes; here they just run one after another.
    for rank in 0..world_size {
        let shard = &edge_ids[shard_range(edge_ids.len(), rank, world_size)?];
        let seed = rank_seed(base_seed, rank);

        for epoch in 0..2u64 {
            let cfg = LoaderConfig {
                batch_size: 16,
                seed: epoch_seed(seed, epoch),
                ..Default::default()
            };
            let batches = minibatches(shard, cfg)?;
            let out = sample_link_batches(&sampler, &batches, cfg.seed)?;

            let inputs: usize = out.iter().map(|b| b.input_nodes().len()).sum();
            let negatives: usize = out.iter().map(|b| b.neg_pairs.len()).sum();
            info!(
                rank,
                epoch,
                batches = out.len(),
                mean_inputs = inputs as f64 / out.len().max(1) as f64,
                negatives,
                "epoch sampled"
            );
        }
    }

    // Heterogeneous variant: members "attend" the two clubs after the split.
    let mut hg = HeteroGraph::new();
    hg.set_num_nodes("member", 34);
    hg.set_num_nodes("club", 2);
    let attends = EdgeType::new("member", "attends", "club");
    let attendance: Vec<(usize, usize)> = (0..34).map(|m| (m, usize::from(m >= 17))).collect();
    hg.add_edges(&attends, &attendance)?;

    let typed = HeteroNegativeSampler::new(&hg, 3)?;
    let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
    let neg = typed.sample(&attends, &[0, 20], &mut rng)?;
    info!(edge_type = %attends, negatives = ?neg.pairs().collect::<Vec<_>>(), "typed negatives");

    Ok(())
}
