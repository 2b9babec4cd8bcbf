use std::io::Write;

use tempfile::NamedTempFile;

use resurge::engine::{run_query, QueryOutput};
use resurge::graph::types::RawEdge;
use resurge::kernel::{Bfs, Components, Sssp};
use resurge::{EngineConfig, Scheduling};

const UNREACHED: u64 = u64::MAX;

fn update_file(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

fn config(workers: usize) -> EngineConfig {
    EngineConfig {
        workers,
        threads: 2,
        ..EngineConfig::default()
    }
}

fn triangle() -> Vec<RawEdge> {
    vec![
        RawEdge::new(1, 2, 1),
        RawEdge::new(2, 3, 2),
        RawEdge::new(1, 3, 5),
    ]
}

fn chain() -> Vec<RawEdge> {
    vec![
        RawEdge::new(1, 2, 1),
        RawEdge::new(2, 3, 1),
        RawEdge::new(3, 4, 1),
        RawEdge::new(4, 5, 1),
    ]
}

fn two_cliques() -> Vec<RawEdge> {
    vec![
        RawEdge::new(1, 2, 1),
        RawEdge::new(1, 3, 1),
        RawEdge::new(2, 3, 1),
        RawEdge::new(4, 5, 1),
        RawEdge::new(4, 6, 1),
        RawEdge::new(5, 6, 1),
    ]
}

fn plain(output: &QueryOutput<u64>) -> Vec<(u64, u64)> {
    output.values.iter().map(|&(g, v)| (g.0, v)).collect()
}

#[test]
fn sssp_batch_on_triangle() {
    let output = run_query(&triangle(), &Sssp::new(1), &config(2)).unwrap();
    assert_eq!(plain(&output), vec![(1, 0), (2, 1), (3, 3)]);
    assert_eq!(output.stats.incremental_rounds, 0);
    assert_eq!(output.stats.reset_vertices, 0);
}

#[test]
fn sssp_deleting_an_unused_edge_changes_nothing() {
    let update = update_file("d 1 3\n");
    let cfg = config(2).with_updates(update.path());
    let output = run_query(&triangle(), &Sssp::new(1), &cfg).unwrap();
    assert_eq!(plain(&output), vec![(1, 0), (2, 1), (3, 3)]);
    // The parent of 3 is 2, so no dependency subtree is rooted at (1, 3).
    assert_eq!(output.stats.reset_vertices, 0);
}

#[test]
fn sssp_deleting_the_parent_edge_reroutes() {
    let update = update_file("d 2 3\n");
    let cfg = config(2).with_updates(update.path());
    let output = run_query(&triangle(), &Sssp::new(1), &cfg).unwrap();
    assert_eq!(plain(&output), vec![(1, 0), (2, 1), (3, 5)]);
    assert_eq!(output.stats.reset_vertices, 1);
}

#[test]
fn sssp_added_shortcut_wins() {
    let update = update_file("a 1 3 1\n");
    let cfg = config(2).with_updates(update.path());
    let output = run_query(&triangle(), &Sssp::new(1), &cfg).unwrap();
    assert_eq!(plain(&output), vec![(1, 0), (2, 1), (3, 1)]);
    assert_eq!(output.stats.reset_vertices, 0);
}

#[test]
fn sssp_chain_invalidation_clears_the_tail() {
    let update = update_file("d 2 3\n");
    let cfg = config(2).with_updates(update.path());
    let output = run_query(&chain(), &Sssp::new(1), &cfg).unwrap();
    assert_eq!(
        plain(&output),
        vec![
            (1, 0),
            (2, 1),
            (3, UNREACHED),
            (4, UNREACHED),
            (5, UNREACHED),
        ]
    );
    assert_eq!(output.stats.reset_vertices, 3);
}

#[test]
fn components_bridge_addition_merges_labels() {
    let update = update_file("a 3 4 _\n");
    let cfg = config(2).undirected().with_updates(update.path());
    let output = run_query(&two_cliques(), &Components::new(), &cfg).unwrap();
    assert_eq!(
        plain(&output),
        vec![(1, 1), (2, 1), (3, 1), (4, 1), (5, 1), (6, 1)]
    );
    assert_eq!(output.stats.reset_vertices, 0);
}

#[test]
fn components_severed_vertices_regrow_their_own_labels() {
    // Cutting 1 off the path 1-2-3 leaves {2, 3} to re-elect 2 as label.
    let edges = vec![
        RawEdge::new(1, 2, 1),
        RawEdge::new(2, 3, 1),
        RawEdge::new(4, 5, 1),
    ];
    let update = update_file("d 1 2\n");
    let cfg = config(2).undirected().with_updates(update.path());
    let output = run_query(&edges, &Components::new(), &cfg).unwrap();
    assert_eq!(plain(&output), vec![(1, 1), (2, 2), (3, 2), (4, 4), (5, 4)]);
    assert!(output.stats.reset_vertices >= 2);
}

#[test]
fn bfs_counts_hops_not_weights() {
    let edges = vec![
        RawEdge::new(1, 2, 10),
        RawEdge::new(2, 3, 10),
        RawEdge::new(1, 3, 50),
    ];
    let output = run_query(&edges, &Bfs::new(1), &config(2)).unwrap();
    assert_eq!(plain(&output), vec![(1, 0), (2, 1), (3, 1)]);
}

#[test]
fn empty_update_file_is_idempotent() {
    let update = update_file("# nothing to apply\n");
    let cfg = config(2).with_updates(update.path());
    let incremental = run_query(&triangle(), &Sssp::new(1), &cfg).unwrap();
    let batch = run_query(&triangle(), &Sssp::new(1), &config(2)).unwrap();
    assert_eq!(plain(&incremental), plain(&batch));
    assert_eq!(incremental.stats.reset_vertices, 0);
    assert!(incremental.stats.incremental_rounds >= 1);
}

#[test]
fn worker_counts_agree() {
    for workers in [1, 2, 3, 4] {
        let update = update_file("d 2 3\na 1 3 1\n");
        let cfg = config(workers).with_updates(update.path());
        let output = run_query(&triangle(), &Sssp::new(1), &cfg).unwrap();
        assert_eq!(
            plain(&output),
            vec![(1, 0), (2, 1), (3, 1)],
            "workers={workers}"
        );
    }
}

#[test]
fn scheduling_flavors_are_equivalent() {
    let update = update_file("d 2 3\n");
    for scheduling in [Scheduling::Chunked, Scheduling::WorkStealing] {
        let cfg = EngineConfig {
            workers: 2,
            threads: 3,
            scheduling,
            ..EngineConfig::default()
        }
        .with_updates(update.path());
        let output = run_query(&triangle(), &Sssp::new(1), &cfg).unwrap();
        assert_eq!(plain(&output), vec![(1, 0), (2, 1), (3, 5)]);
    }
}

#[test]
fn unreachable_source_yields_identity_everywhere() {
    let output = run_query(&triangle(), &Sssp::new(99), &config(2)).unwrap();
    assert_eq!(
        plain(&output),
        vec![(1, UNREACHED), (2, UNREACHED), (3, UNREACHED)]
    );
    assert_eq!(output.stats.batch_rounds, 1);
}
