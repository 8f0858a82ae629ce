//! Edge construction and traversal for similarity networks.
// Copyright (c) 2025 10x Genomics, Inc. All rights reserved.

use crate::pool::{NetworkParams, SharedRepertoire};
use petgraph::prelude::*;
use rayon::prelude::*;
use repertoire_types::{DetHashMap, MetadataMap, Repertoire, Result};
use serde::{Deserialize, Serialize};

/// An undirected edge between two pool members, weighted by Hamming
/// distance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    /// Pool index of the smaller endpoint.
    pub a: u32,
    /// Pool index of the larger endpoint.
    pub b: u32,
    /// Hamming distance between the endpoint sequences.
    pub distance: u32,
}

/// A similarity network over a pooled repertoire. Nodes are pool
/// members; an edge connects two members whose sequences have equal
/// length and Hamming distance in `1..=max_errors`. Sequences of
/// differing length are never connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityGraph {
    shared: SharedRepertoire,
    edges: Vec<SimilarityEdge>,
    adjacency: Vec<Vec<u32>>,
}

impl SimilarityGraph {
    /// Build the network over `shared` with the given distance cutoff.
    /// Node pairs are scanned in parallel within equal-length groups;
    /// edge order is independent of the scan schedule.
    pub fn build(shared: SharedRepertoire, max_errors: u32) -> SimilarityGraph {
        let members = shared.members();
        let mut by_length: DetHashMap<usize, Vec<u32>> = DetHashMap::default();
        for (index, member) in members.iter().enumerate() {
            by_length
                .entry(member.sequence.len())
                .or_default()
                .push(index as u32);
        }
        let buckets: Vec<Vec<u32>> = by_length.into_values().collect();
        let anchors: Vec<(&[u32], usize)> = buckets
            .iter()
            .flat_map(|bucket| (0..bucket.len()).map(move |pos| (bucket.as_slice(), pos)))
            .collect();

        let results: Vec<Vec<SimilarityEdge>> = anchors
            .par_iter()
            .map(|&(bucket, pos)| {
                let mut edges = Vec::new();
                let a = bucket[pos];
                let seq_a = members[a as usize].sequence.as_bytes();
                for &b in &bucket[pos + 1..] {
                    let seq_b = members[b as usize].sequence.as_bytes();
                    let distance = triple_accel::hamming(seq_a, seq_b);
                    if distance > 0 && distance <= max_errors {
                        edges.push(SimilarityEdge { a, b, distance });
                    }
                }
                edges
            })
            .collect();
        let mut edges: Vec<SimilarityEdge> = results.into_iter().flatten().collect();
        edges.sort_unstable_by_key(|edge| (edge.a, edge.b));

        let mut adjacency = vec![Vec::new(); members.len()];
        for edge in &edges {
            adjacency[edge.a as usize].push(edge.b);
            adjacency[edge.b as usize].push(edge.a);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }
        log::info!(
            "similarity network has {} nodes and {} edges",
            members.len(),
            edges.len()
        );
        SimilarityGraph {
            shared,
            edges,
            adjacency,
        }
    }

    /// The pooled repertoire the network was built over.
    pub fn shared(&self) -> &SharedRepertoire {
        &self.shared
    }

    pub fn node_count(&self) -> usize {
        self.shared.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges sorted by endpoint pair, each with `a < b`.
    pub fn edges(&self) -> &[SimilarityEdge] {
        &self.edges
    }

    /// Neighbors of a node, in ascending index order.
    pub fn neighbors(&self, node: u32) -> &[u32] {
        &self.adjacency[node as usize]
    }

    pub fn degree(&self, node: u32) -> usize {
        self.adjacency[node as usize].len()
    }

    /// Connected components, each a sorted list of node indices, ordered
    /// by their smallest member. Isolated nodes form singletons.
    pub fn components(&self) -> Vec<Vec<u32>> {
        let mut comp = Vec::new();
        let mut used = vec![false; self.node_count()];
        for v in 0..self.node_count() {
            if used[v] {
                continue;
            }
            let mut c: Vec<u32> = Vec::new();
            let mut cnext: Vec<u32> = vec![v as u32];
            while let Some(w) = cnext.pop() {
                if used[w as usize] {
                    continue;
                }
                used[w as usize] = true;
                c.push(w);
                cnext.extend_from_slice(&self.adjacency[w as usize]);
            }
            c.sort_unstable();
            comp.push(c);
        }
        comp
    }

    /// Export as a petgraph graph. Node weights are pool indices and
    /// edge weights are Hamming distances.
    pub fn to_petgraph(&self) -> UnGraph<u32, u32> {
        let mut graph = UnGraph::with_capacity(self.node_count(), self.edges.len());
        let nodes: Vec<NodeIndex> = (0..self.node_count() as u32)
            .map(|index| graph.add_node(index))
            .collect();
        for edge in &self.edges {
            graph.add_edge(nodes[edge.a as usize], nodes[edge.b as usize], edge.distance);
        }
        graph
    }
}

/// Pool shared clonotypes and build their similarity network in one
/// step.
pub fn build_network(
    repertoires: &[Repertoire],
    metadata: &MetadataMap,
    params: &NetworkParams,
) -> Result<SimilarityGraph> {
    let shared = SharedRepertoire::build(repertoires, metadata, params)?;
    Ok(SimilarityGraph::build(shared, params.max_errors))
}
