//! Module for creating and analysing the commodity supply graph of a system
use crate::commodity::CommodityID;
use crate::component::ComponentID;
use crate::system::PtxSystem;
use crate::units::Flow;
use indexmap::{IndexMap, IndexSet};
use itertools::{Itertools, iproduct};
use log::warn;
use petgraph::Directed;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::fmt::Display;

/// A graph of the ways in which commodities can be supplied
type SupplyGraph = Graph<GraphNode, GraphEdge, Directed>;

#[derive(Eq, PartialEq, Clone, Hash, Debug)]
/// A node in the supply graph
enum GraphNode {
    /// A node representing a commodity
    Commodity(CommodityID),
    /// Everything that brings commodities in from outside the conversions
    Source,
}

impl Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphNode::Commodity(id) => write!(f, "{id}"),
            GraphNode::Source => write!(f, "SOURCE"),
        }
    }
}

#[derive(Eq, PartialEq, Clone, Hash, Debug)]
/// An edge in the supply graph
enum GraphEdge {
    /// The commodity can be bought, generated or is already in stock
    External,
    /// A storage which starts with charge it can release
    Storage(ComponentID),
    /// A conversion which consumes the source commodity and produces the target
    Conversion(ComponentID),
}

/// Creates a directed graph of commodity supply for a system.
///
/// There is an edge from the source node to every commodity which can be bought or generated or
/// which starts with some stock, and one for every storage which starts above its minimum state
/// of charge. There is an edge from commodity A to B for every conversion that
/// consumes A and produces B.
fn create_supply_graph(system: &PtxSystem) -> (SupplyGraph, IndexMap<GraphNode, NodeIndex>) {
    let mut graph = Graph::new();
    let mut node_indexes = IndexMap::new();
    let mut node = |graph: &mut SupplyGraph, weight: GraphNode| {
        *node_indexes
            .entry(weight.clone())
            .or_insert_with(|| graph.add_node(weight))
    };

    let source = node(&mut graph, GraphNode::Source);
    let sets = system.commodity_sets();
    for commodity in system.commodities().values() {
        let target = node(&mut graph, GraphNode::Commodity(commodity.id.clone()));
        let supplied = commodity.purchasable
            || commodity.available
            || commodity.available_quantity.value() > 0.0
            || sets.generated.contains(&commodity.id);
        if supplied {
            graph.add_edge(source, target, GraphEdge::External);
        }
    }

    for storage in system.iter_storages() {
        if storage.reserve() > Flow(0.0) {
            let target = node(
                &mut graph,
                GraphNode::Commodity(storage.stored_commodity.clone()),
            );
            graph.add_edge(source, target, GraphEdge::Storage(storage.id.clone()));
        }
    }

    for conversion in system.iter_conversions() {
        for (input, output) in iproduct!(conversion.inputs.keys(), conversion.outputs.keys()) {
            let source_node = node(&mut graph, GraphNode::Commodity(input.clone()));
            let target_node = node(&mut graph, GraphNode::Commodity(output.clone()));
            graph.add_edge(
                source_node,
                target_node,
                GraphEdge::Conversion(conversion.id.clone()),
            );
        }
    }

    (graph, node_indexes)
}

/// Work out which commodities can ever be supplied.
///
/// A commodity made by a conversion is only supplied once every input of that conversion is.
fn find_supplied_nodes(graph: &SupplyGraph, source: NodeIndex) -> IndexSet<NodeIndex> {
    let mut supplied = IndexSet::from([source]);
    loop {
        let newly_supplied = graph
            .node_indices()
            .filter(|node| !supplied.contains(node))
            .filter(|&node| {
                let incoming = graph
                    .edges_directed(node, petgraph::Direction::Incoming)
                    .into_group_map_by(|edge| edge.weight().clone());
                incoming
                    .values()
                    .any(|edges| edges.iter().all(|edge| supplied.contains(&edge.source())))
            })
            .collect_vec();
        if newly_supplied.is_empty() {
            return supplied;
        }
        supplied.extend(newly_supplied);
    }
}

/// Find commodities which are needed but which nothing in the system can ever supply.
///
/// A commodity is needed if it is a conversion input or if it can be sold, emitted or is demanded.
pub fn find_unsupplied_commodities(system: &PtxSystem) -> Vec<CommodityID> {
    let (graph, node_indexes) = create_supply_graph(system);
    let supplied = find_supplied_nodes(&graph, node_indexes[&GraphNode::Source]);

    let sets = system.commodity_sets();
    system
        .commodities()
        .keys()
        .filter(|id| {
            sets.consumed.contains(*id)
                || sets.saleable.contains(*id)
                || sets.emittable.contains(*id)
                || sets.demanded.contains(*id)
        })
        .filter(|id| {
            let node = node_indexes[&GraphNode::Commodity((*id).clone())];
            !supplied.contains(&node)
        })
        .cloned()
        .collect()
}

/// Warn about commodities which nothing in the system can ever supply
pub fn warn_about_unsupplied_commodities(system: &PtxSystem) {
    for commodity_id in find_unsupplied_commodities(system) {
        warn!("Nothing in system {} can supply {commodity_id}", system.name());
    }
}
