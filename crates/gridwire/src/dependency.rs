//! Dependency tracking between cells
//!
//! An edge `from -> to` means the formula in `to` read `from` the last time it
//! was evaluated. Edges are only created while a formula evaluates and are
//! dropped wholesale (via [`DependencyGraph::reset_dependencies_of`]) right
//! before the next evaluation of the same cell.

use ahash::{AHashMap, AHashSet};
use gridwire_core::CellAddress;
use std::collections::{BTreeSet, VecDeque};

/// Dependency graph for grid cells
///
/// Tracks which cells depend on which other cells,
/// enabling recalculation of everything downstream of an edit.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Cell → Cells it depends on (precedents)
    precedents: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

/// Cells to refresh after a change, in dependency order
#[derive(Debug, Clone, Default)]
pub struct RecalcPlan {
    /// Every cell to refresh, each exactly once
    ///
    /// Acyclic cells come first in topological order; cells that sit on or
    /// below a cycle follow.
    pub order: Vec<CellAddress>,
    /// Cells that lie on a dependency cycle, ascending
    pub cycles: Vec<CellAddress>,
    /// Distance of each planned cell from the changed cell(s)
    pub depth: AHashMap<CellAddress, usize>,
}

impl RecalcPlan {
    /// Check whether any cycle was found
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Distance of `cell` from the start of the plan, if planned
    pub fn depth_of(&self, cell: &CellAddress) -> Option<usize> {
        self.depth.get(cell).copied()
    }
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cell with no edges; a no-op if already present
    pub fn ensure_node(&mut self, cell: CellAddress) {
        self.dependents.entry(cell).or_default();
        self.precedents.entry(cell).or_default();
    }

    /// Add a dependency: `to` depends on `from`
    ///
    /// Adding an existing edge changes nothing. Self-edges are recorded.
    pub fn add_edge(&mut self, from: CellAddress, to: CellAddress) {
        self.ensure_node(from);
        self.ensure_node(to);
        if self.dependents.entry(from).or_default().insert(to) {
            log::trace!("edge {} -> {}", from, to);
        }
        self.precedents.entry(to).or_default().insert(from);
    }

    /// Remove every edge pointing into `cell`
    ///
    /// Edges leaving `cell` (cells that read it) are kept.
    pub fn reset_dependencies_of(&mut self, cell: CellAddress) {
        let Some(precedents) = self.precedents.get_mut(&cell) else {
            return;
        };
        for precedent in std::mem::take(precedents) {
            if let Some(deps) = self.dependents.get_mut(&precedent) {
                deps.remove(&cell);
            }
        }
    }

    /// Cells that read `cell`, ascending by (row, column)
    pub fn dependents_of(&self, cell: CellAddress) -> Vec<CellAddress> {
        sorted(self.dependents.get(&cell))
    }

    /// Cells that `cell` reads, ascending by (row, column)
    pub fn precedents_of(&self, cell: CellAddress) -> Vec<CellAddress> {
        sorted(self.precedents.get(&cell))
    }

    /// Check whether `to` currently depends on `from`
    pub fn has_edge(&self, from: CellAddress, to: CellAddress) -> bool {
        self.dependents
            .get(&from)
            .is_some_and(|deps| deps.contains(&to))
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(|deps| deps.len()).sum()
    }

    /// Number of registered cells
    pub fn node_count(&self) -> usize {
        self.dependents.len()
    }

    /// Every cell downstream of `start`, in the order they should be refreshed
    ///
    /// `start` itself is not part of the order; it is listed in
    /// [`RecalcPlan::cycles`] when a path leads back to it.
    pub fn recalc_order(&self, start: CellAddress) -> RecalcPlan {
        // Breadth-first, so depth is the shortest distance from start
        let mut depth = AHashMap::new();
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut seen = AHashSet::from_iter([start]);
        let mut start_reentered = false;

        while let Some((cell, distance)) = queue.pop_front() {
            for dependent in self.dependents.get(&cell).into_iter().flat_map(|set| set.iter()) {
                if *dependent == start {
                    start_reentered |= cell != start;
                    continue;
                }
                if seen.insert(*dependent) {
                    depth.insert(*dependent, distance + 1);
                    queue.push_back((*dependent, distance + 1));
                }
            }
        }

        let nodes: AHashSet<CellAddress> = depth.keys().copied().collect();
        let (order, mut cycles) = self.order_within(&nodes);

        if start_reentered {
            let mut with_start = nodes;
            with_start.insert(start);
            cycles = self.cycle_members(&with_start);
        }

        RecalcPlan {
            order,
            cycles,
            depth,
        }
    }

    /// All registered cells in the order a full recalculation should visit them
    pub fn full_order(&self) -> RecalcPlan {
        let nodes: AHashSet<CellAddress> = self.dependents.keys().copied().collect();
        let (order, cycles) = self.order_within(&nodes);
        let depth = self.depths_within(&nodes, &order);
        RecalcPlan {
            order,
            cycles,
            depth,
        }
    }

    /// Topologically order `nodes`, considering only edges between them
    ///
    /// Returns the order and the cycle members found among the leftovers.
    fn order_within(&self, nodes: &AHashSet<CellAddress>) -> (Vec<CellAddress>, Vec<CellAddress>) {
        let mut in_degree: AHashMap<CellAddress, usize> = nodes
            .iter()
            .map(|&cell| {
                let count = self
                    .precedents
                    .get(&cell)
                    .into_iter()
                    .flat_map(|set| set.iter())
                    .filter(|p| **p != cell && nodes.contains(*p))
                    .count();
                (cell, count)
            })
            .collect();

        // Kahn's algorithm; the ready set is ordered so results are deterministic
        let mut ready: BTreeSet<CellAddress> = in_degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(cell, _)| *cell)
            .collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(cell) = ready.pop_first() {
            order.push(cell);
            for dependent in self.dependents_of(cell) {
                if dependent == cell {
                    continue;
                }
                if let Some(count) = in_degree.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() == nodes.len() {
            return (order, Vec::new());
        }

        // Cells on or below a cycle: whole components, upstream components first
        let placed: AHashSet<CellAddress> = order.iter().copied().collect();
        let blocked: AHashSet<CellAddress> = nodes
            .iter()
            .filter(|cell| !placed.contains(*cell))
            .copied()
            .collect();

        let components = self.components_within(&blocked);
        let cycles = members_of_cycles(&components);
        order.extend(components.into_iter().flatten());
        (order, cycles)
    }

    /// Cells of `within` that can reach themselves through other cells of `within`
    fn cycle_members(&self, within: &AHashSet<CellAddress>) -> Vec<CellAddress> {
        members_of_cycles(&self.components_within(within))
    }

    /// Strongly connected components of the subgraph on `within`
    ///
    /// Components come upstream first; cells inside a component are
    /// ascending. Self-edges are ignored.
    fn components_within(&self, within: &AHashSet<CellAddress>) -> Vec<Vec<CellAddress>> {
        let mut roots: Vec<CellAddress> = within.iter().copied().collect();
        roots.sort_unstable();

        let mut search = ComponentSearch::new(self, within);
        for root in roots {
            if !search.index.contains_key(&root) {
                search.run(root);
            }
        }

        // Tarjan's algorithm finishes downstream components first
        let mut components = search.components;
        components.reverse();
        components
    }

    /// Longest-path depth of each ordered cell, counted from the cells with no precedents
    fn depths_within(
        &self,
        nodes: &AHashSet<CellAddress>,
        order: &[CellAddress],
    ) -> AHashMap<CellAddress, usize> {
        let mut depth: AHashMap<CellAddress, usize> = AHashMap::with_capacity(order.len());
        for &cell in order {
            let level = self
                .precedents_of(cell)
                .into_iter()
                .filter(|p| *p != cell && nodes.contains(p))
                .filter_map(|p| depth.get(&p).map(|d| d + 1))
                .max()
                .unwrap_or(0);
            depth.insert(cell, level);
        }
        depth
    }
}

/// Cells of the components that hold more than one cell, ascending
fn members_of_cycles(components: &[Vec<CellAddress>]) -> Vec<CellAddress> {
    let mut members: Vec<CellAddress> = components
        .iter()
        .filter(|component| component.len() > 1)
        .flatten()
        .copied()
        .collect();
    members.sort_unstable();
    members
}

/// A cell being visited by [`ComponentSearch`] and the successors it has left
struct ComponentFrame {
    cell: CellAddress,
    index: usize,
    low: usize,
    successors: Vec<CellAddress>,
    next: usize,
}

/// Iterative Tarjan search; the visit stack lives on the heap
struct ComponentSearch<'a> {
    graph: &'a DependencyGraph,
    within: &'a AHashSet<CellAddress>,
    index: AHashMap<CellAddress, usize>,
    stack: Vec<CellAddress>,
    on_stack: AHashSet<CellAddress>,
    frames: Vec<ComponentFrame>,
    components: Vec<Vec<CellAddress>>,
}

impl<'a> ComponentSearch<'a> {
    fn new(graph: &'a DependencyGraph, within: &'a AHashSet<CellAddress>) -> Self {
        Self {
            graph,
            within,
            index: AHashMap::with_capacity(within.len()),
            stack: Vec::new(),
            on_stack: AHashSet::new(),
            frames: Vec::new(),
            components: Vec::new(),
        }
    }

    fn run(&mut self, root: CellAddress) {
        self.open(root);

        while let Some(frame) = self.frames.last_mut() {
            if let Some(&next) = frame.successors.get(frame.next) {
                frame.next += 1;
                let seen = self.index.get(&next).copied();
                match seen {
                    None => self.open(next),
                    Some(next_index) => {
                        if self.on_stack.contains(&next) {
                            frame.low = frame.low.min(next_index);
                        }
                    }
                }
            } else if let Some(done) = self.frames.pop() {
                self.close(done);
            }
        }
    }

    fn open(&mut self, cell: CellAddress) {
        let index = self.index.len();
        self.index.insert(cell, index);
        self.stack.push(cell);
        self.on_stack.insert(cell);

        let successors = self
            .graph
            .dependents_of(cell)
            .into_iter()
            .filter(|dependent| *dependent != cell && self.within.contains(dependent))
            .collect();
        self.frames.push(ComponentFrame {
            cell,
            index,
            low: index,
            successors,
            next: 0,
        });
    }

    fn close(&mut self, done: ComponentFrame) {
        if let Some(parent) = self.frames.last_mut() {
            parent.low = parent.low.min(done.low);
        }
        if done.low != done.index {
            return;
        }

        let mut component = Vec::new();
        while let Some(cell) = self.stack.pop() {
            self.on_stack.remove(&cell);
            component.push(cell);
            if cell == done.cell {
                break;
            }
        }
        component.sort_unstable();
        self.components.push(component);
    }
}

fn sorted(set: Option<&AHashSet<CellAddress>>) -> Vec<CellAddress> {
    let mut cells: Vec<CellAddress> = set.into_iter().flat_map(|set| set.iter()).copied().collect();
    cells.sort_unstable();
    cells
}
