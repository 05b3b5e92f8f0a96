use std::collections::{HashMap, HashSet};

use cad_types::{Point2, SketchElement, Tolerance};
use tracing::{debug, instrument};

use crate::split::{split_all, usable_curves};
use crate::types::{OrientedSegment, Profile, Segment, SegmentId, Wire};

/// Extract closed regions from a sketch using the default tolerance.
///
/// With `include_outer == false` the outer boundary of each connected group
/// of curves is omitted, leaving only the regions bounded inside it.
pub fn build_profiles(elements: &[SketchElement], include_outer: bool) -> Vec<Profile> {
    build_profiles_with(elements, include_outer, &Tolerance::default())
}

/// Extract closed regions from a sketch.
///
/// Uses planar-graph face detection:
/// 1. Drop construction and zero-length curves
/// 2. Split curves at their mutual intersections
/// 3. Closed curves become wires directly; open pieces are grouped into
///    islands of connected segments
/// 4. Prune dangling segments from each island
/// 5. Walk every half-edge taking the most clockwise turn at each vertex;
///    each closed walk is one wire
/// 6. Optionally drop each island's outer boundary
/// 7. Pair every wire with the outermost wires it encloses as holes
pub fn build_profiles_with(
    elements: &[SketchElement],
    include_outer: bool,
    tol: &Tolerance,
) -> Vec<Profile> {
    let wires = build_wires_with(elements, include_outer, tol);
    assemble_profiles(wires, tol)
}

/// Steps 1 to 6 of [`build_profiles_with`]: the closed wires of a sketch.
#[instrument(skip(elements, tol), fields(elements = elements.len()))]
pub fn build_wires_with(
    elements: &[SketchElement],
    include_outer: bool,
    tol: &Tolerance,
) -> Vec<Wire> {
    let curves = usable_curves(elements, tol);

    // Only closed curves: each is its own wire, nothing to split.
    if curves.iter().all(|(_, c)| c.is_closed(tol)) {
        return curves
            .iter()
            .map(|&(element, curve)| {
                let segment = Segment {
                    id: SegmentId { element, part: 0 },
                    curve,
                };
                Wire::new(vec![OrientedSegment::new(&segment, false)])
            })
            .collect();
    }

    let segments = split_all(&curves, tol);
    let (closed, open): (Vec<Segment>, Vec<Segment>) =
        segments.into_iter().partition(|s| s.curve.is_closed(tol));

    let mut wires: Vec<Wire> = closed
        .iter()
        .map(|s| Wire::new(vec![OrientedSegment::new(s, false)]))
        .collect();

    let graph = SegmentGraph::new(open, tol);
    let islands = graph.islands();
    debug!(
        closed = wires.len(),
        segments = graph.segments.len(),
        islands = islands.len(),
        "split sketch curves"
    );

    for island in islands {
        let kept = graph.prune_dangling(&island);
        if kept.is_empty() {
            continue;
        }
        let mut loops = graph.extract_loops(&kept);
        if !include_outer && loops.len() > 1 {
            loops.retain(|w| w.signed_area(tol) <= 0.0);
        }
        wires.extend(loops);
    }
    wires
}

/// Every wire becomes the outer boundary of one profile. Its holes are the
/// wires it encloses that no other enclosed wire encloses.
fn assemble_profiles(wires: Vec<Wire>, tol: &Tolerance) -> Vec<Profile> {
    let n = wires.len();
    let mut encloses = vec![vec![false; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                encloses[i][j] = wires[i].encloses(&wires[j], tol);
            }
        }
    }

    (0..n)
        .map(|i| {
            let inside: Vec<usize> = (0..n).filter(|&j| encloses[i][j]).collect();
            let holes = inside
                .iter()
                .filter(|&&j| !inside.iter().any(|&k| k != j && encloses[k][j]))
                .map(|&j| wires[j].clone())
                .collect();
            Profile {
                outer: wires[i].clone(),
                holes,
            }
        })
        .collect()
}

/// A directed traversal of segment `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HalfEdge {
    index: usize,
    reversed: bool,
}

/// Open segments with their endpoints merged into shared vertices.
struct SegmentGraph {
    segments: Vec<Segment>,
    /// (start vertex, end vertex) per segment.
    ends: Vec<(usize, usize)>,
    /// Half-edges leaving each vertex.
    outgoing: HashMap<usize, Vec<HalfEdge>>,
}

impl SegmentGraph {
    fn new(segments: Vec<Segment>, tol: &Tolerance) -> Self {
        let mut vertices: Vec<Point2> = Vec::new();
        let mut vertex_of = |p: Point2| match vertices.iter().position(|v| tol.points_coincident(*v, p)) {
            Some(i) => i,
            None => {
                vertices.push(p);
                vertices.len() - 1
            }
        };

        let ends: Vec<(usize, usize)> = segments
            .iter()
            .map(|s| (vertex_of(s.curve.start()), vertex_of(s.curve.end())))
            .collect();

        let mut outgoing: HashMap<usize, Vec<HalfEdge>> = HashMap::new();
        for (index, &(a, b)) in ends.iter().enumerate() {
            outgoing.entry(a).or_default().push(HalfEdge {
                index,
                reversed: false,
            });
            outgoing.entry(b).or_default().push(HalfEdge {
                index,
                reversed: true,
            });
        }

        Self {
            segments,
            ends,
            outgoing,
        }
    }

    fn head(&self, h: HalfEdge) -> usize {
        let (a, b) = self.ends[h.index];
        if h.reversed {
            a
        } else {
            b
        }
    }

    fn oriented(&self, h: HalfEdge) -> OrientedSegment {
        OrientedSegment::new(&self.segments[h.index], h.reversed)
    }

    /// Groups of segment indices connected through shared vertices.
    fn islands(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.segments.len()];
        let mut islands = Vec::new();
        for start in 0..self.segments.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut island = Vec::new();
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                island.push(i);
                let (a, b) = self.ends[i];
                for v in [a, b] {
                    for h in self.outgoing.get(&v).into_iter().flatten() {
                        if !seen[h.index] {
                            seen[h.index] = true;
                            stack.push(h.index);
                        }
                    }
                }
            }
            island.sort_by_key(|&i| self.segments[i].id);
            islands.push(island);
        }
        islands
    }

    /// Repeatedly remove segments with an endpoint no other remaining
    /// segment touches, until none are left to remove.
    fn prune_dangling(&self, island: &[usize]) -> Vec<usize> {
        let mut kept: Vec<usize> = island.to_vec();
        loop {
            let mut degree: HashMap<usize, usize> = HashMap::new();
            for &i in &kept {
                let (a, b) = self.ends[i];
                *degree.entry(a).or_insert(0) += 1;
                *degree.entry(b).or_insert(0) += 1;
            }
            let before = kept.len();
            kept.retain(|&i| {
                let (a, b) = self.ends[i];
                degree[&a] > 1 && degree[&b] > 1
            });
            if kept.len() == before {
                return kept;
            }
        }
    }

    /// Walk each half-edge of the island once, turning as far clockwise as
    /// possible at every vertex.
    fn extract_loops(&self, island: &[usize]) -> Vec<Wire> {
        let members: HashSet<usize> = island.iter().copied().collect();
        let mut visited: HashSet<HalfEdge> = HashSet::new();
        let mut loops = Vec::new();

        for &index in island {
            for reversed in [false, true] {
                let start = HalfEdge { index, reversed };
                if visited.contains(&start) {
                    continue;
                }
                let mut path = Vec::new();
                let mut current = start;
                let closed = loop {
                    if !visited.insert(current) {
                        break false;
                    }
                    path.push(current);
                    match self.next_half_edge(current, &members) {
                        Some(next) if next == start => break true,
                        Some(next) => current = next,
                        None => break false,
                    }
                };
                if closed {
                    loops.push(Wire::new(path.into_iter().map(|h| self.oriented(h)).collect()));
                }
            }
        }
        loops
    }

    /// The half-edge leaving the head of `current` with the most clockwise
    /// turn. Curves leaving along the same tangent are told apart by
    /// curvature; only coincident curves fall back to the lowest segment id.
    fn next_half_edge(&self, current: HalfEdge, members: &HashSet<usize>) -> Option<HalfEdge> {
        let arriving = self.oriented(current).curve;
        let incoming = Departure {
            tangent: arriving.tangent_at(1.0),
            curvature: arriving.curvature(),
        };
        self.outgoing
            .get(&self.head(current))?
            .iter()
            .filter(|h| h.index != current.index && members.contains(&h.index))
            .map(|&h| {
                let leaving = self.oriented(h).curve;
                let outgoing = Departure {
                    tangent: leaving.tangent_at(0.0),
                    curvature: leaving.curvature(),
                };
                (turn_key(incoming, outgoing), h)
            })
            .min_by(|((ka, ca), a), ((kb, cb), b)| {
                if (ka - kb).abs() > TIE_EPSILON {
                    ka.total_cmp(kb)
                } else if (ca - cb).abs() > TIE_EPSILON {
                    ca.total_cmp(cb)
                } else {
                    self.segments[a.index]
                        .id
                        .cmp(&self.segments[b.index].id)
                        .then(a.reversed.cmp(&b.reversed))
                }
            })
            .map(|(_, h)| h)
    }
}

const TIE_EPSILON: f64 = 1e-9;

/// Direction and signed curvature of a curve where it meets a vertex.
#[derive(Debug, Clone, Copy)]
struct Departure {
    tangent: Point2,
    curvature: f64,
}

/// Orders turns from sharpest right (0) through straight ahead (2) to
/// sharpest left (4), paired with the outgoing curvature so that of two
/// curves sharing a tangent the one bending further clockwise comes first.
///
/// Doubling back is the sharpest right turn when the curve bends to the
/// right of the arriving curve's return path and the sharpest left turn
/// otherwise.
fn turn_key(incoming: Departure, outgoing: Departure) -> (f64, f64) {
    let cross = incoming.tangent.cross(outgoing.tangent);
    let dot = incoming.tangent.dot(outgoing.tangent);
    let key = if cross < -TIE_EPSILON {
        1.0 + dot
    } else if cross > TIE_EPSILON {
        3.0 - dot
    } else if dot > 0.0 {
        2.0
    } else if outgoing.curvature + incoming.curvature > TIE_EPSILON {
        0.0
    } else {
        4.0
    };
    (key, outgoing.curvature)
}
