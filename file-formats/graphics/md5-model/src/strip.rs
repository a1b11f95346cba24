//! Triangle list to triangle strip conversion
//!
//! Triangles are grown greedily into runs across shared edges. Runs are
//! joined into a single strip with degenerate triangles, padding so that
//! every run starts on an even strip position and keeps its winding.

use std::collections::HashMap;

type Edge = (u16, u16);

/// Build one strip covering every triangle of an indexed triangle list
///
/// `cache_size` is the number of most recent strip vertices searched for an
/// unused triangle when a run ends; triangles sharing those vertices are
/// preferred as the next seed.
pub fn build_strip(indices: &[u16], cache_size: usize) -> Vec<u16> {
    let triangles: Vec<[u16; 3]> = indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let mut edges: HashMap<Edge, Vec<(usize, u16)>> = HashMap::new();
    let mut incident: HashMap<u16, Vec<usize>> = HashMap::new();
    for (t, &[a, b, c]) in triangles.iter().enumerate() {
        for (x, y, z) in [(a, b, c), (b, c, a), (c, a, b)] {
            edges.entry((x, y)).or_default().push((t, z));
        }
        for v in [a, b, c] {
            incident.entry(v).or_default().push(t);
        }
    }

    let mut used = vec![false; triangles.len()];
    let mut strip = Vec::with_capacity(indices.len());
    let mut first_unused = 0;

    loop {
        let seed = recent_neighbor(&strip, cache_size, &incident, &used).or_else(|| {
            while first_unused < used.len() && used[first_unused] {
                first_unused += 1;
            }
            (first_unused < used.len()).then_some(first_unused)
        });
        let Some(seed) = seed else {
            break;
        };

        let run = grow_run(seed, &triangles, &edges, &mut used);
        append_run(&mut strip, &run);
    }

    strip
}

fn recent_neighbor(
    strip: &[u16],
    cache_size: usize,
    incident: &HashMap<u16, Vec<usize>>,
    used: &[bool],
) -> Option<usize> {
    let window = &strip[strip.len().saturating_sub(cache_size)..];
    window
        .iter()
        .rev()
        .flat_map(|v| incident.get(v).into_iter().flatten())
        .copied()
        .find(|&t| !used[t])
}

fn unused_neighbor(
    edges: &HashMap<Edge, Vec<(usize, u16)>>,
    used: &[bool],
    edge: Edge,
) -> Option<(usize, u16)> {
    edges.get(&edge)?.iter().copied().find(|&(t, _)| !used[t])
}

/// Edge the next triangle of a run must contain, given the run so far
///
/// Strip triangle `k` is `(s[k], s[k+1], s[k+2])` for even `k` and
/// `(s[k+1], s[k], s[k+2])` for odd `k`.
fn open_edge(run: &[u16]) -> Edge {
    let n = run.len();
    if n.is_multiple_of(2) {
        (run[n - 2], run[n - 1])
    } else {
        (run[n - 1], run[n - 2])
    }
}

fn grow_run(
    seed: usize,
    triangles: &[[u16; 3]],
    edges: &HashMap<Edge, Vec<(usize, u16)>>,
    used: &mut [bool],
) -> Vec<u16> {
    used[seed] = true;

    let [a, b, c] = triangles[seed];
    let rotations = [[a, b, c], [b, c, a], [c, a, b]];
    let start = rotations
        .iter()
        .find(|r| unused_neighbor(edges, used, open_edge(&r[..])).is_some())
        .unwrap_or(&rotations[0]);

    let mut run = start.to_vec();
    while let Some((t, third)) = unused_neighbor(edges, used, open_edge(&run)) {
        used[t] = true;
        run.push(third);
    }
    run
}

fn append_run(strip: &mut Vec<u16>, run: &[u16]) {
    if let (Some(&last), Some(&first)) = (strip.last(), run.first()) {
        if !strip.len().is_multiple_of(2) {
            strip.push(last);
        }
        strip.push(last);
        strip.push(first);
    }
    strip.extend_from_slice(run);
}
