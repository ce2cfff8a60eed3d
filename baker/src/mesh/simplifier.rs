use common::{hash_table::hash_position, BitArray, EdgeID, HashTable, Heap, MeshVert};
use glam::Vec3;

use super::{edge_hash::cycle3, quadric::Quadric, validate_indices, MeshError, PositionSet};

/// Added to the cost of an edge whose endpoints are both locked
const LOCK_PENALTY: f64 = 1e8;
/// Added when a collapse would turn a surviving triangle over
const FLIP_PENALTY: f64 = 1e4;
/// Collapses costing more than this are never performed
pub const MAX_MERGE_COST: f64 = 1e6;
/// Weight of the constraint planes along open edges, relative to triangle area
const BOUNDARY_WEIGHT: f64 = 1.0;

/// Quadric error edge-collapse simplification of an indexed triangle mesh.
///
/// Vertices, corners and edges are found by position through [`HashTable`]s, so seams in the
/// vertex buffer do not stop collapses. Collapsed triangles are flagged rather than erased, and
/// [`MeshSimplifier::compact`] writes out the survivors.
pub struct MeshSimplifier {
    verts: Vec<MeshVert>,
    indices: Vec<u32>,
    /// Number of live corners referencing each vertex
    vert_refs: Vec<u32>,

    vert_hash: HashTable,
    corner_hash: HashTable,

    /// Unique undirected edges, by endpoint position
    edges: Vec<[Vec3; 2]>,
    /// Edges keyed by their first endpoint
    edge_hash0: HashTable,
    /// Edges keyed by their second endpoint
    edge_hash1: HashTable,
    edge_removed: BitArray,

    tri_quadrics: Vec<Quadric>,
    tri_removed: BitArray,
    /// Positions that never move, whatever triangles end up there
    locked: PositionSet,

    heap: Heap,
    dirty_tris: Vec<u32>,

    remaining_num_vert: usize,
    remaining_num_tri: usize,
    max_error: f64,
}

impl MeshSimplifier {
    pub fn new(verts: Vec<MeshVert>, mut indices: Vec<u32>) -> Result<Self, MeshError> {
        validate_indices(verts.len(), &indices)?;

        let num_tris = indices.len() / 3;

        let mut referenced = BitArray::new(verts.len());
        for &i in &indices {
            referenced.set_true(i as usize);
        }

        // Merge exact duplicates, so a collapse moves every copy of a vertex together
        let mut vert_hash = HashTable::with_capacity(verts.len());
        let mut remap: Vec<u32> = (0..verts.len() as u32).collect();
        for v in referenced.iter_ones() {
            let hash = hash_position(verts[v].position());

            match vert_hash
                .bucket(hash)
                .iter()
                .copied()
                .find(|&u| verts[u as usize] == verts[v])
            {
                Some(u) => remap[v] = u,
                None => vert_hash.add(hash, v as u32),
            }
        }
        for i in &mut indices {
            *i = remap[*i as usize];
        }

        let mut vert_refs = vec![0; verts.len()];
        for &i in &indices {
            vert_refs[i as usize] += 1;
        }

        let mut simplifier = Self {
            remaining_num_vert: vert_refs.iter().filter(|&&r| r > 0).count(),
            remaining_num_tri: num_tris,
            corner_hash: HashTable::with_capacity(indices.len()),
            locked: PositionSet::default(),
            tri_removed: BitArray::new(num_tris),
            tri_quadrics: Vec::new(),
            edges: Vec::new(),
            edge_hash0: HashTable::with_capacity(indices.len()),
            edge_hash1: HashTable::with_capacity(indices.len()),
            edge_removed: BitArray::default(),
            heap: Heap::new(),
            dirty_tris: Vec::new(),
            max_error: 0.0,
            vert_hash,
            vert_refs,
            verts,
            indices,
        };

        for c in 0..simplifier.indices.len() {
            simplifier
                .corner_hash
                .add(hash_position(simplifier.pos(c)), c as u32);
        }

        for t in 0..num_tris {
            if simplifier.is_degenerate(t) {
                simplifier.remove_tri(t);
            }
        }

        for t in 0..num_tris {
            if simplifier.tri_removed[t] {
                continue;
            }
            for c in 3 * t..3 * t + 3 {
                let (p0, p1) = (simplifier.pos(c), simplifier.pos(cycle3(c)));
                if simplifier.find_edge(p0, p1).is_none() {
                    simplifier.add_edge(p0, p1);
                }
            }
        }
        simplifier.edge_removed = BitArray::new(simplifier.edges.len());

        let quadrics = (0..num_tris)
            .map(|t| simplifier.compute_tri_quadric(t))
            .collect();
        simplifier.tri_quadrics = quadrics;

        Ok(simplifier)
    }

    pub fn remaining_num_tri(&self) -> usize {
        self.remaining_num_tri
    }

    pub fn remaining_num_vert(&self) -> usize {
        self.remaining_num_vert
    }

    /// Largest error of any collapse performed so far
    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    /// Forbid moving any corner at `p`, including corners collapsed onto it later.
    pub fn lock_position(&mut self, p: Vec3) {
        self.locked.insert(p);
    }

    pub fn is_locked(&self, p: Vec3) -> bool {
        self.locked.contains(p)
    }

    /// Cost of collapsing the edge `p0 - p1`, performing the collapse if `merge` is set.
    pub fn evaluate(&mut self, p0: Vec3, p1: Vec3, merge: bool) -> f64 {
        if p0 == p1 {
            return 0.0;
        }

        let tris = self.adjacent_tris(p0, p1);

        let mut quadric = Quadric::default();
        for &t in &tris {
            quadric += self.tri_quadrics[t];
        }

        let mut penalty = 0.0;
        let new_pos = match (self.is_locked(p0), self.is_locked(p1)) {
            (true, true) => {
                penalty += LOCK_PENALTY;
                p0
            }
            (true, false) => p0,
            (false, true) => p1,
            (false, false) => merge_point(&quadric, p0, p1),
        };

        if self.flips_triangle(&tris, p0, p1, new_pos) {
            penalty += FLIP_PENALTY;
        }

        let error = (quadric.evaluate(new_pos.as_dvec3()) + penalty).max(0.0);

        if merge {
            self.merge(p0, p1, new_pos, &tris);
        }

        error
    }

    /// Collapse edges, cheapest first, until at most `target_num_tris` triangles remain or every
    /// remaining collapse costs more than [`MAX_MERGE_COST`]. Returns the largest error introduced.
    pub fn simplify(&mut self, target_num_tris: usize) -> f64 {
        self.heap.resize(self.edges.len());

        for e in 0..self.edges.len() {
            if self.edge_removed[e] {
                continue;
            }
            let [p0, p1] = self.edges[e];
            let cost = self.evaluate(p0, p1, false);
            self.heap.add(cost as f32, e);
        }

        while self.remaining_num_tri > target_num_tris {
            let Some(key) = self.heap.top_key() else {
                break;
            };

            if key as f64 > MAX_MERGE_COST {
                log::debug!(
                    "Stopping at {} triangles, cheapest collapse costs {key}",
                    self.remaining_num_tri
                );
                break;
            }

            let Some(e) = self.heap.pop() else {
                break;
            };

            let [p0, p1] = self.edges[e];

            let removed = self.edge_tri_count(p0, p1);
            if removed == 0 {
                self.kill_edge(e);
                continue;
            }

            let cost = self.evaluate(p0, p1, false);
            if cost as f32 > key {
                // Neighbourhood changed since this edge was queued
                self.heap.add(cost as f32, e);
                continue;
            }

            if removed > 2 && self.remaining_num_tri < target_num_tris + removed {
                continue;
            }

            self.evaluate(p0, p1, true);
            self.max_error = self.max_error.max(cost);

            self.cleanup();
        }

        self.max_error
    }

    /// Surviving vertices and triangles, with vertices ordered by first use.
    pub fn compact(self) -> (Vec<MeshVert>, Vec<u32>) {
        let mut remap = vec![u32::MAX; self.verts.len()];
        let mut verts = Vec::with_capacity(self.remaining_num_vert);
        let mut indices = Vec::with_capacity(self.remaining_num_tri * 3);

        for t in 0..self.indices.len() / 3 {
            if self.tri_removed[t] {
                continue;
            }
            for &v in &self.indices[3 * t..3 * t + 3] {
                let v = v as usize;
                if remap[v] == u32::MAX {
                    remap[v] = verts.len() as u32;
                    verts.push(self.verts[v]);
                }
                indices.push(remap[v]);
            }
        }

        (verts, indices)
    }

    fn pos(&self, corner: usize) -> Vec3 {
        self.verts[self.indices[corner] as usize].position()
    }

    fn tri_positions(&self, tri: usize) -> [Vec3; 3] {
        [self.pos(3 * tri), self.pos(3 * tri + 1), self.pos(3 * tri + 2)]
    }

    /// Corners of live triangles at exactly `p`
    fn corners_at(&self, p: Vec3) -> impl Iterator<Item = usize> + '_ {
        self.corner_hash
            .bucket(hash_position(p))
            .iter()
            .map(|&c| c as usize)
            .filter(move |&c| self.pos(c) == p)
    }

    /// Live triangles touching either position, sorted
    fn adjacent_tris(&self, p0: Vec3, p1: Vec3) -> Vec<usize> {
        let mut tris: Vec<usize> = self
            .corners_at(p0)
            .chain(self.corners_at(p1))
            .map(|c| c / 3)
            .collect();
        tris.sort_unstable();
        tris.dedup();
        tris
    }

    /// Number of live triangles using both positions
    fn edge_tri_count(&self, p0: Vec3, p1: Vec3) -> usize {
        self.corners_at(p0)
            .filter(|&c| self.tri_positions(c / 3).contains(&p1))
            .count()
    }

    fn has_reverse_edge(&self, p0: Vec3, p1: Vec3) -> bool {
        self.corners_at(p1).any(|c| self.pos(cycle3(c)) == p0)
    }

    fn is_degenerate(&self, tri: usize) -> bool {
        let [a, b, c] = self.tri_positions(tri);
        a == b || b == c || c == a
    }

    /// Another live triangle has the same positions in the same winding
    fn is_duplicate(&self, tri: usize) -> bool {
        let [a, b, c] = self.tri_positions(tri);

        self.corners_at(a).any(|other| {
            let next = cycle3(other);
            other / 3 != tri && self.pos(next) == b && self.pos(cycle3(next)) == c
        })
    }

    fn compute_tri_quadric(&self, tri: usize) -> Quadric {
        let p = self.tri_positions(tri);
        let [a, b, c] = p.map(|v| v.as_dvec3());

        let mut quadric = Quadric::from_triangle(a, b, c);
        let normal = (b - a).cross(c - a).normalize_or_zero();

        for k in 0..3 {
            let (p0, p1) = (p[k], p[(k + 1) % 3]);
            if !self.has_reverse_edge(p0, p1) {
                quadric += Quadric::from_boundary_edge(
                    p0.as_dvec3(),
                    p1.as_dvec3(),
                    normal,
                    BOUNDARY_WEIGHT,
                );
            }
        }

        quadric
    }

    /// Would moving `p0` and `p1` to `new_pos` turn any triangle in `tris` over?
    fn flips_triangle(&self, tris: &[usize], p0: Vec3, p1: Vec3, new_pos: Vec3) -> bool {
        tris.iter().any(|&t| {
            let before = self.tri_positions(t);

            if before.contains(&p0) && before.contains(&p1) {
                // Collapses away entirely
                return false;
            }

            let after = before.map(|p| if p == p0 || p == p1 { new_pos } else { p });

            face_normal(before).dot(face_normal(after)) < 0.0
        })
    }

    fn find_edge(&self, p0: Vec3, p1: Vec3) -> Option<EdgeID> {
        let lookup = |a: Vec3, b: Vec3| {
            self.edge_hash0
                .bucket(hash_position(a))
                .iter()
                .map(|&e| EdgeID(e))
                .find(|&e| self.edges[e.index()] == [a, b])
        };

        lookup(p0, p1).or_else(|| lookup(p1, p0))
    }

    fn add_edge(&mut self, p0: Vec3, p1: Vec3) {
        self.edges.push([p0, p1]);
        self.link_edge(self.edges.len() - 1);
    }

    fn link_edge(&mut self, e: usize) {
        let [p0, p1] = self.edges[e];
        self.edge_hash0.add(hash_position(p0), e as u32);
        self.edge_hash1.add(hash_position(p1), e as u32);
    }

    fn unlink_edge(&mut self, e: usize) {
        let [p0, p1] = self.edges[e];
        self.edge_hash0.remove(hash_position(p0), e as u32);
        self.edge_hash1.remove(hash_position(p1), e as u32);
    }

    fn kill_edge(&mut self, e: usize) {
        self.unlink_edge(e);
        self.edge_removed.set_true(e);
        self.heap.remove(e);
    }

    /// Append the edges with an endpoint at `p`
    fn edges_at(&self, p: Vec3, out: &mut Vec<usize>) {
        let hash = hash_position(p);

        out.extend(
            self.edge_hash0
                .bucket(hash)
                .iter()
                .map(|&e| e as usize)
                .filter(|&e| self.edges[e][0] == p),
        );
        out.extend(
            self.edge_hash1
                .bucket(hash)
                .iter()
                .map(|&e| e as usize)
                .filter(|&e| self.edges[e][1] == p),
        );
    }

    fn remove_tri(&mut self, tri: usize) {
        if self.tri_removed[tri] {
            return;
        }

        self.tri_removed.set_true(tri);
        self.remaining_num_tri -= 1;

        for c in 3 * tri..3 * tri + 3 {
            let v = self.indices[c] as usize;
            let hash = hash_position(self.verts[v].position());

            self.corner_hash.remove(hash, c as u32);

            self.vert_refs[v] -= 1;
            if self.vert_refs[v] == 0 {
                self.vert_hash.remove(hash, v as u32);
                self.remaining_num_vert -= 1;
            }
        }
    }

    /// Move everything at `p0` or `p1` to `new_pos`.
    fn merge(&mut self, p0: Vec3, p1: Vec3, new_pos: Vec3, tris: &[usize]) {
        let mut moved_corners: Vec<usize> = self.corners_at(p0).chain(self.corners_at(p1)).collect();
        moved_corners.sort_unstable();

        let mut moved_edges = Vec::new();
        self.edges_at(p0, &mut moved_edges);
        self.edges_at(p1, &mut moved_edges);
        moved_edges.sort_unstable();
        moved_edges.dedup();

        for &e in &moved_edges {
            self.unlink_edge(e);
        }

        for &c in &moved_corners {
            let hash = hash_position(self.pos(c));
            self.corner_hash.remove(hash, c as u32);
        }

        let mut moved_verts: Vec<u32> = moved_corners.iter().map(|&c| self.indices[c]).collect();
        moved_verts.sort_unstable();
        moved_verts.dedup();

        for &v in &moved_verts {
            let vert = &mut self.verts[v as usize];
            self.vert_hash.remove(hash_position(vert.position()), v);
            vert.set_position(new_pos);
        }

        // Vertices that now coincide exactly are welded
        let new_hash = hash_position(new_pos);
        for &v in &moved_verts {
            let existing = self
                .vert_hash
                .bucket(new_hash)
                .iter()
                .copied()
                .find(|&u| self.verts[u as usize] == self.verts[v as usize]);

            match existing {
                Some(u) => {
                    for &c in &moved_corners {
                        if self.indices[c] == v {
                            self.indices[c] = u;
                        }
                    }
                    self.vert_refs[u as usize] += self.vert_refs[v as usize];
                    self.vert_refs[v as usize] = 0;
                    self.remaining_num_vert -= 1;
                }
                None => self.vert_hash.add(new_hash, v),
            }
        }

        for &c in &moved_corners {
            self.corner_hash.add(new_hash, c as u32);
        }

        for &e in &moved_edges {
            let [a, b] = self.edges[e].map(|p| if p == p0 || p == p1 { new_pos } else { p });

            if a == b || self.find_edge(a, b).is_some() {
                self.edge_removed.set_true(e);
                self.heap.remove(e);
            } else {
                self.edges[e] = [a, b];
                self.link_edge(e);
            }
        }

        self.dirty_tris.extend(tris.iter().map(|&t| t as u32));
    }

    /// Cull triangles broken by the last merge, then re-cost every edge near it.
    fn cleanup(&mut self) {
        let mut positions = Vec::new();

        for t in std::mem::take(&mut self.dirty_tris) {
            let t = t as usize;
            if self.tri_removed[t] {
                continue;
            }

            positions.extend(self.tri_positions(t));

            if self.is_degenerate(t) || self.is_duplicate(t) {
                self.remove_tri(t);
            }
        }

        // Quadrics depend on boundary state, which any removal may change
        let mut tris = Vec::new();
        for &p in &positions {
            tris.extend(self.corners_at(p).map(|c| c / 3));
        }
        tris.sort_unstable();
        tris.dedup();
        for t in tris {
            self.tri_quadrics[t] = self.compute_tri_quadric(t);
        }

        let mut edges = Vec::new();
        for &p in &positions {
            self.edges_at(p, &mut edges);
        }
        edges.sort_unstable();
        edges.dedup();

        for e in edges {
            if self.edge_removed[e] {
                continue;
            }

            let [p0, p1] = self.edges[e];
            if self.edge_tri_count(p0, p1) == 0 {
                self.kill_edge(e);
                continue;
            }

            let cost = self.evaluate(p0, p1, false) as f32;
            if self.heap.is_present(e) {
                self.heap.update(cost, e);
            } else {
                self.heap.add(cost, e);
            }
        }
    }
}

fn face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    (b - a).cross(c - a)
}

/// Least error point on the edge, falling back to the midpoint when the quadric is singular or its
/// minimum lies far from the edge.
fn merge_point(quadric: &Quadric, p0: Vec3, p1: Vec3) -> Vec3 {
    let midpoint = (p0 + p1) * 0.5;

    match quadric.optimal_point() {
        Some(x) => {
            let x = x.as_vec3();
            if x.is_finite() && x.distance(p0) + x.distance(p1) <= 2.0 * p0.distance(p1) {
                x
            } else {
                midpoint
            }
        }
        None => midpoint,
    }
}

#[cfg(test)]
mod tests {
    use common::{TriMesh, VertID};
    use glam::vec3;

    use super::*;

    fn simplifier(mesh: &TriMesh) -> MeshSimplifier {
        MeshSimplifier::new(mesh.verts.clone(), mesh.indices.clone()).unwrap()
    }

    #[test]
    fn test_cube_with_locked_diagonal() {
        let mut s = simplifier(&TriMesh::cube());
        let locked = [vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 0.0)];
        for p in locked {
            s.lock_position(p);
        }

        s.simplify(2);

        assert_eq!(s.remaining_num_tri(), 2);

        let (verts, indices) = s.compact();
        assert_eq!(indices.len(), 6);
        for p in locked {
            assert!(
                verts.iter().any(|v| v.position() == p),
                "Locked position {p} was collapsed"
            );
        }
    }

    #[test]
    fn test_simplify_to_current_count() {
        let mesh = TriMesh::plane(6);
        let mut s = simplifier(&mesh);

        let error = s.simplify(mesh.num_tris());

        assert_eq!(error, 0.0);
        assert_eq!(s.remaining_num_tri(), mesh.num_tris());
        let (verts, indices) = s.compact();
        assert_eq!(indices.len(), mesh.indices.len());
        for (&i, &j) in indices.iter().zip(&mesh.indices) {
            assert_eq!(verts[i as usize], mesh.verts[j as usize]);
        }
    }

    #[test]
    fn test_plane_stays_planar() {
        let mesh = TriMesh::plane(8);
        let mut s = simplifier(&mesh);

        s.simplify(32);

        assert!(s.remaining_num_tri() <= 32);
        assert!(s.remaining_num_tri() > 0);

        let (verts, _) = s.compact();
        for v in &verts {
            assert!(v.position().z.abs() < 1e-5, "{v:?} left the plane");
        }
    }

    #[test]
    fn test_locked_boundary_survives() {
        let mesh = TriMesh::plane(8);
        let mut s = simplifier(&mesh);

        let boundary: Vec<Vec3> = mesh
            .verts
            .iter()
            .map(|v| v.position())
            .filter(|p| p.x == 0.0 || p.y == 0.0 || p.x == 1.0 || p.y == 1.0)
            .collect();
        for &p in &boundary {
            s.lock_position(p);
        }

        s.simplify(16);

        let (verts, _) = s.compact();
        for p in boundary {
            assert!(verts.iter().any(|v| v.position() == p), "Lost {p}");
        }
    }

    #[test]
    fn test_lock_survives_loss_of_its_triangles() {
        // The corner of the plane starts with two triangles, and collapses onto it remove them
        let mesh = TriMesh::plane(8);
        let mut s = simplifier(&mesh);
        let origin = Vec3::ZERO;
        s.lock_position(origin);

        let original: Vec<usize> = s.corners_at(origin).map(|c| c / 3).collect();
        assert_eq!(original, [0, 1]);

        s.simplify(16);

        assert!(s.remaining_num_tri() <= 16);
        assert!(s.is_locked(origin));

        let (verts, _) = s.compact();
        assert!(verts.iter().any(|v| v.position() == origin));
    }

    #[test]
    fn test_duplicate_vertices_welded() {
        let verts = vec![
            MeshVert::new(vec3(0.0, 0.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(1.0, 0.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(0.0, 1.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(0.0, 1.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(1.0, 0.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(1.0, 1.0, 0.0), Vec3::Z),
        ];

        let s = MeshSimplifier::new(verts, vec![0, 1, 2, 3, 4, 5]).unwrap();

        assert_eq!(s.remaining_num_vert(), 4);
        assert_eq!(s.remaining_num_tri(), 2);
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let verts = vec![
            MeshVert::new(vec3(0.0, 0.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(1.0, 0.0, 0.0), Vec3::Z),
            MeshVert::new(vec3(0.0, 1.0, 0.0), Vec3::Z),
        ];

        let s = MeshSimplifier::new(verts, vec![0, 1, 2, 0, 1, 1]).unwrap();

        assert_eq!(s.remaining_num_tri(), 1);
        assert_eq!(s.compact().1, [0, 1, 2]);
    }

    #[test]
    fn test_invalid_indices() {
        let verts = vec![MeshVert::default(); 3];

        assert!(matches!(
            MeshSimplifier::new(verts.clone(), vec![0, 1]),
            Err(MeshError::IndexCount(2))
        ));
        assert!(matches!(
            MeshSimplifier::new(verts, vec![0, 1, 7]),
            Err(MeshError::IndexOutOfBounds { index: VertID(7), .. })
        ));
    }

    #[test]
    fn test_sphere_error_is_small() {
        let mesh = TriMesh::uv_sphere(16, 32);
        let mut s = simplifier(&mesh);

        let target = mesh.num_tris() / 2;
        let error = s.simplify(target);

        assert!(s.remaining_num_tri() <= target);
        assert!(error > 0.0);
        assert!(error < 1e-2, "Error {error} too large for a unit sphere");
        assert_eq!(error, s.max_error());
    }
}
