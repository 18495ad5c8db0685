//! Level set by exact band plus fast sweeping, signed by ray parity.
//!
//! 1. Nodes within `exact_band` cells of each triangle's bounds get exact
//!    distances and remember their closest triangle.
//! 2. Two rounds of sweeps in all eight axis directions let every node try
//!    the closest triangles of its already-visited neighbours.
//! 3. Each grid row along +x counts how many triangles it crosses; nodes
//!    past an odd number of crossings are inside.

use glam::{DVec3, Vec3};
use mesh::{WorldGeometry, closest_point_on_triangle};

use crate::grid::{GridLayout, SdfGrid};
use crate::orientation::point_in_triangle_2d;

const SWEEP_PASSES: usize = 2;

const SWEEP_DIRECTIONS: [(i64, i64, i64); 8] = [
    (1, 1, 1),
    (-1, -1, -1),
    (1, 1, -1),
    (-1, -1, 1),
    (1, -1, 1),
    (-1, 1, -1),
    (1, -1, -1),
    (-1, 1, 1),
];

/// All triangles of a scene in one vertex/index list.
#[derive(Debug, Clone, Default)]
struct TriangleSoup {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl TriangleSoup {
    fn merge(geometries: &[WorldGeometry]) -> Self {
        let mut soup = Self::default();
        for geometry in geometries {
            let base = soup.vertices.len() as u32;
            soup.vertices.extend_from_slice(&geometry.vertices);
            soup.triangles
                .extend(geometry.faces.iter().map(|f| f.map(|v| v + base)));
        }
        soup
    }

    fn distance(&self, triangle: usize, point: Vec3) -> f32 {
        let [a, b, c] = self.triangles[triangle].map(|v| self.vertices[v as usize]);
        closest_point_on_triangle(point, a, b, c).point.distance(point)
    }
}

/// Working arrays shared by the three phases.
struct LevelSet<'a> {
    layout: &'a GridLayout,
    soup: TriangleSoup,
    phi: Vec<f32>,
    closest: Vec<Option<u32>>,
    intersections: Vec<u32>,
}

impl LevelSet<'_> {
    fn n(&self) -> usize {
        self.layout.res()
    }

    /// Node coordinates in units of grid cells.
    fn grid_coords(&self, v: Vec3) -> DVec3 {
        (v.as_dvec3() - self.layout.min.as_dvec3()) / self.layout.spacing.as_dvec3()
    }

    fn clamp_index(&self, value: f64) -> usize {
        value.clamp(0.0, (self.n() - 1) as f64) as usize
    }

    fn seed_triangle(&mut self, t: usize, exact_band: u32) {
        let [p, q, r] = self.soup.triangles[t].map(|v| self.soup.vertices[v as usize]);
        let (fp, fq, fr) = (self.grid_coords(p), self.grid_coords(q), self.grid_coords(r));
        let lo = fp.min(fq).min(fr);
        let hi = fp.max(fq).max(fr);
        let band = exact_band as f64;

        let (i0, i1) = (
            self.clamp_index(lo.x.floor() - band),
            self.clamp_index(hi.x.floor() + band + 1.0),
        );
        let (j0, j1) = (
            self.clamp_index(lo.y.floor() - band),
            self.clamp_index(hi.y.floor() + band + 1.0),
        );
        let (k0, k1) = (
            self.clamp_index(lo.z.floor() - band),
            self.clamp_index(hi.z.floor() + band + 1.0),
        );

        for k in k0..=k1 {
            for j in j0..=j1 {
                for i in i0..=i1 {
                    let node = self.layout.node_position(i, j, k);
                    let d = self.soup.distance(t, node);
                    let idx = self.layout.index(i, j, k);
                    if d < self.phi[idx] {
                        self.phi[idx] = d;
                        self.closest[idx] = Some(t as u32);
                    }
                }
            }
        }

        // Crossings of rows (j, k) running along +x
        let (j0, j1) = (self.clamp_index(lo.y.ceil()), self.clamp_index(hi.y.floor()));
        let (k0, k1) = (self.clamp_index(lo.z.ceil()), self.clamp_index(hi.z.floor()));
        for k in k0..=k1 {
            for j in j0..=j1 {
                let Some([a, b, c]) = point_in_triangle_2d(
                    j as f64, k as f64, fp.y, fp.z, fq.y, fq.z, fr.y, fr.z,
                ) else {
                    continue;
                };
                // Crossing lies in (i_interval - 1, i_interval]
                let fi = a * fp.x + b * fq.x + c * fr.x;
                let i_interval = fi.ceil();
                if i_interval < 0.0 {
                    self.intersections[self.layout.index(0, j, k)] += 1;
                } else if (i_interval as usize) < self.n() {
                    self.intersections[self.layout.index(i_interval as usize, j, k)] += 1;
                }
            }
        }
    }

    fn check_neighbour(&mut self, node: Vec3, idx: usize, neighbour: usize) {
        let Some(t) = self.closest[neighbour] else {
            return;
        };
        let d = self.soup.distance(t as usize, node);
        if d < self.phi[idx] {
            self.phi[idx] = d;
            self.closest[idx] = Some(t);
        }
    }

    fn sweep(&mut self, (di, dj, dk): (i64, i64, i64)) {
        let n = self.n() as i64;
        let range = |d: i64| -> Vec<i64> {
            if d > 0 {
                (1..n).collect()
            } else {
                (0..n - 1).rev().collect()
            }
        };
        let (is, js, ks) = (range(di), range(dj), range(dk));
        let layout = self.layout;
        let at = |x: i64, y: i64, z: i64| layout.index(x as usize, y as usize, z as usize);

        for &k in &ks {
            for &j in &js {
                for &i in &is {
                    let idx = at(i, j, k);
                    let node = layout.node_position(i as usize, j as usize, k as usize);
                    let neighbours = [
                        at(i - di, j, k),
                        at(i, j - dj, k),
                        at(i - di, j - dj, k),
                        at(i, j, k - dk),
                        at(i - di, j, k - dk),
                        at(i, j - dj, k - dk),
                        at(i - di, j - dj, k - dk),
                    ];
                    for neighbour in neighbours {
                        self.check_neighbour(node, idx, neighbour);
                    }
                }
            }
        }
    }

    fn apply_parity(&mut self) {
        let n = self.n();
        for k in 0..n {
            for j in 0..n {
                let mut total = 0u32;
                for i in 0..n {
                    let idx = self.layout.index(i, j, k);
                    total += self.intersections[idx];
                    if total % 2 == 1 {
                        self.phi[idx] = -self.phi[idx];
                    }
                }
            }
        }
    }
}

/// Build a signed distance grid with the fast-sweeping method.
///
/// Distances away from the exact band are approximate; signs are exact for
/// closed, consistently wound meshes.
pub fn voxelize_fast_sweep(
    layout: &GridLayout,
    geometries: &[WorldGeometry],
    exact_band: u32,
) -> SdfGrid {
    let cells = layout.cell_count();
    let mut level_set = LevelSet {
        layout,
        soup: TriangleSoup::merge(geometries),
        phi: vec![layout.span().length(); cells],
        closest: vec![None; cells],
        intersections: vec![0; cells],
    };

    for t in 0..level_set.soup.triangles.len() {
        level_set.seed_triangle(t, exact_band);
    }
    tracing::debug!(
        triangles = level_set.soup.triangles.len(),
        seeded = level_set.closest.iter().filter(|c| c.is_some()).count(),
        "Exact band initialized"
    );

    for _ in 0..SWEEP_PASSES {
        for direction in SWEEP_DIRECTIONS {
            level_set.sweep(direction);
        }
    }
    level_set.apply_parity();

    SdfGrid::new(layout, level_set.phi)
}
