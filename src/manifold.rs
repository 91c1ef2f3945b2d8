//! Provides the reduction of high-dimensional points to a 2D layout.
//!
//! [Tsne][tsne] implements t-distributed Stochastic Neighbor Embedding
//! (van der Maaten and Hinton, 2008) in two flavours:
//!
//! * **Barnes-Hut** (van der Maaten, 2014) for everything but small inputs. The input
//!   affinities are only computed for the `3 * perplexity` nearest neighbours of every
//!   point, found with a vantage-point tree, and the repulsive forces of the layout are
//!   approximated with a quadtree. Memory grows linearly with the number of points.
//! * **Exact** for inputs of at most [max_exact_points][exact] points, where the dense
//!   pairwise matrices are cheap.
//!
//! [tsne]: ./struct.Tsne.html
//! [exact]: ./struct.TsneConfig.html#structfield.max_exact_points
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::mem;
use rand::{Rng, SeedableRng, XorShiftRng};
use rand::distributions::{IndependentSample, Normal};
use error::Error;

/// Reduces a set of points to two dimensions.
pub trait ManifoldReducer {
    /// Computes one 2D point for every input point, in input order.
    fn reduce(&self, points: &[Vec<f32>]) -> Result<Vec<[f64; 2]>, Error>;
}

#[derive(Debug, Copy, Clone)]
/// Specifies the parameters of a t-SNE run.
pub struct TsneConfig {
    /// The effective number of neighbours of every point.
    ///
    /// Clamped to a third of the number of other points for small inputs.
    pub perplexity: f64,
    /// Step size of the gradient descent.
    pub learning_rate: f64,
    /// Number of gradient descent steps.
    pub iterations: usize,
    /// Factor the input affinities are multiplied with during the first iterations.
    pub early_exaggeration: f64,
    /// Number of iterations with exaggerated affinities and low momentum.
    pub exaggeration_iterations: usize,
    /// Accuracy of the Barnes-Hut approximation. A quadtree cell is summarized when
    /// its width divided by its distance is below `theta`; `0` never summarizes.
    ///
    /// Defaults to `0.5`
    pub theta: f64,
    /// Inputs with at most this many points are reduced with exact t-SNE.
    ///
    /// Defaults to `1000`
    pub max_exact_points: usize,
    /// Seed of the random initial layout and the neighbour search. Must not be all zeros.
    pub seed: [u32; 4],
}

impl Default for TsneConfig {
    fn default() -> TsneConfig {
        TsneConfig {
            perplexity: 30.0,
            learning_rate: 200.0,
            iterations: 1000,
            early_exaggeration: 12.0,
            exaggeration_iterations: 250,
            theta: 0.5,
            max_exact_points: 1000,
            seed: [0x193a_6754, 0xa8a7_d469, 0x9783_0e05, 0x113b_a7bb],
        }
    }
}

#[derive(Debug, Clone)]
/// t-SNE, exact or Barnes-Hut depending on the number of points.
pub struct Tsne {
    config: TsneConfig,
}

const ENTROPY_TOLERANCE: f64 = 1e-5;
const BINARY_SEARCH_STEPS: usize = 50;
const MIN_PROBABILITY: f64 = 1e-12;
const MIN_GAIN: f64 = 0.01;
const MAX_TREE_DEPTH: usize = 32;

/// Symmetric input affinities `P`.
enum Affinities {
    /// All `n * n` pairs, row-major.
    Dense(Vec<f64>),
    /// Per point its neighbours and their affinity, sorted by neighbour index.
    Sparse(Vec<Vec<(usize, f64)>>),
}

impl Tsne {
    /// Create a t-SNE reducer from a TsneConfig.
    pub fn from_config(config: &TsneConfig) -> Tsne {
        Tsne { config: *config }
    }

    fn perplexity(&self, n: usize) -> f64 {
        self.config.perplexity.min(((n - 1) as f64 / 3.0).max(1.0))
    }

    fn dense_affinities(&self, points: &[Vec<f32>]) -> Vec<f64> {
        let n = points.len();
        let target_entropy = self.perplexity(n).ln();

        let mut conditional = vec![0f64; n * n];
        for i in 0..n {
            let others = (0..n).filter(|&j| j != i).collect::<Vec<usize>>();
            let distances = others.iter().map(|&j| squared_distance(&points[i], &points[j])).collect::<Vec<f64>>();
            for (&j, p) in others.iter().zip(conditional_row(&distances, target_entropy)) {
                conditional[i * n + j] = p;
            }
        }

        let mut joint = vec![0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    joint[i * n + j] = ((conditional[i * n + j] + conditional[j * n + i]) / (2 * n) as f64).max(MIN_PROBABILITY);
                }
            }
        }
        joint
    }

    fn sparse_affinities<R: Rng>(&self, points: &[Vec<f32>], rng: &mut R) -> Vec<Vec<(usize, f64)>> {
        let n = points.len();
        let perplexity = self.perplexity(n);
        let k = ::std::cmp::min(n - 1, (3.0 * perplexity) as usize + 1);
        let target_entropy = perplexity.ln();
        let tree = VpNode::build(points, (0..n).collect(), rng);

        let mut symmetric: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        for i in 0..n {
            let neighbours = match tree {
                Some(ref tree) => tree.nearest(points, i, k),
                None => vec![],
            };
            let distances = neighbours.iter().map(|&(_, d)| d * d).collect::<Vec<f64>>();
            for (&(j, _), p) in neighbours.iter().zip(conditional_row(&distances, target_entropy)) {
                *symmetric[i].entry(j).or_insert(0f64) += p;
                *symmetric[j].entry(i).or_insert(0f64) += p;
            }
        }

        let norm = (2 * n) as f64;
        symmetric.into_iter().map(|row| {
            let mut row = row.into_iter().map(|(j, p)| (j, (p / norm).max(MIN_PROBABILITY))).collect::<Vec<(usize, f64)>>();
            row.sort_by_key(|&(j, _)| j);
            row
        }).collect()
    }

    fn optimize<R: Rng>(&self, affinities: &Affinities, n: usize, rng: &mut R) -> Vec<[f64; 2]> {
        let normal = Normal::new(0f64, 1e-4);
        let mut y = (0..n).map(|_| [normal.ind_sample(rng), normal.ind_sample(rng)]).collect::<Vec<[f64; 2]>>();
        let mut update = vec![[0f64; 2]; n];
        let mut gains = vec![[1f64; 2]; n];
        let mut gradient = vec![[0f64; 2]; n];

        for iteration in 0..self.config.iterations {
            let early = iteration < self.config.exaggeration_iterations;
            let exaggeration = if early { self.config.early_exaggeration } else { 1f64 };
            let momentum = if early { 0.5 } else { 0.8 };

            match *affinities {
                Affinities::Dense(ref p) => exact_gradient(p, &y, exaggeration, &mut gradient),
                Affinities::Sparse(ref rows) => barnes_hut_gradient(rows, &y, exaggeration, self.config.theta, &mut gradient),
            }

            for i in 0..n {
                for d in 0..2 {
                    let gain = if (gradient[i][d] > 0f64) != (update[i][d] > 0f64) {
                        gains[i][d] + 0.2
                    } else {
                        gains[i][d] * 0.8
                    };
                    gains[i][d] = gain.max(MIN_GAIN);
                    update[i][d] = momentum * update[i][d] - self.config.learning_rate * gains[i][d] * gradient[i][d];
                }
            }

            let mut mean = [0f64; 2];
            for i in 0..n {
                for d in 0..2 {
                    y[i][d] += update[i][d];
                    mean[d] += y[i][d] / n as f64;
                }
            }
            for point in &mut y {
                point[0] -= mean[0];
                point[1] -= mean[1];
            }

            if (iteration + 1) % 100 == 0 {
                match *affinities {
                    Affinities::Dense(ref p) => {
                        debug!("t-SNE iteration {}: KL divergence {}", iteration + 1, kl_divergence(p, &y))
                    }
                    Affinities::Sparse(_) => {
                        let norm = gradient.iter().fold(0f64, |sum, g| sum + g[0] * g[0] + g[1] * g[1]).sqrt();
                        debug!("t-SNE iteration {}: gradient norm {}", iteration + 1, norm)
                    }
                }
            }
        }
        y
    }
}

impl ManifoldReducer for Tsne {
    fn reduce(&self, points: &[Vec<f32>]) -> Result<Vec<[f64; 2]>, Error> {
        let n = points.len();
        match n {
            0 => return Ok(vec![]),
            1 => return Ok(vec![[0f64, 0f64]]),
            _ => {}
        }
        if points.iter().any(|point| point.len() != points[0].len()) {
            return Err(Error::Reduction("points of different dimensionality".to_owned()));
        }
        if self.config.seed.iter().all(|s| *s == 0) {
            return Err(Error::InvalidConfig("t-SNE seed must not be all zeros".to_owned()));
        }

        let mut rng = XorShiftRng::from_seed(self.config.seed);
        let affinities = if n <= self.config.max_exact_points {
            debug!("Running exact t-SNE over {} points of dimension {}", n, points[0].len());
            Affinities::Dense(self.dense_affinities(points))
        } else {
            debug!("Running Barnes-Hut t-SNE over {} points of dimension {}", n, points[0].len());
            Affinities::Sparse(self.sparse_affinities(points, &mut rng))
        };
        let y = self.optimize(&affinities, n, &mut rng);

        if y.iter().any(|point| !point[0].is_finite() || !point[1].is_finite()) {
            return Err(Error::Reduction("t-SNE diverged".to_owned()));
        }
        Ok(y)
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b.iter()).fold(0f64, |sum, (x, y)| sum + (*x as f64 - *y as f64).powi(2))
}

/// Binary search for the Gaussian precision that gives a row the target entropy.
///
/// `distances` are squared distances to the other points of the row; the result are
/// the conditional probabilities `p_j|i` in the same order.
fn conditional_row(distances: &[f64], target_entropy: f64) -> Vec<f64> {
    let min_distance = distances.iter().fold(::std::f64::INFINITY, |min, d| min.min(*d));
    let mut beta = 1f64;
    let mut beta_min = ::std::f64::NEG_INFINITY;
    let mut beta_max = ::std::f64::INFINITY;
    let mut row = vec![0f64; distances.len()];
    for _ in 0..BINARY_SEARCH_STEPS {
        let mut sum = 0f64;
        let mut weighted = 0f64;
        for (p, d) in row.iter_mut().zip(distances.iter()) {
            *p = (-(d - min_distance) * beta).exp();
            sum += *p;
            weighted += (d - min_distance) * *p;
        }
        let entropy = sum.ln() + beta * weighted / sum;
        for p in &mut row {
            *p /= sum;
        }

        let difference = entropy - target_entropy;
        if difference.abs() < ENTROPY_TOLERANCE {
            break;
        }
        if difference > 0f64 {
            beta_min = beta;
            beta = if beta_max.is_infinite() { beta * 2f64 } else { (beta + beta_max) / 2f64 };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() { beta / 2f64 } else { (beta + beta_min) / 2f64 };
        }
    }
    row
}

/// Student-t kernel values `1 / (1 + |y_i - y_j|^2)` of all pairs and their sum.
fn student_t(y: &[[f64; 2]]) -> (Vec<f64>, f64) {
    let n = y.len();
    let mut num = vec![0f64; n * n];
    let mut sum = 0f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (y[i][0] - y[j][0]).powi(2) + (y[i][1] - y[j][1]).powi(2);
            let value = 1f64 / (1f64 + d);
            num[i * n + j] = value;
            num[j * n + i] = value;
            sum += 2f64 * value;
        }
    }
    (num, sum)
}

fn exact_gradient(p: &[f64], y: &[[f64; 2]], exaggeration: f64, gradient: &mut [[f64; 2]]) {
    let n = y.len();
    let (num, sum_num) = student_t(y);
    for i in 0..n {
        let mut g = [0f64; 2];
        for j in 0..n {
            if i == j {
                continue;
            }
            let q = (num[i * n + j] / sum_num).max(MIN_PROBABILITY);
            let factor = 4f64 * (exaggeration * p[i * n + j] - q) * num[i * n + j];
            g[0] += factor * (y[i][0] - y[j][0]);
            g[1] += factor * (y[i][1] - y[j][1]);
        }
        gradient[i] = g;
    }
}

fn kl_divergence(p: &[f64], y: &[[f64; 2]]) -> f64 {
    let n = y.len();
    let (num, sum_num) = student_t(y);
    let mut kl = 0f64;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let q = (num[i * n + j] / sum_num).max(MIN_PROBABILITY);
                kl += p[i * n + j] * (p[i * n + j] / q).ln();
            }
        }
    }
    kl
}

fn barnes_hut_gradient(rows: &[Vec<(usize, f64)>], y: &[[f64; 2]], exaggeration: f64, theta: f64, gradient: &mut [[f64; 2]]) {
    let tree = QuadTree::new(y);
    let mut repulsive = vec![[0f64; 2]; y.len()];
    let mut sum_q = 0f64;
    for (i, force) in repulsive.iter_mut().enumerate() {
        sum_q += tree.repulsion(i, y, theta, force);
    }

    for (i, row) in rows.iter().enumerate() {
        let mut attractive = [0f64; 2];
        for &(j, p) in row {
            let dx = [y[i][0] - y[j][0], y[i][1] - y[j][1]];
            let q = 1f64 / (1f64 + dx[0] * dx[0] + dx[1] * dx[1]);
            attractive[0] += exaggeration * p * q * dx[0];
            attractive[1] += exaggeration * p * q * dx[1];
        }
        for d in 0..2 {
            gradient[i][d] = 4f64 * (attractive[d] - repulsive[i][d] / sum_q);
        }
    }
}

/// A node of a vantage-point tree over the input points.
///
/// Points closer to the vantage point than `threshold` are `inside`, the others
/// `outside`.
struct VpNode {
    index: usize,
    threshold: f64,
    inside: Option<Box<VpNode>>,
    outside: Option<Box<VpNode>>,
}

#[derive(Debug, PartialEq)]
struct Neighbour {
    distance: f64,
    index: usize,
}

impl Eq for Neighbour {}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Neighbour) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbour {
    fn cmp(&self, other: &Neighbour) -> Ordering {
        self.distance.partial_cmp(&other.distance).unwrap_or(Ordering::Equal).then(self.index.cmp(&other.index))
    }
}

impl VpNode {
    fn build<R: Rng>(points: &[Vec<f32>], mut items: Vec<usize>, rng: &mut R) -> Option<Box<VpNode>> {
        if items.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0, items.len());
        let index = items.swap_remove(pick);

        let mut by_distance = items.into_iter()
            .map(|j| (squared_distance(&points[index], &points[j]).sqrt(), j))
            .collect::<Vec<(f64, usize)>>();
        by_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let median = by_distance.len() / 2;
        let threshold = by_distance.get(median).map(|&(d, _)| d).unwrap_or(0f64);
        let outside = by_distance.split_off(median);

        Some(Box::new(VpNode {
            index: index,
            threshold: threshold,
            inside: VpNode::build(points, by_distance.into_iter().map(|(_, j)| j).collect(), rng),
            outside: VpNode::build(points, outside.into_iter().map(|(_, j)| j).collect(), rng),
        }))
    }

    /// The `k` nearest neighbours of point `target` with their distance, nearest first.
    fn nearest(&self, points: &[Vec<f32>], target: usize, k: usize) -> Vec<(usize, f64)> {
        let mut heap = BinaryHeap::with_capacity(k + 1);
        let mut tau = ::std::f64::INFINITY;
        self.search(points, target, k, &mut heap, &mut tau);
        heap.into_sorted_vec().into_iter().map(|n| (n.index, n.distance)).collect()
    }

    fn search(&self, points: &[Vec<f32>], target: usize, k: usize, heap: &mut BinaryHeap<Neighbour>, tau: &mut f64) {
        let distance = squared_distance(&points[target], &points[self.index]).sqrt();
        if self.index != target && distance < *tau {
            heap.push(Neighbour { distance: distance, index: self.index });
            if heap.len() > k {
                heap.pop();
            }
            if heap.len() == k {
                if let Some(farthest) = heap.peek() {
                    *tau = farthest.distance;
                }
            }
        }

        if distance < self.threshold {
            if let Some(ref inside) = self.inside {
                if distance - *tau <= self.threshold {
                    inside.search(points, target, k, heap, tau);
                }
            }
            if let Some(ref outside) = self.outside {
                if distance + *tau >= self.threshold {
                    outside.search(points, target, k, heap, tau);
                }
            }
        } else {
            if let Some(ref outside) = self.outside {
                if distance + *tau >= self.threshold {
                    outside.search(points, target, k, heap, tau);
                }
            }
            if let Some(ref inside) = self.inside {
                if distance - *tau <= self.threshold {
                    inside.search(points, target, k, heap, tau);
                }
            }
        }
    }
}

struct QuadNode {
    center: [f64; 2],
    half: f64,
    mass: usize,
    center_of_mass: [f64; 2],
    children: Option<[usize; 4]>,
    points: Vec<usize>,
}

impl QuadNode {
    fn new(center: [f64; 2], half: f64) -> QuadNode {
        QuadNode {
            center: center,
            half: half,
            mass: 0,
            center_of_mass: [0f64; 2],
            children: None,
            points: vec![],
        }
    }

    fn add_mass(&mut self, position: [f64; 2]) {
        let mass = self.mass as f64;
        for d in 0..2 {
            self.center_of_mass[d] = (self.center_of_mass[d] * mass + position[d]) / (mass + 1f64);
        }
        self.mass += 1;
    }

    fn quadrant(&self, position: [f64; 2]) -> usize {
        (position[0] >= self.center[0]) as usize + 2 * (position[1] >= self.center[1]) as usize
    }
}

/// Quadtree over the current layout, arena allocated. Leaves hold a single point,
/// except at the maximum depth where duplicates are collected.
struct QuadTree {
    nodes: Vec<QuadNode>,
}

impl QuadTree {
    fn new(y: &[[f64; 2]]) -> QuadTree {
        let mut min = [::std::f64::INFINITY; 2];
        let mut max = [::std::f64::NEG_INFINITY; 2];
        for point in y {
            for d in 0..2 {
                min[d] = min[d].min(point[d]);
                max[d] = max[d].max(point[d]);
            }
        }
        let center = [(min[0] + max[0]) / 2f64, (min[1] + max[1]) / 2f64];
        let half = (max[0] - min[0]).max(max[1] - min[1]) / 2f64 + 1e-5;

        let mut tree = QuadTree { nodes: vec![QuadNode::new(center, half)] };
        for i in 0..y.len() {
            tree.insert(i, y);
        }
        tree
    }

    fn insert(&mut self, point: usize, y: &[[f64; 2]]) {
        let mut node = 0;
        let mut depth = 0;
        loop {
            self.nodes[node].add_mass(y[point]);
            let children = match self.nodes[node].children {
                Some(children) => children,
                None => {
                    if self.nodes[node].points.is_empty() || depth >= MAX_TREE_DEPTH {
                        self.nodes[node].points.push(point);
                        return;
                    }
                    let children = self.subdivide(node);
                    for existing in mem::replace(&mut self.nodes[node].points, vec![]) {
                        let child = children[self.nodes[node].quadrant(y[existing])];
                        self.nodes[child].add_mass(y[existing]);
                        self.nodes[child].points.push(existing);
                    }
                    children
                }
            };
            node = children[self.nodes[node].quadrant(y[point])];
            depth += 1;
        }
    }

    fn subdivide(&mut self, node: usize) -> [usize; 4] {
        let (center, half) = (self.nodes[node].center, self.nodes[node].half / 2f64);
        let first = self.nodes.len();
        for quadrant in 0..4 {
            let x = if quadrant & 1 == 1 { center[0] + half } else { center[0] - half };
            let y = if quadrant & 2 == 2 { center[1] + half } else { center[1] - half };
            self.nodes.push(QuadNode::new([x, y], half));
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node].children = Some(children);
        children
    }

    /// Accumulates the unnormalized repulsive force on point `i` into `force` and
    /// returns its share of the normalization `sum q`.
    fn repulsion(&self, i: usize, y: &[[f64; 2]], theta: f64, force: &mut [f64; 2]) -> f64 {
        let mut sum_q = 0f64;
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.mass == 0 {
                continue;
            }
            match node.children {
                None => {
                    for &j in &node.points {
                        if j == i {
                            continue;
                        }
                        let dx = [y[i][0] - y[j][0], y[i][1] - y[j][1]];
                        let q = 1f64 / (1f64 + dx[0] * dx[0] + dx[1] * dx[1]);
                        sum_q += q;
                        force[0] += q * q * dx[0];
                        force[1] += q * q * dx[1];
                    }
                }
                Some(children) => {
                    let dx = [y[i][0] - node.center_of_mass[0], y[i][1] - node.center_of_mass[1]];
                    let distance = dx[0] * dx[0] + dx[1] * dx[1];
                    let width = 2f64 * node.half;
                    if distance > 0f64 && width * width < theta * theta * distance {
                        let mass = node.mass as f64;
                        let q = 1f64 / (1f64 + distance);
                        sum_q += mass * q;
                        force[0] += mass * q * q * dx[0];
                        force[1] += mass * q * q * dx[1];
                    } else {
                        stack.extend(children.iter().cloned());
                    }
                }
            }
        }
        sum_q
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, XorShiftRng};
    use super::*;
    use super::{squared_distance, QuadTree, VpNode};

    fn distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    }

    fn two_clusters(size: usize) -> Vec<Vec<f32>> {
        let mut points = Vec::new();
        for i in 0..size {
            points.push(vec![i as f32 * 0.1, (i % 3) as f32 * 0.1, 0f32]);
        }
        for i in 0..size {
            points.push(vec![20f32 + i as f32 * 0.1, 20f32, 20f32 + (i % 3) as f32 * 0.1]);
        }
        points
    }

    #[test]
    fn trivial_inputs() {
        let tsne = Tsne::from_config(&TsneConfig::default());
        assert!(tsne.reduce(&[]).unwrap().is_empty());
        assert_eq!(vec![[0f64, 0f64]], tsne.reduce(&[vec![1f32, 2f32]]).unwrap());
        assert!(tsne.reduce(&[vec![1f32], vec![1f32, 2f32]]).is_err());
    }

    #[test]
    fn keeps_clusters_apart() {
        let tsne = Tsne::from_config(&TsneConfig { iterations: 500, ..TsneConfig::default() });
        let layout = tsne.reduce(&two_clusters(6)).unwrap();
        assert_eq!(12, layout.len());
        let within = distance(&layout[0], &layout[5]).max(distance(&layout[6], &layout[11]));
        let between = distance(&layout[0], &layout[6]);
        assert!(within < between);
    }

    #[test]
    fn barnes_hut_keeps_clusters_apart() {
        let config = TsneConfig { iterations: 500, perplexity: 5.0, max_exact_points: 0, ..TsneConfig::default() };
        let layout = Tsne::from_config(&config).reduce(&two_clusters(20)).unwrap();
        assert_eq!(40, layout.len());
        let within = distance(&layout[0], &layout[19]).max(distance(&layout[20], &layout[39]));
        let between = distance(&layout[0], &layout[20]);
        assert!(within < between);
    }

    #[test]
    fn is_deterministic_for_a_seed() {
        let points = two_clusters(6);
        let exact = Tsne::from_config(&TsneConfig { iterations: 50, ..TsneConfig::default() });
        assert_eq!(exact.reduce(&points).unwrap(), exact.reduce(&points).unwrap());
        let barnes_hut = Tsne::from_config(&TsneConfig { iterations: 50, max_exact_points: 0, ..TsneConfig::default() });
        assert_eq!(barnes_hut.reduce(&points).unwrap(), barnes_hut.reduce(&points).unwrap());
    }

    #[test]
    fn vantage_point_tree_finds_nearest_neighbours() {
        let points = (0..50).map(|i| vec![(i as f32 * 0.7).sin() * 10f32, (i as f32 * 1.3).cos() * 10f32]).collect::<Vec<Vec<f32>>>();
        let mut rng = XorShiftRng::from_seed([1, 2, 3, 4]);
        let tree = VpNode::build(&points, (0..50).collect(), &mut rng).unwrap();
        for target in 0..50 {
            let mut expected = (0..50).filter(|&j| j != target)
                .map(|j| (squared_distance(&points[target], &points[j]), j))
                .collect::<Vec<(f64, usize)>>();
            expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let found = tree.nearest(&points, target, 5).into_iter().map(|(j, _)| j).collect::<Vec<usize>>();
            assert_eq!(expected.iter().take(5).map(|&(_, j)| j).collect::<Vec<usize>>(), found);
        }
    }

    #[test]
    fn quadtree_without_approximation_is_exact() {
        let y = vec![[0f64, 0f64], [1f64, 0f64], [0f64, 2f64], [-3f64, 1f64], [1f64, 0f64]];
        let tree = QuadTree::new(&y);
        assert_eq!(5, tree.nodes[0].mass);
        for i in 0..y.len() {
            let mut force = [0f64; 2];
            let sum_q = tree.repulsion(i, &y, 0f64, &mut force);
            let mut expected_force = [0f64; 2];
            let mut expected_sum = 0f64;
            for j in 0..y.len() {
                if j != i {
                    let dx = [y[i][0] - y[j][0], y[i][1] - y[j][1]];
                    let q = 1f64 / (1f64 + dx[0] * dx[0] + dx[1] * dx[1]);
                    expected_sum += q;
                    expected_force[0] += q * q * dx[0];
                    expected_force[1] += q * q * dx[1];
                }
            }
            assert!((sum_q - expected_sum).abs() < 1e-12);
            assert!((force[0] - expected_force[0]).abs() < 1e-12);
            assert!((force[1] - expected_force[1]).abs() < 1e-12);
        }
    }
}
