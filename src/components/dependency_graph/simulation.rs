//! Velocity-Verlet force layout: link, charge, collision and center forces
//! applied once per tick while alpha decays toward its target.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, warn};

use super::normalize::NormalizedGraph;
use super::policy::ForceParams;
use super::quadtree::QuadTree;

const INITIAL_RADIUS: f64 = 10.0;
/// Squared distance below which charge is softened, so coincident nodes don't explode.
const CHARGE_DISTANCE_MIN2: f64 = 1.0;

/// Simulation state for the graph node at the same index.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	/// Graph-space position.
	pub x: f64,
	/// Graph-space position.
	pub y: f64,
	/// Velocity, graph units per tick.
	pub vx: f64,
	/// Velocity, graph units per tick.
	pub vy: f64,
	/// Fixed coordinate set while dragged or pinned; the integrator holds the node here.
	pub fx: Option<f64>,
	/// See `fx`.
	pub fy: Option<f64>,
	/// Collision and drawing radius.
	pub radius: f64,
}

impl SimNode {
	/// Whether either coordinate is fixed.
	pub fn is_fixed(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

#[derive(Clone, Copy, Debug)]
struct Link {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

/// Linear congruential generator used for jiggling coincident points.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	const A: u64 = 1_664_525;
	const C: u64 = 1_013_904_223;
	const M: u64 = 4_294_967_296;

	fn next(&mut self) -> f64 {
		self.0 = (Self::A.wrapping_mul(self.0).wrapping_add(Self::C)) % Self::M;
		self.0 as f64 / Self::M as f64
	}
}

/// Uniform bucket grid for collision neighborhoods.
struct SpatialGrid {
	cell: f64,
	buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
	fn build(cell: f64, points: impl Iterator<Item = (usize, f64, f64)>) -> Self {
		let cell = cell.max(1.0);
		let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
		for (idx, x, y) in points {
			buckets.entry(Self::key(cell, x, y)).or_default().push(idx);
		}
		Self { cell, buckets }
	}

	fn key(cell: f64, x: f64, y: f64) -> (i64, i64) {
		((x / cell).floor() as i64, (y / cell).floor() as i64)
	}

	fn neighbors(&self, x: f64, y: f64) -> impl Iterator<Item = usize> + '_ {
		let (cx, cy) = Self::key(self.cell, x, y);
		(-1..=1)
			.flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
			.filter_map(|key| self.buckets.get(&key))
			.flatten()
			.copied()
	}
}

/// d3-style force simulation over the nodes of a [`NormalizedGraph`].
pub struct ForceSimulation {
	nodes: Vec<SimNode>,
	links: Vec<Link>,
	params: ForceParams,
	alpha: f64,
	alpha_target: f64,
	rng: Lcg,
	ticks: u64,
	charge_interactions: usize,
}

impl ForceSimulation {
	/// Nodes start on a phyllotaxis spiral around the origin, alpha at 1.
	pub fn new(graph: &NormalizedGraph, params: ForceParams) -> Self {
		let angle_step = PI * (3.0 - 5f64.sqrt());
		let nodes = (0..graph.len())
			.map(|i| {
				let r = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * angle_step;
				SimNode {
					x: r * angle.cos(),
					y: r * angle.sin(),
					vx: 0.0,
					vy: 0.0,
					fx: None,
					fy: None,
					radius: graph.radius(i),
				}
			})
			.collect::<Vec<_>>();

		let mut degree = vec![0usize; nodes.len()];
		for edge in &graph.edges {
			degree[edge.source] += 1;
			degree[edge.target] += 1;
		}
		let links = graph
			.edges
			.iter()
			.filter(|e| e.source != e.target)
			.map(|e| {
				let (ds, dt) = (degree[e.source] as f64, degree[e.target] as f64);
				Link {
					source: e.source,
					target: e.target,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		Self {
			nodes,
			links,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			rng: Lcg(1),
			ticks: 0,
			charge_interactions: 0,
		}
	}

	/// All node states, indexed like the graph.
	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	/// State of one node.
	pub fn node(&self, idx: usize) -> Option<&SimNode> {
		self.nodes.get(idx)
	}

	/// Current position of one node.
	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		self.nodes.get(idx).map(|n| (n.x, n.y))
	}

	/// Parameters the simulation runs with.
	pub fn params(&self) -> &ForceParams {
		&self.params
	}

	/// Current cooling temperature.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Value alpha decays toward.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Ticks run so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Pairwise and centroid charge terms evaluated by the last tick.
	pub fn charge_interactions(&self) -> usize {
		self.charge_interactions
	}

	/// Alpha decays toward this; nonzero keeps the layout moving.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Raise alpha so the layout reacts to an interaction.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
	}

	/// Whether alpha has cooled below `alpha_min` for good.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.params.alpha_min && self.alpha_target <= self.alpha
	}

	/// Pin a node to `(x, y)`; the integrator will not move it.
	pub fn fix(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.fx = Some(x);
			node.fy = Some(y);
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	/// Return a node to force-driven motion.
	pub fn release(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Whether node `idx` is held by `fx`/`fy`.
	pub fn is_fixed(&self, idx: usize) -> bool {
		self.nodes.get(idx).is_some_and(SimNode::is_fixed)
	}

	/// Pick up radii after dependent counts changed.
	pub fn set_radii(&mut self, graph: &NormalizedGraph) {
		for (idx, node) in self.nodes.iter_mut().enumerate() {
			node.radius = graph.radius(idx);
		}
	}

	/// Advance one tick unless settled. Returns whether positions changed.
	pub fn step(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		self.tick();
		if self.is_settled() {
			debug!("layout settled after {} ticks", self.ticks);
		}
		true
	}

	/// Advance one tick regardless of alpha.
	pub fn tick(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;

		self.apply_link(alpha);
		self.apply_charge(alpha);
		self.apply_collision();
		self.apply_center();
		self.integrate();
		self.ticks += 1;
	}

	fn jiggle(&mut self) -> f64 {
		(self.rng.next() - 0.5) * 1e-6
	}

	fn apply_link(&mut self, alpha: f64) {
		let distance = self.params.link_distance;
		for _ in 0..self.params.link_iterations.max(1) {
			for i in 0..self.links.len() {
				let Link {
					source,
					target,
					strength,
					bias,
				} = self.links[i];
				let (s, t) = (&self.nodes[source], &self.nodes[target]);
				let mut x = t.x + t.vx - s.x - s.vx;
				let mut y = t.y + t.vy - s.y - s.vy;
				if x == 0.0 {
					x = self.jiggle();
				}
				if y == 0.0 {
					y = self.jiggle();
				}
				let len = (x * x + y * y).sqrt();
				let l = (len - distance) / len * alpha * strength;
				let (x, y) = (x * l, y * l);

				let t = &mut self.nodes[target];
				t.vx -= x * bias;
				t.vy -= y * bias;
				let s = &mut self.nodes[source];
				s.vx += x * (1.0 - bias);
				s.vy += y * (1.0 - bias);
			}
		}
	}

	/// Many-body repulsion. Distant quads act through their centroid once
	/// `size / distance < theta`; nothing beyond `charge_distance_max` is felt.
	fn apply_charge(&mut self, alpha: f64) {
		let strength = self.params.charge_strength;
		let max = self.params.charge_distance_max;
		let max2 = max * max;
		let theta2 = self.params.theta * self.params.theta;
		let points: Vec<(f64, f64)> = self.nodes.iter().map(|n| (n.x, n.y)).collect();
		let tree = QuadTree::build(&points);
		if tree.root().is_none() {
			self.charge_interactions = 0;
			return;
		}

		let mut interactions = 0;
		let mut stack = Vec::new();
		let mut deltas = vec![(0.0, 0.0); points.len()];
		for (i, delta) in deltas.iter_mut().enumerate() {
			let (xi, yi) = points[i];
			stack.push(0);
			while let Some(q) = stack.pop() {
				let quad = tree.quad(q);
				if quad.count == 0 || quad.distance2_to(xi, yi) >= max2 {
					continue;
				}
				if let Some(children) = quad.children {
					let (x, y) = (quad.cx - xi, quad.cy - yi);
					let l = x * x + y * y;
					if quad.size * quad.size / theta2 < l {
						if l < max2 {
							let w = strength * quad.count as f64 * alpha / l;
							delta.0 += x * w;
							delta.1 += y * w;
							interactions += 1;
						}
					} else {
						stack.extend(children);
					}
					continue;
				}
				for &j in &quad.points {
					if j == i {
						continue;
					}
					let mut x = points[j].0 - xi;
					let mut y = points[j].1 - yi;
					let mut l = x * x + y * y;
					if l >= max2 {
						continue;
					}
					if x == 0.0 {
						x = self.jiggle();
						l += x * x;
					}
					if y == 0.0 {
						y = self.jiggle();
						l += y * y;
					}
					if l < CHARGE_DISTANCE_MIN2 {
						l = (CHARGE_DISTANCE_MIN2 * l).sqrt();
					}
					let w = strength * alpha / l;
					delta.0 += x * w;
					delta.1 += y * w;
					interactions += 1;
				}
			}
		}
		self.charge_interactions = interactions;
		for (node, (dx, dy)) in self.nodes.iter_mut().zip(deltas) {
			node.vx += dx;
			node.vy += dy;
		}
	}

	fn apply_collision(&mut self) {
		let padding = self.params.collision_padding;
		let max_r = self
			.nodes
			.iter()
			.map(|n| n.radius + padding)
			.fold(0.0, f64::max);
		let grid = SpatialGrid::build(
			max_r * 2.0,
			self.nodes
				.iter()
				.enumerate()
				.map(|(i, n)| (i, n.x + n.vx, n.y + n.vy)),
		);

		for i in 0..self.nodes.len() {
			let ri = self.nodes[i].radius + padding;
			let xi = self.nodes[i].x + self.nodes[i].vx;
			let yi = self.nodes[i].y + self.nodes[i].vy;
			let candidates: Vec<usize> = grid.neighbors(xi, yi).filter(|&j| j > i).collect();
			for j in candidates {
				let rj = self.nodes[j].radius + padding;
				let r = ri + rj;
				let mut x = xi - (self.nodes[j].x + self.nodes[j].vx);
				let mut y = yi - (self.nodes[j].y + self.nodes[j].vy);
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle();
					l += y * y;
				}
				let len = l.sqrt();
				let push = (r - len) / len;
				let (x, y) = (x * push, y * push);
				let share = (rj * rj) / (ri * ri + rj * rj);

				let a = &mut self.nodes[i];
				a.vx += x * share;
				a.vy += y * share;
				let b = &mut self.nodes[j];
				b.vx -= x * (1.0 - share);
				b.vy -= y * (1.0 - share);
			}
		}
	}

	fn apply_center(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (mx, my) = (sx / n, sy / n);
		for node in &mut self.nodes {
			node.x -= mx;
			node.y -= my;
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.params.velocity_decay;
		let mut reset = Vec::new();
		for (idx, node) in self.nodes.iter_mut().enumerate() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
			if !(node.x.is_finite() && node.y.is_finite()) {
				reset.push(idx);
			}
		}
		for idx in reset {
			warn!("node {idx} left the finite plane, resetting to origin");
			let (jx, jy) = (self.jiggle(), self.jiggle());
			let node = &mut self.nodes[idx];
			node.x = jx;
			node.y = jy;
			node.vx = 0.0;
			node.vy = 0.0;
			if node.is_fixed() {
				node.fx = Some(jx);
				node.fy = Some(jy);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_graph::normalize::normalize;
	use crate::components::dependency_graph::policy::SizeTier;
	use crate::components::dependency_graph::sample::sample_graph;

	fn simulation(n: usize) -> ForceSimulation {
		let graph = normalize(&sample_graph(n, 7), None);
		ForceSimulation::new(&graph, ForceParams::default())
	}

	#[test]
	fn alpha_decays_monotonically_until_settled() {
		let mut sim = simulation(30);
		let mut prev = sim.alpha();
		let mut ticks = 0;
		while sim.step() {
			assert!(sim.alpha() < prev);
			prev = sim.alpha();
			ticks += 1;
			assert!(ticks < 1000, "simulation never settled");
		}
		assert!(sim.is_settled());
		assert!(!sim.step());
	}

	#[test]
	fn fixed_node_holds_position() {
		let mut sim = simulation(20);
		sim.fix(3, 42.0, -17.5);
		for _ in 0..50 {
			sim.tick();
			assert_eq!(sim.position(3), Some((42.0, -17.5)));
		}
		sim.release(3);
		assert!(!sim.is_fixed(3));
	}

	#[test]
	fn drag_target_keeps_simulation_warm() {
		let mut sim = simulation(10);
		for _ in 0..400 {
			sim.tick();
		}
		assert!(sim.is_settled());
		sim.set_alpha_target(0.3);
		assert!(!sim.is_settled());
		for _ in 0..400 {
			sim.step();
		}
		assert!((sim.alpha() - 0.3).abs() < 0.01);
		sim.set_alpha_target(0.0);
		while sim.step() {}
		assert!(sim.alpha() < sim.params().alpha_min);
	}

	#[test]
	fn layout_is_deterministic_and_finite() {
		let (mut a, mut b) = (simulation(60), simulation(60));
		for _ in 0..80 {
			a.tick();
			b.tick();
		}
		assert_eq!(a.nodes(), b.nodes());
		assert!(a.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn coincident_nodes_are_separated() {
		let mut sim = simulation(2);
		sim.nodes[0].x = 5.0;
		sim.nodes[0].y = 5.0;
		sim.nodes[1].x = 5.0;
		sim.nodes[1].y = 5.0;
		for _ in 0..100 {
			sim.tick();
		}
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
		assert!(d > a.radius, "nodes still overlap at distance {d}");
	}

	#[test]
	fn center_force_keeps_mean_at_origin() {
		let mut sim = simulation(40);
		for _ in 0..100 {
			sim.tick();
		}
		let n = sim.nodes().len() as f64;
		let mx = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
		let my = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
		// integration after centering moves the mean by at most the mean velocity
		assert!(mx.abs() < 10.0 && my.abs() < 10.0);
	}

	#[test]
	fn non_finite_positions_are_reset() {
		let mut sim = simulation(3);
		sim.nodes[1].vx = f64::INFINITY;
		sim.tick();
		assert!(sim.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn very_large_charge_work_stays_near_linear() {
		let n = 10_000;
		let graph = normalize(&sample_graph(n, 7), None);
		let mut sim = ForceSimulation::new(&graph, ForceParams::for_tier(SizeTier::VeryLarge));
		for _ in 0..3 {
			sim.tick();
			// an exact pass within distance_max would touch several hundred neighbours per node
			assert!(
				sim.charge_interactions() < n * 100,
				"{} charge terms for {n} nodes",
				sim.charge_interactions()
			);
			assert!(sim.charge_interactions() > 0);
		}
		assert!(sim.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn approximation_tracks_exact_repulsion() {
		let graph = normalize(&sample_graph(300, 3), None);
		let exact = ForceParams {
			theta: 0.0,
			..ForceParams::default()
		};
		let mut a = ForceSimulation::new(&graph, exact);
		let mut b = ForceSimulation::new(&graph, ForceParams::default());
		a.apply_charge(1.0);
		b.apply_charge(1.0);
		assert!(b.charge_interactions() < a.charge_interactions());
		let (mut err, mut total) = (0.0, 0.0);
		for (x, y) in a.nodes().iter().zip(b.nodes()) {
			err += (x.vx - y.vx).hypot(x.vy - y.vy);
			total += x.vx.hypot(x.vy);
		}
		assert!(err / total < 0.1, "relative error {}", err / total);
	}
}
