//! Barnes–Hut quadtree over node positions, used to approximate the
//! many-body charge force.

/// Depth at which coincident points stop splitting and share a leaf.
const MAX_DEPTH: usize = 24;

#[derive(Clone, Debug)]
pub(crate) struct Quad {
	pub x0: f64,
	pub y0: f64,
	pub size: f64,
	pub children: Option<[usize; 4]>,
	/// Point indices held by a leaf.
	pub points: Vec<usize>,
	/// Number of points under this quad.
	pub count: usize,
	/// Centroid of the points under this quad.
	pub cx: f64,
	pub cy: f64,
}

impl Quad {
	fn new(x0: f64, y0: f64, size: f64) -> Self {
		Self {
			x0,
			y0,
			size,
			children: None,
			points: Vec::new(),
			count: 0,
			cx: 0.0,
			cy: 0.0,
		}
	}

	/// Squared distance from `(x, y)` to the nearest point of the quad's square.
	pub fn distance2_to(&self, x: f64, y: f64) -> f64 {
		let dx = (self.x0 - x).max(0.0).max(x - (self.x0 + self.size));
		let dy = (self.y0 - y).max(0.0).max(y - (self.y0 + self.size));
		dx * dx + dy * dy
	}
}

/// Arena quadtree. Index 0 is the root; children always sit after their parent.
#[derive(Clone, Debug, Default)]
pub(crate) struct QuadTree {
	quads: Vec<Quad>,
}

impl QuadTree {
	pub fn build(points: &[(f64, f64)]) -> Self {
		let mut tree = Self::default();
		if points.is_empty() {
			return tree;
		}
		let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
		let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &(x, y) in points {
			x0 = x0.min(x);
			y0 = y0.min(y);
			x1 = x1.max(x);
			y1 = y1.max(y);
		}
		// Pad so points on the far edge still fall strictly inside.
		let size = (x1 - x0).max(y1 - y0).max(1.0) * (1.0 + 1e-9) + 1e-9;
		tree.quads.push(Quad::new(x0, y0, size));
		for idx in 0..points.len() {
			tree.insert(idx, points);
		}
		tree.accumulate(points);
		tree
	}

	pub fn root(&self) -> Option<&Quad> {
		self.quads.first()
	}

	pub fn quad(&self, idx: usize) -> &Quad {
		&self.quads[idx]
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.quads.len()
	}

	fn quadrant(&self, quad: usize, (x, y): (f64, f64)) -> usize {
		let q = &self.quads[quad];
		let half = q.size / 2.0;
		let right = x >= q.x0 + half;
		let bottom = y >= q.y0 + half;
		usize::from(right) | (usize::from(bottom) << 1)
	}

	fn split(&mut self, quad: usize) -> [usize; 4] {
		let (x0, y0, half) = {
			let q = &self.quads[quad];
			(q.x0, q.y0, q.size / 2.0)
		};
		let first = self.quads.len();
		for i in 0..4 {
			let x = if i & 1 == 1 { x0 + half } else { x0 };
			let y = if i & 2 == 2 { y0 + half } else { y0 };
			self.quads.push(Quad::new(x, y, half));
		}
		let children = [first, first + 1, first + 2, first + 3];
		self.quads[quad].children = Some(children);
		children
	}

	fn insert(&mut self, idx: usize, points: &[(f64, f64)]) {
		let mut quad = 0;
		let mut depth = 0;
		loop {
			if let Some(children) = self.quads[quad].children {
				quad = children[self.quadrant(quad, points[idx])];
				depth += 1;
				continue;
			}
			if self.quads[quad].points.is_empty() || depth >= MAX_DEPTH {
				self.quads[quad].points.push(idx);
				return;
			}
			let children = self.split(quad);
			for held in std::mem::take(&mut self.quads[quad].points) {
				let child = children[self.quadrant(quad, points[held])];
				self.quads[child].points.push(held);
			}
		}
	}

	/// Fill counts and centroids bottom-up.
	fn accumulate(&mut self, points: &[(f64, f64)]) {
		for idx in (0..self.quads.len()).rev() {
			let (count, sx, sy) = match self.quads[idx].children {
				Some(children) => children.iter().fold((0, 0.0, 0.0), |(n, sx, sy), &c| {
					let q = &self.quads[c];
					let w = q.count as f64;
					(n + q.count, sx + q.cx * w, sy + q.cy * w)
				}),
				None => self.quads[idx]
					.points
					.iter()
					.fold((0, 0.0, 0.0), |(n, sx, sy), &p| {
						(n + 1, sx + points[p].0, sy + points[p].1)
					}),
			};
			let q = &mut self.quads[idx];
			q.count = count;
			if count > 0 {
				q.cx = sx / count as f64;
				q.cy = sy / count as f64;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_tree_has_no_root() {
		assert!(QuadTree::build(&[]).root().is_none());
	}

	#[test]
	fn root_aggregates_every_point() {
		let points = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (5.0, 5.0)];
		let tree = QuadTree::build(&points);
		let root = tree.root().unwrap();
		assert_eq!(root.count, 5);
		assert!((root.cx - 5.0).abs() < 1e-9);
		assert!((root.cy - 5.0).abs() < 1e-9);
	}

	#[test]
	fn leaves_hold_each_point_once() {
		let points: Vec<(f64, f64)> = (0..50).map(|i| ((i * 7 % 13) as f64, (i * 3 % 11) as f64)).collect();
		let tree = QuadTree::build(&points);
		let mut seen: Vec<usize> = (0..tree.len())
			.flat_map(|q| tree.quad(q).points.clone())
			.collect();
		seen.sort_unstable();
		assert_eq!(seen, (0..50).collect::<Vec<_>>());
		for q in 0..tree.len() {
			let quad = tree.quad(q);
			if let Some(children) = quad.children {
				assert!(quad.points.is_empty());
				let sum: usize = children.iter().map(|&c| tree.quad(c).count).sum();
				assert_eq!(sum, quad.count);
			}
		}
	}

	#[test]
	fn coincident_points_share_a_leaf() {
		let points = [(3.0, 3.0), (3.0, 3.0), (3.0, 3.0)];
		let tree = QuadTree::build(&points);
		let leaf = (0..tree.len())
			.map(|q| tree.quad(q))
			.find(|q| !q.points.is_empty())
			.unwrap();
		assert_eq!(leaf.points.len(), 3);
		assert_eq!(tree.root().unwrap().count, 3);
	}

	#[test]
	fn distance_to_square() {
		let quad = Quad::new(0.0, 0.0, 10.0);
		assert_eq!(quad.distance2_to(5.0, 5.0), 0.0);
		assert_eq!(quad.distance2_to(13.0, 5.0), 9.0);
		assert_eq!(quad.distance2_to(-3.0, 14.0), 25.0);
	}
}
