use glam::{DVec2, DVec3};

/// An orthonormal basis describing a single orthographic view: `right` and
/// `up` span the view plane (U, V), `forward` points into the screen (the
/// direction depth increases along), and `origin` is the view-space zero
/// point in world coordinates.
///
/// Construction defends against a degenerate or left-handed input basis:
/// `right`/`up`/`forward` are re-orthonormalized via Gram-Schmidt and
/// `forward` is flipped if it runs backward relative to `right x up`, so
/// `world_to_view` always reports depth increasing away from the viewer
/// regardless of how the host handed us the raw vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
	pub right: DVec3,
	pub up: DVec3,
	pub forward: DVec3,
	pub origin: DVec3,
}

impl ViewBasis {
	/// Builds a basis from raw, not-necessarily-orthonormal vectors.
	/// Returns `None` if `right`/`up` are parallel or zero-length (a
	/// genuinely unsupported, degenerate view).
	pub fn from_raw(origin: DVec3, right: DVec3, up: DVec3) -> Option<Self> {
		let right = right.try_normalize()?;
		let up_ortho = (up - right * right.dot(up)).try_normalize()?;
		let mut forward = right.cross(up_ortho);
		forward = forward.try_normalize()?;

		// If the supplied `up` actually points opposite the re-orthonormalized
		// one, `right x up` flips too; detect and correct the handedness so
		// forward consistently points into the screen.
		if forward.dot(right.cross(up_ortho)) < 0.0 {
			forward = -forward;
		}

		Some(Self { right, up: up_ortho, forward, origin })
	}

	/// Projects a world-space point into view space: `(u, v, w)` where `u`
	/// and `v` are in-plane coordinates and `w` is signed depth along
	/// `forward` (increasing away from the viewer).
	pub fn world_to_view(&self, point: DVec3) -> DVec3 {
		let d = point - self.origin;
		DVec3::new(self.right.dot(d), self.up.dot(d), self.forward.dot(d))
	}

	pub fn world_to_uv(&self, point: DVec3) -> DVec2 {
		let view = self.world_to_view(point);
		DVec2::new(view.x, view.y)
	}

	pub fn depth(&self, point: DVec3) -> f64 {
		self.forward.dot(point - self.origin)
	}

	/// A face is front-facing toward this view when its normal points back
	/// toward the viewer, i.e. opposite `forward`.
	pub fn is_front_facing(&self, normal: DVec3) -> bool {
		normal.dot(self.forward) < 0.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn orthonormal_basis_round_trips_plane_point() {
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		let uv = basis.world_to_uv(DVec3::new(3.0, 4.0, 0.0));
		assert_eq!(uv, DVec2::new(3.0, 4.0));
	}

	#[test]
	fn depth_increases_away_from_viewer() {
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		assert!(basis.depth(DVec3::new(0.0, 0.0, 5.0)) > basis.depth(DVec3::new(0.0, 0.0, 1.0)));
	}

	#[test]
	fn parallel_right_up_is_rejected() {
		assert!(ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::X * 2.0).is_none());
	}

	#[test]
	fn front_facing_normal_points_toward_viewer() {
		let basis = ViewBasis::from_raw(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
		assert!(basis.is_front_facing(-basis.forward));
		assert!(!basis.is_front_facing(basis.forward));
	}
}
