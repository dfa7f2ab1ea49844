//! glam <-> nalgebra conversions. Engine types never leave this crate.

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use tumble_common::Pose;

pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Caller guarantees `pose.is_valid()`.
pub(crate) fn to_isometry(pose: &Pose) -> Isometry3<f32> {
    let r = pose.rotation.normalize();
    let rotation = UnitQuaternion::new_unchecked(Quaternion::new(r.w, r.x, r.y, r.z));
    let p = pose.position;
    Isometry3::from_parts(Translation3::new(p.x, p.y, p.z), rotation)
}

pub(crate) fn from_isometry(iso: &Isometry3<f32>) -> Pose {
    let t = iso.translation.vector;
    let q = iso.rotation;
    Pose::new(Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(q.i, q.j, q.k, q.w))
}
