use cgmath::{InnerSpace, Point3, Rad, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use super::kernel::{curved_distance, curved_to_euc, euc_to_curved3, EPSILON, ORIGIN};

/// Curvature used for everything measured on the spherical world.
pub const SPHERE_CURVE: f32 = 1.0;

/// Which of the two charts covering the spherical world a point is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chart {
    Primary,
    Secondary,
}

impl Chart {
    /// The other chart.
    pub fn opposite(self) -> Self {
        match self {
            Chart::Primary => Chart::Secondary,
            Chart::Secondary => Chart::Primary,
        }
    }

    fn index(self) -> usize {
        match self {
            Chart::Primary => 0,
            Chart::Secondary => 1,
        }
    }
}

/// Serialized layout of the two charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SphereLayout {
    /// Chart centers in lattice coordinates.
    pub centers: [[i32; 3]; 2],
    /// Horizontal geodesic radius each chart renders before handing off to the other.
    pub cutoff_radius: f32,
}

impl Default for SphereLayout {
    fn default() -> Self {
        Self {
            centers: [[0, 0, 0], [256, 0, 0]],
            cutoff_radius: std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Two flat charts that together cover a spherical world.
///
/// Each chart is a patch of the voxel lattice around its center. Horizontal offsets
/// from a center, divided by `radius`, are read as geodesic offsets on the unit
/// sphere; height stays vertical. The secondary chart sees the sphere rotated by a half turn
/// in the x–w plane, so a point at horizontal distance `d` from one center lies at
/// `π − d` from the other. Each chart only renders out to `cutoff_radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCharts {
    layout: SphereLayout,
    scale: f32,
    radius: f32,
}

impl SphereCharts {
    /// # Arguments
    /// * `layout` - Chart centers and cutoff
    /// * `scale` - World units per lattice step
    /// * `radius` - World units per radian of the sphere
    pub fn new(layout: SphereLayout, scale: f32, radius: f32) -> Self {
        Self {
            layout,
            scale,
            radius,
        }
    }

    /// World units per radian.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn cutoff_radius(&self) -> f32 {
        self.layout.cutoff_radius
    }

    /// Center of `chart` in world units.
    pub fn center(&self, chart: Chart) -> Point3<f32> {
        let [x, y, z] = self.layout.centers[chart.index()];
        Point3::new(x as f32, y as f32, z as f32) * self.scale
    }

    /// Chart whose center is horizontally nearest to `point`, measured on the lattice.
    pub fn chart_for(&self, point: Point3<f32>) -> Chart {
        let primary = self.horizontal_offset(point, Chart::Primary).magnitude2();
        let secondary = self.horizontal_offset(point, Chart::Secondary).magnitude2();
        if secondary < primary {
            Chart::Secondary
        } else {
            Chart::Primary
        }
    }

    /// Horizontal offset of `point` from the center of `chart`.
    pub fn horizontal_offset(&self, point: Point3<f32>, chart: Chart) -> Vector3<f32> {
        let center = self.center(chart);
        Vector3::new(point.x - center.x, 0.0, point.z - center.z)
    }

    /// Horizontal geodesic distance of `point` from the center of `chart`.
    pub fn horizontal_distance(&self, point: Point3<f32>, chart: Chart) -> f32 {
        let offset = self.horizontal_offset(point, chart) / self.radius;
        curved_distance(ORIGIN, euc_to_curved3(offset, SPHERE_CURVE), SPHERE_CURVE)
    }

    /// Returns `true` once `point` has left the rendered region of `chart`.
    pub fn needs_transport(&self, point: Point3<f32>, chart: Chart) -> bool {
        self.horizontal_distance(point, chart) > self.layout.cutoff_radius
    }

    /// Embeds a world-unit offset from the center of `chart` onto the unit sphere, in
    /// the shared frame.
    ///
    /// The primary chart is the identity frame; the secondary one is rotated by the x–w half turn.
    pub fn to_shared_frame(&self, offset: Vector3<f32>, chart: Chart) -> Vector4<f32> {
        let embedded = euc_to_curved3(offset / self.radius, SPHERE_CURVE);
        match chart {
            Chart::Primary => embedded,
            Chart::Secondary => flip(embedded),
        }
    }

    /// Re-expresses `point` of `chart` in the opposite chart.
    ///
    /// The horizontal offset is carried across the half turn; height and vertical
    /// offset are preserved. Applying it twice returns the original point.
    pub fn transport(&self, point: Point3<f32>, chart: Chart) -> Point3<f32> {
        let offset = self.horizontal_offset(point, chart) / self.radius;
        let crossed =
            curved_to_euc(flip(euc_to_curved3(offset, SPHERE_CURVE)), SPHERE_CURVE) * self.radius;

        let target = self.center(chart.opposite());
        Point3::new(target.x + crossed.x, point.y, target.z + crossed.z)
    }

    /// Turn applied to a horizontal heading carried across with [`SphereCharts::transport`].
    ///
    /// At the seam the chart change acts on tangent directions as a rotation by twice
    /// the polar angle of `point` around the center of `chart`, in the opposite sense.
    /// Headings are measured from +x towards +z.
    pub fn heading_turn(&self, point: Point3<f32>, chart: Chart) -> Rad<f32> {
        let offset = self.horizontal_offset(point, chart);
        if offset.magnitude2() < EPSILON * EPSILON {
            return Rad(0.0);
        }
        Rad(-2.0 * offset.z.atan2(offset.x))
    }

    /// Offset of `point` from the center of `chart`, including height.
    pub fn local_offset(&self, point: Point3<f32>, chart: Chart) -> Vector3<f32> {
        point - self.center(chart)
    }
}

fn flip(point: Vector4<f32>) -> Vector4<f32> {
    Vector4::new(-point.x, point.y, point.z, -point.w)
}
