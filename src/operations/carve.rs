use crate::camera::{check_epsilon, CameraModel};
use crate::error::{ConfigurationError, Result};
use crate::math::Point3;
use crate::silhouette::Silhouette;
use crate::voxel::VoxelGrid;

/// Outcome of a single carve over a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarveReport {
    /// Voxels that were occupied when the carve started.
    pub examined: usize,
    /// Voxels cleared by this carve.
    pub carved: usize,
    /// Voxels still occupied afterwards.
    pub remaining: usize,
}

/// Carves every voxel that falls outside some camera's silhouette.
///
/// A voxel survives only if its centre projects into the image of **every**
/// camera and lands on that camera's foreground. The result is the
/// intersection of the visual cones, so it does not depend on camera order
/// and carving twice changes nothing.
pub struct Carve<'a, S> {
    cameras: &'a [CameraModel],
    masks: &'a [S],
    epsilon: Option<f64>,
}

impl<'a, S> Carve<'a, S>
where
    S: Silhouette + Sync,
{
    /// Creates a new `Carve` operation. `masks[c]` belongs to `cameras[c]`.
    #[must_use]
    pub fn new(cameras: &'a [CameraModel], masks: &'a [S]) -> Self {
        Self {
            cameras,
            masks,
            epsilon: None,
        }
    }

    /// Overrides every camera's image-bound tolerance.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Checks that cameras and masks pair up one-to-one with matching
    /// image sizes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.cameras.is_empty() {
            return Err(ConfigurationError::NoCameras.into());
        }
        if self.cameras.len() != self.masks.len() {
            return Err(ConfigurationError::CountMismatch {
                cameras: self.cameras.len(),
                masks: self.masks.len(),
            }
            .into());
        }
        for (camera, (model, mask)) in self.cameras.iter().zip(self.masks).enumerate() {
            if model.size() != mask.size() {
                return Err(ConfigurationError::ResolutionMismatch {
                    camera,
                    camera_size: model.size(),
                    mask_size: mask.size(),
                }
                .into());
            }
        }
        if let Some(epsilon) = self.epsilon {
            check_epsilon(epsilon)?;
        }
        Ok(())
    }

    /// Returns `true` if `point` lies inside every camera's visual cone.
    #[must_use]
    pub fn survives(&self, point: &Point3) -> bool {
        self.cameras.iter().zip(self.masks).all(|(camera, mask)| {
            let epsilon = self.epsilon.unwrap_or_else(|| camera.epsilon());
            camera
                .project_with_epsilon(point, epsilon)
                .is_some_and(|p| mask.contains(&p))
        })
    }

    /// Executes the carve, clearing occupancy flags in `grid`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] before touching the grid if the
    /// camera/mask set is malformed.
    pub fn execute(&self, grid: &mut VoxelGrid) -> Result<CarveReport> {
        self.validate()?;

        let examined = grid.occupied_count();
        let carved = grid.retain(|center| self.survives(center));
        let report = CarveReport {
            examined,
            carved,
            remaining: examined - carved,
        };
        tracing::debug!(
            cameras = self.cameras.len(),
            examined = report.examined,
            carved = report.carved,
            remaining = report.remaining,
            "carve finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::camera::{ImageSize, Intrinsics};
    use crate::math::{Aabb, Point2, Vector3};
    use crate::silhouette::SilhouetteMask;
    use crate::HullError;
    use std::collections::BTreeSet;

    const SIZE: ImageSize = ImageSize {
        width: 64,
        height: 64,
    };

    fn camera_at(eye: Point3, up: Vector3) -> CameraModel {
        CameraModel::look_at(
            eye,
            Point3::origin(),
            up,
            Intrinsics::new(160.0, 160.0, 32.0, 32.0),
            SIZE,
        )
        .unwrap()
    }

    /// Foreground disc centred on the principal point.
    fn disc(radius_px: f64) -> SilhouetteMask {
        SilhouetteMask::from_fn(SIZE, |x, y| {
            let dx = f64::from(x) + 0.5 - 32.0;
            let dy = f64::from(y) + 0.5 - 32.0;
            dx * dx + dy * dy <= radius_px * radius_px
        })
    }

    /// Left half of the image is foreground.
    fn left_half() -> SilhouetteMask {
        SilhouetteMask::from_fn(SIZE, |x, _| x < 32)
    }

    fn rig() -> (Vec<CameraModel>, Vec<SilhouetteMask>) {
        let cameras = vec![
            camera_at(Point3::new(0.0, 0.0, 10.0), Vector3::y()),
            camera_at(Point3::new(10.0, 0.0, 0.0), Vector3::z()),
            camera_at(Point3::new(0.0, -10.0, 0.0), Vector3::z()),
        ];
        let masks = vec![disc(12.0), left_half(), disc(20.0)];
        (cameras, masks)
    }

    fn occupied(grid: &VoxelGrid) -> BTreeSet<crate::voxel::VoxelIndex> {
        grid.occupied_voxels().map(|v| v.index).collect()
    }

    #[test]
    fn full_mask_carves_nothing() {
        let cameras = vec![camera_at(Point3::new(0.0, 0.0, 10.0), Vector3::y())];
        let masks = vec![SilhouetteMask::filled(SIZE)];
        let mut grid = VoxelGrid::new(Aabb::cube(0.5), 1000).unwrap();
        let report = Carve::new(&cameras, &masks).execute(&mut grid).unwrap();
        assert_eq!(report.carved, 0);
        assert_eq!(grid.occupied_count(), 1000);
    }

    #[test]
    fn empty_mask_carves_everything() {
        let cameras = vec![camera_at(Point3::new(0.0, 0.0, 10.0), Vector3::y())];
        let masks = vec![SilhouetteMask::empty(SIZE)];
        let mut grid = VoxelGrid::new(Aabb::cube(0.5), 1000).unwrap();
        let report = Carve::new(&cameras, &masks).execute(&mut grid).unwrap();
        assert_eq!(report.remaining, 0);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn carving_is_idempotent() {
        let (cameras, masks) = rig();
        let mut grid = VoxelGrid::new(Aabb::cube(1.5), 8000).unwrap();
        let first = Carve::new(&cameras, &masks).execute(&mut grid).unwrap();
        assert!(first.carved > 0);
        assert!(first.remaining > 0);
        let before = occupied(&grid);

        let second = Carve::new(&cameras, &masks).execute(&mut grid).unwrap();
        assert_eq!(second.carved, 0);
        assert_eq!(occupied(&grid), before);
    }

    #[test]
    fn camera_order_does_not_matter() {
        let (cameras, masks) = rig();
        let mut reference = VoxelGrid::new(Aabb::cube(1.5), 8000).unwrap();
        Carve::new(&cameras, &masks).execute(&mut reference).unwrap();
        let expected = occupied(&reference);

        for order in [[2, 1, 0], [1, 0, 2], [0, 2, 1]] {
            let cams: Vec<_> = order.iter().map(|&i| cameras[i].clone()).collect();
            let ms: Vec<_> = order.iter().map(|&i| masks[i].clone()).collect();
            let mut grid = VoxelGrid::new(Aabb::cube(1.5), 8000).unwrap();
            Carve::new(&cams, &ms).execute(&mut grid).unwrap();
            assert_eq!(occupied(&grid), expected);
        }
    }

    #[test]
    fn carving_one_camera_at_a_time_matches_all_at_once() {
        let (cameras, masks) = rig();
        let mut together = VoxelGrid::new(Aabb::cube(1.5), 4096).unwrap();
        Carve::new(&cameras, &masks).execute(&mut together).unwrap();

        let mut sequential = VoxelGrid::new(Aabb::cube(1.5), 4096).unwrap();
        let mut last = sequential.occupied_count();
        for c in 0..cameras.len() {
            let report = Carve::new(&cameras[c..=c], &masks[c..=c])
                .execute(&mut sequential)
                .unwrap();
            assert!(report.remaining <= last);
            last = report.remaining;
        }
        assert_eq!(occupied(&sequential), occupied(&together));
    }

    #[test]
    fn voxels_behind_the_camera_are_carved() {
        // Camera sits inside the grid looking down -z; the filled mask would
        // accept anything in front of it.
        let cameras = vec![CameraModel::look_at(
            Point3::origin(),
            Point3::new(0.0, 0.0, -1.0),
            Vector3::y(),
            Intrinsics::new(1.0, 1.0, 32.0, 32.0),
            SIZE,
        )
        .unwrap()];
        let masks = vec![SilhouetteMask::filled(SIZE)];
        let mut grid = VoxelGrid::new(Aabb::cube(1.0), 1000).unwrap();
        Carve::new(&cameras, &masks).execute(&mut grid).unwrap();

        assert!(grid.occupied_count() > 0);
        for v in grid.occupied_voxels() {
            assert!(v.center.z < 0.0, "voxel behind camera kept: {:?}", v.center);
        }
        assert!(!Carve::new(&cameras, &masks).survives(&Point3::new(0.0, 0.0, 0.5)));
    }

    #[test]
    fn resolution_mismatch_fails_fast() {
        let cameras = vec![camera_at(Point3::new(0.0, 0.0, 10.0), Vector3::y())];
        let masks = vec![SilhouetteMask::filled(ImageSize::new(32, 64))];
        let mut grid = VoxelGrid::new(Aabb::cube(0.5), 125).unwrap();
        let err = Carve::new(&cameras, &masks).execute(&mut grid);
        assert!(matches!(
            err,
            Err(HullError::Configuration(
                ConfigurationError::ResolutionMismatch { camera: 0, .. }
            ))
        ));
        assert_eq!(grid.occupied_count(), 125);
    }

    #[test]
    fn count_mismatch_and_no_cameras_fail() {
        let (cameras, masks) = rig();
        let mut grid = VoxelGrid::new(Aabb::cube(0.5), 125).unwrap();
        assert!(matches!(
            Carve::new(&cameras, &masks[..2]).execute(&mut grid),
            Err(HullError::Configuration(ConfigurationError::CountMismatch {
                cameras: 3,
                masks: 2
            }))
        ));
        let none: [SilhouetteMask; 0] = [];
        assert!(matches!(
            Carve::new(&[], &none).execute(&mut grid),
            Err(HullError::Configuration(ConfigurationError::NoCameras))
        ));
    }

    #[test]
    fn epsilon_override_is_validated() {
        let (cameras, masks) = rig();
        let mut grid = VoxelGrid::new(Aabb::cube(0.5), 125).unwrap();
        assert!(Carve::new(&cameras, &masks)
            .with_epsilon(-0.5)
            .execute(&mut grid)
            .is_err());
    }

    #[test]
    fn custom_silhouettes_plug_in() {
        struct UpperHalf;
        impl Silhouette for UpperHalf {
            fn size(&self) -> ImageSize {
                SIZE
            }
            fn contains(&self, point: &Point2) -> bool {
                point.y < 32.0 && point.x >= 0.0
            }
        }

        let cameras = vec![camera_at(Point3::new(0.0, 0.0, 10.0), Vector3::y())];
        let mut grid = VoxelGrid::new(Aabb::cube(0.5), 1000).unwrap();
        Carve::new(&cameras, &[UpperHalf]).execute(&mut grid).unwrap();
        // World +y appears upward in the image.
        assert!(grid.occupied_voxels().all(|v| v.center.y > 0.0));
        assert_eq!(grid.occupied_count(), 500);
    }
}
