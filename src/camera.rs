//! Perspective orbit camera.

use glam::{Mat4, Vec2, Vec3};

pub const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const MIN_DISTANCE: f32 = 1.5;
pub const MAX_DISTANCE: f32 = 50.0;

/// Radians of orbit per pixel of mouse motion.
pub const ROTATE_SPEED: f32 = 0.005;

// keeps the eye off the poles where the up vector degenerates
const MIN_POLAR: f32 = 0.01;

/// Camera orbiting a target point.
///
/// Input is accumulated by [`Camera::rotate`] and [`Camera::zoom`] and
/// released gradually by [`Camera::update`], once per frame.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    damping: f32,
    pending_orbit: Vec2,
    pending_zoom: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y: DEFAULT_FOV_Y,
            aspect: 1.0,
            damping: 0.2,
            pending_orbit: Vec2::ZERO,
            pending_zoom: 0.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_view_matrix();
        camera.update_projection_matrix();
        camera
    }

    /// Fraction of pending motion applied per update, in `(0, 1]`.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(f32::EPSILON, 1.0);
        self
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, NEAR, FAR);
    }

    /// Queue an orbit by `delta` radians (azimuth, polar).
    pub fn rotate(&mut self, delta: Vec2) {
        self.pending_orbit += delta;
    }

    /// Queue a zoom; positive values move the eye away from the target.
    pub fn zoom(&mut self, delta: f32) {
        self.pending_zoom += delta;
    }

    /// Apply part of the pending motion and refresh the view matrix.
    pub fn update(&mut self) {
        let orbit = self.pending_orbit * self.damping;
        let zoom = self.pending_zoom * self.damping;
        self.pending_orbit -= orbit;
        self.pending_zoom -= zoom;

        if orbit != Vec2::ZERO || zoom != 0.0 {
            let offset = self.eye - self.target;
            let radius = offset.length();
            let azimuth = offset.x.atan2(offset.z) - orbit.x;
            let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() - orbit.y)
                .clamp(MIN_POLAR, std::f32::consts::PI - MIN_POLAR);
            let radius = (radius * zoom.exp()).clamp(MIN_DISTANCE, MAX_DISTANCE);

            self.eye = self.target
                + radius
                    * Vec3::new(
                        polar.sin() * azimuth.sin(),
                        polar.cos(),
                        polar.sin() * azimuth.cos(),
                    );
        }

        self.update_view_matrix();
    }

    fn update_view_matrix(&mut self) {
        self.view = Mat4::look_at_rh(self.eye, self.target, self.up);
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn distance(&self) -> f32 {
        (self.eye - self.target).length()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
    }
}
