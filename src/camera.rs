use cgmath::{Matrix4, Point3, Vector3};
use winit::event::VirtualKeyCode;

/// wgpu clip space puts z in [0, 1] while cgmath's frustum produces the
/// OpenGL [-1, 1] range, so projection matrices get remapped before upload.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Walking camera: a fixed-height eye point plus a yaw angle. The look
/// target is always one unit ahead of the eye along the yaw direction.
pub struct Camera {
    pub eye: Point3<f32>,
    pub camera_angle: f32,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            eye: Point3::new(-3.0, 2.0, 0.0),
            camera_angle: 0.0,
            up: Vector3::unit_y(),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            self.eye.x + self.camera_angle.cos(),
            self.eye.y,
            self.eye.z + self.camera_angle.sin(),
        )
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.center(), self.up)
    }

    /// Near-plane frustum widened along whichever window axis is longer,
    /// so the scene keeps its proportions under resize.
    pub fn projection(ww: u32, hh: u32) -> Matrix4<f32> {
        let mut xratio = 1.0f32;
        let mut yratio = 1.0f32;
        if ww <= hh {
            yratio = hh as f32 / ww as f32;
        } else {
            xratio = ww as f32 / hh as f32;
        }
        cgmath::frustum(
            -0.1 * xratio,
            0.1 * xratio,
            -0.1 * yratio,
            0.1 * yratio,
            0.1,
            20.0,
        )
    }
}

/// Maps discrete key presses onto camera yaw and dolly moves.
pub struct CameraController {
    yaw_step: f32,
    step_size: f32,
}

impl CameraController {
    pub fn new(yaw_step: f32, step_size: f32) -> Self {
        Self {
            yaw_step,
            step_size,
        }
    }

    pub fn process_key(&self, keycode: &VirtualKeyCode, camera: &mut Camera) -> bool {
        match keycode {
            VirtualKeyCode::A => {
                camera.camera_angle -= self.yaw_step;
                true
            }
            VirtualKeyCode::D => {
                camera.camera_angle += self.yaw_step;
                true
            }
            VirtualKeyCode::W => {
                let dir = camera.center() - camera.eye;
                camera.eye += dir * self.step_size;
                true
            }
            VirtualKeyCode::S => {
                let dir = camera.center() - camera.eye;
                camera.eye -= dir * self.step_size;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, InnerSpace};

    fn mats_close(a: Matrix4<f32>, b: Matrix4<f32>) -> bool {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn initial_camera_looks_down_positive_x() {
        let camera = Camera::new();
        let dir = camera.center() - camera.eye;
        assert!((dir.x - 1.0).abs() < 1e-6);
        assert!(dir.y.abs() < 1e-6);
        assert!(dir.z.abs() < 1e-6);
        assert_eq!(camera.eye.to_vec(), Vector3::new(-3.0, 2.0, 0.0));
    }

    #[test]
    fn wide_window_widens_x() {
        let xr = 800.0f32 / 600.0;
        let expected = cgmath::frustum(-0.1 * xr, 0.1 * xr, -0.1, 0.1, 0.1, 20.0);
        assert!(mats_close(Camera::projection(800, 600), expected));
    }

    #[test]
    fn tall_window_widens_y() {
        let yr = 900.0f32 / 450.0;
        let expected = cgmath::frustum(-0.1, 0.1, -0.1 * yr, 0.1 * yr, 0.1, 20.0);
        assert!(mats_close(Camera::projection(450, 900), expected));
    }

    #[test]
    fn square_window_is_unit_ratio() {
        let expected = cgmath::frustum(-0.1, 0.1, -0.1, 0.1, 0.1, 20.0);
        assert!(mats_close(Camera::projection(512, 512), expected));
    }

    #[test]
    fn yaw_and_dolly_keys_move_camera() {
        let mut camera = Camera::new();
        let controller = CameraController::new(0.1, 0.5);
        assert!(controller.process_key(&VirtualKeyCode::D, &mut camera));
        assert!((camera.camera_angle - 0.1).abs() < 1e-6);
        let before = camera.eye;
        assert!(controller.process_key(&VirtualKeyCode::W, &mut camera));
        let moved = camera.eye - before;
        // half a unit along the (unit length) view direction
        assert!((moved.magnitude() - 0.5).abs() < 1e-5);
        assert!(!controller.process_key(&VirtualKeyCode::Q, &mut camera));
    }
}
