use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::config::CameraConfig;
use crate::layout::{Vec3, ViewDimension, vec3};

const NEAR_PLANE: f32 = 0.1;
const MAX_PITCH: f32 = 1.45;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomCommand {
    In,
    Out,
    Fit,
    ToNode(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub screen: Pos2,
    /// Distance along the view direction.
    pub depth: f32,
    /// Screen pixels per world unit at this depth.
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CameraPose {
    target: Vec3,
    distance: f32,
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    from: CameraPose,
    to: CameraPose,
    elapsed: f32,
    duration: f32,
}

/// Perspective camera orbiting a target point. The 2D view looks straight down the z axis and
/// ignores orbiting.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    dimension: ViewDimension,
    config: CameraConfig,
    transition: Option<Transition>,
}

struct Basis {
    eye: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig, dimension: ViewDimension) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 400.0,
            yaw: 0.0,
            pitch: 0.0,
            dimension,
            config: config.clamped(),
            transition: None,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_dimension(&mut self, dimension: ViewDimension) {
        self.dimension = dimension;
        if dimension == ViewDimension::Two {
            self.yaw = 0.0;
            self.pitch = 0.0;
        }
    }

    fn fov_radians(&self) -> f32 {
        self.config.fov_degrees.to_radians()
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.config.min_distance, self.config.max_distance)
    }

    fn basis(&self) -> Basis {
        let (yaw, pitch) = match self.dimension {
            ViewDimension::Two => (0.0, 0.0),
            ViewDimension::Three => (self.yaw, self.pitch),
        };
        let offset = vec3(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        ) * self.distance;
        let eye = self.target + offset;
        let forward = (self.target - eye).normalized();
        let right = forward.cross(vec3(0.0, 1.0, 0.0)).normalized();
        let up = right.cross(forward);
        Basis {
            eye,
            forward,
            right,
            up,
        }
    }

    fn focal_length(&self, rect: Rect) -> f32 {
        (rect.height().max(1.0) * 0.5) / (self.fov_radians() * 0.5).tan()
    }

    /// Screen position of a world point, `None` when it is behind the camera.
    pub fn project(&self, rect: Rect, point: Vec3) -> Option<Projection> {
        let basis = self.basis();
        let relative = point - basis.eye;
        let depth = relative.dot(basis.forward);
        if depth <= NEAR_PLANE {
            return None;
        }

        let scale = self.focal_length(rect) / depth;
        let screen = rect.center()
            + vec2(relative.dot(basis.right) * scale, -relative.dot(basis.up) * scale);
        Some(Projection {
            screen,
            depth,
            scale,
        })
    }

    /// World point under `screen` at the given view depth.
    pub fn unproject(&self, rect: Rect, screen: Pos2, depth: f32) -> Vec3 {
        let basis = self.basis();
        let offset = screen - rect.center();
        let per_pixel = depth / self.focal_length(rect);
        basis.eye
            + (basis.forward * depth)
            + (basis.right * (offset.x * per_pixel))
            + (basis.up * (-offset.y * per_pixel))
    }

    /// World-space displacement matching a screen drag at the given depth.
    pub fn screen_delta_to_world(&self, rect: Rect, delta: Vec2, depth: f32) -> Vec3 {
        let basis = self.basis();
        let per_pixel = depth / self.focal_length(rect);
        (basis.right * (delta.x * per_pixel)) + (basis.up * (-delta.y * per_pixel))
    }

    pub fn orbit(&mut self, delta: Vec2) {
        if self.dimension == ViewDimension::Two {
            return;
        }
        self.transition = None;
        self.yaw -= delta.x * 0.008;
        self.pitch = (self.pitch + delta.y * 0.008).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn pan(&mut self, rect: Rect, delta: Vec2) {
        self.transition = None;
        let shift = self.screen_delta_to_world(rect, delta, self.distance);
        self.target -= shift;
    }

    pub fn scroll_zoom(&mut self, scroll: f32) {
        self.transition = None;
        let factor = (-scroll * 0.0015).exp();
        self.distance = self.clamp_distance(self.distance * factor);
    }

    /// Distance at which a box of the given extent fills the view, with the configured margin.
    pub fn fit_distance(&self, extent: f32) -> f32 {
        let half_fov = self.fov_radians() * 0.5;
        let exact = (extent.max(1.0) * 0.5) / half_fov.tan();
        self.clamp_distance(exact * self.config.fit_margin)
    }

    /// Starts an animated move for a zoom command. `bounds` is the layout's bounding box and
    /// `node` the position of the node a `ToNode` command refers to.
    pub fn start_zoom(&mut self, command: ZoomCommand, bounds: Option<(Vec3, Vec3)>, node: Option<Vec3>) {
        let current = self.pose();
        let goal = match command {
            ZoomCommand::In => CameraPose {
                distance: self.clamp_distance(current.distance * self.config.zoom_in_factor),
                ..current
            },
            ZoomCommand::Out => CameraPose {
                distance: self.clamp_distance(current.distance * self.config.zoom_out_factor),
                ..current
            },
            ZoomCommand::Fit => {
                let Some((min, max)) = bounds else {
                    return;
                };
                let extent = (max - min).max_element();
                CameraPose {
                    target: (min + max) * 0.5,
                    distance: self.fit_distance(extent),
                }
            }
            ZoomCommand::ToNode(_) => {
                let Some(position) = node else {
                    return;
                };
                CameraPose {
                    target: position,
                    distance: self.clamp_distance(current.distance.min(self.fit_distance(80.0))),
                }
            }
        };

        self.transition = Some(Transition {
            from: current,
            to: goal,
            elapsed: 0.0,
            duration: self.config.transition_secs.max(0.0),
        });
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            target: self.target,
            distance: self.distance,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Advances a running transition. Returns true on the frame it completes.
    pub fn update(&mut self, delta_seconds: f32) -> bool {
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };

        transition.elapsed += delta_seconds.max(0.0);
        let t = if transition.duration <= f32::EPSILON {
            1.0
        } else {
            (transition.elapsed / transition.duration).clamp(0.0, 1.0)
        };
        // Ease out cubic.
        let eased = 1.0 - (1.0 - t).powi(3);
        let (from, to) = (transition.from, transition.to);
        self.target = from.target.lerp(to.target, eased);
        self.distance = from.distance + (to.distance - from.distance) * eased;

        if t >= 1.0 {
            self.target = to.target;
            self.distance = to.distance;
            self.transition = None;
            return true;
        }
        false
    }
}

/// Rectangle used when the host has not reported a viewport yet.
pub fn default_viewport() -> Rect {
    Rect::from_min_max(pos2(0.0, 0.0), pos2(1024.0, 768.0))
}
