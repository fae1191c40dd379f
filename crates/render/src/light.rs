use glam::Vec3;

use crate::device::{RenderDevice, Uniform};

/// Uploaded in place of a direction that cannot be normalized.
pub const FALLBACK_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Tag of a light variant; keys the shader program table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    Spot,
}

impl LightKind {
    pub const ALL: [LightKind; 4] = [Self::Ambient, Self::Directional, Self::Point, Self::Spot];

    pub fn index(self) -> usize {
        match self {
            Self::Ambient => 0,
            Self::Directional => 1,
            Self::Point => 2,
            Self::Spot => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Directional => "directional",
            Self::Point => "point",
            Self::Spot => "spot",
        }
    }
}

/// Distance falloff: `1 / (quadratic·d² + linear·d + constant)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub quadratic: f32,
    pub linear: f32,
    pub constant: f32,
}

impl Attenuation {
    pub fn new(quadratic: f32, linear: f32, constant: f32) -> Self {
        Self {
            quadratic,
            linear,
            constant,
        }
    }

    /// Packed as `(quadratic, linear, constant)`.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.quadratic, self.linear, self.constant)
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Kind-specific light payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    /// Hemisphere light blending a sky and a ground color by normal direction.
    Ambient {
        sky_color: Vec3,
        ground_color: Vec3,
        sky_direction: Vec3,
    },
    Directional {
        color: Vec3,
        direction: Vec3,
    },
    Point {
        color: Vec3,
        position: Vec3,
        attenuation: Attenuation,
    },
    /// Cone angles are in radians. `inner_cone <= outer_cone` is expected but
    /// not enforced; the shading of an inverted cone is undefined.
    Spot {
        color: Vec3,
        position: Vec3,
        attenuation: Attenuation,
        direction: Vec3,
        inner_cone: f32,
        outer_cone: f32,
    },
}

/// A setup-time problem with a light. Reported, never corrected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LightIssue {
    #[error("{kind:?} light has a zero-length direction; the fallback direction will be used")]
    DegenerateDirection { kind: LightKind },
    #[error("spot light inner cone {inner} exceeds outer cone {outer}; shading is undefined")]
    InvertedCone { inner: f32, outer: f32 },
}

/// One entry of the scene's light list.
///
/// Lights are built once at setup. Only `enabled` changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    enabled: bool,
    source: LightSource,
}

impl Light {
    pub fn new(source: LightSource) -> Self {
        Self {
            enabled: true,
            source,
        }
    }

    pub fn ambient(sky_color: Vec3, ground_color: Vec3, sky_direction: Vec3) -> Self {
        Self::new(LightSource::Ambient {
            sky_color,
            ground_color,
            sky_direction,
        })
    }

    pub fn directional(color: Vec3, direction: Vec3) -> Self {
        Self::new(LightSource::Directional { color, direction })
    }

    pub fn point(color: Vec3, position: Vec3, attenuation: Attenuation) -> Self {
        Self::new(LightSource::Point {
            color,
            position,
            attenuation,
        })
    }

    pub fn spot(
        color: Vec3,
        position: Vec3,
        attenuation: Attenuation,
        direction: Vec3,
        inner_cone: f32,
        outer_cone: f32,
    ) -> Self {
        Self::new(LightSource::Spot {
            color,
            position,
            attenuation,
            direction,
            inner_cone,
            outer_cone,
        })
    }

    pub fn kind(&self) -> LightKind {
        match self.source {
            LightSource::Ambient { .. } => LightKind::Ambient,
            LightSource::Directional { .. } => LightKind::Directional,
            LightSource::Point { .. } => LightKind::Point,
            LightSource::Spot { .. } => LightKind::Spot,
        }
    }

    pub fn source(&self) -> &LightSource {
        &self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Upload the `light.*` uniforms for this light's kind.
    pub fn upload(&self, device: &mut dyn RenderDevice) {
        let kind = self.kind();
        match self.source {
            LightSource::Ambient {
                sky_color,
                ground_color,
                sky_direction,
            } => {
                device.set_uniform("light.sky_color", Uniform::F3(sky_color));
                device.set_uniform("light.ground_color", Uniform::F3(ground_color));
                device.set_uniform(
                    "light.sky_direction",
                    Uniform::F3(upload_direction(kind, sky_direction)),
                );
            }
            LightSource::Directional { color, direction } => {
                device.set_uniform("light.color", Uniform::F3(color));
                device.set_uniform(
                    "light.direction",
                    Uniform::F3(upload_direction(kind, direction)),
                );
            }
            LightSource::Point {
                color,
                position,
                attenuation,
            } => {
                device.set_uniform("light.color", Uniform::F3(color));
                device.set_uniform("light.position", Uniform::F3(position));
                device.set_uniform("light.attenuation", Uniform::F3(attenuation.to_vec3()));
            }
            LightSource::Spot {
                color,
                position,
                attenuation,
                direction,
                inner_cone,
                outer_cone,
            } => {
                device.set_uniform("light.color", Uniform::F3(color));
                device.set_uniform("light.position", Uniform::F3(position));
                device.set_uniform("light.attenuation", Uniform::F3(attenuation.to_vec3()));
                device.set_uniform(
                    "light.direction",
                    Uniform::F3(upload_direction(kind, direction)),
                );
                device.set_uniform("light.inner_cone", Uniform::F1(inner_cone));
                device.set_uniform("light.outer_cone", Uniform::F1(outer_cone));
            }
        }
    }

    /// Problems worth logging when the scene is built.
    pub fn diagnostics(&self) -> Vec<LightIssue> {
        let kind = self.kind();
        let mut issues = Vec::new();
        let direction = match self.source {
            LightSource::Ambient { sky_direction, .. } => Some(sky_direction),
            LightSource::Directional { direction, .. } => Some(direction),
            LightSource::Point { .. } => None,
            LightSource::Spot { direction, .. } => Some(direction),
        };
        if direction.is_some_and(|d| d.try_normalize().is_none()) {
            issues.push(LightIssue::DegenerateDirection { kind });
        }
        if let LightSource::Spot {
            inner_cone,
            outer_cone,
            ..
        } = self.source
        {
            if inner_cone > outer_cone {
                issues.push(LightIssue::InvertedCone {
                    inner: inner_cone,
                    outer: outer_cone,
                });
            }
        }
        issues
    }
}

/// Normalize a direction for upload, falling back instead of producing NaN.
fn upload_direction(kind: LightKind, direction: Vec3) -> Vec3 {
    match direction.try_normalize() {
        Some(unit) => unit,
        None => {
            tracing::warn!(
                kind = kind.label(),
                ?direction,
                "degenerate light direction, uploading fallback"
            );
            FALLBACK_DIRECTION
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceCommand, TraceDevice};

    fn uploaded(light: &Light) -> Vec<(String, Uniform)> {
        let mut device = TraceDevice::new();
        light.upload(&mut device);
        device
            .commands()
            .iter()
            .filter_map(|c| match c {
                TraceCommand::Uniform(name, value) => Some((name.clone(), *value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn directions_are_normalized_at_upload() {
        let light = Light::directional(Vec3::ONE, Vec3::new(0.0, -4.0, 3.0));
        let uniforms = uploaded(&light);
        assert_eq!(uniforms[1].0, "light.direction");
        let Uniform::F3(direction) = uniforms[1].1 else {
            panic!("direction uploaded as {:?}", uniforms[1].1);
        };
        assert!((direction - Vec3::new(0.0, -0.8, 0.6)).length() < 1e-6);
        // stored value untouched
        assert!(matches!(
            light.source(),
            LightSource::Directional { direction, .. } if direction.y == -4.0
        ));
    }

    #[test]
    fn zero_direction_uploads_fallback() {
        let light = Light::spot(
            Vec3::ONE,
            Vec3::Y,
            Attenuation::default(),
            Vec3::ZERO,
            0.2,
            0.4,
        );
        let uniforms = uploaded(&light);
        let direction = uniforms
            .iter()
            .find(|(name, _)| name == "light.direction")
            .map(|(_, v)| *v);
        assert_eq!(direction, Some(Uniform::F3(FALLBACK_DIRECTION)));
        for (_, value) in uniforms {
            if let Uniform::F3(v) = value {
                assert!(v.is_finite());
            }
        }
        assert_eq!(
            light.diagnostics(),
            vec![LightIssue::DegenerateDirection {
                kind: LightKind::Spot
            }]
        );
    }

    #[test]
    fn uniform_sets_per_kind() {
        let names = |light: Light| -> Vec<String> {
            uploaded(&light).into_iter().map(|(name, _)| name).collect()
        };
        assert_eq!(
            names(Light::ambient(Vec3::ONE, Vec3::ZERO, Vec3::Y)),
            ["light.sky_color", "light.ground_color", "light.sky_direction"]
        );
        assert_eq!(
            names(Light::point(Vec3::ONE, Vec3::ZERO, Attenuation::default())),
            ["light.color", "light.position", "light.attenuation"]
        );
        assert_eq!(
            names(Light::spot(
                Vec3::ONE,
                Vec3::ZERO,
                Attenuation::default(),
                Vec3::NEG_Y,
                0.2,
                0.3
            )),
            [
                "light.color",
                "light.position",
                "light.attenuation",
                "light.direction",
                "light.inner_cone",
                "light.outer_cone"
            ]
        );
    }

    #[test]
    fn attenuation_packs_quadratic_first() {
        let att = Attenuation::new(0.1, 0.2, 0.3);
        assert_eq!(att.to_vec3(), Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn inverted_cone_is_reported_not_fixed() {
        let light = Light::spot(
            Vec3::ONE,
            Vec3::ZERO,
            Attenuation::default(),
            Vec3::NEG_Y,
            0.5,
            0.3,
        );
        assert_eq!(
            light.diagnostics(),
            vec![LightIssue::InvertedCone {
                inner: 0.5,
                outer: 0.3
            }]
        );
        assert!(matches!(
            light.source(),
            LightSource::Spot { inner_cone, .. } if *inner_cone == 0.5
        ));
    }

    #[test]
    fn enable_toggle_keeps_payload() {
        let mut light = Light::directional(Vec3::ONE, Vec3::NEG_Y);
        light.set_enabled(false);
        assert!(!light.is_enabled());
        assert_eq!(light.kind(), LightKind::Directional);
    }
}
