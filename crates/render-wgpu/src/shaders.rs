/// WGSL module shared by the four lighting programs.
///
/// One vertex stage; one fragment entry point per light kind. Emission is
/// added by the ambient pass only, so it is counted once however many lights
/// are enabled.
pub const LIGHTING_SHADER: &str = r#"
struct DrawUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    model_it: mat4x4<f32>,
    cam_position: vec4<f32>,
    tint: vec4<f32>,
    albedo_tint: vec4<f32>,
    specular_tint: vec4<f32>,
    emissive_tint: vec4<f32>,
    // x: tiling factor, y: roughness scale, z: inner cone, w: outer cone
    params: vec4<f32>,
    light_color: vec4<f32>,
    light_ground: vec4<f32>,
    light_direction: vec4<f32>,
    light_position: vec4<f32>,
    light_attenuation: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: DrawUniforms;

@group(1) @binding(0) var t_albedo: texture_2d<f32>;
@group(1) @binding(1) var t_specular: texture_2d<f32>;
@group(1) @binding(2) var t_roughness: texture_2d<f32>;
@group(1) @binding(3) var t_emissive: texture_2d<f32>;
@group(1) @binding(4) var t_ambient_occlusion: texture_2d<f32>;
@group(1) @binding(5) var s_material: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = u.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (u.model_it * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv * u.params.x;
    return out;
}

struct Surface {
    albedo: vec3<f32>,
    specular: vec3<f32>,
    roughness: f32,
    emissive: vec3<f32>,
    occlusion: f32,
    normal: vec3<f32>,
    view: vec3<f32>,
};

fn sample_surface(in: VertexOutput) -> Surface {
    var s: Surface;
    s.albedo = textureSample(t_albedo, s_material, in.uv).rgb * u.albedo_tint.rgb * u.tint.rgb;
    s.specular = textureSample(t_specular, s_material, in.uv).rgb * u.specular_tint.rgb;
    s.roughness = clamp(textureSample(t_roughness, s_material, in.uv).r * u.params.y, 0.02, 1.0);
    s.emissive = textureSample(t_emissive, s_material, in.uv).rgb * u.emissive_tint.rgb;
    s.occlusion = textureSample(t_ambient_occlusion, s_material, in.uv).r;
    s.normal = normalize(in.world_normal);
    s.view = normalize(u.cam_position.xyz - in.world_position);
    return s;
}

// Lambert diffuse plus Blinn-Phong specular. `to_light` is normalized.
fn shade(s: Surface, to_light: vec3<f32>, radiance: vec3<f32>) -> vec3<f32> {
    let n_dot_l = max(dot(s.normal, to_light), 0.0);
    let half_vector = normalize(to_light + s.view);
    let shininess = mix(256.0, 4.0, s.roughness);
    let highlight = pow(max(dot(s.normal, half_vector), 0.0), shininess) * step(0.0, n_dot_l);
    return (s.albedo * n_dot_l + s.specular * highlight) * radiance;
}

fn attenuate(world_position: vec3<f32>) -> f32 {
    let d = distance(u.light_position.xyz, world_position);
    let k = u.light_attenuation.xyz;
    return 1.0 / max(k.x * d * d + k.y * d + k.z, 1e-4);
}

@fragment
fn fs_ambient(in: VertexOutput) -> @location(0) vec4<f32> {
    let s = sample_surface(in);
    let up = dot(s.normal, u.light_direction.xyz) * 0.5 + 0.5;
    let ambient = mix(u.light_ground.rgb, u.light_color.rgb, up);
    return vec4<f32>(s.albedo * ambient * s.occlusion + s.emissive, 1.0);
}

@fragment
fn fs_directional(in: VertexOutput) -> @location(0) vec4<f32> {
    let s = sample_surface(in);
    let color = shade(s, -u.light_direction.xyz, u.light_color.rgb);
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_point(in: VertexOutput) -> @location(0) vec4<f32> {
    let s = sample_surface(in);
    let to_light = normalize(u.light_position.xyz - in.world_position);
    let color = shade(s, to_light, u.light_color.rgb * attenuate(in.world_position));
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_spot(in: VertexOutput) -> @location(0) vec4<f32> {
    let s = sample_surface(in);
    let to_light = normalize(u.light_position.xyz - in.world_position);
    let angle = acos(clamp(dot(-to_light, u.light_direction.xyz), -1.0, 1.0));
    let cone = 1.0 - smoothstep(u.params.z, u.params.w, angle);
    let color = shade(s, to_light, u.light_color.rgb * attenuate(in.world_position) * cone);
    return vec4<f32>(color, 1.0);
}
"#;

/// Fragment entry point per light kind, in `LightKind::ALL` order.
pub const LIGHT_ENTRY_POINTS: [&str; 4] = ["fs_ambient", "fs_directional", "fs_point", "fs_spot"];

/// Scissored clear: a full-screen triangle at the far plane filled with
/// `tint`. Uses the same uniform block layout as the lighting module.
pub const CLEAR_SHADER: &str = r#"
struct DrawUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    model_it: mat4x4<f32>,
    cam_position: vec4<f32>,
    tint: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: DrawUniforms;

@vertex
fn vs_clear(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    return vec4<f32>(x, y, 1.0, 1.0);
}

@fragment
fn fs_clear() -> @location(0) vec4<f32> {
    return u.tint;
}
"#;
