/// WGSL for every scene program. Entry points:
/// - `vs_main` / `fs_lit`: textured Phong with directional, point and spot lights
/// - `vs_rug` / `fs_lit`: same shading, vertices rippled by the time parameter
/// - `vs_main` / `fs_unlit`: flat object color
pub const SCENE_SHADER: &str = r#"
struct LightColor {
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
};

struct DirectionalLight {
    direction: vec4<f32>,
    color: LightColor,
};

struct PointLight {
    position: vec4<f32>,
    color: LightColor,
    // constant, linear, quadratic
    attenuation: vec4<f32>,
};

struct SpotLight {
    position: vec4<f32>,
    direction: vec4<f32>,
    color: LightColor,
    attenuation: vec4<f32>,
    // inner, outer (cosines)
    cutoff: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    view_pos: vec4<f32>,
    directional: DirectionalLight,
    points: array<PointLight, 3>,
    spot: SpotLight,
};

struct Object {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    // shininess, use_texture, time
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> object: Object;

@group(2) @binding(0)
var t_diffuse: texture_2d<f32>;
@group(2) @binding(1)
var s_diffuse: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

fn to_world(position: vec3<f32>, normal: vec3<f32>, uv: vec2<f32>) -> VertexOutput {
    let world = object.model * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (object.normal * vec4<f32>(normal, 0.0)).xyz;
    out.uv = uv;
    return out;
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    return to_world(vertex.position, vertex.normal, vertex.uv);
}

@vertex
fn vs_rug(vertex: VertexInput) -> VertexOutput {
    let t = object.params.z;
    let wave = sin(vertex.position.x * 1.5 + t * 2.5) * 0.12
        + sin(vertex.position.z * 2.0 + t * 1.7) * 0.08;
    return to_world(vertex.position + vec3<f32>(0.0, wave, 0.0), vertex.normal, vertex.uv);
}

fn phong(
    light: LightColor,
    light_dir: vec3<f32>,
    normal: vec3<f32>,
    view_dir: vec3<f32>,
    albedo: vec3<f32>,
    shininess: f32,
) -> vec3<f32> {
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), shininess);
    return light.ambient.rgb * albedo
        + light.diffuse.rgb * diff * albedo
        + light.specular.rgb * spec;
}

fn falloff(coefficients: vec4<f32>, d: f32) -> f32 {
    return 1.0 / max(coefficients.x + coefficients.y * d + coefficients.z * d * d, 1e-4);
}

@fragment
fn fs_lit(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let view_dir = normalize(frame.view_pos.xyz - in.world_pos);
    let sampled = textureSample(t_diffuse, s_diffuse, in.uv).rgb;
    let albedo = object.color.rgb * select(vec3<f32>(1.0), sampled, object.params.y > 0.5);
    let shininess = max(object.params.x, 1.0);

    var color = phong(
        frame.directional.color,
        normalize(-frame.directional.direction.xyz),
        normal, view_dir, albedo, shininess,
    );

    for (var i = 0u; i < 3u; i = i + 1u) {
        let light = frame.points[i];
        let to_light = light.position.xyz - in.world_pos;
        let d = length(to_light);
        color += phong(light.color, to_light / max(d, 1e-4), normal, view_dir, albedo, shininess)
            * falloff(light.attenuation, d);
    }

    let spot = frame.spot;
    let to_spot = spot.position.xyz - in.world_pos;
    let ds = length(to_spot);
    let spot_dir = to_spot / max(ds, 1e-4);
    let theta = dot(spot_dir, normalize(-spot.direction.xyz));
    let epsilon = max(spot.cutoff.x - spot.cutoff.y, 1e-4);
    let cone = clamp((theta - spot.cutoff.y) / epsilon, 0.0, 1.0);
    color += phong(spot.color, spot_dir, normal, view_dir, albedo, shininess)
        * falloff(spot.attenuation, ds) * cone;

    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_unlit(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(object.color.rgb, 1.0);
}
"#;
