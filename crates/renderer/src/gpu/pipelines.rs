use std::borrow::Cow;

use super::context::DEPTH_FORMAT;

/// WGSL header shared by the scene pipelines; concatenated ahead of each
/// stage-specific body before module creation.
const SCENE_HEADER: &str = r#"
struct Globals {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    resolution: vec4<f32>,
    // elapsed, delta, frame, fade
    time: vec4<f32>,
};

struct Layer {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    // sprite size, burst, atlas cell w, atlas cell h
    params: vec4<f32>,
    // glyph spin rate, bob amplitude, unused, unused
    extra: vec4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> layer: Layer;

const QUAD_CORNERS = array<vec2<f32>, 6>(
    vec2<f32>(-1.0, -1.0),
    vec2<f32>(1.0, -1.0),
    vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0),
    vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, 1.0),
);
"#;

/// Billboarded point sprites (particle fields and starfields). Group motion
/// arrives through the layer model matrix; the quad is expanded in view
/// space so perspective shrinks distant points.
const SPRITE_BODY: &str = r#"
struct SpriteInstance {
    @location(0) position: vec3<f32>,
    @location(1) tint: vec4<f32>,
};

struct SpriteOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) offset: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex: u32, instance: SpriteInstance) -> SpriteOut {
    var corners = QUAD_CORNERS;
    let corner = corners[vertex];
    var view_pos = globals.view * layer.model * vec4<f32>(instance.position, 1.0);
    view_pos = vec4<f32>(view_pos.xy + corner * layer.params.x, view_pos.zw);

    var out: SpriteOut;
    out.clip = globals.proj * view_pos;
    out.offset = corner;
    out.color = vec4<f32>(
        instance.tint.rgb * layer.tint.rgb,
        instance.tint.a * layer.tint.a,
    );
    return out;
}

@fragment
fn fs_main(in: SpriteOut) -> @location(0) vec4<f32> {
    let falloff = clamp(1.0 - length(in.offset), 0.0, 1.0);
    let alpha = falloff * falloff * in.color.a * globals.time.w;
    return vec4<f32>(in.color.rgb * alpha, alpha);
}
"#;

/// Atlas-sampled glyph billboards. Bobbing and spinning are pure functions
/// of the global elapsed time, so the instance buffer never changes.
const GLYPH_BODY: &str = r#"
@group(2) @binding(0) var atlas_texture: texture_2d<f32>;
@group(2) @binding(1) var atlas_sampler: sampler;

struct GlyphInstance {
    @location(0) home: vec3<f32>,
    @location(1) cell: vec2<f32>,
    @location(2) bob_speed: f32,
};

struct GlyphOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex: u32, instance: GlyphInstance) -> GlyphOut {
    var corners = QUAD_CORNERS;
    let corner = corners[vertex];
    let t = globals.time.x;

    var world = layer.model * vec4<f32>(instance.home, 1.0);
    world.y = world.y + sin(t * instance.bob_speed) * layer.extra.y;

    let angle = t * layer.extra.x;
    let size = layer.params.x;
    let local = vec3<f32>(
        corner.x * size * cos(angle),
        corner.y * size,
        corner.x * size * sin(angle),
    );

    var out: GlyphOut;
    out.clip = globals.proj * globals.view * vec4<f32>(world.xyz + local, 1.0);
    out.uv = instance.cell
        + vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5)
            * vec2<f32>(layer.params.z, layer.params.w);
    return out;
}

@fragment
fn fs_main(in: GlyphOut) -> @location(0) vec4<f32> {
    let sample = textureSample(atlas_texture, atlas_sampler, in.uv);
    let alpha = sample.a * layer.tint.a * globals.time.w;
    return vec4<f32>(layer.tint.rgb * alpha, alpha);
}
"#;

/// Mesh surfaces with burst displacement along the vertex normal and a fixed
/// key light.
const MESH_BODY: &str = r#"
struct MeshVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct MeshOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: MeshVertex) -> MeshOut {
    let displaced = vertex.position + vertex.normal * layer.params.y;
    let world = layer.model * vec4<f32>(displaced, 1.0);

    var out: MeshOut;
    out.clip = globals.proj * globals.view * world;
    out.normal = (layer.model * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: MeshOut) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let key_light = normalize(vec3<f32>(10.0, 10.0, 5.0));
    let lambert = 0.5 + 0.5 * max(dot(normal, key_light), 0.0);
    let alpha = layer.tint.a * globals.time.w;
    return vec4<f32>(layer.tint.rgb * lambert * alpha, alpha);
}
"#;

/// Warmup placeholder: a fullscreen pass drawing the pulsing progress bar.
const OVERLAY_SHADER: &str = r#"
// progress, elapsed, aspect, unused
@group(0) @binding(0) var<uniform> overlay: vec4<f32>;

struct OverlayOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex: u32) -> OverlayOut {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    let position = positions[vertex];

    var out: OverlayOut;
    out.clip = vec4<f32>(position, 0.0, 1.0);
    out.uv = vec2<f32>(position.x * 0.5 + 0.5, 0.5 - position.y * 0.5);
    return out;
}

@fragment
fn fs_main(in: OverlayOut) -> @location(0) vec4<f32> {
    let track_half_height = 0.004;
    let track_half_width = 0.22;
    let dx = abs(in.uv.x - 0.5);
    let dy = abs(in.uv.y - 0.5);

    var color = vec3<f32>(0.0);
    var alpha = 0.0;
    if (dy < track_half_height && dx < track_half_width) {
        color = vec3<f32>(0.3);
        alpha = 0.25;
        let fill_edge = 0.5 - track_half_width + 2.0 * track_half_width * overlay.x;
        if (in.uv.x <= fill_edge) {
            let pulse = 0.8 + 0.2 * sin(overlay.y * 4.0);
            color = vec3<f32>(0.18, 0.84, 0.45) * pulse;
            alpha = 1.0;
        }
    }
    return vec4<f32>(color * alpha, alpha);
}
"#;

const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

const PREMULTIPLIED_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

pub(crate) struct ScenePipelines {
    pub globals_layout: wgpu::BindGroupLayout,
    pub layer_layout: wgpu::BindGroupLayout,
    pub atlas_layout: wgpu::BindGroupLayout,
    pub overlay_layout: wgpu::BindGroupLayout,
    pub sprite: wgpu::RenderPipeline,
    pub glyph: wgpu::RenderPipeline,
    pub mesh: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
}

impl ScenePipelines {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let globals_layout = uniform_layout(device, "globals layout");
        let layer_layout = uniform_layout(device, "layer layout");
        let overlay_layout = uniform_layout(device, "overlay layout");
        let atlas_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atlas layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sprite_module = scene_module(device, "sprite shader", SPRITE_BODY);
        let glyph_module = scene_module(device, "glyph shader", GLYPH_BODY);
        let mesh_module = scene_module(device, "mesh shader", MESH_BODY);
        let overlay_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(OVERLAY_SHADER)),
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[&globals_layout, &layer_layout],
            push_constant_ranges: &[],
        });
        let glyph_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("glyph pipeline layout"),
                bind_group_layouts: &[&globals_layout, &layer_layout, &atlas_layout],
                push_constant_ranges: &[],
            });
        let overlay_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("overlay pipeline layout"),
                bind_group_layouts: &[&overlay_layout],
                push_constant_ranges: &[],
            });

        let sprite_instance_layout = wgpu::VertexBufferLayout {
            array_stride: 28,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 12,
                    shader_location: 1,
                },
            ],
        };
        let glyph_instance_layout = wgpu::VertexBufferLayout {
            array_stride: 24,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 12,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 20,
                    shader_location: 2,
                },
            ],
        };
        let mesh_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: 24,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1,
                },
            ],
        };

        let sprite = build_pipeline(
            device,
            "sprite pipeline",
            &scene_layout,
            &sprite_module,
            &[sprite_instance_layout],
            surface_format,
            sample_count,
            ADDITIVE_BLEND,
            depth_state(false, wgpu::CompareFunction::LessEqual),
        );
        let glyph = build_pipeline(
            device,
            "glyph pipeline",
            &glyph_pipeline_layout,
            &glyph_module,
            &[glyph_instance_layout],
            surface_format,
            sample_count,
            PREMULTIPLIED_BLEND,
            depth_state(false, wgpu::CompareFunction::LessEqual),
        );
        let mesh = build_pipeline(
            device,
            "mesh pipeline",
            &scene_layout,
            &mesh_module,
            &[mesh_vertex_layout],
            surface_format,
            sample_count,
            PREMULTIPLIED_BLEND,
            depth_state(true, wgpu::CompareFunction::Less),
        );
        let overlay = build_pipeline(
            device,
            "overlay pipeline",
            &overlay_pipeline_layout,
            &overlay_module,
            &[],
            surface_format,
            sample_count,
            PREMULTIPLIED_BLEND,
            depth_state(false, wgpu::CompareFunction::Always),
        );

        Self {
            globals_layout,
            layer_layout,
            atlas_layout,
            overlay_layout,
            sprite,
            glyph,
            mesh,
            overlay,
        }
    }
}

fn scene_module(device: &wgpu::Device, label: &str, body: &str) -> wgpu::ShaderModule {
    let source = format!("{SCENE_HEADER}\n{body}");
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
    })
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    vertex_buffers: &[wgpu::VertexBufferLayout<'_>],
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
    blend: wgpu::BlendState,
    depth: wgpu::DepthStencilState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(depth),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
