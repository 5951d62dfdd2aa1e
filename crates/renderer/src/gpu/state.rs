use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context as AnyhowContext, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wgpu::util::{DeviceExt, TextureDataOrder};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::runtime::TimeSample;
use crate::scene::{
    apply_spins, spin_angle, BurstEnvelope, FadeCurve, FadeEnvelope, GateState, GlyphField,
    MeshData, ParticleField, SceneGraph, SpinEffect, Starfield, WarmupGate, DEFAULT_WARMUP,
};
use crate::types::{
    Antialiasing, Axis, GlyphSpec, LayerSpec, MeshEffectKind, MeshSpec, ParticleSpec, SceneSpec,
    StarfieldSpec, COMPACT_BREAKPOINT,
};

use super::context::{GpuContext, DEPTH_FORMAT};
use super::pipelines::ScenePipelines;
use super::uniforms::{camera_matrices, LayerUniform, OverlayUniform, SceneGlobals};

/// Fade-in applied when the warmup gate opens and no crossfade is pending.
const REVEAL_FADE: Duration = Duration::from_millis(400);

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SpriteInstance {
    position: [f32; 3],
    tint: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlyphInstance {
    home: [f32; 3],
    cell: [f32; 2],
    bob_speed: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// A layer uniform buffer paired with its bind group.
struct LayerBinding {
    uniform: LayerUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl LayerBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, uniform: LayerUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("layer uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("layer bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.uniform));
    }
}

/// Which procedural generator fills a sprite layer; kept so tier changes can
/// regenerate the instance buffer with the other budget.
#[derive(Clone)]
enum SpriteSource {
    Particles(ParticleSpec),
    Starfield(StarfieldSpec),
}

struct SpriteLayer {
    node: String,
    instances: wgpu::Buffer,
    count: u32,
    source: SpriteSource,
    binding: LayerBinding,
}

struct GlyphLayer {
    node: String,
    instances: wgpu::Buffer,
    count: u32,
    atlas_bind: wgpu::BindGroup,
    binding: LayerBinding,
}

struct MeshDraw {
    node: String,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    binding: LayerBinding,
}

struct MeshLayer {
    draws: Vec<MeshDraw>,
    burst: Option<BurstEnvelope>,
}

enum LayerRenderer {
    Sprites(SpriteLayer),
    Glyphs(GlyphLayer),
    Mesh(MeshLayer),
}

struct SceneContents {
    layers: Vec<LayerRenderer>,
    graph: SceneGraph,
    spins: Vec<SpinEffect>,
}

/// Owns every GPU resource for the presented scene and renders one frame per
/// call. All mutation happens on the render callback path.
pub(crate) struct GpuState {
    context: GpuContext,
    pipelines: ScenePipelines,
    globals: SceneGlobals,
    globals_buffer: wgpu::Buffer,
    globals_bind: wgpu::BindGroup,
    overlay: OverlayUniform,
    overlay_buffer: wgpu::Buffer,
    overlay_bind: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    scene: SceneSpec,
    contents: SceneContents,
    gate: WarmupGate,
    fade: Option<FadeEnvelope>,
    pending_reveal: Duration,
    rng: StdRng,
    compact: bool,
    last_elapsed: f32,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        size: PhysicalSize<u32>,
        scene: SceneSpec,
        antialiasing: Antialiasing,
        seed: Option<u64>,
    ) -> Result<Self> {
        let context = GpuContext::new(window, size, antialiasing)?;
        let pipelines = ScenePipelines::new(
            &context.device,
            context.surface_format,
            context.sample_count,
        );

        let globals = SceneGlobals::new(context.size.width, context.size.height);
        let globals_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("globals uniform"),
                contents: bytemuck::bytes_of(&globals),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let globals_bind = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("globals bind group"),
                layout: &pipelines.globals_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                }],
            });

        let overlay = OverlayUniform::new();
        let overlay_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("overlay uniform"),
                contents: bytemuck::bytes_of(&overlay),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let overlay_bind = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("overlay bind group"),
                layout: &pipelines.overlay_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: overlay_buffer.as_entire_binding(),
                }],
            });

        let (depth_view, msaa_view) = create_targets(&context);

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let compact = context.size.width < COMPACT_BREAKPOINT;
        let contents = build_scene(&context, &pipelines, &scene, &mut rng);
        let now = Instant::now();
        let gate = WarmupGate::new(scene.warmup.unwrap_or(DEFAULT_WARMUP), now);

        tracing::info!(
            scene = %scene.name,
            layers = scene.layers.len(),
            compact,
            samples = context.sample_count,
            "scene mounted"
        );

        Ok(Self {
            context,
            pipelines,
            globals,
            globals_buffer,
            globals_bind,
            overlay,
            overlay_buffer,
            overlay_bind,
            depth_view,
            msaa_view,
            scene,
            contents,
            gate,
            fade: None,
            pending_reveal: REVEAL_FADE,
            rng,
            compact,
            last_elapsed: 0.0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    /// Replaces the presented scene; a fresh warmup gate runs before the new
    /// content is revealed, then the crossfade duration drives the fade-in.
    pub(crate) fn set_scene(&mut self, scene: SceneSpec, crossfade: Duration, now: Instant) {
        self.contents = build_scene(&self.context, &self.pipelines, &scene, &mut self.rng);
        self.gate = WarmupGate::new(scene.warmup.unwrap_or(DEFAULT_WARMUP), now);
        self.fade = None;
        self.pending_reveal = if crossfade.is_zero() {
            REVEAL_FADE
        } else {
            crossfade
        };
        tracing::info!(scene = %scene.name, layers = scene.layers.len(), "scene swapped");
        self.scene = scene;
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        let (depth_view, msaa_view) = create_targets(&self.context);
        self.depth_view = depth_view;
        self.msaa_view = msaa_view;
        self.globals.set_resolution(new_size.width, new_size.height);

        let compact = new_size.width < COMPACT_BREAKPOINT;
        if compact != self.compact {
            self.compact = compact;
            self.regenerate_sprite_layers();
        }
    }

    /// Rebuilds the point buffers with the budget for the new viewport tier.
    /// Counts are fixed between tier changes; this is the only path that
    /// replaces generated points.
    fn regenerate_sprite_layers(&mut self) {
        let width = self.context.size.width;
        for layer in &mut self.contents.layers {
            if let LayerRenderer::Sprites(sprites) = layer {
                let (instances, count) = build_sprite_instances(
                    &self.context.device,
                    &sprites.source,
                    width,
                    &mut self.rng,
                );
                sprites.instances = instances;
                sprites.count = count;
            }
        }
        tracing::debug!(width, compact = self.compact, "regenerated sprite budgets");
    }

    pub(crate) fn render(
        &mut self,
        sample: TimeSample,
        now: Instant,
    ) -> Result<(), wgpu::SurfaceError> {
        let delta = if sample.frame_index == 0 {
            0.0
        } else {
            (sample.seconds - self.last_elapsed).max(0.0)
        };
        self.last_elapsed = sample.seconds;

        let was_ready = self.gate.is_ready();
        let gate_state = self.gate.poll(now);
        if gate_state == GateState::Ready && !was_ready {
            self.fade = FadeEnvelope::new(self.pending_reveal, FadeCurve::Smoothstep, now);
        }

        let fade_level = match gate_state {
            GateState::Warming => 0.0,
            GateState::Ready => match self.fade.take() {
                Some(envelope) => {
                    let (level, finished) = envelope.level(now);
                    if !finished {
                        self.fade = Some(envelope);
                    }
                    level
                }
                None => 1.0,
            },
        };

        if gate_state == GateState::Ready {
            apply_spins(
                &mut self.contents.graph,
                &self.contents.spins,
                sample.seconds,
            );
            for layer in &mut self.contents.layers {
                if let LayerRenderer::Mesh(mesh) = layer {
                    if let Some(burst) = mesh.burst.as_mut() {
                        burst.advance(delta);
                    }
                }
            }
        }

        let orbit = spin_angle(sample.seconds, self.scene.camera_orbit);
        let (view, proj) = camera_matrices(self.context.size, orbit);
        self.globals.set_camera(view, proj);
        self.globals.set_time(sample.seconds, delta, sample.frame_index);
        self.globals.set_fade(fade_level);
        self.context
            .queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&self.globals));

        for layer in &mut self.contents.layers {
            match layer {
                LayerRenderer::Sprites(sprites) => {
                    sprites
                        .binding
                        .uniform
                        .set_model(self.contents.graph.matrix(&sprites.node));
                    sprites.binding.write(&self.context.queue);
                }
                LayerRenderer::Glyphs(glyphs) => {
                    glyphs
                        .binding
                        .uniform
                        .set_model(self.contents.graph.matrix(&glyphs.node));
                    glyphs.binding.write(&self.context.queue);
                }
                LayerRenderer::Mesh(mesh) => {
                    let burst_value = mesh.burst.as_ref().map(BurstEnvelope::value).unwrap_or(0.0);
                    for draw in &mut mesh.draws {
                        draw.binding
                            .uniform
                            .set_model(self.contents.graph.matrix(&draw.node));
                        draw.binding.uniform.params[1] = burst_value;
                        draw.binding.write(&self.context.queue);
                    }
                }
            }
        }

        if gate_state == GateState::Warming {
            let aspect = self.globals.resolution[2];
            self.overlay
                .update(self.gate.progress(now), sample.seconds, aspect);
            self.context
                .queue
                .write_buffer(&self.overlay_buffer, 0, bytemuck::bytes_of(&self.overlay));
        }

        let frame = self.context.surface.get_current_texture()?;
        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (attachment_view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&frame_view)),
            None => (&frame_view, None),
        };

        let background = self.scene.background;
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background[0] as f64,
                            g: background[1] as f64,
                            b: background[2] as f64,
                            a: background[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if gate_state == GateState::Warming {
                pass.set_pipeline(&self.pipelines.overlay);
                pass.set_bind_group(0, &self.overlay_bind, &[]);
                pass.draw(0..3, 0..1);
            } else {
                pass.set_bind_group(0, &self.globals_bind, &[]);

                // Opaque meshes first, then the blended point layers.
                for layer in &self.contents.layers {
                    if let LayerRenderer::Mesh(mesh) = layer {
                        pass.set_pipeline(&self.pipelines.mesh);
                        for draw in &mesh.draws {
                            pass.set_bind_group(1, &draw.binding.bind_group, &[]);
                            pass.set_vertex_buffer(0, draw.vertices.slice(..));
                            pass.set_index_buffer(
                                draw.indices.slice(..),
                                wgpu::IndexFormat::Uint32,
                            );
                            pass.draw_indexed(0..draw.index_count, 0, 0..1);
                        }
                    }
                }
                for layer in &self.contents.layers {
                    match layer {
                        LayerRenderer::Sprites(sprites) if sprites.count > 0 => {
                            pass.set_pipeline(&self.pipelines.sprite);
                            pass.set_bind_group(1, &sprites.binding.bind_group, &[]);
                            pass.set_vertex_buffer(0, sprites.instances.slice(..));
                            pass.draw(0..6, 0..sprites.count);
                        }
                        LayerRenderer::Glyphs(glyphs) if glyphs.count > 0 => {
                            pass.set_pipeline(&self.pipelines.glyph);
                            pass.set_bind_group(1, &glyphs.binding.bind_group, &[]);
                            pass.set_bind_group(2, &glyphs.atlas_bind, &[]);
                            pass.set_vertex_buffer(0, glyphs.instances.slice(..));
                            pass.draw(0..6, 0..glyphs.count);
                        }
                        _ => {}
                    }
                }
            }
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn create_targets(context: &GpuContext) -> (wgpu::TextureView, Option<wgpu::TextureView>) {
    let extent = wgpu::Extent3d {
        width: context.size.width.max(1),
        height: context.size.height.max(1),
        depth_or_array_layers: 1,
    };
    let depth = context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth target"),
        size: extent,
        mip_level_count: 1,
        sample_count: context.sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    let msaa_view = (context.sample_count > 1).then(|| {
        context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("msaa target"),
                size: extent,
                mip_level_count: 1,
                sample_count: context.sample_count,
                dimension: wgpu::TextureDimension::D2,
                format: context.surface_format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    });

    (depth_view, msaa_view)
}

fn build_scene(
    context: &GpuContext,
    pipelines: &ScenePipelines,
    scene: &SceneSpec,
    rng: &mut StdRng,
) -> SceneContents {
    let width = context.size.width;
    let mut contents = SceneContents {
        layers: Vec::new(),
        graph: SceneGraph::new(),
        spins: Vec::new(),
    };

    for (index, layer) in scene.layers.iter().enumerate() {
        match layer {
            LayerSpec::Particles(spec) => {
                push_sprite_layer(
                    context,
                    pipelines,
                    &mut contents,
                    SpriteSource::Particles(spec.clone()),
                    index,
                    width,
                    rng,
                );
            }
            LayerSpec::Starfield(spec) => {
                push_sprite_layer(
                    context,
                    pipelines,
                    &mut contents,
                    SpriteSource::Starfield(spec.clone()),
                    index,
                    width,
                    rng,
                );
            }
            LayerSpec::Glyphs(spec) => {
                match build_glyph_layer(context, pipelines, spec, index, rng) {
                    Ok(layer) => {
                        contents.graph.insert(layer.node.clone(), Mat4::IDENTITY);
                        contents.layers.push(LayerRenderer::Glyphs(layer));
                    }
                    Err(err) => {
                        tracing::warn!(
                            layer = index,
                            atlas = %spec.atlas.display(),
                            error = %err,
                            "glyph atlas failed to load; substituting fallback particles"
                        );
                        push_sprite_layer(
                            context,
                            pipelines,
                            &mut contents,
                            SpriteSource::Particles(ParticleSpec::default()),
                            index,
                            width,
                            rng,
                        );
                    }
                }
            }
            LayerSpec::Mesh(spec) => {
                match build_mesh_layer(context, pipelines, spec, &mut contents) {
                    Ok(layer) => contents.layers.push(LayerRenderer::Mesh(layer)),
                    Err(err) => {
                        tracing::warn!(
                            layer = index,
                            source = %spec.source.display(),
                            error = %err,
                            "mesh asset failed to load; substituting fallback particles"
                        );
                        push_sprite_layer(
                            context,
                            pipelines,
                            &mut contents,
                            SpriteSource::Particles(ParticleSpec::default()),
                            index,
                            width,
                            rng,
                        );
                    }
                }
            }
        }
    }

    contents
}

fn push_sprite_layer(
    context: &GpuContext,
    pipelines: &ScenePipelines,
    contents: &mut SceneContents,
    source: SpriteSource,
    index: usize,
    width: u32,
    rng: &mut StdRng,
) {
    let node = format!("layer:{index}");
    let (instances, count) = build_sprite_instances(&context.device, &source, width, rng);

    let mut uniform = LayerUniform::new();
    match &source {
        SpriteSource::Particles(spec) => {
            uniform.tint = [1.0, 1.0, 1.0, spec.opacity];
            uniform.params[0] = spec.point_size;
            contents.spins.push(SpinEffect {
                node: node.clone(),
                axis: Axis::Y,
                rate: spec.spin,
            });
        }
        SpriteSource::Starfield(spec) => {
            uniform.tint = [1.0, 1.0, 1.0, 1.0];
            uniform.params[0] = spec.star_size;
        }
    }
    contents.graph.insert(node.clone(), Mat4::IDENTITY);

    let binding = LayerBinding::new(&context.device, &pipelines.layer_layout, uniform);
    contents.layers.push(LayerRenderer::Sprites(SpriteLayer {
        node,
        instances,
        count,
        source,
        binding,
    }));
}

fn build_sprite_instances(
    device: &wgpu::Device,
    source: &SpriteSource,
    width: u32,
    rng: &mut StdRng,
) -> (wgpu::Buffer, u32) {
    let instances: Vec<SpriteInstance> = match source {
        SpriteSource::Particles(spec) => {
            let field = ParticleField::generate(spec, spec.budget(width), rng);
            field
                .positions()
                .iter()
                .zip(field.colors())
                .map(|(position, color)| SpriteInstance {
                    position: *position,
                    tint: [color[0], color[1], color[2], 1.0],
                })
                .collect()
        }
        SpriteSource::Starfield(spec) => {
            let field = Starfield::generate(spec, spec.budget(width), rng);
            field
                .positions()
                .iter()
                .zip(field.brightness())
                .map(|(position, brightness)| SpriteInstance {
                    position: *position,
                    tint: [
                        *brightness,
                        *brightness,
                        *brightness,
                        if spec.fade { *brightness } else { 1.0 },
                    ],
                })
                .collect()
        }
    };

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("sprite instances"),
        contents: bytemuck::cast_slice(&instances),
        usage: wgpu::BufferUsages::VERTEX,
    });
    (buffer, instances.len() as u32)
}

fn build_glyph_layer(
    context: &GpuContext,
    pipelines: &ScenePipelines,
    spec: &GlyphSpec,
    index: usize,
    rng: &mut StdRng,
) -> Result<GlyphLayer> {
    let atlas = image::open(&spec.atlas)
        .with_context(|| format!("failed to decode glyph atlas {}", spec.atlas.display()))?
        .to_rgba8();
    let (atlas_width, atlas_height) = atlas.dimensions();
    let texture = context.device.create_texture_with_data(
        &context.queue,
        &wgpu::TextureDescriptor {
            label: Some("glyph atlas"),
            size: wgpu::Extent3d {
                width: atlas_width,
                height: atlas_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &atlas,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = context.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("glyph atlas sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });
    let atlas_bind = context
        .device
        .create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph atlas bind group"),
            layout: &pipelines.atlas_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

    let field = GlyphField::generate(spec, rng);
    let cell = [1.0 / spec.columns as f32, 1.0 / spec.rows as f32];
    let instances: Vec<GlyphInstance> = field
        .sprites()
        .iter()
        .map(|sprite| {
            let column = sprite.glyph % spec.columns;
            let row = sprite.glyph / spec.columns;
            GlyphInstance {
                home: sprite.home,
                cell: [column as f32 * cell[0], row as f32 * cell[1]],
                bob_speed: sprite.bob_speed,
            }
        })
        .collect();
    let instance_buffer = context
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glyph instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

    let mut uniform = LayerUniform::new();
    uniform.tint = [spec.color[0], spec.color[1], spec.color[2], 1.0];
    uniform.params = [spec.glyph_size, 0.0, cell[0], cell[1]];
    uniform.extra = [spec.spin, spec.bob_amplitude, 0.0, 0.0];
    let binding = LayerBinding::new(&context.device, &pipelines.layer_layout, uniform);

    Ok(GlyphLayer {
        node: format!("layer:{index}"),
        instances: instance_buffer,
        count: instances.len() as u32,
        atlas_bind,
        binding,
    })
}

fn build_mesh_layer(
    context: &GpuContext,
    pipelines: &ScenePipelines,
    spec: &MeshSpec,
    contents: &mut SceneContents,
) -> Result<MeshLayer> {
    let data = MeshData::load(&spec.source)?;
    let placement = Mat4::from_translation(Vec3::from_array(spec.position))
        * Mat4::from_scale(Vec3::splat(spec.scale));

    let mut draws = Vec::new();
    for node in &data.nodes {
        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        for primitive in &node.primitives {
            let base = vertices.len() as u32;
            vertices.extend(
                primitive
                    .positions
                    .iter()
                    .zip(&primitive.normals)
                    .map(|(position, normal)| MeshVertex {
                        position: *position,
                        normal: *normal,
                    }),
            );
            indices.extend(primitive.indices.iter().map(|index| base + index));
        }

        let vertex_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        contents
            .graph
            .insert(node.name.clone(), placement * node.transform);

        let mut uniform = LayerUniform::new();
        uniform.tint = [spec.color[0], spec.color[1], spec.color[2], 1.0];
        let binding = LayerBinding::new(&context.device, &pipelines.layer_layout, uniform);
        draws.push(MeshDraw {
            node: node.name.clone(),
            vertices: vertex_buffer,
            indices: index_buffer,
            index_count: indices.len() as u32,
            binding,
        });
    }

    let mut burst = None;
    for effect in &spec.effects {
        match &effect.kind {
            MeshEffectKind::Burst { rate } => {
                if burst.is_none() {
                    burst = Some(BurstEnvelope::new(*rate));
                }
            }
            MeshEffectKind::Spin { axis, rate } => {
                let targets: Vec<String> = match &effect.node {
                    Some(name) => {
                        if contents.graph.contains(name) {
                            vec![name.clone()]
                        } else {
                            tracing::warn!(
                                node = %name,
                                source = %spec.source.display(),
                                "spin effect targets a node the asset does not define; skipping"
                            );
                            Vec::new()
                        }
                    }
                    None => data.node_names().map(str::to_string).collect(),
                };
                for node in targets {
                    contents.spins.push(SpinEffect {
                        node,
                        axis: *axis,
                        rate: *rate,
                    });
                }
            }
        }
    }

    Ok(MeshLayer { draws, burst })
}
