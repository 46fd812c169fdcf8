//! Scanline-free triangle rasterizer used by the headless renderer.
//!
//! Coverage is tested at pixel centers with edge functions, both windings are
//! accepted, and attributes (depth, view position) are interpolated affinely
//! in screen space. Fragments go through clipping, stencil and depth tests in
//! that order, mirroring a fixed-function pipeline closely enough to exercise
//! mask and clipping logic.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::surface::{FragmentInput, FragmentProgram, Surface};
use crate::renderer::state::DrawState;
use crate::resources::{Attribute, ShaderMaterial, TextureId};
use rustc_hash::FxHashMap;

/// One triangle-list draw.
pub(crate) struct RasterJob<'a> {
    pub positions: &'a Attribute,
    pub index: Option<&'a Attribute>,
    /// Element range of the draw
    pub start: u32,
    pub count: u32,
    pub model_view: Mat4,
    pub projection: Mat4,
    pub color: Vec4,
    pub blend: bool,
    /// Camera-space plane coefficients, four per plane
    pub clip_planes: &'a [f32],
    pub num_intersection: usize,
}

struct Vertex {
    screen: Vec2,
    depth: f32,
    view: Vec3,
}

pub(crate) fn rasterize(surface: &mut Surface, state: &DrawState, job: &RasterJob<'_>) {
    let (width, height) = surface.size();
    let triangles = job.count / 3;
    for t in 0..triangles {
        let base = job.start + t * 3;
        let corners = [base, base + 1, base + 2].map(|e| element_vertex(job, e));
        let [Some(a), Some(b), Some(c)] = corners else {
            continue;
        };
        let projected = [a, b, c].map(|p| project(job, p, width, height));
        let [Some(a), Some(b), Some(c)] = projected else {
            continue;
        };
        fill_triangle(surface, state, job, [&a, &b, &c]);
    }
}

fn element_vertex(job: &RasterJob<'_>, element: u32) -> Option<Vec3> {
    let vertex = match job.index {
        Some(index) => index.buffer().index_at(element as usize)? as usize,
        None => element as usize,
    };
    Some(Vec3::new(
        job.positions.component(vertex, 0)?,
        job.positions.component(vertex, 1)?,
        job.positions.component(vertex, 2)?,
    ))
}

fn project(job: &RasterJob<'_>, position: Vec3, width: u32, height: u32) -> Option<Vertex> {
    let view = job.model_view * position.extend(1.0);
    let clip = job.projection * view;
    // No near-plane splitting; triangles crossing the camera plane are dropped.
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vertex {
        screen: Vec2::new(
            (ndc.x * 0.5 + 0.5) * width as f32,
            (ndc.y * 0.5 + 0.5) * height as f32,
        ),
        depth: ndc.z,
        view: view.truncate(),
    })
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn fill_triangle(surface: &mut Surface, state: &DrawState, job: &RasterJob<'_>, [a, b, c]: [&Vertex; 3]) {
    let (width, height) = surface.size();
    let area = edge(a.screen, b.screen, c.screen);
    if area.abs() <= f32::EPSILON {
        return;
    }

    let min = a.screen.min(b.screen).min(c.screen).floor().max(Vec2::ZERO);
    let max = a.screen.max(b.screen).max(c.screen).ceil().min(Vec2::new(width as f32, height as f32));
    let (x0, y0, x1, y1) = (min.x as u32, min.y as u32, max.x as u32, max.y as u32);

    let (color, mut depth, mut stencil) = surface.buffers_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b.screen, c.screen, p) / area;
            let w1 = edge(c.screen, a.screen, p) / area;
            let w2 = edge(a.screen, b.screen, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let view = a.view * w0 + b.view * w1 + c.view * w2;
            if is_clipped(view, job.clip_planes, job.num_intersection) {
                continue;
            }

            let i = (y * width + x) as usize;
            let z = a.depth * w0 + b.depth * w1 + c.depth * w2;

            let stored_stencil = stencil.as_ref().map(|s| s[i]);
            let stencil_pass = stored_stencil.is_none_or(|s| state.stencil.passes(s));
            let depth_pass = stencil_pass
                && depth
                    .as_ref()
                    .is_none_or(|d| state.depth.passes(z, d[i]));

            if let (Some(s), Some(stored)) = (stencil.as_deref_mut(), stored_stencil) {
                s[i] = state.stencil.apply(stored, stencil_pass, depth_pass);
            }
            if !(stencil_pass && depth_pass) {
                continue;
            }
            if state.color.mask() {
                color[i] = if job.blend {
                    blend_over(job.color, color[i])
                } else {
                    job.color
                };
            }
            if state.depth.mask()
                && let Some(d) = depth.as_deref_mut()
            {
                d[i] = z;
            }
        }
    }
}

/// Planes keep the side where `n·p + d >= 0`. The leading planes clip by
/// union; the trailing `num_intersection` planes only clip where all agree.
fn is_clipped(view: Vec3, planes: &[f32], num_intersection: usize) -> bool {
    let count = planes.len() / 4;
    if count == 0 {
        return false;
    }
    let outside = |i: usize| {
        let p = &planes[i * 4..i * 4 + 4];
        Vec3::new(p[0], p[1], p[2]).dot(view) + p[3] < 0.0
    };
    let union = count.saturating_sub(num_intersection);
    if (0..union).any(outside) {
        return true;
    }
    union < count && (union..count).all(outside)
}

fn blend_over(src: Vec4, dst: Vec4) -> Vec4 {
    let a = src.w;
    let rgb = src.truncate() * a + dst.truncate() * (1.0 - a);
    rgb.extend(a + dst.w * (1.0 - a))
}

/// Evaluates `program` for every pixel of `surface` that passes the stencil
/// test.
pub(crate) fn shade_fullscreen(
    surface: &mut Surface,
    state: &DrawState,
    program: &FragmentProgram,
    material: &ShaderMaterial,
    textures: &FxHashMap<TextureId, Surface>,
) {
    let (width, height) = surface.size();
    if width == 0 || height == 0 {
        return;
    }
    let texel_size = Vec2::new(1.0 / width as f32, 1.0 / height as f32);
    let (color, _, mut stencil) = surface.buffers_mut();
    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) as usize;
            let stencil_pass = match stencil.as_deref_mut() {
                Some(s) => {
                    let pass = state.stencil.passes(s[i]);
                    s[i] = state.stencil.apply(s[i], pass, true);
                    pass
                }
                None => true,
            };
            if !stencil_pass || !state.color.mask() {
                continue;
            }
            let uv = Vec2::new((x as f32 + 0.5) * texel_size.x, (y as f32 + 0.5) * texel_size.y);
            let out = program(&FragmentInput::new(uv, texel_size, material, textures));
            color[i] = if material.transparent {
                blend_over(out, color[i])
            } else {
                out
            };
        }
    }
}
