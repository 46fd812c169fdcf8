//! Headless Renderer
//!
//! A complete [`Renderer`] that runs on the CPU. It drives the same registry
//! stack a GPU backend would (object cache, geometry registry, binding
//! states, property store, render lists, clipping) against a
//! [`RecordingDevice`], and rasterizes triangle draws into [`Surface`]s so
//! composed images can be inspected pixel by pixel.
//!
//! # Fullscreen programs
//!
//! Fullscreen materials are executed by a [`FragmentProgram`] registered
//! under the material's name. The `copy` program is always present.
//!
//! ```rust,ignore
//! let mut renderer = HeadlessRenderer::new(RendererSettings::default());
//! renderer.register_program("invert", |input| {
//!     let c = input.texture("tDiffuse", input.uv);
//!     Vec4::new(1.0 - c.x, 1.0 - c.y, 1.0 - c.z, c.w)
//! });
//! ```

mod device;
mod raster;
mod surface;

use std::cmp::Ordering;

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;

pub use device::{DeviceStats, RecordingDevice, UploadRecord};
pub use surface::{FragmentInput, FragmentProgram, Surface, copy_program};

use self::raster::RasterJob;
use super::backend::{ClearFlags, Renderer};
use super::clipping::Clipping;
use super::core::{
    BufferRenderer, DisposeReport, DrawMode, IndexBinding, ObjectCache, PropertyStore, RenderInfo,
};
use super::lists::{Drawable, RenderItem, RenderList, RenderLists};
use super::state::DrawState;
use crate::errors::{Result, StrataError};
use crate::resources::{
    Attribute, BufferGeometry, Geometry, Material, MaterialId, Plane, RenderTarget, RenderTargetId,
    ShaderMaterial, TextureId,
};
use crate::scene::{Camera, MaterialKey, MaterialSlot, Mesh, MeshId, MeshKey, Scene};
use crate::settings::RendererSettings;

/// Custom bucket comparator installed with
/// [`HeadlessRenderer::set_opaque_sort`] / [`HeadlessRenderer::set_transparent_sort`].
pub type SortFunction = Box<dyn Fn(&RenderItem, &RenderItem) -> Ordering>;

/// One submitted scene draw, as seen by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub object: MeshKey,
    pub mesh: MeshId,
    pub material: MaterialKey,
    /// `None` when drawn to the screen
    pub target: Option<RenderTargetId>,
    /// Camera-space clipping coefficients bound for the draw
    pub clipping_planes: Vec<f32>,
    pub num_planes: usize,
    pub num_intersection: usize,
    pub instance_count: Option<u32>,
    pub wireframe: bool,
}

pub struct HeadlessRenderer {
    settings: RendererSettings,
    /// Global clipping planes, world space
    pub clipping_planes: Vec<Plane>,

    device: RecordingDevice,
    state: DrawState,
    info: RenderInfo,
    properties: PropertyStore,
    objects: ObjectCache,
    render_lists: RenderLists,
    clipping: Clipping,
    clipping_enabled: bool,
    opaque_sort: Option<SortFunction>,
    transparent_sort: Option<SortFunction>,

    clear_color: Vec3,
    clear_alpha: f32,
    auto_clear: bool,

    current_target: Option<RenderTarget>,
    current_material: Option<MaterialId>,
    current_camera: Option<u64>,
    surfaces: FxHashMap<TextureId, Surface>,
    screen: Surface,
    programs: FxHashMap<String, FragmentProgram>,
    draw_log: Vec<DrawRecord>,
    render_call_depth: usize,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new(settings: RendererSettings) -> Self {
        let mut programs: FxHashMap<String, FragmentProgram> = FxHashMap::default();
        programs.insert("copy".to_string(), Box::new(copy_program));

        let screen = screen_surface(&settings);
        Self {
            device: RecordingDevice::new(settings.instancing_supported),
            clear_color: settings.clear_color,
            clear_alpha: settings.clear_alpha,
            auto_clear: settings.auto_clear,
            settings,
            clipping_planes: Vec::new(),
            state: DrawState::default(),
            info: RenderInfo::default(),
            properties: PropertyStore::new(),
            objects: ObjectCache::new(),
            render_lists: RenderLists::new(),
            clipping: Clipping::new(),
            clipping_enabled: false,
            opaque_sort: None,
            transparent_sort: None,
            current_target: None,
            current_material: None,
            current_camera: None,
            surfaces: FxHashMap::default(),
            screen,
            programs,
            draw_log: Vec::new(),
            render_call_depth: 0,
        }
    }

    /// Registers (or replaces) the program run for fullscreen materials named
    /// `name`.
    pub fn register_program(
        &mut self,
        name: &str,
        program: impl Fn(&FragmentInput<'_>) -> Vec4 + 'static,
    ) {
        self.programs.insert(name.to_string(), Box::new(program));
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[must_use]
    pub fn screen(&self) -> &Surface {
        &self.screen
    }

    /// Storage of `target`, if it has been bound since its last disposal.
    #[must_use]
    pub fn surface(&self, target: &RenderTarget) -> Option<&Surface> {
        self.surfaces.get(&target.texture())
    }

    #[must_use]
    pub fn device(&self) -> &RecordingDevice {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut RecordingDevice {
        &mut self.device
    }

    #[must_use]
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut RenderInfo {
        &mut self.info
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    #[must_use]
    pub fn objects(&self) -> &ObjectCache {
        &self.objects
    }

    #[must_use]
    pub fn clipping(&self) -> &Clipping {
        &self.clipping
    }

    #[must_use]
    pub fn draw_log(&self) -> &[DrawRecord] {
        &self.draw_log
    }

    pub fn clear_draw_log(&mut self) {
        self.draw_log.clear();
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Resizes the screen surface. Its contents are discarded.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.settings.width = width;
        self.settings.height = height;
        self.screen = screen_surface(&self.settings);
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.settings.pixel_ratio = pixel_ratio;
        self.screen = screen_surface(&self.settings);
    }

    pub fn set_local_clipping_enabled(&mut self, enabled: bool) {
        self.settings.local_clipping_enabled = enabled;
    }

    pub fn set_sort_objects(&mut self, sort: bool) {
        self.settings.sort_objects = sort;
    }

    pub fn set_opaque_sort(&mut self, sort: Option<SortFunction>) {
        self.opaque_sort = sort;
    }

    pub fn set_transparent_sort(&mut self, sort: Option<SortFunction>) {
        self.transparent_sort = sort;
    }

    // ========================================================================
    // Disposal
    // ========================================================================

    /// Releases every GPU resource held for `geometry`.
    pub fn dispose_geometry(&mut self, geometry: &Geometry) -> DisposeReport {
        if let Geometry::Polygon(polygon) = geometry
            && !polygon.is_converted()
        {
            return DisposeReport::default();
        }
        self.objects.forget_geometry(geometry.buffer_geometry().id());
        self.objects
            .geometries_mut()
            .dispose(&mut self.device, &mut self.info, geometry)
    }

    /// Releases the instance buffers of `mesh`.
    pub fn dispose_mesh(&mut self, mesh: &Mesh) -> bool {
        self.objects.dispose_mesh(&mut self.device, mesh)
    }

    /// Releases the bindings and properties recorded for `material`.
    pub fn dispose_material(&mut self, material: &Material) -> usize {
        let released = self
            .objects
            .geometries_mut()
            .bindings_mut()
            .release_states_of_material(&mut self.device, material.id());
        self.properties.remove(material.id());
        released
    }

    /// Releases every cache. Surfaces of render targets are dropped as well.
    pub fn dispose(&mut self) {
        self.objects.geometries_mut().release_all(&mut self.device);
        self.objects.dispose();
        self.properties.dispose();
        self.render_lists.dispose();
        self.surfaces.clear();
        self.current_target = None;
        log::debug!("HeadlessRenderer: disposed");
    }

    // ========================================================================
    // Scene rendering
    // ========================================================================

    fn project_scene(&mut self, scene: &Scene, camera: &Camera, list: &mut RenderList) -> Result<()> {
        for (key, mesh) in &scene.meshes {
            if !mesh.visible {
                continue;
            }
            let geometry = scene
                .geometry(mesh.geometry)
                .ok_or_else(|| StrataError::MissingGeometry {
                    mesh: mesh.name.clone(),
                })?;
            let buffer_geometry =
                self.objects
                    .update(&mut self.device, &mut self.info, mesh, geometry);

            let z = if self.settings.sort_objects {
                camera.project_depth(mesh.position())
            } else {
                0.0
            };

            match &mesh.material {
                MaterialSlot::Single(material_key) => {
                    let material = scene.material(*material_key).ok_or_else(|| {
                        StrataError::MissingMaterial {
                            mesh: mesh.name.clone(),
                        }
                    })?;
                    if material.visible {
                        list.push(&Drawable {
                            key,
                            mesh,
                            geometry: mesh.geometry,
                            material_key: *material_key,
                            material,
                            group_order: mesh.group_order,
                            z,
                            group: None,
                        });
                    }
                }
                MaterialSlot::Multi(materials) => {
                    for group in buffer_geometry.groups() {
                        let Some(&material_key) = materials.get(group.material_index) else {
                            continue;
                        };
                        let Some(material) = scene.material(material_key) else {
                            continue;
                        };
                        if material.visible {
                            list.push(&Drawable {
                                key,
                                mesh,
                                geometry: mesh.geometry,
                                material_key,
                                material,
                                group_order: mesh.group_order,
                                z,
                                group: Some(*group),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn draw_item(&mut self, scene: &Scene, camera: &Camera, item: &RenderItem) -> Result<()> {
        let (Some(object), Some(item_material)) = (item.object, item.material) else {
            return Ok(());
        };
        let Some(mesh) = scene.mesh(object) else {
            return Ok(());
        };
        let material_key = scene.override_material.unwrap_or(item_material);
        let material = scene
            .material(material_key)
            .ok_or_else(|| StrataError::MissingMaterial {
                mesh: mesh.name.clone(),
            })?;
        let geometry = scene
            .geometry(mesh.geometry)
            .ok_or_else(|| StrataError::MissingGeometry {
                mesh: mesh.name.clone(),
            })?
            .buffer_geometry();

        if self.clipping_enabled {
            let from_cache = self.current_camera == Some(camera.id())
                && self.current_material == Some(material.id());
            let record = self.properties.get(material.id());
            self.clipping.set_state(
                &material.clipping_planes,
                material.clip_intersection,
                material.clip_shadows,
                camera,
                record,
                from_cache,
            );
            record.insert("num_clipping_planes", self.clipping.num_planes);
            record.insert("num_intersection", self.clipping.num_intersection);
        }
        self.current_camera = Some(camera.id());
        self.current_material = Some(material.id());

        let wireframe = material.wireframe;
        let index = if wireframe {
            self.objects
                .geometries_mut()
                .wireframe_attribute(&mut self.device, geometry)
                .cloned()
        } else {
            geometry.index().cloned()
        };
        let index_binding = index.as_ref().map(|index| {
            let gpu = self.objects.geometries_mut().attributes_mut().update(
                &mut self.device,
                index,
                wgpu::BufferUsages::INDEX,
            );
            IndexBinding {
                buffer: gpu.buffer,
                element_type: gpu.element_type,
            }
        });
        self.objects.geometries_mut().bindings_mut().setup(
            &mut self.device,
            geometry.id(),
            material.id(),
            wireframe,
        );

        let Some((start, count)) = draw_span(geometry, index.as_ref(), item, wireframe) else {
            return Ok(());
        };

        let mode = if wireframe { DrawMode::Lines } else { mesh.draw_mode };
        let mut renderer = BufferRenderer::new(mode);
        renderer.set_index(index_binding);

        let instance_count = mesh.instances.as_ref().map(|instances| instances.count);
        match instance_count {
            Some(n) => {
                if !renderer.render_instances(&mut self.device, &mut self.info, start, count, n) {
                    return Ok(());
                }
            }
            None => renderer.render(&mut self.device, &mut self.info, start, count),
        }

        let planes: &[f32] = if self.clipping_enabled {
            self.clipping.planes()
        } else {
            &[]
        };
        self.draw_log.push(DrawRecord {
            object,
            mesh: mesh.id(),
            material: material_key,
            target: self.current_target.as_ref().map(RenderTarget::id),
            clipping_planes: planes.to_vec(),
            num_planes: planes.len() / 4,
            num_intersection: if planes.is_empty() {
                0
            } else {
                self.clipping.num_intersection
            },
            instance_count,
            wireframe,
        });

        if mode == DrawMode::Triangles
            && let Some(positions) = geometry.position()
        {
            let surface = match &self.current_target {
                Some(target) => self.surfaces.get_mut(&target.texture()),
                None => Some(&mut self.screen),
            };
            let Some(surface) = surface else {
                return Ok(());
            };
            let world = Mat4::from(mesh.world_matrix);
            let models: Vec<Mat4> = match &mesh.instances {
                Some(instances) => (0..instances.count as usize)
                    .map(|i| world * instance_matrix(&instances.matrices, i))
                    .collect(),
                None => vec![world],
            };
            let num_intersection = if planes.is_empty() {
                0
            } else {
                self.clipping.num_intersection
            };
            for model in models {
                let job = RasterJob {
                    positions,
                    index: index.as_ref(),
                    start,
                    count,
                    model_view: *camera.view_matrix() * model,
                    projection: *camera.projection_matrix(),
                    color: material.color,
                    blend: material.transparent,
                    clip_planes: planes,
                    num_intersection,
                };
                raster::rasterize(surface, &self.state, &job);
            }
        }
        Ok(())
    }

    fn clear_with(&mut self, flags: ClearFlags, color: Vec4) {
        let surface = match &self.current_target {
            Some(target) => self.surfaces.get_mut(&target.texture()),
            None => Some(&mut self.screen),
        };
        let Some(surface) = surface else {
            return;
        };
        if flags.contains(ClearFlags::COLOR) && self.state.color.mask() {
            surface.fill_color(color);
        }
        if flags.contains(ClearFlags::DEPTH) && self.state.depth.mask() {
            surface.fill_depth(self.state.depth.clear());
        }
        if flags.contains(ClearFlags::STENCIL) {
            surface.fill_stencil(
                self.state.stencil.clear() as u8,
                self.state.stencil.write_mask() as u8,
            );
        }
    }
}

impl Renderer for HeadlessRenderer {
    fn size(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    fn pixel_ratio(&self) -> f32 {
        self.settings.pixel_ratio
    }

    fn render_target(&self) -> Option<&RenderTarget> {
        self.current_target.as_ref()
    }

    /// Binding a target (re)allocates its surface when it is missing or its
    /// size or buffers no longer match.
    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        if let Some(target) = target {
            let (width, height) = target.size();
            let fits = self.surfaces.get(&target.texture()).is_some_and(|s| {
                s.size() == (width, height) && s.has_stencil() == target.has_stencil()
            });
            if !fits {
                log::debug!(
                    "HeadlessRenderer: allocating {}x{} surface for '{}'",
                    width,
                    height,
                    target.label
                );
                self.surfaces.insert(
                    target.texture(),
                    Surface::new(width, height, target.has_depth(), target.has_stencil()),
                );
            }
        }
        self.current_target = target.cloned();
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<()> {
        self.clear_with(flags, self.clear_color.extend(self.clear_alpha));
        Ok(())
    }

    fn clear_color(&self) -> Vec3 {
        self.clear_color
    }

    fn clear_alpha(&self) -> f32 {
        self.clear_alpha
    }

    fn set_clear_color(&mut self, color: Vec3, alpha: f32) {
        self.clear_color = color;
        self.clear_alpha = alpha;
    }

    fn set_clear_alpha(&mut self, alpha: f32) {
        self.clear_alpha = alpha;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn set_auto_clear(&mut self, auto_clear: bool) {
        self.auto_clear = auto_clear;
    }

    fn auto_clear_flags(&self) -> ClearFlags {
        self.settings.auto_clear_flags
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        self.info.begin_frame();
        self.current_material = None;
        self.current_camera = None;
        self.clipping_enabled = self.clipping.init(
            &self.clipping_planes,
            self.settings.local_clipping_enabled,
            camera,
        );

        let depth = self.render_call_depth;
        let mut list = std::mem::take(self.render_lists.get(scene.id(), depth));
        self.render_call_depth += 1;
        let result = self.render_list(scene, camera, &mut list);
        self.render_call_depth -= 1;
        *self.render_lists.get(scene.id(), depth) = list;
        result
    }

    fn render_fullscreen(&mut self, material: &ShaderMaterial) -> Result<()> {
        let program = self
            .programs
            .get(&material.name)
            .ok_or_else(|| StrataError::UnknownProgram(material.name.clone()))?;
        self.info.begin_frame();

        let bound = self.current_target.as_ref().map(RenderTarget::texture);
        let mut surface = match bound {
            Some(texture) => self
                .surfaces
                .remove(&texture)
                .ok_or_else(|| StrataError::Backend(format!("no surface bound for {texture:?}")))?,
            None => std::mem::replace(&mut self.screen, Surface::new(0, 0, false, false)),
        };
        raster::shade_fullscreen(&mut surface, &self.state, program, material, &self.surfaces);
        match bound {
            Some(texture) => {
                self.surfaces.insert(texture, surface);
            }
            None => self.screen = surface,
        }
        self.info.update(3, DrawMode::Triangles, 1);
        Ok(())
    }

    fn state(&self) -> &DrawState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DrawState {
        &mut self.state
    }

    fn dispose_render_target(&mut self, target: &RenderTarget) {
        if self.surfaces.remove(&target.texture()).is_some() {
            log::debug!("HeadlessRenderer: released surface of '{}'", target.label);
        }
    }
}

impl HeadlessRenderer {
    fn render_list(&mut self, scene: &Scene, camera: &Camera, list: &mut RenderList) -> Result<()> {
        list.init();
        self.project_scene(scene, camera, list)?;
        list.finish();
        if self.settings.sort_objects {
            list.sort(self.opaque_sort.as_deref(), self.transparent_sort.as_deref());
        }

        if let Some(background) = scene.background {
            self.clear_with(self.settings.auto_clear_flags, background);
        } else if self.auto_clear {
            self.clear(self.settings.auto_clear_flags)?;
        }

        let items: Vec<RenderItem> = list
            .opaque()
            .chain(list.transmissive())
            .chain(list.transparent())
            .cloned()
            .collect();
        for item in &items {
            self.draw_item(scene, camera, item)?;
        }

        if self.clipping_enabled {
            self.clipping.reset_global_state();
        }
        Ok(())
    }
}

fn screen_surface(settings: &RendererSettings) -> Surface {
    let width = (settings.width as f32 * settings.pixel_ratio) as u32;
    let height = (settings.height as f32 * settings.pixel_ratio) as u32;
    Surface::new(width, height, true, settings.stencil)
}

fn instance_matrix(matrices: &Attribute, i: usize) -> Mat4 {
    let mut cols = [0.0; 16];
    for (c, value) in cols.iter_mut().enumerate() {
        *value = matrices.component(i, c).unwrap_or(0.0);
    }
    Mat4::from_cols_array(&cols)
}

/// Element range of a draw after intersecting the draw range, the item's
/// group and the available data. `None` when nothing is left to draw.
fn draw_span(
    geometry: &BufferGeometry,
    index: Option<&Attribute>,
    item: &RenderItem,
    wireframe: bool,
) -> Option<(u32, u32)> {
    let factor: u64 = if wireframe { 2 } else { 1 };
    let range = &geometry.draw_range;
    let mut start = u64::from(range.start) * factor;
    let mut end = u64::from(range.end).saturating_mul(factor);
    if let Some(group) = item.group {
        start = start.max(u64::from(group.start) * factor);
        end = end.min((u64::from(group.start) + u64::from(group.count)) * factor);
    }
    let data_count = match index {
        Some(index) => index.count() as u64,
        None => geometry.position().map_or(0, |p| p.count() as u64),
    };
    end = end.min(data_count);
    (end > start).then(|| (start as u32, (end - start) as u32))
}
