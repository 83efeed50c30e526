use glam::{Mat4, Vec3};
use rand::Rng;
use sandscape_input::InputState;
use sandscape_render::{DrawList, ShaderBinding, ShaderProgram, uniforms};

use crate::camera::Camera;
use crate::config::{SceneConfig, SceneHandles};
use crate::lighting::{FlickerState, LightRig};
use crate::rug::RugState;

/// What changed during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub flicker: FlickerState,
    pub rug_jitter: f32,
}

/// Mutable scene state and the fixed layout it is drawn with.
#[derive(Debug, Clone)]
pub struct Scene {
    config: SceneConfig,
    camera: Camera,
    lights: LightRig,
    rug: RugState,
    elapsed: f32,
    frames: u64,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let camera = Camera::new(&config.camera);
        let lights = LightRig::new(&config.lights);
        let rug = RugState::new(&config.rug);
        tracing::info!(
            moon_steps = config.moon.steps,
            pyramids = config.pyramids.len(),
            statues = config.statues.len(),
            "scene created"
        );
        Self {
            config,
            camera,
            lights,
            rug,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Advance one frame: camera from held intents, rug and spotlight
    /// steering, then this frame's random draws (rug jitter, light flicker).
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        input: &InputState,
        dt: f32,
        rng: &mut R,
    ) -> FrameReport {
        let _span = tracing::info_span!("scene_update", frame = self.frames).entered();
        let dt = dt.max(0.0);

        let (strafe, forward) = input.move_axes();
        self.camera.move_by(strafe, forward, dt);
        let (yaw, pitch) = input.look_axes();
        self.camera.rotate(yaw, pitch, dt);

        let (rug_x, rug_y) = input.rug_axes();
        self.rug.steer(&self.config.rug, rug_x, rug_y);
        self.lights.steer_spot(rug_x, rug_y);

        let rug_jitter = self.rug.roll_jitter(&self.config.rug, rng);
        let flicker = self.lights.flicker(rng);

        self.elapsed += dt;
        self.frames += 1;

        tracing::trace!(
            position = ?self.camera.position(),
            yaw = self.camera.yaw(),
            pitch = self.camera.pitch(),
            lit = flicker.lit,
            "scene updated"
        );

        FrameReport {
            frame: self.frames,
            dt,
            flicker,
            rug_jitter,
        }
    }

    /// Record every draw for the current state.
    pub fn compose(&self, handles: &SceneHandles, aspect: f32) -> DrawList {
        let _span = tracing::info_span!("scene_compose", frame = self.frames).entered();
        let projection = self.config.projection.matrix(aspect);
        let view = self.camera.view_matrix();
        let mut list = DrawList::new();

        {
            let mut lit = list.bind(ShaderProgram::Lit);
            self.bind_frame(&mut lit, projection, view);
            self.draw_moon(&mut lit, handles);
            self.draw_floor(&mut lit, handles);
            self.draw_pyramids(&mut lit, handles);
            self.draw_rocks(&mut lit, handles);
            self.draw_statues(&mut lit, handles);
        }
        {
            let mut rug = list.bind(ShaderProgram::Rug);
            self.bind_frame(&mut rug, projection, view);
            rug.set_uniform_1f(uniforms::TIME, self.elapsed);
            rug.set_uniform_1f(uniforms::SHININESS, self.config.materials.rug_shininess);
            let mut textured = rug.bind_texture(handles.rug_texture);
            textured.set_uniform_1i(uniforms::USE_TEXTURE, 1);
            textured.set_model(self.rug.model_matrix(&self.config.rug));
            textured.draw(handles.rug);
        }
        {
            let mut unlit = list.bind(ShaderProgram::Unlit);
            unlit.set_projection(projection);
            unlit.set_view(view);
            unlit.set_uniform_3f(uniforms::COLOR, self.lights.marker_color());
            let scale = Mat4::from_scale(Vec3::splat(self.config.marker_scale));
            for point in &self.lights.block().points {
                unlit.set_model(Mat4::from_translation(point.position) * scale);
                unlit.draw(handles.cube);
            }
        }

        tracing::trace!(draws = list.draw_count(), "scene composed");
        list
    }

    fn bind_frame(&self, binding: &mut ShaderBinding<'_>, projection: Mat4, view: Mat4) {
        binding.set_projection(projection);
        binding.set_view(view);
        binding.set_uniform_3f(uniforms::VIEW_POS, self.camera.position());
        binding.set_lights(self.lights.block());
        binding.set_uniform_1f(uniforms::SHININESS, self.config.materials.shininess);
    }

    fn draw_moon(&self, lit: &mut ShaderBinding<'_>, handles: &SceneHandles) {
        let moon = &self.config.moon;
        lit.set_uniform_1i(uniforms::USE_TEXTURE, 0);
        lit.set_uniform_3f(uniforms::COLOR, moon.color);
        for k in 0..moon.steps {
            lit.set_model(moon.instance_model(k));
            lit.draw(handles.cube);
        }
    }

    fn draw_floor(&self, lit: &mut ShaderBinding<'_>, handles: &SceneHandles) {
        let mut sand = lit.bind_texture(handles.sand);
        sand.set_uniform_1i(uniforms::USE_TEXTURE, 1);
        sand.set_uniform_3f(uniforms::COLOR, Vec3::ONE);
        for model in self.config.floor.cell_models() {
            sand.set_model(model);
            sand.draw(handles.tile);
        }
    }

    fn draw_pyramids(&self, lit: &mut ShaderBinding<'_>, handles: &SceneHandles) {
        let mut stone = lit.bind_texture(handles.stone);
        stone.set_uniform_1f(uniforms::SHININESS, self.config.materials.stone_shininess);
        for pyramid in &self.config.pyramids {
            let Some(mesh) = handles.pyramids.get(pyramid.variant) else {
                tracing::warn!(variant = pyramid.variant, "no mesh for pyramid variant");
                continue;
            };
            stone.set_model(pyramid.placement.model_matrix());
            stone.draw(*mesh);
        }
    }

    fn draw_rocks(&self, lit: &mut ShaderBinding<'_>, handles: &SceneHandles) {
        let mut rock = lit.bind_texture(handles.rock);
        for placement in &self.config.rocks {
            rock.set_model(placement.model_matrix());
            rock.draw(handles.cube);
        }
    }

    fn draw_statues(&self, lit: &mut ShaderBinding<'_>, handles: &SceneHandles) {
        let mut statue = lit.bind_texture(handles.statue_texture);
        statue.set_uniform_1f(uniforms::SHININESS, self.config.materials.shininess);
        for placement in &self.config.statues {
            statue.set_model(placement.model_matrix());
            statue.draw(handles.statue);
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn rug(&self) -> &RugState {
        &self.rug
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Seconds of simulated time so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sandscape_input::{InputEvent, Intent};

    fn scene() -> Scene {
        Scene::new(SceneConfig::desert())
    }

    fn holding(intents: &[Intent]) -> InputState {
        let mut input = InputState::new();
        for intent in intents {
            input.apply(InputEvent::pressed(*intent));
        }
        input
    }

    #[test]
    fn compose_draw_counts() {
        let scene = scene();
        let list = scene.compose(&SceneHandles::placeholder(), 16.0 / 9.0);
        let config = scene.config();
        let lit = config.moon.steps as usize
            + 36
            + config.pyramids.len()
            + config.rocks.len()
            + config.statues.len();
        assert_eq!(list.draws_with(ShaderProgram::Lit).count(), lit);
        assert_eq!(list.draws_with(ShaderProgram::Rug).count(), 1);
        assert_eq!(list.draws_with(ShaderProgram::Unlit).count(), 3);
        assert_eq!(list.groups().len(), 3);
    }

    #[test]
    fn moon_is_untextured_and_floor_is_sand() {
        let handles = SceneHandles::placeholder();
        let list = scene().compose(&handles, 1.0);
        let lit: Vec<_> = list.draws_with(ShaderProgram::Lit).collect();
        assert!(lit[..360].iter().all(|d| d.texture.is_none() && !d.material.use_texture));
        assert!(lit[360..396].iter().all(|d| d.texture == Some(handles.sand)));
        assert!(lit[360..396].iter().all(|d| d.mesh == handles.tile));
    }

    #[test]
    fn textures_do_not_leak_between_groups() {
        let handles = SceneHandles::placeholder();
        let list = scene().compose(&handles, 1.0);
        assert!(list.draws_with(ShaderProgram::Unlit).all(|d| d.texture.is_none()));
        let rug = list.draws_with(ShaderProgram::Rug).next().unwrap();
        assert_eq!(rug.texture, Some(handles.rug_texture));
    }

    #[test]
    fn markers_follow_flicker() {
        let mut scene = scene();
        let handles = SceneHandles::placeholder();
        let on = scene.config().lights.marker_on;
        let off = scene.config().lights.marker_off;

        let list = scene.compose(&handles, 1.0);
        assert!(list.draws_with(ShaderProgram::Unlit).all(|d| d.material.color == on));

        scene.lights.apply_flicker(99.0);
        let list = scene.compose(&handles, 1.0);
        assert!(list.draws_with(ShaderProgram::Unlit).all(|d| d.material.color == off));
        let lit_group = &list.groups()[0];
        assert!(lit_group.lights.points.iter().all(|p| p.color.diffuse == Vec3::ZERO));
    }

    #[test]
    fn projection_follows_aspect() {
        let scene = scene();
        let handles = SceneHandles::placeholder();
        let wide = scene.compose(&handles, 2.0);
        let square = scene.compose(&handles, 1.0);
        assert_ne!(wide.groups()[0].projection, square.groups()[0].projection);
    }

    #[test]
    fn update_moves_camera_forward() {
        let mut scene = scene();
        let mut rng = StdRng::seed_from_u64(1);
        let start = scene.camera().position();
        let input = holding(&[Intent::MoveForward]);
        scene.update(&input, 0.5, &mut rng);
        let moved = scene.camera().position() - start;
        assert!(moved.length() > 0.0);
        assert_eq!(moved.y, 0.0);
        assert!(moved.z > 0.0);
    }

    #[test]
    fn idle_update_keeps_pose() {
        let mut scene = scene();
        let mut rng = StdRng::seed_from_u64(2);
        let (pos, front) = (scene.camera().position(), scene.camera().front());
        let report = scene.update(&InputState::new(), 1.0 / 60.0, &mut rng);
        assert_eq!(scene.camera().position(), pos);
        assert!(scene.camera().front().abs_diff_eq(front, 1e-6));
        assert_eq!(report.frame, 1);
        assert!((scene.elapsed() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn rug_time_uniform_tracks_elapsed() {
        let mut scene = scene();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            scene.update(&InputState::new(), 0.1, &mut rng);
        }
        let list = scene.compose(&SceneHandles::placeholder(), 1.0);
        let rug = list.draws_with(ShaderProgram::Rug).next().unwrap();
        assert!((rug.material.time - 1.0).abs() < 1e-5);
    }

    #[test]
    fn same_seed_same_frames() {
        let run = || {
            let mut scene = scene();
            let mut rng = StdRng::seed_from_u64(42);
            let input = holding(&[Intent::LookRight, Intent::RugUp]);
            (0..50)
                .map(|_| scene.update(&input, 1.0 / 60.0, &mut rng).flicker.sample)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
