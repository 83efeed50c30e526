use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::frame::{DrawList, ShaderProgram};

/// Renderer-agnostic interface for consumers that only need a `DrawList`.
///
/// GPU backends that need device handles expose their own entry points;
/// this trait covers headless renderers used by tools and tests.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one recorded frame.
    fn render(&mut self, frame: &DrawList) -> Self::Output;
}

/// Draw-call counts for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub groups: usize,
    pub draws: usize,
    pub per_program: BTreeMap<ShaderProgram, usize>,
    pub textured: usize,
}

impl DrawStats {
    pub fn of(frame: &DrawList) -> Self {
        let mut stats = Self {
            groups: frame.groups().len(),
            ..Self::default()
        };
        for group in frame.groups() {
            *stats.per_program.entry(group.program).or_default() += group.draws.len();
            stats.draws += group.draws.len();
            stats.textured += group.draws.iter().filter(|d| d.texture.is_some()).count();
        }
        stats
    }
}

/// Produces a human-readable listing of a frame's draw groups.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &DrawList) -> String {
        self.frames += 1;
        let stats = DrawStats::of(frame);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({} groups, {} draws) ===",
            self.frames, stats.groups, stats.draws
        );
        for group in frame.groups() {
            let eye = group.view_position;
            let _ = writeln!(
                out,
                "[{}] draws={} eye=({:.2}, {:.2}, {:.2})",
                group.program.name(),
                group.draws.len(),
                eye.x,
                eye.y,
                eye.z
            );
            if group.program.is_lit() {
                let lit = group
                    .lights
                    .points
                    .iter()
                    .filter(|p| p.color.diffuse.length_squared() > 0.0)
                    .count();
                let _ = writeln!(out, "  point lights on: {lit}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{MeshHandle, TextureHandle};

    fn sample_frame() -> DrawList {
        let mut list = DrawList::new();
        {
            let mut lit = list.bind(ShaderProgram::Lit);
            let mut tex = lit.bind_texture(TextureHandle(0));
            tex.draw(MeshHandle(0));
            tex.draw(MeshHandle(1));
        }
        {
            let mut unlit = list.bind(ShaderProgram::Unlit);
            unlit.draw(MeshHandle(0));
        }
        list
    }

    #[test]
    fn stats_count_per_program() {
        let stats = DrawStats::of(&sample_frame());
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.draws, 3);
        assert_eq!(stats.textured, 2);
        assert_eq!(stats.per_program[&ShaderProgram::Lit], 2);
        assert_eq!(stats.per_program[&ShaderProgram::Unlit], 1);
    }

    #[test]
    fn debug_renderer_lists_groups() {
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&sample_frame());
        assert!(output.contains("Frame 1"));
        assert!(output.contains("[lit] draws=2"));
        assert!(output.contains("[unlit] draws=1"));
        assert!(output.contains("point lights on: 0"));
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn empty_frame() {
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&DrawList::new());
        assert!(output.contains("0 groups, 0 draws"));
    }
}
