use sandscape_tools::FrameSummary;

/// Debug overlay listing the frame summary.
pub fn draw(ctx: &egui::Context, summary: &FrameSummary) {
    egui::Window::new("Sandscape")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!(
                "FPS: {:.1}  avg {:.2?}  max {:.2?}",
                summary.fps, summary.frame_time_avg, summary.frame_time_max
            ));
            ui.label(format!("Frame {}  t={:.1}s", summary.frame, summary.elapsed));
            ui.separator();

            let p = summary.camera_position;
            ui.label(format!("Camera: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
            ui.label(format!("Yaw {:.1}  Pitch {:.1}", summary.yaw, summary.pitch));
            let r = summary.rug_offset;
            ui.label(format!("Rug: ({:.2}, {:.2}, {:.2})", r.x, r.y, r.z));
            ui.separator();

            let lights = &summary.lights;
            let status = if lights.points_lit {
                egui::RichText::new("on")
            } else {
                egui::RichText::new("OUT").color(egui::Color32::LIGHT_RED)
            };
            ui.horizontal(|ui| {
                ui.label("Point lights:");
                ui.label(status);
            });
            let d = lights.spot_direction;
            ui.label(format!("Spot dir: ({:.1}, {:.1}, {:.1})", d.x, d.y, d.z));
            ui.label(format!(
                "Draws: {} in {} groups",
                summary.draw_calls, summary.draw_groups
            ));

            ui.separator();
            ui.small("WASD move | Arrows look | IJKL rug | F1 overlay | Esc quit");
        });
}
