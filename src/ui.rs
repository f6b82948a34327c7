use egui::Context;

use crate::config::KeyBindings;
use crate::controller::FrameContext;

/// Build the overlay (released pointer) or HUD (captured pointer) for this frame.
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, frame: &FrameContext) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        if frame.controls.overlay_visible() {
            draw_overlay(ctx, frame.input_processor.bindings());
        } else {
            draw_crosshair(ctx);
            draw_hud(ctx, frame);
        }
    })
}

/// Human-readable key name for a physical code ("KeyW" -> "W").
fn key_label(code: &str) -> &str {
    code.strip_prefix("Key")
        .or_else(|| code.strip_prefix("Digit"))
        .unwrap_or(code)
}

fn controls_help(bindings: &KeyBindings) -> Vec<String> {
    vec![
        format!(
            "{} {} {} {} - Move",
            key_label(&bindings.forward),
            key_label(&bindings.left),
            key_label(&bindings.backward),
            key_label(&bindings.right)
        ),
        format!("{} - Up", key_label(&bindings.up)),
        format!("{} - Down", key_label(&bindings.down)),
        "Mouse - Look".to_string(),
        format!("{} - Release mouse", key_label(&bindings.release_pointer)),
    ]
}

fn draw_overlay(ctx: &Context, bindings: &KeyBindings) {
    let screen = ctx.screen_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("overlay_dim")));
    painter.rect_filled(screen, 0.0, egui::Color32::from_black_alpha(128));

    egui::Area::new(egui::Id::new("overlay"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("Click to play").size(32.0).color(egui::Color32::WHITE));
                ui.add_space(8.0);
                for line in controls_help(bindings) {
                    ui.label(egui::RichText::new(line).color(egui::Color32::LIGHT_GRAY));
                }
            });
        });
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("crosshair")));
    let center = ctx.screen_rect().center();
    let size = 10.0;
    let stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    painter.line_segment([egui::pos2(center.x - size, center.y), egui::pos2(center.x + size, center.y)], stroke);
    painter.line_segment([egui::pos2(center.x, center.y - size), egui::pos2(center.x, center.y + size)], stroke);
}

fn draw_hud(ctx: &Context, frame: &FrameContext) {
    let eye = frame.camera.eye;
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(egui::Color32::from_black_alpha(140))
                .inner_margin(6.0)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(format!("FPS: {:.0}", frame.stats.fps)).small());
                    ui.label(
                        egui::RichText::new(format!("Pos: x: {:.1} y: {:.1} z: {:.1}", eye.x, eye.y, eye.z)).small(),
                    );
                    ui.label(
                        egui::RichText::new(format!(
                            "Yaw: {:.0} Pitch: {:.0}",
                            frame.camera.yaw.to_degrees(),
                            frame.camera.pitch.to_degrees()
                        ))
                        .small(),
                    );
                    ui.label(egui::RichText::new(format!("Bodies: {}", frame.world.body_count())).small());
                    ui.label(egui::RichText::new(format!("Steps: {}", frame.world.steps())).small());
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::controller::InputEvent;

    fn raw_input() -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))),
            ..Default::default()
        }
    }

    #[test]
    fn key_labels_drop_code_prefix() {
        assert_eq!(key_label("KeyW"), "W");
        assert_eq!(key_label("Digit1"), "1");
        assert_eq!(key_label("Escape"), "Escape");
    }

    #[test]
    fn help_lists_bound_keys() {
        let help = controls_help(&KeyBindings::default());
        assert_eq!(help[0], "W A S D - Move");
        assert_eq!(help[1], "Q - Up");
        assert_eq!(help[2], "E - Down");
    }

    #[test]
    fn overlay_and_hud_both_produce_shapes() {
        let ctx = Context::default();
        let config = SceneConfig { body_count: 0, ..SceneConfig::default() };
        let mut frame = FrameContext::new(config, KeyBindings::default(), 800, 600);

        let overlay = build_ui(&ctx, raw_input(), &frame);
        assert!(!overlay.shapes.is_empty());

        frame.handle_event(&InputEvent::PointerLockChanged { locked: true });
        let hud = build_ui(&ctx, raw_input(), &frame);
        assert!(!hud.shapes.is_empty());
    }
}
