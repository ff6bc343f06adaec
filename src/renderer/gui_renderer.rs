use super::{FrameSink, FrameStats, GuiInstance};
use crate::gui::GuiTexture;

/// Draws 2D quads over the scene, in submission order.
#[derive(Debug, Default)]
pub struct GuiRenderer;

impl GuiRenderer {
    pub fn new() -> Self {
        GuiRenderer
    }

    pub fn render<S>(&self, guis: &[GuiTexture], sink: &mut S, stats: &mut FrameStats)
    where
        S: FrameSink + ?Sized,
    {
        for gui in guis {
            sink.draw_gui(&GuiInstance {
                texture: gui.texture.id,
                position: [gui.position.x, gui.position.y],
                scale: [gui.scale.x, gui.scale.y],
            });
            stats.guis += 1;
        }
    }
}
