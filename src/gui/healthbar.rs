use log::debug;

use super::GuiTexture;

/// A fill quad inside a border quad. Damage shrinks the fill from the right
/// while its left edge stays put.
#[derive(Clone, Debug)]
pub struct Healthbar {
    fill: GuiTexture,
    border: GuiTexture,
    one_health_portion: f32,
    max_hp: u32,
    hp: u32,
}

impl Healthbar {
    pub fn new(fill: GuiTexture, border: GuiTexture, max_hp: u32) -> Self {
        let max_hp = max_hp.max(1);
        Healthbar {
            one_health_portion: fill.scale.x / max_hp as f32,
            fill,
            border,
            max_hp,
            hp: max_hp,
        }
    }

    pub fn take_damage(&mut self, damage: u32) {
        let applied = damage.min(self.hp);
        if applied == 0 {
            return;
        }
        self.hp -= applied;

        let shrink = applied as f32 * self.one_health_portion;
        self.fill.scale.x = (self.fill.scale.x - shrink).max(0.0);
        self.fill.position.x -= shrink;
        debug!("healthbar at {}/{}", self.hp, self.max_hp);
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Fill first so the border frame is drawn over it.
    pub fn guis(&self) -> [&GuiTexture; 2] {
        [&self.fill, &self.border]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_system::model::{ModelId, TexturedModel};
    use approx::assert_relative_eq;
    use nalgebra_glm::vec2;

    fn bar() -> Healthbar {
        let fill = GuiTexture::new(TexturedModel { id: ModelId(0) }, vec2(-0.5, 0.9), vec2(0.4, 0.05));
        let border = GuiTexture::new(TexturedModel { id: ModelId(1) }, vec2(-0.5, 0.9), vec2(0.4, 0.05));
        Healthbar::new(fill, border, 100)
    }

    #[test]
    fn damage_shrinks_fill_keeping_left_edge() {
        let mut hb = bar();
        let left_edge = |hb: &Healthbar| hb.guis()[0].position.x - hb.guis()[0].scale.x;
        let before = left_edge(&hb);

        hb.take_damage(25);
        assert_eq!(hb.hp(), 75);
        assert_relative_eq!(hb.guis()[0].scale.x, 0.3, epsilon = 1e-6);
        assert_relative_eq!(left_edge(&hb), before, epsilon = 1e-6);
        assert_eq!(hb.guis()[1].scale.x, 0.4);
    }

    #[test]
    fn hp_never_goes_below_zero() {
        let mut hb = bar();
        hb.take_damage(80);
        hb.take_damage(80);
        assert_eq!(hb.hp(), 0);
        assert_relative_eq!(hb.guis()[0].scale.x, 0.0, epsilon = 1e-6);

        let position = hb.guis()[0].position;
        hb.take_damage(10);
        assert_eq!(hb.guis()[0].position, position);
    }

    #[test]
    fn fill_is_drawn_before_border() {
        let hb = bar();
        let [fill, border] = hb.guis();
        assert_eq!(fill.texture.id, ModelId(0));
        assert_eq!(border.texture.id, ModelId(1));
        assert_eq!(hb.max_hp(), 100);
    }
}
