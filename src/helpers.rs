use macroquad::prelude::*;

pub async fn load_single_texture(dir: &str, name: &str) -> Option<Texture2D> {
    let tile_path = format!("{}/{}.png", dir, name);
    let texture = load_texture(&tile_path).await.ok()?;
    texture.set_filter(FilterMode::Nearest);
    Some(texture)
}

pub fn draw_hitbox(hitbox: Rect) {
    draw_rectangle_lines(
        hitbox.x,
        hitbox.y,
        hitbox.w,
        hitbox.h,
        1.0,
        Color::from_hex(0xFF0000),
    );
}

/// Strict overlap test: rectangles that only share an edge do not collide.
pub fn rects_collide(a: Rect, b: Rect) -> bool {
    !(a.x >= b.x + b.w || a.x + a.w <= b.x || a.y >= b.y + b.h || a.y + a.h <= b.y)
}

/// Index of the first rectangle in `others` colliding with `rect`.
pub fn collide_list(rect: Rect, others: &[Rect]) -> Option<usize> {
    others.iter().position(|other| rects_collide(rect, *other))
}

pub fn rect_center(rect: Rect) -> Vec2 {
    vec2(rect.x + rect.w * 0.5, rect.y + rect.h * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!rects_collide(a, b));
        assert!(rects_collide(a, Rect::new(9.0, 9.0, 4.0, 4.0)));
    }

    #[test]
    fn collide_list_returns_first_hit() {
        let walls = [
            Rect::new(100.0, 100.0, 5.0, 5.0),
            Rect::new(0.0, 0.0, 5.0, 5.0),
            Rect::new(1.0, 1.0, 5.0, 5.0),
        ];
        assert_eq!(collide_list(Rect::new(2.0, 2.0, 1.0, 1.0), &walls), Some(1));
        assert_eq!(collide_list(Rect::new(50.0, 50.0, 1.0, 1.0), &walls), None);
    }
}
