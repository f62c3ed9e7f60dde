use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::settings::Theme;
use crate::util::file_extension;

use super::weighting::{LIGHTNESS_FLOOR, SATURATION_FLOOR};

pub(super) struct Palette {
    pub(super) background: Color32,
    pub(super) grid: Color32,
    pub(super) parent_link: Color32,
    pub(super) reference_link: Color32,
    pub(super) backlink: Color32,
    pub(super) folder: Color32,
    pub(super) node_stroke: Color32,
    pub(super) text: Color32,
    pub(super) selected_stroke: Color32,
}

pub(super) fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            background: Color32::from_rgb(19, 23, 29),
            grid: Color32::from_rgba_unmultiplied(60, 70, 80, 70),
            parent_link: Color32::from_rgb(71, 85, 105),
            reference_link: Color32::from_rgb(14, 165, 233),
            backlink: Color32::from_rgb(244, 114, 182),
            folder: Color32::from_rgb(245, 158, 11),
            node_stroke: Color32::from_rgb(148, 163, 184),
            text: Color32::from_rgb(203, 213, 225),
            selected_stroke: Color32::from_rgb(103, 232, 249),
        },
        Theme::Light => Palette {
            background: Color32::from_rgb(248, 250, 252),
            grid: Color32::from_rgba_unmultiplied(148, 163, 184, 60),
            parent_link: Color32::from_rgb(203, 213, 225),
            reference_link: Color32::from_rgb(56, 189, 248),
            backlink: Color32::from_rgb(236, 72, 153),
            folder: Color32::from_rgb(245, 158, 11),
            node_stroke: Color32::from_rgb(100, 116, 139),
            text: Color32::from_rgb(30, 41, 59),
            selected_stroke: Color32::from_rgb(34, 211, 238),
        },
    }
}

// small fixed palette; files pick a slot by extension hash so colors are
// stable across scans
const FILE_COLORS: [Color32; 8] = [
    Color32::from_rgb(96, 165, 250),
    Color32::from_rgb(52, 211, 153),
    Color32::from_rgb(167, 139, 250),
    Color32::from_rgb(251, 113, 133),
    Color32::from_rgb(45, 212, 191),
    Color32::from_rgb(250, 204, 21),
    Color32::from_rgb(248, 113, 113),
    Color32::from_rgb(74, 222, 128),
];

pub(super) fn file_color(name: &str) -> Color32 {
    let Some(ext) = file_extension(name) else {
        return Color32::from_rgb(156, 163, 175);
    };

    let mut hash = 0u32;
    for byte in ext.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(byte as u32);
    }
    FILE_COLORS[(hash as usize) % FILE_COLORS.len()]
}

fn rgb_to_hsl(color: Color32) -> (f32, f32, f32) {
    let r = color.r() as f32 / 255.0;
    let g = color.g() as f32 / 255.0;
    let b = color.b() as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lightness = (max + min) * 0.5;

    if (max - min).abs() < f32::EPSILON {
        return (0.0, 0.0, lightness);
    }

    let delta = max - min;
    let saturation = if lightness > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let hue = if (max - r).abs() < f32::EPSILON {
        ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() < f32::EPSILON {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    } / 6.0;

    (hue, saturation, lightness)
}

fn hue_component(p: f32, q: f32, mut t: f32) -> f32 {
    t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    if saturation <= 0.0 {
        let v = (lightness * 255.0).round() as u8;
        return Color32::from_rgb(v, v, v);
    }

    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;

    let r = hue_component(p, q, hue + 1.0 / 3.0);
    let g = hue_component(p, q, hue);
    let b = hue_component(p, q, hue - 1.0 / 3.0);

    Color32::from_rgb(
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

/// Mute a node color for depth: reduce lightness and saturation by the
/// weighting shifts, floored so deep nodes stay tinted rather than gray.
pub(super) fn mute_color(color: Color32, lightness_shift: f32, saturation_shift: f32) -> Color32 {
    if lightness_shift <= 0.0 && saturation_shift <= 0.0 {
        return color;
    }

    let (hue, saturation, lightness) = rgb_to_hsl(color);
    let lightness = (lightness - lightness_shift).max(LIGHTNESS_FLOOR);
    let saturation = (saturation - saturation_shift).max(SATURATION_FLOOR);
    hsl_to_rgb(hue, saturation, lightness)
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (color.a() as f32 * opacity.clamp(0.0, 1.0)) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32, palette: &Palette) {
    painter.rect_filled(rect, 0.0, palette.background);

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, palette.grid),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, palette.grid),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

fn normalize_sqrt(value: u64, min: u64, max: u64) -> f32 {
    let min = (min.max(1) as f64).sqrt();
    let max = (max.max(1) as f64).sqrt().max(min);
    let value = (value.max(1) as f64).sqrt();

    if (max - min).abs() < f64::EPSILON {
        return 0.5;
    }

    (((value - min) / (max - min)).clamp(0.0, 1.0)) as f32
}

/// Square-root size scale into the 4..30 pixel radius range.
pub(super) fn size_radius(size: u64, min: u64, max: u64) -> f32 {
    4.0 + (normalize_sqrt(size, min, max) * 26.0)
}

/// Square-root degree scale into the 4..25 pixel radius range.
pub(super) fn degree_radius(degree: u64, min: u64, max: u64) -> f32 {
    4.0 + (normalize_sqrt(degree, min, max) * 21.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    #[test]
    fn size_radius_spans_its_range() {
        assert_eq!(size_radius(1, 1, 1_000_000), 4.0);
        assert_eq!(size_radius(1_000_000, 1, 1_000_000), 30.0);

        let mid = size_radius(1_000, 1, 1_000_000);
        assert!(mid > 4.0 && mid < 30.0);

        // degenerate domain still lands inside the range
        assert_eq!(size_radius(5, 5, 5), 4.0 + 13.0);
    }

    #[test]
    fn scales_are_monotonic() {
        let mut previous = 0.0f32;
        for size in [1u64, 10, 100, 1_000, 10_000, 100_000] {
            let radius = degree_radius(size, 1, 100_000);
            assert!(radius >= previous);
            previous = radius;
        }
    }

    #[test]
    fn mute_color_respects_floors() {
        let base = Color32::from_rgb(245, 158, 11);
        assert_eq!(mute_color(base, 0.0, 0.0), base);

        // far past the floors: result is dim but not black and not gray
        let muted = rgb_to_hsl(mute_color(base, 5.0, 5.0));
        assert!((muted.2 - LIGHTNESS_FLOOR).abs() < 0.02);
        assert!(muted.1 >= SATURATION_FLOOR - 0.05);
    }

    #[test]
    fn hsl_round_trip_is_close() {
        for color in [
            Color32::from_rgb(245, 158, 11),
            Color32::from_rgb(14, 165, 233),
            Color32::from_rgb(30, 41, 59),
        ] {
            let (h, s, l) = rgb_to_hsl(color);
            let back = hsl_to_rgb(h, s, l);
            assert!((color.r() as i32 - back.r() as i32).abs() <= 2);
            assert!((color.g() as i32 - back.g() as i32).abs() <= 2);
            assert!((color.b() as i32 - back.b() as i32).abs() <= 2);
        }
    }

    #[test]
    fn file_colors_are_stable_per_extension() {
        assert_eq!(file_color("a.md"), file_color("b.md"));
        assert_eq!(file_color("noext"), Color32::from_rgb(156, 163, 175));
    }

    #[test]
    fn culling_keeps_touching_shapes() {
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(100.0, 100.0));
        assert!(circle_visible(rect, Pos2::new(50.0, 50.0), 5.0));
        assert!(circle_visible(rect, Pos2::new(-3.0, 50.0), 5.0));
        assert!(!circle_visible(rect, Pos2::new(-20.0, 50.0), 5.0));

        assert!(edge_visible(rect, Pos2::new(-50.0, 50.0), Pos2::new(150.0, 50.0), 2.0));
        assert!(!edge_visible(rect, Pos2::new(-50.0, -50.0), Pos2::new(-10.0, -10.0), 2.0));
    }

    #[test]
    fn screen_world_round_trip() {
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(800.0, 600.0));
        let pan = vec2(12.0, -8.0);
        let zoom = 1.7;
        let world = vec2(42.0, -17.0);
        let back = screen_to_world(rect, pan, zoom, world_to_screen(rect, pan, zoom, world));
        assert!((back - world).length() < 0.001);
    }
}
