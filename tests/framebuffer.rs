//! Tests for the drawing primitives

use s1_display::framebuffer::TOTAL_PIXELS;
use s1_display::{Framebuffer, HEIGHT, Rgb, WIDTH, rgb565};

#[test]
fn test_new_framebuffer_is_black() {
    let fb = Framebuffer::new();
    assert_eq!(fb.pixels().len(), 320 * 170);
    assert!(fb.pixels().iter().all(|&p| p == 0));
}

#[test]
fn test_clear_sets_every_pixel() {
    let mut fb = Framebuffer::new();
    let color = Rgb::new(12, 200, 99);
    fb.clear(color);
    let expected = rgb565(12, 200, 99);
    assert_eq!(fb.pixels().len(), TOTAL_PIXELS);
    assert!(fb.pixels().iter().all(|&p| p == expected));
}

#[test]
fn test_set_pixel_row_major() {
    let mut fb = Framebuffer::new();
    fb.set_pixel(3, 2, Rgb::RED);
    assert_eq!(fb.pixels()[2 * WIDTH + 3], 0x00F8);
    assert_eq!(fb.pixel(3, 2), Some(0x00F8));
    assert_eq!(fb.pixels().iter().filter(|&&p| p != 0).count(), 1);
}

#[test]
fn test_set_pixel_out_of_bounds_is_ignored() {
    let mut fb = Framebuffer::new();
    fb.clear(Rgb::BLUE);
    let before = fb.clone();

    for (x, y) in [(-1, 0), (0, -1), (320, 0), (0, 170), (1000, 1000), (i32::MIN, i32::MAX)] {
        fb.set_pixel(x, y, Rgb::WHITE);
        assert_eq!(fb.pixel(x, y), None);
    }
    assert!(fb == before);
}

#[test]
fn test_fill_rect_full_screen_equals_clear() {
    let mut filled = Framebuffer::new();
    filled.fill_rect(0, 0, WIDTH as i32, HEIGHT as i32, Rgb::MAGENTA);

    let mut cleared = Framebuffer::new();
    cleared.clear(Rgb::MAGENTA);

    assert!(filled == cleared);
}

#[test]
fn test_fill_rect_writes_only_inside() {
    let mut fb = Framebuffer::new();
    fb.fill_rect(10, 20, 5, 3, Rgb::WHITE);

    for y in 0..HEIGHT as i32 {
        for x in 0..WIDTH as i32 {
            let inside = (10..15).contains(&x) && (20..23).contains(&y);
            let expected = if inside { 0xFFFF } else { 0 };
            assert_eq!(fb.pixel(x, y), Some(expected), "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_fill_rect_clips_at_edges() {
    let mut fb = Framebuffer::new();
    fb.fill_rect(-10, -10, 20, 20, Rgb::WHITE);
    fb.fill_rect(310, 160, 50, 50, Rgb::WHITE);

    let lit = fb.pixels().iter().filter(|&&p| p == 0xFFFF).count();
    assert_eq!(lit, 10 * 10 + 10 * 10);
    assert_eq!(fb.pixel(0, 0), Some(0xFFFF));
    assert_eq!(fb.pixel(319, 169), Some(0xFFFF));
}

#[test]
fn test_fill_rect_empty_or_negative_size_writes_nothing() {
    let mut fb = Framebuffer::new();
    fb.fill_rect(10, 10, 0, 10, Rgb::WHITE);
    fb.fill_rect(10, 10, 10, 0, Rgb::WHITE);
    fb.fill_rect(10, 10, -5, 10, Rgb::WHITE);
    fb.fill_rect(400, 10, 10, 10, Rgb::WHITE);
    assert!(fb.pixels().iter().all(|&p| p == 0));
}

#[test]
fn test_draw_rect_outline() {
    let mut fb = Framebuffer::new();
    fb.draw_rect(0, 0, WIDTH as i32, HEIGHT as i32, Rgb::WHITE);

    let lit = fb.pixels().iter().filter(|&&p| p == 0xFFFF).count();
    assert_eq!(lit, 2 * WIDTH + 2 * (HEIGHT - 2));
    assert_eq!(fb.pixel(1, 1), Some(0));
    assert_eq!(fb.pixel(319, 85), Some(0xFFFF));
}

#[test]
fn test_draw_rect_huge_sizes_are_clipped() {
    let mut fb = Framebuffer::new();
    fb.draw_rect(100, 100, i32::MAX, 10, Rgb::WHITE);
    assert!((100..WIDTH as i32).all(|x| fb.pixel(x, 100) == Some(0xFFFF)));
    assert!((100..110).all(|y| fb.pixel(100, y) == Some(0xFFFF)));
    assert_eq!(fb.pixel(200, 109), Some(0xFFFF));
    assert_eq!(fb.pixel(319, 105), Some(0));

    let mut fb = Framebuffer::new();
    fb.draw_rect(100, 100, 10, i32::MAX, Rgb::WHITE);
    assert!((100..HEIGHT as i32).all(|y| fb.pixel(100, y) == Some(0xFFFF)));
    assert!((100..HEIGHT as i32).all(|y| fb.pixel(109, y) == Some(0xFFFF)));
    assert!((100..110).all(|x| fb.pixel(x, 100) == Some(0xFFFF)));
    assert_eq!(fb.pixel(105, 169), Some(0));
}

#[test]
fn test_draw_rect_at_max_coordinates_is_ignored() {
    let mut fb = Framebuffer::new();
    fb.draw_rect(i32::MAX, i32::MAX, i32::MAX, i32::MAX, Rgb::WHITE);
    fb.draw_rect(i32::MIN, i32::MIN, i32::MAX, i32::MAX, Rgb::WHITE);
    assert!(fb.pixels().iter().all(|&p| p == 0));
}
