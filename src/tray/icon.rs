use crate::indicator::IndicatorState;
use anyhow::Result;
use tray_icon::Icon;

const ICON_SIZE: u32 = 64;
const BUBBLE_COLOR: [u8; 4] = [98, 100, 167, 255];
const DOT_COLOR: [u8; 4] = [230, 150, 0, 255];

pub fn icon_for(state: IndicatorState) -> Result<Icon> {
    Ok(Icon::from_rgba(rgba_for(state), ICON_SIZE, ICON_SIZE)?)
}

fn rgba_for(state: IndicatorState) -> Vec<u8> {
    let mut data = chat_bubble(ICON_SIZE);
    if state.is_alert() {
        add_notification_dot(&mut data, ICON_SIZE);
    }
    data
}

/// Rounded speech bubble with a tail at the bottom left.
fn chat_bubble(size: u32) -> Vec<u8> {
    let mut data = vec![0u8; (size * size * 4) as usize];
    let s = size as i32;
    let (left, right, top, bottom) = (4, s - 4, 10, s - 18);
    let radius = 10;

    for y in 0..s {
        for x in 0..s {
            if in_rounded_rect(x, y, (left, right, top, bottom), radius) || in_tail(x, y, left, bottom) {
                set_pixel(&mut data, size, x, y, BUBBLE_COLOR);
            }
        }
    }
    data
}

fn in_rounded_rect(x: i32, y: i32, (left, right, top, bottom): (i32, i32, i32, i32), radius: i32) -> bool {
    if x < left || x >= right || y < top || y >= bottom {
        return false;
    }
    let cx = x.clamp(left + radius, right - 1 - radius);
    let cy = y.clamp(top + radius, bottom - 1 - radius);
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy <= radius * radius
}

fn in_tail(x: i32, y: i32, left: i32, bottom: i32) -> bool {
    let depth = y - bottom;
    (0..12).contains(&depth) && x >= left + 10 && x < left + 22 - depth
}

fn add_notification_dot(data: &mut [u8], size: u32) {
    let dot_radius = 8i32;
    let dot_center_x = (size as i32) - dot_radius - 2;
    let dot_center_y = dot_radius + 2;

    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let dx = x - dot_center_x;
            let dy = y - dot_center_y;
            if dx * dx + dy * dy <= dot_radius * dot_radius {
                set_pixel(data, size, x, y, DOT_COLOR);
            }
        }
    }
}

fn set_pixel(data: &mut [u8], size: u32, x: i32, y: i32, color: [u8; 4]) {
    let idx = ((y as u32 * size + x as u32) * 4) as usize;
    data[idx..idx + 4].copy_from_slice(&color);
}
