use crate::types::{BodyKind, BodySnapshot, ColorId, Particle, ParticleKind, TRAIL_LEN, Vec2};

/// Terminal cells are roughly twice as tall as wide; squash world y so
/// orbits render as circles instead of eggs.
const CELL_ASPECT: f32 = 0.5;
const RING_SAMPLES: usize = 96;
const PARTICLE_PRIORITY: f32 = 1.0e9;

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            zoom: 0.09,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Copy, Debug)]
pub struct RenderCell {
    pub ch: char,
    pub priority: f32,
    pub color: ColorId,
}

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(
                len,
                RenderCell {
                    ch: ' ',
                    priority: f32::NEG_INFINITY,
                    color: ColorId::White,
                },
            );
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.ch = ' ';
            cell.priority = f32::NEG_INFINITY;
            cell.color = ColorId::White;
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    fn set(&mut self, x: i32, y: i32, ch: char, priority: f32, color: ColorId) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if priority >= cell.priority {
            cell.priority = priority;
            cell.ch = ch;
            cell.color = color;
        }
    }
}

struct Projection {
    cam: Vec2,
    zoom: f32,
    half_w: f32,
    half_h: f32,
}

impl Projection {
    fn new(camera: &Camera, shake: Vec2, viewport: Viewport) -> Self {
        Self {
            cam: camera.pos + shake,
            zoom: camera.zoom,
            half_w: viewport.width as f32 / 2.0,
            half_h: viewport.height as f32 / 2.0,
        }
    }

    fn to_cell(&self, pos: Vec2) -> (i32, i32) {
        let sx = ((pos.x - self.cam.x) * self.zoom + self.half_w).round() as i32;
        let sy = ((pos.y - self.cam.y) * self.zoom * CELL_ASPECT + self.half_h).round() as i32;
        (sx, sy)
    }
}

pub fn draw(
    snapshot: &[BodySnapshot],
    particles: &[Particle],
    camera: &Camera,
    shake: Vec2,
    viewport: Viewport,
    frame: &mut FrameBuffer,
) {
    if frame.width() != viewport.width || frame.height() != viewport.height {
        frame.resize(viewport.width, viewport.height);
    } else {
        frame.clear();
    }
    let proj = Projection::new(camera, shake, viewport);

    for body in snapshot {
        if body.kind == BodyKind::Planet {
            draw_ring(body, &proj, frame);
        }
    }
    for body in snapshot {
        draw_trail(body, &proj, frame);
    }
    for body in snapshot {
        draw_body(body, &proj, frame);
    }
    for particle in particles {
        let (sx, sy) = proj.to_cell(particle.pos);
        let alpha = particle.alpha();
        frame.set(
            sx,
            sy,
            particle_glyph(particle),
            PARTICLE_PRIORITY * alpha,
            particle.color,
        );
    }
}

fn draw_ring(body: &BodySnapshot, proj: &Projection, frame: &mut FrameBuffer) {
    for i in 0..RING_SAMPLES {
        let angle = (i as f32 / RING_SAMPLES as f32) * std::f32::consts::TAU;
        let pos = body.center + Vec2::from_angle(angle) * body.orbit_radius;
        let (sx, sy) = proj.to_cell(pos);
        frame.set(sx, sy, '·', f32::MIN_POSITIVE, ColorId::Trail);
    }
}

fn draw_trail(body: &BodySnapshot, proj: &Projection, frame: &mut FrameBuffer) {
    if body.trail_len == 0 {
        return;
    }
    let max_len = body.trail_len.min(TRAIL_LEN);
    for i in 0..max_len {
        // Ring buffer, newest to oldest.
        let idx = (body.trail_head + TRAIL_LEN - i) % TRAIL_LEN;
        let (sx, sy) = proj.to_cell(body.trail[idx]);
        let age = i as f32 / max_len as f32;
        let ch = if age < 0.4 { '·' } else { '.' };
        frame.set(sx, sy, ch, body.mass * 0.2 * (1.0 - age), ColorId::Trail);
    }
}

fn draw_body(body: &BodySnapshot, proj: &Projection, frame: &mut FrameBuffer) {
    let color = body_color(body);

    // Bodies big enough on screen get their outline sampled in.
    let screen_radius = body.radius * proj.zoom;
    if screen_radius >= 1.5 {
        let samples = (RING_SAMPLES / 2).max(16);
        let glyph = if body.kind == BodyKind::Sun { '@' } else { 'o' };
        for i in 0..samples {
            let angle = (i as f32 / samples as f32) * std::f32::consts::TAU;
            let pos = body.pos + Vec2::from_angle(angle) * body.radius;
            let (sx, sy) = proj.to_cell(pos);
            frame.set(sx, sy, glyph, body.mass, color);
        }
    }

    let (sx, sy) = proj.to_cell(body.pos);
    for i in 0..body.label_len {
        frame.set(sx + i as i32, sy, body.label[i], body.mass, color);
    }

    // Hot bodies sparkle around the label.
    if body.glow > 0.3 {
        for (dx, dy) in [(-1, -1), (2, -1), (-1, 1), (body.label_len as i32, 1)] {
            frame.set(sx + dx, sy + dy, '+', body.mass, ColorId::Spark);
        }
    }
}

fn body_color(body: &BodySnapshot) -> ColorId {
    if body.glow > 0.55 {
        return ColorId::Red;
    }
    if body.glow > 0.2 {
        return ColorId::Yellow;
    }
    if body.free {
        return ColorId::Cyan;
    }
    match body.kind {
        BodyKind::Sun => ColorId::Yellow,
        BodyKind::Planet => ColorId::White,
        BodyKind::Moon => ColorId::Blue,
        BodyKind::Meteorite => ColorId::Magenta,
    }
}

fn particle_glyph(particle: &Particle) -> char {
    let alpha = particle.alpha();
    match particle.kind {
        ParticleKind::Spark => {
            if alpha > 0.6 {
                '*'
            } else if alpha > 0.3 {
                '+'
            } else {
                '·'
            }
        }
        ParticleKind::Smoke => {
            if alpha < 0.3 {
                '·'
            } else if particle.size > 2.5 {
                'O'
            } else {
                'o'
            }
        }
        ParticleKind::Debris => {
            if alpha > 0.5 {
                '#'
            } else {
                ','
            }
        }
    }
}
