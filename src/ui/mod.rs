use std::{error::Error, io, time::Duration};

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    config,
    config::Tuning,
    core::World,
    render,
    types::{BodySnapshot, ColorId, Particle},
};

const PARTICLE_TIERS: [usize; 3] = [80, 250, 600];

pub fn run() -> Result<(), Box<dyn Error>> {
    let tuning = Tuning::load_or_default("marketcosmo.toml");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut world = World::new(tuning);
    let mut snapshot: Vec<BodySnapshot> = Vec::new();
    let mut particles: Vec<Particle> = Vec::new();
    let mut ui_state = UiState::new();

    let mut accumulator = 0.0_f32;
    let mut last_tick = std::time::Instant::now();
    let mut last_render = std::time::Instant::now();
    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    let mut sim_counter = 0_u32;
    let mut render_counter = 0_u32;
    let mut collisions_at_sample = 0_u64;
    let mut last_sample = std::time::Instant::now();
    let mut sim_fps = 0.0_f32;
    let mut render_fps = 0.0_f32;
    let mut collisions_per_sec = 0.0_f32;

    loop {
        let now = std::time::Instant::now();
        accumulator += (now - last_tick).as_secs_f32();
        last_tick = now;

        let mut frames = 0;
        while accumulator >= config::FRAME_SECS {
            accumulator -= config::FRAME_SECS;
            if ui_state.paused {
                continue;
            }
            // dt is pre-normalized: one 60 Hz frame.
            world.tick(1.0);
            sim_counter += 1;
            frames += 1;
            if frames >= config::MAX_CATCHUP_FRAMES {
                accumulator = 0.0;
                break;
            }
        }

        while event::poll(Duration::from_millis(0))? {
            if let CrosstermEvent::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        shutdown_terminal(&mut terminal)?;
                        return Ok(());
                    }
                    KeyCode::Char('p') => ui_state.paused = !ui_state.paused,
                    KeyCode::Char('m') => world.spawn_meteorite(),
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        ui_state.camera.zoom = (ui_state.camera.zoom * 1.2).min(2.0);
                    }
                    KeyCode::Char('-') => {
                        ui_state.camera.zoom = (ui_state.camera.zoom / 1.2).max(0.02);
                    }
                    KeyCode::Char(ch @ '1'..='3') => {
                        let tier = ch as usize - '1' as usize;
                        world.set_particle_budget(PARTICLE_TIERS[tier]);
                    }
                    KeyCode::Up => ui_state.pan(0.0, -1.0),
                    KeyCode::Down => ui_state.pan(0.0, 1.0),
                    KeyCode::Left => ui_state.pan(-1.0, 0.0),
                    KeyCode::Right => ui_state.pan(1.0, 0.0),
                    _ => {}
                }
            }
        }

        if last_render.elapsed() >= render_interval {
            world.snapshot(&mut snapshot);
            world.particles_snapshot(&mut particles);
            let shake = world.shake_offset();
            let stats = world.stats();
            if last_sample.elapsed() >= Duration::from_secs(1) {
                let secs = last_sample.elapsed().as_secs_f32();
                sim_fps = sim_counter as f32 / secs;
                render_fps = render_counter as f32 / secs;
                collisions_per_sec =
                    (stats.collisions_total - collisions_at_sample) as f32 / secs;
                collisions_at_sample = stats.collisions_total;
                sim_counter = 0;
                render_counter = 0;
                last_sample = std::time::Instant::now();
            }
            terminal.draw(|frame| {
                let size = frame.size();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(size);

                let header = Paragraph::new(format!(
                    "chains: {} | tokens: {} | meteors: {} | free: {} | particles: {}/{} | col/s: {:.1} | sim fps: {:.1} | render fps: {:.1}{}",
                    stats.planet_count,
                    stats.moon_count,
                    stats.meteorite_count,
                    stats.free_bodies,
                    stats.particle_count,
                    stats.particle_budget,
                    collisions_per_sec,
                    sim_fps,
                    render_fps,
                    if ui_state.paused { " | PAUSED" } else { "" },
                ))
                .block(Block::default().borders(Borders::ALL).title("marketcosmo"));
                frame.render_widget(header, chunks[0]);

                ui_state.ensure_viewport(chunks[1].width, chunks[1].height);
                render::draw(
                    &snapshot,
                    &particles,
                    &ui_state.camera,
                    shake,
                    render::Viewport {
                        width: chunks[1].width,
                        height: chunks[1].height,
                    },
                    &mut ui_state.framebuf,
                );

                let framebuf = &ui_state.framebuf;
                let width = framebuf.width();
                let height = framebuf.height();
                {
                    let lines_store = &mut ui_state.lines;
                    for y in 0..height {
                        let line = &mut lines_store[y as usize];
                        line.clear();
                        line.reserve(width as usize);
                        for x in 0..width {
                            line.push(framebuf.get(x, y).ch);
                        }
                    }
                }
                let lines: Vec<Line> = ui_state
                    .lines
                    .iter()
                    .enumerate()
                    .map(|(y, line)| {
                        let mut spans: Vec<Span> = Vec::with_capacity(line.len());
                        for (x, ch) in line.chars().enumerate() {
                            let cell = framebuf.get(x as u16, y as u16);
                            let color = color_for(cell.color);
                            spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));
                        }
                        Line::from(spans)
                    })
                    .collect();

                let viewport = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title("Orbits"));
                frame.render_widget(viewport, chunks[1]);

                let footer = Paragraph::new(
                    "←↑↓→: pan | +/-: zoom | m: meteorite | 1-3: particle quality | p: pause | q: quit",
                )
                .block(Block::default().borders(Borders::ALL).title("Controls"));
                frame.render_widget(footer, chunks[2]);
            })?;

            last_render = std::time::Instant::now();
            render_counter += 1;
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

struct UiState {
    camera: render::Camera,
    framebuf: render::FrameBuffer,
    lines: Vec<String>,
    paused: bool,
}

impl UiState {
    fn new() -> Self {
        Self {
            camera: render::Camera::default(),
            framebuf: render::FrameBuffer::new(0, 0),
            lines: Vec::new(),
            paused: false,
        }
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        // Pan in world units, scaled so a key press moves a constant number
        // of screen cells at any zoom.
        let step = 8.0 / self.camera.zoom;
        self.camera.pos.x = (self.camera.pos.x + dx * step)
            .clamp(-config::WORLD_HALF_WIDTH, config::WORLD_HALF_WIDTH);
        self.camera.pos.y = (self.camera.pos.y + dy * step)
            .clamp(-config::WORLD_HALF_HEIGHT, config::WORLD_HALF_HEIGHT);
    }

    fn ensure_viewport(&mut self, width: u16, height: u16) {
        if self.framebuf.width() != width || self.framebuf.height() != height {
            self.framebuf.resize(width, height);
        }
        let desired = height as usize;
        if self.lines.len() != desired {
            self.lines.clear();
            self.lines.resize_with(desired, String::new);
        }
    }
}

fn color_for(color: ColorId) -> Color {
    match color {
        ColorId::White => Color::White,
        ColorId::Cyan => Color::Cyan,
        ColorId::Blue => Color::Blue,
        ColorId::Yellow => Color::Yellow,
        ColorId::Magenta => Color::Magenta,
        ColorId::Red => Color::Red,
        ColorId::Gray => Color::Gray,
        ColorId::Trail => Color::DarkGray,
        ColorId::Spark => Color::LightYellow,
        ColorId::Ember => Color::LightRed,
        ColorId::Smoke => Color::DarkGray,
    }
}
