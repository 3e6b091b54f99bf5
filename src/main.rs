use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use glam::Vec2;
use log::{error, info, warn};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{EventLoop, EventLoopWindowTarget},
    window::WindowBuilder,
};

use liquid_metal::engine::game_loop::GameLoop;
use liquid_metal::engine::input::{Action, InputManager};
use liquid_metal::engine::renderer::Renderer;
use liquid_metal::scene::{LiquidScene, SceneConfig};

/// Frames simulated by `--headless` when no count is given
const DEFAULT_HEADLESS_FRAMES: u64 = 300;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Liquid Metal...");

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--headless") => {
            let frames = match args.next() {
                Some(frames) => frames.parse()?,
                None => DEFAULT_HEADLESS_FRAMES,
            };
            run_headless(frames)
        }
        Some(other) => Err(anyhow::anyhow!(
            "Unknown argument `{}` (usage: liquid-metal [--headless [frames]])",
            other
        )),
        None => run_windowed(),
    }
}

/// Run the scene without a window, pouring a box every second
fn run_headless(frames: u64) -> Result<()> {
    let config = SceneConfig::default();
    let centre = Vec2::new(config.screen_px.width * 0.5, config.screen_px.height * 0.25);
    let mut scene = LiquidScene::new(config)?;
    let mut game_loop = GameLoop::new(scene.config().updates_per_second);
    let dt = game_loop.fixed_timestep();
    let pour_every = u64::from(scene.config().updates_per_second);

    info!("Running headless for {} frames", frames);
    for frame in 0..frames {
        if frame % pour_every == 0 {
            scene.touch(centre)?;
        }

        for _ in 0..game_loop.advance(Duration::from_secs_f32(dt)) {
            scene.step(dt)?;
        }

        if frame % pour_every == pour_every - 1 {
            info!("Frame {}: {} particles", frame + 1, scene.particle_count());
        }
    }

    scene.log_particle_info();
    info!(
        "Headless run finished after {} updates",
        game_loop.update_count()
    );
    Ok(())
}

fn run_windowed() -> Result<()> {
    let defaults = SceneConfig::default();

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Liquid Metal")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                defaults.screen_px.width as u32,
                defaults.screen_px.height as u32,
            ))
            .with_resizable(true)
            .build(&event_loop)?,
    );

    info!("Window created successfully");

    let size = window.inner_size();
    let config = defaults.with_screen(size.width as f32, size.height as f32);
    let mut renderer = pollster::block_on(Renderer::new(
        window.clone(),
        config.pixel_scale,
        config.particle_radius_px,
    ))?;
    let mut game_loop = GameLoop::new(config.updates_per_second);
    let mut scene = LiquidScene::new(config)?;
    let mut input = InputManager::new();

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested, shutting down...");
                    elwt.exit();
                }
                WindowEvent::Resized(physical_size) => {
                    renderer.resize(physical_size);
                    if let Err(e) =
                        scene.resize(physical_size.width as f32, physical_size.height as f32)
                    {
                        warn!("Failed to resize scene: {}", e);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.process_keyboard_event(&event);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input.process_mouse_button(button, state);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.process_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
                }
                WindowEvent::CursorLeft { .. } => {
                    input.process_cursor_left();
                }
                WindowEvent::RedrawRequested => {
                    frame(&mut scene, &mut input, &mut game_loop, &mut renderer, elwt);
                }
                _ => {}
            },
            Event::AboutToWait => {
                // Request redraw on next frame
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}

/// Apply input, run the fixed updates due and draw
fn frame(
    scene: &mut LiquidScene,
    input: &mut InputManager,
    game_loop: &mut GameLoop,
    renderer: &mut Renderer,
    elwt: &EventLoopWindowTarget<()>,
) {
    if input.just_pressed(Action::Quit) {
        elwt.exit();
        return;
    }
    if input.just_pressed(Action::TogglePause) {
        game_loop.toggle_pause();
    }
    if input.just_pressed(Action::ToggleDebug) {
        let enabled = renderer.physics_debug_renderer_mut().toggle();
        info!("Physics debug overlay {}", if enabled { "on" } else { "off" });
    }
    if input.just_pressed(Action::DumpParticles) {
        scene.log_particle_info();
    }

    for point in input.take_spawn_points() {
        if let Err(e) = scene.touch(point) {
            warn!("Failed to pour particles: {}", e);
        }
    }
    if let Err(e) = scene.tilt(input.tilt()) {
        warn!("Failed to tilt scene: {}", e);
    }
    input.update();

    let dt = game_loop.fixed_timestep();
    for _ in 0..game_loop.begin_frame() {
        if let Err(e) = scene.step(dt) {
            error!("Simulation step failed: {}", e);
            break;
        }
    }

    if let Err(e) = renderer.render(scene.positions(), scene.debug_data()) {
        match e.downcast_ref::<wgpu::SurfaceError>() {
            Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size());
            }
            _ => error!("Render error: {}", e),
        }
    }
}
