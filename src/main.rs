// engine main.rs

mod backend;
mod common;
mod config;
mod controller;
mod error;
mod gen;
mod lighting;
mod maze;
mod renderer;
mod scene;
mod system_diagnostics;
mod terrain;

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use env_logger::Env;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowBuilder};
use crate::config::{AppConfig, GraphicsConfig, DEFAULT_CONFIG_PATH};
use crate::controller::{command_for, Command, Controller};
use crate::lighting::LightingEnvironment;
use crate::renderer::Renderer;
use crate::scene::{CubeSphereScene, MazeScene, SceneContext, SceneManager, TerrainScene};
use crate::system_diagnostics::SystemDiagnostics;

const HELP: &str = "1-3 scene | WASD move | +/- adjust | F1-F5 graphics | Tab cursor | Esc quit";

fn set_cursor_lock(window: &Window, locked: bool) {
    if locked {
        // some platforms only support one of the two grab modes
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            log::warn!("Cursor grab failed: {e}");
        }
    } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("Cursor release failed: {e}");
    }
    window.set_cursor_visible(!locked);
}

fn hud_lines(scenes: &SceneManager, graphics: &GraphicsConfig, lighting: &LightingEnvironment, meshes: usize) -> Vec<String> {
    let scene = match (scenes.active_index(), scenes.status()) {
        (Some(i), Some(status)) => format!("[{}/{}] {status}", i + 1, scenes.len()),
        _ => "No scene".to_string(),
    };
    let on = |b: bool| if b { "on" } else { "off" };
    vec![
        scene,
        format!(
            "AA {} | wire {:.1} | HQ {} | shading {} | spec {:.1} | {} lights | {} meshes",
            on(graphics.antialiasing),
            graphics.wireframe_thickness,
            on(graphics.high_quality),
            if graphics.advanced_shading { "advanced" } else { "simple" },
            graphics.specular_strength,
            lighting.lights().len(),
            meshes,
        ),
        HELP.to_string(),
    ]
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    SystemDiagnostics::log_startup_info();

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut app = AppConfig::load_or_default(&config_path);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(app.window_title.as_str())
        .with_inner_size(LogicalSize::new(app.width, app.height))
        .build(&event_loop)?;

    let mut renderer = pollster::block_on(Renderer::new(&window, &app.graphics))?;
    let mut controller = Controller::new();
    let mut lighting = LightingEnvironment::with_default_rig();

    let mut scenes = SceneManager::new();
    scenes.add_scene(Box::new(MazeScene::new(app.maze_path.clone())));
    scenes.add_scene(Box::new(TerrainScene::new(app.heightmap_path.clone(), app.terrain_seed).with_field_size(app.terrain_size)));
    scenes.add_scene(Box::new(CubeSphereScene::new().with_max_subdivisions(app.sphere_max_subdivisions)));

    scenes.switch(app.start_scene, &mut SceneContext { lighting: &lighting, config: &app.graphics, backend: &mut renderer });
    if scenes.active_index().is_none() {
        scenes.switch(0, &mut SceneContext { lighting: &lighting, config: &app.graphics, backend: &mut renderer });
    }
    set_cursor_lock(&window, controller.cursor_locked);

    let mut last_time = Instant::now();

    event_loop.run(move |event, target| {
        match event {
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                controller.process_mouse_motion(delta);
            }

            Event::WindowEvent { event, window_id } if window_id == renderer.window.id() => match event {
                WindowEvent::CloseRequested => {
                    scenes.cleanup_all(&mut renderer);
                    target.exit();
                }
                WindowEvent::Resized(size) => renderer.resize(size.width, size.height),

                WindowEvent::KeyboardInput { event: key_event, .. } => {
                    let PhysicalKey::Code(code) = key_event.physical_key else { return };
                    let pressed = key_event.state == ElementState::Pressed;
                    if controller.set_key(code, pressed) || !pressed || key_event.repeat {
                        return;
                    }

                    let Some(command) = command_for(code) else { return };
                    match command {
                        Command::SelectScene(i) => {
                            scenes.switch(i, &mut SceneContext { lighting: &lighting, config: &app.graphics, backend: &mut renderer });
                        }
                        Command::Adjust(steps) => scenes.adjust(steps),
                        Command::ToggleAntialiasing => app.graphics.toggle_antialiasing(),
                        Command::CycleWireframe => app.graphics.cycle_wireframe_thickness(),
                        Command::ToggleHighQuality => app.graphics.toggle_high_quality(),
                        Command::ToggleShading => {
                            app.graphics.toggle_advanced_shading();
                            scenes.invalidate_lighting();
                        }
                        Command::CycleSpecular => {
                            app.graphics.cycle_specular_strength();
                            scenes.invalidate_lighting();
                        }
                        Command::ToggleCursorLock => {
                            controller.cursor_locked = !controller.cursor_locked;
                            set_cursor_lock(renderer.window, controller.cursor_locked);
                        }
                        Command::Quit => {
                            scenes.cleanup_all(&mut renderer);
                            target.exit();
                        }
                    }
                }

                WindowEvent::RedrawRequested => {
                    let camera = controller.camera();
                    scenes.render(&camera, &app.graphics, &mut renderer);
                    let hud = hud_lines(&scenes, &app.graphics, &lighting, renderer.mesh_count());
                    renderer.render(&camera, &hud);
                }
                _ => {}
            },

            Event::AboutToWait => {
                let now = Instant::now();
                let dt = (now - last_time).as_secs_f32();
                last_time = now;

                controller.update(dt);
                lighting.animate(dt);
                let camera = controller.camera();
                scenes.update(dt, &camera, &mut SceneContext { lighting: &lighting, config: &app.graphics, backend: &mut renderer });
                renderer.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
