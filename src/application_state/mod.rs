//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Receiving input events from whatever owns the window or terminal
//! - Turning them into per-tick input snapshots
//! - Frame timing
//! - Driving the engine and the render backend once per frame
//!
//! Input arrives as [`InputEvent`] values over an `mpsc` channel, so the source can
//! live on any thread. The loop ends on `Quit`, on Escape, or when every sender is gone.

pub mod input_manager;
pub mod input_state;

use std::{
    sync::mpsc::{Receiver, TryRecvError},
    thread,
};

use input_manager::InputManager;
use input_state::{InputEvent, Key};
use log::info;
use web_time::{Duration, Instant};

use crate::engine_state::{rendering::RenderBackend, EngineState};

/// The main application state container that manages the application's lifecycle.
pub struct ApplicationState {
    /// The core engine state and logic
    pub engine_state: EngineState,

    /// Manages input state and event processing
    pub input_manager: InputManager,

    /// Incoming input events
    events: Receiver<InputEvent>,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: Instant,

    running: bool,
}

impl ApplicationState {
    pub fn new(engine_state: EngineState, events: Receiver<InputEvent>) -> Self {
        Self {
            engine_state,
            input_manager: InputManager::new(),
            events,
            last_wait_time: Instant::now(),
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feeds every pending event to the input manager.
    ///
    /// Resizes go straight to the engine; quit requests stop the loop.
    pub fn pump_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.running {
                        info!("input source closed");
                    }
                    self.running = false;
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        self.input_manager.intake_input(&event);

        match event {
            InputEvent::Resized { width, height } => {
                self.engine_state.resize(width, height);
            }
            InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => {
                self.running = false;
            }
            _ => (),
        }
    }

    /// Runs one frame: input, camera and terrain updates, task results, drawing.
    ///
    /// # Arguments
    /// * `backend` - Where the frame is drawn
    pub fn tick(&mut self, backend: &mut dyn RenderBackend) {
        self.pump_events();

        let now = Instant::now();
        let wait_dt = now - self.last_wait_time;
        self.last_wait_time = now;

        let processed_input = self.input_manager.get_and_reset_processed_input();
        self.engine_state.set_input_commands(processed_input);
        self.engine_state.process_input(wait_dt);

        self.engine_state.process_tasks();
        self.engine_state.render(backend);
    }

    /// Ticks until the application stops, sleeping off whatever is left of each frame.
    ///
    /// # Arguments
    /// * `backend` - Where frames are drawn
    /// * `frame_time` - Target duration of one frame
    pub fn run(&mut self, backend: &mut dyn RenderBackend, frame_time: Duration) {
        while self.running {
            let frame_start = Instant::now();
            self.tick(backend);

            let elapsed = frame_start.elapsed();
            if elapsed < frame_time {
                thread::sleep(frame_time - elapsed);
            }
        }
        self.engine_state.terrain.log_status();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::engine_state::{
        config::WorldConfig, rendering::HeadlessBackend, voxels::persistence::MemoryChunkStore,
    };

    fn application() -> (ApplicationState, mpsc::Sender<InputEvent>) {
        let config = WorldConfig {
            chunk_size: 4,
            render_distance: 1,
            worker_count: 1,
            ..WorldConfig::default()
        };
        let engine_state = EngineState::new(config, Box::new(MemoryChunkStore::new()), 640, 480);
        let (sender, receiver) = mpsc::channel();
        (ApplicationState::new(engine_state, receiver), sender)
    }

    #[test]
    fn quit_event_stops_the_loop() {
        let (mut application, sender) = application();
        sender.send(InputEvent::KeyDown(Key::W)).unwrap();
        sender.send(InputEvent::Quit).unwrap();

        let mut backend = HeadlessBackend::new();
        application.run(&mut backend, Duration::from_millis(1));

        assert!(!application.is_running());
        assert_eq!(backend.stats().frames, 1);
        assert!(application.engine_state.player_actions.move_forward);
    }

    #[test]
    fn dropped_sender_stops_the_loop() {
        let (mut application, sender) = application();
        drop(sender);
        application.pump_events();
        assert!(!application.is_running());
    }

    #[test]
    fn resize_reaches_the_projection() {
        let (mut application, sender) = application();
        sender.send(InputEvent::Resized { width: 1000, height: 500 }).unwrap();
        application.pump_events();

        let aspect = application.engine_state.camera_state.projection.aspect();
        assert!((aspect - 2.0).abs() < 1e-6);
        assert!(application.is_running());
    }
}
