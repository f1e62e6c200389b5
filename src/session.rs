//! The single-threaded command loop of a canvas page.
//!
//! Pointer, keyboard, timer, and network-completion events are queued as
//! [`Command`]s and handled strictly in arrival order. Network requests and
//! timers are not performed here; they are emitted as [`Effect`]s for the host
//! to carry out, and their completions come back as commands tagged with the
//! generation of the request that produced them. A pipeline fetch older than
//! the latest fetch is dropped. Status polls overlap on a slow backend, so a
//! status is applied whenever it is newer than the last one applied.

use crate::api::{PipelineSubmission, RunStatus};
use crate::canvas::render::Surface;
use crate::canvas::{CanvasState, Key, Modifiers, Propagation};
use crate::error::{ApiError, ValidationIssue};
use crate::geometry::Point;
use crate::menu::{ContextMenu, MenuContext};
use crate::serializer::{self, PipelineDocument};
use log::{debug, info, warn};
use std::collections::VecDeque;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PointerDown { at: Point, modifiers: Modifiers },
    PointerMove { at: Point },
    PointerUp { at: Point },
    /// Secondary click, asking for the context menu.
    ContextMenu { at: Point },
    Key(Key),
    Resize { width: f64, height: f64 },
    LoadPipeline { pipeline_id: u64 },
    PipelineFetched {
        generation: u64,
        result: Result<PipelineDocument, ApiError>,
    },
    Submit {
        family_pk: Option<u64>,
        revision_name: String,
        revision_desc: String,
    },
    SubmitCompleted { result: Result<(), ApiError> },
    WatchRun { run_id: u64 },
    PollTimerFired,
    RunStatusPolled {
        generation: u64,
        result: Result<RunStatus, ApiError>,
    },
}

/// Work the host must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchPipeline { generation: u64, pipeline_id: u64 },
    SubmitPipeline(PipelineSubmission),
    PollRunStatus { generation: u64, run_id: u64 },
    StartPollTimer { interval_ms: u64 },
    StopPollTimer,
}

pub struct Session {
    canvas: CanvasState,
    menu: ContextMenu,
    queue: VecDeque<Command>,
    effects: Vec<Effect>,
    fetch_generation: u64,
    poll_generation: u64,
    /// Generation of the last status response that was applied.
    applied_poll: u64,
    poll_interval_ms: u64,
    watched_run: Option<u64>,
    run_status: Option<RunStatus>,
    polling: bool,
    submitting: bool,
    issues: Vec<ValidationIssue>,
    page_errors: Vec<String>,
}

impl Session {
    pub fn new(canvas: CanvasState, menu: ContextMenu) -> Self {
        Self {
            canvas,
            menu,
            queue: VecDeque::new(),
            effects: Vec::new(),
            fetch_generation: 0,
            poll_generation: 0,
            applied_poll: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            watched_run: None,
            run_status: None,
            polling: false,
            submitting: false,
            issues: Vec::new(),
            page_errors: Vec::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasState {
        &mut self.canvas
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut ContextMenu {
        &mut self.menu
    }

    /// Validation problems found by the last submit attempt.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Network and serialization errors for the page-level error region.
    pub fn page_errors(&self) -> &[String] {
        &self.page_errors
    }

    pub fn clear_page_errors(&mut self) {
        self.page_errors.clear();
    }

    pub fn run_status(&self) -> Option<RunStatus> {
        self.run_status
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Drains the queue in arrival order and hands back the effects produced.
    pub fn run_until_idle(&mut self) -> Vec<Effect> {
        while let Some(command) = self.queue.pop_front() {
            self.dispatch(command);
        }
        std::mem::take(&mut self.effects)
    }

    /// Repaints the canvas if needed.
    pub fn frame(&mut self, surface: &mut dyn Surface) -> bool {
        self.canvas.draw(surface)
    }

    /// Handles one command immediately. The result says whether the
    /// originating event may reach page-level handlers.
    pub fn dispatch(&mut self, command: Command) -> Propagation {
        match command {
            Command::PointerDown { at, modifiers } => {
                if self.menu.is_open() {
                    self.abandon_gesture();
                    return self.menu.click_outside();
                }
                self.canvas.pointer_down(at, modifiers);
                Propagation::Stop
            }
            Command::PointerMove { at } => {
                self.canvas.pointer_move(at);
                Propagation::Stop
            }
            Command::PointerUp { at } => {
                let outcome = self.canvas.pointer_up(at);
                debug!("Gesture finished: {:?}", outcome);
                Propagation::Stop
            }
            Command::ContextMenu { at } => {
                self.abandon_gesture();
                self.menu.close();
                let p = self.canvas.to_canvas(at);
                let context = MenuContext {
                    target: self.canvas.shape_at(p),
                    at: p,
                };
                if self.menu.open(&self.canvas, context) {
                    Propagation::Stop
                } else {
                    Propagation::Continue
                }
            }
            Command::Key(key) => {
                if self.menu.is_open() {
                    self.abandon_gesture();
                    self.menu.key_down(key, &mut self.canvas)
                } else {
                    self.canvas.key_down(key)
                }
            }
            Command::Resize { width, height } => {
                if let Err(e) = self.canvas.resize(width, height) {
                    self.report(e.to_string());
                }
                Propagation::Continue
            }
            Command::LoadPipeline { pipeline_id } => {
                self.fetch_generation += 1;
                self.canvas.set_updating(true);
                self.effects.push(Effect::FetchPipeline {
                    generation: self.fetch_generation,
                    pipeline_id,
                });
                Propagation::Continue
            }
            Command::PipelineFetched { generation, result } => {
                self.on_pipeline_fetched(generation, result);
                Propagation::Continue
            }
            Command::Submit {
                family_pk,
                revision_name,
                revision_desc,
            } => {
                self.submit(family_pk, revision_name, revision_desc);
                Propagation::Continue
            }
            Command::SubmitCompleted { result } => {
                self.submitting = false;
                match result {
                    Ok(()) => info!("Pipeline revision submitted"),
                    Err(e) => self.report(e.message),
                }
                Propagation::Continue
            }
            Command::WatchRun { run_id } => {
                self.watched_run = Some(run_id);
                self.run_status = None;
                // Whatever is still in flight belongs to the previous run.
                self.applied_poll = self.poll_generation;
                self.polling = true;
                self.effects.push(Effect::StartPollTimer {
                    interval_ms: self.poll_interval_ms,
                });
                self.request_poll(run_id);
                Propagation::Continue
            }
            Command::PollTimerFired => {
                match (self.polling, self.watched_run) {
                    (true, Some(run_id)) => self.request_poll(run_id),
                    _ => debug!("Poll timer fired with nothing to poll"),
                }
                Propagation::Continue
            }
            Command::RunStatusPolled { generation, result } => {
                self.on_status_polled(generation, result);
                Propagation::Continue
            }
        }
    }

    /// A gesture never outlives the menu taking over the pointer.
    fn abandon_gesture(&mut self) {
        if !self.canvas.mode().is_idle() {
            debug!("Menu took the pointer; cancelling {:?}", self.canvas.mode());
            self.canvas.cancel_gesture();
        }
    }

    fn report(&mut self, message: String) {
        warn!("{}", message);
        self.page_errors.push(message);
    }

    fn on_pipeline_fetched(&mut self, generation: u64, result: Result<PipelineDocument, ApiError>) {
        if generation != self.fetch_generation {
            warn!(
                "Dropping stale pipeline response (generation {}, latest {})",
                generation, self.fetch_generation
            );
            return;
        }
        match result {
            Ok(document) => {
                if let Err(e) = serializer::load_document(&mut self.canvas, &document) {
                    self.report(e.to_string());
                }
            }
            Err(e) => self.report(e.message),
        }
        self.canvas.set_updating(false);
    }

    fn submit(&mut self, family_pk: Option<u64>, revision_name: String, revision_desc: String) {
        if self.submitting {
            info!("Submission already in flight; ignoring '{}'", revision_name);
            return;
        }
        self.issues = self.canvas.validate();
        if !self.issues.is_empty() {
            info!("Submission blocked by {} issue(s)", self.issues.len());
            return;
        }
        match serializer::to_document(&self.canvas) {
            Ok(document) => {
                self.submitting = true;
                self.effects
                    .push(Effect::SubmitPipeline(PipelineSubmission {
                        family_pk,
                        revision_name,
                        revision_desc,
                        document,
                    }));
            }
            Err(e) => self.report(e.to_string()),
        }
    }

    fn request_poll(&mut self, run_id: u64) {
        self.poll_generation += 1;
        self.effects.push(Effect::PollRunStatus {
            generation: self.poll_generation,
            run_id,
        });
    }

    fn on_status_polled(&mut self, generation: u64, result: Result<RunStatus, ApiError>) {
        if generation <= self.applied_poll || generation > self.poll_generation {
            debug!(
                "Dropping stale status response (generation {}, applied {}, latest {})",
                generation, self.applied_poll, self.poll_generation
            );
            return;
        }
        if !self.polling {
            return;
        }
        self.applied_poll = generation;
        match result {
            Ok(status) => {
                self.run_status = Some(status);
                if status.is_terminal() {
                    info!("Run reached {:?}; polling stopped", status);
                    self.stop_polling();
                }
            }
            Err(e) => {
                self.report(e.message);
                self.stop_polling();
            }
        }
    }

    fn stop_polling(&mut self) {
        self.polling = false;
        self.effects.push(Effect::StopPollTimer);
    }
}
