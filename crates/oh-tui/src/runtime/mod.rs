//! TUI runtime - owns terminal and session, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! Transport messages arrive on an unbounded channel that the runtime drains
//! every loop. Each message goes through the session controller first; the
//! resulting `SessionUpdate`s are fed to the reducer as `UiEvent::Session`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use oh_core::config::Config;
use oh_core::endpoint::Endpoint;
use oh_core::session::{ConnectionStatus, SessionController};
use oh_core::transport::{ReconnectPolicy, SocketIoConnector, TransportMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::statusline::SessionView;
use crate::terminal::{self, Tui};
use crate::transcript::HistoryCell;
use crate::{render, update};

/// Target frame rate while something is moving (60fps = ~16ms per frame).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop or panic; dropping the session closes
/// the event stream.
pub struct TuiRuntime {
    terminal: Tui,
    pub state: AppState,
    session: SessionController<SocketIoConnector>,
    transport_rx: mpsc::UnboundedReceiver<TransportMessage>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Creates the runtime and opens the event stream for `conversation_id`.
    ///
    /// Must be called inside a tokio runtime; the transport runs as a task.
    pub fn new(config: &Config, endpoint: Endpoint, conversation_id: &str) -> Result<Self> {
        let policy = ReconnectPolicy::from_config(&config.backend);
        let (tx, transport_rx) = mpsc::unbounded_channel();
        let mut session = SessionController::new(SocketIoConnector::new(endpoint, policy), tx);
        session
            .connect(conversation_id)
            .context("Failed to open the event stream")?;

        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let now = Instant::now();
        Ok(Self {
            terminal,
            state: AppState::new(config),
            session,
            transport_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        info!("tui started");

        let result = self.event_loop();

        let _ = terminal::disable_input_features();
        info!("tui stopped");
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        while !self.state.tui.should_quit {
            let mut events = self.collect_events()?;

            // Layout updates happen before anything else in the batch.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );
            events.push(UiEvent::SessionSnapshot(self.session_view()));

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            self.terminal.draw(|frame| {
                render::render(&self.state, frame);
            })?;
        }

        Ok(())
    }

    fn session_view(&self) -> SessionView {
        SessionView {
            conversation_id: self.session.conversation_id().map(str::to_string),
            status: self.session.status(),
            loading: self.session.status() == ConnectionStatus::Connected
                && self
                    .session
                    .is_loading_messages(tokio::time::Instant::now()),
            pending: self.session.pending().len(),
            last_event_id: self.session.last_event_id(),
        }
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects transport output and terminal input, then a Tick when due.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tui = &self.state.tui;
        let needs_fast_poll = tui.split.is_animating()
            || tui.split.is_dragging()
            || tui.resize.is_pending()
            || tui.session.loading
            || tui.session.status == ConnectionStatus::Disconnected
            || self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_session_events(&mut events);

        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    /// Feeds every queued transport message through the session controller.
    fn collect_session_events(&mut self, events: &mut Vec<UiEvent>) {
        while let Ok(message) = self.transport_rx.try_recv() {
            let updates = self.session.handle(message, tokio::time::Instant::now());
            events.extend(updates.into_iter().map(UiEvent::Session));
        }
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.tui.should_quit = true;
            }
            UiEffect::SendAction(action) => {
                debug!(%action, "sending action");
                self.session.send(action);
            }
            UiEffect::SwitchConversation(id) => self.switch_conversation(&id),
        }
    }

    fn switch_conversation(&mut self, id: &str) {
        let id = id.trim();
        let same_conversation = self.session.conversation_id() == Some(id);
        if same_conversation && self.session.is_open() {
            self.push_system(format!("Already on conversation {id}"));
            return;
        }
        match self.session.connect(id) {
            Ok(()) if same_conversation => {
                self.push_system(format!("Reconnecting to conversation {id}"));
            }
            Ok(()) => {
                // Messages from the old connection are stale now.
                while self.transport_rx.try_recv().is_ok() {}
                self.state.tui.reset_conversation();
                self.push_system(format!("Switched to conversation {id}"));
            }
            Err(err) => {
                warn!(error = %err, "conversation switch rejected");
                self.push_system(format!("Cannot switch conversation: {err}"));
            }
        }
    }

    fn push_system(&mut self, message: String) {
        self.state
            .tui
            .transcript
            .push_cell(HistoryCell::system(message));
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.session.close();
        let _ = terminal::restore_terminal();
    }
}
