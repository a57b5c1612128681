//! Application orchestration layer
//!
//! `Application` wires a log source and a renderer to a [`Session`]. All session state
//! changes happen on the loop in [`Application::drive`]; input, fetches, timers and the
//! clipboard only ever talk to it through the message channel.

pub mod runtime;

pub use runtime::{Copier, EffectRunner};

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::input::{spawn_input_thread, InputAction};
use crate::render::ui::UIRenderer;
use crate::session::{Session, SessionMessage};
use crate::source::LogSource;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Application orchestrator - owns the session and executes its effects
pub struct Application {
    session: Session,
    source: Arc<dyn LogSource>,
    ui_renderer: Box<dyn UIRenderer>,
    fetch_timeout: Duration,
}

impl Application {
    pub fn new(
        config: ViewerConfig,
        source: Arc<dyn LogSource>,
        ui_renderer: Box<dyn UIRenderer>,
    ) -> Self {
        let fetch_timeout = config.fetch_timeout();
        let session = Session::new(config, source.describe());
        Self {
            session,
            source,
            ui_renderer,
            fetch_timeout,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Take over the terminal, run until the user quits, then restore it.
    pub async fn run(&mut self) -> Result<()> {
        self.ui_renderer.initialize()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let input = spawn_input_thread(tx.clone(), Arc::clone(&shutdown), INPUT_POLL_INTERVAL);

        let runner = EffectRunner::new(tx, Arc::clone(&self.source), self.fetch_timeout);
        let outcome = self.drive(runner, rx).await;

        shutdown.store(true, Ordering::SeqCst);
        let cleanup = self.ui_renderer.cleanup();
        if tokio::task::spawn_blocking(move || input.join()).await.is_err() {
            log::warn!("Input thread did not shut down cleanly");
        }

        outcome?;
        cleanup
    }

    /// Process messages until the session quits.
    ///
    /// Messages that are already queued are handled as one batch and followed by a single
    /// render, so a burst of fetch results or scroll events costs one frame.
    pub async fn drive(
        &mut self,
        runner: EffectRunner,
        mut rx: UnboundedReceiver<SessionMessage>,
    ) -> Result<()> {
        let (width, height) = self.ui_renderer.get_terminal_size()?;
        self.session
            .handle(SessionMessage::Input(InputAction::Resize { width, height }));

        let mut running = runner.execute_all(self.session.start());
        self.render();

        while running {
            let Some(message) = rx.recv().await else {
                break;
            };
            running = self.dispatch(&runner, message);
            while running {
                match rx.try_recv() {
                    Ok(message) => running = self.dispatch(&runner, message),
                    Err(_) => break,
                }
            }
            self.render();
        }

        log::info!("Session finished");
        Ok(())
    }

    /// A fresh channel for driving the session without a terminal.
    pub fn channel() -> (
        UnboundedSender<SessionMessage>,
        UnboundedReceiver<SessionMessage>,
    ) {
        mpsc::unbounded_channel()
    }

    fn dispatch(&mut self, runner: &EffectRunner, message: SessionMessage) -> bool {
        let effects = self.session.handle(message);
        runner.execute_all(effects)
    }

    /// Draw the current frame. Failures skip the frame and never end the session.
    fn render(&mut self) {
        let view_state = self.session.view_state();
        let renderer = &mut self.ui_renderer;
        match panic::catch_unwind(AssertUnwindSafe(|| renderer.render(view_state))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::warn!("Render failed, frame skipped: {err}"),
            Err(_) => log::error!("Renderer panicked, frame skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ui::{MockUIRenderer, ViewState};
    use crate::source::{MemorySource, RawRecord};
    use chrono::Utc;
    use parking_lot::Mutex;

    /// Lets the test inspect frames after the application takes ownership of the renderer.
    struct SharedRenderer(Arc<Mutex<MockUIRenderer>>);

    impl UIRenderer for SharedRenderer {
        fn render(&mut self, view_state: &ViewState) -> Result<()> {
            self.0.lock().render(view_state)
        }

        fn initialize(&mut self) -> Result<()> {
            self.0.lock().initialize()
        }

        fn cleanup(&mut self) -> Result<()> {
            self.0.lock().cleanup()
        }

        fn get_terminal_size(&self) -> Result<(u16, u16)> {
            self.0.lock().get_terminal_size()
        }
    }

    struct PanickingRenderer;

    impl UIRenderer for PanickingRenderer {
        fn render(&mut self, _view_state: &ViewState) -> Result<()> {
            panic!("draw failed");
        }

        fn initialize(&mut self) -> Result<()> {
            Ok(())
        }

        fn cleanup(&mut self) -> Result<()> {
            Ok(())
        }

        fn get_terminal_size(&self) -> Result<(u16, u16)> {
            Ok((80, 24))
        }
    }

    fn source_with(lines: &[&str]) -> Arc<MemorySource> {
        let at = Utc::now() - chrono::Duration::minutes(10);
        Arc::new(MemorySource::with_records(
            "memory",
            lines.iter().map(|l| RawRecord::new(at, *l)).collect(),
        ))
    }

    fn quit_after(tx: UnboundedSender<SessionMessage>, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionMessage::Input(InputAction::Quit));
        });
    }

    #[tokio::test]
    async fn loads_records_and_renders_until_quit() {
        let mock = Arc::new(Mutex::new(MockUIRenderer::new()));
        mock.lock().set_terminal_size(100, 30);
        let source = source_with(&["alpha", "beta", "gamma"]);
        let mut app = Application::new(
            ViewerConfig::default(),
            source.clone(),
            Box::new(SharedRenderer(Arc::clone(&mock))),
        );

        let (tx, rx) = Application::channel();
        let runner = EffectRunner::new(tx.clone(), source, Duration::from_secs(1));
        quit_after(tx, Duration::from_millis(200));
        app.drive(runner, rx).await.unwrap();

        assert!(app.session().is_finished());
        assert_eq!(app.session().store().len(), 3);
        let mock = mock.lock();
        assert!(mock.render_count >= 2);
        let frame = mock.last_frame().unwrap();
        assert_eq!(frame.width, 100);
        assert_eq!(frame.rows.len(), 3);
        assert!(frame.title.starts_with("rltail: memory"));
    }

    #[tokio::test]
    async fn render_errors_do_not_end_the_session() {
        let mock = Arc::new(Mutex::new(MockUIRenderer::new()));
        mock.lock().fail_next_render = Some("terminal gone".into());
        let source = source_with(&["one"]);
        let mut app = Application::new(
            ViewerConfig::default(),
            source.clone(),
            Box::new(SharedRenderer(Arc::clone(&mock))),
        );

        let (tx, rx) = Application::channel();
        let runner = EffectRunner::new(tx.clone(), source, Duration::from_secs(1));
        quit_after(tx, Duration::from_millis(150));
        app.drive(runner, rx).await.unwrap();

        assert!(mock.lock().render_count >= 1);
    }

    #[tokio::test]
    async fn renderer_panics_are_contained() {
        let source = source_with(&["one"]);
        let mut app = Application::new(
            ViewerConfig::default(),
            source.clone(),
            Box::new(PanickingRenderer),
        );

        let (tx, rx) = Application::channel();
        let runner = EffectRunner::new(tx.clone(), source, Duration::from_secs(1));
        quit_after(tx, Duration::from_millis(100));
        app.drive(runner, rx).await.unwrap();
        assert!(app.session().is_finished());
    }

    #[tokio::test]
    async fn queued_messages_share_one_frame() {
        let mock = Arc::new(Mutex::new(MockUIRenderer::new()));
        let source = source_with(&["a", "b", "c", "d"]);
        let mut app = Application::new(
            ViewerConfig::default(),
            source.clone(),
            Box::new(SharedRenderer(Arc::clone(&mock))),
        );

        let (tx, rx) = Application::channel();
        for _ in 0..3 {
            tx.send(SessionMessage::Input(InputAction::PageUp)).unwrap();
        }
        tx.send(SessionMessage::Input(InputAction::Quit)).unwrap();
        let runner = EffectRunner::new(tx, source, Duration::from_secs(1));
        app.drive(runner, rx).await.unwrap();

        // Start frame plus one frame for the whole queued batch.
        assert_eq!(mock.lock().render_count, 2);
    }
}
