//! Engine host backed by the console

use std::sync::Arc;

use crate::engine::{EngineEvent, EngineHost, InputRequest, InputValue};
use crate::error::Result;
use crate::session::SessionState;
use crate::shutdown::ShutdownHandler;
use crate::terminal::{InputMediator, Renderer};

/// Routes evaluator notifications to the renderer and input requests to the
/// mediator, on whichever thread raised them.
pub struct ConsoleHost {
    session: Arc<SessionState>,
    renderer: Arc<Renderer>,
    input: InputMediator,
    shutdown: Arc<ShutdownHandler>,
}

impl ConsoleHost {
    pub fn new(
        session: Arc<SessionState>,
        renderer: Arc<Renderer>,
        shutdown: Arc<ShutdownHandler>,
    ) -> Self {
        Self {
            input: InputMediator::new(Arc::clone(&renderer)),
            session,
            renderer,
            shutdown,
        }
    }

    pub fn input(&self) -> &InputMediator {
        &self.input
    }
}

impl std::fmt::Debug for ConsoleHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleHost")
            .field("session", &self.session)
            .field("input", &self.input)
            .finish()
    }
}

impl EngineHost for ConsoleHost {
    fn notify(&self, event: EngineEvent) {
        let rendered = match event {
            EngineEvent::Output(text) => self.renderer.on_output_arrived(&text, &self.session),
            EngineEvent::ClearConsole => self.renderer.on_clear_requested(),
            EngineEvent::ExitRequested => {
                info!("Evaluated code requested exit");
                self.shutdown.terminate(0);
                Ok(())
            }
        };
        if let Err(e) = rendered {
            warn!("Failed to render engine event: {}", e);
        }
    }

    fn request_input(&self, request: InputRequest) -> Result<InputValue> {
        self.input.request(request, &self.session)
    }
}
