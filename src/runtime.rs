//! Event loop around the controller
//!
//! The driver owns the controller and feeds it one stimulus at a time from
//! a single queue. Alarms the controller schedules become sleeping tasks
//! that post back to the queue; requests it issues become tasks that call
//! the quiz service and post the response back. Nothing but the driver
//! ever touches the controller, so no two stimuli are processed at once.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    client::QuizService,
    controller::{Controller, Request, Response},
    tunnel::{Answered, Tunnel},
};

/// Something the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Start a quiz with this many questions
    Start(u32),
    /// Choose the option at this index
    Select(usize),
    /// Submit the current selection
    Submit,
    /// End the quiz early, with the user's answer to the confirmation
    End(Answered),
    /// Abandon everything and return to idle
    Restart,
    /// Try loading the results again
    ReloadResults,
    /// Stop the driver
    Quit,
}

/// Anything the controller reacts to
#[derive(Debug, derive_more::From)]
pub enum Stimulus {
    /// User input
    Intent(Intent),
    /// A scheduled alarm came due
    Alarm(crate::AlarmMessage),
    /// A service call finished
    Response(Response),
}

/// Cloneable sender of intents into a running driver
#[derive(Debug, Clone)]
pub struct Handle {
    sender: mpsc::UnboundedSender<Stimulus>,
}

impl Handle {
    /// Queues an intent
    ///
    /// Returns `false` if the driver has stopped.
    pub fn send(&self, intent: Intent) -> bool {
        self.sender.send(intent.into()).is_ok()
    }
}

/// Runs a controller against a service and a tunnel
pub struct Driver<T: Tunnel> {
    controller: Controller,
    tunnel: T,
    service: Arc<dyn QuizService>,
    sender: mpsc::UnboundedSender<Stimulus>,
    receiver: mpsc::UnboundedReceiver<Stimulus>,
}

fn scheduler(
    sender: &mpsc::UnboundedSender<Stimulus>,
) -> impl FnMut(crate::AlarmMessage, Duration) + '_ {
    move |message, delay| {
        let sender = sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(message.into());
        });
    }
}

fn requester<'a>(
    sender: &'a mpsc::UnboundedSender<Stimulus>,
    service: &'a Arc<dyn QuizService>,
) -> impl FnMut(Request) + 'a {
    move |Request { ticket, call }| {
        let sender = sender.clone();
        let service = Arc::clone(service);
        tokio::spawn(async move {
            debug!(?call, "calling quiz service");
            let reply = call.execute(service.as_ref()).await;
            let _ = sender.send(Response { ticket, reply }.into());
        });
    }
}

impl<T: Tunnel> Driver<T> {
    /// Creates a driver; nothing happens until `run` is awaited
    pub fn new(controller: Controller, tunnel: T, service: Arc<dyn QuizService>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            controller,
            tunnel,
            service,
            sender,
            receiver,
        }
    }

    /// Returns a handle for sending intents
    pub fn handle(&self) -> Handle {
        Handle {
            sender: self.sender.clone(),
        }
    }

    /// Processes stimuli until `Intent::Quit`, then returns the controller
    pub async fn run(mut self) -> Controller {
        self.tunnel.render(&self.controller.frame());
        while let Some(stimulus) = self.receiver.recv().await {
            if !self.dispatch(stimulus) {
                break;
            }
        }
        self.controller
    }

    fn dispatch(&mut self, stimulus: Stimulus) -> bool {
        let Self {
            controller,
            tunnel,
            service,
            sender,
            ..
        } = self;
        let (tunnel, service, sender) = (&*tunnel, &*service, &*sender);

        match stimulus {
            Stimulus::Intent(intent) => {
                debug!(?intent, state = ?controller.state(), "intent");
                let result = match intent {
                    Intent::Start(count) => {
                        controller.start_quiz(count, tunnel, requester(sender, service))
                    }
                    Intent::Select(index) => controller.select_option(index, tunnel),
                    Intent::Submit => {
                        controller.submit_answer(tunnel, requester(sender, service));
                        Ok(())
                    }
                    Intent::End(answer) => {
                        controller.end_quiz(&answer, tunnel, requester(sender, service))
                    }
                    Intent::Restart => {
                        controller.restart_quiz(tunnel);
                        Ok(())
                    }
                    Intent::ReloadResults => {
                        controller.reload_results(requester(sender, service));
                        Ok(())
                    }
                    Intent::Quit => return false,
                };
                if let Err(err) = result {
                    debug!(error = %err, "intent rejected");
                }
            }
            Stimulus::Alarm(message) => {
                controller.receive_alarm(
                    &message,
                    tunnel,
                    scheduler(sender),
                    requester(sender, service),
                );
            }
            Stimulus::Response(response) => {
                controller.receive_response(response, tunnel, scheduler(sender));
            }
        }

        true
    }
}
