//! Binds the experiment use case to the TCP server endpoint.
//!
//! [`ServerEndpoint`] already offers `send_to` and `broadcast`; this module
//! exposes them through the application's [`Outbox`] trait and lets an
//! [`ExperimentHost`] consume inbound envelopes directly from
//! [`ServerEndpoint::drain_inbound`].

use guess_core::{ConnectionId, Envelope, WireMessage};
use guess_net::{MessageHandler, ServerEndpoint};

use crate::application::run_experiment::{ExperimentHost, Outbox};

impl Outbox for ServerEndpoint {
    fn send_to(&self, id: ConnectionId, message: WireMessage) -> bool {
        ServerEndpoint::send_to(self, id, message)
    }

    fn broadcast(&self, message: WireMessage) -> usize {
        ServerEndpoint::broadcast(self, message)
    }
}

impl MessageHandler for ExperimentHost {
    fn handle_message(&mut self, server: &ServerEndpoint, envelope: Envelope) {
        self.on_message(envelope, server);
    }
}
