use server_api::ApiContext;
use shared::protocol::ServerEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) events: broadcast::Sender<ServerEvent>,
}

impl AppState {
    /// Fan-out to websocket observers. Having no subscriber is normal.
    pub(crate) fn publish(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}
