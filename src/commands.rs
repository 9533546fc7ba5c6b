//! The make-request command: fetch one URL and hand the outcome to a presenter.

use crate::http_client::{PinnedHttpClient, RequestSpec};
use crate::presenter::ResponseHandler;

pub struct MakeRequestCommand<'a> {
    client: &'a PinnedHttpClient,
    request: RequestSpec,
}

impl<'a> MakeRequestCommand<'a> {
    pub fn new(client: &'a PinnedHttpClient, request: RequestSpec) -> Self {
        Self { client, request }
    }

    pub fn request(&self) -> &RequestSpec {
        &self.request
    }

    /// Run the request and call exactly one handler method.
    /// Returns `true` when the request resolved.
    pub async fn execute(&self, handler: &mut dyn ResponseHandler) -> bool {
        tracing::info!(url = %self.request.url, method = ?self.request.method, "Making HTTPS request");
        match self.client.send(self.request.clone()).await {
            Ok(body) => {
                handler.handle_success(&body);
                true
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), "Request failed: {e}");
                handler.handle_error(&e);
                false
            }
        }
    }
}
