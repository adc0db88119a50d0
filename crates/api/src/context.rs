use std::net::IpAddr;

/// Per-request context, inserted into request extensions by the request-context middleware.
///
/// Immutable once created; the admission middleware and handlers read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    client: Option<IpAddr>,
}

impl RequestContext {
    pub fn new(request_id: String, client: Option<IpAddr>) -> Self {
        Self { request_id, client }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Origin address of the connection, when the server was started with connect info.
    pub fn client(&self) -> Option<IpAddr> {
        self.client
    }

    pub fn client_label(&self) -> String {
        self.client.map_or_else(|| "unknown".to_string(), |ip| ip.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_client_is_labelled_unknown() {
        let ctx = RequestContext::new("r-1".into(), None);
        assert_eq!(ctx.client_label(), "unknown");

        let ctx = RequestContext::new("r-2".into(), Some("10.1.2.3".parse().unwrap()));
        assert_eq!(ctx.client_label(), "10.1.2.3");
        assert_eq!(ctx.request_id(), "r-2");
    }
}
