#[cfg(test)]
mod tests {
    use crate::config::ListenSpec;
    use crate::metrics::{self, meter};

    /// TestInitExporterIdempotent validates that repeated initialization
    /// hands out the same working render handle instead of failing.
    #[test]
    fn test_init_exporter_idempotent() {
        let first = metrics::init_exporter();
        let second = metrics::init_exporter();

        meter::add_commit_failure();

        assert!(first.render().contains(meter::COMMIT_FAILURES_TOTAL));
        assert!(second.render().contains(meter::COMMIT_FAILURES_TOTAL));
    }

    #[test]
    fn test_recorded_series_show_up_in_render() {
        let handle = metrics::init_exporter();

        meter::add_commit_request("success");
        meter::observe_commit_duration(0.25);

        let body = handle.render();
        assert!(body.contains(meter::COMMIT_REQUESTS_TOTAL));
        assert!(body.contains("status=\"success\""));
        assert!(body.contains(meter::COMMIT_REQUEST_DURATION_SECONDS));
    }

    #[tokio::test]
    async fn test_serve_fails_when_port_is_occupied() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = metrics::Server::new(metrics::init_exporter());
        let spec = ListenSpec {
            host: "127.0.0.1".to_string(),
            port,
        };

        let err = server.serve(&spec).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind metrics listener"));
    }
}
