use std::future::Future;
use std::sync::Arc;

use log::{error, info, warn};

use super::dispatcher::{CommandDispatcher, ConnectionEnd};
use crate::configuration::config::Config;
use crate::data_capture::capture_source::{verify_interface, DeviceOpener, PcapOpener};
use crate::error_handling::types::*;
use crate::network::control_listener::ControlListener;
use crate::session_management::CaptureSession;
use crate::storage::{ConsoleSink, FileStorage, ReportSink};

/// Top-level analyzer: owns the configuration and the command dispatcher
/// (and through it the capture session), and serves the control socket.
pub struct Controller {
    pub config: Config,
    dispatcher: CommandDispatcher,
}

impl Controller {
    /// Builds the analyzer on top of libpcap.
    ///
    /// Fails with [`ControllerError::Device`] when interface verification is
    /// enabled and the configured interface does not exist.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Creating controller for interface {}", config.capture.interface);
        if config.capture.verify_interface {
            verify_interface(&config.capture.interface)?;
        }

        let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();
        if config.output.console {
            sinks.push(Arc::new(ConsoleSink));
        }
        sinks.push(Arc::new(FileStorage::new(&config.output.file)));

        Ok(Self::with_opener(config, Arc::new(PcapOpener), sinks))
    }

    /// Builds the analyzer with an arbitrary capture facility and sinks.
    pub fn with_opener(
        config: Config,
        opener: Arc<dyn DeviceOpener>,
        sinks: Vec<Arc<dyn ReportSink>>,
    ) -> Self {
        let session = CaptureSession::new(config.capture.clone(), opener, sinks);
        let dispatcher = CommandDispatcher::new(session, config.control.clone());
        Self { config, dispatcher }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Binds the control socket and serves controllers until Ctrl-C or an
    /// `exit` that requests shutdown.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let listener = ControlListener::bind(&self.config.control.socket_path)?;
        self.serve(listener, tokio::signal::ctrl_c()).await
    }

    /// Accepts one controller at a time and dispatches its commands. The
    /// session is stopped before returning, whatever the reason.
    pub async fn serve<F: Future>(
        &mut self,
        listener: ControlListener,
        shutdown: F,
    ) -> Result<(), ControllerError> {
        tokio::pin!(shutdown);

        let result = loop {
            let stream = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(stream) => stream,
                    Err(e) => break Err(ControllerError::Transport(e)),
                },
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            };

            let end = tokio::select! {
                end = self.dispatcher.serve(stream) => end,
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            };

            match end {
                Ok(ConnectionEnd::Shutdown) => break Ok(()),
                Ok(_) => {}
                Err(e) => warn!("Controller connection dropped: {}", e),
            }
        };

        self.shutdown().await;
        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }

    pub async fn shutdown(&mut self) {
        info!("Shutting down, stopping any active capture");
        self.dispatcher.stop_session().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_capture::capture_source::testing::{ScriptedOpener, Tail};
    use crate::data_capture::frame_classifier::testing::tcp_frame;
    use crate::session_management::SessionState;
    use crate::storage::storage_trait::testing::MemorySink;
    use serial_test::serial;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.control.socket_path = dir.join("ctl.sock");
        config.output.file = dir.join("captured_packets.txt");
        config
    }

    async fn wait_for(sink: &MemorySink, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while sink.len() < n {
            assert!(tokio::time::Instant::now() < deadline, "no report in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    #[serial]
    async fn start_capture_stop_over_the_socket() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.control.shutdown_on_exit = true;
        let socket_path = config.control.socket_path.clone();
        let output = config.output.file.clone();

        let opener = ScriptedOpener::new(vec![tcp_frame(1, 100)], Tail::Idle)
            .with_clock_offset(chrono::Duration::seconds(1));
        let memory = Arc::new(MemorySink::default());
        let sinks: Vec<Arc<dyn ReportSink>> =
            vec![memory.clone(), Arc::new(FileStorage::new(&output))];
        let mut controller = Controller::with_opener(config, Arc::new(opener), sinks);
        let listener = ControlListener::bind(&socket_path).unwrap();

        let client = async {
            let mut stream = UnixStream::connect(&socket_path).await.unwrap();
            stream.write_all(b"start\n").await.unwrap();
            wait_for(&memory, 1).await;
            stream.write_all(b"stop\n").await.unwrap();
            stream.write_all(b"exit\n").await.unwrap();
            // the analyzer closes the connection without replying
            let mut rest = Vec::new();
            stream.read_to_end(&mut rest).await.unwrap();
            assert!(rest.is_empty());
        };

        let (served, ()) = tokio::join!(
            controller.serve(listener, std::future::pending::<()>()),
            client
        );
        served.unwrap();

        assert_eq!(controller.dispatcher().session().state(), SessionState::Idle);
        let reports = memory.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].packet_index, 1);
        assert_eq!(reports[0].retransmitted_packets, 0);
        let mbps = reports[0].throughput_mbps.unwrap();
        assert!(mbps <= 0.0008 && mbps > 0.0008 * 0.9, "got {}", mbps);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Packet 1 - Length: 100 bytes\n"
        );
        assert!(!socket_path.exists());
    }

    #[tokio::test]
    #[serial]
    async fn shutdown_signal_stops_active_capture() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let socket_path = config.control.socket_path.clone();

        let opener = Arc::new(ScriptedOpener::idle());
        let mut controller = Controller::with_opener(config, opener.clone(), Vec::new());
        let listener = ControlListener::bind(&socket_path).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let client = async {
            let mut stream = UnixStream::connect(&socket_path).await.unwrap();
            stream.write_all(b"start\n").await.unwrap();
            let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
            while opener.handles_open() == 0 {
                assert!(tokio::time::Instant::now() < deadline);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tx.send(()).unwrap();
            stream
        };

        let (served, _stream) = tokio::join!(controller.serve(listener, rx), client);
        served.unwrap();

        assert_eq!(controller.dispatcher().session().state(), SessionState::Idle);
        assert_eq!(opener.handles_open(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn exit_without_shutdown_accepts_next_controller() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let socket_path = config.control.socket_path.clone();

        let opener = Arc::new(ScriptedOpener::idle());
        let mut controller = Controller::with_opener(config, opener.clone(), Vec::new());
        let listener = ControlListener::bind(&socket_path).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let clients = async {
            let mut first = UnixStream::connect(&socket_path).await.unwrap();
            first.write_all(b"exit\n").await.unwrap();
            let mut rest = Vec::new();
            first.read_to_end(&mut rest).await.unwrap();

            let mut second = UnixStream::connect(&socket_path).await.unwrap();
            second.write_all(b"start\n").await.unwrap();
            let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
            while opener.handles_open() == 0 {
                assert!(tokio::time::Instant::now() < deadline);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tx.send(()).unwrap();
        };

        let (served, ()) = tokio::join!(controller.serve(listener, rx), clients);
        served.unwrap();
        assert_eq!(opener.opens.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(opener.handles_open(), 0);
    }
}
