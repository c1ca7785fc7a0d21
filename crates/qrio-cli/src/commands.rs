//! Command handlers for the QRio CLI

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use qrio_peripheral::{
    handle_method_call, AdvertisingGateway, MethodCall, PeripheralController, PlatformGateway,
    SimulatedGateway,
};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command against the configured gateway
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        if cli.simulate || config.cli.simulate {
            info!("Using simulated BLE adapter");
            let controller =
                PeripheralController::with_config(SimulatedGateway::new(), config.peripheral)?;
            Self::run(cli.command, controller).await
        } else {
            let controller =
                PeripheralController::with_config(PlatformGateway::new(), config.peripheral)?;
            Self::run(cli.command, controller).await
        }
    }

    async fn run<G: AdvertisingGateway>(
        command: Commands,
        controller: PeripheralController<G>,
    ) -> Result<()> {
        match command {
            Commands::Advertise { session_id } => {
                Self::handle_advertise_command(controller, session_id).await
            }
            Commands::Serve => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                let stdout = tokio::io::stdout();
                Self::handle_serve_command(controller, stdin, stdout).await
            }
        }
    }

    /// Advertise one session until Ctrl-C
    async fn handle_advertise_command<G: AdvertisingGateway>(
        mut controller: PeripheralController<G>,
        session_id: Option<String>,
    ) -> Result<()> {
        if !controller.start(session_id.as_deref()).await {
            let session = qrio_peripheral::SessionId::resolve(session_id.as_deref());
            controller.teardown().await;
            return Err(CliError::StartFailed(session.to_string()));
        }

        info!("Advertising; press Ctrl-C to stop");
        let signal = tokio::signal::ctrl_c().await;
        if let Err(e) = signal {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }

        controller.teardown().await;
        Ok(())
    }

    /// Answer newline-delimited JSON method calls until the input closes
    ///
    /// Each input line is a [`MethodCall`]; each output line is the JSON
    /// encoded response, or `{"error": ...}` when the line does not parse.
    /// Lines are read as raw bytes so a line that is not UTF-8 gets an error
    /// reply instead of ending the session.
    pub async fn handle_serve_command<G, R, W>(
        mut controller: PeripheralController<G>,
        reader: R,
        mut writer: W,
    ) -> Result<()>
    where
        G: AdvertisingGateway,
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.split(b'\n');
        let result = loop {
            let mut line = match lines.next_segment().await {
                Ok(Some(line)) => line,
                Ok(None) => break Ok(()),
                Err(e) => break Err(CliError::Io(e)),
            };
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let encoded = match Self::answer_line(&mut controller, &line).await {
                Ok(encoded) => encoded,
                Err(e) => break Err(e),
            };
            if let Err(e) = writer.write_all(&encoded).await {
                break Err(CliError::Io(e));
            }
            if let Err(e) = writer.flush().await {
                break Err(CliError::Io(e));
            }
        };

        // Host channel closed; the owner is gone either way
        controller.teardown().await;
        result
    }

    /// Encode the reply to one input line, newline terminated
    async fn answer_line<G: AdvertisingGateway>(
        controller: &mut PeripheralController<G>,
        line: &[u8],
    ) -> Result<Vec<u8>> {
        let reply = match serde_json::from_slice::<MethodCall>(line) {
            Ok(call) => serde_json::to_value(handle_method_call(controller, &call).await)?,
            Err(e) => {
                warn!("Malformed method call: {}", e);
                json!({ "error": e.to_string() })
            }
        };

        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn serve(input: &[u8]) -> (Vec<serde_json::Value>, qrio_peripheral::SimulatedAdapter) {
        let gateway = SimulatedGateway::new();
        let adapter = gateway.adapter();
        let controller = PeripheralController::new(gateway);
        let mut output = Vec::new();

        CommandDispatcher::handle_serve_command(controller, input, &mut output)
            .await
            .unwrap();

        let replies = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (replies, adapter)
    }

    #[tokio::test]
    async fn test_serve_answers_each_call() {
        let input = concat!(
            r#"{"method": "startPeripheral", "arguments": {"sessionId": "abc"}}"#,
            "\n",
            r#"{"method": "vibrate"}"#,
            "\n\n",
            r#"{"method": "stopPeripheral"}"#,
            "\n",
        );

        let (replies, adapter) = serve(input.as_bytes()).await;

        assert_eq!(
            replies,
            vec![
                json!({ "ok": true }),
                json!("notImplemented"),
                json!({ "ok": true }),
            ]
        );
        assert_eq!(adapter.begin_count(), 1);
        assert_eq!(adapter.end_count(), 1);
    }

    #[tokio::test]
    async fn test_serve_reports_malformed_lines_and_tears_down() {
        let input = concat!(
            r#"{"method": "startPeripheral"}"#,
            "\n",
            "not json\n",
        );

        let (replies, adapter) = serve(input.as_bytes()).await;

        assert_eq!(replies[0], json!({ "ok": true }));
        assert!(replies[1].get("error").is_some());
        // End of input tears the controller down
        assert!(adapter.current_payload().is_none());
        assert_eq!(adapter.end_count(), 1);
    }

    #[tokio::test]
    async fn test_serve_survives_non_utf8_line() {
        let mut input = Vec::new();
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(br#"{"method": "startPeripheral", "arguments": {"sessionId": "x"}}"#);
        input.extend_from_slice(b"\r\n");
        input.extend_from_slice(br#"{"method": "stopPeripheral"}"#);
        input.push(b'\n');

        let (replies, adapter) = serve(&input).await;

        assert_eq!(replies.len(), 3);
        assert!(replies[0].get("error").is_some());
        assert_eq!(replies[1], json!({ "ok": true }));
        assert_eq!(replies[2], json!({ "ok": true }));
        assert_eq!(adapter.begin_count(), 1);
        assert_eq!(adapter.end_count(), 1);
    }
}
