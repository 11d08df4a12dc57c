use rumqttc::{AsyncClient, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::command::{Command, CommandError, CommandKind};
use super::input::PromptClient;

/// Interactive loop that reads durations for one setting and publishes them.
pub struct CommandPublisher {
    kind: CommandKind,
    client: AsyncClient,
    topic: String,
    input: PromptClient,
}

impl CommandPublisher {
    pub fn new(kind: CommandKind, client: AsyncClient, topic: String, input: PromptClient) -> Self {
        CommandPublisher {
            kind,
            client,
            topic,
            input,
        }
    }

    /// Runs until the console closes or `cancel` fires. Bad input re-prompts.
    pub async fn run(self, cancel: CancellationToken) {
        info!("{} publisher ready on {}", self.kind.label(), self.topic);
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = self.input.read_line(self.kind.prompt()) => line,
            };
            let Some(line) = line else {
                break;
            };

            let command = match Command::from_input(self.kind, &line) {
                Ok(command) => command,
                Err(e) => {
                    warn!("Rejected input for {}: {}", self.kind.label(), e);
                    println!("Enter a valid number greater than 0.");
                    continue;
                }
            };

            match self.publish(command).await {
                Ok(()) => println!("{} sent: {}s", self.kind.label(), command.seconds),
                Err(e) => error!("{}", e),
            }
        }
        info!("{} publisher stopped", self.kind.label());
    }

    /// Queues the command at QoS 1. Delivery and retries belong to the client.
    pub async fn publish(&self, command: Command) -> Result<(), CommandError> {
        let payload = command.to_payload()?;
        self.client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::input::{prompt_channel, serve_prompts};
    use rumqttc::Request;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn only_valid_input_is_published() {
        let (request_tx, request_rx) = flume::bounded(10);
        let client = AsyncClient::from_senders(request_tx);
        let (prompts, requests) = prompt_channel(4);
        let (line_tx, lines) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        for line in ["abc\n", "0\n", "-3\n", "45\n"] {
            line_tx.send(line.to_string()).await.unwrap();
        }
        drop(line_tx);

        let publisher = CommandPublisher::new(
            CommandKind::SetMax,
            client,
            "UNRaf/D8BC38E423D0/cmd".to_string(),
            prompts,
        );
        tokio::join!(
            publisher.run(cancel.clone()),
            serve_prompts(requests, lines, tokio::io::sink(), cancel.clone())
        );

        let mut published = Vec::new();
        while let Ok(request) = request_rx.try_recv() {
            if let Request::Publish(publish) = request {
                published.push(publish);
            }
        }
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "UNRaf/D8BC38E423D0/cmd");
        assert_eq!(published[0].qos, QoS::AtLeastOnce);
        assert_eq!(
            &published[0].payload[..],
            br#"{"command": "set_max", "tiempo": 45}"#
        );
    }
}
