// Liveness supervisor for the update loop.
//
// The update loop runs as its own task. Alongside it the supervisor probes
// the Bot API with `getMe` on a fixed interval. A failed probe, a loop error
// or a panic inside the loop all count as one failure: the loop is stopped,
// and relaunched after the backoff chosen by the restart policy.
//
// A failed probe asks the loop to stop and waits for it. The loop finishes
// the update in hand first, so a question is never posted without being
// recorded and acknowledged.

use super::update_poller::UpdatePoller;
use super::Relay;
use crate::core::relay::{ChatGateway, QuestionStore};
use crate::core::supervision::{RestartDecision, RestartPolicy, RestartTracker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

pub struct BotSupervisor {
    poller: Arc<UpdatePoller>,
    relay: Arc<Relay>,
    probe_interval: Duration,
    policy: RestartPolicy,
}

impl BotSupervisor {
    pub fn new(
        poller: Arc<UpdatePoller>,
        relay: Arc<Relay>,
        probe_interval: Duration,
        policy: RestartPolicy,
    ) -> Self {
        Self {
            poller,
            relay,
            probe_interval,
            policy,
        }
    }

    /// Run until the restart policy gives up.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut tracker = RestartTracker::new(self.policy.clone());
        let mut probe = tokio::time::interval(self.probe_interval);
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the first real probe is one
        // interval after startup.
        probe.tick().await;

        loop {
            tracing::info!(
                restarts = tracker.total_restarts(),
                offset = self.poller.offset(),
                "Starting update loop"
            );

            let (stop, stop_rx) = watch::channel(false);
            let poller = Arc::clone(&self.poller);
            let relay = Arc::clone(&self.relay);
            let mut update_loop = tokio::spawn(async move { poller.run(&relay, stop_rx).await });

            let failure = loop {
                tokio::select! {
                    joined = &mut update_loop => {
                        break match joined {
                            Ok(Ok(())) => "update loop exited".to_string(),
                            Ok(Err(e)) => format!("update loop failed: {}", e),
                            Err(e) if e.is_panic() => format!("update loop panicked: {}", e),
                            Err(e) => format!("update loop was cancelled: {}", e),
                        };
                    }
                    _ = probe.tick() => {
                        match ChatGateway::get_me(self.relay.gateway()).await {
                            Ok(me) => {
                                tracing::info!(
                                    bot = ?me.username,
                                    pending_questions = self.relay.questions().len(),
                                    "Bot is healthy"
                                );
                                tracker.record_healthy();
                            }
                            Err(e) => {
                                tracing::warn!("Health probe failed, stopping update loop: {}", e);
                                let _ = stop.send(true);
                                // Two pollers must never overlap.
                                if let Err(join) = (&mut update_loop).await {
                                    tracing::error!("Update loop ended abnormally: {}", join);
                                }
                                break format!("health probe failed: {}", e);
                            }
                        }
                    }
                }
            };

            tracing::error!(reason = %failure, "Update loop stopped");

            match tracker.record_failure() {
                RestartDecision::Retry(delay) => {
                    tracing::warn!(
                        consecutive_failures = tracker.consecutive_failures(),
                        "Relaunching update loop in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                RestartDecision::GiveUp => {
                    anyhow::bail!(
                        "update loop failed {} times in a row, giving up (last: {})",
                        tracker.consecutive_failures(),
                        failure
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relay::{ChatId, MessageId, RelayService, UserId};
    use crate::infra::relay::{InMemoryBlockList, InMemoryQuestionStore};
    use crate::infra::telegram::TelegramClient;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn supervisor(
        server: &MockServer,
        probe_interval: Duration,
        max_restarts: u32,
    ) -> BotSupervisor {
        supervisor_with_relay(server, probe_interval, max_restarts).0
    }

    fn supervisor_with_relay(
        server: &MockServer,
        probe_interval: Duration,
        max_restarts: u32,
    ) -> (BotSupervisor, Arc<Relay>, Arc<UpdatePoller>) {
        let client = TelegramClient::with_base_url("T".to_string(), server.uri(), 0).unwrap();
        let relay = Arc::new(RelayService::new(
            client.clone(),
            InMemoryBlockList::new(),
            InMemoryQuestionStore::default(),
            ChatId(-100),
        ));
        let poller = Arc::new(UpdatePoller::new(client, 0));

        let supervisor = BotSupervisor::new(
            Arc::clone(&poller),
            Arc::clone(&relay),
            probe_interval,
            RestartPolicy {
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
                max_restarts,
            },
        );
        (supervisor, relay, poller)
    }

    async fn mount_empty_updates(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/botT/getUpdates"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": []}))
                    .set_delay(Duration::from_millis(10)),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_failed_probe_restarts_until_policy_gives_up() {
        let server = MockServer::start().await;
        mount_empty_updates(&server).await;
        Mock::given(method("POST"))
            .and(path("/botT/getMe"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let supervisor = supervisor(&server, Duration::from_millis(20), 2);
        let result = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
            .await
            .expect("supervisor should give up");

        let err = result.unwrap_err().to_string();
        assert!(err.contains("3 times"), "{err}");
        assert!(err.contains("health probe failed"), "{err}");
    }

    #[tokio::test]
    async fn test_failing_update_loop_is_relaunched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botT/getUpdates"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let supervisor = supervisor(&server, Duration::from_secs(60), 1);
        let result = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
            .await
            .expect("supervisor should give up");

        let err = result.unwrap_err().to_string();
        assert!(err.contains("update loop failed"), "{err}");

        // One launch plus one relaunch before giving up.
        let polls = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/botT/getUpdates")
            .count();
        assert_eq!(polls, 2);
    }

    #[tokio::test]
    async fn test_healthy_bot_keeps_running() {
        let server = MockServer::start().await;
        mount_empty_updates(&server).await;
        Mock::given(method("POST"))
            .and(path("/botT/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"id": 1, "is_bot": true, "first_name": "Bot", "username": "support_bot"}
            })))
            .mount(&server)
            .await;

        let supervisor = supervisor(&server, Duration::from_millis(20), 1);
        let outcome = tokio::time::timeout(Duration::from_millis(200), supervisor.run()).await;

        assert!(outcome.is_err(), "supervisor should still be running");
    }

    #[tokio::test]
    async fn test_failed_probe_lets_update_in_hand_finish() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botT/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [{
                    "update_id": 7,
                    "message": {
                        "message_id": 3,
                        "from": {"id": 111, "is_bot": false, "first_name": "A"},
                        "chat": {"id": 111, "type": "private"},
                        "text": "Hello"
                    }
                }]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_empty_updates(&server).await;
        // Slower than the probe interval: the probe fails while the question
        // is still being posted.
        Mock::given(method("POST"))
            .and(path("/botT/sendMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "ok": true,
                        "result": {"message_id": 900, "chat": {"id": -100, "type": "supergroup"}}
                    }))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botT/getMe"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let (supervisor, relay, poller) =
            supervisor_with_relay(&server, Duration::from_millis(100), 1);
        let result = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
            .await
            .expect("supervisor should give up");
        assert!(result.is_err());

        assert_eq!(poller.offset(), 8);
        let question = relay
            .questions()
            .lookup(MessageId(900))
            .expect("forwarded question should be recorded");
        assert_eq!(question.requester_id, UserId(111));

        let acknowledged = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/botT/sendMessage")
            .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
            .any(|body| body["chat_id"] == json!(111));
        assert!(acknowledged, "sender should get an acknowledgement");
    }
}
