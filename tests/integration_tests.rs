//! Conversation scenarios driven through `ChatSession` with a scripted transport.

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use tokio::sync::Notify;

    use askchat::chat::{ChatConfig, ChatSession, Submission};
    use askchat::{
        AskRequest, AskResponse, ControllerState, Error, FailureKind, Model, Result, Sender,
        Transport,
    };

    /// Replays canned results and records every request it receives.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<AskResponse>>>,
        requests: Mutex<Vec<AskRequest>>,
        started: Notify,
        release: Option<Notify>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<AskResponse>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Self::default()
            }
        }

        /// Like `new`, but every call blocks until `release` is notified.
        fn gated(script: Vec<Result<AskResponse>>) -> Self {
            Self {
                release: Some(Notify::new()),
                ..Self::new(script)
            }
        }

        fn requests(&self) -> Vec<AskRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.started.notify_one();
            if let Some(release) = &self.release {
                release.notified().await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::api(599, "script exhausted")))
        }
    }

    fn session(script: Vec<Result<AskResponse>>) -> ChatSession<ScriptedTransport> {
        ChatSession::new(ScriptedTransport::new(script), &ChatConfig::default())
    }

    #[test]
    fn fresh_session_has_only_the_greeting() {
        let session = session(vec![]);
        let turns = session.turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].sender, Sender::Bot);
        assert!(!session.is_pending());
        assert_eq!(session.state(), ControllerState::Idle);
        assert_eq!(session.selected_model(), Model::Gpt41);
    }

    #[tokio::test]
    async fn successful_turn_stores_token() {
        let session = session(vec![Ok(
            AskResponse::new("hi").with_previous_response_id("abc")
        )]);
        session.select_model(Model::Gpt41);

        let outcome = session.submit("hello").await;
        assert!(matches!(outcome, Submission::Answered(ref t) if t.text == "hi"));

        let snapshot = session.snapshot();
        let texts: Vec<_> = snapshot.turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[1], "hello");
        assert_eq!(texts[2], "hi");
        assert_eq!(snapshot.turns[1].sender, Sender::User);
        assert_eq!(snapshot.turns[2].sender, Sender::Bot);
        assert_eq!(snapshot.continuation_token.as_deref(), Some("abc"));
        assert!(!snapshot.pending);

        let requests = session.transport().requests();
        assert_eq!(requests, vec![AskRequest::new("hello", Model::Gpt41)]);
    }

    #[tokio::test]
    async fn not_found_becomes_bot_turn() {
        let session = session(vec![Err(Error::not_found("no /ask here"))]);
        let outcome = session.submit("x").await;
        assert!(matches!(
            outcome,
            Submission::Failed { kind: FailureKind::NotFound, .. }
        ));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.turns.len(), 3);
        assert_eq!(snapshot.turns[1].text, "x");
        assert!(snapshot.turns[1].sender == Sender::User);
        assert_eq!(
            snapshot.turns[2].text,
            FailureKind::NotFound.fallback_message()
        );
        assert_eq!(snapshot.last_error, Some(FailureKind::NotFound));
        assert!(!snapshot.pending);
        assert_eq!(session.state(), ControllerState::IdleWithError);
    }

    #[tokio::test]
    async fn submit_while_pending_is_rejected() {
        let session = ChatSession::new(
            ScriptedTransport::gated(vec![Ok(AskResponse::new("slow"))]),
            &ChatConfig::default(),
        );

        let first = session.submit("first");
        let second = async {
            session.transport().started.notified().await;
            assert!(session.is_pending());
            let before = session.turns();
            let outcome = session.submit("second").await;
            assert_eq!(session.turns(), before);
            // Switching models mid-flight does not touch the outstanding request.
            session.select_model(Model::GptO4);
            session
                .transport()
                .release
                .as_ref()
                .unwrap()
                .notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(second, Submission::Rejected);
        assert!(matches!(first, Submission::Answered(ref t) if t.text == "slow"));
        let requests = session.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_query, "first");
        assert_eq!(requests[0].model, Model::Gpt41);
        assert_eq!(session.turns().len(), 3);
        assert_eq!(session.selected_model(), Model::GptO4);
    }

    #[tokio::test]
    async fn second_turn_reuses_token() {
        let session = session(vec![
            Ok(AskResponse::new("hi").with_previous_response_id("abc")),
            Ok(AskResponse::new("again")),
        ]);
        session.submit("hello").await;
        session.submit("follow up").await;

        let requests = session.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].previous_response_id, None);
        assert_eq!(requests[1].previous_response_id.as_deref(), Some("abc"));
        // The second response carried no token, so the first one is kept.
        assert_eq!(
            session.snapshot().continuation_token.as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn blank_input_changes_nothing() {
        let session = session(vec![]);
        for input in ["", " ", "\t\n"] {
            assert_eq!(session.submit(input).await, Submission::Rejected);
        }
        assert_eq!(session.turns().len(), 1);
        assert!(session.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn model_change_affects_only_later_requests() {
        let session = session(vec![
            Ok(AskResponse::new("one")),
            Ok(AskResponse::new("two")),
            Ok(AskResponse::new("three")),
        ]);
        session.submit("a").await;
        session.select_model(Model::Qwen25);
        session.select_model(Model::Qwen25);
        session.submit("b").await;
        session.select_model(Model::Gpt41Mini);
        session.submit("c").await;

        let models: Vec<_> = session
            .transport()
            .requests()
            .iter()
            .map(|r| r.model)
            .collect();
        assert_eq!(models, vec![Model::Gpt41, Model::Qwen25, Model::Gpt41Mini]);
    }

    #[tokio::test]
    async fn failures_are_classified() {
        let session = session(vec![
            Err(Error::internal_server("boom", Some("gpu on fire".to_string()))),
            Err(Error::connection("refused", None)),
            Err(Error::timeout("slow", None)),
            Err(Error::serialization("garbled", None)),
            Ok(AskResponse::new("recovered")),
        ]);

        session.submit("1").await;
        assert_eq!(
            session.snapshot().last_error,
            Some(FailureKind::ServerError {
                detail: Some("gpu on fire".to_string())
            })
        );
        assert!(session.turns().last().unwrap().text.contains("gpu on fire"));

        session.submit("2").await;
        assert_eq!(
            session.snapshot().last_error,
            Some(FailureKind::ConnectionRefused)
        );

        session.submit("3").await;
        assert_eq!(session.snapshot().last_error, Some(FailureKind::Generic));

        session.submit("4").await;
        assert_eq!(session.snapshot().last_error, Some(FailureKind::Generic));

        session.submit("5").await;
        assert_eq!(session.snapshot().last_error, None);
        assert_eq!(session.state(), ControllerState::Idle);

        let turns = session.turns();
        assert_eq!(turns.len(), 11);
        for pair in turns[1..].chunks(2) {
            assert_eq!(pair[0].sender, Sender::User);
            assert_eq!(pair[1].sender, Sender::Bot);
        }
        let stats = session.stats();
        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.failed_requests, 4);
    }
}
