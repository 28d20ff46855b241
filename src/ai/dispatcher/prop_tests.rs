use super::tests::{Scripted, dispatcher, fail, ok};
use super::*;
use crate::models::{ChatMessage, ChatRole};
use proptest::prelude::*;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

fn arb_fallback_status() -> impl Strategy<Value = u16> {
    prop_oneof![Just(400u16), Just(429u16)]
}

fn request() -> ChatRequest {
    ChatRequest::chat(&[ChatMessage::new(ChatRole::User, "q".to_string())])
}

proptest! {
    /// Attempts on total failure = models + one extra when the first failure is a rate limit
    #[test]
    fn prop_attempts_when_every_model_fails(
        models in 1usize..6,
        statuses in prop::collection::vec(arb_fallback_status(), 7),
    ) {
        let names: Vec<String> = (0..models).map(|i| format!("m{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let script = statuses.iter().map(|s| fail(*s, "nope")).collect();
        let d = dispatcher(&names, script);

        let err = block_on(d.complete(&request())).unwrap_err();

        let expected = models as u32 + u32::from(statuses[0] == 429);
        match err {
            AiError::Exhausted { attempts, .. } => prop_assert_eq!(attempts, expected),
            other => prop_assert!(false, "unexpected error {other:?}"),
        }
        prop_assert_eq!(d.transport().models().len() as u32, expected);
    }

    /// Models are tried in ladder order and never revisited after falling back
    #[test]
    fn prop_models_tried_in_order(models in 1usize..6, succeed_at in 0usize..6) {
        let succeed_at = succeed_at % models;
        let names: Vec<String> = (0..models).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut script: Vec<Scripted> = (0..succeed_at).map(|_| fail(400, "bad")).collect();
        script.push(ok("fine"));
        let d = dispatcher(&refs, script);

        let text = block_on(d.complete_text(&request())).unwrap();

        prop_assert_eq!(text, "fine");
        prop_assert_eq!(d.transport().models(), names[..=succeed_at].to_vec());
    }
}
