//! The plan-assistant pipeline: quota gate, injection guard, safety guard,
//! context assembly, completion. Stages run strictly in that order and each
//! stage's outcome gates entry to the next; nothing is started speculatively.

pub mod context;
pub mod guard;
pub mod prompts;
pub mod provider;
pub mod store;
pub mod week;

use chrono::NaiveDate;
use uuid::Uuid;

use plato_core::profile::Locale;

use crate::assistant::guard::GuardPurpose;
use crate::assistant::provider::{
    ChatMessage, ChatRequest, CompletionProvider, ProviderError,
};
use crate::assistant::store::AssistantStore;

/// One assistant interaction, assembled by the route handler after auth and
/// payload validation have passed.
#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub user_id: Uuid,
    pub locale: Locale,
    pub week_start: NaiveDate,
    pub message: String,
}

/// Terminal pipeline outcome. A guard refusal is a success-path outcome:
/// the caller renders it exactly like a normal answer.
#[derive(Debug)]
pub enum Outcome {
    Answer(String),
    Refused(GuardPurpose),
}

#[derive(Debug)]
pub enum PipelineError {
    /// Counter store unreachable. Fails closed: no store, no assistant.
    QuotaStore(sqlx::Error),
    /// Daily ceiling reached.
    QuotaExceeded,
    /// A guard call failed. Never treated as allow.
    Guard(ProviderError),
    /// The final completion call failed or came back empty.
    Completion(ProviderError),
}

/// Run the moderated completion pipeline for one request.
///
/// Quota is consumed before the guards evaluate, so blocked messages burn
/// allowance too; probing the moderation layer is not free.
pub async fn run<S, P>(
    store: &S,
    provider: &P,
    req: &AssistantRequest,
) -> Result<Outcome, PipelineError>
where
    S: AssistantStore,
    P: CompletionProvider,
{
    let quota = store
        .check_and_increment_quota(req.user_id, prompts::MAX_MESSAGES_PER_DAY)
        .await
        .map_err(PipelineError::QuotaStore)?;
    if !quota.allowed {
        tracing::info!(user_id = %req.user_id, count = quota.new_count, "assistant quota exhausted");
        return Err(PipelineError::QuotaExceeded);
    }

    // Injection first: a message crafted to override instructions must never
    // reach the safety classifier, whose verdict it could steer.
    let injection_ok = guard::classify(provider, GuardPurpose::PromptInjection, &req.message)
        .await
        .map_err(PipelineError::Guard)?;
    if !injection_ok {
        return Ok(Outcome::Refused(GuardPurpose::PromptInjection));
    }

    let safety_ok = guard::classify(provider, GuardPurpose::Safety, &req.message)
        .await
        .map_err(PipelineError::Guard)?;
    if !safety_ok {
        return Ok(Outcome::Refused(GuardPurpose::Safety));
    }

    let assembled = context::assemble(store, req.user_id, req.week_start).await;
    let context_block = context::render(&assembled, req.locale, req.week_start);

    let answer = provider
        .chat(ChatRequest {
            model: prompts::ANSWER_MODEL.to_string(),
            messages: vec![
                ChatMessage::system(prompts::persona(req.locale)),
                ChatMessage::system(context_block),
                ChatMessage::user(req.message.as_str()),
            ],
            temperature: prompts::ANSWER_TEMPERATURE,
            max_tokens: prompts::ANSWER_MAX_TOKENS,
        })
        .await
        .map_err(PipelineError::Completion)?;

    Ok(Outcome::Answer(answer))
}

/// Counting in-memory doubles for the store and provider, shared by the
/// pipeline tests here and the handler-ordering tests in the route module.
#[cfg(test)]
pub(crate) mod testing {
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use uuid::Uuid;

    use plato_core::lessons::Lesson;
    use plato_core::plan::PlanRecord;

    use crate::assistant::prompts;
    use crate::assistant::provider::{ChatRequest, CompletionProvider, ProviderError};
    use crate::assistant::store::{AssistantStore, QuotaVerdict};

    pub(crate) struct MockStore {
        pub(crate) count: Mutex<i32>,
        pub(crate) quota_calls: AtomicUsize,
        pub(crate) quota_error: bool,
        pub(crate) plan: Option<PlanRecord>,
        pub(crate) plan_error: bool,
        pub(crate) lessons: Vec<Lesson>,
        pub(crate) lessons_error: bool,
    }

    impl MockStore {
        pub(crate) fn quota_calls(&self) -> usize {
            self.quota_calls.load(Ordering::SeqCst)
        }
    }

    impl Default for MockStore {
        fn default() -> Self {
            MockStore {
                count: Mutex::new(0),
                quota_calls: AtomicUsize::new(0),
                quota_error: false,
                plan: None,
                plan_error: false,
                lessons: Vec::new(),
                lessons_error: false,
            }
        }
    }

    impl AssistantStore for MockStore {
        async fn check_and_increment_quota(
            &self,
            _user_id: Uuid,
            max_per_day: i32,
        ) -> Result<QuotaVerdict, sqlx::Error> {
            self.quota_calls.fetch_add(1, Ordering::SeqCst);
            if self.quota_error {
                return Err(sqlx::Error::PoolClosed);
            }
            let mut count = self.count.lock().unwrap();
            *count += 1;
            Ok(QuotaVerdict {
                allowed: *count <= max_per_day,
                new_count: *count,
            })
        }

        async fn plan_for_week(
            &self,
            _patient_id: Uuid,
            _week_start: NaiveDate,
        ) -> Result<Option<PlanRecord>, sqlx::Error> {
            if self.plan_error {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.plan.clone())
        }

        async fn recent_published_lessons(&self, _limit: i64) -> Result<Vec<Lesson>, sqlx::Error> {
            if self.lessons_error {
                return Err(sqlx::Error::PoolClosed);
            }
            Ok(self.lessons.clone())
        }
    }

    pub(crate) struct ScriptedProvider {
        pub(crate) injection: &'static str,
        pub(crate) safety: &'static str,
        /// `None` simulates a completion with no content.
        pub(crate) answer: Option<&'static str>,
        pub(crate) guards_fail: bool,
        pub(crate) requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        pub(crate) fn allowing(answer: &'static str) -> Self {
            ScriptedProvider {
                injection: "ALLOW",
                safety: "ALLOW",
                answer: Some(answer),
                guards_fail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn models_called(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|req| req.model.clone())
                .collect()
        }

        pub(crate) fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn last_context_block(&self) -> String {
            let requests = self.requests.lock().unwrap();
            let answer_req = requests
                .iter()
                .rev()
                .find(|req| req.model == prompts::ANSWER_MODEL)
                .expect("no completion call recorded");
            answer_req.messages[1].content.clone()
        }
    }

    impl CompletionProvider for ScriptedProvider {
        fn chat(
            &self,
            req: ChatRequest,
        ) -> impl Future<Output = Result<String, ProviderError>> + Send {
            let out = {
                let model = req.model.clone();
                self.requests.lock().unwrap().push(req);
                if self.guards_fail
                    && (model == prompts::INJECTION_GUARD_MODEL
                        || model == prompts::SAFETY_GUARD_MODEL)
                {
                    Err(ProviderError::Api("guard backend down".to_string()))
                } else if model == prompts::INJECTION_GUARD_MODEL {
                    Ok(self.injection.to_string())
                } else if model == prompts::SAFETY_GUARD_MODEL {
                    Ok(self.safety.to_string())
                } else {
                    self.answer
                        .map(str::to_string)
                        .ok_or(ProviderError::EmptyResponse)
                }
            };
            async move { out }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MockStore, ScriptedProvider};
    use super::*;
    use plato_core::plan::PlanRecord;

    fn request() -> AssistantRequest {
        AssistantRequest {
            user_id: Uuid::now_v7(),
            locale: Locale::Es,
            week_start: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            message: "¿Puedo cambiar la merienda del martes?".to_string(),
        }
    }

    #[tokio::test]
    async fn happy_path_answers_with_model_output() {
        let store = MockStore::default();
        let provider = ScriptedProvider::allowing("Claro, cámbiala por fruta.");

        let outcome = run(&store, &provider, &request()).await.unwrap();
        match outcome {
            Outcome::Answer(answer) => assert_eq!(answer, "Claro, cámbiala por fruta."),
            other => panic!("expected answer, got {other:?}"),
        }
        assert_eq!(
            provider.models_called(),
            vec![
                prompts::INJECTION_GUARD_MODEL.to_string(),
                prompts::SAFETY_GUARD_MODEL.to_string(),
                prompts::ANSWER_MODEL.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn injection_block_never_reaches_safety_or_completion() {
        let store = MockStore::default();
        let provider = ScriptedProvider {
            injection: "BLOCK",
            ..ScriptedProvider::allowing("unused")
        };

        let outcome = run(&store, &provider, &request()).await.unwrap();
        match outcome {
            Outcome::Refused(purpose) => {
                assert_eq!(purpose, GuardPurpose::PromptInjection);
                assert_eq!(
                    purpose.refusal(),
                    "Prefiero mantener el contexto clínico. Pregunta sobre tu plan o escribe al nutri."
                );
            }
            other => panic!("expected refusal, got {other:?}"),
        }
        assert_eq!(
            provider.models_called(),
            vec![prompts::INJECTION_GUARD_MODEL.to_string()]
        );
    }

    #[tokio::test]
    async fn safety_block_never_reaches_completion() {
        let store = MockStore::default();
        let provider = ScriptedProvider {
            safety: "unsafe S6",
            ..ScriptedProvider::allowing("unused")
        };

        let outcome = run(&store, &provider, &request()).await.unwrap();
        assert!(matches!(outcome, Outcome::Refused(GuardPurpose::Safety)));
        assert_eq!(
            provider.models_called(),
            vec![
                prompts::INJECTION_GUARD_MODEL.to_string(),
                prompts::SAFETY_GUARD_MODEL.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn quota_boundary_is_exact() {
        let store = MockStore::default();
        let provider = ScriptedProvider::allowing("ok");
        let req = request();

        for _ in 0..prompts::MAX_MESSAGES_PER_DAY {
            let outcome = run(&store, &provider, &req).await.unwrap();
            assert!(matches!(outcome, Outcome::Answer(_)));
        }

        let calls_before = provider.call_count();
        let err = run(&store, &provider, &req).await.unwrap_err();
        assert!(matches!(err, PipelineError::QuotaExceeded));
        // The rejected request must not have spent any provider calls.
        assert_eq!(provider.call_count(), calls_before);
    }

    #[tokio::test]
    async fn quota_store_failure_fails_closed() {
        let store = MockStore {
            quota_error: true,
            ..MockStore::default()
        };
        let provider = ScriptedProvider::allowing("unused");

        let err = run(&store, &provider, &request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::QuotaStore(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn blocked_messages_still_consume_quota() {
        let store = MockStore::default();
        let provider = ScriptedProvider {
            injection: "BLOCK",
            ..ScriptedProvider::allowing("unused")
        };
        let req = request();

        run(&store, &provider, &req).await.unwrap();
        run(&store, &provider, &req).await.unwrap();
        assert_eq!(*store.count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn guard_failure_aborts_instead_of_allowing() {
        let store = MockStore::default();
        let provider = ScriptedProvider {
            guards_fail: true,
            ..ScriptedProvider::allowing("unused")
        };

        let err = run(&store, &provider, &request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Guard(_)));
        assert_eq!(
            provider.models_called(),
            vec![prompts::INJECTION_GUARD_MODEL.to_string()]
        );
    }

    #[tokio::test]
    async fn context_read_failure_degrades_to_defaults() {
        let store = MockStore {
            plan_error: true,
            lessons_error: true,
            ..MockStore::default()
        };
        let provider = ScriptedProvider::allowing("Sigue tu plan actual.");

        let outcome = run(&store, &provider, &request()).await.unwrap();
        assert!(matches!(outcome, Outcome::Answer(_)));

        let context_block = provider.last_context_block();
        assert!(context_block.contains("PLAN_JSON={}"));
        assert!(context_block.ends_with("LESSONS:\n(none)"));
    }

    #[tokio::test]
    async fn existing_plan_flows_into_the_context_block() {
        let store = MockStore {
            plan: Some(PlanRecord {
                plan_data: serde_json::json!({"lunes": "lentejas"}),
                ..PlanRecord::default()
            }),
            ..MockStore::default()
        };
        let provider = ScriptedProvider::allowing("ok");

        run(&store, &provider, &request()).await.unwrap();
        assert!(provider.last_context_block().contains("lentejas"));
    }

    #[tokio::test]
    async fn empty_completion_is_a_hard_error() {
        let store = MockStore::default();
        let provider = ScriptedProvider {
            answer: None,
            ..ScriptedProvider::allowing("unused")
        };

        let err = run(&store, &provider, &request()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Completion(ProviderError::EmptyResponse)
        ));
    }
}
