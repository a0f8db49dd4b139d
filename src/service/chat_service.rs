use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::agent::CompletionClient;
use crate::db::conversation_repository::ConversationRepository;
use crate::db::settings_repository::SettingsRepository;
use crate::db::KeyValueStore;
use crate::errors::AppError;
use crate::models::{
    ChatSnapshot, ConversationMatch, Message, SessionSettings, SettingsUpdate, SettingsView,
};
use crate::service::conversation_store::ConversationStore;

/// What became of one submit.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Blank input, or a send is already in flight for the conversation.
    Ignored,
    /// The reply was filed; `title_task` is set when a title is being suggested.
    Replied {
        conversation_id: i64,
        title_task: Option<JoinHandle<()>>,
    },
    /// The error text was filed as an assistant message.
    Failed { conversation_id: i64, error: String },
}

struct ChatState {
    store: ConversationStore,
    settings: SessionSettings,
}

/// Conversations with a send in flight, by id.
type InFlight = Arc<StdMutex<HashSet<i64>>>;

/// Clears a conversation's in-flight mark on every exit path.
struct SendingGuard {
    in_flight: InFlight,
    conversation_id: i64,
}

impl Drop for SendingGuard {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.in_flight.lock() {
            ids.remove(&self.conversation_id);
        }
    }
}

/// Owns the conversation state and turns user intents into state changes
/// and completion calls.
///
/// Replies are filed by the conversation id captured at submit time, so the
/// user may switch conversations, or start a send elsewhere, while a request
/// is outstanding.
#[derive(Clone)]
pub struct ChatService {
    state: Arc<Mutex<ChatState>>,
    in_flight: InFlight,
    settings_repo: SettingsRepository,
    client: Arc<dyn CompletionClient>,
}

impl ChatService {
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Self, AppError> {
        let settings_repo = SettingsRepository::new(store.clone());
        let settings = settings_repo.load().await?;
        let conversations = ConversationStore::hydrate(ConversationRepository::new(store)).await?;
        info!(
            "Loaded {} conversations (api key configured: {})",
            conversations.list().len(),
            settings.has_api_key()
        );

        Ok(Self {
            state: Arc::new(Mutex::new(ChatState { store: conversations, settings })),
            in_flight: Arc::new(StdMutex::new(HashSet::new())),
            settings_repo,
            client,
        })
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.lock().await;
        ChatSnapshot {
            conversations: state.store.list().to_vec(),
            current_index: state.store.current_index(),
            is_sending: self.is_in_flight(state.store.current().id),
        }
    }

    pub async fn new_conversation(&self) -> Result<usize, AppError> {
        let mut state = self.state.lock().await;
        let index = state.store.create().await?;
        debug!("Started conversation at index {index}");
        Ok(index)
    }

    pub async fn switch_conversation(&self, index: usize) -> Result<(), AppError> {
        self.state.lock().await.store.switch_to(index)
    }

    pub async fn search(&self, query: &str) -> Vec<ConversationMatch> {
        self.state.lock().await.store.search(query)
    }

    pub async fn settings(&self) -> SettingsView {
        SettingsView::from(&self.state.lock().await.settings)
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        self.settings_repo.save_api_key(api_key).await?;
        state.settings.api_key = api_key.to_string();
        Ok(())
    }

    pub async fn set_system_instruction(&self, text: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        self.settings_repo.save_system_instruction(text).await?;
        state.settings.system_instruction = text.to_string();
        Ok(())
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<SettingsView, AppError> {
        if let Some(key) = update.api_key {
            self.set_api_key(key.trim()).await?;
        }
        if let Some(text) = update.system_instruction {
            self.set_system_instruction(&text).await?;
        }
        Ok(self.settings().await)
    }

    /// Sends `text` as the next user turn of the current conversation.
    ///
    /// API failures end up in the conversation, not in the `Err` arm; only a
    /// missing key or a storage failure is returned as an error.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, AppError> {
        if text.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        // ── Capture the conversation and file the user turn ──────────────────
        let (conversation_id, history, settings, _guard) = {
            let mut state = self.state.lock().await;
            let index = state.store.current_index();
            let conversation_id = state.store.current().id;

            if self.is_in_flight(conversation_id) {
                debug!("Send already in flight for conversation {conversation_id}");
                return Ok(SubmitOutcome::Ignored);
            }
            if !state.settings.has_api_key() {
                warn!("Submit refused: no API key configured");
                return Err(AppError::ConfigurationMissing);
            }

            state.store.append_message(index, Message::user(text)).await?;
            let guard = self.mark_in_flight(conversation_id);
            let history = state.store.list()[index].messages.clone();
            (conversation_id, history, state.settings.clone(), guard)
        };

        // ── Ask the model, without holding the state ─────────────────────────
        debug!("Submitting {} messages for conversation {conversation_id}", history.len());
        let result = self
            .client
            .complete(&history, &settings.system_instruction, &settings.api_key)
            .await;

        // ── File the outcome under the captured id ───────────────────────────
        let mut state = self.state.lock().await;
        let Some(index) = state.store.position(conversation_id) else {
            warn!("Conversation {conversation_id} vanished before its reply arrived");
            return Ok(SubmitOutcome::Ignored);
        };

        match result {
            Ok(reply) => {
                let assistant = Message::assistant(reply);
                state.store.append_message(index, assistant.clone()).await?;

                let conversation = &state.store.list()[index];
                let first_exchange =
                    conversation.messages.len() <= 2 && conversation.has_placeholder_title();
                let title_task = first_exchange.then(|| {
                    self.spawn_title(conversation_id, Message::user(text), assistant, settings.api_key)
                });

                Ok(SubmitOutcome::Replied { conversation_id, title_task })
            }
            Err(e) => {
                error!("Completion failed for conversation {conversation_id}: {e}");
                let error = e.to_string();
                state.store.append_message(index, Message::error(&error)).await?;
                Ok(SubmitOutcome::Failed { conversation_id, error })
            }
        }
    }

    /// Suggests a title in the background and writes it to `conversation_id`.
    fn spawn_title(
        &self,
        conversation_id: i64,
        user: Message,
        assistant: Message,
        api_key: String,
    ) -> JoinHandle<()> {
        let client = self.client.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let title = client.suggest_title(&user, &assistant, &api_key).await;
            let mut state = state.lock().await;
            let Some(index) = state.store.position(conversation_id) else {
                return;
            };
            debug!("Titling conversation {conversation_id}: {title}");
            if let Err(e) = state.store.rename_title(index, title).await {
                error!("Failed to store title for conversation {conversation_id}: {e}");
            }
        })
    }

    fn is_in_flight(&self, conversation_id: i64) -> bool {
        self.in_flight
            .lock()
            .map(|ids| ids.contains(&conversation_id))
            .unwrap_or(false)
    }

    fn mark_in_flight(&self, conversation_id: i64) -> SendingGuard {
        if let Ok(mut ids) = self.in_flight.lock() {
            ids.insert(conversation_id);
        }
        SendingGuard { in_flight: self.in_flight.clone(), conversation_id }
    }
}
