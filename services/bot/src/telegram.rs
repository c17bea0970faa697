//! Telegram Bot API transport: outbound calls for the board's [`Messenger`]
//! seam and a long-poll loop feeding updates into the [`Dispatcher`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use job_board::board::{
    BoardStore, ChatId, Dispatcher, Event, EventPayload, FileKind, IncomingFile, Keyboard,
    MediaKind, MessageRef, Messenger, TransportError, UserId,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);
const REQUEST_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatInfo {
    username: Option<String>,
}

pub(crate) struct TelegramClient {
    http: reqwest::Client,
    methods_url: String,
    files_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub(crate) fn new(
        api_url: &str,
        token: &str,
        poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + REQUEST_GRACE)
            .build()
            .map_err(request_error)?;

        Ok(Self {
            http,
            methods_url: format!("{api_url}/bot{token}"),
            files_url: format!("{api_url}/file/bot{token}"),
            poll_timeout,
        })
    }

    async fn call<T>(&self, method: &str, body: Value) -> Result<T, TransportError>
    where
        T: DeserializeOwned + Send,
    {
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{method}", self.methods_url))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?
            .json()
            .await
            .map_err(request_error)?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TransportError::Rejected(
                description.unwrap_or_else(|| format!("{method} returned no result")),
            )),
        }
    }

    async fn updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": self.poll_timeout.as_secs(),
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    /// Stops the client-side spinner on the tapped button.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.call::<Value>(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_id }),
        )
        .await
        .map(|_| ())
    }
}

impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let body = with_markup(json!({ "chat_id": chat.0, "text": text }), keyboard)?;
        let sent: SentMessage = self.call("sendMessage", body).await?;
        Ok(MessageRef {
            chat,
            message_id: sent.message_id,
        })
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let body = with_markup(
            json!({
                "chat_id": message.chat.0,
                "message_id": message.message_id,
                "text": text,
            }),
            keyboard,
        )?;
        // result is the edited message, or `true` for inline messages
        self.call::<Value>("editMessageText", body).await.map(|_| ())
    }

    async fn send_media(
        &self,
        chat: ChatId,
        kind: MediaKind,
        file_id: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        let (method, field) = match kind {
            MediaKind::Photo => ("sendPhoto", "photo"),
            MediaKind::Document => ("sendDocument", "document"),
        };
        let body = json!({ "chat_id": chat.0, field: file_id, "caption": caption });
        self.call::<Value>(method, body).await.map(|_| ())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let remote: RemoteFile = self.call("getFile", json!({ "file_id": file_id })).await?;
        let path = remote.file_path.ok_or_else(|| {
            TransportError::Rejected(format!("file {file_id} is not available for download"))
        })?;

        let bytes = self
            .http
            .get(format!("{}/{path}", self.files_url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(request_error)?
            .bytes()
            .await
            .map_err(request_error)?;
        Ok(bytes.to_vec())
    }

    async fn contact_handle(&self, user: UserId) -> Result<Option<String>, TransportError> {
        let chat: ChatInfo = self.call("getChat", json!({ "chat_id": user.0 })).await?;
        Ok(chat.username)
    }
}

fn with_markup(mut body: Value, keyboard: Option<&Keyboard>) -> Result<Value, TransportError> {
    if let Some(keyboard) = keyboard {
        body["reply_markup"] = serde_json::to_value(keyboard)
            .map_err(|err| TransportError::Request(err.to_string()))?;
    }
    Ok(body)
}

/// The bot token is part of every URL, so it is stripped from errors.
fn request_error(err: reqwest::Error) -> TransportError {
    TransportError::Request(err.without_url().to_string())
}

#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    update_id: i64,
    message: Option<IncomingMessage>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    message_id: i64,
    chat: Chat,
    from: Option<Sender>,
    text: Option<String>,
    document: Option<Document>,
    photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Sender {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    file_id: String,
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: Sender,
    message: Option<IncomingMessage>,
    data: Option<String>,
}

/// A board event plus the callback query to acknowledge, if any.
#[derive(Debug)]
pub(crate) struct Inbound {
    pub(crate) event: Event,
    pub(crate) callback_id: Option<String>,
}

impl Update {
    /// `None` for updates without a sender, such as channel posts.
    pub(crate) fn into_inbound(self) -> Option<Inbound> {
        if let Some(query) = self.callback_query {
            let origin = query.message.as_ref().map(|message| MessageRef {
                chat: ChatId(message.chat.id),
                message_id: message.message_id,
            });
            return Some(Inbound {
                event: Event {
                    sender: UserId(query.from.id),
                    username: query.from.username,
                    origin,
                    payload: EventPayload::Callback {
                        data: query.data.unwrap_or_default(),
                    },
                },
                callback_id: Some(query.id),
            });
        }

        let mut message = self.message?;
        let sender = message.from.take()?;
        Some(Inbound {
            event: Event {
                sender: UserId(sender.id),
                username: sender.username,
                origin: None,
                payload: message.into_payload(),
            },
            callback_id: None,
        })
    }
}

impl IncomingMessage {
    fn into_payload(self) -> EventPayload {
        if let Some(text) = self.text {
            return command_or_text(text);
        }
        if let Some(document) = self.document {
            return EventPayload::File(IncomingFile {
                file_id: document.file_id,
                file_name: document.file_name,
                kind: FileKind::Document,
            });
        }
        // sizes are ascending; keep the largest
        if let Some(photo) = self.photo.and_then(|sizes| sizes.into_iter().last()) {
            return EventPayload::File(IncomingFile {
                file_id: photo.file_id,
                file_name: None,
                kind: FileKind::Photo,
            });
        }
        EventPayload::Unsupported
    }
}

fn command_or_text(text: String) -> EventPayload {
    match text.split_whitespace().next() {
        Some(token) if is_command(token, "start") => EventPayload::Start,
        Some(token) if is_command(token, "menu") => EventPayload::Menu,
        _ => EventPayload::Text { text },
    }
}

/// Matches `/name` and the group form `/name@botname`.
fn is_command(token: &str, name: &str) -> bool {
    token
        .strip_prefix('/')
        .and_then(|rest| rest.split('@').next())
        .is_some_and(|command| command == name)
}

/// Long-poll for updates forever. Each event runs in its own task; failed
/// polls are retried after a fixed delay.
/// Feeds each user's updates to a task of their own, so one user's events are
/// handled in arrival order while different users proceed in parallel.
struct UserLanes<F> {
    lanes: HashMap<UserId, mpsc::UnboundedSender<Inbound>>,
    handler: F,
}

impl<F, Fut> UserLanes<F>
where
    F: Fn(Inbound) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn new(handler: F) -> Self {
        Self {
            lanes: HashMap::new(),
            handler,
        }
    }

    fn push(&mut self, inbound: Inbound) {
        let user = inbound.event.sender;
        let inbound = match self.lanes.get(&user) {
            Some(lane) => match lane.send(inbound) {
                Ok(()) => return,
                // The lane's task is gone; start a fresh one.
                Err(mpsc::error::SendError(inbound)) => inbound,
            },
            None => inbound,
        };

        let (lane, mut queue) = mpsc::unbounded_channel::<Inbound>();
        let handler = self.handler.clone();
        tokio::spawn(async move {
            while let Some(inbound) = queue.recv().await {
                handler(inbound).await;
            }
        });
        if lane.send(inbound).is_err() {
            warn!(%user, "update lane closed before the first update");
        }
        self.lanes.insert(user, lane);
    }
}

pub(crate) async fn run_polling<S>(
    client: Arc<TelegramClient>,
    dispatcher: Dispatcher<S, TelegramClient>,
) where
    S: BoardStore + 'static,
{
    info!(
        timeout_secs = client.poll_timeout.as_secs(),
        "telegram polling started"
    );
    let mut offset = 0_i64;
    let mut lanes = {
        let client = Arc::clone(&client);
        UserLanes::new(move |inbound: Inbound| {
            let client = Arc::clone(&client);
            let dispatcher = dispatcher.clone();
            async move {
                if let Some(callback_id) = inbound.callback_id {
                    if let Err(err) = client.answer_callback(&callback_id).await {
                        debug!(error = %err, "callback acknowledgement failed");
                    }
                }
                dispatcher.handle(inbound.event).await;
            }
        })
    };

    loop {
        let updates = match client.updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = %err, "telegram polling failed; retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let update_id = update.update_id;
            let Some(inbound) = update.into_inbound() else {
                debug!(update_id, "skipping update without a sender");
                continue;
            };
            lanes.push(inbound);
        }
    }
}
