//! ChatZone engine.
//!
//! [`ChatZone`] wires the stores together and is the only entry point for
//! session operations. Every privileged operation passes through
//! [`authorize`] before touching a store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use crate::auth::{
    authorize, Action, BanRecord, CredentialStore, Gallery, Identity, NewModerator,
    PermissionError, Role, DEFAULT_PROFILE_PICTURE,
};
use crate::bot::{GeminiReplyGenerator, ReplyGenerator, ReplyJob, ReplyWorker};
use crate::chat::{
    KickOutcome, MembershipTracker, Message, MessageStore, PresentSet, Room, RoomRegistry,
    StoreEvent, Visibility, MAX_MESSAGE_LENGTH,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::Database;
use crate::moderation::{Report, ReportQueue, ResolveAction};
use crate::{ChatzoneError, Result};

/// One connected session.
///
/// The identity and its role are fixed for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
    current_room: Option<String>,
    present: Option<PresentSet>,
}

impl Session {
    fn new(identity: Identity) -> Self {
        Self {
            identity,
            current_room: None,
            present: None,
        }
    }

    /// Identity of this session.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Role of this session.
    pub fn role(&self) -> Role {
        self.identity.role
    }

    /// ID of the active room.
    pub fn current_room(&self) -> Option<&str> {
        self.current_room.as_deref()
    }

    /// Who is present in the active room.
    pub fn present(&self) -> Option<&PresentSet> {
        self.present.as_ref()
    }

    fn leave(&mut self) {
        self.current_room = None;
        self.present = None;
    }
}

/// The chat engine.
pub struct ChatZone {
    clock: Arc<dyn Clock>,
    timezone: String,
    credentials: CredentialStore,
    gallery: Gallery,
    rooms: RoomRegistry,
    messages: Arc<MessageStore>,
    presence: MembershipTracker,
    reports: ReportQueue,
    worker: Option<ReplyWorker>,
    history_limit: usize,
}

impl ChatZone {
    /// Open the engine on the configured database with the wall clock and
    /// the Gemini reply generator.
    ///
    /// Fails if the durable store cannot be opened or loaded.
    pub async fn open(config: &Config) -> Result<Self> {
        let db = Arc::new(Database::open(&config.database.path).await?);
        let generator = Arc::new(GeminiReplyGenerator::new(&config.bot)?);
        Self::with_parts(db, Arc::new(SystemClock), generator, config).await
    }

    /// Assemble the engine from explicit parts.
    ///
    /// Must run inside a tokio runtime; the reply worker is spawned here when
    /// the bot is enabled.
    pub async fn with_parts(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn ReplyGenerator>,
        config: &Config,
    ) -> Result<Self> {
        let retention = config.rooms.retention();

        let credentials = CredentialStore::load(db.clone(), clock.clone(), &config.admin).await?;
        let gallery = Gallery::load(db.clone()).await?;
        let messages = Arc::new(MessageStore::load(db.clone(), clock.clone(), retention).await?);
        let reports = ReportQueue::load(db, clock.clone()).await?;
        let rooms = RoomRegistry::with_defaults(&config.rooms.defaults);

        let worker = config.bot.enabled.then(|| {
            ReplyWorker::spawn(
                messages.clone(),
                clock.clone(),
                generator,
                Duration::from_millis(config.bot.reply_delay_ms),
            )
        });

        info!(
            "ChatZone engine ready ({} rooms, bot {})",
            rooms.room_count().await,
            if worker.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            clock,
            timezone: config.server.timezone.clone(),
            credentials,
            gallery,
            rooms,
            messages,
            presence: MembershipTracker::new(),
            reports,
            worker,
            history_limit: config.bot.history_limit,
        })
    }

    /// Timezone used for user-facing times.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Subscribe to message appends and deletions in every room.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.messages.subscribe()
    }

    /// Stop the reply worker, waiting for queued replies.
    pub async fn shutdown(&self) {
        if let Some(worker) = &self.worker {
            worker.shutdown().await;
        }
        info!("ChatZone engine stopped");
    }

    /// Start a session. Moderator nicknames must present their credential.
    pub async fn login(
        &self,
        nickname: &str,
        profile_picture: Option<&str>,
        credential: Option<&str>,
    ) -> Result<Session> {
        let picture = profile_picture.unwrap_or(DEFAULT_PROFILE_PICTURE);
        let identity = self.credentials.login(nickname, picture, credential).await?;
        self.presence.register(&identity).await;
        Ok(Session::new(identity))
    }

    /// Start an administrator session.
    pub async fn login_as_admin(&self, credential: &str) -> Result<Session> {
        let identity = self.credentials.login_as_admin(credential).await?;
        self.presence.register(&identity).await;
        Ok(Session::new(identity))
    }

    /// End a session.
    pub async fn logout(&self, mut session: Session) {
        session.leave();
        self.presence.forget(&session.identity.id).await;
        info!(id = %session.identity.id, nickname = %session.identity.nickname, "Logged out");
    }

    /// Rooms the session can see.
    pub async fn list_rooms(&self, session: &Session) -> Vec<Room> {
        self.rooms.list_visible(&session.identity).await
    }

    /// Enter a room and make it the session's active room.
    ///
    /// The first visit to a room without a log posts a welcome message from
    /// the automated participant.
    pub async fn join_room(
        &self,
        session: &mut Session,
        room_id: &str,
        password: Option<&str>,
    ) -> Result<Room> {
        let room = self
            .rooms
            .get(room_id)
            .await
            .ok_or_else(|| ChatzoneError::NotFound("room".to_string()))?;
        let room = self
            .rooms
            .join_room(&room, &session.identity, password)
            .await?;

        let present = self.presence.activate(&room, &session.identity).await;
        let welcome = if room.is_direct_message {
            let partner = present
                .members()
                .iter()
                .find(|m| m.id != session.identity.id)
                .map(|m| m.nickname.clone())
                .unwrap_or_else(|| room.name.clone());
            format!("Started a private chat with {partner}.")
        } else {
            format!("Welcome {} to {}!", session.identity.nickname, room.name)
        };
        let welcome = Message::new(Identity::bot(), welcome, self.clock.now());
        self.messages.start_log(&room.id, welcome).await?;

        session.current_room = Some(room.id.clone());
        session.present = Some(present);
        info!(room_id = %room.id, nickname = %session.identity.nickname, "Joined room");
        Ok(room)
    }

    /// Leave the active room.
    pub fn leave_room(&self, session: &mut Session) {
        session.leave();
    }

    /// Open the direct chat with a logged-in partner and enter it.
    pub async fn open_direct_chat(&self, session: &mut Session, partner_id: &str) -> Result<Room> {
        let partner = self
            .presence
            .lookup(partner_id)
            .await
            .ok_or_else(|| ChatzoneError::NotFound("user".to_string()))?;
        let room = self
            .rooms
            .open_or_create_direct_chat(&session.identity, &partner)
            .await?;
        self.join_room(session, &room.id, None).await
    }

    /// Create a shared room. Admin only.
    pub async fn create_room(
        &self,
        session: &Session,
        name: &str,
        visibility: Visibility,
        password: Option<&str>,
        color: Option<&str>,
    ) -> Result<Room> {
        authorize(session.role(), Action::CreateRoom, None)?;
        self.rooms.create_room(name, visibility, password, color).await
    }

    /// Post a message to the active room.
    ///
    /// Returns once the message is stored. In shared rooms an automated
    /// reply is queued and appended later.
    pub async fn send_message(&self, session: &Session, text: &str) -> Result<Message> {
        let room_id = session
            .current_room
            .as_deref()
            .ok_or(PermissionError::NotInRoom)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatzoneError::Validation("message is empty".to_string()));
        }
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatzoneError::Validation(format!(
                "message exceeds {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        let message = Message::new(session.identity.clone(), text, self.clock.now());
        self.messages.append(room_id, message.clone()).await?;

        if let Some(worker) = &self.worker {
            let is_direct = self
                .rooms
                .get(room_id)
                .await
                .map_or(false, |r| r.is_direct_message);
            if !is_direct {
                let history = self
                    .messages
                    .history_until(room_id, &message.id, self.history_limit)
                    .await;
                worker
                    .submit(ReplyJob {
                        room_id: room_id.to_string(),
                        history,
                    })
                    .await;
            }
        }

        Ok(message)
    }

    /// Messages of a room, oldest first.
    pub async fn messages(&self, room_id: &str) -> Vec<Message> {
        self.messages.read(room_id).await
    }

    /// Delete a message. Moderators cannot delete the administrator's.
    pub async fn delete_message(
        &self,
        session: &Session,
        room_id: &str,
        message_id: &str,
    ) -> Result<bool> {
        let target = self
            .messages
            .read(room_id)
            .await
            .into_iter()
            .find(|m| m.id == message_id)
            .map(|m| m.author.role);
        authorize(session.role(), Action::DeleteMessage, target)?;

        let removed = self.messages.delete(room_id, message_id).await?;
        if removed {
            info!(room_id = %room_id, message_id = %message_id, by = %session.identity.nickname, "Message deleted");
        }
        Ok(removed)
    }

    /// Remove someone from the session's present set.
    ///
    /// Kicking oneself leaves the room.
    pub async fn kick(&self, session: &mut Session, user_id: &str) -> Result<KickOutcome> {
        let present = session.present.as_mut().ok_or(PermissionError::NotInRoom)?;
        let target = present
            .members()
            .iter()
            .find(|m| m.id == user_id)
            .map(|m| m.role);
        authorize(session.identity.role, Action::Kick, target)?;

        let outcome = present.kick(user_id);
        if outcome == KickOutcome::RemovedSelf {
            session.leave();
        }
        if outcome != KickOutcome::NotPresent {
            info!(user_id = %user_id, by = %session.identity.nickname, "Kicked");
        }
        Ok(outcome)
    }

    /// Ban a nickname for `minutes`, then kick its holder if present.
    ///
    /// Returns the expiry in epoch milliseconds.
    ///
    /// The target's role comes from the identity carrying the nickname: a
    /// present member other than the actor, else the moderator roster, else
    /// a plain user. The administrator never passes a ban check at login, so
    /// a ban on the admin's nickname only reaches plain users using it.
    pub async fn ban(&self, session: &mut Session, nickname: &str, minutes: u32) -> Result<i64> {
        let present = session
            .present
            .as_ref()
            .and_then(|p| p.find_by_nickname(nickname))
            .filter(|m| m.id != session.identity.id)
            .map(|m| (m.id.clone(), m.role));
        let target = match &present {
            Some((_, role)) => *role,
            None => self.credentials.role_of_nickname(nickname).await,
        };
        authorize(session.role(), Action::Ban, Some(target))?;

        let expiry = self.credentials.bans().ban(nickname, minutes).await?;

        if let Some((id, _)) = present {
            self.kick(session, &id).await?;
        }
        Ok(expiry)
    }

    /// Lift a ban. Idempotent.
    pub async fn unban(&self, session: &Session, nickname: &str) -> Result<bool> {
        authorize(session.role(), Action::Unban, None)?;
        self.credentials.bans().unban(nickname).await
    }

    /// Active bans.
    pub async fn list_bans(&self, session: &Session) -> Result<Vec<BanRecord>> {
        authorize(session.role(), Action::ViewBans, None)?;
        Ok(self.credentials.bans().list().await)
    }

    /// Report a message in `room_id`.
    pub async fn report_message(
        &self,
        session: &Session,
        room_id: &str,
        message_id: &str,
    ) -> Result<Report> {
        let message = self
            .messages
            .read(room_id)
            .await
            .into_iter()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ChatzoneError::NotFound("message".to_string()))?;
        authorize(session.role(), Action::ReportMessage, Some(message.author.role))?;
        self.reports.report(&message, &session.identity).await
    }

    /// Resolve a pending report.
    ///
    /// Deleting through a report is held to the same rule as deleting
    /// directly: only the administrator removes the administrator's messages.
    pub async fn resolve_report(
        &self,
        session: &Session,
        report_id: &str,
        action: ResolveAction,
    ) -> Result<()> {
        authorize(session.role(), Action::ResolveReport, None)?;
        if action == ResolveAction::Delete {
            let author = self
                .reports
                .pending(report_id)
                .await
                .map(|r| r.message.author.role);
            authorize(session.role(), Action::ResolveReport, author)?;
        }
        self.reports.resolve(report_id, action, &self.messages).await
    }

    /// Pending reports, oldest first.
    pub async fn list_pending_reports(&self, session: &Session) -> Result<Vec<Report>> {
        authorize(session.role(), Action::ViewReports, None)?;
        Ok(self.reports.list_pending().await)
    }

    /// Add a moderator to the roster.
    pub async fn provision_moderator(
        &self,
        session: &Session,
        moderator: NewModerator,
    ) -> Result<Identity> {
        authorize(session.role(), Action::ManageModerators, None)?;
        self.credentials.roster().provision(moderator).await
    }

    /// Remove a moderator. Their live sessions keep the role.
    pub async fn revoke_moderator(&self, session: &Session, id: &str) -> Result<bool> {
        authorize(session.role(), Action::ManageModerators, None)?;
        self.credentials.roster().revoke(id).await
    }

    /// Provisioned moderators.
    pub async fn list_moderators(&self, session: &Session) -> Result<Vec<Identity>> {
        authorize(session.role(), Action::ManageModerators, None)?;
        Ok(self.credentials.roster().list().await)
    }

    /// Replace the administrator credential.
    pub async fn update_admin_credential(&self, session: &Session, credential: &str) -> Result<()> {
        authorize(session.role(), Action::UpdateAdminCredential, None)?;
        self.credentials.update_admin_credential(credential).await
    }

    /// Profile pictures offered at login, default first.
    pub async fn gallery(&self) -> Vec<String> {
        self.gallery.list().await
    }

    /// Add a picture to the gallery.
    pub async fn add_picture(&self, session: &Session, url: &str) -> Result<bool> {
        authorize(session.role(), Action::ManageGallery, None)?;
        self.gallery.add(url).await
    }

    /// Remove a picture from the gallery.
    pub async fn remove_picture(&self, session: &Session, url: &str) -> Result<bool> {
        authorize(session.role(), Action::ManageGallery, None)?;
        self.gallery.remove(url).await
    }
}
