//! Ban, kick, report and role-gating tests through the engine.

mod common;

use chrono::Duration;

use chatzone::{
    BanDuration, ChatzoneError, KickOutcome, LoginError, ModerationError, NewModerator,
    PermissionError, ResolveAction, Role,
};
use common::{setup, t0};

#[tokio::test]
async fn test_ban_expires() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();

    let expiry = t
        .zone
        .ban(&mut admin, "eve", BanDuration::FifteenMinutes.minutes())
        .await
        .unwrap();
    assert_eq!(expiry, (t0() + Duration::minutes(15)).timestamp_millis());

    t.clock.advance(Duration::minutes(5));
    for nickname in ["eve", "EVE", " Eve "] {
        match t.zone.login(nickname, None, None).await {
            Err(ChatzoneError::Login(LoginError::Banned { expiry: e })) => assert_eq!(e, expiry),
            other => panic!("expected ban, got {other:?}"),
        }
    }

    t.clock.advance(Duration::minutes(11));
    let eve = t.zone.login("eve", None, None).await.unwrap();
    assert_eq!(eve.role(), Role::User);
}

#[tokio::test]
async fn test_ban_exactly_at_expiry() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone.ban(&mut admin, "eve", 15).await.unwrap();

    t.clock.advance(Duration::minutes(15) - Duration::milliseconds(1));
    assert!(t.zone.login("eve", None, None).await.is_err());

    t.clock.advance(Duration::milliseconds(1));
    assert!(t.zone.login("eve", None, None).await.is_ok());
}

#[tokio::test]
async fn test_ban_overwrites_and_unban_is_idempotent() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();

    t.zone.ban(&mut admin, "eve", 720).await.unwrap();
    let expiry = t.zone.ban(&mut admin, "eve", 15).await.unwrap();
    let bans = t.zone.list_bans(&admin).await.unwrap();
    assert_eq!(bans.len(), 1);
    assert_eq!(bans[0].expiry, expiry);

    assert!(t.zone.unban(&admin, "Eve").await.unwrap());
    assert!(!t.zone.unban(&admin, "Eve").await.unwrap());
    assert!(t.zone.list_bans(&admin).await.unwrap().is_empty());
    assert!(t.zone.login("eve", None, None).await.is_ok());
}

#[tokio::test]
async fn test_zero_minute_ban_rejected() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();
    let err = t.zone.ban(&mut admin, "eve", 0).await.unwrap_err();
    assert!(matches!(err, ChatzoneError::Validation(_)));
}

#[tokio::test]
async fn test_moderator_credential() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();
    let provisioned = t
        .zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw").with_color("#10b981"))
        .await
        .unwrap();

    let err = t.zone.login("mod1", None, Some("wrong")).await.unwrap_err();
    assert!(matches!(
        err,
        ChatzoneError::Login(LoginError::BadCredential)
    ));

    let session = t.zone.login("mod1", None, Some("pw")).await.unwrap();
    assert_eq!(session.role(), Role::Moderator);
    assert_eq!(session.identity().id, provisioned.id);
    assert_eq!(session.identity().color.as_deref(), Some("#10b981"));
}

#[tokio::test]
async fn test_revoked_moderator_keeps_live_session() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();
    let provisioned = t
        .zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw"))
        .await
        .unwrap();
    let moderator = t.zone.login("mod1", None, Some("pw")).await.unwrap();

    assert!(t.zone.revoke_moderator(&admin, &provisioned.id).await.unwrap());
    assert!(t.zone.list_moderators(&admin).await.unwrap().is_empty());

    // Still a moderator for this session
    assert!(t.zone.list_bans(&moderator).await.is_ok());

    // The next login is a plain user, credential or not
    let next = t.zone.login("mod1", None, None).await.unwrap();
    assert_eq!(next.role(), Role::User);
}

#[tokio::test]
async fn test_admin_credential_update() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone.update_admin_credential(&admin, "s3cret").await.unwrap();

    assert!(t.zone.login_as_admin("admin").await.is_err());
    assert!(t.zone.login_as_admin("s3cret").await.is_ok());
    // The existing session is untouched
    assert!(t.zone.list_bans(&admin).await.is_ok());
}

#[tokio::test]
async fn test_staff_cannot_act_on_admin() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw"))
        .await
        .unwrap();
    let mut moderator = t.zone.login("mod1", None, Some("pw")).await.unwrap();

    // Face to face, the administrator cannot be banned
    t.zone
        .open_direct_chat(&mut moderator, &admin.identity().id)
        .await
        .unwrap();
    let err = t.zone.ban(&mut moderator, "Admin", 15).await.unwrap_err();
    assert!(matches!(
        err,
        ChatzoneError::Permission(PermissionError::ProtectedTarget { .. })
    ));
    assert!(t.zone.list_bans(&admin).await.unwrap().is_empty());

    // A moderator cannot remove the administrator's messages
    t.zone.join_room(&mut admin, "general", None).await.unwrap();
    let msg = t.zone.send_message(&admin, "house rules").await.unwrap();
    let err = t
        .zone
        .delete_message(&moderator, "general", &msg.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatzoneError::Permission(_)));
    assert!(t.zone.delete_message(&admin, "general", &msg.id).await.unwrap());
}

#[tokio::test]
async fn test_ban_reaches_user_with_admin_nickname() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone.join_room(&mut admin, "general", None).await.unwrap();

    let impostor = t.zone.login("admin", None, None).await.unwrap();
    assert_eq!(impostor.role(), Role::User);

    t.zone.ban(&mut admin, "admin", 15).await.unwrap();
    assert!(matches!(
        t.zone.login("Admin", None, None).await,
        Err(ChatzoneError::Login(LoginError::Banned { .. }))
    ));

    // The administrator stays in the room and can still log in
    assert_eq!(admin.current_room(), Some("general"));
    assert!(t.zone.login_as_admin("admin").await.is_ok());
}

#[tokio::test]
async fn test_moderator_cannot_administer() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw"))
        .await
        .unwrap();
    let moderator = t.zone.login("mod1", None, Some("pw")).await.unwrap();

    assert!(t
        .zone
        .provision_moderator(&moderator, NewModerator::new("mod2", "pw"))
        .await
        .is_err());
    assert!(t.zone.update_admin_credential(&moderator, "x").await.is_err());
    assert!(t.zone.add_picture(&moderator, "https://example.com/a.png").await.is_err());
}

#[tokio::test]
async fn test_ban_kicks_present_user() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw"))
        .await
        .unwrap();
    let mut moderator = t.zone.login("mod1", None, Some("pw")).await.unwrap();
    let eve = t.zone.login("eve", None, None).await.unwrap();

    t.zone
        .open_direct_chat(&mut moderator, &eve.identity().id)
        .await
        .unwrap();
    assert!(moderator.present().unwrap().contains(&eve.identity().id));

    t.zone.ban(&mut moderator, "eve", 30).await.unwrap();
    let present = moderator.present().unwrap();
    assert!(!present.contains(&eve.identity().id));
    assert!(present.contains(&moderator.identity().id));
}

#[tokio::test]
async fn test_admin_kicks_bot_but_not_self() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone.join_room(&mut admin, "general", None).await.unwrap();

    let bot_id = chatzone::auth::BOT_ID;
    assert_eq!(t.zone.kick(&mut admin, bot_id).await.unwrap(), KickOutcome::Removed);
    assert_eq!(t.zone.kick(&mut admin, bot_id).await.unwrap(), KickOutcome::NotPresent);

    let own_id = admin.identity().id.clone();
    let err = t.zone.kick(&mut admin, &own_id).await.unwrap_err();
    // The administrator is a protected target, even for itself
    assert!(matches!(err, ChatzoneError::Permission(_)));
    assert_eq!(admin.current_room(), Some("general"));
}

#[tokio::test]
async fn test_moderator_kicking_self_leaves_room() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw"))
        .await
        .unwrap();
    let mut moderator = t.zone.login("mod1", None, Some("pw")).await.unwrap();
    t.zone.join_room(&mut moderator, "tech", None).await.unwrap();

    let own_id = moderator.identity().id.clone();
    assert_eq!(
        t.zone.kick(&mut moderator, &own_id).await.unwrap(),
        KickOutcome::RemovedSelf
    );
    assert!(moderator.current_room().is_none());
    assert!(moderator.present().is_none());
}

#[tokio::test]
async fn test_report_delete_exactly_once() {
    let t = setup().await;
    let mut alice = t.zone.login("alice", None, None).await.unwrap();
    let mut bob = t.zone.login("bob", None, None).await.unwrap();
    let admin = t.zone.login_as_admin("admin").await.unwrap();

    t.zone.join_room(&mut alice, "general", None).await.unwrap();
    t.zone.join_room(&mut bob, "general", None).await.unwrap();
    let msg = t.zone.send_message(&alice, "buy cheap stuff").await.unwrap();
    let keep = t.zone.send_message(&bob, "no thanks").await.unwrap();

    let report = t.zone.report_message(&bob, "general", &msg.id).await.unwrap();
    assert_eq!(t.zone.list_pending_reports(&admin).await.unwrap(), vec![report.clone()]);

    t.zone
        .resolve_report(&admin, &report.id, ResolveAction::Delete)
        .await
        .unwrap();
    let log = t.zone.messages("general").await;
    assert!(log.iter().all(|m| m.id != msg.id));
    assert!(log.iter().any(|m| m.id == keep.id));
    assert!(t.zone.list_pending_reports(&admin).await.unwrap().is_empty());

    let err = t
        .zone
        .resolve_report(&admin, &report.id, ResolveAction::Delete)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChatzoneError::Moderation(ModerationError::NotFound)
    ));
    assert_eq!(t.zone.messages("general").await, log);
}

#[tokio::test]
async fn test_report_cannot_delete_admin_message_for_moderator() {
    let t = setup().await;
    let mut admin = t.zone.login_as_admin("admin").await.unwrap();
    t.zone
        .provision_moderator(&admin, NewModerator::new("mod1", "pw"))
        .await
        .unwrap();
    let moderator = t.zone.login("mod1", None, Some("pw")).await.unwrap();
    let mut bob = t.zone.login("bob", None, None).await.unwrap();

    t.zone.join_room(&mut admin, "general", None).await.unwrap();
    t.zone.join_room(&mut bob, "general", None).await.unwrap();
    let msg = t.zone.send_message(&admin, "house rules").await.unwrap();

    // Anyone may report the administrator's message
    let report = t.zone.report_message(&bob, "general", &msg.id).await.unwrap();

    let err = t
        .zone
        .resolve_report(&moderator, &report.id, ResolveAction::Delete)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChatzoneError::Permission(PermissionError::ProtectedTarget { .. })
    ));
    assert!(t.zone.messages("general").await.contains(&msg));
    assert_eq!(
        t.zone.list_pending_reports(&moderator).await.unwrap(),
        vec![report.clone()]
    );

    t.zone
        .resolve_report(&admin, &report.id, ResolveAction::Delete)
        .await
        .unwrap();
    assert!(!t.zone.messages("general").await.contains(&msg));
}

#[tokio::test]
async fn test_report_rules() {
    let t = setup().await;
    let mut alice = t.zone.login("alice", None, None).await.unwrap();
    let mut bob = t.zone.login("bob", None, None).await.unwrap();

    t.zone.join_room(&mut alice, "general", None).await.unwrap();
    t.zone.join_room(&mut bob, "general", None).await.unwrap();
    let msg = t.zone.send_message(&alice, "hello").await.unwrap();
    let welcome = t.zone.messages("general").await[0].clone();
    assert!(welcome.author.is_bot());

    let err = t.zone.report_message(&alice, "general", &msg.id).await.unwrap_err();
    assert!(matches!(
        err,
        ChatzoneError::Moderation(ModerationError::OwnMessage)
    ));

    let err = t
        .zone
        .report_message(&bob, "general", &welcome.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChatzoneError::Moderation(ModerationError::AutomatedMessage)
    ));

    let err = t
        .zone
        .report_message(&bob, "tech", &msg.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatzoneError::NotFound(_)));

    // Users cannot resolve their own reports
    let report = t.zone.report_message(&bob, "general", &msg.id).await.unwrap();
    assert!(t
        .zone
        .resolve_report(&bob, &report.id, ResolveAction::Dismiss)
        .await
        .is_err());
}

#[tokio::test]
async fn test_gallery_management() {
    let t = setup().await;
    let admin = t.zone.login_as_admin("admin").await.unwrap();

    assert!(t.zone.add_picture(&admin, "https://example.com/cat.png").await.unwrap());
    assert!(!t.zone.add_picture(&admin, "https://example.com/cat.png").await.unwrap());

    let gallery = t.zone.gallery().await;
    assert_eq!(gallery.len(), 2);
    assert_eq!(gallery[0], chatzone::auth::DEFAULT_PROFILE_PICTURE);

    assert!(t.zone.remove_picture(&admin, "https://example.com/cat.png").await.unwrap());
    assert!(!t.zone.remove_picture(&admin, "https://example.com/cat.png").await.unwrap());
    assert_eq!(t.zone.gallery().await.len(), 1);
}
