//! What the profile page does, kept apart from how Yew renders it.
//!
//! Every operation returns a value describing the result (next phase,
//! notice to show, gallery to apply, route to visit) instead of touching
//! the DOM, so the page component only has to forward these into its state.

use std::cell::Cell;
use std::rc::Rc;

use crate::models::{ImageRecord, Notice, UserRecord};
use crate::services::api::ProfileApi;
use crate::services::session::Session;
use crate::services::storage::KeyValueStore;
use crate::Route;

pub const LOGIN_REQUIRED: &str = "로그인이 필요합니다.";
pub const USER_INFO_FAILED: &str = "유저 정보 요청 중 오류가 발생했습니다.";
pub const SIGNED_OUT: &str = "로그인 후 다시 시도해 주세요.";
pub const UPLOAD_SUCCEEDED: &str = "이미지 업로드 성공";
pub const UPLOAD_FAILED: &str = "이미지 업로드 실패: ";
pub const DELETE_SUCCEEDED: &str = "이미지 삭제 성공";
pub const DELETE_FAILED: &str = "이미지 삭제 실패: ";
pub const PASSWORD_FIELDS_REQUIRED: &str = "모든 필드를 입력하세요.";
pub const PASSWORD_CHANGED: &str = "비밀번호가 변경되었습니다.";
pub const PASSWORD_REJECTED: &str = "비밀번호 변경에 실패했습니다.";
pub const PASSWORD_ERROR: &str = "비밀번호 변경 중 오류가 발생했습니다.";

/// Coarse page lifecycle; exactly one applies at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum PagePhase {
    Loading,
    SignedOut,
    Failed(String),
    Ready(UserRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Proceed { token: String, cached: UserRecord },
    Redirect { notice: Notice, to: Route },
}

/// Cleared when the owning page is destroyed. Async work checks it before
/// writing to the session or handing results back.
#[derive(Debug, Clone)]
pub struct Lifetime(Rc<Cell<bool>>);

impl Default for Lifetime {
    fn default() -> Self {
        Self(Rc::new(Cell::new(true)))
    }
}

impl Lifetime {
    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn end(&self) {
        self.0.set(false);
    }
}

/// Orders gallery refreshes: only the most recently issued one may be applied.
#[derive(Debug, Clone, Default)]
pub struct RefreshTickets(Rc<Cell<u64>>);

impl RefreshTickets {
    pub fn issue(&self) -> u64 {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.get() == ticket
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryRefresh {
    pub ticket: u64,
    /// `None` when the list could not be fetched; the gallery stays as is.
    pub images: Option<Vec<ImageRecord>>,
}

/// Result of an upload or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Nothing to send, no request made.
    Skipped,
    Succeeded {
        notice: Notice,
        refresh: GalleryRefresh,
    },
    Rejected {
        notice: Notice,
    },
    /// Transport failure, logged only.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PasswordOutcome {
    Incomplete(Notice),
    Changed(Notice),
    Rejected(Notice),
    Failed(Notice),
}

impl PasswordOutcome {
    pub fn notice(&self) -> &Notice {
        match self {
            PasswordOutcome::Incomplete(n)
            | PasswordOutcome::Changed(n)
            | PasswordOutcome::Rejected(n)
            | PasswordOutcome::Failed(n) => n,
        }
    }

    pub fn clears_form(&self) -> bool {
        matches!(self, PasswordOutcome::Changed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordForm {
    pub current: String,
    pub new: String,
}

impl PasswordForm {
    pub fn is_complete(&self) -> bool {
        !self.current.is_empty() && !self.new.is_empty()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.new.clear();
    }
}

/// Lets the page through only with both a token and a cached user.
pub fn guard<S: KeyValueStore>(session: &Session<S>) -> GuardOutcome {
    match (session.token(), session.cached_user()) {
        (Some(token), Some(cached)) => GuardOutcome::Proceed { token, cached },
        _ => {
            log::info!("no stored session, redirecting to login");
            GuardOutcome::Redirect {
                notice: Notice::error(LOGIN_REQUIRED),
                to: Route::Login,
            }
        }
    }
}

/// Fetches the current user and refreshes the cached copy.
pub async fn load_user<A, S>(
    api: &A,
    session: &Session<S>,
    token: &str,
    lifetime: &Lifetime,
) -> PagePhase
where
    A: ProfileApi + ?Sized,
    S: KeyValueStore,
{
    match api.fetch_current_user(token).await {
        Ok(user) => {
            if !lifetime.is_alive() {
                log::debug!("page gone before user info arrived, not caching");
                return PagePhase::Ready(user);
            }
            if let Err(e) = session.store_user(&user) {
                log::warn!("could not cache user info: {}", e);
            }
            PagePhase::Ready(user)
        }
        Err(e) => {
            log::error!("{} {}", USER_INFO_FAILED, e);
            PagePhase::Failed(USER_INFO_FAILED.to_string())
        }
    }
}

/// Fetches the owner's images under a fresh ticket.
pub async fn refresh_gallery<A>(api: &A, owner_id: &str, tickets: &RefreshTickets) -> GalleryRefresh
where
    A: ProfileApi + ?Sized,
{
    let ticket = tickets.issue();
    let images = match api.list_images(owner_id).await {
        Ok(list) if list.is_success => Some(list.images),
        Ok(_) => {
            log::error!("image list request was not successful");
            None
        }
        Err(e) => {
            log::error!("error fetching images: {}", e);
            None
        }
    };
    GalleryRefresh { ticket, images }
}

pub async fn upload<A>(
    api: &A,
    owner_id: Option<&str>,
    file: Option<&A::File>,
    tickets: &RefreshTickets,
) -> ActionOutcome
where
    A: ProfileApi + ?Sized,
{
    let (owner_id, file) = match (owner_id, file) {
        (Some(owner_id), Some(file)) => (owner_id, file),
        (None, Some(_)) => {
            log::warn!("upload skipped, user has no id");
            return ActionOutcome::Skipped;
        }
        _ => return ActionOutcome::Skipped,
    };
    match api.upload_image(owner_id, file).await {
        Ok(reply) if reply.is_success => ActionOutcome::Succeeded {
            notice: Notice::info(UPLOAD_SUCCEEDED),
            refresh: refresh_gallery(api, owner_id, tickets).await,
        },
        Ok(reply) => ActionOutcome::Rejected {
            notice: Notice::error(format!("{}{}", UPLOAD_FAILED, reply.message_or_empty())),
        },
        Err(e) => {
            log::error!("error uploading image: {}", e);
            ActionOutcome::Failed
        }
    }
}

pub async fn delete<A>(
    api: &A,
    owner_id: Option<&str>,
    image_url: &str,
    tickets: &RefreshTickets,
) -> ActionOutcome
where
    A: ProfileApi + ?Sized,
{
    let owner_id = match owner_id {
        Some(owner_id) => owner_id,
        None => {
            log::warn!("delete skipped, user has no id");
            return ActionOutcome::Skipped;
        }
    };
    match api.delete_image(owner_id, image_url).await {
        Ok(reply) if reply.is_success => ActionOutcome::Succeeded {
            notice: Notice::info(DELETE_SUCCEEDED),
            refresh: refresh_gallery(api, owner_id, tickets).await,
        },
        Ok(reply) => ActionOutcome::Rejected {
            notice: Notice::error(format!("{}{}", DELETE_FAILED, reply.message_or_empty())),
        },
        Err(e) => {
            log::error!("error deleting image: {}", e);
            ActionOutcome::Failed
        }
    }
}

/// Uses the token currently in the session, not the one seen at mount.
pub async fn change_password<A, S>(
    api: &A,
    session: &Session<S>,
    form: &PasswordForm,
) -> PasswordOutcome
where
    A: ProfileApi + ?Sized,
    S: KeyValueStore,
{
    if !form.is_complete() {
        return PasswordOutcome::Incomplete(Notice::error(PASSWORD_FIELDS_REQUIRED));
    }
    let token = match session.token() {
        Some(token) => token,
        None => {
            log::error!("{} no session token", PASSWORD_ERROR);
            return PasswordOutcome::Failed(Notice::error(PASSWORD_ERROR));
        }
    };
    match api.change_password(&form.current, &form.new, &token).await {
        Ok(reply) if reply.is_success => PasswordOutcome::Changed(Notice::info(PASSWORD_CHANGED)),
        Ok(_) => PasswordOutcome::Rejected(Notice::error(PASSWORD_REJECTED)),
        Err(e) => {
            log::error!("{} {}", PASSWORD_ERROR, e);
            PasswordOutcome::Failed(Notice::error(PASSWORD_ERROR))
        }
    }
}

/// Forgets the session and names where to go next.
pub fn logout<S: KeyValueStore>(session: &Session<S>) -> Route {
    if let Err(e) = session.clear() {
        log::error!("could not clear session: {}", e);
    }
    Route::Login
}

/// Whether a freshly loaded user moves the gallery to a different owner.
pub fn owner_changed(current: Option<&str>, fresh: &UserRecord) -> bool {
    match fresh.owner_id() {
        Some(id) => current != Some(id),
        None => false,
    }
}

/// Drops the pending selection only if it is still the file that was sent.
pub fn release_uploaded<F: PartialEq>(pending: &mut Option<F>, uploaded: &F) {
    if pending.as_ref() == Some(uploaded) {
        *pending = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use async_trait::async_trait;
    use futures::executor::block_on;

    use super::*;
    use crate::error::ApiError;
    use crate::models::{ApiReply, ImageId, ImageList};
    use crate::services::session::{TOKEN_KEY, USER_KEY};
    use crate::services::storage::MemoryStorage;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        FetchUser(String),
        ChangePassword(String, String, String),
        ListImages(String),
        Upload(String, String),
        Delete(String, String),
    }

    /// Records every call and answers from canned results.
    #[derive(Default)]
    struct FakeApi {
        calls: RefCell<Vec<Call>>,
        user: Option<UserRecord>,
        images: Option<ImageList>,
        reply: Option<ApiReply>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }

        fn reply(&self) -> Result<ApiReply, ApiError> {
            self.reply
                .clone()
                .ok_or_else(|| ApiError::Network("connection refused".into()))
        }
    }

    #[async_trait(?Send)]
    impl ProfileApi for FakeApi {
        type File = String;

        async fn fetch_current_user(&self, token: &str) -> Result<UserRecord, ApiError> {
            self.calls.borrow_mut().push(Call::FetchUser(token.into()));
            self.user.clone().ok_or(ApiError::Status {
                status: 401,
                message: "Unauthorized".into(),
            })
        }

        async fn change_password(
            &self,
            current: &str,
            new: &str,
            token: &str,
        ) -> Result<ApiReply, ApiError> {
            self.calls
                .borrow_mut()
                .push(Call::ChangePassword(current.into(), new.into(), token.into()));
            self.reply()
        }

        async fn list_images(&self, user_id: &str) -> Result<ImageList, ApiError> {
            self.calls.borrow_mut().push(Call::ListImages(user_id.into()));
            self.images
                .clone()
                .ok_or_else(|| ApiError::Network("connection refused".into()))
        }

        async fn upload_image(&self, user_id: &str, file: &Self::File) -> Result<ApiReply, ApiError> {
            self.calls
                .borrow_mut()
                .push(Call::Upload(user_id.into(), file.clone()));
            self.reply()
        }

        async fn delete_image(&self, user_id: &str, image_url: &str) -> Result<ApiReply, ApiError> {
            self.calls
                .borrow_mut()
                .push(Call::Delete(user_id.into(), image_url.into()));
            self.reply()
        }
    }

    fn kim() -> UserRecord {
        UserRecord {
            user_id: Some("kim01".into()),
            name: Some("Kim".into()),
            coin: Some(42.0),
        }
    }

    fn image(id: i64, url: &str) -> ImageRecord {
        ImageRecord {
            id: ImageId::Number(id),
            image_url: url.into(),
        }
    }

    fn gallery(images: Vec<ImageRecord>) -> Option<ImageList> {
        Some(ImageList {
            is_success: true,
            images,
        })
    }

    fn success() -> Option<ApiReply> {
        Some(ApiReply {
            is_success: true,
            message: None,
        })
    }

    fn refusal(message: &str) -> Option<ApiReply> {
        Some(ApiReply {
            is_success: false,
            message: Some(message.into()),
        })
    }

    fn signed_in() -> (Session<MemoryStorage>, MemoryStorage) {
        let store = MemoryStorage::new();
        store.set(TOKEN_KEY, "t0k").unwrap();
        store
            .set(USER_KEY, &serde_json::to_string(&kim()).unwrap())
            .unwrap();
        (Session::new(store.clone()), store)
    }

    #[test]
    fn guard_redirects_without_token() {
        let store = MemoryStorage::new();
        store
            .set(USER_KEY, &serde_json::to_string(&kim()).unwrap())
            .unwrap();
        let session = Session::new(store);
        match guard(&session) {
            GuardOutcome::Redirect { notice, to } => {
                assert_eq!(to, Route::Login);
                assert_eq!(notice.text, LOGIN_REQUIRED);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn guard_redirects_without_cached_user() {
        let store = MemoryStorage::new();
        store.set(TOKEN_KEY, "t0k").unwrap();
        assert!(matches!(
            guard(&Session::new(store)),
            GuardOutcome::Redirect { .. }
        ));
    }

    #[test]
    fn guard_passes_token_and_cached_user() {
        let (session, _) = signed_in();
        assert_eq!(
            guard(&session),
            GuardOutcome::Proceed {
                token: "t0k".into(),
                cached: kim(),
            }
        );
    }

    #[test]
    fn load_user_caches_fresh_record() {
        let (session, _) = signed_in();
        let fresh = UserRecord {
            coin: Some(99.0),
            ..kim()
        };
        let api = FakeApi {
            user: Some(fresh.clone()),
            ..FakeApi::default()
        };
        let phase = block_on(load_user(&api, &session, "t0k", &Lifetime::default()));
        assert_eq!(phase, PagePhase::Ready(fresh.clone()));
        assert_eq!(session.cached_user(), Some(fresh));
        assert_eq!(api.calls(), vec![Call::FetchUser("t0k".into())]);
    }

    #[test]
    fn load_user_failure_is_fatal_to_the_page() {
        let (session, _) = signed_in();
        let api = FakeApi::default();
        let phase = block_on(load_user(&api, &session, "t0k", &Lifetime::default()));
        assert_eq!(phase, PagePhase::Failed(USER_INFO_FAILED.to_string()));
        // the stale cache is left untouched
        assert_eq!(session.cached_user(), Some(kim()));
    }

    #[test]
    fn load_user_after_unmount_does_not_write_session() {
        let (session, _) = signed_in();
        let api = FakeApi {
            user: Some(UserRecord {
                name: Some("Renamed".into()),
                ..kim()
            }),
            ..FakeApi::default()
        };
        let lifetime = Lifetime::default();
        lifetime.end();
        block_on(load_user(&api, &session, "t0k", &lifetime));
        assert_eq!(session.cached_user(), Some(kim()));
    }

    #[test]
    fn gallery_applies_only_on_success_flag() {
        let tickets = RefreshTickets::default();
        let api = FakeApi {
            images: Some(ImageList {
                is_success: false,
                images: vec![image(1, "/a.png")],
            }),
            ..FakeApi::default()
        };
        let refresh = block_on(refresh_gallery(&api, "kim01", &tickets));
        assert_eq!(refresh.images, None);

        let api = FakeApi {
            images: gallery(vec![image(1, "/a.png")]),
            ..FakeApi::default()
        };
        let refresh = block_on(refresh_gallery(&api, "kim01", &tickets));
        assert_eq!(refresh.images, Some(vec![image(1, "/a.png")]));
        assert_eq!(api.calls(), vec![Call::ListImages("kim01".into())]);
    }

    #[test]
    fn only_latest_ticket_is_current() {
        let tickets = RefreshTickets::default();
        let first = tickets.issue();
        let second = tickets.issue();
        assert!(!tickets.is_current(first));
        assert!(tickets.is_current(second));
    }

    #[test]
    fn upload_without_file_sends_nothing() {
        let api = FakeApi {
            reply: success(),
            ..FakeApi::default()
        };
        let outcome = block_on(upload(&api, Some("kim01"), None, &RefreshTickets::default()));
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[test]
    fn successful_upload_refreshes_gallery_once() {
        let api = FakeApi {
            reply: success(),
            images: gallery(vec![image(1, "/a.png"), image(2, "/b.png")]),
            ..FakeApi::default()
        };
        let tickets = RefreshTickets::default();
        let file = "cat.png".to_string();
        let outcome = block_on(upload(&api, Some("kim01"), Some(&file), &tickets));
        match outcome {
            ActionOutcome::Succeeded { notice, refresh } => {
                assert_eq!(notice, Notice::info(UPLOAD_SUCCEEDED));
                assert!(tickets.is_current(refresh.ticket));
                assert_eq!(refresh.images.map(|i| i.len()), Some(2));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(api.count(|c| matches!(c, Call::ListImages(_))), 1);
        assert_eq!(
            api.calls()[0],
            Call::Upload("kim01".into(), "cat.png".into())
        );
    }

    #[test]
    fn rejected_upload_shows_server_message_without_refresh() {
        let api = FakeApi {
            reply: refusal("file too large"),
            ..FakeApi::default()
        };
        let file = "huge.png".to_string();
        let outcome = block_on(upload(&api, Some("kim01"), Some(&file), &RefreshTickets::default()));
        assert_eq!(
            outcome,
            ActionOutcome::Rejected {
                notice: Notice::error("이미지 업로드 실패: file too large"),
            }
        );
        assert_eq!(api.count(|c| matches!(c, Call::ListImages(_))), 0);
    }

    #[test]
    fn upload_network_error_is_silent() {
        let api = FakeApi::default();
        let file = "cat.png".to_string();
        let outcome = block_on(upload(&api, Some("kim01"), Some(&file), &RefreshTickets::default()));
        assert_eq!(outcome, ActionOutcome::Failed);
    }

    #[test]
    fn delete_sends_owner_and_url_then_refreshes() {
        let api = FakeApi {
            reply: success(),
            images: gallery(vec![]),
            ..FakeApi::default()
        };
        let outcome = block_on(delete(&api, Some("kim01"), "/a.png", &RefreshTickets::default()));
        assert!(matches!(
            outcome,
            ActionOutcome::Succeeded { ref notice, .. } if notice.text == DELETE_SUCCEEDED
        ));
        assert_eq!(
            api.calls(),
            vec![
                Call::Delete("kim01".into(), "/a.png".into()),
                Call::ListImages("kim01".into()),
            ]
        );
    }

    #[test]
    fn rejected_delete_reports_message() {
        let api = FakeApi {
            reply: refusal("not found"),
            ..FakeApi::default()
        };
        let outcome = block_on(delete(&api, Some("kim01"), "/gone.png", &RefreshTickets::default()));
        assert_eq!(
            outcome,
            ActionOutcome::Rejected {
                notice: Notice::error("이미지 삭제 실패: not found"),
            }
        );
    }

    #[test]
    fn delete_without_owner_is_skipped() {
        let api = FakeApi::default();
        let outcome = block_on(delete(&api, None, "/a.png", &RefreshTickets::default()));
        assert_eq!(outcome, ActionOutcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[test]
    fn incomplete_password_form_never_calls_api() {
        let (session, _) = signed_in();
        let api = FakeApi {
            reply: success(),
            ..FakeApi::default()
        };
        for form in [
            PasswordForm {
                current: String::new(),
                new: "n3w".into(),
            },
            PasswordForm {
                current: "old".into(),
                new: String::new(),
            },
        ] {
            let outcome = block_on(change_password(&api, &session, &form));
            assert_eq!(
                outcome,
                PasswordOutcome::Incomplete(Notice::error(PASSWORD_FIELDS_REQUIRED))
            );
        }
        assert!(api.calls().is_empty());
    }

    #[test]
    fn password_change_success_clears_form() {
        let (session, _) = signed_in();
        let api = FakeApi {
            reply: success(),
            ..FakeApi::default()
        };
        let form = PasswordForm {
            current: "old".into(),
            new: "n3w".into(),
        };
        let outcome = block_on(change_password(&api, &session, &form));
        assert!(outcome.clears_form());
        assert_eq!(outcome.notice().text, PASSWORD_CHANGED);
        assert_eq!(
            api.calls(),
            vec![Call::ChangePassword("old".into(), "n3w".into(), "t0k".into())]
        );
    }

    #[test]
    fn password_change_failures_keep_form() {
        let (session, _) = signed_in();
        let form = PasswordForm {
            current: "old".into(),
            new: "n3w".into(),
        };

        let api = FakeApi {
            reply: refusal("wrong password"),
            ..FakeApi::default()
        };
        let outcome = block_on(change_password(&api, &session, &form));
        assert_eq!(outcome, PasswordOutcome::Rejected(Notice::error(PASSWORD_REJECTED)));
        assert!(!outcome.clears_form());

        let outcome = block_on(change_password(&FakeApi::default(), &session, &form));
        assert_eq!(outcome, PasswordOutcome::Failed(Notice::error(PASSWORD_ERROR)));
        assert!(!outcome.clears_form());
    }

    #[test]
    fn logout_clears_session_without_network() {
        let (session, store) = signed_in();
        assert_eq!(logout(&session), Route::Login);
        assert!(store.is_empty());
        assert!(session.token().is_none());
        assert!(session.cached_user().is_none());
        assert!(matches!(guard(&session), GuardOutcome::Redirect { .. }));
    }

    #[test]
    fn password_form_clear_empties_both_fields() {
        let mut form = PasswordForm {
            current: "a".into(),
            new: "b".into(),
        };
        form.clear();
        assert_eq!(form, PasswordForm::default());
    }

    #[test]
    fn fresh_user_id_triggers_gallery_reload() {
        assert!(owner_changed(None, &kim()));
        assert!(owner_changed(Some("stale01"), &kim()));
        assert!(!owner_changed(Some("kim01"), &kim()));
        assert!(!owner_changed(Some("kim01"), &UserRecord::default()));
    }

    #[test]
    fn newer_selection_survives_finished_upload() {
        let mut pending = Some("second.png".to_string());
        release_uploaded(&mut pending, &"first.png".to_string());
        assert_eq!(pending.as_deref(), Some("second.png"));

        release_uploaded(&mut pending, &"second.png".to_string());
        assert_eq!(pending, None);
    }
}
