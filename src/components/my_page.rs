use std::rc::Rc;

use web_sys::{File, HtmlInputElement, Url};
use yew::prelude::*;
use yew_agent::{Dispatched, Dispatcher};
use yew_router::prelude::*;

use crate::config::AppConfig;
use crate::models::{ImageRecord, Notice, UserRecord};
use crate::services::api::HttpProfileApi;
use crate::services::event_bus::{EventBus, Request};
use crate::services::profile::{
    self, ActionOutcome, GalleryRefresh, GuardOutcome, Lifetime, PagePhase, PasswordForm,
    PasswordOutcome, RefreshTickets, SIGNED_OUT,
};
use crate::services::session::Session;
use crate::services::storage::BrowserStorage;
use crate::Route;

pub enum Msg {
    UserLoaded(PagePhase),
    GalleryLoaded(GalleryRefresh),
    FileSelected(Option<File>),
    OpenFilePicker,
    Upload,
    UploadFinished { file: File, outcome: ActionOutcome },
    Delete(String),
    DeleteFinished(ActionOutcome),
    CurrentPasswordInput(String),
    NewPasswordInput(String),
    ChangePassword,
    PasswordFinished(PasswordOutcome),
    Logout,
}

pub struct MyPage {
    config: Rc<AppConfig>,
    api: Rc<HttpProfileApi>,
    session: Rc<Session<BrowserStorage>>,
    notices: Dispatcher<EventBus>,
    lifetime: Lifetime,
    tickets: RefreshTickets,
    phase: PagePhase,
    redirect: Option<Route>,
    owner_id: Option<String>,
    images: Vec<ImageRecord>,
    pending: Option<File>,
    preview_url: Option<String>,
    password: PasswordForm,
    file_input: NodeRef,
}

impl MyPage {
    fn notify(&mut self, notice: Notice) {
        self.notices.send(Request::Notify(notice));
    }

    fn navigate(ctx: &Context<Self>, to: Route) {
        match ctx.link().history() {
            Some(history) => history.push(to),
            None => log::error!("no router to navigate to {:?}", to),
        }
    }

    fn load_user(&self, ctx: &Context<Self>, token: String) {
        let api = self.api.clone();
        let session = self.session.clone();
        let lifetime = self.lifetime.clone();
        ctx.link().send_future_batch(async move {
            let phase = profile::load_user(&*api, &*session, &token, &lifetime).await;
            if lifetime.is_alive() {
                vec![Msg::UserLoaded(phase)]
            } else {
                vec![]
            }
        });
    }

    fn refresh_gallery(&self, ctx: &Context<Self>) {
        let owner_id = match self.owner_id.clone() {
            Some(owner_id) => owner_id,
            None => {
                log::warn!("user has no id, gallery not loaded");
                return;
            }
        };
        let api = self.api.clone();
        let tickets = self.tickets.clone();
        let lifetime = self.lifetime.clone();
        ctx.link().send_future_batch(async move {
            let refresh = profile::refresh_gallery(&*api, &owner_id, &tickets).await;
            if lifetime.is_alive() {
                vec![Msg::GalleryLoaded(refresh)]
            } else {
                vec![]
            }
        });
    }

    /// Returns whether the gallery changed.
    fn apply_gallery(&mut self, refresh: GalleryRefresh) -> bool {
        if !self.tickets.is_current(refresh.ticket) {
            log::debug!("dropping stale gallery refresh {}", refresh.ticket);
            return false;
        }
        match refresh.images {
            Some(images) => {
                self.images = images;
                true
            }
            None => false,
        }
    }

    fn finish_action(&mut self, outcome: ActionOutcome) -> bool {
        match outcome {
            ActionOutcome::Succeeded { notice, refresh } => {
                self.notify(notice);
                self.apply_gallery(refresh)
            }
            ActionOutcome::Rejected { notice } => {
                self.notify(notice);
                false
            }
            ActionOutcome::Skipped | ActionOutcome::Failed => false,
        }
    }

    fn set_preview(&mut self, file: &File) {
        match Url::create_object_url_with_blob(file) {
            Ok(url) => {
                self.revoke_preview();
                self.preview_url = Some(url);
            }
            Err(e) => log::error!("could not preview selected file: {:?}", e),
        }
    }

    fn revoke_preview(&mut self) {
        if let Some(url) = self.preview_url.take() {
            if let Err(e) = Url::revoke_object_url(&url) {
                log::warn!("could not revoke preview url: {:?}", e);
            }
        }
    }

    fn view_user(&self, ctx: &Context<Self>, user: &UserRecord) -> Html {
        let open_picker = ctx.link().callback(|_| Msg::OpenFilePicker);
        let on_file = ctx.link().callback(|e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::FileSelected(input.files().and_then(|files| files.get(0)))
        });
        let on_current = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::CurrentPasswordInput(input.value())
        });
        let on_new = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::NewPasswordInput(input.value())
        });
        let change_password = ctx.link().callback(|_| Msg::ChangePassword);
        let logout = ctx.link().callback(|_| Msg::Logout);
        let upload = ctx.link().callback(|_| Msg::Upload);
        let profile_image = self
            .preview_url
            .clone()
            .unwrap_or_else(|| self.config.default_profile_image.clone());

        html! {
            <div class="mypage">
                <section class="sec">
                    <div class="sec-box">
                        <h1 class="sec-main">{"My Page"}</h1>
                        <div class="sec-img" onclick={open_picker} style="cursor: pointer;">
                            <img src={profile_image} alt="mypage" />
                        </div>
                        <input
                            type="file"
                            ref={self.file_input.clone()}
                            style="display: none;"
                            onchange={on_file.clone()}
                        />
                        <table>
                            <tbody>
                                <tr>
                                    <th class="name">{"이름"}</th>
                                    <td>{user.display_name()}</td>
                                </tr>
                                <tr>
                                    <th class="name">{"아이디"}</th>
                                    <td>{user.display_user_id()}</td>
                                </tr>
                                <tr>
                                    <th class="name">{"내 코인"}</th>
                                    <td>{user.display_coin()}</td>
                                </tr>
                            </tbody>
                        </table>
                        <div class="password-change">
                            <h3>{"비밀번호 변경"}</h3>
                            <input
                                class="input"
                                type="password"
                                placeholder="Current Password"
                                value={self.password.current.clone()}
                                oninput={on_current}
                            />
                            <input
                                class="input"
                                type="password"
                                placeholder="New Password"
                                value={self.password.new.clone()}
                                oninput={on_new}
                            />
                            <button class="Change-button" onclick={change_password}>{"Change Password"}</button>
                            <span class="out" onclick={logout}>{"Logout"}</span>
                        </div>
                        <h2 class="sec-wrap">
                            <Link<Route> to={Route::ModifyProfile}>{"수정"}</Link<Route>>
                        </h2>
                        <div class="image-upload">
                            <input type="file" onchange={on_file} />
                            <button onclick={upload}>{"이미지 업로드"}</button>
                            <div class="images">
                                {
                                    self.images.iter().map(|image| {
                                        let url = image.image_url.clone();
                                        let delete = ctx.link().callback(move |_| Msg::Delete(url.clone()));
                                        html! {
                                            <div key={image.id.to_string()} class="image-item">
                                                <img src={image.image_url.clone()} alt="uploaded" />
                                                <button onclick={delete}>{"삭제"}</button>
                                            </div>
                                        }
                                    }).collect::<Html>()
                                }
                            </div>
                        </div>
                    </div>
                </section>
            </div>
        }
    }
}

impl Component for MyPage {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let config = match ctx.link().context::<AppConfig>(Callback::noop()) {
            Some((config, _)) => config,
            None => {
                log::warn!("no AppConfig in context, using defaults");
                AppConfig::default()
            }
        };
        let config = Rc::new(config);

        let mut page = Self {
            api: Rc::new(HttpProfileApi::new(config.clone())),
            config,
            session: Rc::new(Session::new(BrowserStorage)),
            notices: EventBus::dispatcher(),
            lifetime: Lifetime::default(),
            tickets: RefreshTickets::default(),
            phase: PagePhase::Loading,
            redirect: None,
            owner_id: None,
            images: vec![],
            pending: None,
            preview_url: None,
            password: PasswordForm::default(),
            file_input: NodeRef::default(),
        };

        match profile::guard(&*page.session) {
            GuardOutcome::Redirect { notice, to } => {
                page.notify(notice);
                page.phase = PagePhase::SignedOut;
                page.redirect = Some(to);
            }
            GuardOutcome::Proceed { token, cached } => {
                page.owner_id = cached.owner_id().map(str::to_string);
                page.load_user(ctx, token);
                page.refresh_gallery(ctx);
            }
        }
        page
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::UserLoaded(phase) => {
                if let PagePhase::Ready(user) = &phase {
                    if profile::owner_changed(self.owner_id.as_deref(), user) {
                        self.owner_id = user.owner_id().map(str::to_string);
                        self.refresh_gallery(ctx);
                    }
                }
                self.phase = phase;
                true
            }
            Msg::GalleryLoaded(refresh) => self.apply_gallery(refresh),
            Msg::FileSelected(file) => match file {
                Some(file) => {
                    self.set_preview(&file);
                    self.pending = Some(file);
                    true
                }
                None => false,
            },
            Msg::OpenFilePicker => {
                if let Some(input) = self.file_input.cast::<HtmlInputElement>() {
                    input.click();
                }
                false
            }
            Msg::Upload => {
                let file = match self.pending.clone() {
                    Some(file) => file,
                    None => return false,
                };
                let api = self.api.clone();
                let tickets = self.tickets.clone();
                let lifetime = self.lifetime.clone();
                let owner_id = self.owner_id.clone();
                ctx.link().send_future_batch(async move {
                    let outcome =
                        profile::upload(&*api, owner_id.as_deref(), Some(&file), &tickets).await;
                    if lifetime.is_alive() {
                        vec![Msg::UploadFinished { file, outcome }]
                    } else {
                        vec![]
                    }
                });
                false
            }
            Msg::Delete(image_url) => {
                let api = self.api.clone();
                let tickets = self.tickets.clone();
                let lifetime = self.lifetime.clone();
                let owner_id = self.owner_id.clone();
                ctx.link().send_future_batch(async move {
                    let outcome =
                        profile::delete(&*api, owner_id.as_deref(), &image_url, &tickets).await;
                    if lifetime.is_alive() {
                        vec![Msg::DeleteFinished(outcome)]
                    } else {
                        vec![]
                    }
                });
                false
            }
            Msg::UploadFinished { file, outcome } => {
                if matches!(outcome, ActionOutcome::Succeeded { .. }) {
                    profile::release_uploaded(&mut self.pending, &file);
                }
                self.finish_action(outcome)
            }
            Msg::DeleteFinished(outcome) => self.finish_action(outcome),
            Msg::CurrentPasswordInput(value) => {
                self.password.current = value;
                true
            }
            Msg::NewPasswordInput(value) => {
                self.password.new = value;
                true
            }
            Msg::ChangePassword => {
                let api = self.api.clone();
                let session = self.session.clone();
                let lifetime = self.lifetime.clone();
                let form = self.password.clone();
                ctx.link().send_future_batch(async move {
                    let outcome = profile::change_password(&*api, &*session, &form).await;
                    if lifetime.is_alive() {
                        vec![Msg::PasswordFinished(outcome)]
                    } else {
                        vec![]
                    }
                });
                false
            }
            Msg::PasswordFinished(outcome) => {
                let clears = outcome.clears_form();
                self.notify(outcome.notice().clone());
                if clears {
                    self.password.clear();
                }
                clears
            }
            Msg::Logout => {
                let to = profile::logout(&*self.session);
                self.phase = PagePhase::SignedOut;
                Self::navigate(ctx, to);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        match &self.phase {
            PagePhase::Loading => html! { <div>{"Loading..."}</div> },
            PagePhase::Failed(message) => html! { <div>{message.clone()}</div> },
            PagePhase::SignedOut => html! { <div>{SIGNED_OUT}</div> },
            PagePhase::Ready(user) => self.view_user(ctx, user),
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, _first_render: bool) {
        if let Some(to) = self.redirect.take() {
            Self::navigate(ctx, to);
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.lifetime.end();
        self.pending = None;
        self.revoke_preview();
    }
}
