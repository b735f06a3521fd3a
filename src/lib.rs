#![recursion_limit = "512"]

pub mod components;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use wasm_bindgen::prelude::*;
use yew::prelude::*;
use yew_router::prelude::*;

use components::my_page::MyPage;
use components::notice_tray::NoticeTray;
use config::AppConfig;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[derive(Debug, Clone, Copy, PartialEq, Routable)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/Login")]
    Login,
    #[at("/mypage")]
    MyPage,
    #[at("/mypage/modify")]
    ModifyProfile,
    #[not_found]
    #[at("/404")]
    NotFound,
}

#[function_component(Main)]
fn main() -> Html {
    let config = use_state(AppConfig::from_build_env);

    html! {
        <ContextProvider<AppConfig> context={(*config).clone()}>
            <BrowserRouter>
                <NoticeTray />
                <Switch<Route> render={Switch::render(switch)} />
            </BrowserRouter>
        </ContextProvider<AppConfig>>
    }
}

// Login and profile editing live in other parts of the site; only their
// routes are known here.
fn switch(selected_route: &Route) -> Html {
    match selected_route {
        Route::Home => html! { <Redirect<Route> to={Route::MyPage} /> },
        Route::MyPage => html! { <MyPage /> },
        Route::Login => html! { <h1>{"Login"}</h1> },
        Route::ModifyProfile => html! { <h1>{"Modify profile"}</h1> },
        Route::NotFound => html! { <h1>{"404"}</h1> },
    }
}

#[wasm_bindgen(start)]
pub fn run_app() -> Result<(), JsValue> {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("starting my page");
    yew::start_app::<Main>();
    Ok(())
}
