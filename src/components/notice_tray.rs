use yew::prelude::*;
use yew_agent::{Bridge, Bridged};

use crate::models::{Notice, NoticeLevel};
use crate::services::event_bus::EventBus;

pub enum Msg {
    Received(Notice),
    Dismiss(u64),
    ClearAll,
}

/// Shows notices published on the [`EventBus`] until the user dismisses them.
pub struct NoticeTray {
    notices: Vec<(u64, Notice)>,
    next_id: u64,
    _producer: Box<dyn Bridge<EventBus>>,
}

impl Component for NoticeTray {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            notices: vec![],
            next_id: 0,
            _producer: EventBus::bridge(ctx.link().callback(Msg::Received)),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Received(notice) => {
                log::debug!("notice: {}", notice.text);
                self.notices.push((self.next_id, notice));
                self.next_id += 1;
                true
            }
            Msg::Dismiss(id) => {
                let before = self.notices.len();
                self.notices.retain(|(n, _)| *n != id);
                self.notices.len() != before
            }
            Msg::ClearAll => {
                let had_any = !self.notices.is_empty();
                self.notices.clear();
                had_any
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        if self.notices.is_empty() {
            return html! {};
        }
        let clear_all = ctx.link().callback(|_| Msg::ClearAll);

        html! {
            <div class="fixed top-4 right-4 z-50 w-80 space-y-2" role="status">
                {
                    self.notices.iter().map(|(id, notice)| {
                        let id = *id;
                        let colors = match notice.level {
                            NoticeLevel::Info => "bg-green-50 border-green-400 text-green-800",
                            NoticeLevel::Error => "bg-red-50 border-red-400 text-red-800",
                        };
                        html! {
                            <div key={id.to_string()} class={format!("flex items-start justify-between p-3 border rounded-lg shadow-sm {}", colors)}>
                                <span class="text-sm">{notice.text.clone()}</span>
                                <button
                                    class="ml-3 text-xs opacity-60 hover:opacity-100"
                                    title="Dismiss"
                                    onclick={ctx.link().callback(move |_| Msg::Dismiss(id))}
                                >
                                    {"✕"}
                                </button>
                            </div>
                        }
                    }).collect::<Html>()
                }
                if self.notices.len() > 1 {
                    <button onclick={clear_all} class="w-full text-xs text-gray-500 hover:text-gray-700">
                        {"Clear all"}
                    </button>
                }
            </div>
        }
    }
}
