use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use yew_agent::{Agent, AgentLink, Context, HandlerId};

use crate::models::Notice;

#[derive(Serialize, Deserialize, Debug)]
pub enum Request {
    Notify(Notice),
}

/// Broadcasts user-facing notices from pages to every connected tray.
pub struct EventBus {
    link: AgentLink<EventBus>,
    subscribers: HashSet<HandlerId>,
}

impl Agent for EventBus {
    type Reach = Context<Self>;
    type Message = ();
    type Input = Request;
    type Output = Notice;

    fn create(link: AgentLink<Self>) -> Self {
        Self {
            link,
            subscribers: HashSet::new(),
        }
    }

    fn update(&mut self, _msg: Self::Message) {}

    fn handle_input(&mut self, msg: Self::Input, _id: HandlerId) {
        match msg {
            Request::Notify(notice) => {
                if self.subscribers.is_empty() {
                    log::warn!("notice dropped, no tray connected: {}", notice.text);
                }
                for sub in self.subscribers.iter() {
                    self.link.respond(*sub, notice.clone());
                }
            }
        }
    }

    fn connected(&mut self, id: HandlerId) {
        if id.is_respondable() {
            self.subscribers.insert(id);
        }
    }

    fn disconnected(&mut self, id: HandlerId) {
        self.subscribers.remove(&id);
    }
}
