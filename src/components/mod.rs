pub mod my_page;
pub mod notice_tray;
