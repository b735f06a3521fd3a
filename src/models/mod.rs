pub mod image;
pub mod notice;
pub mod user;

pub use image::{ApiReply, ImageId, ImageList, ImageRecord};
pub use notice::{Notice, NoticeLevel};
pub use user::{UserRecord, MISSING_FIELD};
