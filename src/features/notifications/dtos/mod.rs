pub mod notification_dto;

pub use notification_dto::{AppInfoDto, DeliveryResponseDto, FeedbackDto, NoticeDto};
