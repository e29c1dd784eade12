pub mod notification_handler;

pub use notification_handler::{
    __path_send_feedback, __path_send_notice, send_feedback, send_notice,
};
