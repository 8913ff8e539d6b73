use plotline_transcript::ChatId;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackendError {
    #[snafu(display("chat '{chat_id}' was not found"))]
    ChatNotFound {
        stage: &'static str,
        chat_id: ChatId,
    },
    #[snafu(display("chat title is empty after trimming"))]
    EmptyTitle { stage: &'static str },
    #[snafu(display("transport failure on `{stage}`: {details}"))]
    Transport {
        stage: &'static str,
        details: String,
    },
}

pub type BackendResult<T> = Result<T, BackendError>;
