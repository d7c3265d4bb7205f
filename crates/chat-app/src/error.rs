use chatline_storage::StorageError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("failed to open history store at {path}"))]
    OpenStore {
        stage: &'static str,
        path: String,
        source: StorageError,
    },
    #[snafu(display("failed to read terminal input on `{stage}`"))]
    ReadInput {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to write terminal output on `{stage}`"))]
    WriteOutput {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("presenter task stopped unexpectedly on `{stage}`"))]
    PresenterJoin {
        stage: &'static str,
        source: tokio::task::JoinError,
    },
}

pub type AppResult<T> = Result<T, AppError>;
