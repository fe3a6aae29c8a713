use std::fmt;

use serde::Serialize;

use crate::AppError;

/// Discriminant of a [`RequestState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Loading,
    Success,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Observable lifecycle of a request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Success { data: T },
    #[serde(rename = "error")]
    Failure { error: AppError },
}

impl<T> RequestState<T> {
    pub fn status(&self) -> Status {
        match self {
            Self::Idle => Status::Idle,
            Self::Loading => Status::Loading,
            Self::Success { .. } => Status::Success,
            Self::Failure { .. } => Status::Error,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Failure { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn has_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// `true` for `Success` and `Failure`.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Failure { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{RequestState, Status};
    use crate::{AppError, ErrorKind};

    #[test]
    fn accessors_match_variant() {
        let idle: RequestState<u32> = RequestState::default();
        assert_eq!(idle.status(), Status::Idle);
        assert!(idle.data().is_none() && idle.error().is_none());
        assert!(!idle.is_settled());

        let ok = RequestState::Success { data: 7u32 };
        assert_eq!(ok.data(), Some(&7));
        assert!(ok.is_settled() && !ok.has_error());

        let failed: RequestState<u32> = RequestState::Failure {
            error: AppError::from_kind(ErrorKind::Network),
        };
        assert_eq!(failed.status(), Status::Error);
        assert!(failed.has_error() && failed.data().is_none());
        assert_eq!(failed.error().map(AppError::kind), Some(ErrorKind::Network));
    }

    #[test]
    fn serializes_as_tagged_object() {
        let ok = RequestState::Success { data: vec![1, 2] };
        assert_eq!(
            serde_json::to_value(&ok).expect("state must serialize"),
            json!({"status": "success", "data": [1, 2]})
        );
        let loading: RequestState<()> = RequestState::Loading;
        assert_eq!(
            serde_json::to_value(&loading).expect("state must serialize"),
            json!({"status": "loading"})
        );
        let failed: RequestState<()> = RequestState::Failure {
            error: AppError::from_kind(ErrorKind::Auth),
        };
        let value = serde_json::to_value(&failed).expect("state must serialize");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["kind"], "AUTH_ERROR");
    }
}
