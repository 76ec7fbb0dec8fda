use std::collections::BTreeMap;

use anyhow::{anyhow, Context};
use http::StatusCode;
use serde_json::json;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found")]
    NotFound,

    #[error("Invalid request: {}", describe_fields(.0))]
    Validation(BTreeMap<String, Vec<String>>),
}

fn describe_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, msgs)| format!("{field}: {}", msgs.join(" ")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    pub fn validation(field: &str, message: &str) -> Error {
        let mut fields = BTreeMap::new();
        fields.insert(String::from(field), vec![String::from(message)]);
        Error::Validation(fields)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({ "detail": msg }),
            Error::Unauthorized => json!({
                "detail": "Authentication credentials were not provided.",
            }),
            Error::PermissionDenied => json!({
                "detail": "You do not have permission to perform this action.",
            }),
            Error::NotFound => json!({ "detail": "Not found." }),
            Error::Validation(fields) => json!(fields),
        })
        .expect("serializing error contents")
    }

    /// Rebuild an error out of a non-success response. The body is either
    /// `{"detail": "..."}` or a map of field name to messages.
    pub fn parse(status: StatusCode, body: &[u8]) -> Error {
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized,
            StatusCode::FORBIDDEN => Error::PermissionDenied,
            StatusCode::NOT_FOUND => Error::NotFound,
            StatusCode::BAD_REQUEST => match parse_fields(body) {
                Ok(fields) => Error::Validation(fields),
                Err(e) => Error::Unknown(format!("server answered {status}: {e:#}")),
            },
            _ => Error::Unknown(
                parse_detail(body).unwrap_or_else(|| format!("server answered {status}")),
            ),
        }
    }
}

fn parse_detail(body: &[u8]) -> Option<String> {
    let data: serde_json::Value = serde_json::from_slice(body).ok()?;
    data.get("detail")
        .or_else(|| data.get("message"))
        .and_then(|d| d.as_str())
        .map(String::from)
}

fn parse_fields(body: &[u8]) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
    let data: serde_json::Value =
        serde_json::from_slice(body).context("parsing error contents")?;
    let obj = data
        .as_object()
        .ok_or_else(|| anyhow!("error contents is not an object"))?;
    let mut res = BTreeMap::new();
    for (field, msgs) in obj {
        let msgs = match msgs {
            serde_json::Value::String(m) => vec![m.clone()],
            serde_json::Value::Array(a) => a
                .iter()
                .map(|m| match m {
                    serde_json::Value::String(m) => m.clone(),
                    other => other.to_string(),
                })
                .collect(),
            other => vec![other.to_string()],
        };
        res.insert(field.clone(), msgs);
    }
    Ok(res)
}
