use std::collections::HashMap;

use thiserror::Error;

use super::dto::UserRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Id,
    Name,
    Email,
    Password,
}

impl Param {
    pub fn key(self) -> &'static str {
        match self {
            Param::Id => "id",
            Param::Name => "name",
            Param::Email => "email",
            Param::Password => "password",
        }
    }
}

pub const CREATE: &[Param] = &[Param::Name, Param::Email, Param::Password];
pub const UPDATE: &[Param] = &[Param::Id, Param::Name, Param::Email, Param::Password];
pub const BY_ID: &[Param] = &[Param::Id];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing parameters: {}", .0.join(", "))]
    MissingParameter(Vec<&'static str>),
    #[error("invalid id: {0:?}")]
    InvalidId(String),
}

/// Query string as key -> every value supplied for it, in order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, Vec<String>>);

impl QueryParams {
    fn first(&self, key: &str) -> Option<&String> {
        self.0.get(key).and_then(|values| values.first())
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in pairs {
            map.entry(k).or_default().push(v);
        }
        Self(map)
    }
}

/// Builds a `UserRequest` holding exactly the `required` fields.
///
/// Every absent query key is reported at once; missing keys win over a bad id.
/// `path_id` is the raw `{id}` path segment when the route has one.
pub fn parse_request(
    query: &QueryParams,
    path_id: Option<&str>,
    required: &[Param],
) -> Result<UserRequest, ValidationError> {
    let mut request = UserRequest::default();
    let mut missing = Vec::new();

    for &param in required {
        let slot = match param {
            Param::Id => {
                if path_id.is_none() {
                    missing.push(param.key());
                }
                continue;
            }
            Param::Name => &mut request.name,
            Param::Email => &mut request.email,
            Param::Password => &mut request.password,
        };
        match query.first(param.key()) {
            Some(value) => *slot = Some(value.clone()),
            None => missing.push(param.key()),
        }
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingParameter(missing));
    }

    if required.contains(&Param::Id) {
        let raw = path_id.unwrap_or_default();
        let id = parse_id(raw).ok_or_else(|| ValidationError::InvalidId(raw.to_string()))?;
        request.id = Some(id);
    }

    Ok(request)
}

/// Plain base-10 digits only; signs and whitespace are rejected.
fn parse_id(raw: &str) -> Option<i32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
