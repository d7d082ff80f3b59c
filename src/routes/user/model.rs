use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::{NewUser, UserPatch};
use crate::error::{AppError, AppResult};
use crate::services::SearchCriteria;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            username: req.username,
            name: req.name,
            surname: req.surname,
            birthdate: req.birthdate,
        }
    }
}

/// 部分更新，屏蔽名单只能通过屏蔽接口修改
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            name: req.name,
            surname: req.surname,
            birthdate: req.birthdate,
            blocked_users: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub username: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
}

/// 空值视为未提供
fn parse_age(name: &str, raw: Option<String>) -> AppResult<Option<u32>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", name))),
    }
}

impl TryFrom<SearchQuery> for SearchCriteria {
    type Error = AppError;

    fn try_from(query: SearchQuery) -> AppResult<Self> {
        Ok(Self {
            username: query.username,
            min_age: parse_age("minAge", query.min_age)?,
            max_age: parse_age("maxAge", query.max_age)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_parses_ages() {
        let criteria = SearchCriteria::try_from(SearchQuery {
            username: Some("al".to_string()),
            min_age: Some("18".to_string()),
            max_age: Some(String::new()),
        })
        .unwrap();

        assert_eq!(criteria.username.as_deref(), Some("al"));
        assert_eq!(criteria.min_age, Some(18));
        assert_eq!(criteria.max_age, None);
    }

    #[test]
    fn negative_age_is_rejected() {
        let result = SearchCriteria::try_from(SearchQuery {
            min_age: Some("-3".to_string()),
            ..SearchQuery::default()
        });
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn update_request_never_touches_block_list() {
        let body = r#"{"name":"New","blockedUsers":[1,2]}"#;
        let req: UpdateUserRequest = serde_json::from_str(body).unwrap();
        let patch = UserPatch::from(req);

        assert_eq!(patch.name.as_deref(), Some("New"));
        assert!(patch.blocked_users.is_none());
    }
}
