use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 用户数据库实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
    /// 已屏蔽的用户ID，按屏蔽先后排列
    pub blocked_users: Vec<i32>,
}

/// 新建用户所需字段，ID 由存储层生成
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
}

/// 部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub blocked_users: Option<Vec<i32>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.name.is_none()
            && self.surname.is_none()
            && self.birthdate.is_none()
            && self.blocked_users.is_none()
    }

    pub fn blocked_users(blocked_users: Vec<i32>) -> Self {
        Self {
            blocked_users: Some(blocked_users),
            ..Self::default()
        }
    }

    pub fn apply_to(self, user: &mut UserEntity) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(surname) = self.surname {
            user.surname = surname;
        }
        if let Some(birthdate) = self.birthdate {
            user.birthdate = birthdate;
        }
        if let Some(blocked_users) = self.blocked_users {
            user.blocked_users = blocked_users;
        }
    }
}

/// 搜索条件，各条件之间为 AND 关系
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// 用户名子串匹配
    pub username_contains: Option<String>,
    /// 出生日期上限（含）
    pub born_on_or_before: Option<NaiveDate>,
    /// 出生日期下限（含）
    pub born_on_or_after: Option<NaiveDate>,
    pub exclude_ids: Vec<i32>,
}

impl UserQuery {
    pub fn matches(&self, user: &UserEntity) -> bool {
        if let Some(fragment) = &self.username_contains {
            if !user.username.contains(fragment.as_str()) {
                return false;
            }
        }
        if let Some(upper) = self.born_on_or_before {
            if user.birthdate > upper {
                return false;
            }
        }
        if let Some(lower) = self.born_on_or_after {
            if user.birthdate < lower {
                return false;
            }
        }
        !self.exclude_ids.contains(&user.id)
    }
}
