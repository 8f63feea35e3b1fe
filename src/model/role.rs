use serde::Serialize;
use strum::{AsRefStr, EnumIter, IntoEnumIterator};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
    Accountant = 6,
    Sales = 7,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        Role::iter().find(|role| role.id() == id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct RoleRow {
    #[schema(example = 2)]
    pub id: u8,
    #[schema(example = "hr")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in Role::iter() {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(8), None);
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Role::ApiUser.as_ref(), "api_user");
        assert_eq!(Role::Hr.as_ref(), "hr");
    }
}
