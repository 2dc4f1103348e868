//! Member model -> entity mapper

use matching_core::entities::Member;
use matching_core::error::DomainError;
use matching_core::value_objects::Snowflake;

use crate::models::MemberModel;

impl TryFrom<MemberModel> for Member {
    type Error = DomainError;

    fn try_from(model: MemberModel) -> Result<Self, Self::Error> {
        Ok(Member {
            id: Snowflake::new(model.id),
            role: model.role.parse()?,
            nickname: model.nickname,
        })
    }
}
