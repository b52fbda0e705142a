//! List member repository for database operations.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::list_member;

/// Repository for list membership operations.
pub struct ListMemberRepository;

impl ListMemberRepository {
    pub async fn get_for_list<C>(conn: &C, list_id: i32) -> Result<Vec<list_member::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(list_member::Entity::find()
            .filter(list_member::Column::ListId.eq(list_id))
            .all(conn)
            .await?)
    }

    /// Insert members, replacing the role of any `(list_id, user_id)` already present.
    pub async fn upsert_all<C>(conn: &C, members: Vec<(i32, String, String)>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        for (list_id, user_id, role) in members {
            let member = list_member::ActiveModel {
                id: ActiveValue::NotSet,
                list_id: ActiveValue::Set(list_id),
                user_id: ActiveValue::Set(user_id),
                role: ActiveValue::Set(role),
            };

            list_member::Entity::insert(member)
                .on_conflict(
                    OnConflict::columns([list_member::Column::ListId, list_member::Column::UserId])
                        .update_column(list_member::Column::Role)
                        .to_owned(),
                )
                .exec_without_returning(conn)
                .await?;
        }
        Ok(())
    }
}
