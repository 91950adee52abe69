use crate::{
    error::{AppError, AppResult},
    models::{favorite, venue, Favorite, Venue, VenueModel},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Statement,
};
use std::collections::HashMap;
use uuid::Uuid;

pub struct FavoriteService {
    db: DatabaseConnection,
}

impl FavoriteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn add(&self, user_id: Uuid, venue_id: i32) -> AppResult<bool> {
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "INSERT INTO favorites (user_id, venue_id, created_at)
                 VALUES ($1, $2, NOW())
                 ON CONFLICT (user_id, venue_id) DO NOTHING",
                vec![user_id.into(), venue_id.into()],
            ))
            .await?;
        Ok(true)
    }

    async fn remove(&self, user_id: Uuid, venue_id: i32) -> AppResult<bool> {
        Favorite::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::VenueId.eq(venue_id))
            .exec(&self.db)
            .await?;
        Ok(false)
    }

    /// Returns true if the venue is now a favorite.
    pub async fn toggle(&self, user_id: Uuid, venue_id: i32) -> AppResult<bool> {
        Venue::find_by_id(venue_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let existing = Favorite::find_by_id((user_id, venue_id))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            self.remove(user_id, venue_id).await
        } else {
            self.add(user_id, venue_id).await
        }
    }

    /// Favorited venues, most recently added first.
    pub async fn list(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<VenueModel>, u64)> {
        let paginator = Favorite::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_desc(favorite::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let favorites = paginator.fetch_page(page.saturating_sub(1)).await?;

        let venue_ids: Vec<i32> = favorites.iter().map(|f| f.venue_id).collect();
        if venue_ids.is_empty() {
            return Ok((vec![], total));
        }

        let venues = Venue::find()
            .filter(venue::Column::Id.is_in(venue_ids.clone()))
            .all(&self.db)
            .await?;

        let by_id: HashMap<i32, VenueModel> = venues.into_iter().map(|v| (v.id, v)).collect();
        let ordered = venue_ids
            .into_iter()
            .filter_map(|id| by_id.get(&id).cloned())
            .collect();

        Ok((ordered, total))
    }
}
